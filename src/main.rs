use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use kernel_connectors::connector::api::{ChatProvider, EmbeddingProvider, StoreKind};
use kernel_connectors::{Commands, Container, ContainerConfig, Router};

#[derive(Parser)]
#[command(name = "kconnect")]
#[command(author, version, about = "Vector store and LLM provider connectors", long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Where the memory store keeps its snapshot between runs
    #[arg(long, global = true, default_value = "~/.kconnect")]
    data_dir: String,

    #[arg(long, global = true, value_enum, default_value = "memory")]
    store: StoreKind,

    #[arg(long, global = true, value_enum, default_value = "mock")]
    embeddings: EmbeddingProvider,

    #[arg(long, global = true, value_enum)]
    chat: Option<ChatProvider>,

    /// Vector size for mock embeddings
    #[arg(long, global = true, default_value = "384")]
    mock_dimensions: usize,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let data_dir = match cli.store {
        StoreKind::Memory => {
            let dir = home_relative(&cli.data_dir);
            std::fs::create_dir_all(&dir)?;
            Some(dir)
        }
        _ => None,
    };

    let config = ContainerConfig {
        store: cli.store,
        embeddings: cli.embeddings,
        chat: cli.chat,
        mock_dimensions: cli.mock_dimensions,
        data_dir,
    };
    let container = Container::new(config).await?;
    let router = Router::new(&container);

    let output = router.route(cli.command).await?;
    println!("{output}");

    Ok(())
}

/// Resolves a leading `~` against `HOME`.
fn home_relative(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return PathBuf::from(path),
    };
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => PathBuf::from(path),
    }
}
