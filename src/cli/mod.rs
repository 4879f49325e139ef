use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::connector::api::controller::TranslateTarget;

#[derive(Subcommand)]
pub enum Commands {
    /// List the collections in the store
    Collections,

    /// Create a collection unless it exists
    Create {
        collection: String,

        #[arg(short, long)]
        definition: PathBuf,
    },

    /// Delete a collection and its records
    Drop {
        collection: String,

        #[arg(short, long)]
        definition: PathBuf,
    },

    /// Insert or replace records read from a JSON or JSON Lines file
    Upsert {
        collection: String,

        #[arg(short, long)]
        definition: PathBuf,

        #[arg(short, long)]
        records: PathBuf,
    },

    Get {
        collection: String,

        #[arg(short, long)]
        definition: PathBuf,

        #[arg(required = true)]
        keys: Vec<String>,

        #[arg(long)]
        include_vectors: bool,
    },

    Delete {
        collection: String,

        #[arg(short, long)]
        definition: PathBuf,

        #[arg(required = true)]
        keys: Vec<String>,
    },

    Search(SearchArgs),

    /// Print a filter in a store's native syntax
    Translate {
        #[arg(short, long)]
        definition: PathBuf,

        /// Filter as JSON, e.g. '{"compare": {"field": "city", "op": "eq", "value": "Paris"}}'
        #[arg(short, long)]
        filter: String,

        #[arg(short, long, value_enum)]
        target: TranslateTarget,
    },

    /// Send a prompt to the configured chat provider
    Chat {
        prompt: String,

        #[arg(long)]
        system: Option<String>,
    },
}

#[derive(Args)]
pub struct SearchArgs {
    pub collection: String,

    #[arg(short, long)]
    pub definition: PathBuf,

    pub query: String,

    #[arg(long, default_value = "3")]
    pub top: usize,

    #[arg(long, default_value = "0")]
    pub skip: usize,

    /// Filter as JSON
    #[arg(short, long)]
    pub filter: Option<String>,

    #[arg(long)]
    pub vector_field: Option<String>,

    /// Combine vector similarity with keyword matching
    #[arg(long)]
    pub hybrid: bool,

    #[arg(long)]
    pub include_vectors: bool,

    #[arg(long)]
    pub total_count: bool,
}
