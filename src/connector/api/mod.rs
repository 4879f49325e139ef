pub mod container;
pub mod controller;
pub mod router;

pub use container::{ChatProvider, Container, ContainerConfig, EmbeddingProvider, StoreKind};
pub use router::Router;
