//! # Domain Layer
//!
//! Collection definitions, records, filters and search types shared by every
//! connector. Nothing here knows about a particular backend.

mod error;
pub mod models;

pub use error::*;
pub use models::*;
