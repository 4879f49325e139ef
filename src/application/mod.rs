//! # Application Layer
//!
//! Store and provider interfaces, plus the use cases that drive them.

pub mod interfaces;
pub mod use_cases;

pub use interfaces::*;
pub use use_cases::*;
