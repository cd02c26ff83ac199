//! Shared test utilities for the mapstyle-api workspace.
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;

// Re-export commonly used items at the crate root
pub use fixtures::*;
