//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! pharmacy test suite.
//!
//! # Modules
//!
//! - `fixtures`: Sample pharmacy products and a wired in-memory pharmacy
//! - `builders`: Builder patterns for products and invoice requests
//! - `assertions`: Custom assertion helpers for domain types
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use assertions::*;
pub use generators::*;
