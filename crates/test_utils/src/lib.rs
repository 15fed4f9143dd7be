//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! invoice escrow test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built test data for parties, amounts and dates
//! - `builders`: Builders for invoice terms and a ready-made ledger harness
//! - `assertions`: Assertion helpers for ledger state and rejections
//! - `generators`: Property-based generators for amounts and action sequences

pub mod fixtures;
pub mod builders;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use assertions::*;
pub use generators::*;
