//! Scenario Replay Layer
//!
//! Drives the escrow ledger from JSON scenario files. This is the outer
//! surface of the system: configuration, logging setup and the
//! `escrow-replay` binary live here, the domain crates stay free of them.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_replay::{run_scenario, Scenario};
//!
//! let scenario = Scenario::from_json(&std::fs::read_to_string(path)?)?;
//! let report = run_scenario(&scenario, Currency::ETH)?;
//! assert!(report.passed());
//! ```

pub mod config;
pub mod error;
pub mod runner;
pub mod scenario;

pub use config::{LogFormat, ReplayConfig};
pub use error::ReplayError;
pub use runner::{run_scenario, InvoiceReport, ReplayReport, StepOutcome, StepReport};
pub use scenario::{Action, Scenario, ScenarioStep};
