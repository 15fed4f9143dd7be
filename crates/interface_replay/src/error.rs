//! Replay error handling

use thiserror::Error;

use core_kernel::MoneyError;
use domain_escrow::TransferError;

/// Errors that stop a replay before or during a step
///
/// Ledger rejections are not errors here; they are recorded as step
/// outcomes and compared against the scenario's expectations.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Invalid scenario: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown party '{0}'")]
    UnknownParty(String),

    #[error("Duplicate party '{0}'")]
    DuplicateParty(String),

    /// Name set aside for the null identity
    #[error("Reserved party name '{0}'")]
    ReservedParty(String),

    #[error("Invalid due date: {0} hours from now")]
    InvalidDueDate(i64),

    #[error("Invalid amount: {0}")]
    Money(#[from] MoneyError),

    #[error("Wallet error: {0}")]
    Wallet(#[from] TransferError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
