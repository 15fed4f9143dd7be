//! Core error types used across the system

use thiserror::Error;
use crate::money::MoneyError;

/// Core error type for the kernel
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
}

impl CoreError {
    pub fn invalid_identifier(message: impl Into<String>) -> Self {
        CoreError::InvalidIdentifier(message.into())
    }
}

impl From<uuid::Error> for CoreError {
    fn from(error: uuid::Error) -> Self {
        CoreError::InvalidIdentifier(error.to_string())
    }
}

impl From<std::num::ParseIntError> for CoreError {
    fn from(error: std::num::ParseIntError) -> Self {
        CoreError::InvalidIdentifier(error.to_string())
    }
}
