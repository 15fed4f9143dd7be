//! Escrow domain errors
//!
//! Every rejected precondition maps to exactly one variant. The `Display`
//! text of a variant is its published reason string and must not change.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use core_kernel::{Currency, InvoiceId, Money};
use crate::settlement::TransferError;

/// Broad failure class of an [`EscrowError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Caller is not the required party
    Authorization,
    /// A submitted value or argument is not acceptable
    Value,
    /// The invoice is not in a lifecycle state that allows the operation
    State,
    /// The referenced invoice or right does not exist
    NotFound,
    /// The external value transfer failed
    Settlement,
}

/// Errors that can occur in the escrow domain
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EscrowError {
    #[error("only buyer")]
    OnlyBuyer,

    #[error("only current holder")]
    OnlyCurrentHolder,

    #[error("wrong amount")]
    WrongAmount { expected: Money, submitted: Money },

    #[error("amount must be positive")]
    NonPositiveAmount,

    #[error("unsupported currency")]
    UnsupportedCurrency { expected: Currency, found: Currency },

    #[error("invalid party")]
    InvalidParty,

    #[error("buyer is supplier")]
    BuyerIsSupplier,

    #[error("invalid recipient")]
    InvalidRecipient,

    #[error("not delivered")]
    NotDelivered,

    #[error("already escrowed")]
    AlreadyEscrowed,

    #[error("custody overflow")]
    CustodyOverflow,

    #[error("already delivered")]
    AlreadyDelivered,

    #[error("already paid")]
    AlreadyPaid,

    #[error("nothing to release")]
    NothingToRelease,

    #[error("already minted")]
    AlreadyMinted(InvoiceId),

    #[error("invoice not found")]
    InvoiceNotFound(InvoiceId),

    #[error("transfer failed")]
    TransferFailed(#[source] TransferError),
}

impl EscrowError {
    /// Returns the failure class
    pub fn kind(&self) -> ErrorKind {
        use EscrowError::*;
        match self {
            OnlyBuyer | OnlyCurrentHolder => ErrorKind::Authorization,
            WrongAmount { .. }
            | NonPositiveAmount
            | UnsupportedCurrency { .. }
            | InvalidParty
            | BuyerIsSupplier
            | InvalidRecipient
            | CustodyOverflow => ErrorKind::Value,
            NotDelivered
            | AlreadyEscrowed
            | AlreadyDelivered
            | AlreadyPaid
            | NothingToRelease
            | AlreadyMinted(_) => ErrorKind::State,
            InvoiceNotFound(_) => ErrorKind::NotFound,
            TransferFailed(_) => ErrorKind::Settlement,
        }
    }

    /// Returns the stable, human-readable reason
    pub fn reason(&self) -> &'static str {
        use EscrowError::*;
        match self {
            OnlyBuyer => "only buyer",
            OnlyCurrentHolder => "only current holder",
            WrongAmount { .. } => "wrong amount",
            NonPositiveAmount => "amount must be positive",
            UnsupportedCurrency { .. } => "unsupported currency",
            InvalidParty => "invalid party",
            BuyerIsSupplier => "buyer is supplier",
            InvalidRecipient => "invalid recipient",
            NotDelivered => "not delivered",
            AlreadyEscrowed => "already escrowed",
            CustodyOverflow => "custody overflow",
            AlreadyDelivered => "already delivered",
            AlreadyPaid => "already paid",
            NothingToRelease => "nothing to release",
            AlreadyMinted(_) => "already minted",
            InvoiceNotFound(_) => "invoice not found",
            TransferFailed(_) => "transfer failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::PartyId;
    use rust_decimal_macros::dec;

    fn all_errors() -> Vec<EscrowError> {
        let eth = |v| Money::new(v, Currency::ETH);
        vec![
            EscrowError::OnlyBuyer,
            EscrowError::OnlyCurrentHolder,
            EscrowError::WrongAmount { expected: eth(dec!(0.02)), submitted: eth(dec!(0.01)) },
            EscrowError::NonPositiveAmount,
            EscrowError::UnsupportedCurrency { expected: Currency::ETH, found: Currency::USD },
            EscrowError::InvalidParty,
            EscrowError::BuyerIsSupplier,
            EscrowError::InvalidRecipient,
            EscrowError::NotDelivered,
            EscrowError::AlreadyEscrowed,
            EscrowError::CustodyOverflow,
            EscrowError::AlreadyDelivered,
            EscrowError::AlreadyPaid,
            EscrowError::NothingToRelease,
            EscrowError::AlreadyMinted(InvoiceId::first()),
            EscrowError::InvoiceNotFound(InvoiceId::first()),
            EscrowError::TransferFailed(TransferError::Rejected {
                recipient: PartyId::new(),
                reason: "closed".to_string(),
            }),
        ]
    }

    #[test]
    fn test_display_matches_reason() {
        for error in all_errors() {
            assert_eq!(error.to_string(), error.reason());
        }
    }

    #[test]
    fn test_kinds() {
        assert_eq!(EscrowError::OnlyBuyer.kind(), ErrorKind::Authorization);
        assert_eq!(EscrowError::NonPositiveAmount.kind(), ErrorKind::Value);
        assert_eq!(EscrowError::CustodyOverflow.kind(), ErrorKind::Value);
        assert_eq!(EscrowError::NotDelivered.kind(), ErrorKind::State);
        assert_eq!(
            EscrowError::InvoiceNotFound(InvoiceId::new(9)).kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_transfer_failure_keeps_source() {
        use std::error::Error;
        let error = EscrowError::TransferFailed(TransferError::Unavailable("offline".to_string()));
        assert_eq!(error.kind(), ErrorKind::Settlement);
        assert!(error.source().is_some());
    }
}
