//! Core Kernel - Foundational types for the invoice escrow system
//!
//! This crate provides the building blocks shared by the escrow domain:
//! - Money types with exact fixed-point arithmetic
//! - Typed identifiers for parties, invoices and settlement transfers
//! - The kernel error type

pub mod money;
pub mod identifiers;
pub mod error;

pub use money::{Money, Currency, MoneyError};
pub use identifiers::{PartyId, InvoiceId, TransferId};
pub use error::CoreError;
