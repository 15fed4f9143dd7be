//! Invoice Escrow Domain
//!
//! This crate implements invoice escrow with transferable collection
//! rights. A buyer locks the invoice amount with the ledger, the party
//! holding the invoice's Right-to-Collect attests delivery, and anyone may
//! then trigger the release that pays the current right holder.
//!
//! # Invoice Lifecycle
//!
//! ```text
//! Created -> Escrowed ----------> ReadyForRelease -> Paid
//!        \-> Delivered ---------/
//! ```
//!
//! The right to collect is minted to the supplier when an invoice is
//! created and may be transferred at any point, including after payment.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_escrow::{EscrowLedger, InMemoryWallets, InvoiceTerms};
//!
//! let mut ledger = EscrowLedger::new(Currency::ETH, InMemoryWallets::new(Currency::ETH));
//! let id = ledger.create_invoice(InvoiceTerms::new(buyer, supplier, amount, due, "INV-003"))?;
//!
//! ledger.escrow_payment(buyer, id, amount)?;
//! ledger.confirm_delivery(supplier, id)?;
//! let release = ledger.release_funds(id)?;
//! ```

pub mod error;
pub mod events;
pub mod invoice;
pub mod ledger;
pub mod right_to_collect;
pub mod settlement;

pub use error::{ErrorKind, EscrowError};
pub use events::EscrowEvent;
pub use invoice::{Invoice, InvoiceTerms, LifecycleState};
pub use ledger::{EscrowLedger, Release};
pub use right_to_collect::RightToCollectRegistry;
pub use settlement::{InMemoryWallets, Settlement, TransferError, TransferReceipt};
