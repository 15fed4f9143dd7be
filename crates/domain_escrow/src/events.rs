//! Domain events for the escrow ledger
//!
//! Events are recorded only for operations that succeeded, in the order
//! the operations were applied. They are the notification surface for
//! downstream indexers and audit trails.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{InvoiceId, Money, PartyId, TransferId};

/// Events emitted by the escrow ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscrowEvent {
    /// A new invoice was recorded and its right minted to the supplier
    InvoiceCreated {
        invoice_id: InvoiceId,
        buyer: PartyId,
        supplier: PartyId,
        amount: Money,
        due_date: DateTime<Utc>,
        reference: String,
        timestamp: DateTime<Utc>,
    },

    /// The buyer locked the invoice amount
    PaymentEscrowed {
        invoice_id: InvoiceId,
        amount: Money,
        timestamp: DateTime<Utc>,
    },

    /// The right holder attested delivery
    DeliveryConfirmed {
        invoice_id: InvoiceId,
        confirmed_by: PartyId,
        timestamp: DateTime<Utc>,
    },

    /// Escrowed funds were paid to the right holder
    FundsReleased {
        invoice_id: InvoiceId,
        amount: Money,
        recipient: PartyId,
        transfer_id: TransferId,
        timestamp: DateTime<Utc>,
    },

    /// The right to collect changed hands
    RightTransferred {
        invoice_id: InvoiceId,
        from: PartyId,
        to: PartyId,
        timestamp: DateTime<Utc>,
    },

    /// The holder approved (or cleared) a spender for the right
    RightApproved {
        invoice_id: InvoiceId,
        holder: PartyId,
        spender: Option<PartyId>,
        timestamp: DateTime<Utc>,
    },
}

impl EscrowEvent {
    /// Returns the invoice this event belongs to
    pub fn invoice_id(&self) -> InvoiceId {
        match self {
            EscrowEvent::InvoiceCreated { invoice_id, .. } => *invoice_id,
            EscrowEvent::PaymentEscrowed { invoice_id, .. } => *invoice_id,
            EscrowEvent::DeliveryConfirmed { invoice_id, .. } => *invoice_id,
            EscrowEvent::FundsReleased { invoice_id, .. } => *invoice_id,
            EscrowEvent::RightTransferred { invoice_id, .. } => *invoice_id,
            EscrowEvent::RightApproved { invoice_id, .. } => *invoice_id,
        }
    }

    /// Returns the timestamp of this event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            EscrowEvent::InvoiceCreated { timestamp, .. } => *timestamp,
            EscrowEvent::PaymentEscrowed { timestamp, .. } => *timestamp,
            EscrowEvent::DeliveryConfirmed { timestamp, .. } => *timestamp,
            EscrowEvent::FundsReleased { timestamp, .. } => *timestamp,
            EscrowEvent::RightTransferred { timestamp, .. } => *timestamp,
            EscrowEvent::RightApproved { timestamp, .. } => *timestamp,
        }
    }

    /// Returns the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            EscrowEvent::InvoiceCreated { .. } => "InvoiceCreated",
            EscrowEvent::PaymentEscrowed { .. } => "PaymentEscrowed",
            EscrowEvent::DeliveryConfirmed { .. } => "DeliveryConfirmed",
            EscrowEvent::FundsReleased { .. } => "FundsReleased",
            EscrowEvent::RightTransferred { .. } => "RightTransferred",
            EscrowEvent::RightApproved { .. } => "RightApproved",
        }
    }
}
