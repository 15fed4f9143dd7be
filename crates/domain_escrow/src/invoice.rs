//! Invoice records
//!
//! An [`Invoice`] is created once by the ledger and then only mutated in
//! place through the ledger's lifecycle operations. Callers outside this
//! crate receive shared references and cannot change a record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{InvoiceId, Money, PartyId};

/// Position of an invoice in its escrow lifecycle
///
/// ```text
/// Created -> Escrowed ----------> ReadyForRelease -> Paid
///        \-> Delivered ---------/
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    /// Recorded, nothing escrowed, delivery not confirmed
    Created,
    /// Funds held by the ledger, delivery not yet confirmed
    Escrowed,
    /// Delivery confirmed before any funds were escrowed
    Delivered,
    /// Funds held and delivery confirmed
    ReadyForRelease,
    /// Funds released to the right holder (terminal)
    Paid,
}

/// Terms agreed between buyer and supplier for a new invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceTerms {
    /// Party that escrows the payment
    pub buyer: PartyId,
    /// Party that receives the Right-to-Collect on creation
    pub supplier: PartyId,
    /// Amount to be escrowed and released
    pub amount: Money,
    /// Due date (informational)
    pub due_date: DateTime<Utc>,
    /// External reconciliation reference
    pub reference: String,
}

impl InvoiceTerms {
    /// Creates invoice terms
    ///
    /// # Arguments
    ///
    /// * `buyer` - Party that will escrow the payment
    /// * `supplier` - Party that initially holds the right to collect
    /// * `amount` - Invoice amount
    /// * `due_date` - Informational due date
    /// * `reference` - Opaque reference for external reconciliation
    pub fn new(
        buyer: PartyId,
        supplier: PartyId,
        amount: Money,
        due_date: DateTime<Utc>,
        reference: impl Into<String>,
    ) -> Self {
        Self {
            buyer,
            supplier,
            amount,
            due_date,
            reference: reference.into(),
        }
    }
}

/// An escrowed invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Sequential identifier
    pub id: InvoiceId,
    /// Buyer who escrows the payment
    pub buyer: PartyId,
    /// Supplier the invoice was raised by; the right may since have moved
    pub original_supplier: PartyId,
    /// Invoice amount
    pub amount: Money,
    /// Due date
    pub due_date: DateTime<Utc>,
    /// External reference
    pub reference: String,
    /// Funds currently held for this invoice, either zero or `amount`
    pub escrowed: Money,
    /// Delivery has been attested by the right holder
    pub delivered: bool,
    /// Funds have been released
    pub paid: bool,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    pub(crate) fn open(id: InvoiceId, terms: InvoiceTerms, now: DateTime<Utc>) -> Self {
        let currency = terms.amount.currency();
        Self {
            id,
            buyer: terms.buyer,
            original_supplier: terms.supplier,
            amount: terms.amount,
            due_date: terms.due_date,
            reference: terms.reference,
            escrowed: Money::zero(currency),
            delivered: false,
            paid: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the derived lifecycle state
    pub fn state(&self) -> LifecycleState {
        if self.paid {
            return LifecycleState::Paid;
        }
        match (self.is_funded(), self.delivered) {
            (false, false) => LifecycleState::Created,
            (true, false) => LifecycleState::Escrowed,
            (false, true) => LifecycleState::Delivered,
            (true, true) => LifecycleState::ReadyForRelease,
        }
    }

    /// Returns true while the full amount is held by the ledger
    pub fn is_funded(&self) -> bool {
        self.escrowed == self.amount
    }

    /// Returns true if the due date has passed without payment
    ///
    /// Purely informational: an overdue invoice follows the same rules as
    /// any other.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.paid && now > self.due_date
    }

    /// Checks the record-level invariants
    ///
    /// - `escrowed` is either zero or exactly `amount`
    /// - a paid invoice holds nothing and was delivered
    pub fn is_consistent(&self) -> bool {
        let escrow_valid = self.escrowed.is_zero() || self.escrowed == self.amount;
        let paid_valid = !self.paid || (self.escrowed.is_zero() && self.delivered);
        escrow_valid && paid_valid
    }

    pub(crate) fn hold(&mut self, now: DateTime<Utc>) {
        self.escrowed = self.amount;
        self.updated_at = now;
    }

    pub(crate) fn mark_delivered(&mut self, now: DateTime<Utc>) {
        self.delivered = true;
        self.updated_at = now;
    }

    /// Commits the paid state ahead of the outgoing transfer
    pub(crate) fn settle(&mut self, now: DateTime<Utc>) {
        self.paid = true;
        self.escrowed = Money::zero(self.amount.currency());
        self.updated_at = now;
    }

    /// Undoes [`Invoice::settle`] after a failed transfer
    pub(crate) fn unsettle(&mut self, previous_update: DateTime<Utc>) {
        self.paid = false;
        self.escrowed = self.amount;
        self.updated_at = previous_update;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn test_invoice() -> Invoice {
        let now = Utc::now();
        let terms = InvoiceTerms::new(
            PartyId::new(),
            PartyId::new(),
            Money::new(dec!(0.05), Currency::ETH),
            now + Duration::hours(1),
            "INV-003",
        );
        Invoice::open(InvoiceId::first(), terms, now)
    }

    #[test]
    fn test_new_invoice_is_created() {
        let invoice = test_invoice();
        assert_eq!(invoice.state(), LifecycleState::Created);
        assert!(invoice.escrowed.is_zero());
        assert!(invoice.is_consistent());
    }

    #[test]
    fn test_state_progression() {
        let mut invoice = test_invoice();
        let now = Utc::now();

        invoice.hold(now);
        assert_eq!(invoice.state(), LifecycleState::Escrowed);

        invoice.mark_delivered(now);
        assert_eq!(invoice.state(), LifecycleState::ReadyForRelease);

        invoice.settle(now);
        assert_eq!(invoice.state(), LifecycleState::Paid);
        assert!(invoice.is_consistent());
    }

    #[test]
    fn test_delivery_before_escrow() {
        let mut invoice = test_invoice();
        invoice.mark_delivered(Utc::now());
        assert_eq!(invoice.state(), LifecycleState::Delivered);
    }

    #[test]
    fn test_unsettle_restores_hold() {
        let mut invoice = test_invoice();
        let before = Utc::now();
        invoice.hold(before);
        invoice.mark_delivered(before);
        let snapshot = invoice.clone();

        invoice.settle(Utc::now());
        invoice.unsettle(before);

        assert_eq!(invoice, snapshot);
    }

    #[test]
    fn test_overdue_is_informational() {
        let invoice = test_invoice();
        assert!(!invoice.is_overdue(Utc::now()));
        assert!(invoice.is_overdue(invoice.due_date + Duration::seconds(1)));
        assert_eq!(invoice.state(), LifecycleState::Created);
    }
}
