//! Settlement port
//!
//! The ledger moves value out of escrow through a single port. Whatever
//! sits behind it (a chain client, a payment rail, the in-memory wallets
//! below) is called exactly once per release, after the ledger has already
//! committed the invoice as paid.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use core_kernel::{Currency, InvoiceId, Money, PartyId, TransferId};
use crate::invoice::Invoice;

/// Error returned by a settlement adapter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// The recipient refused the funds
    #[error("Recipient {recipient} rejected transfer: {reason}")]
    Rejected { recipient: PartyId, reason: String },

    /// The amount cannot be paid by this adapter
    #[error("Invalid transfer amount: {0}")]
    InvalidAmount(String),

    /// The underlying payment system could not be reached.
    /// Reserved for networked adapters; `InMemoryWallets` never returns it.
    #[error("Settlement unavailable: {0}")]
    Unavailable(String),
}

/// Proof of a completed outgoing transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub id: TransferId,
    pub invoice_id: InvoiceId,
    pub recipient: PartyId,
    pub amount: Money,
    pub settled_at: DateTime<Utc>,
}

/// Outgoing value transfer used by fund release
pub trait Settlement {
    /// Pays `amount` to `recipient` on behalf of `invoice`
    ///
    /// `invoice` is the ledger's committed record at the time of the call:
    /// it is already marked paid and holds nothing.
    fn pay(
        &mut self,
        invoice: &Invoice,
        recipient: PartyId,
        amount: Money,
    ) -> Result<TransferReceipt, TransferError>;
}

impl<S: Settlement + ?Sized> Settlement for Box<S> {
    fn pay(
        &mut self,
        invoice: &Invoice,
        recipient: PartyId,
        amount: Money,
    ) -> Result<TransferReceipt, TransferError> {
        (**self).pay(invoice, recipient, amount)
    }
}

/// In-memory party balances
///
/// Credits released funds to recipients and keeps the payout history.
/// Individual parties can be marked as refusing payments to exercise the
/// release rollback path.
#[derive(Debug, Clone)]
pub struct InMemoryWallets {
    currency: Currency,
    balances: HashMap<PartyId, Money>,
    refusing: HashSet<PartyId>,
    payouts: Vec<TransferReceipt>,
}

impl InMemoryWallets {
    /// Creates empty wallets for the given currency
    pub fn new(currency: Currency) -> Self {
        Self {
            currency,
            balances: HashMap::new(),
            refusing: HashSet::new(),
            payouts: Vec::new(),
        }
    }

    /// Returns the wallet currency
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Current balance of `party`, zero if it never received anything
    pub fn balance_of(&self, party: PartyId) -> Money {
        self.balances
            .get(&party)
            .copied()
            .unwrap_or_else(|| Money::zero(self.currency))
    }

    /// Adds funds to a party's wallet outside of any invoice
    ///
    /// Only positive amounts are accepted.
    pub fn fund(&mut self, party: PartyId, amount: Money) -> Result<Money, TransferError> {
        if !amount.is_positive() {
            return Err(TransferError::InvalidAmount(amount.to_string()));
        }
        self.credit(party, amount)
    }

    /// Makes `party` refuse (or accept again) incoming payments
    pub fn set_refusing(&mut self, party: PartyId, refusing: bool) {
        if refusing {
            self.refusing.insert(party);
        } else {
            self.refusing.remove(&party);
        }
    }

    /// Receipts of every completed payout, oldest first
    pub fn payouts(&self) -> &[TransferReceipt] {
        &self.payouts
    }

    fn credit(&mut self, party: PartyId, amount: Money) -> Result<Money, TransferError> {
        let balance = self.balance_of(party);
        let updated = balance
            .checked_add(&amount)
            .map_err(|e| TransferError::InvalidAmount(e.to_string()))?;
        self.balances.insert(party, updated);
        Ok(updated)
    }
}

impl Settlement for InMemoryWallets {
    fn pay(
        &mut self,
        invoice: &Invoice,
        recipient: PartyId,
        amount: Money,
    ) -> Result<TransferReceipt, TransferError> {
        if self.refusing.contains(&recipient) {
            return Err(TransferError::Rejected {
                recipient,
                reason: "recipient does not accept payments".to_string(),
            });
        }
        if !amount.is_positive() {
            return Err(TransferError::InvalidAmount(amount.to_string()));
        }

        let balance = self.credit(recipient, amount)?;
        debug!(invoice_id = %invoice.id, %recipient, %amount, %balance, "Wallet credited");

        let receipt = TransferReceipt {
            id: TransferId::new_v7(),
            invoice_id: invoice.id,
            recipient,
            amount,
            settled_at: Utc::now(),
        };
        self.payouts.push(receipt.clone());
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::InvoiceTerms;
    use rust_decimal_macros::dec;

    fn paid_invoice(supplier: PartyId) -> Invoice {
        let now = Utc::now();
        let terms = InvoiceTerms::new(
            PartyId::new(),
            supplier,
            Money::new(dec!(0.05), Currency::ETH),
            now,
            "INV-003",
        );
        let mut invoice = Invoice::open(InvoiceId::first(), terms, now);
        invoice.hold(now);
        invoice.mark_delivered(now);
        invoice.settle(now);
        invoice
    }

    #[test]
    fn test_pay_credits_recipient() {
        let supplier = PartyId::new();
        let invoice = paid_invoice(supplier);
        let mut wallets = InMemoryWallets::new(Currency::ETH);

        let receipt = wallets.pay(&invoice, supplier, invoice.amount).unwrap();

        assert_eq!(receipt.amount, invoice.amount);
        assert_eq!(wallets.balance_of(supplier), invoice.amount);
        assert_eq!(wallets.payouts().len(), 1);
    }

    #[test]
    fn test_refusing_recipient() {
        let supplier = PartyId::new();
        let invoice = paid_invoice(supplier);
        let mut wallets = InMemoryWallets::new(Currency::ETH);
        wallets.set_refusing(supplier, true);

        let result = wallets.pay(&invoice, supplier, invoice.amount);

        assert!(matches!(result, Err(TransferError::Rejected { .. })));
        assert!(wallets.balance_of(supplier).is_zero());
        assert!(wallets.payouts().is_empty());
    }

    #[test]
    fn test_currency_mismatch_is_rejected() {
        let supplier = PartyId::new();
        let invoice = paid_invoice(supplier);
        let mut wallets = InMemoryWallets::new(Currency::USDC);

        let result = wallets.pay(&invoice, supplier, invoice.amount);

        assert!(matches!(result, Err(TransferError::InvalidAmount(_))));
    }

    #[test]
    fn test_fund_accumulates() {
        let party = PartyId::new();
        let mut wallets = InMemoryWallets::new(Currency::ETH);

        wallets.fund(party, Money::new(dec!(1), Currency::ETH)).unwrap();
        let balance = wallets.fund(party, Money::new(dec!(0.5), Currency::ETH)).unwrap();

        assert_eq!(balance, Money::new(dec!(1.5), Currency::ETH));
        assert!(wallets.payouts().is_empty());
    }

    #[test]
    fn test_fund_rejects_non_positive_amounts() {
        let party = PartyId::new();
        let mut wallets = InMemoryWallets::new(Currency::ETH);
        wallets.fund(party, Money::new(dec!(1), Currency::ETH)).unwrap();

        let zero = wallets.fund(party, Money::zero(Currency::ETH));
        let negative = wallets.fund(party, Money::new(dec!(-0.4), Currency::ETH));

        assert!(matches!(zero, Err(TransferError::InvalidAmount(_))));
        assert!(matches!(negative, Err(TransferError::InvalidAmount(_))));
        assert_eq!(wallets.balance_of(party), Money::new(dec!(1), Currency::ETH));
    }
}
