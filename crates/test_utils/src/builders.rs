//! Test Data Builders
//!
//! Provides builders for invoice terms and a ledger harness wired to
//! in-memory wallets, so tests only spell out what they care about.

use chrono::{DateTime, Utc};
use core_kernel::{Currency, InvoiceId, Money, PartyId};
use domain_escrow::{EscrowError, EscrowLedger, InMemoryWallets, InvoiceTerms};

use crate::fixtures::{MoneyFixtures, PartyFixtures, StringFixtures, TemporalFixtures};

/// Builder for invoice terms
pub struct InvoiceTermsBuilder {
    buyer: PartyId,
    supplier: PartyId,
    amount: Money,
    due_date: DateTime<Utc>,
    reference: String,
}

impl Default for InvoiceTermsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceTermsBuilder {
    /// Creates a builder for a 0.05 ETH invoice due in one hour
    pub fn new() -> Self {
        Self {
            buyer: PartyFixtures::buyer(),
            supplier: PartyFixtures::supplier(),
            amount: MoneyFixtures::eth_005(),
            due_date: TemporalFixtures::due_in_one_hour(),
            reference: StringFixtures::reference().to_string(),
        }
    }

    pub fn with_buyer(mut self, buyer: PartyId) -> Self {
        self.buyer = buyer;
        self
    }

    pub fn with_supplier(mut self, supplier: PartyId) -> Self {
        self.supplier = supplier;
        self
    }

    pub fn with_amount(mut self, amount: Money) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = due_date;
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = reference.into();
        self
    }

    /// Builds the terms
    pub fn build(self) -> InvoiceTerms {
        InvoiceTerms::new(
            self.buyer,
            self.supplier,
            self.amount,
            self.due_date,
            self.reference,
        )
    }
}

/// An ETH ledger over in-memory wallets with the fixture parties
pub struct LedgerHarness {
    pub ledger: EscrowLedger<InMemoryWallets>,
    pub buyer: PartyId,
    pub supplier: PartyId,
    pub factor: PartyId,
}

impl Default for LedgerHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerHarness {
    pub fn new() -> Self {
        Self {
            ledger: EscrowLedger::new(Currency::ETH, InMemoryWallets::new(Currency::ETH)),
            buyer: PartyFixtures::buyer(),
            supplier: PartyFixtures::supplier(),
            factor: PartyFixtures::factor(),
        }
    }

    /// Creates an invoice between the harness buyer and supplier
    pub fn create(&mut self, amount: Money) -> Result<InvoiceId, EscrowError> {
        let terms = InvoiceTermsBuilder::new()
            .with_buyer(self.buyer)
            .with_supplier(self.supplier)
            .with_amount(amount)
            .build();
        self.ledger.create_invoice(terms)
    }

    /// Creates an invoice and escrows its amount
    pub fn create_escrowed(&mut self, amount: Money) -> Result<InvoiceId, EscrowError> {
        let id = self.create(amount)?;
        self.ledger.escrow_payment(self.buyer, id, amount)?;
        Ok(id)
    }

    /// Creates an invoice that is escrowed and delivered
    pub fn create_ready(&mut self, amount: Money) -> Result<InvoiceId, EscrowError> {
        let id = self.create_escrowed(amount)?;
        self.ledger.confirm_delivery(self.supplier, id)?;
        Ok(id)
    }

    /// Wallet balance of `party`
    pub fn balance_of(&self, party: PartyId) -> Money {
        self.ledger.settlement().balance_of(party)
    }
}
