//! Invoice escrow ledger
//!
//! The ledger is the single entry point for every external action. It owns
//! the invoice records and the Right-to-Collect registry, and it is the only
//! component that calls the settlement port.
//!
//! # Atomicity
//!
//! Every operation checks all of its preconditions before mutating
//! anything. `release_funds` is the one operation that talks to the outside
//! world: it commits the paid state first, then pays, and rolls the commit
//! back if the payment fails.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use core_kernel::{Currency, InvoiceId, Money, MoneyError, PartyId};
use crate::error::EscrowError;
use crate::events::EscrowEvent;
use crate::invoice::{Invoice, InvoiceTerms};
use crate::right_to_collect::RightToCollectRegistry;
use crate::settlement::{Settlement, TransferReceipt};

/// Outcome of a successful fund release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub invoice_id: InvoiceId,
    pub recipient: PartyId,
    pub amount: Money,
    pub receipt: TransferReceipt,
}

/// The escrow ledger
///
/// # Invariants
///
/// - Invoice ids are dense: `1..=invoice_count()`
/// - Every invoice has exactly one right holder
/// - Every invoice holds either nothing or exactly its amount
/// - A paid invoice holds nothing and was delivered
#[derive(Debug)]
pub struct EscrowLedger<S> {
    /// Currency every invoice must be denominated in
    currency: Currency,
    /// Invoice records by id
    invoices: BTreeMap<InvoiceId, Invoice>,
    /// Holder relation
    rights: RightToCollectRegistry,
    /// Outgoing value transfer
    settlement: S,
    /// Id for the next created invoice
    next_id: InvoiceId,
    /// Events of successful operations, oldest first
    events: Vec<EscrowEvent>,
}

impl<S: Settlement> EscrowLedger<S> {
    /// Creates an empty ledger
    ///
    /// # Arguments
    ///
    /// * `currency` - Currency of every invoice on this ledger
    /// * `settlement` - Port used to pay released funds
    pub fn new(currency: Currency, settlement: S) -> Self {
        Self {
            currency,
            invoices: BTreeMap::new(),
            rights: RightToCollectRegistry::new(),
            settlement,
            next_id: InvoiceId::first(),
            events: Vec::new(),
        }
    }

    /// Records a new invoice and mints its right to the supplier
    ///
    /// # Errors
    ///
    /// - `NonPositiveAmount` if the amount is zero or negative
    /// - `UnsupportedCurrency` if the amount is not in the ledger currency
    /// - `InvalidParty` if buyer or supplier is the nil party
    /// - `BuyerIsSupplier` if both are the same party
    #[instrument(skip_all, fields(reference = %terms.reference, amount = %terms.amount))]
    pub fn create_invoice(&mut self, terms: InvoiceTerms) -> Result<InvoiceId, EscrowError> {
        self.try_create_invoice(terms).map_err(rejected)
    }

    fn try_create_invoice(&mut self, terms: InvoiceTerms) -> Result<InvoiceId, EscrowError> {
        if !terms.amount.is_positive() {
            return Err(EscrowError::NonPositiveAmount);
        }
        if terms.amount.currency() != self.currency {
            return Err(EscrowError::UnsupportedCurrency {
                expected: self.currency,
                found: terms.amount.currency(),
            });
        }
        if terms.buyer.is_nil() || terms.supplier.is_nil() {
            return Err(EscrowError::InvalidParty);
        }
        if terms.buyer == terms.supplier {
            return Err(EscrowError::BuyerIsSupplier);
        }

        let id = self.next_id;
        self.rights.mint(id, terms.supplier)?;

        let now = Utc::now();
        self.events.push(EscrowEvent::InvoiceCreated {
            invoice_id: id,
            buyer: terms.buyer,
            supplier: terms.supplier,
            amount: terms.amount,
            due_date: terms.due_date,
            reference: terms.reference.clone(),
            timestamp: now,
        });
        self.invoices.insert(id, Invoice::open(id, terms, now));
        self.next_id = id.next();

        info!(invoice_id = %id, "Invoice created");
        Ok(id)
    }

    /// Locks the invoice amount submitted by the buyer
    ///
    /// # Arguments
    ///
    /// * `caller` - Authenticated submitter
    /// * `id` - Invoice to fund
    /// * `submitted` - Value attached to the call; must equal the invoice amount
    ///
    /// # Errors
    ///
    /// - `InvoiceNotFound` if the invoice does not exist
    /// - `OnlyBuyer` if the caller is not the buyer
    /// - `WrongAmount` if `submitted` differs from the amount
    /// - `AlreadyPaid` / `AlreadyEscrowed` if funds were already locked
    /// - `CustodyOverflow` if the total held would exceed what `Money` can represent
    #[instrument(skip_all, fields(invoice_id = %id, %caller, %submitted))]
    pub fn escrow_payment(
        &mut self,
        caller: PartyId,
        id: InvoiceId,
        submitted: Money,
    ) -> Result<(), EscrowError> {
        self.try_escrow_payment(caller, id, submitted).map_err(rejected)
    }

    fn try_escrow_payment(
        &mut self,
        caller: PartyId,
        id: InvoiceId,
        submitted: Money,
    ) -> Result<(), EscrowError> {
        let invoice = self
            .invoices
            .get(&id)
            .ok_or(EscrowError::InvoiceNotFound(id))?;

        if caller != invoice.buyer {
            return Err(EscrowError::OnlyBuyer);
        }
        if submitted != invoice.amount {
            return Err(EscrowError::WrongAmount {
                expected: invoice.amount,
                submitted,
            });
        }
        if invoice.paid {
            return Err(EscrowError::AlreadyPaid);
        }
        if !invoice.escrowed.is_zero() {
            return Err(EscrowError::AlreadyEscrowed);
        }
        let amount = invoice.amount;
        self.checked_custody()
            .and_then(|custody| custody.checked_add(&amount))
            .map_err(|_| EscrowError::CustodyOverflow)?;

        let invoice = self
            .invoices
            .get_mut(&id)
            .ok_or(EscrowError::InvoiceNotFound(id))?;
        let now = Utc::now();
        invoice.hold(now);
        debug_assert!(invoice.is_consistent());

        self.events.push(EscrowEvent::PaymentEscrowed {
            invoice_id: id,
            amount: invoice.amount,
            timestamp: now,
        });

        info!(escrowed = %invoice.escrowed, "Payment escrowed");
        Ok(())
    }

    /// Attests delivery; only the current right holder may do so
    ///
    /// Does not require the invoice to be funded.
    ///
    /// # Errors
    ///
    /// - `InvoiceNotFound` if the invoice does not exist
    /// - `OnlyCurrentHolder` if the caller does not hold the right
    /// - `AlreadyDelivered` if delivery was already confirmed
    #[instrument(skip_all, fields(invoice_id = %id, %caller))]
    pub fn confirm_delivery(&mut self, caller: PartyId, id: InvoiceId) -> Result<(), EscrowError> {
        self.try_confirm_delivery(caller, id).map_err(rejected)
    }

    fn try_confirm_delivery(&mut self, caller: PartyId, id: InvoiceId) -> Result<(), EscrowError> {
        let invoice = self
            .invoices
            .get_mut(&id)
            .ok_or(EscrowError::InvoiceNotFound(id))?;

        let holder = self.rights.current_holder(id)?;
        if caller != holder {
            return Err(EscrowError::OnlyCurrentHolder);
        }
        if invoice.delivered {
            return Err(EscrowError::AlreadyDelivered);
        }

        let now = Utc::now();
        invoice.mark_delivered(now);

        self.events.push(EscrowEvent::DeliveryConfirmed {
            invoice_id: id,
            confirmed_by: caller,
            timestamp: now,
        });

        info!(state = ?invoice.state(), "Delivery confirmed");
        Ok(())
    }

    /// Pays the escrowed amount to the current right holder
    ///
    /// The invoice is marked paid and emptied before the settlement port is
    /// called, so the port only ever observes the committed state. If the
    /// holder lookup or the payment fails, the invoice is restored exactly.
    ///
    /// # Errors
    ///
    /// - `InvoiceNotFound` if the invoice does not exist
    /// - `NotDelivered` if delivery was not confirmed
    /// - `AlreadyPaid` if the funds were already released
    /// - `NothingToRelease` if nothing was escrowed
    /// - `TransferFailed` if the settlement port failed; nothing changed
    #[instrument(skip_all, fields(invoice_id = %id))]
    pub fn release_funds(&mut self, id: InvoiceId) -> Result<Release, EscrowError> {
        self.try_release_funds(id).map_err(rejected)
    }

    fn try_release_funds(&mut self, id: InvoiceId) -> Result<Release, EscrowError> {
        let invoice = self
            .invoices
            .get_mut(&id)
            .ok_or(EscrowError::InvoiceNotFound(id))?;

        if !invoice.delivered {
            return Err(EscrowError::NotDelivered);
        }
        if invoice.paid {
            return Err(EscrowError::AlreadyPaid);
        }
        if !invoice.is_funded() {
            return Err(EscrowError::NothingToRelease);
        }

        let amount = invoice.amount;
        let previous_update = invoice.updated_at;
        let now = Utc::now();

        // Effects before interactions
        invoice.settle(now);

        let recipient = match self.rights.current_holder(id) {
            Ok(holder) => holder,
            Err(e) => {
                invoice.unsettle(previous_update);
                return Err(e);
            }
        };

        let receipt = match self.settlement.pay(invoice, recipient, amount) {
            Ok(receipt) => receipt,
            Err(e) => {
                error!(%recipient, error = %e, "Transfer failed, release rolled back");
                invoice.unsettle(previous_update);
                return Err(EscrowError::TransferFailed(e));
            }
        };
        debug_assert!(invoice.is_consistent());

        self.events.push(EscrowEvent::FundsReleased {
            invoice_id: id,
            amount,
            recipient,
            transfer_id: receipt.id,
            timestamp: now,
        });

        info!(%recipient, %amount, transfer_id = %receipt.id, "Funds released");
        Ok(Release {
            invoice_id: id,
            recipient,
            amount,
            receipt,
        })
    }

    /// Moves the right to collect to `new_holder`
    ///
    /// # Errors
    ///
    /// - `InvoiceNotFound` if the right does not exist
    /// - `OnlyCurrentHolder` if the caller is neither holder nor approved
    /// - `InvalidRecipient` if `new_holder` is the nil party
    #[instrument(skip_all, fields(invoice_id = %id, %caller, %new_holder))]
    pub fn transfer_right(
        &mut self,
        caller: PartyId,
        id: InvoiceId,
        new_holder: PartyId,
    ) -> Result<(), EscrowError> {
        let from = self
            .rights
            .transfer(caller, id, new_holder)
            .map_err(rejected)?;

        self.events.push(EscrowEvent::RightTransferred {
            invoice_id: id,
            from,
            to: new_holder,
            timestamp: Utc::now(),
        });

        info!(%from, "Right to collect transferred");
        Ok(())
    }

    /// Approves `spender` to transfer the right, or clears the approval
    #[instrument(skip_all, fields(invoice_id = %id, %caller))]
    pub fn approve_right(
        &mut self,
        caller: PartyId,
        id: InvoiceId,
        spender: Option<PartyId>,
    ) -> Result<(), EscrowError> {
        self.rights
            .approve(caller, id, spender)
            .map_err(rejected)?;

        self.events.push(EscrowEvent::RightApproved {
            invoice_id: id,
            holder: caller,
            spender,
            timestamp: Utc::now(),
        });
        Ok(())
    }
}

impl<S> EscrowLedger<S> {
    /// Returns the invoice record
    pub fn get_invoice(&self, id: InvoiceId) -> Result<&Invoice, EscrowError> {
        self.invoices.get(&id).ok_or(EscrowError::InvoiceNotFound(id))
    }

    /// Returns the party currently entitled to collect for `id`
    pub fn current_holder(&self, id: InvoiceId) -> Result<PartyId, EscrowError> {
        self.rights.current_holder(id)
    }

    /// All invoices in id order
    pub fn invoices(&self) -> impl Iterator<Item = &Invoice> {
        self.invoices.values()
    }

    /// Number of invoices ever created
    pub fn invoice_count(&self) -> u64 {
        self.next_id.value() - 1
    }

    /// Total value currently held in escrow
    ///
    /// Escrow refuses any payment that would make this sum overflow, so the
    /// addition below cannot fail.
    pub fn custody_balance(&self) -> Money {
        self.invoices
            .values()
            .fold(Money::zero(self.currency), |acc, invoice| acc + invoice.escrowed)
    }

    fn checked_custody(&self) -> Result<Money, MoneyError> {
        self.invoices
            .values()
            .try_fold(Money::zero(self.currency), |acc, invoice| {
                acc.checked_add(&invoice.escrowed)
            })
    }

    /// Ledger currency
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// The Right-to-Collect registry (read-only)
    pub fn rights(&self) -> &RightToCollectRegistry {
        &self.rights
    }

    /// The settlement adapter
    pub fn settlement(&self) -> &S {
        &self.settlement
    }

    /// Mutable access to the settlement adapter
    pub fn settlement_mut(&mut self) -> &mut S {
        &mut self.settlement
    }

    /// Events recorded so far, oldest first
    pub fn events(&self) -> &[EscrowEvent] {
        &self.events
    }

    /// Returns accumulated events and clears them
    pub fn take_events(&mut self) -> Vec<EscrowEvent> {
        std::mem::take(&mut self.events)
    }

    /// Checks every ledger invariant
    pub fn is_consistent(&self) -> bool {
        let dense = self
            .invoices
            .keys()
            .zip(1u64..)
            .all(|(id, expected)| id.value() == expected)
            && self.invoices.len() as u64 == self.invoice_count();
        let one_holder_each = self.rights.len() == self.invoices.len()
            && self
                .invoices
                .keys()
                .all(|id| self.rights.current_holder(*id).is_ok());
        let records_valid = self.invoices.values().all(Invoice::is_consistent);

        dense && one_holder_each && records_valid
    }
}

fn rejected(error: EscrowError) -> EscrowError {
    warn!(reason = error.reason(), kind = ?error.kind(), "Operation rejected");
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settlement::InMemoryWallets;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn eth(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, Currency::ETH)
    }

    fn setup() -> (EscrowLedger<InMemoryWallets>, PartyId, PartyId) {
        let ledger = EscrowLedger::new(Currency::ETH, InMemoryWallets::new(Currency::ETH));
        (ledger, PartyId::new(), PartyId::new())
    }

    fn terms(buyer: PartyId, supplier: PartyId, amount: Money) -> InvoiceTerms {
        InvoiceTerms::new(buyer, supplier, amount, Utc::now() + Duration::hours(1), "INV-003")
    }

    #[test]
    fn test_end_to_end_release() {
        let (mut ledger, buyer, supplier) = setup();

        let id = ledger.create_invoice(terms(buyer, supplier, eth(dec!(0.05)))).unwrap();
        ledger.escrow_payment(buyer, id, eth(dec!(0.05))).unwrap();
        assert_eq!(
            ledger.release_funds(id),
            Err(EscrowError::NotDelivered)
        );
        ledger.confirm_delivery(supplier, id).unwrap();
        let release = ledger.release_funds(id).unwrap();

        assert_eq!(release.recipient, supplier);
        assert_eq!(ledger.settlement().balance_of(supplier), eth(dec!(0.05)));
        assert!(ledger.get_invoice(id).unwrap().paid);
        assert!(ledger.custody_balance().is_zero());
        assert!(ledger.is_consistent());
    }

    #[test]
    fn test_failed_create_does_not_consume_id() {
        let (mut ledger, buyer, supplier) = setup();

        let result = ledger.create_invoice(terms(buyer, buyer, eth(dec!(1))));
        assert_eq!(result, Err(EscrowError::BuyerIsSupplier));
        assert_eq!(ledger.invoice_count(), 0);

        let id = ledger.create_invoice(terms(buyer, supplier, eth(dec!(1)))).unwrap();
        assert_eq!(id, InvoiceId::first());
    }

    #[test]
    fn test_events_only_for_success() {
        let (mut ledger, buyer, supplier) = setup();
        let id = ledger.create_invoice(terms(buyer, supplier, eth(dec!(1)))).unwrap();
        let _ = ledger.escrow_payment(PartyId::new(), id, eth(dec!(1)));

        let events = ledger.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), "InvoiceCreated");
        assert!(ledger.events().is_empty());
    }
}
