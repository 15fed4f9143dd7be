//! Property-Based Test Generators
//!
//! Provides proptest strategies for amounts and for random sequences of
//! ledger actions, plus a driver that applies an action to a ledger.

use core_kernel::{Currency, InvoiceId, Money, PartyId};
use domain_escrow::{EscrowError, EscrowLedger, InMemoryWallets};
use proptest::prelude::*;

use crate::fixtures::{MoneyFixtures, PartyFixtures};

/// Strategy for positive ETH amounts in wei, below 5 ETH
pub fn positive_eth_strategy() -> impl Strategy<Value = Money> {
    (1i64..5_000_000_000_000_000_000i64)
        .prop_map(|wei| Money::from_minor(wei, Currency::ETH))
}

/// Strategy for ETH amounts that are zero or negative
pub fn non_positive_eth_strategy() -> impl Strategy<Value = Money> {
    (-1_000_000_000_000i64..=0i64).prop_map(|wei| Money::from_minor(wei, Currency::ETH))
}

/// The pool of parties actions are drawn from
pub fn party_pool() -> [PartyId; 4] {
    [
        PartyFixtures::buyer(),
        PartyFixtures::supplier(),
        PartyFixtures::factor(),
        PartyFixtures::stranger(),
    ]
}

/// One externally triggered ledger action
///
/// Parties are indexes into [`party_pool`]. Invoice numbers may point past
/// the last created invoice.
#[derive(Debug, Clone)]
pub enum LedgerAction {
    Create { buyer: usize, supplier: usize, amount: Money },
    Escrow { caller: usize, invoice: u64, exact: bool },
    Confirm { caller: usize, invoice: u64 },
    Release { invoice: u64 },
    Transfer { caller: usize, invoice: u64, to: usize },
    Refuse { party: usize, refusing: bool },
}

fn party_index() -> impl Strategy<Value = usize> {
    0usize..4
}

fn invoice_number() -> impl Strategy<Value = u64> {
    1u64..6
}

/// Strategy for a single ledger action
pub fn ledger_action_strategy() -> impl Strategy<Value = LedgerAction> {
    prop_oneof![
        2 => (party_index(), party_index(), positive_eth_strategy())
            .prop_map(|(buyer, supplier, amount)| LedgerAction::Create { buyer, supplier, amount }),
        3 => (party_index(), invoice_number(), any::<bool>())
            .prop_map(|(caller, invoice, exact)| LedgerAction::Escrow { caller, invoice, exact }),
        3 => (party_index(), invoice_number())
            .prop_map(|(caller, invoice)| LedgerAction::Confirm { caller, invoice }),
        3 => invoice_number().prop_map(|invoice| LedgerAction::Release { invoice }),
        2 => (party_index(), invoice_number(), party_index())
            .prop_map(|(caller, invoice, to)| LedgerAction::Transfer { caller, invoice, to }),
        1 => (party_index(), any::<bool>())
            .prop_map(|(party, refusing)| LedgerAction::Refuse { party, refusing }),
    ]
}

/// Strategy for a sequence of ledger actions
pub fn ledger_actions_strategy(max_len: usize) -> impl Strategy<Value = Vec<LedgerAction>> {
    prop::collection::vec(ledger_action_strategy(), 1..max_len)
}

/// Applies `action` to `ledger`
///
/// A non-exact escrow submits the invoice amount plus one wei.
pub fn apply_action(
    ledger: &mut EscrowLedger<InMemoryWallets>,
    action: &LedgerAction,
) -> Result<(), EscrowError> {
    let parties = party_pool();
    match action {
        LedgerAction::Create { buyer, supplier, amount } => {
            let terms = crate::builders::InvoiceTermsBuilder::new()
                .with_buyer(parties[*buyer])
                .with_supplier(parties[*supplier])
                .with_amount(*amount)
                .build();
            ledger.create_invoice(terms).map(|_| ())
        }
        LedgerAction::Escrow { caller, invoice, exact } => {
            let id = InvoiceId::new(*invoice);
            let amount = ledger
                .get_invoice(id)
                .map(|inv| inv.amount)
                .unwrap_or_else(|_| MoneyFixtures::one_wei());
            let submitted = if *exact {
                amount
            } else {
                amount + MoneyFixtures::one_wei()
            };
            ledger.escrow_payment(parties[*caller], id, submitted)
        }
        LedgerAction::Confirm { caller, invoice } => {
            ledger.confirm_delivery(parties[*caller], InvoiceId::new(*invoice))
        }
        LedgerAction::Release { invoice } => {
            ledger.release_funds(InvoiceId::new(*invoice)).map(|_| ())
        }
        LedgerAction::Transfer { caller, invoice, to } => {
            ledger.transfer_right(parties[*caller], InvoiceId::new(*invoice), parties[*to])
        }
        LedgerAction::Refuse { party, refusing } => {
            ledger.settlement_mut().set_refusing(parties[*party], *refusing);
            Ok(())
        }
    }
}
