//! Custom Test Assertions
//!
//! Provides assertion helpers for ledger state that give more meaningful
//! failure messages than bare `assert!`.

use std::fmt::Debug;

use core_kernel::{Money, PartyId};
use domain_escrow::{ErrorKind, EscrowError, EscrowLedger, InMemoryWallets};

/// Asserts that a Money value is zero
pub fn assert_money_zero(money: &Money) {
    assert!(
        money.is_zero(),
        "Expected zero money, got {}",
        money
    );
}

/// Asserts that an operation was rejected with the given reason
///
/// # Panics
///
/// Panics if `result` is `Ok` or the reason differs
pub fn assert_rejected<T: Debug>(result: Result<T, EscrowError>, reason: &str) -> EscrowError {
    match result {
        Ok(value) => panic!("Expected rejection '{}', got Ok({:?})", reason, value),
        Err(error) => {
            assert_eq!(
                error.reason(),
                reason,
                "Rejected for '{}' instead of '{}'",
                error.reason(),
                reason
            );
            error
        }
    }
}

/// Asserts that an operation was rejected with the given failure class
pub fn assert_rejected_kind<T: Debug>(result: Result<T, EscrowError>, kind: ErrorKind) {
    match result {
        Ok(value) => panic!("Expected {:?} rejection, got Ok({:?})", kind, value),
        Err(error) => assert_eq!(error.kind(), kind, "Unexpected error: {}", error),
    }
}

/// Asserts every ledger invariant and that custody equals the sum of escrows
pub fn assert_ledger_consistent(ledger: &EscrowLedger<InMemoryWallets>) {
    assert!(ledger.is_consistent(), "Ledger invariants violated: {:#?}", ledger);

    for invoice in ledger.invoices() {
        assert!(
            invoice.escrowed.is_zero() || invoice.escrowed == invoice.amount,
            "Invoice {} holds partial escrow {}",
            invoice.id,
            invoice.escrowed
        );
        if invoice.paid {
            assert!(invoice.delivered, "Invoice {} paid without delivery", invoice.id);
            assert_money_zero(&invoice.escrowed);
        }
    }
}

/// Asserts that `party` received exactly `expected` through payouts
pub fn assert_received(ledger: &EscrowLedger<InMemoryWallets>, party: PartyId, expected: Money) {
    let balance = ledger.settlement().balance_of(party);
    assert_eq!(
        balance, expected,
        "Party {} received {} instead of {}",
        party, balance, expected
    );
}
