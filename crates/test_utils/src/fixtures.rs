//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for the escrow ledger. Party ids are
//! derived from fixed UUIDs so failures are reproducible.

use chrono::{DateTime, Utc};
use core_kernel::{Currency, Money, PartyId};
use rust_decimal_macros::dec;
use uuid::Uuid;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// 0.02 ETH
    pub fn eth_002() -> Money {
        Money::new(dec!(0.02), Currency::ETH)
    }

    /// 0.01 ETH, a wrong submission for [`MoneyFixtures::eth_002`]
    pub fn eth_001() -> Money {
        Money::new(dec!(0.01), Currency::ETH)
    }

    /// 0.05 ETH
    pub fn eth_005() -> Money {
        Money::new(dec!(0.05), Currency::ETH)
    }

    /// 1 wei, the smallest ETH amount
    pub fn one_wei() -> Money {
        Money::from_minor(1, Currency::ETH)
    }

    /// Zero ETH
    pub fn eth_zero() -> Money {
        Money::zero(Currency::ETH)
    }

    /// A USDC amount for currency mismatch tests
    pub fn usdc_100() -> Money {
        Money::new(dec!(100), Currency::USDC)
    }
}

/// Fixture for the parties taking part in a scenario
pub struct PartyFixtures;

impl PartyFixtures {
    /// The buyer who escrows payment
    pub fn buyer() -> PartyId {
        PartyId::from_uuid(Uuid::from_u128(0xB0B0_0000_0000_0000_0000_0000_0000_0001))
    }

    /// The supplier who raises the invoice
    pub fn supplier() -> PartyId {
        PartyId::from_uuid(Uuid::from_u128(0x5A5A_0000_0000_0000_0000_0000_0000_0002))
    }

    /// A factor who buys the right to collect
    pub fn factor() -> PartyId {
        PartyId::from_uuid(Uuid::from_u128(0xFAC7_0000_0000_0000_0000_0000_0000_0003))
    }

    /// A party with no role in the invoice
    pub fn stranger() -> PartyId {
        PartyId::from_uuid(Uuid::from_u128(0xDEAD_0000_0000_0000_0000_0000_0000_0004))
    }

    /// The null identity
    pub fn nil() -> PartyId {
        PartyId::nil()
    }
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Due date one hour from now
    pub fn due_in_one_hour() -> DateTime<Utc> {
        Utc::now() + chrono::Duration::hours(1)
    }

    /// Due date already in the past
    pub fn overdue() -> DateTime<Utc> {
        Utc::now() - chrono::Duration::days(30)
    }
}

/// Fixture for invoice references
pub struct StringFixtures;

impl StringFixtures {
    pub fn reference() -> &'static str {
        "INV-003"
    }
}
