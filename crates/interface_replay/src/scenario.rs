//! Scenario documents
//!
//! A scenario names its parties symbolically and lists the actions to
//! replay. Amounts are decimal strings in the scenario currency; invoices
//! are referred to by their sequential number.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::Currency;

/// Party name that always resolves to the nil identity
pub const NIL_PARTY: &str = "nil";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Ledger currency; the configured currency when absent
    #[serde(default)]
    pub currency: Option<Currency>,
    pub parties: Vec<String>,
    pub steps: Vec<ScenarioStep>,
}

impl Scenario {
    /// Parses a scenario from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioStep {
    #[serde(flatten)]
    pub action: Action,
    /// Reason the step is expected to be rejected with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect_error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    CreateInvoice {
        buyer: String,
        supplier: String,
        amount: Decimal,
        #[serde(default = "default_due_in_hours")]
        due_in_hours: i64,
        #[serde(default)]
        reference: String,
    },
    EscrowPayment {
        caller: String,
        invoice: u64,
        amount: Decimal,
    },
    ConfirmDelivery {
        caller: String,
        invoice: u64,
    },
    ReleaseFunds {
        invoice: u64,
    },
    TransferRight {
        caller: String,
        invoice: u64,
        to: String,
    },
    ApproveRight {
        caller: String,
        invoice: u64,
        #[serde(default)]
        spender: Option<String>,
    },
    /// Credits a wallet outside of any invoice
    FundWallet {
        party: String,
        amount: Decimal,
    },
    /// Makes a party refuse (or accept again) incoming payments
    RejectPayments {
        party: String,
        #[serde(default = "default_enabled")]
        enabled: bool,
    },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::CreateInvoice { .. } => "create_invoice",
            Action::EscrowPayment { .. } => "escrow_payment",
            Action::ConfirmDelivery { .. } => "confirm_delivery",
            Action::ReleaseFunds { .. } => "release_funds",
            Action::TransferRight { .. } => "transfer_right",
            Action::ApproveRight { .. } => "approve_right",
            Action::FundWallet { .. } => "fund_wallet",
            Action::RejectPayments { .. } => "reject_payments",
        }
    }
}

fn default_due_in_hours() -> i64 {
    24
}

fn default_enabled() -> bool {
    true
}
