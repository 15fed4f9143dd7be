//! Scenario runner
//!
//! Plays a [`Scenario`] against a fresh ledger backed by in-memory wallets
//! and reports every step outcome together with the final ledger state.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use core_kernel::{Currency, InvoiceId, Money, PartyId};
use domain_escrow::{
    ErrorKind, EscrowError, EscrowEvent, EscrowLedger, InMemoryWallets, InvoiceTerms,
    LifecycleState,
};

use crate::error::ReplayError;
use crate::scenario::{Action, Scenario, NIL_PARTY};

/// Result of one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Ok {
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
    Rejected {
        reason: String,
        kind: ErrorKind,
    },
}

impl StepOutcome {
    fn reason(&self) -> Option<&str> {
        match self {
            StepOutcome::Ok { .. } => None,
            StepOutcome::Rejected { reason, .. } => Some(reason),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    /// Position in the scenario, starting at 1
    pub index: usize,
    pub action: String,
    pub outcome: StepOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_error: Option<String>,
    /// Outcome matched the expectation
    pub met: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceReport {
    pub id: InvoiceId,
    pub reference: String,
    pub buyer: String,
    pub original_supplier: String,
    pub holder: String,
    pub amount: Money,
    pub escrowed: Money,
    pub state: LifecycleState,
    pub due_date: DateTime<Utc>,
    pub overdue: bool,
}

/// Outcome of a full replay
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub scenario: String,
    pub currency: Currency,
    pub steps: Vec<StepReport>,
    pub invoices: Vec<InvoiceReport>,
    /// Wallet balance per named party
    pub balances: BTreeMap<String, Money>,
    pub custody: Money,
    pub events: Vec<EscrowEvent>,
}

impl ReplayReport {
    /// Returns true if every step met its expectation
    pub fn passed(&self) -> bool {
        self.steps.iter().all(|step| step.met)
    }

    /// Steps whose outcome differed from the expectation
    pub fn failures(&self) -> impl Iterator<Item = &StepReport> {
        self.steps.iter().filter(|step| !step.met)
    }
}

/// Replays `scenario` and reports the outcome
///
/// # Arguments
///
/// * `scenario` - Scenario to play
/// * `default_currency` - Ledger currency when the scenario names none
///
/// # Errors
///
/// Fails on malformed scenarios: unknown or reserved parties, amounts the
/// currency cannot represent, due dates out of range. Ledger rejections are reported as step outcomes.
#[instrument(skip_all, fields(scenario = %scenario.name))]
pub fn run_scenario(
    scenario: &Scenario,
    default_currency: Currency,
) -> Result<ReplayReport, ReplayError> {
    let currency = scenario.currency.unwrap_or(default_currency);
    let mut replay = Replay::new(currency, &scenario.parties)?;
    info!(%currency, steps = scenario.steps.len(), "Replaying scenario");

    let mut steps = Vec::with_capacity(scenario.steps.len());
    for (position, step) in scenario.steps.iter().enumerate() {
        let index = position + 1;
        let outcome = match replay.execute(&step.action)? {
            Ok(detail) => StepOutcome::Ok { detail },
            Err(error) => StepOutcome::Rejected {
                reason: error.reason().to_string(),
                kind: error.kind(),
            },
        };

        let met = outcome.reason() == step.expect_error.as_deref();
        if met {
            debug!(index, action = step.action.name(), ?outcome, "Step replayed");
        } else {
            warn!(
                index,
                action = step.action.name(),
                expected = ?step.expect_error,
                ?outcome,
                "Step did not meet expectation"
            );
        }

        steps.push(StepReport {
            index,
            action: step.action.name().to_string(),
            outcome,
            expected_error: step.expect_error.clone(),
            met,
        });
    }

    let report = replay.into_report(&scenario.name, steps);
    info!(passed = report.passed(), "Scenario finished");
    Ok(report)
}

struct Replay {
    currency: Currency,
    ledger: EscrowLedger<InMemoryWallets>,
    parties: BTreeMap<String, PartyId>,
}

type StepResult = Result<Option<String>, EscrowError>;

impl Replay {
    fn new(currency: Currency, names: &[String]) -> Result<Self, ReplayError> {
        let mut parties = BTreeMap::new();
        for name in names {
            if name == NIL_PARTY {
                return Err(ReplayError::ReservedParty(name.clone()));
            }
            if parties.contains_key(name) {
                return Err(ReplayError::DuplicateParty(name.clone()));
            }
            parties.insert(name.clone(), PartyId::new_v7());
        }

        Ok(Self {
            currency,
            ledger: EscrowLedger::new(currency, InMemoryWallets::new(currency)),
            parties,
        })
    }

    fn party(&self, name: &str) -> Result<PartyId, ReplayError> {
        if name == NIL_PARTY {
            return Ok(PartyId::nil());
        }
        self.parties
            .get(name)
            .copied()
            .ok_or_else(|| ReplayError::UnknownParty(name.to_string()))
    }

    fn name_of(&self, id: PartyId) -> String {
        if id.is_nil() {
            return NIL_PARTY.to_string();
        }
        self.parties
            .iter()
            .find(|(_, party)| **party == id)
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    fn money(&self, amount: Decimal) -> Result<Money, ReplayError> {
        Ok(Money::exact(amount, self.currency)?)
    }

    fn execute(&mut self, action: &Action) -> Result<StepResult, ReplayError> {
        let result = match action {
            Action::CreateInvoice { buyer, supplier, amount, due_in_hours, reference } => {
                let due_date = TimeDelta::try_hours(*due_in_hours)
                    .and_then(|offset| Utc::now().checked_add_signed(offset))
                    .ok_or(ReplayError::InvalidDueDate(*due_in_hours))?;
                let terms = InvoiceTerms::new(
                    self.party(buyer)?,
                    self.party(supplier)?,
                    self.money(*amount)?,
                    due_date,
                    reference.clone(),
                );
                self.ledger
                    .create_invoice(terms)
                    .map(|id| Some(id.to_string()))
            }
            Action::EscrowPayment { caller, invoice, amount } => {
                let caller = self.party(caller)?;
                let submitted = self.money(*amount)?;
                self.ledger
                    .escrow_payment(caller, InvoiceId::new(*invoice), submitted)
                    .map(|_| None)
            }
            Action::ConfirmDelivery { caller, invoice } => {
                let caller = self.party(caller)?;
                self.ledger
                    .confirm_delivery(caller, InvoiceId::new(*invoice))
                    .map(|_| None)
            }
            Action::ReleaseFunds { invoice } => self
                .ledger
                .release_funds(InvoiceId::new(*invoice))
                .map(|release| {
                    Some(format!(
                        "{} paid to {}",
                        release.amount,
                        self.name_of(release.recipient)
                    ))
                }),
            Action::TransferRight { caller, invoice, to } => {
                let caller = self.party(caller)?;
                let to = self.party(to)?;
                self.ledger
                    .transfer_right(caller, InvoiceId::new(*invoice), to)
                    .map(|_| None)
            }
            Action::ApproveRight { caller, invoice, spender } => {
                let caller = self.party(caller)?;
                let spender = spender.as_deref().map(|s| self.party(s)).transpose()?;
                self.ledger
                    .approve_right(caller, InvoiceId::new(*invoice), spender)
                    .map(|_| None)
            }
            Action::FundWallet { party, amount } => {
                let party = self.party(party)?;
                let amount = self.money(*amount)?;
                let balance = self.ledger.settlement_mut().fund(party, amount)?;
                Ok(Some(format!("balance {}", balance)))
            }
            Action::RejectPayments { party, enabled } => {
                let party = self.party(party)?;
                self.ledger.settlement_mut().set_refusing(party, *enabled);
                Ok(None)
            }
        };
        Ok(result)
    }

    fn into_report(mut self, scenario: &str, steps: Vec<StepReport>) -> ReplayReport {
        let now = Utc::now();
        let invoices = self
            .ledger
            .invoices()
            .map(|invoice| InvoiceReport {
                id: invoice.id,
                reference: invoice.reference.clone(),
                buyer: self.name_of(invoice.buyer),
                original_supplier: self.name_of(invoice.original_supplier),
                holder: self
                    .ledger
                    .current_holder(invoice.id)
                    .map(|holder| self.name_of(holder))
                    .unwrap_or_default(),
                amount: invoice.amount,
                escrowed: invoice.escrowed,
                state: invoice.state(),
                due_date: invoice.due_date,
                overdue: invoice.is_overdue(now),
            })
            .collect();

        let balances = self
            .parties
            .iter()
            .map(|(name, party)| (name.clone(), self.ledger.settlement().balance_of(*party)))
            .collect();

        ReplayReport {
            scenario: scenario.to_string(),
            currency: self.currency,
            steps,
            invoices,
            balances,
            custody: self.ledger.custody_balance(),
            events: self.ledger.take_events(),
        }
    }
}
