//! Scenario runner.
//!
//! Builds the three components from a [`SimConfig`], applies each scenario
//! step against an in-memory [`Ledger`], and collects a JSON-serializable
//! report. Every deposit runs inside its own ledger transaction, committed
//! only when the deposit succeeds.

use std::collections::BTreeMap;

use serde::Serialize;
use tally_ledger::Ledger;
use tally_split::{EqualSplitDistributor, SplitError, WeightedTierDistributor};
use tally_types::{Amount, Beneficiary, Timestamp};
use tally_vesting::{ScheduleSnapshot, VestingSchedule};

use crate::config::{resolve, SimConfig, SplitKind, Step};

/// Outcome of one scenario step.
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    /// Position in the scenario.
    pub index: usize,
    /// The step as configured.
    pub step: Step,
    /// Whether the step succeeded.
    pub ok: bool,
    /// Shares released, for successful release steps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub released: Option<Amount>,
    /// Rejection reason, for failed steps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Final state after a scenario.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// One entry per step, in order.
    pub outcomes: Vec<StepOutcome>,
    /// Ledger balance per named party.
    pub balances: BTreeMap<String, Amount>,
    /// Sum of every committed transfer.
    pub total_credited: u128,
    /// Units held by the equal split after the run.
    pub equal_split_balance: Amount,
    /// Units held by the tiered split after the run.
    pub tiered_split_balance: Amount,
    /// Vesting state at the latest release time seen.
    pub vesting: ScheduleSnapshot,
}

/// The components under simulation.
pub struct Simulation {
    equal: EqualSplitDistributor,
    tiered: WeightedTierDistributor,
    vesting: VestingSchedule,
    ledger: Ledger,
    names: BTreeMap<String, Beneficiary>,
    clock: Timestamp,
}

impl Simulation {
    /// Build all components from configuration.
    pub fn new(config: &SimConfig) -> anyhow::Result<Self> {
        let mut names = BTreeMap::new();
        let mut name = |label: &str| {
            let handle = resolve(label);
            names.insert(label.to_string(), handle);
            handle
        };

        let equal = EqualSplitDistributor::new(
            config.equal_split.beneficiaries.each_ref().map(|l| name(l.as_str())),
        )?;
        let tiered = WeightedTierDistributor::new(
            config.tiered_split.beneficiaries.each_ref().map(|l| name(l.as_str())),
            config.tiered_split.weights,
        )?;
        let vesting = VestingSchedule::new(
            config.vesting.params.clone(),
            name(config.vesting.administrator.as_str()),
            name(config.vesting.beneficiary.as_str()),
            config.vesting.start_time,
        )?;

        let mut ledger = Ledger::new();
        for label in &config.unreachable {
            ledger.mark_unreachable(name(label.as_str()));
        }

        Ok(Self {
            equal,
            tiered,
            vesting,
            ledger,
            names,
            clock: config.vesting.start_time,
        })
    }

    /// Apply every step and produce the report.
    pub fn run(mut self, steps: &[Step]) -> Report {
        let outcomes = steps
            .iter()
            .enumerate()
            .map(|(index, step)| self.apply(index, step))
            .collect();

        let balances = self
            .names
            .iter()
            .map(|(label, handle)| (label.clone(), self.ledger.balance_of(handle)))
            .collect();

        Report {
            outcomes,
            balances,
            total_credited: self.ledger.total_credited(),
            equal_split_balance: self.equal.balance(),
            tiered_split_balance: self.tiered.balance(),
            vesting: self.vesting.snapshot(self.clock),
        }
    }

    fn apply(&mut self, index: usize, step: &Step) -> StepOutcome {
        let result = match step {
            Step::EqualDeposit { amount, depositor } => {
                let depositor = self.party(depositor);
                self.deposit(|equal, _, txn| equal.deposit(*amount, &depositor, txn))
                    .map(|()| None)
            }
            Step::TieredDeposit { amount } => self
                .deposit(|_, tiered, txn| tiered.deposit(*amount, txn))
                .map(|()| None),
            Step::Unsolicited {
                split,
                amount,
                from,
            } => {
                let from = self.party(from);
                let split = *split;
                self.deposit(|equal, tiered, txn| match split {
                    SplitKind::Equal => equal.receive_unsolicited(*amount, &from, txn),
                    SplitKind::Tiered => tiered.receive_unsolicited(*amount, &from, txn),
                })
                .map(|()| None)
            }
            Step::Release { caller, at } => {
                self.clock = self.clock.max(*at);
                let caller = self.party(caller);
                self.vesting
                    .release(&caller, *at)
                    .map(Some)
                    .map_err(|e| e.to_string())
            }
            Step::Deactivate { caller } => {
                let caller = self.party(caller);
                self.vesting
                    .deactivate(&caller)
                    .map(|()| None)
                    .map_err(|e| e.to_string())
            }
        };

        if let Err(ref error) = result {
            tracing::info!(index, %error, "sim: step rejected");
        }

        match result {
            Ok(released) => StepOutcome {
                index,
                step: step.clone(),
                ok: true,
                released,
                error: None,
            },
            Err(error) => StepOutcome {
                index,
                step: step.clone(),
                ok: false,
                released: None,
                error: Some(error),
            },
        }
    }

    /// Run a deposit inside a ledger transaction.
    fn deposit<F>(&mut self, f: F) -> Result<(), String>
    where
        F: FnOnce(
            &EqualSplitDistributor,
            &WeightedTierDistributor,
            &mut tally_ledger::LedgerTxn<'_>,
        ) -> Result<(), SplitError>,
    {
        let mut txn = self.ledger.transaction();
        match f(&self.equal, &self.tiered, &mut txn) {
            Ok(()) => {
                txn.commit();
                Ok(())
            }
            Err(e) => {
                txn.rollback();
                Err(e.to_string())
            }
        }
    }

    fn party(&mut self, label: &str) -> Beneficiary {
        *self
            .names
            .entry(label.to_string())
            .or_insert_with(|| resolve(label))
    }
}
