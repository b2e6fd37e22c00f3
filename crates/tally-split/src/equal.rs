//! Equal three-way split.
//!
//! `share = amount / 3` goes to each beneficiary; the indivisible remainder
//! (0, 1 or 2 units) goes back to the depositor.

use parking_lot::Mutex;
use tally_ledger::{Transfer, ValueTransfer};
use tally_types::{Amount, Beneficiary, BENEFICIARY_COUNT};

use crate::{execute, validate_beneficiaries, Result, SplitError};

/// Splits deposits evenly across three fixed beneficiaries.
#[derive(Debug)]
pub struct EqualSplitDistributor {
    beneficiaries: [Beneficiary; BENEFICIARY_COUNT],
    /// Value held mid-deposit. Zero whenever no deposit is running.
    balance: Mutex<Amount>,
}

impl EqualSplitDistributor {
    /// Create a distributor for three distinct, non-null beneficiaries.
    ///
    /// # Errors
    ///
    /// - [`SplitError::NullBeneficiary`] if any handle is null
    /// - [`SplitError::DuplicateBeneficiary`] if any handle repeats
    pub fn new(beneficiaries: [Beneficiary; BENEFICIARY_COUNT]) -> Result<Self> {
        validate_beneficiaries(&beneficiaries)?;
        Ok(Self {
            beneficiaries,
            balance: Mutex::new(0),
        })
    }

    /// The fixed beneficiary set.
    pub fn beneficiaries(&self) -> &[Beneficiary; BENEFICIARY_COUNT] {
        &self.beneficiaries
    }

    /// Compute the four transfers a deposit of `amount` produces: one share
    /// per beneficiary, then the refund to `depositor`.
    pub fn plan(&self, amount: Amount, depositor: &Beneficiary) -> Vec<Transfer> {
        let share = amount / BENEFICIARY_COUNT as u64;
        let remainder = amount - share * BENEFICIARY_COUNT as u64;

        let mut plan: Vec<Transfer> = self
            .beneficiaries
            .iter()
            .map(|to| Transfer { to: *to, amount: share })
            .collect();
        plan.push(Transfer {
            to: *depositor,
            amount: remainder,
        });
        plan
    }

    /// Split `amount` three ways and refund the remainder to `depositor`.
    ///
    /// On error the caller must discard every transfer already made through
    /// `transfer`; the distributor itself retains nothing. The distributor
    /// lock is held across every `transfer` call, so `transfer` must not call
    /// back into this distributor.
    ///
    /// # Errors
    ///
    /// - [`SplitError::NullBeneficiary`] if `depositor` is null
    /// - [`SplitError::TransferFailed`] if any transfer fails
    pub fn deposit(
        &self,
        amount: Amount,
        depositor: &Beneficiary,
        transfer: &mut dyn ValueTransfer,
    ) -> Result<()> {
        if depositor.is_null() {
            return Err(SplitError::NullBeneficiary);
        }

        let mut balance = self.balance.lock();
        let plan = self.plan(amount, depositor);
        execute(&mut balance, amount, &plan, transfer)?;

        tracing::info!(
            amount,
            share = plan[0].amount,
            refund = plan[BENEFICIARY_COUNT].amount,
            depositor = %depositor.short(),
            "equal split: deposit distributed"
        );
        Ok(())
    }

    /// Entry point for value sent without an explicit deposit call.
    ///
    /// Behaves exactly like [`EqualSplitDistributor::deposit`] with `from` as
    /// the depositor.
    ///
    /// # Errors
    ///
    /// Same as [`EqualSplitDistributor::deposit`].
    pub fn receive_unsolicited(
        &self,
        amount: Amount,
        from: &Beneficiary,
        transfer: &mut dyn ValueTransfer,
    ) -> Result<()> {
        tracing::debug!(amount, from = %from.short(), "equal split: unsolicited value received");
        self.deposit(amount, from, transfer)
    }

    /// Value currently held by the distributor. Zero between deposits.
    pub fn balance(&self) -> Amount {
        *self.balance.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tally_ledger::Ledger;

    fn parties() -> [Beneficiary; 3] {
        ["alpha", "beta", "gamma"].map(Beneficiary::from_label)
    }

    fn depositor() -> Beneficiary {
        Beneficiary::from_label("depositor")
    }

    fn distributor() -> EqualSplitDistributor {
        EqualSplitDistributor::new(parties()).expect("valid beneficiaries")
    }

    #[test]
    fn test_deposit_100_refunds_one() {
        let dist = distributor();
        let mut ledger = Ledger::new();
        dist.deposit(100, &depositor(), &mut ledger).expect("deposit");

        for b in parties() {
            assert_eq!(ledger.balance_of(&b), 33);
        }
        assert_eq!(ledger.balance_of(&depositor()), 1);
        assert_eq!(ledger.total_credited(), 100);
        assert_eq!(dist.balance(), 0);
    }

    #[test]
    fn test_transfer_order_and_count() {
        let dist = distributor();
        let mut ledger = Ledger::new();
        dist.deposit(8, &depositor(), &mut ledger).expect("deposit");

        let journal = ledger.journal();
        assert_eq!(journal.len(), 4);
        assert_eq!(journal[0], Transfer { to: parties()[0], amount: 2 });
        assert_eq!(journal[1], Transfer { to: parties()[1], amount: 2 });
        assert_eq!(journal[2], Transfer { to: parties()[2], amount: 2 });
        assert_eq!(journal[3], Transfer { to: depositor(), amount: 2 });
        assert_eq!(dist.beneficiaries(), &parties());
    }

    #[test]
    fn test_small_amounts_go_back_to_depositor() {
        let dist = distributor();
        for amount in 0..3u64 {
            let mut ledger = Ledger::new();
            dist.deposit(amount, &depositor(), &mut ledger).expect("deposit");
            assert_eq!(ledger.balance_of(&depositor()), amount);
            assert_eq!(ledger.journal().len(), 4);
            assert_eq!(dist.balance(), 0);
        }
    }

    #[test]
    fn test_depositor_may_be_a_beneficiary() {
        let dist = distributor();
        let mut ledger = Ledger::new();
        dist.deposit(101, &parties()[0], &mut ledger).expect("deposit");
        assert_eq!(ledger.balance_of(&parties()[0]), 33 + 2);
        assert_eq!(ledger.total_credited(), 101);
    }

    #[test]
    fn test_transfer_failure_applies_nothing() {
        let dist = distributor();
        let mut ledger = Ledger::new();
        ledger.mark_unreachable(parties()[1]);

        let err = {
            let mut txn = ledger.transaction();
            dist.deposit(99, &depositor(), &mut txn).expect_err("unreachable beneficiary")
        };
        assert!(matches!(
            err,
            SplitError::TransferFailed { to, amount: 33, .. } if to == parties()[1]
        ));
        assert_eq!(ledger.total_credited(), 0);
        assert!(ledger.journal().is_empty());
        assert_eq!(dist.balance(), 0);
    }

    #[test]
    fn test_null_depositor_rejected() {
        let dist = distributor();
        let mut ledger = Ledger::new();
        assert!(matches!(
            dist.deposit(10, &Beneficiary::NULL, &mut ledger),
            Err(SplitError::NullBeneficiary)
        ));
        assert!(ledger.journal().is_empty());
    }

    #[test]
    fn test_construction_rejects_bad_sets() {
        let mut dup = parties();
        dup[1] = dup[0];
        assert!(EqualSplitDistributor::new(dup).is_err());

        let mut null = parties();
        null[0] = Beneficiary::NULL;
        assert!(EqualSplitDistributor::new(null).is_err());
    }

    #[test]
    fn test_receive_unsolicited_matches_deposit() {
        let dist = distributor();
        let mut direct = Ledger::new();
        let mut unsolicited = Ledger::new();
        dist.deposit(1_000_001, &depositor(), &mut direct).expect("deposit");
        dist.receive_unsolicited(1_000_001, &depositor(), &mut unsolicited)
            .expect("receive");
        assert_eq!(direct.journal(), unsolicited.journal());
    }

    proptest! {
        #[test]
        fn prop_conservation(amount in any::<u64>()) {
            let dist = distributor();
            let mut ledger = Ledger::new();
            dist.deposit(amount, &depositor(), &mut ledger).expect("deposit");

            prop_assert_eq!(ledger.total_credited(), u128::from(amount));
            prop_assert_eq!(ledger.balance_of(&depositor()), amount % 3);
            prop_assert_eq!(dist.balance(), 0);
        }

        #[test]
        fn prop_plan_sums_to_amount(amount in any::<u64>()) {
            let plan = distributor().plan(amount, &depositor());
            let total: u128 = plan.iter().map(|t| u128::from(t.amount)).sum();
            prop_assert_eq!(total, u128::from(amount));
            prop_assert!(plan[3].amount <= 2);
        }
    }
}
