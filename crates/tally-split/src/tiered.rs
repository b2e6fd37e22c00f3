//! Weighted tiered split.
//!
//! Deposits are divided into whole "points" of [`POINT_SIZE`] units. Each
//! tier receives `points * weight`; whatever the truncation leaves over goes
//! to the first tier on top of its base share.
//!
//! ## Default weights
//!
//! - **Tier 1**: 60%
//! - **Tier 2**: 25%
//! - **Tier 3**: 15%

use parking_lot::Mutex;
use tally_ledger::{Transfer, ValueTransfer};
use tally_types::{Amount, Beneficiary, BENEFICIARY_COUNT};

use crate::{execute, validate_beneficiaries, Result, SplitError};

/// Units per point. Weights are percentages of a point.
pub const POINT_SIZE: u64 = 100;

/// Default tier weights: 60 / 25 / 15.
pub const DEFAULT_WEIGHTS: [u8; BENEFICIARY_COUNT] = [60, 25, 15];

/// Validate tier weights.
///
/// # Errors
///
/// - [`SplitError::InvalidWeightTotal`] if the weights do not sum to 100
pub fn validate_weights(weights: &[u8; BENEFICIARY_COUNT]) -> Result<()> {
    let total: u16 = weights.iter().map(|w| u16::from(*w)).sum();
    if u64::from(total) != POINT_SIZE {
        return Err(SplitError::InvalidWeightTotal { total });
    }
    Ok(())
}

/// Splits deposits across three tiers by fixed percentage weights.
#[derive(Debug)]
pub struct WeightedTierDistributor {
    beneficiaries: [Beneficiary; BENEFICIARY_COUNT],
    weights: [u8; BENEFICIARY_COUNT],
    balance: Mutex<Amount>,
}

impl WeightedTierDistributor {
    /// Create a distributor with explicit weights.
    ///
    /// # Errors
    ///
    /// - [`SplitError::InvalidWeightTotal`] if the weights do not sum to 100
    /// - [`SplitError::NullBeneficiary`] if any handle is null
    /// - [`SplitError::DuplicateBeneficiary`] if any handle repeats
    pub fn new(
        beneficiaries: [Beneficiary; BENEFICIARY_COUNT],
        weights: [u8; BENEFICIARY_COUNT],
    ) -> Result<Self> {
        validate_weights(&weights)?;
        validate_beneficiaries(&beneficiaries)?;
        Ok(Self {
            beneficiaries,
            weights,
            balance: Mutex::new(0),
        })
    }

    /// Create a distributor with [`DEFAULT_WEIGHTS`].
    ///
    /// # Errors
    ///
    /// Same beneficiary checks as [`WeightedTierDistributor::new`].
    pub fn with_default_weights(beneficiaries: [Beneficiary; BENEFICIARY_COUNT]) -> Result<Self> {
        Self::new(beneficiaries, DEFAULT_WEIGHTS)
    }

    /// The fixed beneficiary set, highest tier first.
    pub fn beneficiaries(&self) -> &[Beneficiary; BENEFICIARY_COUNT] {
        &self.beneficiaries
    }

    /// The fixed tier weights.
    pub fn weights(&self) -> [u8; BENEFICIARY_COUNT] {
        self.weights
    }

    /// Compute the transfers a deposit of `amount` produces: one per tier in
    /// order, then the truncation residual to the first tier.
    pub fn plan(&self, amount: Amount) -> Vec<Transfer> {
        let points = amount / POINT_SIZE;
        let mut total: Amount = 0;
        let mut plan = Vec::with_capacity(BENEFICIARY_COUNT + 1);

        for (to, weight) in self.beneficiaries.iter().zip(self.weights) {
            // points * weight <= amount because the weights sum to POINT_SIZE.
            let tier_amount = points * u64::from(weight);
            total += tier_amount;
            plan.push(Transfer {
                to: *to,
                amount: tier_amount,
            });
        }

        plan.push(Transfer {
            to: self.beneficiaries[0],
            amount: amount - total,
        });
        plan
    }

    /// Distribute `amount` across the tiers.
    ///
    /// On error the caller must discard every transfer already made through
    /// `transfer`; the distributor itself retains nothing. The distributor
    /// lock is held across every `transfer` call, so `transfer` must not call
    /// back into this distributor.
    ///
    /// # Errors
    ///
    /// - [`SplitError::TransferFailed`] if any transfer fails
    pub fn deposit(&self, amount: Amount, transfer: &mut dyn ValueTransfer) -> Result<()> {
        let mut balance = self.balance.lock();
        let plan = self.plan(amount);
        execute(&mut balance, amount, &plan, transfer)?;

        tracing::info!(
            amount,
            points = amount / POINT_SIZE,
            residual = plan[BENEFICIARY_COUNT].amount,
            "tiered split: deposit distributed"
        );
        Ok(())
    }

    /// Entry point for value sent without an explicit deposit call.
    ///
    /// The sender does not take part in the split.
    ///
    /// # Errors
    ///
    /// Same as [`WeightedTierDistributor::deposit`].
    pub fn receive_unsolicited(
        &self,
        amount: Amount,
        from: &Beneficiary,
        transfer: &mut dyn ValueTransfer,
    ) -> Result<()> {
        tracing::debug!(amount, from = %from.short(), "tiered split: unsolicited value received");
        self.deposit(amount, transfer)
    }

    /// Value currently held by the distributor. Zero between deposits.
    pub fn balance(&self) -> Amount {
        *self.balance.lock()
    }
}
