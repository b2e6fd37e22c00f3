//! # tally-split
//!
//! Deterministic distribution of an incoming amount across exactly three
//! beneficiaries.
//!
//! Every unit of value that enters a distributor leaves it within the same
//! call. Rounding remainders are assigned, never dropped.
//!
//! ## Modules
//!
//! - [`equal`]: Equal three-way split, remainder refunded to the depositor
//! - [`tiered`]: Weighted 60/25/15 split, remainder to the first tier

pub mod equal;
pub mod tiered;

use tally_ledger::{Transfer, TransferError, ValueTransfer};
use tally_types::{Amount, Beneficiary, BENEFICIARY_COUNT};

pub use equal::EqualSplitDistributor;
pub use tiered::WeightedTierDistributor;

/// Error types for split operations.
#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    /// Tier weights do not sum to 100.
    #[error("tier weights must sum to 100, got {total}")]
    InvalidWeightTotal {
        /// The actual total.
        total: u16,
    },

    /// A beneficiary (or depositor) is the null handle.
    #[error("null beneficiary handle")]
    NullBeneficiary,

    /// The same beneficiary appears more than once.
    #[error("duplicate beneficiary: {0:?}")]
    DuplicateBeneficiary(Beneficiary),

    /// An individual transfer could not be completed.
    #[error("transfer of {amount} to {to:?} failed: {source}")]
    TransferFailed {
        /// Destination of the failed transfer.
        to: Beneficiary,
        /// Units that could not be moved.
        amount: Amount,
        /// Underlying collaborator error.
        #[source]
        source: TransferError,
    },

    /// A payout plan did not account for the full deposit.
    #[error("deposit left {residual} units undistributed")]
    ResidualRetained {
        /// Units left behind.
        residual: Amount,
    },
}

impl SplitError {
    /// Whether this error comes from bad construction parameters.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SplitError::InvalidWeightTotal { .. }
                | SplitError::NullBeneficiary
                | SplitError::DuplicateBeneficiary(_)
        )
    }
}

/// Convenience result type for split operations.
pub type Result<T> = std::result::Result<T, SplitError>;

/// Validate a fixed beneficiary set.
///
/// # Errors
///
/// - [`SplitError::NullBeneficiary`] if any handle is null
/// - [`SplitError::DuplicateBeneficiary`] if any handle repeats
pub fn validate_beneficiaries(beneficiaries: &[Beneficiary; BENEFICIARY_COUNT]) -> Result<()> {
    for (i, b) in beneficiaries.iter().enumerate() {
        if b.is_null() {
            return Err(SplitError::NullBeneficiary);
        }
        if beneficiaries[..i].contains(b) {
            return Err(SplitError::DuplicateBeneficiary(*b));
        }
    }
    Ok(())
}

/// Push a planned payout through the transfer collaborator.
///
/// `balance` holds the deposit while it is being paid out and must read zero
/// when this returns, on success or failure. The distributors' plans always
/// sum to `amount`, so [`SplitError::ResidualRetained`] only fires for a
/// malformed plan and cannot be reached through the public API.
fn execute(
    balance: &mut Amount,
    amount: Amount,
    plan: &[Transfer],
    transfer: &mut dyn ValueTransfer,
) -> Result<()> {
    *balance = amount;

    for t in plan {
        if let Err(source) = transfer.transfer(&t.to, t.amount) {
            *balance = 0;
            tracing::warn!(
                to = %t.to.short(),
                amount = t.amount,
                error = %source,
                "split: transfer failed, deposit not applied"
            );
            return Err(SplitError::TransferFailed {
                to: t.to,
                amount: t.amount,
                source,
            });
        }
        *balance = balance.saturating_sub(t.amount);
        tracing::trace!(to = %t.to.short(), amount = t.amount, "split: transfer sent");
    }

    let residual = std::mem::take(balance);
    if residual != 0 {
        return Err(SplitError::ResidualRetained { residual });
    }
    Ok(())
}
