//! Vesting schedule parameters.

use serde::{Deserialize, Serialize};
use tally_types::{Amount, SECONDS_PER_DAY};

use crate::{Result, VestingError};

/// Default cap.
pub const DEFAULT_TOTAL_ALLOTMENT: Amount = 1000;

/// Default release unit per period.
pub const DEFAULT_PER_PERIOD_ALLOTMENT: Amount = 250;

/// Default period length (365 days in seconds).
pub const DEFAULT_PERIOD_DURATION: u64 = 365 * SECONDS_PER_DAY;

/// How `next_unlock_time` moves after a successful release.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockAdvance {
    /// Advance by exactly one period per release, however many periods have
    /// elapsed. After a multi-period catch-up the schedule stays unlockable
    /// and further releases return zero until it catches up with `now`.
    #[default]
    SinglePeriod,
    /// Advance to the first period boundary strictly after `now`.
    CatchUp,
}

/// Fixed parameters of a vesting schedule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingParams {
    /// Maximum cumulative release.
    #[serde(default = "default_total_allotment")]
    pub total_allotment: Amount,
    /// Shares released per elapsed period.
    #[serde(default = "default_per_period_allotment")]
    pub per_period_allotment: Amount,
    /// Period length in seconds.
    #[serde(default = "default_period_duration")]
    pub period_duration: u64,
    /// Unlock-time advance policy.
    #[serde(default)]
    pub unlock_advance: UnlockAdvance,
}

fn default_total_allotment() -> Amount {
    DEFAULT_TOTAL_ALLOTMENT
}

fn default_per_period_allotment() -> Amount {
    DEFAULT_PER_PERIOD_ALLOTMENT
}

fn default_period_duration() -> u64 {
    DEFAULT_PERIOD_DURATION
}

impl Default for VestingParams {
    fn default() -> Self {
        Self {
            total_allotment: DEFAULT_TOTAL_ALLOTMENT,
            per_period_allotment: DEFAULT_PER_PERIOD_ALLOTMENT,
            period_duration: DEFAULT_PERIOD_DURATION,
            unlock_advance: UnlockAdvance::default(),
        }
    }
}

impl VestingParams {
    /// Validate the parameters.
    ///
    /// # Errors
    ///
    /// - [`VestingError::InvalidConfig`] if any allotment or the period is
    ///   zero, or the per-period allotment exceeds the cap
    pub fn validate(&self) -> Result<()> {
        if self.total_allotment == 0 {
            return Err(VestingError::InvalidConfig(
                "total allotment must be non-zero".to_string(),
            ));
        }
        if self.per_period_allotment == 0 {
            return Err(VestingError::InvalidConfig(
                "per-period allotment must be non-zero".to_string(),
            ));
        }
        if self.per_period_allotment > self.total_allotment {
            return Err(VestingError::InvalidConfig(format!(
                "per-period allotment {} exceeds total allotment {}",
                self.per_period_allotment, self.total_allotment
            )));
        }
        if self.period_duration == 0 {
            return Err(VestingError::InvalidConfig(
                "period duration must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
