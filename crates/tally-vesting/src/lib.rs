//! # tally-vesting
//!
//! Time-gated vesting of a fixed allotment to a single beneficiary.
//!
//! A schedule releases `per_period_allotment` shares for every whole
//! `period_duration` elapsed since `start_time`, up to `total_allotment`.
//! The released total is recomputed from elapsed time on each release, so
//! skipped periods are caught up rather than lost.
//!
//! ## Modules
//!
//! - [`params`]: Construction parameters and validation
//! - [`schedule`]: The schedule state machine

pub mod params;
pub mod schedule;

use tally_types::{Amount, Beneficiary, Timestamp};

pub use params::{UnlockAdvance, VestingParams};
pub use schedule::{ScheduleSnapshot, ScheduleStatus, VestingSchedule};

/// Error types for vesting operations.
#[derive(Debug, thiserror::Error)]
pub enum VestingError {
    /// Construction parameters are invalid.
    #[error("invalid vesting configuration: {0}")]
    InvalidConfig(String),

    /// The administrator or beneficiary is the null handle.
    #[error("null administrator or beneficiary handle")]
    NullIdentity,

    /// Caller is neither the administrator nor the beneficiary.
    #[error("caller {0:?} is not authorized")]
    Unauthorized(Beneficiary),

    /// The schedule has been deactivated.
    #[error("schedule is inactive")]
    Inactive,

    /// The next period has not unlocked yet.
    #[error("locked until {next_unlock_time}, current time {now}")]
    Locked {
        /// When the next release becomes possible.
        next_unlock_time: Timestamp,
        /// The time the release was attempted at.
        now: Timestamp,
    },

    /// Everything has already been released.
    #[error("fully vested: {total_allotment} released")]
    FullyVested {
        /// The schedule cap.
        total_allotment: Amount,
    },
}

/// Convenience result type for vesting operations.
pub type Result<T> = std::result::Result<T, VestingError>;
