//! Vesting schedule state machine.
//!
//! ## States
//!
//! ```text
//! Locked --(now >= next_unlock_time)--> Unlockable
//! Unlockable --release, below cap--> Locked
//! Unlockable --release, reaches cap--> FullyVested   (terminal)
//! any --deactivate--> Deactivated                    (terminal)
//! ```
//!
//! The released total is `min(elapsed_periods * per_period_allotment,
//! total_allotment)`, recomputed from `now` on every successful release.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tally_types::{Amount, Beneficiary, Timestamp};

use crate::{Result, UnlockAdvance, VestingError, VestingParams};

/// Observable state of a schedule at a given time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    /// Active, waiting for the next unlock time.
    Locked,
    /// Active, a release would succeed now.
    Unlockable,
    /// The cap has been released.
    FullyVested,
    /// Deactivated by the administrator.
    Deactivated,
}

/// Point-in-time view of a schedule, for reporting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSnapshot {
    /// Identity allowed to release and deactivate.
    pub administrator: Beneficiary,
    /// Identity the shares vest to.
    pub beneficiary: Beneficiary,
    /// Time the first period began.
    pub start_time: Timestamp,
    /// Earliest time the next release can succeed.
    pub next_unlock_time: Timestamp,
    /// Shares released so far.
    pub released_total: Amount,
    /// Cap on released shares.
    pub total_allotment: Amount,
    /// Whether the schedule has not been deactivated.
    pub active: bool,
    /// Status at the snapshot time.
    pub status: ScheduleStatus,
}

#[derive(Clone, Copy, Debug)]
struct State {
    next_unlock_time: Timestamp,
    released_total: Amount,
    active: bool,
}

/// A single-beneficiary vesting schedule.
///
/// All mutation happens under one lock, so concurrent calls are applied one
/// at a time.
#[derive(Debug)]
pub struct VestingSchedule {
    params: VestingParams,
    administrator: Beneficiary,
    beneficiary: Beneficiary,
    start_time: Timestamp,
    state: Mutex<State>,
}

impl VestingSchedule {
    /// Create a schedule starting at `start_time`.
    ///
    /// # Errors
    ///
    /// - [`VestingError::InvalidConfig`] if the parameters are invalid or the
    ///   first unlock time overflows
    /// - [`VestingError::NullIdentity`] if either identity is null
    pub fn new(
        params: VestingParams,
        administrator: Beneficiary,
        beneficiary: Beneficiary,
        start_time: Timestamp,
    ) -> Result<Self> {
        params.validate()?;
        if administrator.is_null() || beneficiary.is_null() {
            return Err(VestingError::NullIdentity);
        }
        let next_unlock_time = start_time.checked_add(params.period_duration).ok_or_else(|| {
            VestingError::InvalidConfig("first unlock time overflows".to_string())
        })?;

        tracing::info!(
            beneficiary = %beneficiary.short(),
            start_time,
            next_unlock_time,
            total_allotment = params.total_allotment,
            per_period_allotment = params.per_period_allotment,
            "vesting: schedule created"
        );

        Ok(Self {
            params,
            administrator,
            beneficiary,
            start_time,
            state: Mutex::new(State {
                next_unlock_time,
                released_total: 0,
                active: true,
            }),
        })
    }

    /// Release whatever has vested by `now`.
    ///
    /// Returns the newly released increment, which may be zero when the
    /// schedule has already caught up with `now`.
    ///
    /// # Errors
    ///
    /// Checked in this order:
    ///
    /// - [`VestingError::Unauthorized`] if `caller` is neither administrator
    ///   nor beneficiary
    /// - [`VestingError::Inactive`] if the schedule was deactivated
    /// - [`VestingError::FullyVested`] if the cap has been released
    /// - [`VestingError::Locked`] if `now < next_unlock_time`
    ///
    /// No state changes on error.
    pub fn release(&self, caller: &Beneficiary, now: Timestamp) -> Result<Amount> {
        let mut state = self.state.lock();
        self.check_gates(&state, caller, now)?;

        let previous = state.released_total;
        let released = self.vested_at(now).max(previous);
        let next_unlock_time = self.advance(state.next_unlock_time, now);

        state.next_unlock_time = next_unlock_time;
        state.released_total = released;
        let increment = released - previous;

        tracing::info!(
            caller = %caller.short(),
            now,
            increment,
            released_total = released,
            next_unlock_time,
            "vesting: release"
        );
        if released >= self.params.total_allotment {
            tracing::info!(total_allotment = self.params.total_allotment, "vesting: fully vested");
        }

        Ok(increment)
    }

    /// Permanently deactivate the schedule.
    ///
    /// # Errors
    ///
    /// - [`VestingError::Unauthorized`] if `caller` is not the administrator
    /// - [`VestingError::Inactive`] if already deactivated
    pub fn deactivate(&self, caller: &Beneficiary) -> Result<()> {
        let mut state = self.state.lock();
        if caller != &self.administrator {
            tracing::warn!(caller = %caller.short(), "vesting: unauthorized deactivation attempt");
            return Err(VestingError::Unauthorized(*caller));
        }
        if !state.active {
            return Err(VestingError::Inactive);
        }
        state.active = false;

        tracing::warn!(
            released_total = state.released_total,
            total_allotment = self.params.total_allotment,
            "vesting: schedule deactivated"
        );
        Ok(())
    }

    /// Increment a release at `now` would return, or zero if it would fail.
    ///
    /// Does not check the caller and does not mutate state.
    pub fn releasable(&self, now: Timestamp) -> Amount {
        let state = self.state.lock();
        if !state.active
            || state.released_total >= self.params.total_allotment
            || now < state.next_unlock_time
        {
            return 0;
        }
        self.vested_at(now).saturating_sub(state.released_total)
    }

    /// State of the schedule as seen at `now`.
    pub fn status(&self, now: Timestamp) -> ScheduleStatus {
        let state = self.state.lock();
        self.status_of(&state, now)
    }

    /// Shares released so far.
    pub fn vested_amount(&self) -> Amount {
        self.state.lock().released_total
    }

    /// Earliest time the next release can succeed.
    pub fn next_unlock_time(&self) -> Timestamp {
        self.state.lock().next_unlock_time
    }

    /// Whether the schedule has not been deactivated.
    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    /// Construction parameters.
    pub fn params(&self) -> &VestingParams {
        &self.params
    }

    /// Identity allowed to release and deactivate.
    pub fn administrator(&self) -> &Beneficiary {
        &self.administrator
    }

    /// Identity the shares vest to.
    pub fn beneficiary(&self) -> &Beneficiary {
        &self.beneficiary
    }

    /// Time the first period began.
    pub fn start_time(&self) -> Timestamp {
        self.start_time
    }

    /// Consistent view of the whole schedule at `now`.
    pub fn snapshot(&self, now: Timestamp) -> ScheduleSnapshot {
        let state = self.state.lock();
        ScheduleSnapshot {
            administrator: self.administrator,
            beneficiary: self.beneficiary,
            start_time: self.start_time,
            next_unlock_time: state.next_unlock_time,
            released_total: state.released_total,
            total_allotment: self.params.total_allotment,
            active: state.active,
            status: self.status_of(&state, now),
        }
    }

    fn check_gates(&self, state: &State, caller: &Beneficiary, now: Timestamp) -> Result<()> {
        if caller != &self.administrator && caller != &self.beneficiary {
            tracing::warn!(caller = %caller.short(), "vesting: unauthorized release attempt");
            return Err(VestingError::Unauthorized(*caller));
        }
        if !state.active {
            return Err(VestingError::Inactive);
        }
        if state.released_total >= self.params.total_allotment {
            return Err(VestingError::FullyVested {
                total_allotment: self.params.total_allotment,
            });
        }
        if now < state.next_unlock_time {
            tracing::debug!(now, next_unlock_time = state.next_unlock_time, "vesting: locked");
            return Err(VestingError::Locked {
                next_unlock_time: state.next_unlock_time,
                now,
            });
        }
        Ok(())
    }

    fn status_of(&self, state: &State, now: Timestamp) -> ScheduleStatus {
        if !state.active {
            ScheduleStatus::Deactivated
        } else if state.released_total >= self.params.total_allotment {
            ScheduleStatus::FullyVested
        } else if now >= state.next_unlock_time {
            ScheduleStatus::Unlockable
        } else {
            ScheduleStatus::Locked
        }
    }

    fn elapsed_periods(&self, now: Timestamp) -> u64 {
        now.saturating_sub(self.start_time) / self.params.period_duration
    }

    /// Cumulative amount vested by `now`, clamped to the cap.
    fn vested_at(&self, now: Timestamp) -> Amount {
        self.elapsed_periods(now)
            .saturating_mul(self.params.per_period_allotment)
            .min(self.params.total_allotment)
    }

    fn advance(&self, current: Timestamp, now: Timestamp) -> Timestamp {
        let period = self.params.period_duration;
        match self.params.unlock_advance {
            UnlockAdvance::SinglePeriod => current.saturating_add(period),
            UnlockAdvance::CatchUp => self
                .elapsed_periods(now)
                .saturating_add(1)
                .saturating_mul(period)
                .saturating_add(self.start_time),
        }
    }
}
