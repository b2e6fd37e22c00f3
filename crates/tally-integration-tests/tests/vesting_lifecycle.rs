//! Integration test: vesting schedule lifecycle.
//!
//! Exercises the complete schedule lifecycle:
//! 1. Locked until the first period boundary
//! 2. Yearly releases up to the cap
//! 3. Catch-up after skipped periods, clamped at the cap
//! 4. Authorization and administrator-only deactivation
//! 5. Concurrent release attempts linearized by the schedule lock, within one
//!    period and across several skipped periods

use std::sync::Arc;

use tally_types::{Beneficiary, SECONDS_PER_DAY};
use tally_vesting::{ScheduleStatus, UnlockAdvance, VestingError, VestingParams, VestingSchedule};

/// Base timestamp for test scenarios.
const BASE_TIME: u64 = 1_700_000_000;

const YEAR: u64 = 365 * SECONDS_PER_DAY;

fn admin() -> Beneficiary {
    Beneficiary::from_label("administrator")
}

fn holder() -> Beneficiary {
    Beneficiary::from_label("beneficiary")
}

fn default_schedule() -> VestingSchedule {
    VestingSchedule::new(VestingParams::default(), admin(), holder(), BASE_TIME)
        .expect("default schedule")
}

#[test]
fn vesting_full_lifecycle() {
    let schedule = default_schedule();

    // =========================================================
    // Locked for the whole first year
    // =========================================================
    assert_eq!(schedule.status(BASE_TIME), ScheduleStatus::Locked);
    for now in [BASE_TIME, BASE_TIME + YEAR / 2, BASE_TIME + YEAR - 1] {
        assert!(matches!(
            schedule.release(&holder(), now),
            Err(VestingError::Locked { .. })
        ));
    }
    assert_eq!(schedule.vested_amount(), 0);

    // =========================================================
    // One release per year
    // =========================================================
    let mut released = Vec::new();
    for year in 1..=4 {
        let now = BASE_TIME + year * YEAR + 3600;
        assert_eq!(schedule.status(now), ScheduleStatus::Unlockable);
        released.push(schedule.release(&holder(), now).expect("yearly release"));

        if year < 4 {
            assert_eq!(schedule.status(now), ScheduleStatus::Locked, "re-armed");
            assert!(
                schedule.release(&admin(), now + 1).is_err(),
                "no second release in the same period"
            );
        }
    }
    assert_eq!(released, vec![250, 250, 250, 250]);
    assert_eq!(schedule.vested_amount(), 1000);

    // =========================================================
    // Terminal
    // =========================================================
    let later = BASE_TIME + 20 * YEAR;
    assert_eq!(schedule.status(later), ScheduleStatus::FullyVested);
    for _ in 0..3 {
        assert!(matches!(
            schedule.release(&holder(), later),
            Err(VestingError::FullyVested { total_allotment: 1000 })
        ));
    }
    assert_eq!(schedule.vested_amount(), 1000);
}

#[test]
fn vesting_catch_up_after_skipped_periods() {
    let schedule = default_schedule();
    let now = BASE_TIME + 4 * YEAR + 35 * SECONDS_PER_DAY;

    assert_eq!(schedule.releasable(now), 1000);
    assert_eq!(schedule.release(&holder(), now).expect("catch-up"), 1000);
    assert_eq!(schedule.vested_amount(), 1000, "clamped at the cap, not 250");
    assert_eq!(schedule.status(now), ScheduleStatus::FullyVested);
}

#[test]
fn vesting_partial_catch_up_then_continue() {
    let params = VestingParams {
        total_allotment: 2000,
        ..VestingParams::default()
    };
    let schedule =
        VestingSchedule::new(params, admin(), holder(), BASE_TIME).expect("valid schedule");

    assert_eq!(schedule.release(&holder(), BASE_TIME + 3 * YEAR).expect("release"), 750);
    assert_eq!(schedule.release(&holder(), BASE_TIME + 5 * YEAR).expect("release"), 500);
    assert_eq!(schedule.vested_amount(), 1250);
    assert_eq!(schedule.release(&holder(), BASE_TIME + 9 * YEAR).expect("release"), 750);
    assert_eq!(schedule.vested_amount(), 2000);
}

#[test]
fn vesting_catch_up_policy_relocks() {
    let params = VestingParams {
        unlock_advance: UnlockAdvance::CatchUp,
        ..VestingParams::default()
    };
    let schedule =
        VestingSchedule::new(params, admin(), holder(), BASE_TIME).expect("valid schedule");

    let now = BASE_TIME + 2 * YEAR + 10;
    assert_eq!(schedule.release(&holder(), now).expect("release"), 500);
    assert_eq!(schedule.next_unlock_time(), BASE_TIME + 3 * YEAR);
    assert_eq!(schedule.status(now), ScheduleStatus::Locked);
}

#[test]
fn vesting_authorization() {
    let schedule = default_schedule();
    let now = BASE_TIME + YEAR;

    for stranger in ["mallory", "eve", "trent"].map(Beneficiary::from_label) {
        assert!(matches!(
            schedule.release(&stranger, now),
            Err(VestingError::Unauthorized(_))
        ));
        assert!(matches!(
            schedule.deactivate(&stranger),
            Err(VestingError::Unauthorized(_))
        ));
    }
    assert_eq!(schedule.vested_amount(), 0);
    assert_eq!(schedule.next_unlock_time(), BASE_TIME + YEAR);

    assert!(
        schedule.deactivate(&holder()).is_err(),
        "beneficiary cannot deactivate"
    );

    assert_eq!(schedule.release(&admin(), now).expect("admin release"), 250);
    schedule.deactivate(&admin()).expect("deactivate");
    assert!(matches!(
        schedule.release(&holder(), now + 10 * YEAR),
        Err(VestingError::Inactive)
    ));
    assert_eq!(schedule.vested_amount(), 250);
    assert_eq!(schedule.status(now + 10 * YEAR), ScheduleStatus::Deactivated);
}

#[tokio::test]
async fn vesting_concurrent_release_single_winner() {
    let schedule = Arc::new(default_schedule());
    let now = BASE_TIME + YEAR + 1;

    let mut handles = Vec::new();
    for i in 0..16 {
        let schedule = Arc::clone(&schedule);
        let caller = if i % 2 == 0 { holder() } else { admin() };
        handles.push(tokio::task::spawn_blocking(move || {
            schedule.release(&caller, now)
        }));
    }

    let mut successes = 0;
    let mut locked = 0;
    for handle in handles {
        match handle.await.expect("task") {
            Ok(amount) => {
                assert_eq!(amount, 250);
                successes += 1;
            }
            Err(VestingError::Locked { .. }) => locked += 1,
            Err(other) => unreachable!("unexpected error: {other}"),
        }
    }

    assert_eq!(successes, 1, "exactly one release per period");
    assert_eq!(locked, 15);
    assert_eq!(schedule.vested_amount(), 250);
    assert_eq!(schedule.next_unlock_time(), BASE_TIME + 2 * YEAR);
}

#[tokio::test]
async fn vesting_concurrent_release_across_skipped_periods() {
    let schedule = Arc::new(default_schedule());
    let now = BASE_TIME + 3 * YEAR + 1;

    let mut handles = Vec::new();
    for i in 0..16 {
        let schedule = Arc::clone(&schedule);
        let caller = if i % 2 == 0 { holder() } else { admin() };
        handles.push(tokio::task::spawn_blocking(move || {
            schedule.release(&caller, now)
        }));
    }

    let mut increments = Vec::new();
    let mut locked = 0;
    for handle in handles {
        match handle.await.expect("task") {
            Ok(amount) => increments.push(amount),
            Err(VestingError::Locked { .. }) => locked += 1,
            Err(other) => unreachable!("unexpected error: {other}"),
        }
    }
    increments.sort_unstable();

    // One success per elapsed period: the first catches up, the rest only
    // advance the unlock time until it passes `now`.
    assert_eq!(increments, vec![0, 0, 750]);
    assert_eq!(locked, 13);
    assert_eq!(schedule.vested_amount(), 750);
    assert_eq!(schedule.next_unlock_time(), BASE_TIME + 4 * YEAR);
}
