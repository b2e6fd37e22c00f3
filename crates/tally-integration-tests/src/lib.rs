//! Integration test crate for Tally.
//!
//! This crate has no library code; it only contains integration tests
//! that exercise the distributors and the vesting schedule together with the
//! in-memory ledger.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p tally-integration-tests
//! ```
