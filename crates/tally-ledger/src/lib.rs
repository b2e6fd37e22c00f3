//! # tally-ledger
//!
//! The value-transfer collaborator used by the distributors.
//!
//! Distributors never move value themselves. They hand each individual
//! movement to a [`ValueTransfer`] implementation, which either completes the
//! movement in full or fails without any partial effect. Atomicity across a
//! whole deposit belongs to the caller, which wraps the deposit in a
//! [`ledger::LedgerTxn`] and commits only on success.
//!
//! ## Modules
//!
//! - [`ledger`]: In-memory ledger with staged, all-or-nothing transactions

pub mod ledger;

use serde::{Deserialize, Serialize};
use tally_types::{Amount, Beneficiary};

pub use ledger::{Ledger, LedgerTxn};

/// Error types for value movement.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// The destination cannot receive value.
    #[error("destination unreachable: {0}")]
    Unreachable(Beneficiary),

    /// Crediting the destination would overflow its balance.
    #[error("arithmetic overflow crediting destination")]
    Overflow,
}

/// Convenience result type for transfer operations.
pub type Result<T> = std::result::Result<T, TransferError>;

/// A single outgoing value movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Destination handle.
    pub to: Beneficiary,
    /// Units moved.
    pub amount: Amount,
}

/// Atomic "move N units to B" primitive.
///
/// Implementations must either fully apply the transfer or fail with no
/// effect.
pub trait ValueTransfer {
    /// Move `amount` units to `to`.
    fn transfer(&mut self, to: &Beneficiary, amount: Amount) -> Result<()>;
}
