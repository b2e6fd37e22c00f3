//! # tally-types
//!
//! Shared domain types used across the Tally workspace.
//!
//! ## Modules
//!
//! - [`beneficiary`]: Opaque 32-byte beneficiary handle

pub mod beneficiary;

pub use beneficiary::Beneficiary;

/// Smallest indivisible unit of value.
pub type Amount = u64;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Seconds per day (UTC).
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Number of beneficiaries every distributor pays out to.
pub const BENEFICIARY_COUNT: usize = 3;

/// Error types for handle parsing.
#[derive(Debug, thiserror::Error)]
pub enum TypesError {
    /// The input is not valid hex.
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// Decoded handle has the wrong length.
    #[error("beneficiary handle must be 32 bytes, got {0}")]
    InvalidLength(usize),
}

/// Convenience result type for type-level parsing.
pub type Result<T> = std::result::Result<T, TypesError>;
