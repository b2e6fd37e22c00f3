//! Beneficiary handles.
//!
//! A beneficiary is anything that can receive a value transfer. The core
//! never looks inside the handle; it only compares handles for equality and
//! ordering. The all-zero handle is reserved as "null".

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

use crate::{Result, TypesError};

/// BLAKE3 key-derivation context for label-derived handles.
pub const LABEL_CONTEXT: &str = "Tally v1 beneficiary-label";

/// Opaque, comparable, immutable beneficiary handle.
///
/// Serialized as a lowercase hex string.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Beneficiary(#[serde_as(as = "Hex")] [u8; 32]);

impl Beneficiary {
    /// The null handle. Never accepted as a beneficiary.
    pub const NULL: Beneficiary = Beneficiary([0u8; 32]);

    /// Wrap raw handle bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive a handle deterministically from a human-readable label.
    pub fn from_label(label: &str) -> Self {
        Self(blake3::derive_key(LABEL_CONTEXT, label.as_bytes()))
    }

    /// Raw handle bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Whether this is the null handle.
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// First eight hex characters, for log output.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for Beneficiary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Beneficiary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Beneficiary({})", self.short())
    }
}

impl FromStr for Beneficiary {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)?;
        let len = bytes.len();
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| TypesError::InvalidLength(len))?;
        Ok(Self(arr))
    }
}
