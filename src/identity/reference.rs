// External reference - opaque fixed-width value correlating a ledger entry
// with an event outside the ledger. Stored verbatim, never checked for uniqueness.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const REF_LEN: usize = 32;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExternalRefError {
    #[error("Invalid hex encoding: {0}")]
    InvalidHex(String),

    #[error("Invalid reference length: expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalRef([u8; REF_LEN]);

impl ExternalRef {
    pub const ZERO: ExternalRef = ExternalRef([0u8; REF_LEN]);

    pub fn from_bytes(bytes: [u8; REF_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; REF_LEN] {
        &self.0
    }

    /// Derive a reference by hashing arbitrary data (e.g. a transaction id string)
    pub fn digest(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        let mut bytes = [0u8; REF_LEN];
        bytes.copy_from_slice(&hash);
        Self(bytes)
    }

    /// Parse a 64-character hex string
    pub fn from_hex(s: &str) -> Result<Self, ExternalRefError> {
        let decoded = hex::decode(s).map_err(|e| ExternalRefError::InvalidHex(e.to_string()))?;
        let bytes: [u8; REF_LEN] =
            decoded
                .as_slice()
                .try_into()
                .map_err(|_| ExternalRefError::InvalidLength {
                    expected: REF_LEN,
                    got: decoded.len(),
                })?;
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for ExternalRef {
    type Err = ExternalRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for ExternalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
