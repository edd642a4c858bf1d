// Address - 32-byte participant identity
//
// The all-zero address is the null identity and is never a valid
// ledger account or treasury member.

use crate::identity::Keypair;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const ADDRESS_LEN: usize = 32;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AddressError {
    #[error("Address cannot be empty")]
    Empty,

    #[error("Invalid base58 encoding: {0}")]
    InvalidBase58(String),

    #[error("Invalid address length: expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },
}

/// Identity of a ledger participant, treasury wallet or custody account
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// The null identity
    pub const NULL: Address = Address([0u8; ADDRESS_LEN]);

    /// Create an address from raw bytes
    pub fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Derive the address owned by a keypair
    pub fn from_keypair(keypair: &Keypair) -> Self {
        Self::from_public_key_bytes(&keypair.public_key_bytes())
    }

    /// Derive an address from an Ed25519 public key
    pub fn from_public_key_bytes(public_key: &[u8; 32]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"address:");
        hasher.update(public_key);
        let digest = hasher.finalize();
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Generate a random address (not backed by a keypair)
    pub fn random() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; ADDRESS_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Whether this is the null identity
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; ADDRESS_LEN]
    }

    /// Parse a base58-encoded address
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        if s.is_empty() {
            return Err(AddressError::Empty);
        }

        let decoded = bs58::decode(s)
            .into_vec()
            .map_err(|e| AddressError::InvalidBase58(e.to_string()))?;

        let bytes: [u8; ADDRESS_LEN] =
            decoded
                .as_slice()
                .try_into()
                .map_err(|_| AddressError::InvalidLength {
                    expected: ADDRESS_LEN,
                    got: decoded.len(),
                })?;

        Ok(Self(bytes))
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::NULL
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", hex::encode(&self.0[..8]))
    }
}
