use crate::identity::Address;
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const SECRET_KEY_LEN: usize = 32;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum KeypairError {
    #[error("Invalid key length: expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("Invalid key encoding: {0}")]
    InvalidEncoding(String),
}

/// Ed25519 keypair backing a participant address
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a new random keypair
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Raw public key bytes
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// The ledger address owned by this keypair
    pub fn address(&self) -> Address {
        Address::from_keypair(self)
    }

    /// Serialize the keypair to bytes (secret key bytes)
    pub fn to_bytes(&self) -> [u8; SECRET_KEY_LEN] {
        self.signing_key.to_bytes()
    }

    /// Deserialize a keypair from secret key bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeypairError> {
        let bytes_array: [u8; SECRET_KEY_LEN] =
            bytes.try_into().map_err(|_| KeypairError::InvalidLength {
                expected: SECRET_KEY_LEN,
                got: bytes.len(),
            })?;

        Ok(Self {
            signing_key: SigningKey::from_bytes(&bytes_array),
        })
    }

    /// Restore a keypair from a hex-encoded secret key
    pub fn from_hex(s: &str) -> Result<Self, KeypairError> {
        let bytes = hex::decode(s).map_err(|e| KeypairError::InvalidEncoding(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Hex-encoded secret key (for backup)
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

/// Parses a hex-encoded secret key, as printed by `fundledger keygen`
impl FromStr for Keypair {
    type Err = KeypairError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s.trim())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}
