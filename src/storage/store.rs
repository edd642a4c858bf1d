// LedgerStore - Persistent key-value storage using sled
//
// Provides typed access for storing:
// - Contribution ledger state
// - Fund intake state
// - Transfer primitive state (in-memory token)
// - Role assignments and the pause flag

use crate::access::{PauseSwitch, RoleRegistry};
use crate::fund::{FundIntake, InMemoryToken};
use crate::ledger::ContributionLedger;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Key prefixes for organizing data
mod keys {
    pub const LEDGER: &[u8] = b"ledger:state";
    pub const FUND: &[u8] = b"fund:state";
    pub const TOKEN: &[u8] = b"token:state";
    pub const ROLES: &[u8] = b"access:roles";
    pub const PAUSE: &[u8] = b"access:pause";
}

/// Errors from storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open database: {0}")]
    OpenFailed(String),

    #[error("Database operation failed: {0}")]
    DatabaseError(String),

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    #[error("Flush failed: {0}")]
    FlushFailed(String),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::DatabaseError(err.to_string())
    }
}

/// Statistics about the storage
#[derive(Clone, Debug)]
pub struct StorageStats {
    /// Number of keys in the database
    pub key_count: usize,
    /// Approximate disk size in bytes
    pub disk_size_bytes: u64,
}

/// Persistent key-value store for ledger and fund data
///
/// Uses sled for crash-safe, embedded storage.
/// All writes are atomic and durable after flush.
pub struct LedgerStore {
    db: sled::Db,
}

impl LedgerStore {
    /// Open or create a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path).map_err(|e| StoreError::OpenFailed(e.to_string()))?;
        Ok(Self { db })
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.db.is_empty())
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db
            .flush()
            .map_err(|e| StoreError::FlushFailed(e.to_string()))?;
        Ok(())
    }

    /// Get storage statistics
    pub fn stats(&self) -> Result<StorageStats, StoreError> {
        Ok(StorageStats {
            key_count: self.db.len(),
            disk_size_bytes: self.db.size_on_disk().unwrap_or(0),
        })
    }

    // ========================================================================
    // RAW KEY-VALUE OPERATIONS
    // ========================================================================

    /// Put raw bytes
    pub fn put_raw(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.db.insert(key, value)?;
        debug!(key = %String::from_utf8_lossy(key), bytes = value.len(), "stored");
        Ok(())
    }

    /// Get raw bytes
    pub fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.db.get(key)?.map(|v| v.to_vec()))
    }

    /// Delete a key
    pub fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        self.db.remove(key)?;
        Ok(())
    }

    fn save_bytes(&self, key: &[u8], bytes: Vec<u8>) -> Result<(), StoreError> {
        if bytes.is_empty() {
            return Err(StoreError::SerializationFailed(format!(
                "empty encoding for {}",
                String::from_utf8_lossy(key)
            )));
        }
        self.put_raw(key, &bytes)
    }

    // ========================================================================
    // LEDGER PERSISTENCE
    // ========================================================================

    /// Save the contribution ledger
    pub fn save_ledger(&self, ledger: &ContributionLedger) -> Result<(), StoreError> {
        self.save_bytes(keys::LEDGER, ledger.to_bytes())
    }

    /// Load the contribution ledger
    pub fn load_ledger(&self) -> Result<Option<ContributionLedger>, StoreError> {
        self.get_raw(keys::LEDGER)?
            .map(|bytes| {
                ContributionLedger::from_bytes(&bytes)
                    .map_err(|e| StoreError::DeserializationFailed(e.to_string()))
            })
            .transpose()
    }

    // ========================================================================
    // FUND PERSISTENCE
    // ========================================================================

    /// Save the fund intake state
    pub fn save_fund(&self, intake: &FundIntake) -> Result<(), StoreError> {
        self.save_bytes(keys::FUND, intake.to_bytes())
    }

    /// Load the fund intake state
    pub fn load_fund(&self) -> Result<Option<FundIntake>, StoreError> {
        self.get_raw(keys::FUND)?
            .map(|bytes| {
                FundIntake::from_bytes(&bytes)
                    .map_err(|e| StoreError::DeserializationFailed(e.to_string()))
            })
            .transpose()
    }

    /// Save the token balances and allowances
    pub fn save_token(&self, token: &InMemoryToken) -> Result<(), StoreError> {
        let bytes = postcard::to_allocvec(token)
            .map_err(|e| StoreError::SerializationFailed(e.to_string()))?;
        self.put_raw(keys::TOKEN, &bytes)
    }

    /// Save the fund intake and the token in one atomic batch.
    ///
    /// Either both keys are written or neither is, so the contribution
    /// counters never disagree with the balances they were credited from.
    pub fn save_fund_with_token(
        &self,
        intake: &FundIntake,
        token: &InMemoryToken,
    ) -> Result<(), StoreError> {
        let fund_bytes = intake.to_bytes();
        if fund_bytes.is_empty() {
            return Err(StoreError::SerializationFailed(
                "empty encoding for fund:state".to_string(),
            ));
        }
        let token_bytes = postcard::to_allocvec(token)
            .map_err(|e| StoreError::SerializationFailed(e.to_string()))?;

        let mut batch = sled::Batch::default();
        batch.insert(keys::FUND, fund_bytes.as_slice());
        batch.insert(keys::TOKEN, token_bytes.as_slice());
        self.db.apply_batch(batch)?;

        debug!(
            fund_bytes = fund_bytes.len(),
            token_bytes = token_bytes.len(),
            "stored fund and token"
        );
        Ok(())
    }

    /// Load the token balances and allowances
    pub fn load_token(&self) -> Result<Option<InMemoryToken>, StoreError> {
        self.get_raw(keys::TOKEN)?
            .map(|bytes| {
                postcard::from_bytes(&bytes)
                    .map_err(|e| StoreError::DeserializationFailed(e.to_string()))
            })
            .transpose()
    }

    // ========================================================================
    // ACCESS PERSISTENCE
    // ========================================================================

    /// Save role assignments
    pub fn save_roles(&self, roles: &RoleRegistry) -> Result<(), StoreError> {
        self.save_bytes(keys::ROLES, roles.to_bytes())
    }

    /// Load role assignments
    pub fn load_roles(&self) -> Result<Option<RoleRegistry>, StoreError> {
        self.get_raw(keys::ROLES)?
            .map(|bytes| {
                RoleRegistry::from_bytes(&bytes)
                    .map_err(|e| StoreError::DeserializationFailed(e.to_string()))
            })
            .transpose()
    }

    /// Save the pause flag
    pub fn save_pause(&self, pause: &PauseSwitch) -> Result<(), StoreError> {
        let bytes = postcard::to_allocvec(pause)
            .map_err(|e| StoreError::SerializationFailed(e.to_string()))?;
        self.put_raw(keys::PAUSE, &bytes)
    }

    /// Load the pause flag (a missing flag means not halted)
    pub fn load_pause(&self) -> Result<PauseSwitch, StoreError> {
        match self.get_raw(keys::PAUSE)? {
            Some(bytes) => postcard::from_bytes(&bytes)
                .map_err(|e| StoreError::DeserializationFailed(e.to_string())),
            None => Ok(PauseSwitch::new()),
        }
    }
}
