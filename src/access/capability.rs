// Capabilities and the in-memory role registry

use crate::identity::Address;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Permission bits checked before privileged operations
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Append, amend and overwrite ledger totals
    LedgerWriter,
    /// Replace the contribution limits
    LimitsManager,
    /// Move custody funds to a treasury member
    EmergencyWithdrawer,
    /// Manage the treasury set (highest tier)
    Admin,
    /// Halt and resume the system
    Pauser,
}

impl Capability {
    pub const ALL: [Capability; 5] = [
        Capability::LedgerWriter,
        Capability::LimitsManager,
        Capability::EmergencyWithdrawer,
        Capability::Admin,
        Capability::Pauser,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::LedgerWriter => "ledger-writer",
            Capability::LimitsManager => "limits-manager",
            Capability::EmergencyWithdrawer => "emergency-withdrawer",
            Capability::Admin => "admin",
            Capability::Pauser => "pauser",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown capability '{}'", s))
    }
}

/// Answers "does caller hold capability C?"
pub trait CapabilityCheck: Send + Sync {
    fn has_capability(&self, caller: &Address, capability: Capability) -> bool;
}

/// Role assignments kept in memory (and persisted by the store)
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RoleRegistry {
    grants: HashMap<Address, HashSet<Capability>>,
}

impl RoleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry where `admin` holds every capability
    pub fn with_admin(admin: Address) -> Self {
        let mut registry = Self::new();
        for capability in Capability::ALL {
            registry.grant(admin, capability);
        }
        registry
    }

    /// Grant a capability. Returns false if it was already held.
    pub fn grant(&mut self, account: Address, capability: Capability) -> bool {
        self.grants.entry(account).or_default().insert(capability)
    }

    /// Revoke a capability. Returns false if it was not held.
    pub fn revoke(&mut self, account: &Address, capability: Capability) -> bool {
        let Some(held) = self.grants.get_mut(account) else {
            return false;
        };
        let removed = held.remove(&capability);
        if held.is_empty() {
            self.grants.remove(account);
        }
        removed
    }

    /// Capabilities currently held by an account
    pub fn capabilities_of(&self, account: &Address) -> Vec<Capability> {
        let mut held: Vec<Capability> = self
            .grants
            .get(account)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        held.sort_by_key(|c| c.as_str());
        held
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        postcard::to_allocvec(self).unwrap_or_default()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }
}

impl CapabilityCheck for RoleRegistry {
    fn has_capability(&self, caller: &Address, capability: Capability) -> bool {
        self.grants
            .get(caller)
            .is_some_and(|held| held.contains(&capability))
    }
}
