// Call context - who is calling, at what ledger clock, and against which
// authorization and halt collaborators. Built fresh for every invocation.

use crate::access::{Capability, CapabilityCheck, HaltGate};
use crate::identity::Address;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("Caller {caller} lacks capability '{capability}'")]
    Unauthorized {
        caller: Address,
        capability: Capability,
    },

    #[error("System is halted")]
    Halted,
}

/// Per-invocation context handed to every mutating operation
#[derive(Clone, Copy)]
pub struct CallContext<'a> {
    caller: Address,
    now: u64,
    capabilities: &'a dyn CapabilityCheck,
    halt: &'a dyn HaltGate,
}

impl<'a> CallContext<'a> {
    pub fn new(
        caller: Address,
        now: u64,
        capabilities: &'a dyn CapabilityCheck,
        halt: &'a dyn HaltGate,
    ) -> Self {
        Self {
            caller,
            now,
            capabilities,
            halt,
        }
    }

    /// The invoking participant
    pub fn caller(&self) -> Address {
        self.caller
    }

    /// Ledger clock value for this invocation
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Fail unless the system is live. Queried fresh on every call.
    pub fn ensure_live(&self) -> Result<(), AccessError> {
        if self.halt.is_halted() {
            warn!(caller = %self.caller, "rejected call while halted");
            return Err(AccessError::Halted);
        }
        Ok(())
    }

    /// Fail unless the caller holds `capability` and the system is live
    pub fn require(&self, capability: Capability) -> Result<(), AccessError> {
        if !self.capabilities.has_capability(&self.caller, capability) {
            warn!(caller = %self.caller, %capability, "capability check failed");
            return Err(AccessError::Unauthorized {
                caller: self.caller,
                capability,
            });
        }
        self.ensure_live()
    }
}
