// Fund intake - accepts contributions into custody and routes emergency
// withdrawals to treasury members.
//
// Every operation runs its checks and any fallible arithmetic first, then
// calls the transfer primitive at most once, and only mutates local
// counters after that call has succeeded. A failure at any step leaves the
// intake exactly as it was.

use crate::access::{AccessError, CallContext, Capability};
use crate::accounting::{checked_credit, checked_sum, ArithmeticError};
use crate::fund::{
    ContributionLimits, IntakeConfig, TransferError, TreasuryRegistry, ValueTransfer,
};
use crate::identity::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{info, warn};

// ============================================================================
// FUND ERROR
// ============================================================================

/// Errors that can occur during fund operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FundError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("Contribution {amount} is below the minimum of {min}")]
    BelowMinimum { amount: u64, min: u64 },

    #[error("Contribution {amount} is above the maximum of {max}")]
    AboveMaximum { amount: u64, max: u64 },

    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: u64, required: u64 },

    #[error("Insufficient allowance: approved {approved}, required {required}")]
    InsufficientAllowance { approved: u64, required: u64 },

    #[error("Transfer failed: {0}")]
    TransferFailed(#[source] TransferError),

    #[error("{0} is not a treasury member")]
    NotATreasuryMember(Address),

    #[error("Insufficient custody balance: available {available}, required {required}")]
    InsufficientCustodyBalance { available: u64, required: u64 },

    #[error("Cannot remove the last treasury wallet")]
    CannotRemoveLastTreasuryWallet,

    #[error("Treasury must have at least one member")]
    EmptyTreasury,

    #[error("{0} is already a treasury member")]
    DuplicateTreasuryWallet(Address),

    #[error("Custody account {0} cannot be a treasury member")]
    CustodyInTreasury(Address),

    #[error("{0} cannot contribute: custody and the null identity are not contributors")]
    InvalidContributor(Address),

    #[error("Invalid address: null identity")]
    InvalidAddress,

    #[error("Aggregate arithmetic failed: {0}")]
    Arithmetic(#[from] ArithmeticError),

    #[error("State error: {0}")]
    StateError(String),
}

// ============================================================================
// FUND EVENTS
// ============================================================================

/// Notifications emitted by successful fund operations
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FundEvent {
    ContributionReceived {
        contributor: Address,
        amount: u64,
        contributed: u64,
        total_contributed: u64,
    },
    LimitsUpdated {
        min: u64,
        max: u64,
    },
    EmergencyWithdrawal {
        treasury: Address,
        amount: u64,
        custody_balance_after: u64,
    },
    TreasuryWalletAdded {
        wallet: Address,
    },
    TreasuryWalletRemoved {
        wallet: Address,
    },
}

/// Receipt for an accepted contribution
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Contribution {
    pub contributor: Address,
    pub amount: u64,
    /// Contributor's cumulative total after this contribution
    pub contributed: u64,
    /// Global cumulative total after this contribution
    pub total_contributed: u64,
}

/// Fund intake state for export/import
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundState {
    pub custody: Address,
    pub treasury: TreasuryRegistry,
    pub limits: ContributionLimits,
    pub contributed: HashMap<Address, u64>,
    pub total_contributed: u64,
}

// ============================================================================
// FUND INTAKE
// ============================================================================

#[derive(Clone, Debug)]
pub struct FundIntake {
    custody: Address,
    treasury: TreasuryRegistry,
    limits: ContributionLimits,
    contributed: HashMap<Address, u64>,
    total_contributed: u64,
    events: Vec<FundEvent>,
}

impl FundIntake {
    /// Create an intake from a validated configuration
    pub fn new(config: IntakeConfig) -> Result<Self, FundError> {
        config.validate()?;

        let limits = config.limits();
        if limits.is_inverted() {
            warn!(
                min = limits.min(),
                max = limits.max(),
                "minimum contribution exceeds maximum; every contribution will be rejected"
            );
        }

        Ok(Self {
            custody: config.custody,
            treasury: TreasuryRegistry::new(config.treasury)?,
            limits,
            contributed: HashMap::new(),
            total_contributed: 0,
            events: Vec::new(),
        })
    }

    // ========================================================================
    // CONTRIBUTIONS
    // ========================================================================

    /// Move `amount` from the caller into custody and credit it.
    ///
    /// Checks run in order: halt gate, contributor identity, minimum, maximum,
    /// balance, allowance. Balance and allowance are advisory; the transfer
    /// result is what counts.
    ///
    /// Custody itself is never a contributor: a self-transfer moves nothing
    /// and would still be credited.
    pub fn contribute<T>(
        &mut self,
        ctx: &CallContext<'_>,
        transfer: &mut T,
        amount: u64,
    ) -> Result<Contribution, FundError>
    where
        T: ValueTransfer + ?Sized,
    {
        ctx.ensure_live()?;
        let contributor = ctx.caller();
        if contributor == self.custody || contributor.is_null() {
            warn!(%contributor, amount, "contribution from custody or null identity rejected");
            return Err(FundError::InvalidContributor(contributor));
        }

        self.limits.check(amount)?;

        let available = transfer.balance_of(&contributor);
        if available < amount {
            return Err(FundError::InsufficientBalance {
                available,
                required: amount,
            });
        }
        let approved = transfer.allowance(&contributor, &self.custody);
        if approved < amount {
            return Err(FundError::InsufficientAllowance {
                approved,
                required: amount,
            });
        }

        let contributed = checked_credit(self.contributed_of(&contributor), amount)?;
        let total_contributed = checked_credit(self.total_contributed, amount)?;

        transfer
            .transfer_from(&self.custody, &contributor, &self.custody, amount)
            .map_err(|e| {
                warn!(%contributor, amount, error = %e, "contribution transfer failed");
                FundError::TransferFailed(e)
            })?;

        self.contributed.insert(contributor, contributed);
        self.total_contributed = total_contributed;

        info!(%contributor, amount, contributed, total_contributed, "contribution received");
        self.events.push(FundEvent::ContributionReceived {
            contributor,
            amount,
            contributed,
            total_contributed,
        });

        Ok(Contribution {
            contributor,
            amount,
            contributed,
            total_contributed,
        })
    }

    /// Replace both limits. `min > max` is accepted and logged.
    pub fn update_limits(
        &mut self,
        ctx: &CallContext<'_>,
        min: u64,
        max: u64,
    ) -> Result<(), FundError> {
        ctx.require(Capability::LimitsManager)?;

        let limits = ContributionLimits::new(min, max);
        if limits.is_inverted() {
            warn!(
                min,
                max,
                "minimum contribution exceeds maximum; every contribution will be rejected"
            );
        }
        self.limits = limits;

        info!(min, max, caller = %ctx.caller(), "contribution limits updated");
        self.events.push(FundEvent::LimitsUpdated { min, max });
        Ok(())
    }

    // ========================================================================
    // TREASURY
    // ========================================================================

    /// Send `amount` from custody to a treasury member.
    ///
    /// The custody balance is read live from the transfer primitive; it can
    /// differ from `total_contributed` once withdrawals have happened.
    pub fn emergency_withdraw<T>(
        &mut self,
        ctx: &CallContext<'_>,
        transfer: &mut T,
        treasury: Address,
        amount: u64,
    ) -> Result<(), FundError>
    where
        T: ValueTransfer + ?Sized,
    {
        ctx.require(Capability::EmergencyWithdrawer)?;

        if !self.treasury.contains(&treasury) {
            return Err(FundError::NotATreasuryMember(treasury));
        }

        let available = transfer.balance_of(&self.custody);
        if amount > available {
            return Err(FundError::InsufficientCustodyBalance {
                available,
                required: amount,
            });
        }

        transfer
            .transfer(&self.custody, &treasury, amount)
            .map_err(|e| {
                warn!(%treasury, amount, error = %e, "emergency withdrawal transfer failed");
                FundError::TransferFailed(e)
            })?;

        let custody_balance_after = transfer.balance_of(&self.custody);
        info!(
            %treasury,
            amount,
            custody_balance_after,
            caller = %ctx.caller(),
            "emergency withdrawal"
        );
        self.events.push(FundEvent::EmergencyWithdrawal {
            treasury,
            amount,
            custody_balance_after,
        });
        Ok(())
    }

    /// Add a treasury member. Custody can never be one.
    pub fn add_treasury_wallet(
        &mut self,
        ctx: &CallContext<'_>,
        wallet: Address,
    ) -> Result<(), FundError> {
        ctx.require(Capability::Admin)?;
        if wallet == self.custody {
            return Err(FundError::CustodyInTreasury(wallet));
        }
        self.treasury.insert(wallet)?;

        info!(%wallet, members = self.treasury.len(), "treasury wallet added");
        self.events.push(FundEvent::TreasuryWalletAdded { wallet });
        Ok(())
    }

    /// Remove a treasury member; the last one can never be removed
    pub fn remove_treasury_wallet(
        &mut self,
        ctx: &CallContext<'_>,
        wallet: Address,
    ) -> Result<(), FundError> {
        ctx.require(Capability::Admin)?;
        self.treasury.remove(&wallet)?;

        info!(%wallet, members = self.treasury.len(), "treasury wallet removed");
        self.events.push(FundEvent::TreasuryWalletRemoved { wallet });
        Ok(())
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Cumulative contributions of one participant
    pub fn contributed_of(&self, account: &Address) -> u64 {
        self.contributed.get(account).copied().unwrap_or(0)
    }

    /// Cumulative contributions of everyone
    pub fn total_contributed(&self) -> u64 {
        self.total_contributed
    }

    pub fn limits(&self) -> ContributionLimits {
        self.limits
    }

    pub fn custody(&self) -> Address {
        self.custody
    }

    /// Live custody balance as reported by the transfer primitive
    pub fn custody_balance<T>(&self, transfer: &T) -> u64
    where
        T: ValueTransfer + ?Sized,
    {
        transfer.balance_of(&self.custody)
    }

    pub fn treasury_members(&self) -> Vec<Address> {
        self.treasury.members().to_vec()
    }

    pub fn is_treasury_member(&self, wallet: &Address) -> bool {
        self.treasury.contains(wallet)
    }

    /// Participants with a contribution record, sorted
    pub fn contributors(&self) -> Vec<Address> {
        let mut contributors: Vec<Address> = self.contributed.keys().copied().collect();
        contributors.sort();
        contributors
    }

    /// Drain pending notifications
    pub fn poll_events(&mut self) -> Vec<FundEvent> {
        std::mem::take(&mut self.events)
    }

    // ========================================================================
    // STATE EXPORT/IMPORT
    // ========================================================================

    /// Export intake state for persistence
    pub fn export_state(&self) -> FundState {
        FundState {
            custody: self.custody,
            treasury: self.treasury.clone(),
            limits: self.limits,
            contributed: self.contributed.clone(),
            total_contributed: self.total_contributed,
        }
    }

    /// Rebuild an intake from exported state, re-checking its invariants
    pub fn from_state(state: FundState) -> Result<Self, FundError> {
        if state.custody.is_null() {
            return Err(FundError::InvalidAddress);
        }
        let treasury = TreasuryRegistry::new(state.treasury.members().to_vec())?;
        if treasury.contains(&state.custody) {
            return Err(FundError::CustodyInTreasury(state.custody));
        }

        let sum = checked_sum(state.contributed.values().copied())?;
        if sum != state.total_contributed {
            return Err(FundError::StateError(format!(
                "total_contributed {} does not match per-account sum {}",
                state.total_contributed, sum
            )));
        }

        Ok(Self {
            custody: state.custody,
            treasury,
            limits: state.limits,
            contributed: state.contributed,
            total_contributed: state.total_contributed,
            events: Vec::new(),
        })
    }

    /// Serialize the intake state to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        postcard::to_allocvec(&self.export_state()).unwrap_or_default()
    }

    /// Deserialize an intake from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FundError> {
        let state: FundState =
            postcard::from_bytes(bytes).map_err(|e| FundError::StateError(e.to_string()))?;
        Self::from_state(state)
    }
}
