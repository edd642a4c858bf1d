// Value transfer primitive - balance, allowance and atomic transfers.
// The fund intake only ever talks to custody through this trait.

use crate::identity::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: u64, required: u64 },

    #[error("Insufficient allowance: approved {approved}, required {required}")]
    InsufficientAllowance { approved: u64, required: u64 },

    #[error("Balance would overflow")]
    Overflow,

    #[error("Transfer rejected: {0}")]
    Rejected(String),
}

/// External value-transfer primitive.
///
/// Implementations must be atomic: a failed call moves nothing.
pub trait ValueTransfer {
    fn balance_of(&self, account: &Address) -> u64;

    fn allowance(&self, owner: &Address, spender: &Address) -> u64;

    /// `spender` moves `amount` from `from` to `to`, consuming allowance
    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> Result<(), TransferError>;

    /// `from` moves `amount` of its own balance to `to`
    fn transfer(&mut self, from: &Address, to: &Address, amount: u64) -> Result<(), TransferError>;
}

/// In-memory token used by the CLI and by tests
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InMemoryToken {
    balances: HashMap<Address, u64>,
    allowances: HashMap<(Address, Address), u64>,
    total_supply: u64,
    /// When set, every transfer is rejected with this message
    #[serde(skip)]
    failure: Option<String>,
}

impl InMemoryToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create new units out of thin air
    pub fn mint(&mut self, account: Address, amount: u64) -> Result<(), TransferError> {
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TransferError::Overflow)?;
        let balance = self
            .balance_of(&account)
            .checked_add(amount)
            .ok_or(TransferError::Overflow)?;
        self.balances.insert(account, balance);
        self.total_supply = supply;
        Ok(())
    }

    /// Set (not add to) the allowance `owner` grants `spender`
    pub fn approve(&mut self, owner: Address, spender: Address, amount: u64) {
        if amount == 0 {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), amount);
        }
    }

    /// Make every following transfer fail
    pub fn fail_transfers(&mut self, message: impl Into<String>) {
        self.failure = Some(message.into());
    }

    /// Undo `fail_transfers`
    pub fn restore_transfers(&mut self) {
        self.failure = None;
    }

    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    fn move_balance(
        &mut self,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> Result<(), TransferError> {
        if let Some(message) = &self.failure {
            return Err(TransferError::Rejected(message.clone()));
        }

        let available = self.balance_of(from);
        if available < amount {
            return Err(TransferError::InsufficientBalance {
                available,
                required: amount,
            });
        }
        if from == to {
            return Ok(());
        }
        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TransferError::Overflow)?;

        self.balances.insert(*from, available - amount);
        self.balances.insert(*to, credited);
        Ok(())
    }
}

impl ValueTransfer for InMemoryToken {
    fn balance_of(&self, account: &Address) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> u64 {
        self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> Result<(), TransferError> {
        let approved = self.allowance(from, spender);
        if approved < amount {
            return Err(TransferError::InsufficientAllowance {
                approved,
                required: amount,
            });
        }

        self.move_balance(from, to, amount)?;
        self.approve(*from, *spender, approved - amount);
        Ok(())
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: u64) -> Result<(), TransferError> {
        self.move_balance(from, to, amount)
    }
}
