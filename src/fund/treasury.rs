// Treasury registry - destinations for emergency withdrawals.
// Never empty once constructed.

use crate::fund::FundError;
use crate::identity::Address;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryRegistry {
    members: Vec<Address>,
}

impl TreasuryRegistry {
    /// Build a registry from distinct, non-null members
    pub fn new(members: Vec<Address>) -> Result<Self, FundError> {
        if members.is_empty() {
            return Err(FundError::EmptyTreasury);
        }

        let mut registry = Self {
            members: Vec::with_capacity(members.len()),
        };
        for member in members {
            registry.insert(member)?;
        }
        Ok(registry)
    }

    pub fn contains(&self, wallet: &Address) -> bool {
        self.members.contains(wallet)
    }

    pub fn members(&self) -> &[Address] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub(crate) fn insert(&mut self, wallet: Address) -> Result<(), FundError> {
        if wallet.is_null() {
            return Err(FundError::InvalidAddress);
        }
        if self.contains(&wallet) {
            return Err(FundError::DuplicateTreasuryWallet(wallet));
        }
        self.members.push(wallet);
        Ok(())
    }

    /// Swap-and-pop removal; refuses to drop the last member
    pub(crate) fn remove(&mut self, wallet: &Address) -> Result<(), FundError> {
        let position = self
            .members
            .iter()
            .position(|m| m == wallet)
            .ok_or(FundError::NotATreasuryMember(*wallet))?;

        if self.members.len() <= 1 {
            return Err(FundError::CannotRemoveLastTreasuryWallet);
        }

        self.members.swap_remove(position);
        Ok(())
    }
}
