// Intake configuration

use crate::fund::{ContributionLimits, FundError};
use crate::identity::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Construction parameters for a `FundIntake`
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct IntakeConfig {
    /// Account that holds contributed funds
    pub custody: Address,
    /// Initial treasury members
    pub treasury: Vec<Address>,
    /// Minimum contribution (0 = unbounded)
    pub min_contribution: u64,
    /// Maximum contribution (0 = unbounded)
    pub max_contribution: u64,
}

impl IntakeConfig {
    pub fn new(custody: Address) -> Self {
        Self {
            custody,
            ..Self::default()
        }
    }

    pub fn with_treasury_wallet(mut self, wallet: Address) -> Self {
        self.treasury.push(wallet);
        self
    }

    pub fn with_treasury(mut self, wallets: impl IntoIterator<Item = Address>) -> Self {
        self.treasury.extend(wallets);
        self
    }

    pub fn with_min_contribution(mut self, min: u64) -> Self {
        self.min_contribution = min;
        self
    }

    pub fn with_max_contribution(mut self, max: u64) -> Self {
        self.max_contribution = max;
        self
    }

    pub fn limits(&self) -> ContributionLimits {
        ContributionLimits::new(self.min_contribution, self.max_contribution)
    }

    /// Validate the configuration.
    ///
    /// Custody may not appear in the treasury.
    /// `min_contribution > max_contribution` is accepted.
    pub fn validate(&self) -> Result<(), FundError> {
        if self.custody.is_null() {
            return Err(FundError::InvalidAddress);
        }
        if self.treasury.is_empty() {
            return Err(FundError::EmptyTreasury);
        }

        let mut seen = HashSet::new();
        for wallet in &self.treasury {
            if wallet.is_null() {
                return Err(FundError::InvalidAddress);
            }
            if *wallet == self.custody {
                return Err(FundError::CustodyInTreasury(*wallet));
            }
            if !seen.insert(wallet) {
                return Err(FundError::DuplicateTreasuryWallet(*wallet));
            }
        }
        Ok(())
    }
}
