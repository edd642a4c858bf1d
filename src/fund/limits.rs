// Contribution limits - 0 on either side means "no bound"

use crate::fund::FundError;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionLimits {
    min: u64,
    max: u64,
}

impl ContributionLimits {
    /// No ordering is enforced between `min` and `max`
    pub fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    /// No bounds on either side
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn min(&self) -> u64 {
        self.min
    }

    pub fn max(&self) -> u64 {
        self.max
    }

    /// Both bounds set with `min > max`: every amount is rejected
    pub fn is_inverted(&self) -> bool {
        self.min > 0 && self.max > 0 && self.min > self.max
    }

    /// Minimum is checked before maximum
    pub fn check(&self, amount: u64) -> Result<(), FundError> {
        if self.min > 0 && amount < self.min {
            return Err(FundError::BelowMinimum {
                amount,
                min: self.min,
            });
        }
        if self.max > 0 && amount > self.max {
            return Err(FundError::AboveMaximum {
                amount,
                max: self.max,
            });
        }
        Ok(())
    }
}
