use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticError {
    #[error("Aggregate would overflow")]
    Overflow,

    #[error("Aggregate would underflow: {value} - {decrease}")]
    Underflow { value: u64, decrease: u64 },
}

/// Signed difference between two unsigned values, kept as a direction
/// plus a magnitude so it can be applied without a signed cast.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Delta {
    Increase(u64),
    Decrease(u64),
    Unchanged,
}

impl Delta {
    /// `new - old`
    pub fn between(old: u64, new: u64) -> Self {
        match new.cmp(&old) {
            std::cmp::Ordering::Greater => Delta::Increase(new - old),
            std::cmp::Ordering::Less => Delta::Decrease(old - new),
            std::cmp::Ordering::Equal => Delta::Unchanged,
        }
    }

    /// Apply the delta to `value`
    pub fn apply(self, value: u64) -> Result<u64, ArithmeticError> {
        match self {
            Delta::Increase(amount) => checked_credit(value, amount),
            Delta::Decrease(amount) => checked_debit(value, amount),
            Delta::Unchanged => Ok(value),
        }
    }
}

pub fn checked_credit(value: u64, amount: u64) -> Result<u64, ArithmeticError> {
    value.checked_add(amount).ok_or(ArithmeticError::Overflow)
}

pub fn checked_debit(value: u64, amount: u64) -> Result<u64, ArithmeticError> {
    value.checked_sub(amount).ok_or(ArithmeticError::Underflow {
        value,
        decrease: amount,
    })
}

/// Sum without wrapping
pub fn checked_sum<I>(values: I) -> Result<u64, ArithmeticError>
where
    I: IntoIterator<Item = u64>,
{
    values.into_iter().try_fold(0u64, checked_credit)
}
