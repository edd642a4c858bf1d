// Accounting module - Checked arithmetic shared by every aggregate
//
// Aggregates never wrap and never saturate: an overflow or an underflow
// means an invariant was already broken, so it fails loudly instead.

mod delta;

pub use delta::{checked_credit, checked_debit, checked_sum, ArithmeticError, Delta};
