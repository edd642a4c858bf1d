// fundledger - contribution ledger and fund intake
//
// Two independent components that share one discipline: every aggregate
// is stored explicitly, updated with checked arithmetic, and only after
// every fallible step of the operation has succeeded.

pub mod access;
pub mod accounting;
pub mod fund;
pub mod identity;
pub mod ledger;
pub mod service;
pub mod storage;
