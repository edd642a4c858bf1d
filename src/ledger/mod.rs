// Ledger module - Per-account contribution history with reconciled totals

mod contribution;
mod entry;
mod events;

pub use contribution::{
    AmendRequest, ContributionLedger, Divergence, LedgerError, ReconciliationReport,
};
pub use entry::{EntryKind, LedgerEntry};
pub use events::LedgerEvent;
