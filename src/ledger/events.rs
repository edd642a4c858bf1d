// Ledger notifications - drained by audit consumers via poll_events

use crate::identity::{Address, ExternalRef};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerEvent {
    EntryAppended {
        account: Address,
        index: usize,
        amount: u64,
        recorded_at: u64,
        external_ref: ExternalRef,
        note: String,
    },
    EntryAmended {
        account: Address,
        index: usize,
        old_amount: u64,
        new_amount: u64,
        /// Clock value the caller asked for; not stored on the entry
        requested_clock: u64,
        recorded_at: u64,
        external_ref: ExternalRef,
        note: String,
    },
    TotalOverwritten {
        account: Address,
        old_total: u64,
        new_total: u64,
        note: String,
    },
}

impl LedgerEvent {
    pub fn account(&self) -> &Address {
        match self {
            LedgerEvent::EntryAppended { account, .. }
            | LedgerEvent::EntryAmended { account, .. }
            | LedgerEvent::TotalOverwritten { account, .. } => account,
        }
    }
}
