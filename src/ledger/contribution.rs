// Contribution ledger - append/amend history per account plus a running
// total per account and a grand total across all accounts.
//
// Two aggregates are stored rather than derived:
// - `Account::total` tracks the sum of the account's history for append and
//   amend, but `overwrite_total` rewrites it directly and may leave it
//   different from that sum.
// - `grand_total` equals the sum of every `Account::total` after every
//   successful mutation, including overwrites.

use crate::access::{AccessError, CallContext, Capability};
use crate::accounting::{checked_credit, checked_debit, checked_sum, ArithmeticError, Delta};
use crate::identity::{Address, ExternalRef};
use crate::ledger::entry::LedgerEntry;
use crate::ledger::events::LedgerEvent;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during ledger operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("Invalid account: null identity")]
    InvalidAccount,

    #[error("Amount must be greater than zero")]
    NonPositiveAmount,

    #[error("Entry index {index} out of range (history length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Aggregate arithmetic failed: {0}")]
    Arithmetic(#[from] ArithmeticError),

    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),
}

/// Parameters for rewriting an existing entry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AmendRequest {
    pub index: usize,
    pub new_amount: u64,
    /// Caller's clock value. The entry is stamped with the invocation clock instead.
    pub clock_value: u64,
    pub external_ref: ExternalRef,
    /// `Some` replaces the note, `None` keeps the existing one verbatim
    pub note: Option<String>,
}

impl AmendRequest {
    pub fn new(index: usize, new_amount: u64, clock_value: u64, external_ref: ExternalRef) -> Self {
        Self {
            index,
            new_amount,
            clock_value,
            external_ref,
            note: None,
        }
    }

    /// Replace the entry's note as part of the amend
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// An account whose stored total differs from the sum of its history
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Divergence {
    pub account: Address,
    pub total: u64,
    pub history_sum: u64,
}

/// Result of recomputing every aggregate from scratch
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconciliationReport {
    pub grand_total: u64,
    pub sum_of_totals: u64,
    pub accounts: usize,
    /// Accounts touched by `overwrite_total` since their last append/amend
    pub diverged: Vec<Divergence>,
}

impl ReconciliationReport {
    /// Whether the grand total matches the per-account totals
    pub fn is_balanced(&self) -> bool {
        self.grand_total == self.sum_of_totals
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct Account {
    history: Vec<LedgerEntry>,
    total: u64,
}

/// The contribution ledger
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ContributionLedger {
    accounts: HashMap<Address, Account>,
    grand_total: u64,
    #[serde(skip)]
    events: Vec<LedgerEvent>,
}

impl ContributionLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// Append a new entry to `account`'s history and return its index
    pub fn append(
        &mut self,
        ctx: &CallContext<'_>,
        account: Address,
        amount: u64,
        clock_value: u64,
        external_ref: ExternalRef,
        note: impl Into<String>,
    ) -> Result<usize, LedgerError> {
        ctx.require(Capability::LedgerWriter)?;

        if account.is_null() {
            return Err(LedgerError::InvalidAccount);
        }
        if amount == 0 {
            return Err(LedgerError::NonPositiveAmount);
        }

        let old_total = self.accounts.get(&account).map_or(0, |a| a.total);
        let new_total = checked_credit(old_total, amount)?;
        let new_grand_total = checked_credit(self.grand_total, amount)?;

        let note = note.into();
        let slot = self.accounts.entry(account).or_default();
        let entry = LedgerEntry::created(amount, clock_value, external_ref, note.clone());
        slot.history.push(entry);
        slot.total = new_total;
        let index = slot.history.len() - 1;
        self.grand_total = new_grand_total;

        info!(%account, index, amount, total = new_total, "ledger entry appended");
        self.events.push(LedgerEvent::EntryAppended {
            account,
            index,
            amount,
            recorded_at: clock_value,
            external_ref,
            note,
        });

        Ok(index)
    }

    /// Rewrite an existing entry in place and shift both aggregates by
    /// `new_amount - old_amount`.
    ///
    /// The entry is stamped with the invocation clock (`ctx.now()`), not
    /// with `request.clock_value`.
    pub fn amend(
        &mut self,
        ctx: &CallContext<'_>,
        account: Address,
        request: AmendRequest,
    ) -> Result<(), LedgerError> {
        ctx.require(Capability::LedgerWriter)?;

        let len = self.history_len(&account);
        let slot = self
            .accounts
            .get_mut(&account)
            .filter(|a| request.index < a.history.len())
            .ok_or(LedgerError::IndexOutOfRange {
                index: request.index,
                len,
            })?;

        let old_amount = slot.history[request.index].amount();
        let delta = Delta::between(old_amount, request.new_amount);
        let new_total = delta.apply(slot.total)?;
        let new_grand_total = delta.apply(self.grand_total)?;

        let recorded_at = ctx.now();
        let entry = &mut slot.history[request.index];
        entry.amend(request.new_amount, recorded_at, request.external_ref, request.note);
        let note = entry.note().to_string();
        slot.total = new_total;
        self.grand_total = new_grand_total;

        info!(
            %account,
            index = request.index,
            old_amount,
            new_amount = request.new_amount,
            total = new_total,
            "ledger entry amended"
        );
        self.events.push(LedgerEvent::EntryAmended {
            account,
            index: request.index,
            old_amount,
            new_amount: request.new_amount,
            requested_clock: request.clock_value,
            recorded_at,
            external_ref: request.external_ref,
            note,
        });

        Ok(())
    }

    /// Manual correction: set `account`'s total directly.
    ///
    /// History is left untouched, so afterwards the total may no longer
    /// equal the sum of the account's entries. The grand total is shifted
    /// by the same delta and stays equal to the sum of all account totals.
    pub fn overwrite_total(
        &mut self,
        ctx: &CallContext<'_>,
        account: Address,
        new_total: u64,
        note: impl Into<String>,
    ) -> Result<(), LedgerError> {
        ctx.require(Capability::LedgerWriter)?;

        let old_total = self.accounts.get(&account).map_or(0, |a| a.total);
        let without_account = checked_debit(self.grand_total, old_total)?;
        let new_grand_total = checked_credit(without_account, new_total)?;

        self.accounts.entry(account).or_default().total = new_total;
        self.grand_total = new_grand_total;

        let note = note.into();
        info!(%account, old_total, new_total, note = %note, "account total overwritten");
        self.events.push(LedgerEvent::TotalOverwritten {
            account,
            old_total,
            new_total,
            note,
        });

        Ok(())
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Current aggregate of an account (0 for unknown accounts)
    pub fn total_of(&self, account: &Address) -> u64 {
        self.accounts.get(account).map_or(0, |a| a.total)
    }

    /// Sum of every account's total
    pub fn grand_total(&self) -> u64 {
        self.grand_total
    }

    /// Copy of an account's history, in creation order
    pub fn history(&self, account: &Address) -> Vec<LedgerEntry> {
        self.accounts
            .get(account)
            .map(|a| a.history.clone())
            .unwrap_or_default()
    }

    /// Copy of a single entry
    pub fn entry(&self, account: &Address, index: usize) -> Result<LedgerEntry, LedgerError> {
        self.accounts
            .get(account)
            .and_then(|a| a.history.get(index))
            .cloned()
            .ok_or(LedgerError::IndexOutOfRange {
                index,
                len: self.history_len(account),
            })
    }

    /// Number of entries recorded for an account
    pub fn history_len(&self, account: &Address) -> usize {
        self.accounts.get(account).map_or(0, |a| a.history.len())
    }

    /// Every account that has been written, sorted
    pub fn accounts(&self) -> Vec<Address> {
        let mut accounts: Vec<Address> = self.accounts.keys().copied().collect();
        accounts.sort();
        accounts
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Recompute all aggregates and report where they disagree
    pub fn reconcile(&self) -> Result<ReconciliationReport, LedgerError> {
        let sum_of_totals = checked_sum(self.accounts.values().map(|a| a.total))?;

        let mut diverged = Vec::new();
        for account in self.accounts() {
            let slot = &self.accounts[&account];
            let history_sum = checked_sum(slot.history.iter().map(LedgerEntry::amount))?;
            if history_sum != slot.total {
                diverged.push(Divergence {
                    account,
                    total: slot.total,
                    history_sum,
                });
            }
        }

        debug!(
            grand_total = self.grand_total,
            sum_of_totals,
            diverged = diverged.len(),
            "ledger reconciled"
        );

        Ok(ReconciliationReport {
            grand_total: self.grand_total,
            sum_of_totals,
            accounts: self.accounts.len(),
            diverged,
        })
    }

    /// Drain pending notifications
    pub fn poll_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }

    // ========================================================================
    // SERIALIZATION
    // ========================================================================

    /// Serialize the ledger to bytes (pending events are not included)
    pub fn to_bytes(&self) -> Vec<u8> {
        postcard::to_allocvec(self).unwrap_or_default()
    }

    /// Deserialize a ledger from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LedgerError> {
        postcard::from_bytes(bytes).map_err(|e| LedgerError::DeserializationFailed(e.to_string()))
    }
}
