// Ledger entries - one record per contribution event

use crate::identity::ExternalRef;
use serde::{Deserialize, Serialize};

/// How an entry reached its current state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    Created,
    Amended,
}

/// A single contribution record.
///
/// Immutable once created except through `ContributionLedger::amend`,
/// which rewrites it in place without changing its position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    amount: u64,
    recorded_at: u64,
    external_ref: ExternalRef,
    kind: EntryKind,
    note: String,
}

impl LedgerEntry {
    pub(crate) fn created(
        amount: u64,
        recorded_at: u64,
        external_ref: ExternalRef,
        note: String,
    ) -> Self {
        Self {
            amount,
            recorded_at,
            external_ref,
            kind: EntryKind::Created,
            note,
        }
    }

    /// Rewrite in place. The note is replaced only when one is supplied.
    pub(crate) fn amend(
        &mut self,
        amount: u64,
        recorded_at: u64,
        external_ref: ExternalRef,
        note: Option<String>,
    ) {
        self.amount = amount;
        self.recorded_at = recorded_at;
        self.external_ref = external_ref;
        self.kind = EntryKind::Amended;
        if let Some(note) = note {
            self.note = note;
        }
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    /// Clock value at creation, or at the latest amend
    pub fn recorded_at(&self) -> u64 {
        self.recorded_at
    }

    pub fn external_ref(&self) -> &ExternalRef {
        &self.external_ref
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn is_amended(&self) -> bool {
        self.kind == EntryKind::Amended
    }
}
