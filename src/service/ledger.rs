use crate::access::CallContext;
use crate::identity::{Address, ExternalRef};
use crate::ledger::{
    AmendRequest, ContributionLedger, LedgerEntry, LedgerError, LedgerEvent, ReconciliationReport,
};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Cloneable handle to a ledger shared between tasks
#[derive(Clone, Default)]
pub struct SharedLedger {
    inner: Arc<Mutex<ContributionLedger>>,
}

impl SharedLedger {
    pub fn new(ledger: ContributionLedger) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    pub async fn append(
        &self,
        ctx: &CallContext<'_>,
        account: Address,
        amount: u64,
        clock_value: u64,
        external_ref: ExternalRef,
        note: impl Into<String>,
    ) -> Result<usize, LedgerError> {
        let note = note.into();
        let mut ledger = self.inner.lock().await;
        ledger.append(ctx, account, amount, clock_value, external_ref, note)
    }

    pub async fn amend(
        &self,
        ctx: &CallContext<'_>,
        account: Address,
        request: AmendRequest,
    ) -> Result<(), LedgerError> {
        self.inner.lock().await.amend(ctx, account, request)
    }

    pub async fn overwrite_total(
        &self,
        ctx: &CallContext<'_>,
        account: Address,
        new_total: u64,
        note: impl Into<String>,
    ) -> Result<(), LedgerError> {
        let note = note.into();
        self.inner
            .lock()
            .await
            .overwrite_total(ctx, account, new_total, note)
    }

    pub async fn total_of(&self, account: &Address) -> u64 {
        self.inner.lock().await.total_of(account)
    }

    pub async fn grand_total(&self) -> u64 {
        self.inner.lock().await.grand_total()
    }

    pub async fn history(&self, account: &Address) -> Vec<LedgerEntry> {
        self.inner.lock().await.history(account)
    }

    pub async fn reconcile(&self) -> Result<ReconciliationReport, LedgerError> {
        self.inner.lock().await.reconcile()
    }

    pub async fn poll_events(&self) -> Vec<LedgerEvent> {
        self.inner.lock().await.poll_events()
    }

    /// Owned copy of the whole ledger
    pub async fn snapshot(&self) -> ContributionLedger {
        self.inner.lock().await.clone()
    }
}
