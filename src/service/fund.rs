use crate::access::CallContext;
use crate::fund::{Contribution, FundError, FundEvent, FundIntake, FundState, ValueTransfer};
use crate::identity::Address;
use std::sync::Arc;
use tokio::sync::Mutex;

struct Desk<T> {
    intake: FundIntake,
    transfer: T,
}

/// Cloneable handle to a fund intake and its transfer primitive.
///
/// Both live under the same lock: no contribution or withdrawal can observe
/// the counters or the custody balance while another one is in flight.
pub struct SharedFundIntake<T> {
    inner: Arc<Mutex<Desk<T>>>,
}

impl<T> Clone for SharedFundIntake<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> SharedFundIntake<T>
where
    T: ValueTransfer + Send,
{
    pub fn new(intake: FundIntake, transfer: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Desk { intake, transfer })),
        }
    }

    pub async fn contribute(
        &self,
        ctx: &CallContext<'_>,
        amount: u64,
    ) -> Result<Contribution, FundError> {
        let mut guard = self.inner.lock().await;
        let desk = &mut *guard;
        desk.intake.contribute(ctx, &mut desk.transfer, amount)
    }

    pub async fn emergency_withdraw(
        &self,
        ctx: &CallContext<'_>,
        treasury: Address,
        amount: u64,
    ) -> Result<(), FundError> {
        let mut guard = self.inner.lock().await;
        let desk = &mut *guard;
        desk.intake
            .emergency_withdraw(ctx, &mut desk.transfer, treasury, amount)
    }

    pub async fn update_limits(
        &self,
        ctx: &CallContext<'_>,
        min: u64,
        max: u64,
    ) -> Result<(), FundError> {
        self.inner.lock().await.intake.update_limits(ctx, min, max)
    }

    pub async fn add_treasury_wallet(
        &self,
        ctx: &CallContext<'_>,
        wallet: Address,
    ) -> Result<(), FundError> {
        self.inner
            .lock()
            .await
            .intake
            .add_treasury_wallet(ctx, wallet)
    }

    pub async fn remove_treasury_wallet(
        &self,
        ctx: &CallContext<'_>,
        wallet: Address,
    ) -> Result<(), FundError> {
        self.inner
            .lock()
            .await
            .intake
            .remove_treasury_wallet(ctx, wallet)
    }

    /// Run `f` against the transfer primitive while holding the lock
    pub async fn with_transfer<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.inner.lock().await.transfer)
    }

    pub async fn contributed_of(&self, account: &Address) -> u64 {
        self.inner.lock().await.intake.contributed_of(account)
    }

    pub async fn total_contributed(&self) -> u64 {
        self.inner.lock().await.intake.total_contributed()
    }

    pub async fn custody_balance(&self) -> u64 {
        let desk = self.inner.lock().await;
        desk.intake.custody_balance(&desk.transfer)
    }

    pub async fn poll_events(&self) -> Vec<FundEvent> {
        self.inner.lock().await.intake.poll_events()
    }

    pub async fn snapshot(&self) -> FundState {
        self.inner.lock().await.intake.export_state()
    }
}
