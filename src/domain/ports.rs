use crate::domain::model::{Address, PendingReport, TransactionId};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 對單一地址做一次代幣轉帳
#[async_trait]
pub trait IssuanceClient: Send + Sync {
    async fn issue(&self, address: &Address, amount: u64) -> Result<TransactionId>;
}

/// Drives a periodic task. Returning `false` stops the task.
#[async_trait]
pub trait Ticker: Send {
    async fn tick(&mut self) -> bool;
}

pub trait MonitorSink: Send + Sync {
    fn report(&self, report: &PendingReport);
}
