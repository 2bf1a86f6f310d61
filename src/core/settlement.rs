use crate::core::aggregator::aggregate;
use crate::core::queue::RequestQueue;
use crate::domain::model::{AddressOutcome, BatchEntry, CycleOutcome, CycleReport, TransactionId};
use crate::domain::ports::{IssuanceClient, Ticker};
use crate::utils::error::{FaucetError, Result};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// 一個地址轉帳失敗之後，本輪其餘地址怎麼處理
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop at the first failure. The failed amount and every address not
    /// yet processed are dropped for good; nothing is retried or re-queued.
    #[default]
    AbortRemaining,
    /// Keep going; each address succeeds or fails on its own.
    Continue,
    /// Stop at the first failure and put the failed and unprocessed
    /// totals back into the queue for the next cycle.
    Requeue,
}

#[derive(Debug, Clone)]
pub struct SettlementSettings {
    pub failure_policy: FailurePolicy,
    pub issue_timeout: Option<Duration>,
    pub settle_on_shutdown: bool,
}

impl Default for SettlementSettings {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::AbortRemaining,
            issue_timeout: Some(Duration::from_secs(30)),
            settle_on_shutdown: true,
        }
    }
}

/// Drains the queue each cycle and issues one transfer per distinct address,
/// one call at a time.
pub struct SettlementScheduler<I: IssuanceClient + ?Sized> {
    queue: RequestQueue,
    issuer: Arc<I>,
    settings: SettlementSettings,
    run_lock: Mutex<()>,
    cycles: AtomicU64,
}

impl<I: IssuanceClient + ?Sized> SettlementScheduler<I> {
    pub fn new(queue: RequestQueue, issuer: Arc<I>, settings: SettlementSettings) -> Self {
        Self {
            queue,
            issuer,
            settings,
            run_lock: Mutex::new(()),
            cycles: AtomicU64::new(0),
        }
    }

    pub fn settings(&self) -> &SettlementSettings {
        &self.settings
    }

    /// 已經 drain 過的輪數 (空佇列與忙碌的輪次不算)
    pub fn cycles_completed(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    /// Runs one settlement cycle.
    ///
    /// The queue is drained before the first transfer is attempted, so new
    /// requests arriving while transfers are in flight wait for the next
    /// cycle. A cycle started while another is still issuing returns
    /// [`CycleOutcome::Busy`] without touching the queue.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let Ok(_running) = self.run_lock.try_lock() else {
            tracing::warn!("⏳ Previous settlement cycle still in flight, skipping this tick");
            return CycleOutcome::Busy;
        };

        if self.queue.is_empty() {
            tracing::debug!("Queue empty, nothing to settle");
            return CycleOutcome::Idle;
        }

        let requests = self.queue.drain();
        if requests.is_empty() {
            return CycleOutcome::Idle;
        }

        let batch = aggregate(&requests);
        let cycle = self.cycles.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(
            "📦 Processing batch #{} for {} unique addresses ({} requests)...",
            cycle,
            batch.len(),
            requests.len()
        );

        let mut report = CycleReport::new(cycle, requests.len());
        let mut entries = batch.into_iter();

        while let Some(entry) = entries.next() {
            let error = match self.issue(&entry).await {
                Ok(transaction) => {
                    tracing::info!(
                        "✅ Sent {} tokens to {}: Transaction Hash: {}",
                        entry.amount,
                        entry.address,
                        transaction
                    );
                    report.record(&entry, AddressOutcome::Settled { transaction });
                    continue;
                }
                Err(e) => e,
            };

            tracing::error!(
                "❌ Transfer of {} tokens to {} failed: {} (transient: {})",
                entry.amount,
                entry.address,
                error,
                error.is_transient()
            );

            match self.settings.failure_policy {
                FailurePolicy::AbortRemaining => {
                    report.record(
                        &entry,
                        AddressOutcome::Failed {
                            reason: error.to_string(),
                        },
                    );
                    for skipped in entries.by_ref() {
                        tracing::warn!(
                            "🚫 Abandoned {} tokens owed to {} in batch #{}",
                            skipped.amount,
                            skipped.address,
                            cycle
                        );
                        report.record(&skipped, AddressOutcome::Abandoned);
                    }
                    break;
                }
                FailurePolicy::Continue => {
                    report.record(
                        &entry,
                        AddressOutcome::Failed {
                            reason: error.to_string(),
                        },
                    );
                }
                FailurePolicy::Requeue => {
                    for pending in std::iter::once(entry).chain(entries.by_ref()) {
                        self.queue
                            .enqueue_amount(pending.address.clone(), pending.amount);
                        tracing::warn!(
                            "↩️  Re-queued {} tokens owed to {}",
                            pending.amount,
                            pending.address
                        );
                        report.record(&pending, AddressOutcome::Requeued);
                    }
                    break;
                }
            }
        }

        let lost = report.lost_amount();
        if lost > 0 {
            tracing::warn!(
                "⚠️  Batch #{} finished with {} tokens unsettled and not retried",
                cycle,
                lost
            );
        } else {
            tracing::info!(
                "🏁 Batch #{} finished: {} tokens settled",
                cycle,
                report.settled_amount()
            );
        }

        CycleOutcome::Completed(report)
    }

    async fn issue(&self, entry: &BatchEntry) -> Result<TransactionId> {
        let call = self.issuer.issue(&entry.address, entry.amount);
        match self.settings.issue_timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                FaucetError::IssuanceTimeout {
                    address: entry.address.to_string(),
                    timeout: limit,
                }
            })?,
            None => call.await,
        }
    }

    /// 每個 tick 跑一輪。下一個 tick 要等這一輪結束才會開始等待。
    pub async fn run<T: Ticker>(&self, mut ticker: T) {
        tracing::info!(
            "⏰ Settlement scheduler started (policy: {:?})",
            self.settings.failure_policy
        );

        while ticker.tick().await {
            self.run_cycle().await;
        }

        if self.settings.settle_on_shutdown && !self.queue.is_empty() {
            tracing::info!("🧹 Flushing {} queued requests before shutdown", self.queue.len());
            self.run_cycle().await;
        }

        tracing::info!("Settlement scheduler stopped");
    }
}
