use crate::core::intake::IntakeEndpoint;
use crate::core::monitor::MonitorScheduler;
use crate::core::queue::RequestQueue;
use crate::core::settlement::{SettlementScheduler, SettlementSettings};
use crate::core::ticker::IntervalTicker;
use crate::domain::ports::{IssuanceClient, MonitorSink};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub amount_per_request: u64,
    pub settlement_interval: Duration,
    pub monitor_interval: Duration,
    pub monitor_enabled: bool,
    pub settlement: SettlementSettings,
}

/// 把佇列、入口與兩個排程器組在一起
pub struct FaucetEngine<I: IssuanceClient + ?Sized + 'static, S: MonitorSink + 'static> {
    queue: RequestQueue,
    intake: Arc<IntakeEndpoint>,
    settlement: Arc<SettlementScheduler<I>>,
    monitor: Arc<MonitorScheduler<S>>,
    settings: EngineSettings,
}

impl<I: IssuanceClient + ?Sized + 'static, S: MonitorSink + 'static> FaucetEngine<I, S> {
    pub fn new(settings: EngineSettings, issuer: Arc<I>, sink: Arc<S>) -> Self {
        let queue = RequestQueue::new(settings.amount_per_request);
        let intake = Arc::new(IntakeEndpoint::new(queue.clone()));
        let settlement = Arc::new(SettlementScheduler::new(
            queue.clone(),
            issuer,
            settings.settlement.clone(),
        ));
        let monitor = Arc::new(MonitorScheduler::new(queue.clone(), sink));

        Self {
            queue,
            intake,
            settlement,
            monitor,
            settings,
        }
    }

    pub fn queue(&self) -> &RequestQueue {
        &self.queue
    }

    pub fn intake(&self) -> Arc<IntakeEndpoint> {
        self.intake.clone()
    }

    pub fn settlement(&self) -> Arc<SettlementScheduler<I>> {
        self.settlement.clone()
    }

    /// Starts the settlement loop and, if enabled, the monitor loop. Both
    /// stop once `shutdown` flips to `true`.
    pub fn spawn(&self, shutdown: watch::Receiver<bool>) -> EngineHandle {
        let mut tasks = Vec::new();

        tracing::info!(
            "🚀 Settlement every {:?}, monitor every {:?} (monitor enabled: {})",
            self.settings.settlement_interval,
            self.settings.monitor_interval,
            self.settings.monitor_enabled
        );

        if self.settings.monitor_enabled {
            let monitor = self.monitor.clone();
            let ticker = IntervalTicker::new(self.settings.monitor_interval, shutdown.clone());
            tasks.push(("monitor", tokio::spawn(async move { monitor.run(ticker).await })));
        }

        let settlement = self.settlement.clone();
        let ticker = IntervalTicker::new(self.settings.settlement_interval, shutdown);
        tasks.push((
            "settlement",
            tokio::spawn(async move { settlement.run(ticker).await }),
        ));

        EngineHandle { tasks }
    }
}

pub struct EngineHandle {
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl EngineHandle {
    pub async fn join(self) {
        for (name, task) in self.tasks {
            if let Err(e) = task.await {
                tracing::error!("❌ {} task ended abnormally: {}", name, e);
            }
        }
    }
}

/// 等待停止訊號後通知所有排程器。訊號裝不上時只記錄錯誤，回傳 `false` 且不送出停止。
pub async fn forward_shutdown_signal<F>(signal: F, shutdown: &watch::Sender<bool>) -> bool
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::error!("❌ Failed to listen for shutdown signal: {}", e);
        return false;
    }

    tracing::info!("🛑 Shutdown signal received");
    let _ = shutdown.send(true);
    true
}
