use crate::core::aggregator::aggregate;
use crate::core::queue::RequestQueue;
use crate::domain::model::{PendingEntry, PendingReport};
use crate::domain::ports::{MonitorSink, Ticker};
use chrono::Utc;
use std::sync::Arc;

/// Periodically reports what is waiting in the queue. Only ever takes a
/// snapshot, so it can run alongside a settlement cycle.
pub struct MonitorScheduler<S: MonitorSink> {
    queue: RequestQueue,
    sink: Arc<S>,
}

impl<S: MonitorSink> MonitorScheduler<S> {
    pub fn new(queue: RequestQueue, sink: Arc<S>) -> Self {
        Self { queue, sink }
    }

    pub fn pending_report(&self) -> PendingReport {
        pending_report(&self.queue)
    }

    pub fn report_once(&self) -> PendingReport {
        let report = self.pending_report();
        self.sink.report(&report);
        report
    }

    pub async fn run<T: Ticker>(&self, mut ticker: T) {
        tracing::info!("🔍 Queue monitor started");
        while ticker.tick().await {
            self.report_once();
        }
        tracing::info!("Queue monitor stopped");
    }
}

/// 從佇列快照算出每個地址的待處理筆數
pub fn pending_report(queue: &RequestQueue) -> PendingReport {
    let snapshot = queue.snapshot();
    let batch = aggregate(&snapshot);

    PendingReport {
        taken_at: Utc::now(),
        total_requests: snapshot.len(),
        entries: batch
            .into_iter()
            .map(|entry| PendingEntry {
                address: entry.address,
                requests: entry.request_count,
                amount: entry.amount,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Address;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CollectingSink {
        reports: Mutex<Vec<PendingReport>>,
    }

    impl MonitorSink for CollectingSink {
        fn report(&self, report: &PendingReport) {
            self.reports.lock().unwrap().push(report.clone());
        }
    }

    fn addr(byte: u8) -> Address {
        Address::parse(&format!("0x{:040x}", byte)).unwrap()
    }

    #[test]
    fn test_report_counts_without_mutating_queue() {
        let queue = RequestQueue::new(1);
        for _ in 0..3 {
            queue.enqueue(addr(1));
        }
        queue.enqueue(addr(2));

        let sink = Arc::new(CollectingSink::default());
        let monitor = MonitorScheduler::new(queue.clone(), sink.clone());
        let report = monitor.report_once();

        assert_eq!(report.total_requests, 4);
        assert_eq!(report.requests_for(&addr(1)), 3);
        assert_eq!(report.requests_for(&addr(2)), 1);
        assert_eq!(queue.len(), 4);
        assert_eq!(sink.reports.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_report_on_empty_queue() {
        let report = pending_report(&RequestQueue::new(1));
        assert_eq!(report.total_requests, 0);
        assert!(report.entries.is_empty());
    }

    #[tokio::test]
    async fn test_run_reports_once_per_tick() {
        let queue = RequestQueue::new(1);
        queue.enqueue(addr(7));
        let sink = Arc::new(CollectingSink::default());
        let monitor = MonitorScheduler::new(queue.clone(), sink.clone());

        let (tick, ticker) = crate::core::ticker::ManualTicker::channel();
        tick.send(()).unwrap();
        tick.send(()).unwrap();
        drop(tick);
        monitor.run(ticker).await;

        let reports = sink.reports.lock().unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.requests_for(&addr(7)) == 1));
        assert_eq!(queue.len(), 1);
    }
}
