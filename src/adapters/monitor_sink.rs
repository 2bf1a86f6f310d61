use crate::domain::model::PendingReport;
use crate::domain::ports::MonitorSink;

/// Writes the pending-queue report to the log.
#[derive(Debug, Default, Clone)]
pub struct TracingMonitorSink;

impl MonitorSink for TracingMonitorSink {
    fn report(&self, report: &PendingReport) {
        if report.total_requests == 0 {
            tracing::debug!("Queued Token Drip Requests (0 total)");
            return;
        }

        tracing::info!(
            "📋 Queued Token Drip Requests ({} total, {} addresses)",
            report.total_requests,
            report.entries.len()
        );
        for (index, entry) in report.entries.iter().enumerate() {
            tracing::info!(
                "   {}. {}: {} requests ({} tokens)",
                index + 1,
                entry.address,
                entry.requests,
                entry.amount
            );
        }
    }
}
