// Adapters layer: concrete implementations for external systems (http intake, issuance, monitor output).

pub mod dry_run;
pub mod http;
pub mod monitor_sink;
pub mod relayer;

pub use dry_run::DryRunIssuanceClient;
pub use monitor_sink::TracingMonitorSink;
pub use relayer::RelayerIssuanceClient;
