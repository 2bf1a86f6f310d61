pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;
pub use config::FaucetConfig;

pub use adapters::{DryRunIssuanceClient, RelayerIssuanceClient, TracingMonitorSink};
pub use crate::core::{
    engine::FaucetEngine, intake::IntakeEndpoint, monitor::MonitorScheduler, queue::RequestQueue,
    settlement::FailurePolicy, settlement::SettlementScheduler,
};
pub use utils::error::{FaucetError, Result};
