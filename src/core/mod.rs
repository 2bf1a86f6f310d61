pub mod aggregator;
pub mod engine;
pub mod intake;
pub mod monitor;
pub mod queue;
pub mod settlement;
pub mod ticker;

pub use crate::domain::model::{
    Address, CycleOutcome, CycleReport, DripReceipt, DripRequest, PendingReport, SettlementBatch,
    TransactionId,
};
pub use crate::domain::ports::{IssuanceClient, MonitorSink, Ticker};
pub use crate::utils::error::Result;
