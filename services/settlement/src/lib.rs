//! Settlement processor for the unified trading engine
//!
//! Consumes executed trades off the hot path and books them downstream:
//! - one settlement record per trade id, created idempotently
//! - maker/taker fees and conversion into the reporting currency
//! - exponential-backoff retry of transient gateway failures
//! - a fixed worker pool fed by a non-blocking trade queue

pub mod conversion;
pub mod error;
pub mod fees;
pub mod gateway;
pub mod processor;
pub mod retry;
pub mod store;
pub mod worker;

pub use conversion::RateTable;
pub use error::SettlementError;
pub use fees::{compute_amounts, SettlementAmounts};
pub use gateway::{LoopbackGateway, SettlementGateway};
pub use processor::{SettlementProcessor, SettlementResult, SettlementStats};
pub use retry::RetryPolicy;
pub use store::SettlementStore;
pub use worker::{NoopSink, SettlementIntake, SettlementPool, SettlementQueue, SettlementSink};
