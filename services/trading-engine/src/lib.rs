//! Unified Trading Engine
//!
//! Orchestrates the order path end to end:
//!
//! ```text
//! OrderRequest → validation → pre-trade risk → symbol worker (matching)
//!   → post-trade risk → event bus (TradeExecuted) → settlement pool
//!   → event bus (SettlementConfirmed / SettlementFailed)
//! ```
//!
//! Orders, trades and settlement records are persisted through a
//! fire-and-forget repository queue. A periodic maintenance pass sweeps
//! expired GTD orders, recomputes VaR and applies pending breaker resets.

pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod repository;

pub use config::{ConfigError, EngineConfig, LatencyBudgets};
pub use engine::TradingEngine;
pub use error::EngineError;
pub use metrics::{EngineMetrics, LatencySummary, MetricsSnapshot, Stage};
pub use repository::{InMemoryRepository, Repository, RepositoryError, RepositoryHandle, RepositoryWriter};
