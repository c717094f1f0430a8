//! Risk Engine Service
//!
//! Pre-trade validation against per-account limits, post-trade position
//! keeping, parametric VaR and an engine-wide circuit breaker.
//!
//! Pre-trade checks run in order (order size, resulting position, projected
//! daily loss, margin) and the first failure decides the rejection reason.
//! While the breaker is halted every new order is rejected with
//! `circuit_open`; cancels are unaffected.

pub mod account;
pub mod circuit_breaker;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod exposure;
pub mod margin;
pub mod validator;
pub mod var;

pub use account::{AccountRisk, Reservation};
pub use circuit_breaker::{CircuitBreaker, ResetOutcome};
pub use config::{BreakerConfig, ResetPolicy, RiskConfig, VarConfig, DEFAULT_TIER};
pub use engine::RiskEngine;
pub use error::RiskError;
pub use events::{RiskEvent, RiskEventType};
