//! Risk management types
//!
//! Limits are read-only at match time; only the administrative
//! collaborator replaces them.

use crate::ids::AccountId;
use crate::order::RejectReason;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-account risk limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskLimits {
    /// Maximum absolute net quantity per symbol
    pub max_position_size: Decimal,
    /// Maximum quantity of a single order
    pub max_order_size: Decimal,
    /// Maximum loss per UTC day, in reporting currency
    pub max_daily_loss: Decimal,
    /// Account VaR above which the circuit breaker trips
    pub var_threshold: Decimal,
    /// Initial margin as a fraction of notional (0.1 = 10x)
    pub margin_requirement: Decimal,
    /// Fractional adverse move assumed for a new order's projected loss
    pub worst_case_move: Decimal,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_position_size: Decimal::from(1_000),
            max_order_size: Decimal::from(500),
            max_daily_loss: Decimal::from(100_000),
            var_threshold: Decimal::from(250_000),
            margin_requirement: Decimal::new(1, 1),
            worst_case_move: Decimal::new(5, 2),
        }
    }
}

/// Pre-trade validation outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskDecision {
    Pass,
    Reject(RejectReason),
}

impl RiskDecision {
    pub fn is_pass(&self) -> bool {
        matches!(self, RiskDecision::Pass)
    }
}

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakerState {
    Normal,
    Halted,
}

/// Why the breaker tripped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TripReason {
    DailyLossLimit { account_id: AccountId, loss: Decimal, limit: Decimal },
    VarThreshold { account_id: AccountId, var: Decimal, threshold: Decimal },
    ConsecutiveRejections { count: u32 },
    SystemFault { message: String },
}

impl TripReason {
    pub fn code(&self) -> &'static str {
        match self {
            TripReason::DailyLossLimit { .. } => "daily_loss_limit",
            TripReason::VarThreshold { .. } => "var_threshold",
            TripReason::ConsecutiveRejections { .. } => "consecutive_rejections",
            TripReason::SystemFault { .. } => "system_fault",
        }
    }
}

/// Confidence level for parametric VaR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VarConfidence {
    #[serde(rename = "95")]
    P95,
    #[serde(rename = "99")]
    P99,
}

impl VarConfidence {
    /// One-tailed standard normal quantile
    pub fn z_score(&self) -> f64 {
        match self {
            VarConfidence::P95 => 1.645,
            VarConfidence::P99 => 2.326,
        }
    }
}
