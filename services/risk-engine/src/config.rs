//! Risk engine configuration
//!
//! Immutable after startup. Tiers map a name to a `RiskLimits` set; accounts
//! are registered against a tier.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use types::risk::{RiskLimits, VarConfidence};
use types::time::NANOS_PER_SECOND;

pub const DEFAULT_TIER: &str = "standard";

/// How a halted breaker returns to `Normal`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetPolicy {
    /// Reset signal plus an elapsed cool-down, in either order
    #[default]
    ManualAfterCooldown,
    /// Reset signal alone
    ManualOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    pub cooldown_secs: u64,
    /// Rejections in a row that halt trading
    pub max_consecutive_rejections: u32,
    pub rejection_window_secs: u64,
    pub reset_policy: ResetPolicy,
}

impl BreakerConfig {
    pub fn cooldown_nanos(&self) -> i64 {
        secs_to_nanos(self.cooldown_secs)
    }

    pub fn rejection_window_nanos(&self) -> i64 {
        secs_to_nanos(self.rejection_window_secs)
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 300,
            max_consecutive_rejections: 50,
            rejection_window_secs: 60,
            reset_policy: ResetPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VarConfig {
    /// Mark prices kept per symbol
    pub window: usize,
    pub confidence: VarConfidence,
}

impl Default for VarConfig {
    fn default() -> Self {
        Self {
            window: 100,
            confidence: VarConfidence::P95,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub tiers: HashMap<String, RiskLimits>,
    pub breaker: BreakerConfig,
    pub var: VarConfig,
}

impl RiskConfig {
    pub fn limits_for(&self, tier: &str) -> Option<&RiskLimits> {
        self.tiers.get(tier)
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            tiers: HashMap::from([(DEFAULT_TIER.to_string(), RiskLimits::default())]),
            breaker: BreakerConfig::default(),
            var: VarConfig::default(),
        }
    }
}

fn secs_to_nanos(secs: u64) -> i64 {
    i64::try_from(secs)
        .unwrap_or(i64::MAX)
        .saturating_mul(NANOS_PER_SECOND)
}
