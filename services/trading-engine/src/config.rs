//! Engine configuration
//!
//! Loaded once at startup from TOML and never mutated afterwards. Every
//! section has defaults, so an empty file is a valid configuration.
//! Decimal values are written as strings (`maker_rate = "0.0002"`).

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use matching_engine::MatchingConfig;
use risk_engine::RiskConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use settlement::{RateTable, RetryPolicy};
use thiserror::Error;
use types::fee::FeeSchedule;
use types::ids::{AccountId, MarketId};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Soft latency budgets per pipeline stage, in microseconds
///
/// Exceeding one is counted in metrics; the operation still completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatencyBudgets {
    pub validation_us: u64,
    pub risk_us: u64,
    pub matching_us: u64,
    pub end_to_end_us: u64,
}

impl Default for LatencyBudgets {
    fn default() -> Self {
        Self {
            validation_us: 20,
            risk_us: 50,
            matching_us: 200,
            end_to_end_us: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingSettings {
    /// Bounded inbound queue per symbol worker
    pub queue_capacity: usize,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self { queue_capacity: 4096 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusSettings {
    pub subscriber_capacity: usize,
}

impl Default for BusSettings {
    fn default() -> Self {
        Self {
            subscriber_capacity: event_bus::DEFAULT_SUBSCRIBER_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementSettings {
    pub workers: usize,
    pub retry: RetryPolicy,
    pub reporting_currency: String,
    /// Units of reporting currency per unit of each quote currency
    pub rates: HashMap<String, Decimal>,
}

impl SettlementSettings {
    pub fn rate_table(&self) -> RateTable {
        self.rates
            .iter()
            .fold(RateTable::new(self.reporting_currency.clone()), |table, (currency, rate)| {
                table.with_rate(currency.clone(), *rate)
            })
    }
}

impl Default for SettlementSettings {
    fn default() -> Self {
        let rates = RateTable::default();
        Self {
            workers: 4,
            retry: RetryPolicy::default(),
            reporting_currency: rates.reporting_currency,
            rates: rates.rates,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositorySettings {
    /// Pending writes before new ones are dropped
    pub queue_capacity: usize,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self { queue_capacity: 8192 }
    }
}

/// Account registered at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSettings {
    pub account_id: AccountId,
    #[serde(default = "default_tier")]
    pub tier: String,
    pub collateral: Decimal,
}

fn default_tier() -> String {
    risk_engine::DEFAULT_TIER.to_string()
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tradable symbols, fixed for the engine's lifetime
    pub symbols: Vec<String>,
    /// Period of the GTD sweep, VaR recompute and breaker poll
    pub maintenance_interval_ms: u64,
    pub matching: MatchingSettings,
    pub latency: LatencyBudgets,
    pub risk: RiskConfig,
    pub fees: FeeSchedule,
    pub settlement: SettlementSettings,
    pub bus: BusSettings,
    pub repository: RepositorySettings,
    pub accounts: Vec<AccountSettings>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            symbols: vec!["BTC/USDT".to_string(), "ETH/USDC".to_string()],
            maintenance_interval_ms: 1_000,
            matching: MatchingSettings::default(),
            latency: LatencyBudgets::default(),
            risk: RiskConfig::default(),
            fees: FeeSchedule::default(),
            settlement: SettlementSettings::default(),
            bus: BusSettings::default(),
            repository: RepositorySettings::default(),
            accounts: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse a TOML file; does not validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbols.is_empty() {
            return invalid("at least one symbol is required");
        }
        let mut seen = HashSet::new();
        for symbol in &self.symbols {
            if MarketId::try_new(symbol.clone()).is_none() {
                return invalid(format!("symbol {symbol:?} is not BASE/QUOTE"));
            }
            if !seen.insert(symbol) {
                return invalid(format!("symbol {symbol} listed twice"));
            }
        }

        if self.maintenance_interval_ms == 0 {
            return invalid("maintenance_interval_ms must be positive");
        }
        if self.matching.queue_capacity == 0 || self.bus.subscriber_capacity == 0 || self.repository.queue_capacity == 0 {
            return invalid("queue capacities must be positive");
        }

        if self.risk.tiers.is_empty() {
            return invalid("at least one risk tier is required");
        }
        for (tier, limits) in &self.risk.tiers {
            let non_negative = [
                limits.max_position_size,
                limits.max_order_size,
                limits.max_daily_loss,
                limits.var_threshold,
                limits.margin_requirement,
                limits.worst_case_move,
            ]
            .iter()
            .all(|value| !value.is_sign_negative());
            if !non_negative {
                return invalid(format!("risk tier {tier} has a negative limit"));
            }
        }
        if self.risk.breaker.max_consecutive_rejections == 0 {
            return invalid("breaker.max_consecutive_rejections must be positive");
        }

        let retry = &self.settlement.retry;
        if retry.max_attempts == 0 {
            return invalid("settlement.retry.max_attempts must be at least 1");
        }
        if retry.base_backoff_ms > retry.max_backoff_ms {
            return invalid("settlement.retry.base_backoff_ms exceeds max_backoff_ms");
        }
        if self.settlement.workers == 0 {
            return invalid("settlement needs at least one worker");
        }
        if let Some((currency, _)) = self.settlement.rates.iter().find(|(_, rate)| rate.is_sign_negative() || rate.is_zero()) {
            return invalid(format!("conversion rate for {currency} must be positive"));
        }
        if self.fees.taker_rate.is_sign_negative() {
            return invalid("taker fee rate cannot be negative");
        }

        for account in &self.accounts {
            if self.risk.limits_for(&account.tier).is_none() {
                return invalid(format!("account {} uses unknown tier {}", account.account_id, account.tier));
            }
        }
        Ok(())
    }

    /// Parsed symbol list; call after `validate`
    pub fn markets(&self) -> Vec<MarketId> {
        self.symbols.iter().filter_map(|s| MarketId::try_new(s.clone())).collect()
    }

    pub fn matching_config(&self) -> MatchingConfig {
        MatchingConfig {
            queue_capacity: self.matching.queue_capacity,
            ..MatchingConfig::default()
        }
    }

    pub fn maintenance_interval(&self) -> Duration {
        Duration::from_millis(self.maintenance_interval_ms)
    }
}

fn invalid<T>(message: impl Into<String>) -> Result<T, ConfigError> {
    Err(ConfigError::Invalid(message.into()))
}
