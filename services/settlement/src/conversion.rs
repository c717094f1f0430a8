//! Currency conversion
//!
//! Quote currencies are converted to the reporting currency with a fixed
//! rate table loaded at startup.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::SettlementError;

/// Rates into the reporting currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    pub reporting_currency: String,
    /// Units of reporting currency per unit of the keyed currency
    #[serde(default)]
    pub rates: HashMap<String, Decimal>,
}

impl RateTable {
    pub fn new(reporting_currency: impl Into<String>) -> Self {
        Self {
            reporting_currency: reporting_currency.into(),
            rates: HashMap::new(),
        }
    }

    pub fn with_rate(mut self, currency: impl Into<String>, rate: Decimal) -> Self {
        self.rates.insert(currency.into(), rate);
        self
    }

    /// Rate from `currency` into the reporting currency
    pub fn rate(&self, currency: &str) -> Result<Decimal, SettlementError> {
        if currency == self.reporting_currency {
            return Ok(Decimal::ONE);
        }
        self.rates
            .get(currency)
            .copied()
            .filter(|rate| rate.is_sign_positive() && !rate.is_zero())
            .ok_or_else(|| SettlementError::MissingRate {
                from: currency.to_string(),
                to: self.reporting_currency.clone(),
            })
    }

    pub fn convert(&self, amount: Decimal, currency: &str) -> Result<Decimal, SettlementError> {
        Ok(amount * self.rate(currency)?)
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self::new("USD")
            .with_rate("USDT", Decimal::ONE)
            .with_rate("USDC", Decimal::ONE)
    }
}
