//! Settlement record types
//!
//! At most one record exists per trade id. Only `status`, `retry_count`,
//! `last_error` and `confirmed_at` change after creation.

use crate::ids::{MarketId, TradeId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Settlement status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementStatus {
    Pending,
    Retrying,
    Confirmed,
    Failed,
}

impl SettlementStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SettlementStatus::Confirmed | SettlementStatus::Failed)
    }
}

/// Settlement record for one trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub trade_id: TradeId,
    pub symbol: MarketId,
    pub status: SettlementStatus,
    /// Reporting currency all amounts below are expressed in
    pub currency: String,
    /// Trade value converted to the reporting currency
    pub notional: Decimal,
    pub maker_fee: Decimal,
    pub taker_fee: Decimal,
    /// Quote → reporting currency rate applied
    pub conversion_rate: Decimal,
    pub retry_count: u32,
    pub last_error: Option<String>,
    pub created_at: i64,
    pub confirmed_at: Option<i64>,
}

impl SettlementRecord {
    /// Fresh pending record; amounts are filled in once computed
    pub fn pending(trade_id: TradeId, symbol: MarketId, currency: impl Into<String>, created_at: i64) -> Self {
        Self {
            trade_id,
            symbol,
            status: SettlementStatus::Pending,
            currency: currency.into(),
            notional: Decimal::ZERO,
            maker_fee: Decimal::ZERO,
            taker_fee: Decimal::ZERO,
            conversion_rate: Decimal::ONE,
            retry_count: 0,
            last_error: None,
            created_at,
            confirmed_at: None,
        }
    }

    pub fn total_fees(&self) -> Decimal {
        self.maker_fee + self.taker_fee
    }
}
