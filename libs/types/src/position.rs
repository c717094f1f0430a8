//! Position tracking types
//!
//! Signed net quantity with a weighted-average entry price. Only the risk
//! engine mutates positions, in response to trades.

use crate::ids::{AccountId, MarketId};
use crate::numeric::{Price, Quantity};
use crate::order::Side;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Position structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub account_id: AccountId,
    pub symbol: MarketId,
    /// Positive = long, negative = short
    pub net_quantity: Decimal,
    /// Zero while flat
    pub average_entry_price: Decimal,
    pub mark_price: Option<Price>,
    pub realized_pnl: Decimal,
    pub unrealized_pnl: Decimal,
    pub updated_at: i64,
    pub version: u64,
}

impl Position {
    /// Create a flat position
    pub fn new(account_id: AccountId, symbol: MarketId, timestamp: i64) -> Self {
        Self {
            account_id,
            symbol,
            net_quantity: Decimal::ZERO,
            average_entry_price: Decimal::ZERO,
            mark_price: None,
            realized_pnl: Decimal::ZERO,
            unrealized_pnl: Decimal::ZERO,
            updated_at: timestamp,
            version: 0,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.net_quantity.is_zero()
    }

    /// Apply a fill and return the PnL it realized
    ///
    /// Increasing the position recomputes the weighted-average entry.
    /// Reducing realizes `closed × (fill − entry) × direction`; on a
    /// reversal the residual opens at the fill price.
    pub fn apply_fill(&mut self, side: Side, quantity: Quantity, price: Price, timestamp: i64) -> Decimal {
        let qty = quantity.as_decimal();
        let px = price.as_decimal();
        let signed = qty * side.sign();
        let current = self.net_quantity;
        let mut realized = Decimal::ZERO;

        if current.is_zero() || current.is_sign_positive() == signed.is_sign_positive() {
            let held = current.abs();
            self.average_entry_price = (held * self.average_entry_price + qty * px) / (held + qty);
            self.net_quantity = current + signed;
        } else {
            let closed = qty.min(current.abs());
            let direction = if current.is_sign_positive() {
                Decimal::ONE
            } else {
                Decimal::NEGATIVE_ONE
            };
            realized = closed * (px - self.average_entry_price) * direction;
            self.net_quantity = current + signed;

            if self.net_quantity.is_zero() {
                self.average_entry_price = Decimal::ZERO;
            } else if self.net_quantity.is_sign_positive() != current.is_sign_positive() {
                self.average_entry_price = px;
            }
        }

        self.realized_pnl += realized;
        self.mark_to_market(price, timestamp);
        realized
    }

    /// Update mark price and recalculate unrealized PnL
    pub fn mark_to_market(&mut self, mark_price: Price, timestamp: i64) {
        self.mark_price = Some(mark_price);
        self.unrealized_pnl = if self.is_flat() {
            Decimal::ZERO
        } else {
            (mark_price.as_decimal() - self.average_entry_price) * self.net_quantity
        };
        self.updated_at = timestamp;
        self.version += 1;
    }

    /// Absolute notional at the mark (or entry when unmarked)
    pub fn exposure(&self) -> Decimal {
        let reference = self
            .mark_price
            .map(|p| p.as_decimal())
            .unwrap_or(self.average_entry_price);
        self.net_quantity.abs() * reference
    }
}
