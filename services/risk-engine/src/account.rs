//! Per-account risk state
//!
//! Positions, collateral, the day's realized PnL and the unfilled quantity
//! of orders that already passed validation. The engine keeps one of these
//! per account in a sharded map, so every mutation of an account is
//! serialized.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::ids::{AccountId, MarketId, OrderId};
use types::numeric::{Price, Quantity};
use types::order::{Order, Side};
use types::position::Position;
use types::risk::RiskLimits;
use types::time::day_index;

use crate::exposure;

/// Quantity an accepted order may still add to a position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub symbol: MarketId,
    pub side: Side,
    pub quantity: Quantity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRisk {
    pub account_id: AccountId,
    pub tier: String,
    pub limits: RiskLimits,
    pub collateral: Decimal,
    positions: HashMap<MarketId, Position>,
    /// UTC day the daily counters belong to
    day: i64,
    realized_today: Decimal,
    #[serde(default)]
    open_orders: HashMap<OrderId, Reservation>,
}

impl AccountRisk {
    pub fn new(account_id: AccountId, tier: impl Into<String>, limits: RiskLimits, collateral: Decimal, timestamp: i64) -> Self {
        Self {
            account_id,
            tier: tier.into(),
            limits,
            collateral,
            positions: HashMap::new(),
            day: day_index(timestamp),
            realized_today: Decimal::ZERO,
            open_orders: HashMap::new(),
        }
    }

    pub fn position(&self, symbol: &MarketId) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    /// Signed net quantity held in `symbol`
    pub fn net_quantity(&self, symbol: &MarketId) -> Decimal {
        self.positions
            .get(symbol)
            .map(|p| p.net_quantity)
            .unwrap_or(Decimal::ZERO)
    }

    /// Unfilled quantity reserved by open orders on one side of `symbol`
    pub fn reserved_quantity(&self, symbol: &MarketId, side: Side) -> Quantity {
        self.open_orders
            .values()
            .filter(|r| r.side == side && &r.symbol == symbol)
            .map(|r| r.quantity)
            .sum()
    }

    pub fn open_order_count(&self) -> usize {
        self.open_orders.len()
    }

    /// Hold the order's remaining quantity until it fills or ends
    pub fn reserve(&mut self, order: &Order) {
        if order.remaining_quantity.is_zero() {
            return;
        }
        self.open_orders.insert(
            order.order_id,
            Reservation {
                symbol: order.symbol.clone(),
                side: order.side,
                quantity: order.remaining_quantity,
            },
        );
    }

    /// Drop whatever the order still holds
    pub fn release(&mut self, order_id: &OrderId) -> Option<Reservation> {
        self.open_orders.remove(order_id)
    }

    /// Realized PnL for the UTC day containing `now`
    pub fn realized_today(&self, now: i64) -> Decimal {
        if day_index(now) == self.day {
            self.realized_today
        } else {
            Decimal::ZERO
        }
    }

    pub fn realized_pnl(&self) -> Decimal {
        self.positions.values().map(|p| p.realized_pnl).sum()
    }

    pub fn unrealized_pnl(&self) -> Decimal {
        exposure::total_unrealized_pnl(self.positions.values())
    }

    /// Absolute notional across all positions
    pub fn exposure(&self) -> Decimal {
        exposure::total_exposure(self.positions.values())
    }

    /// Collateral plus realized and unrealized PnL
    pub fn equity(&self) -> Decimal {
        self.collateral + self.realized_pnl() + self.unrealized_pnl()
    }

    /// Loss counted against the daily limit at `now`
    pub fn daily_loss(&self, now: i64) -> Decimal {
        exposure::daily_loss(self.realized_today(now), self.unrealized_pnl())
    }

    /// Apply one side of a trade and return the PnL it realized
    pub fn apply_fill(&mut self, symbol: &MarketId, side: Side, quantity: Quantity, price: Price, timestamp: i64) -> Decimal {
        self.roll_day(timestamp);
        let account_id = self.account_id;
        let realized = self
            .positions
            .entry(symbol.clone())
            .or_insert_with(|| Position::new(account_id, symbol.clone(), timestamp))
            .apply_fill(side, quantity, price, timestamp);
        self.realized_today += realized;
        realized
    }

    /// Apply one side of a trade for `order_id`, moving the filled quantity
    /// out of its reservation
    pub fn apply_order_fill(
        &mut self,
        order_id: &OrderId,
        symbol: &MarketId,
        side: Side,
        quantity: Quantity,
        price: Price,
        timestamp: i64,
    ) -> Decimal {
        if let Some(reservation) = self.open_orders.get_mut(order_id) {
            reservation.quantity = reservation.quantity.saturating_sub(quantity);
            if reservation.quantity.is_zero() {
                self.open_orders.remove(order_id);
            }
        }
        self.apply_fill(symbol, side, quantity, price, timestamp)
    }

    /// Re-mark the position in `symbol`, if any
    pub fn mark(&mut self, symbol: &MarketId, price: Price, timestamp: i64) {
        if let Some(position) = self.positions.get_mut(symbol) {
            position.mark_to_market(price, timestamp);
        }
    }

    fn roll_day(&mut self, timestamp: i64) {
        let today = day_index(timestamp);
        if today != self.day {
            self.day = today;
            self.realized_today = Decimal::ZERO;
        }
    }
}
