//! Order book for a single symbol
//!
//! Owns both sides plus an id index so cancels do not scan the book.
//! Only the symbol's worker ever touches an `OrderBook`.

use std::collections::HashMap;
use types::ids::{MarketId, OrderId};
use types::numeric::Price;
use types::order::{Order, Side};

use super::book_side::BookSide;
use super::price_level::RestingOrder;
use super::DepthSnapshot;

/// Monotonic arrival sequence for time priority
#[derive(Debug, Clone)]
pub struct SequenceCounter {
    next: u64,
}

impl SequenceCounter {
    pub fn new(start: u64) -> Self {
        Self { next: start }
    }

    /// Get next sequence number (monotonically increasing)
    pub fn next_sequence(&mut self) -> u64 {
        let seq = self.next;
        self.next += 1;
        seq
    }
}

#[derive(Debug, Clone)]
pub struct OrderBook {
    symbol: MarketId,
    bids: BookSide,
    asks: BookSide,
    index: HashMap<OrderId, (Side, Price)>,
    sequencer: SequenceCounter,
}

impl OrderBook {
    pub fn new(symbol: MarketId) -> Self {
        Self {
            symbol,
            bids: BookSide::new(Side::BUY),
            asks: BookSide::new(Side::SELL),
            index: HashMap::new(),
            sequencer: SequenceCounter::new(1),
        }
    }

    pub fn symbol(&self) -> &MarketId {
        &self.symbol
    }

    pub fn next_sequence(&mut self) -> u64 {
        self.sequencer.next_sequence()
    }

    /// Rest an order at the tail of its level with a fresh sequence
    pub fn rest(&mut self, price: Price, order: Order) {
        let sequence = self.sequencer.next_sequence();
        let side = order.side;
        self.index.insert(order.order_id, (side, price));
        let entry = RestingOrder::new(order, sequence);
        match side {
            Side::BUY => self.bids.insert(price, entry),
            Side::SELL => self.asks.insert(price, entry),
        }
    }

    /// Remove a resting order by id
    pub fn remove(&mut self, order_id: &OrderId) -> Option<RestingOrder> {
        let (side, price) = self.index.remove(order_id)?;
        match side {
            Side::BUY => self.bids.remove(order_id, price),
            Side::SELL => self.asks.remove(order_id, price),
        }
    }

    pub fn get(&self, order_id: &OrderId) -> Option<&RestingOrder> {
        let (side, price) = self.index.get(order_id)?;
        self.side(*side).get(order_id, *price)
    }

    pub fn contains(&self, order_id: &OrderId) -> bool {
        self.index.contains_key(order_id)
    }

    pub fn side(&self, side: Side) -> &BookSide {
        match side {
            Side::BUY => &self.bids,
            Side::SELL => &self.asks,
        }
    }

    /// The side an incoming order matches against, plus the sequencer
    pub(crate) fn split_for_match(&mut self, taker_side: Side) -> (&mut BookSide, &mut SequenceCounter) {
        match taker_side {
            Side::BUY => (&mut self.asks, &mut self.sequencer),
            Side::SELL => (&mut self.bids, &mut self.sequencer),
        }
    }

    /// Drop an order that left the book during matching
    pub(crate) fn forget(&mut self, order_id: &OrderId) {
        self.index.remove(order_id);
    }

    /// Ids of resting orders whose time-in-force has lapsed
    pub fn expired_ids(&self, now: i64) -> Vec<OrderId> {
        let mut ids: Vec<(u64, OrderId)> = [&self.bids, &self.asks]
            .into_iter()
            .flat_map(|side| side.levels())
            .flat_map(|(_, level)| level.iter())
            .filter(|entry| entry.order.time_in_force.is_expired(now))
            .map(|entry| (entry.sequence, entry.order.order_id))
            .collect();
        ids.sort();
        ids.into_iter().map(|(_, id)| id).collect()
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.bids.best_price()
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.asks.best_price()
    }

    /// Top-N visible depth per side
    pub fn depth(&self, levels: usize, last_trade_price: Option<Price>) -> DepthSnapshot {
        DepthSnapshot {
            symbol: self.symbol.clone(),
            bids: self.bids.depth_snapshot(levels),
            asks: self.asks.depth_snapshot(levels),
            last_trade_price,
        }
    }

    /// Number of resting orders
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
