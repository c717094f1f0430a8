//! Parked stop and stop-limit orders
//!
//! Stops are not visible in depth. After each trade the last trade price is
//! compared to every stop: buy stops trigger at `last >= stop`, sell stops
//! at `last <= stop`. Triggered stops are released in arrival order.

use std::collections::{BTreeMap, HashMap};
use types::ids::OrderId;
use types::numeric::Price;
use types::order::{Order, Side};

/// Whether a stop on `side` at `stop_price` fires at `last`
pub fn is_triggered(side: Side, stop_price: Price, last: Price) -> bool {
    match side {
        Side::BUY => last >= stop_price,
        Side::SELL => last <= stop_price,
    }
}

#[derive(Debug, Clone, Default)]
pub struct StopBook {
    /// Keyed by arrival sequence
    orders: BTreeMap<u64, Order>,
    index: HashMap<OrderId, u64>,
}

impl StopBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn park(&mut self, order: Order) {
        self.index.insert(order.order_id, order.sequence);
        self.orders.insert(order.sequence, order);
    }

    pub fn remove(&mut self, order_id: &OrderId) -> Option<Order> {
        let sequence = self.index.remove(order_id)?;
        self.orders.remove(&sequence)
    }

    pub fn contains(&self, order_id: &OrderId) -> bool {
        self.index.contains_key(order_id)
    }

    /// Remove and return every stop that fires at `last`
    pub fn take_triggered(&mut self, last: Price) -> Vec<Order> {
        self.take_where(|order| {
            order
                .order_type
                .stop_price()
                .is_some_and(|stop| is_triggered(order.side, stop, last))
        })
    }

    /// Remove and return every stop whose time-in-force has lapsed
    pub fn take_expired(&mut self, now: i64) -> Vec<Order> {
        self.take_where(|order| order.time_in_force.is_expired(now))
    }

    fn take_where(&mut self, predicate: impl Fn(&Order) -> bool) -> Vec<Order> {
        let keys: Vec<u64> = self
            .orders
            .iter()
            .filter(|(_, order)| predicate(order))
            .map(|(seq, _)| *seq)
            .collect();

        keys.into_iter()
            .filter_map(|seq| self.orders.remove(&seq))
            .inspect(|order| {
                self.index.remove(&order.order_id);
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}
