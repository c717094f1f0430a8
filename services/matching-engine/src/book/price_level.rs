//! Price level implementation with FIFO queue
//!
//! A price level contains all orders at a specific price point.
//! Orders are maintained in FIFO (First-In-First-Out) order to enforce
//! time priority. An iceberg whose slice is exhausted is re-queued at the
//! tail with a fresh sequence number.

use std::collections::VecDeque;
use types::ids::OrderId;
use types::numeric::Quantity;
use types::order::{Order, Visibility};

/// An order resting in the book
#[derive(Debug, Clone)]
pub struct RestingOrder {
    pub order: Order,
    /// Currently tradeable slice; equals remaining unless iceberg
    pub slice: Quantity,
    /// Time-priority position, refreshed on iceberg replenish
    pub sequence: u64,
}

impl RestingOrder {
    pub fn new(mut order: Order, sequence: u64) -> Self {
        order.sequence = sequence;
        let slice = Self::slice_for(&order);
        Self { order, slice, sequence }
    }

    fn slice_for(order: &Order) -> Quantity {
        match order.visibility() {
            Visibility::Iceberg(peak) => peak.min(order.remaining_quantity),
            Visibility::Full | Visibility::Hidden => order.remaining_quantity,
        }
    }

    /// Quantity shown in depth
    pub fn visible_quantity(&self) -> Quantity {
        match self.order.visibility() {
            Visibility::Hidden => Quantity::zero(),
            Visibility::Full | Visibility::Iceberg(_) => self.slice,
        }
    }

    /// Remaining quantity not shown in depth
    pub fn hidden_quantity(&self) -> Quantity {
        self.order.remaining_quantity.saturating_sub(self.visible_quantity())
    }
}

/// What happened to the front order after a fill
#[derive(Debug)]
pub enum FrontFill {
    /// Order still at the front with quantity left in its slice
    Partial,
    /// Iceberg slice exhausted; a new slice went to the tail
    Replenished,
    /// Order fully filled and removed
    Completed(RestingOrder),
}

/// A price level containing orders at a specific price
///
/// Maintains strict FIFO ordering for time-priority matching.
#[derive(Debug, Clone, Default)]
pub struct PriceLevel {
    /// Queue of orders at this price level (FIFO order)
    orders: VecDeque<RestingOrder>,
    /// Total remaining quantity at this level, hidden included
    total_quantity: Quantity,
}

impl PriceLevel {
    /// Create a new empty price level
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an order at the back of the queue (time priority)
    pub fn push_back(&mut self, entry: RestingOrder) {
        self.total_quantity += entry.order.remaining_quantity;
        self.orders.push_back(entry);
    }

    /// Remove an order from the queue by OrderId
    pub fn remove(&mut self, order_id: &OrderId) -> Option<RestingOrder> {
        let position = self.orders.iter().position(|entry| &entry.order.order_id == order_id)?;
        let entry = self.orders.remove(position)?;
        self.total_quantity = self.total_quantity.saturating_sub(entry.order.remaining_quantity);
        Some(entry)
    }

    /// Peek at the front order without removing it
    pub fn front(&self) -> Option<&RestingOrder> {
        self.orders.front()
    }

    /// Pop the front order from the queue
    pub fn pop_front(&mut self) -> Option<RestingOrder> {
        let entry = self.orders.pop_front()?;
        self.total_quantity = self.total_quantity.saturating_sub(entry.order.remaining_quantity);
        Some(entry)
    }

    /// Commit a fill of `quantity` against the front order
    ///
    /// `updated` is the maker after its fill was recorded. `next_sequence`
    /// is only called when an iceberg slice needs a new queue position.
    pub fn fill_front(
        &mut self,
        quantity: Quantity,
        updated: Order,
        next_sequence: impl FnOnce() -> u64,
    ) -> Option<FrontFill> {
        let entry = self.orders.front_mut()?;
        entry.slice = entry.slice.saturating_sub(quantity);
        entry.order = updated;
        self.total_quantity = self.total_quantity.saturating_sub(quantity);

        if entry.order.remaining_quantity.is_zero() {
            return self.orders.pop_front().map(FrontFill::Completed);
        }
        if !entry.slice.is_zero() {
            return Some(FrontFill::Partial);
        }

        let mut entry = self.orders.pop_front()?;
        let sequence = next_sequence();
        entry.sequence = sequence;
        entry.order.sequence = sequence;
        entry.slice = RestingOrder::slice_for(&entry.order);
        self.orders.push_back(entry);
        Some(FrontFill::Replenished)
    }

    /// Orders in time priority
    pub fn iter(&self) -> impl Iterator<Item = &RestingOrder> {
        self.orders.iter()
    }

    /// Check if the price level is empty
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Get the total quantity at this price level
    pub fn total_quantity(&self) -> Quantity {
        self.total_quantity
    }

    /// Quantity shown in depth at this level
    pub fn visible_quantity(&self) -> Quantity {
        self.orders.iter().map(RestingOrder::visible_quantity).sum()
    }

    /// Number of orders with a visible slice
    pub fn visible_order_count(&self) -> usize {
        self.orders.iter().filter(|e| !e.visible_quantity().is_zero()).count()
    }

    /// Get the number of orders at this level
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }
}
