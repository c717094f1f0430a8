//! One side of an order book
//!
//! Bids are iterated price descending, asks ascending. Uses BTreeMap for
//! deterministic iteration order.

use std::collections::BTreeMap;
use types::ids::OrderId;
use types::numeric::{Price, Quantity};
use types::order::Side;

use super::price_level::{PriceLevel, RestingOrder};
use super::DepthLevel;

/// Price levels for a single side
///
/// At each price level, orders are maintained in FIFO order. Empty levels
/// are removed as soon as their last order leaves.
#[derive(Debug, Clone)]
pub struct BookSide {
    side: Side,
    levels: BTreeMap<Price, PriceLevel>,
}

impl BookSide {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Append an order at the tail of its price level
    pub fn insert(&mut self, price: Price, entry: RestingOrder) {
        self.levels.entry(price).or_default().push_back(entry);
    }

    /// Remove an order, dropping the level if it empties
    pub fn remove(&mut self, order_id: &OrderId, price: Price) -> Option<RestingOrder> {
        let level = self.levels.get_mut(&price)?;
        let entry = level.remove(order_id)?;
        if level.is_empty() {
            self.levels.remove(&price);
        }
        Some(entry)
    }

    pub fn get(&self, order_id: &OrderId, price: Price) -> Option<&RestingOrder> {
        self.levels
            .get(&price)?
            .iter()
            .find(|entry| &entry.order.order_id == order_id)
    }

    /// Best price on this side
    pub fn best_price(&self) -> Option<Price> {
        match self.side {
            // BTreeMap iter is ascending, so bids need the last key
            Side::BUY => self.levels.keys().next_back().copied(),
            Side::SELL => self.levels.keys().next().copied(),
        }
    }

    /// Get mutable reference to the best level
    pub(crate) fn best_level_mut(&mut self) -> Option<(Price, &mut PriceLevel)> {
        match self.side {
            Side::BUY => self.levels.iter_mut().next_back(),
            Side::SELL => self.levels.iter_mut().next(),
        }
        .map(|(price, level)| (*price, level))
    }

    /// Drop a level if nothing rests on it
    pub(crate) fn prune(&mut self, price: Price) {
        if self.levels.get(&price).is_some_and(PriceLevel::is_empty) {
            self.levels.remove(&price);
        }
    }

    /// Levels best-first
    pub fn levels(&self) -> Box<dyn Iterator<Item = (&Price, &PriceLevel)> + '_> {
        match self.side {
            Side::BUY => Box::new(self.levels.iter().rev()),
            Side::SELL => Box::new(self.levels.iter()),
        }
    }

    /// Top N visible levels; levels holding only hidden quantity are skipped
    pub fn depth_snapshot(&self, depth: usize) -> Vec<DepthLevel> {
        self.levels()
            .filter_map(|(price, level)| {
                let quantity = level.visible_quantity();
                (!quantity.is_zero()).then(|| DepthLevel {
                    price: *price,
                    quantity,
                    order_count: level.visible_order_count(),
                })
            })
            .take(depth)
            .collect()
    }

    /// Total resting quantity, hidden included
    pub fn total_quantity(&self) -> Quantity {
        self.levels.values().map(PriceLevel::total_quantity).sum()
    }

    /// Check if this side is empty
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Get the total number of price levels
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::{AccountId, MarketId};
    use types::order::{Order, TimeInForce};

    fn entry(side: Side, price: u64, qty: &str, seq: u64) -> (Price, RestingOrder) {
        let order = Order::limit(
            AccountId::new(),
            MarketId::new("BTC/USDT"),
            side,
            Price::from_u64(price),
            Quantity::from_str(qty).unwrap(),
            TimeInForce::GTC,
            1708123456789000000,
        );
        (Price::from_u64(price), RestingOrder::new(order, seq))
    }

    fn insert(book: &mut BookSide, price: u64, qty: &str, seq: u64) -> OrderId {
        let (price, entry) = entry(book.side(), price, qty, seq);
        let id = entry.order.order_id;
        book.insert(price, entry);
        id
    }

    #[test]
    fn test_bid_side_best_is_highest() {
        let mut book = BookSide::new(Side::BUY);
        insert(&mut book, 50000, "1.0", 1);
        insert(&mut book, 51000, "2.0", 2);
        insert(&mut book, 49000, "1.5", 3);

        assert_eq!(book.best_price(), Some(Price::from_u64(51000)));
        let (price, level) = book.best_level_mut().unwrap();
        assert_eq!(price, Price::from_u64(51000));
        assert_eq!(level.total_quantity(), Quantity::from_str("2.0").unwrap());
    }

    #[test]
    fn test_ask_side_best_is_lowest() {
        let mut book = BookSide::new(Side::SELL);
        insert(&mut book, 50000, "1.0", 1);
        insert(&mut book, 49000, "1.5", 2);

        assert_eq!(book.best_price(), Some(Price::from_u64(49000)));
    }

    #[test]
    fn test_remove_drops_empty_level() {
        let mut book = BookSide::new(Side::BUY);
        let id = insert(&mut book, 50000, "1.0", 1);
        assert_eq!(book.level_count(), 1);

        assert!(book.remove(&id, Price::from_u64(50000)).is_some());
        assert!(book.is_empty());
        assert!(book.remove(&id, Price::from_u64(50000)).is_none());
    }

    #[test]
    fn test_depth_snapshot_ordering() {
        let mut bids = BookSide::new(Side::BUY);
        insert(&mut bids, 50000, "1.0", 1);
        insert(&mut bids, 51000, "2.0", 2);
        insert(&mut bids, 49000, "1.5", 3);
        insert(&mut bids, 52000, "0.5", 4);

        let depth = bids.depth_snapshot(2);
        assert_eq!(depth.len(), 2);
        assert_eq!(depth[0].price, Price::from_u64(52000));
        assert_eq!(depth[1].price, Price::from_u64(51000));

        let mut asks = BookSide::new(Side::SELL);
        insert(&mut asks, 50000, "1.0", 1);
        insert(&mut asks, 49000, "1.5", 2);
        let depth = asks.depth_snapshot(10);
        assert_eq!(depth[0].price, Price::from_u64(49000));
    }

    #[test]
    fn test_depth_skips_hidden_only_levels() {
        let mut asks = BookSide::new(Side::SELL);
        let (price, mut hidden) = entry(Side::SELL, 100, "5", 1);
        hidden.order.display_quantity = Some(Quantity::zero());
        asks.insert(price, hidden);
        insert(&mut asks, 101, "2", 2);

        let depth = asks.depth_snapshot(5);
        assert_eq!(depth.len(), 1);
        assert_eq!(depth[0].price, Price::from_u64(101));
        assert_eq!(asks.total_quantity(), Quantity::from_u64(7));
    }

    #[test]
    fn test_same_price_aggregates() {
        let mut book = BookSide::new(Side::BUY);
        insert(&mut book, 50000, "1.0", 1);
        insert(&mut book, 50000, "2.0", 2);

        assert_eq!(book.level_count(), 1);
        let depth = book.depth_snapshot(1);
        assert_eq!(depth[0].quantity, Quantity::from_str("3.0").unwrap());
        assert_eq!(depth[0].order_count, 2);
    }
}
