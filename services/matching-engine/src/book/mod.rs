//! Order book infrastructure module
//!
//! Contains price levels, book sides, and the per-symbol order book.

pub mod price_level;
pub mod book_side;
pub mod order_book;

use serde::{Deserialize, Serialize};
use types::ids::MarketId;
use types::numeric::{Price, Quantity};

pub use book_side::BookSide;
pub use order_book::{OrderBook, SequenceCounter};
pub use price_level::{FrontFill, PriceLevel, RestingOrder};

/// One aggregated depth level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthLevel {
    pub price: Price,
    /// Visible quantity only
    pub quantity: Quantity,
    pub order_count: usize,
}

/// Order book snapshot for market data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthSnapshot {
    pub symbol: MarketId,
    pub bids: Vec<DepthLevel>,
    pub asks: Vec<DepthLevel>,
    pub last_trade_price: Option<Price>,
}

impl DepthSnapshot {
    pub fn best_bid(&self) -> Option<&DepthLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&DepthLevel> {
        self.asks.first()
    }
}
