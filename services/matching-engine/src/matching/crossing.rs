//! Crossing detection logic
//!
//! Determines when an incoming order can trade against a resting price

use types::numeric::Price;
use types::order::Side;

/// Check if a bid and ask can match at given prices
pub fn can_match(bid_price: Price, ask_price: Price) -> bool {
    bid_price >= ask_price
}

/// Check if an incoming order crosses a resting price
///
/// A `None` limit (market order) crosses every level.
pub fn crosses(incoming_side: Side, limit: Option<Price>, resting_price: Price) -> bool {
    match (incoming_side, limit) {
        (_, None) => true,
        (Side::BUY, Some(limit)) => can_match(limit, resting_price), // Buy crosses sell if bid >= ask
        (Side::SELL, Some(limit)) => can_match(resting_price, limit), // Sell crosses buy if ask <= bid
    }
}
