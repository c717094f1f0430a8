//! Market impact estimate
//!
//! Read-only walk of the opposite side producing the average price a
//! market order of a given size would pay. Never alters book state.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::numeric::{Price, Quantity};
use types::order::Side;

use crate::book::OrderBook;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactEstimate {
    /// Side of the hypothetical incoming order
    pub side: Side,
    pub requested: Quantity,
    /// Quantity the book could absorb
    pub fillable: Quantity,
    pub average_price: Option<Price>,
    pub best_price: Option<Price>,
    pub worst_price: Option<Price>,
    pub levels_consumed: usize,
}

impl ImpactEstimate {
    pub fn fully_fillable(&self) -> bool {
        self.fillable >= self.requested
    }

    /// Adverse move of the average price from the touch, in basis points
    pub fn slippage_bps(&self) -> Option<Decimal> {
        let (average, best) = (self.average_price?.as_decimal(), self.best_price?.as_decimal());
        let adverse = match self.side {
            Side::BUY => average - best,
            Side::SELL => best - average,
        };
        Some(adverse / best * Decimal::from(10_000))
    }
}

pub fn estimate_impact(book: &OrderBook, side: Side, quantity: Quantity) -> ImpactEstimate {
    let mut needed = quantity;
    let mut fillable = Quantity::zero();
    let mut notional = Decimal::ZERO;
    let mut best_price = None;
    let mut worst_price = None;
    let mut levels_consumed = 0;

    for (price, level) in book.side(side.opposite()).levels() {
        if needed.is_zero() {
            break;
        }
        let take = needed.min(level.total_quantity());
        best_price.get_or_insert(*price);
        worst_price = Some(*price);
        levels_consumed += 1;
        notional += take.notional(*price);
        fillable += take;
        needed = needed.saturating_sub(take);
    }

    let average_price = if fillable.is_zero() {
        None
    } else {
        Price::try_new(notional / fillable.as_decimal()).ok()
    };

    ImpactEstimate {
        side,
        requested: quantity,
        fillable,
        average_price,
        best_price,
        worst_price,
        levels_consumed,
    }
}
