//! Price-time priority sweep of the opposite side
//!
//! Repeatedly takes the best crossing level and fills against its oldest
//! order until the taker is filled or nothing crosses. Makers whose GTD has
//! lapsed are expired as the sweep reaches them and never trade.

use tracing::error;
use types::ids::{MarketId, OrderId};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderStatus, Side};
use types::trade::Trade;

use crate::book::{BookSide, FrontFill, OrderBook, SequenceCounter};
use crate::error::MatchError;
use crate::matching::crossing;
use crate::matching::executor::MatchExecutor;

/// Everything a sweep produced, in generation order
#[derive(Debug, Clone, Default)]
pub struct Fills {
    pub trades: Vec<Trade>,
    /// Maker snapshots after each fill
    pub makers: Vec<Order>,
    /// Makers expired on contact
    pub expired: Vec<Order>,
}

impl Fills {
    pub fn filled_quantity(&self) -> Quantity {
        self.trades.iter().map(|t| t.quantity).sum()
    }

    pub fn last_price(&self) -> Option<Price> {
        self.trades.last().map(|t| t.price)
    }
}

/// Match `taker` against the book
///
/// On error the fills produced so far stand; the caller force-rejects the
/// taker. Makers are only updated once both sides of a fill are valid.
pub fn sweep(
    book: &mut OrderBook,
    executor: &mut MatchExecutor,
    taker: &mut Order,
    now: i64,
    fills: &mut Fills,
) -> Result<(), MatchError> {
    let symbol = book.symbol().clone();
    let mut departed = Vec::new();
    let (side, sequencer) = book.split_for_match(taker.side);

    let result = sweep_side(side, sequencer, executor, &symbol, taker, now, fills, &mut departed);

    for order_id in &departed {
        book.forget(order_id);
    }
    result
}

#[allow(clippy::too_many_arguments)]
fn sweep_side(
    side: &mut BookSide,
    sequencer: &mut SequenceCounter,
    executor: &mut MatchExecutor,
    symbol: &MarketId,
    taker: &mut Order,
    now: i64,
    fills: &mut Fills,
    departed: &mut Vec<OrderId>,
) -> Result<(), MatchError> {
    let limit = taker.limit_price();

    while !taker.remaining_quantity.is_zero() {
        let Some((price, level)) = side.best_level_mut() else {
            break;
        };
        if !crossing::crosses(taker.side, limit, price) {
            break;
        }
        let Some(front) = level.front() else {
            side.prune(price);
            continue;
        };

        if front.order.time_in_force.is_expired(now) {
            if let Some(mut entry) = level.pop_front() {
                departed.push(entry.order.order_id);
                if let Err(err) = entry.order.transition(OrderStatus::Expired, now) {
                    error!(order_id = %entry.order.order_id, error = %err, "Failed to expire maker");
                    entry.order.force_reject(now);
                }
                fills.expired.push(entry.order);
            }
            side.prune(price);
            continue;
        }

        let quantity = taker.remaining_quantity.min(front.slice);
        let trade = executor.execute_trade(symbol, &front.order, taker, price, quantity, now)?;

        let mut maker = front.order.clone();
        maker.add_fill(quantity, now)?;
        taker.add_fill(quantity, now)?;

        if let Some(FrontFill::Completed(entry)) = level.fill_front(quantity, maker.clone(), || sequencer.next_sequence()) {
            departed.push(entry.order.order_id);
        }
        side.prune(price);

        fills.makers.push(maker);
        fills.trades.push(trade);
    }

    Ok(())
}

/// Live opposite-side quantity an order could reach, hidden included
///
/// Read-only; used for the fill-or-kill pre-check.
pub fn available_liquidity(book: &OrderBook, taker_side: Side, limit: Option<Price>, now: i64) -> Quantity {
    book.side(taker_side.opposite())
        .levels()
        .take_while(|(price, _)| crossing::crosses(taker_side, limit, **price))
        .flat_map(|(_, level)| level.iter())
        .filter(|entry| !entry.order.time_in_force.is_expired(now))
        .map(|entry| entry.order.remaining_quantity)
        .sum()
}
