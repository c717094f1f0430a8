//! Exposure and loss calculations
//!
//! Deterministic computation of order notional, resulting position, and the
//! loss figures the daily limit is checked against.

use rust_decimal::Decimal;
use types::numeric::{Price, Quantity};
use types::order::Side;
use types::position::Position;

/// Notional of an order at its reference price
///
/// `notional = quantity × reference_price`, zero when no price is known
pub fn order_notional(quantity: Quantity, reference_price: Option<Price>) -> Decimal {
    reference_price
        .map(|price| quantity.notional(price))
        .unwrap_or(Decimal::ZERO)
}

/// Net position after an order fills in full
///
/// `resulting = current + quantity × side.sign()`
pub fn resulting_position(current: Decimal, side: Side, quantity: Quantity) -> Decimal {
    current + quantity.as_decimal() * side.sign()
}

/// Loss counted against the daily limit
///
/// `daily_loss = max(0, −realized_today) + max(0, −unrealized)`
pub fn daily_loss(realized_today: Decimal, unrealized_pnl: Decimal) -> Decimal {
    (-realized_today).max(Decimal::ZERO) + (-unrealized_pnl).max(Decimal::ZERO)
}

/// Daily loss if a new order immediately moved against the account
///
/// `projected = daily_loss + notional × worst_case_move`
pub fn projected_daily_loss(
    realized_today: Decimal,
    unrealized_pnl: Decimal,
    notional: Decimal,
    worst_case_move: Decimal,
) -> Decimal {
    daily_loss(realized_today, unrealized_pnl) + notional * worst_case_move
}

/// Total exposure across positions
///
/// `total_exposure = Σ |net_quantity| × mark`
pub fn total_exposure<'a>(positions: impl IntoIterator<Item = &'a Position>) -> Decimal {
    positions
        .into_iter()
        .fold(Decimal::ZERO, |acc, pos| acc + pos.exposure())
}

/// Total unrealized PnL across positions.
pub fn total_unrealized_pnl<'a>(positions: impl IntoIterator<Item = &'a Position>) -> Decimal {
    positions
        .into_iter()
        .fold(Decimal::ZERO, |acc, pos| acc + pos.unrealized_pnl)
}
