//! Pre-trade risk validation
//!
//! Validates an incoming order against the owning account's limits. Checks
//! run in a fixed order and the first failure short-circuits.

use tracing::debug;
use types::numeric::Price;
use types::order::{Order, RejectReason};
use types::risk::RiskDecision;

use crate::account::AccountRisk;
use crate::exposure;
use crate::margin;

/// Validate an order against all account limits.
///
/// Returns `RiskDecision::Pass` if all checks succeed, otherwise the first
/// failing check's reason.
///
/// Checks performed (in order):
/// 1. Order size within the single-order limit
/// 2. Worst-case resulting position within the position limit, counting
///    what the account's open orders on the same side may still fill
/// 3. Projected daily loss within the daily loss limit
/// 4. Sufficient margin
///
/// `reference_price` prices orders without a limit (market and stop);
/// when absent the position's mark is used, and failing that the notional
/// checks see zero notional.
pub fn validate_order(account: &AccountRisk, order: &Order, reference_price: Option<Price>, now: i64) -> RiskDecision {
    let limits = &account.limits;
    let quantity = order.remaining_quantity;

    // 1. Single order size
    if quantity.as_decimal() > limits.max_order_size {
        debug!(order_id = %order.order_id, %quantity, limit = %limits.max_order_size, "Order size exceeded");
        return RiskDecision::Reject(RejectReason::OrderSizeExceeded);
    }

    // 2. Resulting position
    let current = account.net_quantity(&order.symbol);
    let pending = account.reserved_quantity(&order.symbol, order.side);
    let resulting = exposure::resulting_position(current, order.side, pending + quantity);
    if resulting.abs() > limits.max_position_size {
        debug!(order_id = %order.order_id, %current, %pending, %resulting, "Position limit exceeded");
        return RiskDecision::Reject(RejectReason::PositionLimitExceeded);
    }

    let reference = order
        .limit_price()
        .or(reference_price)
        .or_else(|| account.position(&order.symbol).and_then(|p| p.mark_price));
    let notional = exposure::order_notional(quantity, reference);

    // 3. Projected daily loss
    let projected = exposure::projected_daily_loss(
        account.realized_today(now),
        account.unrealized_pnl(),
        notional,
        limits.worst_case_move,
    );
    if projected > limits.max_daily_loss {
        debug!(order_id = %order.order_id, %projected, limit = %limits.max_daily_loss, "Daily loss limit exceeded");
        return RiskDecision::Reject(RejectReason::DailyLossLimitExceeded);
    }

    // 4. Margin sufficiency
    let required = margin::required_margin(account.exposure(), notional, limits.margin_requirement);
    let available = margin::available_margin(account.collateral, account.realized_pnl(), account.unrealized_pnl());
    if required > available {
        debug!(order_id = %order.order_id, %required, %available, "Insufficient margin");
        return RiskDecision::Reject(RejectReason::InsufficientMargin);
    }

    RiskDecision::Pass
}
