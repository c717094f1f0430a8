//! Margin calculation functions
//!
//! Deterministic margin computations using fixed-point Decimal arithmetic.

use rust_decimal::Decimal;

/// Initial margin for existing exposure plus a new order
///
/// `required = (|existing_exposure| + order_notional) × margin_requirement`
pub fn required_margin(existing_exposure: Decimal, order_notional: Decimal, margin_requirement: Decimal) -> Decimal {
    (existing_exposure.abs() + order_notional) * margin_requirement
}

/// Margin available to back new exposure
///
/// `available = collateral + realized_pnl + unrealized_pnl`
pub fn available_margin(collateral: Decimal, realized_pnl: Decimal, unrealized_pnl: Decimal) -> Decimal {
    collateral + realized_pnl + unrealized_pnl
}

/// Margin ratio: `available / required`
///
/// Returns `Decimal::MAX` when nothing is required (no exposure).
pub fn margin_ratio(available: Decimal, required: Decimal) -> Decimal {
    if required.is_zero() {
        return Decimal::MAX;
    }
    available / required
}
