//! Order lifecycle types
//!
//! Orders move through `New -> Validated -> {Resting | PartiallyFilled} ->
//! {Filled | Cancelled | Rejected | Expired}`. Every status change goes
//! through [`Order::transition`], which refuses illegal edges.

use crate::errors::OrderError;
use crate::ids::{AccountId, ClientOrderId, CorrelationId, MarketId, OrderId};
use crate::numeric::{Price, Quantity};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    BUY,
    /// Sell order (ask)
    SELL,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::BUY => Side::SELL,
            Side::SELL => Side::BUY,
        }
    }

    /// Direction multiplier for signed position arithmetic
    pub fn sign(&self) -> Decimal {
        match self {
            Side::BUY => Decimal::ONE,
            Side::SELL => Decimal::NEGATIVE_ONE,
        }
    }
}

/// Order type, carrying only the prices relevant to each kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrderType {
    /// Executes against any available liquidity, never rests
    Market,
    /// Executes at `price` or better, remainder may rest
    Limit { price: Price },
    /// Becomes a market order once the last trade reaches `stop_price`
    Stop { stop_price: Price },
    /// Becomes a limit order at `limit_price` once the last trade reaches `stop_price`
    StopLimit { stop_price: Price, limit_price: Price },
}

impl OrderType {
    /// Worst acceptable execution price, None for market-style orders
    pub fn limit_price(&self) -> Option<Price> {
        match self {
            OrderType::Market | OrderType::Stop { .. } => None,
            OrderType::Limit { price } => Some(*price),
            OrderType::StopLimit { limit_price, .. } => Some(*limit_price),
        }
    }

    /// Trigger price for stop orders
    pub fn stop_price(&self) -> Option<Price> {
        match self {
            OrderType::Market | OrderType::Limit { .. } => None,
            OrderType::Stop { stop_price } | OrderType::StopLimit { stop_price, .. } => Some(*stop_price),
        }
    }

    /// The type a stop order becomes once triggered
    pub fn triggered(&self) -> OrderType {
        match self {
            OrderType::Stop { .. } => OrderType::Market,
            OrderType::StopLimit { limit_price, .. } => OrderType::Limit { price: *limit_price },
            other => *other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrderType::Market => "market",
            OrderType::Limit { .. } => "limit",
            OrderType::Stop { .. } => "stop",
            OrderType::StopLimit { .. } => "stop_limit",
        }
    }
}

/// Time-in-force policy for orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum TimeInForce {
    /// Good-Till-Cancel: remains until filled or explicitly canceled
    GTC,
    /// Immediate-Or-Cancel: match immediately, cancel remainder
    IOC,
    /// Fill-Or-Kill: full match or reject entirely
    FOK,
    /// Good-Till-Date: expire at specified Unix nanos timestamp
    GTD(i64),
}

impl TimeInForce {
    /// Whether an order with this policy has expired at `now`
    pub fn is_expired(&self, now: i64) -> bool {
        matches!(self, TimeInForce::GTD(expiry) if *expiry <= now)
    }
}

/// How much of a resting order is visible in depth
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Whole remaining quantity is visible
    Full,
    /// Only a slice of this size is visible at a time
    Iceberg(Quantity),
    /// Never visible, still matchable
    Hidden,
}

/// Order status state machine
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Created from a request, not yet validated
    New,
    /// Passed validation and pre-trade risk
    Validated,
    /// Resting in the book (or parked as an untriggered stop)
    Resting,
    /// Some quantity filled, remainder still live
    PartiallyFilled,
    /// Completely matched (terminal)
    Filled,
    /// Canceled by user or by time-in-force policy (terminal)
    Cancelled(CancelReason),
    /// Refused by validation, risk or matching (terminal)
    Rejected(RejectReason),
    /// Time-in-force deadline reached (terminal)
    Expired,
}

impl OrderStatus {
    /// Check if status is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled(_) | OrderStatus::Rejected(_) | OrderStatus::Expired
        )
    }

    /// Numeric state id for compact wire encodings
    pub fn state_id(&self) -> u8 {
        match self {
            OrderStatus::New => 0,
            OrderStatus::Validated => 1,
            OrderStatus::Resting => 2,
            OrderStatus::PartiallyFilled => 3,
            OrderStatus::Filled => 4,
            OrderStatus::Cancelled(_) => 5,
            OrderStatus::Rejected(_) => 6,
            OrderStatus::Expired => 7,
        }
    }

    /// Whether `next` is a legal successor of this status
    pub fn can_transition_to(&self, next: &OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (New, Validated) | (New, Rejected(_)) => true,
            (Validated, Resting)
            | (Validated, PartiallyFilled)
            | (Validated, Filled)
            | (Validated, Cancelled(_))
            | (Validated, Rejected(_))
            | (Validated, Expired) => true,
            (Resting, PartiallyFilled)
            | (Resting, Filled)
            | (Resting, Cancelled(_))
            | (Resting, Rejected(_))
            | (Resting, Expired) => true,
            (PartiallyFilled, PartiallyFilled)
            | (PartiallyFilled, Filled)
            | (PartiallyFilled, Cancelled(_))
            | (PartiallyFilled, Rejected(_))
            | (PartiallyFilled, Expired) => true,
            _ => false,
        }
    }

    /// Reason code for cancelled/rejected states
    pub fn reason_code(&self) -> Option<&'static str> {
        match self {
            OrderStatus::Cancelled(reason) => Some(reason.code()),
            OrderStatus::Rejected(reason) => Some(reason.code()),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::New => "NEW",
            OrderStatus::Validated => "VALIDATED",
            OrderStatus::Resting => "RESTING",
            OrderStatus::PartiallyFilled => "PARTIALLY_FILLED",
            OrderStatus::Filled => "FILLED",
            OrderStatus::Cancelled(_) => "CANCELLED",
            OrderStatus::Rejected(_) => "REJECTED",
            OrderStatus::Expired => "EXPIRED",
        }
    }
}

/// Cancel reasons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    UserRequested,
    NoLiquidity,
    PartialIocCancel,
}

impl CancelReason {
    pub fn code(&self) -> &'static str {
        match self {
            CancelReason::UserRequested => "user_requested",
            CancelReason::NoLiquidity => "no_liquidity",
            CancelReason::PartialIocCancel => "partial_ioc_cancel",
        }
    }
}

/// Which stage of the pipeline produced a rejection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectCategory {
    Validation,
    Risk,
    Matching,
}

/// Reject reasons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    // Validation
    InvalidQuantity,
    InvalidPrice,
    MissingPrice,
    InvalidDisplayQuantity,
    UnknownSymbol,
    ExpiredOnArrival,
    UnsupportedOrder,
    // Risk
    OrderSizeExceeded,
    PositionLimitExceeded,
    DailyLossLimitExceeded,
    InsufficientMargin,
    CircuitOpen,
    UnknownAccount,
    // Matching
    NoLiquidity,
    FokUnfillable,
    InternalError,
    SystemOverloaded,
}

impl RejectReason {
    /// Stable snake_case reason code
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::InvalidQuantity => "invalid_quantity",
            RejectReason::InvalidPrice => "invalid_price",
            RejectReason::MissingPrice => "missing_price",
            RejectReason::InvalidDisplayQuantity => "invalid_display_quantity",
            RejectReason::UnknownSymbol => "unknown_symbol",
            RejectReason::ExpiredOnArrival => "expired_on_arrival",
            RejectReason::UnsupportedOrder => "unsupported_order",
            RejectReason::OrderSizeExceeded => "order_size_exceeded",
            RejectReason::PositionLimitExceeded => "position_limit_exceeded",
            RejectReason::DailyLossLimitExceeded => "daily_loss_limit_exceeded",
            RejectReason::InsufficientMargin => "insufficient_margin",
            RejectReason::CircuitOpen => "circuit_open",
            RejectReason::UnknownAccount => "unknown_account",
            RejectReason::NoLiquidity => "no_liquidity",
            RejectReason::FokUnfillable => "fok_unfillable",
            RejectReason::InternalError => "internal_error",
            RejectReason::SystemOverloaded => "system_overloaded",
        }
    }

    pub fn category(&self) -> RejectCategory {
        match self {
            RejectReason::InvalidQuantity
            | RejectReason::InvalidPrice
            | RejectReason::MissingPrice
            | RejectReason::InvalidDisplayQuantity
            | RejectReason::UnknownSymbol
            | RejectReason::ExpiredOnArrival
            | RejectReason::UnsupportedOrder => RejectCategory::Validation,
            RejectReason::OrderSizeExceeded
            | RejectReason::PositionLimitExceeded
            | RejectReason::DailyLossLimitExceeded
            | RejectReason::InsufficientMargin
            | RejectReason::CircuitOpen
            | RejectReason::UnknownAccount => RejectCategory::Risk,
            RejectReason::NoLiquidity
            | RejectReason::FokUnfillable
            | RejectReason::InternalError
            | RejectReason::SystemOverloaded => RejectCategory::Matching,
        }
    }
}

/// Complete order structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub client_order_id: ClientOrderId,
    pub account_id: AccountId,
    pub symbol: MarketId,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Quantity,
    /// Visible slice size; None = fully displayed, Some(0) = hidden
    pub display_quantity: Option<Quantity>,
    pub filled_quantity: Quantity,
    pub remaining_quantity: Quantity,
    pub status: OrderStatus,
    pub time_in_force: TimeInForce,
    pub correlation_id: CorrelationId,
    /// Arrival sequence assigned by the owning book
    pub sequence: u64,
    pub created_at: i64, // Unix nanos
    pub updated_at: i64, // Unix nanos
    pub version: u64,
}

impl Order {
    /// Create a new order in the `New` state
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        account_id: AccountId,
        client_order_id: ClientOrderId,
        symbol: MarketId,
        side: Side,
        order_type: OrderType,
        quantity: Quantity,
        time_in_force: TimeInForce,
        timestamp: i64,
    ) -> Self {
        Self {
            order_id: OrderId::new(),
            client_order_id,
            account_id,
            symbol,
            side,
            order_type,
            quantity,
            display_quantity: None,
            filled_quantity: Quantity::zero(),
            remaining_quantity: quantity,
            status: OrderStatus::New,
            time_in_force,
            correlation_id: CorrelationId::new(),
            sequence: 0,
            created_at: timestamp,
            updated_at: timestamp,
            version: 0,
        }
    }

    /// Shorthand for a validated GTC-style limit order
    pub fn limit(
        account_id: AccountId,
        symbol: MarketId,
        side: Side,
        price: Price,
        quantity: Quantity,
        time_in_force: TimeInForce,
        timestamp: i64,
    ) -> Self {
        let mut order = Self::new(
            account_id,
            ClientOrderId::default(),
            symbol,
            side,
            OrderType::Limit { price },
            quantity,
            time_in_force,
            timestamp,
        );
        order.status = OrderStatus::Validated;
        order
    }

    /// Shorthand for a validated market order
    pub fn market(account_id: AccountId, symbol: MarketId, side: Side, quantity: Quantity, timestamp: i64) -> Self {
        let mut order = Self::new(
            account_id,
            ClientOrderId::default(),
            symbol,
            side,
            OrderType::Market,
            quantity,
            TimeInForce::IOC,
            timestamp,
        );
        order.status = OrderStatus::Validated;
        order
    }

    /// Set the visible slice size
    pub fn with_display(mut self, display: Quantity) -> Self {
        self.display_quantity = Some(display);
        self
    }

    /// Visibility derived from `display_quantity`
    pub fn visibility(&self) -> Visibility {
        match self.display_quantity {
            None => Visibility::Full,
            Some(q) if q.is_zero() => Visibility::Hidden,
            Some(q) if q >= self.quantity => Visibility::Full,
            Some(q) => Visibility::Iceberg(q),
        }
    }

    /// Limit price, None for market-style orders
    pub fn limit_price(&self) -> Option<Price> {
        self.order_type.limit_price()
    }

    /// Check quantity invariant: filled + remaining = total, filled <= total
    pub fn check_invariant(&self) -> bool {
        self.filled_quantity.as_decimal() + self.remaining_quantity.as_decimal() == self.quantity.as_decimal()
            && self.filled_quantity <= self.quantity
    }

    /// Check if order is completely filled
    pub fn is_filled(&self) -> bool {
        self.filled_quantity == self.quantity
    }

    /// Check if order has any fills
    pub fn has_fills(&self) -> bool {
        !self.filled_quantity.is_zero()
    }

    /// Move to `next`, refusing edges the state machine does not allow
    pub fn transition(&mut self, next: OrderStatus, timestamp: i64) -> Result<(), OrderError> {
        if !self.status.can_transition_to(&next) {
            return Err(OrderError::InvalidStateTransition {
                from: self.status.label().to_string(),
                to: next.label().to_string(),
            });
        }
        self.status = next;
        self.updated_at = timestamp;
        self.version += 1;
        Ok(())
    }

    /// Record a fill and move to PartiallyFilled or Filled
    pub fn add_fill(&mut self, fill_quantity: Quantity, timestamp: i64) -> Result<(), OrderError> {
        if fill_quantity.is_zero() {
            return Err(OrderError::InvalidQuantity("fill quantity must be positive".to_string()));
        }
        let remaining = self.remaining_quantity.checked_sub(fill_quantity).ok_or_else(|| {
            OrderError::Overfill {
                order_id: self.order_id.to_string(),
                requested: fill_quantity.to_string(),
                remaining: self.remaining_quantity.to_string(),
            }
        })?;

        let next = if remaining.is_zero() {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        self.transition(next, timestamp)?;
        self.filled_quantity += fill_quantity;
        self.remaining_quantity = remaining;
        Ok(())
    }

    /// Cancel the remaining quantity
    pub fn cancel(&mut self, reason: CancelReason, timestamp: i64) -> Result<(), OrderError> {
        if self.status.is_terminal() {
            return Err(OrderError::AlreadyTerminal {
                status: self.status.label().to_string(),
            });
        }
        self.transition(OrderStatus::Cancelled(reason), timestamp)
    }

    /// Reject the order
    pub fn reject(&mut self, reason: RejectReason, timestamp: i64) -> Result<(), OrderError> {
        self.transition(OrderStatus::Rejected(reason), timestamp)
    }

    /// Force-reject after an internal fault; always leaves a terminal state
    pub fn force_reject(&mut self, timestamp: i64) {
        if !self.status.is_terminal() {
            self.status = OrderStatus::Rejected(RejectReason::InternalError);
            self.updated_at = timestamp;
            self.version += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_order(qty: &str) -> Order {
        Order::limit(
            AccountId::new(),
            MarketId::new("BTC/USDT"),
            Side::BUY,
            Price::from_u64(50000),
            Quantity::from_str(qty).unwrap(),
            TimeInForce::GTC,
            1708123456789000000,
        )
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::BUY.opposite(), Side::SELL);
        assert_eq!(Side::SELL.opposite(), Side::BUY);
        assert_eq!(Side::SELL.sign(), Decimal::NEGATIVE_ONE);
    }

    #[test]
    fn test_order_creation() {
        let order = make_order("1.0");
        assert_eq!(order.status, OrderStatus::Validated);
        assert!(order.check_invariant());
        assert!(!order.has_fills());
        assert_eq!(order.visibility(), Visibility::Full);
    }

    #[test]
    fn test_order_fill() {
        let mut order = make_order("1.0");

        order.add_fill(Quantity::from_str("0.3").unwrap(), 1708123456790000000).unwrap();
        assert_eq!(order.status, OrderStatus::PartiallyFilled);
        assert!(order.has_fills());
        assert!(!order.is_filled());
        assert!(order.check_invariant());

        order.add_fill(Quantity::from_str("0.2").unwrap(), 1708123456790500000).unwrap();
        assert_eq!(order.status, OrderStatus::PartiallyFilled);

        order.add_fill(Quantity::from_str("0.5").unwrap(), 1708123456791000000).unwrap();
        assert_eq!(order.status, OrderStatus::Filled);
        assert!(order.is_filled());
        assert!(order.check_invariant());
    }

    #[test]
    fn test_order_overfill_is_error() {
        let mut order = make_order("1.0");
        let result = order.add_fill(Quantity::from_str("1.5").unwrap(), 1708123456790000000);
        assert!(matches!(result, Err(OrderError::Overfill { .. })));
        assert_eq!(order.filled_quantity, Quantity::zero());
        assert_eq!(order.status, OrderStatus::Validated);
    }

    #[test]
    fn test_zero_fill_is_error() {
        let mut order = make_order("1.0");
        assert!(order.add_fill(Quantity::zero(), 1).is_err());
    }

    #[test]
    fn test_order_cancel() {
        let mut order = make_order("1.0");
        order.transition(OrderStatus::Resting, 1).unwrap();
        order.cancel(CancelReason::UserRequested, 2).unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled(CancelReason::UserRequested));
        assert!(order.status.is_terminal());
    }

    #[test]
    fn test_cancel_terminal_is_error() {
        let mut order = make_order("1.0");
        order.add_fill(Quantity::from_str("1.0").unwrap(), 1).unwrap();
        let result = order.cancel(CancelReason::UserRequested, 2);
        assert!(matches!(result, Err(OrderError::AlreadyTerminal { .. })));
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!OrderStatus::New.can_transition_to(&OrderStatus::Resting));
        assert!(!OrderStatus::Filled.can_transition_to(&OrderStatus::PartiallyFilled));
        assert!(!OrderStatus::Resting.can_transition_to(&OrderStatus::Validated));
        assert!(OrderStatus::PartiallyFilled.can_transition_to(&OrderStatus::PartiallyFilled));
    }

    #[test]
    fn test_force_reject_from_any_live_state() {
        let mut order = make_order("1.0");
        order.status = OrderStatus::New;
        order.force_reject(5);
        assert_eq!(order.status, OrderStatus::Rejected(RejectReason::InternalError));

        let mut filled = make_order("1.0");
        filled.add_fill(Quantity::from_u64(1), 1).unwrap();
        filled.force_reject(2);
        assert_eq!(filled.status, OrderStatus::Filled);
    }

    #[test]
    fn test_display_modes() {
        let iceberg = make_order("1000").with_display(Quantity::from_u64(100));
        assert_eq!(iceberg.visibility(), Visibility::Iceberg(Quantity::from_u64(100)));

        let hidden = make_order("1000").with_display(Quantity::zero());
        assert_eq!(hidden.visibility(), Visibility::Hidden);

        let oversized = make_order("10").with_display(Quantity::from_u64(100));
        assert_eq!(oversized.visibility(), Visibility::Full);
    }

    #[test]
    fn test_stop_types() {
        let stop = OrderType::StopLimit {
            stop_price: Price::from_u64(105),
            limit_price: Price::from_u64(106),
        };
        assert_eq!(stop.stop_price(), Some(Price::from_u64(105)));
        assert_eq!(stop.triggered(), OrderType::Limit { price: Price::from_u64(106) });
        assert_eq!(OrderType::Stop { stop_price: Price::from_u64(1) }.triggered(), OrderType::Market);
    }

    #[test]
    fn test_gtd_expiry() {
        assert!(TimeInForce::GTD(100).is_expired(100));
        assert!(!TimeInForce::GTD(100).is_expired(99));
        assert!(!TimeInForce::GTC.is_expired(i64::MAX));
    }

    #[test]
    fn test_reason_codes() {
        assert_eq!(RejectReason::PositionLimitExceeded.code(), "position_limit_exceeded");
        assert_eq!(RejectReason::CircuitOpen.category(), RejectCategory::Risk);
        assert_eq!(
            serde_json::to_string(&RejectReason::NoLiquidity).unwrap(),
            "\"no_liquidity\""
        );
        assert_eq!(
            OrderStatus::Cancelled(CancelReason::PartialIocCancel).reason_code(),
            Some("partial_ioc_cancel")
        );
    }

    #[test]
    fn test_order_serialization() {
        let order = make_order("2.5").with_display(Quantity::from_str("0.5").unwrap());
        let json = serde_json::to_string(&order).unwrap();
        let deserialized: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(order, deserialized);
    }
}
