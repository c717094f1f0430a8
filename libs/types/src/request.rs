//! External order request/response shapes
//!
//! `OrderRequest` arrives from the transport collaborator with raw decimals;
//! [`OrderRequest::into_order`] turns it into a tagged [`Order`] or a
//! `ValidationError` that is returned synchronously.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::ids::{AccountId, ClientOrderId, CorrelationId, MarketId, OrderId};
use crate::numeric::{Price, Quantity};
use crate::order::{Order, OrderStatus, OrderType, Side, TimeInForce};
use crate::trade::Trade;

/// Order type as sent on the wire, before prices are attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    Market,
    Limit,
    Stop,
    StopLimit,
}

/// Inbound order request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub client_order_id: String,
    pub symbol: String,
    pub side: Side,
    #[serde(rename = "type")]
    pub order_type: OrderKind,
    pub quantity: Decimal,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub stop_price: Option<Decimal>,
    pub time_in_force: TimeInForce,
    #[serde(default)]
    pub display_quantity: Option<Decimal>,
    pub account_id: AccountId,
}

impl OrderRequest {
    /// Validate fields and build a `Validated` order
    pub fn into_order(self, timestamp: i64) -> Result<Order, ValidationError> {
        let symbol = MarketId::try_new(self.symbol.clone()).ok_or(ValidationError::InvalidSymbol {
            symbol: self.symbol.clone(),
        })?;

        let quantity = Quantity::try_new(self.quantity)
            .ok()
            .filter(|q| !q.is_zero())
            .ok_or(ValidationError::InvalidQuantity {
                value: self.quantity.to_string(),
            })?;

        let order_type = self.order_type()?;

        let display_quantity = match self.display_quantity {
            None => None,
            Some(display) => {
                let display = Quantity::try_new(display).map_err(|_| ValidationError::InvalidDisplayQuantity {
                    value: display.to_string(),
                })?;
                if matches!(order_type, OrderType::Market | OrderType::Stop { .. }) {
                    return Err(ValidationError::Unsupported {
                        reason: "display quantity requires a limit price".to_string(),
                    });
                }
                Some(display)
            }
        };

        if self.time_in_force.is_expired(timestamp) {
            return Err(ValidationError::ExpiredOnArrival);
        }

        let mut order = Order::new(
            self.account_id,
            ClientOrderId::new(self.client_order_id),
            symbol,
            self.side,
            order_type,
            quantity,
            self.time_in_force,
            timestamp,
        );
        order.display_quantity = display_quantity;
        order
            .transition(OrderStatus::Validated, timestamp)
            .map_err(|e| ValidationError::Unsupported { reason: e.to_string() })?;
        Ok(order)
    }

    fn order_type(&self) -> Result<OrderType, ValidationError> {
        let price = |value: Option<Decimal>| -> Result<Price, ValidationError> {
            let value = value.ok_or(ValidationError::MissingPrice)?;
            Price::try_new(value).map_err(|_| ValidationError::InvalidPrice {
                value: value.to_string(),
            })
        };

        match self.order_type {
            OrderKind::Market => {
                if self.price.is_some() {
                    return Err(ValidationError::Unsupported {
                        reason: "market orders carry no price".to_string(),
                    });
                }
                Ok(OrderType::Market)
            }
            OrderKind::Limit => Ok(OrderType::Limit { price: price(self.price)? }),
            OrderKind::Stop => Ok(OrderType::Stop {
                stop_price: price(self.stop_price)?,
            }),
            OrderKind::StopLimit => Ok(OrderType::StopLimit {
                stop_price: price(self.stop_price)?,
                limit_price: price(self.price)?,
            }),
        }
    }
}

/// Outbound response for one submitted order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResponse {
    pub status: OrderStatus,
    pub reason: Option<String>,
    pub exchange_order_id: Option<OrderId>,
    pub client_order_id: String,
    pub correlation_id: Option<CorrelationId>,
    pub filled_quantity: Quantity,
    pub remaining_quantity: Quantity,
    pub execution_reports: Vec<Trade>,
    /// Stop orders released by this order's trades, in generation order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triggered: Vec<OrderResponse>,
}

impl OrderResponse {
    /// Response for an order that has been processed
    pub fn from_order(order: &Order, execution_reports: Vec<Trade>) -> Self {
        Self {
            status: order.status.clone(),
            reason: order.status.reason_code().map(str::to_string),
            exchange_order_id: Some(order.order_id),
            client_order_id: order.client_order_id.as_str().to_string(),
            correlation_id: Some(order.correlation_id),
            filled_quantity: order.filled_quantity,
            remaining_quantity: order.remaining_quantity,
            execution_reports,
            triggered: Vec::new(),
        }
    }

    /// Response for a request that never became an order
    pub fn invalid(client_order_id: impl Into<String>, error: &ValidationError) -> Self {
        let reason = error.reject_reason();
        Self {
            status: OrderStatus::Rejected(reason),
            reason: Some(reason.code().to_string()),
            exchange_order_id: None,
            client_order_id: client_order_id.into(),
            correlation_id: None,
            filled_quantity: Quantity::zero(),
            remaining_quantity: Quantity::zero(),
            execution_reports: Vec::new(),
            triggered: Vec::new(),
        }
    }
}
