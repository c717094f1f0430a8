//! Error types shared across the engine
//!
//! Error taxonomy using thiserror. Service crates layer their own errors
//! (`MatchError`, `RiskError`, `SettlementError`) on top of these.

use crate::order::RejectReason;
use thiserror::Error;

/// Order-specific errors
///
/// Raised by the status state machine and fill accounting. Inside the
/// matching engine any of these is an invariant violation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrderError {
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Order not found: {order_id}")]
    NotFound { order_id: String },

    #[error("Order already in terminal state: {status}")]
    AlreadyTerminal { status: String },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Fill of {requested} exceeds remaining {remaining} on order {order_id}")]
    Overfill {
        order_id: String,
        requested: String,
        remaining: String,
    },
}

/// Request validation errors, returned synchronously
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid symbol: {symbol}")]
    InvalidSymbol { symbol: String },

    #[error("Unknown symbol: {symbol}")]
    UnknownSymbol { symbol: String },

    #[error("Invalid quantity: {value}")]
    InvalidQuantity { value: String },

    #[error("Price required for this order type")]
    MissingPrice,

    #[error("Invalid price: {value}")]
    InvalidPrice { value: String },

    #[error("Invalid display quantity: {value}")]
    InvalidDisplayQuantity { value: String },

    #[error("Unsupported order: {reason}")]
    Unsupported { reason: String },

    #[error("Order expired before arrival")]
    ExpiredOnArrival,
}

impl ValidationError {
    /// Reason code reported to the client
    pub fn reject_reason(&self) -> RejectReason {
        match self {
            ValidationError::InvalidSymbol { .. } | ValidationError::UnknownSymbol { .. } => {
                RejectReason::UnknownSymbol
            }
            ValidationError::InvalidQuantity { .. } => RejectReason::InvalidQuantity,
            ValidationError::MissingPrice => RejectReason::MissingPrice,
            ValidationError::InvalidPrice { .. } => RejectReason::InvalidPrice,
            ValidationError::InvalidDisplayQuantity { .. } => RejectReason::InvalidDisplayQuantity,
            ValidationError::Unsupported { .. } => RejectReason::UnsupportedOrder,
            ValidationError::ExpiredOnArrival => RejectReason::ExpiredOnArrival,
        }
    }
}
