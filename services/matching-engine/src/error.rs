//! Matching engine errors

use thiserror::Error;
use types::errors::OrderError;

/// Invariant violations detected while matching
///
/// Fatal to the affected order only: it is force-rejected and the book
/// stays consistent for everyone else.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    #[error("order {order_id} reached matching in state {status}")]
    NotValidated { order_id: String, status: String },

    #[error("zero-quantity trade between maker {maker} and taker {taker}")]
    ZeroQuantityTrade { maker: String, taker: String },

    #[error(transparent)]
    Order(#[from] OrderError),
}

/// Errors reaching a symbol worker
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    #[error("unknown symbol: {symbol}")]
    UnknownSymbol { symbol: String },

    #[error("inbound queue for {symbol} is full")]
    Overloaded { symbol: String },

    #[error("worker for {symbol} has stopped")]
    Unavailable { symbol: String },
}
