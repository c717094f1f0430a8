//! Types library for the unified trading engine
//!
//! Core type definitions shared by the matching, risk and settlement
//! services, ensuring type safety and deterministic arithmetic.
//!
//! # Modules
//! - `ids`: Unique identifiers (OrderId, TradeId, AccountId, MarketId, CorrelationId)
//! - `numeric`: Fixed-point decimal types (Price, Quantity)
//! - `order`: Order model, tagged order types and the status state machine
//! - `request`: External order request/response shapes
//! - `trade`: Trade execution types
//! - `position`: Position keeping (average price, realized/unrealized PnL)
//! - `fee`: Fee schedule
//! - `risk`: Risk limits, decisions and circuit-breaker states
//! - `settlement`: Settlement records
//! - `events`: Event envelope carried on the event bus
//! - `errors`: Error taxonomy
//! - `time`: Nanosecond clock helpers

pub mod ids;
pub mod numeric;
pub mod order;
pub mod request;
pub mod trade;
pub mod position;
pub mod fee;
pub mod risk;
pub mod settlement;
pub mod events;
pub mod errors;
pub mod time;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::order::*;
    pub use crate::request::*;
    pub use crate::trade::*;
    pub use crate::position::*;
    pub use crate::fee::*;
    pub use crate::risk::*;
    pub use crate::settlement::*;
    pub use crate::events::*;
    pub use crate::errors::*;
}
