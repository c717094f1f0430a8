//! Matching logic module
//!
//! Implements the price-time priority matching algorithm, the fill-or-kill
//! liquidity pre-check, market impact estimates and the stop book.

pub mod crossing;
pub mod executor;
pub mod impact;
pub mod stops;
pub mod sweep;

pub use crossing::can_match;
pub use executor::MatchExecutor;
pub use impact::{estimate_impact, ImpactEstimate};
pub use stops::StopBook;
pub use sweep::{available_liquidity, sweep, Fills};
