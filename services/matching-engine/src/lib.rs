//! Matching Engine Service
//!
//! Price-time priority matching for every configured symbol. Each symbol's
//! book is owned by a single worker task, so matching for one symbol is
//! strictly sequential while symbols run in parallel.
//!
//! **Key Invariants:**
//! - Price-time priority strictly enforced
//! - Deterministic matching (same inputs → same outputs)
//! - Trades execute at the resting order's price
//! - Conservation of quantity

pub mod book;
pub mod engine;
pub mod error;
pub mod matching;
pub mod router;
pub mod worker;

pub use book::{DepthLevel, DepthSnapshot};
pub use engine::{CancelOutcome, ExecutionReport, MatchingConfig, SubmitOutcome, SymbolEngine};
pub use error::{MatchError, RouterError};
pub use matching::ImpactEstimate;
pub use router::MatchingRouter;
pub use worker::{ExecutionListener, NoopListener, SymbolHandle};
