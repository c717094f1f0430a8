//! Settlement errors

use thiserror::Error;

/// Settlement failures, split by whether a retry can help
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettlementError {
    /// Downstream hiccup; the attempt is retried with backoff
    #[error("transient settlement failure: {0}")]
    Transient(String),

    /// Retrying cannot succeed
    #[error("permanent settlement failure: {0}")]
    Permanent(String),

    #[error("no conversion rate from {from} to {to}")]
    MissingRate { from: String, to: String },
}

impl SettlementError {
    pub fn is_transient(&self) -> bool {
        matches!(self, SettlementError::Transient(_))
    }
}
