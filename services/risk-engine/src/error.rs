//! Risk engine errors

use thiserror::Error;

/// Administrative errors; order checks return a `RiskDecision` instead
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RiskError {
    #[error("unknown account: {account_id}")]
    UnknownAccount { account_id: String },

    #[error("account already registered: {account_id}")]
    DuplicateAccount { account_id: String },

    #[error("unknown risk tier: {tier}")]
    UnknownTier { tier: String },

    #[error("collateral must not be negative: {value}")]
    NegativeCollateral { value: String },
}
