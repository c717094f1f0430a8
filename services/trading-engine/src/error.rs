//! Orchestrator errors

use matching_engine::RouterError;
use risk_engine::RiskError;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Router(#[from] RouterError),

    #[error(transparent)]
    Risk(#[from] RiskError),
}
