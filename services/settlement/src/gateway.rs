//! Downstream settlement dependency
//!
//! The processor hands each computed record to a `SettlementGateway`
//! (clearing, ledger, custody). Implementations classify their failures as
//! transient or permanent.

use async_trait::async_trait;
use tracing::debug;
use types::settlement::SettlementRecord;

use crate::error::SettlementError;

#[async_trait]
pub trait SettlementGateway: Send + Sync {
    /// Book the settlement downstream
    async fn submit(&self, record: &SettlementRecord) -> Result<(), SettlementError>;
}

/// Gateway that accepts everything immediately
#[derive(Debug, Default, Clone, Copy)]
pub struct LoopbackGateway;

#[async_trait]
impl SettlementGateway for LoopbackGateway {
    async fn submit(&self, record: &SettlementRecord) -> Result<(), SettlementError> {
        debug!(trade_id = %record.trade_id, notional = %record.notional, "Loopback settlement accepted");
        Ok(())
    }
}
