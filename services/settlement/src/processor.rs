//! Settlement processor
//!
//! `settle` creates the record for a trade (idempotently), computes fees
//! and conversion, and books it through the gateway. Transient gateway
//! failures are retried with exponential backoff; anything else, or
//! running out of attempts, fails the record.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};
use types::fee::FeeSchedule;
use types::ids::TradeId;
use types::settlement::{SettlementRecord, SettlementStatus};
use types::time::now_nanos;
use types::trade::Trade;

use crate::conversion::RateTable;
use crate::error::SettlementError;
use crate::fees::compute_amounts;
use crate::gateway::SettlementGateway;
use crate::retry::RetryPolicy;
use crate::store::SettlementStore;

/// Outcome of a settle call
#[derive(Debug, Clone, PartialEq)]
pub enum SettlementResult {
    Confirmed(SettlementRecord),
    Failed {
        record: SettlementRecord,
        error: SettlementError,
    },
    /// A record already existed; this is its current state
    Existing(SettlementRecord),
}

impl SettlementResult {
    pub fn record(&self) -> &SettlementRecord {
        match self {
            SettlementResult::Confirmed(record)
            | SettlementResult::Failed { record, .. }
            | SettlementResult::Existing(record) => record,
        }
    }
}

/// Processor counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SettlementStats {
    pub confirmed: u64,
    pub failed: u64,
    pub retries: u64,
    pub duplicates: u64,
}

#[derive(Default)]
struct Counters {
    confirmed: AtomicU64,
    failed: AtomicU64,
    retries: AtomicU64,
    duplicates: AtomicU64,
}

pub struct SettlementProcessor {
    store: SettlementStore,
    gateway: Arc<dyn SettlementGateway>,
    fees: FeeSchedule,
    rates: RateTable,
    retry: RetryPolicy,
    counters: Counters,
}

impl SettlementProcessor {
    pub fn new(gateway: Arc<dyn SettlementGateway>, fees: FeeSchedule, rates: RateTable, retry: RetryPolicy) -> Self {
        Self {
            store: SettlementStore::new(),
            gateway,
            fees,
            rates,
            retry,
            counters: Counters::default(),
        }
    }

    pub fn store(&self) -> &SettlementStore {
        &self.store
    }

    pub fn record(&self, trade_id: &TradeId) -> Option<SettlementRecord> {
        self.store.get(trade_id)
    }

    pub fn stats(&self) -> SettlementStats {
        SettlementStats {
            confirmed: self.counters.confirmed.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            retries: self.counters.retries.load(Ordering::Relaxed),
            duplicates: self.counters.duplicates.load(Ordering::Relaxed),
        }
    }

    /// Settle one trade
    ///
    /// Only the first call for a trade id does any work; later calls return
    /// the stored record as it stands.
    pub async fn settle(&self, trade: &Trade) -> SettlementResult {
        let pending = SettlementRecord::pending(
            trade.trade_id,
            trade.symbol.clone(),
            self.rates.reporting_currency.clone(),
            now_nanos(),
        );
        let (mut record, created) = self.store.create_if_absent(pending);
        if !created {
            self.counters.duplicates.fetch_add(1, Ordering::Relaxed);
            debug!(trade_id = %trade.trade_id, status = ?record.status, "Settlement already exists");
            return SettlementResult::Existing(record);
        }

        let amounts = match compute_amounts(trade, &self.fees, &self.rates) {
            Ok(amounts) => amounts,
            Err(error) => return self.fail(record, error),
        };
        record.notional = amounts.notional;
        record.maker_fee = amounts.maker_fee;
        record.taker_fee = amounts.taker_fee;
        record.conversion_rate = amounts.conversion_rate;
        self.store.update(&record);

        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.gateway.submit(&record).await {
                Ok(()) => return self.confirm(record),
                Err(error) if error.is_transient() && self.retry.should_retry(attempts) => {
                    let delay = self.retry.backoff(attempts);
                    record.status = SettlementStatus::Retrying;
                    record.retry_count = attempts;
                    record.last_error = Some(error.to_string());
                    self.store.update(&record);
                    self.counters.retries.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        trade_id = %record.trade_id,
                        retry = attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %error,
                        "Settlement attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(error) => return self.fail(record, error),
            }
        }
    }

    fn confirm(&self, mut record: SettlementRecord) -> SettlementResult {
        record.status = SettlementStatus::Confirmed;
        record.confirmed_at = Some(now_nanos());
        self.store.update(&record);
        self.counters.confirmed.fetch_add(1, Ordering::Relaxed);
        info!(
            trade_id = %record.trade_id,
            notional = %record.notional,
            fees = %record.total_fees(),
            retries = record.retry_count,
            "Settlement confirmed"
        );
        SettlementResult::Confirmed(record)
    }

    fn fail(&self, mut record: SettlementRecord, error: SettlementError) -> SettlementResult {
        record.status = SettlementStatus::Failed;
        record.last_error = Some(error.to_string());
        self.store.update(&record);
        self.counters.failed.fetch_add(1, Ordering::Relaxed);
        warn!(trade_id = %record.trade_id, retries = record.retry_count, error = %error, "Settlement failed");
        SettlementResult::Failed { record, error }
    }
}
