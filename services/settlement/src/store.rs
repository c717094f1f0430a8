//! Settlement record store
//!
//! At most one record per trade id. Creation is an atomic
//! insert-if-absent, so concurrent settles of the same trade agree on a
//! single owner.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use types::ids::TradeId;
use types::settlement::{SettlementRecord, SettlementStatus};

#[derive(Debug, Default)]
pub struct SettlementStore {
    records: DashMap<TradeId, SettlementRecord>,
}

impl SettlementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `record` unless one already exists for its trade
    ///
    /// Returns the stored record and whether this call created it.
    pub fn create_if_absent(&self, record: SettlementRecord) -> (SettlementRecord, bool) {
        match self.records.entry(record.trade_id) {
            Entry::Occupied(existing) => (existing.get().clone(), false),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                (record, true)
            }
        }
    }

    /// Replace the stored record's mutable fields
    pub fn update(&self, record: &SettlementRecord) {
        if let Some(mut stored) = self.records.get_mut(&record.trade_id) {
            stored.status = record.status;
            stored.retry_count = record.retry_count;
            stored.last_error = record.last_error.clone();
            stored.confirmed_at = record.confirmed_at;
            stored.notional = record.notional;
            stored.maker_fee = record.maker_fee;
            stored.taker_fee = record.taker_fee;
            stored.conversion_rate = record.conversion_rate;
        }
    }

    pub fn get(&self, trade_id: &TradeId) -> Option<SettlementRecord> {
        self.records.get(trade_id).map(|r| r.clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn count_by_status(&self, status: SettlementStatus) -> usize {
        self.records.iter().filter(|r| r.status == status).count()
    }
}
