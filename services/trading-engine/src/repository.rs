//! Repository collaborator
//!
//! Orders, trades and settlement records are handed to a `Repository`
//! through a bounded writer queue. Writes are fire-and-forget: a full
//! queue drops the write and a failed write is logged, neither reaches the
//! caller.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use types::ids::{OrderId, TradeId};
use types::order::Order;
use types::settlement::SettlementRecord;
use types::trade::Trade;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("write rejected: {0}")]
    Rejected(String),
}

/// Durable history owned outside the core
#[async_trait]
pub trait Repository: Send + Sync {
    async fn save_order(&self, order: &Order) -> Result<(), RepositoryError>;

    async fn save_trade(&self, trade: &Trade) -> Result<(), RepositoryError>;

    async fn save_settlement(&self, record: &SettlementRecord) -> Result<(), RepositoryError>;
}

/// Keeps the latest version of everything in memory
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    orders: DashMap<OrderId, Order>,
    trades: DashMap<TradeId, Trade>,
    settlements: DashMap<TradeId, SettlementRecord>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order(&self, order_id: &OrderId) -> Option<Order> {
        self.orders.get(order_id).map(|o| o.clone())
    }

    pub fn trade(&self, trade_id: &TradeId) -> Option<Trade> {
        self.trades.get(trade_id).map(|t| t.clone())
    }

    pub fn settlement(&self, trade_id: &TradeId) -> Option<SettlementRecord> {
        self.settlements.get(trade_id).map(|r| r.clone())
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    pub fn trade_count(&self) -> usize {
        self.trades.len()
    }

    pub fn settlement_count(&self) -> usize {
        self.settlements.len()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn save_order(&self, order: &Order) -> Result<(), RepositoryError> {
        // Writes can arrive out of order across symbols; keep the newest
        let mut entry = self.orders.entry(order.order_id).or_insert_with(|| order.clone());
        if order.version >= entry.version {
            *entry = order.clone();
        }
        Ok(())
    }

    async fn save_trade(&self, trade: &Trade) -> Result<(), RepositoryError> {
        self.trades.insert(trade.trade_id, trade.clone());
        Ok(())
    }

    async fn save_settlement(&self, record: &SettlementRecord) -> Result<(), RepositoryError> {
        self.settlements.insert(record.trade_id, record.clone());
        Ok(())
    }
}

/// One queued write
#[derive(Debug, Clone)]
pub enum RepositoryWrite {
    Order(Order),
    Trade(Trade),
    Settlement(SettlementRecord),
}

impl RepositoryWrite {
    fn kind(&self) -> &'static str {
        match self {
            RepositoryWrite::Order(_) => "order",
            RepositoryWrite::Trade(_) => "trade",
            RepositoryWrite::Settlement(_) => "settlement",
        }
    }
}

/// Cloneable sending side of the writer queue
#[derive(Clone)]
pub struct RepositoryHandle {
    tx: mpsc::Sender<RepositoryWrite>,
    dropped: Arc<AtomicU64>,
}

impl RepositoryHandle {
    /// Queue a write without waiting; returns false if it was dropped
    pub fn submit(&self, write: RepositoryWrite) -> bool {
        match self.tx.try_send(write) {
            Ok(()) => true,
            Err(err) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                let write = match &err {
                    mpsc::error::TrySendError::Full(w) | mpsc::error::TrySendError::Closed(w) => w,
                };
                warn!(kind = write.kind(), error = %err, "Repository write dropped");
                false
            }
        }
    }

    pub fn save_order(&self, order: &Order) -> bool {
        self.submit(RepositoryWrite::Order(order.clone()))
    }

    pub fn save_trade(&self, trade: &Trade) -> bool {
        self.submit(RepositoryWrite::Trade(trade.clone()))
    }

    pub fn save_settlement(&self, record: &SettlementRecord) -> bool {
        self.submit(RepositoryWrite::Settlement(record.clone()))
    }

    /// Writes dropped on a full or closed queue
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn queue_depth(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }
}

/// Background task draining the write queue into a `Repository`
pub struct RepositoryWriter {
    handle: RepositoryHandle,
    task: JoinHandle<()>,
}

impl RepositoryWriter {
    pub fn start(repository: Arc<dyn Repository>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<RepositoryWrite>(capacity.max(1));
        let task = tokio::spawn(async move {
            let mut failures = 0u64;
            while let Some(write) = rx.recv().await {
                let result = match &write {
                    RepositoryWrite::Order(order) => repository.save_order(order).await,
                    RepositoryWrite::Trade(trade) => repository.save_trade(trade).await,
                    RepositoryWrite::Settlement(record) => repository.save_settlement(record).await,
                };
                if let Err(e) = result {
                    failures += 1;
                    warn!(kind = write.kind(), error = %e, failures, "Repository write failed");
                }
            }
            info!(failures, "Repository writer stopped");
        });

        Self {
            handle: RepositoryHandle {
                tx,
                dropped: Arc::new(AtomicU64::new(0)),
            },
            task,
        }
    }

    pub fn handle(&self) -> RepositoryHandle {
        self.handle.clone()
    }

    /// Drain queued writes and stop
    ///
    /// Every other `RepositoryHandle` must already be dropped, or this
    /// waits for them.
    pub async fn shutdown(self) {
        drop(self.handle);
        if let Err(e) = self.task.await {
            warn!(error = %e, "Repository writer ended abnormally");
        }
    }
}
