//! Settlement worker pool
//!
//! A fixed number of tokio tasks share one trade queue. Producers hold a
//! `SettlementQueue`, whose `submit` never blocks and never drops while the
//! pool runs; results go to a `SettlementSink`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use types::ids::CorrelationId;
use types::trade::Trade;

use crate::processor::{SettlementProcessor, SettlementResult};

/// Receives each settle outcome
pub trait SettlementSink: Send + Sync {
    fn on_result(&self, result: &SettlementResult, correlation_id: CorrelationId);
}

/// Sink that discards results
pub struct NoopSink;

impl SettlementSink for NoopSink {
    fn on_result(&self, _result: &SettlementResult, _correlation_id: CorrelationId) {}
}

enum Job {
    Settle(Trade, CorrelationId),
    /// Queued once per worker at shutdown, behind every trade
    Stop,
}

/// Producer side of the settlement queue
#[derive(Clone)]
pub struct SettlementQueue {
    tx: mpsc::UnboundedSender<Job>,
    depth: Arc<AtomicUsize>,
}

/// Consumer side, handed to `SettlementPool::start`
pub struct SettlementIntake {
    rx: mpsc::UnboundedReceiver<Job>,
    depth: Arc<AtomicUsize>,
}

impl SettlementQueue {
    pub fn new() -> (Self, SettlementIntake) {
        let (tx, rx) = mpsc::unbounded_channel();
        let depth = Arc::new(AtomicUsize::new(0));
        (
            Self {
                tx,
                depth: Arc::clone(&depth),
            },
            SettlementIntake { rx, depth },
        )
    }

    /// Queue a trade without waiting
    ///
    /// Returns false once the pool has stopped.
    pub fn submit(&self, trade: Trade, correlation_id: CorrelationId) -> bool {
        let trade_id = trade.trade_id;
        self.depth.fetch_add(1, Ordering::Relaxed);
        if self.tx.send(Job::Settle(trade, correlation_id)).is_err() {
            self.depth.fetch_sub(1, Ordering::Relaxed);
            warn!(%trade_id, "Settlement pool stopped, trade not queued");
            return false;
        }
        true
    }

    /// Trades waiting for a worker
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::Relaxed)
    }
}

pub struct SettlementPool {
    processor: Arc<SettlementProcessor>,
    queue: SettlementQueue,
    workers: Vec<JoinHandle<()>>,
}

impl SettlementPool {
    /// Spawn `workers` tasks (at least one) on `intake`
    ///
    /// `queue` must be the producer half paired with `intake`.
    pub fn start(
        processor: Arc<SettlementProcessor>,
        workers: usize,
        queue: SettlementQueue,
        intake: SettlementIntake,
        sink: Arc<dyn SettlementSink>,
    ) -> Self {
        let SettlementIntake { rx, depth } = intake;
        let rx = Arc::new(Mutex::new(rx));

        let workers: Vec<_> = (0..workers.max(1))
            .map(|worker_id| {
                let rx = Arc::clone(&rx);
                let depth = Arc::clone(&depth);
                let processor = Arc::clone(&processor);
                let sink = Arc::clone(&sink);
                tokio::spawn(async move {
                    loop {
                        // Hold the lock only while waiting for the next job
                        let job = rx.lock().await.recv().await;
                        let Some(Job::Settle(trade, correlation_id)) = job else {
                            break;
                        };
                        depth.fetch_sub(1, Ordering::Relaxed);
                        let result = processor.settle(&trade).await;
                        sink.on_result(&result, correlation_id);
                    }
                    debug!(worker_id, "Settlement worker stopped");
                })
            })
            .collect();

        info!(workers = workers.len(), "Settlement pool started");
        Self {
            processor,
            queue,
            workers,
        }
    }

    pub fn processor(&self) -> &Arc<SettlementProcessor> {
        &self.processor
    }

    pub fn queue(&self) -> &SettlementQueue {
        &self.queue
    }

    pub fn enqueue(&self, trade: Trade, correlation_id: CorrelationId) -> bool {
        self.queue.submit(trade, correlation_id)
    }

    /// Trades waiting for a worker
    pub fn queue_depth(&self) -> usize {
        self.queue.depth()
    }

    /// Settle everything already queued, then wait for the workers
    ///
    /// Producers must have stopped submitting; a trade queued after this
    /// call is never settled.
    pub async fn shutdown(self) {
        for _ in 0..self.workers.len() {
            let _ = self.queue.tx.send(Job::Stop);
        }
        for worker in self.workers {
            if let Err(e) = worker.await {
                warn!(error = %e, "Settlement worker ended abnormally");
            }
        }
        info!(pending = self.queue.depth(), "Settlement pool stopped");
    }
}
