//! Per-symbol worker
//!
//! Each symbol's `SymbolEngine` is owned by one tokio task. Requests reach
//! it through a bounded queue and are answered over oneshot channels, so
//! everything for a symbol is applied in queue order. A full queue is
//! reported to the caller immediately instead of buffering.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use types::ids::{MarketId, OrderId};
use types::numeric::Quantity;
use types::order::{Order, Side};

use crate::book::DepthSnapshot;
use crate::engine::{CancelOutcome, MatchingConfig, SubmitOutcome, SymbolEngine};
use crate::error::RouterError;
use crate::matching::ImpactEstimate;

/// Hook run by the worker after each state change, before replying
///
/// Runs on the symbol's task in generation order, so anything it publishes
/// for one symbol is never reordered.
pub trait ExecutionListener: Send + Sync {
    fn on_submit(&self, outcome: &SubmitOutcome);

    fn on_cancel(&self, _order: &Order) {}

    fn on_expired(&self, _orders: &[Order]) {}
}

/// Listener that ignores everything
pub struct NoopListener;

impl ExecutionListener for NoopListener {
    fn on_submit(&self, _outcome: &SubmitOutcome) {}
}

/// Commands served by a symbol worker
pub enum Command {
    Submit {
        order: Order,
        now: i64,
        reply: oneshot::Sender<SubmitOutcome>,
    },
    Cancel {
        order_id: OrderId,
        now: i64,
        reply: oneshot::Sender<CancelOutcome>,
    },
    Depth {
        levels: usize,
        reply: oneshot::Sender<DepthSnapshot>,
    },
    Impact {
        side: Side,
        quantity: Quantity,
        reply: oneshot::Sender<ImpactEstimate>,
    },
    Expire {
        now: i64,
        reply: oneshot::Sender<Vec<Order>>,
    },
}

struct SymbolWorker {
    engine: SymbolEngine,
    rx: mpsc::Receiver<Command>,
    listener: Arc<dyn ExecutionListener>,
}

impl SymbolWorker {
    async fn run(mut self) {
        info!(symbol = %self.engine.symbol(), "Symbol worker started");
        while let Some(command) = self.rx.recv().await {
            self.handle(command);
        }
        info!(symbol = %self.engine.symbol(), "Symbol worker stopped");
    }

    fn handle(&mut self, command: Command) {
        // A dropped reply receiver means the caller gave up; the state
        // change still stands.
        match command {
            Command::Submit { order, now, reply } => {
                let outcome = self.engine.submit(order, now);
                self.listener.on_submit(&outcome);
                let _ = reply.send(outcome);
            }
            Command::Cancel { order_id, now, reply } => {
                let outcome = self.engine.cancel(&order_id, now);
                if let CancelOutcome::Cancelled(order) = &outcome {
                    self.listener.on_cancel(order);
                }
                let _ = reply.send(outcome);
            }
            Command::Depth { levels, reply } => {
                let _ = reply.send(self.engine.depth(levels));
            }
            Command::Impact { side, quantity, reply } => {
                let _ = reply.send(self.engine.estimate_impact(side, quantity));
            }
            Command::Expire { now, reply } => {
                let expired = self.engine.expire(now);
                if !expired.is_empty() {
                    self.listener.on_expired(&expired);
                }
                let _ = reply.send(expired);
            }
        }
    }
}

/// Cloneable handle to a running symbol worker
#[derive(Clone)]
pub struct SymbolHandle {
    symbol: MarketId,
    tx: mpsc::Sender<Command>,
}

impl SymbolHandle {
    /// Spawn a worker owning a fresh book for `symbol`
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        symbol: MarketId,
        config: &MatchingConfig,
        listener: Arc<dyn ExecutionListener>,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let worker = SymbolWorker {
            engine: SymbolEngine::new(symbol.clone(), config),
            rx,
            listener,
        };
        let task = tokio::spawn(worker.run());
        (Self { symbol, tx }, task)
    }

    pub fn symbol(&self) -> &MarketId {
        &self.symbol
    }

    /// Commands waiting in the inbound queue
    pub fn queue_depth(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T, RouterError> {
        let (reply, rx) = oneshot::channel();
        self.tx.try_send(command(reply)).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => {
                debug!(symbol = %self.symbol, "Symbol queue full");
                RouterError::Overloaded {
                    symbol: self.symbol.to_string(),
                }
            }
            mpsc::error::TrySendError::Closed(_) => RouterError::Unavailable {
                symbol: self.symbol.to_string(),
            },
        })?;
        rx.await.map_err(|_| RouterError::Unavailable {
            symbol: self.symbol.to_string(),
        })
    }

    pub async fn submit(&self, order: Order, now: i64) -> Result<SubmitOutcome, RouterError> {
        self.request(|reply| Command::Submit { order, now, reply }).await
    }

    pub async fn cancel(&self, order_id: OrderId, now: i64) -> Result<CancelOutcome, RouterError> {
        self.request(|reply| Command::Cancel { order_id, now, reply }).await
    }

    pub async fn depth(&self, levels: usize) -> Result<DepthSnapshot, RouterError> {
        self.request(|reply| Command::Depth { levels, reply }).await
    }

    pub async fn estimate_impact(&self, side: Side, quantity: Quantity) -> Result<ImpactEstimate, RouterError> {
        self.request(|reply| Command::Impact { side, quantity, reply }).await
    }

    pub async fn expire(&self, now: i64) -> Result<Vec<Order>, RouterError> {
        self.request(|reply| Command::Expire { now, reply }).await
    }
}
