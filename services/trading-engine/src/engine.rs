//! Trading engine orchestrator
//!
//! Wires the pipeline: request validation, pre-trade risk, the symbol
//! workers, post-trade risk, event publication, settlement and the
//! repository writer. Validation and risk rejections come back
//! synchronously; everything after matching also surfaces on the bus.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use event_bus::{EventBus, Subscription};
use matching_engine::{CancelOutcome, DepthSnapshot, ImpactEstimate, MatchingRouter, RouterError, SymbolHandle};
use risk_engine::{ResetOutcome, RiskEngine};
use rust_decimal::Decimal;
use settlement::{LoopbackGateway, SettlementGateway, SettlementPool, SettlementProcessor, SettlementQueue};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use types::errors::ValidationError;
use types::events::{EventKind, EventPayload};
use types::ids::{AccountId, CorrelationId, MarketId, OrderId, TradeId};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderType, RejectReason, Side};
use types::request::{OrderRequest, OrderResponse};
use types::risk::{BreakerState, RiskDecision, TripReason};
use types::settlement::SettlementRecord;
use types::time::now_nanos;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::metrics::{EngineMetrics, MetricsSnapshot, Stage};
use crate::pipeline::Pipeline;
use crate::repository::{InMemoryRepository, Repository, RepositoryWriter};

pub struct TradingEngine {
    config: EngineConfig,
    router: MatchingRouter,
    risk: Arc<RiskEngine>,
    bus: Arc<EventBus>,
    pipeline: Arc<Pipeline>,
    settlement: SettlementPool,
    writer: RepositoryWriter,
    metrics: Arc<EngineMetrics>,
    maintenance: JoinHandle<()>,
}

impl TradingEngine {
    /// Start with a loopback settlement gateway and an in-memory repository
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: EngineConfig) -> Result<Self, EngineError> {
        Self::start_with(config, Arc::new(LoopbackGateway), Arc::new(InMemoryRepository::new()))
    }

    pub fn start_with(
        config: EngineConfig,
        gateway: Arc<dyn SettlementGateway>,
        repository: Arc<dyn Repository>,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let bus = Arc::new(EventBus::new());
        let metrics = Arc::new(EngineMetrics::new(config.latency.clone()));
        let risk = Arc::new(RiskEngine::new(config.risk.clone()));
        let now = now_nanos();
        for account in &config.accounts {
            risk.register_account(account.account_id, &account.tier, account.collateral, now)?;
        }

        let writer = RepositoryWriter::start(repository, config.repository.queue_capacity);
        let (settlement_queue, settlement_intake) = SettlementQueue::new();
        let pipeline = Arc::new(Pipeline::new(
            Arc::clone(&risk),
            Arc::clone(&bus),
            writer.handle(),
            settlement_queue.clone(),
            Arc::clone(&metrics),
        ));

        let processor = Arc::new(SettlementProcessor::new(
            gateway,
            config.fees,
            config.settlement.rate_table(),
            config.settlement.retry.clone(),
        ));
        let settlement = SettlementPool::start(
            processor,
            config.settlement.workers,
            settlement_queue,
            settlement_intake,
            pipeline.clone(),
        );

        let router = MatchingRouter::start(config.markets(), &config.matching_config(), pipeline.clone());
        let handles: Vec<SymbolHandle> = router
            .symbols()
            .iter()
            .filter_map(|symbol| router.handle(symbol.as_str()).ok().cloned())
            .collect();
        let maintenance = spawn_maintenance(
            handles,
            Arc::clone(&risk),
            Arc::clone(&pipeline),
            config.maintenance_interval(),
        );

        info!(
            symbols = config.symbols.len(),
            accounts = config.accounts.len(),
            settlement_workers = config.settlement.workers,
            "Trading engine started"
        );
        Ok(Self {
            config,
            router,
            risk,
            bus,
            pipeline,
            settlement,
            writer,
            metrics,
            maintenance,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The event bus, for external subscribers
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Subscribe to `kinds` (every kind when empty) with the configured
    /// capacity; a full subscription drops and counts
    pub fn subscribe(&self, name: &str, kinds: &[EventKind]) -> Subscription {
        let capacity = self.config.bus.subscriber_capacity;
        if kinds.is_empty() {
            self.bus.subscribe(name, capacity)
        } else {
            self.bus.subscribe_filtered(name, capacity, kinds)
        }
    }

    pub fn risk(&self) -> &RiskEngine {
        &self.risk
    }

    pub fn symbols(&self) -> Vec<MarketId> {
        self.router.symbols()
    }

    // ── Orders ──

    /// Run one request through validation, risk and matching
    pub async fn submit_order(&self, request: OrderRequest) -> OrderResponse {
        let started = Instant::now();
        EngineMetrics::incr(&self.metrics.orders_received);
        let now = now_nanos();

        let client_order_id = request.client_order_id.clone();
        let account_id = request.account_id;
        let order = match request.into_order(now) {
            Ok(order) => order,
            Err(e) => return self.reject_invalid(client_order_id, account_id, &e, now),
        };
        let handle = match self.router.handle(order.symbol.as_str()) {
            Ok(handle) => handle,
            Err(_) => {
                let e = ValidationError::UnknownSymbol {
                    symbol: order.symbol.to_string(),
                };
                return self.reject_invalid(client_order_id, account_id, &e, now);
            }
        };
        self.metrics.record_latency(Stage::Validation, started.elapsed());

        // Market and stop orders have no price of their own to size risk with
        let reference_price = match order.order_type {
            OrderType::Market | OrderType::Stop { .. } => handle
                .estimate_impact(order.side, order.remaining_quantity)
                .await
                .ok()
                .and_then(|estimate| estimate.average_price),
            OrderType::Limit { .. } | OrderType::StopLimit { .. } => None,
        };

        let risk_started = Instant::now();
        let (decision, risk_events) = self.risk.validate(&order, reference_price, now);
        self.metrics.record_latency(Stage::Risk, risk_started.elapsed());
        self.pipeline.publish_risk_events(&risk_events, order.correlation_id);
        if let RiskDecision::Reject(reason) = decision {
            return self.reject_order(order, reason, now, started);
        }
        // From here the order holds a reservation until it ends

        let matching_started = Instant::now();
        let result = handle.submit(order.clone(), now).await;
        self.metrics.record_latency(Stage::Matching, matching_started.elapsed());

        let response = match result {
            Ok(outcome) => {
                let mut response = OrderResponse::from_order(&outcome.report.order, outcome.report.trades.clone());
                response.triggered = outcome
                    .triggered
                    .iter()
                    .map(|report| OrderResponse::from_order(&report.order, report.trades.clone()))
                    .collect();
                response
            }
            Err(RouterError::Overloaded { symbol }) => {
                warn!(%symbol, order_id = %order.order_id, "Symbol queue full, rejecting order");
                return self.reject_order(order, RejectReason::SystemOverloaded, now, started);
            }
            Err(e) => {
                error!(error = %e, order_id = %order.order_id, "Matching unavailable");
                let risk_events = self.risk.trip(TripReason::SystemFault { message: e.to_string() }, now);
                self.pipeline.publish_risk_events(&risk_events, order.correlation_id);
                return self.reject_order(order, RejectReason::InternalError, now, started);
            }
        };

        self.metrics.record_latency(Stage::EndToEnd, started.elapsed());
        response
    }

    /// Cancel a resting order; allowed while the breaker is halted
    pub async fn cancel_order(&self, symbol: &str, order_id: OrderId) -> Result<CancelOutcome, EngineError> {
        let outcome = self.router.handle(symbol)?.cancel(order_id, now_nanos()).await?;
        debug!(%symbol, %order_id, found = matches!(outcome, CancelOutcome::Cancelled(_)), "Cancel processed");
        Ok(outcome)
    }

    /// A request that never became a tradable order
    fn reject_invalid(
        &self,
        client_order_id: String,
        account_id: AccountId,
        error: &ValidationError,
        now: i64,
    ) -> OrderResponse {
        debug!(%client_order_id, error = %error, "Order request invalid");
        let reason = error.reject_reason();
        self.metrics.record_rejection(reason.category());
        self.pipeline.publish(
            EventPayload::OrderRejected {
                order_id: None,
                client_order_id: client_order_id.clone(),
                account_id,
                reason,
            },
            CorrelationId::new(),
            now,
        );
        OrderResponse::invalid(client_order_id, error)
    }

    /// Reject a validated order before it reached the book
    fn reject_order(&self, mut order: Order, reason: RejectReason, now: i64, started: Instant) -> OrderResponse {
        if let Err(e) = order.reject(reason, now) {
            error!(order_id = %order.order_id, error = %e, "Reject transition refused, forcing");
            order.force_reject(now);
        }
        debug!(order_id = %order.order_id, reason = reason.code(), "Order rejected");
        self.pipeline.publish_rejection(&order);
        self.pipeline.release_if_done(&order);
        self.pipeline.repository().save_order(&order);
        self.metrics.record_latency(Stage::EndToEnd, started.elapsed());
        OrderResponse::from_order(&order, Vec::new())
    }

    // ── Queries ──

    pub async fn depth(&self, symbol: &str, levels: usize) -> Result<DepthSnapshot, EngineError> {
        Ok(self.router.handle(symbol)?.depth(levels).await?)
    }

    pub async fn estimate_impact(&self, symbol: &str, side: Side, quantity: Quantity) -> Result<ImpactEstimate, EngineError> {
        Ok(self.router.handle(symbol)?.estimate_impact(side, quantity).await?)
    }

    pub fn settlement_record(&self, trade_id: &TradeId) -> Option<SettlementRecord> {
        self.settlement.processor().record(trade_id)
    }

    // ── Risk administration ──

    pub fn register_account(&self, account_id: AccountId, tier: &str, collateral: Decimal) -> Result<(), EngineError> {
        self.risk.register_account(account_id, tier, collateral, now_nanos())?;
        Ok(())
    }

    /// Feed an external mark price to the risk engine
    pub fn record_mark(&self, symbol: &MarketId, price: Price) {
        self.risk.record_mark(symbol, price);
    }

    pub fn breaker_state(&self) -> BreakerState {
        self.risk.breaker_state()
    }

    /// Manual reset signal for the circuit breaker
    ///
    /// Under a cool-down policy an early signal is remembered and applied by
    /// a later maintenance pass.
    pub fn reset_circuit_breaker(&self) -> ResetOutcome {
        self.risk.request_reset(now_nanos())
    }

    /// One maintenance pass: GTD sweep, VaR recompute, breaker poll
    pub async fn run_maintenance(&self, now: i64) {
        let handles: Vec<&SymbolHandle> = self
            .router
            .symbols()
            .iter()
            .filter_map(|symbol| self.router.handle(symbol.as_str()).ok())
            .collect();
        maintenance_pass(handles, &self.risk, &self.pipeline, now).await;
    }

    // ── Metrics ──

    pub fn metrics(&self) -> MetricsSnapshot {
        let repository = self.pipeline.repository();
        let mut counters = self.metrics.export();
        counters.insert("repository_dropped".to_string(), repository.dropped());

        let mut queue_depths: BTreeMap<String, usize> = self
            .router
            .queue_depths()
            .into_iter()
            .map(|(symbol, depth)| (format!("matching:{symbol}"), depth))
            .collect();
        queue_depths.insert("settlement".to_string(), self.settlement.queue_depth());
        queue_depths.insert("repository".to_string(), repository.queue_depth());

        MetricsSnapshot {
            counters,
            latency: self.metrics.latency_summaries(),
            queue_depths,
            breaker_state: self.risk.breaker_state(),
            bus_dropped: self.bus.dropped_total(),
            settlement: self.settlement.processor().stats(),
        }
    }

    /// Stop accepting work and drain every queue
    ///
    /// Symbol workers finish first so every trade is published, then the
    /// settlement pool drains, then the repository writer.
    pub async fn shutdown(self) {
        let Self {
            router,
            pipeline,
            settlement,
            writer,
            maintenance,
            ..
        } = self;

        maintenance.abort();
        let _ = maintenance.await;
        router.shutdown().await;
        settlement.shutdown().await;
        drop(pipeline);
        writer.shutdown().await;
        info!("Trading engine stopped");
    }
}

fn spawn_maintenance(
    handles: Vec<SymbolHandle>,
    risk: Arc<RiskEngine>,
    pipeline: Arc<Pipeline>,
    interval: std::time::Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            maintenance_pass(handles.iter().collect(), &risk, &pipeline, now_nanos()).await;
        }
    })
}

async fn maintenance_pass(handles: Vec<&SymbolHandle>, risk: &RiskEngine, pipeline: &Pipeline, now: i64) {
    for handle in handles {
        // Expired orders reach the pipeline through the worker's listener
        if let Err(e) = handle.expire(now).await {
            warn!(symbol = %handle.symbol(), error = %e, "GTD sweep skipped");
        }
    }
    let risk_events = risk.recompute(now);
    pipeline.publish_risk_events(&risk_events, CorrelationId::new());
}
