//! Post-match and post-settlement hooks
//!
//! `Pipeline` runs on the symbol workers (as their `ExecutionListener`) and
//! on the settlement workers (as their `SettlementSink`). Per symbol it sees
//! outcomes in generation order, so the events it publishes for one symbol
//! are never reordered. Trades reach settlement through its own queue, not
//! the bus, so a slow bus subscriber cannot lose a fill.

use std::sync::Arc;

use event_bus::EventBus;
use matching_engine::{ExecutionListener, ExecutionReport, SubmitOutcome};
use risk_engine::{RiskEngine, RiskEvent, RiskEventType};
use settlement::{SettlementQueue, SettlementResult, SettlementSink};
use tracing::{debug, warn};
use types::events::{Event, EventPayload};
use types::ids::CorrelationId;
use types::order::{Order, OrderStatus};
use types::time::now_nanos;

use crate::metrics::EngineMetrics;
use crate::repository::RepositoryHandle;

pub struct Pipeline {
    risk: Arc<RiskEngine>,
    bus: Arc<EventBus>,
    repository: RepositoryHandle,
    settlement: SettlementQueue,
    metrics: Arc<EngineMetrics>,
}

impl Pipeline {
    pub fn new(
        risk: Arc<RiskEngine>,
        bus: Arc<EventBus>,
        repository: RepositoryHandle,
        settlement: SettlementQueue,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            risk,
            bus,
            repository,
            settlement,
            metrics,
        }
    }

    pub fn publish(&self, payload: EventPayload, correlation_id: CorrelationId, timestamp: i64) {
        self.bus.publish(Event::new(payload, correlation_id, timestamp));
    }

    pub fn publish_risk_events(&self, risk_events: &[RiskEvent], correlation_id: CorrelationId) {
        for risk_event in risk_events {
            if matches!(risk_event.event_type, RiskEventType::CircuitBreakerTriggered { .. }) {
                EngineMetrics::incr(&self.metrics.breaker_trips);
            }
            self.publish(risk_event.to_payload(), correlation_id, risk_event.timestamp);
        }
    }

    /// Publish an `OrderRejected` for an order that has one
    pub fn publish_rejection(&self, order: &Order) {
        if let OrderStatus::Rejected(reason) = order.status {
            self.metrics.record_rejection(reason.category());
            self.publish(
                EventPayload::OrderRejected {
                    order_id: Some(order.order_id),
                    client_order_id: order.client_order_id.as_str().to_string(),
                    account_id: order.account_id,
                    reason,
                },
                order.correlation_id,
                order.updated_at,
            );
        }
    }

    pub fn repository(&self) -> &RepositoryHandle {
        &self.repository
    }

    fn apply_report(&self, report: &ExecutionReport) {
        let correlation_id = report.order.correlation_id;
        for trade in &report.trades {
            EngineMetrics::incr(&self.metrics.trades_executed);
            // Positions move before anyone hears about the trade
            let risk_events = self.risk.apply_fill(trade);
            self.publish(
                EventPayload::TradeExecuted { trade: trade.clone() },
                correlation_id,
                trade.executed_at,
            );
            self.publish_risk_events(&risk_events, correlation_id);
            self.repository.save_trade(trade);
            self.settlement.submit(trade.clone(), correlation_id);
        }

        self.publish_rejection(&report.order);
        self.release_if_done(&report.order);
        self.repository.save_order(&report.order);
        for maker in &report.makers {
            self.release_if_done(maker);
            self.repository.save_order(maker);
        }
    }

    /// An order that can no longer fill stops holding position headroom
    pub fn release_if_done(&self, order: &Order) {
        if order.status.is_terminal() {
            self.risk.release(&order.account_id, &order.order_id);
        }
    }

    fn record_expired(&self, orders: &[Order]) {
        for order in orders {
            EngineMetrics::incr(&self.metrics.orders_expired);
            self.release_if_done(order);
            self.repository.save_order(order);
        }
    }
}

impl ExecutionListener for Pipeline {
    fn on_submit(&self, outcome: &SubmitOutcome) {
        let order = &outcome.report.order;
        if !matches!(order.status, OrderStatus::Rejected(_)) {
            EngineMetrics::incr(&self.metrics.orders_accepted);
            self.publish(
                EventPayload::OrderAccepted { order: order.clone() },
                order.correlation_id,
                order.updated_at,
            );
        }

        for report in outcome.reports() {
            self.apply_report(report);
        }
        self.record_expired(&outcome.expired);
    }

    fn on_cancel(&self, order: &Order) {
        EngineMetrics::incr(&self.metrics.orders_cancelled);
        self.release_if_done(order);
        self.repository.save_order(order);
    }

    fn on_expired(&self, orders: &[Order]) {
        debug!(count = orders.len(), "Expired resting orders");
        self.record_expired(orders);
    }
}

impl SettlementSink for Pipeline {
    fn on_result(&self, result: &SettlementResult, correlation_id: CorrelationId) {
        match result {
            SettlementResult::Confirmed(record) => {
                EngineMetrics::incr(&self.metrics.settlements_confirmed);
                self.publish(
                    EventPayload::SettlementConfirmed { record: record.clone() },
                    correlation_id,
                    record.confirmed_at.unwrap_or_else(now_nanos),
                );
                self.repository.save_settlement(record);
            }
            SettlementResult::Failed { record, error } => {
                EngineMetrics::incr(&self.metrics.settlements_failed);
                warn!(trade_id = %record.trade_id, error = %error, "Publishing settlement failure");
                self.publish(
                    EventPayload::SettlementFailed {
                        record: record.clone(),
                        error: error.to_string(),
                    },
                    correlation_id,
                    now_nanos(),
                );
                self.repository.save_settlement(record);
            }
            SettlementResult::Existing(record) => {
                debug!(trade_id = %record.trade_id, status = ?record.status, "Trade already settled");
            }
        }
    }
}
