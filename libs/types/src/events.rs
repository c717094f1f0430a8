//! Event envelope carried on the event bus
//!
//! Events are immutable once published. The correlation id is propagated
//! from the originating order request.

use crate::ids::{AccountId, CorrelationId, OrderId};
use crate::order::{Order, RejectReason};
use crate::risk::TripReason;
use crate::settlement::SettlementRecord;
use crate::trade::Trade;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type tag, used for subscription filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    OrderAccepted,
    OrderRejected,
    TradeExecuted,
    RiskViolation,
    CircuitBreakerTriggered,
    SettlementConfirmed,
    SettlementFailed,
}

/// Event payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    OrderAccepted {
        order: Order,
    },
    OrderRejected {
        order_id: Option<OrderId>,
        client_order_id: String,
        account_id: AccountId,
        reason: RejectReason,
    },
    TradeExecuted {
        trade: Trade,
    },
    RiskViolation {
        account_id: AccountId,
        order_id: Option<OrderId>,
        reason: RejectReason,
    },
    CircuitBreakerTriggered {
        reason: TripReason,
    },
    SettlementConfirmed {
        record: SettlementRecord,
    },
    SettlementFailed {
        record: SettlementRecord,
        error: String,
    },
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::OrderAccepted { .. } => EventKind::OrderAccepted,
            EventPayload::OrderRejected { .. } => EventKind::OrderRejected,
            EventPayload::TradeExecuted { .. } => EventKind::TradeExecuted,
            EventPayload::RiskViolation { .. } => EventKind::RiskViolation,
            EventPayload::CircuitBreakerTriggered { .. } => EventKind::CircuitBreakerTriggered,
            EventPayload::SettlementConfirmed { .. } => EventKind::SettlementConfirmed,
            EventPayload::SettlementFailed { .. } => EventKind::SettlementFailed,
        }
    }
}

/// Published event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: Uuid,
    pub correlation_id: CorrelationId,
    pub timestamp: i64, // Unix nanos
    pub payload: EventPayload,
}

impl Event {
    pub fn new(payload: EventPayload, correlation_id: CorrelationId, timestamp: i64) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            correlation_id,
            timestamp,
            payload,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }
}
