//! Risk event definitions
//!
//! Events emitted by the risk engine. The orchestrator maps them onto the
//! event bus payloads.

use serde::{Deserialize, Serialize};
use types::events::EventPayload;
use types::ids::{AccountId, OrderId};
use types::order::RejectReason;
use types::risk::TripReason;
use uuid::Uuid;

/// Risk event emitted by the risk engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskEvent {
    pub event_id: Uuid,
    pub event_type: RiskEventType,
    pub timestamp: i64,
}

/// Risk event type classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RiskEventType {
    /// Pre-trade check rejected an order
    Violation {
        account_id: AccountId,
        order_id: Option<OrderId>,
        reason: RejectReason,
    },
    /// Trading halted
    CircuitBreakerTriggered { reason: TripReason },
}

impl RiskEvent {
    pub fn new(event_type: RiskEventType, timestamp: i64) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            event_type,
            timestamp,
        }
    }

    /// Bus payload for this event
    pub fn to_payload(&self) -> EventPayload {
        match &self.event_type {
            RiskEventType::Violation {
                account_id,
                order_id,
                reason,
            } => EventPayload::RiskViolation {
                account_id: *account_id,
                order_id: *order_id,
                reason: *reason,
            },
            RiskEventType::CircuitBreakerTriggered { reason } => EventPayload::CircuitBreakerTriggered {
                reason: reason.clone(),
            },
        }
    }
}

/// Create a violation event for a rejected order.
pub fn violation_event(account_id: AccountId, order_id: Option<OrderId>, reason: RejectReason, timestamp: i64) -> RiskEvent {
    RiskEvent::new(
        RiskEventType::Violation {
            account_id,
            order_id,
            reason,
        },
        timestamp,
    )
}

/// Create a breaker event.
pub fn breaker_event(reason: TripReason, timestamp: i64) -> RiskEvent {
    RiskEvent::new(RiskEventType::CircuitBreakerTriggered { reason }, timestamp)
}
