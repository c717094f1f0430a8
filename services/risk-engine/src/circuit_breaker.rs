//! Engine-wide circuit breaker
//!
//! ```text
//! Normal ──trip──▶ Halted ──reset signal + cool-down──▶ Normal
//! ```
//!
//! There is no automatic reset. Under `ManualAfterCooldown` a reset signal
//! that arrives before the cool-down has elapsed is remembered and applied
//! by the next `poll` once it has.

use std::collections::VecDeque;

use tracing::{info, warn};
use types::risk::{BreakerState, TripReason};

use crate::config::{BreakerConfig, ResetPolicy};

/// Result of a reset signal or poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    /// Back to `Normal`
    Reset,
    /// Still halted, waiting on a reset signal or the cool-down
    Pending { remaining_nanos: i64 },
    NotHalted,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    config: BreakerConfig,
    state: BreakerState,
    tripped_at: Option<i64>,
    trip_reason: Option<TripReason>,
    reset_requested: bool,
    /// Timestamps of the current rejection streak
    rejections: VecDeque<i64>,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            state: BreakerState::Normal,
            tripped_at: None,
            trip_reason: None,
            reset_requested: false,
            rejections: VecDeque::new(),
        }
    }

    pub fn state(&self) -> BreakerState {
        self.state
    }

    pub fn is_halted(&self) -> bool {
        self.state == BreakerState::Halted
    }

    pub fn trip_reason(&self) -> Option<&TripReason> {
        self.trip_reason.as_ref()
    }

    pub fn tripped_at(&self) -> Option<i64> {
        self.tripped_at
    }

    /// Halt trading; returns false if already halted
    pub fn trip(&mut self, reason: TripReason, now: i64) -> bool {
        if self.is_halted() {
            return false;
        }
        warn!(reason = reason.code(), ?reason, "Circuit breaker tripped");
        self.state = BreakerState::Halted;
        self.tripped_at = Some(now);
        self.trip_reason = Some(reason);
        self.reset_requested = false;
        self.rejections.clear();
        true
    }

    /// Count a risk rejection; trips once the streak reaches the limit
    /// inside the sliding window
    pub fn record_rejection(&mut self, now: i64) -> Option<TripReason> {
        if self.is_halted() || self.config.max_consecutive_rejections == 0 {
            return None;
        }
        let window_start = now.saturating_sub(self.config.rejection_window_nanos());
        while self.rejections.front().is_some_and(|t| *t < window_start) {
            self.rejections.pop_front();
        }
        self.rejections.push_back(now);

        let count = u32::try_from(self.rejections.len()).unwrap_or(u32::MAX);
        if count < self.config.max_consecutive_rejections {
            return None;
        }
        let reason = TripReason::ConsecutiveRejections { count };
        self.trip(reason.clone(), now).then_some(reason)
    }

    /// A passing check breaks the rejection streak
    pub fn record_pass(&mut self) {
        self.rejections.clear();
    }

    /// Manual reset signal
    pub fn request_reset(&mut self, now: i64) -> ResetOutcome {
        if !self.is_halted() {
            return ResetOutcome::NotHalted;
        }
        self.reset_requested = true;
        let outcome = self.poll(now);
        if let ResetOutcome::Pending { remaining_nanos } = outcome {
            warn!(remaining_nanos, "Reset requested during cool-down; will apply once it elapses");
        }
        outcome
    }

    /// Apply a remembered reset signal if its cool-down has elapsed
    pub fn poll(&mut self, now: i64) -> ResetOutcome {
        if !self.is_halted() {
            return ResetOutcome::NotHalted;
        }
        let remaining_nanos = match self.config.reset_policy {
            ResetPolicy::ManualOnly => 0,
            ResetPolicy::ManualAfterCooldown => {
                let tripped_at = self.tripped_at.unwrap_or(now);
                let elapsed = now.saturating_sub(tripped_at);
                self.config.cooldown_nanos().saturating_sub(elapsed).max(0)
            }
        };

        if !self.reset_requested || remaining_nanos > 0 {
            return ResetOutcome::Pending { remaining_nanos };
        }

        info!(reason = ?self.trip_reason, "Circuit breaker reset");
        self.state = BreakerState::Normal;
        self.tripped_at = None;
        self.trip_reason = None;
        self.reset_requested = false;
        ResetOutcome::Reset
    }
}
