//! Pipeline metrics
//!
//! Counters are plain atomics. Each latency stage keeps a bounded window of
//! samples for percentiles plus a count of samples over its budget.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use settlement::SettlementStats;
use tracing::debug;
use types::order::RejectCategory;
use types::risk::BreakerState;

use crate::config::LatencyBudgets;

const LATENCY_WINDOW: usize = 4096;

/// Pipeline stages with a latency budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validation,
    Risk,
    Matching,
    EndToEnd,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Validation, Stage::Risk, Stage::Matching, Stage::EndToEnd];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Validation => "validation",
            Stage::Risk => "risk",
            Stage::Matching => "matching",
            Stage::EndToEnd => "end_to_end",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }

    pub fn budget(&self, budgets: &LatencyBudgets) -> Duration {
        let micros = match self {
            Stage::Validation => budgets.validation_us,
            Stage::Risk => budgets.risk_us,
            Stage::Matching => budgets.matching_us,
            Stage::EndToEnd => budgets.end_to_end_us,
        };
        Duration::from_micros(micros)
    }
}

/// Rolling window of latency samples in nanoseconds
#[derive(Debug)]
pub struct LatencyTracker {
    samples: VecDeque<u64>,
    max_samples: usize,
}

impl LatencyTracker {
    pub fn new(max_samples: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(max_samples),
            max_samples: max_samples.max(1),
        }
    }

    pub fn record(&mut self, value: u64) {
        if self.samples.len() >= self.max_samples {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    /// Nearest-rank percentile (0-100)
    pub fn percentile(&self, p: usize) -> Option<u64> {
        if self.samples.is_empty() {
            return None;
        }
        let mut sorted: Vec<u64> = self.samples.iter().copied().collect();
        sorted.sort_unstable();
        let rank = (p.min(100) * (sorted.len() - 1)) / 100;
        sorted.get(rank).copied()
    }

    pub fn average(&self) -> Option<u64> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: u64 = self.samples.iter().sum();
        Some(sum / self.samples.len() as u64)
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LatencySummary {
    pub samples: usize,
    pub over_budget: u64,
    pub p50_ns: Option<u64>,
    pub p99_ns: Option<u64>,
    pub avg_ns: Option<u64>,
}

/// Point-in-time view exported by the engine
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub counters: BTreeMap<String, u64>,
    pub latency: BTreeMap<Stage, LatencySummary>,
    pub queue_depths: BTreeMap<String, usize>,
    pub breaker_state: BreakerState,
    pub bus_dropped: u64,
    pub settlement: SettlementStats,
}

pub struct EngineMetrics {
    budgets: LatencyBudgets,

    pub orders_received: AtomicU64,
    pub orders_accepted: AtomicU64,
    pub rejected_validation: AtomicU64,
    pub rejected_risk: AtomicU64,
    pub rejected_matching: AtomicU64,
    pub trades_executed: AtomicU64,
    pub orders_cancelled: AtomicU64,
    pub orders_expired: AtomicU64,
    pub breaker_trips: AtomicU64,
    pub settlements_confirmed: AtomicU64,
    pub settlements_failed: AtomicU64,

    latency: [Mutex<LatencyTracker>; 4],
    over_budget: [AtomicU64; 4],
}

impl EngineMetrics {
    pub fn new(budgets: LatencyBudgets) -> Self {
        Self {
            budgets,
            orders_received: AtomicU64::new(0),
            orders_accepted: AtomicU64::new(0),
            rejected_validation: AtomicU64::new(0),
            rejected_risk: AtomicU64::new(0),
            rejected_matching: AtomicU64::new(0),
            trades_executed: AtomicU64::new(0),
            orders_cancelled: AtomicU64::new(0),
            orders_expired: AtomicU64::new(0),
            breaker_trips: AtomicU64::new(0),
            settlements_confirmed: AtomicU64::new(0),
            settlements_failed: AtomicU64::new(0),
            latency: std::array::from_fn(|_| Mutex::new(LatencyTracker::new(LATENCY_WINDOW))),
            over_budget: std::array::from_fn(|_| AtomicU64::new(0)),
        }
    }

    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejection(&self, category: RejectCategory) {
        let counter = match category {
            RejectCategory::Validation => &self.rejected_validation,
            RejectCategory::Risk => &self.rejected_risk,
            RejectCategory::Matching => &self.rejected_matching,
        };
        Self::incr(counter);
    }

    /// Record a stage latency; returns whether it exceeded the budget
    pub fn record_latency(&self, stage: Stage, elapsed: Duration) -> bool {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.latency[stage.index()].lock().record(nanos);

        let budget = stage.budget(&self.budgets);
        let exceeded = elapsed > budget;
        if exceeded {
            self.over_budget[stage.index()].fetch_add(1, Ordering::Relaxed);
            debug!(
                stage = stage.name(),
                elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
                budget_us = u64::try_from(budget.as_micros()).unwrap_or(u64::MAX),
                "Latency budget exceeded"
            );
        }
        exceeded
    }

    pub fn over_budget(&self, stage: Stage) -> u64 {
        self.over_budget[stage.index()].load(Ordering::Relaxed)
    }

    pub fn latency_summary(&self, stage: Stage) -> LatencySummary {
        let tracker = self.latency[stage.index()].lock();
        LatencySummary {
            samples: tracker.count(),
            over_budget: self.over_budget(stage),
            p50_ns: tracker.percentile(50),
            p99_ns: tracker.percentile(99),
            avg_ns: tracker.average(),
        }
    }

    /// Counters keyed by name
    pub fn export(&self) -> BTreeMap<String, u64> {
        let counters = [
            ("orders_received", &self.orders_received),
            ("orders_accepted", &self.orders_accepted),
            ("rejected_validation", &self.rejected_validation),
            ("rejected_risk", &self.rejected_risk),
            ("rejected_matching", &self.rejected_matching),
            ("trades_executed", &self.trades_executed),
            ("orders_cancelled", &self.orders_cancelled),
            ("orders_expired", &self.orders_expired),
            ("breaker_trips", &self.breaker_trips),
            ("settlements_confirmed", &self.settlements_confirmed),
            ("settlements_failed", &self.settlements_failed),
        ];
        counters
            .into_iter()
            .map(|(name, counter)| (name.to_string(), counter.load(Ordering::Relaxed)))
            .collect()
    }

    pub fn latency_summaries(&self) -> BTreeMap<Stage, LatencySummary> {
        Stage::ALL
            .into_iter()
            .map(|stage| (stage, self.latency_summary(stage)))
            .collect()
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new(LatencyBudgets::default())
    }
}
