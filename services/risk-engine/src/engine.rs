//! Risk engine orchestrator
//!
//! Ties together account state, validation, VaR and the circuit breaker.
//! Account state is sharded in a `DashMap`, so work on one account never
//! waits on another. The breaker is engine-wide behind a short mutex.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use types::ids::{AccountId, MarketId, OrderId};
use types::numeric::Price;
use types::order::{Order, RejectReason};
use types::position::Position;
use types::risk::{BreakerState, RiskDecision, RiskLimits, TripReason};
use types::trade::Trade;

use crate::account::AccountRisk;
use crate::circuit_breaker::{CircuitBreaker, ResetOutcome};
use crate::config::RiskConfig;
use crate::error::RiskError;
use crate::events::{self, RiskEvent};
use crate::validator;
use crate::var::{self, PriceHistory};

/// Risk engine service
pub struct RiskEngine {
    config: RiskConfig,
    accounts: DashMap<AccountId, AccountRisk>,
    marks: DashMap<MarketId, PriceHistory>,
    breaker: Mutex<CircuitBreaker>,
}

impl RiskEngine {
    pub fn new(config: RiskConfig) -> Self {
        let breaker = CircuitBreaker::new(config.breaker.clone());
        Self {
            config,
            accounts: DashMap::new(),
            marks: DashMap::new(),
            breaker: Mutex::new(breaker),
        }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    // ── Administration ──

    /// Register an account against a configured tier
    pub fn register_account(&self, account_id: AccountId, tier: &str, collateral: Decimal, now: i64) -> Result<(), RiskError> {
        if collateral.is_sign_negative() {
            return Err(RiskError::NegativeCollateral {
                value: collateral.to_string(),
            });
        }
        let limits = self
            .config
            .limits_for(tier)
            .cloned()
            .ok_or_else(|| RiskError::UnknownTier { tier: tier.to_string() })?;

        match self.accounts.entry(account_id) {
            Entry::Occupied(_) => Err(RiskError::DuplicateAccount {
                account_id: account_id.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(AccountRisk::new(account_id, tier, limits, collateral, now));
                info!(%account_id, tier, %collateral, "Account registered");
                Ok(())
            }
        }
    }

    /// Replace an account's limits
    pub fn set_limits(&self, account_id: AccountId, limits: RiskLimits) -> Result<(), RiskError> {
        let mut account = self.account_mut(account_id)?;
        account.limits = limits;
        Ok(())
    }

    pub fn set_collateral(&self, account_id: AccountId, collateral: Decimal) -> Result<(), RiskError> {
        if collateral.is_sign_negative() {
            return Err(RiskError::NegativeCollateral {
                value: collateral.to_string(),
            });
        }
        let mut account = self.account_mut(account_id)?;
        account.collateral = collateral;
        Ok(())
    }

    fn account_mut(
        &self,
        account_id: AccountId,
    ) -> Result<dashmap::mapref::one::RefMut<'_, AccountId, AccountRisk>, RiskError> {
        self.accounts.get_mut(&account_id).ok_or_else(|| RiskError::UnknownAccount {
            account_id: account_id.to_string(),
        })
    }

    /// Snapshot of an account's risk state
    pub fn account(&self, account_id: &AccountId) -> Option<AccountRisk> {
        self.accounts.get(account_id).map(|a| a.clone())
    }

    pub fn position(&self, account_id: &AccountId, symbol: &MarketId) -> Option<Position> {
        self.accounts.get(account_id)?.position(symbol).cloned()
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    // ── Pre-trade ──

    /// Pre-trade check
    ///
    /// Rejections come back with a violation event, plus a breaker event
    /// if the rejection streak halted trading. A passing order reserves its
    /// quantity against the account until it fills or is released, so
    /// concurrent checks on one account see each other.
    ///
    /// The breaker guard is held for the whole check; lock order is
    /// breaker, then account.
    pub fn validate(&self, order: &Order, reference_price: Option<Price>, now: i64) -> (RiskDecision, Vec<RiskEvent>) {
        let mut breaker = self.breaker.lock();
        let decision = if breaker.is_halted() {
            RiskDecision::Reject(RejectReason::CircuitOpen)
        } else {
            match self.accounts.get_mut(&order.account_id) {
                Some(mut account) => {
                    let decision = validator::validate_order(&account, order, reference_price, now);
                    if decision.is_pass() {
                        account.reserve(order);
                    }
                    decision
                }
                None => RiskDecision::Reject(RejectReason::UnknownAccount),
            }
        };

        let mut risk_events = Vec::new();
        match decision {
            RiskDecision::Pass => breaker.record_pass(),
            RiskDecision::Reject(reason) => {
                risk_events.push(events::violation_event(order.account_id, Some(order.order_id), reason, now));
                if reason != RejectReason::CircuitOpen {
                    if let Some(trip) = breaker.record_rejection(now) {
                        risk_events.push(events::breaker_event(trip, now));
                    }
                }
            }
        }

        (decision, risk_events)
    }

    /// Drop an order's remaining reservation once it can no longer fill
    pub fn release(&self, account_id: &AccountId, order_id: &OrderId) {
        if let Some(mut account) = self.accounts.get_mut(account_id) {
            if let Some(reservation) = account.release(order_id) {
                debug!(%account_id, %order_id, quantity = %reservation.quantity, "Reservation released");
            }
        }
    }

    // ── Post-trade ──

    /// Apply both legs of a trade, then re-check loss and VaR thresholds
    pub fn apply_fill(&self, trade: &Trade) -> Vec<RiskEvent> {
        let now = trade.executed_at;
        self.record_mark(&trade.symbol, trade.price);

        let mut trips = Vec::new();
        let order_ids = [trade.taker_order_id, trade.maker_order_id];
        for ((account_id, side), order_id) in trade.legs().into_iter().zip(order_ids) {
            let Some(mut account) = self.accounts.get_mut(&account_id) else {
                warn!(%account_id, trade_id = %trade.trade_id, "Fill for unregistered account ignored");
                continue;
            };
            account.apply_order_fill(&order_id, &trade.symbol, side, trade.quantity, trade.price, now);
            trips.extend(self.breached_threshold(&account, now));
        }

        self.trip_all(trips, now)
    }

    /// Feed an external mark price into the volatility window
    pub fn record_mark(&self, symbol: &MarketId, price: Price) {
        let window = self.config.var.window;
        self.marks
            .entry(symbol.clone())
            .or_insert_with(|| PriceHistory::new(window))
            .push(price);
    }

    /// Periodic pass: re-mark every position, recompute VaR, re-check
    /// thresholds and apply any pending breaker reset
    pub fn recompute(&self, now: i64) -> Vec<RiskEvent> {
        let latest: Vec<(MarketId, Price)> = self
            .marks
            .iter()
            .filter_map(|entry| Some((entry.key().clone(), entry.value().last()?)))
            .collect();

        let mut trips = Vec::new();
        for mut account in self.accounts.iter_mut() {
            for (symbol, price) in &latest {
                account.mark(symbol, *price, now);
            }
            trips.extend(self.breached_threshold(&account, now));
        }

        let risk_events = self.trip_all(trips, now);
        self.poll(now);
        risk_events
    }

    /// First threshold an account is over, if any
    fn breached_threshold(&self, account: &AccountRisk, now: i64) -> Option<TripReason> {
        let limits = &account.limits;
        let loss = account.daily_loss(now);
        if loss > limits.max_daily_loss {
            return Some(TripReason::DailyLossLimit {
                account_id: account.account_id,
                loss,
                limit: limits.max_daily_loss,
            });
        }

        let var = self.var_of(account);
        if var > limits.var_threshold {
            return Some(TripReason::VarThreshold {
                account_id: account.account_id,
                var,
                threshold: limits.var_threshold,
            });
        }
        None
    }

    fn trip_all(&self, trips: Vec<TripReason>, now: i64) -> Vec<RiskEvent> {
        trips
            .into_iter()
            .flat_map(|reason| self.trip(reason, now))
            .collect()
    }

    fn var_of(&self, account: &AccountRisk) -> Decimal {
        var::account_var(
            account.positions(),
            |position| self.marks.get(&position.symbol)?.volatility(),
            self.config.var.confidence,
        )
    }

    /// Current parametric VaR of an account
    pub fn account_var(&self, account_id: &AccountId) -> Option<Decimal> {
        let account = self.accounts.get(account_id)?;
        Some(self.var_of(&account))
    }

    // ── Circuit breaker ──

    pub fn breaker_state(&self) -> BreakerState {
        self.breaker.lock().state()
    }

    pub fn trip_reason(&self) -> Option<TripReason> {
        self.breaker.lock().trip_reason().cloned()
    }

    /// Halt trading; empty if already halted
    pub fn trip(&self, reason: TripReason, now: i64) -> Vec<RiskEvent> {
        if self.breaker.lock().trip(reason.clone(), now) {
            vec![events::breaker_event(reason, now)]
        } else {
            Vec::new()
        }
    }

    /// Manual reset signal
    pub fn request_reset(&self, now: i64) -> ResetOutcome {
        self.breaker.lock().request_reset(now)
    }

    /// Apply a remembered reset once its cool-down has elapsed
    pub fn poll(&self, now: i64) -> ResetOutcome {
        self.breaker.lock().poll(now)
    }
}

impl Default for RiskEngine {
    fn default() -> Self {
        Self::new(RiskConfig::default())
    }
}
