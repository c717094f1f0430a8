//! Matching engine core
//!
//! `SymbolEngine` owns one symbol's order book, stop book and trade
//! sequence. It is single-threaded; the worker in `worker.rs` serializes
//! access to it.

use tracing::{debug, error, info};
use types::ids::{MarketId, OrderId};
use types::numeric::{Price, Quantity};
use types::order::{CancelReason, Order, OrderStatus, OrderType, RejectReason, Side, TimeInForce};
use types::trade::Trade;

use crate::book::{DepthSnapshot, OrderBook};
use crate::error::MatchError;
use crate::matching::{self, stops, Fills, ImpactEstimate, MatchExecutor, StopBook};

/// Result of processing one order through the book
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    /// Final state of the incoming order
    pub order: Order,
    pub trades: Vec<Trade>,
    /// Resting orders touched by this order, after their fills
    pub makers: Vec<Order>,
}

impl ExecutionReport {
    fn new(order: Order, fills: Fills) -> (Self, Vec<Order>) {
        (
            Self {
                order,
                trades: fills.trades,
                makers: fills.makers,
            },
            fills.expired,
        )
    }
}

/// Result of a submit
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub report: ExecutionReport,
    /// Stops released by this order's trades, in generation order
    pub triggered: Vec<ExecutionReport>,
    /// Makers found expired while matching
    pub expired: Vec<Order>,
}

impl SubmitOutcome {
    fn unmatched(order: Order) -> Self {
        Self {
            report: ExecutionReport {
                order,
                trades: Vec::new(),
                makers: Vec::new(),
            },
            triggered: Vec::new(),
            expired: Vec::new(),
        }
    }

    /// Every report, submitted order first
    pub fn reports(&self) -> impl Iterator<Item = &ExecutionReport> {
        std::iter::once(&self.report).chain(self.triggered.iter())
    }

    /// Every trade in generation order
    pub fn trades(&self) -> impl Iterator<Item = &Trade> {
        self.reports().flat_map(|r| r.trades.iter())
    }
}

/// Result of a cancel
#[derive(Debug, Clone, PartialEq)]
pub enum CancelOutcome {
    Cancelled(Order),
    /// Unknown or already terminal; nothing changed
    NotFound,
}

/// Matching engine configuration
#[derive(Debug, Clone)]
pub struct MatchingConfig {
    /// Bounded inbound queue per symbol
    pub queue_capacity: usize,
    /// First trade sequence number
    pub starting_sequence: u64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 4096,
            starting_sequence: 1,
        }
    }
}

/// Single-symbol matching engine
pub struct SymbolEngine {
    book: OrderBook,
    stops: StopBook,
    /// Trade executor with sequence generation
    executor: MatchExecutor,
    last_trade_price: Option<Price>,
}

impl SymbolEngine {
    pub fn new(symbol: MarketId, config: &MatchingConfig) -> Self {
        Self {
            book: OrderBook::new(symbol),
            stops: StopBook::new(),
            executor: MatchExecutor::new(config.starting_sequence),
            last_trade_price: None,
        }
    }

    pub fn symbol(&self) -> &MarketId {
        self.book.symbol()
    }

    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    pub fn last_trade_price(&self) -> Option<Price> {
        self.last_trade_price
    }

    pub fn parked_stops(&self) -> usize {
        self.stops.len()
    }

    /// Submit a validated order
    ///
    /// This is the main entry point. The order is matched against the book
    /// and any stops its trades release are processed before returning.
    pub fn submit(&mut self, mut order: Order, now: i64) -> SubmitOutcome {
        if order.status != OrderStatus::Validated {
            let err = MatchError::NotValidated {
                order_id: order.order_id.to_string(),
                status: order.status.label().to_string(),
            };
            self.fail(&mut order, &err, now);
            return SubmitOutcome::unmatched(order);
        }

        order.sequence = self.book.next_sequence();

        if order.time_in_force.is_expired(now) {
            if let Err(err) = order.reject(RejectReason::ExpiredOnArrival, now) {
                self.fail(&mut order, &MatchError::from(err), now);
            }
            return SubmitOutcome::unmatched(order);
        }

        let mut expired = Vec::new();
        let report = match order.order_type {
            OrderType::Stop { stop_price } | OrderType::StopLimit { stop_price, .. }
                if !self.stop_fires_now(order.side, stop_price) =>
            {
                self.park_stop(order, now)
            }
            OrderType::Stop { .. } | OrderType::StopLimit { .. } => {
                order.order_type = order.order_type.triggered();
                let (report, lapsed) = self.execute(order, now);
                expired.extend(lapsed);
                report
            }
            OrderType::Market | OrderType::Limit { .. } => {
                let (report, lapsed) = self.execute(order, now);
                expired.extend(lapsed);
                report
            }
        };

        let triggered = self.release_stops(&report, now, &mut expired);

        SubmitOutcome {
            report,
            triggered,
            expired,
        }
    }

    fn stop_fires_now(&self, side: Side, stop_price: Price) -> bool {
        self.last_trade_price
            .is_some_and(|last| stops::is_triggered(side, stop_price, last))
    }

    fn park_stop(&mut self, mut order: Order, now: i64) -> ExecutionReport {
        match order.transition(OrderStatus::Resting, now) {
            Ok(()) => {
                debug!(order_id = %order.order_id, symbol = %order.symbol, "Parked stop order");
                self.stops.park(order.clone());
            }
            Err(err) => self.fail(&mut order, &MatchError::from(err), now),
        }
        ExecutionReport {
            order,
            trades: Vec::new(),
            makers: Vec::new(),
        }
    }

    /// Run any stops released by `report`'s trades, and by theirs
    fn release_stops(&mut self, report: &ExecutionReport, now: i64, expired: &mut Vec<Order>) -> Vec<ExecutionReport> {
        let mut triggered = Vec::new();
        let mut last = report.trades.last().map(|t| t.price);

        while let Some(price) = last.take() {
            for mut stop in self.stops.take_triggered(price) {
                info!(
                    order_id = %stop.order_id,
                    symbol = %stop.symbol,
                    last_price = %price,
                    "Stop order triggered"
                );
                stop.order_type = stop.order_type.triggered();
                stop.sequence = self.book.next_sequence();
                let (report, lapsed) = self.execute(stop, now);
                expired.extend(lapsed);
                if let Some(trade) = report.trades.last() {
                    last = Some(trade.price);
                }
                triggered.push(report);
            }
        }

        triggered
    }

    /// Match an active (non-parked) order and settle its remainder
    fn execute(&mut self, mut order: Order, now: i64) -> (ExecutionReport, Vec<Order>) {
        let mut fills = Fills::default();

        if order.time_in_force == TimeInForce::FOK {
            let reachable = matching::available_liquidity(&self.book, order.side, order.limit_price(), now);
            if reachable < order.remaining_quantity {
                debug!(order_id = %order.order_id, %reachable, "FOK order cannot fill in full");
                self.finish(&mut order, Finish::Reject(RejectReason::FokUnfillable), now);
                return ExecutionReport::new(order, fills);
            }
        }

        if let Err(err) = matching::sweep(&mut self.book, &mut self.executor, &mut order, now, &mut fills) {
            self.fail(&mut order, &err, now);
            if let Some(price) = fills.last_price() {
                self.last_trade_price = Some(price);
            }
            return ExecutionReport::new(order, fills);
        }

        if let Some(price) = fills.last_price() {
            self.last_trade_price = Some(price);
        }

        if !order.remaining_quantity.is_zero() {
            let finish = self.remainder_policy(&order);
            self.finish(&mut order, finish, now);
        }

        debug!(
            order_id = %order.order_id,
            status = order.status.label(),
            trades = fills.trades.len(),
            filled = %order.filled_quantity,
            "Order processed"
        );

        ExecutionReport::new(order, fills)
    }

    fn remainder_policy(&self, order: &Order) -> Finish {
        let no_fills = !order.has_fills();
        match (order.limit_price(), order.time_in_force) {
            // Market orders never rest; a fresh one with nothing filled is rejected
            (None, _) if no_fills && order.status == OrderStatus::Validated => {
                Finish::Reject(RejectReason::NoLiquidity)
            }
            (None, _) => Finish::Cancel(CancelReason::NoLiquidity),
            (Some(_), TimeInForce::IOC) if no_fills => Finish::Cancel(CancelReason::NoLiquidity),
            (Some(_), TimeInForce::IOC) => Finish::Cancel(CancelReason::PartialIocCancel),
            (Some(_), TimeInForce::FOK) => Finish::Cancel(CancelReason::NoLiquidity),
            (Some(price), TimeInForce::GTC | TimeInForce::GTD(_)) => Finish::Rest(price),
        }
    }

    fn finish(&mut self, order: &mut Order, finish: Finish, now: i64) {
        let result = match finish {
            Finish::Reject(reason) => order.reject(reason, now),
            Finish::Cancel(reason) => order.cancel(reason, now),
            Finish::Rest(price) => {
                let result = match order.status {
                    OrderStatus::Validated => order.transition(OrderStatus::Resting, now),
                    _ => Ok(()),
                };
                if result.is_ok() {
                    self.book.rest(price, order.clone());
                    if let Some(resting) = self.book.get(&order.order_id) {
                        order.sequence = resting.sequence;
                    }
                }
                result
            }
        };

        if let Err(err) = result {
            self.fail(order, &MatchError::from(err), now);
        }
    }

    /// Force-reject an order after an invariant violation
    fn fail(&mut self, order: &mut Order, err: &MatchError, now: i64) {
        error!(
            order_id = %order.order_id,
            symbol = %self.book.symbol(),
            status = order.status.label(),
            error = %err,
            "Matching invariant violated, force-rejecting order"
        );
        self.book.remove(&order.order_id);
        self.stops.remove(&order.order_id);
        order.force_reject(now);
    }

    /// Cancel a resting order or parked stop
    ///
    /// Filled quantity is kept; only the remainder is cancelled.
    pub fn cancel(&mut self, order_id: &OrderId, now: i64) -> CancelOutcome {
        let order = match self.book.remove(order_id) {
            Some(entry) => Some(entry.order),
            None => self.stops.remove(order_id),
        };

        match order {
            Some(mut order) => {
                if let Err(err) = order.cancel(CancelReason::UserRequested, now) {
                    self.fail(&mut order, &MatchError::from(err), now);
                }
                debug!(order_id = %order_id, filled = %order.filled_quantity, "Order cancelled");
                CancelOutcome::Cancelled(order)
            }
            None => CancelOutcome::NotFound,
        }
    }

    /// Remove resting orders and parked stops whose GTD has lapsed
    pub fn expire(&mut self, now: i64) -> Vec<Order> {
        let mut expired: Vec<Order> = self
            .book
            .expired_ids(now)
            .iter()
            .filter_map(|id| self.book.remove(id))
            .map(|entry| entry.order)
            .collect();
        expired.extend(self.stops.take_expired(now));

        for order in expired.iter_mut() {
            if let Err(err) = order.transition(OrderStatus::Expired, now) {
                error!(order_id = %order.order_id, error = %err, "Failed to expire order");
                order.force_reject(now);
            }
        }

        if !expired.is_empty() {
            info!(symbol = %self.book.symbol(), count = expired.len(), "Expired GTD orders");
        }
        expired
    }

    /// Top-N visible levels per side
    pub fn depth(&self, levels: usize) -> DepthSnapshot {
        self.book.depth(levels, self.last_trade_price)
    }

    /// Read-only estimate of a market order's average fill price
    pub fn estimate_impact(&self, side: Side, quantity: Quantity) -> ImpactEstimate {
        matching::estimate_impact(&self.book, side, quantity)
    }
}

/// What happens to an unfilled remainder
enum Finish {
    Rest(Price),
    Cancel(CancelReason),
    Reject(RejectReason),
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::{AccountId, ClientOrderId};

    const TS: i64 = 1708123456789000000;

    fn engine() -> SymbolEngine {
        SymbolEngine::new(MarketId::new("BTC/USDT"), &MatchingConfig::default())
    }

    fn limit(side: Side, price: &str, qty: u64) -> Order {
        Order::limit(
            AccountId::new(),
            MarketId::new("BTC/USDT"),
            side,
            Price::from_str(price).unwrap(),
            Quantity::from_u64(qty),
            TimeInForce::GTC,
            TS,
        )
    }

    fn with_tif(mut order: Order, tif: TimeInForce) -> Order {
        order.time_in_force = tif;
        order
    }

    fn market(side: Side, qty: u64) -> Order {
        Order::market(AccountId::new(), MarketId::new("BTC/USDT"), side, Quantity::from_u64(qty), TS)
    }

    fn stop(side: Side, order_type: OrderType, qty: u64) -> Order {
        let mut order = Order::new(
            AccountId::new(),
            ClientOrderId::new("stop"),
            MarketId::new("BTC/USDT"),
            side,
            order_type,
            Quantity::from_u64(qty),
            TimeInForce::GTC,
            TS,
        );
        order.status = OrderStatus::Validated;
        order
    }

    #[test]
    fn test_limit_rests_then_partially_fills() {
        let mut engine = engine();

        let buy = engine.submit(limit(Side::BUY, "10.00", 100), TS);
        assert_eq!(buy.report.order.status, OrderStatus::Resting);
        assert!(buy.report.trades.is_empty());

        let depth = engine.depth(5);
        assert_eq!(depth.bids[0].price, Price::from_str("10.00").unwrap());
        assert_eq!(depth.bids[0].quantity, Quantity::from_u64(100));

        let sell = engine.submit(limit(Side::SELL, "10.00", 50), TS + 1);
        assert_eq!(sell.report.order.status, OrderStatus::Filled);
        assert_eq!(sell.report.trades.len(), 1);
        assert_eq!(sell.report.trades[0].quantity, Quantity::from_u64(50));
        assert_eq!(sell.report.trades[0].price, Price::from_str("10.00").unwrap());
        assert_eq!(sell.report.makers[0].status, OrderStatus::PartiallyFilled);

        let depth = engine.depth(5);
        assert_eq!(depth.bids[0].quantity, Quantity::from_u64(50));
        assert_eq!(depth.last_trade_price, Some(Price::from_u64(10)));
    }

    #[test]
    fn test_market_on_empty_book_rejected() {
        let mut engine = engine();
        let outcome = engine.submit(market(Side::BUY, 100), TS);
        assert_eq!(
            outcome.report.order.status,
            OrderStatus::Rejected(RejectReason::NoLiquidity)
        );
        assert!(engine.book().is_empty());
    }

    #[test]
    fn test_market_partial_cancels_remainder() {
        let mut engine = engine();
        engine.submit(limit(Side::SELL, "10", 30), TS);

        let outcome = engine.submit(market(Side::BUY, 100), TS + 1);
        assert_eq!(
            outcome.report.order.status,
            OrderStatus::Cancelled(CancelReason::NoLiquidity)
        );
        assert_eq!(outcome.report.order.filled_quantity, Quantity::from_u64(30));
        assert!(engine.book().is_empty());
    }

    #[test]
    fn test_price_time_priority() {
        let mut engine = engine();
        let first = engine.submit(limit(Side::SELL, "10", 5), TS).report.order.order_id;
        let second = engine.submit(limit(Side::SELL, "10", 5), TS + 1).report.order.order_id;
        let better = engine.submit(limit(Side::SELL, "9.5", 5), TS + 2).report.order.order_id;

        let outcome = engine.submit(limit(Side::BUY, "10", 12), TS + 3);
        let makers: Vec<_> = outcome.report.trades.iter().map(|t| t.maker_order_id).collect();
        assert_eq!(makers, vec![better, first, second]);
        assert_eq!(outcome.report.trades[2].quantity, Quantity::from_u64(2));
        assert_eq!(outcome.report.trades[0].price, Price::from_str("9.5").unwrap());
    }

    #[test]
    fn test_ioc_outcomes() {
        let mut engine = engine();
        let none = engine.submit(with_tif(limit(Side::BUY, "10", 10), TimeInForce::IOC), TS);
        assert_eq!(
            none.report.order.status,
            OrderStatus::Cancelled(CancelReason::NoLiquidity)
        );

        engine.submit(limit(Side::SELL, "10", 4), TS);
        let partial = engine.submit(with_tif(limit(Side::BUY, "10", 10), TimeInForce::IOC), TS + 1);
        assert_eq!(
            partial.report.order.status,
            OrderStatus::Cancelled(CancelReason::PartialIocCancel)
        );
        assert_eq!(partial.report.order.filled_quantity, Quantity::from_u64(4));
        assert!(engine.book().is_empty());
    }

    #[test]
    fn test_fok_is_all_or_nothing() {
        let mut engine = engine();
        engine.submit(limit(Side::SELL, "10", 4), TS);
        engine.submit(limit(Side::SELL, "11", 4), TS);

        let killed = engine.submit(with_tif(limit(Side::BUY, "10", 5), TimeInForce::FOK), TS + 1);
        assert_eq!(
            killed.report.order.status,
            OrderStatus::Rejected(RejectReason::FokUnfillable)
        );
        assert!(killed.report.trades.is_empty());
        assert_eq!(engine.book().len(), 2);

        let filled = engine.submit(with_tif(limit(Side::BUY, "11", 8), TimeInForce::FOK), TS + 2);
        assert_eq!(filled.report.order.status, OrderStatus::Filled);
        assert_eq!(filled.report.trades.len(), 2);
    }

    #[test]
    fn test_iceberg_replenishes_and_keeps_depth() {
        let mut engine = engine();
        let iceberg = limit(Side::SELL, "10", 1000).with_display(Quantity::from_u64(100));
        let iceberg_id = engine.submit(iceberg, TS).report.order.order_id;

        assert_eq!(engine.depth(1).asks[0].quantity, Quantity::from_u64(100));

        let outcome = engine.submit(limit(Side::BUY, "10", 100), TS + 1);
        assert_eq!(outcome.report.trades.len(), 1);

        assert_eq!(engine.depth(1).asks[0].quantity, Quantity::from_u64(100));
        let resting = engine.book().get(&iceberg_id).unwrap();
        assert_eq!(resting.order.remaining_quantity, Quantity::from_u64(900));
        assert_eq!(resting.hidden_quantity(), Quantity::from_u64(800));
    }

    #[test]
    fn test_iceberg_loses_priority_after_replenish() {
        let mut engine = engine();
        let iceberg = limit(Side::SELL, "10", 300).with_display(Quantity::from_u64(100));
        let iceberg_id = engine.submit(iceberg, TS).report.order.order_id;
        let plain_id = engine.submit(limit(Side::SELL, "10", 50), TS + 1).report.order.order_id;

        let outcome = engine.submit(limit(Side::BUY, "10", 130), TS + 2);
        let fills: Vec<_> = outcome
            .report
            .trades
            .iter()
            .map(|t| (t.maker_order_id, t.quantity))
            .collect();
        assert_eq!(
            fills,
            vec![
                (iceberg_id, Quantity::from_u64(100)),
                (plain_id, Quantity::from_u64(30)),
            ]
        );
    }

    #[test]
    fn test_hidden_order_matches_but_not_in_depth() {
        let mut engine = engine();
        engine.submit(limit(Side::SELL, "10", 20).with_display(Quantity::zero()), TS);
        assert!(engine.depth(5).asks.is_empty());

        let outcome = engine.submit(limit(Side::BUY, "10", 20), TS + 1);
        assert_eq!(outcome.report.order.status, OrderStatus::Filled);
    }

    #[test]
    fn test_stop_triggers_after_trade() {
        let mut engine = engine();
        engine.submit(limit(Side::SELL, "100", 1), TS);
        engine.submit(limit(Side::SELL, "105", 10), TS);

        let stop_order = stop(
            Side::BUY,
            OrderType::Stop {
                stop_price: Price::from_u64(100),
            },
            5,
        );
        let parked = engine.submit(stop_order, TS + 1);
        assert_eq!(parked.report.order.status, OrderStatus::Resting);
        assert_eq!(engine.parked_stops(), 1);
        assert!(engine.depth(5).bids.is_empty());

        let outcome = engine.submit(limit(Side::BUY, "100", 1), TS + 2);
        assert_eq!(outcome.triggered.len(), 1);
        let fired = &outcome.triggered[0];
        assert_eq!(fired.order.order_type, OrderType::Market);
        assert_eq!(fired.order.status, OrderStatus::Filled);
        assert_eq!(fired.trades[0].price, Price::from_u64(105));
        assert_eq!(outcome.trades().count(), 2);
        assert_eq!(engine.parked_stops(), 0);
    }

    #[test]
    fn test_triggered_stop_limit_rests() {
        let mut engine = engine();
        engine.submit(limit(Side::BUY, "95", 1), TS);

        let stop_limit = stop(
            Side::SELL,
            OrderType::StopLimit {
                stop_price: Price::from_u64(96),
                limit_price: Price::from_u64(97),
            },
            3,
        );
        let stop_id = engine.submit(stop_limit, TS).report.order.order_id;

        let outcome = engine.submit(limit(Side::SELL, "95", 1), TS + 1);
        assert_eq!(outcome.triggered.len(), 1);
        assert_eq!(outcome.triggered[0].order.status, OrderStatus::Resting);
        assert!(engine.book().contains(&stop_id));
        assert_eq!(engine.depth(1).asks[0].price, Price::from_u64(97));
    }

    #[test]
    fn test_triggered_stop_without_liquidity_is_cancelled() {
        let mut engine = engine();
        engine.submit(limit(Side::BUY, "100", 1), TS);
        engine.submit(
            stop(
                Side::SELL,
                OrderType::Stop {
                    stop_price: Price::from_u64(100),
                },
                5,
            ),
            TS,
        );

        let outcome = engine.submit(limit(Side::SELL, "100", 1), TS + 1);
        assert_eq!(
            outcome.triggered[0].order.status,
            OrderStatus::Cancelled(CancelReason::NoLiquidity)
        );
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut engine = engine();
        let id = engine.submit(limit(Side::BUY, "10", 100), TS).report.order.order_id;
        engine.submit(limit(Side::SELL, "10", 40), TS + 1);

        match engine.cancel(&id, TS + 2) {
            CancelOutcome::Cancelled(order) => {
                assert_eq!(order.status, OrderStatus::Cancelled(CancelReason::UserRequested));
                assert_eq!(order.filled_quantity, Quantity::from_u64(40));
                assert_eq!(order.remaining_quantity, Quantity::from_u64(60));
            }
            CancelOutcome::NotFound => panic!("resting order should cancel"),
        }
        assert_eq!(engine.cancel(&id, TS + 3), CancelOutcome::NotFound);
        assert!(engine.depth(5).bids.is_empty());
    }

    #[test]
    fn test_cancel_parked_stop() {
        let mut engine = engine();
        let id = engine
            .submit(
                stop(
                    Side::BUY,
                    OrderType::Stop {
                        stop_price: Price::from_u64(120),
                    },
                    1,
                ),
                TS,
            )
            .report
            .order
            .order_id;

        assert!(matches!(engine.cancel(&id, TS + 1), CancelOutcome::Cancelled(_)));
        assert_eq!(engine.parked_stops(), 0);
    }

    #[test]
    fn test_gtd_sweep() {
        let mut engine = engine();
        let gtd = with_tif(limit(Side::BUY, "10", 5), TimeInForce::GTD(TS + 100));
        let id = engine.submit(gtd, TS).report.order.order_id;
        engine.submit(limit(Side::BUY, "9", 5), TS);

        let late = with_tif(limit(Side::BUY, "10", 5), TimeInForce::GTD(TS));
        assert_eq!(
            engine.submit(late, TS).report.order.status,
            OrderStatus::Rejected(RejectReason::ExpiredOnArrival)
        );

        assert!(engine.expire(TS + 99).is_empty());
        let expired = engine.expire(TS + 100);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].order_id, id);
        assert_eq!(expired[0].status, OrderStatus::Expired);
        assert_eq!(engine.book().len(), 1);
    }

    #[test]
    fn test_unvalidated_order_is_force_rejected() {
        let mut engine = engine();
        engine.submit(limit(Side::SELL, "10", 5), TS);

        let mut order = limit(Side::BUY, "10", 5);
        order.status = OrderStatus::New;
        let outcome = engine.submit(order, TS + 1);

        assert_eq!(
            outcome.report.order.status,
            OrderStatus::Rejected(RejectReason::InternalError)
        );
        assert!(outcome.report.trades.is_empty());
        assert_eq!(engine.book().len(), 1);
    }

    #[test]
    fn test_impact_estimate_is_read_only() {
        let mut engine = engine();
        engine.submit(limit(Side::SELL, "10", 10), TS);
        engine.submit(limit(Side::SELL, "12", 10), TS);

        let estimate = engine.estimate_impact(Side::BUY, Quantity::from_u64(20));
        assert_eq!(estimate.average_price, Some(Price::from_u64(11)));
        assert_eq!(engine.book().len(), 2);
    }
}
