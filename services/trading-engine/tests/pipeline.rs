//! End-to-end pipeline tests
//!
//! Each test starts a full engine (symbol workers, risk, settlement pool,
//! repository writer) and drives it through `submit_order`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use event_bus::Subscription;
use risk_engine::ResetOutcome;
use rust_decimal::Decimal;
use settlement::{LoopbackGateway, SettlementError, SettlementGateway};
use trading_engine::{EngineConfig, InMemoryRepository, TradingEngine};
use types::events::{EventKind, EventPayload};
use types::ids::AccountId;
use types::numeric::{Price, Quantity};
use types::order::{CancelReason, OrderStatus, RejectReason, Side, TimeInForce};
use types::request::{OrderKind, OrderRequest};
use types::risk::{BreakerState, RiskLimits};
use types::settlement::{SettlementRecord, SettlementStatus};

const SYMBOL: &str = "BTC/USDT";
const WIDE: &str = "wide";
const TIGHT: &str = "tight";

fn config() -> EngineConfig {
    let mut config = EngineConfig {
        // Keep the background pass out of the way; tests call it explicitly
        maintenance_interval_ms: 3_600_000,
        ..EngineConfig::default()
    };
    config.risk.tiers.insert(
        WIDE.to_string(),
        RiskLimits {
            max_position_size: Decimal::from(1_000),
            max_order_size: Decimal::from(5_000),
            max_daily_loss: Decimal::from(1_000_000),
            var_threshold: Decimal::from(1_000_000_000),
            margin_requirement: Decimal::new(1, 1),
            worst_case_move: Decimal::new(5, 2),
        },
    );
    config.risk.tiers.insert(
        TIGHT.to_string(),
        RiskLimits {
            max_daily_loss: Decimal::from(100),
            ..RiskLimits::default()
        },
    );
    config.risk.breaker.cooldown_secs = 0;
    config
}

fn account(engine: &TradingEngine, tier: &str) -> AccountId {
    let account_id = AccountId::new();
    engine
        .register_account(account_id, tier, Decimal::from(1_000_000))
        .unwrap();
    account_id
}

fn limit(account_id: AccountId, side: Side, price: u64, quantity: u64) -> OrderRequest {
    OrderRequest {
        client_order_id: format!("c-{}", AccountId::new()),
        symbol: SYMBOL.to_string(),
        side,
        order_type: OrderKind::Limit,
        quantity: Decimal::from(quantity),
        price: Some(Decimal::from(price)),
        stop_price: None,
        time_in_force: TimeInForce::GTC,
        display_quantity: None,
        account_id,
    }
}

fn market(account_id: AccountId, side: Side, quantity: u64) -> OrderRequest {
    OrderRequest {
        order_type: OrderKind::Market,
        price: None,
        ..limit(account_id, side, 1, quantity)
    }
}

fn stop(account_id: AccountId, side: Side, stop_price: u64, quantity: u64) -> OrderRequest {
    OrderRequest {
        order_type: OrderKind::Stop,
        price: None,
        stop_price: Some(Decimal::from(stop_price)),
        ..limit(account_id, side, 1, quantity)
    }
}

/// Wait for the first event of `kind`, collecting everything seen on the way
async fn wait_for(subscription: &mut Subscription, kind: EventKind) -> Vec<EventKind> {
    let mut seen = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(event) = subscription.recv().await {
            let event_kind = event.payload.kind();
            seen.push(event_kind);
            if event_kind == kind {
                break;
            }
        }
    })
    .await
    .expect("event not published in time");
    seen
}

#[tokio::test]
async fn test_limit_orders_cross() {
    let engine = TradingEngine::start(config()).unwrap();
    let buyer = account(&engine, WIDE);
    let seller = account(&engine, WIDE);

    let resting = engine.submit_order(limit(buyer, Side::BUY, 10, 100)).await;
    assert_eq!(resting.status, OrderStatus::Resting);
    assert!(resting.exchange_order_id.is_some());

    let depth = engine.depth(SYMBOL, 5).await.unwrap();
    assert_eq!(depth.best_bid().unwrap().price, Price::from_u64(10));
    assert_eq!(depth.best_bid().unwrap().quantity, Quantity::from_u64(100));

    let taker = engine.submit_order(limit(seller, Side::SELL, 10, 50)).await;
    assert_eq!(taker.status, OrderStatus::Filled);
    assert_eq!(taker.execution_reports.len(), 1);
    let trade = &taker.execution_reports[0];
    assert_eq!(trade.price, Price::from_u64(10));
    assert_eq!(trade.quantity, Quantity::from_u64(50));
    assert_eq!(trade.maker_order_id, resting.exchange_order_id.unwrap());

    let depth = engine.depth(SYMBOL, 5).await.unwrap();
    assert_eq!(depth.best_bid().unwrap().quantity, Quantity::from_u64(50));
    assert_eq!(depth.last_trade_price, Some(Price::from_u64(10)));

    engine.shutdown().await;
}

#[tokio::test]
async fn test_market_order_without_liquidity() {
    let engine = TradingEngine::start(config()).unwrap();
    let buyer = account(&engine, WIDE);

    let response = engine.submit_order(market(buyer, Side::BUY, 100)).await;
    assert_eq!(response.status, OrderStatus::Rejected(RejectReason::NoLiquidity));
    assert_eq!(response.reason.as_deref(), Some("no_liquidity"));
    assert!(response.execution_reports.is_empty());

    engine.shutdown().await;
}

#[tokio::test]
async fn test_ioc_remainder_cancelled() {
    let engine = TradingEngine::start(config()).unwrap();
    let buyer = account(&engine, WIDE);
    let seller = account(&engine, WIDE);

    engine.submit_order(limit(seller, Side::SELL, 10, 30)).await;
    let mut ioc = limit(buyer, Side::BUY, 10, 50);
    ioc.time_in_force = TimeInForce::IOC;
    let response = engine.submit_order(ioc).await;

    assert_eq!(response.status, OrderStatus::Cancelled(CancelReason::PartialIocCancel));
    assert_eq!(response.filled_quantity, Quantity::from_u64(30));
    assert!(engine.depth(SYMBOL, 5).await.unwrap().bids.is_empty());

    engine.shutdown().await;
}

#[tokio::test]
async fn test_position_limit_rejects_with_events() {
    let engine = TradingEngine::start(config()).unwrap();
    let buyer = account(&engine, WIDE);
    let seller = account(&engine, WIDE);
    let mut events = engine.bus().subscribe_filtered(
        "test",
        64,
        &[EventKind::RiskViolation, EventKind::OrderRejected],
    );

    engine.submit_order(limit(seller, Side::SELL, 10, 950)).await;
    let filled = engine.submit_order(limit(buyer, Side::BUY, 10, 950)).await;
    assert_eq!(filled.status, OrderStatus::Filled);
    let position = engine.risk().position(&buyer, &SYMBOL.into()).unwrap();
    assert_eq!(position.net_quantity, Decimal::from(950));

    let response = engine.submit_order(limit(buyer, Side::BUY, 10, 100)).await;
    assert_eq!(response.status, OrderStatus::Rejected(RejectReason::PositionLimitExceeded));
    assert_eq!(response.reason.as_deref(), Some("position_limit_exceeded"));

    let kinds: Vec<EventKind> = events.drain().iter().map(|event| event.payload.kind()).collect();
    assert_eq!(kinds, vec![EventKind::RiskViolation, EventKind::OrderRejected]);

    let snapshot = engine.metrics();
    assert_eq!(snapshot.counters["rejected_risk"], 1);

    engine.shutdown().await;
}

#[tokio::test]
async fn test_iceberg_replenishes_visible_slice() {
    let engine = TradingEngine::start(config()).unwrap();
    let maker = account(&engine, WIDE);
    let taker = account(&engine, WIDE);

    let mut iceberg = limit(maker, Side::SELL, 10, 1_000);
    iceberg.display_quantity = Some(Decimal::from(100));
    let resting = engine.submit_order(iceberg).await;
    assert_eq!(resting.status, OrderStatus::Resting);

    let depth = engine.depth(SYMBOL, 5).await.unwrap();
    assert_eq!(depth.best_ask().unwrap().quantity, Quantity::from_u64(100));

    let response = engine.submit_order(limit(taker, Side::BUY, 10, 100)).await;
    assert_eq!(response.status, OrderStatus::Filled);
    assert_eq!(response.execution_reports[0].quantity, Quantity::from_u64(100));

    let depth = engine.depth(SYMBOL, 5).await.unwrap();
    assert_eq!(depth.best_ask().unwrap().quantity, Quantity::from_u64(100));

    let impact = engine
        .estimate_impact(SYMBOL, Side::BUY, Quantity::from_u64(5_000))
        .await
        .unwrap();
    assert_eq!(impact.fillable, Quantity::from_u64(900));
    assert!(!impact.fully_fillable());

    engine.shutdown().await;
}

#[tokio::test]
async fn test_event_order_through_settlement() {
    let engine = TradingEngine::start(config()).unwrap();
    let buyer = account(&engine, WIDE);
    let seller = account(&engine, WIDE);
    let mut events = engine.bus().subscribe("test", 256);

    engine.submit_order(limit(seller, Side::SELL, 100, 5)).await;
    let response = engine.submit_order(limit(buyer, Side::BUY, 100, 5)).await;
    let trade_id = response.execution_reports[0].trade_id;

    let seen = wait_for(&mut events, EventKind::SettlementConfirmed).await;
    let accepted = seen.iter().rposition(|kind| *kind == EventKind::OrderAccepted).unwrap();
    let executed = seen.iter().position(|kind| *kind == EventKind::TradeExecuted).unwrap();
    assert!(accepted < executed);
    assert_eq!(seen.last(), Some(&EventKind::SettlementConfirmed));

    let record = engine.settlement_record(&trade_id).unwrap();
    assert_eq!(record.status, SettlementStatus::Confirmed);
    assert_eq!(record.notional, Decimal::from(500));
    assert!(record.confirmed_at.is_some());

    engine.shutdown().await;
}

#[tokio::test]
async fn test_daily_loss_trips_breaker_and_manual_reset() {
    let engine = TradingEngine::start(config()).unwrap();
    let loser = account(&engine, TIGHT);
    let seller = account(&engine, TIGHT);
    let bidder = account(&engine, TIGHT);
    let mut events = engine
        .bus()
        .subscribe_filtered("test", 64, &[EventKind::CircuitBreakerTriggered]);

    engine.submit_order(limit(seller, Side::SELL, 100, 10)).await;
    engine.submit_order(limit(loser, Side::BUY, 100, 10)).await;
    engine.submit_order(limit(bidder, Side::BUY, 50, 10)).await;
    let resting = engine.submit_order(limit(bidder, Side::BUY, 40, 1)).await;

    // Realizes a loss of 500 against a limit of 100
    let dump = engine.submit_order(limit(loser, Side::SELL, 50, 10)).await;
    assert_eq!(dump.status, OrderStatus::Filled);
    assert_eq!(engine.breaker_state(), BreakerState::Halted);

    let event = events.try_recv().unwrap();
    assert!(matches!(
        &event.payload,
        EventPayload::CircuitBreakerTriggered { reason } if reason.code() == "daily_loss_limit"
    ));

    let blocked = engine.submit_order(limit(seller, Side::SELL, 60, 1)).await;
    assert_eq!(blocked.status, OrderStatus::Rejected(RejectReason::CircuitOpen));

    // Cancels still go through while halted
    let cancelled = engine
        .cancel_order(SYMBOL, resting.exchange_order_id.unwrap())
        .await
        .unwrap();
    assert!(matches!(cancelled, matching_engine::CancelOutcome::Cancelled(_)));

    assert_eq!(engine.reset_circuit_breaker(), ResetOutcome::Reset);
    assert_eq!(engine.breaker_state(), BreakerState::Normal);

    let after = engine.submit_order(limit(seller, Side::SELL, 60, 1)).await;
    assert_eq!(after.status, OrderStatus::Resting);

    let snapshot = engine.metrics();
    assert_eq!(snapshot.counters["breaker_trips"], 1);
    assert_eq!(snapshot.counters["orders_cancelled"], 1);

    engine.shutdown().await;
}

#[tokio::test]
async fn test_stop_order_triggered_by_trade() {
    let engine = TradingEngine::start(config()).unwrap();
    let stopper = account(&engine, WIDE);
    let bidder = account(&engine, WIDE);
    let seller = account(&engine, WIDE);

    engine.submit_order(limit(seller, Side::SELL, 100, 1)).await;
    engine.submit_order(limit(stopper, Side::BUY, 100, 1)).await;

    let parked = engine.submit_order(stop(stopper, Side::SELL, 95, 1)).await;
    assert_eq!(parked.status, OrderStatus::Resting);
    assert!(parked.execution_reports.is_empty());

    engine.submit_order(limit(bidder, Side::BUY, 95, 2)).await;
    let trigger = engine.submit_order(limit(seller, Side::SELL, 95, 1)).await;
    assert_eq!(trigger.status, OrderStatus::Filled);

    assert_eq!(trigger.triggered.len(), 1);
    let released = &trigger.triggered[0];
    assert_eq!(released.exchange_order_id, parked.exchange_order_id);
    assert_eq!(released.status, OrderStatus::Filled);
    assert_eq!(released.execution_reports[0].price, Price::from_u64(95));

    assert!(engine.depth(SYMBOL, 5).await.unwrap().bids.is_empty());
    engine.shutdown().await;
}

#[tokio::test]
async fn test_invalid_requests_rejected_synchronously() {
    let engine = TradingEngine::start(config()).unwrap();
    let trader = account(&engine, WIDE);
    let mut events = engine
        .bus()
        .subscribe_filtered("test", 16, &[EventKind::OrderRejected]);

    let mut unknown = limit(trader, Side::BUY, 10, 1);
    unknown.symbol = "DOGE/USDT".to_string();
    let response = engine.submit_order(unknown).await;
    assert_eq!(response.status, OrderStatus::Rejected(RejectReason::UnknownSymbol));
    assert!(response.exchange_order_id.is_none());

    let mut zero = limit(trader, Side::BUY, 10, 1);
    zero.quantity = Decimal::ZERO;
    let response = engine.submit_order(zero).await;
    assert_eq!(response.reason.as_deref(), Some("invalid_quantity"));

    let mut unpriced = limit(trader, Side::BUY, 10, 1);
    unpriced.price = None;
    let response = engine.submit_order(unpriced).await;
    assert_eq!(response.reason.as_deref(), Some("missing_price"));

    assert_eq!(events.drain().len(), 3);
    let snapshot = engine.metrics();
    assert_eq!(snapshot.counters["orders_received"], 3);
    assert_eq!(snapshot.counters["rejected_validation"], 3);
    assert_eq!(snapshot.counters["orders_accepted"], 0);

    engine.shutdown().await;
}

#[tokio::test]
async fn test_unregistered_account_rejected() {
    let engine = TradingEngine::start(config()).unwrap();

    let response = engine.submit_order(limit(AccountId::new(), Side::BUY, 10, 1)).await;
    assert_eq!(response.status, OrderStatus::Rejected(RejectReason::UnknownAccount));

    engine.shutdown().await;
}

#[tokio::test]
async fn test_gtd_order_expires_on_maintenance() {
    let engine = TradingEngine::start(config()).unwrap();
    let trader = account(&engine, WIDE);
    let deadline = types::time::now_nanos() + 60_000_000_000;

    let mut gtd = limit(trader, Side::BUY, 10, 5);
    gtd.time_in_force = TimeInForce::GTD(deadline);
    let response = engine.submit_order(gtd).await;
    assert_eq!(response.status, OrderStatus::Resting);

    engine.run_maintenance(deadline - 1).await;
    assert_eq!(engine.depth(SYMBOL, 5).await.unwrap().bids.len(), 1);

    engine.run_maintenance(deadline).await;
    assert!(engine.depth(SYMBOL, 5).await.unwrap().bids.is_empty());
    assert_eq!(engine.metrics().counters["orders_expired"], 1);

    engine.shutdown().await;
}

#[tokio::test]
async fn test_metrics_snapshot_counts_pipeline() {
    let engine = TradingEngine::start(config()).unwrap();
    let buyer = account(&engine, WIDE);
    let seller = account(&engine, WIDE);
    let mut events = engine.bus().subscribe("test", 256);

    engine.submit_order(limit(seller, Side::SELL, 10, 10)).await;
    engine.submit_order(limit(buyer, Side::BUY, 10, 4)).await;
    engine.submit_order(limit(buyer, Side::BUY, 10, 6)).await;
    engine.submit_order(market(buyer, Side::BUY, 1)).await;

    wait_for(&mut events, EventKind::SettlementConfirmed).await;
    let snapshot = engine.metrics();
    assert_eq!(snapshot.counters["orders_received"], 4);
    assert_eq!(snapshot.counters["orders_accepted"], 3);
    assert_eq!(snapshot.counters["trades_executed"], 2);
    assert_eq!(snapshot.counters["rejected_matching"], 1);
    assert_eq!(snapshot.breaker_state, BreakerState::Normal);
    assert!(snapshot.queue_depths.contains_key("matching:BTC/USDT"));
    assert!(snapshot.queue_depths.contains_key("settlement"));
    assert!(snapshot.latency.values().all(|summary| summary.samples > 0));

    engine.shutdown().await;
}

#[tokio::test]
async fn test_repository_receives_orders_trades_and_settlements() {
    let repository = Arc::new(InMemoryRepository::new());
    let engine = TradingEngine::start_with(config(), Arc::new(LoopbackGateway), repository.clone()).unwrap();
    let buyer = account(&engine, WIDE);
    let seller = account(&engine, WIDE);
    let mut events = engine.bus().subscribe("test", 256);

    let maker = engine.submit_order(limit(seller, Side::SELL, 20, 3)).await;
    let taker = engine.submit_order(limit(buyer, Side::BUY, 20, 3)).await;
    let trade_id = taker.execution_reports[0].trade_id;
    wait_for(&mut events, EventKind::SettlementConfirmed).await;

    engine.shutdown().await;

    assert!(repository.trade(&trade_id).is_some());
    assert_eq!(
        repository.settlement(&trade_id).map(|record| record.status),
        Some(SettlementStatus::Confirmed)
    );
    let stored_maker = repository.order(&maker.exchange_order_id.unwrap()).unwrap();
    assert_eq!(stored_maker.status, OrderStatus::Filled);
    let stored_taker = repository.order(&taker.exchange_order_id.unwrap()).unwrap();
    assert_eq!(stored_taker.status, OrderStatus::Filled);
}

#[tokio::test]
async fn test_config_rejects_unknown_account_tier() {
    let mut config = config();
    config.accounts.push(trading_engine::config::AccountSettings {
        account_id: AccountId::new(),
        tier: "platinum".to_string(),
        collateral: Decimal::from(10),
    });
    assert!(TradingEngine::start(config).is_err());
}

#[test]
fn test_sample_config_covers_its_markets() {
    let config = EngineConfig::from_toml_str(include_str!("../config/engine.toml")).unwrap();
    config.validate().unwrap();
    for market in config.markets() {
        assert!(
            config.settlement.rates.contains_key(market.quote()),
            "no rate for {market}"
        );
    }
    assert!(config.accounts.iter().all(|account| config.risk.limits_for(&account.tier).is_some()));
}

/// Gateway that takes `delay` to book each record
struct SlowGateway {
    delay: Duration,
    booked: AtomicUsize,
}

#[async_trait]
impl SettlementGateway for SlowGateway {
    async fn submit(&self, _record: &SettlementRecord) -> Result<(), SettlementError> {
        tokio::time::sleep(self.delay).await;
        self.booked.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn test_every_trade_settles_despite_slow_bus_subscriber() {
    let mut config = config();
    config.bus.subscriber_capacity = 1;
    config.settlement.workers = 1;
    let gateway = Arc::new(SlowGateway {
        delay: Duration::from_millis(20),
        booked: AtomicUsize::new(0),
    });
    let repository = Arc::new(InMemoryRepository::new());
    let engine = TradingEngine::start_with(config, gateway.clone(), repository.clone()).unwrap();
    let buyer = account(&engine, WIDE);
    let seller = account(&engine, WIDE);
    // Never read, so it overflows almost at once
    let _observer = engine.subscribe("observer", &[EventKind::TradeExecuted]);

    engine.submit_order(limit(seller, Side::SELL, 10, 40)).await;
    let mut trade_ids = Vec::new();
    for _ in 0..40 {
        let response = engine.submit_order(limit(buyer, Side::BUY, 10, 1)).await;
        assert_eq!(response.status, OrderStatus::Filled);
        trade_ids.push(response.execution_reports[0].trade_id);
    }
    assert!(engine.metrics().bus_dropped > 0);

    // Shutdown drains the settlement queue before the repository
    engine.shutdown().await;

    assert_eq!(gateway.booked.load(Ordering::SeqCst), 40);
    for trade_id in &trade_ids {
        assert_eq!(
            repository.settlement(trade_id).map(|record| record.status),
            Some(SettlementStatus::Confirmed),
            "trade {trade_id} has no confirmed settlement"
        );
    }
}

#[tokio::test]
async fn test_concurrent_orders_cannot_overshoot_position_limit() {
    let engine = TradingEngine::start(config()).unwrap();
    let buyer = account(&engine, WIDE);
    let seller = account(&engine, WIDE);
    let liquidity = account(&engine, WIDE);

    engine.submit_order(limit(seller, Side::SELL, 10, 950)).await;
    engine.submit_order(limit(buyer, Side::BUY, 10, 950)).await;
    engine.submit_order(limit(liquidity, Side::SELL, 10, 80)).await;

    // Each fits alone at 950 + 40, together they would reach 1030
    let (first, second) = tokio::join!(
        engine.submit_order(limit(buyer, Side::BUY, 10, 40)),
        engine.submit_order(limit(buyer, Side::BUY, 10, 40)),
    );
    let statuses = [first.status, second.status];
    assert_eq!(statuses.iter().filter(|s| **s == OrderStatus::Filled).count(), 1);
    assert!(statuses.contains(&OrderStatus::Rejected(RejectReason::PositionLimitExceeded)));

    let position = engine.risk().position(&buyer, &SYMBOL.into()).unwrap();
    assert_eq!(position.net_quantity, Decimal::from(990));
    // The filled order no longer holds headroom
    assert_eq!(engine.risk().account(&buyer).unwrap().open_order_count(), 0);

    engine.shutdown().await;
}

#[tokio::test]
async fn test_cancel_returns_position_headroom() {
    let engine = TradingEngine::start(config()).unwrap();
    let buyer = account(&engine, WIDE);

    let resting = engine.submit_order(limit(buyer, Side::BUY, 10, 900)).await;
    assert_eq!(resting.status, OrderStatus::Resting);
    let blocked = engine.submit_order(limit(buyer, Side::BUY, 9, 200)).await;
    assert_eq!(blocked.status, OrderStatus::Rejected(RejectReason::PositionLimitExceeded));

    engine
        .cancel_order(SYMBOL, resting.exchange_order_id.unwrap())
        .await
        .unwrap();
    let admitted = engine.submit_order(limit(buyer, Side::BUY, 9, 200)).await;
    assert_eq!(admitted.status, OrderStatus::Resting);

    engine.shutdown().await;
}
