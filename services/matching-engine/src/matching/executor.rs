//! Trade execution logic
//!
//! Generates trades with a per-symbol monotonic sequence

use types::ids::MarketId;
use types::numeric::{Price, Quantity};
use types::order::Order;
use types::trade::Trade;

use crate::error::MatchError;

/// Match executor for handling trade generation
#[derive(Debug, Clone)]
pub struct MatchExecutor {
    sequence_counter: u64,
}

impl MatchExecutor {
    /// Create a new match executor with starting sequence number
    pub fn new(starting_sequence: u64) -> Self {
        Self {
            sequence_counter: starting_sequence,
        }
    }

    /// Get next sequence number (monotonically increasing)
    fn next_sequence(&mut self) -> u64 {
        let seq = self.sequence_counter;
        self.sequence_counter += 1;
        seq
    }

    /// Sequence the next trade will carry
    pub fn peek_sequence(&self) -> u64 {
        self.sequence_counter
    }

    /// Execute a trade between a resting maker and an incoming taker
    ///
    /// Execution price is the maker's price per price-time priority.
    pub fn execute_trade(
        &mut self,
        symbol: &MarketId,
        maker: &Order,
        taker: &Order,
        price: Price,
        quantity: Quantity,
        timestamp: i64,
    ) -> Result<Trade, MatchError> {
        if quantity.is_zero() {
            return Err(MatchError::ZeroQuantityTrade {
                maker: maker.order_id.to_string(),
                taker: taker.order_id.to_string(),
            });
        }

        let sequence = self.next_sequence();

        Ok(Trade::new(
            sequence,
            symbol.clone(),
            maker.order_id,
            taker.order_id,
            maker.account_id,
            taker.account_id,
            taker.side,
            price,
            quantity,
            timestamp,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::AccountId;
    use types::order::{Side, TimeInForce};

    fn order(side: Side) -> Order {
        Order::limit(
            AccountId::new(),
            MarketId::new("BTC/USDT"),
            side,
            Price::from_u64(50000),
            Quantity::from_u64(1),
            TimeInForce::GTC,
            1708123456789000000,
        )
    }

    #[test]
    fn test_execute_trade() {
        let mut executor = MatchExecutor::new(1000);
        let maker = order(Side::SELL);
        let taker = order(Side::BUY);

        let trade = executor
            .execute_trade(
                &MarketId::new("BTC/USDT"),
                &maker,
                &taker,
                Price::from_u64(50000),
                Quantity::from_str("0.5").unwrap(),
                1708123456789000000,
            )
            .unwrap();

        assert_eq!(trade.sequence, 1000);
        assert_eq!(trade.side, Side::BUY);
        assert_eq!(trade.maker_order_id, maker.order_id);
        assert_eq!(trade.taker_account_id, taker.account_id);
        assert_eq!(trade.quantity, Quantity::from_str("0.5").unwrap());
    }

    #[test]
    fn test_zero_quantity_is_invariant_violation() {
        let mut executor = MatchExecutor::new(1);
        let result = executor.execute_trade(
            &MarketId::new("BTC/USDT"),
            &order(Side::SELL),
            &order(Side::BUY),
            Price::from_u64(50000),
            Quantity::zero(),
            1708123456789000000,
        );

        assert!(matches!(result, Err(MatchError::ZeroQuantityTrade { .. })));
        assert_eq!(executor.peek_sequence(), 1);
    }

    #[test]
    fn test_sequence_monotonic() {
        let mut executor = MatchExecutor::new(1000);
        let symbol = MarketId::new("BTC/USDT");
        let (maker, taker) = (order(Side::SELL), order(Side::BUY));

        let trade1 = executor
            .execute_trade(&symbol, &maker, &taker, Price::from_u64(50000), Quantity::from_u64(1), 1)
            .unwrap();
        let trade2 = executor
            .execute_trade(&symbol, &maker, &taker, Price::from_u64(50000), Quantity::from_u64(1), 2)
            .unwrap();

        assert_eq!(trade1.sequence, 1000);
        assert_eq!(trade2.sequence, 1001);
    }
}
