//! Fee calculation types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which side of the book a participant was on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Liquidity {
    /// Resting order (adds liquidity)
    Maker,
    /// Incoming order (removes liquidity)
    Taker,
}

/// Maker/taker fee rates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub maker_rate: Decimal, // Can be negative (rebate)
    pub taker_rate: Decimal,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            maker_rate: Decimal::new(2, 4), // 0.02%
            taker_rate: Decimal::new(5, 4), // 0.05%
        }
    }
}

impl FeeSchedule {
    pub fn rate(&self, liquidity: Liquidity) -> Decimal {
        match liquidity {
            Liquidity::Maker => self.maker_rate,
            Liquidity::Taker => self.taker_rate,
        }
    }

    /// Fee on a trade value in quote currency
    pub fn fee(&self, liquidity: Liquidity, trade_value: Decimal) -> Decimal {
        trade_value * self.rate(liquidity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_calculation() {
        let schedule = FeeSchedule::default();
        let trade_value = Decimal::from(100000);

        assert_eq!(schedule.fee(Liquidity::Maker, trade_value), Decimal::from(20)); // 100000 * 0.0002
        assert_eq!(schedule.fee(Liquidity::Taker, trade_value), Decimal::from(50)); // 100000 * 0.0005
    }

    #[test]
    fn test_maker_rebate() {
        let schedule = FeeSchedule {
            maker_rate: Decimal::from_str_exact("-0.00005").unwrap(),
            taker_rate: Decimal::from_str_exact("0.00035").unwrap(),
        };
        assert_eq!(schedule.fee(Liquidity::Maker, Decimal::from(100000)), Decimal::from(-5));
    }
}
