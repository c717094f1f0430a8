//! Settlement amounts for a trade
//!
//! Fees are charged on trade value in the quote currency, then everything
//! is converted to the reporting currency.

use rust_decimal::Decimal;
use types::fee::{FeeSchedule, Liquidity};
use types::trade::Trade;

use crate::conversion::RateTable;
use crate::error::SettlementError;

/// Amounts in the reporting currency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementAmounts {
    pub notional: Decimal,
    /// Negative for a maker rebate
    pub maker_fee: Decimal,
    pub taker_fee: Decimal,
    pub conversion_rate: Decimal,
}

pub fn compute_amounts(trade: &Trade, fees: &FeeSchedule, rates: &RateTable) -> Result<SettlementAmounts, SettlementError> {
    let conversion_rate = rates.rate(trade.symbol.quote())?;
    let value = trade.trade_value();

    Ok(SettlementAmounts {
        notional: value * conversion_rate,
        maker_fee: fees.fee(Liquidity::Maker, value) * conversion_rate,
        taker_fee: fees.fee(Liquidity::Taker, value) * conversion_rate,
        conversion_rate,
    })
}
