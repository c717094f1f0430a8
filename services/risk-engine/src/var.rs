//! Parametric Value-at-Risk
//!
//! Volatility is the sample standard deviation of log returns over a
//! rolling window of mark prices. Position VaR is
//! `z × σ × |net_quantity| × mark`; account VaR sums its positions.
//!
//! Statistics run in `f64`; results are converted back to `Decimal`.

use std::collections::VecDeque;

use rust_decimal::prelude::*;
use types::numeric::Price;
use types::position::Position;
use types::risk::VarConfidence;

/// Rolling window of mark prices for one symbol
#[derive(Debug, Clone)]
pub struct PriceHistory {
    window: usize,
    prices: VecDeque<f64>,
    latest: Option<Price>,
}

impl PriceHistory {
    pub fn new(window: usize) -> Self {
        // Two returns are the minimum for a sample deviation
        let window = window.max(3);
        Self {
            window,
            prices: VecDeque::with_capacity(window),
            latest: None,
        }
    }

    pub fn push(&mut self, price: Price) {
        let Some(value) = price.as_decimal().to_f64() else {
            return;
        };
        if value <= 0.0 || !value.is_finite() {
            return;
        }
        if self.prices.len() == self.window {
            self.prices.pop_front();
        }
        self.prices.push_back(value);
        self.latest = Some(price);
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Most recent mark
    pub fn last(&self) -> Option<Price> {
        self.latest
    }

    /// Sample standard deviation of log returns
    ///
    /// `None` until the window holds at least three prices.
    pub fn volatility(&self) -> Option<f64> {
        if self.prices.len() < 3 {
            return None;
        }
        let returns: Vec<f64> = self
            .prices
            .iter()
            .zip(self.prices.iter().skip(1))
            .map(|(prev, next)| (next / prev).ln())
            .collect();

        let n = returns.len() as f64;
        let mean = returns.iter().sum::<f64>() / n;
        let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
        Some(variance.sqrt())
    }
}

/// VaR of a single position
///
/// Zero for a flat or unmarked position.
pub fn position_var(position: &Position, volatility: f64, confidence: VarConfidence) -> Decimal {
    let Some(mark) = position.mark_price else {
        return Decimal::ZERO;
    };
    let notional = (position.net_quantity.abs() * mark.as_decimal()).to_f64().unwrap_or(0.0);
    let var = confidence.z_score() * volatility * notional;
    Decimal::from_f64(var).unwrap_or(Decimal::ZERO)
}

/// VaR summed over positions, given a volatility lookup per symbol
pub fn account_var<'a>(
    positions: impl IntoIterator<Item = &'a Position>,
    volatility: impl Fn(&Position) -> Option<f64>,
    confidence: VarConfidence,
) -> Decimal {
    positions
        .into_iter()
        .filter(|p| !p.is_flat())
        .filter_map(|p| volatility(p).map(|sigma| position_var(p, sigma, confidence)))
        .sum()
}
