//! Fixed-point decimal types for prices and quantities
//!
//! Uses rust_decimal for deterministic arithmetic (no floating-point errors).
//! `Price` is strictly positive; `Quantity` is never negative.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;
use thiserror::Error;

/// Numeric construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NumericError {
    #[error("invalid decimal literal: {0}")]
    Parse(String),

    #[error("price must be positive, got {0}")]
    NonPositivePrice(Decimal),

    #[error("quantity must not be negative, got {0}")]
    NegativeQuantity(Decimal),
}

/// Price in quote currency per unit of base asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Create a price, rejecting zero and negative values
    pub fn try_new(value: Decimal) -> Result<Self, NumericError> {
        if value <= Decimal::ZERO {
            return Err(NumericError::NonPositivePrice(value));
        }
        Ok(Self(value.normalize()))
    }

    /// Create a price from a whole number
    pub fn from_u64(value: u64) -> Self {
        Self(Decimal::from(value))
    }

    /// Parse a price from a decimal literal such as "10.00"
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, NumericError> {
        let value = Decimal::from_str(s).map_err(|_| NumericError::Parse(s.to_string()))?;
        Self::try_new(value)
    }

    /// Get the underlying decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Non-negative order or trade quantity
///
/// Defaults to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(Decimal);

impl Quantity {
    /// Create a quantity from a trusted decimal
    ///
    /// # Panics
    /// Panics if the value is negative
    pub fn new(value: Decimal) -> Self {
        assert!(value >= Decimal::ZERO, "Quantity must not be negative");
        Self(value.normalize())
    }

    /// Create a quantity, rejecting negative values
    pub fn try_new(value: Decimal) -> Result<Self, NumericError> {
        if value < Decimal::ZERO {
            return Err(NumericError::NegativeQuantity(value));
        }
        Ok(Self(value.normalize()))
    }

    /// Zero quantity
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Create a quantity from a whole number
    pub fn from_u64(value: u64) -> Self {
        Self(Decimal::from(value))
    }

    /// Parse a quantity from a decimal literal such as "1.5"
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, NumericError> {
        let value = Decimal::from_str(s).map_err(|_| NumericError::Parse(s.to_string()))?;
        Self::try_new(value)
    }

    /// Get the underlying decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Subtract, returning None if the result would be negative
    pub fn checked_sub(self, other: Quantity) -> Option<Quantity> {
        let result = self.0 - other.0;
        if result < Decimal::ZERO {
            None
        } else {
            Some(Self(result))
        }
    }

    /// Subtract, flooring at zero
    pub fn saturating_sub(self, other: Quantity) -> Quantity {
        self.checked_sub(other).unwrap_or_else(Quantity::zero)
    }

    /// Notional value of this quantity at a price
    pub fn notional(&self, price: Price) -> Decimal {
        self.0 * price.as_decimal()
    }
}

impl Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Quantity) -> Quantity {
        Quantity(self.0 + rhs.0)
    }
}

impl AddAssign for Quantity {
    fn add_assign(&mut self, rhs: Quantity) {
        self.0 += rhs.0;
    }
}

impl std::iter::Sum for Quantity {
    fn sum<I: Iterator<Item = Quantity>>(iter: I) -> Self {
        iter.fold(Quantity::zero(), |acc, q| acc + q)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_price_rejects_non_positive() {
        assert!(Price::try_new(Decimal::ZERO).is_err());
        assert!(Price::try_new(Decimal::from(-1)).is_err());
        assert!(Price::from_str("10.00").is_ok());
    }

    #[test]
    fn test_price_equality_ignores_scale() {
        assert_eq!(Price::from_str("10.00").unwrap(), Price::from_u64(10));
    }

    #[test]
    fn test_quantity_rejects_negative() {
        assert_eq!(
            Quantity::try_new(Decimal::from(-5)),
            Err(NumericError::NegativeQuantity(Decimal::from(-5)))
        );
        assert!(Quantity::from_str("abc").is_err());
    }

    #[test]
    fn test_quantity_arithmetic() {
        let a = Quantity::from_str("1.5").unwrap();
        let b = Quantity::from_str("0.5").unwrap();
        assert_eq!(a + b, Quantity::from_u64(2));
        assert_eq!(a.checked_sub(b), Some(Quantity::from_u64(1)));
        assert_eq!(b.checked_sub(a), None);
        assert_eq!(b.saturating_sub(a), Quantity::zero());
    }

    #[test]
    fn test_notional() {
        let qty = Quantity::from_str("0.5").unwrap();
        assert_eq!(qty.notional(Price::from_u64(50000)), Decimal::from(25000));
    }

    #[test]
    fn test_serialization_is_string() {
        let price = Price::from_str("10.25").unwrap();
        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(json, "\"10.25\"");
        let back: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(back, price);
    }

    #[test]
    fn test_quantity_default_is_zero() {
        assert_eq!(Quantity::default(), Quantity::zero());
        assert!(Quantity::default().is_zero());
    }

    proptest! {
        #[test]
        fn test_quantity_saturating_sub_never_negative(
            a in 0i64..1_000_000_000,
            b in 0i64..1_000_000_000,
            scale in 0u32..8,
        ) {
            let qa = Quantity::new(Decimal::new(a, scale));
            let qb = Quantity::new(Decimal::new(b, scale));
            prop_assert_eq!((qa + qb).saturating_sub(qb), qa);
            prop_assert_eq!(qb.saturating_sub(qa + qb), Quantity::zero());
            prop_assert_eq!(qa.checked_sub(qb).is_some(), qa >= qb);
        }

        #[test]
        fn test_price_survives_string_encoding(units in 1i64..1_000_000_000_000, scale in 0u32..10) {
            let price = Price::try_new(Decimal::new(units, scale)).unwrap();
            let json = serde_json::to_string(&price).unwrap();
            let back: Price = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(back, price);
        }
    }
}
