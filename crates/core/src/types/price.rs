//! Type-safe price representation using decimal arithmetic.
//!
//! The storefront trades in a single currency (NPR), so a price is just a
//! non-negative decimal amount. On the wire it is a plain JSON number; whole
//! amounts serialize as integers (`999`, not `999.0`).

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::loose::LoosePrice;

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// No value was provided.
    #[error("price is missing")]
    Missing,
    /// The input string is empty.
    #[error("price cannot be empty")]
    Empty,
    /// The input does not parse as a number.
    #[error("price is not a number: {0}")]
    NotANumber(String),
    /// The number is NaN or infinite.
    #[error("price must be a finite number")]
    NotFinite,
    /// The number is below zero.
    #[error("price cannot be negative")]
    Negative,
}

/// A non-negative amount of money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// Zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if the amount is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount.normalize()))
    }

    /// Create a price from whole currency units.
    #[must_use]
    pub const fn from_units(units: u32) -> Self {
        Self(Decimal::from_parts(units, 0, 0, false, 0))
    }

    /// Create a price from a float, rejecting NaN, infinities and negatives.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not finite or is negative.
    pub fn from_f64(value: f64) -> Result<Self, PriceError> {
        if !value.is_finite() {
            return Err(PriceError::NotFinite);
        }
        let amount = Decimal::from_f64(value).ok_or(PriceError::NotFinite)?;
        Self::new(amount)
    }

    /// Parse a price from user or upstream text.
    ///
    /// Surrounding whitespace is ignored. Accepts plain decimals (`"12.50"`)
    /// and exponent notation (`"1e3"`).
    ///
    /// # Errors
    ///
    /// Returns an error if the text is empty, not numeric, not finite, or
    /// negative.
    pub fn parse(input: &str) -> Result<Self, PriceError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(PriceError::Empty);
        }

        if let Ok(amount) = Decimal::from_str(trimmed) {
            return Self::new(amount);
        }

        let value = trimmed
            .parse::<f64>()
            .map_err(|_| PriceError::NotANumber(trimmed.to_string()))?;
        Self::from_f64(value)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    /// The amount as a float, for display and loose storage.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }

    /// Price of `qty` units, or `None` if the amount is not representable.
    #[must_use]
    pub fn times(self, qty: u32) -> Option<Self> {
        self.0.checked_mul(Decimal::from(qty)).map(Self)
    }

    /// `self + rhs`, or `None` on overflow.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Sum of `prices` in order. An amount that would overflow the running
    /// total is left out.
    #[must_use]
    pub fn total(prices: impl IntoIterator<Item = Self>) -> Self {
        prices
            .into_iter()
            .fold(Self::ZERO, |acc, price| acc.checked_add(price).unwrap_or(acc))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rs. {}", self.0.round_dp(2))
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let amount = self.0.normalize();
        if amount.scale() == 0
            && let Some(units) = amount.to_i64()
        {
            return serializer.serialize_i64(units);
        }
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        LoosePrice::deserialize(deserializer)?
            .resolve()
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_padded_decimal() {
        let price = Price::parse("  12.50 ").unwrap();
        assert_eq!(price.amount(), Decimal::new(125, 1));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(
            Price::parse("abc"),
            Err(PriceError::NotANumber("abc".to_string()))
        );
        assert_eq!(Price::parse("   "), Err(PriceError::Empty));
        assert_eq!(Price::parse("NaN"), Err(PriceError::NotFinite));
        assert_eq!(Price::parse("-5"), Err(PriceError::Negative));
    }

    #[test]
    fn test_parse_exponent_notation() {
        assert_eq!(Price::parse("1e3").unwrap(), Price::from_units(1000));
    }

    #[test]
    fn test_from_f64_rejects_non_finite() {
        assert_eq!(Price::from_f64(f64::NAN), Err(PriceError::NotFinite));
        assert_eq!(Price::from_f64(f64::INFINITY), Err(PriceError::NotFinite));
        assert_eq!(Price::from_f64(-0.5), Err(PriceError::Negative));
    }

    #[test]
    fn test_whole_prices_serialize_as_integers() {
        assert_eq!(
            serde_json::to_string(&Price::from_units(999)).unwrap(),
            "999"
        );
        assert_eq!(
            serde_json::to_string(&Price::parse("999.00").unwrap()).unwrap(),
            "999"
        );
        assert_eq!(
            serde_json::to_string(&Price::parse("12.5").unwrap()).unwrap(),
            "12.5"
        );
    }

    #[test]
    fn test_deserialize_from_number_or_string() {
        let from_number: Price = serde_json::from_str("550").unwrap();
        let from_text: Price = serde_json::from_str("\"550\"").unwrap();
        assert_eq!(from_number, Price::from_units(550));
        assert_eq!(from_text, Price::from_units(550));
        assert!(serde_json::from_str::<Price>("\"free\"").is_err());
    }

    #[test]
    fn test_times_and_total() {
        let total = Price::total([
            Price::from_units(150).times(2).unwrap(),
            Price::from_units(999),
        ]);
        assert_eq!(total, Price::from_units(1299));
    }

    #[test]
    fn test_overflow_is_not_a_panic() {
        let max = Price::parse("79228162514264337593543950335").unwrap();
        assert_eq!(max.times(1), Some(max));
        assert_eq!(Price::parse("5e28").unwrap().times(2), None);
        assert_eq!(max.checked_add(Price::from_units(1)), None);

        let total = Price::total([Price::from_units(150), max, Price::from_units(999)]);
        assert_eq!(total, Price::from_units(1149));
    }

    #[test]
    fn test_display() {
        assert_eq!(Price::from_units(1150).to_string(), "Rs. 1150");
    }
}
