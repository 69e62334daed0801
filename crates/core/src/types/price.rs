//! Type-safe price representation in minor currency units.
//!
//! Prices are stored and computed as an integer number of cents. Decimal
//! arithmetic is only used at the edge, when an admin types "12.50" into a
//! form, so that conversion to cents is exact.

use std::fmt;
use std::iter::Sum;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from parsing a human-entered price.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("price is required")]
    Empty,
    #[error("'{0}' is not a valid price")]
    Invalid(String),
    #[error("price cannot be negative")]
    Negative,
    #[error("price cannot have more than two decimal places")]
    TooPrecise,
    #[error("price is too large")]
    OutOfRange,
}

/// A price in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(0);

    /// Create a price from a number of cents.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Amount in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Amount in the currency's standard unit (e.g. 1999 cents -> 19.99).
    #[must_use]
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Parse a decimal amount such as `"12.5"`, `"12.50"` or `"$12.50"`.
    ///
    /// # Errors
    ///
    /// Returns `PriceError` if the input is empty, not a number, negative,
    /// has sub-cent precision, or does not fit in an `i64` number of cents.
    pub fn parse(input: &str) -> Result<Self, PriceError> {
        let trimmed = input.trim();
        let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed).trim();
        if trimmed.is_empty() {
            return Err(PriceError::Empty);
        }

        let amount =
            Decimal::from_str(trimmed).map_err(|_| PriceError::Invalid(input.trim().to_owned()))?;

        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        if amount.normalize().scale() > 2 {
            return Err(PriceError::TooPrecise);
        }

        let cents = amount
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|c| c.trunc().to_i64())
            .ok_or(PriceError::OutOfRange)?;

        Ok(Self(cents))
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.to_decimal())
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.fold(0_i64, |acc, p| acc.saturating_add(p.0)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_whole_and_fractional() {
        assert_eq!(Price::parse("12").unwrap().cents(), 1200);
        assert_eq!(Price::parse("12.5").unwrap().cents(), 1250);
        assert_eq!(Price::parse("12.50").unwrap().cents(), 1250);
        assert_eq!(Price::parse("0.99").unwrap().cents(), 99);
        assert_eq!(Price::parse(" $4.05 ").unwrap().cents(), 405);
    }

    #[test]
    fn test_parse_trailing_zeros_are_not_precision() {
        assert_eq!(Price::parse("3.500").unwrap().cents(), 350);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(Price::parse(""), Err(PriceError::Empty));
        assert_eq!(Price::parse("  $ "), Err(PriceError::Empty));
        assert!(matches!(Price::parse("ten"), Err(PriceError::Invalid(_))));
        assert_eq!(Price::parse("-1.00"), Err(PriceError::Negative));
        assert_eq!(Price::parse("1.234"), Err(PriceError::TooPrecise));
    }

    #[test]
    fn test_parse_zero_is_allowed() {
        assert_eq!(Price::parse("0").unwrap(), Price::ZERO);
        assert_eq!(Price::parse("-0").unwrap(), Price::ZERO);
    }

    #[test]
    fn test_display() {
        assert_eq!(Price::from_cents(1999).to_string(), "$19.99");
        assert_eq!(Price::from_cents(1230).to_string(), "$12.30");
        assert_eq!(Price::from_cents(5).to_string(), "$0.05");
        assert_eq!(Price::ZERO.to_string(), "$0.00");
    }

    #[test]
    fn test_sum() {
        let total: Price = [100, 250, 1]
            .into_iter()
            .map(Price::from_cents)
            .sum();
        assert_eq!(total.cents(), 351);
    }

    #[test]
    fn test_serde_as_cents() {
        assert_eq!(serde_json::to_string(&Price::from_cents(1250)).unwrap(), "1250");
    }
}
