//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are stored as `NUMERIC(10, 2)`: at most 8 integer digits and
//! exactly 2 fractional digits. A [`Price`] is always strictly positive and
//! always carries a scale of 2, so `10` and `10.00` serialize identically.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// Zero or negative amount.
    #[error("price must be greater than zero")]
    NotPositive,
    /// More than two fractional digits.
    #[error("price must have at most {max} decimal places")]
    TooPrecise {
        /// Maximum fractional digits.
        max: u32,
    },
    /// Too many integer digits for the column.
    #[error("price must have at most {max} digits before the decimal point")]
    TooLarge {
        /// Maximum integer digits.
        max: u32,
    },
}

/// A positive unit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Fractional digits kept for every price.
    pub const SCALE: u32 = 2;

    /// Integer digits allowed by `NUMERIC(10, 2)`.
    pub const MAX_INTEGER_DIGITS: u32 = 8;

    /// Validate and normalize an amount.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is not positive, has more than two
    /// decimal places, or does not fit in `NUMERIC(10, 2)`.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount <= Decimal::ZERO {
            return Err(PriceError::NotPositive);
        }

        let normalized = amount.normalize();
        if normalized.scale() > Self::SCALE {
            return Err(PriceError::TooPrecise { max: Self::SCALE });
        }

        if amount.trunc() >= Decimal::from(10_i64.pow(Self::MAX_INTEGER_DIGITS)) {
            return Err(PriceError::TooLarge {
                max: Self::MAX_INTEGER_DIGITS,
            });
        }

        let mut rescaled = normalized;
        rescaled.rescale(Self::SCALE);
        Ok(Self(rescaled))
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_price_is_rescaled_to_two_places() {
        assert_eq!(Price::new(dec("10")).unwrap().to_string(), "10.00");
        assert_eq!(Price::new(dec("4.5")).unwrap().to_string(), "4.50");
        assert_eq!(Price::new(dec("4.500")).unwrap().to_string(), "4.50");
    }

    #[test]
    fn test_price_rejects_zero_and_negative() {
        assert_eq!(Price::new(Decimal::ZERO), Err(PriceError::NotPositive));
        assert_eq!(Price::new(dec("-1.00")), Err(PriceError::NotPositive));
    }

    #[test]
    fn test_price_rejects_sub_cent_amounts() {
        assert_eq!(
            Price::new(dec("1.005")),
            Err(PriceError::TooPrecise { max: 2 })
        );
    }

    #[test]
    fn test_price_rejects_amounts_beyond_column() {
        assert!(Price::new(dec("99999999.99")).is_ok());
        assert_eq!(
            Price::new(dec("100000000")),
            Err(PriceError::TooLarge { max: 8 })
        );
    }

    #[test]
    fn test_price_serializes_as_string() {
        let price = Price::new(dec("19.9")).unwrap();
        assert_eq!(serde_json::to_string(&price).unwrap(), "\"19.90\"");
    }

    #[test]
    fn test_price_deserializes_from_string_or_number() {
        let from_str: Price = serde_json::from_str("\"5\"").unwrap();
        let from_num: Price = serde_json::from_str("5").unwrap();
        assert_eq!(from_str, from_num);
        assert!(serde_json::from_str::<Price>("\"0\"").is_err());
    }
}
