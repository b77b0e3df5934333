//! Monetary fare amount with 2 decimal places precision.
//!
//! Uses `rust_decimal` internally with scale enforcement so that fares are
//! charged and reported without floating-point drift.

use crate::error::{CappingError, Result};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A fare amount that always carries exactly 2 decimal places.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use fare_capping::Fare;
///
/// let fare = Fare::from_str("2.9").unwrap();
/// assert_eq!(fare.to_string(), "2.90");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Fare(Decimal);

impl Fare {
    /// The number of decimal places to maintain.
    pub const SCALE: u32 = 2;

    /// A free trip.
    pub const ZERO: Self = Fare(Decimal::ZERO);

    /// Creates a new `Fare` from a `Decimal`, normalizing to 2 decimal places.
    pub fn new(value: Decimal) -> Self {
        let mut normalized = value;
        normalized.rescale(Self::SCALE);
        Fare(normalized)
    }

    /// Creates a `Fare` only if `value` needs no rounding to fit 2 places.
    ///
    /// Used for configured fares, which must be charged exactly as given.
    pub fn exact(value: Decimal) -> Result<Self> {
        if value.normalize().scale() > Self::SCALE {
            return Err(CappingError::InvalidConfiguration(format!(
                "fare {} has more than {} decimal places",
                value,
                Self::SCALE
            )));
        }
        Ok(Fare::new(value))
    }

    /// The standard fare charged for a non-capped trip (2.90).
    pub fn standard() -> Self {
        Fare(Decimal::new(290, Self::SCALE))
    }

    /// Returns `true` if this fare is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns `true` if this amount is below zero.
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }
}

impl FromStr for Fare {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let decimal = Decimal::from_str(s.trim())?;
        Ok(Fare::new(decimal))
    }
}

impl fmt::Display for Fare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Serialize for Fare {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_normalizes_scale() {
        assert_eq!(Fare::from_str("2.9").unwrap().to_string(), "2.90");
        assert_eq!(Fare::from_str("3").unwrap().to_string(), "3.00");
        assert_eq!(Fare::from_str("  1.25 ").unwrap().to_string(), "1.25");
    }

    #[test]
    fn test_zero_formats_with_two_places() {
        assert!(Fare::ZERO.is_zero());
        assert_eq!(Fare::ZERO.to_string(), "0.00");
    }

    #[test]
    fn test_standard_fare() {
        assert_eq!(Fare::standard(), Fare::from_str("2.90").unwrap());
        assert_eq!(Fare::standard().to_string(), "2.90");
    }

    #[test]
    fn test_negative_detection() {
        assert!(Fare::from_str("-0.01").unwrap().is_negative());
        assert!(!Fare::ZERO.is_negative());
        assert!(!Fare::from_str("-0").unwrap().is_negative());
        assert!(!Fare::standard().is_negative());
    }

    #[test]
    fn test_exact_rejects_sub_cent_fares() {
        let err = Fare::exact(Decimal::from_str("2.905").unwrap()).unwrap_err();
        assert!(matches!(err, CappingError::InvalidConfiguration(_)));

        let trailing_zeros = Fare::exact(Decimal::from_str("2.9000").unwrap()).unwrap();
        assert_eq!(trailing_zeros.to_string(), "2.90");
        assert_eq!(Fare::exact(Decimal::from(3)).unwrap().to_string(), "3.00");
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(Fare::from_str("two").is_err());
    }
}
