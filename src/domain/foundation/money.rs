//! Money value object.
//!
//! Amounts are integer minor units (cents). Floating point never
//! touches billing arithmetic, so sums and threshold comparisons are
//! exactly reproducible.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use super::ValidationError;

/// A non-negative amount in minor currency units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero amount.
    pub const ZERO: Money = Money(0);

    /// Creates an amount from cents.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` for negative amounts.
    pub fn from_cents(cents: i64) -> Result<Self, ValidationError> {
        if cents < 0 {
            return Err(ValidationError::out_of_range("amount_cents", 0, i64::MAX, cents));
        }
        Ok(Self(cents))
    }

    /// Creates an amount from whole dollars. Used for fixed policy thresholds.
    pub const fn from_dollars(dollars: i64) -> Self {
        Self(dollars * 100)
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.0
    }

    /// Divides the amount, rounding down. Used for monthly equivalents.
    pub fn divided_by(&self, divisor: i64) -> Self {
        Self(self.0 / divisor)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let cents = i64::deserialize(deserializer)?;
        Money::from_cents(cents).map_err(serde::de::Error::custom)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_cents_rejects_negative() {
        assert!(Money::from_cents(-1).is_err());
        assert_eq!(Money::from_cents(0).unwrap(), Money::ZERO);
    }

    #[test]
    fn deserialize_rejects_negative() {
        assert!(serde_json::from_str::<Money>("-5").is_err());
        assert_eq!(serde_json::from_str::<Money>("3440").unwrap().cents(), 3_440);
    }

    #[test]
    fn from_dollars_scales_to_cents() {
        assert_eq!(Money::from_dollars(1000).cents(), 100_000);
    }

    #[test]
    fn sums_exactly() {
        let total: Money = [3440, 1, 59]
            .into_iter()
            .map(|c| Money::from_cents(c).unwrap())
            .sum();
        assert_eq!(total.cents(), 3500);
    }

    #[test]
    fn displays_as_decimal() {
        assert_eq!(Money::from_cents(3440).unwrap().to_string(), "34.40");
        assert_eq!(Money::from_cents(5).unwrap().to_string(), "0.05");
    }

    #[test]
    fn divided_by_rounds_down() {
        assert_eq!(Money::from_cents(1000).unwrap().divided_by(12).cents(), 83);
    }
}
