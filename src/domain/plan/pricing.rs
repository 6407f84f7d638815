//! Plan pricing value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{Money, ValidationError};

/// How often a plan bills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingPeriod {
    Monthly,
    Annual,
}

impl BillingPeriod {
    /// Number of months covered by one charge.
    pub fn months(&self) -> i64 {
        match self {
            BillingPeriod::Monthly => 1,
            BillingPeriod::Annual => 12,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BillingPeriod::Monthly => "monthly",
            BillingPeriod::Annual => "annual",
        }
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingPeriod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(BillingPeriod::Monthly),
            "annual" => Ok(BillingPeriod::Annual),
            other => Err(ValidationError::invalid_format(
                "billing_period",
                format!("unknown billing period '{}'", other),
            )),
        }
    }
}

/// Price of a plan in a single currency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pricing {
    pub amount: Money,
    pub currency: String,
    pub billing_period: BillingPeriod,
}

impl Pricing {
    /// Creates pricing from raw cents and an ISO-4217 currency code.
    ///
    /// # Errors
    ///
    /// - `OutOfRange` if the amount is negative
    /// - `InvalidFormat` if the currency is not three uppercase letters
    pub fn new(
        amount_cents: i64,
        currency: impl Into<String>,
        billing_period: BillingPeriod,
    ) -> Result<Self, ValidationError> {
        let amount = Money::from_cents(amount_cents)?;
        let currency = currency.into();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ValidationError::invalid_format(
                "currency",
                "must be a three-letter uppercase ISO-4217 code",
            ));
        }
        Ok(Self {
            amount,
            currency,
            billing_period,
        })
    }

    /// Price normalised to one month, rounding down.
    pub fn monthly_equivalent(&self) -> Money {
        self.amount.divided_by(self.billing_period.months())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_lowercase_currency() {
        assert!(Pricing::new(1000, "usd", BillingPeriod::Monthly).is_err());
        assert!(Pricing::new(1000, "USDX", BillingPeriod::Monthly).is_err());
    }

    #[test]
    fn rejects_negative_amount() {
        let err = Pricing::new(-1, "USD", BillingPeriod::Monthly).unwrap_err();
        assert_eq!(err.field(), "amount_cents");
    }

    #[test]
    fn annual_pricing_normalises_to_monthly() {
        let annual = Pricing::new(12_000, "USD", BillingPeriod::Annual).unwrap();
        assert_eq!(annual.monthly_equivalent().cents(), 1_000);

        let monthly = Pricing::new(1_500, "USD", BillingPeriod::Monthly).unwrap();
        assert_eq!(monthly.monthly_equivalent().cents(), 1_500);
    }

    #[test]
    fn billing_period_parses_snake_case() {
        assert_eq!("annual".parse::<BillingPeriod>().unwrap(), BillingPeriod::Annual);
        assert!("weekly".parse::<BillingPeriod>().is_err());
    }
}
