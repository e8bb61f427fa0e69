//! [`Money`]-related definitions.

use std::{fmt, str::FromStr};

use rust_decimal::{prelude::ToPrimitive as _, Decimal};

use crate::define_kind;

/// Amount of money in some [`Currency`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Money {
    /// Amount of this [`Money`].
    pub amount: Decimal,

    /// [`Currency`] of this amount.
    pub currency: Currency,
}

impl Money {
    /// Creates a new [`Money`] amount in Indian Rupees.
    #[must_use]
    pub const fn inr(amount: Decimal) -> Self {
        Self {
            amount,
            currency: Currency::Inr,
        }
    }

    /// Indicates whether this [`Money`] amount is strictly positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Returns this [`Money`] amount expressed in minor currency units
    /// (hundredths).
    ///
    /// [`None`] is returned if the amount has a fraction of a minor unit or
    /// doesn't fit into [`u64`].
    #[must_use]
    pub fn minor_units(&self) -> Option<u64> {
        let minor = self.amount.checked_mul(Decimal::ONE_HUNDRED)?;
        if !minor.is_integer() {
            return None;
        }
        minor.to_u64()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { amount, currency } = self;
        match amount.to_i128().filter(|_| amount.is_integer()) {
            Some(int) => write!(f, "{int}{currency}"),
            None => write!(f, "{}{currency}", amount.normalize()),
        }
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < 4 {
            return Err("too short");
        }

        let (amount, currency) = s.split_at(s.len() - 3);
        let amount = Decimal::from_str(amount).map_err(|_| "invalid amount")?;
        let currency =
            Currency::from_str(currency).map_err(|_| "invalid currency")?;

        Ok(Self { amount, currency })
    }
}

define_kind! {
    #[doc = "Currency of a [`Money`] amount."]
    enum Currency {
        #[doc = "Indian Rupee."]
        Inr = 1 => "INR",

        #[doc = "US Dollar."]
        Usd = 2 => "USD",

        #[doc = "Euro."]
        Eur = 3 => "EUR",
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::str::FromStr as _;

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Money in `{major}.{minor}{currency}` format, where:
    /// - `major` is an integer;
    /// - `minor` is an optional integer;
    /// - `currency` is a three-letter currency code.
    #[graphql_scalar(with = Self, parse_token(String))]
    type Money = super::Money;

    impl Money {
        fn to_output<S: ScalarValue>(m: &Money) -> Value<S> {
            Value::scalar(m.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Money` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_str(s).map_err(|e| {
                        format!("Cannot parse `Money` input scalar: {e}")
                    })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::{Currency, Money};

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn from_str() {
        assert_eq!(
            Money::from_str("1500.50INR").unwrap(),
            Money::inr(decimal("1500.50")),
        );
        assert_eq!(
            Money::from_str("123.45EUR").unwrap(),
            Money {
                amount: decimal("123.45"),
                currency: Currency::Eur,
            },
        );

        assert!(Money::from_str("123.45").is_err());
        assert!(Money::from_str("123.45inr").is_err());
        assert!(Money::from_str("123.45Rupees").is_err());
        assert!(Money::from_str("123INR").is_ok());
    }

    #[test]
    fn to_string() {
        assert_eq!(Money::inr(decimal("1500.50")).to_string(), "1500.5INR");
        assert_eq!(Money::inr(decimal("1500.00")).to_string(), "1500INR");
        assert_eq!(
            Money {
                amount: decimal("9.99"),
                currency: Currency::Usd,
            }
            .to_string(),
            "9.99USD",
        );
    }

    #[test]
    fn minor_units() {
        assert_eq!(Money::inr(decimal("1500")).minor_units(), Some(150_000));
        assert_eq!(Money::inr(decimal("12.34")).minor_units(), Some(1234));
        assert_eq!(Money::inr(decimal("0.001")).minor_units(), None);
        assert_eq!(Money::inr(decimal("-1")).minor_units(), None);
    }

    #[test]
    fn positivity() {
        assert!(Money::inr(decimal("0.01")).is_positive());
        assert!(!Money::inr(Decimal::ZERO).is_positive());
        assert!(!Money::inr(decimal("-5")).is_positive());
    }
}
