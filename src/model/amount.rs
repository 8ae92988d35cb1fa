//! Amount type for handling monetary values with optional currency codes and commas.
//!
//! This module provides the `Amount` type which wraps `Decimal` and handles parsing values that
//! may or may not include a currency code such as `KES` and thousands separators.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Sub;
use std::str::FromStr;

/// The largest amount a single record may hold. Sums of many such amounts stay well inside both
/// `Decimal` range and the range `f64` represents to the cent.
pub const MAX_AMOUNT: Amount = Amount(Decimal::from_parts(1_000_000_000, 0, 0, false, 0));

/// Represents a monetary amount.
///
/// The store holds amounts as plain decimal strings (e.g. `"1234.5"`). Older documents that hold
/// a JSON number are accepted when deserializing.
///
/// # Examples
///
/// ```
/// # use farmer_ledger::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("KES 1,500.25").unwrap();
/// assert_eq!(amount.to_string(), "1500.25");
/// assert_eq!(amount.format("KES"), "KES 1,500.25");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    /// Adds `rhs`, or returns `None` if the result does not fit in a `Decimal`.
    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    /// Subtracts `rhs`, or returns `None` if the result does not fit in a `Decimal`.
    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Amount)
    }

    /// Formats the amount for display with a currency code and thousands separators, e.g.
    /// `KES 60,000.00` or `-KES 12.50`.
    pub fn format(&self, currency: &str) -> String {
        let sign = if self.0.is_sign_negative() && !self.is_zero() {
            "-"
        } else {
            ""
        };
        let num = self.0.abs().to_f64().unwrap_or_default();
        format!("{sign}{currency} {}", format_num::format_num!(",.2", num))
    }
}

/// An error that can occur when parsing strings into `Amount` values.
#[derive(Debug)]
pub enum AmountError {
    Empty,
    Decimal(rust_decimal::Error),
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AmountError::Empty => f.write_str("an amount is required"),
            AmountError::Decimal(e) => write!(f, "invalid amount: {e}"),
        }
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AmountError::Empty => None,
            AmountError::Decimal(e) => Some(e),
        }
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, trimmed),
        };

        let digits = strip_currency_code(unsigned).trim_start().replace(',', "");

        if digits.is_empty() {
            return Err(AmountError::Empty);
        }

        let value = Decimal::from_str(&digits).map_err(AmountError::Decimal)?;
        Ok(Amount(if negative { -value } else { value }))
    }
}

/// Drops a leading three letter currency code such as `KES`, when it stands alone or is followed
/// by a space or a digit. Anything else is left for the decimal parser to reject.
fn strip_currency_code(s: &str) -> &str {
    let bytes = s.as_bytes();
    if bytes.len() < 3 || !bytes[..3].iter().all(u8::is_ascii_uppercase) {
        return s;
    }
    match bytes.get(3) {
        None => &s[3..],
        Some(b) if *b == b' ' || b.is_ascii_digit() => &s[3..],
        Some(_) => s,
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0.normalize(), f)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(serde_json::Number),
        }

        let s = match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s,
            Raw::Number(n) => n.to_string(),
        };
        Amount::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Self) -> Self::Output {
        Amount(self.0 - rhs.0)
    }
}
