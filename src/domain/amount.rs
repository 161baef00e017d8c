//! Mint amount
//!
//! Domain primitive for the quantity requested by a mint.
//! Amounts are validated at construction time, so an invalid quantity
//! can never reach the record store.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Smallest quantity a mint may request
const MIN_AMOUNT: Decimal = Decimal::ONE;

/// Client-facing text for any amount below the minimum or not a number
const AMOUNT_MESSAGE: &str = "Amount should be greater or equal than 1";

/// MintAmount represents a validated mint quantity.
///
/// Any number of at least 1 is accepted, at full precision. The only
/// ceiling is the range of `Decimal` itself (about 7.9e28).
///
/// # Example
/// ```
/// use rust_decimal::Decimal;
/// use mint_settlement::domain::MintAmount;
///
/// let amount = MintAmount::new(Decimal::new(100, 0)).unwrap();
/// assert_eq!(amount.value(), Decimal::new(100, 0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct MintAmount(Decimal);

/// Errors that can occur when creating a MintAmount
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Amount should be greater or equal than 1 (got {0})")]
    BelowMinimum(Decimal),

    #[error("Amount should be a number")]
    NotANumber,

    #[error("Amount {0} is outside the supported decimal range")]
    OutOfRange(String),
}

impl AmountError {
    /// Text returned to API callers
    pub fn client_message(&self) -> &'static str {
        match self {
            AmountError::OutOfRange(_) => "Amount is too large",
            AmountError::BelowMinimum(_) | AmountError::NotANumber => AMOUNT_MESSAGE,
        }
    }
}

impl MintAmount {
    /// Create a new MintAmount with validation.
    ///
    /// # Errors
    /// - `AmountError::BelowMinimum` if value < 1
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value < MIN_AMOUNT {
            return Err(AmountError::BelowMinimum(value));
        }

        Ok(Self(value.normalize()))
    }

    /// Create a MintAmount from a JSON value.
    ///
    /// Only JSON numbers are accepted; numeric strings are rejected so the
    /// wire contract stays `amount: number`. The number is read from its
    /// decimal text, so no precision is lost to `f64`.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, AmountError> {
        let serde_json::Value::Number(number) = value else {
            return Err(AmountError::NotANumber);
        };

        let text = number.to_string();
        let decimal = Decimal::from_str(&text)
            .or_else(|_| Decimal::from_scientific(&text))
            .map_err(|_| AmountError::OutOfRange(text))?;

        Self::new(decimal)
    }

    /// Get the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for MintAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MintAmount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal = Decimal::from_str(s).map_err(|_| AmountError::NotANumber)?;
        MintAmount::new(decimal)
    }
}

impl TryFrom<Decimal> for MintAmount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        MintAmount::new(value)
    }
}

impl From<MintAmount> for Decimal {
    fn from(amount: MintAmount) -> Self {
        amount.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_amount_minimum_accepted() {
        let amount = MintAmount::new(dec!(1));
        assert_eq!(amount.unwrap().value(), dec!(1));
    }

    #[test]
    fn test_amount_below_one_rejected() {
        assert!(matches!(
            MintAmount::new(dec!(0.99)),
            Err(AmountError::BelowMinimum(_))
        ));
        assert!(matches!(
            MintAmount::new(Decimal::ZERO),
            Err(AmountError::BelowMinimum(_))
        ));
        assert!(matches!(
            MintAmount::new(dec!(-5)),
            Err(AmountError::BelowMinimum(_))
        ));
    }

    #[test]
    fn test_amount_keeps_full_precision() {
        let amount = MintAmount::new(dec!(1.123456789)).unwrap();
        assert_eq!(amount.value(), dec!(1.123456789));
    }

    #[test]
    fn test_amount_trailing_zeros_normalized() {
        let amount = MintAmount::new(Decimal::new(1500000000000, 10)).unwrap();
        assert_eq!(amount.value(), dec!(150));
    }

    #[test]
    fn test_amount_has_no_upper_bound_below_decimal_range() {
        let amount = MintAmount::new(dec!(2000000000000)).unwrap();
        assert_eq!(amount.value(), dec!(2000000000000));
    }

    #[test]
    fn test_amount_from_json_large_and_precise() {
        assert_eq!(
            MintAmount::from_json(&json!(2000000000000u64)).unwrap().value(),
            dec!(2000000000000)
        );
        assert_eq!(
            MintAmount::from_json(&json!(1.123456789)).unwrap().value(),
            dec!(1.123456789)
        );
    }

    #[test]
    fn test_amount_from_json_beyond_decimal_range() {
        let err = MintAmount::from_json(&json!(1e30)).unwrap_err();
        assert!(matches!(err, AmountError::OutOfRange(_)));
        assert_eq!(err.client_message(), "Amount is too large");
    }

    #[test]
    fn test_amount_from_json_number() {
        assert_eq!(MintAmount::from_json(&json!(100)).unwrap().value(), dec!(100));
        assert_eq!(MintAmount::from_json(&json!(2.5)).unwrap().value(), dec!(2.5));
    }

    #[test]
    fn test_amount_from_json_rejects_non_numbers() {
        assert_eq!(
            MintAmount::from_json(&json!("100")),
            Err(AmountError::NotANumber)
        );
        assert_eq!(MintAmount::from_json(&json!(null)), Err(AmountError::NotANumber));
        assert_eq!(MintAmount::from_json(&json!(true)), Err(AmountError::NotANumber));
    }

    #[test]
    fn test_amount_from_json_rejects_small_numbers() {
        assert!(matches!(
            MintAmount::from_json(&json!(0)),
            Err(AmountError::BelowMinimum(_))
        ));
    }
}
