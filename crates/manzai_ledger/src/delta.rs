//! Credit top-up amounts.

use manzai_error::{LedgerError, LedgerErrorKind, LedgerResult};
use serde_json::Value;
use std::str::FromStr;

/// Largest amount accepted in one top-up.
pub const MAX_CREDIT_DELTA: u32 = 100_000;

/// A validated, positive number of credits to add.
///
/// Accepted forms are a positive integer, a numeric string, or one of the
/// product identifiers `credit_1`, `credit_10` and `credit_100`.
///
/// # Examples
///
/// ```
/// use manzai_ledger::CreditDelta;
///
/// assert_eq!("credit_10".parse::<CreditDelta>().unwrap().amount(), 10);
/// assert_eq!(" 5 ".parse::<CreditDelta>().unwrap().amount(), 5);
/// assert!("credit_7".parse::<CreditDelta>().is_err());
/// assert!("0".parse::<CreditDelta>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub struct CreditDelta(u32);

impl CreditDelta {
    /// Validate a raw amount.
    ///
    /// # Errors
    ///
    /// Returns an error for zero or amounts above [`MAX_CREDIT_DELTA`].
    pub fn new(amount: u32) -> LedgerResult<Self> {
        if amount == 0 || amount > MAX_CREDIT_DELTA {
            return Err(invalid(format!(
                "amount must be between 1 and {}, got {}",
                MAX_CREDIT_DELTA, amount
            )));
        }
        Ok(Self(amount))
    }

    /// Credits to add.
    pub fn amount(&self) -> u32 {
        self.0
    }

    /// Parse a JSON value sent by a client.
    ///
    /// # Errors
    ///
    /// Returns an error for any value other than a positive integer, a
    /// numeric string or a known product identifier.
    pub fn from_json(value: &Value) -> LedgerResult<Self> {
        match value {
            Value::Number(n) => {
                let amount = n
                    .as_u64()
                    .or_else(|| {
                        n.as_f64()
                            .filter(|f| f.fract() == 0.0 && *f > 0.0)
                            .map(|f| f as u64)
                    })
                    .ok_or_else(|| invalid(format!("not a positive integer: {}", n)))?;
                Self::new(u32::try_from(amount).map_err(|_| invalid(format!("too large: {}", n)))?)
            }
            Value::String(s) => s.parse(),
            other => Err(invalid(format!("unsupported value: {}", other))),
        }
    }
}

impl FromStr for CreditDelta {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "credit_1" => return Self::new(1),
            "credit_10" => return Self::new(10),
            "credit_100" => return Self::new(100),
            _ => {}
        }
        let amount: u32 = s
            .parse()
            .map_err(|_| invalid(format!("unknown credit amount: {}", s)))?;
        Self::new(amount)
    }
}

fn invalid(message: String) -> LedgerError {
    LedgerError::new(LedgerErrorKind::InvalidDelta(message))
}
