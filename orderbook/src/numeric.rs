//! Amounts and rates.
//!
//! Amounts are unsigned 256-bit integers in a currency's smallest unit and
//! travel as decimal strings. Rates are fixed-point decimals (quote per base).
//! Converting base to quote truncates toward zero. Orders worth less than one
//! quote unit are rejected by the engine, so nothing trades for free.
use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::errors::EngineError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Amount(U256);

impl Amount {
    pub const ZERO: Amount = Amount(U256([0; 4]));
    pub const ONE: Amount = Amount(U256([1, 0, 0, 0]));

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn as_u256(&self) -> U256 {
        self.0
    }

    pub fn checked_add(self, rhs: Amount) -> Result<Amount, EngineError> {
        self.0
            .checked_add(rhs.0)
            .map(Amount)
            .ok_or_else(|| EngineError::InvalidAmount(format!("{self} + {rhs} overflows")))
    }

    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Amount)
    }

    pub fn saturating_sub(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_sub(rhs.0))
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Amount(U256::from(value))
    }
}

impl From<u128> for Amount {
    fn from(value: u128) -> Self {
        Amount(U256::from(value))
    }
}

impl From<U256> for Amount {
    fn from(value: U256) -> Self {
        Amount(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for Amount {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(EngineError::InvalidAmount(s.to_string()));
        }
        U256::from_dec_str(digits)
            .map(Amount)
            .map_err(|_| EngineError::InvalidAmount(s.to_string()))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Price of one base unit in quote units. Always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Rate(Decimal);

impl Rate {
    pub fn new(value: Decimal) -> Result<Self, EngineError> {
        if value <= Decimal::ZERO {
            return Err(EngineError::InvalidRate(value.to_string()));
        }
        Ok(Rate(value.normalize()))
    }

    /// Accept a float rate from callers that still carry one.
    pub fn from_f64(value: f64) -> Result<Self, EngineError> {
        if !value.is_finite() {
            return Err(EngineError::InvalidRate(value.to_string()));
        }
        let decimal =
            Decimal::try_from(value).map_err(|e| EngineError::InvalidRate(e.to_string()))?;
        Rate::new(decimal)
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Quote owed for `base` units at this rate, truncated toward zero.
    pub fn quote_for(&self, base: Amount) -> Result<Amount, EngineError> {
        let mantissa = U256::from(self.0.mantissa().unsigned_abs());
        let scale = U256::exp10(self.0.scale() as usize);
        base.0
            .checked_mul(mantissa)
            .map(|product| Amount(product / scale))
            .ok_or_else(|| EngineError::InvalidAmount(format!("{base} x {self} overflows")))
    }
}

impl TryFrom<Decimal> for Rate {
    type Error = EngineError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Rate::new(value)
    }
}

impl From<Rate> for Decimal {
    fn from(rate: Rate) -> Decimal {
        rate.0
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for Rate {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value =
            Decimal::from_str(s.trim()).map_err(|_| EngineError::InvalidRate(s.to_string()))?;
        Rate::new(value)
    }
}
