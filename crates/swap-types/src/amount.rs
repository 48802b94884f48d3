//! # Amounts
//!
//! Token amounts in minor units. Backed by `U256`; every wire surface uses
//! decimal strings.

use primitive_types::U256;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, Div, Sub};

/// A nonnegative token amount in minor units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(U256);

impl Amount {
    /// Zero amount.
    pub const ZERO: Amount = Amount(U256::zero());

    /// Wrap a raw U256.
    pub fn new(value: U256) -> Self {
        Self(value)
    }

    /// Parse a decimal integer string. Rejects empty strings, signs, and
    /// non-digit characters.
    pub fn from_dec_str(s: &str) -> Option<Self> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        U256::from_dec_str(s).ok().map(Self)
    }

    /// Construct from a u64.
    pub fn from_u64(v: u64) -> Self {
        Self(U256::from(v))
    }

    /// The raw U256 value.
    pub fn raw(&self) -> U256 {
        self.0
    }

    /// True if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Saturating subtraction.
    pub fn saturating_sub(&self, other: Amount) -> Amount {
        Amount(self.0.saturating_sub(other.0))
    }

    /// Checked addition.
    pub fn checked_add(&self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// Integer division by a small divisor.
    pub fn div_u64(&self, divisor: u64) -> Amount {
        Amount(self.0 / U256::from(divisor))
    }

    /// Multiply by a small factor, saturating on overflow.
    pub fn saturating_mul_u64(&self, factor: u64) -> Amount {
        Amount(self.0.saturating_mul(U256::from(factor)))
    }

    /// The smaller of two amounts.
    pub fn min(self, other: Amount) -> Amount {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }

    /// Lossy conversion to f64, used only for price ratios.
    pub fn as_f64_lossy(&self) -> f64 {
        // U256 → f64 via decimal string; precision loss is acceptable for
        // slippage comparisons.
        self.0.to_string().parse::<f64>().unwrap_or(f64::MAX)
    }
}

impl Add for Amount {
    type Output = Amount;
    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0 + rhs.0)
    }
}

impl Sub for Amount {
    type Output = Amount;
    fn sub(self, rhs: Amount) -> Amount {
        Amount(self.0 - rhs.0)
    }
}

impl Div<u64> for Amount {
    type Output = Amount;
    fn div(self, rhs: u64) -> Amount {
        self.div_u64(rhs)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Amount::from_dec_str(&s)
            .ok_or_else(|| de::Error::custom(format!("invalid decimal amount: {s:?}")))
    }
}
