use std::fmt;
use std::str::FromStr;

use bigdecimal::num_bigint::{BigInt, Sign};
use bigdecimal::{BigDecimal, Signed, Zero};

/// A CQL `decimal`: an arbitrary precision unscaled integer and a scale, with
/// the value `unscaled × 10^-scale`.
///
/// The scale is part of the value. `1.0` and `1.00` are different decimals
/// here even though they are numerically equal, which is what lets a decimal
/// survive a round trip through the wire format unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CqlDecimal {
    unscaled: BigInt,
    scale: i32,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidDecimal {
    #[error("invalid decimal literal `{0}`")]
    Parse(String),
    #[error("decimal scale {0} does not fit in 32 bits")]
    ScaleOutOfRange(i64),
    #[error("{0} has no decimal representation")]
    NotFinite(f64),
}

impl CqlDecimal {
    pub fn new<I: Into<BigInt>>(unscaled: I, scale: i32) -> Self {
        CqlDecimal {
            unscaled: unscaled.into(),
            scale,
        }
    }

    /// Take the scale from the digits after the decimal point of `value`.
    ///
    /// Fixed point input always has a non-negative scale. Exponent notation
    /// such as `1e3` keeps its exponent as a negative scale (`1` with scale
    /// `-3`) rather than being expanded.
    pub fn from_big_decimal(value: &BigDecimal) -> Result<Self, InvalidDecimal> {
        let (unscaled, exponent) = value.as_bigint_and_exponent();
        let scale = i32::try_from(exponent).map_err(|_| InvalidDecimal::ScaleOutOfRange(exponent))?;
        Ok(CqlDecimal::new(unscaled, scale))
    }

    /// Force `value` to `scale` fractional digits, dropping any beyond it.
    /// Negative scales are clamped to zero.
    pub fn with_scale(value: &BigDecimal, scale: i32) -> Self {
        let scale = scale.max(0);
        let (unscaled, _) = value.with_scale(i64::from(scale)).into_bigint_and_exponent();
        CqlDecimal::new(unscaled, scale)
    }

    /// Convert through the shortest decimal string which round trips to
    /// `value`, so `0.1` becomes `1` with scale `1` rather than the exact
    /// binary expansion.
    pub fn from_f64(value: f64) -> Result<Self, InvalidDecimal> {
        if !value.is_finite() {
            return Err(InvalidDecimal::NotFinite(value));
        }
        value.to_string().parse()
    }

    pub fn unscaled(&self) -> &BigInt {
        &self.unscaled
    }

    pub fn scale(&self) -> i32 {
        self.scale
    }

    pub fn into_parts(self) -> (BigInt, i32) {
        (self.unscaled, self.scale)
    }

    pub fn is_zero(&self) -> bool {
        self.unscaled.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.unscaled.is_negative()
    }

    /// The exact numeric value.
    pub fn to_big_decimal(&self) -> BigDecimal {
        BigDecimal::new(self.unscaled.clone(), i64::from(self.scale))
    }

    pub fn to_f64(&self) -> Option<f64> {
        self.to_string().parse().ok()
    }
}

impl FromStr for CqlDecimal {
    type Err = InvalidDecimal;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = BigDecimal::from_str(s.trim()).map_err(|_| InvalidDecimal::Parse(s.to_string()))?;
        CqlDecimal::from_big_decimal(&value)
    }
}

impl TryFrom<&BigDecimal> for CqlDecimal {
    type Error = InvalidDecimal;

    fn try_from(value: &BigDecimal) -> Result<Self, Self::Error> {
        CqlDecimal::from_big_decimal(value)
    }
}

impl From<&CqlDecimal> for BigDecimal {
    fn from(d: &CqlDecimal) -> Self {
        d.to_big_decimal()
    }
}

/// Plain fixed point notation which keeps trailing zeros, `1.00` stays
/// `1.00`. A negative scale is written as an exponent, `12E3`.
impl fmt::Display for CqlDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale < 0 {
            return write!(f, "{}E{}", self.unscaled, -i64::from(self.scale));
        }
        let digits = self.unscaled.magnitude().to_string();
        if self.unscaled.sign() == Sign::Minus {
            f.write_str("-")?;
        }
        if self.scale == 0 {
            return f.write_str(&digits);
        }
        let scale = self.scale.unsigned_abs() as usize;
        if digits.len() > scale {
            let (int, frac) = digits.split_at(digits.len() - scale);
            write!(f, "{}.{}", int, frac)
        } else {
            write!(f, "0.{}{}", "0".repeat(scale - digits.len()), digits)
        }
    }
}
