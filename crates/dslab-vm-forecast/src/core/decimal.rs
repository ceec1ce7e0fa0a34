//! Fixed-point decimal numbers with explicit rounding.
//!
//! Forecasting models must produce bit-identical results regardless of the platform float engine,
//! so they operate on base-10 numbers represented as a big integer mantissa and a decimal scale.
//! Addition, subtraction and multiplication are exact. Division is rounded to a fixed number of
//! fractional digits using the round-half-down rule (ties are rounded toward zero).

use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::iter::Sum;
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;

use num::{BigInt, Integer, One, Signed, Zero};
use thiserror::Error;

/// Number of fractional digits kept by [`Decimal::div`].
pub const DIVISION_SCALE: u32 = 10;

/// Error returned when a string is not a plain decimal literal.
#[derive(Debug, Error, PartialEq)]
#[error("invalid decimal literal: {0:?}")]
pub struct ParseDecimalError(String);

/// Decimal number `mantissa * 10^(-scale)`.
#[derive(Clone, Debug)]
pub struct Decimal {
    mantissa: BigInt,
    scale: u32,
}

fn pow10(exp: u32) -> BigInt {
    num::pow(BigInt::from(10), exp as usize)
}

impl Decimal {
    /// Creates decimal `mantissa * 10^(-scale)`.
    pub fn new<T: Into<BigInt>>(mantissa: T, scale: u32) -> Self {
        Self {
            mantissa: mantissa.into(),
            scale,
        }
    }

    pub fn zero() -> Self {
        Self::new(0, 0)
    }

    pub fn one() -> Self {
        Self::new(1, 0)
    }

    /// Converts a binary float using its shortest round-trip decimal representation,
    /// so that `0.1_f64` becomes exactly `0.1`. Non-finite values are mapped to zero.
    pub fn from_f64(value: f64) -> Self {
        if !value.is_finite() {
            return Self::zero();
        }
        value.to_string().parse().unwrap_or_else(|_| Self::zero())
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.mantissa.is_negative()
    }

    /// Mantissa of this number expressed at a scale not lower than the current one.
    fn mantissa_at(&self, scale: u32) -> BigInt {
        debug_assert!(scale >= self.scale);
        &self.mantissa * pow10(scale - self.scale)
    }

    /// Divides by `other` keeping `scale` fractional digits, rounding half down.
    ///
    /// Panics if `other` is zero.
    pub fn div_rounded(&self, other: &Decimal, scale: u32) -> Decimal {
        assert!(!other.is_zero(), "decimal division by zero");
        // self / other * 10^scale = (m1 * 10^(s2 + scale)) / (m2 * 10^s1)
        let numerator = &self.mantissa * pow10(other.scale + scale);
        let denominator = &other.mantissa * pow10(self.scale);
        let (mut quotient, remainder) = numerator.div_rem(&denominator);
        if remainder.abs() * BigInt::from(2) > denominator.abs() {
            if numerator.is_negative() != denominator.is_negative() {
                quotient -= BigInt::one();
            } else {
                quotient += BigInt::one();
            }
        }
        Decimal::new(quotient, scale)
    }

    /// Divides by `other` with [`DIVISION_SCALE`] fractional digits.
    pub fn div(&self, other: &Decimal) -> Decimal {
        self.div_rounded(other, DIVISION_SCALE)
    }

    /// Smallest integer not less than this number.
    pub fn ceil(&self) -> BigInt {
        let (quotient, remainder) = self.mantissa.div_mod_floor(&pow10(self.scale));
        if remainder.is_zero() {
            quotient
        } else {
            quotient + BigInt::one()
        }
    }

    /// Clamps the number to `[0, 1]`.
    pub fn clamp_unit(self) -> Decimal {
        if self.is_negative() {
            Decimal::zero()
        } else if self > Decimal::one() {
            Decimal::one()
        } else {
            self
        }
    }

    /// Lossy conversion to a binary float.
    pub fn to_f64(&self) -> f64 {
        self.to_string().parse().unwrap_or(f64::NAN)
    }
}

impl From<u32> for Decimal {
    fn from(value: u32) -> Self {
        Decimal::new(value, 0)
    }
}

impl From<u64> for Decimal {
    fn from(value: u64) -> Self {
        Decimal::new(value, 0)
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Decimal::new(value, 0)
    }
}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseDecimalError(s.to_string());
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(err());
        }
        if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
            return Err(err());
        }
        let joined = format!("{}{}", int_part, frac_part);
        let mut mantissa = BigInt::from_str(if joined.is_empty() { "0" } else { &joined }).map_err(|_| err())?;
        if negative {
            mantissa = -mantissa;
        }
        Ok(Decimal::new(mantissa, frac_part.len() as u32))
    }
}

impl Display for Decimal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let digits = self.mantissa.abs().to_string();
        let sign = if self.mantissa.is_negative() { "-" } else { "" };
        let scale = self.scale as usize;
        if scale == 0 {
            return write!(f, "{}{}", sign, digits);
        }
        let padded = format!("{:0>width$}", digits, width = scale + 1);
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        write!(f, "{}{}.{}", sign, int_part, frac_part)
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Decimal {}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        let scale = self.scale.max(other.scale);
        self.mantissa_at(scale).cmp(&other.mantissa_at(scale))
    }
}

impl<'a> Add<&'a Decimal> for &'a Decimal {
    type Output = Decimal;

    fn add(self, other: &'a Decimal) -> Decimal {
        let scale = self.scale.max(other.scale);
        Decimal::new(self.mantissa_at(scale) + other.mantissa_at(scale), scale)
    }
}

impl<'a> Sub<&'a Decimal> for &'a Decimal {
    type Output = Decimal;

    fn sub(self, other: &'a Decimal) -> Decimal {
        let scale = self.scale.max(other.scale);
        Decimal::new(self.mantissa_at(scale) - other.mantissa_at(scale), scale)
    }
}

impl<'a> Mul<&'a Decimal> for &'a Decimal {
    type Output = Decimal;

    fn mul(self, other: &'a Decimal) -> Decimal {
        Decimal::new(&self.mantissa * &other.mantissa, self.scale + other.scale)
    }
}

impl Add for Decimal {
    type Output = Decimal;

    fn add(self, other: Decimal) -> Decimal {
        &self + &other
    }
}

impl Sub for Decimal {
    type Output = Decimal;

    fn sub(self, other: Decimal) -> Decimal {
        &self - &other
    }
}

impl Mul for Decimal {
    type Output = Decimal;

    fn mul(self, other: Decimal) -> Decimal {
        &self * &other
    }
}

impl Neg for Decimal {
    type Output = Decimal;

    fn neg(self) -> Decimal {
        Decimal::new(-self.mantissa, self.scale)
    }
}

impl Sum for Decimal {
    fn sum<I: Iterator<Item = Decimal>>(iter: I) -> Decimal {
        iter.fold(Decimal::zero(), |acc, x| acc + x)
    }
}
