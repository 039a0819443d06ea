//! Numeric representations
//!
//! A closed set of variants sharing one arithmetic interface:
//! - `Integer`: fixed-width i64, promoted to `Decimal` on overflow (never wraps)
//! - `Float`: binary f64
//! - `Decimal`: arbitrary precision decimal built on dashu-float's DBig
//!
//! Mixed operations promote to the wider representation:
//! Integer < Float < Decimal, except that a non-finite float forces Float.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use dashu_float::DBig;
use dashu_float::ops::Abs;
use dashu_int::IBig;
use dashu_int::ops::BitTest;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Error type for number operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NumberError {
    #[error("Invalid number format: {0}")]
    ParseError(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Overflow: {value} does not fit in {target}")]
    Overflow { value: String, target: &'static str },

    #[error("Domain error: {0}")]
    DomainError(String),
}

/// Working precision for decimal arithmetic (significant decimal digits)
pub const DECIMAL_PRECISION: usize = 50;

/// Largest number of significant digits a literal may have and still be
/// read back as an f64 without loss.
const FLOAT_LITERAL_DIGITS: usize = 15;

/// Bound on decimal exponents: literals beyond it are rejected and powers
/// that would reach it fail with `Overflow`.
pub const MAX_DECIMAL_EXPONENT: i64 = 1 << 40;

/// Padding zeros written out before display switches to `<digits>e<exponent>`
const PLAIN_ZEROS: usize = 64;

/// 2^63 as f64; the first magnitude an i64 cannot hold.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

/// A numeric value in one of the supported representations.
#[derive(Debug, Clone)]
pub enum Number {
    Integer(i64),
    Float(f64),
    Decimal(DBig),
}

/// Both operands lifted to a common representation.
enum Promoted {
    Integers(i64, i64),
    Floats(f64, f64),
    Decimals(DBig, DBig),
}

fn work(val: DBig) -> DBig {
    val.with_precision(DECIMAL_PRECISION).value()
}

fn ten_pow(exp: usize) -> IBig {
    IBig::from(10u8).pow(exp)
}

/// Decimal digits of `|n|`; zero has one.
fn digit_count(n: &IBig) -> usize {
    let text = n.to_string();
    text.trim_start_matches('-').len()
}

impl Number {
    // ========== Construction ==========

    /// Wrap a decimal at working precision.
    pub fn decimal(val: DBig) -> Self {
        Number::Decimal(work(val))
    }

    /// Exact `significand × 10^exponent`, kept `Integer` when it is one.
    pub fn from_parts(significand: i64, exponent: isize) -> Self {
        if exponent >= 0 {
            let scaled = u32::try_from(exponent)
                .ok()
                .and_then(|e| 10i64.checked_pow(e))
                .and_then(|p| significand.checked_mul(p));
            if let Some(n) = scaled {
                return Number::Integer(n);
            }
        }
        Number::decimal(DBig::from_parts(IBig::from(significand), exponent))
    }

    /// Parse a locale-neutral numeric literal.
    ///
    /// Accepted forms: `42`, `-3.14`, `+.5`, `1.5e10`, `602214076E-15`.
    /// Literals without fraction or exponent become `Integer` when they fit,
    /// `Decimal` otherwise. Literals with at most 15 significant digits become
    /// `Float`; longer ones keep every digit as `Decimal`.
    pub fn from_str(s: &str) -> Result<Self, NumberError> {
        let s = s.trim();
        let literal = Literal::scan(s).ok_or_else(|| NumberError::ParseError(s.to_string()))?;

        if literal.is_integral() {
            if let Ok(n) = s.parse::<i64>() {
                return Ok(Number::Integer(n));
            }
            return Ok(Number::decimal(literal.to_decimal()?));
        }

        if literal.significant_digits() <= FLOAT_LITERAL_DIGITS {
            let f: f64 = s.parse().map_err(|_| NumberError::ParseError(s.to_string()))?;
            // a zero from a non-zero literal is an underflow
            if f.is_finite() && (f != 0.0 || literal.significant_digits() == 0) {
                return Ok(Number::Float(f));
            }
        }

        Ok(Number::decimal(literal.to_decimal()?))
    }

    // ========== Predicates ==========

    pub fn is_zero(&self) -> bool {
        match self {
            Number::Integer(n) => *n == 0,
            Number::Float(f) => *f == 0.0,
            Number::Decimal(d) => *d == DBig::ZERO,
        }
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Number::Integer(n) => *n < 0,
            Number::Float(f) => *f < 0.0,
            Number::Decimal(d) => *d < DBig::ZERO,
        }
    }

    pub fn is_integer(&self) -> bool {
        match self {
            Number::Integer(_) => true,
            Number::Float(f) => f.is_finite() && f.fract() == 0.0,
            Number::Decimal(d) => {
                let (significand, exponent) = d.clone().into_repr().into_parts();
                let shift = exponent.unsigned_abs();
                if exponent >= 0 || significand == IBig::ZERO {
                    true
                } else if shift >= digit_count(&significand) {
                    false
                } else {
                    (&significand % ten_pow(shift)) == IBig::ZERO
                }
            }
        }
    }

    /// Whether this representation holds its value without binary rounding.
    pub fn is_exact_representation(&self) -> bool {
        !matches!(self, Number::Float(_))
    }

    /// Whether the value is held as an arbitrary precision decimal.
    pub fn is_big(&self) -> bool {
        matches!(self, Number::Decimal(_))
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Number::Integer(_) => "integer",
            Number::Float(_) => "float",
            Number::Decimal(_) => "decimal",
        }
    }

    // ========== Basic Arithmetic ==========

    pub fn add(&self, other: &Self) -> Self {
        match promote(self, other) {
            Promoted::Integers(a, b) => a
                .checked_add(b)
                .map(Number::Integer)
                .unwrap_or_else(|| Number::decimal(DBig::from(a) + DBig::from(b))),
            Promoted::Floats(a, b) => Number::Float(a + b),
            Promoted::Decimals(a, b) => Number::Decimal(a + b),
        }
    }

    pub fn sub(&self, other: &Self) -> Self {
        match promote(self, other) {
            Promoted::Integers(a, b) => a
                .checked_sub(b)
                .map(Number::Integer)
                .unwrap_or_else(|| Number::decimal(DBig::from(a) - DBig::from(b))),
            Promoted::Floats(a, b) => Number::Float(a - b),
            Promoted::Decimals(a, b) => Number::Decimal(a - b),
        }
    }

    pub fn mul(&self, other: &Self) -> Self {
        match promote(self, other) {
            Promoted::Integers(a, b) => a
                .checked_mul(b)
                .map(Number::Integer)
                .unwrap_or_else(|| Number::decimal(work(DBig::from(a)) * work(DBig::from(b)))),
            Promoted::Floats(a, b) => Number::Float(a * b),
            Promoted::Decimals(a, b) => Number::Decimal(a * b),
        }
    }

    /// Division that fails on an exact zero divisor in every representation.
    ///
    /// Integer division stays `Integer` only when it is exact.
    pub fn checked_div(&self, other: &Self) -> Result<Self, NumberError> {
        if other.is_zero() {
            return Err(NumberError::DivisionByZero);
        }
        Ok(match promote(self, other) {
            Promoted::Integers(a, b) => match a.checked_rem(b) {
                Some(0) => Number::Integer(a / b),
                _ => Number::decimal(work(DBig::from(a)) / work(DBig::from(b))),
            },
            Promoted::Floats(a, b) => Number::Float(a / b),
            Promoted::Decimals(a, b) => Number::Decimal(a / b),
        })
    }

    pub fn neg(&self) -> Self {
        match self {
            Number::Integer(n) => n
                .checked_neg()
                .map(Number::Integer)
                .unwrap_or_else(|| Number::decimal(-DBig::from(*n))),
            Number::Float(f) => Number::Float(-f),
            Number::Decimal(d) => Number::Decimal(-d),
        }
    }

    pub fn abs(&self) -> Self {
        match self {
            Number::Decimal(d) => Number::Decimal(Abs::abs(d.clone())),
            other if other.is_negative() => other.neg(),
            other => other.clone(),
        }
    }

    /// Integer power; negative exponents divide.
    pub fn pow(&self, exp: i32) -> Result<Self, NumberError> {
        let result = self.pow_unsigned(exp.unsigned_abs())?;
        if exp < 0 {
            Number::Integer(1).checked_div(&result)
        } else {
            Ok(result)
        }
    }

    /// Integer power by squaring.
    ///
    /// Fails with `Overflow` when the decimal exponent of the result would
    /// leave `±MAX_DECIMAL_EXPONENT`.
    pub fn pow_unsigned(&self, exp: u32) -> Result<Self, NumberError> {
        if let Some(magnitude) = self.decimal_magnitude() {
            let scaled = (i128::from(magnitude.unsigned_abs()) + 1) * i128::from(exp);
            if scaled > i128::from(MAX_DECIMAL_EXPONENT) {
                return Err(NumberError::Overflow {
                    value: format!("{}^{}", self, exp),
                    target: "decimal",
                });
            }
        }
        let mut result = Number::Integer(1);
        let mut base = self.clone();
        let mut remaining = exp;
        while remaining > 0 {
            if remaining & 1 == 1 {
                result = result.mul(&base);
            }
            remaining >>= 1;
            if remaining > 0 {
                base = base.mul(&base);
            }
        }
        Ok(result)
    }

    /// Order of magnitude (`floor(log10 |x|)`) of a non-zero exact value
    fn decimal_magnitude(&self) -> Option<i64> {
        let (significand, exponent) = match self {
            Number::Integer(0) => return None,
            Number::Integer(n) => (IBig::from(*n), 0),
            Number::Float(_) => return None,
            Number::Decimal(d) => d.clone().into_repr().into_parts(),
        };
        if significand == IBig::ZERO {
            return None;
        }
        let digits = digit_count(&significand) as i64;
        Some(exponent as i64 + digits - 1)
    }

    /// Compare magnitudes (absolute values).
    pub fn compare_magnitude(&self, other: &Self) -> Option<Ordering> {
        self.abs().partial_cmp(&other.abs())
    }

    // ========== Narrowing ==========

    /// Narrow to i64, truncating toward zero.
    ///
    /// The value is range-checked in its own representation first; anything
    /// outside the i64 range is `Overflow`, never a wrapped value.
    pub fn to_i64(&self) -> Result<i64, NumberError> {
        let overflow = || NumberError::Overflow { value: self.to_string(), target: "i64" };
        match self {
            Number::Integer(n) => Ok(*n),
            Number::Float(f) => {
                if f.is_finite() && *f >= -I64_LIMIT && *f < I64_LIMIT {
                    Ok(f.trunc() as i64)
                } else {
                    Err(overflow())
                }
            }
            Number::Decimal(d) => {
                let (significand, exponent) = d.clone().into_repr().into_parts();
                let integral = if exponent >= 0 {
                    // 10^19 already exceeds i64
                    if exponent > 19 && significand != IBig::ZERO {
                        return Err(overflow());
                    }
                    significand * ten_pow(exponent as usize)
                } else if exponent.unsigned_abs() > digit_count(&significand) {
                    IBig::ZERO
                } else {
                    significand / ten_pow(exponent.unsigned_abs())
                };
                integral.try_into().map_err(|_| overflow())
            }
        }
    }

    /// Narrow to any integer type reachable from i64.
    pub fn narrow<T: TryFrom<i64>>(&self) -> Result<T, NumberError> {
        let wide = self.to_i64().map_err(|e| match e {
            NumberError::Overflow { value, .. } => NumberError::Overflow {
                value,
                target: std::any::type_name::<T>(),
            },
            other => other,
        })?;
        T::try_from(wide).map_err(|_| NumberError::Overflow {
            value: self.to_string(),
            target: std::any::type_name::<T>(),
        })
    }

    /// Approximate as f64. Decimals beyond the f64 range saturate to infinity.
    pub fn to_f64(&self) -> f64 {
        match self {
            Number::Integer(n) => *n as f64,
            Number::Float(f) => *f,
            Number::Decimal(d) => decimal_to_f64(d),
        }
    }

    /// Exact decimal form; `None` for non-finite floats.
    fn to_exact_decimal(&self) -> Option<DBig> {
        match self {
            Number::Integer(n) => Some(work(DBig::from(*n))),
            Number::Float(f) if f.is_finite() => {
                // f64 Display is the shortest string that reads back to the same bits
                format!("{}", f).parse::<DBig>().ok().map(work)
            }
            Number::Float(_) => None,
            Number::Decimal(d) => Some(d.clone()),
        }
    }
}

fn promote(a: &Number, b: &Number) -> Promoted {
    match (a, b) {
        (Number::Integer(x), Number::Integer(y)) => Promoted::Integers(*x, *y),
        (Number::Decimal(_), _) | (_, Number::Decimal(_)) => {
            match (a.to_exact_decimal(), b.to_exact_decimal()) {
                (Some(x), Some(y)) => Promoted::Decimals(x, y),
                _ => Promoted::Floats(a.to_f64(), b.to_f64()),
            }
        }
        _ => Promoted::Floats(a.to_f64(), b.to_f64()),
    }
}

fn decimal_to_f64(d: &DBig) -> f64 {
    let (significand, exponent) = d.clone().into_repr().into_parts();
    let negative = significand < IBig::ZERO;
    let magnitude = if negative { -significand } else { significand };

    // Keep 53 bits of the significand and carry the rest as a binary scale
    let (mantissa, shift) = if magnitude.bit_len() <= 53 {
        (magnitude, 0)
    } else {
        let extra = magnitude.bit_len() - 53;
        (&magnitude >> extra, extra)
    };
    let mantissa: f64 = match u64::try_from(mantissa) {
        Ok(m) => m as f64,
        Err(_) => return if negative { f64::NEG_INFINITY } else { f64::INFINITY },
    };
    let scaled = mantissa * 2_f64.powi(shift as i32);
    let result = if exponent >= 0 {
        scaled * 10_f64.powi(exponent.min(400) as i32)
    } else {
        scaled / 10_f64.powi(exponent.unsigned_abs().min(400) as i32)
    };
    if negative { -result } else { result }
}

/// Positional rendering of a decimal.
///
/// Values that would need more than `PLAIN_ZEROS` padding zeros are written
/// as `<digits>e<exponent>` instead, which reads back to the same value.
fn decimal_string(d: &DBig) -> String {
    let (significand, exponent) = d.clone().into_repr().into_parts();
    if significand == IBig::ZERO {
        return "0".to_string();
    }
    let negative = significand < IBig::ZERO;
    let digits = if negative { -significand } else { significand }.to_string();
    let sign = if negative { "-" } else { "" };

    let shift = exponent.unsigned_abs();
    let padding = if exponent >= 0 { shift } else { shift.saturating_sub(digits.len()) };
    if padding > PLAIN_ZEROS {
        return format!("{}{}", sign, scientific(&digits, exponent));
    }

    let mut body = if exponent >= 0 {
        format!("{}{}", digits, "0".repeat(shift))
    } else if digits.len() > shift {
        let (int_part, frac_part) = digits.split_at(digits.len() - shift);
        format!("{}.{}", int_part, frac_part)
    } else {
        format!("0.{}{}", "0".repeat(shift - digits.len()), digits)
    };
    if body.contains('.') {
        body = body.trim_end_matches('0').trim_end_matches('.').to_string();
    }
    format!("{}{}", sign, body)
}

/// `digits × 10^exponent` as `<digits>e<exponent>`, trailing zeros folded
/// into the exponent.
fn scientific(digits: &str, exponent: isize) -> String {
    let trimmed = digits.trim_end_matches('0');
    let folded = (digits.len() - trimmed.len()) as isize;
    format!("{}e{}", trimmed, exponent + folded)
}

/// Syntactic breakdown of a numeric literal.
struct Literal<'a> {
    negative: bool,
    int_digits: &'a str,
    frac_digits: &'a str,
    exponent: Option<i64>,
}

impl<'a> Literal<'a> {
    fn scan(s: &'a str) -> Option<Self> {
        let (negative, rest) = match s.as_bytes().first()? {
            b'-' => (true, &s[1..]),
            b'+' => (false, &s[1..]),
            _ => (false, s),
        };
        let (mantissa, exponent) = match rest.find(['e', 'E']) {
            Some(pos) => {
                let exp_str = &rest[pos + 1..];
                let unsigned = exp_str.strip_prefix(['+', '-']).unwrap_or(exp_str);
                if unsigned.is_empty() || !unsigned.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                (&rest[..pos], Some(exp_str.parse::<i64>().ok()?))
            }
            None => (rest, None),
        };
        let (int_digits, frac_digits) = match mantissa.find('.') {
            Some(pos) => (&mantissa[..pos], &mantissa[pos + 1..]),
            None => (mantissa, ""),
        };
        let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
        if int_digits.is_empty() && frac_digits.is_empty() {
            return None;
        }
        if !all_digits(int_digits) || !all_digits(frac_digits) {
            return None;
        }
        Some(Literal { negative, int_digits, frac_digits, exponent })
    }

    fn is_integral(&self) -> bool {
        self.frac_digits.is_empty() && self.exponent.is_none()
    }

    fn significant_digits(&self) -> usize {
        let joined = format!("{}{}", self.int_digits, self.frac_digits);
        let trimmed = joined.trim_start_matches('0');
        trimmed.len()
    }

    fn to_decimal(&self) -> Result<DBig, NumberError> {
        let digits = format!("{}{}", self.int_digits, self.frac_digits);
        let mut significand: IBig = digits
            .parse()
            .map_err(|_| NumberError::ParseError(digits.clone()))?;
        if self.negative {
            significand = -significand;
        }
        let exponent = self
            .exponent
            .unwrap_or(0)
            .checked_sub(self.frac_digits.len() as i64)
            .filter(|e| e.unsigned_abs() <= MAX_DECIMAL_EXPONENT.unsigned_abs())
            .and_then(|e| isize::try_from(e).ok())
            .ok_or_else(|| NumberError::Overflow {
                value: format!("{}e{}", digits, self.exponent.unwrap_or(0)),
                target: "decimal exponent",
            })?;
        Ok(DBig::from_parts(significand, exponent))
    }
}

// ========== Trait Implementations ==========

impl FromStr for Number {
    type Err = NumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Number::from_str(s)
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Number::Integer(n)
    }
}

impl From<i32> for Number {
    fn from(n: i32) -> Self {
        Number::Integer(i64::from(n))
    }
}

impl From<u32> for Number {
    fn from(n: u32) -> Self {
        Number::Integer(i64::from(n))
    }
}

impl From<f64> for Number {
    fn from(f: f64) -> Self {
        Number::Float(f)
    }
}

impl From<f32> for Number {
    fn from(f: f32) -> Self {
        Number::Float(f64::from(f))
    }
}

impl From<DBig> for Number {
    fn from(d: DBig) -> Self {
        Number::decimal(d)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(n) => write!(f, "{}", n),
            Number::Float(x) => write!(f, "{}", x),
            Number::Decimal(d) => write!(f, "{}", decimal_string(d)),
        }
    }
}

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Number {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Numeric equality across representations.
///
/// Mixed operands are compared in exact decimal form; a wider value is never
/// rounded down to the narrower representation.
impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => a == b,
            (Number::Float(a), Number::Float(b)) => a == b,
            (Number::Decimal(a), Number::Decimal(b)) => a == b,
            _ => match (self.to_exact_decimal(), other.to_exact_decimal()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match promote(self, other) {
            Promoted::Integers(a, b) => Some(a.cmp(&b)),
            Promoted::Floats(a, b) => a.partial_cmp(&b),
            Promoted::Decimals(a, b) => a.partial_cmp(&b),
        }
    }
}
