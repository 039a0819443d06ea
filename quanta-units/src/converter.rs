//! Converters between unit scales
//!
//! A converter is a small immutable tree built from four primitives:
//! identity, scaling by a factor, adding an offset, and the functional
//! inverse of another converter. Every converter is affine, so two
//! converters are equal when their slopes and intercepts agree.

use quanta_core::{Number, NumberError};
use serde::{Deserialize, Serialize};

/// Relative tolerance for comparing affine forms
pub const TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Converter {
    Identity,
    /// `x * factor`
    Scale(Number),
    /// `x + amount`
    Offset(Number),
    /// `outer(inner(x))`
    Compose(Box<Converter>, Box<Converter>),
    /// Functional inverse of the wrapped converter
    Reciprocal(Box<Converter>),
}

impl Converter {
    pub fn scale(factor: impl Into<Number>) -> Self {
        Converter::Scale(factor.into())
    }

    pub fn offset(amount: impl Into<Number>) -> Self {
        Converter::Offset(amount.into())
    }

    /// `x * numerator / denominator`, evaluated in that order.
    pub fn ratio(numerator: i64, denominator: i64) -> Self {
        Converter::Scale(Number::from(denominator))
            .inverse()
            .compose(Converter::Scale(Number::from(numerator)))
    }

    /// Evaluate the converter at `x`.
    pub fn apply(&self, x: &Number) -> Result<Number, NumberError> {
        match self {
            Converter::Identity => Ok(x.clone()),
            Converter::Scale(factor) => Ok(x.mul(factor)),
            Converter::Offset(amount) => Ok(x.add(amount)),
            Converter::Compose(outer, inner) => outer.apply(&inner.apply(x)?),
            Converter::Reciprocal(inner) => inner.apply_inverse(x),
        }
    }

    /// Evaluate the functional inverse at `x` without building it.
    fn apply_inverse(&self, x: &Number) -> Result<Number, NumberError> {
        match self {
            Converter::Identity => Ok(x.clone()),
            Converter::Scale(factor) => x.checked_div(factor),
            Converter::Offset(amount) => Ok(x.sub(amount)),
            Converter::Compose(outer, inner) => inner.apply_inverse(&outer.apply_inverse(x)?),
            Converter::Reciprocal(inner) => inner.apply(x),
        }
    }

    /// Symbolic inverse.
    pub fn inverse(&self) -> Converter {
        match self {
            Converter::Identity => Converter::Identity,
            Converter::Scale(_) => Converter::Reciprocal(Box::new(self.clone())),
            Converter::Offset(amount) => Converter::Offset(amount.neg()),
            Converter::Compose(outer, inner) => inner.inverse().compose(outer.inverse()),
            Converter::Reciprocal(inner) => (**inner).clone(),
        }
    }

    /// `self ∘ inner`: applies `inner` first, then `self`.
    ///
    /// Adjacent scales multiply and adjacent offsets add. Reciprocals are
    /// kept as they are so that exact divisions stay exact.
    pub fn compose(self, inner: Converter) -> Converter {
        match (self, inner) {
            (Converter::Identity, c) | (c, Converter::Identity) => c,
            (Converter::Scale(a), Converter::Scale(b)) => Converter::Scale(a.mul(&b)),
            (Converter::Offset(a), Converter::Offset(b)) => Converter::Offset(a.add(&b)),
            (outer @ (Converter::Scale(_) | Converter::Offset(_)), Converter::Compose(head, tail)) => {
                let merges = matches!(
                    (&outer, head.as_ref()),
                    (Converter::Scale(_), Converter::Scale(_)) | (Converter::Offset(_), Converter::Offset(_))
                );
                if merges {
                    outer.compose(*head).compose(*tail)
                } else {
                    Converter::Compose(Box::new(outer), Box::new(Converter::Compose(head, tail)))
                }
            }
            (outer, inner) => Converter::Compose(Box::new(outer), Box::new(inner)),
        }
    }

    /// The converter with every offset removed.
    ///
    /// Products and quotients of units scale linearly; an affine origin
    /// has no meaning there.
    pub fn linear_part(&self) -> Converter {
        match self {
            Converter::Identity | Converter::Offset(_) => Converter::Identity,
            Converter::Scale(_) => self.clone(),
            Converter::Compose(outer, inner) => outer.linear_part().compose(inner.linear_part()),
            Converter::Reciprocal(inner) => inner.linear_part().inverse(),
        }
    }

    /// Integer power of the linear part, keeping reciprocals symbolic.
    pub fn pow(&self, n: i32) -> Result<Converter, NumberError> {
        if n == 0 {
            return Ok(Converter::Identity);
        }
        match self {
            Converter::Identity | Converter::Offset(_) => Ok(Converter::Identity),
            Converter::Scale(factor) => {
                let scaled = Converter::Scale(factor.pow_unsigned(n.unsigned_abs())?);
                Ok(if n < 0 { scaled.inverse() } else { scaled })
            }
            Converter::Compose(outer, inner) => Ok(outer.pow(n)?.compose(inner.pow(n)?)),
            Converter::Reciprocal(inner) => Ok(inner.pow(n)?.inverse()),
        }
    }

    /// `(slope, intercept)` such that `apply(x) = slope * x + intercept`.
    pub fn affine_form(&self) -> Result<(Number, Number), NumberError> {
        match self {
            Converter::Identity => Ok((Number::from(1), Number::from(0))),
            Converter::Scale(factor) => Ok((factor.clone(), Number::from(0))),
            Converter::Offset(amount) => Ok((Number::from(1), amount.clone())),
            Converter::Compose(outer, inner) => {
                let (so, io) = outer.affine_form()?;
                let (si, ii) = inner.affine_form()?;
                Ok((so.mul(&si), so.mul(&ii).add(&io)))
            }
            Converter::Reciprocal(inner) => {
                let (slope, intercept) = inner.affine_form()?;
                let inverse_slope = Number::from(1).checked_div(&slope)?;
                let inverse_intercept = intercept.neg().checked_div(&slope)?;
                Ok((inverse_slope, inverse_intercept))
            }
        }
    }

    pub fn is_linear(&self) -> bool {
        self.affine_form()
            .map(|(_, intercept)| intercept.is_zero())
            .unwrap_or(false)
    }

    /// Whether the converter maps every value to itself (within tolerance).
    pub fn is_identity(&self) -> bool {
        matches!(self, Converter::Identity) || self.equivalent_to(&Converter::Identity)
    }

    /// Extensional equality: same slope and intercept within `TOLERANCE`.
    pub fn equivalent_to(&self, other: &Converter) -> bool {
        match (self.affine_form(), other.affine_form()) {
            (Ok((sa, ia)), Ok((sb, ib))) => close(&sa, &sb) && close(&ia, &ib),
            _ => false,
        }
    }
}

fn close(a: &Number, b: &Number) -> bool {
    if a == b {
        return true;
    }
    let (x, y) = (a.to_f64(), b.to_f64());
    (x - y).abs() <= TOLERANCE * x.abs().max(y.abs())
}

impl Default for Converter {
    fn default() -> Self {
        Converter::Identity
    }
}

impl PartialEq for Converter {
    fn eq(&self, other: &Self) -> bool {
        self.equivalent_to(other)
    }
}
