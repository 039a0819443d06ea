//! Quantity type - a value with an associated unit
//!
//! `Quantity<Q>` carries a compile-time dimension kind `Q`. Operations that
//! need aligned units always convert the right-hand operand into the unit
//! of the left-hand one, so the result is expressed in the left unit.

use crate::error::{Result, UnitError};
use crate::kind::{AnyKind, Inverse, Kind, Product, Quotient};
use crate::{Converter, Dimension, Unit};
use quanta_core::{Number, NumberError};
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;

/// A physical quantity: a numeric value with an associated unit
#[derive(Serialize)]
#[serde(bound = "")]
pub struct Quantity<Q: Kind = AnyKind> {
    value: Number,
    unit: Unit,
    /// Cleared once the value may carry rounding error
    exact: bool,
    #[serde(skip)]
    kind: PhantomData<fn() -> Q>,
}

impl Quantity<AnyKind> {
    /// Create a quantity whose dimension is only checked at run time.
    pub fn of(value: impl Into<Number>, unit: Unit) -> Self {
        Quantity::tagged(value.into(), unit)
    }

    /// Create a dimensionless quantity (pure number)
    pub fn dimensionless(value: impl Into<Number>) -> Self {
        Quantity::of(value, Unit::one())
    }
}

impl<Q: Kind> Quantity<Q> {
    /// Create a quantity, checking the unit against the kind `Q`.
    pub fn new(value: impl Into<Number>, unit: Unit) -> Result<Self> {
        check_kind::<Q>(&unit)?;
        Ok(Quantity::tagged(value.into(), unit))
    }

    fn tagged(value: Number, unit: Unit) -> Self {
        let exact = value.is_exact_representation();
        Quantity::with_exactness(value, unit, exact)
    }

    fn with_exactness(value: Number, unit: Unit, exact: bool) -> Self {
        Quantity { value, unit, exact, kind: PhantomData }
    }

    pub fn value(&self) -> &Number {
        &self.value
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    pub fn dimension(&self) -> Dimension {
        self.unit.dimension
    }

    /// Whether the value is free of rounding error, as far as is known.
    ///
    /// Set for integer and decimal values at construction; cleared by
    /// float operands, inexact division and non-identity conversion.
    pub fn is_exact(&self) -> bool {
        self.exact
    }

    /// Whether the value is held as an arbitrary precision decimal
    pub fn is_big(&self) -> bool {
        self.value.is_big()
    }

    // ========== Arithmetic ==========

    /// Sum, expressed in this quantity's unit.
    pub fn add(&self, other: &Quantity<Q>) -> Result<Quantity<Q>> {
        self.combine(other, Number::add)
    }

    /// Difference, expressed in this quantity's unit.
    pub fn subtract(&self, other: &Quantity<Q>) -> Result<Quantity<Q>> {
        self.combine(other, Number::sub)
    }

    fn combine(&self, other: &Quantity<Q>, op: fn(&Number, &Number) -> Number) -> Result<Quantity<Q>> {
        let converter = other.unit.converter_to(&self.unit)?;
        let aligned = converter.apply(&other.value)?;
        let value = op(&self.value, &aligned);
        let exact = self.exact && other.exact && is_identity(&converter) && value.is_exact_representation();
        Ok(Quantity::with_exactness(value, self.unit.clone(), exact))
    }

    pub fn multiply<R: Kind>(&self, other: &Quantity<R>) -> Result<Quantity<Product<Q, R>>> {
        let unit = self.unit.multiply(&other.unit)?;
        let value = self.value.mul(&other.value);
        let exact = self.exact && other.exact && value.is_exact_representation();
        Ok(Quantity::with_exactness(value, unit, exact))
    }

    pub fn divide<R: Kind>(&self, other: &Quantity<R>) -> Result<Quantity<Quotient<Q, R>>> {
        let unit = self.unit.divide(&other.unit)?;
        let value = self.value.checked_div(&other.value)?;
        let exact = self.exact && other.exact && divides_exactly(&self.value, &other.value, &value);
        Ok(Quantity::with_exactness(value, unit, exact))
    }

    /// Scale the value; the unit is unchanged.
    pub fn multiply_by(&self, scalar: impl Into<Number>) -> Quantity<Q> {
        let scalar = scalar.into();
        let value = self.value.mul(&scalar);
        let exact = self.exact && scalar.is_exact_representation() && value.is_exact_representation();
        Quantity::with_exactness(value, self.unit.clone(), exact)
    }

    /// Divide the value; fails on an exact zero.
    pub fn divide_by(&self, scalar: impl Into<Number>) -> Result<Quantity<Q>> {
        let scalar = scalar.into();
        let value = self.value.checked_div(&scalar)?;
        let exact = self.exact
            && scalar.is_exact_representation()
            && divides_exactly(&self.value, &scalar, &value);
        Ok(Quantity::with_exactness(value, self.unit.clone(), exact))
    }

    /// Invert the unit and keep the value as it is.
    ///
    /// `inverse(10 m)` is `10 1/m`, not `0.1 1/m`. Use
    /// `Quantity::dimensionless(1).divide(&q)` for the numeric reciprocal.
    pub fn inverse(&self) -> Result<Quantity<Inverse<Q>>> {
        Ok(Quantity::with_exactness(self.value.clone(), self.unit.inverse()?, self.exact))
    }

    /// Raise both value and unit to an integer power.
    pub fn pow(&self, n: i32) -> Result<Quantity<AnyKind>> {
        let unit = self.unit.pow(n)?;
        let magnitude = self.value.pow_unsigned(n.unsigned_abs())?;
        let (value, exact) = if n < 0 {
            let one = Number::from(1);
            let value = one.checked_div(&magnitude)?;
            let exact = self.exact && divides_exactly(&one, &magnitude, &value);
            (value, exact)
        } else {
            (magnitude, self.exact)
        };
        Ok(Quantity::with_exactness(value, unit, exact))
    }

    pub fn negate(&self) -> Quantity<Q> {
        Quantity::with_exactness(self.value.neg(), self.unit.clone(), self.exact)
    }

    // ========== Conversion ==========

    /// Convert to another unit of the same system.
    pub fn to(&self, unit: &Unit) -> Result<Quantity<Q>> {
        let converter = self.unit.converter_to(unit)?;
        self.convert(&converter, unit)
    }

    /// Convert to another unit, crossing unit systems when needed.
    pub fn to_any(&self, unit: &Unit) -> Result<Quantity<Q>> {
        let converter = self.unit.converter_to_any(unit)?;
        self.convert(&converter, unit)
    }

    fn convert(&self, converter: &Converter, unit: &Unit) -> Result<Quantity<Q>> {
        let value = converter.apply(&self.value)?;
        let exact = self.exact && is_identity(converter);
        Ok(Quantity::with_exactness(value, unit.clone(), exact))
    }

    /// The value expressed in `unit`.
    pub fn value_in(&self, unit: &Unit) -> Result<Number> {
        let converter = self.unit.converter_to(unit)?;
        Ok(converter.apply(&self.value)?)
    }

    pub fn double_value(&self, unit: &Unit) -> Result<f64> {
        Ok(self.value_in(unit)?.to_f64())
    }

    /// The value expressed in `unit`, truncated to an i64.
    ///
    /// Fails with `Overflow` when the converted magnitude does not fit.
    pub fn long_value(&self, unit: &Unit) -> Result<i64> {
        Ok(self.value_in(unit)?.to_i64()?)
    }

    // ========== Kinds ==========

    /// Re-tag with kind `R` after checking the dimension.
    pub fn into_kind<R: Kind>(self) -> Result<Quantity<R>> {
        check_kind::<R>(&self.unit)?;
        Ok(Quantity::with_exactness(self.value, self.unit, self.exact))
    }

    /// Forget the kind.
    pub fn erase(self) -> Quantity<AnyKind> {
        Quantity::with_exactness(self.value, self.unit, self.exact)
    }

    // ========== Comparison ==========

    /// Order by magnitude after converting `other` into this unit.
    pub fn compare<R: Kind>(&self, other: &Quantity<R>) -> Result<Ordering> {
        let aligned = other.value_in(&self.unit)?;
        self.value.partial_cmp(&aligned).ok_or_else(|| {
            UnitError::Arithmetic(NumberError::DomainError(format!(
                "{} and {} are unordered",
                self, other
            )))
        })
    }

    /// Whether `other` denotes the same amount, whatever its unit.
    pub fn is_equivalent<R: Kind>(&self, other: &Quantity<R>) -> bool {
        other
            .value_in(&self.unit)
            .map(|aligned| aligned == self.value)
            .unwrap_or(false)
    }
}

fn check_kind<Q: Kind>(unit: &Unit) -> Result<()> {
    match Q::DIMENSION {
        Some(expected) if expected != unit.dimension => Err(UnitError::Incommensurable {
            from: unit.symbol.clone(),
            to: expected.name().unwrap_or("quantity kind").to_string(),
            from_dim: unit.dimension,
            to_dim: expected,
        }),
        _ => Ok(()),
    }
}

/// Serialized form, checked against the kind before it becomes a `Quantity`
#[derive(Deserialize)]
struct RawQuantity {
    value: Number,
    unit: Unit,
    exact: bool,
}

/// Rejects units of the wrong dimension for `Q`; `exact` is only kept when
/// the value's representation can honour it.
impl<'de, Q: Kind> Deserialize<'de> for Quantity<Q> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = RawQuantity::deserialize(deserializer)?;
        check_kind::<Q>(&raw.unit).map_err(serde::de::Error::custom)?;
        let exact = raw.exact && raw.value.is_exact_representation();
        Ok(Quantity::with_exactness(raw.value, raw.unit, exact))
    }
}

fn is_identity(converter: &Converter) -> bool {
    matches!(converter, Converter::Identity)
}

fn divides_exactly(dividend: &Number, divisor: &Number, quotient: &Number) -> bool {
    quotient.is_exact_representation() && quotient.mul(divisor) == *dividend
}

impl<Q: Kind> Clone for Quantity<Q> {
    fn clone(&self) -> Self {
        Quantity::with_exactness(self.value.clone(), self.unit.clone(), self.exact)
    }
}

impl<Q: Kind> fmt::Debug for Quantity<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Quantity")
            .field("value", &self.value)
            .field("unit", &self.unit.symbol)
            .field("exact", &self.exact)
            .finish()
    }
}

/// Same unit and numerically equal value. `1 km` is not `==` to `1000 m`;
/// use `is_equivalent` for that.
impl<Q: Kind> PartialEq for Quantity<Q> {
    fn eq(&self, other: &Self) -> bool {
        self.unit == other.unit && self.value == other.value
    }
}

impl<Q: Kind> fmt::Display for Quantity<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.symbol.is_empty() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{} {}", self.value, self.unit.symbol)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{Area, Length, Speed, Time};
    use crate::units::{DAY, HOUR, KILOMETRE, METRE, SECOND};

    fn metres(v: impl Into<Number>) -> Quantity<Length> {
        Quantity::new(v, METRE.clone()).unwrap()
    }

    #[test]
    fn test_kind_is_checked_at_construction() {
        assert!(Quantity::<Length>::new(1, SECOND.clone()).is_err());
        assert!(Quantity::<Time>::new(1, SECOND.clone()).is_ok());
    }

    #[test]
    fn test_add_converts_into_left_unit() {
        let a = Quantity::<Length>::new(1, KILOMETRE.clone()).unwrap();
        let b = metres(500);
        let sum = a.add(&b).unwrap();
        assert_eq!(sum.unit(), &*KILOMETRE);
        assert_eq!(sum.value(), &Number::from_parts(15, -1));
        assert!(!sum.is_exact());
    }

    #[test]
    fn test_subtract() {
        let d = metres(10).subtract(&metres(12.5)).unwrap();
        assert_eq!(d.value(), &Number::from(-2.5));
    }

    #[test]
    fn test_add_incommensurable_at_run_time() {
        let a = Quantity::of(1, METRE.clone());
        let b = Quantity::of(1, SECOND.clone());
        assert!(matches!(a.add(&b), Err(UnitError::Incommensurable { .. })));
    }

    #[test]
    fn test_multiply_tags_product_kind() {
        let area = metres(10).multiply(&metres(10)).unwrap();
        assert_eq!(area.value(), &Number::from(100));
        assert_eq!(area.unit().symbol, "m^2");
        let area: Quantity<Area> = area.into_kind().unwrap();
        assert!(area.is_exact());
    }

    #[test]
    fn test_divide_tags_quotient_kind() {
        let t = Quantity::<Time>::new(2, SECOND.clone()).unwrap();
        let v = metres(10).divide(&t).unwrap();
        assert_eq!(v.unit().symbol, "m/s");
        assert!(v.into_kind::<Speed>().is_ok());
    }

    #[test]
    fn test_inexact_division_clears_exactness() {
        let third = metres(1).divide_by(3).unwrap();
        assert!(!third.is_exact());
        let half = metres(1).divide_by(2).unwrap();
        assert!(half.is_exact());
        assert!(!metres(1).multiply_by(0.5).is_exact());
    }

    #[test]
    fn test_divide_by() {
        let q = metres(10).divide_by(2.5).unwrap();
        assert_eq!(q.value(), &Number::from(4));
        assert!(matches!(
            metres(10).divide_by(0),
            Err(UnitError::Arithmetic(NumberError::DivisionByZero))
        ));
    }

    #[test]
    fn test_day_plus_hours() {
        let d = Quantity::of(1, DAY.clone());
        let h = Quantity::of(12, HOUR.clone());
        let sum = d.add(&h).unwrap();
        assert_eq!(sum.unit(), &*DAY);
        assert_eq!(sum.value(), &Number::from_parts(15, -1));
        assert_eq!(sum.to_string(), "1.5 d");
    }

    #[test]
    fn test_inverse_keeps_value() {
        let inv = metres(10).inverse().unwrap();
        assert_eq!(inv.value(), &Number::from(10));
        assert_eq!(inv.unit().symbol, "1/m");
    }

    #[test]
    fn test_pow() {
        let cube = metres(2).pow(3).unwrap();
        assert_eq!(cube.value(), &Number::from(8));
        assert_eq!(cube.unit().symbol, "m^3");
        let inv = metres(4).pow(-1).unwrap();
        assert_eq!(inv.unit().symbol, "1/m");
        assert!(inv.is_exact());

        let third = Quantity::of(3, METRE.clone()).pow(-1).unwrap();
        assert!(!third.is_exact());
        assert!(matches!(
            metres(Number::from_parts(1, 1000)).pow(i32::MAX),
            Err(UnitError::Overflow { .. })
        ));
        assert_eq!(metres(1).pow(i32::MAX).unwrap().value(), &Number::from(1));
    }

    #[test]
    fn test_serde_round_trip() {
        for q in [metres(10), metres(2.5), metres(Number::from_str("123456789012345678901234.5").unwrap())] {
            let json = serde_json::to_string(&q).unwrap();
            let back: Quantity<Length> = serde_json::from_str(&json).unwrap();
            assert_eq!(back, q, "json {}", json);
            assert_eq!(back.is_exact(), q.is_exact());
        }

        let speed = Quantity::of(36, KILOMETRE.clone()).divide(&Quantity::of(1, HOUR.clone())).unwrap();
        let back: Quantity = serde_json::from_str(&serde_json::to_string(&speed).unwrap()).unwrap();
        assert_eq!(back.unit().symbol, "km/h");
        assert_eq!(back.to(&METRE.divide(&SECOND).unwrap()).unwrap().value(), &Number::from(10));
    }

    #[test]
    fn test_deserialize_checks_kind() {
        let json = serde_json::to_string(&Quantity::of(5, SECOND.clone())).unwrap();
        assert!(serde_json::from_str::<Quantity<Length>>(&json).is_err());
        assert!(serde_json::from_str::<Quantity<Time>>(&json).is_ok());
        assert!(serde_json::from_str::<Quantity>(&json).is_ok());
    }

    #[test]
    fn test_deserialize_recomputes_exactness() {
        let mut json = serde_json::to_value(metres(0.1)).unwrap();
        assert_eq!(json["exact"], false);
        json["exact"] = true.into();
        let back: Quantity<Length> = serde_json::from_value(json).unwrap();
        assert!(!back.is_exact());
    }

    #[test]
    fn test_conversion_round_trip_is_integral() {
        let day = Quantity::of(1, DAY.clone());
        let hours = day.to(&HOUR).unwrap();
        assert!(matches!(hours.value(), Number::Integer(24)));
        assert!(!hours.is_exact());
        let back = hours.to(&DAY).unwrap();
        assert!(matches!(back.value(), Number::Integer(1)));
    }

    #[test]
    fn test_long_value_overflow() {
        let fits = Quantity::of(9223372036854775i64, KILOMETRE.clone());
        assert_eq!(fits.long_value(&METRE).unwrap(), 9223372036854775000);

        let too_big = Quantity::of(9223372036854776i64, KILOMETRE.clone());
        assert!(matches!(too_big.long_value(&METRE), Err(UnitError::Overflow { .. })));
    }

    #[test]
    fn test_double_value() {
        let q = Quantity::of(1500, METRE.clone());
        assert_eq!(q.double_value(&KILOMETRE).unwrap(), 1.5);
    }

    #[test]
    fn test_compare_and_equivalence() {
        let km = Quantity::of(1, KILOMETRE.clone());
        let m = Quantity::of(999, METRE.clone());
        assert_eq!(km.compare(&m).unwrap(), Ordering::Greater);
        assert!(km.is_equivalent(&Quantity::of(1000, METRE.clone())));
        assert_ne!(km, Quantity::of(1000, METRE.clone()));
        assert!(km.compare(&Quantity::of(1, SECOND.clone())).is_err());
        assert!(!km.is_equivalent(&Quantity::of(1, SECOND.clone())));
    }

    #[test]
    fn test_equality_across_representations() {
        assert_eq!(metres(30), metres(30.0));
        assert_ne!(metres(30), metres(30.000001));
    }

    #[test]
    fn test_display() {
        assert_eq!(metres(10).to_string(), "10 m");
        assert_eq!(Quantity::dimensionless(3).to_string(), "3");
    }

    #[test]
    fn test_quantities_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Quantity<Length>>();
        assert_send_sync::<Quantity>();
        assert_send_sync::<Unit>();
    }
}
