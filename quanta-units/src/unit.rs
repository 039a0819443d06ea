//! Units, unit systems and the conversion engine

use crate::error::{Result, UnitError};
use crate::{Converter, Dimension};
use quanta_core::Number;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The system a unit's reference scale belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum System {
    #[default]
    Si,
    /// Centimetre-gram-second
    Cgs,
}

impl System {
    pub fn name(&self) -> &'static str {
        match self {
            System::Si => "SI",
            System::Cgs => "CGS",
        }
    }

    /// Converter from this system's coherent unit of `dim` to the SI one.
    ///
    /// CGS only covers mechanical dimensions (length, mass, time).
    pub fn si_scale(&self, dim: Dimension) -> Option<Converter> {
        match self {
            System::Si => Some(Converter::Identity),
            System::Cgs => {
                let [length, mass, _time, rest @ ..] = dim.exponents;
                if rest.iter().any(|&e| e != 0) {
                    return None;
                }
                let centimetre = power_of(Number::from_parts(1, -2), length)?;
                let gram = power_of(Number::from_parts(1, -3), mass)?;
                Some(centimetre.compose(gram))
            }
        }
    }

    /// Converter from this system's coherent unit of `dim` to `target`'s.
    pub fn rebase(&self, target: System, dim: Dimension) -> Option<Converter> {
        if *self == target {
            return Some(Converter::Identity);
        }
        let to_si = self.si_scale(dim)?;
        let from_si = target.si_scale(dim)?.inverse();
        Some(from_si.compose(to_si))
    }
}

fn power_of(factor: Number, exp: i32) -> Option<Converter> {
    Converter::Scale(factor).pow(exp).ok()
}

/// A measurement unit.
///
/// Products of units keep their factors in `terms` (symbol and exponent),
/// from which the symbol is rendered: `m^2`, `kg*m/s^2`, `1/m`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    /// The unit symbol (e.g., "m", "kg", "km/h")
    pub symbol: String,
    /// The unit name (e.g., "metre", "kilogram")
    pub name: String,
    pub dimension: Dimension,
    pub system: System,
    /// Maps a value in this unit to the coherent unit of the same dimension
    /// in `system`; `None` for arbitrary units with no such linkage.
    pub converter: Option<Converter>,
    terms: Vec<(String, i32)>,
}

impl Unit {
    /// Create an SI unit that converts to its reference with `converter`.
    pub fn new(symbol: &str, name: &str, dimension: Dimension, converter: Converter) -> Self {
        Unit {
            symbol: symbol.to_string(),
            name: name.to_string(),
            dimension,
            system: System::Si,
            converter: Some(converter),
            terms: vec![(symbol.to_string(), 1)],
        }
    }

    /// Create a coherent unit: its converter is the identity.
    pub fn base(symbol: &str, name: &str, dimension: Dimension) -> Self {
        Unit::new(symbol, name, dimension, Converter::Identity)
    }

    /// Create a unit `factor` times its coherent reference.
    pub fn scaled(symbol: &str, name: &str, dimension: Dimension, factor: Number) -> Self {
        Unit::new(symbol, name, dimension, Converter::Scale(factor))
    }

    /// Create a unit with no linkage to any reference unit.
    pub fn arbitrary(symbol: &str, name: &str, dimension: Dimension) -> Self {
        Unit {
            converter: None,
            ..Unit::base(symbol, name, dimension)
        }
    }

    /// The dimensionless unit.
    pub fn one() -> Self {
        Unit {
            symbol: String::new(),
            name: "one".to_string(),
            dimension: Dimension::NONE,
            system: System::Si,
            converter: Some(Converter::Identity),
            terms: Vec::new(),
        }
    }

    pub fn in_system(mut self, system: System) -> Self {
        self.system = system;
        self
    }

    pub fn is_dimensionless(&self) -> bool {
        self.dimension.is_dimensionless()
    }

    pub fn is_arbitrary(&self) -> bool {
        self.converter.is_none()
    }

    pub fn is_compatible(&self, other: &Unit) -> bool {
        self.dimension == other.dimension
    }

    /// Factors of the unit as (symbol, exponent) pairs
    pub fn terms(&self) -> &[(String, i32)] {
        &self.terms
    }

    // ========== Composition ==========

    /// Product unit; offsets of affine units are dropped.
    ///
    /// A factor from another system is rebased into this unit's system; the
    /// product loses its linkage when that is impossible. Fails with
    /// `Overflow` when an exponent leaves the i32 range.
    pub fn multiply(&self, other: &Unit) -> Result<Unit> {
        let overflow = || exponent_overflow(format!("{} * {}", self, other));
        let mut terms = self.terms.clone();
        for (symbol, exp) in &other.terms {
            match terms.iter_mut().find(|(s, _)| s == symbol) {
                Some((_, e)) => *e = e.checked_add(*exp).ok_or_else(overflow)?,
                None => terms.push((symbol.clone(), *exp)),
            }
        }
        terms.retain(|(_, e)| *e != 0);
        let dimension = self.dimension.checked_multiply(other.dimension).ok_or_else(overflow)?;

        let converter = match (&self.converter, &other.converter) {
            (Some(a), Some(b)) => other
                .system
                .rebase(self.system, other.dimension)
                .map(|rebase| a.linear_part().compose(rebase.compose(b.linear_part()))),
            _ => None,
        };

        Ok(Unit::product(terms, dimension, self.system, converter))
    }

    /// Reciprocal unit: negated exponents and an inverted scale.
    pub fn inverse(&self) -> Result<Unit> {
        self.pow(-1)
    }

    pub fn divide(&self, other: &Unit) -> Result<Unit> {
        self.multiply(&other.inverse()?)
    }

    /// Integer power; `pow(0)` is the dimensionless unit.
    pub fn pow(&self, n: i32) -> Result<Unit> {
        match n {
            0 => return Ok(Unit::one()),
            1 => return Ok(self.clone()),
            _ => {}
        }
        let overflow = || exponent_overflow(format!("({})^{}", self, n));
        let terms = self
            .terms
            .iter()
            .map(|(s, e)| e.checked_mul(n).map(|e| (s.clone(), e)))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(overflow)?;
        let dimension = self.dimension.checked_power(n).ok_or_else(overflow)?;
        let converter = match &self.converter {
            Some(c) => Some(c.pow(n)?),
            None => None,
        };
        Ok(Unit::product(terms, dimension, self.system, converter))
    }

    /// A composed unit, named after its rendered symbol
    fn product(terms: Vec<(String, i32)>, dimension: Dimension, system: System, converter: Option<Converter>) -> Unit {
        let symbol = render_symbol(&terms);
        Unit {
            name: symbol.clone(),
            symbol,
            dimension,
            system,
            converter,
            terms,
        }
    }

    /// Cheap test for the very same unit, before the semantic comparison
    fn is_same(&self, other: &Unit) -> bool {
        std::ptr::eq(self, other)
            || (self.symbol == other.symbol
                && self.system == other.system
                && self.dimension == other.dimension
                && same_converter(&self.converter, &other.converter))
    }

    // ========== Conversion ==========

    /// Converter from values in this unit to values in `target`.
    ///
    /// Fails with `Incommensurable` when the dimensions differ and with
    /// `Unconvertible` when either unit is arbitrary or the units belong to
    /// different systems.
    pub fn converter_to(&self, target: &Unit) -> Result<Converter> {
        if self.is_same(target) || self == target {
            return Ok(Converter::Identity);
        }
        self.check_commensurable(target)?;
        if self.system != target.system {
            return Err(self.unconvertible(
                target,
                format!("{} and {} are different unit systems", self.system.name(), target.system.name()),
            ));
        }
        self.path_to(target, Converter::Identity)
    }

    /// Like `converter_to`, but crosses unit systems through their SI scales.
    pub fn converter_to_any(&self, target: &Unit) -> Result<Converter> {
        if self.is_same(target) || self == target {
            return Ok(Converter::Identity);
        }
        self.check_commensurable(target)?;
        let rebase = self.system.rebase(target.system, self.dimension).ok_or_else(|| {
            self.unconvertible(
                target,
                format!(
                    "no SI scale for {} between {} and {}",
                    self.dimension,
                    self.system.name(),
                    target.system.name()
                ),
            )
        })?;
        self.path_to(target, rebase)
    }

    fn path_to(&self, target: &Unit, rebase: Converter) -> Result<Converter> {
        let (Some(from), Some(to)) = (&self.converter, &target.converter) else {
            return Err(self.unconvertible(target, "no linkage to a reference unit".to_string()));
        };
        let converter = to.inverse().compose(rebase.compose(from.clone()));
        if converter.is_identity() {
            Ok(Converter::Identity)
        } else {
            Ok(converter)
        }
    }

    fn check_commensurable(&self, target: &Unit) -> Result<()> {
        if self.dimension == target.dimension {
            Ok(())
        } else {
            Err(UnitError::Incommensurable {
                from: self.symbol.clone(),
                to: target.symbol.clone(),
                from_dim: self.dimension,
                to_dim: target.dimension,
            })
        }
    }

    fn unconvertible(&self, target: &Unit, reason: String) -> UnitError {
        UnitError::Unconvertible {
            from: self.symbol.clone(),
            to: target.symbol.clone(),
            reason,
        }
    }
}

fn exponent_overflow(expression: String) -> UnitError {
    UnitError::Overflow {
        value: format!("an exponent of {}", expression),
        target: "i32",
    }
}

/// Structural converter equality; no affine evaluation.
fn same_converter(a: &Option<Converter>, b: &Option<Converter>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(Converter::Identity), Some(Converter::Identity)) => true,
        (Some(Converter::Scale(x)), Some(Converter::Scale(y)))
        | (Some(Converter::Offset(x)), Some(Converter::Offset(y))) => x == y,
        _ => false,
    }
}

/// Render product terms in the textual grammar.
fn render_symbol(terms: &[(String, i32)]) -> String {
    let power = |symbol: &str, exp: i32| match exp {
        1 => symbol.to_string(),
        _ => format!("{}^{}", symbol, exp),
    };
    let numerator: Vec<String> = terms
        .iter()
        .filter(|(_, e)| *e > 0)
        .map(|(s, e)| power(s, *e))
        .collect();
    let denominator: String = terms
        .iter()
        .filter(|(_, e)| *e < 0)
        .map(|(s, e)| format!("/{}", power(s, -e)))
        .collect();

    if numerator.is_empty() && denominator.is_empty() {
        String::new()
    } else if numerator.is_empty() {
        format!("1{}", denominator)
    } else {
        format!("{}{}", numerator.join("*"), denominator)
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol
            && self.dimension == other.dimension
            && self.system == other.system
            && self.converter == other.converter
    }
}

impl Default for Unit {
    fn default() -> Self {
        Unit::one()
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}
