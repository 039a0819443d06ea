//! Physical dimensions
//!
//! A dimension is a vector of exponents over the seven SI base quantities:
//! [length, mass, time, current, temperature, amount, luminosity]
//!
//! Composition is `const` so that dimension kinds can name their dimension
//! at the type level.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of SI base dimensions
pub const BASE_COUNT: usize = 7;

const SYMBOLS: [&str; BASE_COUNT] = ["L", "M", "T", "I", "Θ", "N", "J"];

/// Exponents of the seven SI base dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimension {
    /// [length, mass, time, current, temperature, amount, luminosity]
    pub exponents: [i32; BASE_COUNT],
}

impl Dimension {
    pub const NONE: Dimension = Dimension::new([0, 0, 0, 0, 0, 0, 0]);
    pub const LENGTH: Dimension = Dimension::new([1, 0, 0, 0, 0, 0, 0]);
    pub const MASS: Dimension = Dimension::new([0, 1, 0, 0, 0, 0, 0]);
    pub const TIME: Dimension = Dimension::new([0, 0, 1, 0, 0, 0, 0]);
    pub const CURRENT: Dimension = Dimension::new([0, 0, 0, 1, 0, 0, 0]);
    pub const TEMPERATURE: Dimension = Dimension::new([0, 0, 0, 0, 1, 0, 0]);
    pub const AMOUNT: Dimension = Dimension::new([0, 0, 0, 0, 0, 1, 0]);
    pub const LUMINOSITY: Dimension = Dimension::new([0, 0, 0, 0, 0, 0, 1]);

    pub const AREA: Dimension = Dimension::LENGTH.power(2);
    pub const VOLUME: Dimension = Dimension::LENGTH.power(3);
    pub const FREQUENCY: Dimension = Dimension::TIME.invert();
    pub const VELOCITY: Dimension = Dimension::LENGTH.divide(Dimension::TIME);
    pub const ACCELERATION: Dimension = Dimension::VELOCITY.divide(Dimension::TIME);
    pub const FORCE: Dimension = Dimension::MASS.multiply(Dimension::ACCELERATION);
    pub const ENERGY: Dimension = Dimension::FORCE.multiply(Dimension::LENGTH);
    pub const POWER: Dimension = Dimension::ENERGY.divide(Dimension::TIME);
    pub const PRESSURE: Dimension = Dimension::FORCE.divide(Dimension::AREA);
    pub const CHARGE: Dimension = Dimension::CURRENT.multiply(Dimension::TIME);
    pub const VOLTAGE: Dimension = Dimension::POWER.divide(Dimension::CURRENT);
    pub const RESISTANCE: Dimension = Dimension::VOLTAGE.divide(Dimension::CURRENT);

    pub const fn new(exponents: [i32; BASE_COUNT]) -> Self {
        Dimension { exponents }
    }

    pub const fn is_dimensionless(&self) -> bool {
        let mut i = 0;
        while i < BASE_COUNT {
            if self.exponents[i] != 0 {
                return false;
            }
            i += 1;
        }
        true
    }

    /// Product of two dimensions (exponents add)
    pub const fn multiply(self, other: Dimension) -> Dimension {
        let mut exponents = [0i32; BASE_COUNT];
        let mut i = 0;
        while i < BASE_COUNT {
            exponents[i] = self.exponents[i] + other.exponents[i];
            i += 1;
        }
        Dimension { exponents }
    }

    /// Quotient of two dimensions (exponents subtract)
    pub const fn divide(self, other: Dimension) -> Dimension {
        self.multiply(other.invert())
    }

    /// Integer power (exponents scale)
    pub const fn power(self, n: i32) -> Dimension {
        let mut exponents = [0i32; BASE_COUNT];
        let mut i = 0;
        while i < BASE_COUNT {
            exponents[i] = self.exponents[i] * n;
            i += 1;
        }
        Dimension { exponents }
    }

    pub const fn invert(self) -> Dimension {
        self.power(-1)
    }

    /// `multiply`, or `None` when an exponent leaves the i32 range.
    pub fn checked_multiply(self, other: Dimension) -> Option<Dimension> {
        let mut exponents = [0i32; BASE_COUNT];
        for (i, slot) in exponents.iter_mut().enumerate() {
            *slot = self.exponents[i].checked_add(other.exponents[i])?;
        }
        Some(Dimension { exponents })
    }

    /// `power`, or `None` when an exponent leaves the i32 range.
    pub fn checked_power(self, n: i32) -> Option<Dimension> {
        let mut exponents = [0i32; BASE_COUNT];
        for (i, slot) in exponents.iter_mut().enumerate() {
            *slot = self.exponents[i].checked_mul(n)?;
        }
        Some(Dimension { exponents })
    }

    /// Common name, when the dimension has one
    pub fn name(&self) -> Option<&'static str> {
        const NAMED: [(Dimension, &str); 20] = [
            (Dimension::NONE, "dimensionless"),
            (Dimension::LENGTH, "length"),
            (Dimension::MASS, "mass"),
            (Dimension::TIME, "time"),
            (Dimension::CURRENT, "current"),
            (Dimension::TEMPERATURE, "temperature"),
            (Dimension::AMOUNT, "amount"),
            (Dimension::LUMINOSITY, "luminosity"),
            (Dimension::AREA, "area"),
            (Dimension::VOLUME, "volume"),
            (Dimension::FREQUENCY, "frequency"),
            (Dimension::VELOCITY, "velocity"),
            (Dimension::ACCELERATION, "acceleration"),
            (Dimension::FORCE, "force"),
            (Dimension::ENERGY, "energy"),
            (Dimension::POWER, "power"),
            (Dimension::PRESSURE, "pressure"),
            (Dimension::CHARGE, "charge"),
            (Dimension::VOLTAGE, "voltage"),
            (Dimension::RESISTANCE, "resistance"),
        ];
        NAMED.iter().find(|(d, _)| d == self).map(|(_, name)| *name)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .exponents
            .iter()
            .zip(SYMBOLS)
            .filter(|(exp, _)| **exp != 0)
            .map(|(exp, symbol)| match exp {
                1 => symbol.to_string(),
                _ => format!("{}^{}", symbol, exp),
            })
            .collect();

        if parts.is_empty() {
            write!(f, "1")
        } else {
            write!(f, "{}", parts.join(" "))
        }
    }
}

impl Default for Dimension {
    fn default() -> Self {
        Self::NONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensionless() {
        assert!(Dimension::NONE.is_dimensionless());
        assert!(!Dimension::LENGTH.is_dimensionless());
        assert!(Dimension::LENGTH.divide(Dimension::LENGTH).is_dimensionless());
    }

    #[test]
    fn test_derived_dimensions() {
        assert_eq!(Dimension::VELOCITY.exponents, [1, 0, -1, 0, 0, 0, 0]);
        assert_eq!(Dimension::FORCE.exponents, [1, 1, -2, 0, 0, 0, 0]);
        assert_eq!(Dimension::PRESSURE.exponents, [-1, 1, -2, 0, 0, 0, 0]);
        assert_eq!(Dimension::RESISTANCE.exponents, [2, 1, -3, -2, 0, 0, 0]);
    }

    #[test]
    fn test_power_and_invert() {
        assert_eq!(Dimension::LENGTH.power(2), Dimension::AREA);
        assert_eq!(Dimension::LENGTH.power(0), Dimension::NONE);
        assert_eq!(Dimension::FREQUENCY.invert(), Dimension::TIME);
    }

    #[test]
    fn test_checked_composition() {
        assert_eq!(Dimension::LENGTH.checked_power(2), Some(Dimension::AREA));
        assert_eq!(Dimension::MASS.checked_multiply(Dimension::ACCELERATION), Some(Dimension::FORCE));

        let huge = Dimension::LENGTH.power(i32::MAX);
        assert_eq!(huge.checked_multiply(Dimension::LENGTH), None);
        assert_eq!(Dimension::LENGTH.power(65536).checked_power(65536), None);
        assert_eq!(Dimension::LENGTH.power(i32::MIN).checked_power(-1), None);
        assert_eq!(Dimension::TIME.checked_power(i32::MIN), Some(Dimension::TIME.power(i32::MIN)));
    }

    #[test]
    fn test_names() {
        assert_eq!(Dimension::VELOCITY.name(), Some("velocity"));
        assert_eq!(Dimension::NONE.name(), Some("dimensionless"));
        assert_eq!(Dimension::new([0, 0, 0, 0, 0, 0, 2]).name(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Dimension::NONE.to_string(), "1");
        assert_eq!(Dimension::LENGTH.to_string(), "L");
        assert_eq!(Dimension::VELOCITY.to_string(), "L T^-1");
        assert_eq!(Dimension::ENERGY.to_string(), "L^2 M T^-2");
    }
}
