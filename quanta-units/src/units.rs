//! Built-in units and the unit registry

use crate::{Converter, Dimension, System, Unit};
use quanta_core::Number;
use std::collections::HashMap;
use std::sync::LazyLock;

/// A set of units that can be looked up by symbol.
pub trait SystemOfUnits: Send + Sync {
    fn name(&self) -> &str;

    /// Resolve a symbol or alias
    fn unit(&self, symbol: &str) -> Option<&Unit>;

    /// Canonical symbols of every unit in the system
    fn symbols(&self) -> Vec<&str>;
}

pub static METRE: LazyLock<Unit> = LazyLock::new(|| Unit::base("m", "metre", Dimension::LENGTH));
pub static KILOMETRE: LazyLock<Unit> =
    LazyLock::new(|| Unit::scaled("km", "kilometre", Dimension::LENGTH, Number::from(1000)));
pub static SECOND: LazyLock<Unit> = LazyLock::new(|| Unit::base("s", "second", Dimension::TIME));
pub static MINUTE: LazyLock<Unit> =
    LazyLock::new(|| Unit::scaled("min", "minute", Dimension::TIME, Number::from(60)));
pub static HOUR: LazyLock<Unit> =
    LazyLock::new(|| Unit::scaled("h", "hour", Dimension::TIME, Number::from(3600)));
pub static DAY: LazyLock<Unit> =
    LazyLock::new(|| Unit::scaled("d", "day", Dimension::TIME, Number::from(86400)));
pub static KILOGRAM: LazyLock<Unit> =
    LazyLock::new(|| Unit::base("kg", "kilogram", Dimension::MASS));
pub static GRAM: LazyLock<Unit> =
    LazyLock::new(|| Unit::scaled("g", "gram", Dimension::MASS, Number::from_parts(1, -3)));
pub static AMPERE: LazyLock<Unit> =
    LazyLock::new(|| Unit::base("A", "ampere", Dimension::CURRENT));
pub static KELVIN: LazyLock<Unit> =
    LazyLock::new(|| Unit::base("K", "kelvin", Dimension::TEMPERATURE));
pub static CELSIUS: LazyLock<Unit> = LazyLock::new(|| {
    Unit::new(
        "Cel",
        "degree Celsius",
        Dimension::TEMPERATURE,
        Converter::Offset(Number::from_parts(27315, -2)),
    )
});
pub static MOLE: LazyLock<Unit> = LazyLock::new(|| Unit::base("mol", "mole", Dimension::AMOUNT));
pub static CANDELA: LazyLock<Unit> =
    LazyLock::new(|| Unit::base("cd", "candela", Dimension::LUMINOSITY));
pub static ONE: LazyLock<Unit> = LazyLock::new(Unit::one);

/// Global unit registry
pub static UNITS: LazyLock<UnitRegistry> = LazyLock::new(UnitRegistry::new);

/// Registry of known units with their aliases
#[derive(Debug, Clone)]
pub struct UnitRegistry {
    units: HashMap<String, Unit>,
    aliases: HashMap<String, String>,
}

impl UnitRegistry {
    /// Registry preloaded with the built-in units
    pub fn new() -> Self {
        let mut registry = UnitRegistry::empty();
        registry.register_length_units();
        registry.register_mass_units();
        registry.register_time_units();
        registry.register_base_units();
        registry.register_derived_units();
        registry.register_dimensionless_units();
        registry.register_cgs_units();
        registry
    }

    pub fn empty() -> Self {
        UnitRegistry {
            units: HashMap::new(),
            aliases: HashMap::new(),
        }
    }

    pub fn get(&self, symbol: &str) -> Option<&Unit> {
        self.units
            .get(symbol)
            .or_else(|| self.aliases.get(symbol).and_then(|canonical| self.units.get(canonical)))
    }

    pub fn register(&mut self, unit: Unit) {
        self.units.insert(unit.symbol.clone(), unit);
    }

    pub fn alias(&mut self, alias: &str, symbol: &str) {
        self.aliases.insert(alias.to_string(), symbol.to_string());
    }

    /// Units of the given dimension
    pub fn by_dimension(&self, dimension: Dimension) -> Vec<&Unit> {
        self.units.values().filter(|u| u.dimension == dimension).collect()
    }

    fn scaled(&mut self, symbol: &str, name: &str, dimension: Dimension, significand: i64, exponent: isize) {
        self.register(Unit::scaled(symbol, name, dimension, Number::from_parts(significand, exponent)));
    }

    fn aliases(&mut self, symbol: &str, aliases: &[&str]) {
        for alias in aliases {
            self.alias(alias, symbol);
        }
    }

    fn register_length_units(&mut self) {
        let length = Dimension::LENGTH;
        self.register(METRE.clone());
        self.register(KILOMETRE.clone());
        self.scaled("cm", "centimetre", length, 1, -2);
        self.scaled("mm", "millimetre", length, 1, -3);
        self.scaled("um", "micrometre", length, 1, -6);
        self.scaled("nm", "nanometre", length, 1, -9);
        self.scaled("in", "inch", length, 254, -4);
        self.scaled("ft", "foot", length, 3048, -4);
        self.scaled("yd", "yard", length, 9144, -4);
        self.scaled("mi", "mile", length, 1609344, -3);
        self.scaled("nmi", "nautical mile", length, 1852, 0);

        self.aliases("m", &["metre", "metres", "meter", "meters"]);
        self.aliases("km", &["kilometre", "kilometres", "kilometer", "kilometers"]);
        self.aliases("cm", &["centimetre", "centimeter"]);
        self.aliases("mm", &["millimetre", "millimeter"]);
        self.aliases("um", &["µm", "μm", "micron"]);
        self.aliases("in", &["inch", "inches"]);
        self.aliases("ft", &["foot", "feet"]);
        self.aliases("yd", &["yard", "yards"]);
        self.aliases("mi", &["mile", "miles"]);
    }

    fn register_mass_units(&mut self) {
        let mass = Dimension::MASS;
        self.register(KILOGRAM.clone());
        self.register(GRAM.clone());
        self.scaled("mg", "milligram", mass, 1, -6);
        self.scaled("t", "tonne", mass, 1000, 0);
        self.scaled("lb", "pound", mass, 45359237, -8);
        self.scaled("oz", "ounce", mass, 28349523125, -12);

        self.aliases("kg", &["kilogram", "kilograms"]);
        self.aliases("g", &["gram", "grams"]);
        self.aliases("lb", &["pound", "pounds", "lbs"]);
        self.aliases("oz", &["ounce", "ounces"]);
        self.aliases("t", &["tonne", "tonnes"]);
    }

    fn register_time_units(&mut self) {
        self.register(SECOND.clone());
        self.register(MINUTE.clone());
        self.register(HOUR.clone());
        self.register(DAY.clone());
        self.scaled("ms", "millisecond", Dimension::TIME, 1, -3);
        self.scaled("wk", "week", Dimension::TIME, 604800, 0);
        // Julian year
        self.scaled("a", "year", Dimension::TIME, 31557600, 0);

        self.aliases("s", &["second", "seconds", "sec"]);
        self.aliases("min", &["minute", "minutes"]);
        self.aliases("h", &["hour", "hours", "hr"]);
        self.aliases("d", &["day", "days"]);
        self.aliases("wk", &["week", "weeks"]);
        self.aliases("a", &["year", "years"]);
    }

    fn register_base_units(&mut self) {
        self.register(AMPERE.clone());
        self.scaled("mA", "milliampere", Dimension::CURRENT, 1, -3);
        self.register(MOLE.clone());
        self.scaled("mmol", "millimole", Dimension::AMOUNT, 1, -3);
        self.register(CANDELA.clone());

        self.register(KELVIN.clone());
        self.register(CELSIUS.clone());
        self.register(Unit::new(
            "[degF]",
            "degree Fahrenheit",
            Dimension::TEMPERATURE,
            Converter::ratio(5, 9).compose(Converter::Offset(Number::from_parts(45967, -2))),
        ));
        self.register(Unit::new("[degR]", "degree Rankine", Dimension::TEMPERATURE, Converter::ratio(5, 9)));

        self.aliases("A", &["ampere", "amperes", "amp"]);
        self.aliases("mol", &["mole", "moles"]);
        self.aliases("K", &["kelvin"]);
        self.aliases("Cel", &["°C", "degC", "celsius"]);
        self.aliases("[degF]", &["°F", "degF", "fahrenheit"]);
    }

    fn register_derived_units(&mut self) {
        self.register(Unit::base("Hz", "hertz", Dimension::FREQUENCY));
        self.register(Unit::base("N", "newton", Dimension::FORCE));
        self.register(Unit::base("J", "joule", Dimension::ENERGY));
        self.scaled("kJ", "kilojoule", Dimension::ENERGY, 1000, 0);
        self.scaled("cal", "calorie", Dimension::ENERGY, 4184, -3);
        self.scaled("kWh", "kilowatt hour", Dimension::ENERGY, 36, 5);
        self.register(Unit::base("W", "watt", Dimension::POWER));
        self.scaled("kW", "kilowatt", Dimension::POWER, 1000, 0);
        self.register(Unit::base("Pa", "pascal", Dimension::PRESSURE));
        self.scaled("kPa", "kilopascal", Dimension::PRESSURE, 1000, 0);
        self.scaled("bar", "bar", Dimension::PRESSURE, 100000, 0);
        self.scaled("atm", "standard atmosphere", Dimension::PRESSURE, 101325, 0);
        self.register(Unit::base("C", "coulomb", Dimension::CHARGE));
        self.register(Unit::base("V", "volt", Dimension::VOLTAGE));
        self.register(Unit::base("Ohm", "ohm", Dimension::RESISTANCE));
        self.scaled("L", "litre", Dimension::VOLUME, 1, -3);
        self.scaled("mL", "millilitre", Dimension::VOLUME, 1, -6);

        self.aliases("Hz", &["hertz"]);
        self.aliases("N", &["newton", "newtons"]);
        self.aliases("J", &["joule", "joules"]);
        self.aliases("W", &["watt", "watts"]);
        self.aliases("Pa", &["pascal"]);
        self.aliases("Ohm", &["Ω", "ohm", "ohms"]);
        self.aliases("L", &["l", "litre", "liter", "litres", "liters"]);
        self.aliases("mL", &["ml"]);
    }

    fn register_dimensionless_units(&mut self) {
        self.register(Unit::base("rad", "radian", Dimension::NONE));
        self.register(Unit::scaled(
            "deg",
            "degree",
            Dimension::NONE,
            Number::from(std::f64::consts::PI / 180.0),
        ));
        self.scaled("%", "percent", Dimension::NONE, 1, -2);
        self.register(Unit::arbitrary("[iU]", "international unit", Dimension::NONE));
        self.register(Unit::arbitrary("[arb'U]", "arbitrary unit", Dimension::NONE));

        self.aliases("rad", &["radian", "radians"]);
        self.aliases("deg", &["°", "degree", "degrees"]);
    }

    fn register_cgs_units(&mut self) {
        self.register(Unit::base("dyn", "dyne", Dimension::FORCE).in_system(System::Cgs));
        self.register(Unit::base("erg", "erg", Dimension::ENERGY).in_system(System::Cgs));
        self.register(Unit::base("Gal", "gal", Dimension::ACCELERATION).in_system(System::Cgs));

        self.aliases("dyn", &["dyne", "dynes"]);
    }
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemOfUnits for UnitRegistry {
    fn name(&self) -> &str {
        "built-in"
    }

    fn unit(&self, symbol: &str) -> Option<&Unit> {
        self.get(symbol)
    }

    fn symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = self.units.keys().map(String::as_str).collect();
        symbols.sort_unstable();
        symbols
    }
}

/// The built-in table as a standalone service.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinUnits;

impl SystemOfUnits for BuiltinUnits {
    fn name(&self) -> &str {
        UNITS.name()
    }

    fn unit(&self, symbol: &str) -> Option<&Unit> {
        UNITS.get(symbol)
    }

    fn symbols(&self) -> Vec<&str> {
        UNITS.symbols()
    }
}
