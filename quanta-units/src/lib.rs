//! Quanta Units - physical quantities and unit conversion
//!
//! Quantities pair a `Number` with a `Unit`. Units know their `Dimension`
//! and carry an affine `Converter` to the coherent unit of their system, so
//! conversion between any two commensurable units is a composition of two
//! converters. Quantities can additionally be tagged with a compile-time
//! `Kind` (`Quantity<Length>`), or left untagged (`Quantity<AnyKind>`).
//!
//! Text goes through a streaming lexer and a small recursive-descent parser:
//!
//! ```
//! use quanta_units::{parse_quantity, units::HOUR};
//!
//! let speed = parse_quantity("36 km/h").unwrap();
//! let metres_per_second = speed.to(&"m/s".parse().unwrap()).unwrap();
//! assert_eq!(metres_per_second.to_string(), "10 m/s");
//! assert_eq!(HOUR.symbol, "h");
//! ```

mod converter;
mod dimension;
mod error;
mod format;
pub mod kind;
pub mod lexer;
mod parse;
mod quantity;
mod range;
mod unit;
pub mod units;

pub use converter::Converter;
pub use dimension::Dimension;
pub use error::{ParseError, Result, UnitError};
pub use format::{
    default_format, default_system, parse_conversion, parse_quantity, parse_quantity_conversion,
    parse_unit, providers, split_conversion, SimpleUnitFormat, UnitFormat, CONVERSION_SEPARATORS,
};
pub use kind::{AnyKind, Kind};
pub use lexer::{LexerConfig, Position};
pub use parse::{
    parse_quantity_expr, parse_unit_expr, ExpressionParser, QuantityExpr, UnitExpr, MAX_EXPONENT,
};
pub use quantity::Quantity;
pub use range::Range;
pub use unit::{System, Unit};
pub use units::{SystemOfUnits, UnitRegistry, UNITS};

/// Prelude for common imports
pub mod prelude {
    pub use crate::kind::{AnyKind, Kind};
    pub use crate::units::{SystemOfUnits, UNITS};
    pub use crate::{
        parse_quantity, parse_unit, Converter, Dimension, Quantity, Range, Unit, UnitError,
    };
}
