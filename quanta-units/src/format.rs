//! Unit formats and the default service providers

use crate::error::{ParseError, Result};
use crate::lexer::{LexerConfig, Position};
use crate::parse::ExpressionParser;
use crate::units::{BuiltinUnits, SystemOfUnits};
use crate::{Quantity, Unit, UnitError};
use quanta_plugin::ServiceRegistry;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

/// Separators accepted between the two sides of a conversion, tried in order
pub const CONVERSION_SEPARATORS: [&str; 4] = ["->", "→", " to ", " in "];

/// Renders units to text and reads them back.
pub trait UnitFormat: Send + Sync {
    fn format(&self, unit: &Unit) -> String;

    fn parse(&self, text: &str) -> Result<Unit>;
}

/// The standard textual grammar: `m`, `kg*m/s^2`, `1/m`, `m²`.
pub struct SimpleUnitFormat {
    system: Arc<dyn SystemOfUnits>,
    config: LexerConfig,
}

impl SimpleUnitFormat {
    pub fn new(system: Arc<dyn SystemOfUnits>) -> Self {
        SimpleUnitFormat { system, config: LexerConfig::default() }
    }

    pub fn with_config(mut self, config: LexerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn system(&self) -> &dyn SystemOfUnits {
        &*self.system
    }

    pub fn parse_quantity(&self, text: &str) -> Result<Quantity> {
        self.parser().parse_quantity(text)
    }

    fn parser(&self) -> ExpressionParser<'_> {
        ExpressionParser::new(&*self.system).with_config(self.config)
    }
}

impl Default for SimpleUnitFormat {
    fn default() -> Self {
        SimpleUnitFormat::new(Arc::new(BuiltinUnits))
    }
}

impl UnitFormat for SimpleUnitFormat {
    fn format(&self, unit: &Unit) -> String {
        unit.symbol.clone()
    }

    fn parse(&self, text: &str) -> Result<Unit> {
        self.parser().parse_unit(text)
    }
}

static PROVIDERS: LazyLock<ServiceRegistry> = LazyLock::new(|| {
    let system: Arc<dyn SystemOfUnits> = Arc::new(BuiltinUnits);
    let format: Arc<dyn UnitFormat> = Arc::new(SimpleUnitFormat::default());
    ServiceRegistry::new()
        .with_service::<dyn SystemOfUnits>("built-in", system)
        .with_service::<dyn UnitFormat>("simple", format)
});

/// The registry the library draws its default services from.
pub fn providers() -> &'static ServiceRegistry {
    &PROVIDERS
}

/// First registered `SystemOfUnits`, or the built-in table.
pub fn default_system() -> Arc<dyn SystemOfUnits> {
    providers()
        .get_service::<dyn SystemOfUnits>()
        .unwrap_or_else(|| Arc::new(BuiltinUnits))
}

/// First registered `UnitFormat`, or `SimpleUnitFormat`.
pub fn default_format() -> Arc<dyn UnitFormat> {
    providers()
        .get_service::<dyn UnitFormat>()
        .unwrap_or_else(|| Arc::new(SimpleUnitFormat::default()))
}

/// Parse a unit with the default format.
pub fn parse_unit(text: &str) -> Result<Unit> {
    default_format().parse(text)
}

/// Parse a quantity such as `9.81 m/s^2` against the default system.
pub fn parse_quantity(text: &str) -> Result<Quantity> {
    let system = default_system();
    ExpressionParser::new(&*system).parse_quantity(text)
}

/// Split `from->to`, `from→to`, `from to to` or `from in to`.
///
/// The first separator that occurs exactly once wins.
pub fn split_conversion(text: &str) -> Option<(&str, &str)> {
    CONVERSION_SEPARATORS.iter().find_map(|sep| split_once_exactly(text, sep))
}

fn split_once_exactly<'a>(text: &'a str, sep: &str) -> Option<(&'a str, &'a str)> {
    let at = text.find(sep)?;
    let rest = &text[at + sep.len()..];
    (!rest.contains(sep)).then_some((&text[..at], rest))
}

/// Characters of `text` before its suffix `to`
fn column_offset(text: &str, to: &str) -> usize {
    text[..text.len() - to.len()].chars().count()
}

/// Parse a single-line conversion into its source and target units.
///
/// Error positions refer to columns of the whole line.
pub fn parse_conversion(text: &str) -> Result<(Unit, Unit)> {
    let Some((from, to)) = split_conversion(text) else {
        return Err(ParseError::unexpected(
            Position::new(1, text.chars().count() + 1),
            "end of input",
            "'->', '→', ' to ' or ' in '",
        )
        .into());
    };
    let system = default_system();
    let parser = ExpressionParser::new(&*system);
    let source = parser.parse_unit(from)?;
    let target = parser.shifted(column_offset(text, to)).parse_unit(to)?;
    Ok((source, target))
}

/// Parse `<quantity> <separator> <unit>` with `parser`.
///
/// `Ok(None)` when the line is not a conversion. The word separators
/// ` to ` and ` in ` only split the line when the right side parses as a
/// unit, so `1 in + 2 in` is left alone. Error positions refer to columns
/// of the whole line.
pub fn parse_quantity_conversion(
    parser: &ExpressionParser<'_>,
    text: &str,
) -> Result<Option<(Quantity, Unit)>> {
    for sep in CONVERSION_SEPARATORS {
        let Some((from, to)) = split_once_exactly(text, sep) else {
            continue;
        };
        let target_parser = parser.shifted(column_offset(text, to));
        let is_word = sep.starts_with(' ');
        if is_word && target_parser.parse_unit(to).is_err() {
            continue;
        }
        let quantity = parser.parse_quantity(from)?;
        let unit = target_parser.parse_unit(to)?;
        return Ok(Some((quantity, unit)));
    }
    Ok(None)
}

impl FromStr for Unit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self> {
        parse_unit(s)
    }
}

impl FromStr for Quantity {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self> {
        parse_quantity(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{KILOMETRE, METRE, UNITS};

    #[test]
    fn test_default_services() {
        assert_eq!(default_system().name(), "built-in");
        assert_eq!(default_format().format(&METRE.pow(2).unwrap()), "m^2");
        assert_eq!(providers().provider_names::<dyn UnitFormat>(), vec!["simple"]);
        assert_eq!(providers().provider_names::<dyn SystemOfUnits>(), vec!["built-in"]);
    }

    #[test]
    fn test_format_parse_round_trip() {
        let format = SimpleUnitFormat::default();
        for symbol in ["m", "km/h", "kg*m/s^2", "1/m", "m^3", "[degF]"] {
            let unit = format.parse(symbol).unwrap();
            assert_eq!(format.format(&unit), symbol);
            assert_eq!(format.parse(&format.format(&unit)).unwrap(), unit);
        }
    }

    #[test]
    fn test_parse_conversion_forms() {
        for text in ["km->mi", "km→mi", "km to mi", "km in mi", "km -> mi"] {
            let (from, to) = parse_conversion(text).unwrap();
            assert_eq!(from, *KILOMETRE, "text {:?}", text);
            assert_eq!(to.symbol, "mi");
        }
        let (from, to) = parse_conversion("°C→[degF]").unwrap();
        assert_eq!(from.symbol, "Cel");
        assert_eq!(to.symbol, "[degF]");
    }

    #[test]
    fn test_parse_conversion_errors() {
        let err = parse_conversion("km mi").unwrap_err();
        assert!(matches!(err, UnitError::Parse(ParseError::Unexpected { .. })));

        match parse_conversion("km -> furlong").unwrap_err() {
            UnitError::Parse(e) => assert_eq!(e.position(), Some(Position::new(1, 7))),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_quantity_conversion() {
        let parser = ExpressionParser::new(&*UNITS);
        let (q, unit) = parse_quantity_conversion(&parser, "12 in to ft").unwrap().unwrap();
        assert_eq!(q.unit().symbol, "in");
        assert_eq!(unit.symbol, "ft");
        let (q, unit) = parse_quantity_conversion(&parser, "1 ft in in").unwrap().unwrap();
        assert_eq!(q.unit().symbol, "ft");
        assert_eq!(unit.symbol, "in");

        for text in ["1 in + 2 in", "3 in", "2 in * 4 in"] {
            assert!(parse_quantity_conversion(&parser, text).unwrap().is_none(), "text {:?}", text);
        }
    }

    #[test]
    fn test_quantity_conversion_error_columns() {
        let parser = ExpressionParser::new(&*UNITS);
        let cases = [
            ("10 km -> furlong", 10),
            ("10 km→furlong", 7),
            ("10 furlong -> m", 4),
            ("10 km -> m^", 12),
        ];
        for (text, column) in cases {
            match parse_quantity_conversion(&parser, text).unwrap_err() {
                UnitError::Parse(e) => assert_eq!(e.position(), Some(Position::new(1, column)), "text {:?}", text),
                other => panic!("unexpected error for {:?}: {other}", text),
            }
        }
    }

    #[test]
    fn test_split_conversion() {
        assert_eq!(split_conversion("10 km -> m"), Some(("10 km ", " m")));
        assert_eq!(split_conversion("12 in to ft"), Some(("12 in", "ft")));
        assert_eq!(split_conversion("10 km"), None);
    }

    #[test]
    fn test_from_str() {
        let unit: Unit = "km".parse().unwrap();
        assert_eq!(unit, *KILOMETRE);
        let q: Quantity = "2.5 km".parse().unwrap();
        assert_eq!(q.unit(), &*KILOMETRE);
        assert!("2.5 km^".parse::<Quantity>().is_err());
    }

    #[test]
    fn test_custom_system_format() {
        let mut registry = crate::units::UnitRegistry::empty();
        registry.register(UNITS.get("ft").unwrap().clone());
        let format = SimpleUnitFormat::new(Arc::new(registry));
        assert_eq!(format.system().symbols(), vec!["ft"]);
        assert!(format.parse("ft^2").is_ok());
        assert!(format.parse("m").is_err());
    }
}
