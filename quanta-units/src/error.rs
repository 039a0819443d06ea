//! Error types for unit conversion, quantity arithmetic and parsing

use crate::lexer::Position;
use crate::Dimension;
use quanta_core::NumberError;
use thiserror::Error;

/// Errors from the conversion engine and quantity arithmetic
#[derive(Debug, Error)]
pub enum UnitError {
    #[error("Cannot convert {from} ({from_dim}) to {to} ({to_dim}): incommensurable dimensions")]
    Incommensurable {
        from: String,
        to: String,
        from_dim: Dimension,
        to_dim: Dimension,
    },

    #[error("Cannot convert {from} to {to}: {reason}")]
    Unconvertible { from: String, to: String, reason: String },

    #[error("Overflow: {value} does not fit in {target}")]
    Overflow { value: String, target: &'static str },

    #[error("Arithmetic error: {0}")]
    Arithmetic(NumberError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Unknown unit: {0}")]
    UnknownUnit(String),
}

impl From<NumberError> for UnitError {
    fn from(e: NumberError) -> Self {
        match e {
            NumberError::Overflow { value, target } => UnitError::Overflow { value, target },
            other => UnitError::Arithmetic(other),
        }
    }
}

/// Errors from the lexer and parser
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Parse error at {position}: expected {expected}, found {found}")]
    Unexpected {
        position: Position,
        found: String,
        expected: String,
    },

    #[error("Parse error at {position}: unknown unit symbol '{symbol}'")]
    UnknownSymbol { position: Position, symbol: String },

    #[error("Read error: {0}")]
    Read(#[from] std::io::Error),
}

impl ParseError {
    pub fn unexpected(position: Position, found: impl Into<String>, expected: impl Into<String>) -> Self {
        ParseError::Unexpected {
            position,
            found: found.into(),
            expected: expected.into(),
        }
    }

    /// Source position of the failure, when it has one
    pub fn position(&self) -> Option<Position> {
        match self {
            ParseError::Unexpected { position, .. } | ParseError::UnknownSymbol { position, .. } => {
                Some(*position)
            }
            ParseError::Read(_) => None,
        }
    }
}

pub type Result<T, E = UnitError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_maps_to_unit_overflow() {
        let err: UnitError = NumberError::Overflow { value: "1e30".into(), target: "i64" }.into();
        assert!(matches!(err, UnitError::Overflow { target: "i64", .. }));

        let err: UnitError = NumberError::DivisionByZero.into();
        assert!(matches!(err, UnitError::Arithmetic(NumberError::DivisionByZero)));
    }

    #[test]
    fn test_parse_error_position() {
        let err = ParseError::unexpected(Position::new(1, 8), "end of input", "integer exponent");
        assert_eq!(err.position(), Some(Position::new(1, 8)));
        assert_eq!(
            err.to_string(),
            "Parse error at line 1, column 8: expected integer exponent, found end of input"
        );
        let io = ParseError::from(std::io::Error::new(std::io::ErrorKind::InvalidData, "bad utf-8"));
        assert!(io.position().is_none());
    }

    #[test]
    fn test_incommensurable_message() {
        let err = UnitError::Incommensurable {
            from: "m".into(),
            to: "s".into(),
            from_dim: Dimension::LENGTH,
            to_dim: Dimension::TIME,
        };
        assert_eq!(err.to_string(), "Cannot convert m (L) to s (T): incommensurable dimensions");
    }
}
