//! Unit and quantity expression parsing
//!
//! Parsing runs in two phases. The token stream is first turned into a
//! `UnitExpr` tree that remembers where each symbol appeared; the tree is
//! then resolved against a `SystemOfUnits`. A syntax error anywhere in the
//! input is therefore reported before any unknown symbol.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! quantity  := NUMBER unit_expr? EOF
//! unit_expr := product ('/' product)*
//! product   := power (('*' | '·')? power)*
//! power     := term ('^' INTEGER | SUPERSCRIPT)?
//! term      := SYMBOL | '1' | '(' unit_expr ')'
//! ```

use crate::error::{ParseError, Result};
use crate::lexer::{superscript_value, Lexer, LexerConfig, Position, Token, TokenKind};
use crate::units::SystemOfUnits;
use crate::{Quantity, Unit};
use quanta_core::Number;
use std::io::Read;
use std::str::FromStr;

/// Largest exponent magnitude written in a unit expression
pub const MAX_EXPONENT: i32 = 1000;

const EXPONENT_RANGE: &str = "an exponent between -1000 and 1000";

/// Syntax tree of a unit expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitExpr {
    /// A unit symbol or alias, with where it started
    Symbol { name: String, position: Position },
    /// The literal `1`
    One,
    Power(Box<UnitExpr>, i32),
    Product(Box<UnitExpr>, Box<UnitExpr>),
    Quotient(Box<UnitExpr>, Box<UnitExpr>),
}

impl UnitExpr {
    /// Look every symbol up in `system` and build the unit.
    ///
    /// Fails with `UnknownSymbol` for a symbol `system` lacks and with
    /// `Overflow` when nested powers leave the i32 exponent range.
    pub fn resolve(&self, system: &dyn SystemOfUnits) -> Result<Unit> {
        match self {
            UnitExpr::Symbol { name, position } => system.unit(name).cloned().ok_or_else(|| {
                ParseError::UnknownSymbol {
                    position: *position,
                    symbol: name.clone(),
                }
                .into()
            }),
            UnitExpr::One => Ok(Unit::one()),
            UnitExpr::Power(base, n) => base.resolve(system)?.pow(*n),
            UnitExpr::Product(a, b) => a.resolve(system)?.multiply(&b.resolve(system)?),
            UnitExpr::Quotient(a, b) => a.resolve(system)?.divide(&b.resolve(system)?),
        }
    }

    /// Symbols in source order
    pub fn symbols(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            UnitExpr::Symbol { name, .. } => out.push(name),
            UnitExpr::One => {}
            UnitExpr::Power(base, _) => base.collect_symbols(out),
            UnitExpr::Product(a, b) | UnitExpr::Quotient(a, b) => {
                a.collect_symbols(out);
                b.collect_symbols(out);
            }
        }
    }
}

/// A parsed but unresolved quantity
#[derive(Debug, Clone, PartialEq)]
pub struct QuantityExpr {
    pub value: Number,
    /// `None` for a bare number
    pub unit: Option<UnitExpr>,
}

/// Recursive-descent parser over a token stream
struct Parser<R> {
    lexer: Lexer<R>,
    current: Token,
}

impl<R: Read> Parser<R> {
    fn new(mut lexer: Lexer<R>) -> Result<Self, ParseError> {
        let current = lexer.next_token()?;
        Ok(Parser { lexer, current })
    }

    fn advance(&mut self) -> Result<Token, ParseError> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::unexpected(self.current.span.begin, self.current.describe(), expected)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.at(kind) {
            self.advance()
        } else {
            Err(self.unexpected(kind.describe()))
        }
    }

    /// A whole unit expression; empty input is the dimensionless unit.
    fn unit(&mut self) -> Result<UnitExpr, ParseError> {
        if self.at(TokenKind::Eof) {
            return Ok(UnitExpr::One);
        }
        let expr = self.unit_expr()?;
        self.expect(TokenKind::Eof)?;
        Ok(expr)
    }

    fn quantity(&mut self) -> Result<QuantityExpr, ParseError> {
        let token = self.expect(TokenKind::Number)?;
        let value = Number::from_str(&token.text)
            .map_err(|_| ParseError::unexpected(token.span.begin, token.describe(), "a number"))?;
        let unit = if self.at(TokenKind::Eof) {
            None
        } else {
            Some(self.unit_expr()?)
        };
        self.expect(TokenKind::Eof)?;
        Ok(QuantityExpr { value, unit })
    }

    fn unit_expr(&mut self) -> Result<UnitExpr, ParseError> {
        let mut expr = self.product()?;
        while self.at(TokenKind::Slash) {
            self.advance()?;
            let rhs = self.product()?;
            expr = UnitExpr::Quotient(Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn product(&mut self) -> Result<UnitExpr, ParseError> {
        let mut expr = self.power()?;
        loop {
            match self.current.kind {
                TokenKind::Star | TokenKind::Dot => {
                    self.advance()?;
                }
                // adjacency
                TokenKind::Symbol | TokenKind::LParen => {}
                _ => break,
            }
            let rhs = self.power()?;
            expr = UnitExpr::Product(Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn power(&mut self) -> Result<UnitExpr, ParseError> {
        let base = self.term()?;
        let (exponent, expected) = match self.current.kind {
            TokenKind::Caret => {
                self.advance()?;
                if !self.at(TokenKind::Number) {
                    return Err(self.unexpected("an integer exponent"));
                }
                (self.current.text.parse::<i32>().ok(), "an integer exponent")
            }
            TokenKind::Superscript => (superscript_value(&self.current.text), "a superscript exponent"),
            _ => return Ok(base),
        };
        match exponent {
            Some(n) if n.unsigned_abs() <= MAX_EXPONENT.unsigned_abs() => {
                self.advance()?;
                Ok(UnitExpr::Power(Box::new(base), n))
            }
            Some(_) => Err(self.unexpected(EXPONENT_RANGE)),
            None => Err(self.unexpected(expected)),
        }
    }

    fn term(&mut self) -> Result<UnitExpr, ParseError> {
        match self.current.kind {
            TokenKind::Symbol => {
                let token = self.advance()?;
                Ok(UnitExpr::Symbol { name: token.text, position: token.span.begin })
            }
            TokenKind::Number if self.current.text == "1" => {
                self.advance()?;
                Ok(UnitExpr::One)
            }
            TokenKind::LParen => {
                self.advance()?;
                let inner = self.unit_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            _ => Err(self.unexpected("a unit symbol, '1' or '('")),
        }
    }
}

/// Syntax-only parse of a unit expression.
pub fn parse_unit_expr(input: &str) -> Result<UnitExpr, ParseError> {
    Parser::new(Lexer::from_text(input))?.unit()
}

/// Syntax-only parse of a quantity.
pub fn parse_quantity_expr(input: &str) -> Result<QuantityExpr, ParseError> {
    Parser::new(Lexer::from_text(input))?.quantity()
}

/// Parses expressions against a particular system of units.
pub struct ExpressionParser<'s> {
    system: &'s dyn SystemOfUnits,
    config: LexerConfig,
}

impl<'s> ExpressionParser<'s> {
    pub fn new(system: &'s dyn SystemOfUnits) -> Self {
        ExpressionParser { system, config: LexerConfig::default() }
    }

    pub fn with_config(mut self, config: LexerConfig) -> Self {
        self.config = config;
        self
    }

    /// A parser for text that starts `columns` characters further along the
    /// line, so that error positions stay relative to the whole line.
    pub fn shifted(&self, columns: usize) -> ExpressionParser<'s> {
        let config = LexerConfig {
            start_column: self.config.start_column + columns,
            ..self.config
        };
        ExpressionParser { system: self.system, config }
    }

    pub fn parse_unit(&self, input: &str) -> Result<Unit> {
        self.read_unit(input.as_bytes())
    }

    pub fn parse_quantity(&self, input: &str) -> Result<Quantity> {
        self.read_quantity(input.as_bytes())
    }

    /// Parse a unit expression read from `reader`.
    pub fn read_unit<R: Read>(&self, reader: R) -> Result<Unit> {
        let expr = Parser::new(Lexer::new(reader, self.config))?.unit()?;
        expr.resolve(self.system)
    }

    /// Parse a quantity read from `reader`.
    pub fn read_quantity<R: Read>(&self, reader: R) -> Result<Quantity> {
        let expr = Parser::new(Lexer::new(reader, self.config))?.quantity()?;
        let unit = match &expr.unit {
            Some(unit) => unit.resolve(self.system)?,
            None => Unit::one(),
        };
        Ok(Quantity::of(expr.value, unit))
    }
}
