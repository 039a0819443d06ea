//! Lexer for unit and quantity expressions
//!
//! `CharStream` decodes UTF-8 from any reader into a window of characters
//! that remembers each character's line and column, so the lexer can read
//! ahead and back up while keeping exact source positions. `Lexer` turns
//! that stream into `Token`s.

use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Read};

/// Characters the window grows by, and how far a token must start into the
/// window before old characters are dropped instead.
pub const GROW_BY: usize = 2048;

/// Superscript digits and minus, as used in `m²` and `s⁻¹`
const SUPERSCRIPTS: [(char, char); 11] = [
    ('⁰', '0'),
    ('¹', '1'),
    ('²', '2'),
    ('³', '3'),
    ('⁴', '4'),
    ('⁵', '5'),
    ('⁶', '6'),
    ('⁷', '7'),
    ('⁸', '8'),
    ('⁹', '9'),
    ('⁻', '-'),
];

/// Line and column of a character, both starting at the configured origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LexerConfig {
    /// Tabs advance the column to the next multiple of this width
    pub tab_size: usize,
    /// Initial capacity of the character window
    pub buffer_size: usize,
    pub start_line: usize,
    pub start_column: usize,
}

impl Default for LexerConfig {
    fn default() -> Self {
        LexerConfig {
            tab_size: 8,
            buffer_size: 4096,
            start_line: 1,
            start_column: 1,
        }
    }
}

// ========== Character stream ==========

#[derive(Debug, Clone, Copy)]
struct Slot {
    ch: char,
    line: usize,
    column: usize,
}

impl Slot {
    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }
}

/// Incremental UTF-8 decoding over a byte reader.
struct Utf8Reader<R> {
    reader: R,
    buf: Box<[u8]>,
    pos: usize,
    len: usize,
}

impl<R: Read> Utf8Reader<R> {
    fn new(reader: R) -> Self {
        Utf8Reader {
            reader,
            buf: vec![0; 1024].into_boxed_slice(),
            pos: 0,
            len: 0,
        }
    }

    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        if self.pos == self.len {
            self.len = loop {
                match self.reader.read(&mut self.buf) {
                    Ok(n) => break n,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                }
            };
            self.pos = 0;
            if self.len == 0 {
                return Ok(None);
            }
        }
        let byte = self.buf[self.pos];
        self.pos += 1;
        Ok(Some(byte))
    }

    fn next_char(&mut self) -> io::Result<Option<char>> {
        let Some(first) = self.next_byte()? else {
            return Ok(None);
        };
        let width = match first {
            0x00..=0x7F => return Ok(Some(char::from(first))),
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => return Err(invalid_utf8()),
        };
        let mut bytes = [first, 0, 0, 0];
        for slot in bytes.iter_mut().take(width).skip(1) {
            *slot = self.next_byte()?.ok_or_else(invalid_utf8)?;
        }
        std::str::from_utf8(&bytes[..width])
            .ok()
            .and_then(|s| s.chars().next())
            .map(Some)
            .ok_or_else(invalid_utf8)
    }
}

fn invalid_utf8() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, "input is not valid UTF-8")
}

/// A backtrackable window over decoded characters.
///
/// Every character between the current token start and the read cursor is
/// kept, in order, however the window grows or slides.
pub struct CharStream<R> {
    source: Utf8Reader<R>,
    window: Vec<Slot>,
    capacity: usize,
    token_start: usize,
    cursor: usize,
    line: usize,
    column: usize,
    after_cr: bool,
    after_lf: bool,
    tab_size: usize,
}

impl<R: Read> CharStream<R> {
    pub fn new(reader: R, config: LexerConfig) -> Self {
        let capacity = config.buffer_size.max(1);
        CharStream {
            source: Utf8Reader::new(reader),
            window: Vec::with_capacity(capacity),
            capacity,
            token_start: 0,
            cursor: 0,
            line: config.start_line,
            column: config.start_column.saturating_sub(1),
            after_cr: false,
            after_lf: false,
            tab_size: config.tab_size.max(1),
        }
    }

    /// Mark the next character as the start of a token.
    pub fn begin_token(&mut self) {
        self.token_start = self.cursor;
    }

    /// Next character, or `None` at end of input.
    ///
    /// Characters stepped over by `backup` are returned again before any
    /// new input is read.
    pub fn read_char(&mut self) -> io::Result<Option<char>> {
        if let Some(slot) = self.window.get(self.cursor) {
            self.cursor += 1;
            return Ok(Some(slot.ch));
        }
        let Some(ch) = self.source.next_char()? else {
            return Ok(None);
        };
        if self.window.len() >= self.capacity {
            self.make_room();
        }
        self.advance_position(ch);
        self.window.push(Slot { ch, line: self.line, column: self.column });
        self.cursor += 1;
        Ok(Some(ch))
    }

    /// Step the cursor back `n` characters, stopping at the window origin.
    pub fn backup(&mut self, n: usize) {
        self.cursor -= n.min(self.cursor);
    }

    /// Text of the current token
    pub fn image(&self) -> String {
        if self.cursor <= self.token_start {
            return String::new();
        }
        self.window[self.token_start..self.cursor].iter().map(|s| s.ch).collect()
    }

    /// The last `n` characters read (fewer if the window holds fewer)
    pub fn suffix(&self, n: usize) -> String {
        let start = self.cursor - n.min(self.cursor);
        self.window[start..self.cursor].iter().map(|s| s.ch).collect()
    }

    /// Position of the first character of the current token
    pub fn begin_position(&self) -> Position {
        if self.cursor > self.token_start {
            self.window[self.token_start].position()
        } else {
            self.next_position()
        }
    }

    /// Position of the last character of the current token
    pub fn end_position(&self) -> Position {
        if self.cursor > self.token_start {
            self.window[self.cursor - 1].position()
        } else {
            self.begin_position()
        }
    }

    /// Position the next unread character has, or would have
    pub fn next_position(&self) -> Position {
        match self.window.get(self.cursor) {
            Some(slot) => slot.position(),
            None if self.after_cr || self.after_lf => Position::new(self.line + 1, 1),
            None => Position::new(self.line, self.column + 1),
        }
    }

    /// Current window capacity, in characters
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn make_room(&mut self) {
        if self.token_start >= GROW_BY {
            self.window.drain(..self.token_start);
            self.cursor -= self.token_start;
            self.token_start = 0;
        } else {
            self.capacity += GROW_BY;
            self.window.reserve(self.capacity - self.window.len());
        }
    }

    /// CR, LF and CRLF each end one line; tabs jump to the next tab stop.
    fn advance_position(&mut self, ch: char) {
        self.column += 1;
        if self.after_lf {
            self.after_lf = false;
            self.line += 1;
            self.column = 1;
        } else if self.after_cr {
            self.after_cr = false;
            if ch == '\n' {
                self.after_lf = true;
            } else {
                self.line += 1;
                self.column = 1;
            }
        }

        match ch {
            '\r' => self.after_cr = true,
            '\n' => self.after_lf = true,
            '\t' => {
                self.column -= 1;
                self.column += self.tab_size - (self.column % self.tab_size);
            }
            _ => {}
        }
    }
}

// ========== Tokens ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Number,
    Symbol,
    /// `^`
    Caret,
    /// `*`
    Star,
    /// `·`
    Dot,
    /// `/`
    Slash,
    LParen,
    RParen,
    /// Run of superscript digits, possibly with a leading `⁻`
    Superscript,
    Eof,
}

impl TokenKind {
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Number => "number",
            TokenKind::Symbol => "unit symbol",
            TokenKind::Caret => "'^'",
            TokenKind::Star => "'*'",
            TokenKind::Dot => "'·'",
            TokenKind::Slash => "'/'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::Superscript => "superscript exponent",
            TokenKind::Eof => "end of input",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub begin: Position,
    pub end: Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    /// Human-readable form for error messages
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => self.kind.describe().to_string(),
            _ => format!("'{}'", self.text),
        }
    }
}

/// Value of a superscript exponent such as `⁻¹`.
pub fn superscript_value(text: &str) -> Option<i32> {
    let ascii: String = text
        .chars()
        .map(|c| SUPERSCRIPTS.iter().find(|(sup, _)| *sup == c).map(|(_, plain)| *plain))
        .collect::<Option<String>>()?;
    ascii.parse().ok()
}

fn is_superscript(c: char) -> bool {
    SUPERSCRIPTS.iter().any(|(sup, _)| *sup == c)
}

fn is_symbol_char(c: char) -> bool {
    c.is_alphabetic() || matches!(c, '_' | '[' | ']' | '\'' | '%' | '°')
}

// ========== Lexer ==========

/// The expression lexer
pub struct Lexer<R> {
    stream: CharStream<R>,
}

impl<'a> Lexer<&'a [u8]> {
    /// Lexer over an in-memory string with the default configuration
    pub fn from_text(input: &'a str) -> Self {
        Lexer::new(input.as_bytes(), LexerConfig::default())
    }
}

impl<R: Read> Lexer<R> {
    pub fn new(reader: R, config: LexerConfig) -> Self {
        Lexer { stream: CharStream::new(reader, config) }
    }

    /// Next token; `Eof` once the input is exhausted.
    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        let first = loop {
            self.stream.begin_token();
            match self.stream.read_char()? {
                Some(c) if c.is_whitespace() => continue,
                Some(c) => break c,
                None => {
                    let here = self.stream.next_position();
                    return Ok(Token {
                        kind: TokenKind::Eof,
                        text: String::new(),
                        span: Span { begin: here, end: here },
                    });
                }
            }
        };

        let kind = match first {
            '0'..='9' => {
                self.read_number()?;
                TokenKind::Number
            }
            '+' | '-' if self.accept(|c| c.is_ascii_digit())? => {
                self.read_number()?;
                TokenKind::Number
            }
            '^' => TokenKind::Caret,
            '*' => TokenKind::Star,
            '·' => TokenKind::Dot,
            '/' => TokenKind::Slash,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            c if is_superscript(c) => {
                while self.accept(is_superscript)? {}
                TokenKind::Superscript
            }
            c if is_symbol_char(c) => {
                while self.accept(is_symbol_char)? {}
                TokenKind::Symbol
            }
            c => {
                return Err(ParseError::unexpected(
                    self.stream.begin_position(),
                    format!("'{}'", c),
                    "a number, unit symbol or operator",
                ))
            }
        };

        Ok(Token {
            kind,
            text: self.stream.image(),
            span: Span {
                begin: self.stream.begin_position(),
                end: self.stream.end_position(),
            },
        })
    }

    /// Remaining digits, optional fraction and optional exponent.
    ///
    /// A `.` or exponent marker that is not followed by a digit is given
    /// back to the stream.
    fn read_number(&mut self) -> Result<(), ParseError> {
        self.skip_digits()?;
        if self.accept(|c| c == '.')? {
            if self.accept(|c| c.is_ascii_digit())? {
                self.skip_digits()?;
            } else {
                self.stream.backup(1);
            }
        }
        if self.accept(|c| c == 'e' || c == 'E')? {
            let signed = self.accept(|c| c == '+' || c == '-')?;
            if self.accept(|c| c.is_ascii_digit())? {
                self.skip_digits()?;
            } else {
                self.stream.backup(1 + usize::from(signed));
            }
        }
        Ok(())
    }

    fn skip_digits(&mut self) -> Result<(), ParseError> {
        while self.accept(|c| c.is_ascii_digit())? {}
        Ok(())
    }

    /// Consume the next character if it satisfies `pred`.
    fn accept(&mut self, pred: impl Fn(char) -> bool) -> Result<bool, ParseError> {
        match self.stream.read_char()? {
            Some(c) if pred(c) => Ok(true),
            Some(_) => {
                self.stream.backup(1);
                Ok(false)
            }
            None => Ok(false),
        }
    }
}

impl<R: Read> Iterator for Lexer<R> {
    type Item = Result<Token, ParseError>;

    /// Tokens up to, not including, `Eof`
    fn next(&mut self) -> Option<Self::Item> {
        match self.next_token() {
            Ok(token) if token.kind == TokenKind::Eof => None,
            other => Some(other),
        }
    }
}

/// Tokenize a whole string, `Eof` excluded.
pub fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    Lexer::from_text(input).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn texts(input: &str) -> Vec<String> {
        tokenize(input).unwrap().into_iter().map(|t| t.text).collect()
    }

    fn stream(input: &str, config: LexerConfig) -> CharStream<&[u8]> {
        CharStream::new(input.as_bytes(), config)
    }

    #[test]
    fn test_quantity_tokens() {
        assert_eq!(kinds("10 m"), vec![TokenKind::Number, TokenKind::Symbol]);
        assert_eq!(
            kinds("9.81 kg·m/s^2"),
            vec![
                TokenKind::Number,
                TokenKind::Symbol,
                TokenKind::Dot,
                TokenKind::Symbol,
                TokenKind::Slash,
                TokenKind::Symbol,
                TokenKind::Caret,
                TokenKind::Number,
            ]
        );
        assert_eq!(texts("(m*s)⁻¹"), vec!["(", "m", "*", "s", ")", "⁻¹"]);
    }

    #[test]
    fn test_number_forms() {
        assert_eq!(texts("-2.5e-3 m"), vec!["-2.5e-3", "m"]);
        assert_eq!(texts("+7"), vec!["+7"]);
        assert_eq!(texts("1E6"), vec!["1E6"]);
    }

    #[test]
    fn test_partial_number_is_given_back() {
        assert_eq!(texts("10e"), vec!["10", "e"]);
        assert_eq!(texts("10erg"), vec!["10", "erg"]);
        let err = tokenize("1e-").unwrap_err();
        assert_eq!(err.position(), Some(Position::new(1, 3)));
        let err = tokenize("2.m").unwrap_err();
        assert_eq!(err.position(), Some(Position::new(1, 2)));
    }

    #[test]
    fn test_symbol_characters() {
        assert_eq!(texts("[arb'U] % °C µm"), vec!["[arb'U]", "%", "°C", "µm"]);
        assert_eq!(kinds("m2"), vec![TokenKind::Symbol, TokenKind::Number]);
    }

    #[test]
    fn test_spans() {
        let tokens = tokenize("10  km").unwrap();
        assert_eq!(tokens[0].span.begin, Position::new(1, 1));
        assert_eq!(tokens[0].span.end, Position::new(1, 2));
        assert_eq!(tokens[1].span.begin, Position::new(1, 5));
        assert_eq!(tokens[1].span.end, Position::new(1, 6));
    }

    #[test]
    fn test_eof_position() {
        let mut lexer = Lexer::from_text("m^");
        lexer.next_token().unwrap();
        lexer.next_token().unwrap();
        let eof = lexer.next_token().unwrap();
        assert_eq!(eof.kind, TokenKind::Eof);
        assert_eq!(eof.span.begin, Position::new(1, 3));
        // end of input is sticky
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("10 m # x").unwrap_err();
        assert_eq!(err.position(), Some(Position::new(1, 6)));
        assert!(tokenize("-m").is_err());
    }

    #[test]
    fn test_line_breaks() {
        for input in ["a\nb", "a\rb", "a\r\nb"] {
            let tokens = tokenize(input).unwrap();
            assert_eq!(tokens[1].span.begin, Position::new(2, 1), "input {:?}", input);
        }
        let tokens = tokenize("a\n\nb").unwrap();
        assert_eq!(tokens[1].span.begin, Position::new(3, 1));
    }

    #[test]
    fn test_tab_expansion() {
        let tokens = tokenize("\tm").unwrap();
        assert_eq!(tokens[0].span.begin, Position::new(1, 9));

        let config = LexerConfig { tab_size: 4, ..LexerConfig::default() };
        let mut lexer = Lexer::new("ab\tm".as_bytes(), config);
        lexer.next_token().unwrap();
        assert_eq!(lexer.next_token().unwrap().span.begin, Position::new(1, 5));
    }

    #[test]
    fn test_configured_origin() {
        let config = LexerConfig { start_line: 10, start_column: 0, ..LexerConfig::default() };
        let mut lexer = Lexer::new("km".as_bytes(), config);
        assert_eq!(lexer.next_token().unwrap().span.begin, Position::new(10, 0));
    }

    #[test]
    fn test_backup_and_image() {
        let mut s = stream("abc", LexerConfig::default());
        s.begin_token();
        assert_eq!(s.read_char().unwrap(), Some('a'));
        assert_eq!(s.read_char().unwrap(), Some('b'));
        s.backup(1);
        assert_eq!(s.image(), "a");
        assert_eq!(s.read_char().unwrap(), Some('b'));
        assert_eq!(s.read_char().unwrap(), Some('c'));
        assert_eq!(s.read_char().unwrap(), None);
        assert_eq!(s.image(), "abc");
        assert_eq!(s.suffix(2), "bc");
        assert_eq!(s.suffix(10), "abc");
        s.backup(100);
        assert_eq!(s.read_char().unwrap(), Some('a'));
    }

    #[test]
    fn test_window_grows_for_long_token() {
        let symbol = "x".repeat(10_000);
        let config = LexerConfig { buffer_size: 16, ..LexerConfig::default() };
        let mut lexer = Lexer::new(symbol.as_bytes(), config);
        let token = lexer.next_token().unwrap();
        assert_eq!(token.text.len(), 10_000);
        assert_eq!(token.span.end, Position::new(1, 10_000));
        assert!(lexer.stream.capacity() >= 10_000);
    }

    #[test]
    fn test_window_slides_for_many_tokens() {
        let input = "m ".repeat(5_000);
        let config = LexerConfig { buffer_size: 16, ..LexerConfig::default() };
        let mut lexer = Lexer::new(input.as_bytes(), config);
        let mut count = 0;
        let mut last = Position::new(0, 0);
        while let Some(token) = lexer.next() {
            let token = token.unwrap();
            assert_eq!(token.text, "m");
            last = token.span.begin;
            count += 1;
        }
        assert_eq!(count, 5_000);
        assert_eq!(last, Position::new(1, 9_999));
        assert!(lexer.stream.capacity() < 10_000);
    }

    #[test]
    fn test_invalid_utf8_is_a_read_error() {
        let bytes: &[u8] = &[b'1', b' ', 0xFF, b'm'];
        let mut lexer = Lexer::new(bytes, LexerConfig::default());
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Number);
        assert!(matches!(lexer.next_token(), Err(ParseError::Read(_))));
    }

    #[test]
    fn test_multibyte_split_across_reads() {
        struct OneByte<'a>(&'a [u8]);
        impl Read for OneByte<'_> {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                match self.0.split_first() {
                    Some((first, rest)) if !buf.is_empty() => {
                        buf[0] = *first;
                        self.0 = rest;
                        Ok(1)
                    }
                    _ => Ok(0),
                }
            }
        }
        let mut lexer = Lexer::new(OneByte("m²".as_bytes()), LexerConfig::default());
        assert_eq!(lexer.next_token().unwrap().text, "m");
        let sup = lexer.next_token().unwrap();
        assert_eq!(sup.kind, TokenKind::Superscript);
        assert_eq!(superscript_value(&sup.text), Some(2));
    }

    #[test]
    fn test_superscript_value() {
        assert_eq!(superscript_value("⁻¹"), Some(-1));
        assert_eq!(superscript_value("¹⁰"), Some(10));
        assert_eq!(superscript_value("⁻"), None);
        assert_eq!(superscript_value("x"), None);
    }
}
