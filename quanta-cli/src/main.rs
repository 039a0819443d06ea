//! Quanta command line
//!
//! Evaluates one expression per line, taken from the arguments or, when
//! there are none, from stdin:
//! - `9.81 m/s^2` - a quantity
//! - `36 km/h -> m/s` - a conversion (also `→`, ` to `, ` in `); the word
//!   forms only apply when the right side is a unit, so `1 in + 2 in` adds
//! - `1 d + 12 h` - arithmetic with ` + `, ` - `, ` * ` or ` / `
//!
//! Environment:
//! - `QUANTA_OUTPUT`: `text` (default) or `json`
//! - `QUANTA_TAB_SIZE`: tab width for error columns (default 8)
//! - `RUST_LOG`: log filter (default `warn`), logs go to stderr

use quanta_units::{
    default_system, parse_quantity_conversion, ExpressionParser, LexerConfig, Quantity, UnitError,
};
use serde::Serialize;
use std::env;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Binary operators, each written with a space on both sides
const OPERATORS: [&str; 4] = [" + ", " - ", " * ", " / "];

#[derive(Debug, Error)]
enum CliError {
    #[error("invalid {name}: {value:?} ({reason})")]
    Config {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error(transparent)]
    Unit(#[from] UnitError),

    #[error("output error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Config {
    output: OutputFormat,
    tab_size: usize,
}

impl Config {
    fn from_env() -> Result<Self, CliError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CliError> {
        let output = match lookup("QUANTA_OUTPUT").as_deref() {
            None | Some("text") => OutputFormat::Text,
            Some("json") => OutputFormat::Json,
            Some(other) => {
                return Err(CliError::Config {
                    name: "QUANTA_OUTPUT",
                    value: other.to_string(),
                    reason: "expected text or json",
                })
            }
        };
        let tab_size = match lookup("QUANTA_TAB_SIZE") {
            None => LexerConfig::default().tab_size,
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(CliError::Config {
                        name: "QUANTA_TAB_SIZE",
                        value: raw,
                        reason: "expected a positive integer",
                    })
                }
            },
        };
        Ok(Config { output, tab_size })
    }

    fn lexer(&self) -> LexerConfig {
        LexerConfig { tab_size: self.tab_size, ..LexerConfig::default() }
    }
}

/// One evaluated line, as printed in JSON mode
#[derive(Debug, Serialize)]
struct Evaluation<'a> {
    input: &'a str,
    result: String,
    value: &'a quanta_core::Number,
    unit: &'a str,
    dimension: String,
    exact: bool,
}

impl<'a> Evaluation<'a> {
    fn new(input: &'a str, quantity: &'a Quantity) -> Self {
        Evaluation {
            input,
            result: quantity.to_string(),
            value: quantity.value(),
            unit: &quantity.unit().symbol,
            dimension: quantity.dimension().to_string(),
            exact: quantity.is_exact(),
        }
    }
}

/// Evaluate a single line.
///
/// Conversions cross unit systems, so `1 dyn -> N` succeeds.
fn evaluate(parser: &ExpressionParser<'_>, line: &str) -> Result<Quantity, UnitError> {
    if let Some((quantity, unit)) = parse_quantity_conversion(parser, line)? {
        return quantity.to_any(&unit);
    }

    for op in OPERATORS {
        if let Some((lhs, rhs)) = line.split_once(op) {
            let lhs = parser.parse_quantity(lhs)?;
            let rhs = parser.parse_quantity(rhs)?;
            return match op.trim() {
                "+" => lhs.add(&rhs),
                "-" => lhs.subtract(&rhs),
                "*" => Ok(lhs.multiply(&rhs)?.erase()),
                _ => Ok(lhs.divide(&rhs)?.erase()),
            };
        }
    }

    parser.parse_quantity(line)
}

struct Session<'p, W> {
    parser: ExpressionParser<'p>,
    output: OutputFormat,
    out: W,
    failures: usize,
}

impl<'p, W: Write> Session<'p, W> {
    fn run_line(&mut self, line: &str) -> Result<(), CliError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }
        debug!(input = line, "evaluating");
        match evaluate(&self.parser, line) {
            Ok(quantity) => self.print(line, &quantity),
            Err(e) => {
                self.failures += 1;
                eprintln!("{}: {}", line, e);
                Ok(())
            }
        }
    }

    fn print(&mut self, line: &str, quantity: &Quantity) -> Result<(), CliError> {
        match self.output {
            OutputFormat::Text => writeln!(self.out, "{}", quantity)?,
            OutputFormat::Json => {
                let json = serde_json::to_string(&Evaluation::new(line, quantity))?;
                writeln!(self.out, "{}", json)?;
            }
        }
        Ok(())
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();
}

fn run(config: Config, args: &[String]) -> Result<usize, CliError> {
    let system = default_system();
    let mut session = Session {
        parser: ExpressionParser::new(&*system).with_config(config.lexer()),
        output: config.output,
        out: io::stdout().lock(),
        failures: 0,
    };

    if args.is_empty() {
        for line in io::stdin().lock().lines() {
            session.run_line(&line?)?;
        }
    } else {
        for arg in args {
            session.run_line(arg)?;
        }
    }
    session.out.flush()?;
    Ok(session.failures)
}

fn main() -> ExitCode {
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let outcome = Config::from_env().and_then(|config| run(config, &args));
    match outcome {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failures) => {
            debug!(failures, "some lines failed");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("quanta: {}", e);
            ExitCode::FAILURE
        }
    }
}
