use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use env_logger::Env;
use log::info;

mod args;
mod demo;
mod draw;
mod repl;

use repl::{Repl, HELP};

/// Compiles infix expressions to postfix programs and evaluates them.
#[derive(Parser)]
#[command(
    name = "polishd",
    version,
    after_help = "\
Environment Variables:
  POLISHD_DEBUG=true         Enable debug logging
  POLISHD_LOG_LEVEL=info     Set log level (error, warn, info, debug, trace)
  POLISHD_NO_BANNER=true     Do not print the help text when the REPL starts"
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, env = "POLISHD_DEBUG")]
    debug: bool,

    /// Set log level (defaults to `RUST_LOG`, or warn)
    #[arg(long, value_enum, env = "POLISHD_LOG_LEVEL")]
    log_level: Option<LogLevel>,

    /// Do not print the help text when the REPL starts
    #[arg(long, env = "POLISHD_NO_BANNER")]
    no_banner: bool,

    /// Expressions to evaluate instead of starting the REPL, each optionally
    /// followed by `name=value` arguments, e.g. "x * 2 x=21"
    expressions: Vec<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// An explicit `--debug` or `--log-level` overrides `RUST_LOG`.
fn log_level(debug: bool, level: Option<LogLevel>) -> Option<log::LevelFilter> {
    if debug {
        Some(log::LevelFilter::Debug)
    } else {
        level.map(Into::into)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_env(Env::default().default_filter_or("warn"));
    if let Some(log_level) = log_level(cli.debug, cli.log_level) {
        logger.filter_level(log_level);
    }
    logger.init();

    let grammar = demo::grammar();
    info!(
        "grammar ready: {} constants, {} prefix, {} binary, {} postfix operators",
        grammar.constants().len(),
        grammar.prefix().len(),
        grammar.binary().len(),
        grammar.postfix().len()
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if !cli.expressions.is_empty() {
        for tail in &cli.expressions {
            let (expr, args) = args::split(tail)?;
            let value = grammar
                .compile(expr)
                .and_then(|function| function.evaluate(&args))
                .with_context(|| format!("cannot evaluate `{expr}`"))?;
            writeln!(out, "{expr}\n= {value}")?;
        }
        return Ok(());
    }

    if !cli.no_banner {
        writeln!(out, "{HELP}")?;
    }
    Repl::new(&grammar).run(io::stdin().lock(), &mut out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_only_when_asked() {
        assert_eq!(log_level(false, None), None);
        assert_eq!(log_level(false, Some(LogLevel::Trace)), Some(log::LevelFilter::Trace));
        assert_eq!(log_level(true, Some(LogLevel::Error)), Some(log::LevelFilter::Debug));
    }

    #[test]
    fn log_level_is_optional_on_the_command_line() {
        let cli = Cli::try_parse_from(["polishd", "1 + 1"]).unwrap();
        assert!(cli.log_level.is_none() || std::env::var_os("POLISHD_LOG_LEVEL").is_some());
        let cli = Cli::try_parse_from(["polishd", "--log-level", "info"]).unwrap();
        assert!(matches!(cli.log_level, Some(LogLevel::Info)));
    }
}
