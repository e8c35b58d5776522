//! Logging initialization for the shell.
//!
//! The library only emits `tracing` events; installing a subscriber is the
//! binary's job.

use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install a stderr subscriber.
///
/// `verbosity`: 0 = WARN, 1 = INFO, 2 = DEBUG, 3+ = TRACE.  `RUST_LOG` is
/// honoured and the verbosity flag is layered on top of it for the
/// `condor` targets.  `parser` raises the `condor::parser` target to at
/// least that level, so `--trace` and `--print-variables` are visible
/// without `-v`.
pub fn init(verbosity: u8, parser: Option<Level>) -> anyhow::Result<()> {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let parser_level = raise(level, parser);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"))
        .add_directive(format!("condor={level}").parse()?)
        .add_directive(format!("condor::parser={parser_level}").parse()?);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()?;
    Ok(())
}

/// Level the parser's own output needs: rule tracing is emitted at DEBUG,
/// variable printing at INFO.
pub fn parser_level(trace: bool, print_variables: bool) -> Option<Level> {
    if trace {
        Some(Level::DEBUG)
    } else if print_variables {
        Some(Level::INFO)
    } else {
        None
    }
}

/// `level`, raised to `parser` when that is more verbose.
fn raise(level: Level, parser: Option<Level>) -> Level {
    parser.map_or(level, |p| p.max(level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_level_follows_flags() {
        assert_eq!(parser_level(false, false), None);
        assert_eq!(parser_level(false, true), Some(Level::INFO));
        assert_eq!(parser_level(true, true), Some(Level::DEBUG));
    }

    #[test]
    fn test_parser_level_never_lowers_verbosity() {
        assert_eq!(raise(Level::TRACE, Some(Level::DEBUG)), Level::TRACE);
        assert_eq!(raise(Level::WARN, Some(Level::DEBUG)), Level::DEBUG);
        assert_eq!(raise(Level::INFO, None), Level::INFO);
    }
}
