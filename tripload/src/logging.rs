//! Support for structured logging.

use std::{io::stderr, str::FromStr};

use anyhow::{format_err, Error, Result};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

/// The filter we use when `RUST_LOG` isn't set.
const DEFAULT_FILTER: &str = "warn";

/// What log format we should use.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum LogFormat {
    /// Pretty, indented logs.
    Indented,
    /// Single-line log entries with all fields on each line.
    Flat,
    /// JSON records.
    Json,
}

impl LogFormat {
    /// Install a global `tracing` subscriber which writes to standard error in
    /// this format. Log levels are controlled by `RUST_LOG`.
    pub(crate) fn install(self) -> Result<()> {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let builder = tracing_subscriber::fmt()
            .with_writer(stderr)
            .with_span_events(FmtSpan::CLOSE)
            .with_env_filter(filter);
        let result = match self {
            LogFormat::Indented => builder.pretty().try_init(),
            LogFormat::Flat => builder.compact().try_init(),
            LogFormat::Json => builder.json().try_init(),
        };
        result.map_err(|err| format_err!("could not install logger: {}", err))
    }
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "indented" => Ok(LogFormat::Indented),
            "flat" => Ok(LogFormat::Flat),
            "json" => Ok(LogFormat::Json),
            _ => Err(format_err!("unknown log format: {}", s)),
        }
    }
}

#[test]
fn log_formats_are_parsed() {
    assert_eq!("flat".parse::<LogFormat>().unwrap(), LogFormat::Flat);
    assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
    assert!("yaml".parse::<LogFormat>().is_err());
}
