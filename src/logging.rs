//! Structured logging setup.
//!
//! Uses `tracing` with `tracing-subscriber`. `COVERBOT_LOG` (or `RUST_LOG`)
//! sets the filter, `COVERBOT_LOG_FORMAT` picks `pretty`, `compact` or
//! `json` output.

use tracing_subscriber::EnvFilter;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl LogFormat {
    fn from_env() -> Self {
        match std::env::var("COVERBOT_LOG_FORMAT").as_deref() {
            Ok("json") => Self::Json,
            Ok("compact") => Self::Compact,
            _ => Self::Pretty,
        }
    }
}

fn filter() -> EnvFilter {
    let directives = std::env::var("COVERBOT_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "coverbot=info,warn".to_string());
    EnvFilter::new(directives)
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are no-ops.
pub fn init() {
    let builder = tracing_subscriber::fmt().with_env_filter(filter());
    match LogFormat::from_env() {
        LogFormat::Pretty => {
            let _ = builder.pretty().try_init();
        }
        LogFormat::Compact => {
            let _ = builder.compact().try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}
