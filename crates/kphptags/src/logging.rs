//! Structured logging with environment variable configuration.
//!
//! Logs are written to stderr so they never mix with the diagnostics or JSON written to stdout or to the output file.
use std::env;

use tracing_subscriber::EnvFilter;

/// The environment variable holding the log filter, with the same syntax as `RUST_LOG`
pub const LOG_ENV_VAR: &str = "KPHPTAGS_LOG";

/// The filter used when no level is configured
pub const DEFAULT_LOG_LEVEL: &str = "warn";

fn filter_from(level: Option<&str>) -> EnvFilter {
    let directives = level
        .map(ToOwned::to_owned)
        .or_else(|| env::var(LOG_ENV_VAR).ok())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
    EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

/// Initialise the logging subsystem.
///
/// Log level precedence (highest to lowest):
///
/// 1. CLI `--log-level`
/// 2. `KPHPTAGS_LOG`
/// 3. `warn`
///
/// If a global subscriber is already set, this function does nothing.
pub fn init_logging(level: Option<&str>) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter_from(level))
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    // the first subscriber wins
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging(Some("info"));
        init_logging(None);
    }

    #[test]
    fn test_filter_from_level() {
        assert_eq!(filter_from(Some("debug")).to_string(), "debug");
        assert_eq!(
            filter_from(Some("kphptags_core=trace")).to_string(),
            "kphptags_core=trace"
        );
    }
}
