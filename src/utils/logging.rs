//! Logging configuration for the signal receiver.
//!
//! Library code logs through the `log` facade. The subscriber installed here
//! forwards those records into `tracing`, so both end up on stdout.

use log::info;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a filter directive (e.g. `signal_receiver=debug,info`).
pub const LOG_ENV: &str = "SIGNAL_RECEIVER_LOG";

/// Build the filter: `SIGNAL_RECEIVER_LOG` if set and valid, otherwise `level`.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the logging system
pub fn init_logging(level: &str) {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_target(true)
        .try_init()
        .is_ok();

    if installed {
        info!("Logging initialized at level: {}", level);
    }
}

/// Initialize test logging (for use in tests)
#[cfg(test)]
pub fn init_test_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::debug;

    #[test]
    fn test_env_filter_falls_back_to_level() {
        temp_env::with_var(LOG_ENV, None::<&str>, || {
            let filter = env_filter("warn");
            assert_eq!(filter.to_string(), "warn");
        });
    }

    #[test]
    fn test_env_filter_prefers_environment() {
        temp_env::with_var(LOG_ENV, Some("signal_receiver=debug"), || {
            let filter = env_filter("warn");
            assert_eq!(filter.to_string(), "signal_receiver=debug");
        });
    }

    #[test]
    fn test_test_logging() {
        init_test_logging();
        debug!("This debug message should only appear in test output with --nocapture");
    }
}
