//! Tracing subscriber setup
//!
//! `RUST_LOG` takes precedence over the configured level, so fine-grained
//! filtering stays available without touching the config file:
//!
//! ```bash
//! RUST_LOG=newfocus8743=debug nf8743 --host 192.168.1.101 identify
//! ```

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

/// Build the filter: `RUST_LOG` if set, otherwise the configured level.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Install the global subscriber.
///
/// Returns `false` if a subscriber was already installed (e.g. by a test
/// harness or the embedding application); the existing one is kept.
pub fn init_from_config(config: &LoggingConfig) -> bool {
    let filter = env_filter(config);
    let result = if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .try_init()
    };
    result.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_noop() {
        let config = LoggingConfig::default();
        let _ = init_from_config(&config);
        assert!(!init_from_config(&config));
    }
}
