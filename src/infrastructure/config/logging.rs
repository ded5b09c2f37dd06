//! Logging configuration and initialization.

use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl LoggingConfig {
    /// Raise the level by `verbosity` steps above the configured one.
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        if verbosity > 0 {
            self.level = match verbosity {
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
            .to_string();
        }
        self
    }

    /// Initialize the tracing subscriber with this logging configuration.
    ///
    /// Logs go to stderr so command output on stdout stays parseable.
    /// `RUST_LOG` overrides the configured level. A second call is a no-op.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        let _ = match self.format.as_str() {
            "json" => fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init(),
            _ => fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init(),
        };
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: "pretty".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_level() {
        let config = LoggingConfig::default();
        assert_eq!(config.clone().with_verbosity(0).level, "warn");
        assert_eq!(config.clone().with_verbosity(1).level, "info");
        assert_eq!(config.with_verbosity(5).level, "trace");
    }

    #[test]
    fn init_twice_does_not_panic() {
        let config = LoggingConfig::default();
        config.init();
        config.init();
    }
}
