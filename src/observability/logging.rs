//! Structured logging setup.
//!
//! # Responsibilities
//! - Install the global `tracing` subscriber
//! - Choose JSON or console output
//! - Honour `RUST_LOG` over the configured level
//!
//! # Design Decisions
//! - Installation is idempotent: the first subscriber wins, later calls are no-ops
//! - Facade records go to the `boxkit::record` target so they can be filtered apart

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output encoding of log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Console,
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            LogFormat::Json => "json",
            LogFormat::Console => "console",
        }
    }
}

/// Default filter directive for a given level.
pub fn default_directive(level: &str) -> String {
    format!("boxkit={level},tower_http={level}")
}

/// Install the global subscriber. Returns `false` if one was already set.
pub fn init(level: &str, format: LogFormat) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().flatten_event(true))
            .try_init()
            .is_ok(),
        LogFormat::Console => registry.with(fmt::layer()).try_init().is_ok(),
    };
    if installed {
        tracing::debug!(format = format.as_str(), level = %level, "Logging initialized");
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive("debug"), "boxkit=debug,tower_http=debug");
    }

    #[test]
    fn test_format_serde() {
        let format: LogFormat = serde_json::from_str("\"console\"").unwrap();
        assert_eq!(format, LogFormat::Console);
        assert_eq!(LogFormat::default().as_str(), "json");
    }
}
