//! Logging initialization for the hwledger binary.
//!
//! Configures `tracing-subscriber` from the `[logging]` section of
//! `InventoryConfig`. Output goes to stderr so command results on stdout
//! stay machine-readable.

use crate::core::config::LoggingConfig;
use crate::core::error::InventoryError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize the global tracing subscriber.
///
/// Must be called at most once per process; a second call reports an error
/// instead of replacing the active subscriber.
///
/// * `"pretty"` - human-readable output (default)
/// * `"json"` - one JSON object per line
pub fn init_tracing(config: &LoggingConfig) -> Result<(), InventoryError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let init = match config.format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        "pretty" => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        other => {
            return Err(InventoryError::ConfigError(format!(
                "unknown log format '{}', expected 'json' or 'pretty'",
                other
            )));
        }
    };

    init.map_err(|e| {
        InventoryError::ConfigError(format!("failed to initialize tracing subscriber: {}", e))
    })
}
