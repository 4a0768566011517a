//! Runtime configuration: `hwledger.toml` parsing plus environment overrides.
//!
//! # Loading order
//! 1. CLI flags (`--db`), applied by the caller last
//! 2. Environment variables (`HWLEDGER_{SECTION}_{FIELD}`, plus legacy `INVENTORY_DB`)
//! 3. Configuration file (`--config`, or `hwledger.toml` in the working directory)
//! 4. Defaults (`Default` impls)
//!
//! ```no_run
//! use hwledger::core::config::InventoryConfig;
//!
//! let config = InventoryConfig::parse("[database]\npath = \"/srv/inventory.db\"")?;
//! assert_eq!(config.database.path, "/srv/inventory.db");
//! # Ok::<(), hwledger::core::error::InventoryError>(())
//! ```

use crate::core::error::InventoryError;
use crate::core::schemas;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "hwledger.toml";

/// Top-level configuration; each subsystem reads only its own section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub vendor: VendorConfig,
    /// Environment overrides that could not be parsed. Logging is not up yet
    /// while the config loads, so the caller reports these after `init_tracing`.
    #[serde(skip)]
    pub ignored_env: Vec<IgnoredEnvVar>,
}

/// An override variable whose value did not parse as the field's type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoredEnvVar {
    pub key: &'static str,
    pub value: String,
    pub expected: &'static str,
}

impl InventoryConfig {
    /// Load from `path` (or the default file if it exists), then apply env overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self, InventoryError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::from_file(fallback)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, InventoryError> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                InventoryError::ConfigError(format!("config file not found: {}", path.display()))
            } else {
                InventoryError::IoError(e)
            }
        })?;
        Self::parse(&content)
    }

    pub fn parse(toml_str: &str) -> Result<Self, InventoryError> {
        toml::from_str(toml_str).map_err(|e| InventoryError::ConfigError(e.to_string()))
    }

    /// Override values from the environment.
    ///
    /// Naming: `HWLEDGER_{SECTION}_{FIELD}`, e.g. `HWLEDGER_DATABASE_PATH=/srv/inv.db`.
    /// `INVENTORY_DB` is honoured for installations scripted against older releases;
    /// the namespaced variable wins when both are set.
    /// Unparseable values leave the field unchanged and are recorded in `ignored_env`.
    pub fn apply_env_overrides(&mut self) {
        override_string(&mut self.database.path, "INVENTORY_DB");
        override_string(&mut self.database.path, "HWLEDGER_DATABASE_PATH");
        override_parsed(
            &mut self.database.busy_timeout_secs,
            "HWLEDGER_DATABASE_BUSY_TIMEOUT_SECS",
            "u64",
            &mut self.ignored_env,
        );

        override_string(&mut self.logging.level, "HWLEDGER_LOGGING_LEVEL");
        override_string(&mut self.logging.format, "HWLEDGER_LOGGING_FORMAT");

        override_parsed(
            &mut self.vendor.enrich,
            "HWLEDGER_VENDOR_ENRICH",
            "bool",
            &mut self.ignored_env,
        );
    }

    pub fn validate(&self) -> Result<(), InventoryError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(InventoryError::ConfigError(format!(
                "logging.level must be one of: {}",
                valid_levels.join(", ")
            )));
        }

        let valid_formats = ["pretty", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(InventoryError::ConfigError(format!(
                "logging.format must be one of: {}",
                valid_formats.join(", ")
            )));
        }

        if self.database.path.trim().is_empty() {
            return Err(InventoryError::ConfigError(
                "database.path must not be empty".to_string(),
            ));
        }

        if self.database.busy_timeout_secs == 0 {
            return Err(InventoryError::ConfigError(
                "database.busy_timeout_secs must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file path
    pub path: String,
    /// How long a writer waits on another writer's lock before failing (seconds)
    pub busy_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.busy_timeout_secs)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: Path::new("data")
                .join(schemas::INVENTORY_DB_NAME)
                .to_string_lossy()
                .to_string(),
            busy_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn, error (`RUST_LOG` takes precedence when set)
    pub level: String,
    /// pretty, json
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "pretty".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VendorConfig {
    /// Fill in blank manufacturers from model strings and the PCI vendor table
    pub enrich: bool,
    /// Candidate pci.ids locations; the first readable one is loaded
    pub pci_ids_paths: Vec<PathBuf>,
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self {
            enrich: true,
            pci_ids_paths: vec![
                PathBuf::from("/usr/share/hwdata/pci.ids"),
                PathBuf::from("/usr/share/misc/pci.ids"),
                PathBuf::from("/usr/local/share/pci.ids"),
                PathBuf::from("/var/lib/usbutils/pci.ids"),
            ],
        }
    }
}

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_parsed<T: std::str::FromStr>(
    target: &mut T,
    env_key: &'static str,
    expected: &'static str,
    ignored: &mut Vec<IgnoredEnvVar>,
) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(_) => ignored.push(IgnoredEnvVar {
                key: env_key,
                value: val,
                expected,
            }),
        }
    }
}
