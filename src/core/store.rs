//! Store handle for the inventory ledger.
//!
//! A `Store` is constructed once at startup from [`DatabaseConfig`] and passed
//! explicitly to every ingest, reconcile and query operation. There is no
//! process-wide connection or default path lookup below this point.

use crate::core::broker::DbBroker;
use crate::core::config::DatabaseConfig;
use crate::core::db;
use crate::core::error::InventoryError;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Store handle representing one inventory database.
#[derive(Debug, Clone)]
pub struct Store {
    /// Absolute or working-directory-relative path to the SQLite file
    pub db_path: PathBuf,
    broker: DbBroker,
}

impl Store {
    /// Open (creating if needed) the database described by `config`.
    pub fn open(config: &DatabaseConfig) -> Result<Self, InventoryError> {
        Self::open_path(Path::new(&config.path), config.busy_timeout())
    }

    pub fn open_path(db_path: &Path, busy_timeout: Duration) -> Result<Self, InventoryError> {
        db::initialize_inventory_db(db_path, busy_timeout)?;
        Ok(Self {
            db_path: db_path.to_path_buf(),
            broker: DbBroker::new(db_path, busy_timeout),
        })
    }

    pub fn broker(&self) -> &DbBroker {
        &self.broker
    }
}
