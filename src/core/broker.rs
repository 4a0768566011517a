//! Transaction broker: the single path through which inventory state is read and written.
//!
//! Every operation opens a fresh connection and runs inside exactly one SQLite
//! transaction:
//! - **Writes** start with `BEGIN IMMEDIATE`, taking the database write lock up
//!   front. Concurrent writers queue on SQLite's lock (bounded by `busy_timeout`)
//!   instead of an in-process mutex, so separate processes serialize too.
//! - **Reads** run in a deferred transaction. Under WAL they see one consistent
//!   snapshot and never observe a writer's uncommitted state.
//!
//! Connections are not pooled; the ledger is a low-traffic local file and a fresh
//! handle per operation keeps WAL/SHM handles from outliving the request.

use crate::core::db;
use crate::core::error::InventoryError;
use rusqlite::{Connection, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct DbBroker {
    db_path: PathBuf,
    busy_timeout: Duration,
}

impl DbBroker {
    pub fn new(db_path: &Path, busy_timeout: Duration) -> Self {
        Self {
            db_path: db_path.to_path_buf(),
            busy_timeout,
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Execute a closure inside an immediate write transaction.
    ///
    /// Commits when the closure returns `Ok`; any `Err` drops the transaction,
    /// which rolls back every statement the closure issued.
    pub fn with_write<F, R>(&self, op_name: &str, f: F) -> Result<R, InventoryError>
    where
        F: FnOnce(&Connection) -> Result<R, InventoryError>,
    {
        let mut conn = db::db_connect(&self.db_path, self.busy_timeout)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                debug!(op = op_name, "write committed");
                Ok(value)
            }
            Err(err) => {
                // Dropping the transaction rolls it back.
                drop(tx);
                warn!(op = op_name, error = %err, "write rolled back");
                Err(err)
            }
        }
    }

    /// Execute a closure inside a deferred, read-only transaction.
    pub fn with_read<F, R>(&self, op_name: &str, f: F) -> Result<R, InventoryError>
    where
        F: FnOnce(&Connection) -> Result<R, InventoryError>,
    {
        let mut conn = db::db_connect(&self.db_path, self.busy_timeout)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
        let result = f(&tx);
        tx.finish()?;
        debug!(op = op_name, ok = result.is_ok(), "read finished");
        result
    }
}
