use crate::core::error;
use crate::core::schemas;
use rusqlite::{Connection, OptionalExtension, params};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

pub fn db_connect(db_path: &Path, busy_timeout: Duration) -> Result<Connection, error::InventoryError> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(busy_timeout)
        .map_err(error::InventoryError::RusqliteError)?;
    conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))
        .map_err(error::InventoryError::RusqliteError)?;
    conn.execute("PRAGMA foreign_keys=ON;", [])
        .map_err(error::InventoryError::RusqliteError)?;
    Ok(conn)
}

/// Create the database file (and its parent directory) and bring the schema up to date.
pub fn initialize_inventory_db(db_path: &Path, busy_timeout: Duration) -> Result<(), error::InventoryError> {
    if let Some(parent_dir) = db_path.parent()
        && !parent_dir.as_os_str().is_empty()
    {
        fs::create_dir_all(parent_dir).map_err(error::InventoryError::IoError)?;
    }

    let conn = db_connect(db_path, busy_timeout)?;
    ensure_schema(&conn)?;
    debug!(db = %db_path.display(), "inventory database ready");
    Ok(())
}

pub fn schema_version(conn: &Connection) -> Result<u32, error::InventoryError> {
    let current: Option<String> = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(error::InventoryError::RusqliteError)?;

    Ok(current
        .as_deref()
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(0))
}

fn ensure_schema(conn: &Connection) -> Result<(), error::InventoryError> {
    conn.execute(schemas::INVENTORY_DB_SCHEMA_META, [])?;

    let current_version = schema_version(conn)?;
    if current_version >= schemas::INVENTORY_SCHEMA_VERSION {
        return Ok(());
    }

    conn.execute(schemas::INVENTORY_DB_SCHEMA_SYSTEMS, [])?;
    conn.execute(schemas::INVENTORY_DB_SCHEMA_COMPONENTS, [])?;
    conn.execute(schemas::INVENTORY_DB_SCHEMA_SYSTEM_COMPONENTS, [])?;

    if current_version < 2 {
        conn.execute(schemas::INVENTORY_DB_SCHEMA_INDEX_SERIAL, [])?;
        conn.execute(schemas::INVENTORY_DB_SCHEMA_INDEX_MODEL_LOCATION, [])?;
        conn.execute(schemas::INVENTORY_DB_SCHEMA_INDEX_LINK_SYSTEM, [])?;
        conn.execute(schemas::INVENTORY_DB_SCHEMA_INDEX_LINK_COMPONENT, [])?;
    }

    conn.execute(
        "INSERT INTO meta(key, value) VALUES('schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![schemas::INVENTORY_SCHEMA_VERSION.to_string()],
    )?;
    info!(
        from = current_version,
        to = schemas::INVENTORY_SCHEMA_VERSION,
        "inventory schema migrated"
    );
    Ok(())
}
