//! Centralized database schema definitions for the inventory ledger.
//!
//! A single SQLite database holds three tables:
//! 1. systems: one row per scanned host, keyed by hostname.
//! 2. components: every hardware part ever observed or hand-entered.
//! 3. system_components: the current installation links, rebuilt on every scan.

pub const INVENTORY_DB_NAME: &str = "hardware_inventory.db";

pub const INVENTORY_SCHEMA_VERSION: u32 = 2;

pub const INVENTORY_DB_SCHEMA_META: &str = "
    CREATE TABLE IF NOT EXISTS meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )
";

pub const INVENTORY_DB_SCHEMA_SYSTEMS: &str = "
    CREATE TABLE IF NOT EXISTS systems (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        hostname TEXT NOT NULL UNIQUE,
        manufacturer TEXT NOT NULL DEFAULT '',
        model TEXT NOT NULL DEFAULT '',
        serial_number TEXT NOT NULL DEFAULT '',
        uuid TEXT NOT NULL DEFAULT '',
        last_scan TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
";

pub const INVENTORY_DB_SCHEMA_COMPONENTS: &str = "
    CREATE TABLE IF NOT EXISTS components (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        component_type TEXT NOT NULL,
        manufacturer TEXT NOT NULL DEFAULT '',
        model TEXT NOT NULL DEFAULT '',
        serial_number TEXT,
        specifications TEXT, -- opaque JSON blob, never queried
        status TEXT NOT NULL DEFAULT 'installed',
        location TEXT,
        notes TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
";

pub const INVENTORY_DB_SCHEMA_SYSTEM_COMPONENTS: &str = "
    CREATE TABLE IF NOT EXISTS system_components (
        system_id INTEGER NOT NULL,
        component_id INTEGER NOT NULL,
        FOREIGN KEY(system_id) REFERENCES systems(id),
        FOREIGN KEY(component_id) REFERENCES components(id)
    )
";

pub const INVENTORY_DB_SCHEMA_INDEX_SERIAL: &str = "CREATE INDEX IF NOT EXISTS idx_components_serial ON components(serial_number, component_type)";
pub const INVENTORY_DB_SCHEMA_INDEX_MODEL_LOCATION: &str = "CREATE INDEX IF NOT EXISTS idx_components_model_location ON components(component_type, model, location)";
pub const INVENTORY_DB_SCHEMA_INDEX_LINK_SYSTEM: &str =
    "CREATE INDEX IF NOT EXISTS idx_system_components_system ON system_components(system_id)";
pub const INVENTORY_DB_SCHEMA_INDEX_LINK_COMPONENT: &str =
    "CREATE INDEX IF NOT EXISTS idx_system_components_component ON system_components(component_id)";
