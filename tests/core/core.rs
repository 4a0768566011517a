use hwledger::core::broker::DbBroker;
use hwledger::core::config::InventoryConfig;
use hwledger::core::db;
use hwledger::core::error::InventoryError;
use hwledger::core::schemas;
use hwledger::core::store::Store;
use rusqlite::params;
use std::fs;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

const TIMEOUT: Duration = Duration::from_secs(5);

fn insert_system(conn: &rusqlite::Connection, hostname: &str) -> Result<(), InventoryError> {
    conn.execute(
        "INSERT INTO systems(hostname, created_at, updated_at) VALUES(?1, '0Z', '0Z')",
        params![hostname],
    )?;
    Ok(())
}

fn count_systems(broker: &DbBroker) -> i64 {
    broker
        .with_read("test.count", |conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM systems", [], |row| row.get(0))?)
        })
        .unwrap()
}

#[test]
fn store_open_creates_parent_dirs_and_schema() {
    let tmp = tempdir().expect("tempdir");
    let db_path = tmp.path().join("nested").join("data").join(schemas::INVENTORY_DB_NAME);

    let store = Store::open_path(&db_path, TIMEOUT).expect("open store");
    assert!(db_path.is_file());
    assert_eq!(store.db_path, db_path);

    let conn = db::db_connect(&db_path, TIMEOUT).expect("connect");
    assert_eq!(
        db::schema_version(&conn).expect("version"),
        schemas::INVENTORY_SCHEMA_VERSION
    );

    let tables: Vec<String> = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(tables, vec!["components", "meta", "system_components", "systems"]);

    let index_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name LIKE 'idx_%'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(index_count, 4);

    // Reopening an initialized database is a no-op.
    Store::open_path(&db_path, TIMEOUT).expect("reopen store");
}

#[test]
fn db_connect_enables_wal_and_foreign_keys() {
    let tmp = tempdir().expect("tempdir");
    let db_path = tmp.path().join("pragmas.db");
    Store::open_path(&db_path, TIMEOUT).expect("open store");

    let conn = db::db_connect(&db_path, TIMEOUT).expect("connect");
    let mode: String = conn
        .query_row("PRAGMA journal_mode", [], |row| row.get(0))
        .unwrap();
    assert_eq!(mode.to_lowercase(), "wal");
    let fk: i64 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0)).unwrap();
    assert_eq!(fk, 1);

    let err = conn
        .execute(
            "INSERT INTO system_components(system_id, component_id) VALUES(41, 42)",
            [],
        )
        .unwrap_err();
    assert!(err.to_string().to_lowercase().contains("foreign key"));
}

#[test]
fn broker_commits_on_ok_and_rolls_back_on_err() {
    let tmp = tempdir().expect("tempdir");
    let store = Store::open_path(&tmp.path().join("broker.db"), TIMEOUT).expect("open store");
    let broker = store.broker();

    broker
        .with_write("test.commit", |conn| insert_system(conn, "kept"))
        .expect("commit");
    assert_eq!(count_systems(broker), 1);

    let err = broker
        .with_write("test.rollback", |conn| {
            insert_system(conn, "discarded")?;
            Err::<(), _>(InventoryError::ValidationError("abort".to_string()))
        })
        .unwrap_err();
    assert!(matches!(err, InventoryError::ValidationError(_)));
    assert_eq!(count_systems(broker), 1);

    // A SQL failure mid-transaction undoes earlier statements too.
    let err = broker
        .with_write("test.sql_failure", |conn| {
            insert_system(conn, "half")?;
            insert_system(conn, "kept")
        })
        .unwrap_err();
    assert!(err.is_store_error());
    assert_eq!(count_systems(broker), 1);
}

#[test]
fn broker_serializes_concurrent_writers() {
    let tmp = tempdir().expect("tempdir");
    let store = Store::open_path(&tmp.path().join("writers.db"), TIMEOUT).expect("open store");
    let threads = 6;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let broker = store.broker().clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for j in 0..10 {
                    broker
                        .with_write("test.concurrent", |conn| {
                            insert_system(conn, &format!("host-{}-{}", i, j))
                        })
                        .expect("write");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("join");
    }

    assert_eq!(count_systems(store.broker()), 60);
}

#[test]
fn config_loads_file_then_env_overrides() {
    let tmp = tempdir().expect("tempdir");
    let config_path = tmp.path().join("hwledger.toml");
    fs::write(
        &config_path,
        "[database]\npath = \"/srv/inventory/ledger.db\"\nbusy_timeout_secs = 12\n\n[vendor]\nenrich = false\npci_ids_paths = [\"/opt/pci.ids\"]\n",
    )
    .expect("write config");

    let config = InventoryConfig::load(Some(&config_path)).expect("load");
    assert_eq!(config.database.path, "/srv/inventory/ledger.db");
    assert_eq!(config.database.busy_timeout(), Duration::from_secs(12));
    assert!(!config.vendor.enrich);
    assert_eq!(config.vendor.pci_ids_paths.len(), 1);

    unsafe {
        std::env::set_var("INVENTORY_DB", "/legacy/inventory.db");
        std::env::set_var("HWLEDGER_LOGGING_FORMAT", "json");
        std::env::set_var("HWLEDGER_DATABASE_BUSY_TIMEOUT_SECS", "not-a-number");
    }
    let config = InventoryConfig::load(Some(&config_path)).expect("load with env");
    assert_eq!(config.database.path, "/legacy/inventory.db");
    assert_eq!(config.logging.format, "json");
    assert_eq!(config.database.busy_timeout_secs, 12);
    assert_eq!(config.ignored_env.len(), 1);
    assert_eq!(config.ignored_env[0].key, "HWLEDGER_DATABASE_BUSY_TIMEOUT_SECS");
    assert_eq!(config.ignored_env[0].value, "not-a-number");

    unsafe { std::env::set_var("HWLEDGER_DATABASE_PATH", "/namespaced/inventory.db") };
    let config = InventoryConfig::load(Some(&config_path)).expect("load with both");
    assert_eq!(config.database.path, "/namespaced/inventory.db");

    unsafe { std::env::set_var("HWLEDGER_LOGGING_LEVEL", "loud") };
    let err = InventoryConfig::load(Some(&config_path)).expect_err("invalid level");
    assert!(matches!(err, InventoryError::ConfigError(_)));

    unsafe {
        std::env::remove_var("INVENTORY_DB");
        std::env::remove_var("HWLEDGER_LOGGING_FORMAT");
        std::env::remove_var("HWLEDGER_DATABASE_BUSY_TIMEOUT_SECS");
        std::env::remove_var("HWLEDGER_DATABASE_PATH");
        std::env::remove_var("HWLEDGER_LOGGING_LEVEL");
    }

    let err = InventoryConfig::load(Some(&tmp.path().join("missing.toml"))).expect_err("missing");
    assert!(matches!(err, InventoryError::ConfigError(_)));
}
