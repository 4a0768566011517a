//! Inventory store: row primitives shared by reconciliation and queries, plus the
//! administrative operations (spare entry, edits, deletes, decommissioning).
//!
//! Row helpers take a `&Connection` so callers compose them inside one broker
//! transaction. Public operations take a `&Store` and open their own.

use crate::core::error::InventoryError;
use crate::core::store::Store;
use crate::core::time::now_epoch_z;
use crate::inventory::model::{
    Component, ComponentEdit, ComponentId, ComponentStatus, ComponentType, InventoryStats,
    NewSpare, System, SystemId, TypeStatusCount, non_blank,
};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde_json::Value as JsonValue;
use tracing::info;

pub(crate) const COMPONENT_COLUMNS: &str = "id, component_type, manufacturer, model, serial_number, specifications, status, location, notes, created_at, updated_at";
pub(crate) const SYSTEM_COLUMNS: &str =
    "id, hostname, manufacturer, model, serial_number, uuid, last_scan, created_at, updated_at";

pub(crate) fn component_from_row(row: &Row<'_>) -> rusqlite::Result<Component> {
    let specs: Option<String> = row.get(5)?;
    Ok(Component {
        id: row.get(0)?,
        component_type: row.get(1)?,
        manufacturer: row.get(2)?,
        model: row.get(3)?,
        serial_number: row.get(4)?,
        specifications: specs.map(decode_specs),
        status: row.get(6)?,
        location: row.get(7)?,
        notes: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

pub(crate) fn system_from_row(row: &Row<'_>) -> rusqlite::Result<System> {
    Ok(System {
        id: row.get(0)?,
        hostname: row.get(1)?,
        manufacturer: row.get(2)?,
        model: row.get(3)?,
        serial_number: row.get(4)?,
        uuid: row.get(5)?,
        last_scan: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// Serialize a specification blob. Object keys come out sorted, so equal blobs encode equally.
pub(crate) fn encode_specs(specs: &JsonValue) -> Result<String, InventoryError> {
    Ok(serde_json::to_string(specs)?)
}

// Rows written by other tools may hold plain text here.
fn decode_specs(raw: String) -> JsonValue {
    serde_json::from_str(&raw).unwrap_or(JsonValue::String(raw))
}

pub(crate) fn load_component(
    conn: &Connection,
    id: ComponentId,
) -> Result<Option<Component>, InventoryError> {
    let sql = format!("SELECT {} FROM components WHERE id = ?1", COMPONENT_COLUMNS);
    Ok(conn
        .query_row(&sql, params![id], component_from_row)
        .optional()?)
}

pub(crate) fn load_system(conn: &Connection, id: SystemId) -> Result<Option<System>, InventoryError> {
    let sql = format!("SELECT {} FROM systems WHERE id = ?1", SYSTEM_COLUMNS);
    Ok(conn.query_row(&sql, params![id], system_from_row).optional()?)
}

pub(crate) fn load_system_by_hostname(
    conn: &Connection,
    hostname: &str,
) -> Result<Option<System>, InventoryError> {
    let sql = format!("SELECT {} FROM systems WHERE hostname = ?1", SYSTEM_COLUMNS);
    Ok(conn
        .query_row(&sql, params![hostname], system_from_row)
        .optional()?)
}

pub(crate) fn insert_link(
    conn: &Connection,
    system_id: SystemId,
    component_id: ComponentId,
) -> Result<(), InventoryError> {
    conn.execute(
        "INSERT INTO system_components(system_id, component_id) VALUES(?1, ?2)",
        params![system_id, component_id],
    )?;
    Ok(())
}

pub(crate) fn clear_system_links(conn: &Connection, system_id: SystemId) -> Result<usize, InventoryError> {
    Ok(conn.execute(
        "DELETE FROM system_components WHERE system_id = ?1",
        params![system_id],
    )?)
}

/// Insert a hand-entered spare. Always creates a new row.
pub fn add_spare(store: &Store, spare: &NewSpare) -> Result<Component, InventoryError> {
    let manufacturer = non_blank(Some(spare.manufacturer.as_str())).ok_or_else(|| {
        InventoryError::ValidationError("spare manufacturer must not be empty".to_string())
    })?;
    let model = non_blank(Some(spare.model.as_str())).ok_or_else(|| {
        InventoryError::ValidationError("spare model must not be empty".to_string())
    })?;
    if spare.component_type.as_str().trim().is_empty() {
        return Err(InventoryError::ValidationError(
            "spare component type must not be empty".to_string(),
        ));
    }

    let component = store.broker().with_write("inventory.add_spare", |conn| {
        let now = now_epoch_z();
        conn.execute(
            "INSERT INTO components(component_type, manufacturer, model, serial_number, specifications, status, location, notes, created_at, updated_at)
             VALUES(?1, ?2, ?3, ?4, NULL, ?5, ?6, ?7, ?8, ?8)",
            params![
                spare.component_type,
                manufacturer,
                model,
                non_blank(spare.serial_number.as_deref()),
                ComponentStatus::Spare,
                non_blank(spare.location.as_deref()),
                non_blank(spare.notes.as_deref()),
                now,
            ],
        )?;
        let id = conn.last_insert_rowid();
        load_component(conn, id)?
            .ok_or_else(|| InventoryError::NotFound(format!("component {}", id)))
    })?;

    info!(
        component_id = component.id,
        component_type = %component.component_type,
        model = component.model.as_str(),
        "spare added"
    );
    Ok(component)
}

pub fn get_component(store: &Store, id: ComponentId) -> Result<Option<Component>, InventoryError> {
    store
        .broker()
        .with_read("inventory.get_component", |conn| load_component(conn, id))
}

/// Apply an administrative edit. `updated_at` moves only when a field actually changes.
pub fn update_component(
    store: &Store,
    id: ComponentId,
    edit: &ComponentEdit,
) -> Result<Component, InventoryError> {
    store.broker().with_write("inventory.update_component", |conn| {
        let current = load_component(conn, id)?
            .ok_or_else(|| InventoryError::NotFound(format!("component {}", id)))?;

        let mut next = current.clone();
        if let Some(manufacturer) = &edit.manufacturer {
            next.manufacturer = manufacturer.trim().to_string();
        }
        if let Some(model) = &edit.model {
            let model = non_blank(Some(model.as_str())).ok_or_else(|| {
                InventoryError::ValidationError("component model must not be empty".to_string())
            })?;
            next.model = model;
        }
        if let Some(serial) = &edit.serial_number {
            next.serial_number = non_blank(Some(serial.as_str()));
        }
        if let Some(status) = edit.status {
            next.status = status;
        }
        if let Some(location) = &edit.location {
            next.location = non_blank(Some(location.as_str()));
        }
        if let Some(notes) = &edit.notes {
            next.notes = non_blank(Some(notes.as_str()));
        }

        if next == current {
            return Ok(current);
        }

        next.updated_at = now_epoch_z();
        conn.execute(
            "UPDATE components
             SET manufacturer = ?1, model = ?2, serial_number = ?3, status = ?4, location = ?5, notes = ?6, updated_at = ?7
             WHERE id = ?8",
            params![
                next.manufacturer,
                next.model,
                next.serial_number,
                next.status,
                next.location,
                next.notes,
                next.updated_at,
                id,
            ],
        )?;
        info!(component_id = id, "component updated");
        Ok(next)
    })
}

/// Delete a component and its links. Returns `false` when the id is unknown.
pub fn delete_component(store: &Store, id: ComponentId) -> Result<bool, InventoryError> {
    let deleted = store.broker().with_write("inventory.delete_component", |conn| {
        conn.execute(
            "DELETE FROM system_components WHERE component_id = ?1",
            params![id],
        )?;
        Ok(conn.execute("DELETE FROM components WHERE id = ?1", params![id])? > 0)
    })?;
    info!(component_id = id, deleted, "delete component");
    Ok(deleted)
}

/// Decommission a system: every component located at its hostname becomes a
/// spare with no location, then the system and its links are removed.
pub fn delete_system(store: &Store, id: SystemId) -> Result<bool, InventoryError> {
    let (hostname, spared) = store.broker().with_write("inventory.delete_system", |conn| {
        let system = load_system(conn, id)?
            .ok_or_else(|| InventoryError::NotFound(format!("system {}", id)))?;

        let spared = conn.execute(
            "UPDATE components SET status = ?1, location = NULL, updated_at = ?2 WHERE location = ?3",
            params![ComponentStatus::Spare, now_epoch_z(), system.hostname],
        )?;
        clear_system_links(conn, id)?;
        conn.execute("DELETE FROM systems WHERE id = ?1", params![id])?;
        Ok((system.hostname, spared))
    })?;

    info!(
        system_id = id,
        hostname = hostname.as_str(),
        spared,
        "system decommissioned"
    );
    Ok(true)
}

pub fn inventory_stats(store: &Store) -> Result<InventoryStats, InventoryError> {
    store.broker().with_read("inventory.stats", |conn| {
        let system_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM systems", [], |row| row.get(0))?;

        let mut stmt = conn.prepare(
            "SELECT component_type, status, COUNT(*) FROM components
             GROUP BY component_type, status
             ORDER BY component_type, status",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(TypeStatusCount {
                component_type: row.get::<_, ComponentType>(0)?,
                status: row.get(1)?,
                count: row.get(2)?,
            })
        })?;
        let mut component_counts = Vec::new();
        for row in rows {
            component_counts.push(row?);
        }

        Ok(InventoryStats {
            system_count,
            component_counts,
        })
    })
}
