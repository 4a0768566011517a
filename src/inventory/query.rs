//! Read-only views over the ledger. Every call runs in its own read transaction.

use crate::core::error::InventoryError;
use crate::core::store::Store;
use crate::inventory::model::{Component, ComponentFilter, SystemDetail, SystemId, SystemSummary};
use crate::inventory::store::{
    COMPONENT_COLUMNS, SYSTEM_COLUMNS, component_from_row, load_system_by_hostname,
    system_from_row,
};
use rusqlite::types::ToSql;
use rusqlite::{OptionalExtension, params};

/// Components matching every set filter, ordered by type, manufacturer, model, then id.
pub fn list_components(
    store: &Store,
    filter: &ComponentFilter,
) -> Result<Vec<Component>, InventoryError> {
    store.broker().with_read("inventory.list_components", |conn| {
        let mut query = format!("SELECT {} FROM components WHERE 1=1", COMPONENT_COLUMNS);
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(kind) = &filter.component_type {
            query.push_str(" AND component_type = ?");
            params.push(Box::new(kind.clone()));
        }
        if let Some(status) = filter.status {
            query.push_str(" AND status = ?");
            params.push(Box::new(status));
        }

        query.push_str(" ORDER BY component_type, manufacturer, model, id");

        let mut stmt = conn.prepare(&query)?;
        let params_as_dyn: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let rows = stmt.query_map(
            rusqlite::params_from_iter(params_as_dyn.iter().copied()),
            component_from_row,
        )?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    })
}

/// Every system with its current link count, ordered by hostname.
pub fn list_systems(store: &Store) -> Result<Vec<SystemSummary>, InventoryError> {
    store.broker().with_read("inventory.list_systems", |conn| {
        let columns = SYSTEM_COLUMNS
            .split(", ")
            .map(|c| format!("s.{}", c))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {}, COUNT(sc.component_id)
             FROM systems s
             LEFT JOIN system_components sc ON sc.system_id = s.id
             GROUP BY s.id
             ORDER BY s.hostname",
            columns
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            Ok(SystemSummary {
                system: system_from_row(row)?,
                component_count: row.get(9)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    })
}

/// A system and its linked components ordered by type. `NotFound` for unknown hostnames.
pub fn get_system_detail(store: &Store, hostname: &str) -> Result<SystemDetail, InventoryError> {
    store.broker().with_read("inventory.get_system_detail", |conn| {
        let system = load_system_by_hostname(conn, hostname)?
            .ok_or_else(|| InventoryError::NotFound(format!("system '{}'", hostname)))?;

        let columns = COMPONENT_COLUMNS
            .split(", ")
            .map(|c| format!("c.{}", c))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {} FROM components c
             JOIN system_components sc ON sc.component_id = c.id
             WHERE sc.system_id = ?1
             ORDER BY c.component_type, c.id",
            columns
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![system.id], component_from_row)?;
        let mut components = Vec::new();
        for row in rows {
            components.push(row?);
        }

        Ok(SystemDetail { system, components })
    })
}

pub fn system_id_by_hostname(store: &Store, hostname: &str) -> Result<Option<SystemId>, InventoryError> {
    store.broker().with_read("inventory.system_id_by_hostname", |conn| {
        Ok(conn
            .query_row(
                "SELECT id FROM systems WHERE hostname = ?1",
                params![hostname],
                |row| row.get(0),
            )
            .optional()?)
    })
}
