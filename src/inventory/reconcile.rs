//! Reconciliation engine.
//!
//! Merges one normalized snapshot into the ledger inside a single immediate
//! transaction:
//! 1. upsert the system row by hostname
//! 2. drop every link of that system
//! 3. resolve each candidate to an existing component (serial + type, or
//!    type + model + location when there is no serial), updating or inserting
//! 4. link the system to every resolved component
//!
//! Rows are only rewritten when a stored field differs, so replaying the same
//! snapshot leaves ids, values and timestamps untouched.

use crate::core::error::InventoryError;
use crate::core::store::Store;
use crate::core::time::now_epoch_z;
use crate::inventory::model::{ComponentId, ComponentStatus, SystemId};
use crate::inventory::snapshot::{self, CandidateComponent, NormalizedSnapshot, RawSnapshot};
use crate::inventory::store::{
    clear_system_links, encode_specs, insert_link, load_system_by_hostname,
};
use crate::inventory::vendor::ManufacturerNormalizer;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Outcome of one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub system_id: SystemId,
    pub hostname: String,
    pub created_system: bool,
    pub components_created: usize,
    /// Candidates that resolved to an existing row, whether or not a field changed.
    pub components_updated: usize,
    pub links: usize,
}

/// Stored fields the engine compares before deciding to rewrite a component.
struct StoredComponent {
    id: ComponentId,
    manufacturer: String,
    model: String,
    specifications: Option<String>,
    status: ComponentStatus,
    location: Option<String>,
}

pub fn reconcile(
    store: &Store,
    normalizer: &ManufacturerNormalizer,
    raw: &RawSnapshot,
) -> Result<ReconcileReport, InventoryError> {
    let normalized = snapshot::ingest(raw)?;
    reconcile_snapshot(store, normalizer, &normalized)
}

/// Parse, validate and reconcile agent JSON. Malformed input never opens a transaction.
pub fn reconcile_json(
    store: &Store,
    normalizer: &ManufacturerNormalizer,
    text: &str,
) -> Result<ReconcileReport, InventoryError> {
    let normalized = snapshot::ingest_json(text)?;
    reconcile_snapshot(store, normalizer, &normalized)
}

pub fn reconcile_snapshot(
    store: &Store,
    normalizer: &ManufacturerNormalizer,
    snapshot: &NormalizedSnapshot,
) -> Result<ReconcileReport, InventoryError> {
    let report = store.broker().with_write("inventory.reconcile", |conn| {
        apply(conn, snapshot, normalizer)
    })?;

    info!(
        hostname = report.hostname.as_str(),
        system_id = report.system_id,
        created_system = report.created_system,
        created = report.components_created,
        updated = report.components_updated,
        links = report.links,
        "snapshot reconciled"
    );
    Ok(report)
}

/// Run every reconciliation step on an open transaction.
pub(crate) fn apply(
    conn: &Connection,
    snapshot: &NormalizedSnapshot,
    normalizer: &ManufacturerNormalizer,
) -> Result<ReconcileReport, InventoryError> {
    let now = now_epoch_z();
    let hostname = snapshot.hostname.as_str();

    let (system_id, created_system) = upsert_system(conn, snapshot, &now)?;
    let dropped = clear_system_links(conn, system_id)?;
    debug!(hostname, system_id, dropped, "links reset");

    let mut report = ReconcileReport {
        system_id,
        hostname: hostname.to_string(),
        created_system,
        components_created: 0,
        components_updated: 0,
        links: 0,
    };

    for candidate in &snapshot.components {
        let manufacturer =
            normalizer.normalize(&candidate.kind, &candidate.manufacturer, &candidate.model);
        let specs = encode_specs(&candidate.specs)?;

        let component_id = match find_existing(conn, candidate, hostname)? {
            Some(existing) => {
                refresh_component(conn, &existing, &manufacturer, candidate, &specs, hostname, &now)?;
                report.components_updated += 1;
                existing.id
            }
            None => {
                let id = insert_component(conn, &manufacturer, candidate, &specs, hostname, &now)?;
                report.components_created += 1;
                id
            }
        };

        insert_link(conn, system_id, component_id)?;
        report.links += 1;
    }

    Ok(report)
}

fn upsert_system(
    conn: &Connection,
    snapshot: &NormalizedSnapshot,
    now: &str,
) -> Result<(SystemId, bool), InventoryError> {
    let meta = &snapshot.system;

    let Some(existing) = load_system_by_hostname(conn, &snapshot.hostname)? else {
        conn.execute(
            "INSERT INTO systems(hostname, manufacturer, model, serial_number, uuid, last_scan, created_at, updated_at)
             VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                snapshot.hostname,
                meta.manufacturer,
                meta.model,
                meta.serial_number,
                meta.uuid,
                snapshot.detection_date,
                now,
            ],
        )?;
        let id = conn.last_insert_rowid();
        debug!(hostname = snapshot.hostname.as_str(), system_id = id, "system created");
        return Ok((id, true));
    };

    let unchanged = existing.manufacturer == meta.manufacturer
        && existing.model == meta.model
        && existing.serial_number == meta.serial_number
        && existing.uuid == meta.uuid
        && existing.last_scan.as_deref() == Some(snapshot.detection_date.as_str());

    if !unchanged {
        conn.execute(
            "UPDATE systems
             SET manufacturer = ?1, model = ?2, serial_number = ?3, uuid = ?4, last_scan = ?5, updated_at = ?6
             WHERE id = ?7",
            params![
                meta.manufacturer,
                meta.model,
                meta.serial_number,
                meta.uuid,
                snapshot.detection_date,
                now,
                existing.id,
            ],
        )?;
    }
    Ok((existing.id, false))
}

/// Identity policy: serial + type when a serial is known, else type + model at this host.
fn find_existing(
    conn: &Connection,
    candidate: &CandidateComponent,
    hostname: &str,
) -> Result<Option<StoredComponent>, InventoryError> {
    let found = match candidate.serial.as_deref() {
        Some(serial) => conn
            .query_row(
                "SELECT id, manufacturer, model, specifications, status, location FROM components
                 WHERE serial_number = ?1 AND component_type = ?2
                 ORDER BY id LIMIT 1",
                params![serial, candidate.kind],
                stored_from_row,
            )
            .optional()?,
        None => conn
            .query_row(
                "SELECT id, manufacturer, model, specifications, status, location FROM components
                 WHERE component_type = ?1 AND model = ?2 AND location = ?3
                 ORDER BY id LIMIT 1",
                params![candidate.kind, candidate.model, hostname],
                stored_from_row,
            )
            .optional()?,
    };

    debug!(
        hostname,
        component_type = %candidate.kind,
        model = candidate.model.as_str(),
        by_serial = candidate.serial.is_some(),
        matched = ?found.as_ref().map(|c| c.id),
        "identity resolved"
    );
    Ok(found)
}

fn stored_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredComponent> {
    Ok(StoredComponent {
        id: row.get(0)?,
        manufacturer: row.get(1)?,
        model: row.get(2)?,
        specifications: row.get(3)?,
        status: row.get(4)?,
        location: row.get(5)?,
    })
}

fn refresh_component(
    conn: &Connection,
    existing: &StoredComponent,
    manufacturer: &str,
    candidate: &CandidateComponent,
    specs: &str,
    hostname: &str,
    now: &str,
) -> Result<(), InventoryError> {
    let unchanged = existing.manufacturer == manufacturer
        && existing.model == candidate.model
        && existing.specifications.as_deref() == Some(specs)
        && existing.status == ComponentStatus::Installed
        && existing.location.as_deref() == Some(hostname);
    if unchanged {
        return Ok(());
    }

    conn.execute(
        "UPDATE components
         SET manufacturer = ?1, model = ?2, specifications = ?3, status = ?4, location = ?5, updated_at = ?6
         WHERE id = ?7",
        params![
            manufacturer,
            candidate.model,
            specs,
            ComponentStatus::Installed,
            hostname,
            now,
            existing.id,
        ],
    )?;
    Ok(())
}

fn insert_component(
    conn: &Connection,
    manufacturer: &str,
    candidate: &CandidateComponent,
    specs: &str,
    hostname: &str,
    now: &str,
) -> Result<ComponentId, InventoryError> {
    conn.execute(
        "INSERT INTO components(component_type, manufacturer, model, serial_number, specifications, status, location, notes, created_at, updated_at)
         VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL, ?8, ?8)",
        params![
            candidate.kind,
            manufacturer,
            candidate.model,
            candidate.serial,
            specs,
            ComponentStatus::Installed,
            hostname,
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}
