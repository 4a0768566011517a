use hwledger::core::error::InventoryError;
use hwledger::core::store::Store;
use hwledger::inventory::Inventory;
use hwledger::inventory::model::{
    ComponentEdit, ComponentFilter, ComponentStatus, ComponentType, NewSpare,
};
use hwledger::inventory::vendor::{ManufacturerNormalizer, PciIdTable};
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tempfile::tempdir;

fn open_inventory(dir: &Path) -> Inventory {
    let store = Store::open_path(&dir.join("inventory.db"), Duration::from_secs(5)).unwrap();
    Inventory::new(store, ManufacturerNormalizer::new(PciIdTable::empty()))
}

fn scan_workstation(inventory: &Inventory, hostname: &str) -> i64 {
    let snapshot = json!({
        "hostname": hostname,
        "detection_date": "2024-01-15",
        "cpu": {"model": "Intel Core i9-9900K", "cores": 8},
        "memory": {"slots": [{"slot": "A1", "size": "32GB", "type": "DDR4", "part_number": format!("{}-DIMM", hostname)}]},
        "storage": [{"device": "/dev/sda", "model": "Crucial MX500", "serial": format!("{}-SSD", hostname), "size": "1T"}]
    });
    inventory.reconcile_json(&snapshot.to_string()).unwrap().system_id
}

fn spare(kind: ComponentType, manufacturer: &str, model: &str) -> NewSpare {
    NewSpare {
        component_type: kind,
        manufacturer: manufacturer.to_string(),
        model: model.to_string(),
        serial_number: None,
        location: None,
        notes: None,
    }
}

#[test]
fn test_delete_system_turns_components_into_spares() {
    let tmp = tempdir().unwrap();
    let inventory = open_inventory(tmp.path());
    let system_id = scan_workstation(&inventory, "ws-01");
    let other_id = scan_workstation(&inventory, "ws-02");

    let installed = inventory.get_system_detail("ws-01").unwrap().components;
    assert_eq!(installed.len(), 3);

    assert!(inventory.delete_system(system_id).unwrap());

    for component in &installed {
        let after = inventory.get_component(component.id).unwrap().unwrap();
        assert_eq!(after.status, ComponentStatus::Spare);
        assert_eq!(after.location, None);
        assert_eq!(after.notes, component.notes);
    }

    let err = inventory.get_system_detail("ws-01").unwrap_err();
    assert!(matches!(err, InventoryError::NotFound(_)));
    assert_eq!(inventory.system_id_by_hostname("ws-01").unwrap(), None);

    let systems = inventory.list_systems().unwrap();
    assert_eq!(systems.len(), 1);
    assert_eq!(systems[0].system.id, other_id);
    assert_eq!(systems[0].component_count, 3);
    let others = inventory.get_system_detail("ws-02").unwrap().components;
    assert!(others.iter().all(|c| c.status == ComponentStatus::Installed));
}

#[test]
fn test_delete_unknown_system_is_not_found() {
    let tmp = tempdir().unwrap();
    let inventory = open_inventory(tmp.path());
    let err = inventory.delete_system(4242).unwrap_err();
    assert!(matches!(err, InventoryError::NotFound(_)));
}

#[test]
fn test_decommissioned_parts_are_reused_by_the_next_host() {
    let tmp = tempdir().unwrap();
    let inventory = open_inventory(tmp.path());
    let system_id = scan_workstation(&inventory, "donor");
    let ssd = inventory
        .list_components(&ComponentFilter {
            component_type: Some(ComponentType::Storage),
            status: None,
        })
        .unwrap()
        .remove(0);
    inventory.delete_system(system_id).unwrap();

    let snapshot = json!({
        "hostname": "recipient",
        "detection_date": "2024-02-01",
        "storage": [{"device": "/dev/sdb", "model": "Crucial MX500", "serial": "donor-SSD"}]
    });
    inventory.reconcile_json(&snapshot.to_string()).unwrap();

    let reused = inventory.get_component(ssd.id).unwrap().unwrap();
    assert_eq!(reused.status, ComponentStatus::Installed);
    assert_eq!(reused.location.as_deref(), Some("recipient"));
}

#[test]
fn test_delete_component_is_idempotent() {
    let tmp = tempdir().unwrap();
    let inventory = open_inventory(tmp.path());
    scan_workstation(&inventory, "ws-03");

    let detail = inventory.get_system_detail("ws-03").unwrap();
    let victim = detail.components[0].id;

    assert!(inventory.delete_component(victim).unwrap());
    assert!(!inventory.delete_component(victim).unwrap());
    assert!(!inventory.delete_component(999_999).unwrap());

    assert_eq!(inventory.get_component(victim).unwrap(), None);
    let systems = inventory.list_systems().unwrap();
    assert_eq!(systems[0].component_count, 2);
    assert_eq!(inventory.get_system_detail("ws-03").unwrap().components.len(), 2);
}

#[test]
fn test_add_spare_always_creates_a_row() {
    let tmp = tempdir().unwrap();
    let inventory = open_inventory(tmp.path());

    let mut entry = spare(ComponentType::Gpu, "NVIDIA Corporation", "Tesla T4");
    entry.serial_number = Some("  ".to_string());
    entry.location = Some("shelf B".to_string());
    entry.notes = Some("from decommissioned render node".to_string());

    let first = inventory.add_spare(&entry).unwrap();
    let second = inventory.add_spare(&entry).unwrap();
    assert_ne!(first, second);

    let stored = inventory.get_component(first).unwrap().unwrap();
    assert_eq!(stored.status, ComponentStatus::Spare);
    assert_eq!(stored.component_type, ComponentType::Gpu);
    assert_eq!(stored.serial_number, None);
    assert_eq!(stored.location.as_deref(), Some("shelf B"));
    assert_eq!(stored.notes.as_deref(), Some("from decommissioned render node"));
    assert_eq!(stored.specifications, None);
    assert_eq!(stored.created_at, stored.updated_at);
}

#[test]
fn test_add_spare_accepts_custom_types() {
    let tmp = tempdir().unwrap();
    let inventory = open_inventory(tmp.path());

    let id = inventory
        .add_spare(&spare(ComponentType::parse("PSU").unwrap(), "Corsair", "RM750x"))
        .unwrap();
    let stored = inventory.get_component(id).unwrap().unwrap();
    assert_eq!(stored.component_type, ComponentType::Other("psu".to_string()));
}

#[test]
fn test_add_spare_rejects_blank_fields() {
    let tmp = tempdir().unwrap();
    let inventory = open_inventory(tmp.path());

    let err = inventory
        .add_spare(&spare(ComponentType::Memory, " ", "DDR4 16GB"))
        .unwrap_err();
    assert!(matches!(err, InventoryError::ValidationError(_)));

    let err = inventory
        .add_spare(&spare(ComponentType::Memory, "Kingston", ""))
        .unwrap_err();
    assert!(matches!(err, InventoryError::ValidationError(_)));

    assert!(inventory.list_components(&ComponentFilter::default()).unwrap().is_empty());
}

#[test]
fn test_update_component_edits_fields() {
    let tmp = tempdir().unwrap();
    let inventory = open_inventory(tmp.path());
    let id = inventory
        .add_spare(&spare(ComponentType::Storage, "Toshiba", "MG07ACA14TE"))
        .unwrap();

    let updated = inventory
        .update_component(
            id,
            &ComponentEdit {
                status: Some(ComponentStatus::Retired),
                notes: Some("SMART failures".to_string()),
                serial_number: Some("Y9X0A01".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.status, ComponentStatus::Retired);
    assert_eq!(updated.notes.as_deref(), Some("SMART failures"));
    assert_eq!(updated.serial_number.as_deref(), Some("Y9X0A01"));
    assert_eq!(updated.manufacturer, "Toshiba");

    let stored = inventory.get_component(id).unwrap().unwrap();
    assert_eq!(stored, updated);

    // Clearing with a blank value stores NULL.
    let cleared = inventory
        .update_component(
            id,
            &ComponentEdit {
                notes: Some(String::new()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(cleared.notes, None);
}

#[test]
fn test_update_component_without_changes_keeps_timestamp() {
    let tmp = tempdir().unwrap();
    let inventory = open_inventory(tmp.path());
    let id = inventory
        .add_spare(&spare(ComponentType::Cpu, "Intel Corporation", "Xeon E5-2680 v4"))
        .unwrap();
    let before = inventory.get_component(id).unwrap().unwrap();

    let after = inventory
        .update_component(
            id,
            &ComponentEdit {
                manufacturer: Some("Intel Corporation".to_string()),
                status: Some(ComponentStatus::Spare),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(after, before);
}

#[test]
fn test_update_component_errors() {
    let tmp = tempdir().unwrap();
    let inventory = open_inventory(tmp.path());

    let err = inventory
        .update_component(77, &ComponentEdit::default())
        .unwrap_err();
    assert!(matches!(err, InventoryError::NotFound(_)));

    let id = inventory
        .add_spare(&spare(ComponentType::Gpu, "AMD", "Radeon Pro W6800"))
        .unwrap();
    let err = inventory
        .update_component(
            id,
            &ComponentEdit {
                model: Some("   ".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, InventoryError::ValidationError(_)));
}

#[test]
fn test_specifications_round_trip_verbatim() {
    let tmp = tempdir().unwrap();
    let inventory = open_inventory(tmp.path());
    let slot = json!({"slot": "ChannelA-DIMM0", "size": "16 GB", "speed": "2667 MT/s", "type": "DDR4", "manufacturer": "Micron", "part_number": "MTA16ATF2G64HZ", "rank": 2});
    let snapshot = json!({"hostname": "spec-host", "detection_date": "2024-01-01", "memory": {"slots": [slot.clone()]}});
    inventory.reconcile_json(&snapshot.to_string()).unwrap();

    let dimm = &inventory.get_system_detail("spec-host").unwrap().components[0];
    assert_eq!(dimm.specifications.as_ref(), Some(&slot));
    assert_eq!(dimm.serial_number.as_deref(), Some("MTA16ATF2G64HZ"));
}

#[test]
fn test_stats_group_by_type_and_status() {
    let tmp = tempdir().unwrap();
    let inventory = open_inventory(tmp.path());
    scan_workstation(&inventory, "ws-10");
    scan_workstation(&inventory, "ws-11");
    inventory
        .add_spare(&spare(ComponentType::Storage, "Seagate", "IronWolf 8TB"))
        .unwrap();

    let stats = inventory.stats().unwrap();
    assert_eq!(stats.system_count, 2);
    assert_eq!(stats.count(&ComponentType::Storage, ComponentStatus::Installed), 2);
    assert_eq!(stats.count(&ComponentType::Storage, ComponentStatus::Spare), 1);
    assert_eq!(stats.count(&ComponentType::Cpu, ComponentStatus::Installed), 2);
    assert_eq!(stats.count(&ComponentType::Memory, ComponentStatus::Installed), 2);
    assert_eq!(stats.count(&ComponentType::Gpu, ComponentStatus::Installed), 0);
}
