//! Hardware inventory subsystems.
//!
//! - `snapshot`: validates agent reports into candidate components
//! - `vendor`: manufacturer normalization from PCI ids and model strings
//! - `reconcile`: merges a snapshot into the ledger in one transaction
//! - `store`: row primitives and administrative writes
//! - `query`: read-only listings
//!
//! [`Inventory`] bundles a [`Store`] with its [`ManufacturerNormalizer`] and is
//! the handle the CLI passes around.

pub mod model;
pub mod query;
pub mod reconcile;
pub mod snapshot;
pub mod store;
pub mod vendor;

use crate::core::config::InventoryConfig;
use crate::core::error::InventoryError;
use crate::core::store::Store;
use model::{
    Component, ComponentEdit, ComponentFilter, ComponentId, InventoryStats, NewSpare,
    SystemDetail, SystemId, SystemSummary,
};
use reconcile::ReconcileReport;
use snapshot::RawSnapshot;
use vendor::ManufacturerNormalizer;

#[derive(Debug, Clone)]
pub struct Inventory {
    store: Store,
    normalizer: ManufacturerNormalizer,
}

impl Inventory {
    pub fn new(store: Store, normalizer: ManufacturerNormalizer) -> Self {
        Self { store, normalizer }
    }

    /// Open the configured database and load the vendor table.
    pub fn open(config: &InventoryConfig) -> Result<Self, InventoryError> {
        let store = Store::open(&config.database)?;
        Ok(Self::new(store, ManufacturerNormalizer::from_config(&config.vendor)))
    }

    pub fn reconcile(&self, raw: &RawSnapshot) -> Result<SystemId, InventoryError> {
        Ok(reconcile::reconcile(&self.store, &self.normalizer, raw)?.system_id)
    }

    pub fn reconcile_json(&self, text: &str) -> Result<ReconcileReport, InventoryError> {
        reconcile::reconcile_json(&self.store, &self.normalizer, text)
    }

    pub fn add_spare(&self, spare: &NewSpare) -> Result<ComponentId, InventoryError> {
        Ok(store::add_spare(&self.store, spare)?.id)
    }

    pub fn get_component(&self, id: ComponentId) -> Result<Option<Component>, InventoryError> {
        store::get_component(&self.store, id)
    }

    pub fn update_component(
        &self,
        id: ComponentId,
        edit: &ComponentEdit,
    ) -> Result<Component, InventoryError> {
        store::update_component(&self.store, id, edit)
    }

    pub fn delete_component(&self, id: ComponentId) -> Result<bool, InventoryError> {
        store::delete_component(&self.store, id)
    }

    pub fn delete_system(&self, id: SystemId) -> Result<bool, InventoryError> {
        store::delete_system(&self.store, id)
    }

    pub fn list_components(&self, filter: &ComponentFilter) -> Result<Vec<Component>, InventoryError> {
        query::list_components(&self.store, filter)
    }

    pub fn list_systems(&self) -> Result<Vec<SystemSummary>, InventoryError> {
        query::list_systems(&self.store)
    }

    pub fn get_system_detail(&self, hostname: &str) -> Result<SystemDetail, InventoryError> {
        query::get_system_detail(&self.store, hostname)
    }

    pub fn system_id_by_hostname(&self, hostname: &str) -> Result<Option<SystemId>, InventoryError> {
        query::system_id_by_hostname(&self.store, hostname)
    }

    pub fn stats(&self) -> Result<InventoryStats, InventoryError> {
        store::inventory_stats(&self.store)
    }
}
