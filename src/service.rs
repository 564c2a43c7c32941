//! Operation interface consumed by the web layer.
//!
//! `RouteService` bundles the registry, record store, search and transfer
//! coordinator behind the logical operations the surrounding application calls.
//! It is cheap to clone; all state lives on disk.

use std::path::Path;

use tracing::debug;

use crate::config::ServerConfig;
use crate::error::StoreResult;
use crate::registry::{RouteConfig, RouteRegistry};
use crate::search::{self, SearchHit};
use crate::storage::{Field, Position, Record, RecordPatch, RecordStore};
use crate::transfer::TransferCoordinator;

#[derive(Clone)]
pub struct RouteService {
    store: RecordStore,
    transfers: TransferCoordinator,
    search_threshold: f64,
}

impl RouteService {
    pub fn new(store: RecordStore, search_threshold: f64) -> Self {
        let transfers = TransferCoordinator::new(store.clone());
        Self { store, transfers, search_threshold }
    }

    /// Service over `data_root` with default registry settings.
    pub fn open(data_root: impl AsRef<Path>) -> StoreResult<Self> {
        let store = RecordStore::new(RouteRegistry::open(data_root))?;
        Ok(Self::new(store, search::DEFAULT_THRESHOLD))
    }

    pub fn from_config(cfg: &ServerConfig) -> StoreResult<Self> {
        let registry = RouteRegistry::new(&cfg.data_root, &cfg.registry_file, &cfg.storage_prefix);
        let store = RecordStore::new(registry)?;
        Ok(Self::new(store, cfg.search_threshold))
    }

    pub fn store(&self) -> &RecordStore { &self.store }

    pub fn search_threshold(&self) -> f64 { self.search_threshold }

    fn registry(&self) -> &RouteRegistry { self.store.registry() }

    // ---- routes ----

    pub fn list_routes(&self) -> StoreResult<Vec<RouteConfig>> {
        self.registry().list()
    }

    /// None when the derived id is empty or already taken.
    pub fn create_route(&self, title: &str) -> StoreResult<Option<RouteConfig>> {
        self.registry().create(title)
    }

    pub fn rename_route(&self, id: &str, new_title: &str) -> StoreResult<Option<RouteConfig>> {
        self.registry().rename(id, new_title)
    }

    /// False when the id was not registered.
    pub fn remove_route(&self, id: &str) -> StoreResult<bool> {
        self.registry().remove(id)
    }

    // ---- records ----

    pub fn list_records(&self, route_id: &str) -> StoreResult<Vec<Record>> {
        self.store.load(route_id)
    }

    pub fn search(&self, term: &str, fields: &[Field]) -> StoreResult<Vec<SearchHit>> {
        search::search(&self.store, term, fields, self.search_threshold)
    }

    /// Returns the index the new record occupies.
    pub fn add_record(&self, route_id: &str, record: Record, position: Position) -> StoreResult<usize> {
        self.store.insert_at(route_id, record, position)
    }

    pub fn update_record(&self, route_id: &str, index: usize, patch: &RecordPatch) -> StoreResult<bool> {
        self.store.update_at(route_id, index, patch)
    }

    pub fn delete_record(&self, route_id: &str, index: usize) -> StoreResult<bool> {
        let removed = self.store.delete_at(route_id, index)?;
        if removed.is_none() {
            debug!(target: "routelists::storage", "delete_record: index {} out of range for '{}'", index, route_id);
        }
        Ok(removed.is_some())
    }

    pub fn swap_records(&self, route_id: &str, a: usize, b: usize) -> StoreResult<bool> {
        self.transfers.swap(route_id, a, b)
    }

    pub fn reorder_records(&self, route_id: &str, order: &[usize]) -> StoreResult<()> {
        self.transfers.reorder(route_id, order)
    }

    pub fn transfer_record(&self, source: &str, destination: &str, index: usize) -> StoreResult<bool> {
        self.transfers.transfer(source, destination, index)
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod service_tests;
