//! Moving records between routes, and reorder entry points.
//!
//! A transfer appends the record to the destination and persists it before the
//! record is removed from the source. When the second write fails the record
//! exists in both routes; that duplicate is logged and the error is returned.
//! Both route locks are held for the whole sequence, taken in id order.

use tracing::{debug, error, info};

use crate::error::StoreResult;
use crate::storage::RecordStore;

#[derive(Clone)]
pub struct TransferCoordinator {
    store: RecordStore,
}

impl TransferCoordinator {
    pub fn new(store: RecordStore) -> Self { Self { store } }

    pub fn store(&self) -> &RecordStore { &self.store }

    /// Move the record at `index` of `source` to the end of `destination`.
    ///
    /// Returns false without touching anything when the routes are the same or the
    /// index is out of range. Unknown routes fail with `RouteNotFound`.
    pub fn transfer(&self, source: &str, destination: &str, index: usize) -> StoreResult<bool> {
        let src = self.store.resolve(source)?;
        let dst = self.store.resolve(destination)?;
        if src.id == dst.id {
            debug!(target: "routelists::transfer", "transfer: source and destination are both '{}', nothing to do", src.id);
            return Ok(false);
        }

        let (first, second) = self.store.locks().pair(&src.id, &dst.id);
        let _g1 = first.lock();
        let _g2 = second.lock();

        let source_loaded = self.store.read_route(&src)?;
        let mut source_records = source_loaded.records;
        if index >= source_records.len() {
            debug!(
                target: "routelists::transfer",
                "transfer: index {} out of range for route '{}' ({} records)",
                index,
                src.id,
                source_records.len()
            );
            return Ok(false);
        }

        let dest_loaded = self.store.read_route(&dst)?;
        let mut dest_records = dest_loaded.records;
        dest_records.push(source_records[index].clone());
        self.store.write_route(&dst, &dest_records, dest_loaded.recovered)?;

        source_records.remove(index);
        if let Err(e) = self.store.write_route(&src, &source_records, source_loaded.recovered) {
            error!(
                target: "routelists::transfer",
                "transfer: record {} of '{}' was written to '{}' but could not be removed from the source; it is now duplicated: {}",
                index,
                src.id,
                dst.id,
                e
            );
            return Err(e);
        }

        info!(target: "routelists::transfer", "moved record {} from '{}' to '{}'", index, src.id, dst.id);
        Ok(true)
    }

    /// Exchange two records of one route.
    pub fn swap(&self, route_id: &str, a: usize, b: usize) -> StoreResult<bool> {
        self.store.swap(route_id, a, b)
    }

    /// Apply a full permutation to one route.
    pub fn reorder(&self, route_id: &str, order: &[usize]) -> StoreResult<()> {
        self.store.reorder_full(route_id, order)
    }
}
