//!
//! routelists storage module
//! -------------------------
//! Each route's records live in one CSV file under the data root, with exactly the
//! canonical columns `Company,Address,Complement,Phone` and a header row. A record
//! has no identity besides its position in that file, so every operation here takes
//! zero-based indexes that are only meaningful against the current file contents.
//!
//! Key responsibilities:
//! - Resolve route ids through the `RouteRegistry` (`RouteNotFound` otherwise).
//! - Load and normalize route files, creating empty ones on first access.
//! - Positional mutations (insert, update, delete, swap, full reorder), each of
//!   which rewrites the whole file of record.
//!
//! Every load-mutate-persist sequence holds the route's lock from `locks`, which
//! serializes requests against the same route. Nothing is cached between calls.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::registry::{RouteConfig, RouteRegistry};

mod paths;
pub(crate) mod io;
pub mod locks;
pub mod schema;

pub use locks::RouteLocks;
pub use schema::{Field, Record, RecordPatch};

/// Where `insert_at` places a new record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Start,
    End,
    /// Immediately after the record currently at this offset.
    After(usize),
}

impl Position {
    /// Parse a user supplied position. `start`/`inicio` and `end`/`fim` are tokens,
    /// a non-negative integer is an offset, anything else (including empty) is `End`.
    pub fn parse(raw: &str) -> Position {
        let t = raw.trim();
        if t.eq_ignore_ascii_case("start") || t.eq_ignore_ascii_case("inicio") {
            return Position::Start;
        }
        if t.eq_ignore_ascii_case("end") || t.eq_ignore_ascii_case("fim") {
            return Position::End;
        }
        t.parse::<usize>().map(Position::After).unwrap_or(Position::End)
    }

    /// Index the new record will occupy in a sequence of `len` records.
    pub fn insertion_index(self, len: usize) -> usize {
        match self {
            Position::Start => 0,
            Position::End => len,
            Position::After(i) => i.saturating_add(1).min(len),
        }
    }
}

impl Default for Position {
    fn default() -> Self { Position::End }
}

/// Result of a mutation closure: `Changed` values are persisted, `Unchanged` are not.
pub(crate) enum Change<T> {
    Unchanged(T),
    Changed(T),
}

/// Positional record store over the route files of one data root.
#[derive(Clone)]
pub struct RecordStore {
    root: PathBuf,
    registry: RouteRegistry,
    locks: RouteLocks,
}

impl RecordStore {
    /// Create a store over the registry's data root. The directory is created if missing.
    pub fn new(registry: RouteRegistry) -> StoreResult<Self> {
        let root = registry.data_root().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root, registry, locks: RouteLocks::new() })
    }

    pub fn registry(&self) -> &RouteRegistry { &self.registry }

    pub(crate) fn locks(&self) -> &RouteLocks { &self.locks }

    /// Look a route up in the registry.
    pub(crate) fn resolve(&self, route_id: &str) -> StoreResult<RouteConfig> {
        self.registry
            .get(route_id)?
            .ok_or_else(|| StoreError::RouteNotFound(route_id.to_string()))
    }

    /// Normalized records of a route, in file order. Creates an empty file on first access.
    pub fn load(&self, route_id: &str) -> StoreResult<Vec<Record>> {
        let route = self.resolve(route_id)?;
        let handle = self.locks.handle(&route.id);
        let _guard = handle.lock();
        Ok(self.read_route(&route)?.records)
    }

    /// Replace a route's whole record sequence.
    pub fn persist(&self, route_id: &str, records: &[Record]) -> StoreResult<()> {
        self.mutate(route_id, |current| {
            *current = records.to_vec();
            Ok(Change::Changed(()))
        })
    }

    /// Run one load-mutate-persist sequence under the route lock.
    fn mutate<T, F>(&self, route_id: &str, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Vec<Record>) -> StoreResult<Change<T>>,
    {
        let route = self.resolve(route_id)?;
        let handle = self.locks.handle(&route.id);
        let _guard = handle.lock();
        let loaded = self.read_route(&route)?;
        let mut records = loaded.records;
        match f(&mut records)? {
            Change::Unchanged(v) => Ok(v),
            Change::Changed(v) => {
                self.write_route(&route, &records, loaded.recovered)?;
                Ok(v)
            }
        }
    }

    /// Insert a record and persist. Returns the index the record now occupies.
    pub fn insert_at(&self, route_id: &str, record: Record, position: Position) -> StoreResult<usize> {
        self.mutate(route_id, |records| {
            let at = position.insertion_index(records.len());
            records.insert(at, record);
            debug!(target: "routelists::storage", "insert_at: route='{}' position={:?} index={}", route_id, position, at);
            Ok(Change::Changed(at))
        })
    }

    /// Overwrite the fields present in `patch` on the record at `index`.
    /// Returns false (and writes nothing) when `index` is out of range.
    pub fn update_at(&self, route_id: &str, index: usize, patch: &RecordPatch) -> StoreResult<bool> {
        self.mutate(route_id, |records| match records.get_mut(index) {
            Some(r) => {
                r.apply(patch);
                debug!(target: "routelists::storage", "update_at: route='{}' index={}", route_id, index);
                Ok(Change::Changed(true))
            }
            None => Ok(Change::Unchanged(false)),
        })
    }

    /// Remove the record at `index`; later records shift down by one.
    /// Returns the removed record, or None when `index` is out of range.
    pub fn delete_at(&self, route_id: &str, index: usize) -> StoreResult<Option<Record>> {
        self.mutate(route_id, |records| {
            if index >= records.len() {
                return Ok(Change::Unchanged(None));
            }
            let removed = records.remove(index);
            debug!(target: "routelists::storage", "delete_at: route='{}' index={} remaining={}", route_id, index, records.len());
            Ok(Change::Changed(Some(removed)))
        })
    }

    /// Exchange two records. Out-of-range indexes and `a == b` change nothing.
    pub fn swap(&self, route_id: &str, a: usize, b: usize) -> StoreResult<bool> {
        self.mutate(route_id, |records| {
            if a == b || a >= records.len() || b >= records.len() {
                return Ok(Change::Unchanged(false));
            }
            records.swap(a, b);
            debug!(target: "routelists::storage", "swap: route='{}' a={} b={}", route_id, a, b);
            Ok(Change::Changed(true))
        })
    }

    /// Reorder all records: position `i` of the result is the record previously at
    /// `order[i]`. `order` must be a permutation of `0..len`; otherwise the route
    /// is left untouched.
    pub fn reorder_full(&self, route_id: &str, order: &[usize]) -> StoreResult<()> {
        self.mutate(route_id, |records| {
            let permuted = apply_permutation(records, order)?;
            *records = permuted;
            debug!(target: "routelists::storage", "reorder_full: route='{}' rows={}", route_id, records.len());
            Ok(Change::Changed(()))
        })
    }
}

/// Records taken in `order`. Fails on a length mismatch or a non-permutation.
pub(crate) fn apply_permutation(records: &[Record], order: &[usize]) -> StoreResult<Vec<Record>> {
    if order.len() != records.len() {
        return Err(StoreError::LengthMismatch { expected: records.len(), actual: order.len() });
    }
    let mut seen = vec![false; records.len()];
    for &i in order {
        if i >= records.len() || seen[i] {
            return Err(StoreError::InvalidPermutation);
        }
        seen[i] = true;
    }
    Ok(order.iter().map(|&i| records[i].clone()).collect())
}
