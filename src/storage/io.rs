use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use polars::prelude::*;
use tracing::{debug, warn};

use super::paths::{corrupt_backup_path, orphan_backup_path, temp_path};
use super::schema::{empty_frame, frame_from_records, records_from_frame, Record};
use super::RecordStore;
use crate::error::{StoreError, StoreResult};
use crate::registry::RouteConfig;
use crate::tprintln;

/// Records read from one route file.
///
/// `recovered` is set when the file existed but could not be parsed and the empty
/// canonical set was substituted; the next write copies the unreadable file aside.
pub(crate) struct LoadedRoute {
    pub records: Vec<Record>,
    pub recovered: bool,
}

/// Read a route file with every column as a string.
pub(crate) fn read_table(path: &Path) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
}

/// Replace `path` with whatever `fill` writes, going through a sibling temp file
/// and a rename so readers never observe a half-written file.
pub(crate) fn write_atomic<F>(path: &Path, fill: F) -> StoreResult<()>
where
    F: FnOnce(&mut fs::File) -> StoreResult<()>,
{
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = temp_path(path);
    let written: StoreResult<()> = (|| {
        let mut file = fs::File::create(&tmp)?;
        fill(&mut file)?;
        file.sync_all()?;
        Ok(())
    })();
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Rewrite a whole route file from a frame, header row included.
pub(crate) fn write_table(path: &Path, df: &mut DataFrame) -> StoreResult<()> {
    let __t0 = std::time::Instant::now();
    let rows = df.height();
    write_atomic(path, |file| {
        CsvWriter::new(file).include_header(true).finish(df)?;
        Ok(())
    })?;
    tprintln!("[STORAGE] write_table: path='{}' rows={} took={:?}", path.display(), rows, __t0.elapsed());
    Ok(())
}

/// Create an empty route file with the canonical header if none exists yet.
/// Returns true when a file was created.
pub(crate) fn init_route_file(path: &Path) -> StoreResult<bool> {
    if path.exists() {
        return Ok(false);
    }
    write_table(path, &mut empty_frame()?)?;
    debug!(target: "routelists::storage", "init_route_file: created empty route file '{}'", path.display());
    Ok(true)
}

fn backup_stamp() -> String {
    Utc::now().format("%Y%m%dT%H%M%S%.3fZ").to_string()
}

/// Start a route file from the empty record set. An existing file at `path` is
/// renamed to an `.orphan-<stamp>` sibling first; its new path is returned.
pub(crate) fn reset_route_file(path: &Path) -> StoreResult<Option<PathBuf>> {
    let moved = if path.exists() {
        let backup = orphan_backup_path(path, &backup_stamp());
        fs::rename(path, &backup)?;
        warn!(
            target: "routelists::storage",
            "moved leftover route file '{}' aside to '{}'",
            path.display(),
            backup.display()
        );
        Some(backup)
    } else {
        None
    };
    init_route_file(path)?;
    Ok(moved)
}

impl RecordStore {
    /// Load one route's records. Must be called with the route lock held.
    pub(crate) fn read_route(&self, route: &RouteConfig) -> StoreResult<LoadedRoute> {
        let path = self.route_file(route);
        if init_route_file(&path)? {
            return Ok(LoadedRoute { records: Vec::new(), recovered: false });
        }
        let parsed = read_table(&path)
            .map_err(StoreError::from)
            .and_then(|df| records_from_frame(&df));
        match parsed {
            Ok(records) => {
                tprintln!("[STORAGE] read_route: route='{}' rows={}", route.id, records.len());
                Ok(LoadedRoute { records, recovered: false })
            }
            Err(e) => {
                warn!(
                    target: "routelists::storage",
                    "route '{}' file '{}' is unreadable, using an empty record set: {}",
                    route.id,
                    path.display(),
                    e
                );
                Ok(LoadedRoute { records: Vec::new(), recovered: true })
            }
        }
    }

    /// Persist the full record sequence of a route. Must be called with the route lock held.
    pub(crate) fn write_route(&self, route: &RouteConfig, records: &[Record], recovered: bool) -> StoreResult<()> {
        let path = self.route_file(route);
        if recovered && path.exists() {
            let backup = corrupt_backup_path(&path, &backup_stamp());
            fs::copy(&path, &backup)?;
            warn!(
                target: "routelists::storage",
                "route '{}': preserved unreadable file as '{}' before rewriting",
                route.id,
                backup.display()
            );
        }
        let mut df = frame_from_records(records)?;
        write_table(&path, &mut df)?;
        debug!(target: "routelists::storage", "write_route: route='{}' rows={}", route.id, records.len());
        Ok(())
    }
}
