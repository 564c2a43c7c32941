use std::path::{Path, PathBuf};

use super::RecordStore;
use crate::registry::RouteConfig;

/// Sibling path used while a route file or the registry is being rewritten.
pub(crate) fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Where an unreadable route file is copied before it gets overwritten.
pub(crate) fn corrupt_backup_path(path: &Path, stamp: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".corrupt-{}", stamp));
    path.with_file_name(name)
}

/// Where a leftover file of an unregistered route is moved when its id is reused.
pub(crate) fn orphan_backup_path(path: &Path, stamp: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".orphan-{}", stamp));
    path.with_file_name(name)
}

impl RecordStore {
    /// Backing file for a route, under the data root.
    pub(crate) fn route_file(&self, route: &RouteConfig) -> PathBuf {
        self.root.join(&route.storage_name)
    }
}
