//! Route registry and its persistence.
//! The registry is one JSON document mapping route id to `{title, storageName}`.
//! It is read from disk on every call and rewritten whole on every mutation
//! (last writer wins). A missing document is seeded with the default routes.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::storage::io::{reset_route_file, write_atomic};

pub const DEFAULT_REGISTRY_FILE: &str = "routes.json";
pub const DEFAULT_STORAGE_PREFIX: &str = "coleta_";
pub const ROUTE_FILE_EXTENSION: &str = "csv";

/// Routes registered on first run: (id, title).
const DEFAULT_ROUTES: &[(&str, &str)] = &[
    ("campo_grande", "Coleta Campo Grande"),
    ("everton", "Coleta Everton"),
    ("jairo", "Coleta Jairo"),
    ("moises", "Coleta Moises"),
    ("paulo", "Coleta Paulo"),
    ("yago", "Coleta Yago"),
    ("barra_manha", "Coleta Barra Manhã"),
    ("rio_design_manha", "Coleta RioDesign Manhã"),
    ("yago_jairo", "Coleta Yago + Jairo"),
];

/// Metadata of one route.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RouteConfig {
    pub id: String,
    pub title: String,
    /// File name of the route's backing file, relative to the data root.
    pub storage_name: String,
}

/// Persisted value for one id; the id itself is the map key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RouteEntry {
    title: String,
    storage_name: String,
}

pub type RouteMap = BTreeMap<String, RouteConfig>;

/// Derive a route id from a display title.
///
/// Lower-cases and trims, drops everything except letters, digits, whitespace,
/// hyphens and underscores, then collapses runs of whitespace/hyphen/underscore
/// into one underscore. Leading and trailing underscores are removed.
pub fn slugify(title: &str) -> String {
    static STRIP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\p{N}\s_-]").unwrap());
    static COLLAPSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s_-]+").unwrap());
    let lowered = title.trim().to_lowercase();
    let stripped = STRIP.replace_all(&lowered, "");
    let collapsed = COLLAPSE.replace_all(&stripped, "_");
    collapsed.trim_matches('_').to_string()
}

#[derive(Clone)]
pub struct RouteRegistry {
    data_root: PathBuf,
    registry_file: PathBuf,
    storage_prefix: String,
    guard: Arc<Mutex<()>>,
}

impl RouteRegistry {
    /// Registry stored as `registry_file` under `data_root`; new routes get
    /// storage names `<storage_prefix><id>.csv`.
    pub fn new(data_root: impl AsRef<Path>, registry_file: &str, storage_prefix: &str) -> Self {
        let data_root = data_root.as_ref().to_path_buf();
        Self {
            registry_file: data_root.join(registry_file),
            data_root,
            storage_prefix: storage_prefix.to_string(),
            guard: Arc::new(Mutex::new(())),
        }
    }

    /// Registry with the default file name and storage prefix.
    pub fn open(data_root: impl AsRef<Path>) -> Self {
        Self::new(data_root, DEFAULT_REGISTRY_FILE, DEFAULT_STORAGE_PREFIX)
    }

    pub fn data_root(&self) -> &Path { &self.data_root }

    pub fn registry_path(&self) -> &Path { &self.registry_file }

    fn storage_name_for(&self, id: &str) -> String {
        format!("{}{}.{}", self.storage_prefix, id, ROUTE_FILE_EXTENSION)
    }

    fn default_routes(&self) -> RouteMap {
        DEFAULT_ROUTES
            .iter()
            .map(|(id, title)| {
                let cfg = RouteConfig { id: id.to_string(), title: title.to_string(), storage_name: self.storage_name_for(id) };
                (id.to_string(), cfg)
            })
            .collect()
    }

    fn load_unlocked(&self) -> StoreResult<RouteMap> {
        if !self.registry_file.exists() {
            let seeded = self.default_routes();
            self.save_unlocked(&seeded)?;
            info!(
                target: "routelists::registry",
                "no route registry at '{}', seeded {} default routes",
                self.registry_file.display(),
                seeded.len()
            );
            return Ok(seeded);
        }
        let text = std::fs::read_to_string(&self.registry_file)?;
        let entries: BTreeMap<String, RouteEntry> = serde_json::from_str(&text).map_err(|e| {
            StoreError::Registry(format!("'{}' is not a valid route registry: {}", self.registry_file.display(), e))
        })?;
        Ok(entries
            .into_iter()
            .map(|(id, e)| {
                let cfg = RouteConfig { id: id.clone(), title: e.title, storage_name: e.storage_name };
                (id, cfg)
            })
            .collect())
    }

    fn save_unlocked(&self, routes: &RouteMap) -> StoreResult<()> {
        let entries: BTreeMap<&str, RouteEntry> = routes
            .values()
            .map(|r| (r.id.as_str(), RouteEntry { title: r.title.clone(), storage_name: r.storage_name.clone() }))
            .collect();
        let bytes = serde_json::to_vec_pretty(&entries)?;
        write_atomic(&self.registry_file, |file| {
            file.write_all(&bytes)?;
            Ok(())
        })?;
        debug!(target: "routelists::registry", "saved {} routes to '{}'", routes.len(), self.registry_file.display());
        Ok(())
    }

    /// All routes keyed by id, seeding the defaults when nothing is persisted yet.
    pub fn load(&self) -> StoreResult<RouteMap> {
        let _g = self.guard.lock();
        self.load_unlocked()
    }

    /// Overwrite the persisted registry with `routes`.
    pub fn save(&self, routes: &RouteMap) -> StoreResult<()> {
        let _g = self.guard.lock();
        self.save_unlocked(routes)
    }

    /// Routes in id order.
    pub fn list(&self) -> StoreResult<Vec<RouteConfig>> {
        Ok(self.load()?.into_values().collect())
    }

    pub fn get(&self, id: &str) -> StoreResult<Option<RouteConfig>> {
        Ok(self.load()?.remove(id))
    }

    /// Register a route derived from `title` with an empty backing file. A file left
    /// behind by a removed route of the same id is moved aside, not reused.
    /// Returns None when the derived id is empty or already registered.
    pub fn create(&self, title: &str) -> StoreResult<Option<RouteConfig>> {
        let id = slugify(title);
        if id.is_empty() {
            debug!(target: "routelists::registry", "create: title '{}' yields an empty id", title);
            return Ok(None);
        }
        let _g = self.guard.lock();
        let mut routes = self.load_unlocked()?;
        if routes.contains_key(&id) {
            debug!(target: "routelists::registry", "create: route '{}' already exists", id);
            return Ok(None);
        }
        let cfg = RouteConfig { id: id.clone(), title: title.trim().to_string(), storage_name: self.storage_name_for(&id) };
        // The file must be in place before the id becomes visible to readers.
        reset_route_file(&self.data_root.join(&cfg.storage_name))?;
        routes.insert(id.clone(), cfg.clone());
        self.save_unlocked(&routes)?;
        info!(target: "routelists::registry", "created route '{}' ({})", cfg.id, cfg.storage_name);
        Ok(Some(cfg))
    }

    /// Change a route's title. Returns None when the id is unknown or the title is blank.
    pub fn rename(&self, id: &str, new_title: &str) -> StoreResult<Option<RouteConfig>> {
        let title = new_title.trim();
        if title.is_empty() {
            return Ok(None);
        }
        let _g = self.guard.lock();
        let mut routes = self.load_unlocked()?;
        let Some(cfg) = routes.get_mut(id) else { return Ok(None); };
        cfg.title = title.to_string();
        let updated = cfg.clone();
        self.save_unlocked(&routes)?;
        info!(target: "routelists::registry", "renamed route '{}' to '{}'", id, title);
        Ok(Some(updated))
    }

    /// Unregister a route. Its backing file stays on disk.
    pub fn remove(&self, id: &str) -> StoreResult<bool> {
        let _g = self.guard.lock();
        let mut routes = self.load_unlocked()?;
        let Some(cfg) = routes.remove(id) else { return Ok(false); };
        self.save_unlocked(&routes)?;
        info!(target: "routelists::registry", "removed route '{}', file '{}' left in place", id, cfg.storage_name);
        Ok(true)
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod registry_tests;
