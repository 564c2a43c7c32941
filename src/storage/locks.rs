//! Per-route mutual exclusion.
//!
//! Every load-mutate-persist sequence on a route runs while holding that route's
//! lock, so two requests touching the same route are serialized. Different routes
//! never contend. Locks are created on first use and live for the process.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

#[derive(Clone, Default)]
pub struct RouteLocks {
    inner: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl RouteLocks {
    pub fn new() -> Self { Self::default() }

    /// Lock handle for a route id. Callers hold `handle.lock()` for the whole sequence.
    pub fn handle(&self, route_id: &str) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock();
        map.entry(route_id.to_string()).or_default().clone()
    }

    /// Handles for two routes in a stable order (by id), so callers that lock
    /// both cannot deadlock against each other.
    pub fn pair(&self, a: &str, b: &str) -> (Arc<Mutex<()>>, Arc<Mutex<()>>) {
        if a <= b { (self.handle(a), self.handle(b)) } else { (self.handle(b), self.handle(a)) }
    }
}
