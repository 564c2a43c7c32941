//! Cross-route fuzzy search.
//!
//! Scans every registered route in registry order, then each route's records in
//! file order, and returns the records whose enabled fields reach the threshold.
//! Results are not ranked.

use serde::Serialize;
use tracing::debug;

use crate::error::StoreResult;
use crate::storage::{Field, Record, RecordStore};

pub mod fuzz;

/// Minimum partial-ratio score (0-100) for a field to match.
pub const DEFAULT_THRESHOLD: f64 = 70.0;

/// Fields a search may look at.
pub const SEARCHABLE_FIELDS: [Field; 2] = [Field::Company, Field::Address];

/// One matching record with enough context to act on it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub route_id: String,
    pub route_title: String,
    /// Position of the record in its route at scan time.
    pub index: usize,
    pub record: Record,
}

/// Keep only searchable fields, without duplicates; an empty selection means all of them.
pub fn effective_fields(requested: &[Field]) -> Vec<Field> {
    let picked: Vec<Field> = SEARCHABLE_FIELDS.into_iter().filter(|f| requested.contains(f)).collect();
    if picked.is_empty() { SEARCHABLE_FIELDS.to_vec() } else { picked }
}

/// Parse a comma separated field list such as `company,address`. Unknown names are skipped.
pub fn parse_fields(raw: &str) -> Vec<Field> {
    raw.split(',').filter_map(Field::parse).collect()
}

/// True when any of `fields` of `record` scores at least `threshold` against the prepared term.
pub fn record_matches(term: &[char], record: &Record, fields: &[Field], threshold: f64) -> bool {
    fields
        .iter()
        .any(|f| fuzz::partial_ratio_chars(term, &fuzz::prepare(record.get(*f))) >= threshold)
}

/// Search all routes. A blank term returns nothing.
pub fn search(store: &RecordStore, term: &str, fields: &[Field], threshold: f64) -> StoreResult<Vec<SearchHit>> {
    let term = term.trim();
    if term.is_empty() {
        return Ok(Vec::new());
    }
    let prepared = fuzz::prepare(term);
    let fields = effective_fields(fields);
    let mut hits = Vec::new();
    for route in store.registry().list()? {
        let records = store.load(&route.id)?;
        for (index, record) in records.into_iter().enumerate() {
            if record_matches(&prepared, &record, &fields, threshold) {
                hits.push(SearchHit { route_id: route.id.clone(), route_title: route.title.clone(), index, record });
            }
        }
    }
    debug!(target: "routelists::search", "search: term='{}' fields={:?} hits={}", term, fields, hits.len());
    Ok(hits)
}
