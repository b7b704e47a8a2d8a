//! Incremental reconciliation engine.
//!
//! Compares the freshly scanned, keyed units against the records already
//! in the vector store and computes the minimal add/delete operation set.
//! The comparison is pure and in-memory; it depends only on the caller
//! having read the store projection beforehand, so re-running a crashed
//! pass from scratch always repairs the index.
//!
//! Staleness is decided per unit by comparing freshness markers. All
//! units of one source share a marker (file-level granularity), so either
//! every unit of a changed source is re-added or none are. The deletion
//! set holds only the exact keys being replaced in this pass: when a
//! document shrinks, the tail keys of the old version survive. That
//! under-delete is inherited behavior; [`reconcile_full`] is the stricter
//! source-scoped delete-then-insert that repairs it.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::models::{DocUnit, IndexedRecord, ReconciliationPlan};

/// Compute the incremental plan for one pass.
///
/// For each fresh unit, in production order:
/// - unknown `source_path` → upsert (new source);
/// - marker strictly newer than the stored group's marker → upsert and
///   delete its own key;
/// - otherwise → untouched. Equal markers never re-index, so an
///   unchanged corpus yields an empty plan.
///
/// A missing marker sorts as oldest: stored-unknown loses to any known
/// fresh marker, and unknown-vs-unknown compares equal (no churn).
pub fn reconcile(fresh: Vec<DocUnit>, existing: &[IndexedRecord]) -> ReconciliationPlan {
    let groups = group_by_source(existing);

    let mut plan = ReconciliationPlan::default();
    for unit in fresh {
        match groups.get(unit.source_path_str()) {
            None => plan.to_upsert.push(unit),
            Some(group_marker) => {
                if unit.freshness_marker > *group_marker {
                    plan.to_delete.insert(unit.identity_key.clone());
                    plan.to_upsert.push(unit);
                }
            }
        }
    }
    plan
}

/// Compute a full-rewrite plan: every fresh unit is upserted and every
/// existing key under a scanned source is deleted first. Marker
/// comparison is skipped entirely. This is the repair path for shrunk
/// documents left behind by the incremental per-key policy.
pub fn reconcile_full(fresh: Vec<DocUnit>, existing: &[IndexedRecord]) -> ReconciliationPlan {
    let scanned: HashSet<&str> = fresh.iter().map(DocUnit::source_path_str).collect();

    let mut plan = ReconciliationPlan::default();
    for record in existing {
        if scanned.contains(record.source_path.as_str()) {
            plan.to_delete.insert(record.identity_key.clone());
        }
    }
    plan.to_upsert = fresh;
    plan
}

/// Index existing records by source path, keeping one marker per group.
///
/// All members of a group carry the same marker by invariant (the store
/// is only ever written a whole source at a time); the first member's
/// marker wins and the rest are not re-verified.
fn group_by_source(existing: &[IndexedRecord]) -> HashMap<&str, Option<DateTime<Utc>>> {
    let mut groups = HashMap::new();
    for record in existing {
        groups
            .entry(record.source_path.as_str())
            .or_insert(record.freshness_marker);
    }
    groups
}
