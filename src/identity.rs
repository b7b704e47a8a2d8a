//! Identity key assignment.
//!
//! Derives the stable composite key `"{source_path}:{ordinal}"` for every
//! unit in a pass, where the ordinal counts units of the same source since
//! the last different source was seen. Re-running over the same ordered
//! input produces byte-identical keys, which is what lets the
//! reconciliation engine address individual records for replacement.

use crate::models::DocUnit;

/// Assign identity keys to an ordered slice of units, in place.
///
/// The ordinal resets to 0 whenever `source_path` changes, so callers
/// must present same-source runs contiguously; that is a precondition,
/// not something the assigner fixes. A unit without a `source_path` keys
/// under the literal `"None"`.
///
/// Also copies the run head's freshness marker onto every member, which
/// keeps staleness file-granular: all units of one source carry one
/// marker, whatever a caller stamped on individual chunks.
pub fn assign_identity_keys(units: &mut [DocUnit]) {
    let mut last_path: Option<String> = None;
    let mut ordinal: usize = 0;
    let mut run_marker = None;

    for unit in units.iter_mut() {
        let path = unit.source_path_str().to_string();

        if last_path.as_deref() == Some(path.as_str()) {
            ordinal += 1;
        } else {
            ordinal = 0;
            run_marker = unit.freshness_marker;
        }

        unit.freshness_marker = run_marker;
        unit.identity_key = format!("{}:{}", path, ordinal);
        last_path = Some(path);
    }
}
