//! Duplicate detection against the entries already present in the ledger.

use tracing::info;

use crate::model::Entry;

/// Accepted and rejected halves of a candidate batch.
#[derive(Debug, Default)]
pub struct Partition {
    pub accepted: Vec<Entry>,
    pub duplicates: Vec<Entry>,
}

/// A candidate duplicates an existing entry when calendar date, amount, memo
/// and info are all equal; payee and category are deliberately ignored, they
/// depend on the assignment rules active at import time.
pub fn is_duplicate(candidate: &Entry, existing: &[Entry]) -> bool {
    existing.iter().any(|e| {
        e.date == candidate.date
            && e.amount == candidate.amount
            && e.memo == candidate.memo
            && e.info == candidate.info
    })
}

/// Partitions candidates into accepted entries and duplicates. Neither input
/// is mutated; candidates keep their order in both halves.
pub fn partition(candidates: Vec<Entry>, existing: &[Entry]) -> Partition {
    let mut result = Partition::default();
    for candidate in candidates {
        if is_duplicate(&candidate, existing) {
            result.duplicates.push(candidate);
        } else {
            result.accepted.push(candidate);
        }
    }
    info!(
        accepted = result.accepted.len(),
        duplicates = result.duplicates.len(),
        "candidates classified"
    );
    result
}
