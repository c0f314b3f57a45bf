// ⚖️ Reconciler - set difference between candidate and existing transactions
// Decides which normalized Source events have not yet been mirrored to Sink.

use crate::normalizer::Transaction;
use std::collections::HashSet;

// ============================================================================
// RECONCILER
// ============================================================================

/// Pure, stateless reconciliation over two small per-day transaction lists.
///
/// Two transactions are the same event iff category label and normalized
/// start_time match exactly. Actor, duration, and payload differences are
/// ignored on purpose: a re-classified diaper on the same timestamp counts
/// as a duplicate and is not resubmitted (preserved behavior, see DESIGN.md).
pub struct Reconciler;

impl Reconciler {
    pub fn new() -> Self {
        Reconciler
    }

    /// Return the candidates whose (type, start_time) key is absent from
    /// `existing`, in candidate order.
    pub fn filter_new(
        &self,
        candidates: &[Transaction],
        existing: &[Transaction],
    ) -> Vec<Transaction> {
        // Lists are tens of entries at most; the set is for clarity, not speed.
        let seen: HashSet<(&str, &str)> = existing.iter().map(|tx| tx.dedup_key()).collect();

        candidates
            .iter()
            .filter(|tx| !seen.contains(&tx.dedup_key()))
            .cloned()
            .collect()
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
