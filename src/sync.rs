// 🔁 Sync pipeline
// fetch → normalize → fetch-existing → reconcile → submit, strictly
// sequential. The planning half (normalize + reconcile + ordering) is pure
// and lives in `plan` so it can be tested without a network.

use crate::config::BabyProfile;
use crate::error::{Result, SyncError};
use crate::normalizer::{EventNormalizer, Transaction};
use crate::reconciler::Reconciler;
use crate::report::RawEntry;
use crate::sink::SinkRecord;
use crate::sink_client::SinkClient;
use crate::source_client::SourceClient;
use anyhow::Context;
use chrono::NaiveDate;

// ============================================================================
// PLAN
// ============================================================================

/// Result of the pure planning pass over one daily report.
#[derive(Debug, Clone)]
pub struct SyncPlan {
    /// New transactions to submit, sorted by category label for
    /// deterministic output ordering.
    pub transactions: Vec<Transaction>,

    /// Candidates dropped because Sink already has their (type, start_time).
    pub duplicates: usize,

    /// Entries skipped for an unsupported diaper classification.
    pub unclassified: usize,
}

/// Normalize raw entries and reconcile them against what Sink already has.
///
/// Unsupported classifications are logged and counted, not fatal; a missing
/// required field still aborts the batch (schema drift must stay visible).
pub fn plan(entries: &[RawEntry], existing: &[Transaction]) -> Result<SyncPlan> {
    let normalizer = EventNormalizer::new();

    let mut candidates = Vec::new();
    let mut unclassified = 0;

    for entry in entries {
        match normalizer.normalize_entry(entry) {
            Ok(Some(tx)) => candidates.push(tx),
            Ok(None) => {}
            Err(SyncError::UnsupportedClassification(classification)) => {
                tracing::warn!(
                    classification = %classification,
                    "skipping entry with unsupported classification"
                );
                unclassified += 1;
            }
            Err(e) => return Err(e),
        }
    }

    let mut transactions = Reconciler::new().filter_new(&candidates, existing);
    let duplicates = candidates.len() - transactions.len();

    // Stable sort: candidate order is kept within each category.
    transactions.sort_by(|a, b| a.kind_label().cmp(b.kind_label()));

    Ok(SyncPlan {
        transactions,
        duplicates,
        unclassified,
    })
}

// ============================================================================
// RUN
// ============================================================================

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Default)]
pub struct SyncOutcome {
    pub submitted: usize,
    pub failed: usize,
    pub duplicates: usize,
    pub unclassified: usize,
}

impl SyncOutcome {
    pub fn summary(&self) -> String {
        format!(
            "{} submitted, {} failed, {} duplicates skipped, {} unclassified skipped",
            self.submitted, self.failed, self.duplicates, self.unclassified
        )
    }
}

/// Mirror one day's report from Source into Sink.
///
/// A day with no report is a normal outcome, not an error. A failed
/// submission is logged and the run continues with the next transaction.
pub fn run(
    source: &SourceClient,
    sink: &SinkClient,
    baby: &BabyProfile,
    date: &str,
) -> anyhow::Result<SyncOutcome> {
    let (earliest, latest) = day_range(date)?;

    let report = match source.daily_report(date, earliest, latest) {
        Ok(report) => report,
        Err(SyncError::NoEvents) | Err(SyncError::EmptyReport(_)) => {
            tracing::info!(date, "no report to sync");
            return Ok(SyncOutcome::default());
        }
        Err(e) => return Err(e.into()),
    };

    let existing = sink.existing_transactions()?;
    tracing::info!(existing = existing.len(), "fetched existing transactions");

    let sync_plan = plan(&report.entries, &existing)?;

    let mut outcome = SyncOutcome {
        duplicates: sync_plan.duplicates,
        unclassified: sync_plan.unclassified,
        ..SyncOutcome::default()
    };

    for tx in &sync_plan.transactions {
        tracing::info!(
            kind = tx.kind_label(),
            start_time = %tx.start_time,
            actor = %tx.actor,
            "submitting transaction"
        );

        let record = SinkRecord::from_transaction(tx, baby);
        match sink.submit(&record) {
            Ok(()) => outcome.submitted += 1,
            Err(e) => {
                tracing::warn!(error = %e, "submission failed, continuing");
                outcome.failed += 1;
            }
        }
    }

    Ok(outcome)
}

/// Epoch-second bounds of one calendar day (UTC) for the range query.
fn day_range(date: &str) -> anyhow::Result<(i64, i64)> {
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", date))?;

    let start = day
        .and_hms_opt(0, 0, 0)
        .context("Invalid day start")?
        .and_utc()
        .timestamp();

    Ok((start, start + 86_400))
}

// ============================================================================
// TESTS
// ============================================================================
