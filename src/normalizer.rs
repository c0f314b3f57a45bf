// 🔄 Event Normalizer - RawEntry → canonical Transaction
// Category-tagged dispatch over the three event kinds we mirror; note and
// activity entries never make it past this layer.

use crate::error::{Result, SyncError};
use crate::report::RawEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel actor when the entry carries no actor information at all.
pub const UNKNOWN_ACTOR: &str = "unknown";

/// Fixed textual form for every normalized timestamp (UTC).
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S +0000";

// ============================================================================
// CANONICAL TRANSACTION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiaperType {
    Wet,
    Dry,
    Dirty,
    Mixed,
}

impl DiaperType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiaperType::Wet => "wet",
            DiaperType::Dry => "dry",
            DiaperType::Dirty => "dirty",
            DiaperType::Mixed => "mixed",
        }
    }
}

/// Type-specific payload of a canonical transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransactionKind {
    Diaper {
        diaper_type: DiaperType,
    },
    Meal {
        quantity: f64,
        amount_offered: Option<f64>,
        contents: Option<String>,
    },
    Nap {
        end_time: String,
        duration_minutes: i64,
    },
}

impl TransactionKind {
    /// Category label, also the first half of the deduplication key.
    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::Diaper { .. } => "diaper",
            TransactionKind::Meal { .. } => "meal",
            TransactionKind::Nap { .. } => "nap",
        }
    }
}

/// Canonical normalized event record, the in-memory bridge between the
/// Source report and the Sink wire schema. Created once per qualifying
/// RawEntry and consumed immediately; nothing persists beyond a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub actor: String,
    pub start_time: String,
    #[serde(flatten)]
    pub kind: TransactionKind,
}

impl Transaction {
    pub fn kind_label(&self) -> &'static str {
        self.kind.label()
    }

    /// The weak deduplication key: category label + normalized start time.
    /// Deliberately ignores actor and payload (see DESIGN.md).
    pub fn dedup_key(&self) -> (&'static str, &str) {
        (self.kind_label(), self.start_time.as_str())
    }
}

// ============================================================================
// TIME NORMALIZATION
// ============================================================================

/// Render epoch seconds as the fixed UTC textual format.
pub fn format_utc(epoch: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(epoch, 0).map(|ts| ts.format(TIME_FORMAT).to_string())
}

// ============================================================================
// EVENT NORMALIZER
// ============================================================================

pub struct EventNormalizer;

impl EventNormalizer {
    pub fn new() -> Self {
        EventNormalizer
    }

    /// Normalize a batch of raw entries, preserving order.
    ///
    /// Strict variant: the first error (missing field, unsupported
    /// classification) aborts the batch. Pipelines that want to keep going
    /// past a bad classification loop over `normalize_entry` instead.
    pub fn normalize(&self, entries: &[RawEntry]) -> Result<Vec<Transaction>> {
        let mut transactions = Vec::new();

        for entry in entries {
            if let Some(tx) = self.normalize_entry(entry)? {
                transactions.push(tx);
            }
        }

        Ok(transactions)
    }

    /// Normalize a single raw entry.
    ///
    /// Returns `Ok(None)` for entries that legitimately produce no
    /// transaction: note/activity categories, unrecognized categories, and
    /// in-progress naps (no end_time yet).
    pub fn normalize_entry(&self, entry: &RawEntry) -> Result<Option<Transaction>> {
        let kind = match entry.category.as_str() {
            "bathroom" => self.normalize_bathroom(entry)?,
            "food" => self.normalize_food(entry)?,
            "nap" => match self.normalize_nap(entry)? {
                Some(kind) => kind,
                None => return Ok(None), // in-progress nap
            },
            // note, activity, and anything the service adds later
            _ => return Ok(None),
        };

        let start_epoch = entry
            .start_time
            .ok_or_else(|| SyncError::missing_field(&entry.category, "start_time"))?;
        let start_time = format_utc(start_epoch)
            .ok_or_else(|| SyncError::missing_field(&entry.category, "start_time"))?;

        Ok(Some(Transaction {
            actor: resolve_actor(entry),
            start_time,
            kind,
        }))
    }

    /// bathroom → diaper. Classification matched by substring containment,
    /// first match wins: "Wet", then "BM", then "Dry".
    fn normalize_bathroom(&self, entry: &RawEntry) -> Result<TransactionKind> {
        let classification = entry
            .classification
            .as_deref()
            .ok_or_else(|| SyncError::missing_field("bathroom", "classification"))?;

        let diaper_type = if classification.contains("Wet") {
            DiaperType::Wet
        } else if classification.contains("BM") {
            DiaperType::Dirty
        } else if classification.contains("Dry") {
            DiaperType::Dry
        } else {
            return Err(SyncError::UnsupportedClassification(
                classification.to_string(),
            ));
        };

        Ok(TransactionKind::Diaper { diaper_type })
    }

    /// food → meal. Quantity is required; offer and contents pass through.
    fn normalize_food(&self, entry: &RawEntry) -> Result<TransactionKind> {
        let quantity = entry
            .quantity
            .ok_or_else(|| SyncError::missing_field("food", "quantity"))?;

        Ok(TransactionKind::Meal {
            quantity,
            amount_offered: entry.amount_offered,
            contents: entry.contents.clone(),
        })
    }

    /// nap → nap, only when both timestamps exist. A nap without an end_time
    /// is still in progress and produces no transaction (not an error).
    fn normalize_nap(&self, entry: &RawEntry) -> Result<Option<TransactionKind>> {
        let start = entry
            .start_time
            .ok_or_else(|| SyncError::missing_field("nap", "start_time"))?;

        let end = match entry.end_time {
            Some(end) => end,
            None => return Ok(None),
        };

        let end_time = format_utc(end)
            .ok_or_else(|| SyncError::missing_field("nap", "end_time"))?;
        let duration_minutes = (end - start).max(0) / 60;

        Ok(Some(TransactionKind::Nap {
            end_time,
            duration_minutes,
        }))
    }
}

impl Default for EventNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve the display actor for an entry, in priority order:
/// parent flag, then actor, then prepared_actor, then the unknown sentinel.
fn resolve_actor(entry: &RawEntry) -> String {
    if entry.parent == Some(true) {
        return "Parent".to_string();
    }

    if let Some(actor) = entry.actor.as_deref() {
        if !actor.is_empty() {
            return actor.to_string();
        }
    }

    if let Some(prepared) = entry.prepared_actor.as_deref() {
        if !prepared.is_empty() {
            return prepared.to_string();
        }
    }

    UNKNOWN_ACTOR.to_string()
}

// ============================================================================
// TESTS
// ============================================================================
