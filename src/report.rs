// 📋 Source report model
// Raw shapes returned by the daycare reporting service, plus the
// largest-report selection rule.

use serde::{Deserialize, Serialize};

// ============================================================================
// RAW ENTRY
// ============================================================================

/// One activity record as the daycare service returns it.
///
/// Everything beyond the category tag is optional: which fields are present
/// depends on the category, and the service omits rather than nulls most of
/// them. Timestamps are epoch seconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEntry {
    /// Category tag: "bathroom" | "food" | "nap" | "note" | "activity"
    #[serde(rename = "type", default)]
    pub category: String,

    pub start_time: Option<i64>,
    pub end_time: Option<i64>,

    // Actor information (resolved by the normalizer)
    pub actor: Option<String>,
    pub prepared_actor: Option<String>,
    pub parent: Option<bool>,

    // bathroom-specific
    pub classification: Option<String>,

    // food-specific
    pub quantity: Option<f64>,
    pub amount_offered: Option<f64>,
    pub contents: Option<String>,
}

// ============================================================================
// DAILY REPORT
// ============================================================================

/// A Source event container. Only containers with `type == "DailyReport"`
/// carry entries we care about; other event types deserialize to empty shells.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailyReport {
    #[serde(rename = "type", default)]
    pub event_type: String,

    pub event_date: Option<String>,

    #[serde(default)]
    pub entries: Vec<RawEntry>,
}

impl DailyReport {
    pub fn is_daily_report(&self) -> bool {
        self.event_type == "DailyReport"
    }

    pub fn matches_date(&self, date: &str) -> bool {
        self.is_daily_report() && self.event_date.as_deref() == Some(date)
    }
}

/// Outer envelope of the Source events query.
#[derive(Debug, Clone, Deserialize)]
pub struct EventsResponse {
    pub events: Option<Vec<DailyReport>>,
}

// ============================================================================
// REPORT SELECTION
// ============================================================================

/// Pick the daily report to sync for a date.
///
/// The service sometimes returns several DailyReport containers for the same
/// date (partial revisions). The one with the most entries wins; ties go to
/// the first one encountered.
pub fn select_daily_report<'a>(events: &'a [DailyReport], date: &str) -> Option<&'a DailyReport> {
    let mut best: Option<&DailyReport> = None;

    for event in events.iter().filter(|e| e.matches_date(date)) {
        let better = match best {
            Some(current) => event.entries.len() > current.entries.len(),
            None => true,
        };
        if better {
            best = Some(event);
        }
    }

    best
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn report(event_type: &str, date: &str, entry_count: usize) -> DailyReport {
        DailyReport {
            event_type: event_type.to_string(),
            event_date: Some(date.to_string()),
            entries: vec![RawEntry::default(); entry_count],
        }
    }

    #[test]
    fn test_largest_report_wins() {
        let events = vec![
            report("DailyReport", "2019-08-09", 2),
            report("DailyReport", "2019-08-09", 5),
            report("DailyReport", "2019-08-09", 3),
        ];

        let selected = select_daily_report(&events, "2019-08-09").unwrap();
        assert_eq!(selected.entries.len(), 5);
    }

    #[test]
    fn test_tie_first_one_wins() {
        let mut first = report("DailyReport", "2019-08-09", 4);
        first.entries[0].category = "marker".to_string();
        let events = vec![first, report("DailyReport", "2019-08-09", 4)];

        let selected = select_daily_report(&events, "2019-08-09").unwrap();
        assert_eq!(selected.entries[0].category, "marker");
    }

    #[test]
    fn test_other_dates_and_types_ignored() {
        let events = vec![
            report("DailyReport", "2019-08-08", 9),
            report("Photo", "2019-08-09", 9),
        ];

        assert!(select_daily_report(&events, "2019-08-09").is_none());
    }

    #[test]
    fn test_deserialize_tolerates_unknown_event_shapes() {
        let json = r#"{"events": [
            {"type": "Photo", "key": "abc123"},
            {"type": "DailyReport", "event_date": "2019-08-09",
             "entries": [{"type": "bathroom", "start_time": 1565355600,
                          "classification": "BM", "parent": false}]}
        ]}"#;

        let response: EventsResponse = serde_json::from_str(json).unwrap();
        let events = response.events.unwrap();
        assert_eq!(events.len(), 2);

        let selected = select_daily_report(&events, "2019-08-09").unwrap();
        assert_eq!(selected.entries.len(), 1);
        assert_eq!(selected.entries[0].classification.as_deref(), Some("BM"));
    }
}
