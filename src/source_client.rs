// 🌐 Source client - daycare reporting service (read-only)
// One authenticated query: date-ranged event listing. Session auth rides on
// a cookie header captured outside this tool (browser-cookie extraction is
// an external collaborator).

use crate::error::{Result, SyncError};
use crate::report::{select_daily_report, DailyReport, EventsResponse};
use reqwest::blocking::Client;
use reqwest::header;
use std::time::Duration;

pub const DEFAULT_SOURCE_URL: &str = "https://www.tadpoles.com";

const EVENTS_PATH: &str = "/remote/v1/events";
const CLIENT_TAG: &str = "dashboard.com/parents";
const MAX_EVENTS: u32 = 300;

pub struct SourceClient {
    http: Client,
    base_url: String,
    cookie: String,
}

impl SourceClient {
    /// `cookie` is the raw Cookie header value of an existing dashboard
    /// session.
    pub fn new(base_url: impl Into<String>, cookie: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(SourceClient {
            http,
            base_url: base_url.into(),
            cookie: cookie.into(),
        })
    }

    /// Fetch every event container in the epoch-second range.
    pub fn fetch_events(&self, earliest: i64, latest: i64) -> Result<Vec<DailyReport>> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, EVENTS_PATH))
            .header(header::COOKIE, &self.cookie)
            .query(&[
                ("direction", "range".to_string()),
                ("earliest_event_time", earliest.to_string()),
                ("latest_event_time", latest.to_string()),
                ("num_events", MAX_EVENTS.to_string()),
                ("client", CLIENT_TAG.to_string()),
            ])
            .send()?;

        let body: EventsResponse = response.json()?;
        body.events.ok_or(SyncError::NoEvents)
    }

    /// Fetch and select the daily report to sync for `date` (YYYY-MM-DD).
    pub fn daily_report(&self, date: &str, earliest: i64, latest: i64) -> Result<DailyReport> {
        let events = self.fetch_events(earliest, latest)?;

        let report = select_daily_report(&events, date)
            .ok_or_else(|| SyncError::EmptyReport(date.to_string()))?;

        if report.entries.is_empty() {
            return Err(SyncError::EmptyReport(date.to_string()));
        }

        tracing::info!(
            date,
            entries = report.entries.len(),
            "selected daily report"
        );

        Ok(report.clone())
    }
}
