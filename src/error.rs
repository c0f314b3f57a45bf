// Error taxonomy for the sync pipeline
// Fatal vs per-entry vs per-submission failures are distinct variants so
// callers can decide what aborts a run and what is merely logged.

use thiserror::Error;

/// All errors surfaced by the sync library.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Sink rejected the login. Fatal for the whole run.
    #[error("authentication with sink failed: {0}")]
    Authentication(String),

    /// An entry of a recognized category is missing a field it must have.
    /// Indicates an upstream schema change or a data-quality problem, so it
    /// aborts processing of the batch.
    #[error("{category} entry is missing required field '{field}'")]
    MissingField { category: String, field: String },

    /// A bathroom entry carried a classification string we cannot map to a
    /// diaper type. Per-entry: a batch caller may log it and keep going.
    #[error("unsupported diaper classification: '{0}'")]
    UnsupportedClassification(String),

    /// Sink did not answer a transaction post with the created status.
    /// Non-fatal for the run; only that one transaction is lost.
    #[error("sink rejected transaction submission (status {status})")]
    Submission { status: u16 },

    /// Source response carried no events at all.
    #[error("source response contained no events")]
    NoEvents,

    /// No daily report with entries exists for the requested date.
    /// A quiet day, not a failure; the run terminates gracefully.
    #[error("no daily report with entries for {0}")]
    EmptyReport(String),

    /// A sync envelope payload could not be decoded or encoded.
    #[error("invalid sync payload: {0}")]
    Payload(String),

    /// Transport-level HTTP failure.
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),
}

impl SyncError {
    /// Shorthand for a missing-field error.
    pub fn missing_field(category: &str, field: &str) -> Self {
        SyncError::MissingField {
            category: category.to_string(),
            field: field.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
