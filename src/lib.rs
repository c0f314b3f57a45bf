// Daycare Sync - Core Library
// Mirrors a day's daycare report (diapers, meals, naps) into a parental
// tracking app without creating duplicates.

pub mod config;
pub mod error;
pub mod normalizer;
pub mod reconciler;
pub mod report;
pub mod sink;
pub mod sink_client;
pub mod source_client;
pub mod sync;

// Re-export commonly used types
pub use config::{AppConfig, BabyProfile, Credentials};
pub use error::{Result, SyncError};
pub use normalizer::{
    DiaperType, EventNormalizer, Transaction, TransactionKind, TIME_FORMAT, UNKNOWN_ACTOR,
};
pub use reconciler::Reconciler;
pub use report::{select_daily_report, DailyReport, EventsResponse, RawEntry};
pub use sink::{transaction_from_payload, OpCode, SinkRecord, SyncEnvelope, VolumeMeasure};
pub use sink_client::{Device, SinkClient, DEFAULT_SINK_URL};
pub use source_client::{SourceClient, DEFAULT_SOURCE_URL};
pub use sync::{plan, run, SyncOutcome, SyncPlan};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
