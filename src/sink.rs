// 📦 Sink wire schema
// Translation between canonical transactions and the records the tracking
// app accepts: discriminated payloads under a BCObjectType tag, wrapped in a
// base64 sync envelope with an operation code and sequence number.

use crate::config::BabyProfile;
use crate::error::{Result, SyncError};
use crate::normalizer::{DiaperType, Transaction, TransactionKind, TIME_FORMAT, UNKNOWN_ACTOR};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Diaper "amount" used for every non-dry diaper. The upstream schema gives
/// this constant no clear meaning; it is preserved as a fixed default
/// (open question, see DESIGN.md).
const DEFAULT_DIAPER_AMOUNT: u8 = 2;

// ============================================================================
// WIRE RECORDS
// ============================================================================

/// Volume payload nested inside a bottle record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeMeasure {
    pub value: f64,
    #[serde(rename = "englishMeasure")]
    pub english_measure: String,
    #[serde(rename = "BCObjectType")]
    pub object_type: String,
}

impl VolumeMeasure {
    pub fn ounces(value: f64) -> Self {
        VolumeMeasure {
            value,
            english_measure: "true".to_string(),
            object_type: "VolumeMeasure".to_string(),
        }
    }
}

/// One transaction record in the form Sink stores it, discriminated by the
/// BCObjectType tag. Field names follow Sink's schema exactly, fixed default
/// fields included.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "BCObjectType")]
pub enum SinkRecord {
    Diaper {
        #[serde(rename = "pooColor")]
        poo_color: u8,
        #[serde(rename = "peeColor")]
        pee_color: u8,
        #[serde(rename = "objectID")]
        object_id: String,
        time: String,
        timestamp: String,
        #[serde(rename = "newFlage")]
        new_flage: String,
        #[serde(rename = "pictureLoaded")]
        picture_loaded: String,
        texture: u8,
        amount: u8,
        baby: BabyProfile,
        flag: u8,
        #[serde(rename = "pictureNote")]
        picture_note: Vec<Value>,
        status: u8,
        note: String,
    },
    Pumped {
        amount: VolumeMeasure,
        note: String,
        time: String,
        #[serde(rename = "newFlage")]
        new_flage: String,
        #[serde(rename = "pictureLoaded")]
        picture_loaded: String,
        #[serde(rename = "pictureNote")]
        picture_note: Vec<Value>,
        timestamp: String,
        baby: BabyProfile,
        #[serde(rename = "objectID")]
        object_id: String,
    },
    Sleep {
        note: String,
        time: String,
        #[serde(rename = "newFlage")]
        new_flage: String,
        #[serde(rename = "pictureLoaded")]
        picture_loaded: String,
        duration: i64,
        #[serde(rename = "pictureNote")]
        picture_note: Vec<Value>,
        timestamp: String,
        baby: BabyProfile,
        #[serde(rename = "objectID")]
        object_id: String,
    },
}

impl SinkRecord {
    /// Translate a canonical transaction into Sink's schema.
    ///
    /// Not fully deterministic: a fresh uppercase object UUID and the current
    /// wall-clock submission timestamp are embedded. Everything else is a
    /// pure function of the transaction and the baby profile.
    pub fn from_transaction(tx: &Transaction, baby: &BabyProfile) -> SinkRecord {
        match &tx.kind {
            TransactionKind::Diaper { diaper_type } => SinkRecord::Diaper {
                poo_color: 5,
                pee_color: 5,
                object_id: new_object_id(),
                time: tx.start_time.clone(),
                timestamp: submission_stamp(),
                new_flage: "true".to_string(),
                picture_loaded: "true".to_string(),
                texture: 5,
                amount: diaper_amount(*diaper_type),
                baby: baby.clone(),
                flag: 0,
                picture_note: Vec::new(),
                status: diaper_status(*diaper_type),
                note: format!("Diaper changed by {}", tx.actor),
            },
            TransactionKind::Meal {
                quantity,
                amount_offered,
                ..
            } => {
                let note = match amount_offered {
                    Some(offered) => format!("Fed by {} (offered {}oz)", tx.actor, offered),
                    None => format!("Fed by {}", tx.actor),
                };

                SinkRecord::Pumped {
                    amount: VolumeMeasure::ounces(*quantity),
                    note,
                    time: tx.start_time.clone(),
                    new_flage: "true".to_string(),
                    picture_loaded: "true".to_string(),
                    picture_note: Vec::new(),
                    timestamp: submission_stamp(),
                    baby: baby.clone(),
                    object_id: new_object_id(),
                }
            }
            TransactionKind::Nap {
                end_time,
                duration_minutes,
            } => SinkRecord::Sleep {
                note: format!("Woke up at {}", end_time),
                time: tx.start_time.clone(),
                new_flage: "true".to_string(),
                picture_loaded: "true".to_string(),
                duration: *duration_minutes,
                picture_note: Vec::new(),
                timestamp: submission_stamp(),
                baby: baby.clone(),
                object_id: new_object_id(),
            },
        }
    }

    pub fn note(&self) -> &str {
        match self {
            SinkRecord::Diaper { note, .. } => note,
            SinkRecord::Pumped { note, .. } => note,
            SinkRecord::Sleep { note, .. } => note,
        }
    }

    pub fn time(&self) -> &str {
        match self {
            SinkRecord::Diaper { time, .. } => time,
            SinkRecord::Pumped { time, .. } => time,
            SinkRecord::Sleep { time, .. } => time,
        }
    }
}

/// Sink diaper status codes: 0 wet (or dry with amount 0), 1 dirty, 2 mixed.
fn diaper_status(diaper_type: DiaperType) -> u8 {
    match diaper_type {
        DiaperType::Wet | DiaperType::Dry => 0,
        DiaperType::Dirty => 1,
        DiaperType::Mixed => 2,
    }
}

/// Dry diapers carry amount 0; everything else the fixed default.
fn diaper_amount(diaper_type: DiaperType) -> u8 {
    match diaper_type {
        DiaperType::Dry => 0,
        _ => DEFAULT_DIAPER_AMOUNT,
    }
}

fn new_object_id() -> String {
    Uuid::new_v4().to_string().to_uppercase()
}

fn submission_stamp() -> String {
    Utc::now().format(TIME_FORMAT).to_string()
}

// ============================================================================
// SYNC ENVELOPE
// ============================================================================

/// Operation code tagged on every envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    New,
    Update,
    Delete,
}

impl OpCode {
    pub fn code(self) -> u8 {
        match self {
            OpCode::New => 0,
            OpCode::Update => 1,
            OpCode::Delete => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<OpCode> {
        match code {
            0 => Some(OpCode::New),
            1 => Some(OpCode::Update),
            2 => Some(OpCode::Delete),
            _ => None,
        }
    }
}

/// Outer envelope Sink exchanges on its transaction endpoints: the record as
/// base64-encoded JSON, an operation code, and the per-device sequence number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncEnvelope {
    #[serde(rename = "OPCode")]
    pub op_code: u8,

    #[serde(rename = "Transaction")]
    pub transaction: String,

    #[serde(rename = "SyncID")]
    pub sync_id: i64,
}

impl SyncEnvelope {
    pub fn new(record: &SinkRecord, op_code: OpCode, sync_id: i64) -> Result<Self> {
        let json = serde_json::to_vec(record).map_err(|e| SyncError::Payload(e.to_string()))?;

        Ok(SyncEnvelope {
            op_code: op_code.code(),
            transaction: BASE64.encode(json),
            sync_id,
        })
    }

    pub fn is_delete(&self) -> bool {
        self.op_code == OpCode::Delete.code()
    }

    /// Decode the base64 payload into untyped JSON. Untyped because Sink
    /// devices also sync object types this tool never writes.
    pub fn decode_payload(&self) -> Result<Value> {
        let bytes = BASE64
            .decode(&self.transaction)
            .map_err(|e| SyncError::Payload(e.to_string()))?;

        serde_json::from_slice(&bytes).map_err(|e| SyncError::Payload(e.to_string()))
    }
}

// ============================================================================
// EXISTING-TRANSACTION RECONSTRUCTION
// ============================================================================

/// Map a decoded Sink payload back to a canonical transaction for
/// reconciliation.
///
/// Returns None for object types outside the three mirrored categories
/// (baby profiles, milestones, and whatever else other devices sync).
/// The actor is not recoverable from the wire record, so the sentinel is
/// used; reconciliation only looks at the (type, start_time) key anyway.
pub fn transaction_from_payload(payload: &Value) -> Option<Transaction> {
    let object_type = payload.get("BCObjectType")?.as_str()?;
    let time = payload.get("time")?.as_str()?.to_string();

    let kind = match object_type {
        "Diaper" => {
            let status = payload.get("status").and_then(Value::as_u64).unwrap_or(0);
            let amount = payload.get("amount").and_then(Value::as_u64).unwrap_or(0);

            let diaper_type = match status {
                1 => DiaperType::Dirty,
                2 => DiaperType::Mixed,
                _ if amount == 0 => DiaperType::Dry,
                _ => DiaperType::Wet,
            };

            TransactionKind::Diaper { diaper_type }
        }
        "Pumped" => {
            let quantity = payload
                .get("amount")
                .and_then(|a| a.get("value"))
                .and_then(Value::as_f64)
                .unwrap_or(0.0);

            TransactionKind::Meal {
                quantity,
                amount_offered: None,
                contents: None,
            }
        }
        "Sleep" => {
            let duration_minutes = payload
                .get("duration")
                .and_then(Value::as_i64)
                .unwrap_or(0);

            TransactionKind::Nap {
                end_time: wake_time(&time, duration_minutes),
                duration_minutes,
            }
        }
        _ => return None,
    };

    Some(Transaction {
        actor: UNKNOWN_ACTOR.to_string(),
        start_time: time,
        kind,
    })
}

/// Sleep records store start + duration; derive the wake-up time. Falls back
/// to the start string if the stored time is not in the expected format.
fn wake_time(start_time: &str, duration_minutes: i64) -> String {
    match DateTime::parse_from_str(start_time, "%Y-%m-%d %H:%M:%S %z") {
        Ok(start) => (start.with_timezone(&Utc) + Duration::minutes(duration_minutes))
            .format(TIME_FORMAT)
            .to_string(),
        Err(_) => start_time.to_string(),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn baby() -> BabyProfile {
        BabyProfile::from_value(json!({
            "dueDay": "2019-02-01",
            "BCObjectType": "Baby",
            "gender": 0,
            "pictureName": "",
            "dob": "2019-02-03",
            "newFlage": "false",
            "timestamp": "2019-02-03 12:00:00 +0000",
            "name": "Sam",
            "objectID": "0E4B3C31-2D6F-4E0A-93A4-80E05DB1B4D1"
        }))
        .unwrap()
    }

    fn diaper_tx(diaper_type: DiaperType) -> Transaction {
        Transaction {
            actor: "Parent".to_string(),
            start_time: "2019-08-09 13:00:00 +0000".to_string(),
            kind: TransactionKind::Diaper { diaper_type },
        }
    }

    #[test]
    fn test_diaper_record_fields() {
        let record = SinkRecord::from_transaction(&diaper_tx(DiaperType::Dirty), &baby());
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["BCObjectType"], "Diaper");
        assert_eq!(value["status"], 1);
        assert_eq!(value["amount"], 2);
        assert_eq!(value["pooColor"], 5);
        assert_eq!(value["peeColor"], 5);
        assert_eq!(value["texture"], 5);
        assert_eq!(value["flag"], 0);
        assert_eq!(value["newFlage"], "true");
        assert_eq!(value["pictureLoaded"], "true");
        assert_eq!(value["pictureNote"], json!([]));
        assert_eq!(value["time"], "2019-08-09 13:00:00 +0000");
        assert_eq!(value["note"], "Diaper changed by Parent");
        assert_eq!(value["baby"]["name"], "Sam");

        // Generated fields: opaque, just shaped right
        let object_id = value["objectID"].as_str().unwrap();
        assert_eq!(object_id, object_id.to_uppercase());
        assert!(Uuid::parse_str(object_id).is_ok());
        assert!(value["timestamp"].as_str().unwrap().ends_with("+0000"));
    }

    #[test]
    fn test_dry_diaper_amount_zero() {
        let record = SinkRecord::from_transaction(&diaper_tx(DiaperType::Dry), &baby());
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["status"], 0);
        assert_eq!(value["amount"], 0);

        // wet shares status 0 but keeps the default amount
        let record = SinkRecord::from_transaction(&diaper_tx(DiaperType::Wet), &baby());
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["status"], 0);
        assert_eq!(value["amount"], 2);

        let record = SinkRecord::from_transaction(&diaper_tx(DiaperType::Mixed), &baby());
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["status"], 2);
    }

    #[test]
    fn test_meal_notes() {
        let mut tx = Transaction {
            actor: "Grandma".to_string(),
            start_time: "2019-08-09 16:00:00 +0000".to_string(),
            kind: TransactionKind::Meal {
                quantity: 4.5,
                amount_offered: Some(5.5),
                contents: None,
            },
        };

        let record = SinkRecord::from_transaction(&tx, &baby());
        assert_eq!(record.note(), "Fed by Grandma (offered 5.5oz)");

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["BCObjectType"], "Pumped");
        assert_eq!(value["amount"]["value"], 4.5);
        assert_eq!(value["amount"]["englishMeasure"], "true");
        assert_eq!(value["amount"]["BCObjectType"], "VolumeMeasure");

        tx.kind = TransactionKind::Meal {
            quantity: 4.5,
            amount_offered: None,
            contents: None,
        };
        let record = SinkRecord::from_transaction(&tx, &baby());
        assert_eq!(record.note(), "Fed by Grandma");
    }

    #[test]
    fn test_sleep_record() {
        let tx = Transaction {
            actor: "Ms. Rivera".to_string(),
            start_time: "2019-08-09 13:00:00 +0000".to_string(),
            kind: TransactionKind::Nap {
                end_time: "2019-08-09 13:30:00 +0000".to_string(),
                duration_minutes: 30,
            },
        };

        let record = SinkRecord::from_transaction(&tx, &baby());
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["BCObjectType"], "Sleep");
        assert_eq!(value["duration"], 30);
        assert_eq!(value["note"], "Woke up at 2019-08-09 13:30:00 +0000");
    }

    #[test]
    fn test_envelope_codes_and_decode() {
        let record = SinkRecord::from_transaction(&diaper_tx(DiaperType::Wet), &baby());
        let envelope = SyncEnvelope::new(&record, OpCode::New, 1529).unwrap();

        assert_eq!(envelope.op_code, 0);
        assert_eq!(envelope.sync_id, 1529);
        assert!(!envelope.is_delete());

        let payload = envelope.decode_payload().unwrap();
        assert_eq!(payload["BCObjectType"], "Diaper");
        assert_eq!(payload["time"], "2019-08-09 13:00:00 +0000");

        assert_eq!(OpCode::from_code(2), Some(OpCode::Delete));
        assert_eq!(OpCode::from_code(7), None);
    }

    #[test]
    fn test_reconstruct_existing_transactions() {
        let record = SinkRecord::from_transaction(&diaper_tx(DiaperType::Dirty), &baby());
        let payload = serde_json::to_value(&record).unwrap();

        let tx = transaction_from_payload(&payload).unwrap();
        assert_eq!(
            tx.dedup_key(),
            ("diaper", "2019-08-09 13:00:00 +0000")
        );
        assert_eq!(
            tx.kind,
            TransactionKind::Diaper {
                diaper_type: DiaperType::Dirty
            }
        );

        // Dry round-trips through status 0 + amount 0
        let record = SinkRecord::from_transaction(&diaper_tx(DiaperType::Dry), &baby());
        let payload = serde_json::to_value(&record).unwrap();
        let tx = transaction_from_payload(&payload).unwrap();
        assert_eq!(
            tx.kind,
            TransactionKind::Diaper {
                diaper_type: DiaperType::Dry
            }
        );
    }

    #[test]
    fn test_sleep_payload_derives_wake_time() {
        let payload = json!({
            "BCObjectType": "Sleep",
            "time": "2019-08-09 13:00:00 +0000",
            "duration": 30
        });

        let tx = transaction_from_payload(&payload).unwrap();
        match tx.kind {
            TransactionKind::Nap { end_time, .. } => {
                assert_eq!(end_time, "2019-08-09 13:30:00 +0000")
            }
            other => panic!("expected nap, got {:?}", other),
        }
    }

    #[test]
    fn test_unrelated_object_types_are_ignored() {
        let payload = json!({
            "BCObjectType": "Milestone",
            "time": "2019-08-09 13:00:00 +0000"
        });

        assert!(transaction_from_payload(&payload).is_none());
    }
}
