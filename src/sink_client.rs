// 📱 Sink client - parental tracking app (read/write)
// Owns the authenticated session for the run: /session login, device
// listing, transaction listing, and envelope submission with
// read-then-increment sequence numbers.

use crate::config::Credentials;
use crate::error::{Result, SyncError};
use crate::normalizer::Transaction;
use crate::sink::{transaction_from_payload, OpCode, SinkRecord, SyncEnvelope};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_SINK_URL: &str = "https://prodapp.babytrackers.com";

// The production API only answers requests that look like the mobile app.
const USER_AGENT: &str = "BabyTrackerPro/36 CFNetwork/1098.1 Darwin/19.0.0";

const DEVICE_OS_INFO: &str = "daycare-sync";
const DEVICE_NAME: &str = "Daycare Sync";

// ============================================================================
// WIRE SHAPES
// ============================================================================

#[derive(Debug, Serialize)]
struct DeviceIdentity {
    #[serde(rename = "DeviceOSInfo")]
    os_info: &'static str,
    #[serde(rename = "DeviceName")]
    name: &'static str,
    #[serde(rename = "DeviceUUID")]
    uuid: String,
}

#[derive(Debug, Serialize)]
struct AppInfo {
    #[serde(rename = "AppType")]
    app_type: u8,
    #[serde(rename = "AccountType")]
    account_type: u8,
}

#[derive(Debug, Serialize)]
struct SessionRequest {
    #[serde(rename = "Device")]
    device: DeviceIdentity,
    #[serde(rename = "AppInfo")]
    app_info: AppInfo,
    #[serde(rename = "Password")]
    password: String,
    #[serde(rename = "EmailAddress")]
    email: String,
}

/// One registered device as Sink reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct Device {
    #[serde(rename = "DeviceUUID")]
    pub device_uuid: String,
    #[serde(rename = "LastSyncID")]
    pub last_sync_id: i64,
}

// ============================================================================
// SINK CLIENT
// ============================================================================

/// Explicit session handle for one run. Login is the only fatal step; every
/// later failure is scoped to the operation that raised it.
pub struct SinkClient {
    http: Client,
    base_url: String,
    device_uuid: String,
}

impl SinkClient {
    /// Exchange device identity + credentials for a cookie-backed session.
    pub fn login(
        base_url: impl Into<String>,
        application_id: &str,
        credentials: &Credentials,
    ) -> Result<Self> {
        let base_url = base_url.into();

        let http = Client::builder()
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;

        let request = SessionRequest {
            device: DeviceIdentity {
                os_info: DEVICE_OS_INFO,
                name: DEVICE_NAME,
                uuid: application_id.to_string(),
            },
            app_info: AppInfo {
                app_type: 0,
                account_type: 0,
            },
            password: credentials.password.clone(),
            email: credentials.email.clone(),
        };

        let response = http
            .post(format!("{}/session", base_url))
            .json(&request)
            .send()?;

        if !response.status().is_success() {
            return Err(SyncError::Authentication(format!(
                "login rejected with status {}",
                response.status()
            )));
        }

        tracing::info!("authenticated with sink");

        Ok(SinkClient {
            http,
            base_url,
            device_uuid: application_id.to_string(),
        })
    }

    /// All devices registered on the account.
    pub fn devices(&self) -> Result<Vec<Device>> {
        let response = self
            .http
            .get(format!("{}/account/device", self.base_url))
            .send()?;

        Ok(response.json()?)
    }

    /// Last-used sequence number for our own device, 0 if Sink has never
    /// seen it.
    pub fn last_sync_id(&self) -> Result<i64> {
        let devices = self.devices()?;

        Ok(devices
            .iter()
            .find(|d| d.device_uuid == self.device_uuid)
            .map(|d| d.last_sync_id)
            .unwrap_or(0))
    }

    /// Envelopes at/after `sync_id` for one device.
    pub fn transactions_since(&self, device_uuid: &str, sync_id: i64) -> Result<Vec<SyncEnvelope>> {
        let response = self
            .http
            .get(format!(
                "{}/account/transaction/{}/{}",
                self.base_url, device_uuid, sync_id
            ))
            .send()?;

        Ok(response.json()?)
    }

    /// Reconstruct the canonical transactions already recorded in Sink,
    /// across every device. Deleted envelopes and object types outside the
    /// three mirrored categories are skipped; an undecodable payload is
    /// logged and skipped rather than failing the listing.
    pub fn existing_transactions(&self) -> Result<Vec<Transaction>> {
        let mut existing = Vec::new();

        for device in self.devices()? {
            let envelopes = self.transactions_since(&device.device_uuid, 0)?;
            tracing::debug!(
                device = %device.device_uuid,
                envelopes = envelopes.len(),
                "fetched device transactions"
            );

            for envelope in envelopes {
                if envelope.is_delete() {
                    continue;
                }

                let payload = match envelope.decode_payload() {
                    Ok(payload) => payload,
                    Err(e) => {
                        tracing::warn!(error = %e, "skipping undecodable envelope");
                        continue;
                    }
                };

                if let Some(tx) = transaction_from_payload(&payload) {
                    existing.push(tx);
                }
            }
        }

        Ok(existing)
    }

    /// Submit one record with the next sequence number.
    ///
    /// Read-then-increment against the remote counter: safe because this
    /// tool is the only writer for its device during a run (see DESIGN.md).
    pub fn submit(&self, record: &SinkRecord) -> Result<()> {
        let sync_id = self.last_sync_id()? + 1;
        let envelope = SyncEnvelope::new(record, OpCode::New, sync_id)?;

        tracing::debug!(sync_id, "posting transaction");

        let response = self
            .http
            .post(format!("{}/account/transaction", self.base_url))
            .json(&envelope)
            .send()?;

        if response.status() == StatusCode::CREATED {
            Ok(())
        } else {
            Err(SyncError::Submission {
                status: response.status().as_u16(),
            })
        }
    }
}
