// 🔧 Static configuration
// Application/device identity, the fixed baby profile, and Sink credentials.
// This is the only state the tool reads from disk; nothing is written back.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use std::fs;
use std::path::Path;

// ============================================================================
// APP CONFIG
// ============================================================================

/// `config/config.json` — the stable identifier this tool registers with
/// Sink as its device UUID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub application_id: String,
}

impl AppConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }
}

// ============================================================================
// BABY PROFILE
// ============================================================================

/// `config/baby_data.json` — the fixed profile record Sink expects embedded
/// verbatim in every transaction payload.
///
/// Kept opaque: we never interpret the fields, we only check the expected
/// key set is present so a schema drift fails at startup instead of at
/// submission time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BabyProfile(Value);

impl BabyProfile {
    pub const REQUIRED_KEYS: [&'static str; 9] = [
        "dueDay",
        "BCObjectType",
        "gender",
        "pictureName",
        "dob",
        "newFlage",
        "timestamp",
        "name",
        "objectID",
    ];

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read baby profile: {:?}", path.as_ref()))?;

        let value: Value =
            serde_json::from_str(&content).context("Failed to parse baby profile JSON")?;

        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let object = match value.as_object() {
            Some(object) => object,
            None => bail!("Baby profile must be a JSON object"),
        };

        for key in Self::REQUIRED_KEYS {
            if !object.contains_key(key) {
                bail!("Baby profile is missing required key '{}'", key);
            }
        }

        Ok(BabyProfile(value))
    }
}

// ============================================================================
// CREDENTIALS
// ============================================================================

/// Sink login credentials, taken from the environment.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn from_env() -> Result<Self> {
        let email = env::var("EMAIL").context("EMAIL must be set in the environment")?;
        let password = env::var("PASSWORD").context("PASSWORD must be set in the environment")?;

        Ok(Credentials { email, password })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile_value() -> Value {
        json!({
            "dueDay": "2019-02-01",
            "BCObjectType": "Baby",
            "gender": 0,
            "pictureName": "",
            "dob": "2019-02-03",
            "newFlage": "false",
            "timestamp": "2019-02-03 12:00:00 +0000",
            "name": "Sam",
            "objectID": "0E4B3C31-2D6F-4E0A-93A4-80E05DB1B4D1"
        })
    }

    #[test]
    fn test_profile_with_all_keys_is_accepted() {
        let profile = BabyProfile::from_value(profile_value()).unwrap();

        // Round-trips verbatim
        let serialized = serde_json::to_value(&profile).unwrap();
        assert_eq!(serialized["name"], "Sam");
        assert_eq!(serialized["BCObjectType"], "Baby");
    }

    #[test]
    fn test_profile_missing_key_is_rejected() {
        let mut value = profile_value();
        value.as_object_mut().unwrap().remove("objectID");

        let err = BabyProfile::from_value(value).unwrap_err();
        assert!(err.to_string().contains("objectID"));
    }

    #[test]
    fn test_profile_must_be_an_object() {
        assert!(BabyProfile::from_value(json!([1, 2, 3])).is_err());
    }
}
