//! Core data model for the configuration cache

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single named configuration value with version timestamps.
///
/// `key` is the identity, `value` is opaque text, and `updated` is the
/// authoritative version marker: the refresh loop only replaces a stored
/// setting when an incoming one carries a strictly later `updated` AND a
/// different `value`. This matches the wire format of the configuration
/// service, a JSON array of `{key, value, created, updated}` objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    /// Identity of the setting within a snapshot
    pub key: String,
    /// Current value, opaque text as far as the cache is concerned
    pub value: String,
    /// When the setting was first created on the service
    pub created: DateTime<Utc>,
    /// When the value was last touched; the version marker for diffing
    pub updated: DateTime<Utc>,
}

impl Setting {
    /// Create a new setting record
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        created: DateTime<Utc>,
        updated: DateTime<Utc>,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            created,
            updated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format_deserialization() {
        let json = r#"[
            {
                "key": "http.port",
                "value": "8080",
                "created": "2024-01-01T00:00:00Z",
                "updated": "2024-03-15T09:30:00Z"
            },
            {
                "key": "http.verbose",
                "value": "true",
                "created": "2024-01-01T00:00:00Z",
                "updated": "2024-01-01T00:00:00Z"
            }
        ]"#;

        let settings: Vec<Setting> = serde_json::from_str(json).unwrap();
        assert_eq!(settings.len(), 2);
        assert_eq!(settings[0].key, "http.port");
        assert_eq!(settings[0].value, "8080");
        assert!(settings[0].updated > settings[0].created);
    }

    #[test]
    fn test_serialization_round_trip() {
        let setting = Setting::new(
            "db.pool_size",
            "25",
            Utc::now(),
            Utc::now(),
        );

        let json = serde_json::to_string(&setting).unwrap();
        let back: Setting = serde_json::from_str(&json).unwrap();
        assert_eq!(back, setting);
    }
}
