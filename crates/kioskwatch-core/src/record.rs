//! Status records.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identity::DeviceKey;

/// Last known snapshot of one kiosk.
///
/// `received_at` is assigned by the collector, never by the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRecord {
    /// Server time the report was accepted.
    #[serde(with = "iso_millis")]
    pub received_at: DateTime<Utc>,
    /// The report body exactly as the device sent it.
    pub payload: Value,
}

impl StatusRecord {
    /// Build a record, truncating the timestamp to the millisecond precision
    /// it is rendered with.
    pub fn new(received_at: DateTime<Utc>, payload: Value) -> Self {
        Self {
            received_at: received_at.trunc_subsecs(3),
            payload,
        }
    }

    /// Project into the flat shape returned by queries.
    pub fn into_entry(self, id: DeviceKey) -> StatusEntry {
        StatusEntry {
            id,
            received_at: self.received_at,
            payload: self.payload,
        }
    }
}

/// A record together with the key it is stored under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEntry {
    pub id: DeviceKey,
    #[serde(with = "iso_millis")]
    pub received_at: DateTime<Utc>,
    pub payload: Value,
}

/// Render a timestamp as ISO-8601 UTC with millisecond precision.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Serde adapter producing `2024-05-01T08:30:00.000Z`.
pub mod iso_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
