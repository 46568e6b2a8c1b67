//! Device identity resolution.
//!
//! Kiosks in the field run several generations of the reporting agent, and
//! each generation names its identity field differently. [`resolve`] maps any
//! of them onto one [`DeviceKey`].

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identity fields in precedence order. The first present, non-empty one wins.
pub const IDENTITY_FIELDS: [&str; 4] = ["Device", "DeviceId", "DeviceID", "kioskId"];

/// Canonical identity of one physical kiosk.
///
/// Used verbatim as the store key: no trimming, no case folding. Serialised
/// as a plain string; deserialisation goes through [`DeviceKey::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct DeviceKey(String);

impl DeviceKey {
    /// Sentinel key for reports that carry no usable identity.
    pub const UNKNOWN: &'static str = "unknown";

    /// Wrap a raw key. Empty input yields the sentinel so a key is never empty.
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        if key.is_empty() {
            Self::unknown()
        } else {
            Self(key)
        }
    }

    /// The `"unknown"` sentinel key.
    pub fn unknown() -> Self {
        Self(Self::UNKNOWN.to_string())
    }

    /// Whether this is the sentinel key.
    pub fn is_unknown(&self) -> bool {
        self.0 == Self::UNKNOWN
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DeviceKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DeviceKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for DeviceKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<DeviceKey> for String {
    fn from(key: DeviceKey) -> Self {
        key.0
    }
}

/// Derive the device key for a parsed report body.
///
/// Never fails: a body with no usable identity resolves to
/// [`DeviceKey::UNKNOWN`].
pub fn resolve(report: &Value) -> DeviceKey {
    let Some(fields) = report.as_object() else {
        return DeviceKey::unknown();
    };

    IDENTITY_FIELDS
        .iter()
        .filter_map(|name| fields.get(*name))
        .find_map(identity_text)
        .map(DeviceKey)
        .unwrap_or_else(DeviceKey::unknown)
}

/// Text of an identity value, if it counts as present.
fn identity_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        // Early agents sent numeric kiosk ids.
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
