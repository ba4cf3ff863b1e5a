//! Schema-versioned wrapper for stored payloads.
//!
//! Records are written as `{ schemaVersion, lastModified, payload }`.
//! Reading never fails on version: a bare payload (written before the
//! wrapper existed) or a wrapper carrying another version is reported as a
//! migration candidate and handed back unchanged for normalization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Current on-disk schema version. Version 1 is the unwrapped legacy form.
pub const SCHEMA_VERSION: u32 = 2;

/// A payload tagged with the schema version it was written under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Versioned<T> {
    pub schema_version: u32,
    pub last_modified: String,
    pub payload: T,
}

impl<T> Versioned<T> {
    /// Wrap `payload` at the current schema version.
    pub fn current(payload: T, now: DateTime<Utc>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            last_modified: iso_timestamp(now),
            payload,
        }
    }
}

/// How a stored value relates to [`SCHEMA_VERSION`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionState {
    Current,
    /// Wrapped, but under a different version.
    Stale(u32),
    /// No wrapper at all.
    Legacy,
}

impl VersionState {
    pub fn needs_migration(self) -> bool {
        !matches!(self, VersionState::Current)
    }
}

/// Split a stored JSON value into its payload and version state.
pub fn unwrap_versioned(value: Value) -> (Value, VersionState) {
    match value {
        Value::Object(mut map)
            if map.contains_key("payload") && map.contains_key("schemaVersion") =>
        {
            let version = map
                .get("schemaVersion")
                .and_then(Value::as_u64)
                .and_then(|v| u32::try_from(v).ok());
            let payload = map.remove("payload").unwrap_or(Value::Null);
            match version {
                Some(SCHEMA_VERSION) => (payload, VersionState::Current),
                Some(v) => (payload, VersionState::Stale(v)),
                None => (payload, VersionState::Stale(0)),
            }
        }
        other => (other, VersionState::Legacy),
    }
}

/// ISO-8601 UTC with millisecond precision, e.g. `2024-05-01T12:00:00.000Z`.
pub fn iso_timestamp(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Parse an ISO-8601 timestamp written by [`iso_timestamp`] (or any RFC 3339 form).
pub fn parse_iso_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn current_wrapper_round_trips() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let wrapped = Versioned::current(json!({"a": 1}), now);
        let value = serde_json::to_value(&wrapped).unwrap();
        assert_eq!(value["schemaVersion"], SCHEMA_VERSION);
        assert_eq!(value["lastModified"], "2024-05-01T12:00:00.000Z");

        let (payload, state) = unwrap_versioned(value);
        assert_eq!(state, VersionState::Current);
        assert_eq!(payload, json!({"a": 1}));
    }

    #[test]
    fn bare_payload_is_legacy() {
        let (payload, state) = unwrap_versioned(json!(["Garage", "Attic"]));
        assert_eq!(state, VersionState::Legacy);
        assert_eq!(payload, json!(["Garage", "Attic"]));
    }

    #[test]
    fn other_version_is_stale_not_error() {
        let value = json!({"schemaVersion": 1, "lastModified": "x", "payload": {"id": 1}});
        let (payload, state) = unwrap_versioned(value);
        assert_eq!(state, VersionState::Stale(1));
        assert!(state.needs_migration());
        assert_eq!(payload["id"], 1);
    }

    #[test]
    fn object_without_wrapper_keys_is_legacy() {
        let value = json!({"id": 1, "number": "T1"});
        let (_, state) = unwrap_versioned(value);
        assert_eq!(state, VersionState::Legacy);
    }

    #[test]
    fn timestamp_parse_inverts_format() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 15).unwrap();
        let s = iso_timestamp(now);
        assert_eq!(parse_iso_timestamp(&s), Some(now));
        assert_eq!(parse_iso_timestamp("not a date"), None);
    }
}
