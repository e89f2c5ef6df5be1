// Task record type and its persisted form

use chrono::{DateTime, Local, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// A single daily task note
///
/// Records are immutable once created. The `id` is the only equality key the
/// store uses for removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: Uuid,
    pub text: String,
    #[serde(serialize_with = "serialize_timestamp", deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl TaskRecord {
    /// Build a record with a fresh random id
    pub fn new(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            timestamp,
        }
    }

    /// Creation time as local wall-clock `HH:MM`
    pub fn time_string(&self) -> String {
        self.timestamp.with_timezone(&Local).format("%H:%M").to_string()
    }

    /// Short id used for display and prefix lookups
    pub fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_string()
    }
}

/// Seconds between the Unix epoch and 2001-01-01T00:00:00Z
const REFERENCE_DATE_OFFSET: i64 = 978_307_200;

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

/// Accepts RFC 3339 strings, or a number of seconds since 2001-01-01 UTC
fn deserialize_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Seconds(f64),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Text(s) => DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom),
        Raw::Seconds(secs) => {
            if !secs.is_finite() {
                return Err(serde::de::Error::custom("timestamp is not a finite number"));
            }
            let whole = secs.floor();
            let nanos = (((secs - whole) * 1e9).round() as u32).min(999_999_999);
            let out_of_range =
                || -> D::Error { serde::de::Error::custom(format!("timestamp out of range: {}", secs)) };
            // `as` saturates, so the sum is the only place this can overflow
            let unix = (whole as i64).checked_add(REFERENCE_DATE_OFFSET).ok_or_else(out_of_range)?;
            DateTime::from_timestamp(unix, nanos).ok_or_else(out_of_range)
        }
    }
}
