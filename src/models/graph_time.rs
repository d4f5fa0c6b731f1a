//! Date/time-with-timezone values as the task service exchanges them
//!
//! ```json
//! { "dateTime": "2021-01-02T20:13:00.0000000", "timeZone": "UTC" }
//! ```
//!
//! In memory these are local wall-clock times (`NaiveDateTime`), the same
//! representation the date parser produces.

use chrono::{DateTime, Local, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use log::warn;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Write format; the service expects seven fractional digits
const WIRE_WRITE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.0000000";
/// Read format; the fraction is optional and of any length
const WIRE_READ_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

pub const UTC_ZONE: &str = "UTC";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateTimeTimeZone {
    pub date_time: String,
    pub time_zone: String,
}

impl DateTimeTimeZone {
    /// Wire value for a local wall-clock time, expressed in UTC
    pub fn from_local(local: NaiveDateTime) -> Self {
        let utc = local_to_utc(local);
        DateTimeTimeZone {
            date_time: utc.format(WIRE_WRITE_FORMAT).to_string(),
            time_zone: UTC_ZONE.to_string(),
        }
    }

    /// Local wall-clock time of this value
    pub fn to_local(&self) -> Result<NaiveDateTime, String> {
        let naive = NaiveDateTime::parse_from_str(&self.date_time, WIRE_READ_FORMAT)
            .map_err(|e| format!("invalid dateTime '{}': {}", self.date_time, e))?;

        let utc = if self.time_zone.eq_ignore_ascii_case(UTC_ZONE) {
            naive.and_utc()
        } else {
            match self.time_zone.parse::<Tz>() {
                Ok(zone) => match zone.from_local_datetime(&naive) {
                    LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
                    LocalResult::None => naive.and_utc(),
                },
                Err(_) => {
                    warn!("Unknown time zone '{}', treating as UTC", self.time_zone);
                    naive.and_utc()
                }
            }
        };

        Ok(utc_to_local(utc))
    }
}

/// Convert a local wall-clock time to UTC
///
/// Times skipped by a DST jump are read as UTC-offset-free values.
pub fn local_to_utc(local: NaiveDateTime) -> DateTime<Utc> {
    match Local.from_local_datetime(&local) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        LocalResult::None => local.and_utc(),
    }
}

pub fn utc_to_local(utc: DateTime<Utc>) -> NaiveDateTime {
    utc.with_timezone(&Local).naive_local()
}

/// serde adapter for optional date/time-with-timezone fields
///
/// `null` and a missing field both read as `None`.
pub mod optional {
    use super::*;

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.map(DateTimeTimeZone::from_local).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = Option::<DateTimeTimeZone>::deserialize(deserializer)?;
        wire.map(|value| value.to_local().map_err(serde::de::Error::custom))
            .transpose()
    }
}
