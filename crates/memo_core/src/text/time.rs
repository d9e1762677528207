//! Timestamp helpers with an explicit, configurable time zone.

use chrono::{TimeZone, Utc};
use chrono_tz::Tz;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// IANA zone used when nothing is configured.
pub const DEFAULT_TIME_ZONE: &str = "Asia/Tokyo";
/// Human-readable layout for rendered timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeZoneError {
    pub name: String,
}

impl Display for TimeZoneError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown time zone `{}`; expected an IANA name like `UTC` or `Asia/Tokyo`",
            self.name
        )
    }
}

impl Error for TimeZoneError {}

/// Parses an IANA time zone name (e.g. `Europe/Berlin`).
pub fn parse_time_zone(name: &str) -> Result<Tz, TimeZoneError> {
    name.trim().parse::<Tz>().map_err(|_| TimeZoneError {
        name: name.to_string(),
    })
}

/// Current time as Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Formats epoch milliseconds as wall-clock time in `tz`.
///
/// Out-of-range values fall back to the raw number so rendering never fails.
pub fn format_timestamp(epoch_ms: i64, tz: Tz) -> String {
    match Utc.timestamp_millis_opt(epoch_ms).single() {
        Some(instant) => instant
            .with_timezone(&tz)
            .format(TIMESTAMP_FORMAT)
            .to_string(),
        None => epoch_ms.to_string(),
    }
}
