// File: snowrake-common/src/models/snowflake.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// Millisecond timestamp of the platform epoch (2015-01-01T00:00:00Z).
pub const PLATFORM_EPOCH_MS: i64 = 1_420_070_400_000;

/// The creation timestamp lives in the top 42 bits of an id.
const TIMESTAMP_SHIFT: u32 = 22;

/// A platform message/channel/user id. The high bits embed the creation
/// timestamp, so numeric ordering doubles as chronological ordering.
/// Ids must never be compared as strings; the wire form is a decimal string
/// and shorter ids would sort wrong.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Snowflake(pub u64);

impl Snowflake {
    /// Smallest id whose embedded timestamp equals `dt` (low bits zero).
    /// Used as a pagination anchor for "everything at or after this instant".
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        let ms = (dt.timestamp_millis() - PLATFORM_EPOCH_MS).max(0);
        Snowflake((ms as u64) << TIMESTAMP_SHIFT)
    }

    /// Recovers the embedded creation time at millisecond precision.
    pub fn to_datetime(self) -> DateTime<Utc> {
        let ms = (self.0 >> TIMESTAMP_SHIFT) as i64 + PLATFORM_EPOCH_MS;
        DateTime::from_timestamp_millis(ms).unwrap_or_default()
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Snowflake {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(Snowflake)
            .map_err(|e| Error::Parse(format!("bad snowflake '{s}' => {e}")))
    }
}

impl Serialize for Snowflake {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<u64>()
            .map(Snowflake)
            .map_err(|e| serde::de::Error::custom(format!("bad snowflake '{raw}' => {e}")))
    }
}
