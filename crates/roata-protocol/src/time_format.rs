//! Wire format for observation timestamps: `YYYY-MM-DDTHH:MM:SSZ`, UTC, no
//! fractional seconds.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// `strftime` pattern for timestamps on the wire.
pub const FORMAT_TIME: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Parse a wire timestamp.
///
/// # Errors
///
/// Returns an error if the text does not match [`FORMAT_TIME`].
pub fn parse(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let naive = NaiveDateTime::parse_from_str(text, FORMAT_TIME)?;
    Ok(Utc.from_utc_datetime(&naive))
}

/// Render a timestamp in wire format.
#[must_use]
pub fn format(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(FORMAT_TIME).to_string()
}

/// Serde `serialize_with` helper.
///
/// # Errors
///
/// Propagates serializer errors.
pub fn serialize<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format(timestamp))
}

/// Serde `deserialize_with` helper.
///
/// # Errors
///
/// Fails when the value is not a string in wire format.
pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse(&text).map_err(serde::de::Error::custom)
}
