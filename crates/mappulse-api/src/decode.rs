// Payload decoding
//
// Entry point `decode_devices` plus the serde helpers the models use:
// a two-stage timestamp parser and lenient readers for fields the API
// delivers inconsistently.

use chrono::{DateTime, Utc};
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::Error;
use crate::models::{Device, DeviceListResponse};

const BODY_PREVIEW_CHARS: usize = 200;

/// Decode a latest-devices response body into its device list.
pub fn decode_devices(body: &[u8]) -> Result<Vec<Device>, Error> {
    serde_json::from_slice::<DeviceListResponse>(body)
        .map(|resp| resp.result_list)
        .map_err(|e| Error::Decode {
            message: e.to_string(),
            body_preview: preview(body),
        })
}

fn preview(body: &[u8]) -> String {
    String::from_utf8_lossy(body)
        .chars()
        .take(BODY_PREVIEW_CHARS)
        .collect()
}

/// Parse an ISO-8601 timestamp.
///
/// RFC 3339 first (fractional or whole seconds, `Z` or `±hh:mm`), then
/// whole-second ISO-8601 with a compact `±hhmm` offset.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

pub(crate) fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| de::Error::custom(format!("invalid date: {raw}")))
}

/// Number, or a string holding a number. Anything else is `None`.
pub(crate) fn flexible_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }))
}

/// Decode `T` if the value has the right shape, otherwise `None`.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}
