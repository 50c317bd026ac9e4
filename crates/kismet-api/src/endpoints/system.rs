// System endpoints
//
// Server status and clock.

use chrono::{DateTime, SecondsFormat};
use serde_json::Value;
use strum::{Display, EnumString};

use crate::client::KismetClient;
use crate::error::Error;
use crate::transport::Verb;

const TIMESTAMP_SEC: &str = "kismet.system.timestamp.sec";
const TIMESTAMP_USEC: &str = "kismet.system.timestamp.usec";

/// How [`KismetClient::system_time`] renders the server clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum TimeFormat {
    /// The timestamp document as returned.
    #[default]
    Raw,
    /// ISO 8601 (UTC, microsecond precision).
    Iso,
}

impl TimeFormat {
    /// Parse a format name, rejecting unknown ones as a service error.
    pub fn parse_name(name: &str) -> Result<Self, Error> {
        name.parse()
            .map_err(|_| Error::service(format!("Invalid system time format: {name}")))
    }
}

/// Server clock in the requested [`TimeFormat`].
#[derive(Debug, Clone, PartialEq)]
pub enum SystemTime {
    Raw(Value),
    Iso(String),
}

impl KismetClient {
    /// Server status document (version, uptime, memory, ...).
    ///
    /// `GET /system/status.json`
    pub async fn system_status(&self) -> Result<Value, Error> {
        self.interact(Verb::Get, "system/status.json", None).await
    }

    /// Server clock as `{sec, usec}` fields.
    ///
    /// `GET /system/timestamp.json`
    pub async fn system_timestamp(&self) -> Result<Value, Error> {
        self.interact(Verb::Get, "system/timestamp.json", None).await
    }

    /// Server clock, optionally rendered as ISO 8601.
    pub async fn system_time(&self, format: TimeFormat) -> Result<SystemTime, Error> {
        let raw = self.system_timestamp().await?;
        match format {
            TimeFormat::Raw => Ok(SystemTime::Raw(raw)),
            TimeFormat::Iso => timestamp_to_iso(&raw).map(SystemTime::Iso),
        }
    }
}

fn timestamp_to_iso(raw: &Value) -> Result<String, Error> {
    let secs = integer_field(raw, TIMESTAMP_SEC)?;
    let usecs = integer_field(raw, TIMESTAMP_USEC)?;

    let total_usecs = secs
        .checked_mul(1_000_000)
        .and_then(|s| s.checked_add(usecs))
        .ok_or_else(|| Error::service(format!("timestamp out of range: {secs}.{usecs}")))?;
    let dt = DateTime::from_timestamp_micros(total_usecs)
        .ok_or_else(|| Error::service(format!("timestamp out of range: {secs}.{usecs}")))?;
    Ok(dt.to_rfc3339_opts(SecondsFormat::Micros, true))
}

fn integer_field(raw: &Value, key: &str) -> Result<i64, Error> {
    let value = raw
        .get(key)
        .ok_or_else(|| Error::service(format!("Missing {key} in timestamp response")))?;
    value
        .as_i64()
        // Some builds report whole numbers as floats.
        .or_else(|| value.as_f64().and_then(whole_f64_to_i64))
        .ok_or_else(|| Error::service(format!("Non-integer {key} in timestamp response: {value}")))
}

/// Convert a float that holds a whole number inside the `i64` range.
#[allow(clippy::as_conversions, clippy::cast_possible_truncation)]
fn whole_f64_to_i64(f: f64) -> Option<i64> {
    // 2^63 is exactly representable; `i64::MAX as f64` rounds up to it.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f)).then(|| f as i64)
}
