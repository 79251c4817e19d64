//! Wall-clock timestamps as they appear on the wire.

use core::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

/// Integers above this are taken to be milliseconds rather than seconds.
const MILLIS_THRESHOLD: i64 = 10_000_000_000;

/// A point in time, in milliseconds since the Unix epoch.
///
/// The API is not consistent about its timestamp format: `started_at` comes
/// back as Unix seconds while `ends_at` is a date string. Deserialization
/// accepts either, plus numeric strings and the `YYYY-MM-DD HH:MM:SS` form
/// (read as UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Create a timestamp from milliseconds since the epoch.
    pub const fn from_millis(millis: i64) -> Self {
        Timestamp(millis)
    }

    /// Create a timestamp from whole seconds since the epoch.
    pub const fn from_secs(secs: i64) -> Self {
        Timestamp(secs.saturating_mul(1000))
    }

    /// Milliseconds since the epoch.
    pub const fn as_millis(&self) -> i64 {
        self.0
    }

    /// Whole seconds since the epoch (floored).
    pub const fn as_secs(&self) -> i64 {
        self.0.div_euclid(1000)
    }

    /// Shift by a number of seconds (negative moves backwards).
    pub const fn add_secs(&self, secs: i64) -> Self {
        Timestamp(self.0.saturating_add(secs.saturating_mul(1000)))
    }

    /// Milliseconds from `self` until `later` (negative if `later` is earlier).
    pub const fn millis_until(&self, later: Timestamp) -> i64 {
        later.0.saturating_sub(self.0)
    }

    /// Parse any of the accepted textual forms.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        if let Ok(n) = input.parse::<i64>() {
            return Some(Self::from_integer(n));
        }

        if let Ok(dt) = OffsetDateTime::parse(input, &Rfc3339) {
            return Some(Self::from_datetime(dt));
        }

        let sql = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
        PrimitiveDateTime::parse(input, sql)
            .ok()
            .map(|dt| Self::from_datetime(dt.assume_utc()))
    }

    /// Format as RFC 3339 in UTC.
    pub fn to_rfc3339(&self) -> Option<String> {
        let nanos = i128::from(self.0) * 1_000_000;
        OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .ok()
            .and_then(|dt| dt.format(&Rfc3339).ok())
    }

    fn from_integer(n: i64) -> Self {
        if n.unsigned_abs() > MILLIS_THRESHOLD as u64 {
            Timestamp(n)
        } else {
            Self::from_secs(n)
        }
    }

    fn from_datetime(dt: OffsetDateTime) -> Self {
        Timestamp((dt.unix_timestamp_nanos() / 1_000_000) as i64)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_rfc3339() {
            Some(s) => f.write_str(&s),
            None => write!(f, "{}ms", self.0),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.as_secs())
    }
}

/// `serialize_with` helper for fields the API expects as RFC 3339 strings.
pub fn serialize_opt_rfc3339<S: Serializer>(
    ts: &Option<Timestamp>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match ts.and_then(|ts| ts.to_rfc3339()) {
        Some(s) => serializer.serialize_str(&s),
        None => serializer.serialize_none(),
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(TimestampVisitor)
    }
}

struct TimestampVisitor;

impl<'de> Visitor<'de> for TimestampVisitor {
    type Value = Timestamp;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unix seconds or a date-time string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Timestamp::from_integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        i64::try_from(v)
            .map(Timestamp::from_integer)
            .map_err(|_| E::custom("timestamp out of range"))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        if !v.is_finite() {
            return Err(E::custom("timestamp is not finite"));
        }
        Ok(Timestamp::from_integer(v.floor() as i64))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Timestamp::parse(v).ok_or_else(|| E::custom(format!("unrecognised timestamp: {v}")))
    }
}
