//! Serde adapters for wall-clock shift times.
//!
//! Times travel as `HH:MM` (what `<input type="time">` produces); `HH:MM:SS`
//! is accepted on input as well.

use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serializer};

const WIRE_FORMAT: &str = "%H:%M";

pub fn parse(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, WIRE_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

pub fn format(time: &NaiveTime) -> String {
    time.format(WIRE_FORMAT).to_string()
}

pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format(time))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid time: {raw}")))
}
