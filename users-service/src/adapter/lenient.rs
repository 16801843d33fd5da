//! Deserializers accepting numbers either as JSON numbers or as strings
//!
//! Path and query parameters always arrive as strings, while the same field
//! may arrive as a number in a JSON body. Use with
//! `#[serde(default, deserialize_with = "lenient::u32")]`.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(i64),
    String(String),
}

/// `u32` from a number or a decimal string; an empty string is zero
pub fn u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => u32::try_from(n)
            .map_err(|_| D::Error::custom(format!("{} is not a valid non-negative integer", n))),
        NumberOrString::String(s) if s.trim().is_empty() => Ok(0),
        NumberOrString::String(s) => s
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("'{}' is not a valid non-negative integer", s))),
    }
}

/// `i64` from a number or a decimal string; an empty string is zero
pub fn i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) if s.trim().is_empty() => Ok(0),
        NumberOrString::String(s) => s
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("'{}' is not a valid integer", s))),
    }
}
