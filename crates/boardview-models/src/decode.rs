//! Lenient decoding helpers shared by the entity decoders.
//!
//! Upstream payloads are inconsistent: ids arrive under per-entity names,
//! numbers show up where strings are expected and optional fields are
//! sometimes the wrong type. The helpers here never fail on an optional
//! field; only a missing required field or a non-object payload produces a
//! [`DecodeIssue`].

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

/// Open key/value map attached to most entities.
pub type Metadata = Map<String, Value>;

/// Why a single upstream item could not be turned into a record.
///
/// Listing operations drop the offending item and keep going; the issue is
/// only ever logged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeIssue {
    #[error("{entity} payload is not a JSON object")]
    NotAnObject { entity: &'static str },

    #[error("{entity} payload is missing required field `{field}`")]
    MissingField {
        entity: &'static str,
        field: &'static str,
    },
}

pub type DecodeResult<T> = std::result::Result<T, DecodeIssue>;

pub(crate) fn as_object<'a>(raw: &'a Value, entity: &'static str) -> DecodeResult<&'a Metadata> {
    raw.as_object().ok_or(DecodeIssue::NotAnObject { entity })
}

/// Coerce any JSON value to text.
///
/// Strings pass through untouched, `null` becomes the empty string and
/// everything else uses its compact JSON rendering (`123`, `true`, ...).
pub fn text_of(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Read an integer from a number, a float (truncated) or a numeric string.
pub fn integer_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float as i64)),
        Value::String(text) => {
            let trimmed = text.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().map(|float| float as i64))
        }
        _ => None,
    }
}

/// Parse the timestamp shapes seen upstream. Unknown shapes decode to `None`.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(text) => parse_timestamp_str(text),
        Value::Number(number) => {
            if let Some(secs) = number.as_i64() {
                DateTime::from_timestamp(secs, 0)
            } else {
                let float = number.as_f64()?;
                let secs = float.trunc() as i64;
                let nanos = ((float - float.trunc()) * 1e9) as u32;
                DateTime::from_timestamp(secs, nanos)
            }
        }
        _ => None,
    }
}

fn parse_timestamp_str(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
}

/// First id found under `keys`, in order. Numbers are stringified.
pub(crate) fn opaque_id(obj: &Metadata, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match obj.get(*key) {
        Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    })
}

pub(crate) fn optional_string(obj: &Metadata, key: &str) -> Option<String> {
    match obj.get(key) {
        Some(Value::String(text)) => Some(text.clone()),
        Some(value @ (Value::Number(_) | Value::Bool(_))) => Some(value.to_string()),
        _ => None,
    }
}

pub(crate) fn first_string(obj: &Metadata, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| optional_string(obj, key))
}

pub(crate) fn required_string(
    obj: &Metadata,
    keys: &[&str],
    entity: &'static str,
    field: &'static str,
) -> DecodeResult<String> {
    first_string(obj, keys).ok_or(DecodeIssue::MissingField { entity, field })
}

pub(crate) fn optional_u64(obj: &Metadata, keys: &[&str]) -> Option<u64> {
    keys.iter().find_map(|key| {
        obj.get(*key)
            .and_then(integer_of)
            .and_then(|value| u64::try_from(value).ok())
    })
}

pub(crate) fn optional_bool(obj: &Metadata, key: &str) -> Option<bool> {
    match obj.get(key)? {
        Value::Bool(flag) => Some(*flag),
        Value::String(text) => text.trim().parse::<bool>().ok(),
        _ => None,
    }
}

pub(crate) fn optional_timestamp(obj: &Metadata, keys: &[&str]) -> Option<DateTime<Utc>> {
    keys.iter()
        .find_map(|key| obj.get(*key).and_then(parse_timestamp))
}

pub(crate) fn metadata(obj: &Metadata, key: &str) -> Option<Metadata> {
    obj.get(key).and_then(Value::as_object).cloned()
}

/// String entries of an array field; non-string entries are skipped.
pub(crate) fn string_list(obj: &Metadata, key: &str) -> Option<Vec<String>> {
    let items = obj.get(key)?.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
    )
}
