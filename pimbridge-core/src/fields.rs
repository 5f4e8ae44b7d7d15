//! Typed extraction from caller-supplied field mappings.
//!
//! Every helper takes the field name so that errors can say which key was
//! malformed. `null` handling is left to the callers: they decide whether
//! `null` clears a property or is itself invalid.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::error::{BridgeError, BridgeResult};

/// Caller-supplied mapping of field names to values.
pub type FieldMap = serde_json::Map<String, Value>;

pub fn string(field: &str, value: &Value) -> BridgeResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Err(BridgeError::invalid(
            field,
            format!("expected a string, got {}", type_name(other)),
        )),
    }
}

/// A string, or `None` for `null`.
pub fn opt_string(field: &str, value: &Value) -> BridgeResult<Option<String>> {
    match value {
        Value::Null => Ok(None),
        other => string(field, other).map(Some),
    }
}

pub fn boolean(field: &str, value: &Value) -> BridgeResult<bool> {
    value.as_bool().ok_or_else(|| {
        BridgeError::invalid(field, format!("expected a boolean, got {}", type_name(value)))
    })
}

/// An integer given either as a JSON number or as a numeric string.
pub fn integer(field: &str, value: &Value) -> BridgeResult<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| BridgeError::invalid(field, format!("'{}' is not an integer", n))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| BridgeError::invalid(field, format!("'{}' is not an integer", s))),
        other => Err(BridgeError::invalid(
            field,
            format!("expected an integer, got {}", type_name(other)),
        )),
    }
}

/// A list of integers, each within `range`. Zero is rejected when `non_zero` is set.
pub fn integer_list(
    field: &str,
    value: &Value,
    range: std::ops::RangeInclusive<i32>,
    non_zero: bool,
) -> BridgeResult<Vec<i32>> {
    array(field, value)?
        .iter()
        .map(|item| {
            let n = integer(field, item)?;
            let n = i32::try_from(n)
                .map_err(|_| BridgeError::invalid(field, format!("{} is out of range", n)))?;
            if !range.contains(&n) || (non_zero && n == 0) {
                return Err(BridgeError::invalid(
                    field,
                    format!("{} is outside {}..={}", n, range.start(), range.end()),
                ));
            }
            Ok(n)
        })
        .collect()
}

pub fn array<'a>(field: &str, value: &'a Value) -> BridgeResult<&'a [Value]> {
    value.as_array().map(Vec::as_slice).ok_or_else(|| {
        BridgeError::invalid(field, format!("expected a list, got {}", type_name(value)))
    })
}

pub fn object<'a>(field: &str, value: &'a Value) -> BridgeResult<&'a FieldMap> {
    value.as_object().ok_or_else(|| {
        BridgeError::invalid(field, format!("expected an object, got {}", type_name(value)))
    })
}

/// A point in time: an RFC 3339 string, a `YYYY-MM-DD` date (midnight UTC),
/// or a number of milliseconds since the Unix epoch.
pub fn timestamp(field: &str, value: &Value) -> BridgeResult<DateTime<Utc>> {
    let invalid = || BridgeError::InvalidDate {
        field: field.to_string(),
        value: value.to_string(),
    };

    match value {
        Value::String(s) => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Ok(dt.with_timezone(&Utc));
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
                .ok_or_else(invalid)
        }
        Value::Number(n) => {
            let millis = n.as_f64().ok_or_else(invalid)?;
            if !millis.is_finite() {
                return Err(invalid());
            }
            Utc.timestamp_millis_opt(millis as i64)
                .single()
                .ok_or_else(invalid)
        }
        _ => Err(invalid()),
    }
}

/// A timestamp, or `None` for `null`.
pub fn opt_timestamp(field: &str, value: &Value) -> BridgeResult<Option<DateTime<Utc>>> {
    match value {
        Value::Null => Ok(None),
        other => timestamp(field, other).map(Some),
    }
}

/// A signed offset in minutes: a JSON number, or an ISO 8601 duration such
/// as `-PT15M` / `P1D` (negative means before).
pub fn minutes_offset(field: &str, value: &Value) -> BridgeResult<i64> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .filter(|m| m.is_finite())
            .map(|m| m.round() as i64)
            .ok_or_else(|| BridgeError::invalid(field, format!("'{}' is not a number", n))),
        Value::String(s) => {
            let negative = s.starts_with('-');
            let duration = iso8601::duration(s.trim_start_matches(['-', '+']))
                .map_err(|e| BridgeError::invalid(field, format!("'{}': {}", s, e)))?;
            let std_duration: std::time::Duration = duration.into();
            if std_duration.as_secs() % 60 != 0 || std_duration.subsec_nanos() != 0 {
                return Err(BridgeError::invalid(
                    field,
                    format!("'{}' is not a whole number of minutes", s),
                ));
            }
            let minutes = (std_duration.as_secs() / 60) as i64;
            Ok(if negative { -minutes } else { minutes })
        }
        other => Err(BridgeError::invalid(
            field,
            format!("expected minutes or a duration, got {}", type_name(other)),
        )),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
