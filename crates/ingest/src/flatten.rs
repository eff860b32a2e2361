//! Turn raw queue-times JSON into park listings and ride readings.
//!
//! Upstream ids are numbers; they are normalised to strings here so the
//! rest of the system only ever sees string ids.

use serde_json::{Map, Value};

use waitwatch_core::{ParkListing, RideReading};

use crate::traits::SourceError;

const GROUPING_KEYS: &[&str] = &["rides", "lands", "areas"];
const NESTED_KEYS: &[&str] = &["lands", "areas"];

fn id_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.to_string(),
        }),
        _ => None,
    }
}

fn wait_value(value: Option<&Value>) -> Option<i64> {
    let Value::Number(n) = value? else {
        return None;
    };
    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.is_finite())
            .map(|f| f.round() as i64)
    })
}

/// Parks listed under the group named `group`.
///
/// The payload is either a list of groups or an object with a `parks` list
/// of groups. An absent group yields an empty list. A park without an `id`
/// falls back to its `slug` and is dropped if it has neither.
pub fn parks_in_group(payload: &Value, group: &str) -> Result<Vec<ParkListing>, SourceError> {
    let groups = match payload {
        Value::Array(groups) => groups.as_slice(),
        Value::Object(map) => match map.get("parks") {
            Some(Value::Array(groups)) => groups.as_slice(),
            _ => &[],
        },
        other => {
            return Err(SourceError::Payload(format!(
                "expected list of park groups, got {}",
                type_name(other)
            )))
        }
    };

    let Some(parks) = groups
        .iter()
        .find(|g| g.get("name").and_then(Value::as_str) == Some(group))
        .and_then(|g| g.get("parks"))
        .and_then(Value::as_array)
    else {
        return Ok(Vec::new());
    };

    Ok(parks
        .iter()
        .filter_map(|park| {
            let id = id_string(park.get("id")).or_else(|| id_string(park.get("slug")))?;
            let name = park
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| id.clone());
            Some(ParkListing { id, name })
        })
        .collect())
}

/// Every ride record in a park payload, in document order.
///
/// Rides may sit directly under `rides` or be grouped under `lands` or
/// `areas` to any depth. A top-level list holds either groupings or rides.
pub fn flatten_readings(payload: &Value) -> Result<Vec<RideReading>, SourceError> {
    let mut out = Vec::new();
    match payload {
        Value::Array(items) => items.iter().for_each(|item| collect_item(item, &mut out)),
        Value::Object(map) => collect_groupings(map, &mut out),
        other => {
            return Err(SourceError::Payload(format!(
                "expected ride payload object or list, got {}",
                type_name(other)
            )))
        }
    }
    Ok(out)
}

fn is_grouping(map: &Map<String, Value>) -> bool {
    GROUPING_KEYS.iter().any(|k| matches!(map.get(*k), Some(Value::Array(_))))
}

fn collect_groupings(map: &Map<String, Value>, out: &mut Vec<RideReading>) {
    if let Some(Value::Array(rides)) = map.get("rides") {
        rides.iter().for_each(|item| collect_item(item, out));
    }
    for key in NESTED_KEYS {
        if let Some(Value::Array(items)) = map.get(*key) {
            for item in items {
                // Lands and areas never stand for a ride, even when empty.
                if let Value::Object(nested) = item {
                    collect_groupings(nested, out);
                }
            }
        }
    }
}

/// A ride record, or a grouping that happens to sit where rides are listed.
fn collect_item(item: &Value, out: &mut Vec<RideReading>) {
    let Value::Object(map) = item else {
        return;
    };
    if is_grouping(map) {
        collect_groupings(map, out);
    } else {
        out.push(reading_from(map));
    }
}

fn reading_from(map: &Map<String, Value>) -> RideReading {
    RideReading {
        id: id_string(map.get("id")),
        name: map.get("name").and_then(Value::as_str).map(str::to_string),
        wait_time: wait_value(map.get("wait_time")),
        is_open: map.get("is_open").and_then(Value::as_bool).unwrap_or(true),
        status: map.get("status").and_then(Value::as_str).map(str::to_string),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
