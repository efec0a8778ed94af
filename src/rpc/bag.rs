//! Argument bag decoding.
//!
//! A bag is a JSON object whose values end up as strings. Strings are kept
//! verbatim, numbers and booleans keep their JSON text, objects and arrays are
//! re-encoded compactly (a nested bag can therefore be written either as an
//! escaped string or inline), and `null` drops the key.

use std::collections::HashMap;

use super::error::{Error, Result};

pub type ArgumentBag = HashMap<String, String>;

/// Decode `raw` into a flat bag. `context` names the source in errors.
pub fn decode_bag(raw: &str, context: &str) -> Result<ArgumentBag> {
    let map: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(raw).map_err(|source| Error::Decode {
            context: context.to_string(),
            source,
        })?;
    Ok(flatten_object(map))
}

/// Flatten an already-parsed JSON object into a bag.
pub fn flatten_object(map: serde_json::Map<String, serde_json::Value>) -> ArgumentBag {
    map.into_iter()
        .filter_map(|(k, v)| flatten_value(v).map(|s| (k, s)))
        .collect()
}

fn flatten_value(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}
