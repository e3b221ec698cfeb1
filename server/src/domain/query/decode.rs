//! Store value decoding
//!
//! Converts tagged attribute values into plain JSON. Decoding is total: every
//! variant, at any nesting depth, produces a value.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Value};

use super::value::{AttrValue, Item};

/// Decode one attribute value into JSON
pub fn decode_value(value: &AttrValue) -> Value {
    match value {
        AttrValue::S(s) => Value::String(s.clone()),
        // Kept as a string so large or high-precision numbers survive intact
        AttrValue::N(n) => Value::String(n.clone()),
        AttrValue::Bool(b) => Value::Bool(*b),
        AttrValue::M(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), decode_value(v)))
                .collect(),
        ),
        AttrValue::L(list) => Value::Array(list.iter().map(decode_value).collect()),
        AttrValue::Ss(members) | AttrValue::Ns(members) => {
            Value::Array(members.iter().cloned().map(Value::String).collect())
        }
        AttrValue::Bs(members) => Value::Array(
            members
                .iter()
                .map(|b| Value::String(STANDARD.encode(b)))
                .collect(),
        ),
        AttrValue::B(bytes) => Value::String(STANDARD.encode(bytes)),
        AttrValue::Null(_) => Value::Null,
        AttrValue::Other(raw) => Value::String(raw.clone()),
    }
}

/// Decode a whole record into a JSON object
pub fn decode_item(item: &Item) -> Map<String, Value> {
    item.iter()
        .map(|(k, v)| (k.clone(), decode_value(v)))
        .collect()
}
