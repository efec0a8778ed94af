//! Reads a remote reply back into the method's declared response record.
//!
//! Declared fields are read in order. A key the reply omits, or sends as
//! `null`, keeps its zero value; keys the shape does not declare are dropped.
//! A value of the wrong JSON type fails the call as an invoke error.

use std::sync::Arc;

use serde_json::{Map, Value as Json};
use tracing::debug;

use super::bridge::Response;
use super::error::{Error, Result};
use super::shape::{FieldKind, FloatWidth, Record, Shape, Value};

pub fn decode_reply(shape: &Arc<Shape>, response: &Response) -> Result<Record> {
    decode_record(shape, &response.0, "")
}

fn decode_record(shape: &Arc<Shape>, map: &Map<String, Json>, prefix: &str) -> Result<Record> {
    for key in map.keys().filter(|k| shape.field(k).is_none()) {
        debug!(field = %format!("{prefix}{key}"), shape = %shape.name, "dropping undeclared reply field");
    }

    let mut record = Record::zeroed(Arc::clone(shape));
    for (field, slot) in record.slots_mut() {
        match map.get(&field.name) {
            None | Some(Json::Null) => {}
            Some(json) => {
                let path = format!("{prefix}{}", field.name);
                *slot = decode_field(&field.kind, json, &path)?;
            }
        }
    }
    Ok(record)
}

fn decode_field(kind: &FieldKind, json: &Json, path: &str) -> Result<Value> {
    let decoded = match kind {
        FieldKind::Str => json.as_str().map(|s| Value::Str(s.to_string())),
        FieldKind::Bool => json.as_bool().map(Value::Bool),
        FieldKind::Int(width) => json
            .as_i64()
            .filter(|n| width.holds_signed(*n))
            .map(Value::Int),
        FieldKind::Uint(width) => json
            .as_u64()
            .filter(|n| width.holds_unsigned(*n))
            .map(Value::Uint),
        FieldKind::Float(FloatWidth::W32) => json
            .as_f64()
            .map(|n| n as f32)
            .filter(|n| n.is_finite())
            .map(Value::F32),
        FieldKind::Float(FloatWidth::W64) => json.as_f64().map(Value::F64),
        FieldKind::Record(shape) => match json.as_object() {
            Some(map) => Some(Value::Record(decode_record(shape, map, &format!("{path}."))?)),
            None => None,
        },
        FieldKind::OptionalRecord(shape) => match json.as_object() {
            Some(map) => {
                let inner = decode_record(shape, map, &format!("{path}."))?;
                Some(Value::Optional(Some(Box::new(inner))))
            }
            None => None,
        },
        FieldKind::Other(_) => Some(Value::Json(json.clone())),
    };
    decoded.ok_or_else(|| Error::Invoke(format!("reply field '{path}': expected {kind}, got {json}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::shape::{FieldDef, IntWidth};
    use serde_json::json;

    fn response(body: Json) -> Response {
        let Json::Object(map) = body else {
            panic!("reply body must be an object");
        };
        Response(map)
    }

    fn locate_response() -> Arc<Shape> {
        let point = Shape::new("Point", vec![FieldDef::new("X", FieldKind::Int(IntWidth::W64))]);
        Shape::new(
            "LocateResponse",
            vec![
                FieldDef::new("Found", FieldKind::Bool),
                FieldDef::new("Name", FieldKind::Str),
                FieldDef::new("Score", FieldKind::Float(FloatWidth::W32)),
                FieldDef::new("At", FieldKind::OptionalRecord(point)),
                FieldDef::new("Tags", FieldKind::Other("[]string".into())),
            ],
        )
    }

    #[test]
    fn declared_order_and_zero_fill() {
        let rec = decode_reply(
            &locate_response(),
            &response(json!({"Tags": ["a"], "At": {"X": 4}, "Found": true})),
        )
        .unwrap();
        assert_eq!(
            serde_json::to_string(&rec).unwrap(),
            r#"{"Found":true,"Name":"","Score":0.0,"At":{"X":4},"Tags":["a"]}"#
        );
    }

    #[test]
    fn undeclared_keys_are_dropped_and_null_is_zero() {
        let rec = decode_reply(
            &locate_response(),
            &response(json!({"Zeta": 1, "Name": null, "At": null})),
        )
        .unwrap();
        assert_eq!(rec.get("Name"), Some(&Value::Str(String::new())));
        assert_eq!(rec.get("At"), Some(&Value::Optional(None)));
        assert!(rec.get("Zeta").is_none());
    }

    #[test]
    fn mistyped_fields_are_invoke_errors() {
        let cases = [
            json!({"Found": "not-a-bool"}),
            json!({"Name": 3}),
            json!({"Score": 1e40}),
            json!({"At": "x"}),
            json!({"At": {"X": 1.5}}),
        ];
        for body in cases {
            let err = decode_reply(&locate_response(), &response(body.clone())).unwrap_err();
            assert!(matches!(err, Error::Invoke(_)), "body {body}");
        }
        let err = decode_reply(&locate_response(), &response(json!({"At": {"X": "7"}}))).unwrap_err();
        assert!(err.to_string().contains("'At.X'"), "{err}");
    }
}
