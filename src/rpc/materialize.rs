//! Request materializer: fills a record from an argument bag, field by field,
//! driven by the record's shape.
//!
//! Fields are visited in declared order and the first failure aborts the
//! whole fill. Slots written before the failure keep their new values.

use std::str::FromStr;
use std::sync::Arc;

use tracing::trace;

use super::bag::{ArgumentBag, decode_bag};
use super::error::{Error, Result};
use super::shape::{FieldDef, FieldKind, FloatWidth, IntWidth, Record, Shape, Value};

/// Fill `target` (which must hold a record) from `bag`.
pub fn materialize(target: &mut Value, bag: &ArgumentBag) -> Result<()> {
    match target {
        Value::Record(record) => fill_record(record, bag),
        Value::Optional(Some(record)) => fill_record(record, bag),
        other => Err(Error::Shape {
            found: other.kind_name(),
        }),
    }
}

fn fill_record(record: &mut Record, bag: &ArgumentBag) -> Result<()> {
    for (field, slot) in record.slots_mut() {
        let raw = bag.get(&field.name).map(String::as_str);
        fill_field(field, slot, raw)?;
    }
    Ok(())
}

/// Scalar kinds the materializer parses from text.
#[derive(Debug, Clone, Copy)]
enum Scalar {
    Str,
    Bool,
    Int(IntWidth),
    Uint(IntWidth),
    Float(FloatWidth),
}

fn fill_field(field: &FieldDef, slot: &mut Value, raw: Option<&str>) -> Result<()> {
    let scalar = match &field.kind {
        FieldKind::Record(shape) => {
            let nested = decode_nested(field, raw)?;
            return match slot {
                Value::Record(inner) => fill_record(inner, &nested),
                _ => {
                    *slot = Value::Record(Record::zeroed(Arc::clone(shape)));
                    materialize(slot, &nested)
                }
            };
        }
        FieldKind::OptionalRecord(shape) => {
            let nested = decode_nested(field, raw)?;
            *slot = Value::Optional(Some(Box::new(Record::zeroed(Arc::clone(shape)))));
            return materialize(slot, &nested);
        }
        FieldKind::Other(declared) => {
            trace!(field = %field.name, kind = %declared, "skipping unsupported field kind");
            return Ok(());
        }
        FieldKind::Str => Scalar::Str,
        FieldKind::Bool => Scalar::Bool,
        FieldKind::Int(width) => Scalar::Int(*width),
        FieldKind::Uint(width) => Scalar::Uint(*width),
        FieldKind::Float(width) => Scalar::Float(*width),
    };
    // Absent scalar keys leave the zero value in place.
    let Some(raw) = raw else {
        return Ok(());
    };
    *slot = convert_scalar(field, scalar, raw)?;
    Ok(())
}

fn decode_nested(field: &FieldDef, raw: Option<&str>) -> Result<ArgumentBag> {
    decode_bag(raw.unwrap_or(""), &format!("field '{}'", field.name))
}

fn convert_scalar(field: &FieldDef, scalar: Scalar, raw: &str) -> Result<Value> {
    let value = match scalar {
        Scalar::Str => Value::Str(raw.to_string()),
        Scalar::Bool => Value::Bool(raw == "true"),
        Scalar::Int(width) => match raw.parse::<i64>() {
            Ok(n) if width.holds_signed(n) => Value::Int(n),
            _ => return Err(conversion(field, "integer", raw)),
        },
        Scalar::Uint(width) => match raw.parse::<u64>() {
            Ok(n) if width.holds_unsigned(n) => Value::Uint(n),
            _ => return Err(conversion(field, "integer", raw)),
        },
        Scalar::Float(FloatWidth::W32) => Value::F32(parse_float(field, raw)?),
        Scalar::Float(FloatWidth::W64) => Value::F64(parse_float(field, raw)?),
    };
    Ok(value)
}

/// Parse at the target precision. Overflow to infinity is a range error
/// unless the input itself spells out `inf`, `infinity` or `nan`.
fn parse_float<F>(field: &FieldDef, raw: &str) -> Result<F>
where
    F: FromStr + Into<f64> + Copy,
{
    let n: F = raw.parse().map_err(|_| conversion(field, "float", raw))?;
    let wide: f64 = n.into();
    if !wide.is_finite() && !names_non_finite(raw) {
        return Err(conversion(field, "float", raw));
    }
    Ok(n)
}

fn names_non_finite(raw: &str) -> bool {
    let body = raw
        .strip_prefix(['+', '-'])
        .unwrap_or(raw)
        .to_ascii_lowercase();
    matches!(body.as_str(), "inf" | "infinity" | "nan")
}

fn conversion(field: &FieldDef, expected: &'static str, got: &str) -> Error {
    Error::Conversion {
        field: field.name.clone(),
        expected,
        got: got.to_string(),
    }
}

/// Convenience for callers holding only a shape: allocate and fill a new record.
pub fn materialize_new(shape: &Arc<Shape>, bag: &ArgumentBag) -> Result<Value> {
    let mut value = Value::Record(Record::zeroed(Arc::clone(shape)));
    materialize(&mut value, bag)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag(pairs: &[(&str, &str)]) -> ArgumentBag {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn point() -> Arc<Shape> {
        Shape::new("Point", vec![FieldDef::new("X", FieldKind::Int(IntWidth::W64))])
    }

    fn scalars() -> Arc<Shape> {
        Shape::new(
            "Scalars",
            vec![
                FieldDef::new("Name", FieldKind::Str),
                FieldDef::new("Small", FieldKind::Int(IntWidth::W8)),
                FieldDef::new("Big", FieldKind::Int(IntWidth::W64)),
                FieldDef::new("Count", FieldKind::Uint(IntWidth::W32)),
                FieldDef::new("Ratio", FieldKind::Float(FloatWidth::W32)),
                FieldDef::new("Precise", FieldKind::Float(FloatWidth::W64)),
                FieldDef::new("On", FieldKind::Bool),
            ],
        )
    }

    fn field_of(value: &Value, name: &str) -> Value {
        value.as_record().unwrap().get(name).unwrap().clone()
    }

    #[test]
    fn scalars_read_back_as_parsed() {
        let filled = materialize_new(
            &scalars(),
            &bag(&[
                ("Name", "alice"),
                ("Small", "-12"),
                ("Big", "42"),
                ("Count", "7"),
                ("Ratio", "1.5"),
                ("Precise", "2.25"),
                ("On", "true"),
            ]),
        )
        .unwrap();
        assert_eq!(field_of(&filled, "Name"), Value::Str("alice".into()));
        assert_eq!(field_of(&filled, "Small"), Value::Int(-12));
        assert_eq!(field_of(&filled, "Big"), Value::Int(42));
        assert_eq!(field_of(&filled, "Count"), Value::Uint(7));
        assert_eq!(field_of(&filled, "Ratio"), Value::F32(1.5));
        assert_eq!(field_of(&filled, "Precise"), Value::F64(2.25));
        assert_eq!(field_of(&filled, "On"), Value::Bool(true));
    }

    #[test]
    fn only_exact_true_is_true() {
        for raw in ["TRUE", "True", "false", "", "1", "yes"] {
            let filled = materialize_new(&scalars(), &bag(&[("On", raw)])).unwrap();
            assert_eq!(field_of(&filled, "On"), Value::Bool(false), "input {raw:?}");
        }
    }

    #[test]
    fn missing_keys_keep_zero_values() {
        let filled = materialize_new(&scalars(), &ArgumentBag::new()).unwrap();
        assert_eq!(field_of(&filled, "Name"), Value::Str(String::new()));
        assert_eq!(field_of(&filled, "Big"), Value::Int(0));
        assert_eq!(field_of(&filled, "Count"), Value::Uint(0));
        assert_eq!(field_of(&filled, "Precise"), Value::F64(0.0));
        assert_eq!(field_of(&filled, "On"), Value::Bool(false));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let filled = materialize_new(&scalars(), &bag(&[("Nope", "x"), ("Big", "1")])).unwrap();
        assert_eq!(field_of(&filled, "Big"), Value::Int(1));
    }

    #[test]
    fn bad_numbers_are_conversion_errors() {
        let cases = [
            ("Big", "4x2", "integer"),
            ("Big", "", "integer"),
            ("Small", "300", "integer"),
            ("Count", "-1", "integer"),
            ("Ratio", "one", "float"),
            ("Ratio", "1e40", "float"),
            ("Precise", "1e400", "float"),
            ("Precise", "-1e400", "float"),
        ];
        for (field, raw, want) in cases {
            let err = materialize_new(&scalars(), &bag(&[(field, raw)])).unwrap_err();
            match err {
                Error::Conversion {
                    field: f,
                    expected,
                    got,
                } => {
                    assert_eq!(f, field);
                    assert_eq!(expected, want);
                    assert_eq!(got, raw);
                }
                other => panic!("unexpected error for {field}={raw:?}: {other}"),
            }
        }
    }

    #[test]
    fn float_range_follows_declared_precision() {
        let err = materialize_new(&scalars(), &bag(&[("Ratio", "3.4e39")])).unwrap_err();
        assert!(matches!(err, Error::Conversion { ref field, expected: "float", .. } if field == "Ratio"));
        assert!(materialize_new(&scalars(), &bag(&[("Ratio", "1e300")])).is_err());

        let filled = materialize_new(&scalars(), &bag(&[("Precise", "1e300")])).unwrap();
        assert_eq!(field_of(&filled, "Precise"), Value::F64(1e300));
        let filled = materialize_new(&scalars(), &bag(&[("Ratio", "3.4e38")])).unwrap();
        assert_eq!(field_of(&filled, "Ratio"), Value::F32(3.4e38));
    }

    #[test]
    fn spelled_out_infinity_is_accepted() {
        let filled = materialize_new(
            &scalars(),
            &bag(&[("Ratio", "-inf"), ("Precise", "Infinity")]),
        )
        .unwrap();
        assert_eq!(field_of(&filled, "Ratio"), Value::F32(f32::NEG_INFINITY));
        assert_eq!(field_of(&filled, "Precise"), Value::F64(f64::INFINITY));
        let filled = materialize_new(&scalars(), &bag(&[("Precise", "NaN")])).unwrap();
        assert!(matches!(field_of(&filled, "Precise"), Value::F64(n) if n.is_nan()));
    }

    #[test]
    fn first_failure_wins_and_later_fields_are_untouched() {
        let shape = Shape::new(
            "Pair",
            vec![
                FieldDef::new("A", FieldKind::Int(IntWidth::W64)),
                FieldDef::new("B", FieldKind::Int(IntWidth::W64)),
            ],
        );
        let mut value = Value::Record(Record::zeroed(shape));
        let err = materialize(&mut value, &bag(&[("A", "x"), ("B", "5")])).unwrap_err();
        assert!(matches!(err, Error::Conversion { ref field, .. } if field == "A"));
        assert_eq!(field_of(&value, "B"), Value::Int(0));
    }

    #[test]
    fn earlier_writes_survive_a_later_failure() {
        let shape = Shape::new(
            "Pair",
            vec![
                FieldDef::new("A", FieldKind::Int(IntWidth::W64)),
                FieldDef::new("B", FieldKind::Int(IntWidth::W64)),
            ],
        );
        let mut value = Value::Record(Record::zeroed(shape));
        assert!(materialize(&mut value, &bag(&[("A", "3"), ("B", "y")])).is_err());
        assert_eq!(field_of(&value, "A"), Value::Int(3));
    }

    #[test]
    fn optional_nested_is_freshly_allocated() {
        let shape = Shape::new("Req", vec![FieldDef::new("Near", FieldKind::OptionalRecord(point()))]);
        let filled = materialize_new(&shape, &bag(&[("Near", r#"{"X":"5"}"#)])).unwrap();
        let Value::Optional(Some(near)) = field_of(&filled, "Near") else {
            panic!("Near should be allocated");
        };
        assert_eq!(near.get("X"), Some(&Value::Int(5)));
    }

    #[test]
    fn absent_or_malformed_nested_is_decode_error() {
        let shape = Shape::new("Req", vec![FieldDef::new("Near", FieldKind::OptionalRecord(point()))]);
        let err = materialize_new(&shape, &ArgumentBag::new()).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
        let err = materialize_new(&shape, &bag(&[("Near", "{X:5")])).unwrap_err();
        assert!(matches!(err, Error::Decode { ref context, .. } if context.contains("Near")));
    }

    #[test]
    fn by_value_nested_fills_its_own_slot() {
        let shape = Shape::new(
            "Req",
            vec![
                FieldDef::new("X", FieldKind::Int(IntWidth::W64)),
                FieldDef::new("At", FieldKind::Record(point())),
            ],
        );
        let filled = materialize_new(&shape, &bag(&[("X", "1"), ("At", r#"{"X":"9"}"#)])).unwrap();
        assert_eq!(field_of(&filled, "X"), Value::Int(1));
        let at = field_of(&filled, "At");
        assert_eq!(at.as_record().unwrap().get("X"), Some(&Value::Int(9)));
    }

    #[test]
    fn nested_failures_abort_the_whole_fill() {
        let shape = Shape::new("Req", vec![FieldDef::new("At", FieldKind::Record(point()))]);
        let err = materialize_new(&shape, &bag(&[("At", r#"{"X":"nope"}"#)])).unwrap_err();
        assert!(matches!(err, Error::Conversion { ref field, .. } if field == "X"));
    }

    #[test]
    fn two_levels_of_nesting() {
        let inner = Shape::new(
            "Inner",
            vec![FieldDef::new("P", FieldKind::OptionalRecord(point()))],
        );
        let outer = Shape::new("Outer", vec![FieldDef::new("I", FieldKind::OptionalRecord(inner))]);
        let filled = materialize_new(
            &outer,
            &bag(&[("I", r#"{"P":"{\"X\":\"11\"}"}"#)]),
        )
        .unwrap();
        let i = field_of(&filled, "I");
        let p = i.as_record().unwrap().get("P").unwrap();
        assert_eq!(p.as_record().unwrap().get("X"), Some(&Value::Int(11)));
    }

    #[test]
    fn other_kinds_are_skipped() {
        let shape = Shape::new(
            "Req",
            vec![
                FieldDef::new("Tags", FieldKind::Other("[]string".into())),
                FieldDef::new("Name", FieldKind::Str),
            ],
        );
        let filled =
            materialize_new(&shape, &bag(&[("Tags", "not even json"), ("Name", "n")])).unwrap();
        assert_eq!(field_of(&filled, "Tags"), Value::Opaque);
        assert_eq!(field_of(&filled, "Name"), Value::Str("n".into()));
    }

    #[test]
    fn non_record_target_is_shape_error() {
        let mut value = Value::Int(3);
        let err = materialize(&mut value, &ArgumentBag::new()).unwrap_err();
        assert!(matches!(err, Error::Shape { found: "integer" }));
        let mut empty = Value::Optional(None);
        assert!(matches!(
            materialize(&mut empty, &ArgumentBag::new()),
            Err(Error::Shape { .. })
        ));
    }
}
