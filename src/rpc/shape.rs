//! Structured value model.
//!
//! A [`Shape`] is the static, ordered field table emitted for every generated
//! request/response type. A [`Record`] pairs a shape with one [`Value`] slot
//! per field, in the same order; fields are addressed by name and never added,
//! removed or reordered after construction.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
}

impl IntWidth {
    pub fn bits(self) -> u32 {
        match self {
            IntWidth::W8 => 8,
            IntWidth::W16 => 16,
            IntWidth::W32 => 32,
            IntWidth::W64 => 64,
        }
    }

    /// Whether a signed value fits in this width.
    pub fn holds_signed(self, n: i64) -> bool {
        let bits = self.bits();
        if bits == 64 {
            return true;
        }
        let max = (1i64 << (bits - 1)) - 1;
        let min = -(1i64 << (bits - 1));
        (min..=max).contains(&n)
    }

    /// Whether an unsigned value fits in this width.
    pub fn holds_unsigned(self, n: u64) -> bool {
        n <= u64::MAX >> (64 - self.bits())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatWidth {
    W32,
    W64,
}

/// Kind of a single field in a [`Shape`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Str,
    Int(IntWidth),
    Uint(IntWidth),
    Float(FloatWidth),
    Bool,
    /// Nested record stored by value.
    Record(Arc<Shape>),
    /// Nested record behind a nullable reference.
    OptionalRecord(Arc<Shape>),
    /// Arrays, maps and anything else the materializer does not fill.
    /// Carries the declared type text for display.
    Other(String),
}

impl FieldKind {
    /// Parse a scalar type name (`string`, `int32`, `float64`, ...).
    pub fn scalar(name: &str) -> Option<FieldKind> {
        let kind = match name {
            "string" => FieldKind::Str,
            "bool" => FieldKind::Bool,
            "int8" => FieldKind::Int(IntWidth::W8),
            "int16" => FieldKind::Int(IntWidth::W16),
            "int32" => FieldKind::Int(IntWidth::W32),
            "int64" | "int" => FieldKind::Int(IntWidth::W64),
            "uint8" | "byte" => FieldKind::Uint(IntWidth::W8),
            "uint16" => FieldKind::Uint(IntWidth::W16),
            "uint32" => FieldKind::Uint(IntWidth::W32),
            "uint64" | "uint" => FieldKind::Uint(IntWidth::W64),
            "float32" => FieldKind::Float(FloatWidth::W32),
            "float64" => FieldKind::Float(FloatWidth::W64),
            _ => return None,
        };
        Some(kind)
    }

    /// Zero value for a slot of this kind.
    pub fn zero_value(&self) -> Value {
        match self {
            FieldKind::Str => Value::Str(String::new()),
            FieldKind::Int(_) => Value::Int(0),
            FieldKind::Uint(_) => Value::Uint(0),
            FieldKind::Float(FloatWidth::W32) => Value::F32(0.0),
            FieldKind::Float(FloatWidth::W64) => Value::F64(0.0),
            FieldKind::Bool => Value::Bool(false),
            FieldKind::Record(shape) => Value::Record(Record::zeroed(Arc::clone(shape))),
            FieldKind::OptionalRecord(_) => Value::Optional(None),
            FieldKind::Other(_) => Value::Opaque,
        }
    }

    /// Nested shape for record kinds.
    pub fn nested(&self) -> Option<&Arc<Shape>> {
        match self {
            FieldKind::Record(shape) | FieldKind::OptionalRecord(shape) => Some(shape),
            _ => None,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Str => f.write_str("string"),
            FieldKind::Int(w) => write!(f, "int{}", w.bits()),
            FieldKind::Uint(w) => write!(f, "uint{}", w.bits()),
            FieldKind::Float(FloatWidth::W32) => f.write_str("float32"),
            FieldKind::Float(FloatWidth::W64) => f.write_str("float64"),
            FieldKind::Bool => f.write_str("bool"),
            FieldKind::Record(shape) => f.write_str(&shape.name),
            FieldKind::OptionalRecord(shape) => write!(f, "*{}", shape.name),
            FieldKind::Other(raw) => f.write_str(raw),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

impl Shape {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDef>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            fields,
        })
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A record instance: one slot per field of its shape, same order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    shape: Arc<Shape>,
    values: Vec<Value>,
}

impl Record {
    /// Freshly allocated instance with every field at its zero value.
    pub fn zeroed(shape: Arc<Shape>) -> Self {
        let values = shape.fields.iter().map(|f| f.kind.zero_value()).collect();
        Self { shape, values }
    }

    pub fn shape(&self) -> &Arc<Shape> {
        &self.shape
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        let idx = self.shape.fields.iter().position(|f| f.name == name)?;
        self.values.get(idx)
    }

    /// Iterate `(field, slot)` pairs mutably in declared order.
    pub fn slots_mut(&mut self) -> impl Iterator<Item = (&FieldDef, &mut Value)> {
        self.shape.fields.iter().zip(self.values.iter_mut())
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (field, value) in self.shape.fields.iter().zip(&self.values) {
            map.serialize_entry(&field.name, value)?;
        }
        map.end()
    }
}

/// Contents of one slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Uint(u64),
    F32(f32),
    F64(f64),
    Bool(bool),
    Record(Record),
    Optional(Option<Box<Record>>),
    /// Slot of a kind the materializer skips; serializes as `null`.
    Opaque,
    /// Reply payload for a skipped kind, kept exactly as received.
    Json(serde_json::Value),
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Int(_) => "integer",
            Value::Uint(_) => "unsigned integer",
            Value::F32(_) | Value::F64(_) => "float",
            Value::Bool(_) => "bool",
            Value::Record(_) => "record",
            Value::Optional(_) => "optional record",
            Value::Opaque => "opaque value",
            Value::Json(_) => "raw json",
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            Value::Optional(Some(r)) => Some(r),
            _ => None,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Str(s) => serializer.serialize_str(s),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Uint(n) => serializer.serialize_u64(*n),
            Value::F32(n) => serializer.serialize_f32(*n),
            Value::F64(n) => serializer.serialize_f64(*n),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Record(r) => r.serialize(serializer),
            Value::Optional(Some(r)) => r.serialize(serializer),
            Value::Optional(None) | Value::Opaque => serializer.serialize_none(),
            Value::Json(v) => v.serialize(serializer),
        }
    }
}
