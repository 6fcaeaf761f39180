use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use bigdecimal::BigDecimal;

use crate::types::Record;

/// A generic, schema-shaped value.
///
/// Values are assembled by the generator's write contexts and consumed by the
/// [`DatumWriter`](crate::DatumWriter). A `Value` is not bound to a schema by itself (with the
/// exception of [`Record`], which always knows its record schema); the schema position it is
/// written at decides how it is encoded.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Decimal(BigDecimal),
    Bytes(Vec<u8>),
    /// Text. Also used for enum symbols and, at character-hinted positions, for characters.
    String(String),
    Array(Vec<Value>),
    Map(HashMap<String, Value>),
    Record(Record),
    /// A datum that has already been Avro-encoded by the caller. Its bytes are copied to the
    /// output verbatim, bypassing union resolution and every other check.
    Encoded(Vec<u8>),
}

impl Value {
    /// A short, human-readable name for the kind of this value. Used in error messages.
    pub fn kind_name(&self) -> &'static str {
        use Value::*;
        match self {
            Null => "null",
            Boolean(_) => "boolean",
            Int(_) => "int",
            Long(_) => "long",
            Float(_) => "float",
            Double(_) => "double",
            Decimal(_) => "decimal",
            Bytes(_) => "bytes",
            String(_) => "string",
            Array(_) => "array",
            Map(_) => "map",
            Record(_) => "record",
            Encoded(_) => "encoded datum",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(values) => Some(values.as_slice()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Long(l) => write!(f, "{l}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::Bytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
            Value::String(text) => write!(f, "{text:?}"),
            Value::Array(values) => write!(f, "<array of {}>", values.len()),
            Value::Map(entries) => write!(f, "<map of {}>", entries.len()),
            Value::Record(record) => write!(f, "<record {}>", record.fullname()),
            Value::Encoded(bytes) => write!(f, "<{} pre-encoded bytes>", bytes.len()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Long(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<BigDecimal> for Value {
    fn from(value: BigDecimal) -> Self {
        Value::Decimal(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Bytes(value.to_vec())
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::Array(values)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(entries: HashMap<String, Value>) -> Self {
        Value::Map(entries)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(record)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}
