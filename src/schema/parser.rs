use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};

use crate::result::{schema_error, schema_error_raw, AvroResult};
use crate::schema::{
    DecimalType, EnumSchema, FixedSchema, IntHint, Name, RecordField, RecordSchema, Schema,
    UnionSchema,
};
use crate::types::{Record, Value};

// The property schema generators use to mark an `int` as a character.
pub(crate) const JAVA_CLASS_PROPERTY: &str = "java-class";
pub(crate) const CHARACTER_CLASS: &str = "java.lang.Character";

impl Schema {
    /// Parses a schema from its JSON text.
    /// ```
    /// use avro_write::schema::{Schema, SchemaKind};
    /// # fn main() -> avro_write::AvroResult<()> {
    /// let schema = Schema::parse_str(r#"{"type": "array", "items": ["null", "string"]}"#)?;
    /// assert_eq!(schema.kind(), SchemaKind::Array);
    /// # Ok(())
    /// # }
    /// ```
    pub fn parse_str(text: &str) -> AvroResult<Schema> {
        let json: JsonValue = serde_json::from_str(text)?;
        Schema::parse(&json)
    }

    /// Parses a schema from an already-parsed JSON document.
    pub fn parse(json: &JsonValue) -> AvroResult<Schema> {
        SchemaParser::default().parse(json, None)
    }
}

/// Tracks the named types defined so far so that later parts of the document can refer to
/// them by name.
#[derive(Default)]
struct SchemaParser {
    named_types: HashMap<String, Schema>,
    // Full names of the named types whose definitions are still being parsed.
    in_progress: Vec<String>,
}

impl SchemaParser {
    fn parse(&mut self, json: &JsonValue, namespace: Option<&str>) -> AvroResult<Schema> {
        match json {
            JsonValue::String(name) => self.parse_type_name(name, namespace),
            JsonValue::Array(branches) => {
                let branches = branches
                    .iter()
                    .map(|branch| self.parse(branch, namespace))
                    .collect::<AvroResult<Vec<Schema>>>()?;
                Ok(Schema::Union(UnionSchema::new(branches)?))
            }
            JsonValue::Object(object) => self.parse_object(object, namespace),
            other => schema_error(format!("expected a schema, found '{other}'")),
        }
    }

    fn parse_type_name(&self, name: &str, namespace: Option<&str>) -> AvroResult<Schema> {
        if let Some(primitive) = primitive_schema(name) {
            return Ok(primitive);
        }
        let fullname = Name::with_enclosing_namespace(name, namespace)?
            .fullname()
            .to_owned();
        if let Some(schema) = self
            .named_types
            .get(&fullname)
            .or_else(|| self.named_types.get(name))
        {
            return Ok(schema.clone());
        }
        if self.in_progress.contains(&fullname) || self.in_progress.iter().any(|n| n == name) {
            return schema_error(format!(
                "recursive reference to '{fullname}' is not supported"
            ));
        }
        schema_error(format!("unknown type '{name}'"))
    }

    fn parse_object(
        &mut self,
        object: &Map<String, JsonValue>,
        namespace: Option<&str>,
    ) -> AvroResult<Schema> {
        let type_name = match object.get("type") {
            Some(JsonValue::String(type_name)) => type_name.as_str(),
            // {"type": {"type": "map", ...}} and {"type": ["null", "int"]}
            Some(nested) => return self.parse(nested, namespace),
            None => return schema_error("schema object is missing its 'type'"),
        };
        match type_name {
            "record" | "error" => self.parse_record(object, namespace),
            "enum" => self.parse_enum(object, namespace),
            "fixed" => self.parse_fixed(object, namespace),
            "array" => {
                let items = object
                    .get("items")
                    .ok_or_else(|| schema_error_raw("array schema is missing its 'items'"))?;
                Ok(Schema::Array(Box::new(self.parse(items, namespace)?)))
            }
            "map" => {
                let values = object
                    .get("values")
                    .ok_or_else(|| schema_error_raw("map schema is missing its 'values'"))?;
                Ok(Schema::Map(Box::new(self.parse(values, namespace)?)))
            }
            "int" => {
                let hint = match object.get(JAVA_CLASS_PROPERTY).and_then(JsonValue::as_str) {
                    Some(CHARACTER_CLASS) => Some(IntHint::Char),
                    _ => None,
                };
                Ok(Schema::Int { hint })
            }
            "bytes" => Ok(Schema::Bytes {
                decimal: parse_decimal(object)?,
            }),
            // Any other logical type annotates its underlying type, which is all we need to
            // encode it.
            other => self.parse_type_name(other, namespace),
        }
    }

    fn parse_record(
        &mut self,
        object: &Map<String, JsonValue>,
        namespace: Option<&str>,
    ) -> AvroResult<Schema> {
        let name = self.begin_named_type(object, namespace)?;
        let record_namespace = name.namespace().map(str::to_owned);
        let fields_json = object
            .get("fields")
            .and_then(JsonValue::as_array)
            .ok_or_else(|| schema_error_raw(format!("record {name} is missing its 'fields'")))?;

        let mut fields = Vec::with_capacity(fields_json.len());
        for field_json in fields_json {
            let field_name = field_json
                .get("name")
                .and_then(JsonValue::as_str)
                .ok_or_else(|| schema_error_raw(format!("a field of {name} has no 'name'")))?;
            let field_type = field_json.get("type").ok_or_else(|| {
                schema_error_raw(format!("field '{field_name}' of {name} has no 'type'"))
            })?;
            let field_schema = self.parse(field_type, record_namespace.as_deref())?;
            let mut field = RecordField::new(field_name, field_schema)?;
            if let Some(default) = field_json.get("default") {
                let default = default_value(field.schema(), default).map_err(|e| {
                    schema_error_raw(format!(
                        "invalid default for field '{field_name}' of {name}: {e}"
                    ))
                })?;
                field = field.with_default(default);
            }
            if let Some(doc) = field_json.get("doc").and_then(JsonValue::as_str) {
                field = field.with_doc(doc);
            }
            fields.push(field);
        }

        let mut record = RecordSchema::new(name, fields)?;
        if let Some(doc) = object.get("doc").and_then(JsonValue::as_str) {
            record = record.with_doc(doc);
        }
        Ok(self.finish_named_type(Schema::Record(Arc::new(record))))
    }

    fn parse_enum(
        &mut self,
        object: &Map<String, JsonValue>,
        namespace: Option<&str>,
    ) -> AvroResult<Schema> {
        let name = self.begin_named_type(object, namespace)?;
        let symbols = object
            .get("symbols")
            .and_then(JsonValue::as_array)
            .ok_or_else(|| schema_error_raw(format!("enum {name} is missing its 'symbols'")))?
            .iter()
            .map(|symbol| {
                symbol
                    .as_str()
                    .map(str::to_owned)
                    .ok_or_else(|| schema_error_raw(format!("enum {name} has a non-string symbol")))
            })
            .collect::<AvroResult<Vec<String>>>()?;
        let mut enum_schema = EnumSchema::new(name, symbols)?;
        if let Some(default) = object.get("default").and_then(JsonValue::as_str) {
            enum_schema = enum_schema.with_default(default)?;
        }
        Ok(self.finish_named_type(Schema::Enum(Arc::new(enum_schema))))
    }

    fn parse_fixed(
        &mut self,
        object: &Map<String, JsonValue>,
        namespace: Option<&str>,
    ) -> AvroResult<Schema> {
        let name = self.begin_named_type(object, namespace)?;
        let size = object
            .get("size")
            .and_then(JsonValue::as_u64)
            .ok_or_else(|| schema_error_raw(format!("fixed {name} is missing its 'size'")))?
            as usize;
        let mut fixed = FixedSchema::new(name, size);
        if let Some(decimal) = parse_decimal(object)? {
            fixed = fixed.with_decimal(decimal);
        }
        Ok(self.finish_named_type(Schema::Fixed(Arc::new(fixed))))
    }

    fn begin_named_type(
        &mut self,
        object: &Map<String, JsonValue>,
        namespace: Option<&str>,
    ) -> AvroResult<Name> {
        let name = object
            .get("name")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| schema_error_raw("named type is missing its 'name'"))?;
        let namespace = object
            .get("namespace")
            .and_then(JsonValue::as_str)
            .or(namespace);
        let name = Name::with_enclosing_namespace(name, namespace)?;
        let fullname = name.fullname().to_owned();
        if primitive_schema(name.name()).is_some() && name.namespace().is_none() {
            return schema_error(format!("'{fullname}' cannot be used as a type name"));
        }
        if self.named_types.contains_key(&fullname) || self.in_progress.contains(&fullname) {
            return schema_error(format!("the type {fullname} is defined more than once"));
        }
        self.in_progress.push(fullname);
        Ok(name)
    }

    fn finish_named_type(&mut self, schema: Schema) -> Schema {
        if let Some(fullname) = schema.fullname() {
            self.in_progress.retain(|name| name != fullname);
            self.named_types.insert(fullname.to_owned(), schema.clone());
        }
        schema
    }
}

fn primitive_schema(name: &str) -> Option<Schema> {
    let schema = match name {
        "null" => Schema::Null,
        "boolean" => Schema::Boolean,
        "int" => Schema::INT,
        "long" => Schema::Long,
        "float" => Schema::Float,
        "double" => Schema::Double,
        "bytes" => Schema::BYTES,
        "string" => Schema::String,
        _ => return None,
    };
    Some(schema)
}

fn parse_decimal(object: &Map<String, JsonValue>) -> AvroResult<Option<DecimalType>> {
    if object.get("logicalType").and_then(JsonValue::as_str) != Some("decimal") {
        return Ok(None);
    }
    let precision = object
        .get("precision")
        .and_then(JsonValue::as_u64)
        .ok_or_else(|| schema_error_raw("decimal logical type is missing its 'precision'"))?;
    let scale = object.get("scale").and_then(JsonValue::as_u64).unwrap_or(0);
    DecimalType::new(precision as usize, scale as usize).map(Some)
}

/// Converts a JSON field default into a [`Value`] shaped by `schema`, following the rules of
/// the Avro specification: a union's default belongs to its first branch, and `bytes`/`fixed`
/// defaults are strings whose code points are the byte values.
pub(crate) fn default_value(schema: &Schema, json: &JsonValue) -> AvroResult<Value> {
    let mismatch = || schema_error_raw(format!("'{json}' is not a valid {} default", schema.kind()));
    let value = match schema {
        Schema::Null => match json {
            JsonValue::Null => Value::Null,
            _ => return Err(mismatch()),
        },
        Schema::Boolean => Value::Boolean(json.as_bool().ok_or_else(mismatch)?),
        Schema::Int { .. } => {
            let int = json.as_i64().ok_or_else(mismatch)?;
            Value::Int(i32::try_from(int).map_err(|_| mismatch())?)
        }
        Schema::Long => Value::Long(json.as_i64().ok_or_else(mismatch)?),
        Schema::Float => Value::Float(json.as_f64().ok_or_else(mismatch)? as f32),
        Schema::Double => Value::Double(json.as_f64().ok_or_else(mismatch)?),
        Schema::Bytes { .. } | Schema::Fixed(_) => {
            let text = json.as_str().ok_or_else(mismatch)?;
            let bytes = text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).map_err(|_| mismatch()))
                .collect::<AvroResult<Vec<u8>>>()?;
            if let Schema::Fixed(fixed) = schema {
                if bytes.len() != fixed.size() {
                    return Err(mismatch());
                }
            }
            Value::Bytes(bytes)
        }
        Schema::String => Value::String(json.as_str().ok_or_else(mismatch)?.to_owned()),
        Schema::Enum(enum_schema) => {
            let symbol = json.as_str().ok_or_else(mismatch)?;
            if enum_schema.symbol_index(symbol).is_none() {
                return Err(mismatch());
            }
            Value::String(symbol.to_owned())
        }
        Schema::Array(items) => Value::Array(
            json.as_array()
                .ok_or_else(mismatch)?
                .iter()
                .map(|item| default_value(items, item))
                .collect::<AvroResult<Vec<Value>>>()?,
        ),
        Schema::Map(values) => Value::Map(
            json.as_object()
                .ok_or_else(mismatch)?
                .iter()
                .map(|(key, value)| Ok((key.clone(), default_value(values, value)?)))
                .collect::<AvroResult<HashMap<String, Value>>>()?,
        ),
        Schema::Record(record_schema) => {
            let object = json.as_object().ok_or_else(mismatch)?;
            let mut record = Record::new(Arc::clone(record_schema));
            for field in record_schema.fields() {
                let value = match object.get(field.name()) {
                    Some(field_json) => default_value(field.schema(), field_json)?,
                    None => field.default().cloned().ok_or_else(mismatch)?,
                };
                record.put_at(field.position(), value);
            }
            Value::Record(record)
        }
        Schema::Union(union) => {
            let first = union.branch(0).ok_or_else(mismatch)?;
            default_value(first, json)?
        }
    };
    Ok(value)
}
