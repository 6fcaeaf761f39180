use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::{json, Map, Number as JsonNumber, Value as JsonValue};

use crate::schema::parser::{CHARACTER_CLASS, JAVA_CLASS_PROPERTY};
use crate::schema::{DecimalType, IntHint, Name, Schema};
use crate::types::Value;

impl Schema {
    /// Renders this schema as Avro schema JSON. Each named type is defined where it first
    /// appears and referred to by its full name afterwards, so the output parses back into an
    /// equivalent schema.
    pub fn to_json(&self) -> JsonValue {
        SchemaRenderer::default().render(self, None)
    }

    /// Returns a copy of this schema in which every record field whose type is a union with
    /// `null` as its first branch, and which has no default of its own, defaults to `null`.
    ///
    /// Records written against the returned schema can leave such fields out entirely.
    pub fn with_null_defaults(&self) -> Schema {
        add_null_defaults(self, &mut HashMap::new())
    }
}

#[derive(Default)]
struct SchemaRenderer {
    defined: HashSet<String>,
}

impl SchemaRenderer {
    fn render(&mut self, schema: &Schema, namespace: Option<&str>) -> JsonValue {
        match schema {
            Schema::Null => json!("null"),
            Schema::Boolean => json!("boolean"),
            Schema::Int { hint: None } => json!("int"),
            Schema::Int {
                hint: Some(IntHint::Char),
            } => json!({"type": "int", JAVA_CLASS_PROPERTY: CHARACTER_CLASS}),
            Schema::Long => json!("long"),
            Schema::Float => json!("float"),
            Schema::Double => json!("double"),
            Schema::Bytes { decimal: None } => json!("bytes"),
            Schema::Bytes {
                decimal: Some(decimal),
            } => {
                let mut object = Map::new();
                object.insert("type".into(), json!("bytes"));
                add_decimal_properties(&mut object, decimal);
                JsonValue::Object(object)
            }
            Schema::String => json!("string"),
            Schema::Array(items) => json!({"type": "array", "items": self.render(items, namespace)}),
            Schema::Map(values) => json!({"type": "map", "values": self.render(values, namespace)}),
            Schema::Union(union) => JsonValue::Array(
                union
                    .branches()
                    .iter()
                    .map(|branch| self.render(branch, namespace))
                    .collect(),
            ),
            Schema::Record(record) => {
                let Some(mut object) = self.begin_named(record.name(), namespace, "record") else {
                    return json!(record.name().fullname());
                };
                if let Some(doc) = record.doc() {
                    object.insert("doc".into(), json!(doc));
                }
                let fields = record
                    .fields()
                    .iter()
                    .map(|field| {
                        let mut field_json = Map::new();
                        field_json.insert("name".into(), json!(field.name()));
                        field_json.insert(
                            "type".into(),
                            self.render(field.schema(), record.name().namespace()),
                        );
                        if let Some(doc) = field.doc() {
                            field_json.insert("doc".into(), json!(doc));
                        }
                        if let Some(default) = field.default() {
                            field_json.insert("default".into(), value_to_json(default));
                        }
                        JsonValue::Object(field_json)
                    })
                    .collect();
                object.insert("fields".into(), JsonValue::Array(fields));
                JsonValue::Object(object)
            }
            Schema::Enum(enum_schema) => {
                let Some(mut object) = self.begin_named(enum_schema.name(), namespace, "enum")
                else {
                    return json!(enum_schema.name().fullname());
                };
                object.insert("symbols".into(), json!(enum_schema.symbols()));
                if let Some(default) = enum_schema.default() {
                    object.insert("default".into(), json!(default));
                }
                JsonValue::Object(object)
            }
            Schema::Fixed(fixed) => {
                let Some(mut object) = self.begin_named(fixed.name(), namespace, "fixed") else {
                    return json!(fixed.name().fullname());
                };
                object.insert("size".into(), json!(fixed.size()));
                if let Some(decimal) = fixed.decimal() {
                    add_decimal_properties(&mut object, &decimal);
                }
                JsonValue::Object(object)
            }
        }
    }

    // Returns `None` if the type has already been defined, in which case the caller emits a
    // reference instead.
    fn begin_named(
        &mut self,
        name: &Name,
        namespace: Option<&str>,
        type_name: &str,
    ) -> Option<Map<String, JsonValue>> {
        if !self.defined.insert(name.fullname().to_owned()) {
            return None;
        }
        let mut object = Map::new();
        object.insert("type".into(), json!(type_name));
        object.insert("name".into(), json!(name.name()));
        if name.namespace() != namespace {
            object.insert("namespace".into(), json!(name.namespace().unwrap_or("")));
        }
        Some(object)
    }
}

fn add_decimal_properties(object: &mut Map<String, JsonValue>, decimal: &DecimalType) {
    object.insert("logicalType".into(), json!("decimal"));
    object.insert("precision".into(), json!(decimal.precision()));
    object.insert("scale".into(), json!(decimal.scale()));
}

/// Renders a field default the way it is spelled in schema JSON.
pub(crate) fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Boolean(b) => json!(b),
        Value::Int(i) => json!(i),
        Value::Long(l) => json!(l),
        Value::Float(f) => JsonNumber::from_f64(f64::from(*f))
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::Double(d) => JsonNumber::from_f64(*d)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::Decimal(d) => json!(d.to_string()),
        Value::Bytes(bytes) | Value::Encoded(bytes) => {
            JsonValue::String(bytes.iter().map(|b| char::from(*b)).collect())
        }
        Value::String(text) => json!(text),
        Value::Array(values) => JsonValue::Array(values.iter().map(value_to_json).collect()),
        Value::Map(entries) => JsonValue::Object(
            entries
                .iter()
                .map(|(key, value)| (key.clone(), value_to_json(value)))
                .collect(),
        ),
        Value::Record(record) => JsonValue::Object(
            record
                .iter()
                .map(|(name, value)| (name.to_owned(), value_to_json(value)))
                .collect(),
        ),
    }
}

fn add_null_defaults(schema: &Schema, rewritten: &mut HashMap<String, Schema>) -> Schema {
    match schema {
        Schema::Record(record) => {
            let fullname = record.name().fullname().to_owned();
            if let Some(done) = rewritten.get(&fullname) {
                return done.clone();
            }
            let mut record = record.as_ref().clone();
            for field in &mut record.fields {
                field.schema = add_null_defaults(&field.schema, rewritten);
                let null_first = matches!(
                    &field.schema,
                    Schema::Union(union) if matches!(union.branch(0), Some(Schema::Null))
                );
                if field.default.is_none() && null_first {
                    field.default = Some(Value::Null);
                }
            }
            let schema = Schema::Record(Arc::new(record));
            rewritten.insert(fullname, schema.clone());
            schema
        }
        Schema::Array(items) => Schema::Array(Box::new(add_null_defaults(items, rewritten))),
        Schema::Map(values) => Schema::Map(Box::new(add_null_defaults(values, rewritten))),
        Schema::Union(union) => {
            let mut union = union.clone();
            for branch in &mut union.branches {
                *branch = add_null_defaults(branch, rewritten);
            }
            Schema::Union(union)
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::AvroResult;

    const ORDER: &str = r#"{
        "type": "record", "name": "Order", "namespace": "shop",
        "fields": [
            {"name": "id", "type": "long"},
            {"name": "initial", "type": {"type": "int", "java-class": "java.lang.Character"}},
            {"name": "price", "type": {"type": "fixed", "name": "Price", "size": 8,
                "logicalType": "decimal", "precision": 12, "scale": 2}},
            {"name": "discount", "type": ["null", "Price"]},
            {"name": "note", "type": ["null", "string"], "default": null},
            {"name": "customer", "type": {"type": "record", "name": "Customer",
                "namespace": "crm", "fields": [
                    {"name": "email", "type": ["null", "string"]},
                    {"name": "tier", "type": ["string", "null"]}
                ]}}
        ]
    }"#;

    #[test]
    fn rendered_json_parses_back_to_the_same_schema() -> AvroResult<()> {
        let schema = Schema::parse_str(ORDER)?;
        let rendered = schema.to_json();
        assert_eq!(rendered["fields"][3]["type"][1], json!("shop.Price"));
        assert_eq!(rendered["fields"][5]["type"]["namespace"], json!("crm"));
        assert_eq!(Schema::parse(&rendered)?, schema);
        Ok(())
    }

    #[test]
    fn null_defaults_are_added_to_optional_fields() -> AvroResult<()> {
        let schema = Schema::parse_str(ORDER)?.with_null_defaults();
        let Schema::Record(order) = &schema else {
            panic!("expected a record schema");
        };
        assert_eq!(order.field("id").unwrap().default(), None);
        assert_eq!(order.field("discount").unwrap().default(), Some(&Value::Null));
        assert_eq!(order.field("note").unwrap().default(), Some(&Value::Null));
        let Schema::Record(customer) = order.field("customer").unwrap().schema() else {
            panic!("expected a record schema");
        };
        assert_eq!(customer.field("email").unwrap().default(), Some(&Value::Null));
        // Only unions that start with null qualify.
        assert_eq!(customer.field("tier").unwrap().default(), None);
        Ok(())
    }
}
