use std::sync::Arc;

use delegate::delegate;

use crate::result::{schema_mismatch, AvroResult};
use crate::schema::RecordSchema;
use crate::types::Value;

/// An in-memory record: one positional slot per field declared by its schema.
///
/// A freshly created record holds each field's schema-declared default, or `null` for fields
/// without one. Writing a field replaces the value in its slot, so writing the same field twice
/// keeps the last value.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    schema: Arc<RecordSchema>,
    values: Vec<Value>,
}

impl Record {
    pub fn new(schema: Arc<RecordSchema>) -> Self {
        let values = schema
            .fields()
            .iter()
            .map(|field| field.default().cloned().unwrap_or(Value::Null))
            .collect();
        Record { schema, values }
    }

    pub fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    /// The full name (namespace included) of this record's schema.
    pub fn fullname(&self) -> &str {
        self.schema.name().fullname()
    }

    pub fn get(&self, field_name: &str) -> Option<&Value> {
        self.schema
            .field_position(field_name)
            .and_then(|position| self.values.get(position))
    }

    pub fn get_at(&self, position: usize) -> Option<&Value> {
        self.values.get(position)
    }

    /// Stores `value` in the slot of the field named `field_name`.
    pub fn put<V: Into<Value>>(&mut self, field_name: &str, value: V) -> AvroResult<()> {
        match self.schema.field_position(field_name) {
            Some(position) => {
                self.values[position] = value.into();
                Ok(())
            }
            None => schema_mismatch(format!(
                "record {} has no field named '{field_name}'",
                self.schema.name()
            )),
        }
    }

    /// Stores `value` at a position previously resolved against this record's schema.
    pub(crate) fn put_at(&mut self, position: usize, value: Value) {
        self.values[position] = value;
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Iterates over the (field name, value) pairs in schema-declared order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.schema
            .fields()
            .iter()
            .map(|field| field.name())
            .zip(self.values.iter())
    }

    delegate! {
        to self.values {
            pub fn len(&self) -> usize;
            pub fn is_empty(&self) -> bool;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::AvroError;
    use crate::schema::Schema;

    fn person_schema() -> Arc<RecordSchema> {
        let schema = Schema::parse_str(
            r#"{
                "type": "record", "name": "Person", "namespace": "com.example",
                "fields": [
                    {"name": "name", "type": "string"},
                    {"name": "age", "type": "int", "default": 18},
                    {"name": "email", "type": ["null", "string"], "default": null}
                ]
            }"#,
        )
        .unwrap();
        match schema {
            Schema::Record(record) => record,
            other => panic!("expected a record schema, found {other}"),
        }
    }

    #[test]
    fn new_records_hold_defaults() {
        let record = Record::new(person_schema());
        assert_eq!(record.len(), 3);
        assert_eq!(record.get("name"), Some(&Value::Null));
        assert_eq!(record.get("age"), Some(&Value::Int(18)));
        assert_eq!(record.get("email"), Some(&Value::Null));
        assert_eq!(record.fullname(), "com.example.Person");
    }

    #[test]
    fn put_overwrites_the_field_slot() -> AvroResult<()> {
        let mut record = Record::new(person_schema());
        record.put("age", 30)?;
        record.put("age", 31)?;
        assert_eq!(record.get("age"), Some(&Value::Int(31)));
        let names: Vec<&str> = record.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["name", "age", "email"]);
        Ok(())
    }

    #[test]
    fn put_rejects_unknown_fields() {
        let mut record = Record::new(person_schema());
        let error = record.put("nickname", "Bo").unwrap_err();
        assert!(matches!(error, AvroError::SchemaMismatch(_)));
    }
}
