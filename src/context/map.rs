use std::collections::HashMap;

use crate::context::ChildPosition;
use crate::result::{illegal_operation, AvroResult};
use crate::schema::Schema;
use crate::types::Value;

/// An open map. Field names become keys; writing a key twice keeps the last value.
#[derive(Debug)]
pub(crate) struct MapContext {
    values_schema: Schema,
    entries: HashMap<String, Value>,
    pending_key: Option<String>,
}

impl MapContext {
    pub fn new(values_schema: Schema) -> Self {
        MapContext {
            values_schema,
            entries: HashMap::new(),
            pending_key: None,
        }
    }

    pub fn child_position(&self) -> AvroResult<ChildPosition<'_>> {
        match self.pending_key {
            Some(_) => Ok(ChildPosition::Schema(&self.values_schema)),
            None => illegal_operation("a map value must be preceded by a field name"),
        }
    }

    pub fn write_field_name(&mut self, name: &str) -> AvroResult<()> {
        if let Some(pending) = &self.pending_key {
            return illegal_operation(format!(
                "cannot write field name '{name}': map key '{pending}' is still waiting for its value"
            ));
        }
        self.pending_key = Some(name.to_owned());
        Ok(())
    }

    pub fn write_value(&mut self, value: Value) -> AvroResult<()> {
        match self.pending_key.take() {
            Some(key) => {
                self.entries.insert(key, value);
                Ok(())
            }
            None => illegal_operation("a map value must be preceded by a field name"),
        }
    }

    pub fn can_close(&self) -> bool {
        self.pending_key.is_none()
    }

    pub fn into_raw_value(self) -> Value {
        Value::Map(self.entries)
    }
}
