use crate::schema::Schema;
use crate::types::Value;

/// An open array. Items are appended in the order they are written.
#[derive(Debug)]
pub(crate) struct ArrayContext {
    items: Schema,
    values: Vec<Value>,
}

impl ArrayContext {
    pub fn new(items: Schema) -> Self {
        ArrayContext {
            items,
            values: Vec::new(),
        }
    }

    /// The schema of every item in this array.
    pub fn items(&self) -> &Schema {
        &self.items
    }

    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    pub fn into_raw_value(self) -> Value {
        Value::Array(self.values)
    }
}
