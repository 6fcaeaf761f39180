use crate::result::{illegal_operation, AvroResult};
use crate::schema::Schema;
use crate::types::Value;

/// The bottom of the stack. Holds the schema of every top-level value and, briefly, the most
/// recently completed one until the generator takes it for encoding.
#[derive(Debug)]
pub(crate) struct RootContext {
    schema: Schema,
    completed: Option<Value>,
}

impl RootContext {
    pub fn new(schema: Schema) -> Self {
        RootContext {
            schema,
            completed: None,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn write_value(&mut self, value: Value) -> AvroResult<()> {
        if self.completed.is_some() {
            return illegal_operation("the previous top-level value has not been written out yet");
        }
        self.completed = Some(value);
        Ok(())
    }

    pub fn take_completed(&mut self) -> Option<Value> {
        self.completed.take()
    }
}
