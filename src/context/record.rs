use std::sync::Arc;

use log::trace;

use crate::context::ChildPosition;
use crate::result::{illegal_operation, schema_mismatch, AvroResult};
use crate::schema::RecordSchema;
use crate::types::{Record, Value};
use crate::write_config::UnknownFieldPolicy;

// What the next value written to a record is for.
#[derive(Debug, PartialEq)]
enum PendingField {
    None,
    Field(usize),
    // A field the schema does not declare, whose value will be discarded.
    Unknown(String),
}

/// An open record. Values are stored in the slot of the field they were written for; slots
/// that are never written keep their schema default.
#[derive(Debug)]
pub(crate) struct RecordContext {
    record: Record,
    pending: PendingField,
}

impl RecordContext {
    pub fn new(schema: Arc<RecordSchema>) -> Self {
        RecordContext {
            record: Record::new(schema),
            pending: PendingField::None,
        }
    }

    pub fn child_position(&self) -> AvroResult<ChildPosition<'_>> {
        match &self.pending {
            PendingField::Field(position) => {
                let field = &self.record.schema().fields()[*position];
                Ok(ChildPosition::Schema(field.schema()))
            }
            PendingField::Unknown(_) => Ok(ChildPosition::Discard),
            PendingField::None => self.missing_field_name(),
        }
    }

    pub fn write_field_name(&mut self, name: &str, policy: UnknownFieldPolicy) -> AvroResult<()> {
        if self.pending != PendingField::None {
            return illegal_operation(format!(
                "cannot write field name '{name}' in {}: the previous field is still waiting for its value",
                self.record.fullname()
            ));
        }
        self.pending = match (self.record.schema().field_position(name), policy) {
            (Some(position), _) => PendingField::Field(position),
            (None, UnknownFieldPolicy::Ignore) => PendingField::Unknown(name.to_owned()),
            (None, UnknownFieldPolicy::Fail) => {
                return schema_mismatch(format!(
                    "record {} has no field named '{name}'",
                    self.record.fullname()
                ))
            }
        };
        Ok(())
    }

    pub fn write_value(&mut self, value: Value) -> AvroResult<()> {
        match std::mem::replace(&mut self.pending, PendingField::None) {
            PendingField::Field(position) => {
                self.record.put_at(position, value);
                Ok(())
            }
            PendingField::Unknown(name) => {
                trace!("skipping unknown field '{name}' of {}", self.record.fullname());
                Ok(())
            }
            PendingField::None => self.missing_field_name(),
        }
    }

    /// Completes an unknown field whose value was a discarded array or object.
    pub fn discard_value(&mut self) {
        if let PendingField::Unknown(name) = &self.pending {
            trace!("skipped nested value of unknown field '{name}'");
            self.pending = PendingField::None;
        }
    }

    pub fn can_close(&self) -> bool {
        self.pending == PendingField::None
    }

    pub fn into_raw_value(self) -> Value {
        Value::Record(self.record)
    }

    fn missing_field_name<T>(&self) -> AvroResult<T> {
        illegal_operation(format!(
            "a value in record {} must be preceded by a field name",
            self.record.fullname()
        ))
    }
}
