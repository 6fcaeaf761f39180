//! The write-context stack.
//!
//! Each open array or object in the event stream is one frame on the stack. A frame knows the
//! schema of the values written into it and assembles them into an in-memory [`Value`]. When a
//! frame is closed, the value it built is stored into the frame below it, just as a scalar
//! written at that position would have been. The bottom frame is the root, which hands each
//! completed top-level value to the generator.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use crate::result::{configuration_error, illegal_operation, schema_mismatch, AvroResult};
use crate::schema::Schema;
use crate::types::Value;
use crate::union_resolver::{
    narrow_to_array, narrow_to_record_or_map, resolve_union_schema, UnionFallback, ValueShape,
};
use crate::write_config::UnknownFieldPolicy;

mod array;
mod map;
mod record;
mod root;

use array::ArrayContext;
use map::MapContext;
use record::RecordContext;
use root::RootContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Array,
    Object,
}

impl Display for ContainerKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ContainerKind::Array => write!(f, "array"),
            ContainerKind::Object => write!(f, "object"),
        }
    }
}

/// Where the next value written to a context will go.
pub(crate) enum ChildPosition<'a> {
    Schema(&'a Schema),
    /// Nowhere; the value belongs to an ignored field.
    Discard,
}

#[derive(Debug)]
pub(crate) enum WriteContext {
    Root(RootContext),
    Array(ArrayContext),
    Record(RecordContext),
    Map(MapContext),
    /// Swallows an ignored subtree. Nested arrays and objects get a `Nop` of their own.
    Nop(ContainerKind),
    /// Stands in for the root when the generator has no schema.
    Null,
}

impl WriteContext {
    fn kind(&self) -> Option<ContainerKind> {
        match self {
            WriteContext::Array(_) | WriteContext::Nop(ContainerKind::Array) => {
                Some(ContainerKind::Array)
            }
            WriteContext::Record(_) | WriteContext::Map(_) | WriteContext::Nop(ContainerKind::Object) => {
                Some(ContainerKind::Object)
            }
            WriteContext::Root(_) | WriteContext::Null => None,
        }
    }

    fn child_position(&self) -> AvroResult<ChildPosition<'_>> {
        match self {
            WriteContext::Root(root) => Ok(ChildPosition::Schema(root.schema())),
            WriteContext::Array(array) => Ok(ChildPosition::Schema(array.items())),
            WriteContext::Record(record) => record.child_position(),
            WriteContext::Map(map) => map.child_position(),
            WriteContext::Nop(_) => Ok(ChildPosition::Discard),
            WriteContext::Null => no_schema(),
        }
    }

    /// Creates the context for an array starting at this context's current position.
    fn create_child_array(&self) -> AvroResult<WriteContext> {
        let schema = match self.child_position()? {
            ChildPosition::Discard => return Ok(WriteContext::Nop(ContainerKind::Array)),
            ChildPosition::Schema(Schema::Union(union)) => {
                &union.branches()[narrow_to_array(union)?]
            }
            ChildPosition::Schema(schema) => schema,
        };
        match schema {
            Schema::Array(items) => Ok(WriteContext::Array(ArrayContext::new(
                items.as_ref().clone(),
            ))),
            other => schema_mismatch(format!(
                "an array cannot be written at a(n) {} position",
                other.kind()
            )),
        }
    }

    /// Creates the context for an object starting at this context's current position. If the
    /// caller named the record type, a union position resolves to the record branch of that
    /// name; otherwise it resolves to the union's only record or map branch.
    fn create_child_object(
        &self,
        record_name: Option<&str>,
        fallback: &dyn UnionFallback,
    ) -> AvroResult<WriteContext> {
        let schema = match (self.child_position()?, record_name) {
            (ChildPosition::Discard, _) => return Ok(WriteContext::Nop(ContainerKind::Object)),
            (ChildPosition::Schema(Schema::Union(union)), Some(name)) => {
                resolve_union_schema(union, &ValueShape::Record(name), fallback)?
            }
            (ChildPosition::Schema(Schema::Union(union)), None) => {
                &union.branches()[narrow_to_record_or_map(union)?]
            }
            (ChildPosition::Schema(schema), _) => schema,
        };
        match schema {
            Schema::Record(record_schema) => {
                if let Some(name) = record_name {
                    if name != record_schema.name().fullname() {
                        return schema_mismatch(format!(
                            "a {name} record cannot be written where {} is expected",
                            record_schema.name()
                        ));
                    }
                }
                Ok(WriteContext::Record(RecordContext::new(Arc::clone(
                    record_schema,
                ))))
            }
            Schema::Map(values) => Ok(WriteContext::Map(MapContext::new(
                values.as_ref().clone(),
            ))),
            other => schema_mismatch(format!(
                "an object cannot be written at a(n) {} position",
                other.kind()
            )),
        }
    }

    fn write_value(&mut self, value: Value) -> AvroResult<()> {
        match self {
            WriteContext::Root(root) => root.write_value(value),
            WriteContext::Array(array) => {
                array.push(value);
                Ok(())
            }
            WriteContext::Record(record) => record.write_value(value),
            WriteContext::Map(map) => map.write_value(value),
            WriteContext::Nop(_) => Ok(()),
            WriteContext::Null => no_schema(),
        }
    }

    fn discard_value(&mut self) {
        if let WriteContext::Record(record) = self {
            record.discard_value();
        }
    }

    fn write_field_name(&mut self, name: &str, policy: UnknownFieldPolicy) -> AvroResult<()> {
        match self {
            WriteContext::Record(record) => record.write_field_name(name, policy),
            WriteContext::Map(map) => map.write_field_name(name),
            WriteContext::Nop(_) => Ok(()),
            WriteContext::Root(_) => {
                illegal_operation(format!("field name '{name}' written outside of an object"))
            }
            WriteContext::Array(_) => {
                illegal_operation(format!("field name '{name}' written inside an array"))
            }
            WriteContext::Null => no_schema(),
        }
    }

    fn can_close(&self) -> bool {
        match self {
            WriteContext::Record(record) => record.can_close(),
            WriteContext::Map(map) => map.can_close(),
            _ => true,
        }
    }

    // Returns `None` for contexts whose contents are discarded.
    fn into_raw_value(self) -> Option<Value> {
        match self {
            WriteContext::Array(array) => Some(array.into_raw_value()),
            WriteContext::Record(record) => Some(record.into_raw_value()),
            WriteContext::Map(map) => Some(map.into_raw_value()),
            WriteContext::Root(_) | WriteContext::Nop(_) | WriteContext::Null => None,
        }
    }
}

fn no_schema<T>() -> AvroResult<T> {
    configuration_error("no schema supplied")
}

/// The stack of open contexts, with the root kept apart so the stack is never empty.
#[derive(Debug)]
pub(crate) struct ContextStack {
    root: WriteContext,
    children: Vec<WriteContext>,
    fallback: Arc<dyn UnionFallback>,
    unknown_fields: UnknownFieldPolicy,
}

impl ContextStack {
    pub fn new(
        schema: Option<Schema>,
        fallback: Arc<dyn UnionFallback>,
        unknown_fields: UnknownFieldPolicy,
    ) -> Self {
        let root = match schema {
            Some(schema) => WriteContext::Root(RootContext::new(schema)),
            None => WriteContext::Null,
        };
        ContextStack {
            root,
            children: Vec::new(),
            fallback,
            unknown_fields,
        }
    }

    pub fn schema(&self) -> Option<&Schema> {
        match &self.root {
            WriteContext::Root(root) => Some(root.schema()),
            _ => None,
        }
    }

    fn current(&self) -> &WriteContext {
        self.children.last().unwrap_or(&self.root)
    }

    fn current_mut(&mut self) -> &mut WriteContext {
        self.children.last_mut().unwrap_or(&mut self.root)
    }

    /// The number of arrays and objects that are open.
    pub fn depth(&self) -> usize {
        self.children.len()
    }

    /// The kind of the innermost open array or object.
    pub fn current_kind(&self) -> Option<ContainerKind> {
        self.current().kind()
    }

    /// Whether the innermost context could be closed now.
    pub fn can_close(&self) -> bool {
        self.current().can_close()
    }

    pub fn start_array(&mut self) -> AvroResult<()> {
        let child = self.current().create_child_array()?;
        self.children.push(child);
        Ok(())
    }

    pub fn start_object(&mut self, record_name: Option<&str>) -> AvroResult<()> {
        let child = self
            .current()
            .create_child_object(record_name, self.fallback.as_ref())?;
        self.children.push(child);
        Ok(())
    }

    pub fn end(&mut self, kind: ContainerKind) -> AvroResult<()> {
        let Some(top) = self.children.last() else {
            if let WriteContext::Null = self.root {
                return no_schema();
            }
            return illegal_operation(format!("cannot end a(n) {kind}: none is open"));
        };
        if top.kind() != Some(kind) {
            return illegal_operation(format!(
                "cannot end a(n) {kind} while a(n) {} is open",
                top.kind().map_or("value".to_owned(), |k| k.to_string())
            ));
        }
        if !self.can_close() {
            return illegal_operation(format!(
                "cannot end the {kind}: a field is still waiting for its value"
            ));
        }
        if let Some(child) = self.children.pop() {
            match child.into_raw_value() {
                Some(value) => self.current_mut().write_value(value)?,
                None => self.current_mut().discard_value(),
            }
        }
        Ok(())
    }

    pub fn write_field_name(&mut self, name: &str) -> AvroResult<()> {
        let policy = self.unknown_fields;
        self.current_mut().write_field_name(name, policy)
    }

    pub fn write_value(&mut self, value: Value) -> AvroResult<()> {
        self.current_mut().write_value(value)
    }

    /// Takes the top-level value completed by the last write, if there is one.
    pub fn take_completed(&mut self) -> Option<Value> {
        if !self.children.is_empty() {
            return None;
        }
        match &mut self.root {
            WriteContext::Root(root) => root.take_completed(),
            _ => None,
        }
    }
}
