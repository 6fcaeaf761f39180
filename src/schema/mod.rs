//! An immutable Avro schema model.
//!
//! Schemas are built once (usually with [`Schema::parse_str`]) and then shared read-only by
//! everything that writes values against them. Named types (records, enums, fixed) live behind
//! an [`Arc`] so that a schema can be cloned cheaply and a record value can point back at its
//! own record schema.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use crate::result::{schema_error, AvroResult};
use crate::types::Value;

mod json;
mod parser;

/// Identifies the kind of a [`Schema`] node without its contents.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum SchemaKind {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    Record,
    Enum,
    Array,
    Map,
    Union,
    Fixed,
}

impl Display for SchemaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SchemaKind::Null => "null",
                SchemaKind::Boolean => "boolean",
                SchemaKind::Int => "int",
                SchemaKind::Long => "long",
                SchemaKind::Float => "float",
                SchemaKind::Double => "double",
                SchemaKind::Bytes => "bytes",
                SchemaKind::String => "string",
                SchemaKind::Record => "record",
                SchemaKind::Enum => "enum",
                SchemaKind::Array => "array",
                SchemaKind::Map => "map",
                SchemaKind::Union => "union",
                SchemaKind::Fixed => "fixed",
            }
        )
    }
}

/// A semantic hint attached to an `int` schema.
///
/// Schema generators for languages with a distinct character type encode characters as Avro
/// `int`s and mark the schema with `"java-class": "java.lang.Character"`. The hint lets text
/// values of length one be written at such positions, and text values be written at arrays of
/// such ints.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum IntHint {
    Char,
}

/// The `decimal` logical type, which may annotate `bytes` and `fixed` schemas.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct DecimalType {
    precision: usize,
    scale: usize,
}

impl DecimalType {
    pub fn new(precision: usize, scale: usize) -> AvroResult<Self> {
        if precision == 0 {
            return schema_error("decimal precision must be greater than zero");
        }
        if scale > precision {
            return schema_error(format!(
                "decimal scale ({scale}) cannot be greater than its precision ({precision})"
            ));
        }
        Ok(DecimalType { precision, scale })
    }

    pub fn precision(&self) -> usize {
        self.precision
    }

    pub fn scale(&self) -> usize {
        self.scale
    }
}

/// The (optionally namespaced) name of a record, enum or fixed schema.
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct Name {
    name: String,
    namespace: Option<String>,
    fullname: String,
}

impl Name {
    /// Creates a name from `name`, which may be a dotted full name. A dotted name carries its
    /// own namespace; otherwise the name has no namespace.
    pub fn new(name: &str) -> AvroResult<Self> {
        Self::with_enclosing_namespace(name, None)
    }

    /// Creates a name, placing it in `enclosing_namespace` unless `name` is a dotted full name.
    pub fn with_enclosing_namespace(
        name: &str,
        enclosing_namespace: Option<&str>,
    ) -> AvroResult<Self> {
        let (namespace, simple_name) = match name.rsplit_once('.') {
            Some((namespace, simple_name)) => (Some(namespace.to_owned()), simple_name),
            None => (
                enclosing_namespace
                    .filter(|namespace| !namespace.is_empty())
                    .map(str::to_owned),
                name,
            ),
        };
        validate_identifier(simple_name)?;
        if let Some(namespace) = namespace.as_deref() {
            for component in namespace.split('.') {
                validate_identifier(component)?;
            }
        }
        let fullname = match &namespace {
            Some(namespace) => format!("{namespace}.{simple_name}"),
            None => simple_name.to_owned(),
        };
        Ok(Name {
            name: simple_name.to_owned(),
            namespace,
            fullname,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// The name qualified by its namespace, e.g. `com.example.Person`.
    pub fn fullname(&self) -> &str {
        &self.fullname
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.fullname)
    }
}

fn validate_identifier(identifier: &str) -> AvroResult<()> {
    let mut chars = identifier.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        schema_error(format!("'{identifier}' is not a valid Avro name"))
    }
}

/// One field of a [`RecordSchema`].
#[derive(Debug, PartialEq, Clone)]
pub struct RecordField {
    name: String,
    schema: Schema,
    default: Option<Value>,
    doc: Option<String>,
    position: usize,
}

impl RecordField {
    pub fn new(name: &str, schema: Schema) -> AvroResult<Self> {
        validate_identifier(name)?;
        Ok(RecordField {
            name: name.to_owned(),
            schema,
            default: None,
            doc: None,
            position: 0,
        })
    }

    /// Sets the field's default value. The value is used for any record field that is never
    /// written.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// This field's index in its record's field list, which is also its position on the wire.
    pub fn position(&self) -> usize {
        self.position
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct RecordSchema {
    name: Name,
    doc: Option<String>,
    fields: Vec<RecordField>,
    positions_by_name: HashMap<String, usize>,
}

impl RecordSchema {
    pub fn new(name: Name, fields: Vec<RecordField>) -> AvroResult<Self> {
        let mut positions_by_name = HashMap::with_capacity(fields.len());
        let mut positioned = Vec::with_capacity(fields.len());
        for (position, mut field) in fields.into_iter().enumerate() {
            if positions_by_name
                .insert(field.name.clone(), position)
                .is_some()
            {
                return schema_error(format!(
                    "record {name} declares the field '{}' more than once",
                    field.name
                ));
            }
            field.position = position;
            positioned.push(field);
        }
        Ok(RecordSchema {
            name,
            doc: None,
            fields: positioned,
            positions_by_name,
        })
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn fields(&self) -> &[RecordField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&RecordField> {
        self.field_position(name)
            .and_then(|position| self.fields.get(position))
    }

    pub fn field_position(&self, name: &str) -> Option<usize> {
        self.positions_by_name.get(name).copied()
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct EnumSchema {
    name: Name,
    symbols: Vec<String>,
    default: Option<String>,
}

impl EnumSchema {
    pub fn new(name: Name, symbols: Vec<String>) -> AvroResult<Self> {
        for (index, symbol) in symbols.iter().enumerate() {
            validate_identifier(symbol)?;
            if symbols[..index].contains(symbol) {
                return schema_error(format!(
                    "enum {name} declares the symbol '{symbol}' more than once"
                ));
            }
        }
        Ok(EnumSchema {
            name,
            symbols,
            default: None,
        })
    }

    pub fn with_default(mut self, default: &str) -> AvroResult<Self> {
        if self.symbol_index(default).is_none() {
            return schema_error(format!(
                "enum default '{default}' is not one of the symbols of {}",
                self.name
            ));
        }
        self.default = Some(default.to_owned());
        Ok(self)
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn default(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn symbol_index(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct FixedSchema {
    name: Name,
    size: usize,
    decimal: Option<DecimalType>,
}

impl FixedSchema {
    pub fn new(name: Name, size: usize) -> Self {
        FixedSchema {
            name,
            size,
            decimal: None,
        }
    }

    pub fn with_decimal(mut self, decimal: DecimalType) -> Self {
        self.decimal = Some(decimal);
        self
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn decimal(&self) -> Option<DecimalType> {
        self.decimal
    }
}

/// An ordered list of alternative schemas. A branch's index in this list is the number written
/// on the wire ahead of the branch's value.
#[derive(Debug, PartialEq, Clone)]
pub struct UnionSchema {
    branches: Vec<Schema>,
}

impl UnionSchema {
    /// Creates a union, enforcing Avro's rules: unions cannot directly contain other unions,
    /// and may hold at most one branch of each unnamed kind and one branch per full name.
    pub fn new(branches: Vec<Schema>) -> AvroResult<Self> {
        if branches.is_empty() {
            return schema_error("a union must have at least one branch");
        }
        let mut unnamed_kinds = Vec::new();
        let mut names = Vec::new();
        for branch in &branches {
            match branch {
                Schema::Union(_) => {
                    return schema_error("unions may not immediately contain other unions")
                }
                named if named.fullname().is_some() => {
                    let fullname = named.fullname().unwrap_or_default();
                    if names.contains(&fullname) {
                        return schema_error(format!(
                            "union contains the named type {fullname} more than once"
                        ));
                    }
                    names.push(fullname);
                }
                unnamed => {
                    let kind = unnamed.kind();
                    if unnamed_kinds.contains(&kind) {
                        return schema_error(format!(
                            "union contains more than one branch of type {kind}"
                        ));
                    }
                    unnamed_kinds.push(kind);
                }
            }
        }
        Ok(UnionSchema { branches })
    }

    pub fn branches(&self) -> &[Schema] {
        &self.branches
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    pub fn branch(&self, index: usize) -> Option<&Schema> {
        self.branches.get(index)
    }

    /// Returns the index of the first branch of the given kind.
    pub fn index_of_kind(&self, kind: SchemaKind) -> Option<usize> {
        self.branches.iter().position(|branch| branch.kind() == kind)
    }

    /// Returns `true` if this union is `[null, X]` or `[X, null]`.
    pub fn is_nullable_pair(&self) -> bool {
        self.branches.len() == 2 && self.index_of_kind(SchemaKind::Null).is_some()
    }
}

/// A node in an Avro schema tree.
#[derive(Debug, PartialEq, Clone)]
pub enum Schema {
    Null,
    Boolean,
    Int { hint: Option<IntHint> },
    Long,
    Float,
    Double,
    Bytes { decimal: Option<DecimalType> },
    String,
    Record(Arc<RecordSchema>),
    Enum(Arc<EnumSchema>),
    Array(Box<Schema>),
    Map(Box<Schema>),
    Union(UnionSchema),
    Fixed(Arc<FixedSchema>),
}

impl Schema {
    /// A plain `int` schema with no hint.
    pub const INT: Schema = Schema::Int { hint: None };
    /// A plain `bytes` schema with no logical type.
    pub const BYTES: Schema = Schema::Bytes { decimal: None };

    pub fn kind(&self) -> SchemaKind {
        match self {
            Schema::Null => SchemaKind::Null,
            Schema::Boolean => SchemaKind::Boolean,
            Schema::Int { .. } => SchemaKind::Int,
            Schema::Long => SchemaKind::Long,
            Schema::Float => SchemaKind::Float,
            Schema::Double => SchemaKind::Double,
            Schema::Bytes { .. } => SchemaKind::Bytes,
            Schema::String => SchemaKind::String,
            Schema::Record(_) => SchemaKind::Record,
            Schema::Enum(_) => SchemaKind::Enum,
            Schema::Array(_) => SchemaKind::Array,
            Schema::Map(_) => SchemaKind::Map,
            Schema::Union(_) => SchemaKind::Union,
            Schema::Fixed(_) => SchemaKind::Fixed,
        }
    }

    /// For named types, returns the full name. Otherwise, returns `None`.
    pub fn fullname(&self) -> Option<&str> {
        match self {
            Schema::Record(record) => Some(record.name().fullname()),
            Schema::Enum(enum_schema) => Some(enum_schema.name().fullname()),
            Schema::Fixed(fixed) => Some(fixed.name().fullname()),
            _ => None,
        }
    }

    /// Returns `true` for an `int` schema carrying the character hint.
    pub fn is_char(&self) -> bool {
        matches!(
            self,
            Schema::Int {
                hint: Some(IntHint::Char)
            }
        )
    }

    /// Returns `true` for an array whose items are character-hinted ints.
    pub fn is_char_array(&self) -> bool {
        matches!(self, Schema::Array(items) if items.is_char())
    }

    /// The UTF-16 code unit of `text` if it is exactly one character a character-hinted `int`
    /// can hold. Characters outside the Basic Multilingual Plane need two units and do not fit.
    pub(crate) fn single_char_unit(text: &str) -> Option<u16> {
        let mut units = text.encode_utf16();
        match (units.next(), units.next()) {
            (Some(unit), None) => Some(unit),
            _ => None,
        }
    }

    /// Creates a union schema from the provided branches.
    pub fn union(branches: Vec<Schema>) -> AvroResult<Schema> {
        UnionSchema::new(branches).map(Schema::Union)
    }

    /// Creates `[null, schema]`, the conventional representation of an optional value.
    pub fn nullable(schema: Schema) -> AvroResult<Schema> {
        Schema::union(vec![Schema::Null, schema])
    }
}

impl Display for Schema {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json())
    }
}
