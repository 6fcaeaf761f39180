//! Decides which branch of a union schema a datum belongs to.
//!
//! The event stream carries no type tags, so the branch has to be inferred from the shape of
//! the value itself. Resolution is deterministic and the first matching rule wins:
//!
//! 1. `null` selects the `null` branch.
//! 2. In a two-branch union where one branch is `null`, any other value selects the other
//!    branch.
//! 3. Text selects the `string` branch, else an `enum` branch, else (for a single character) a
//!    character-hinted `int` branch, else an array of character-hinted `int`s.
//! 4. A decimal selects the first `double` branch.
//! 5. A record selects the record branch with the same full name.
//! 6. An array selects the first `array` branch.
//! 7. A map selects the first `map` branch.
//!
//! Anything else is handed to a [`UnionFallback`].

use std::fmt::{Debug, Display, Formatter};

use bigdecimal::BigDecimal;
use log::trace;

use crate::result::{schema_mismatch, unresolved_union_raw, AvroResult};
use crate::schema::{Schema, SchemaKind, UnionSchema};
use crate::types::Value;

/// The part of a datum that union resolution looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueShape<'a> {
    Null,
    Text(&'a str),
    Decimal(&'a BigDecimal),
    /// A record, identified by the full name of its schema.
    Record(&'a str),
    Array,
    Map,
    Other(&'a Value),
}

impl<'a> ValueShape<'a> {
    pub fn of(value: &'a Value) -> Self {
        match value {
            Value::Null => ValueShape::Null,
            Value::String(text) => ValueShape::Text(text),
            Value::Decimal(decimal) => ValueShape::Decimal(decimal),
            Value::Record(record) => ValueShape::Record(record.fullname()),
            Value::Array(_) => ValueShape::Array,
            Value::Map(_) => ValueShape::Map,
            other => ValueShape::Other(other),
        }
    }
}

impl Display for ValueShape<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueShape::Null => write!(f, "null"),
            ValueShape::Text(text) => write!(f, "text {text:?}"),
            ValueShape::Decimal(decimal) => write!(f, "decimal {decimal}"),
            ValueShape::Record(name) => write!(f, "record {name}"),
            ValueShape::Array => write!(f, "array"),
            ValueShape::Map => write!(f, "map"),
            ValueShape::Other(value) => write!(f, "{} {value}", value.kind_name()),
        }
    }
}

/// Resolves the datums the built-in rules do not cover.
pub trait UnionFallback: Debug + Send + Sync {
    /// Returns the index of the branch of `union` that should hold `datum`, or an
    /// [`UnresolvedUnion`](crate::result::unresolved_union::UnresolvedUnion) error.
    fn resolve(&self, union: &UnionSchema, datum: &ValueShape) -> AvroResult<usize>;
}

/// The default fallback: picks a branch whose type can hold the datum, preferring an exact
/// type match over a widening one.
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaShapeFallback;

impl UnionFallback for SchemaShapeFallback {
    fn resolve(&self, union: &UnionSchema, datum: &ValueShape) -> AvroResult<usize> {
        let first_of = |kinds: &[SchemaKind]| {
            kinds
                .iter()
                .find_map(|kind| union.index_of_kind(*kind))
        };
        let found = match datum {
            ValueShape::Other(Value::Boolean(_)) => first_of(&[SchemaKind::Boolean]),
            ValueShape::Other(Value::Int(_)) => first_of(&[
                SchemaKind::Int,
                SchemaKind::Long,
                SchemaKind::Float,
                SchemaKind::Double,
            ]),
            ValueShape::Other(Value::Long(long)) => {
                first_of(&[SchemaKind::Long]).or_else(|| {
                    let fits_in_int = i32::try_from(*long).is_ok();
                    let kinds: &[SchemaKind] = if fits_in_int {
                        &[SchemaKind::Int, SchemaKind::Float, SchemaKind::Double]
                    } else {
                        &[SchemaKind::Float, SchemaKind::Double]
                    };
                    first_of(kinds)
                })
            }
            ValueShape::Other(Value::Float(_)) => first_of(&[SchemaKind::Float, SchemaKind::Double]),
            ValueShape::Other(Value::Double(_)) => {
                first_of(&[SchemaKind::Double, SchemaKind::Float])
            }
            ValueShape::Other(Value::Bytes(bytes)) => first_of(&[SchemaKind::Bytes]).or_else(|| {
                union.branches().iter().position(|branch| {
                    matches!(branch, Schema::Fixed(fixed) if fixed.size() == bytes.len())
                })
            }),
            ValueShape::Decimal(_) => union
                .branches()
                .iter()
                .position(|branch| match branch {
                    Schema::Bytes { decimal } => decimal.is_some(),
                    Schema::Fixed(fixed) => fixed.decimal().is_some(),
                    _ => false,
                })
                .or_else(|| first_of(&[SchemaKind::Float])),
            _ => None,
        };
        found.ok_or_else(|| unresolved_union_raw(describe_union(union), datum.to_string()))
    }
}

/// Returns the index of the branch of `union` that should hold `datum`.
pub fn resolve_union_index(
    union: &UnionSchema,
    datum: &ValueShape,
    fallback: &dyn UnionFallback,
) -> AvroResult<usize> {
    if let ValueShape::Null = datum {
        return union.index_of_kind(SchemaKind::Null).ok_or_else(|| {
            unresolved_union_raw(describe_union(union), datum.to_string())
        });
    }
    if union.is_nullable_pair() {
        if let Some(index) = union
            .branches()
            .iter()
            .position(|branch| branch.kind() != SchemaKind::Null)
        {
            return Ok(index);
        }
    }
    let found = match datum {
        ValueShape::Text(text) => resolve_text(union, text),
        ValueShape::Decimal(_) => union.index_of_kind(SchemaKind::Double),
        ValueShape::Record(name) => union.branches().iter().position(|branch| {
            matches!(branch, Schema::Record(record) if record.name().fullname() == *name)
        }),
        ValueShape::Array => union.index_of_kind(SchemaKind::Array),
        ValueShape::Map => union.index_of_kind(SchemaKind::Map),
        ValueShape::Null | ValueShape::Other(_) => None,
    };
    match found {
        Some(index) => Ok(index),
        None => {
            trace!("resolving {datum} against {} with the fallback", describe_union(union));
            fallback.resolve(union, datum)
        }
    }
}

/// Returns the branch of `union` that should hold `datum`.
pub fn resolve_union_schema<'s>(
    union: &'s UnionSchema,
    datum: &ValueShape,
    fallback: &dyn UnionFallback,
) -> AvroResult<&'s Schema> {
    let index = resolve_union_index(union, datum, fallback)?;
    union.branch(index).ok_or_else(|| {
        unresolved_union_raw(
            describe_union(union),
            format!("{datum} (fallback chose branch {index})"),
        )
    })
}

fn resolve_text(union: &UnionSchema, text: &str) -> Option<usize> {
    if let Some(index) = union.index_of_kind(SchemaKind::String) {
        return Some(index);
    }
    let enum_index = union
        .branches()
        .iter()
        .position(|branch| matches!(branch, Schema::Enum(e) if e.symbol_index(text).is_some()))
        .or_else(|| union.index_of_kind(SchemaKind::Enum));
    if enum_index.is_some() {
        return enum_index;
    }
    if Schema::single_char_unit(text).is_some() {
        if let Some(index) = union.branches().iter().position(Schema::is_char) {
            return Some(index);
        }
    }
    union.branches().iter().position(Schema::is_char_array)
}

/// Picks the branch that an object (`{...}`) written without a record name should use: the
/// union's only record or map branch.
pub fn narrow_to_record_or_map(union: &UnionSchema) -> AvroResult<usize> {
    let mut candidates = union
        .branches()
        .iter()
        .enumerate()
        .filter(|(_, branch)| matches!(branch.kind(), SchemaKind::Record | SchemaKind::Map))
        .map(|(index, _)| index);
    match (candidates.next(), candidates.next()) {
        (Some(index), None) => Ok(index),
        (None, _) => schema_mismatch(format!(
            "an object cannot be written at {}: it has no record or map branch",
            describe_union(union)
        )),
        (Some(_), Some(_)) => Err(unresolved_union_raw(
            describe_union(union),
            "an object without a record name",
        )),
    }
}

/// Picks the branch that an array (`[...]`) should use: the union's array branch.
pub fn narrow_to_array(union: &UnionSchema) -> AvroResult<usize> {
    match union.index_of_kind(SchemaKind::Array) {
        Some(index) => Ok(index),
        None => schema_mismatch(format!(
            "an array cannot be written at {}: it has no array branch",
            describe_union(union)
        )),
    }
}

pub(crate) fn describe_union(union: &UnionSchema) -> String {
    let branches: Vec<String> = union
        .branches()
        .iter()
        .map(|branch| match branch.fullname() {
            Some(name) => name.to_owned(),
            None => branch.kind().to_string(),
        })
        .collect();
    format!("[{}]", branches.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::AvroError;
    use rstest::*;
    use std::str::FromStr;

    fn union(text: &str) -> UnionSchema {
        match Schema::parse_str(text).unwrap() {
            Schema::Union(union) => union,
            other => panic!("expected a union, found {other}"),
        }
    }

    fn resolve(union: &UnionSchema, datum: ValueShape) -> AvroResult<usize> {
        resolve_union_index(union, &datum, &SchemaShapeFallback)
    }

    const CHAR: &str = r#"{"type": "int", "java-class": "java.lang.Character"}"#;

    #[test]
    fn null_selects_the_null_branch() -> AvroResult<()> {
        assert_eq!(resolve(&union(r#"["string", "null", "int"]"#), ValueShape::Null)?, 1);
        assert_eq!(resolve(&union(r#"["null", "long"]"#), ValueShape::Null)?, 0);
        Ok(())
    }

    #[test]
    fn null_without_a_null_branch_is_unresolved() {
        let result = resolve(&union(r#"["string", "int"]"#), ValueShape::Null);
        assert!(matches!(result, Err(AvroError::UnresolvedUnion(_))));
    }

    #[rstest]
    #[case::null_first(r#"["null", "long"]"#, 1)]
    #[case::null_last(r#"["long", "null"]"#, 0)]
    fn nullable_pairs_take_the_other_branch(
        #[case] text: &str,
        #[case] expected: usize,
    ) -> AvroResult<()> {
        let value = Value::Boolean(true);
        // Even a value the branch cannot hold; encoding reports the mismatch.
        assert_eq!(resolve(&union(text), ValueShape::of(&value))?, expected);
        assert_eq!(resolve(&union(text), ValueShape::Text("x"))?, expected);
        Ok(())
    }

    #[test]
    fn text_prefers_string_over_enum() -> AvroResult<()> {
        let union = union(
            r#"[{"type": "enum", "name": "E", "symbols": ["x"]}, "string", "null"]"#,
        );
        assert_eq!(resolve(&union, ValueShape::Text("x"))?, 1);
        Ok(())
    }

    #[test]
    fn text_falls_back_to_the_enum_holding_the_symbol() -> AvroResult<()> {
        let union = union(
            r#"["null", "int",
                {"type": "enum", "name": "A", "symbols": ["x"]},
                {"type": "enum", "name": "B", "symbols": ["y"]}]"#,
        );
        assert_eq!(resolve(&union, ValueShape::Text("y"))?, 3);
        assert_eq!(resolve(&union, ValueShape::Text("z"))?, 2);
        Ok(())
    }

    #[test]
    fn text_resolves_to_character_positions() -> AvroResult<()> {
        let union = union(&format!(
            r#"["null", "long", {CHAR}, {{"type": "array", "items": {CHAR}}}]"#
        ));
        assert_eq!(resolve(&union, ValueShape::Text("é"))?, 2);
        assert_eq!(resolve(&union, ValueShape::Text("hi"))?, 3);
        assert_eq!(resolve(&union, ValueShape::Text(""))?, 3);
        Ok(())
    }

    #[test]
    fn characters_outside_the_bmp_are_not_single_characters() -> AvroResult<()> {
        let with_array = union(&format!(
            r#"["null", "long", {CHAR}, {{"type": "array", "items": {CHAR}}}]"#
        ));
        assert_eq!(resolve(&with_array, ValueShape::Text("\u{1F600}"))?, 3);
        let without_array = union(&format!(r#"["long", {CHAR}]"#));
        let result = resolve(&without_array, ValueShape::Text("\u{1F600}"));
        assert!(matches!(result, Err(AvroError::UnresolvedUnion(_))));
        Ok(())
    }

    #[test]
    fn text_without_a_text_branch_is_unresolved() {
        let result = resolve(&union(r#"["null", "int", "boolean"]"#), ValueShape::Text("x"));
        assert!(matches!(result, Err(AvroError::UnresolvedUnion(_))));
    }

    #[test]
    fn decimals_prefer_double() -> AvroResult<()> {
        let decimal = BigDecimal::from_str("1.5").unwrap();
        let with_double = union(
            r#"["null", "float", "double",
                {"type": "bytes", "logicalType": "decimal", "precision": 4, "scale": 1}]"#,
        );
        assert_eq!(resolve(&with_double, ValueShape::Decimal(&decimal))?, 2);
        let without_double = union(
            r#"["null", "float",
                {"type": "bytes", "logicalType": "decimal", "precision": 4, "scale": 1}]"#,
        );
        assert_eq!(resolve(&without_double, ValueShape::Decimal(&decimal))?, 2);
        Ok(())
    }

    #[test]
    fn records_match_by_full_name() -> AvroResult<()> {
        let union = union(
            r#"["null",
                {"type": "record", "name": "Cat", "namespace": "pets", "fields": []},
                {"type": "record", "name": "Dog", "namespace": "pets", "fields": []}]"#,
        );
        assert_eq!(resolve(&union, ValueShape::Record("pets.Dog"))?, 2);
        assert!(resolve(&union, ValueShape::Record("Dog")).is_err());
        Ok(())
    }

    #[test]
    fn containers_select_their_kind() -> AvroResult<()> {
        let union = union(
            r#"["null", "string", {"type": "map", "values": "int"}, {"type": "array", "items": "int"}]"#,
        );
        assert_eq!(resolve(&union, ValueShape::Array)?, 3);
        assert_eq!(resolve(&union, ValueShape::Map)?, 2);
        Ok(())
    }

    #[rstest]
    #[case::int_exact(Value::Int(1), 1)]
    #[case::long_exact(Value::Long(1), 2)]
    #[case::double_exact(Value::Double(1.0), 3)]
    #[case::boolean(Value::Boolean(false), 4)]
    fn the_default_fallback_matches_by_type(
        #[case] value: Value,
        #[case] expected: usize,
    ) -> AvroResult<()> {
        let union = union(r#"["null", "int", "long", "double", "boolean"]"#);
        assert_eq!(resolve(&union, ValueShape::of(&value))?, expected);
        Ok(())
    }

    #[test]
    fn the_default_fallback_widens_numbers() -> AvroResult<()> {
        let doubles = union(r#"["null", "string", "double"]"#);
        assert_eq!(resolve(&doubles, ValueShape::of(&Value::Int(3)))?, 2);
        let ints = union(r#"["null", "string", "int"]"#);
        assert_eq!(resolve(&ints, ValueShape::of(&Value::Long(3)))?, 2);
        assert!(resolve(&ints, ValueShape::of(&Value::Long(i64::MAX))).is_err());
        Ok(())
    }

    #[derive(Debug)]
    struct AlwaysLast;

    impl UnionFallback for AlwaysLast {
        fn resolve(&self, union: &UnionSchema, _datum: &ValueShape) -> AvroResult<usize> {
            Ok(union.len() - 1)
        }
    }

    #[test]
    fn an_injected_fallback_sees_unmatched_datums() -> AvroResult<()> {
        let union = union(r#"["null", "string", "boolean", "bytes"]"#);
        let value = Value::Int(7);
        let schema = resolve_union_schema(&union, &ValueShape::of(&value), &AlwaysLast)?;
        assert_eq!(schema, &Schema::BYTES);
        // Built-in rules still come first.
        assert_eq!(resolve_union_index(&union, &ValueShape::Text("a"), &AlwaysLast)?, 1);
        Ok(())
    }

    #[test]
    fn objects_narrow_to_the_only_record_or_map() -> AvroResult<()> {
        assert_eq!(
            narrow_to_record_or_map(&union(r#"["null", {"type": "map", "values": "int"}]"#))?,
            1
        );
        let none = narrow_to_record_or_map(&union(r#"["null", "string"]"#));
        assert!(matches!(none, Err(AvroError::SchemaMismatch(_))));
        let two = narrow_to_record_or_map(&union(
            r#"[{"type": "map", "values": "int"}, {"type": "record", "name": "R", "fields": []}]"#,
        ));
        assert!(matches!(two, Err(AvroError::UnresolvedUnion(_))));
        Ok(())
    }

    #[test]
    fn arrays_narrow_to_the_array_branch() -> AvroResult<()> {
        assert_eq!(
            narrow_to_array(&union(r#"["null", {"type": "array", "items": "int"}]"#))?,
            1
        );
        assert!(narrow_to_array(&union(r#"["null", "string"]"#)).is_err());
        Ok(())
    }
}
