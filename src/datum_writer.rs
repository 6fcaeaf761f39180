use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use num_traits::ToPrimitive;

use crate::binary::{BinaryEncoder, DecimalBinaryEncoder};
use crate::result::{encoding_error, encoding_error_raw, AvroError, AvroResult};
use crate::schema::{RecordSchema, Schema};
use crate::types::{Record, Value};
use crate::union_resolver::{resolve_union_index, SchemaShapeFallback, UnionFallback, ValueShape};

/// Encodes [`Value`]s against a schema.
///
/// Union positions are resolved with the rules in [`union_resolver`](crate::union_resolver).
/// Numbers are coerced to the numeric type of their position where that cannot lose
/// information: integral values widen to `long`, and to `float` and `double` when they convert
/// exactly; a `long` narrows to an `int` only when it is in range; a `double` narrows to a
/// `float` only when the `float` holds the same value. Decimals are the exception: they are
/// accepted at `float` and `double` positions through their nearest `f64` value. Text is
/// accepted at `enum` positions (as a symbol), at character-hinted `int` positions (as a single
/// UTF-16 character) and at arrays of character-hinted `int`s (as UTF-16 code units).
/// [`Value::Encoded`] bytes are copied to the output as they are.
#[derive(Debug, Clone)]
pub struct DatumWriter {
    schema: Schema,
    fallback: Arc<dyn UnionFallback>,
}

impl DatumWriter {
    pub fn new(schema: Schema) -> Self {
        DatumWriter::with_fallback(schema, Arc::new(SchemaShapeFallback))
    }

    pub fn with_fallback(schema: Schema, fallback: Arc<dyn UnionFallback>) -> Self {
        DatumWriter { schema, fallback }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Encodes `value` into a new buffer.
    pub fn encode(&self, value: &Value) -> AvroResult<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write(value, &mut buffer)?;
        Ok(buffer)
    }

    /// Encodes `value` and writes it to `sink`. If encoding fails part way, whatever was
    /// written before the failure stays in the sink; use [`DatumWriter::encode`] to avoid that.
    pub fn write<W: Write>(&self, value: &Value, sink: &mut W) -> AvroResult<()> {
        self.write_at(&self.schema, value, sink)
    }

    fn write_at<W: Write>(&self, schema: &Schema, value: &Value, sink: &mut W) -> AvroResult<()> {
        if let Value::Encoded(bytes) = value {
            sink.write_all(bytes)?;
            return Ok(());
        }
        match (schema, value) {
            (Schema::Union(union), _) => {
                let index = resolve_union_index(union, &ValueShape::of(value), &*self.fallback)?;
                let branch = union.branch(index).ok_or_else(|| {
                    encoding_error_raw(format!("union has no branch {index}"))
                })?;
                sink.encode_index(index)?;
                self.write_at(branch, value, sink)
            }
            (Schema::Null, Value::Null) => Ok(()),
            (Schema::Boolean, Value::Boolean(b)) => sink.encode_bool(*b),
            (Schema::Int { .. }, Value::Int(i)) => sink.encode_int(*i),
            (Schema::Int { .. }, Value::Long(l)) => match i32::try_from(*l) {
                Ok(i) => sink.encode_int(i),
                Err(_) => encoding_error(format!("{l} is out of range for an int")),
            },
            (int @ Schema::Int { .. }, Value::String(text)) if int.is_char() => {
                sink.encode_int(single_char(text)?)
            }
            (Schema::Long, Value::Int(i)) => sink.encode_long(i64::from(*i)),
            (Schema::Long, Value::Long(l)) => sink.encode_long(*l),
            (Schema::Float, Value::Int(i)) => sink.encode_float(exact_f32(i64::from(*i))?),
            (Schema::Float, Value::Long(l)) => sink.encode_float(exact_f32(*l)?),
            (Schema::Float, Value::Float(f)) => sink.encode_float(*f),
            (Schema::Float, Value::Double(d)) => sink.encode_float(narrow_to_f32(*d)?),
            (Schema::Float, Value::Decimal(d)) => sink.encode_float(decimal_to_f64(d)? as f32),
            (Schema::Double, Value::Int(i)) => sink.encode_double(f64::from(*i)),
            (Schema::Double, Value::Long(l)) => sink.encode_double(exact_f64(*l)?),
            (Schema::Double, Value::Float(f)) => sink.encode_double(f64::from(*f)),
            (Schema::Double, Value::Double(d)) => sink.encode_double(*d),
            (Schema::Double, Value::Decimal(d)) => sink.encode_double(decimal_to_f64(d)?),
            (Schema::Bytes { .. }, Value::Bytes(bytes)) => sink.encode_bytes(bytes),
            (
                Schema::Bytes {
                    decimal: Some(decimal_type),
                },
                number,
            ) => sink.encode_decimal(&as_decimal(number, schema)?, decimal_type),
            (Schema::String, Value::String(text)) => sink.encode_string(text),
            (Schema::Fixed(fixed), Value::Bytes(bytes)) => {
                if bytes.len() != fixed.size() {
                    return encoding_error(format!(
                        "{} bytes cannot be written as fixed type {}, which holds {}",
                        bytes.len(),
                        fixed.name(),
                        fixed.size()
                    ));
                }
                sink.encode_fixed(bytes)
            }
            (Schema::Fixed(fixed), number) => match fixed.decimal() {
                Some(decimal_type) => sink.encode_fixed_decimal(
                    &as_decimal(number, schema)?,
                    &decimal_type,
                    fixed.size(),
                ),
                None => mismatch(schema, number),
            },
            (Schema::Enum(enum_schema), Value::String(symbol)) => {
                match enum_schema.symbol_index(symbol) {
                    Some(index) => sink.encode_index(index),
                    None => encoding_error(format!(
                        "'{symbol}' is not a symbol of enum {}",
                        enum_schema.name()
                    )),
                }
            }
            (Schema::Array(items), Value::Array(values)) => {
                self.write_block(values.len(), sink, |sink| {
                    values
                        .iter()
                        .try_for_each(|value| self.write_at(items, value, sink))
                })
            }
            (array @ Schema::Array(_), Value::String(text)) if array.is_char_array() => {
                let units: Vec<u16> = text.encode_utf16().collect();
                self.write_block(units.len(), sink, |sink| {
                    units
                        .iter()
                        .try_for_each(|unit| sink.encode_int(i32::from(*unit)))
                })
            }
            (Schema::Map(values_schema), Value::Map(entries)) => {
                self.write_map(values_schema, entries, sink)
            }
            (Schema::Record(record_schema), Value::Record(record)) => {
                self.write_record(record_schema, record, sink)
            }
            (schema, value) => mismatch(schema, value),
        }
    }

    // Arrays and maps are written as a single block followed by the empty block that ends them.
    fn write_block<W: Write>(
        &self,
        count: usize,
        sink: &mut W,
        write_items: impl FnOnce(&mut W) -> AvroResult<()>,
    ) -> AvroResult<()> {
        if count > 0 {
            sink.encode_block_count(count)?;
            write_items(sink)?;
        }
        sink.encode_block_count(0)
    }

    fn write_map<W: Write>(
        &self,
        values_schema: &Schema,
        entries: &HashMap<String, Value>,
        sink: &mut W,
    ) -> AvroResult<()> {
        self.write_block(entries.len(), sink, |sink| {
            for (key, value) in entries {
                sink.encode_string(key)?;
                self.write_at(values_schema, value, sink)
                    .map_err(|e| in_context(e, &format!("map key '{key}'")))?;
            }
            Ok(())
        })
    }

    fn write_record<W: Write>(
        &self,
        record_schema: &RecordSchema,
        record: &Record,
        sink: &mut W,
    ) -> AvroResult<()> {
        if record.fullname() != record_schema.name().fullname() {
            return encoding_error(format!(
                "a {} record cannot be written where {} is expected",
                record.fullname(),
                record_schema.name()
            ));
        }
        for field in record_schema.fields() {
            let value = record.get_at(field.position()).unwrap_or(&Value::Null);
            let location = format!("field '{}' of {}", field.name(), record_schema.name());
            if value.is_null() && !accepts_null(field.schema()) {
                return encoding_error(format!("{location} requires a value but none was written"));
            }
            self.write_at(field.schema(), value, sink)
                .map_err(|e| in_context(e, &location))?;
        }
        Ok(())
    }
}

fn mismatch(schema: &Schema, value: &Value) -> AvroResult<()> {
    encoding_error(format!(
        "cannot write {} value {value} at a(n) {} position",
        value.kind_name(),
        schema.kind()
    ))
}

fn accepts_null(schema: &Schema) -> bool {
    match schema {
        Schema::Null => true,
        Schema::Union(union) => union.index_of_kind(crate::schema::SchemaKind::Null).is_some(),
        _ => false,
    }
}

fn single_char(text: &str) -> AvroResult<i32> {
    match Schema::single_char_unit(text) {
        Some(unit) => Ok(i32::from(unit)),
        None => encoding_error(format!(
            "only a single UTF-16 character can be written as a character, found {text:?}"
        )),
    }
}

// Integral values are written as floating point only when the conversion is exact.
fn exact_f32(value: i64) -> AvroResult<f32> {
    let converted = value as f32;
    if converted as i128 == i128::from(value) {
        Ok(converted)
    } else {
        encoding_error(format!("{value} cannot be written as a float without rounding"))
    }
}

fn exact_f64(value: i64) -> AvroResult<f64> {
    let converted = value as f64;
    if converted as i128 == i128::from(value) {
        Ok(converted)
    } else {
        encoding_error(format!("{value} cannot be written as a double without rounding"))
    }
}

fn narrow_to_f32(value: f64) -> AvroResult<f32> {
    let narrowed = value as f32;
    if f64::from(narrowed) == value || value.is_nan() {
        Ok(narrowed)
    } else {
        encoding_error(format!("{value} cannot be written as a float without losing precision"))
    }
}

fn decimal_to_f64(decimal: &BigDecimal) -> AvroResult<f64> {
    decimal
        .to_f64()
        .ok_or_else(|| encoding_error_raw(format!("decimal {decimal} has no f64 value")))
}

fn as_decimal(value: &Value, schema: &Schema) -> AvroResult<BigDecimal> {
    match value {
        Value::Decimal(decimal) => Ok(decimal.clone()),
        Value::Int(i) => Ok(BigDecimal::from(*i)),
        Value::Long(l) => Ok(BigDecimal::from(*l)),
        other => encoding_error(format!(
            "cannot write {} value {other} at a decimal {} position",
            other.kind_name(),
            schema.kind()
        )),
    }
}

// Encoding failures deep inside a datum name the place they happened.
fn in_context(error: AvroError, location: &str) -> AvroError {
    match error {
        AvroError::Encoding(e) => encoding_error_raw(format!("{location}: {}", e.description())),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::BinaryDecoder;
    use crate::reader::read_datum;
    use rstest::*;
    use std::str::FromStr;

    fn encode(schema: &str, value: Value) -> AvroResult<Vec<u8>> {
        DatumWriter::new(Schema::parse_str(schema)?).encode(&value)
    }

    fn decimal(text: &str) -> BigDecimal {
        BigDecimal::from_str(text).unwrap()
    }

    #[rstest]
    #[case::null(r#""null""#, Value::Null, &[])]
    #[case::boolean(r#""boolean""#, Value::Boolean(true), &[0x01])]
    #[case::int(r#""int""#, Value::Int(-1), &[0x01])]
    #[case::long_into_int(r#""int""#, Value::Long(2), &[0x04])]
    #[case::int_into_long(r#""long""#, Value::Int(64), &[0x80, 0x01])]
    #[case::int_into_double(r#""double""#, Value::Int(1), &[0, 0, 0, 0, 0, 0, 0xF0, 0x3F])]
    #[case::float_into_double(r#""double""#, Value::Float(0.5), &[0, 0, 0, 0, 0, 0, 0xE0, 0x3F])]
    #[case::string(r#""string""#, Value::from("hi"), &[0x04, b'h', b'i'])]
    #[case::bytes(r#""bytes""#, Value::Bytes(vec![0xAA]), &[0x02, 0xAA])]
    #[case::fixed(r#"{"type": "fixed", "name": "F", "size": 2}"#, Value::Bytes(vec![1, 2]), &[1, 2])]
    #[case::enum_symbol(r#"{"type": "enum", "name": "E", "symbols": ["A", "B"]}"#, Value::from("B"), &[0x02])]
    #[case::character(r#"{"type": "int", "java-class": "java.lang.Character"}"#, Value::from("A"), &[0x82, 0x01])]
    #[case::character_array(r#"{"type": "array", "items": {"type": "int", "java-class": "java.lang.Character"}}"#, Value::from("ab"), &[0x04, 0xC2, 0x01, 0xC4, 0x01, 0x00])]
    #[case::empty_array(r#"{"type": "array", "items": "int"}"#, Value::Array(vec![]), &[0x00])]
    #[case::exact_double_into_float(r#""float""#, Value::Double(0.5), &[0, 0, 0, 0x3F])]
    #[case::infinity_into_float(r#""float""#, Value::Double(f64::INFINITY), &[0, 0, 0x80, 0x7F])]
    #[case::exact_long_into_double(r#""double""#, Value::Long(1 << 53), &[0, 0, 0, 0, 0, 0, 0x40, 0x43])]
    #[case::exact_int_into_float(r#""float""#, Value::Int(16_777_216), &[0, 0, 0x80, 0x4B])]
    #[case::astral_character_array(r#"{"type": "array", "items": {"type": "int", "java-class": "java.lang.Character"}}"#, Value::from("\u{1F600}"), &[0x04, 0xFA, 0xE0, 0x06, 0x80, 0xF8, 0x06, 0x00])]
    #[case::encoded(r#""string""#, Value::Encoded(vec![0x02, b'z']), &[0x02, b'z'])]
    fn test_encode_value(
        #[case] schema: &str,
        #[case] value: Value,
        #[case] expected: &[u8],
    ) -> AvroResult<()> {
        assert_eq!(encode(schema, value)?, expected);
        Ok(())
    }

    #[rstest]
    #[case::long_out_of_int_range(r#""int""#, Value::Long(i64::MAX))]
    #[case::text_at_plain_int(r#""int""#, Value::from("A"))]
    #[case::two_chars_at_character(r#"{"type": "int", "java-class": "java.lang.Character"}"#, Value::from("AB"))]
    #[case::unknown_symbol(r#"{"type": "enum", "name": "E", "symbols": ["A"]}"#, Value::from("C"))]
    #[case::wrong_fixed_size(r#"{"type": "fixed", "name": "F", "size": 2}"#, Value::Bytes(vec![1]))]
    #[case::double_at_long(r#""long""#, Value::Double(1.0))]
    #[case::null_at_string(r#""string""#, Value::Null)]
    #[case::double_overflows_float(r#""float""#, Value::Double(1e300))]
    #[case::double_rounds_at_float(r#""float""#, Value::Double(0.1))]
    #[case::long_rounds_at_double(r#""double""#, Value::Long(i64::MAX - 1))]
    #[case::long_rounds_at_float(r#""float""#, Value::Long(16_777_217))]
    #[case::int_rounds_at_float(r#""float""#, Value::Int(i32::MAX))]
    #[case::astral_character(r#"{"type": "int", "java-class": "java.lang.Character"}"#, Value::from("\u{1F600}"))]
    fn test_encode_mismatch(#[case] schema: &str, #[case] value: Value) {
        assert!(matches!(encode(schema, value), Err(AvroError::Encoding(_))));
    }

    #[test]
    fn test_decimals_become_doubles() -> AvroResult<()> {
        let bytes = encode(r#""double""#, Value::Decimal(decimal("2.5")))?;
        assert_eq!(bytes, 2.5f64.to_le_bytes());
        let bytes = encode(r#"["null", "string", "double"]"#, Value::Decimal(decimal("0.25")))?;
        assert_eq!(bytes[0], 0x04);
        assert_eq!(&bytes[1..], &0.25f64.to_le_bytes());
        Ok(())
    }

    #[test]
    fn test_decimal_logical_type_round_trips() -> AvroResult<()> {
        let schema = Schema::parse_str(
            r#"{"type": "fixed", "name": "Money", "size": 4, "logicalType": "decimal", "precision": 8, "scale": 2}"#,
        )?;
        let bytes = DatumWriter::new(schema.clone()).encode(&Value::Decimal(decimal("-12.5")))?;
        let value = read_datum(&schema, &mut BinaryDecoder::new(&bytes))?;
        assert_eq!(value, Value::Decimal(decimal("-12.50")));
        Ok(())
    }

    #[test]
    fn test_unions_write_their_branch_index() -> AvroResult<()> {
        let schema = r#"["null", "string"]"#;
        assert_eq!(encode(schema, Value::Null)?, vec![0x00]);
        assert_eq!(encode(schema, Value::from("x"))?, vec![0x02, 0x02, b'x']);
        Ok(())
    }

    #[test]
    fn test_records_name_the_missing_field() -> AvroResult<()> {
        let schema = Schema::parse_str(
            r#"{"type": "record", "name": "User", "fields": [
                {"name": "id", "type": "long"},
                {"name": "nick", "type": ["null", "string"]}
            ]}"#,
        )?;
        let Schema::Record(record_schema) = &schema else {
            panic!("expected a record schema");
        };
        let record = Record::new(Arc::clone(record_schema));
        let error = DatumWriter::new(schema.clone())
            .encode(&Value::Record(record))
            .unwrap_err();
        assert!(error.to_string().contains("field 'id' of User"), "{error}");

        let mut record = Record::new(Arc::clone(record_schema));
        record.put("id", 3i64)?;
        assert_eq!(
            DatumWriter::new(schema).encode(&Value::Record(record))?,
            vec![0x06, 0x00]
        );
        Ok(())
    }

    #[test]
    fn test_nested_failures_name_their_location() -> AvroResult<()> {
        let error = encode(
            r#"{"type": "map", "values": "int"}"#,
            Value::Map(HashMap::from([("k".to_owned(), Value::from("v"))])),
        )
        .unwrap_err();
        assert!(error.to_string().contains("map key 'k'"), "{error}");
        Ok(())
    }
}
