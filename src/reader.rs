//! Decodes Avro binary data back into [`Value`]s.
//!
//! The writer's schema is the only description of the layout, so it must be supplied. Enum
//! symbols decode to [`Value::String`], `fixed` values to [`Value::Bytes`] and `decimal`
//! logical types to [`Value::Decimal`].

use std::collections::HashMap;
use std::sync::Arc;

use crate::binary::container::{read_header, SYNC_SIZE};
use crate::binary::decimal::decode_decimal;
use crate::binary::BinaryDecoder;
use crate::result::{decoding_error, decoding_error_raw, AvroResult};
use crate::schema::Schema;
use crate::types::{Record, Value};

// Items such as `null` take no bytes, so a block of them cannot be checked against the
// input length. Longer blocks than this are rejected once they outrun the input.
const MAX_ZERO_WIDTH_ITEMS: usize = 1 << 20;

/// Reads one datum written against `schema` from the decoder's current position.
pub fn read_datum(schema: &Schema, decoder: &mut BinaryDecoder) -> AvroResult<Value> {
    let value = match schema {
        Schema::Null => Value::Null,
        Schema::Boolean => Value::Boolean(decoder.read_bool()?),
        Schema::Int { .. } => Value::Int(decoder.read_int()?),
        Schema::Long => Value::Long(decoder.read_long()?),
        Schema::Float => Value::Float(decoder.read_float()?),
        Schema::Double => Value::Double(decoder.read_double()?),
        Schema::Bytes { decimal: None } => Value::Bytes(decoder.read_bytes()?.to_vec()),
        Schema::Bytes {
            decimal: Some(decimal),
        } => Value::Decimal(decode_decimal(decoder.read_bytes()?, decimal)),
        Schema::String => Value::String(decoder.read_string()?.to_owned()),
        Schema::Fixed(fixed) => {
            let bytes = decoder.read_fixed(fixed.size())?;
            match fixed.decimal() {
                Some(decimal) => Value::Decimal(decode_decimal(bytes, &decimal)),
                None => Value::Bytes(bytes.to_vec()),
            }
        }
        Schema::Enum(enum_schema) => {
            let index = decoder.read_index()?;
            let symbol = enum_schema.symbols().get(index).ok_or_else(|| {
                decoding_error_raw(format!(
                    "{index} is not a symbol index of enum {}",
                    enum_schema.name()
                ))
            })?;
            Value::String(symbol.clone())
        }
        Schema::Union(union) => {
            let index = decoder.read_index()?;
            let branch = union.branch(index).ok_or_else(|| {
                decoding_error_raw(format!(
                    "{index} is not a branch of a union with {} branches",
                    union.len()
                ))
            })?;
            read_datum(branch, decoder)?
        }
        Schema::Record(record_schema) => {
            let mut record = Record::new(Arc::clone(record_schema));
            for field in record_schema.fields() {
                let value = read_datum(field.schema(), decoder)?;
                record.put_at(field.position(), value);
            }
            Value::Record(record)
        }
        Schema::Array(items) => {
            let mut values = Vec::new();
            loop {
                let count = decoder.read_block_count()?;
                if count == 0 {
                    break;
                }
                if count > decoder.remaining().len() && count > MAX_ZERO_WIDTH_ITEMS {
                    return decoding_error(format!(
                        "array block of {count} items does not fit in the {} bytes left",
                        decoder.remaining().len()
                    ));
                }
                values.reserve(count.min(decoder.remaining().len()));
                for _ in 0..count {
                    values.push(read_datum(items, decoder)?);
                }
            }
            Value::Array(values)
        }
        Schema::Map(values_schema) => {
            let mut entries = HashMap::new();
            loop {
                let count = decoder.read_block_count()?;
                if count == 0 {
                    break;
                }
                // Every key takes at least its length byte.
                if count > decoder.remaining().len() {
                    return decoding_error(format!(
                        "map block of {count} entries does not fit in the {} bytes left",
                        decoder.remaining().len()
                    ));
                }
                for _ in 0..count {
                    let key = decoder.read_string()?.to_owned();
                    let value = read_datum(values_schema, decoder)?;
                    entries.insert(key, value);
                }
            }
            Value::Map(entries)
        }
    };
    Ok(value)
}

/// Reads a complete container file, returning the schema embedded in its header and every
/// datum in its blocks.
pub fn read_container_file(bytes: &[u8]) -> AvroResult<(Schema, Vec<Value>)> {
    let mut decoder = BinaryDecoder::new(bytes);
    let header = read_header(&mut decoder)?;
    let mut datums = Vec::new();
    while !decoder.is_empty() {
        let count = decoder.read_long()?;
        let size = decoder.read_long()?;
        if count < 0 || size < 0 {
            return decoding_error(format!("invalid block header: {count} datums, {size} bytes"));
        }
        let block_start = decoder.position();
        for _ in 0..count {
            datums.push(read_datum(&header.schema, &mut decoder)?);
        }
        if decoder.position() - block_start != size as usize {
            return decoding_error(format!(
                "block declared {size} bytes but its datums used {}",
                decoder.position() - block_start
            ));
        }
        if decoder.read_fixed(SYNC_SIZE)? != header.sync_marker {
            return decoding_error("block does not end with the file's sync marker");
        }
    }
    Ok((header.schema, datums))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::BinaryEncoder;
    use crate::result::AvroError;
    use rstest::*;
    use std::str::FromStr;

    #[test]
    fn test_read_union_and_record() -> AvroResult<()> {
        let schema = Schema::parse_str(
            r#"{"type": "record", "name": "R", "fields": [
                {"name": "a", "type": ["null", "int"]},
                {"name": "suit", "type": {"type": "enum", "name": "Suit", "symbols": ["S", "H"]}},
                {"name": "price", "type": {"type": "bytes", "logicalType": "decimal", "precision": 5, "scale": 2}}
            ]}"#,
        )?;
        let mut bytes: Vec<u8> = Vec::new();
        bytes.encode_index(1)?;
        bytes.encode_int(5)?;
        bytes.encode_index(1)?;
        bytes.encode_bytes(&[0x7D])?;

        let value = read_datum(&schema, &mut BinaryDecoder::new(&bytes))?;
        let record = value.as_record().unwrap();
        assert_eq!(record.get("a"), Some(&Value::Int(5)));
        assert_eq!(record.get("suit"), Some(&Value::from("H")));
        assert_eq!(
            record.get("price"),
            Some(&Value::Decimal(bigdecimal::BigDecimal::from_str("1.25").unwrap()))
        );
        Ok(())
    }

    #[test]
    fn test_read_blocks() -> AvroResult<()> {
        let schema = Schema::parse_str(r#"{"type": "map", "values": {"type": "array", "items": "long"}}"#)?;
        let mut bytes: Vec<u8> = Vec::new();
        bytes.encode_block_count(1)?;
        bytes.encode_string("k")?;
        bytes.encode_block_count(2)?;
        bytes.encode_long(1)?;
        bytes.encode_long(2)?;
        bytes.encode_block_count(0)?;
        bytes.encode_block_count(0)?;

        let value = read_datum(&schema, &mut BinaryDecoder::new(&bytes))?;
        assert_eq!(
            value.as_map().unwrap()["k"],
            Value::Array(vec![Value::Long(1), Value::Long(2)])
        );
        Ok(())
    }

    #[rstest]
    #[case::nulls(r#"{"type": "array", "items": "null"}"#)]
    #[case::longs(r#"{"type": "array", "items": "long"}"#)]
    #[case::map(r#"{"type": "map", "values": "null"}"#)]
    fn test_block_count_past_the_input(#[case] schema: &str) -> AvroResult<()> {
        let schema = Schema::parse_str(schema)?;
        let mut bytes: Vec<u8> = Vec::new();
        bytes.encode_long(i64::MAX)?;
        let result = read_datum(&schema, &mut BinaryDecoder::new(&bytes));
        assert!(matches!(result, Err(AvroError::Decoding(_))), "{result:?}");
        Ok(())
    }

    #[test]
    fn test_read_zero_width_items() -> AvroResult<()> {
        let schema = Schema::parse_str(r#"{"type": "array", "items": "null"}"#)?;
        let mut bytes: Vec<u8> = Vec::new();
        bytes.encode_block_count(3)?;
        bytes.encode_block_count(0)?;
        let value = read_datum(&schema, &mut BinaryDecoder::new(&bytes))?;
        assert_eq!(value, Value::Array(vec![Value::Null; 3]));
        Ok(())
    }

    #[test]
    fn test_bad_union_index() {
        let schema = Schema::nullable(Schema::String).unwrap();
        let mut decoder = BinaryDecoder::new(&[0x04]);
        assert!(read_datum(&schema, &mut decoder).is_err());
    }
}
