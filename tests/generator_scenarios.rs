use std::collections::HashMap;
use std::str::FromStr;

use avro_write::binary::BinaryDecoder;
use avro_write::external::bigdecimal::BigDecimal;
use avro_write::{
    read_container_file, read_datum, AvroError, AvroGeneratorBuilder, AvroResult, Schema, Value,
    WriteConfig,
};

// Decodes exactly one datum and checks nothing is left over.
fn decode_one(schema: &Schema, bytes: &[u8]) -> AvroResult<Value> {
    let mut decoder = BinaryDecoder::new(bytes);
    let value = read_datum(schema, &mut decoder)?;
    assert!(decoder.is_empty(), "{} trailing bytes", decoder.remaining().len());
    Ok(value)
}

#[test]
fn nullable_field_with_a_value() -> AvroResult<()> {
    let schema = Schema::parse_str(
        r#"{"type": "record", "name": "R", "fields": [
            {"name": "a", "type": ["null", "int"], "default": null}
        ]}"#,
    )?;
    let mut generator = AvroGeneratorBuilder::new()
        .with_schema(schema.clone())
        .build(Vec::new())?;
    generator.start_object()?;
    generator.field_name("a")?;
    generator.write_number(5)?;
    generator.end_object()?;
    let bytes = generator.close()?;

    assert_eq!(bytes, vec![0x02, 0x0A]);
    let Value::Record(record) = decode_one(&schema, &bytes)? else {
        panic!("expected a record");
    };
    assert_eq!(record.get("a"), Some(&Value::Int(5)));
    Ok(())
}

#[test]
fn array_of_nullable_strings() -> AvroResult<()> {
    let schema = Schema::parse_str(r#"{"type": "array", "items": ["null", "string"]}"#)?;
    let mut generator = AvroGeneratorBuilder::new()
        .with_schema(schema.clone())
        .build(Vec::new())?;
    generator.start_array()?;
    generator.write_null()?;
    generator.write_string("x")?;
    generator.end_array()?;
    let bytes = generator.close()?;

    // count 2, branch 0, branch 1 + "x", end of array
    assert_eq!(bytes, vec![0x04, 0x00, 0x02, 0x02, b'x', 0x00]);
    assert_eq!(
        decode_one(&schema, &bytes)?,
        Value::Array(vec![Value::Null, Value::from("x")])
    );
    Ok(())
}

#[test]
fn decimals_in_a_map_of_doubles() -> AvroResult<()> {
    let schema = Schema::parse_str(r#"{"type": "map", "values": "double"}"#)?;
    let mut generator = AvroGeneratorBuilder::new()
        .with_schema(schema.clone())
        .build(Vec::new())?;
    generator.start_object()?;
    generator.field_name("price")?;
    generator.write_number(BigDecimal::from_str("19.5").unwrap())?;
    generator.end_object()?;
    let bytes = generator.close()?;

    let mut expected = HashMap::new();
    expected.insert("price".to_owned(), Value::Double(19.5));
    assert_eq!(decode_one(&schema, &bytes)?, Value::Map(expected));
    Ok(())
}

#[test]
fn an_array_where_a_record_belongs_writes_nothing() -> AvroResult<()> {
    let schema = Schema::parse_str(
        r#"{"type": "record", "name": "R", "fields": [{"name": "a", "type": "int"}]}"#,
    )?;
    let mut buffer: Vec<u8> = Vec::new();
    let mut generator = AvroGeneratorBuilder::new()
        .with_schema(schema)
        .build(&mut buffer)?;
    let result = generator.start_array();
    assert!(matches!(result, Err(AvroError::SchemaMismatch(_))));
    assert!(generator.close().is_err());
    assert!(buffer.is_empty());
    Ok(())
}

#[test]
fn container_file_or_bare_datum() -> AvroResult<()> {
    let schema = Schema::parse_str(
        r#"{"type": "record", "name": "Point", "namespace": "geo", "fields": [
            {"name": "x", "type": "long"},
            {"name": "y", "type": "long"}
        ]}"#,
    )?;
    let write_point = |config: WriteConfig| -> AvroResult<Vec<u8>> {
        let mut generator = AvroGeneratorBuilder::new()
            .with_schema(schema.clone())
            .with_config(config)
            .build(Vec::new())?;
        generator.start_object()?;
        generator.field_name("x")?;
        generator.write_number(1i64)?;
        generator.field_name("y")?;
        generator.write_number(-1i64)?;
        generator.end_object()?;
        generator.close()
    };

    let bare = write_point(WriteConfig::new())?;
    assert_eq!(bare, vec![0x02, 0x01]);

    let file = write_point(WriteConfig::new().with_container_file(true))?;
    assert_eq!(&file[..4], b"Obj\x01");
    let (embedded_schema, datums) = read_container_file(&file)?;
    assert_eq!(embedded_schema, schema);
    assert_eq!(datums.len(), 1);
    assert_eq!(datums[0], decode_one(&schema, &bare)?);
    Ok(())
}

#[test]
fn empty_container_file_has_only_a_header() -> AvroResult<()> {
    let generator = AvroGeneratorBuilder::new()
        .with_schema(Schema::String)
        .with_config(WriteConfig::new().with_container_file(true))
        .build(Vec::new())?;
    let file = generator.close()?;
    let (schema, datums) = read_container_file(&file)?;
    assert_eq!(schema, Schema::String);
    assert!(datums.is_empty());
    Ok(())
}

#[test]
fn several_top_level_values_follow_each_other() -> AvroResult<()> {
    let schema = Schema::parse_str(r#"["null", "string"]"#)?;
    let mut generator = AvroGeneratorBuilder::new()
        .with_schema(schema)
        .build(Vec::new())?;
    generator.write_string("a")?;
    generator.write_null()?;
    generator.write_string("b")?;
    assert_eq!(
        generator.close()?,
        vec![0x02, 0x02, b'a', 0x00, 0x02, 0x02, b'b']
    );
    Ok(())
}

#[test]
fn embedded_datums_are_copied_verbatim() -> AvroResult<()> {
    let schema = Schema::parse_str(
        r#"{"type": "record", "name": "Envelope", "fields": [
            {"name": "id", "type": "int"},
            {"name": "payload", "type": {"type": "array", "items": "long"}}
        ]}"#,
    )?;
    let mut generator = AvroGeneratorBuilder::new()
        .with_schema(schema.clone())
        .build(Vec::new())?;
    generator.start_object()?;
    generator.field_name("id")?;
    generator.write_number(1)?;
    generator.field_name("payload")?;
    // [3] as an already-encoded long array
    generator.write_embedded(&[0x02, 0x06, 0x00])?;
    generator.end_object()?;
    let bytes = generator.close()?;

    assert_eq!(bytes, vec![0x02, 0x02, 0x06, 0x00]);
    let Value::Record(envelope) = decode_one(&schema, &bytes)? else {
        panic!("expected a record");
    };
    assert_eq!(
        envelope.get("payload"),
        Some(&Value::Array(vec![Value::Long(3)]))
    );
    Ok(())
}
