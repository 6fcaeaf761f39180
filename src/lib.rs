//! Writes Avro binary data from a stream of structural events.
//!
//! An [`AvroGenerator`] accepts the calls a streaming serializer makes (start and end objects
//! and arrays, field names, scalars) and turns them into Avro datums that conform to a schema
//! supplied up front. Union positions are resolved from the shape of each value, since the
//! event stream carries no type tags; see [`union_resolver`] for the rules.
//!
//! ```
//! use avro_write::{AvroGeneratorBuilder, AvroResult, Schema};
//!
//! # fn main() -> AvroResult<()> {
//! let schema = Schema::parse_str(
//!     r#"{"type": "record", "name": "R", "fields": [{"name": "a", "type": ["null", "int"]}]}"#,
//! )?;
//! let mut generator = AvroGeneratorBuilder::new().with_schema(schema).build(Vec::new())?;
//! generator.start_object()?;
//! generator.field_name("a")?;
//! generator.write_number(5)?;
//! generator.end_object()?;
//! assert_eq!(generator.close()?, vec![0x02, 0x0A]);
//! # Ok(())
//! # }
//! ```

pub mod result;

pub mod binary;
pub mod datum_writer;
pub mod generator;
pub mod reader;
pub mod schema;
pub mod types;
pub mod union_resolver;
pub mod write_config;

mod context;

/// Re-exports of the third-party crates whose types appear in this crate's public API.
pub mod external {
    pub use bigdecimal;
}

pub use context::ContainerKind;
pub use datum_writer::DatumWriter;
pub use generator::{AvroGenerator, AvroGeneratorBuilder};
pub use reader::{read_container_file, read_datum};
pub use result::{AvroError, AvroResult};
pub use schema::Schema;
pub use types::{Number, Record, Value};
pub use union_resolver::{SchemaShapeFallback, UnionFallback, ValueShape};
pub use write_config::{UnknownFieldPolicy, WriteConfig};
