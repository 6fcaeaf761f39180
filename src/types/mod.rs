//! This module provides the in-memory, schema-shaped values that the generator materializes
//! before handing them to the datum writer: [`Value`], [`Record`] and the [`Number`] variant
//! accepted by [`AvroGenerator::write_number`](crate::AvroGenerator::write_number).

mod number;
mod record;
mod value;

pub use number::Number;
pub use record::Record;
pub use value::Value;
