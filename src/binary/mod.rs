//! This module provides the structures and logic to write (and read back) Avro's binary
//! encoding.

pub mod container;
pub mod decimal;
pub mod decoder;
pub mod encoder;
pub mod var_int;
pub mod var_uint;

pub use decimal::DecimalBinaryEncoder;
pub use decoder::BinaryDecoder;
pub use encoder::BinaryEncoder;
