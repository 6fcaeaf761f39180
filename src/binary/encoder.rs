use std::io::Write;

use crate::binary::var_int::VarInt;
use crate::result::AvroResult;

/// Provides support to write Avro's primitive encodings to any [`Write`] implementation.
///
/// None of these methods write anything that identifies the type of the value; the schema a
/// value is written against is the only description of its layout.
pub trait BinaryEncoder {
    /// Writes a boolean as a single byte: 0 or 1.
    fn encode_bool(&mut self, value: bool) -> AvroResult<()>;

    /// Writes an `int` as a zig-zag VarInt.
    fn encode_int(&mut self, value: i32) -> AvroResult<()>;

    /// Writes a `long` as a zig-zag VarInt.
    fn encode_long(&mut self, value: i64) -> AvroResult<()>;

    /// Writes a `float` as 4 little-endian bytes.
    fn encode_float(&mut self, value: f32) -> AvroResult<()>;

    /// Writes a `double` as 8 little-endian bytes.
    fn encode_double(&mut self, value: f64) -> AvroResult<()>;

    /// Writes a `long` length followed by the bytes themselves.
    fn encode_bytes(&mut self, value: &[u8]) -> AvroResult<()>;

    /// Writes the UTF-8 bytes of `value` as `bytes`.
    fn encode_string(&mut self, value: &str) -> AvroResult<()>;

    /// Writes the bytes of a `fixed` value without a length.
    fn encode_fixed(&mut self, value: &[u8]) -> AvroResult<()>;

    /// Writes an enum symbol's index or a union branch's index.
    fn encode_index(&mut self, index: usize) -> AvroResult<()>;

    /// Writes the item count that opens a block of array items or map entries. A count of zero
    /// ends the array or map.
    fn encode_block_count(&mut self, count: usize) -> AvroResult<()>;
}

impl<W> BinaryEncoder for W
where
    W: Write,
{
    fn encode_bool(&mut self, value: bool) -> AvroResult<()> {
        self.write_all(&[u8::from(value)])?;
        Ok(())
    }

    fn encode_int(&mut self, value: i32) -> AvroResult<()> {
        VarInt::write_i64(self, i64::from(value))?;
        Ok(())
    }

    fn encode_long(&mut self, value: i64) -> AvroResult<()> {
        VarInt::write_i64(self, value)?;
        Ok(())
    }

    fn encode_float(&mut self, value: f32) -> AvroResult<()> {
        self.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    fn encode_double(&mut self, value: f64) -> AvroResult<()> {
        self.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    fn encode_bytes(&mut self, value: &[u8]) -> AvroResult<()> {
        VarInt::write_i64(self, value.len() as i64)?;
        self.write_all(value)?;
        Ok(())
    }

    fn encode_string(&mut self, value: &str) -> AvroResult<()> {
        self.encode_bytes(value.as_bytes())
    }

    fn encode_fixed(&mut self, value: &[u8]) -> AvroResult<()> {
        self.write_all(value)?;
        Ok(())
    }

    fn encode_index(&mut self, index: usize) -> AvroResult<()> {
        VarInt::write_i64(self, index as i64)?;
        Ok(())
    }

    fn encode_block_count(&mut self, count: usize) -> AvroResult<()> {
        VarInt::write_i64(self, count as i64)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(write: impl FnOnce(&mut Vec<u8>) -> AvroResult<()>) -> AvroResult<Vec<u8>> {
        let mut buffer = Vec::new();
        write(&mut buffer)?;
        Ok(buffer)
    }

    #[test]
    fn test_encode_scalars() -> AvroResult<()> {
        assert_eq!(encode(|b| b.encode_bool(true))?, vec![0x01]);
        assert_eq!(encode(|b| b.encode_bool(false))?, vec![0x00]);
        assert_eq!(encode(|b| b.encode_int(-3))?, vec![0x05]);
        assert_eq!(encode(|b| b.encode_long(1_000))?, vec![0xD0, 0x0F]);
        assert_eq!(
            encode(|b| b.encode_float(1.0))?,
            vec![0x00, 0x00, 0x80, 0x3F]
        );
        assert_eq!(
            encode(|b| b.encode_double(-2.0))?,
            vec![0, 0, 0, 0, 0, 0, 0, 0xC0]
        );
        Ok(())
    }

    #[test]
    fn test_encode_length_prefixed() -> AvroResult<()> {
        assert_eq!(
            encode(|b| b.encode_string("foo"))?,
            vec![0x06, b'f', b'o', b'o']
        );
        assert_eq!(encode(|b| b.encode_string(""))?, vec![0x00]);
        assert_eq!(encode(|b| b.encode_bytes(&[0xAB]))?, vec![0x02, 0xAB]);
        assert_eq!(encode(|b| b.encode_fixed(&[1, 2, 3]))?, vec![1, 2, 3]);
        Ok(())
    }

    #[test]
    fn test_encode_indexes_and_counts() -> AvroResult<()> {
        assert_eq!(encode(|b| b.encode_index(2))?, vec![0x04]);
        assert_eq!(encode(|b| b.encode_block_count(0))?, vec![0x00]);
        assert_eq!(encode(|b| b.encode_block_count(65))?, vec![0x82, 0x01]);
        Ok(())
    }
}
