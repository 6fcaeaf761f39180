use crate::binary::var_int::VarInt;
use crate::result::{decoding_error, decoding_error_raw, AvroResult};

/// Reads Avro's primitive encodings from an in-memory buffer.
#[derive(Debug)]
pub struct BinaryDecoder<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> BinaryDecoder<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        BinaryDecoder { bytes, position: 0 }
    }

    /// The number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> &'a [u8] {
        &self.bytes[self.position..]
    }

    pub fn is_empty(&self) -> bool {
        self.position >= self.bytes.len()
    }

    pub fn read_bool(&mut self) -> AvroResult<bool> {
        match self.read_exact(1)?[0] {
            0 => Ok(false),
            1 => Ok(true),
            other => decoding_error(format!("{other:#04x} is not a valid boolean")),
        }
    }

    pub fn read_int(&mut self) -> AvroResult<i32> {
        let value = self.read_long()?;
        i32::try_from(value)
            .map_err(|_| decoding_error_raw(format!("{value} is out of range for an int")))
    }

    pub fn read_long(&mut self) -> AvroResult<i64> {
        let var_int = VarInt::read(self.remaining())?;
        self.position += var_int.size_in_bytes();
        Ok(var_int.value())
    }

    pub fn read_float(&mut self) -> AvroResult<f32> {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(self.read_exact(4)?);
        Ok(f32::from_le_bytes(bytes))
    }

    pub fn read_double(&mut self) -> AvroResult<f64> {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(self.read_exact(8)?);
        Ok(f64::from_le_bytes(bytes))
    }

    pub fn read_bytes(&mut self) -> AvroResult<&'a [u8]> {
        let length = self.read_length()?;
        self.read_exact(length)
    }

    pub fn read_string(&mut self) -> AvroResult<&'a str> {
        let bytes = self.read_bytes()?;
        std::str::from_utf8(bytes)
            .map_err(|e| decoding_error_raw(format!("string is not valid UTF-8: {e}")))
    }

    pub fn read_fixed(&mut self, size: usize) -> AvroResult<&'a [u8]> {
        self.read_exact(size)
    }

    /// Reads an enum symbol index or a union branch index.
    pub fn read_index(&mut self) -> AvroResult<usize> {
        let index = self.read_long()?;
        usize::try_from(index).map_err(|_| decoding_error_raw(format!("{index} is not an index")))
    }

    /// Reads the item count that opens a block of array items or map entries. A negative count
    /// is followed by the block's size in bytes, which is skipped.
    pub fn read_block_count(&mut self) -> AvroResult<usize> {
        let count = self.read_long()?;
        if count < 0 {
            let _block_size = self.read_long()?;
        }
        usize::try_from(count.unsigned_abs())
            .map_err(|_| decoding_error_raw(format!("block count {count} is too large")))
    }

    fn read_length(&mut self) -> AvroResult<usize> {
        let length = self.read_long()?;
        usize::try_from(length)
            .map_err(|_| decoding_error_raw(format!("{length} is not a valid length")))
    }

    pub(crate) fn read_exact(&mut self, length: usize) -> AvroResult<&'a [u8]> {
        let end = self
            .position
            .checked_add(length)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| {
                decoding_error_raw(format!(
                    "needed {length} bytes at offset {} but only {} remain",
                    self.position,
                    self.bytes.len() - self.position
                ))
            })?;
        let bytes = &self.bytes[self.position..end];
        self.position = end;
        Ok(bytes)
    }
}
