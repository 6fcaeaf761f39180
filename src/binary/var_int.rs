use std::io::Write;

use crate::binary::var_uint::VarUInt;
use crate::result::AvroResult;

/// Represents a variable-length signed integer. The value is zig-zag mapped onto an unsigned
/// integer (0, -1, 1, -2, 2, ... become 0, 1, 2, 3, 4, ...) so that small magnitudes of either
/// sign stay short, then written as a [`VarUInt`].
#[derive(Debug)]
pub struct VarInt {
    size_in_bytes: usize,
    value: i64,
}

impl VarInt {
    /// Encodes the given signed int value as a VarInt and writes it to the
    /// sink, returning the number of bytes written.
    pub fn write_i64<W: Write>(sink: &mut W, value: i64) -> AvroResult<usize> {
        VarUInt::write_u64(sink, zig_zag(value))
    }

    /// Reads a VarInt from the start of `bytes`.
    pub fn read(bytes: &[u8]) -> AvroResult<VarInt> {
        let var_uint = VarUInt::read(bytes)?;
        Ok(VarInt {
            size_in_bytes: var_uint.size_in_bytes(),
            value: zag_zig(var_uint.value()),
        })
    }

    /// Returns the value of the signed integer
    #[inline(always)]
    pub fn value(&self) -> i64 {
        self.value
    }

    /// Returns the number of bytes that were read from the data source to construct this
    /// signed integer
    #[inline(always)]
    pub fn size_in_bytes(&self) -> usize {
        self.size_in_bytes
    }
}

#[inline]
fn zig_zag(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

#[inline]
fn zag_zig(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}
