use std::io::Write;

use arrayvec::ArrayVec;

use crate::result::{decoding_error, AvroResult};

const BITS_PER_ENCODED_BYTE: usize = 7;
// A u64 is 64 bits of data; at 7 bits per byte that takes at most 10 encoded bytes.
pub(crate) const MAX_ENCODED_SIZE_IN_BYTES: usize = 10;

const LOWER_7_BITMASK: u8 = 0b0111_1111;
const CONTINUATION_BIT: u8 = 0b1000_0000;

/// Represents a variable-length unsigned integer: the little-endian base-128 (LEB128) encoding
/// that underlies every Avro `int` and `long`. Each byte carries seven bits of the magnitude,
/// least significant group first, and sets its high bit if more bytes follow.
#[derive(Debug)]
pub struct VarUInt {
    value: u64,
    size_in_bytes: usize,
}

impl VarUInt {
    pub(crate) fn new(value: u64, size_in_bytes: usize) -> Self {
        VarUInt {
            value,
            size_in_bytes,
        }
    }

    /// Encodes the given unsigned int value as a VarUInt and writes it to the
    /// sink, returning the number of bytes written.
    pub fn write_u64<W: Write>(sink: &mut W, mut magnitude: u64) -> AvroResult<usize> {
        let mut buffer: ArrayVec<u8, MAX_ENCODED_SIZE_IN_BYTES> = ArrayVec::new();
        loop {
            let low_bits = magnitude as u8 & LOWER_7_BITMASK;
            magnitude >>= BITS_PER_ENCODED_BYTE;
            if magnitude == 0 {
                buffer.push(low_bits);
                break;
            }
            buffer.push(low_bits | CONTINUATION_BIT);
        }
        sink.write_all(&buffer)?;
        Ok(buffer.len())
    }

    /// Reads a VarUInt from the start of `bytes`.
    pub fn read(bytes: &[u8]) -> AvroResult<VarUInt> {
        let mut magnitude: u64 = 0;
        for (index, byte) in bytes.iter().enumerate() {
            if index == MAX_ENCODED_SIZE_IN_BYTES {
                break;
            }
            magnitude |= u64::from(byte & LOWER_7_BITMASK) << (index * BITS_PER_ENCODED_BYTE);
            if byte & CONTINUATION_BIT == 0 {
                return Ok(VarUInt::new(magnitude, index + 1));
            }
        }
        if bytes.len() >= MAX_ENCODED_SIZE_IN_BYTES {
            decoding_error(format!(
                "found a VarUInt longer than {MAX_ENCODED_SIZE_IN_BYTES} bytes"
            ))
        } else {
            decoding_error("ran out of data while reading a VarUInt")
        }
    }

    /// Returns the magnitude of the unsigned integer
    #[inline(always)]
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Returns the number of bytes that were read from the data source to construct this
    /// unsigned integer
    #[inline(always)]
    pub fn size_in_bytes(&self) -> usize {
        self.size_in_bytes
    }
}
