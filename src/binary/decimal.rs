use std::io::Write;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::{Signed, Zero};

use crate::binary::var_int::VarInt;
use crate::result::{encoding_error, AvroResult};
use crate::schema::DecimalType;

/// Provides support to write a [`BigDecimal`] using Avro's `decimal` logical type.
///
/// The decimal is rescaled to the schema's scale and its unscaled value is written as a
/// big-endian two's-complement integer. Rescaling never rounds: a value with more fractional
/// digits than the scale allows is an error, as is one with more digits than the precision.
pub trait DecimalBinaryEncoder {
    /// Encodes a decimal at a `bytes` position: a length prefix followed by the unscaled value.
    fn encode_decimal(&mut self, decimal: &BigDecimal, decimal_type: &DecimalType)
        -> AvroResult<()>;

    /// Encodes a decimal at a `fixed` position of `size` bytes, sign-extending the unscaled
    /// value to fill it.
    fn encode_fixed_decimal(
        &mut self,
        decimal: &BigDecimal,
        decimal_type: &DecimalType,
        size: usize,
    ) -> AvroResult<()>;
}

impl<W> DecimalBinaryEncoder for W
where
    W: Write,
{
    fn encode_decimal(
        &mut self,
        decimal: &BigDecimal,
        decimal_type: &DecimalType,
    ) -> AvroResult<()> {
        let unscaled = unscaled_bytes(decimal, decimal_type)?;
        VarInt::write_i64(self, unscaled.len() as i64)?;
        self.write_all(&unscaled)?;
        Ok(())
    }

    fn encode_fixed_decimal(
        &mut self,
        decimal: &BigDecimal,
        decimal_type: &DecimalType,
        size: usize,
    ) -> AvroResult<()> {
        let unscaled = unscaled_bytes(decimal, decimal_type)?;
        if unscaled.len() > size {
            return encoding_error(format!(
                "decimal {decimal} needs {} bytes but the fixed type holds {size}",
                unscaled.len()
            ));
        }
        let padding = if decimal.is_negative() { 0xFF } else { 0x00 };
        for _ in unscaled.len()..size {
            self.write_all(&[padding])?;
        }
        self.write_all(&unscaled)?;
        Ok(())
    }
}

fn unscaled_bytes(decimal: &BigDecimal, decimal_type: &DecimalType) -> AvroResult<Vec<u8>> {
    let (digits, exponent) = decimal.as_bigint_and_exponent();
    let scale = decimal_type.scale() as i64;
    if exponent > scale {
        // Trailing zeros may still allow a lossless rescale, e.g. 1.50 at scale 1.
        let normalized = decimal.normalized();
        let (_, normalized_exponent) = normalized.as_bigint_and_exponent();
        if normalized_exponent > scale {
            return encoding_error(format!(
                "decimal {decimal} has more than {scale} fractional digits"
            ));
        }
        return unscaled_bytes(&normalized, decimal_type);
    }
    if digits.is_zero() {
        return Ok(BigInt::zero().to_signed_bytes_be());
    }
    // Scaling up by `shift` digits leaves at least `shift + 1` digits.
    let shift = scale - exponent;
    let too_many_digits = || {
        encoding_error(format!(
            "decimal {decimal} does not fit in precision {}",
            decimal_type.precision()
        ))
    };
    let shift = match u32::try_from(shift) {
        Ok(shift) if (shift as usize) < decimal_type.precision() => shift,
        _ => return too_many_digits(),
    };
    let unscaled = digits * BigInt::from(10u8).pow(shift);
    if unscaled.abs().to_string().len() > decimal_type.precision() {
        return too_many_digits();
    }
    Ok(unscaled.to_signed_bytes_be())
}

/// Rebuilds a decimal from its big-endian two's-complement unscaled value.
pub(crate) fn decode_decimal(unscaled: &[u8], decimal_type: &DecimalType) -> BigDecimal {
    if unscaled.is_empty() {
        return BigDecimal::new(BigInt::zero(), decimal_type.scale() as i64);
    }
    BigDecimal::new(
        BigInt::from_signed_bytes_be(unscaled),
        decimal_type.scale() as i64,
    )
}
