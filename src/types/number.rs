use bigdecimal::BigDecimal;

use crate::types::Value;

/// A numeric token. The generator stores the variant it was handed as-is; conversions to the
/// numeric type required by the schema happen when the value is encoded.
#[derive(Clone, Debug, PartialEq)]
pub enum Number {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Decimal(BigDecimal),
}

// This macro makes it possible to turn primitive numbers into a Number using `.into()`.
macro_rules! impl_number_from_primitive_types {
    ($($t:ty => $variant:ident),*) => ($(
        impl From<$t> for Number {
            fn from(value: $t) -> Number {
                Number::$variant(value.into())
            }
        }
    )*)
}

impl_number_from_primitive_types!(
    i8 => Int,
    i16 => Int,
    i32 => Int,
    u8 => Int,
    u16 => Int,
    i64 => Long,
    u32 => Long,
    f32 => Float,
    f64 => Double
);

impl From<BigDecimal> for Number {
    fn from(value: BigDecimal) -> Self {
        Number::Decimal(value)
    }
}

impl From<Number> for Value {
    fn from(number: Number) -> Self {
        match number {
            Number::Int(i) => Value::Int(i),
            Number::Long(l) => Value::Long(l),
            Number::Float(f) => Value::Float(f),
            Number::Double(d) => Value::Double(d),
            Number::Decimal(d) => Value::Decimal(d),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use std::str::FromStr;

    #[rstest]
    #[case::small_int(Number::from(7u8), Value::Int(7))]
    #[case::int(Number::from(-12i32), Value::Int(-12))]
    #[case::unsigned_widens_to_long(Number::from(u32::MAX), Value::Long(u32::MAX as i64))]
    #[case::long(Number::from(i64::MIN), Value::Long(i64::MIN))]
    #[case::float(Number::from(1.5f32), Value::Float(1.5))]
    #[case::double(Number::from(2.25f64), Value::Double(2.25))]
    fn numbers_become_values(#[case] number: Number, #[case] expected: Value) {
        assert_eq!(Value::from(number), expected);
    }

    #[test]
    fn decimals_are_kept_exact() {
        let decimal = BigDecimal::from_str("10.125").unwrap();
        assert_eq!(
            Value::from(Number::from(decimal.clone())),
            Value::Decimal(decimal)
        );
    }
}
