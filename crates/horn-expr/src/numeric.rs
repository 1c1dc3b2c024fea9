//! Exact conversion between fixed-width bit patterns and big integers

use crate::ir::{ApInt, Value, ValueKind, WORD_BITS};
use crate::{ExprError, ExprResult};
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::Zero;

/// Signed value of a two's-complement bit pattern of any width.
///
/// The magnitude is taken with the two's-complement identity rather than by
/// sign-extending to a native width, so the minimum value of every width
/// (`0b1000...0`) comes out exactly as `-2^(w-1)`.
pub fn to_exact_integer(value: &ApInt) -> BigInt {
    let negative = value.is_negative();
    let magnitude = if negative {
        value.twos_complement_negate()
    } else {
        value.clone()
    };

    let unsigned = magnitude
        .raw_data()
        .iter()
        .rev()
        .fold(BigUint::zero(), |acc, &word| (acc << WORD_BITS) + word);

    let result = BigInt::from_biguint(Sign::Plus, unsigned);
    if negative {
        -result
    } else {
        result
    }
}

/// Two's-complement encoding of `value` in `width` bits (reduced modulo
/// `2^width`).
pub fn from_exact_integer(width: u32, value: &BigInt) -> ApInt {
    let (sign, digits) = value.to_u64_digits();
    let magnitude = ApInt::from_words(width, digits);
    if sign == Sign::Minus {
        magnitude.twos_complement_negate()
    } else {
        magnitude
    }
}

/// Numeric value of an IR constant: integers convert exactly, the null
/// pointer is zero, anything else is rejected.
pub fn from_value(value: &Value) -> ExprResult<BigInt> {
    match value.kind() {
        ValueKind::ConstantInt(bits) => Ok(to_exact_integer(bits)),
        ValueKind::ConstantNull => Ok(BigInt::zero()),
        _ => Err(ExprError::InvalidOperand(value.to_string())),
    }
}
