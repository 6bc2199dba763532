use num_bigint::BigInt;
use num_traits::ToPrimitive;

use super::{RuntimeError, Value};

/// Result of an integer conversion protocol: one logical guest integer,
/// in whichever of the two backing representations the callee produced.
/// Consumers must match exhaustively; there is no implicit widening.
#[derive(Debug, Clone, PartialEq)]
pub enum IntegerValue {
    Fixnum(i64),
    Bignum(BigInt),
}

impl IntegerValue {
    /// View a guest value as an integer, if it is one.
    pub fn from_value(value: &Value) -> Option<IntegerValue> {
        match value {
            Value::Int(i) => Some(IntegerValue::Fixnum(*i)),
            Value::BigInt(n) => Some(IntegerValue::Bignum(n.clone())),
            _ => None,
        }
    }

    /// Convert back to a guest value, re-normalizing so a bignum that
    /// fits the machine word comes back as `Int`.
    pub fn into_value(self) -> Value {
        match self {
            IntegerValue::Fixnum(i) => Value::Int(i),
            IntegerValue::Bignum(n) => match n.to_i64() {
                Some(i) => Value::Int(i),
                None => Value::BigInt(n),
            },
        }
    }

    /// Demote to a machine word, faulting when the bignum does not fit.
    pub fn to_fixnum(&self) -> Result<i64, RuntimeError> {
        match self {
            IntegerValue::Fixnum(i) => Ok(*i),
            IntegerValue::Bignum(n) => n
                .to_i64()
                .ok_or_else(|| RuntimeError::range_error("bignum too big to convert into Fixnum")),
        }
    }

    /// Reinterpret as unsigned 32-bit. Fixnums wrap (the bit pattern is
    /// truncated, never range-checked); bignums narrow checked.
    pub fn to_u32_unchecked(&self) -> Result<u32, RuntimeError> {
        match self {
            IntegerValue::Fixnum(i) => Ok(*i as u32),
            IntegerValue::Bignum(n) => n
                .to_u32()
                .ok_or_else(|| RuntimeError::range_error("bignum too big to convert into UInt32")),
        }
    }

    /// Reinterpret as unsigned 64-bit. Same wrap-vs-checked split as
    /// [`to_u32_unchecked`](Self::to_u32_unchecked).
    pub fn to_u64_unchecked(&self) -> Result<u64, RuntimeError> {
        match self {
            IntegerValue::Fixnum(i) => Ok(*i as u64),
            IntegerValue::Bignum(n) => n
                .to_u64()
                .ok_or_else(|| RuntimeError::range_error("bignum too big to convert into UInt64")),
        }
    }
}
