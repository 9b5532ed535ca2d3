//! Codecs for [Value::BigInt]s.
//!
//! The arbitrary-precision codecs write a magnitude as a `u16` byte count followed by the
//! big-endian magnitude bytes (zero is the single byte `0x00`):
//!
//! * `ubi`: the magnitude of a non-negative integer.
//! * `bi`: a sign byte (`1` for negative) followed by the `ubi` encoding of the absolute value.
//! * `nbi`: the `ubi` encoding of the negation of a non-positive integer.
//!
//! `u64` and `i64` are the 8-byte little-endian fixed-width codecs over the same value kind.

use crate::{Cursor, Error, Problem, Schema, Value};
use num_bigint::{BigInt, Sign};
use num_traits::{FromPrimitive, Signed, ToPrimitive, Zero};
use std::any::Any;

/// Largest magnitude (in bytes) the `u16` length prefix can describe.
const MAX_MAGNITUDE: usize = u16::MAX as usize;

/// Coerces arbitrary input into a big integer. Fractions are truncated; anything else becomes zero.
pub(crate) fn coerce_bigint(value: &Value) -> BigInt {
    match value {
        Value::BigInt(n) => n.clone(),
        Value::Number(n) => BigInt::from_f64(n.trunc()).unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        Value::Bool(b) => BigInt::from(u8::from(*b)),
        _ => BigInt::zero(),
    }
}

fn magnitude_size(n: &BigInt) -> usize {
    2 + magnitude(n).len()
}

fn magnitude(n: &BigInt) -> Vec<u8> {
    let (_, bytes) = n.to_bytes_be();
    bytes
}

fn write_magnitude(cursor: &mut Cursor, n: &BigInt) -> Result<(), Error> {
    let bytes = magnitude(n);
    cursor.put_u16(bytes.len() as u16)?;
    cursor.put_slice(&bytes)
}

fn read_magnitude(cursor: &mut Cursor) -> Result<BigInt, Error> {
    let len = cursor.get_u16()? as usize;
    let bytes = cursor.get_slice(len)?;
    Ok(BigInt::from_bytes_be(Sign::Plus, bytes))
}

/// Sign restriction of an arbitrary-precision codec.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Precision {
    /// `ubi`
    Unsigned,
    /// `bi`
    Signed,
    /// `nbi`
    Negative,
}

/// An arbitrary-precision integer codec.
#[derive(Clone, Debug)]
pub struct BigSchema {
    kind: Precision,
}

impl BigSchema {
    pub fn new(kind: Precision) -> Self {
        Self { kind }
    }
}

impl Schema for BigSchema {
    fn name(&self) -> String {
        match self.kind {
            Precision::Unsigned => "ubi".into(),
            Precision::Signed => "bi".into(),
            Precision::Negative => "nbi".into(),
        }
    }

    fn encode_size(&self, value: &Value) -> usize {
        let n = value.as_bigint().cloned().unwrap_or_default();
        match self.kind {
            Precision::Signed => 1 + magnitude_size(&n),
            Precision::Unsigned | Precision::Negative => magnitude_size(&n),
        }
    }

    fn write(&self, cursor: &mut Cursor, value: &Value) -> Result<(), Error> {
        let n = value.as_bigint().cloned().unwrap_or_default();
        if self.kind == Precision::Signed {
            cursor.put_u8(u8::from(n.is_negative()))?;
        }
        write_magnitude(cursor, &n)
    }

    fn read(&self, cursor: &mut Cursor) -> Result<Value, Error> {
        let n = match self.kind {
            Precision::Unsigned => read_magnitude(cursor)?,
            Precision::Signed => {
                let negative = cursor.get_u8()? != 0;
                let n = read_magnitude(cursor)?;
                if negative {
                    -n
                } else {
                    n
                }
            }
            Precision::Negative => -read_magnitude(cursor)?,
        };
        Ok(Value::BigInt(n))
    }

    fn validate(&self, value: &Value, _: bool) -> Result<(), Problem> {
        let Value::BigInt(n) = value else {
            return Err(Problem::new(self.name(), "Expected a big integer"));
        };
        match self.kind {
            Precision::Unsigned if n.is_negative() => {
                return Err(Problem::new(
                    self.name(),
                    "Expected a non-negative big integer",
                ))
            }
            Precision::Negative if n.is_positive() => {
                return Err(Problem::new(
                    self.name(),
                    "Expected a non-positive big integer",
                ))
            }
            _ => {}
        }
        if n.bits() > (MAX_MAGNITUDE as u64) * 8 {
            return Err(Problem::new(
                self.name(),
                format!("Expected at most {MAX_MAGNITUDE} bytes of magnitude"),
            ));
        }
        Ok(())
    }

    fn sample(&self) -> Value {
        Value::BigInt(BigInt::zero())
    }

    fn sanitize(&self, value: &Value) -> Value {
        let n = coerce_bigint(value);
        let n = match self.kind {
            Precision::Unsigned => n.abs(),
            Precision::Signed => n,
            Precision::Negative => -n.abs(),
        };
        Value::BigInt(n)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The 8-byte fixed-width integer codecs over [Value::BigInt].
#[derive(Clone, Debug)]
pub struct Int64Schema {
    signed: bool,
}

impl Int64Schema {
    pub fn new(signed: bool) -> Self {
        Self { signed }
    }

    fn bounds(&self) -> (BigInt, BigInt) {
        if self.signed {
            (BigInt::from(i64::MIN), BigInt::from(i64::MAX))
        } else {
            (BigInt::zero(), BigInt::from(u64::MAX))
        }
    }
}

impl Schema for Int64Schema {
    fn name(&self) -> String {
        if self.signed {
            "i64".into()
        } else {
            "u64".into()
        }
    }

    fn encode_size(&self, _: &Value) -> usize {
        8
    }

    fn write(&self, cursor: &mut Cursor, value: &Value) -> Result<(), Error> {
        let n = value.as_bigint().cloned().unwrap_or_default();
        if self.signed {
            cursor.put_i64(n.to_i64().unwrap_or_default())
        } else {
            cursor.put_u64(n.to_u64().unwrap_or_default())
        }
    }

    fn read(&self, cursor: &mut Cursor) -> Result<Value, Error> {
        Ok(Value::BigInt(if self.signed {
            cursor.get_i64()?.into()
        } else {
            cursor.get_u64()?.into()
        }))
    }

    fn validate(&self, value: &Value, _: bool) -> Result<(), Problem> {
        let Value::BigInt(n) = value else {
            return Err(Problem::new(self.name(), "Expected a big integer"));
        };
        let (min, max) = self.bounds();
        if *n < min || *n > max {
            return Err(Problem::new(
                self.name(),
                format!("Expected a number between {min} and {max}"),
            ));
        }
        Ok(())
    }

    fn sample(&self) -> Value {
        Value::BigInt(BigInt::zero())
    }

    fn sanitize(&self, value: &Value) -> Value {
        let (min, max) = self.bounds();
        Value::BigInt(coerce_bigint(value).clamp(min, max))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins;
    use num_traits::One;

    fn big(n: i64) -> Value {
        Value::BigInt(BigInt::from(n))
    }

    #[test]
    fn test_ubi_large() {
        let b = builtins();
        let value = Value::BigInt(BigInt::one() << 100);
        let encoded = b.ubi.encode(&value).unwrap();
        // 2^100 needs 13 magnitude bytes: 0x10 followed by twelve zeros.
        assert_eq!(encoded.len(), 2 + 13);
        assert_eq!(&encoded[..3], &[13, 0, 0x10]);
        assert!(encoded[3..].iter().all(|&b| b == 0));
        assert_eq!(b.ubi.decode(&encoded).unwrap(), value);
    }

    #[test]
    fn test_ubi_zero() {
        let b = builtins();
        let encoded = b.ubi.encode(&big(0)).unwrap();
        assert_eq!(encoded.as_ref(), &[1, 0, 0]);
        assert_eq!(b.ubi.decode(&encoded).unwrap(), big(0));
    }

    #[test]
    fn test_bi_sign() {
        let b = builtins();
        let encoded = b.bi.encode(&big(-258)).unwrap();
        assert_eq!(encoded.as_ref(), &[1, 2, 0, 0x01, 0x02]);
        assert_eq!(b.bi.decode(&encoded).unwrap(), big(-258));
        let encoded = b.bi.encode(&big(5)).unwrap();
        assert_eq!(encoded.as_ref(), &[0, 1, 0, 5]);
    }

    #[test]
    fn test_nbi() {
        let b = builtins();
        let encoded = b.nbi.encode(&big(-5)).unwrap();
        assert_eq!(encoded.as_ref(), &[1, 0, 5]);
        assert_eq!(b.nbi.decode(&encoded).unwrap(), big(-5));
        let problem = b.nbi.validate(&big(1)).unwrap_err();
        assert_eq!(problem.message(), "Expected a non-positive big integer");
        assert_eq!(b.nbi.sanitize(&Value::from(7)), big(-7));
    }

    #[test]
    fn test_big_validation() {
        let b = builtins();
        assert!(b.bi.validate(&Value::from(3)).is_err());
        assert!(b.ubi.validate(&big(-1)).is_err());
        assert_eq!(b.ubi.sanitize(&Value::from(-3.7)), big(3));
        assert_eq!(b.bi.sanitize(&Value::from("-12")), big(-12));
        assert_eq!(b.bi.sanitize(&Value::Null), big(0));
    }

    #[test]
    fn test_int64() {
        let b = builtins();
        for value in [0, 1, i64::MIN, i64::MAX] {
            let encoded = b.i64.encode(&big(value)).unwrap();
            assert_eq!(encoded.as_ref(), &value.to_le_bytes());
            assert_eq!(b.i64.decode(&encoded).unwrap(), big(value));
        }
        let max = Value::BigInt(BigInt::from(u64::MAX));
        let encoded = b.u64.encode(&max).unwrap();
        assert_eq!(encoded.as_ref(), &[0xFF; 8]);
        assert_eq!(b.u64.decode(&encoded).unwrap(), max);
        assert!(b.u64.validate(&big(-1)).is_err());
        assert_eq!(b.u64.sanitize(&big(-1)), big(0));
        assert_eq!(
            b.i64.sanitize(&Value::BigInt(BigInt::from(u64::MAX))),
            big(i64::MAX)
        );
    }
}
