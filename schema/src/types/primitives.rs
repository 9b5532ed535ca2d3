//! Codecs for booleans, fixed-width numbers, and the automatic number codec.
//!
//! # Numbers
//!
//! Fixed-width integers hold [Value::Number]s that are integral and within range of the width.
//! Floats accept any number (including NaN and the infinities) and are never range checked.
//!
//! The automatic `number` codec writes a 1-byte registry id naming the narrowest fixed-width codec
//! (or zero-width marker) that represents the value exactly, followed by that codec's encoding.
//! See [crate::types::any::number_codec] for the selection rule.

use crate::{
    types::any::{number_codec, number_codec_by_id},
    Cursor, Error, Problem, RangeCfg, Schema, Value,
};
use num_traits::ToPrimitive;
use std::{any::Any, ops::Bound};
use tracing::debug;

/// Coerces arbitrary input into a number. Unparsable strings become NaN.
pub(crate) fn coerce_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => *n,
        Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        Value::BigInt(n) => n.to_f64().unwrap_or(f64::NAN),
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => 0.0,
    }
}

/// The one-byte boolean codec.
#[derive(Clone, Debug, Default)]
pub struct BoolSchema;

impl Schema for BoolSchema {
    fn name(&self) -> String {
        "bool".into()
    }

    fn encode_size(&self, _: &Value) -> usize {
        1
    }

    fn write(&self, cursor: &mut Cursor, value: &Value) -> Result<(), Error> {
        cursor.put_u8(u8::from(value.truthy()))
    }

    fn read(&self, cursor: &mut Cursor) -> Result<Value, Error> {
        Ok(Value::Bool(cursor.get_u8()? != 0))
    }

    fn validate(&self, value: &Value, _: bool) -> Result<(), Problem> {
        match value {
            Value::Bool(_) => Ok(()),
            _ => Err(Problem::new(self.name(), "Expected a boolean")),
        }
    }

    fn sample(&self) -> Value {
        Value::Bool(false)
    }

    fn sanitize(&self, value: &Value) -> Value {
        Value::Bool(value.truthy())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Width and signedness of a fixed-width integer codec holding [Value::Number]s.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Int {
    U8,
    U16,
    U32,
    I8,
    I16,
    I32,
}

impl Int {
    pub const fn name(self) -> &'static str {
        match self {
            Int::U8 => "u8",
            Int::U16 => "u16",
            Int::U32 => "u32",
            Int::I8 => "i8",
            Int::I16 => "i16",
            Int::I32 => "i32",
        }
    }

    pub const fn width(self) -> usize {
        match self {
            Int::U8 | Int::I8 => 1,
            Int::U16 | Int::I16 => 2,
            Int::U32 | Int::I32 => 4,
        }
    }

    pub const fn signed(self) -> bool {
        matches!(self, Int::I8 | Int::I16 | Int::I32)
    }

    pub const fn min(self) -> f64 {
        match self {
            Int::U8 | Int::U16 | Int::U32 => 0.0,
            Int::I8 => i8::MIN as f64,
            Int::I16 => i16::MIN as f64,
            Int::I32 => i32::MIN as f64,
        }
    }

    pub const fn max(self) -> f64 {
        match self {
            Int::U8 => u8::MAX as f64,
            Int::U16 => u16::MAX as f64,
            Int::U32 => u32::MAX as f64,
            Int::I8 => i8::MAX as f64,
            Int::I16 => i16::MAX as f64,
            Int::I32 => i32::MAX as f64,
        }
    }
}

/// A fixed-width integer codec.
#[derive(Clone, Debug)]
pub struct IntSchema {
    kind: Int,
}

impl IntSchema {
    pub fn new(kind: Int) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> Int {
        self.kind
    }
}

impl Schema for IntSchema {
    fn name(&self) -> String {
        self.kind.name().into()
    }

    fn encode_size(&self, _: &Value) -> usize {
        self.kind.width()
    }

    fn write(&self, cursor: &mut Cursor, value: &Value) -> Result<(), Error> {
        let n = value.as_f64().unwrap_or_default();
        match self.kind {
            Int::U8 => cursor.put_u8(n as u8),
            Int::U16 => cursor.put_u16(n as u16),
            Int::U32 => cursor.put_u32(n as u32),
            Int::I8 => cursor.put_i8(n as i8),
            Int::I16 => cursor.put_i16(n as i16),
            Int::I32 => cursor.put_i32(n as i32),
        }
    }

    fn read(&self, cursor: &mut Cursor) -> Result<Value, Error> {
        Ok(match self.kind {
            Int::U8 => cursor.get_u8()?.into(),
            Int::U16 => cursor.get_u16()?.into(),
            Int::U32 => cursor.get_u32()?.into(),
            Int::I8 => cursor.get_i8()?.into(),
            Int::I16 => cursor.get_i16()?.into(),
            Int::I32 => cursor.get_i32()?.into(),
        })
    }

    fn validate(&self, value: &Value, _: bool) -> Result<(), Problem> {
        let Value::Number(n) = value else {
            return Err(Problem::new(self.name(), "Expected a number"));
        };
        if !n.is_finite() || n.fract() != 0.0 {
            return Err(Problem::new(self.name(), "Expected an integer"));
        }
        let (min, max) = (self.kind.min(), self.kind.max());
        if *n < min || *n > max {
            return Err(Problem::new(
                self.name(),
                format!("Expected a number between {min} and {max}"),
            ));
        }
        Ok(())
    }

    fn sample(&self) -> Value {
        Value::Number(0.0)
    }

    fn sanitize(&self, value: &Value) -> Value {
        let n = coerce_number(value);
        if n.is_nan() {
            return self.sample();
        }
        let mut n = n.clamp(self.kind.min(), self.kind.max()).round();
        if !self.kind.signed() && n.is_sign_negative() {
            n = -n;
        }
        Value::Number(n)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Width of a floating point codec.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Float {
    F32,
    F64,
}

/// A fixed-width IEEE-754 codec.
#[derive(Clone, Debug)]
pub struct FloatSchema {
    kind: Float,
}

impl FloatSchema {
    pub fn new(kind: Float) -> Self {
        Self { kind }
    }
}

impl Schema for FloatSchema {
    fn name(&self) -> String {
        match self.kind {
            Float::F32 => "f32".into(),
            Float::F64 => "f64".into(),
        }
    }

    fn encode_size(&self, _: &Value) -> usize {
        match self.kind {
            Float::F32 => 4,
            Float::F64 => 8,
        }
    }

    fn write(&self, cursor: &mut Cursor, value: &Value) -> Result<(), Error> {
        let n = value.as_f64().unwrap_or_default();
        match self.kind {
            Float::F32 => cursor.put_f32(n as f32),
            Float::F64 => cursor.put_f64(n),
        }
    }

    fn read(&self, cursor: &mut Cursor) -> Result<Value, Error> {
        Ok(match self.kind {
            Float::F32 => cursor.get_f32()?.into(),
            Float::F64 => cursor.get_f64()?.into(),
        })
    }

    fn validate(&self, value: &Value, _: bool) -> Result<(), Problem> {
        match value {
            Value::Number(_) => Ok(()),
            _ => Err(Problem::new(self.name(), "Expected a number")),
        }
    }

    fn sample(&self) -> Value {
        Value::Number(0.0)
    }

    fn sanitize(&self, value: &Value) -> Value {
        match value {
            Value::Number(_) => value.clone(),
            other => {
                let n = coerce_number(other);
                Value::Number(if n.is_nan() { 0.0 } else { n })
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The automatic number codec: a registry id followed by the selected codec's encoding.
#[derive(Clone, Debug)]
pub struct NumberSchema {
    range: RangeCfg<f64>,
}

impl NumberSchema {
    pub fn new(range: RangeCfg<f64>) -> Self {
        Self { range }
    }

    pub fn range(&self) -> RangeCfg<f64> {
        self.range
    }

    fn clamp(&self, n: f64) -> f64 {
        use std::ops::RangeBounds;
        match self.range.start_bound() {
            Bound::Included(s) if n < *s => return *s,
            Bound::Excluded(s) if n <= *s => return step(*s, f64::INFINITY),
            _ => {}
        }
        match self.range.end_bound() {
            Bound::Included(e) if n > *e => return *e,
            Bound::Excluded(e) if n >= *e => return step(*e, f64::NEG_INFINITY),
            _ => {}
        }
        n
    }
}

/// Returns the representable float next to `from` in the direction of `toward`.
fn step(from: f64, toward: f64) -> f64 {
    if from.is_nan() || from.is_infinite() || from == toward {
        return from;
    }
    if from == 0.0 {
        let tiny = f64::from_bits(1);
        return if toward > 0.0 { tiny } else { -tiny };
    }
    let bits = from.to_bits();
    if (toward > from) == (from > 0.0) {
        f64::from_bits(bits + 1)
    } else {
        f64::from_bits(bits - 1)
    }
}

impl Default for NumberSchema {
    fn default() -> Self {
        Self::new(RangeCfg::full())
    }
}

impl Schema for NumberSchema {
    fn name(&self) -> String {
        if self.range == RangeCfg::full() {
            return "number".into();
        }
        format!("number{}", self.range)
    }

    fn encode_size(&self, value: &Value) -> usize {
        let n = value.as_f64().unwrap_or_default();
        1 + number_codec(n).encode_size_unchecked(value)
    }

    fn write(&self, cursor: &mut Cursor, value: &Value) -> Result<(), Error> {
        let n = value.as_f64().unwrap_or_default();
        let codec = number_codec(n);
        cursor.put_u8(codec.id() as u8)?;
        codec.write_unchecked(cursor, value)
    }

    fn read(&self, cursor: &mut Cursor) -> Result<Value, Error> {
        let id = cursor.get_u8()?.into();
        let Some(codec) = number_codec_by_id(id) else {
            debug!(id, codec = "number", "not a number codec id");
            return Err(Error::UnknownCodec(id));
        };
        codec.read(cursor)
    }

    fn validate(&self, value: &Value, _: bool) -> Result<(), Problem> {
        let Value::Number(n) = value else {
            return Err(Problem::new(self.name(), "Not a number"));
        };
        if !n.is_nan() && !self.range.contains(n) {
            return Err(Problem::new(
                self.name(),
                format!("Expected a number in {}", self.range),
            ));
        }
        Ok(())
    }

    fn sample(&self) -> Value {
        Value::Number(self.clamp(0.0))
    }

    fn sanitize(&self, value: &Value) -> Value {
        let n = coerce_number(value);
        if n.is_nan() {
            return self.sample();
        }
        Value::Number(self.clamp(n))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{builtins, Codec};
    use paste::paste;

    macro_rules! impl_int_test {
        ($name:ident, $type:ty) => {
            paste! {
                #[test]
                fn [<test_ $name>]() {
                    let codec = &builtins().$name;
                    let width = std::mem::size_of::<$type>();
                    for value in [0 as $type, 1 as $type, 42 as $type, <$type>::MAX, <$type>::MIN] {
                        let value = Value::from(value);
                        let encoded = codec.encode(&value).unwrap();
                        assert_eq!(encoded.len(), width);
                        assert_eq!(codec.encode_size(&value).unwrap(), width);
                        assert_eq!(codec.decode(&encoded).unwrap(), value);
                    }
                    let over = Value::Number(<$type>::MAX as f64 + 1.0);
                    assert!(codec.validate(&over).is_err());
                    assert_eq!(codec.sanitize(&over), Value::from(<$type>::MAX));
                }
            }
        };
    }
    impl_int_test!(u8, u8);
    impl_int_test!(u16, u16);
    impl_int_test!(u32, u32);
    impl_int_test!(i8, i8);
    impl_int_test!(i16, i16);
    impl_int_test!(i32, i32);

    #[test]
    fn test_scenario_u8() {
        let b = builtins();
        let encoded = b.u8.encode(&Value::from(10)).unwrap();
        assert_eq!(encoded.as_ref(), &[0x0A]);
        assert_eq!(b.u8.decode(&encoded).unwrap(), Value::from(10));
    }

    #[test]
    fn test_int_problems() {
        let b = builtins();
        let problem = b.i8.validate(&Value::from("1")).unwrap_err();
        assert_eq!(problem.message(), "Expected a number");
        let problem = b.i8.validate(&Value::from(1.5)).unwrap_err();
        assert_eq!(problem.message(), "Expected an integer");
        let problem = b.i8.validate(&Value::from(-129)).unwrap_err();
        assert_eq!(problem.message(), "Expected a number between -128 and 127");
        assert!(b.u8.validate(&Value::Number(f64::NAN)).is_err());
    }

    #[test]
    fn test_int_sanitize() {
        let b = builtins();
        assert_eq!(b.u8.sanitize(&Value::from(-5)), Value::from(0));
        assert_eq!(b.u8.sanitize(&Value::from(-500)), Value::from(0));
        assert!(b.u8.sanitize(&Value::from(-0.4)).as_f64().unwrap().is_sign_positive());
        assert_eq!(b.i8.sanitize(&Value::from(-500)), Value::from(-128));
        assert_eq!(b.u16.sanitize(&Value::from(2.6)), Value::from(3));
        assert_eq!(b.u16.sanitize(&Value::from(" 17 ")), Value::from(17));
        assert_eq!(b.u16.sanitize(&Value::from("seventeen")), Value::from(0));
        assert_eq!(b.u16.sanitize(&Value::Null), Value::from(0));
        assert_eq!(b.u16.sanitize(&Value::Number(f64::NAN)), Value::from(0));
        assert_eq!(b.i32.sanitize(&Value::Number(f64::INFINITY)), Value::from(i32::MAX));
    }

    #[test]
    fn test_little_endian_ints() {
        let b = builtins();
        assert_eq!(b.u32.encode(&Value::from(3)).unwrap().as_ref(), &[3, 0, 0, 0]);
        assert_eq!(b.i16.encode(&Value::from(-2)).unwrap().as_ref(), &[0xFE, 0xFF]);
    }

    #[test]
    fn test_bool() {
        let b = builtins();
        for value in [true, false] {
            let encoded = b.bool.encode(&Value::from(value)).unwrap();
            assert_eq!(encoded.as_ref(), &[u8::from(value)]);
            assert_eq!(b.bool.decode(&encoded).unwrap(), Value::from(value));
        }
        assert_eq!(b.bool.decode(&[7]).unwrap(), Value::from(true));
        assert!(b.bool.validate(&Value::from(1)).is_err());
        assert_eq!(b.bool.sanitize(&Value::from("yes")), Value::from(true));
        assert_eq!(b.bool.sanitize(&Value::from(0)), Value::from(false));
    }

    #[test]
    fn test_floats() {
        let b = builtins();
        for value in [0.0, 1.5, -2.25, f64::INFINITY] {
            let encoded = b.f32.encode(&Value::from(value)).unwrap();
            assert_eq!(encoded.len(), 4);
            assert_eq!(b.f32.decode(&encoded).unwrap(), Value::from(value));
        }
        let encoded = b.f64.encode(&Value::from(0.1)).unwrap();
        assert_eq!(encoded.as_ref(), &0.1f64.to_le_bytes());
        let decoded = b.f64.decode(&b.f64.encode(&Value::Number(f64::NAN)).unwrap()).unwrap();
        assert!(decoded.same(&Value::Number(f64::NAN)));
        assert!(b.f64.validate(&Value::from(true)).is_err());
        assert_eq!(b.f64.sanitize(&Value::from("2.5")), Value::from(2.5));
    }

    #[test]
    fn test_number_prefix() {
        let b = builtins();
        let encoded = b.number.encode(&Value::from(200)).unwrap();
        assert_eq!(encoded.as_ref(), &[b.u8.id() as u8, 200]);
        let encoded = b.number.encode(&Value::from(0)).unwrap();
        assert_eq!(encoded.as_ref(), &[b.zero.id() as u8]);
        assert_eq!(b.number.decode(&encoded).unwrap(), Value::from(0));
        let encoded = b.number.encode(&Value::from(-1.5)).unwrap();
        assert_eq!(encoded.len(), 9);
        assert_eq!(b.number.decode(&encoded).unwrap(), Value::from(-1.5));
        assert!(b.number.validate(&Value::from("1")).is_err());
    }

    #[test]
    fn test_number_rejects_other_codecs() {
        let b = builtins();
        let string = [b.string8.id() as u8, 2, b'h', b'i'];
        assert!(matches!(
            b.number.decode(&string),
            Err(Error::UnknownCodec(id)) if id == b.string8.id()
        ));
        let array = [b.array.id() as u8, 0, 0, 0, 0];
        assert!(matches!(b.number.decode(&array), Err(Error::UnknownCodec(_))));
        let nested = [b.number.id() as u8, b.zero.id() as u8];
        assert!(matches!(b.number.decode(&nested), Err(Error::UnknownCodec(_))));
        for codec in [&b.u64, &b.f32, &b.bool] {
            assert!(b.number.decode(&[codec.id() as u8, 0, 0, 0, 0, 0, 0, 0, 0]).is_err());
        }

        // Every id the selection rule produces decodes.
        for n in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 0.0, 5.0, 200.0, 7e4, -300.0, 0.5] {
            let encoded = b.number.encode(&Value::from(n)).unwrap();
            assert!(b.number.decode(&encoded).unwrap().same(&Value::from(n)));
        }
    }

    #[test]
    fn test_number_range() {
        let codec = Codec::number_in(RangeCfg::new(1.0..=10.0));
        assert_eq!(codec.name(), "number[1, 10]");
        assert!(codec.validate(&Value::from(5)).is_ok());
        assert!(codec.validate(&Value::from(11)).is_err());
        assert_eq!(codec.sanitize(&Value::from(11)), Value::from(10));
        assert_eq!(codec.sample(), Value::from(1));
        assert_eq!(codec.sanitize(&Value::Null), Value::from(1));
    }

    #[test]
    fn test_number_exclusive_range() {
        let codec = Codec::number_in(RangeCfg::new((Bound::Excluded(0.0), Bound::Excluded(1.0))));
        assert!(codec.validate(&Value::from(0)).is_err());
        assert!(codec.validate(&Value::from(1)).is_err());

        let sample = codec.sample();
        assert!(codec.validate(&sample).is_ok());
        assert!(sample.as_f64().unwrap() > 0.0);
        for input in [-5.0, 0.0, 1.0, 7.5] {
            let sanitized = codec.sanitize(&Value::from(input));
            assert!(codec.validate(&sanitized).is_ok(), "{input} -> {sanitized:?}");
        }
        assert_eq!(codec.sanitize(&Value::from(0.5)), Value::from(0.5));

        let above = Codec::number_in(RangeCfg::new((Bound::Excluded(-2.0), Bound::Unbounded)));
        let sanitized = above.sanitize(&Value::from(-3));
        assert!(above.validate(&sanitized).is_ok());
        assert!(sanitized.as_f64().unwrap() > -2.0);
    }
}
