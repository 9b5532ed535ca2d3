//! The self-describing codec.
//!
//! The `any` codec infers a concrete codec from the runtime shape of a value, writes that codec's
//! registry id as a single byte, then the codec's own encoding. Reading looks the id up in the
//! [Registry] and delegates.
//!
//! The inference rules below are part of the wire format: changing their order changes the bytes
//! produced for the same value.

use crate::{builtins, Codec, Cursor, Error, Problem, Registry, Schema, Value};
use num_bigint::BigInt;
use num_traits::Zero;
use std::any::Any;
use tracing::debug;

/// Selects the codec that natively represents the number `n`.
///
/// In order: NaN and the infinities map to zero-width markers, as does exact zero. Integral
/// values map to the narrowest fixed-width integer (`1..=127` to `i8`, then `u8`, `u16`, `u32`
/// for larger non-negative values; `i8`, `i16`, `i32` for negative values). Everything else,
/// including integers outside of 32-bit range, maps to `f64`. `f32` is never selected.
pub fn number_codec(n: f64) -> &'static Codec {
    let b = builtins();
    if n.is_nan() {
        return &b.nan;
    }
    if n == f64::INFINITY {
        return &b.inf;
    }
    if n == f64::NEG_INFINITY {
        return &b.neg_inf;
    }
    if n == 0.0 {
        return &b.zero;
    }
    if n.fract() == 0.0 {
        if n > 0.0 {
            if n <= i8::MAX as f64 {
                return &b.i8;
            }
            if n <= u8::MAX as f64 {
                return &b.u8;
            }
            if n <= u16::MAX as f64 {
                return &b.u16;
            }
            if n <= u32::MAX as f64 {
                return &b.u32;
            }
        } else {
            if n >= i8::MIN as f64 {
                return &b.i8;
            }
            if n >= i16::MIN as f64 {
                return &b.i16;
            }
            if n >= i32::MIN as f64 {
                return &b.i32;
            }
        }
    }
    &b.f64
}

/// Returns the codec with registry id `id`, if [number_codec] can select it.
pub fn number_codec_by_id(id: u32) -> Option<&'static Codec> {
    let b = builtins();
    [
        &b.nan, &b.inf, &b.neg_inf, &b.zero, &b.i8, &b.u8, &b.u16, &b.u32, &b.i16, &b.i32, &b.f64,
    ]
    .into_iter()
    .find(|codec| codec.id() == id)
}

/// Selects the codec that natively represents the big integer `n`.
pub fn bigint_codec(n: &BigInt) -> &'static Codec {
    let b = builtins();
    if n.is_zero() {
        return &b.big_zero;
    }
    if *n > BigInt::zero() {
        if *n <= BigInt::from(u64::MAX) {
            return &b.u64;
        }
        return &b.ubi;
    }
    if *n >= BigInt::from(i64::MIN) {
        return &b.i64;
    }
    &b.nbi
}

/// Selects the codec the `any` codec writes `value` with.
pub fn codec_for(value: &Value) -> &'static Codec {
    let b = builtins();
    match value {
        Value::Bool(_) => &b.bool,
        Value::Null => &b.null,
        Value::Absent => &b.absent,
        Value::BigInt(n) => bigint_codec(n),
        Value::Number(n) => number_codec(*n),
        Value::String(s) => match s.len() {
            len if len <= u8::MAX as usize => &b.string8,
            len if len <= u16::MAX as usize => &b.string16,
            len if len as u64 <= u32::MAX as u64 => &b.string32,
            _ => &b.cstring,
        },
        Value::Array(_) => &b.array,
        Value::Map(_) => &b.map,
        Value::Set(_) => &b.set,
        Value::Typed(array) => b.typed(array.element()),
        Value::Object(_) => &b.object,
    }
}

fn lookup(cursor: &mut Cursor) -> Result<Codec, Error> {
    let id = cursor.get_u8()?.into();
    Registry::global().get(id).ok_or_else(|| {
        debug!(id, codec = "any", "unknown codec id");
        Error::UnknownCodec(id)
    })
}

/// The self-describing codec.
#[derive(Clone, Debug, Default)]
pub struct AnySchema;

impl Schema for AnySchema {
    fn name(&self) -> String {
        "any".into()
    }

    fn encode_size(&self, value: &Value) -> usize {
        1 + codec_for(value).encode_size_unchecked(value)
    }

    fn write(&self, cursor: &mut Cursor, value: &Value) -> Result<(), Error> {
        let codec = codec_for(value);
        let id = u8::try_from(codec.id()).map_err(|_| {
            Error::InvalidData(self.name(), format!("codec id {} exceeds u8", codec.id()))
        })?;
        cursor.put_u8(id)?;
        codec.write_unchecked(cursor, value)
    }

    fn read(&self, cursor: &mut Cursor) -> Result<Value, Error> {
        lookup(cursor)?.read(cursor)
    }

    fn read_into(&self, cursor: &mut Cursor, target: &mut Value) -> Result<(), Error> {
        let codec = lookup(cursor)?;
        if codec.validate_strict(target).is_ok() {
            return codec.read_into(cursor, target);
        }
        *target = codec.read(cursor)?;
        Ok(())
    }

    fn validate(&self, value: &Value, strict: bool) -> Result<(), Problem> {
        codec_for(value).check(value, strict)
    }

    fn sample(&self) -> Value {
        Value::Null
    }

    fn sanitize(&self, value: &Value) -> Value {
        match self.validate(value, false) {
            Ok(()) => value.clone(),
            Err(_) => self.sample(),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
