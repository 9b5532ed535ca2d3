//! The well-known codecs.
//!
//! Built once, on first use, in a fixed order so that each receives a stable registry id below 256
//! (the self-describing codec writes ids as a single byte).

use crate::{
    types::{
        adapters::{ConstantSchema, IgnoreSchema},
        any::AnySchema,
        bigint::{BigSchema, Int64Schema, Precision},
        map::MapSchema,
        primitives::{BoolSchema, Float, FloatSchema, Int, IntSchema, NumberSchema},
        string::{CStringSchema, PrefixedStringSchema},
        vec::{ArraySchema, SeqKind},
    },
    Codec, Element, LengthPrefix, Value,
};
use num_bigint::BigInt;
use std::sync::OnceLock;

/// The codecs every program shares.
pub struct Builtins {
    pub null: Codec,
    pub absent: Codec,
    pub true_: Codec,
    pub false_: Codec,
    pub zero: Codec,
    pub big_zero: Codec,
    pub nan: Codec,
    pub inf: Codec,
    pub neg_inf: Codec,

    pub bool: Codec,
    pub u8: Codec,
    pub u16: Codec,
    pub u32: Codec,
    pub u64: Codec,
    pub i8: Codec,
    pub i16: Codec,
    pub i32: Codec,
    pub i64: Codec,
    pub f32: Codec,
    pub f64: Codec,
    /// Self-describing number ("NumberAuto").
    pub number: Codec,

    pub ubi: Codec,
    pub bi: Codec,
    pub nbi: Codec,

    pub string8: Codec,
    pub string16: Codec,
    pub string32: Codec,
    pub cstring: Codec,

    pub any: Codec,
    pub array: Codec,
    pub set: Codec,
    pub u8array: Codec,
    pub i8array: Codec,
    pub u16array: Codec,
    pub i16array: Codec,
    pub u32array: Codec,
    pub i32array: Codec,
    pub u64array: Codec,
    pub i64array: Codec,
    pub f32array: Codec,
    pub f64array: Codec,
    pub map: Codec,
    /// Key-value record over [Value::Object].
    pub object: Codec,

    pub ignore: Codec,
}

impl Builtins {
    fn build() -> Self {
        let marker = |value: Value, name: &str| {
            Codec::register(ConstantSchema::new(value, Some(name.to_owned())))
        };
        let null = marker(Value::Null, "null");
        let absent = marker(Value::Absent, "undefined");
        let true_ = marker(Value::Bool(true), "true");
        let false_ = marker(Value::Bool(false), "false");
        let zero = marker(Value::Number(0.0), "0");
        let big_zero = marker(Value::BigInt(BigInt::from(0)), "0n");
        let nan = marker(Value::Number(f64::NAN), "NaN");
        let inf = marker(Value::Number(f64::INFINITY), "Infinity");
        let neg_inf = marker(Value::Number(f64::NEG_INFINITY), "-Infinity");

        let bool = Codec::register(BoolSchema);
        let int = |kind| Codec::register(IntSchema::new(kind));
        let u8 = int(Int::U8);
        let u16 = int(Int::U16);
        let u32 = int(Int::U32);
        let u64 = Codec::register(Int64Schema::new(false));
        let i8 = int(Int::I8);
        let i16 = int(Int::I16);
        let i32 = int(Int::I32);
        let i64 = Codec::register(Int64Schema::new(true));
        let f32 = Codec::register(FloatSchema::new(Float::F32));
        let f64 = Codec::register(FloatSchema::new(Float::F64));
        let number = Codec::register(NumberSchema::default());

        let ubi = Codec::register(BigSchema::new(Precision::Unsigned));
        let bi = Codec::register(BigSchema::new(Precision::Signed));
        let nbi = Codec::register(BigSchema::new(Precision::Negative));

        let string8 = Codec::register(PrefixedStringSchema::new(LengthPrefix::U8));
        let string16 = Codec::register(PrefixedStringSchema::new(LengthPrefix::U16));
        let string32 = Codec::register(PrefixedStringSchema::new(LengthPrefix::U32));
        let cstring = Codec::register(CStringSchema);

        let any = Codec::register(AnySchema);
        let array = Codec::register(ArraySchema::new(None, SeqKind::Array));
        let set = Codec::register(ArraySchema::new(None, SeqKind::Set));
        let typed = |element, codec: &Codec| Codec::register(ArraySchema::typed(element, codec.clone()));
        let u8array = typed(Element::U8, &u8);
        let i8array = typed(Element::I8, &i8);
        let u16array = typed(Element::U16, &u16);
        let i16array = typed(Element::I16, &i16);
        let u32array = typed(Element::U32, &u32);
        let i32array = typed(Element::I32, &i32);
        let u64array = typed(Element::U64, &u64);
        let i64array = typed(Element::I64, &i64);
        let f32array = typed(Element::F32, &f32);
        let f64array = typed(Element::F64, &f64);
        let map = Codec::register(MapSchema::map());
        let object = Codec::register(MapSchema::record());

        let ignore = Codec::register(IgnoreSchema);

        Self {
            null,
            absent,
            true_,
            false_,
            zero,
            big_zero,
            nan,
            inf,
            neg_inf,
            bool,
            u8,
            u16,
            u32,
            u64,
            i8,
            i16,
            i32,
            i64,
            f32,
            f64,
            number,
            ubi,
            bi,
            nbi,
            string8,
            string16,
            string32,
            cstring,
            any,
            array,
            set,
            u8array,
            i8array,
            u16array,
            i16array,
            u32array,
            i32array,
            u64array,
            i64array,
            f32array,
            f64array,
            map,
            object,
            ignore,
        }
    }

    /// The length-prefixed string codec with the given prefix width.
    pub fn string(&self, prefix: LengthPrefix) -> Codec {
        match prefix {
            LengthPrefix::U8 => self.string8.clone(),
            LengthPrefix::U16 => self.string16.clone(),
            LengthPrefix::U32 => self.string32.clone(),
        }
    }

    /// The typed array codec holding `element`s.
    pub fn typed(&self, element: Element) -> &Codec {
        match element {
            Element::U8 => &self.u8array,
            Element::I8 => &self.i8array,
            Element::U16 => &self.u16array,
            Element::I16 => &self.i16array,
            Element::U32 => &self.u32array,
            Element::I32 => &self.i32array,
            Element::U64 => &self.u64array,
            Element::I64 => &self.i64array,
            Element::F32 => &self.f32array,
            Element::F64 => &self.f64array,
        }
    }
}

/// Returns the well-known codecs, building them on first use.
pub fn builtins() -> &'static Builtins {
    static BUILTINS: OnceLock<Builtins> = OnceLock::new();
    BUILTINS.get_or_init(Builtins::build)
}
