//! The dynamic value tree every codec reads and writes.

use num_bigint::BigInt;
use num_traits::ToPrimitive;
use std::{borrow::Cow, collections::BTreeMap, fmt};

/// A dynamically typed value.
///
/// [Value::Absent] marks "no value at all" (a missing field), which is distinct from the explicit
/// [Value::Null].
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Absent,
    Null,
    Bool(bool),
    Number(f64),
    BigInt(BigInt),
    String(String),
    Array(Vec<Value>),
    /// Insertion-ordered collection of distinct values.
    Set(Vec<Value>),
    /// Insertion-ordered key-value pairs with distinct keys.
    Map(Vec<(Value, Value)>),
    Object(BTreeMap<String, Value>),
    Typed(TypedArray),
}

/// Element type of a [TypedArray].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Element {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
}

impl Element {
    pub const ALL: [Element; 10] = [
        Element::U8,
        Element::I8,
        Element::U16,
        Element::I16,
        Element::U32,
        Element::I32,
        Element::U64,
        Element::I64,
        Element::F32,
        Element::F64,
    ];

    /// Name of the array type holding this element.
    pub const fn array_name(self) -> &'static str {
        match self {
            Element::U8 => "U8Array",
            Element::I8 => "I8Array",
            Element::U16 => "U16Array",
            Element::I16 => "I16Array",
            Element::U32 => "U32Array",
            Element::I32 => "I32Array",
            Element::U64 => "U64Array",
            Element::I64 => "I64Array",
            Element::F32 => "F32Array",
            Element::F64 => "F64Array",
        }
    }
}

/// A homogeneous array of fixed-width numbers.
#[derive(Clone, Debug, PartialEq)]
pub enum TypedArray {
    U8(Vec<u8>),
    I8(Vec<i8>),
    U16(Vec<u16>),
    I16(Vec<i16>),
    U32(Vec<u32>),
    I32(Vec<i32>),
    U64(Vec<u64>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

macro_rules! for_each_typed {
    ($array:expr, $items:ident => $body:expr) => {
        match $array {
            TypedArray::U8($items) => $body,
            TypedArray::I8($items) => $body,
            TypedArray::U16($items) => $body,
            TypedArray::I16($items) => $body,
            TypedArray::U32($items) => $body,
            TypedArray::I32($items) => $body,
            TypedArray::U64($items) => $body,
            TypedArray::I64($items) => $body,
            TypedArray::F32($items) => $body,
            TypedArray::F64($items) => $body,
        }
    };
}

impl TypedArray {
    /// An empty array of `element`s.
    pub fn empty(element: Element) -> Self {
        Self::zeroed(element, 0)
    }

    /// An array of `len` zeros.
    pub fn zeroed(element: Element, len: usize) -> Self {
        match element {
            Element::U8 => TypedArray::U8(vec![0; len]),
            Element::I8 => TypedArray::I8(vec![0; len]),
            Element::U16 => TypedArray::U16(vec![0; len]),
            Element::I16 => TypedArray::I16(vec![0; len]),
            Element::U32 => TypedArray::U32(vec![0; len]),
            Element::I32 => TypedArray::I32(vec![0; len]),
            Element::U64 => TypedArray::U64(vec![0; len]),
            Element::I64 => TypedArray::I64(vec![0; len]),
            Element::F32 => TypedArray::F32(vec![0.0; len]),
            Element::F64 => TypedArray::F64(vec![0.0; len]),
        }
    }

    pub fn element(&self) -> Element {
        match self {
            TypedArray::U8(_) => Element::U8,
            TypedArray::I8(_) => Element::I8,
            TypedArray::U16(_) => Element::U16,
            TypedArray::I16(_) => Element::I16,
            TypedArray::U32(_) => Element::U32,
            TypedArray::I32(_) => Element::I32,
            TypedArray::U64(_) => Element::U64,
            TypedArray::I64(_) => Element::I64,
            TypedArray::F32(_) => Element::F32,
            TypedArray::F64(_) => Element::F64,
        }
    }

    pub fn len(&self) -> usize {
        for_each_typed!(self, items => items.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Converts every element into a [Value]. 64-bit integers become [Value::BigInt], everything
    /// else becomes [Value::Number].
    pub fn to_values(&self) -> Vec<Value> {
        match self {
            TypedArray::U64(items) => items.iter().map(|&v| Value::BigInt(v.into())).collect(),
            TypedArray::I64(items) => items.iter().map(|&v| Value::BigInt(v.into())).collect(),
            TypedArray::F32(items) => items.iter().map(|&v| Value::Number(v as f64)).collect(),
            TypedArray::U8(items) => items.iter().map(|&v| Value::Number(v.into())).collect(),
            TypedArray::I8(items) => items.iter().map(|&v| Value::Number(v.into())).collect(),
            TypedArray::U16(items) => items.iter().map(|&v| Value::Number(v.into())).collect(),
            TypedArray::I16(items) => items.iter().map(|&v| Value::Number(v.into())).collect(),
            TypedArray::U32(items) => items.iter().map(|&v| Value::Number(v.into())).collect(),
            TypedArray::I32(items) => items.iter().map(|&v| Value::Number(v.into())).collect(),
            TypedArray::F64(items) => items.iter().map(|&v| Value::Number(v)).collect(),
        }
    }

    /// Builds an array of `element`s from values, returning `None` if any value is not an exact
    /// representable number of that element type.
    pub fn from_values(element: Element, values: &[Value]) -> Option<Self> {
        fn ints<T: TryFrom<i64>>(values: &[Value]) -> Option<Vec<T>> {
            values
                .iter()
                .map(|v| match v {
                    Value::Number(n) if n.fract() == 0.0 && n.is_finite() => {
                        T::try_from(*n as i64).ok()
                    }
                    _ => None,
                })
                .collect()
        }
        Some(match element {
            Element::U8 => TypedArray::U8(ints(values)?),
            Element::I8 => TypedArray::I8(ints(values)?),
            Element::U16 => TypedArray::U16(ints(values)?),
            Element::I16 => TypedArray::I16(ints(values)?),
            Element::U32 => TypedArray::U32(ints(values)?),
            Element::I32 => TypedArray::I32(ints(values)?),
            Element::U64 => TypedArray::U64(
                values
                    .iter()
                    .map(|v| v.as_bigint().and_then(ToPrimitive::to_u64))
                    .collect::<Option<_>>()?,
            ),
            Element::I64 => TypedArray::I64(
                values
                    .iter()
                    .map(|v| v.as_bigint().and_then(ToPrimitive::to_i64))
                    .collect::<Option<_>>()?,
            ),
            Element::F32 => TypedArray::F32(
                values
                    .iter()
                    .map(|v| v.as_f64().map(|n| n as f32))
                    .collect::<Option<_>>()?,
            ),
            Element::F64 => TypedArray::F64(values.iter().map(Value::as_f64).collect::<Option<_>>()?),
        })
    }
}

impl Value {
    /// Short name of the value's shape, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Absent => "absent",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::BigInt(_) => "big integer",
            Value::String(_) => "string",
            Value::Array(_) => "Array",
            Value::Set(_) => "Set",
            Value::Map(_) => "Map",
            Value::Object(_) => "object",
            Value::Typed(array) => array.element().array_name(),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bigint(&self) -> Option<&BigInt> {
        match self {
            Value::BigInt(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the field `name` of an object.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Object(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Returns the elements of a sequence (array, set, or typed array).
    pub fn elements(&self) -> Option<Cow<'_, [Value]>> {
        match self {
            Value::Array(items) | Value::Set(items) => Some(Cow::Borrowed(items)),
            Value::Typed(array) => Some(Cow::Owned(array.to_values())),
            _ => None,
        }
    }

    /// Returns the entries of a key-value container (map or object).
    pub fn entries(&self) -> Option<Vec<(Value, &Value)>> {
        match self {
            Value::Map(entries) => Some(entries.iter().map(|(k, v)| (k.clone(), v)).collect()),
            Value::Object(fields) => Some(
                fields
                    .iter()
                    .map(|(k, v)| (Value::String(k.clone()), v))
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Loose truthiness: absent, null, false, zero, NaN, and the empty string are false.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Absent | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::BigInt(n) => n.sign() != num_bigint::Sign::NoSign,
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Equality that treats NaN as equal to itself.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            _ => self == other,
        }
    }

    /// Builds an object from `(name, value)` pairs.
    pub fn object<K: Into<String>>(fields: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Builds a set, dropping repeated values.
    pub fn set(items: impl IntoIterator<Item = Value>) -> Self {
        let mut set: Vec<Value> = Vec::new();
        for item in items {
            if !set.iter().any(|v| v.same(&item)) {
                set.push(item);
            }
        }
        Value::Set(set)
    }

    /// Builds a map; later entries replace earlier entries with the same key.
    pub fn map(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        let mut map = Vec::new();
        for (key, value) in entries {
            insert_entry(&mut map, key, value);
        }
        Value::Map(map)
    }
}

/// Inserts `(key, value)`, replacing the value of an existing equal key in place.
pub(crate) fn insert_entry(map: &mut Vec<(Value, Value)>, key: Value, value: Value) {
    match map.iter_mut().find(|(k, _)| k.same(&key)) {
        Some((_, slot)) => *slot = value,
        None => map.push((key, value)),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list<'a>(
            f: &mut fmt::Formatter<'_>,
            items: impl Iterator<Item = &'a Value>,
        ) -> fmt::Result {
            for (i, item) in items.enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{item}")?;
            }
            Ok(())
        }
        match self {
            Value::Absent => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) if n.is_nan() => write!(f, "NaN"),
            Value::Number(n) if n.is_infinite() => {
                write!(f, "{}Infinity", if *n < 0.0 { "-" } else { "" })
            }
            Value::Number(n) => write!(f, "{n}"),
            Value::BigInt(n) => write!(f, "{n}n"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Array(items) => {
                write!(f, "[")?;
                list(f, items.iter())?;
                write!(f, "]")
            }
            Value::Set(items) => {
                write!(f, "Set(")?;
                list(f, items.iter())?;
                write!(f, ")")
            }
            Value::Map(entries) => {
                write!(f, "Map(")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k} => {v}")?;
                }
                write!(f, ")")
            }
            Value::Object(fields) => {
                write!(f, "{{")?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " {k:?}: {v}")?;
                }
                write!(f, " }}")
            }
            Value::Typed(array) => {
                write!(f, "{}(", array.element().array_name())?;
                list(f, array.to_values().iter())?;
                write!(f, ")")
            }
        }
    }
}

macro_rules! impl_from_number {
    ($($type:ty),*) => {
        $(
            impl From<$type> for Value {
                fn from(value: $type) -> Self {
                    Value::Number(value.into())
                }
            }
        )*
    };
}
impl_from_number!(u8, i8, u16, i16, u32, i32, f32, f64);

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Value::BigInt(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<TypedArray> for Value {
    fn from(value: TypedArray) -> Self {
        Value::Typed(value)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(value: BTreeMap<String, Value>) -> Self {
        Value::Object(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_conversion() {
        let array = TypedArray::I16(vec![-3, 0, 7]);
        let values = array.to_values();
        assert_eq!(values, vec![Value::from(-3), Value::from(0), Value::from(7)]);
        assert_eq!(TypedArray::from_values(Element::I16, &values), Some(array));
        assert_eq!(TypedArray::from_values(Element::U8, &values), None);

        let wide = TypedArray::U64(vec![u64::MAX]);
        assert_eq!(
            TypedArray::from_values(Element::U64, &wide.to_values()),
            Some(wide)
        );
    }

    #[test]
    fn test_set_and_map_dedup() {
        let set = Value::set([Value::from(1), Value::Number(f64::NAN), Value::from(1), Value::Number(f64::NAN)]);
        match set {
            Value::Set(items) => assert_eq!(items.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
        let map = Value::map([
            (Value::from("a"), Value::from(1)),
            (Value::from("b"), Value::from(2)),
            (Value::from("a"), Value::from(3)),
        ]);
        assert_eq!(
            map,
            Value::Map(vec![
                (Value::from("a"), Value::from(3)),
                (Value::from("b"), Value::from(2)),
            ])
        );
    }

    #[test]
    fn test_display() {
        let value = Value::object([
            ("name", Value::from("ada")),
            ("tags", Value::Array(vec![Value::Null, Value::Number(f64::NEG_INFINITY)])),
        ]);
        assert_eq!(
            value.to_string(),
            "{ \"name\": \"ada\", \"tags\": [null, -Infinity] }"
        );
        assert_eq!(Value::BigInt(BigInt::from(-5)).to_string(), "-5n");
    }

    #[test]
    fn test_truthy() {
        assert!(!Value::Absent.truthy());
        assert!(!Value::from(0).truthy());
        assert!(!Value::Number(f64::NAN).truthy());
        assert!(!Value::from("").truthy());
        assert!(Value::from("x").truthy());
        assert!(Value::Array(vec![]).truthy());
    }
}
