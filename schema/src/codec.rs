//! The codec contract and the shared codec handle.

use crate::{
    builtins,
    types::{
        adapters::{ConstantSchema, DefaultSchema, DeferredSchema, Mapper, TransformSchema},
        map::MapSchema,
        object::{Constructor, ObjectSchema},
        primitives::NumberSchema,
        string::PrefixedStringSchema,
        tuple::TupleSchema,
        union::{EnumerationSchema, UnionSchema},
        vec::{ArraySchema, SeqKind},
    },
    Cursor, Error, LengthPrefix, Problem, RangeCfg, Registry, Value,
};
use bytes::Bytes;
use std::{any::Any, collections::BTreeMap, fmt, sync::Arc};
use tracing::debug;

/// Registry id of a codec.
pub type Id = u32;

/// Operations every codec implements.
///
/// `write` and `encode_size` assume the value already passed `validate`; [Codec] wraps them with
/// the validating variants.
pub trait Schema: Send + Sync + 'static {
    /// Human-readable name of the codec.
    fn name(&self) -> String;

    /// Whether "no value" is itself a valid encoded state.
    fn is_optional(&self) -> bool {
        false
    }

    /// Exact number of bytes [Schema::write] produces for `value`.
    fn encode_size(&self, value: &Value) -> usize;

    /// Writes `value`, which must have passed [Schema::validate].
    fn write(&self, cursor: &mut Cursor, value: &Value) -> Result<(), Error>;

    /// Reads a new value.
    fn read(&self, cursor: &mut Cursor) -> Result<Value, Error>;

    /// Reads into an existing value, overwriting its contents in place.
    ///
    /// Containers check that `target` has a compatible shape before mutating it.
    fn read_into(&self, cursor: &mut Cursor, target: &mut Value) -> Result<(), Error> {
        *target = self.read(cursor)?;
        Ok(())
    }

    /// Checks that `value` can be written. `strict` requires an exact shape match rather than
    /// an acceptable one.
    fn validate(&self, value: &Value, strict: bool) -> Result<(), Problem>;

    /// A canonical default value.
    fn sample(&self) -> Value;

    /// Best-effort coercion of `value` into something [Schema::validate] accepts.
    fn sanitize(&self, value: &Value) -> Value;

    fn as_any(&self) -> &dyn Any;
}

struct Inner {
    id: Id,
    name: String,
    schema: Box<dyn Schema>,
}

/// A registered, immutable, cheaply clonable codec.
///
/// # Example
///
/// ```
/// use commonware_schema::{builtins, Value};
///
/// let b = builtins();
/// let codec = b.u8.array().sized(2);
/// let encoded = codec.encode(&Value::Array(vec![1.into(), 2.into()])).unwrap();
/// assert_eq!(encoded.as_ref(), &[1, 2]);
/// ```
#[derive(Clone)]
pub struct Codec(Arc<Inner>);

impl Codec {
    /// Registers a codec built from `schema`.
    pub fn new(schema: impl Schema) -> Self {
        // Build the well-known codecs first so they own the lowest ids.
        builtins();
        Self::register(schema)
    }

    pub(crate) fn register(schema: impl Schema) -> Self {
        let name = schema.name();
        Registry::global().register(move |id| {
            Codec(Arc::new(Inner {
                id,
                name,
                schema: Box::new(schema),
            }))
        })
    }

    /// Registry id of this codec.
    pub fn id(&self) -> Id {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn is_optional(&self) -> bool {
        self.0.schema.is_optional()
    }

    /// Returns the schema if it is of type `S`.
    pub fn downcast<S: Schema>(&self) -> Option<&S> {
        self.0.schema.as_any().downcast_ref()
    }

    /// Checks `value`, returning the first [Problem] found.
    pub fn validate(&self, value: &Value) -> Result<(), Problem> {
        self.0.schema.validate(value, false)
    }

    /// Checks `value` requires an exact shape match (used for union dispatch).
    pub fn validate_strict(&self, value: &Value) -> Result<(), Problem> {
        self.0.schema.validate(value, true)
    }

    pub(crate) fn check(&self, value: &Value, strict: bool) -> Result<(), Problem> {
        self.0.schema.validate(value, strict)
    }

    /// Exact encoded size of `value`, after validating it.
    pub fn encode_size(&self, value: &Value) -> Result<usize, Error> {
        self.validate(value)?;
        Ok(self.0.schema.encode_size(value))
    }

    /// Exact encoded size of an already validated `value`.
    pub fn encode_size_unchecked(&self, value: &Value) -> usize {
        self.0.schema.encode_size(value)
    }

    /// Validates `value` and writes it. Nothing is written if validation fails.
    pub fn write(&self, cursor: &mut Cursor, value: &Value) -> Result<(), Error> {
        if let Err(problem) = self.validate(value) {
            debug!(codec = self.name(), %problem, "rejected value");
            return Err(problem.into());
        }
        self.0.schema.write(cursor, value)
    }

    /// Writes an already validated `value`.
    pub fn write_unchecked(&self, cursor: &mut Cursor, value: &Value) -> Result<(), Error> {
        self.0.schema.write(cursor, value)
    }

    /// Reads a new value.
    ///
    /// Fails with [Error::DepthExceeded] if reads nest deeper than [crate::cursor::MAX_DEPTH].
    pub fn read(&self, cursor: &mut Cursor) -> Result<Value, Error> {
        cursor.descend()?;
        let result = self.0.schema.read(cursor);
        cursor.ascend();
        result
    }

    /// Reads into `target`, overwriting it in place.
    pub fn read_into(&self, cursor: &mut Cursor, target: &mut Value) -> Result<(), Error> {
        cursor.descend()?;
        let result = self.0.schema.read_into(cursor, target);
        cursor.ascend();
        result
    }

    /// Canonical default value.
    pub fn sample(&self) -> Value {
        self.0.schema.sample()
    }

    /// Coerces `value` into something [Codec::validate] accepts, falling back to the sample.
    pub fn sanitize(&self, value: &Value) -> Value {
        let sanitized = self.0.schema.sanitize(value);
        if self.validate(&sanitized).is_ok() {
            return sanitized;
        }
        self.sample()
    }

    /// Validates and encodes `value` into a buffer of exactly [Codec::encode_size] bytes.
    pub fn encode(&self, value: &Value) -> Result<Bytes, Error> {
        if let Err(problem) = self.validate(value) {
            debug!(codec = self.name(), %problem, "rejected value");
            return Err(problem.into());
        }
        let len = self.0.schema.encode_size(value);
        let mut cursor = Cursor::alloc(len);
        self.0.schema.write(&mut cursor, value)?;
        assert_eq!(cursor.offset(), len, "write() did not write expected bytes");
        Ok(cursor.into_bytes())
    }

    /// Decodes a value, ensuring the buffer is fully consumed.
    pub fn decode(&self, buf: &[u8]) -> Result<Value, Error> {
        let mut cursor = Cursor::new(buf);
        let value = self.read(&mut cursor)?;
        match cursor.remaining() {
            0 => Ok(value),
            extra => Err(Error::ExtraData(extra)),
        }
    }

    /// Decodes into `target` in place, ensuring the buffer is fully consumed.
    pub fn decode_into(&self, buf: &[u8], target: &mut Value) -> Result<(), Error> {
        let mut cursor = Cursor::new(buf);
        self.read_into(&mut cursor, target)?;
        match cursor.remaining() {
            0 => Ok(()),
            extra => Err(Error::ExtraData(extra)),
        }
    }

    /// A variable-length array of this codec's values.
    pub fn array(&self) -> Codec {
        Self::register(ArraySchema::new(Some(self.clone()), SeqKind::Array))
    }

    /// A variable-length set of this codec's values.
    pub fn set(&self) -> Codec {
        Self::register(ArraySchema::new(Some(self.clone()), SeqKind::Set))
    }

    /// A copy of this array/set codec with a fixed length (no length prefix).
    ///
    /// Codecs that are not arrays or sets are returned unchanged.
    pub fn sized(&self, len: usize) -> Codec {
        match self.downcast::<ArraySchema>() {
            Some(array) => Self::register(array.with_fixed(Some(len))),
            None => self.clone(),
        }
    }

    /// A copy of this array, set, string, or key-value codec with a different length prefix.
    ///
    /// Other codecs are returned unchanged.
    pub fn with_prefix(&self, prefix: LengthPrefix) -> Codec {
        if let Some(array) = self.downcast::<ArraySchema>() {
            return Self::register(array.with_prefix(prefix));
        }
        if let Some(map) = self.downcast::<MapSchema>() {
            return Self::register(map.with_prefix(prefix));
        }
        if self.downcast::<PrefixedStringSchema>().is_some() {
            return builtins().string(prefix);
        }
        self.clone()
    }

    /// A copy of this array/set codec with `element` as its element codec.
    ///
    /// Codecs that are not arrays or sets are returned unchanged.
    pub fn of(&self, element: &Codec) -> Codec {
        match self.downcast::<ArraySchema>() {
            Some(array) => Self::register(array.with_element(Some(element.clone()))),
            None => self.clone(),
        }
    }

    /// A copy of this key-value codec with `key` as its key codec.
    pub fn with_key(&self, key: &Codec) -> Codec {
        match self.downcast::<MapSchema>() {
            Some(map) => Self::register(map.with_key(Some(key.clone()))),
            None => self.clone(),
        }
    }

    /// A copy of this key-value codec with `value` as its value codec.
    pub fn with_value(&self, value: &Codec) -> Codec {
        match self.downcast::<MapSchema>() {
            Some(map) => Self::register(map.with_value(Some(value.clone()))),
            None => self.clone(),
        }
    }

    /// A union of this codec and `other`.
    pub fn or(&self, other: &Codec) -> Codec {
        Self::register(UnionSchema::new(vec![self.clone(), other.clone()]))
    }

    /// A union of the null constant and this codec.
    pub fn nullable(&self) -> Codec {
        Self::register(UnionSchema::new(vec![builtins().null.clone(), self.clone()]))
    }

    /// Treats an absent value as `fallback`.
    pub fn default(&self, fallback: impl Into<Value>) -> Codec {
        Self::register(DefaultSchema::new(self.clone(), fallback.into()))
    }

    /// Reuses this codec's wire format for another value representation.
    ///
    /// `outward` converts a domain value into this codec's representation before sizing,
    /// writing, and validating; `inward` converts a decoded value back.
    pub fn transform(
        &self,
        outward: impl Fn(&Value) -> Value + Send + Sync + 'static,
        inward: impl Fn(&Value) -> Value + Send + Sync + 'static,
    ) -> Codec {
        Self::register(TransformSchema::new(
            self.clone(),
            Arc::new(outward),
            Arc::new(inward),
            None,
        ))
    }

    /// Like [Codec::transform], running `prefilter` before `outward` on every value that is
    /// validated, sanitized, sized, or written.
    pub fn transform_with(
        &self,
        outward: impl Fn(&Value) -> Value + Send + Sync + 'static,
        inward: impl Fn(&Value) -> Value + Send + Sync + 'static,
        prefilter: impl Fn(&Value) -> Value + Send + Sync + 'static,
    ) -> Codec {
        let prefilter: Mapper = Arc::new(prefilter);
        Self::register(TransformSchema::new(
            self.clone(),
            Arc::new(outward),
            Arc::new(inward),
            Some(prefilter),
        ))
    }

    /// Field codecs of an object codec, in wire (name-sorted) order.
    pub fn fields(&self) -> Option<&[(String, Codec)]> {
        self.downcast::<ObjectSchema>().map(ObjectSchema::fields)
    }

    /// An object codec holding the fields of this one and of `other`; fields of `other` replace
    /// same-named fields of this one.
    pub fn extend(&self, other: &Codec) -> Result<Codec, Error> {
        let object = self.object_schema()?;
        let extra = other.object_schema()?;
        Ok(Self::register(object.extended(extra.fields().iter().cloned())))
    }

    /// An object codec without the fields in `names`.
    pub fn exclude(&self, names: &[&str]) -> Result<Codec, Error> {
        let object = self.object_schema()?;
        Ok(Self::register(object.excluding(names)))
    }

    /// An object codec that builds decoded values with `constructor` instead of
    /// [Value::Object].
    pub fn with_constructor(
        &self,
        constructor: impl Fn(BTreeMap<String, Value>) -> Value + Send + Sync + 'static,
    ) -> Result<Codec, Error> {
        let object = self.object_schema()?;
        let constructor: Constructor = Arc::new(constructor);
        Ok(Self::register(object.with_constructor(constructor)))
    }

    fn object_schema(&self) -> Result<&ObjectSchema, Error> {
        self.downcast::<ObjectSchema>().ok_or_else(|| {
            Error::InvalidData(self.name().to_owned(), "not an object codec".into())
        })
    }

    /// A union of `variants`, selecting the first (in order) that strictly accepts a value.
    pub fn union(variants: Vec<Codec>) -> Codec {
        Self::new(UnionSchema::new(variants))
    }

    /// A fixed-length heterogeneous sequence, written position by position.
    pub fn tuple(items: Vec<Codec>) -> Codec {
        Self::new(TupleSchema::new(items))
    }

    /// A self-describing number restricted to `range`.
    pub fn number_in(range: RangeCfg<f64>) -> Codec {
        Self::new(NumberSchema::new(range))
    }

    /// A codec accepting exactly one of `values`, encoded as its position.
    pub fn enumeration(values: Vec<Value>) -> Codec {
        Self::new(EnumerationSchema::new(values))
    }

    /// A zero-width codec that always decodes to `value`.
    pub fn constant(value: impl Into<Value>) -> Codec {
        Self::new(ConstantSchema::new(value.into(), None))
    }

    /// A zero-width constant codec with an explicit name.
    pub fn named_constant(value: impl Into<Value>, name: impl Into<String>) -> Codec {
        Self::new(ConstantSchema::new(value.into(), Some(name.into())))
    }

    /// A placeholder for a codec that is not built yet, enabling recursive schemas.
    ///
    /// Every use before [Codec::finish] is a structural fault.
    pub fn deferred(name: impl Into<String>) -> Codec {
        Self::new(DeferredSchema::new(name.into()))
    }

    /// Completes a [Codec::deferred] placeholder with `target`.
    pub fn finish(&self, target: &Codec) -> Result<(), Error> {
        let deferred = self.downcast::<DeferredSchema>().ok_or_else(|| {
            Error::InvalidData(self.name().to_owned(), "not a deferred codec".into())
        })?;
        deferred.finish(target.clone())
    }

    /// Returns the codec the self-describing codec would select for `value`.
    pub fn infer(value: &Value) -> Codec {
        crate::types::any::codec_for(value).clone()
    }
}

impl PartialEq for Codec {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Codec {}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Codec({}, {})", self.id(), self.name())
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Wraps a child codec's name in parentheses when it contains spaces.
pub(crate) fn group(name: &str) -> String {
    if name.contains(' ') {
        format!("({name})")
    } else {
        name.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_rejects_invalid() {
        let b = builtins();
        let err = b.u8.encode(&Value::from(300)).unwrap_err();
        assert!(!err.is_structural());
        assert_eq!(
            err.problem().unwrap().message(),
            "Expected a number between 0 and 255"
        );
        assert!(b.u8.encode_size(&Value::from("x")).is_err());
    }

    #[test]
    fn test_write_does_not_advance_on_invalid() {
        let b = builtins();
        let mut cursor = Cursor::alloc(4);
        assert!(b.u32.write(&mut cursor, &Value::from(-1)).is_err());
        assert_eq!(cursor.offset(), 0);
        b.u32.write(&mut cursor, &Value::from(7)).unwrap();
        assert!(cursor.is_done());
    }

    #[test]
    fn test_decode_extra_data() {
        let b = builtins();
        assert!(matches!(b.u8.decode(&[1, 2]), Err(Error::ExtraData(1))));
        assert!(matches!(b.u16.decode(&[1]), Err(Error::EndOfBuffer)));
    }

    #[test]
    fn test_sanitize_falls_back_to_sample() {
        let b = builtins();
        let codec = Codec::union(vec![b.u8.clone(), b.bool.clone()]);
        assert_eq!(codec.sanitize(&Value::from("nope")), Value::from(0));
        assert_eq!(codec.sanitize(&Value::from(true)), Value::from(true));
    }

    #[test]
    fn test_configured_copies() {
        let b = builtins();
        let list = b.u16.array();
        assert_eq!(list.name(), "u16[]");
        assert_eq!(list.sized(3).name(), "u16[3]");
        assert_eq!(b.array.of(&b.u8).name(), "u8[]");
        assert_eq!(b.array.sized(2).name(), "any[2]");
        assert_eq!(b.string8.with_prefix(LengthPrefix::U16), b.string16);
        assert_eq!(b.u8.sized(3), b.u8);
        let short = list.with_prefix(LengthPrefix::U8);
        assert_eq!(short.encode_size(&Value::Array(vec![1.into()])).unwrap(), 3);
    }

    #[test]
    fn test_object_extensions_require_object() {
        let b = builtins();
        assert!(matches!(b.u8.exclude(&["a"]), Err(Error::InvalidData(_, _))));
        assert!(b.u8.fields().is_none());
    }
}
