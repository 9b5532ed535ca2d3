//! Schemas derived from a type's declared fields.
//!
//! A [StructSchema] is a name-sorted list of fields, each either a codec or a nested schema, and
//! the object codec built from them. Types opt in through [Describe]; [schema_of] builds each
//! type's schema once and caches it by [TypeId].

use crate::{Codec, Cursor, Error, ObjectBuilder, Problem, Value};
use bytes::Bytes;
use std::{
    any::TypeId,
    collections::{BTreeMap, HashMap},
    sync::{Arc, OnceLock, RwLock},
};

/// A single declared field.
#[derive(Clone)]
pub enum Field {
    Codec(Codec),
    /// A substructure with its own schema.
    Nested(Arc<StructSchema>),
}

impl Field {
    /// The codec the field is written with.
    pub fn codec(&self) -> &Codec {
        match self {
            Field::Codec(codec) => codec,
            Field::Nested(schema) => schema.codec(),
        }
    }
}

/// Name-sorted fields of a type and the object codec reading and writing them.
pub struct StructSchema {
    name: String,
    fields: Vec<(String, Field)>,
    codec: Codec,
}

impl StructSchema {
    pub fn builder(name: impl Into<String>) -> StructBuilder {
        StructBuilder {
            name: name.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields sorted by name.
    pub fn fields(&self) -> &[(String, Field)] {
        &self.fields
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Exact encoded size of `value`.
    pub fn size(&self, value: &Value) -> Result<usize, Error> {
        self.codec.encode_size(value)
    }

    pub fn validate(&self, value: &Value) -> Result<(), Problem> {
        self.codec.validate(value)
    }

    pub fn save(&self, value: &Value) -> Result<Bytes, Error> {
        self.codec.encode(value)
    }

    /// Validates and writes `value` at the cursor's position.
    pub fn save_into(&self, cursor: &mut Cursor, value: &Value) -> Result<(), Error> {
        self.codec.write(cursor, value)
    }

    pub fn load(&self, buf: &[u8]) -> Result<Value, Error> {
        self.codec.decode(buf)
    }

    /// Overwrites the declared fields of `target`, leaving any others untouched.
    pub fn load_into(&self, buf: &[u8], target: &mut Value) -> Result<(), Error> {
        self.codec.decode_into(buf, target)
    }
}

/// Collects the fields of a [StructSchema].
pub struct StructBuilder {
    name: String,
    fields: BTreeMap<String, Field>,
}

impl StructBuilder {
    pub fn field(mut self, name: impl Into<String>, codec: &Codec) -> Self {
        self.fields.insert(name.into(), Field::Codec(codec.clone()));
        self
    }

    pub fn nested(mut self, name: impl Into<String>, schema: Arc<StructSchema>) -> Self {
        self.fields.insert(name.into(), Field::Nested(schema));
        self
    }

    pub fn build(self) -> StructSchema {
        let codec = self
            .fields
            .iter()
            .fold(ObjectBuilder::new().named(&self.name), |builder, (name, field)| {
                builder.field(name, field.codec())
            })
            .build();
        StructSchema {
            name: self.name,
            fields: self.fields.into_iter().collect(),
            codec,
        }
    }
}

/// Types with a declared field schema.
///
/// # Example
///
/// ```
/// use commonware_schema::{builtins, schema_of, Describe, StructSchema, Value};
///
/// struct Point;
///
/// impl Describe for Point {
///     fn describe() -> StructSchema {
///         let b = builtins();
///         StructSchema::builder("Point").field("y", &b.i16).field("x", &b.i16).build()
///     }
/// }
///
/// let schema = schema_of::<Point>();
/// let bytes = schema
///     .save(&Value::object([("x", Value::from(1)), ("y", Value::from(-1))]))
///     .unwrap();
/// assert_eq!(bytes.as_ref(), &[1, 0, 0xFF, 0xFF]);
/// ```
pub trait Describe: 'static {
    fn describe() -> StructSchema;
}

/// Returns the schema of `T`, building it on first use.
///
/// Nested schemas may be requested from within [Describe::describe]; no lock is held while it
/// runs. If two threads race to build the same schema, the first one stored wins.
pub fn schema_of<T: Describe>() -> Arc<StructSchema> {
    static CACHE: OnceLock<RwLock<HashMap<TypeId, Arc<StructSchema>>>> = OnceLock::new();
    let cache = CACHE.get_or_init(Default::default);
    let key = TypeId::of::<T>();
    if let Some(schema) = cache
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .get(&key)
    {
        return schema.clone();
    }
    let schema = Arc::new(T::describe());
    cache
        .write()
        .unwrap_or_else(|e| e.into_inner())
        .entry(key)
        .or_insert(schema)
        .clone()
}
