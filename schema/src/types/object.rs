//! Objects with a fixed set of named fields.
//!
//! Fields are kept sorted by name and written in that order with no field markers, so two object
//! codecs built from the same fields produce the same layout regardless of declaration order.

use crate::{
    problem::Step, types::ABSENT, Codec, Cursor, Error, Problem, Schema, Value,
};
use std::{any::Any, collections::BTreeMap, sync::Arc};

/// Builds the value returned by reading an object from its decoded fields.
pub type Constructor = Arc<dyn Fn(BTreeMap<String, Value>) -> Value + Send + Sync>;

/// An object codec with name-sorted fields.
#[derive(Clone)]
pub struct ObjectSchema {
    fields: Vec<(String, Codec)>,
    constructor: Option<Constructor>,
    label: Option<String>,
}

impl ObjectSchema {
    fn new(
        fields: BTreeMap<String, Codec>,
        constructor: Option<Constructor>,
        label: Option<String>,
    ) -> Self {
        Self {
            fields: fields.into_iter().collect(),
            constructor,
            label,
        }
    }

    /// Fields in wire order.
    pub fn fields(&self) -> &[(String, Codec)] {
        &self.fields
    }

    pub(crate) fn extended(&self, extra: impl IntoIterator<Item = (String, Codec)>) -> Self {
        let mut fields: BTreeMap<_, _> = self.fields.iter().cloned().collect();
        fields.extend(extra);
        Self::new(fields, self.constructor.clone(), self.label.clone())
    }

    pub(crate) fn excluding(&self, names: &[&str]) -> Self {
        let fields = self
            .fields
            .iter()
            .filter(|(name, _)| !names.contains(&name.as_str()))
            .cloned()
            .collect();
        Self::new(fields, self.constructor.clone(), self.label.clone())
    }

    pub(crate) fn with_constructor(&self, constructor: Constructor) -> Self {
        Self {
            constructor: Some(constructor),
            ..self.clone()
        }
    }

    fn construct(&self, fields: BTreeMap<String, Value>) -> Value {
        match &self.constructor {
            Some(constructor) => constructor(fields),
            None => Value::Object(fields),
        }
    }
}

impl Schema for ObjectSchema {
    fn name(&self) -> String {
        if let Some(label) = &self.label {
            return label.clone();
        }
        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|(name, codec)| {
                let optional = if codec.is_optional() { "?" } else { "" };
                format!("{name}{optional}: {}", codec.name())
            })
            .collect();
        format!("{{ {} }}", fields.join(", "))
    }

    fn encode_size(&self, value: &Value) -> usize {
        self.fields
            .iter()
            .map(|(name, codec)| codec.encode_size_unchecked(value.get(name).unwrap_or(&ABSENT)))
            .sum()
    }

    fn write(&self, cursor: &mut Cursor, value: &Value) -> Result<(), Error> {
        for (name, codec) in &self.fields {
            codec.write_unchecked(cursor, value.get(name).unwrap_or(&ABSENT))?;
        }
        Ok(())
    }

    fn read(&self, cursor: &mut Cursor) -> Result<Value, Error> {
        let mut fields = BTreeMap::new();
        for (name, codec) in &self.fields {
            let value = codec.read(cursor)?;
            if !value.is_absent() {
                fields.insert(name.clone(), value);
            }
        }
        Ok(self.construct(fields))
    }

    fn read_into(&self, cursor: &mut Cursor, target: &mut Value) -> Result<(), Error> {
        let Value::Object(existing) = target else {
            return Err(Error::TargetMismatch(
                self.name(),
                format!("expected object, found {}", target.kind()),
            ));
        };
        for (name, codec) in &self.fields {
            match existing.get_mut(name) {
                Some(slot) => codec.read_into(cursor, slot).map_err(|err| match err {
                    Error::TargetMismatch(_, reason) => Error::TargetMismatch(
                        self.name(),
                        format!("{}{reason}", Step::Field(name.clone())),
                    ),
                    err => err,
                })?,
                None => {
                    let value = codec.read(cursor)?;
                    if !value.is_absent() {
                        existing.insert(name.clone(), value);
                    }
                }
            }
        }
        Ok(())
    }

    fn validate(&self, value: &Value, strict: bool) -> Result<(), Problem> {
        if !matches!(value, Value::Object(_)) {
            return Err(Problem::new(self.name(), "Expected an object"));
        }
        for (name, codec) in &self.fields {
            codec
                .check(value.get(name).unwrap_or(&ABSENT), strict)
                .map_err(|problem| problem.shift(Step::Field(name.clone()), self.name()))?;
        }
        Ok(())
    }

    fn sample(&self) -> Value {
        let fields = self
            .fields
            .iter()
            .map(|(name, codec)| (name.clone(), codec.sample()))
            .filter(|(_, value)| !value.is_absent())
            .collect();
        self.construct(fields)
    }

    fn sanitize(&self, value: &Value) -> Value {
        let input = match value {
            Value::Object(_) => value,
            _ => &ABSENT,
        };
        let fields = self
            .fields
            .iter()
            .map(|(name, codec)| {
                let field = input.get(name).unwrap_or(&ABSENT);
                (name.clone(), codec.sanitize(field))
            })
            .filter(|(_, value)| !value.is_absent())
            .collect();
        self.construct(fields)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Collects named fields into an object codec.
///
/// # Example
///
/// ```
/// use commonware_schema::{builtins, ObjectBuilder, Value};
///
/// let b = builtins();
/// let player = ObjectBuilder::new()
///     .field("name", &b.string8)
///     .field("level", &b.u8.default(1))
///     .build();
/// let encoded = player.encode(&Value::object([("name", Value::from("ada"))])).unwrap();
/// assert_eq!(encoded.as_ref(), &[1, 3, b'a', b'd', b'a']);
/// ```
#[derive(Default)]
pub struct ObjectBuilder {
    fields: BTreeMap<String, Codec>,
    constructor: Option<Constructor>,
    label: Option<String>,
}

impl ObjectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field, replacing any earlier field with the same name.
    pub fn field(mut self, name: impl Into<String>, codec: &Codec) -> Self {
        self.fields.insert(name.into(), codec.clone());
        self
    }

    /// Names the codec instead of deriving the name from its fields.
    pub fn named(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn constructor(
        mut self,
        constructor: impl Fn(BTreeMap<String, Value>) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.constructor = Some(Arc::new(constructor));
        self
    }

    pub fn build(self) -> Codec {
        Codec::new(ObjectSchema::new(self.fields, self.constructor, self.label))
    }
}
