//! Codecs that adapt other codecs or write nothing at all.

use crate::{codec::group, Codec, Cursor, Error, Problem, Schema, Value};
use std::{
    any::Any,
    sync::{Arc, OnceLock},
};

/// A conversion between two value representations.
pub type Mapper = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// A zero-width codec that always decodes to one literal value.
///
/// Only a strict validation checks the value; non-strict validation accepts anything.
#[derive(Clone, Debug)]
pub struct ConstantSchema {
    value: Value,
    label: Option<String>,
}

impl ConstantSchema {
    pub fn new(value: Value, label: Option<String>) -> Self {
        Self { value, label }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl Schema for ConstantSchema {
    fn name(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => self.value.to_string(),
        }
    }

    fn is_optional(&self) -> bool {
        true
    }

    fn encode_size(&self, _: &Value) -> usize {
        0
    }

    fn write(&self, _: &mut Cursor, _: &Value) -> Result<(), Error> {
        Ok(())
    }

    fn read(&self, _: &mut Cursor) -> Result<Value, Error> {
        Ok(self.value.clone())
    }

    fn validate(&self, value: &Value, strict: bool) -> Result<(), Problem> {
        if strict && !self.value.same(value) {
            return Err(Problem::new(
                self.name(),
                format!("Expected the constant value {}", self.value),
            ));
        }
        Ok(())
    }

    fn sample(&self) -> Value {
        self.value.clone()
    }

    fn sanitize(&self, _: &Value) -> Value {
        self.value.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A zero-width codec excluded from validation that always decodes to [Value::Absent].
#[derive(Clone, Debug, Default)]
pub struct IgnoreSchema;

impl Schema for IgnoreSchema {
    fn name(&self) -> String {
        "Ignore".into()
    }

    fn is_optional(&self) -> bool {
        true
    }

    fn encode_size(&self, _: &Value) -> usize {
        0
    }

    fn write(&self, _: &mut Cursor, _: &Value) -> Result<(), Error> {
        Ok(())
    }

    fn read(&self, _: &mut Cursor) -> Result<Value, Error> {
        Ok(Value::Absent)
    }

    fn validate(&self, _: &Value, _: bool) -> Result<(), Problem> {
        Ok(())
    }

    fn sample(&self) -> Value {
        Value::Absent
    }

    fn sanitize(&self, _: &Value) -> Value {
        Value::Absent
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Writes `fallback` in place of an absent value. The full width of the base codec is always
/// written.
pub struct DefaultSchema {
    base: Codec,
    fallback: Value,
    fallback_size: OnceLock<usize>,
}

impl DefaultSchema {
    pub fn new(base: Codec, fallback: Value) -> Self {
        Self {
            base,
            fallback,
            fallback_size: OnceLock::new(),
        }
    }

    pub fn base(&self) -> &Codec {
        &self.base
    }
}

impl Schema for DefaultSchema {
    fn name(&self) -> String {
        format!("{}({})", group(self.base.name()), self.fallback)
    }

    fn is_optional(&self) -> bool {
        true
    }

    fn encode_size(&self, value: &Value) -> usize {
        if value.is_absent() {
            return *self
                .fallback_size
                .get_or_init(|| self.base.encode_size_unchecked(&self.fallback));
        }
        self.base.encode_size_unchecked(value)
    }

    fn write(&self, cursor: &mut Cursor, value: &Value) -> Result<(), Error> {
        if value.is_absent() {
            return self.base.write_unchecked(cursor, &self.fallback);
        }
        self.base.write_unchecked(cursor, value)
    }

    fn read(&self, cursor: &mut Cursor) -> Result<Value, Error> {
        self.base.read(cursor)
    }

    fn read_into(&self, cursor: &mut Cursor, target: &mut Value) -> Result<(), Error> {
        self.base.read_into(cursor, target)
    }

    fn validate(&self, value: &Value, strict: bool) -> Result<(), Problem> {
        if value.is_absent() {
            // The fallback is written in its place.
            return self.base.check(&self.fallback, strict);
        }
        self.base.check(value, strict)
    }

    fn sample(&self) -> Value {
        self.fallback.clone()
    }

    fn sanitize(&self, value: &Value) -> Value {
        if value.is_absent() {
            return Value::Absent;
        }
        self.base.sanitize(value)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Reuses a base codec's wire format for another value representation.
pub struct TransformSchema {
    base: Codec,
    outward: Mapper,
    inward: Mapper,
    prefilter: Option<Mapper>,
    sample: OnceLock<Value>,
}

impl TransformSchema {
    pub fn new(base: Codec, outward: Mapper, inward: Mapper, prefilter: Option<Mapper>) -> Self {
        Self {
            base,
            outward,
            inward,
            prefilter,
            sample: OnceLock::new(),
        }
    }

    fn prefiltered(&self, value: &Value) -> Value {
        let value = match &self.prefilter {
            Some(prefilter) => prefilter(value),
            None => value.clone(),
        };
        (self.outward)(&value)
    }
}

impl Schema for TransformSchema {
    fn name(&self) -> String {
        format!("Highway<{}>", self.base.name())
    }

    fn is_optional(&self) -> bool {
        self.base.is_optional()
    }

    fn encode_size(&self, value: &Value) -> usize {
        self.base.encode_size_unchecked(&self.prefiltered(value))
    }

    fn write(&self, cursor: &mut Cursor, value: &Value) -> Result<(), Error> {
        self.base.write_unchecked(cursor, &self.prefiltered(value))
    }

    fn read(&self, cursor: &mut Cursor) -> Result<Value, Error> {
        Ok((self.inward)(&self.base.read(cursor)?))
    }

    fn validate(&self, value: &Value, strict: bool) -> Result<(), Problem> {
        self.base.check(&self.prefiltered(value), strict)
    }

    fn sample(&self) -> Value {
        self.sample
            .get_or_init(|| (self.inward)(&self.base.sample()))
            .clone()
    }

    fn sanitize(&self, value: &Value) -> Value {
        (self.inward)(&self.base.sanitize(&self.prefiltered(value)))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A placeholder completed later with [Codec::finish], so a codec can refer to itself.
pub struct DeferredSchema {
    label: String,
    target: OnceLock<Codec>,
}

impl DeferredSchema {
    pub fn new(label: String) -> Self {
        Self {
            label,
            target: OnceLock::new(),
        }
    }

    pub(crate) fn finish(&self, target: Codec) -> Result<(), Error> {
        self.target
            .set(target)
            .map_err(|_| Error::InvalidData(self.label.clone(), "already finished".into()))
    }

    fn target(&self) -> Result<&Codec, Error> {
        self.target
            .get()
            .ok_or_else(|| Error::Unfinished(self.label.clone()))
    }
}

impl Schema for DeferredSchema {
    fn name(&self) -> String {
        self.label.clone()
    }

    fn is_optional(&self) -> bool {
        self.target.get().is_some_and(Codec::is_optional)
    }

    fn encode_size(&self, value: &Value) -> usize {
        self.target
            .get()
            .map_or(0, |target| target.encode_size_unchecked(value))
    }

    fn write(&self, cursor: &mut Cursor, value: &Value) -> Result<(), Error> {
        self.target()?.write_unchecked(cursor, value)
    }

    fn read(&self, cursor: &mut Cursor) -> Result<Value, Error> {
        self.target()?.read(cursor)
    }

    fn read_into(&self, cursor: &mut Cursor, target: &mut Value) -> Result<(), Error> {
        self.target()?.read_into(cursor, target)
    }

    fn validate(&self, value: &Value, strict: bool) -> Result<(), Problem> {
        match self.target.get() {
            Some(target) => target.check(value, strict),
            None => Err(Problem::new(self.name(), "Schema is not finished")),
        }
    }

    fn sample(&self) -> Value {
        self.target.get().map_or(Value::Absent, Codec::sample)
    }

    fn sanitize(&self, value: &Value) -> Value {
        self.target
            .get()
            .map_or(Value::Absent, |target| target.sanitize(value))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
