//! Positional unions.
//!
//! A union of `n` candidates writes the position of the selected candidate with the narrowest
//! unsigned width that can index `n` entries (see [LengthPrefix::for_count]) followed by the
//! candidate's encoding. Positions, not registry ids, are written, so union encodings do not depend
//! on codec construction order.

use crate::{Codec, Cursor, Error, LengthPrefix, Problem, Schema, Value};
use std::any::Any;

/// Selects the first candidate (in order) that strictly accepts a value.
#[derive(Clone)]
pub struct UnionSchema {
    variants: Vec<Codec>,
    index: LengthPrefix,
}

impl UnionSchema {
    pub fn new(variants: Vec<Codec>) -> Self {
        let index = LengthPrefix::for_count(variants.len());
        Self { variants, index }
    }

    pub fn variants(&self) -> &[Codec] {
        &self.variants
    }

    /// Position of the first candidate that strictly accepts `value`.
    pub fn select(&self, value: &Value) -> Option<usize> {
        self.variants
            .iter()
            .position(|variant| variant.validate_strict(value).is_ok())
    }

    fn variant(&self, index: usize) -> Result<&Codec, Error> {
        self.variants
            .get(index)
            .ok_or_else(|| Error::InvalidIndex(self.name(), index))
    }
}

impl Schema for UnionSchema {
    fn name(&self) -> String {
        let names: Vec<&str> = self.variants.iter().map(Codec::name).collect();
        names.join(" | ")
    }

    fn is_optional(&self) -> bool {
        self.variants.iter().any(Codec::is_optional)
    }

    fn encode_size(&self, value: &Value) -> usize {
        let size = self
            .select(value)
            .map_or(0, |i| self.variants[i].encode_size_unchecked(value));
        self.index.width() + size
    }

    fn write(&self, cursor: &mut Cursor, value: &Value) -> Result<(), Error> {
        let index = self.select(value).ok_or_else(|| Error::NoVariant(self.name()))?;
        self.index.write(cursor, index)?;
        self.variants[index].write_unchecked(cursor, value)
    }

    fn read(&self, cursor: &mut Cursor) -> Result<Value, Error> {
        let index = self.index.read(cursor)?;
        self.variant(index)?.read(cursor)
    }

    fn read_into(&self, cursor: &mut Cursor, target: &mut Value) -> Result<(), Error> {
        let index = self.index.read(cursor)?;
        let variant = self.variant(index)?;
        if variant.validate_strict(target).is_ok() {
            return variant.read_into(cursor, target);
        }
        *target = variant.read(cursor)?;
        Ok(())
    }

    fn validate(&self, value: &Value, _: bool) -> Result<(), Problem> {
        match self.select(value) {
            Some(_) => Ok(()),
            None => Err(Problem::new(self.name(), "Unsupported type")),
        }
    }

    fn sample(&self) -> Value {
        self.variants
            .first()
            .map_or(Value::Absent, Codec::sample)
    }

    fn sanitize(&self, value: &Value) -> Value {
        if self.select(value).is_some() {
            return value.clone();
        }
        self.variants
            .iter()
            .map(|variant| variant.sanitize(value))
            .find(|candidate| self.select(candidate).is_some())
            .unwrap_or_else(|| self.sample())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A fixed list of literal values, written as the position of the value.
#[derive(Clone, Debug)]
pub struct EnumerationSchema {
    values: Vec<Value>,
    index: LengthPrefix,
}

impl EnumerationSchema {
    pub fn new(values: Vec<Value>) -> Self {
        let index = LengthPrefix::for_count(values.len());
        Self { values, index }
    }

    fn position(&self, value: &Value) -> Option<usize> {
        self.values.iter().position(|v| v.same(value))
    }
}

impl Schema for EnumerationSchema {
    fn name(&self) -> String {
        let names: Vec<String> = self.values.iter().map(Value::to_string).collect();
        names.join(" | ")
    }

    fn encode_size(&self, _: &Value) -> usize {
        self.index.width()
    }

    fn write(&self, cursor: &mut Cursor, value: &Value) -> Result<(), Error> {
        let index = self
            .position(value)
            .ok_or_else(|| Error::NoVariant(self.name()))?;
        self.index.write(cursor, index)
    }

    fn read(&self, cursor: &mut Cursor) -> Result<Value, Error> {
        let index = self.index.read(cursor)?;
        self.values
            .get(index)
            .cloned()
            .ok_or_else(|| Error::InvalidIndex(self.name(), index))
    }

    fn validate(&self, value: &Value, _: bool) -> Result<(), Problem> {
        match self.position(value) {
            Some(_) => Ok(()),
            None => Err(Problem::new(self.name(), "Unsupported value")),
        }
    }

    fn sample(&self) -> Value {
        self.values.first().cloned().unwrap_or_default()
    }

    fn sanitize(&self, value: &Value) -> Value {
        match self.position(value) {
            Some(_) => value.clone(),
            None => self.sample(),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
