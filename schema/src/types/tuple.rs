//! Heterogeneous fixed-arity sequences.

use crate::{problem::Step, types::ABSENT, Codec, Cursor, Error, Problem, Schema, Value};
use std::any::Any;

/// One codec per position; no length is written.
#[derive(Clone)]
pub struct TupleSchema {
    items: Vec<Codec>,
}

impl TupleSchema {
    pub fn new(items: Vec<Codec>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[Codec] {
        &self.items
    }
}

impl Schema for TupleSchema {
    fn name(&self) -> String {
        let names: Vec<&str> = self.items.iter().map(Codec::name).collect();
        format!("[ {} ]", names.join(", "))
    }

    fn encode_size(&self, value: &Value) -> usize {
        let values = value.elements().unwrap_or_default();
        self.items
            .iter()
            .enumerate()
            .map(|(i, codec)| codec.encode_size_unchecked(values.get(i).unwrap_or(&ABSENT)))
            .sum()
    }

    fn write(&self, cursor: &mut Cursor, value: &Value) -> Result<(), Error> {
        let values = value.elements().unwrap_or_default();
        for (i, codec) in self.items.iter().enumerate() {
            codec.write_unchecked(cursor, values.get(i).unwrap_or(&ABSENT))?;
        }
        Ok(())
    }

    fn read(&self, cursor: &mut Cursor) -> Result<Value, Error> {
        let items = self
            .items
            .iter()
            .map(|codec| codec.read(cursor))
            .collect::<Result<_, _>>()?;
        Ok(Value::Array(items))
    }

    fn read_into(&self, cursor: &mut Cursor, target: &mut Value) -> Result<(), Error> {
        let Value::Array(values) = target else {
            return Err(Error::TargetMismatch(
                self.name(),
                format!("expected Array, found {}", target.kind()),
            ));
        };
        if values.len() != self.items.len() {
            return Err(Error::TargetMismatch(
                self.name(),
                format!(
                    "expected length {}, found {}",
                    self.items.len(),
                    values.len()
                ),
            ));
        }
        for (codec, slot) in self.items.iter().zip(values.iter_mut()) {
            codec.read_into(cursor, slot)?;
        }
        Ok(())
    }

    fn validate(&self, value: &Value, strict: bool) -> Result<(), Problem> {
        let Some(values) = value.elements() else {
            return Err(Problem::new(self.name(), "Expected an iterable"));
        };
        if strict && !matches!(value, Value::Array(_)) {
            return Err(Problem::new(
                self.name(),
                format!("Expected an array, got {}", value.kind()),
            ));
        }
        for (i, codec) in self.items.iter().enumerate() {
            codec
                .check(values.get(i).unwrap_or(&ABSENT), strict)
                .map_err(|problem| problem.shift(Step::Index(i), self.name()))?;
        }
        Ok(())
    }

    fn sample(&self) -> Value {
        Value::Array(self.items.iter().map(Codec::sample).collect())
    }

    fn sanitize(&self, value: &Value) -> Value {
        let values = value.elements().unwrap_or_default();
        Value::Array(
            self.items
                .iter()
                .enumerate()
                .map(|(i, codec)| match values.get(i) {
                    Some(value) => codec.sanitize(value),
                    None => codec.sample(),
                })
                .collect(),
        )
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
