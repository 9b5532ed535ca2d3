//! Key-value containers.
//!
//! Two value kinds share the same wire format (a length prefix followed by key-value pairs in
//! iteration order):
//!
//! * [Value::Map], with self-describing keys and values by default (the `map` codec).
//! * [Value::Object] treated as a record of string keys, with `string32` keys and self-describing
//!   values by default (the `object` codec).

use crate::{
    builtins, codec::group, problem::Step, value::insert_entry, Codec, Cursor, Error,
    LengthPrefix, Problem, Schema, Value,
};
use std::{any::Any, collections::BTreeMap};

/// A key-value container codec.
#[derive(Clone)]
pub struct MapSchema {
    key: Option<Codec>,
    value: Option<Codec>,
    prefix: LengthPrefix,
    record: bool,
}

impl MapSchema {
    /// A codec over [Value::Map].
    pub fn map() -> Self {
        Self {
            key: None,
            value: None,
            prefix: LengthPrefix::default(),
            record: false,
        }
    }

    /// A codec over [Value::Object] records.
    pub fn record() -> Self {
        Self {
            record: true,
            ..Self::map()
        }
    }

    pub(crate) fn with_key(&self, key: Option<Codec>) -> Self {
        Self {
            key,
            ..self.clone()
        }
    }

    pub(crate) fn with_value(&self, value: Option<Codec>) -> Self {
        Self {
            value,
            ..self.clone()
        }
    }

    pub(crate) fn with_prefix(&self, prefix: LengthPrefix) -> Self {
        Self {
            prefix,
            ..self.clone()
        }
    }

    fn key(&self) -> &Codec {
        match (&self.key, self.record) {
            (Some(codec), _) => codec,
            (None, true) => &builtins().string32,
            (None, false) => &builtins().any,
        }
    }

    fn value(&self) -> &Codec {
        match &self.value {
            Some(codec) => codec,
            None => &builtins().any,
        }
    }

    fn kind_name(&self) -> &'static str {
        if self.record {
            "object"
        } else {
            "Map"
        }
    }

    fn matches(&self, value: &Value) -> bool {
        matches!(
            (self.record, value),
            (false, Value::Map(_)) | (true, Value::Object(_))
        )
    }

    fn step(&self, key: &Value) -> Step {
        match (self.record, key) {
            (true, Value::String(name)) => Step::Field(name.clone()),
            _ => Step::Key(key.to_string()),
        }
    }

    /// Object keys are strings; other decoded keys are rendered.
    fn record_key(key: Value) -> String {
        match key {
            Value::String(name) => name,
            other => other.to_string(),
        }
    }

    fn read_pairs(
        &self,
        cursor: &mut Cursor,
        mut insert: impl FnMut(Value, Value),
    ) -> Result<(), Error> {
        let len = self.prefix.read(cursor)?;
        let (key, value) = (self.key(), self.value());
        for _ in 0..len {
            let k = key.read(cursor)?;
            let v = value.read(cursor)?;
            insert(k, v);
        }
        Ok(())
    }
}

impl Schema for MapSchema {
    fn name(&self) -> String {
        let default_key = if self.record { "string32" } else { "any" };
        let key = self.key.as_ref().map_or(default_key.into(), |c| group(c.name()));
        let value = self.value.as_ref().map_or("any".into(), |c| group(c.name()));
        match (self.record, &self.key, &self.value) {
            (true, None, None) => "Object".into(),
            (true, _, _) => format!("Object<{key}, {value}>"),
            (false, _, _) => format!("Map<{key}, {value}>"),
        }
    }

    fn encode_size(&self, value: &Value) -> usize {
        let entries = value.entries().unwrap_or_default();
        let (key, val) = (self.key(), self.value());
        self.prefix.width()
            + entries
                .iter()
                .map(|(k, v)| key.encode_size_unchecked(k) + val.encode_size_unchecked(v))
                .sum::<usize>()
    }

    fn write(&self, cursor: &mut Cursor, value: &Value) -> Result<(), Error> {
        let entries = value.entries().unwrap_or_default();
        let (key, val) = (self.key(), self.value());
        self.prefix.write(cursor, entries.len())?;
        for (k, v) in entries.iter() {
            key.write_unchecked(cursor, k)?;
            val.write_unchecked(cursor, v)?;
        }
        Ok(())
    }

    fn read(&self, cursor: &mut Cursor) -> Result<Value, Error> {
        if self.record {
            let mut fields = BTreeMap::new();
            self.read_pairs(cursor, |k, v| {
                fields.insert(Self::record_key(k), v);
            })?;
            return Ok(Value::Object(fields));
        }
        let mut entries = Vec::new();
        self.read_pairs(cursor, |k, v| insert_entry(&mut entries, k, v))?;
        Ok(Value::Map(entries))
    }

    fn read_into(&self, cursor: &mut Cursor, target: &mut Value) -> Result<(), Error> {
        match target {
            Value::Object(fields) if self.record => self.read_pairs(cursor, |k, v| {
                fields.insert(Self::record_key(k), v);
            }),
            Value::Map(entries) if !self.record => {
                self.read_pairs(cursor, |k, v| insert_entry(entries, k, v))
            }
            other => Err(Error::TargetMismatch(
                self.name(),
                format!("expected {}, found {}", self.kind_name(), other.kind()),
            )),
        }
    }

    fn validate(&self, value: &Value, strict: bool) -> Result<(), Problem> {
        let Some(entries) = value.entries() else {
            return Err(Problem::new(
                self.name(),
                format!("Expected {}", if self.record { "an object" } else { "a Map" }),
            ));
        };
        if strict && !self.matches(value) {
            return Err(Problem::new(
                self.name(),
                format!("Expected a {}, got {}", self.kind_name(), value.kind()),
            ));
        }
        if entries.len() > self.prefix.max() {
            return Err(Problem::new(
                self.name(),
                format!(
                    "Expected at most {} entries, got {}",
                    self.prefix.max(),
                    entries.len()
                ),
            ));
        }
        let (key, val) = (self.key(), self.value());
        for (k, v) in entries.iter() {
            key.check(k, strict)
                .and_then(|_| val.check(v, strict))
                .map_err(|problem| problem.shift(self.step(k), self.name()))?;
        }
        Ok(())
    }

    fn sample(&self) -> Value {
        if self.record {
            Value::Object(BTreeMap::new())
        } else {
            Value::Map(Vec::new())
        }
    }

    fn sanitize(&self, value: &Value) -> Value {
        let (key, val) = (self.key(), self.value());
        let entries = value.entries().unwrap_or_default();
        let entries = entries
            .iter()
            .take(self.prefix.max())
            .map(|(k, v)| (key.sanitize(k), val.sanitize(v)));
        if self.record {
            return Value::Object(entries.map(|(k, v)| (Self::record_key(k), v)).collect());
        }
        Value::map(entries)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_map() -> Value {
        Value::map([
            (Value::from("b"), Value::from(2)),
            (Value::from("a"), Value::from(1)),
        ])
    }

    #[test]
    fn test_map_roundtrip() {
        let b = builtins();
        let codec = b.map.with_key(&b.string8).with_value(&b.u8);
        assert_eq!(codec.name(), "Map<string8, u8>");
        let encoded = codec.encode(&sample_map()).unwrap();
        assert_eq!(
            encoded.as_ref(),
            &[2, 0, 0, 0, 1, b'b', 2, 1, b'a', 1]
        );
        assert_eq!(codec.decode(&encoded).unwrap(), sample_map());
    }

    #[test]
    fn test_untyped_map() {
        let b = builtins();
        let value = Value::map([
            (Value::from(1), Value::from("one")),
            (Value::Null, Value::from(true)),
        ]);
        let encoded = b.map.encode(&value).unwrap();
        assert_eq!(b.map.decode(&encoded).unwrap(), value);
        assert_eq!(b.map.name(), "Map<any, any>");
    }

    #[test]
    fn test_map_problem_path() {
        let b = builtins();
        let codec = b.map.with_key(&b.string8).with_value(&b.u8);
        let value = Value::map([(Value::from("a"), Value::from(-1))]);
        let problem = codec.validate(&value).unwrap_err();
        assert_eq!(problem.path(), &[Step::Key("\"a\"".into())]);
        assert_eq!(problem.codec(), "u8");
    }

    #[test]
    fn test_map_read_into_merges() {
        let b = builtins();
        let codec = b.map.with_key(&b.string8).with_value(&b.u8);
        let encoded = codec.encode(&sample_map()).unwrap();
        let mut target = Value::map([
            (Value::from("a"), Value::from(9)),
            (Value::from("z"), Value::from(26)),
        ]);
        codec.decode_into(&encoded, &mut target).unwrap();
        assert_eq!(
            target,
            Value::Map(vec![
                (Value::from("a"), Value::from(1)),
                (Value::from("z"), Value::from(26)),
                (Value::from("b"), Value::from(2)),
            ])
        );
        let mut wrong = Value::Array(vec![]);
        assert!(matches!(
            codec.decode_into(&encoded, &mut wrong),
            Err(Error::TargetMismatch(_, _))
        ));
    }

    #[test]
    fn test_map_sanitize_limits_entries() {
        let b = builtins();
        let codec = b
            .map
            .with_key(&b.u16)
            .with_value(&b.bool)
            .with_prefix(LengthPrefix::U8);
        let value = Value::map((0..300u16).map(|i| (Value::from(i), Value::from(true))));
        assert!(codec.validate(&value).is_err());
        let sanitized = codec.sanitize(&value);
        assert!(codec.validate(&sanitized).is_ok());
        match sanitized {
            Value::Map(entries) => assert_eq!(entries.len(), 255),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_record() {
        let b = builtins();
        let value = Value::object([("name", Value::from("ada")), ("age", Value::from(36))]);
        let encoded = b.object.encode(&value).unwrap();
        assert_eq!(b.object.decode(&encoded).unwrap(), value);
        assert_eq!(b.object.name(), "Object");

        let typed = b.object.with_value(&b.u8);
        assert_eq!(typed.name(), "Object<string32, u8>");
        let problem = typed.validate(&value).unwrap_err();
        assert_eq!(problem.path(), &[Step::Field("name".into())]);
        assert!(b.object.validate_strict(&sample_map()).is_err());
    }
}
