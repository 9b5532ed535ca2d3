//! String codecs.

use crate::{problem::Step, Cursor, Error, LengthPrefix, Problem, Schema, Value};
use std::any::Any;

fn expect_string<'a>(name: &str, value: &'a Value) -> Result<&'a str, Problem> {
    value
        .as_str()
        .ok_or_else(|| Problem::new(name, "Expected a string"))
}

/// Renders scalar input as a string; containers and markers become the empty string.
fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(_) | Value::BigInt(_) | Value::Bool(_) => value.to_string(),
        _ => String::new(),
    }
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a character.
fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// A UTF-8 string preceded by its byte length.
#[derive(Clone, Debug)]
pub struct PrefixedStringSchema {
    prefix: LengthPrefix,
}

impl PrefixedStringSchema {
    pub fn new(prefix: LengthPrefix) -> Self {
        Self { prefix }
    }

    pub fn prefix(&self) -> LengthPrefix {
        self.prefix
    }
}

impl Schema for PrefixedStringSchema {
    fn name(&self) -> String {
        format!("string{}", self.prefix.width() * 8)
    }

    fn encode_size(&self, value: &Value) -> usize {
        self.prefix.width() + value.as_str().map_or(0, str::len)
    }

    fn write(&self, cursor: &mut Cursor, value: &Value) -> Result<(), Error> {
        let s = value.as_str().unwrap_or_default();
        self.prefix.write(cursor, s.len())?;
        cursor.put_slice(s.as_bytes())
    }

    fn read(&self, cursor: &mut Cursor) -> Result<Value, Error> {
        let len = self.prefix.read(cursor)?;
        Ok(Value::String(cursor.get_str(len)?))
    }

    fn validate(&self, value: &Value, _: bool) -> Result<(), Problem> {
        let s = expect_string(&self.name(), value)?;
        if s.len() > self.prefix.max() {
            return Err(Problem::new(
                self.name(),
                format!("Expected string length to be a {}", self.prefix.name()),
            ));
        }
        Ok(())
    }

    fn sample(&self) -> Value {
        Value::String(String::new())
    }

    fn sanitize(&self, value: &Value) -> Value {
        let s = coerce_string(value);
        Value::String(truncate(&s, self.prefix.max()).to_owned())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A UTF-8 string followed by a zero byte.
#[derive(Clone, Debug, Default)]
pub struct CStringSchema;

impl Schema for CStringSchema {
    fn name(&self) -> String {
        "cstring".into()
    }

    fn encode_size(&self, value: &Value) -> usize {
        value.as_str().map_or(0, str::len) + 1
    }

    fn write(&self, cursor: &mut Cursor, value: &Value) -> Result<(), Error> {
        cursor.put_slice(value.as_str().unwrap_or_default().as_bytes())?;
        cursor.put_u8(0)
    }

    fn read(&self, cursor: &mut Cursor) -> Result<Value, Error> {
        let bytes = cursor.get_terminated()?;
        let s = std::str::from_utf8(bytes).map_err(|_| Error::InvalidUtf8)?;
        Ok(Value::String(s.to_owned()))
    }

    fn validate(&self, value: &Value, _: bool) -> Result<(), Problem> {
        let s = expect_string(&self.name(), value)?;
        if let Some(index) = s.bytes().position(|b| b == 0) {
            return Err(Problem::new(self.name(), "Unexpected null byte")
                .shift(Step::Index(index), self.name()));
        }
        Ok(())
    }

    fn sample(&self) -> Value {
        Value::String(String::new())
    }

    fn sanitize(&self, value: &Value) -> Value {
        Value::String(coerce_string(value).replace('\0', ""))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins;

    #[test]
    fn test_prefixed() {
        let b = builtins();
        let value = Value::from("hello!");
        for (codec, width) in [(&b.string8, 1), (&b.string16, 2), (&b.string32, 4)] {
            let encoded = codec.encode(&value).unwrap();
            assert_eq!(encoded.len(), width + 6);
            assert_eq!(encoded[0], 6);
            assert_eq!(&encoded[width..], b"hello!");
            assert_eq!(codec.decode(&encoded).unwrap(), value);
        }
        assert_eq!(b.string8.name(), "string8");
        assert_eq!(b.string32.name(), "string32");
    }

    #[test]
    fn test_prefixed_too_long() {
        let b = builtins();
        let long = Value::from("x".repeat(256));
        let problem = b.string8.validate(&long).unwrap_err();
        assert_eq!(problem.message(), "Expected string length to be a u8");
        assert!(b.string16.validate(&long).is_ok());
        assert_eq!(b.string8.sanitize(&long), Value::from("x".repeat(255)));
    }

    #[test]
    fn test_truncate_respects_chars() {
        let b = builtins();
        let value = Value::from(format!("{}é", "a".repeat(254)));
        assert_eq!(b.string8.sanitize(&value), Value::from("a".repeat(254)));
    }

    #[test]
    fn test_multibyte_length() {
        let b = builtins();
        let encoded = b.string8.encode(&Value::from("é")).unwrap();
        assert_eq!(encoded.as_ref(), &[2, 0xC3, 0xA9]);
    }

    #[test]
    fn test_cstring() {
        let b = builtins();
        let encoded = b.cstring.encode(&Value::from("hi")).unwrap();
        assert_eq!(encoded.as_ref(), b"hi\0");
        assert_eq!(b.cstring.decode(&encoded).unwrap(), Value::from("hi"));
        assert_eq!(b.cstring.decode(b"open").unwrap(), Value::from("open"));

        let problem = b.cstring.validate(&Value::from("a\0b")).unwrap_err();
        assert_eq!(problem.message(), "Unexpected null byte");
        assert_eq!(problem.path(), &[Step::Index(1)]);
        assert_eq!(b.cstring.sanitize(&Value::from("a\0b")), Value::from("ab"));
    }

    #[test]
    fn test_invalid_utf8() {
        let b = builtins();
        assert!(matches!(
            b.string8.decode(&[2, 0xFF, 0xFE]),
            Err(Error::InvalidUtf8)
        ));
        assert!(matches!(b.cstring.decode(&[0xFF, 0]), Err(Error::InvalidUtf8)));
    }

    #[test]
    fn test_string_sanitize() {
        let b = builtins();
        assert_eq!(b.string8.sanitize(&Value::from(12)), Value::from("12"));
        assert_eq!(b.string8.sanitize(&Value::Null), Value::from(""));
        assert!(b.string8.validate(&Value::from(12)).is_err());
    }
}
