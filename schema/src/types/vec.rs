//! Homogeneous sequence codecs: arrays, sets, and typed numeric arrays.
//!
//! A sequence writes a length prefix (unless its length is fixed) followed by each element's
//! encoding. Sequences without an element codec use the self-describing `any` codec per element.

use crate::{
    builtins, codec::group, problem::Step, Codec, Cursor, Element, Error, LengthPrefix, Problem,
    Schema, TypedArray, Value,
};
use std::any::Any;

/// The value kind a sequence codec produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeqKind {
    Array,
    Set,
    Typed(Element),
}

impl SeqKind {
    fn base_name(self) -> &'static str {
        match self {
            SeqKind::Array => "Array",
            SeqKind::Set => "Set",
            SeqKind::Typed(element) => element.array_name(),
        }
    }

    /// Returns true if `value` is exactly this kind of sequence.
    fn matches(self, value: &Value) -> bool {
        match (self, value) {
            (SeqKind::Array, Value::Array(_)) | (SeqKind::Set, Value::Set(_)) => true,
            (SeqKind::Typed(element), Value::Typed(array)) => array.element() == element,
            _ => false,
        }
    }

    fn build(self, items: Vec<Value>) -> Value {
        match self {
            SeqKind::Array => Value::Array(items),
            SeqKind::Set => Value::set(items),
            SeqKind::Typed(element) => match TypedArray::from_values(element, &items) {
                Some(array) => Value::Typed(array),
                None => Value::Typed(TypedArray::empty(element)),
            },
        }
    }
}

/// An array, set, or typed array codec.
#[derive(Clone)]
pub struct ArraySchema {
    element: Option<Codec>,
    kind: SeqKind,
    fixed: Option<usize>,
    prefix: LengthPrefix,
}

impl ArraySchema {
    pub fn new(element: Option<Codec>, kind: SeqKind) -> Self {
        Self {
            element,
            kind,
            fixed: None,
            prefix: LengthPrefix::default(),
        }
    }

    /// A typed array of `element`s encoded with the fixed-width codec `codec`.
    pub fn typed(element: Element, codec: Codec) -> Self {
        Self::new(Some(codec), SeqKind::Typed(element))
    }

    pub fn kind(&self) -> SeqKind {
        self.kind
    }

    pub fn fixed(&self) -> Option<usize> {
        self.fixed
    }

    pub(crate) fn with_fixed(&self, fixed: Option<usize>) -> Self {
        Self {
            fixed,
            ..self.clone()
        }
    }

    pub(crate) fn with_prefix(&self, prefix: LengthPrefix) -> Self {
        Self {
            prefix,
            ..self.clone()
        }
    }

    /// Typed arrays keep their element codec.
    pub(crate) fn with_element(&self, element: Option<Codec>) -> Self {
        if matches!(self.kind, SeqKind::Typed(_)) {
            return self.clone();
        }
        Self {
            element,
            ..self.clone()
        }
    }

    fn element(&self) -> &Codec {
        match &self.element {
            Some(codec) => codec,
            None => &builtins().any,
        }
    }

    fn read_items(&self, cursor: &mut Cursor, len: usize) -> Result<Vec<Value>, Error> {
        let element = self.element();
        // The length is untrusted input
        let mut items = Vec::with_capacity(len.min(cursor.remaining()));
        for _ in 0..len {
            items.push(element.read(cursor)?);
        }
        Ok(items)
    }

    fn read_len(&self, cursor: &mut Cursor) -> Result<usize, Error> {
        match self.fixed {
            Some(len) => Ok(len),
            None => self.prefix.read(cursor),
        }
    }

    fn mismatch(&self, reason: String) -> Error {
        Error::TargetMismatch(self.name(), reason)
    }
}

impl Schema for ArraySchema {
    fn name(&self) -> String {
        let element = self.element.as_ref().map(|codec| group(codec.name()));
        match (self.kind, element, self.fixed) {
            (SeqKind::Typed(element), _, None) => element.array_name().into(),
            (SeqKind::Typed(element), _, Some(len)) => {
                format!("{}<length={len}>", element.array_name())
            }
            (SeqKind::Array, None, None) => "Array".into(),
            (SeqKind::Array, Some(element), None) => format!("{element}[]"),
            (SeqKind::Array, None, Some(len)) => format!("any[{len}]"),
            (SeqKind::Array, Some(element), Some(len)) => format!("{element}[{len}]"),
            (SeqKind::Set, None, None) => "Set".into(),
            (SeqKind::Set, Some(element), None) => format!("Set<type={element}>"),
            (SeqKind::Set, None, Some(len)) => format!("Set<length={len}>"),
            (SeqKind::Set, Some(element), Some(len)) => {
                format!("Set<type={element}, length={len}>")
            }
        }
    }

    fn encode_size(&self, value: &Value) -> usize {
        let element = self.element();
        let items = value.elements().unwrap_or_default();
        let prefix = match self.fixed {
            Some(_) => 0,
            None => self.prefix.width(),
        };
        prefix
            + items
                .iter()
                .map(|item| element.encode_size_unchecked(item))
                .sum::<usize>()
    }

    fn write(&self, cursor: &mut Cursor, value: &Value) -> Result<(), Error> {
        let element = self.element();
        let items = value.elements().unwrap_or_default();
        if self.fixed.is_none() {
            self.prefix.write(cursor, items.len())?;
        }
        for item in items.iter() {
            element.write_unchecked(cursor, item)?;
        }
        Ok(())
    }

    fn read(&self, cursor: &mut Cursor) -> Result<Value, Error> {
        let len = self.read_len(cursor)?;
        let items = self.read_items(cursor, len)?;
        Ok(self.kind.build(items))
    }

    fn read_into(&self, cursor: &mut Cursor, target: &mut Value) -> Result<(), Error> {
        if !self.kind.matches(target) {
            return Err(self.mismatch(format!(
                "expected {}, found {}",
                self.kind.base_name(),
                target.kind()
            )));
        }
        if let Some(fixed) = self.fixed {
            let len = target.elements().map_or(0, |items| items.len());
            if len != fixed {
                return Err(self.mismatch(format!("expected length {fixed}, found {len}")));
            }
        }
        let len = self.read_len(cursor)?;
        match target {
            Value::Array(items) => {
                let element = self.element();
                items.truncate(len);
                for (i, slot) in items.iter_mut().enumerate() {
                    element.read_into(cursor, slot).map_err(|err| match err {
                        Error::TargetMismatch(_, reason) => {
                            self.mismatch(format!("{}{reason}", Step::Index(i)))
                        }
                        err => err,
                    })?;
                }
                let existing = items.len();
                for _ in existing..len {
                    items.push(element.read(cursor)?);
                }
            }
            _ => *target = self.kind.build(self.read_items(cursor, len)?),
        }
        Ok(())
    }

    fn validate(&self, value: &Value, strict: bool) -> Result<(), Problem> {
        let Some(items) = value.elements() else {
            return Err(Problem::new(self.name(), "Expected an iterable"));
        };
        if strict && !self.kind.matches(value) {
            return Err(Problem::new(
                self.name(),
                format!("Expected an iterable of {}", self.kind.base_name()),
            ));
        }
        match self.fixed {
            Some(fixed) if fixed != items.len() => {
                return Err(Problem::new(
                    self.name(),
                    format!("Expected an iterable of length {fixed}, got {}", items.len()),
                ))
            }
            None if items.len() > self.prefix.max() => {
                return Err(Problem::new(
                    self.name(),
                    format!(
                        "Expected at most {} elements, got {}",
                        self.prefix.max(),
                        items.len()
                    ),
                ))
            }
            _ => {}
        }
        let element = self.element();
        for (i, item) in items.iter().enumerate() {
            element
                .check(item, strict)
                .map_err(|problem| problem.shift(Step::Index(i), self.name()))?;
        }
        Ok(())
    }

    fn sample(&self) -> Value {
        match (self.kind, self.fixed) {
            (SeqKind::Typed(element), Some(len)) => Value::Typed(TypedArray::zeroed(element, len)),
            (kind, Some(len)) => {
                let sample = self.element().sample();
                let items = vec![sample; len];
                match kind {
                    SeqKind::Set => Value::Set(items),
                    _ => Value::Array(items),
                }
            }
            (kind, None) => kind.build(Vec::new()),
        }
    }

    fn sanitize(&self, value: &Value) -> Value {
        let element = self.element();
        let mut items = value.elements().map(|items| items.into_owned()).unwrap_or_default();
        match self.fixed {
            Some(len) => items.resize_with(len, || element.sample()),
            None => items.truncate(self.prefix.max()),
        }
        let items = items.iter().map(|item| element.sanitize(item)).collect();
        self.kind.build(items)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ObjectBuilder;

    fn numbers(values: &[f64]) -> Value {
        Value::Array(values.iter().map(|&v| Value::from(v)).collect())
    }

    #[test]
    fn test_fixed_f32() {
        let codec = builtins().f32.array().sized(3);
        let value = numbers(&[1.0, 2.0, 3.0]);
        let encoded = codec.encode(&value).unwrap();
        assert_eq!(encoded.len(), 12);
        assert_eq!(&encoded[..4], &1.0f32.to_le_bytes());
        assert_eq!(codec.decode(&encoded).unwrap(), value);
    }

    #[test]
    fn test_variable_prefix() {
        let b = builtins();
        let codec = b.u8.array();
        let encoded = codec.encode(&numbers(&[1.0, 2.0])).unwrap();
        assert_eq!(encoded.as_ref(), &[2, 0, 0, 0, 1, 2]);
        let codec = codec.with_prefix(LengthPrefix::U8);
        let encoded = codec.encode(&numbers(&[1.0, 2.0])).unwrap();
        assert_eq!(encoded.as_ref(), &[2, 1, 2]);
        let too_long = Value::Array(vec![Value::from(0); 256]);
        assert!(codec.validate(&too_long).is_err());
    }

    #[test]
    fn test_element_problem_path() {
        let codec = builtins().u8.array();
        let problem = codec.validate(&numbers(&[1.0, 300.0])).unwrap_err();
        assert_eq!(problem.path(), &[Step::Index(1)]);
        assert_eq!(problem.codec(), "u8");
        assert_eq!(problem.origin(), "u8[]");
    }

    #[test]
    fn test_fixed_length_problem() {
        let codec = builtins().u8.array().sized(2);
        let problem = codec.validate(&numbers(&[1.0])).unwrap_err();
        assert_eq!(problem.message(), "Expected an iterable of length 2, got 1");
        assert_eq!(codec.sanitize(&numbers(&[1.0])), numbers(&[1.0, 0.0]));
        assert_eq!(codec.sanitize(&numbers(&[1.0, 2.0, 3.0])), numbers(&[1.0, 2.0]));
        assert_eq!(codec.sample(), numbers(&[0.0, 0.0]));
    }

    #[test]
    fn test_strict_kind() {
        let b = builtins();
        let codec = b.u8.array();
        let set = Value::set([Value::from(1)]);
        assert!(codec.validate(&set).is_ok());
        assert!(codec.validate_strict(&set).is_err());
        assert!(b.u8.set().validate_strict(&set).is_ok());
    }

    #[test]
    fn test_untyped_uses_any() {
        let b = builtins();
        let value = Value::Array(vec![Value::from("a"), Value::from(1), Value::Null]);
        let encoded = b.array.encode(&value).unwrap();
        assert_eq!(b.array.decode(&encoded).unwrap(), value);
    }

    #[test]
    fn test_set() {
        let b = builtins();
        let codec = b.string8.set();
        assert_eq!(codec.name(), "Set<type=string8>");
        let value = Value::set([Value::from("a"), Value::from("b")]);
        let encoded = codec.encode(&value).unwrap();
        assert_eq!(codec.decode(&encoded).unwrap(), value);
        assert_eq!(codec.sample(), Value::Set(vec![]));
    }

    #[test]
    fn test_typed() {
        let b = builtins();
        let value = Value::Typed(TypedArray::U16(vec![1, 0x0203]));
        let encoded = b.u16array.encode(&value).unwrap();
        assert_eq!(encoded.as_ref(), &[2, 0, 0, 0, 1, 0, 3, 2]);
        assert_eq!(b.u16array.decode(&encoded).unwrap(), value);
        assert!(b.u16array.validate_strict(&numbers(&[1.0])).is_err());
        assert!(b.u16array.validate(&numbers(&[1.0])).is_ok());
        assert_eq!(b.u16array.sized(2).name(), "U16Array<length=2>");
        assert_eq!(
            b.u16array.sized(2).sample(),
            Value::Typed(TypedArray::U16(vec![0, 0]))
        );
    }

    #[test]
    fn test_read_into_in_place() {
        let b = builtins();
        let point = ObjectBuilder::new()
            .field("x", &b.u8)
            .field("y", &b.u8)
            .build();
        let codec = point.array();
        let value = Value::Array(vec![
            Value::object([("x", Value::from(1)), ("y", Value::from(2))]),
            Value::object([("x", Value::from(3)), ("y", Value::from(4))]),
        ]);
        let encoded = codec.encode(&value).unwrap();

        let mut target = Value::Array(vec![Value::object([
            ("x", Value::from(9)),
            ("y", Value::from(9)),
            ("label", Value::from("kept")),
        ])]);
        codec.decode_into(&encoded, &mut target).unwrap();
        let Value::Array(items) = &target else {
            panic!("unexpected {target:?}");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].get("x"), Some(&Value::from(1)));
        assert_eq!(items[0].get("label"), Some(&Value::from("kept")));
        assert_eq!(items[1], value.elements().unwrap()[1]);
    }

    #[test]
    fn test_read_into_mismatch() {
        let b = builtins();
        let codec = b.u8.array().sized(2);
        let encoded = codec.encode(&numbers(&[1.0, 2.0])).unwrap();
        let mut target = Value::Set(vec![]);
        assert!(matches!(
            codec.decode_into(&encoded, &mut target),
            Err(Error::TargetMismatch(_, _))
        ));
        let mut target = numbers(&[0.0]);
        assert!(matches!(
            codec.decode_into(&encoded, &mut target),
            Err(Error::TargetMismatch(_, _))
        ));
        let mut target = numbers(&[0.0, 0.0]);
        codec.decode_into(&encoded, &mut target).unwrap();
        assert_eq!(target, numbers(&[1.0, 2.0]));
    }

    #[test]
    fn test_huge_length_fails_cleanly() {
        let codec = builtins().u8.array();
        assert!(matches!(
            codec.decode(&[0xFF, 0xFF, 0xFF, 0xFF, 1]),
            Err(Error::EndOfBuffer)
        ));
    }
}
