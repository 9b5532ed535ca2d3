//! Structured validation failures.
//!
//! A [Problem] records what was wrong with a value, which codec noticed, and where inside the
//! value it happened. Container codecs that delegate to a child codec [Problem::shift] the child's
//! problem, prepending their own access [Step] so the final path reads from the root down.

use std::fmt;

/// A single access step into a value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// A named field of an object.
    Field(String),
    /// A position in an array, set, or tuple.
    Index(usize),
    /// A key of a key-value container (rendered for display).
    Key(String),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Field(name) => write!(f, "[keyed:{name:?}]"),
            Step::Index(index) => write!(f, "[indexed:{index}]"),
            Step::Key(key) => write!(f, "[key:{key}]"),
        }
    }
}

/// A validation failure with a composable path.
#[derive(Clone, Debug, PartialEq)]
pub struct Problem {
    message: String,
    codec: String,
    origin: String,
    path: Vec<Step>,
}

impl Problem {
    /// Creates a problem raised (and originated) by the codec named `codec`.
    pub fn new(codec: impl Into<String>, message: impl Into<String>) -> Self {
        let codec = codec.into();
        Self {
            message: message.into(),
            origin: codec.clone(),
            codec,
            path: Vec::new(),
        }
    }

    /// Prepends `step` to the path and records `origin` as the codec the validation started from.
    pub fn shift(mut self, step: Step, origin: impl Into<String>) -> Self {
        self.path.insert(0, step);
        self.origin = origin.into();
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Name of the codec that raised the problem.
    pub fn codec(&self) -> &str {
        &self.codec
    }

    /// Name of the outermost codec the problem was shifted through.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn path(&self) -> &[Step] {
        &self.path
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.origin)?;
        for step in &self.path {
            write!(f, "{step}")?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for Problem {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_prepends() {
        let problem = Problem::new("u8", "Expected an integer")
            .shift(Step::Index(2), "u8[]")
            .shift(Step::Field("scores".into()), "{ scores: u8[] }");
        assert_eq!(
            problem.path(),
            &[Step::Field("scores".into()), Step::Index(2)]
        );
        assert_eq!(problem.codec(), "u8");
        assert_eq!(problem.origin(), "{ scores: u8[] }");
    }

    #[test]
    fn test_display() {
        let problem = Problem::new("string8", "Unexpected null byte")
            .shift(Step::Key("\"a\"".into()), "Map<string8, string8>");
        assert_eq!(
            problem.to_string(),
            "Map<string8, string8>[key:\"a\"]: Unexpected null byte"
        );
        let problem = Problem::new("bool", "Expected a boolean").shift(Step::Field("on".into()), "obj");
        assert_eq!(problem.to_string(), "obj[keyed:\"on\"]: Expected a boolean");
    }
}
