//! Error types for schema operations

use crate::Problem;
use thiserror::Error;

/// Error type for schema operations.
///
/// [Error::Invalid] is the only recoverable variant: it wraps the [Problem] found while
/// validating a value and is returned before anything is written. Every other variant is a
/// structural fault (a size/codec mismatch, corrupt input, or a schema used before it was
/// finished) and may leave the [crate::Cursor] partially advanced.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid value: {0}")]
    Invalid(#[from] Problem),
    #[error("unexpected end of buffer")]
    EndOfBuffer,
    #[error("write overflows buffer: {0} > {1}")]
    Overflow(usize, usize), // needed, remaining
    #[error("extra data found: {0} bytes")]
    ExtraData(usize),
    #[error("unknown codec id: {0}")]
    UnknownCodec(u32),
    #[error("invalid index in {0}: {1}")]
    InvalidIndex(String, usize), // codec, index
    #[error("no variant of {0} accepts the value")]
    NoVariant(String),
    #[error("cannot read {0} into target: {1}")]
    TargetMismatch(String, String), // codec, reason
    #[error("invalid utf-8 string")]
    InvalidUtf8,
    #[error("invalid data in {0}: {1}")]
    InvalidData(String, String), // codec, message
    #[error("input nested deeper than {0} levels")]
    DepthExceeded(usize),
    #[error("schema used before it was finished: {0}")]
    Unfinished(String),
}

impl Error {
    /// Returns true if this error is a structural fault rather than a validation failure.
    pub fn is_structural(&self) -> bool {
        !matches!(self, Error::Invalid(_))
    }

    /// Returns the validation [Problem], if this is a validation failure.
    pub fn problem(&self) -> Option<&Problem> {
        match self {
            Error::Invalid(problem) => Some(problem),
            _ => None,
        }
    }
}
