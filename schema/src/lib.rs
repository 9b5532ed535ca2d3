//! Describe binary layouts with composable codecs.
//!
//! # Overview
//!
//! A codec is a schema object that knows how to size, write, read, validate, sample, and sanitize
//! one shape of [Value]. Codecs compose: arrays of objects of unions of strings, and so on. Every
//! codec is registered in a process-wide [Registry] under a unique id, which lets the
//! self-describing `any` codec tag a value with the codec that wrote it.
//!
//! Encoding validates first and never writes a partial value on invalid input; validation
//! failures are reported as a [Problem] with the path to the offending field. Anything else that
//! goes wrong (truncated input, an unknown codec id, decoding into a value of the wrong shape) is a
//! structural [Error].
//!
//! # Wire Format
//!
//! - Fixed-width integers and floats are little-endian.
//! - Strings, arrays, sets, and maps carry a length prefix (`u32` unless configured otherwise),
//!   except arrays with a fixed length.
//! - Object fields are written in name order with no markers.
//! - Unions write the position of the selected candidate using 1, 2, or 4 bytes depending on the
//!   number of candidates.
//! - Arbitrary-precision integers write a `u16` byte count followed by the big-endian magnitude.
//!
//! # Example
//!
//! ```
//! use commonware_schema::{builtins, Codec, ObjectBuilder, Value};
//!
//! let b = builtins();
//! let codec = ObjectBuilder::new()
//!     .field("id", &b.u32)
//!     .field("tag", &Codec::union(vec![b.u8.clone(), b.string8.clone()]))
//!     .build();
//!
//! let value = Value::object([("id", Value::from(7)), ("tag", Value::from("hi"))]);
//! let encoded = codec.encode(&value).unwrap();
//! assert_eq!(encoded.as_ref(), &[7, 0, 0, 0, 1, 2, b'h', b'i']);
//! assert_eq!(codec.decode(&encoded).unwrap(), value);
//! ```

mod builtins;
pub mod codec;
pub mod config;
pub mod cursor;
pub mod error;
pub mod problem;
pub mod registry;
pub mod structure;
pub mod types;
pub mod value;

pub use builtins::{builtins, Builtins};
pub use codec::{Codec, Id, Schema};
pub use config::{LengthPrefix, RangeCfg};
pub use cursor::Cursor;
pub use error::Error;
pub use problem::{Problem, Step};
pub use registry::Registry;
pub use structure::{schema_of, Describe, Field, StructBuilder, StructSchema};
pub use types::object::ObjectBuilder;
pub use value::{Element, TypedArray, Value};
