//! Codec implementations, one module per codec family.

pub mod adapters;
pub mod any;
pub mod bigint;
pub mod map;
pub mod object;
pub mod primitives;
pub mod string;
pub mod tuple;
pub mod union;
pub mod vec;

use crate::Value;

/// Stand-in for a missing field or position.
pub(crate) static ABSENT: Value = Value::Absent;
