//! Construction-time configuration for codecs.

use crate::{Cursor, Error};
use core::{
    fmt,
    ops::{Bound, RangeBounds},
};

/// Width of an unsigned length (or index) prefix.
///
/// Strings, arrays, sets, and key-value containers write their length with one of these; unions
/// write their variant index with the narrowest width that fits their variant count.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LengthPrefix {
    U8,
    U16,
    #[default]
    U32,
}

impl LengthPrefix {
    /// Number of bytes the prefix occupies.
    pub const fn width(self) -> usize {
        match self {
            LengthPrefix::U8 => 1,
            LengthPrefix::U16 => 2,
            LengthPrefix::U32 => 4,
        }
    }

    /// Largest length the prefix can represent.
    pub const fn max(self) -> usize {
        match self {
            LengthPrefix::U8 => u8::MAX as usize,
            LengthPrefix::U16 => u16::MAX as usize,
            LengthPrefix::U32 => u32::MAX as usize,
        }
    }

    /// Name of the unsigned codec with the same width.
    pub const fn name(self) -> &'static str {
        match self {
            LengthPrefix::U8 => "u8",
            LengthPrefix::U16 => "u16",
            LengthPrefix::U32 => "u32",
        }
    }

    /// Selects the index width for `count` positional variants.
    pub const fn for_count(count: usize) -> Self {
        if count <= 1 << 8 {
            LengthPrefix::U8
        } else if count <= 1 << 16 {
            LengthPrefix::U16
        } else {
            LengthPrefix::U32
        }
    }

    /// Writes `len` with this width.
    pub fn write(self, cursor: &mut Cursor, len: usize) -> Result<(), Error> {
        if len > self.max() {
            return Err(Error::InvalidData(
                self.name().into(),
                format!("length {len} exceeds {}", self.max()),
            ));
        }
        match self {
            LengthPrefix::U8 => cursor.put_u8(len as u8),
            LengthPrefix::U16 => cursor.put_u16(len as u16),
            LengthPrefix::U32 => cursor.put_u32(len as u32),
        }
    }

    /// Reads a length written with this width.
    pub fn read(self, cursor: &mut Cursor) -> Result<usize, Error> {
        Ok(match self {
            LengthPrefix::U8 => cursor.get_u8()? as usize,
            LengthPrefix::U16 => cursor.get_u16()? as usize,
            LengthPrefix::U32 => cursor.get_u32()? as usize,
        })
    }
}

/// Configuration for limiting the range of a value.
///
/// Used to restrict the values the automatic number codec accepts.
///
/// # Examples
///
/// ```
/// use commonware_schema::RangeCfg;
///
/// let cfg = RangeCfg::new(0.0..=1024.0);
/// assert!(cfg.contains(&500.0));
/// assert!(!cfg.contains(&2000.0));
///
/// let cfg = RangeCfg::new(1..);
/// assert!(cfg.contains(&1));
/// assert!(!cfg.contains(&0));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RangeCfg<T: Copy + PartialOrd> {
    start: Bound<T>,
    end: Bound<T>,
}

impl<T: Copy + PartialOrd> RangeCfg<T> {
    /// Creates a new `RangeCfg` from any type implementing `RangeBounds<T>`.
    pub fn new(r: impl RangeBounds<T>) -> Self {
        RangeCfg {
            start: r.start_bound().cloned(),
            end: r.end_bound().cloned(),
        }
    }

    /// A range with no bounds.
    pub fn full() -> Self {
        Self::new(..)
    }

    /// Returns a copy with the lower bound replaced by `value` (inclusive).
    pub fn with_start(self, value: T) -> Self {
        Self {
            start: Bound::Included(value),
            end: self.end,
        }
    }

    /// Returns a copy with the upper bound replaced by `value` (inclusive).
    pub fn with_end(self, value: T) -> Self {
        Self {
            start: self.start,
            end: Bound::Included(value),
        }
    }

    /// Returns true if the value is within this range.
    pub fn contains(&self, value: &T) -> bool {
        match &self.start {
            Bound::Included(s) if value < s => return false,
            Bound::Excluded(s) if value <= s => return false,
            _ => {}
        }
        match &self.end {
            Bound::Included(e) if value > e => return false,
            Bound::Excluded(e) if value >= e => return false,
            _ => {}
        }
        true
    }
}

impl<T: Copy + PartialOrd> RangeBounds<T> for RangeCfg<T> {
    fn start_bound(&self) -> Bound<&T> {
        self.start.as_ref()
    }

    fn end_bound(&self) -> Bound<&T> {
        self.end.as_ref()
    }
}

impl<T: Copy + PartialOrd + fmt::Display> fmt::Display for RangeCfg<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.start {
            Bound::Included(s) => write!(f, "[{s}, ")?,
            Bound::Excluded(s) => write!(f, "({s}, ")?,
            Bound::Unbounded => write!(f, "(-inf, ")?,
        }
        match &self.end {
            Bound::Included(e) => write!(f, "{e}]"),
            Bound::Excluded(e) => write!(f, "{e})"),
            Bound::Unbounded => write!(f, "inf)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_for_count() {
        assert_eq!(LengthPrefix::for_count(1), LengthPrefix::U8);
        assert_eq!(LengthPrefix::for_count(256), LengthPrefix::U8);
        assert_eq!(LengthPrefix::for_count(257), LengthPrefix::U16);
        assert_eq!(LengthPrefix::for_count(65_536), LengthPrefix::U16);
        assert_eq!(LengthPrefix::for_count(65_537), LengthPrefix::U32);
    }

    #[test]
    fn test_prefix_roundtrip() {
        for (prefix, len) in [
            (LengthPrefix::U8, 200),
            (LengthPrefix::U16, 40_000),
            (LengthPrefix::U32, 70_000),
        ] {
            let mut cursor = Cursor::alloc(prefix.width());
            prefix.write(&mut cursor, len).unwrap();
            let mut cursor = Cursor::new(cursor.into_bytes().as_ref());
            assert_eq!(prefix.read(&mut cursor).unwrap(), len);
        }
    }

    #[test]
    fn test_prefix_too_long() {
        let mut cursor = Cursor::alloc(1);
        assert!(matches!(
            LengthPrefix::U8.write(&mut cursor, 256),
            Err(Error::InvalidData(_, _))
        ));
    }

    #[test]
    fn test_range_cfg_contains() {
        let cfg: RangeCfg<f64> = RangeCfg::full().with_start(-1.0).with_end(1.0);
        assert!(cfg.contains(&-1.0));
        assert!(cfg.contains(&1.0));
        assert!(!cfg.contains(&1.5));

        let cfg = RangeCfg::new(5..10);
        assert!(!cfg.contains(&4));
        assert!(cfg.contains(&9));
        assert!(!cfg.contains(&10));
        assert_eq!(cfg.to_string(), "[5, 10)");
    }
}
