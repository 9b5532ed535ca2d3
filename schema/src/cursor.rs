//! A forward-only cursor over a single byte buffer.
//!
//! Fixed-width integers and floats are little-endian. Running past either end of the buffer is a
//! structural fault ([Error::EndOfBuffer] on read, [Error::Overflow] on write): a correctly sized
//! buffer never triggers it.
//!
//! The cursor also counts how deeply reads are nested, so that untrusted input cannot recurse
//! without bound through self-describing or recursive codecs.

use crate::Error;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use paste::paste;

/// Maximum number of nested codec reads on a single cursor.
pub const MAX_DEPTH: usize = 128;

/// A byte buffer plus the offset of the next read or write.
///
/// A cursor is owned by exactly one encode or decode call.
#[derive(Debug)]
pub struct Cursor {
    buf: BytesMut,
    offset: usize,
    depth: usize,
}

macro_rules! impl_get_put {
    ($type:ty, $get:ident, $put:ident) => {
        paste! {
            #[doc = concat!("Reads a little-endian `", stringify!($type), "`.")]
            #[inline]
            pub fn [<get_ $type>](&mut self) -> Result<$type, Error> {
                const LEN: usize = std::mem::size_of::<$type>();
                self.at_least(LEN)?;
                let value = (&self.buf[self.offset..]).$get();
                self.offset += LEN;
                Ok(value)
            }

            #[doc = concat!("Writes a little-endian `", stringify!($type), "`.")]
            #[inline]
            pub fn [<put_ $type>](&mut self, value: $type) -> Result<(), Error> {
                const LEN: usize = std::mem::size_of::<$type>();
                self.room(LEN)?;
                (&mut self.buf[self.offset..]).$put(value);
                self.offset += LEN;
                Ok(())
            }
        }
    };
}

impl Cursor {
    /// Creates a cursor positioned at the start of `data`.
    pub fn new(data: impl Into<BytesMut>) -> Self {
        Self {
            buf: data.into(),
            offset: 0,
            depth: 0,
        }
    }

    /// Creates a cursor over `len` zeroed bytes, ready to be written.
    pub fn alloc(len: usize) -> Self {
        Self::new(BytesMut::zeroed(len))
    }

    /// Current read/write offset.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes left between the offset and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    /// Returns true once the offset has reached the end of the buffer.
    pub fn is_done(&self) -> bool {
        self.remaining() == 0
    }

    /// Consumes the cursor, returning the whole underlying buffer.
    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }

    /// Current nesting depth of reads.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Enters one level of nested reading, failing past [MAX_DEPTH].
    pub(crate) fn descend(&mut self) -> Result<(), Error> {
        if self.depth >= MAX_DEPTH {
            return Err(Error::DepthExceeded(MAX_DEPTH));
        }
        self.depth += 1;
        Ok(())
    }

    /// Leaves a level entered with [Cursor::descend].
    pub(crate) fn ascend(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn at_least(&self, len: usize) -> Result<(), Error> {
        if self.remaining() < len {
            return Err(Error::EndOfBuffer);
        }
        Ok(())
    }

    fn room(&self, len: usize) -> Result<(), Error> {
        let remaining = self.remaining();
        if remaining < len {
            return Err(Error::Overflow(len, remaining));
        }
        Ok(())
    }

    impl_get_put!(u8, get_u8, put_u8);
    impl_get_put!(u16, get_u16_le, put_u16_le);
    impl_get_put!(u32, get_u32_le, put_u32_le);
    impl_get_put!(u64, get_u64_le, put_u64_le);
    impl_get_put!(i8, get_i8, put_i8);
    impl_get_put!(i16, get_i16_le, put_i16_le);
    impl_get_put!(i32, get_i32_le, put_i32_le);
    impl_get_put!(i64, get_i64_le, put_i64_le);
    impl_get_put!(f32, get_f32_le, put_f32_le);
    impl_get_put!(f64, get_f64_le, put_f64_le);

    /// Reads a run of `len` raw bytes.
    pub fn get_slice(&mut self, len: usize) -> Result<&[u8], Error> {
        self.at_least(len)?;
        let start = self.offset;
        self.offset += len;
        Ok(&self.buf[start..self.offset])
    }

    /// Writes a run of raw bytes.
    pub fn put_slice(&mut self, src: &[u8]) -> Result<(), Error> {
        self.room(src.len())?;
        (&mut self.buf[self.offset..]).put_slice(src);
        self.offset += src.len();
        Ok(())
    }

    /// Decodes `len` bytes as a UTF-8 string.
    pub fn get_str(&mut self, len: usize) -> Result<String, Error> {
        let bytes = self.get_slice(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| Error::InvalidUtf8)
    }

    /// Reads bytes up to (and consuming) the next zero byte, or to the end of the buffer if no
    /// zero byte follows. The terminator is not part of the returned slice.
    pub fn get_terminated(&mut self) -> Result<&[u8], Error> {
        let start = self.offset;
        let rest = &self.buf[start..];
        match rest.iter().position(|&b| b == 0) {
            Some(end) => {
                self.offset += end + 1;
                Ok(&self.buf[start..start + end])
            }
            None => {
                self.offset = self.buf.len();
                Ok(&self.buf[start..])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian() {
        let mut cursor = Cursor::alloc(7);
        cursor.put_u32(3).unwrap();
        cursor.put_i16(-2).unwrap();
        cursor.put_u8(0xAB).unwrap();
        assert!(cursor.is_done());
        assert_eq!(
            cursor.into_bytes(),
            Bytes::from_static(&[0x03, 0x00, 0x00, 0x00, 0xFE, 0xFF, 0xAB])
        );
    }

    #[test]
    fn test_read_back() {
        let mut cursor = Cursor::alloc(12);
        cursor.put_f32(1.5).unwrap();
        cursor.put_f64(-0.25).unwrap();
        let mut cursor = Cursor::new(cursor.into_bytes().as_ref());
        assert_eq!(cursor.get_f32().unwrap(), 1.5);
        assert_eq!(cursor.get_f64().unwrap(), -0.25);
        assert!(cursor.is_done());
    }

    #[test]
    fn test_bounds() {
        let mut cursor = Cursor::alloc(1);
        assert!(matches!(cursor.put_u16(1), Err(Error::Overflow(2, 1))));
        cursor.put_u8(1).unwrap();
        assert!(matches!(cursor.put_slice(&[1]), Err(Error::Overflow(1, 0))));

        let mut cursor = Cursor::new(&[0x01u8, 0x02][..]);
        assert!(matches!(cursor.get_u32(), Err(Error::EndOfBuffer)));
        assert_eq!(cursor.offset(), 0);
        assert!(matches!(cursor.get_slice(3), Err(Error::EndOfBuffer)));
    }

    #[test]
    fn test_terminated() {
        let mut cursor = Cursor::new(&b"hi\0there"[..]);
        assert_eq!(cursor.get_terminated().unwrap(), b"hi");
        assert_eq!(cursor.get_terminated().unwrap(), b"there");
        assert!(cursor.is_done());
        assert_eq!(cursor.get_terminated().unwrap(), b"");
    }

    #[test]
    fn test_depth() {
        let mut cursor = Cursor::alloc(0);
        for _ in 0..MAX_DEPTH {
            cursor.descend().unwrap();
        }
        assert_eq!(cursor.depth(), MAX_DEPTH);
        assert!(matches!(cursor.descend(), Err(Error::DepthExceeded(MAX_DEPTH))));
        cursor.ascend();
        cursor.descend().unwrap();
    }

    #[test]
    fn test_invalid_utf8() {
        let mut cursor = Cursor::new(&[0xFFu8, 0xFE][..]);
        assert!(matches!(cursor.get_str(2), Err(Error::InvalidUtf8)));
    }
}
