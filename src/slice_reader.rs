//! A position-tracking reader over a byte slice.
//!
//! Similar to `std::io::Cursor<&[u8]>`, but every read hands back borrowed
//! data and reports running past the end as [`Eof`] instead of an I/O error.

use byteorder_lite::{BigEndian, ByteOrder, LittleEndian};
use core::fmt;
use thiserror::Error;

use crate::riff::FourCC;

/// A read ran past the end of the slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unexpected end of data")]
pub(crate) struct Eof;

/// A reader that wraps a byte slice and tracks the current position.
#[derive(Clone)]
pub(crate) struct SliceReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceReader<'a> {
    /// Create a reader positioned at `pos`.
    #[inline]
    pub fn at(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    /// Returns the current position in the slice.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the number of bytes remaining from the current position.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Move forward by `n` bytes, clamping at the end of the slice.
    #[inline]
    pub fn skip(&mut self, n: usize) {
        self.pos = self.pos.saturating_add(n).min(self.data.len());
    }

    /// Look at the byte `offset` positions ahead without advancing.
    #[inline]
    pub fn peek_u8(&self, offset: usize) -> Result<u8, Eof> {
        self.data.get(self.pos + offset).copied().ok_or(Eof)
    }

    /// Read a u16 in big-endian byte order.
    #[inline]
    pub fn read_u16_be(&mut self) -> Result<u16, Eof> {
        let bytes = self.take_slice(2)?;
        Ok(BigEndian::read_u16(bytes))
    }

    /// Read a u24 in big-endian byte order (as u32).
    #[inline]
    pub fn read_u24_be(&mut self) -> Result<u32, Eof> {
        let bytes = self.take_slice(3)?;
        Ok(BigEndian::read_u24(bytes))
    }

    /// Read a u32 in little-endian byte order.
    #[inline]
    pub fn read_u32_le(&mut self) -> Result<u32, Eof> {
        let bytes = self.take_slice(4)?;
        Ok(LittleEndian::read_u32(bytes))
    }

    /// Read a four-character code.
    #[inline]
    pub fn read_fourcc(&mut self) -> Result<FourCC, Eof> {
        FourCC::read(self.take_slice(4)?).ok_or(Eof)
    }

    /// Take a slice of `n` bytes from the current position and advance.
    /// Returns a slice reference without copying data.
    #[inline]
    pub fn take_slice(&mut self, n: usize) -> Result<&'a [u8], Eof> {
        let slice = self.peek_slice(n)?;
        self.pos += n;
        Ok(slice)
    }

    /// Get a slice of `n` bytes from the current position without advancing.
    #[inline]
    pub fn peek_slice(&self, n: usize) -> Result<&'a [u8], Eof> {
        let end = self.pos.checked_add(n).ok_or(Eof)?;
        self.data.get(self.pos..end).ok_or(Eof)
    }
}

impl fmt::Debug for SliceReader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SliceReader")
            .field("len", &self.data.len())
            .field("pos", &self.pos)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_endianness() {
        let data = [0x01, 0x02, 0x0a, 0x0b, 0x0c, 0x78, 0x56, 0x34, 0x12];
        let mut r = SliceReader::at(&data, 0);
        assert_eq!(r.read_u16_be(), Ok(0x0102));
        assert_eq!(r.read_u24_be(), Ok(0x0a0b0c));
        assert_eq!(r.read_u32_le(), Ok(0x1234_5678));
        assert_eq!(r.remaining(), 0);
        assert_eq!(r.read_fourcc(), Err(Eof));
    }

    #[test]
    fn test_short_reads_do_not_advance() {
        let data = [1, 2, 3];
        let mut r = SliceReader::at(&data, 1);
        assert_eq!(r.read_u32_le(), Err(Eof));
        assert_eq!(r.position(), 1);
        assert_eq!(r.peek_u8(1), Ok(3));
        assert_eq!(r.peek_u8(2), Err(Eof));
        r.skip(100);
        assert_eq!(r.position(), 3);
    }
}
