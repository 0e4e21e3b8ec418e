//! Vec<u8> writer extension for building container bytes.
//!
//! Provides `write_u16_le`, `write_u24_le`, etc. without requiring `std::io::Write`.

use alloc::vec::Vec;

/// Extension trait for appending little-endian fields to a `Vec<u8>`.
pub(crate) trait VecWriter {
    /// Append a slice to the buffer.
    fn write_all(&mut self, data: &[u8]);

    /// Write a u16 in little-endian.
    fn write_u16_le(&mut self, v: u16);

    /// Write a u24 (3 bytes) in little-endian.
    fn write_u24_le(&mut self, v: u32);

    /// Write a u32 in little-endian.
    fn write_u32_le(&mut self, v: u32);

    /// Write the low `width` bytes of `v` in little-endian.
    ///
    /// Higher bytes are truncated; callers keep `v < 256^width`.
    fn write_unsigned_le(&mut self, v: u64, width: usize);
}

impl VecWriter for Vec<u8> {
    #[inline]
    fn write_all(&mut self, data: &[u8]) {
        self.extend_from_slice(data);
    }

    #[inline]
    fn write_u16_le(&mut self, v: u16) {
        self.extend_from_slice(&v.to_le_bytes());
    }

    #[inline]
    fn write_u24_le(&mut self, v: u32) {
        self.write_unsigned_le(u64::from(v), 3);
    }

    #[inline]
    fn write_u32_le(&mut self, v: u32) {
        self.extend_from_slice(&v.to_le_bytes());
    }

    #[inline]
    fn write_unsigned_le(&mut self, v: u64, width: usize) {
        let bytes = v.to_le_bytes();
        let n = width.min(bytes.len());
        self.extend_from_slice(&bytes[..n]);
        // Widths past 8 bytes are zero-filled.
        self.resize(self.len() + (width - n), 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_fixed_width_fields() {
        let mut out = Vec::new();
        out.write_u16_le(0x0102);
        out.write_u24_le(0x0003_0405);
        out.write_u32_le(0x0607_0809);
        assert_eq!(out, vec![0x02, 0x01, 0x05, 0x04, 0x03, 0x09, 0x08, 0x07, 0x06]);
    }

    #[test]
    fn test_unsigned_le_truncates() {
        let mut out = Vec::new();
        out.write_unsigned_le(0x1234_5678, 2);
        assert_eq!(out, vec![0x78, 0x56]);

        let mut out = Vec::new();
        out.write_unsigned_le(1, 10);
        assert_eq!(out, vec![1, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    }
}
