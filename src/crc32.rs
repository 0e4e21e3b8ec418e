//! CRC-32 (IEEE 802.3) as required by the ZIP local and central directory
//! headers.

/// Compute the CRC-32 of `data`.
#[inline]
pub fn checksum(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}
