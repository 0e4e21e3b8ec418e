//! RIFF chunk primitives shared by the decomposer and the assemblers.
//!
//! A chunk is `fourcc(4) + length(4, LE) + payload + pad byte if length is odd`.
//! The pad byte is not counted in the length field.

use alloc::vec::Vec;
use core::fmt;

use crate::vec_writer::VecWriter;

/// Size of a chunk header (fourcc + length).
pub const CHUNK_HEADER_SIZE: usize = 8;

/// A four-character chunk code. Case-sensitive, may contain trailing spaces.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// `RIFF` container chunk.
    pub const RIFF: Self = Self(*b"RIFF");
    /// `WEBP` form type.
    pub const WEBP: Self = Self(*b"WEBP");
    /// Extended-format header chunk.
    pub const VP8X: Self = Self(*b"VP8X");
    /// Lossy bitstream.
    pub const VP8: Self = Self(*b"VP8 ");
    /// Lossless bitstream.
    pub const VP8L: Self = Self(*b"VP8L");
    /// ICC color profile.
    pub const ICCP: Self = Self(*b"ICCP");
    /// Alpha plane for lossy images.
    pub const ALPH: Self = Self(*b"ALPH");
    /// Global animation parameters.
    pub const ANIM: Self = Self(*b"ANIM");
    /// Animation frame.
    pub const ANMF: Self = Self(*b"ANMF");
    /// EXIF metadata.
    pub const EXIF: Self = Self(*b"EXIF");
    /// XMP metadata.
    pub const XMP: Self = Self(*b"XMP ");
    /// Opaque payload header bytes preserved from the source container.
    pub const HEAD: Self = Self(*b"head");

    /// Read the first four bytes of `bytes` as a fourcc, without validating the
    /// character set. Returns `None` if fewer than four bytes are available.
    pub fn read(bytes: &[u8]) -> Option<Self> {
        let tag: [u8; 4] = bytes.get(..4)?.try_into().ok()?;
        Some(Self(tag))
    }

    /// The raw tag bytes.
    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC(\"{self}\")")
    }
}

/// ASCII-encode `name` and right-pad it with spaces to four bytes.
///
/// `name` must be at most four characters; anything longer is truncated.
pub fn pad_fourcc(name: &str) -> FourCC {
    debug_assert!(name.len() <= 4);
    let mut tag = [b' '; 4];
    for (dst, src) in tag.iter_mut().zip(name.bytes()) {
        *dst = src;
    }
    FourCC(tag)
}

/// Interpret up to four bytes as an unsigned little-endian integer.
pub fn read_unsigned_le(bytes: &[u8]) -> u32 {
    debug_assert!(bytes.len() <= 4);
    bytes
        .iter()
        .rev()
        .fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
}

/// Length of a chunk payload once padded to an even size.
#[inline]
pub const fn padded_len(len: usize) -> usize {
    len + (len & 1)
}

/// Total bytes a chunk with `inner_bytes` of payload occupies, header and pad included.
#[inline]
pub const fn chunk_size(inner_bytes: usize) -> usize {
    CHUNK_HEADER_SIZE + padded_len(inner_bytes)
}

/// Append a complete chunk (header, payload, pad byte) to `w`.
pub fn write_chunk(w: &mut Vec<u8>, fourcc: FourCC, data: &[u8]) {
    w.write_all(fourcc.as_bytes());
    w.write_u32_le(data.len() as u32);
    w.write_all(data);
    if data.len() % 2 == 1 {
        w.push(0);
    }
}

/// Build a standalone chunk around `data`.
pub fn wrap_chunk(fourcc: FourCC, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(chunk_size(data.len()));
    write_chunk(&mut out, fourcc, data);
    out
}

/// Concatenate `parts` in order.
pub fn concat(parts: &[&[u8]]) -> Vec<u8> {
    let total = parts.iter().map(|p| p.len()).sum();
    let mut out = Vec::with_capacity(total);
    for part in parts {
        out.write_all(part);
    }
    out
}

/// A chunk borrowed from its parent buffer, header included.
///
/// `bytes` always starts with the 8-byte chunk header and includes the pad
/// byte when the declared length is odd.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    fourcc: FourCC,
    bytes: &'a [u8],
}

impl<'a> Chunk<'a> {
    /// View `bytes` (a full chunk, header included) as a chunk.
    ///
    /// Returns `None` if `bytes` is too short to hold a header.
    pub fn new(bytes: &'a [u8]) -> Option<Self> {
        if bytes.len() < CHUNK_HEADER_SIZE {
            return None;
        }
        let fourcc = FourCC::read(bytes)?;
        Some(Self { fourcc, bytes })
    }

    /// The chunk's tag.
    pub fn fourcc(&self) -> FourCC {
        self.fourcc
    }

    /// The full chunk bytes: header, payload, and pad byte if any.
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Length field as written in the header (pad byte excluded).
    pub fn declared_len(&self) -> usize {
        read_unsigned_le(&self.bytes[4..8]) as usize
    }

    /// Payload bytes, without header or pad byte.
    pub fn payload(&self) -> &'a [u8] {
        let end = CHUNK_HEADER_SIZE
            .saturating_add(self.declared_len())
            .min(self.bytes.len());
        &self.bytes[CHUNK_HEADER_SIZE..end]
    }
}

impl fmt::Debug for Chunk<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("fourcc", &self.fourcc)
            .field("len", &self.bytes.len())
            .finish()
    }
}
