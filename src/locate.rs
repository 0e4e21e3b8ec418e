//! Payload locator.
//!
//! Embedded images sit in marker-delimited blocks of the host container. Each
//! block starts with `A3`, followed by a size-class byte and a big-endian size:
//!
//! | marker  | size field | header |
//! |---------|------------|--------|
//! | `A3 20` | 2 bytes    | 4      |
//! | `A3 10` | 3 bytes    | 5      |
//!
//! The first block is found by searching for the first WebP chunk tag and
//! backing up to its marker; later blocks follow back to back.

use alloc::vec::Vec;

use crate::error::ExtractError;
use crate::riff::FourCC;
use crate::slice_reader::{Eof, SliceReader};
use crate::warning::{Warning, Warnings};

/// Tags that can open the chunk sequence of an embedded image.
pub const FIRST_CHUNK_TAGS: [FourCC; 5] = [
    FourCC::VP8,
    FourCC::VP8L,
    FourCC::ICCP,
    FourCC::ALPH,
    FourCC::ANIM,
];

/// First byte of every payload marker.
pub const MARKER: u8 = 0xA3;
/// Size-class byte for a 2-byte size field.
pub const SIZE_CLASS_SHORT: u8 = 0x20;
/// Size-class byte for a 3-byte size field.
pub const SIZE_CLASS_LONG: u8 = 0x10;

/// Distance from a 2-byte-size marker to the first chunk tag of its payload.
const MARKER_TO_FIRST_CHUNK: usize = 0x12;

/// One marker-delimited region of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawPayload<'a> {
    /// Offset of the marker.
    pub start_offset: usize,
    /// Offset of the first payload byte.
    pub data_offset: usize,
    /// Payload bytes (possibly cut short at the end of the input).
    pub bytes: &'a [u8],
}

/// Split `data` into marker-delimited payloads.
///
/// Fails only when no chunk tag or no leading marker can be found; all other
/// irregularities are recorded in `warnings`.
pub fn locate_payloads<'a>(
    data: &'a [u8],
    warnings: &mut Warnings,
) -> Result<Vec<RawPayload<'a>>, ExtractError> {
    let first_chunk = find_first_chunk(data).ok_or(ExtractError::NoWebPChunkFound)?;
    let mut pos = find_first_marker(data, first_chunk)?;
    log::debug!("first chunk at 0x{first_chunk:x}, first marker at 0x{pos:x}");

    let mut payloads = Vec::new();
    while pos < data.len() {
        let Ok(Some((data_offset, declared))) = read_marker(data, pos) else {
            break;
        };

        let available = data.len() - data_offset;
        let size = if declared > available {
            warnings.push(Warning::PayloadTruncated { payload: pos });
            available
        } else {
            declared
        };

        log::trace!("payload at 0x{pos:x}: {size} bytes");
        payloads.push(RawPayload {
            start_offset: pos,
            data_offset,
            bytes: &data[data_offset..data_offset + size],
        });
        pos = data_offset + size;
    }

    if pos < data.len() {
        warnings.push(Warning::TrailingData { offset: pos });
    }

    log::debug!("located {} payload(s)", payloads.len());
    Ok(payloads)
}

/// Offset of the first byte sequence matching one of [`FIRST_CHUNK_TAGS`].
pub fn find_first_chunk(data: &[u8]) -> Option<usize> {
    data.windows(4)
        .position(|w| FIRST_CHUNK_TAGS.iter().any(|tag| w == tag.as_bytes()))
}

/// Back up from the first chunk tag to the marker that opens its payload.
fn find_first_marker(data: &[u8], first_chunk: usize) -> Result<usize, ExtractError> {
    let not_found = || ExtractError::NoMarkerFound {
        chunk_offset: first_chunk,
    };

    let mut pos = first_chunk
        .checked_sub(MARKER_TO_FIRST_CHUNK)
        .ok_or_else(not_found)?;
    // A 3-byte size field moves the marker one byte further back.
    if data[pos] == SIZE_CLASS_LONG {
        pos = pos.checked_sub(1).ok_or_else(not_found)?;
    }

    let is_marker = data[pos] == MARKER
        && matches!(
            data.get(pos + 1),
            Some(&SIZE_CLASS_SHORT) | Some(&SIZE_CLASS_LONG)
        );
    if is_marker {
        Ok(pos)
    } else {
        Err(not_found())
    }
}

/// Decode the marker at `pos`, returning the payload offset and declared size.
///
/// Only the size-class byte is inspected. `Ok(None)` means an unknown size
/// class; `Err(Eof)` means the marker header is cut off by the end of input.
fn read_marker(data: &[u8], pos: usize) -> Result<Option<(usize, usize)>, Eof> {
    let mut r = SliceReader::at(data, pos);
    let size = match r.peek_u8(1)? {
        SIZE_CLASS_SHORT => {
            r.skip(2);
            r.read_u16_be()? as usize
        }
        SIZE_CLASS_LONG => {
            r.skip(2);
            r.read_u24_be()? as usize
        }
        _ => return Ok(None),
    };
    Ok(Some((r.position(), size)))
}
