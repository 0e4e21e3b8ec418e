//! WebP container assembler.
//!
//! Serializes a [`DecomposedImage`] as an extended-format WebP file:
//!
//! ```text
//! RIFF <size> WEBP
//!   VP8X   flags + canvas dimension
//!   ICCP   (optional)
//!   ANIM   (optional)
//!   ...    image data chunks, in order
//!   EXIF   (optional)
//!   XMP    (optional)
//!   ...    unknown chunks, in order
//!   head   opaque payload header (optional)
//! ```
//!
//! Chunk bytes are copied verbatim; no bitstream is decoded.

use alloc::vec::Vec;

use crate::decompose::{DecomposedImage, DIMENSION_LEN};
use crate::riff::{chunk_size, write_chunk, FourCC};
use crate::vec_writer::VecWriter;

/// `VP8X` flag: ICC profile present.
pub const FLAG_ICC: u8 = 1 << 5;
/// `VP8X` flag: alpha present.
pub const FLAG_ALPHA: u8 = 1 << 4;
/// `VP8X` flag: EXIF metadata present.
pub const FLAG_EXIF: u8 = 1 << 3;
/// `VP8X` flag: XMP metadata present.
pub const FLAG_XMP: u8 = 1 << 2;
/// `VP8X` flag: animated.
pub const FLAG_ANIMATION: u8 = 1 << 1;

/// Size of the `VP8X` payload.
const VP8X_LEN: usize = 10;

/// Offset of the first sub-chunk tag inside a full `ANMF` chunk
/// (8-byte chunk header + 16-byte frame header).
const ANMF_FIRST_SUBCHUNK: usize = 24;

/// Whether the image carries transparency.
///
/// True if any top-level image chunk is `ALPH` or `VP8L`, or any `ANMF`
/// frame's first sub-chunk is.
pub fn has_alpha(image: &DecomposedImage<'_>) -> bool {
    let is_alpha_tag = |tag: FourCC| tag == FourCC::ALPH || tag == FourCC::VP8L;
    image.image_data.iter().any(|chunk| match chunk.fourcc() {
        FourCC::ANMF => chunk
            .bytes()
            .get(ANMF_FIRST_SUBCHUNK..ANMF_FIRST_SUBCHUNK + 4)
            .and_then(FourCC::read)
            .is_some_and(is_alpha_tag),
        tag => is_alpha_tag(tag),
    })
}

/// Compute the `VP8X` feature flags byte.
pub fn vp8x_flags(image: &DecomposedImage<'_>) -> u8 {
    let mut flags = 0u8;
    if image.iccp.is_some() {
        flags |= FLAG_ICC;
    }
    if has_alpha(image) {
        flags |= FLAG_ALPHA;
    }
    if image.exif.is_some() {
        flags |= FLAG_EXIF;
    }
    if image.xmp.is_some() {
        flags |= FLAG_XMP;
    }
    if image.anim.is_some() {
        flags |= FLAG_ANIMATION;
    }
    flags
}

/// Build the 10-byte `VP8X` payload.
fn vp8x_payload(image: &DecomposedImage<'_>) -> [u8; VP8X_LEN] {
    let mut vp8x = [0u8; VP8X_LEN];
    vp8x[0] = vp8x_flags(image);
    // Bytes 1..4 are reserved.
    vp8x[4..4 + DIMENSION_LEN].copy_from_slice(image.dimension.as_bytes());
    vp8x
}

/// Serialize `image` as a complete WebP file.
pub fn assemble_webp(image: &DecomposedImage<'_>) -> Vec<u8> {
    let chunks = || {
        image
            .iccp
            .iter()
            .chain(image.anim.iter())
            .chain(image.image_data.iter())
            .chain(image.exif.iter())
            .chain(image.xmp.iter())
            .chain(image.unknown.iter())
    };

    let mut total = 4 + chunk_size(VP8X_LEN); // "WEBP" + VP8X
    total += chunks().map(|c| c.bytes().len()).sum::<usize>();
    if let Some(head) = image.header_unknown {
        total += chunk_size(head.len());
    }

    let mut out = Vec::with_capacity(total + 8 + (total & 1));
    out.write_all(FourCC::RIFF.as_bytes());
    out.write_u32_le(total as u32);
    out.write_all(FourCC::WEBP.as_bytes());
    write_chunk(&mut out, FourCC::VP8X, &vp8x_payload(image));
    for chunk in chunks() {
        out.write_all(chunk.bytes());
    }
    if let Some(head) = image.header_unknown {
        write_chunk(&mut out, FourCC::HEAD, head);
    }
    if total % 2 == 1 {
        out.push(0);
    }

    log::trace!("assembled WebP: {} bytes", out.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decompose::Dimension;
    use crate::riff::{wrap_chunk, Chunk};
    use alloc::vec;

    #[test]
    fn test_flags_and_layout() {
        let iccp = wrap_chunk(FourCC::ICCP, &[1, 2, 3, 4]);
        let vp8 = wrap_chunk(FourCC::VP8, &[5; 11]);
        let xmp = wrap_chunk(FourCC::XMP, b"<x/>");
        let junk = wrap_chunk(FourCC(*b"JUNK"), &[]);
        let header = [9u8; 8];

        let image = DecomposedImage {
            header_unknown: Some(&header),
            dimension: Dimension::new(99, 49),
            iccp: Chunk::new(&iccp),
            image_data: vec![Chunk::new(&vp8).unwrap()],
            xmp: Chunk::new(&xmp),
            unknown: vec![Chunk::new(&junk).unwrap()],
            ..Default::default()
        };
        assert_eq!(vp8x_flags(&image), FLAG_ICC | FLAG_XMP);

        let webp = assemble_webp(&image);
        assert_eq!(&webp[0..4], b"RIFF");
        assert_eq!(
            u32::from_le_bytes(webp[4..8].try_into().unwrap()) as usize,
            webp.len() - 8
        );
        assert_eq!(&webp[8..12], b"WEBP");
        assert_eq!(&webp[12..16], b"VP8X");
        assert_eq!(&webp[16..20], &[10, 0, 0, 0]);
        assert_eq!(webp[20], FLAG_ICC | FLAG_XMP);
        assert_eq!(&webp[21..24], &[0, 0, 0]);
        assert_eq!(&webp[24..30], Dimension::new(99, 49).as_bytes());

        let mut expected_tail = Vec::new();
        expected_tail.extend_from_slice(&iccp);
        expected_tail.extend_from_slice(&vp8);
        expected_tail.extend_from_slice(&xmp);
        expected_tail.extend_from_slice(&junk);
        expected_tail.extend_from_slice(&wrap_chunk(FourCC::HEAD, &header));
        assert_eq!(&webp[30..], &expected_tail[..]);
    }

    #[test]
    fn test_alpha_detection() {
        let vp8l = wrap_chunk(FourCC::VP8L, &[0x2f]);
        let image = DecomposedImage {
            image_data: vec![Chunk::new(&vp8l).unwrap()],
            ..Default::default()
        };
        assert!(has_alpha(&image));

        let mut frame_body = vec![0u8; 16];
        frame_body.extend_from_slice(&wrap_chunk(FourCC::ALPH, &[1, 2]));
        frame_body.extend_from_slice(&wrap_chunk(FourCC::VP8, &[3, 4]));
        let anmf = wrap_chunk(FourCC::ANMF, &frame_body);
        let image = DecomposedImage {
            image_data: vec![Chunk::new(&anmf).unwrap()],
            ..Default::default()
        };
        assert!(has_alpha(&image));

        let mut frame_body = vec![0u8; 16];
        frame_body.extend_from_slice(&wrap_chunk(FourCC::VP8, &[3, 4]));
        let anmf = wrap_chunk(FourCC::ANMF, &frame_body);
        let image = DecomposedImage {
            image_data: vec![Chunk::new(&anmf).unwrap()],
            ..Default::default()
        };
        assert!(!has_alpha(&image));
    }

    #[test]
    fn test_no_head_chunk_without_header() {
        let vp8 = wrap_chunk(FourCC::VP8, &[0; 4]);
        let image = DecomposedImage {
            image_data: vec![Chunk::new(&vp8).unwrap()],
            ..Default::default()
        };
        let webp = assemble_webp(&image);
        assert_eq!(webp.len(), 12 + 18 + vp8.len());
        assert_eq!(&webp[30..], &vp8[..]);
    }
}
