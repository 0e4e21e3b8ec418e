//! Animation assembler.
//!
//! Merges several decomposed images into one animated WebP. Every image
//! becomes an `ANMF` frame; the canvas is the largest width and height seen,
//! and the first ICC/EXIF/XMP chunk found is shared by the whole animation.

use alloc::vec::Vec;

use super::assemble::assemble_webp;
use crate::decompose::{DecomposedImage, Dimension};
use crate::riff::{chunk_size, concat, pad_fourcc, wrap_chunk, write_chunk, Chunk, FourCC};
use crate::vec_writer::VecWriter;

/// Size of the `ANMF` frame header preceding the frame's sub-chunks.
pub const FRAME_HEADER_LEN: usize = 16;

/// Largest frame duration the 24-bit field can hold.
pub const MAX_FRAME_DURATION_MS: u32 = 0xFF_FFFF;

/// Frame flags: overwrite without alpha blending, no dispose to background.
const FRAME_FLAGS: u8 = 0x02;

/// Per-position frame delays in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTiming {
    /// Delay of the first frame.
    pub first_ms: u32,
    /// Delay of every frame between the first and the last.
    pub middle_ms: u32,
    /// Delay of the last frame.
    pub last_ms: u32,
}

impl FrameTiming {
    /// Duration of frame `index` out of `count`.
    ///
    /// The first-frame check wins, so a single-frame animation uses `first_ms`.
    pub fn duration(&self, index: usize, count: usize) -> u32 {
        if index == 0 {
            self.first_ms
        } else if index + 1 == count {
            self.last_ms
        } else {
            self.middle_ms
        }
    }
}

/// Validated animation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationParams {
    /// Loop count written to `ANIM`; 0 loops forever.
    pub loop_count: u16,
    /// Frame delays.
    pub timing: FrameTiming,
}

/// Serialize `images` as one animated WebP.
///
/// None of `images` may carry an `ANIM` chunk of its own; callers fall back
/// to archive output in that case.
pub fn assemble_animation(images: &[DecomposedImage<'_>], params: &AnimationParams) -> Vec<u8> {
    debug_assert!(images.iter().all(|img| img.anim.is_none()));

    let mut max_width = 0u32;
    let mut max_height = 0u32;
    let mut iccp: Option<Chunk<'_>> = None;
    let mut exif: Option<Chunk<'_>> = None;
    let mut xmp: Option<Chunk<'_>> = None;

    let frames: Vec<Vec<u8>> = images
        .iter()
        .enumerate()
        .map(|(index, image)| {
            max_width = max_width.max(image.dimension.width());
            max_height = max_height.max(image.dimension.height());
            iccp = iccp.or(image.iccp);
            exif = exif.or(image.exif);
            xmp = xmp.or(image.xmp);

            let duration = params.timing.duration(index, images.len());
            build_frame(image, duration)
        })
        .collect();

    // Transparent black background, then the loop count.
    let anim_payload = concat(&[&[0; 4], &params.loop_count.to_le_bytes()]);
    let anim = wrap_chunk(FourCC::ANIM, &anim_payload);

    log::debug!(
        "assembling animation: {} frame(s), canvas {}x{}, loop {}",
        frames.len(),
        max_width,
        max_height,
        params.loop_count
    );

    let animation = DecomposedImage {
        start_offset: 0,
        header_unknown: None,
        dimension: Dimension::new(max_width, max_height),
        iccp,
        anim: Chunk::new(&anim),
        image_data: frames.iter().filter_map(|f| Chunk::new(f)).collect(),
        exif,
        xmp,
        unknown: Vec::new(),
    };
    assemble_webp(&animation)
}

/// Build one complete `ANMF` chunk for `image`.
///
/// The frame carries the image's own dimension (not the canvas size), its
/// chunks, the opaque header as a `head` sub-chunk, and its metadata chunks
/// re-tagged as `iccp`/`exif`/`xmp `.
pub fn build_frame(image: &DecomposedImage<'_>, duration_ms: u32) -> Vec<u8> {
    let retagged = [
        (pad_fourcc("iccp"), image.iccp),
        (pad_fourcc("exif"), image.exif),
        (pad_fourcc("xmp"), image.xmp),
    ];

    let mut payload_len = FRAME_HEADER_LEN;
    payload_len += image
        .image_data
        .iter()
        .chain(image.unknown.iter())
        .map(|c| c.bytes().len())
        .sum::<usize>();
    if let Some(head) = image.header_unknown {
        payload_len += chunk_size(head.len());
    }
    payload_len += retagged
        .iter()
        .filter_map(|(_, chunk)| chunk.as_ref())
        .map(|c| chunk_size(c.payload().len()))
        .sum::<usize>();

    let mut out = Vec::with_capacity(chunk_size(payload_len));
    out.write_all(FourCC::ANMF.as_bytes());
    out.write_u32_le(payload_len as u32);

    // Frame header: X and Y offsets (zero), dimension, duration, flags.
    out.write_all(&[0; 6]);
    out.write_all(image.dimension.as_bytes());
    out.write_u24_le(duration_ms);
    out.push(FRAME_FLAGS);

    for chunk in image.image_data.iter().chain(image.unknown.iter()) {
        out.write_all(chunk.bytes());
    }
    if let Some(head) = image.header_unknown {
        write_chunk(&mut out, FourCC::HEAD, head);
    }
    for (tag, chunk) in retagged {
        if let Some(chunk) = chunk {
            write_chunk(&mut out, tag, chunk.payload());
        }
    }
    if payload_len % 2 == 1 {
        out.push(0);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_duration_selection() {
        let timing = FrameTiming {
            first_ms: 1000,
            middle_ms: 50,
            last_ms: 2000,
        };
        let three: Vec<u32> = (0..3).map(|i| timing.duration(i, 3)).collect();
        assert_eq!(three, vec![1000, 50, 2000]);
        assert_eq!(timing.duration(0, 1), 1000);
        assert_eq!(timing.duration(1, 2), 2000);
    }

    #[test]
    fn test_frame_layout() {
        let vp8 = wrap_chunk(FourCC::VP8, &[1, 2, 3]);
        let iccp = wrap_chunk(FourCC::ICCP, &[7, 7]);
        let header = [0xAAu8; 8];
        let image = DecomposedImage {
            header_unknown: Some(&header),
            dimension: Dimension::new(15, 7),
            iccp: Chunk::new(&iccp),
            image_data: vec![Chunk::new(&vp8).unwrap()],
            ..Default::default()
        };

        let frame = build_frame(&image, 0x12_3456);
        let payload_len = u32::from_le_bytes(frame[4..8].try_into().unwrap()) as usize;
        assert_eq!(&frame[0..4], b"ANMF");
        assert_eq!(frame.len(), chunk_size(payload_len));

        let header_bytes = &frame[8..24];
        assert_eq!(&header_bytes[0..6], &[0; 6]);
        assert_eq!(&header_bytes[6..12], Dimension::new(15, 7).as_bytes());
        assert_eq!(&header_bytes[12..15], &[0x56, 0x34, 0x12]);
        assert_eq!(header_bytes[15], 0x02);

        let mut body = Vec::new();
        body.extend_from_slice(&vp8);
        body.extend_from_slice(&wrap_chunk(FourCC::HEAD, &header));
        body.extend_from_slice(&wrap_chunk(FourCC(*b"iccp"), &[7, 7]));
        assert_eq!(&frame[24..], &body[..]);
    }

    #[test]
    fn test_frame_metadata_follows_head() {
        let vp8l = wrap_chunk(FourCC::VP8L, &[1]);
        let junk = wrap_chunk(FourCC(*b"JUNK"), &[2, 2]);
        let exif = wrap_chunk(FourCC::EXIF, b"exif!");
        let xmp = wrap_chunk(FourCC::XMP, b"<x/>");
        let header = [0x55u8; 8];
        let image = DecomposedImage {
            header_unknown: Some(&header),
            image_data: vec![Chunk::new(&vp8l).unwrap()],
            exif: Chunk::new(&exif),
            xmp: Chunk::new(&xmp),
            unknown: vec![Chunk::new(&junk).unwrap()],
            ..Default::default()
        };

        let frame = build_frame(&image, 40);
        let mut body = Vec::new();
        body.extend_from_slice(&vp8l);
        body.extend_from_slice(&junk);
        body.extend_from_slice(&wrap_chunk(FourCC::HEAD, &header));
        body.extend_from_slice(&wrap_chunk(FourCC(*b"exif"), b"exif!"));
        body.extend_from_slice(&wrap_chunk(FourCC(*b"xmp "), b"<x/>"));
        assert_eq!(&frame[24..], &body[..]);
        assert_eq!(
            u32::from_le_bytes(frame[4..8].try_into().unwrap()) as usize,
            FRAME_HEADER_LEN + body.len()
        );
    }

    #[test]
    fn test_first_metadata_wins() {
        let vp8 = wrap_chunk(FourCC::VP8, &[0; 2]);
        let iccp_a = wrap_chunk(FourCC::ICCP, b"AAAA");
        let iccp_b = wrap_chunk(FourCC::ICCP, b"BBBB");
        let exif_a = wrap_chunk(FourCC::EXIF, b"ea");
        let exif_b = wrap_chunk(FourCC::EXIF, b"eb");
        let xmp_b = wrap_chunk(FourCC::XMP, b"xb");
        let frame = |iccp, exif, xmp| DecomposedImage {
            image_data: vec![Chunk::new(&vp8).unwrap()],
            iccp,
            exif,
            xmp,
            ..Default::default()
        };
        let images = [
            frame(None, None, None),
            frame(Chunk::new(&iccp_a), Chunk::new(&exif_a), None),
            frame(Chunk::new(&iccp_b), Chunk::new(&exif_b), Chunk::new(&xmp_b)),
        ];
        let params = AnimationParams {
            loop_count: 0,
            timing: FrameTiming {
                first_ms: 1,
                middle_ms: 2,
                last_ms: 3,
            },
        };

        let webp = assemble_animation(&images, &params);
        let top_level = |tag: FourCC| {
            let mut pos = 12;
            while pos + 8 <= webp.len() {
                let len = u32::from_le_bytes(webp[pos + 4..pos + 8].try_into().unwrap()) as usize;
                if webp[pos..pos + 4] == tag.0 {
                    return Some(webp[pos + 8..pos + 8 + len].to_vec());
                }
                pos += chunk_size(len);
            }
            None
        };
        assert_eq!(top_level(FourCC::ICCP), Some(b"AAAA".to_vec()));
        assert_eq!(top_level(FourCC::EXIF), Some(b"ea".to_vec()));
        assert_eq!(top_level(FourCC::XMP), Some(b"xb".to_vec()));
    }
}
