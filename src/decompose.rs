//! Chunk decomposer.
//!
//! Each payload is laid out as:
//!
//! ```text
//! 8 bytes   opaque header (kept verbatim)
//! 6 bytes   canvas dimension: 3-byte width, 3-byte height (LE, as found)
//! ...       RIFF-style chunks
//! ```
//!
//! Chunks must appear in the order `ICCP < ANIM < ALPH < VP8/VP8L < ANMF <
//! EXIF < XMP < unknown`. A chunk that breaks the order, or that is not
//! allowed given the presence or absence of `ANIM`, is dropped with a
//! warning. The accept/reject decision is the [`transition`] table.

use alloc::vec::Vec;
use core::fmt;

use crate::locate::RawPayload;
use crate::riff::{Chunk, FourCC, CHUNK_HEADER_SIZE};
use crate::slice_reader::SliceReader;
use crate::warning::{Warning, Warnings};

/// Length of the opaque header at the start of every payload.
pub const HEADER_UNKNOWN_LEN: usize = 8;
/// Length of the dimension field following the opaque header.
pub const DIMENSION_LEN: usize = 6;
/// Offset of the first chunk within a payload.
pub const FIRST_CHUNK_OFFSET: usize = HEADER_UNKNOWN_LEN + DIMENSION_LEN;

/// Canvas size as stored in a payload: 24-bit LE width, then 24-bit LE height.
///
/// Values are kept exactly as found and copied verbatim into the `VP8X`
/// chunk; no "minus one" adjustment is applied in either direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dimension(pub [u8; DIMENSION_LEN]);

impl Dimension {
    /// Build a dimension from width and height (each truncated to 24 bits).
    pub fn new(width: u32, height: u32) -> Self {
        let w = width.to_le_bytes();
        let h = height.to_le_bytes();
        Self([w[0], w[1], w[2], h[0], h[1], h[2]])
    }

    /// Stored width field.
    pub fn width(&self) -> u32 {
        u32::from(self.0[0]) | (u32::from(self.0[1]) << 8) | (u32::from(self.0[2]) << 16)
    }

    /// Stored height field.
    pub fn height(&self) -> u32 {
        u32::from(self.0[3]) | (u32::from(self.0[4]) << 8) | (u32::from(self.0[5]) << 16)
    }

    /// The raw six bytes.
    pub fn as_bytes(&self) -> &[u8; DIMENSION_LEN] {
        &self.0
    }
}

/// Position reached in the chunk ordering of one payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// No chunk accepted yet.
    Start,
    /// `ICCP` accepted.
    Iccp,
    /// `ANIM` accepted.
    Anim,
    /// `ALPH` accepted.
    Alph,
    /// `VP8 ` or `VP8L` accepted.
    Vp8,
    /// One or more `ANMF` accepted.
    Anmf,
    /// `EXIF` accepted.
    Exif,
    /// `XMP ` accepted.
    Xmp,
    /// An unrecognized chunk was collected.
    Unknown,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Start => "start",
            Phase::Iccp => "ICCP",
            Phase::Anim => "ANIM",
            Phase::Alph => "ALPH",
            Phase::Vp8 => "VP8/VP8L",
            Phase::Anmf => "ANMF",
            Phase::Exif => "EXIF",
            Phase::Xmp => "XMP",
            Phase::Unknown => "unknown",
        })
    }
}

/// Where an accepted chunk is stored in the [`DecomposedImage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// [`DecomposedImage::iccp`].
    Iccp,
    /// [`DecomposedImage::anim`].
    Anim,
    /// Appended to [`DecomposedImage::image_data`].
    ImageData,
    /// Appended to [`DecomposedImage::unknown`].
    Unknown,
}

/// Why a chunk was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The ordering phase is already at or past this chunk's phase.
    OutOfOrder,
    /// Bare image chunk in an animated payload.
    ForbiddenInAnimation,
    /// `ANMF` without a preceding `ANIM`.
    FrameWithoutAnimation,
}

/// Outcome of feeding one chunk tag to the ordering state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Keep the chunk and move to `next`.
    Accept {
        /// The new phase.
        next: Phase,
        /// Where to store the chunk.
        slot: Slot,
        /// Whether the chunk counts as image content.
        is_image: bool,
    },
    /// Drop the chunk.
    Reject(Rejection),
}

#[derive(Clone, Copy)]
enum AnimRule {
    Any,
    Forbidden,
    Required,
}

struct Rule {
    fourcc: FourCC,
    phase: Phase,
    anim: AnimRule,
    repeatable: bool,
    slot: Slot,
    is_image: bool,
}

const fn rule(fourcc: FourCC, phase: Phase, anim: AnimRule, slot: Slot) -> Rule {
    Rule {
        fourcc,
        phase,
        anim,
        repeatable: false,
        slot,
        is_image: false,
    }
}

const RULES: [Rule; 8] = [
    rule(FourCC::ICCP, Phase::Iccp, AnimRule::Any, Slot::Iccp),
    rule(FourCC::ANIM, Phase::Anim, AnimRule::Any, Slot::Anim),
    rule(FourCC::ALPH, Phase::Alph, AnimRule::Forbidden, Slot::ImageData),
    Rule {
        is_image: true,
        ..rule(FourCC::VP8, Phase::Vp8, AnimRule::Forbidden, Slot::ImageData)
    },
    Rule {
        is_image: true,
        ..rule(FourCC::VP8L, Phase::Vp8, AnimRule::Forbidden, Slot::ImageData)
    },
    Rule {
        is_image: true,
        repeatable: true,
        ..rule(FourCC::ANMF, Phase::Anmf, AnimRule::Required, Slot::ImageData)
    },
    rule(FourCC::EXIF, Phase::Exif, AnimRule::Any, Slot::ImageData),
    rule(FourCC::XMP, Phase::Xmp, AnimRule::Any, Slot::ImageData),
];

/// Decide what to do with a chunk tagged `fourcc` when the payload is at
/// `phase` and `has_anim` says whether an `ANIM` chunk was accepted.
///
/// Unrecognized tags are always accepted into the unknown list.
pub fn transition(phase: Phase, has_anim: bool, fourcc: FourCC) -> Transition {
    let Some(rule) = RULES.iter().find(|r| r.fourcc == fourcc) else {
        return Transition::Accept {
            next: Phase::Unknown,
            slot: Slot::Unknown,
            is_image: false,
        };
    };

    match (rule.anim, has_anim) {
        (AnimRule::Forbidden, true) => {
            return Transition::Reject(Rejection::ForbiddenInAnimation)
        }
        (AnimRule::Required, false) => {
            return Transition::Reject(Rejection::FrameWithoutAnimation)
        }
        _ => {}
    }

    let in_order = phase < rule.phase || (rule.repeatable && phase == rule.phase);
    if !in_order {
        return Transition::Reject(Rejection::OutOfOrder);
    }

    Transition::Accept {
        next: rule.phase,
        slot: rule.slot,
        is_image: rule.is_image,
    }
}

/// One embedded image, split into its chunks.
///
/// All chunks borrow from the input buffer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecomposedImage<'a> {
    /// Offset of the payload marker in the input.
    pub start_offset: usize,
    /// The payload's opaque 8-byte header, re-emitted as a `head` chunk.
    pub header_unknown: Option<&'a [u8]>,
    /// Canvas dimension as stored in the payload.
    pub dimension: Dimension,
    /// `ICCP` chunk.
    pub iccp: Option<Chunk<'a>>,
    /// `ANIM` chunk.
    pub anim: Option<Chunk<'a>>,
    /// `ALPH`, `VP8 `, `VP8L`, `ANMF`, `EXIF` and `XMP ` chunks in encounter order.
    pub image_data: Vec<Chunk<'a>>,
    /// `EXIF` chunk written after the image data. Only set when assembling.
    pub exif: Option<Chunk<'a>>,
    /// `XMP ` chunk written after the image data. Only set when assembling.
    pub xmp: Option<Chunk<'a>>,
    /// Unrecognized chunks in encounter order.
    pub unknown: Vec<Chunk<'a>>,
}

/// Decompose every payload, dropping those without image content.
pub fn decompose_all<'a>(
    payloads: &[RawPayload<'a>],
    warnings: &mut Warnings,
) -> Vec<DecomposedImage<'a>> {
    payloads
        .iter()
        .filter_map(|p| decompose_payload(p, warnings))
        .collect()
}

/// Split one payload into chunks.
///
/// Returns `None` (with a warning) if the payload is too short or carries
/// no `VP8 `, `VP8L` or `ANMF` chunk.
pub fn decompose_payload<'a>(
    payload: &RawPayload<'a>,
    warnings: &mut Warnings,
) -> Option<DecomposedImage<'a>> {
    let data = payload.bytes;
    let start = payload.start_offset;
    if data.len() < FIRST_CHUNK_OFFSET {
        warnings.push(Warning::PayloadTooShort { payload: start });
        return None;
    }

    let mut dimension = Dimension::default();
    dimension
        .0
        .copy_from_slice(&data[HEADER_UNKNOWN_LEN..FIRST_CHUNK_OFFSET]);
    let mut image = DecomposedImage {
        start_offset: start,
        header_unknown: Some(&data[..HEADER_UNKNOWN_LEN]),
        dimension,
        ..Default::default()
    };

    let mut phase = Phase::Start;
    let mut has_image = false;
    let mut r = SliceReader::at(data, FIRST_CHUNK_OFFSET);

    while r.remaining() > 0 {
        let pos = r.position();
        let offset = payload.data_offset + pos;

        let (Ok(fourcc), Ok(len)) = (r.read_fourcc(), r.read_u32_le()) else {
            warnings.push(Warning::ChunkHeaderTruncated {
                payload: start,
                offset,
            });
            break;
        };

        // A length that cannot be padded within usize can never fit the payload.
        let body = usize::try_from(len)
            .ok()
            .and_then(|len| len.checked_add(len & 1));
        let Some(Ok(body_bytes)) = body.map(|body| r.take_slice(body)) else {
            warnings.push(Warning::ChunkTruncated {
                payload: start,
                offset,
            });
            break;
        };
        let end = pos + CHUNK_HEADER_SIZE + body_bytes.len();
        let Some(chunk) = Chunk::new(&data[pos..end]) else {
            break;
        };

        match transition(phase, image.anim.is_some(), fourcc) {
            Transition::Accept {
                next,
                slot,
                is_image,
            } => {
                log::trace!("0x{offset:x}: {fourcc} accepted, phase {phase} -> {next}");
                match slot {
                    Slot::Iccp => image.iccp = Some(chunk),
                    Slot::Anim => image.anim = Some(chunk),
                    Slot::ImageData => image.image_data.push(chunk),
                    Slot::Unknown => image.unknown.push(chunk),
                }
                phase = next;
                has_image |= is_image;
            }
            Transition::Reject(rejection) => {
                warnings.push(match rejection {
                    Rejection::OutOfOrder => Warning::OutOfOrder {
                        payload: start,
                        offset,
                        fourcc,
                        after: phase,
                    },
                    Rejection::ForbiddenInAnimation => Warning::ForbiddenInAnimation {
                        payload: start,
                        offset,
                        fourcc,
                    },
                    Rejection::FrameWithoutAnimation => Warning::FrameWithoutAnimation {
                        payload: start,
                        offset,
                    },
                });
            }
        }
    }

    if !has_image {
        warnings.push(Warning::NoImageData { payload: start });
        return None;
    }
    log::debug!(
        "image at 0x{start:x}: {}x{} (as stored), {} image chunk(s), {} unknown",
        image.dimension.width(),
        image.dimension.height(),
        image.image_data.len(),
        image.unknown.len()
    );
    Some(image)
}
