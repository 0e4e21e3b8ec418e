//! Recoverable diagnostics collected during one extraction run.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use crate::decompose::Phase;
use crate::riff::FourCC;

/// Which animation frame delay setting a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePosition {
    /// The first frame.
    First,
    /// Every frame between the first and the last.
    Middle,
    /// The last frame.
    Last,
}

impl fmt::Display for FramePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FramePosition::First => "first",
            FramePosition::Middle => "middle",
            FramePosition::Last => "last",
        })
    }
}

/// A condition that was worked around instead of aborting the run.
///
/// Offsets are absolute positions in the input buffer. `payload` is the
/// offset of the payload's marker.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Warning {
    /// A payload's declared size runs past the end of the input; it was cut short.
    PayloadTruncated {
        /// Marker offset.
        payload: usize,
    },
    /// Bytes after the last payload do not start with a recognized marker.
    TrailingData {
        /// Offset of the first ignored byte.
        offset: usize,
    },
    /// A payload is too short to hold its header and dimensions.
    PayloadTooShort {
        /// Marker offset.
        payload: usize,
    },
    /// Fewer than eight bytes remain for a chunk header.
    ChunkHeaderTruncated {
        /// Marker offset.
        payload: usize,
        /// Offset of the partial header.
        offset: usize,
    },
    /// A chunk's declared length runs past the end of its payload.
    ChunkTruncated {
        /// Marker offset.
        payload: usize,
        /// Offset of the chunk header.
        offset: usize,
    },
    /// A known chunk appeared after a chunk that must follow it.
    OutOfOrder {
        /// Marker offset.
        payload: usize,
        /// Offset of the chunk header.
        offset: usize,
        /// The discarded chunk's tag.
        fourcc: FourCC,
        /// The phase already reached.
        after: Phase,
    },
    /// A bare `ALPH`/`VP8 `/`VP8L` chunk in a payload that has an `ANIM` chunk.
    ForbiddenInAnimation {
        /// Marker offset.
        payload: usize,
        /// Offset of the chunk header.
        offset: usize,
        /// The discarded chunk's tag.
        fourcc: FourCC,
    },
    /// An `ANMF` chunk in a payload without an `ANIM` chunk.
    FrameWithoutAnimation {
        /// Marker offset.
        payload: usize,
        /// Offset of the chunk header.
        offset: usize,
    },
    /// A payload had no `VP8 `, `VP8L` or `ANMF` chunk and was dropped.
    NoImageData {
        /// Marker offset.
        payload: usize,
    },
    /// Animation output was requested, but an image is itself animated.
    NestedAnimation,
    /// The loop count is outside `1..=65535`.
    InvalidLoopCount {
        /// The rejected value.
        value: i64,
    },
    /// A frame delay is outside `0..=16777215` ms.
    InvalidFrameDelay {
        /// Which delay setting was rejected.
        position: FramePosition,
        /// The rejected value.
        value: i64,
    },
}

impl Warning {
    /// Whether this warning switched the output from animation to archive.
    pub fn demotes_animation(&self) -> bool {
        matches!(
            self,
            Warning::NestedAnimation
                | Warning::InvalidLoopCount { .. }
                | Warning::InvalidFrameDelay { .. }
        )
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::PayloadTruncated { payload } => {
                write!(f, "Unexpected end of file in data from 0x{payload:x}")
            }
            Warning::TrailingData { offset } => {
                write!(f, "Ignoring invalid data from 0x{offset:x}")
            }
            Warning::PayloadTooShort { payload } => {
                write!(f, "Data from 0x{payload:x} is too short; ignored")
            }
            Warning::ChunkHeaderTruncated { payload, offset } => write!(
                f,
                "In data from 0x{payload:x}, data at 0x{offset:x} is too short for a chunk; ignored"
            ),
            Warning::ChunkTruncated { payload, offset } => write!(
                f,
                "In data from 0x{payload:x}, chunk at 0x{offset:x} ends unexpectedly; ignored"
            ),
            Warning::OutOfOrder {
                payload,
                offset,
                fourcc,
                after,
            } => write!(
                f,
                "In data from 0x{payload:x}, {} chunk at 0x{offset:x} follows a {after} chunk; ignored",
                tag_name(*fourcc)
            ),
            Warning::ForbiddenInAnimation {
                payload,
                offset,
                fourcc,
            } => write!(
                f,
                "In data from 0x{payload:x}, {} chunk at 0x{offset:x} is not allowed with an ANIM chunk; ignored",
                tag_name(*fourcc)
            ),
            Warning::FrameWithoutAnimation { payload, offset } => write!(
                f,
                "In data from 0x{payload:x}, ANMF chunk at 0x{offset:x} has no ANIM chunk; ignored"
            ),
            Warning::NoImageData { payload } => {
                write!(f, "No image data found in data from 0x{payload:x}; ignored")
            }
            Warning::NestedAnimation => f.write_str(
                "An animation cannot contain animated images; switching to ZIP output",
            ),
            Warning::InvalidLoopCount { value } => write!(
                f,
                "Invalid loop count {value}; switching to ZIP output"
            ),
            Warning::InvalidFrameDelay { position, value } => write!(
                f,
                "Invalid {position} frame delay {value}; switching to ZIP output"
            ),
        }
    }
}

/// Tag as shown in messages: `XMP ` reads as `XMP`.
fn tag_name(fourcc: FourCC) -> String {
    let name = fourcc.to_string();
    name.trim_end().to_string()
}

/// Per-run warning collector, threaded `&mut` through every stage.
#[derive(Debug, Default, Clone)]
pub struct Warnings {
    items: Vec<Warning>,
}

impl Warnings {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning.
    pub fn push(&mut self, warning: Warning) {
        log::debug!("{warning}");
        self.items.push(warning);
    }

    /// Number of warnings recorded.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no warnings were recorded.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate warnings in the order they were recorded.
    pub fn iter(&self) -> core::slice::Iter<'_, Warning> {
        self.items.iter()
    }

    /// Consume the collector, returning the recorded warnings.
    pub fn into_vec(self) -> Vec<Warning> {
        self.items
    }
}

impl<'a> IntoIterator for &'a Warnings {
    type Item = &'a Warning;
    type IntoIter = core::slice::Iter<'a, Warning>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
