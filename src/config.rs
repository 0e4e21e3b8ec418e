//! Extraction settings.
//!
//! Settings arrive unvalidated from the caller (a CLI, a form). Range checks
//! happen in [`ExtractConfig::resolve`]; an unusable animation setting never
//! fails the run, it switches the output to a ZIP archive with a warning.
//!
//! # Example
//!
//! ```rust
//! use zenwebp_extract::{ExtractConfig, LoopCount};
//!
//! let config = ExtractConfig::animation()
//!     .with_loop_count(LoopCount::Times(3))
//!     .with_frame_delays(500, 100, 2000);
//! ```

use core::fmt;
use core::str::FromStr;
use thiserror::Error;

use crate::decompose::DecomposedImage;
use crate::mux::{AnimationParams, FrameTiming, MAX_FRAME_DURATION_MS};
use crate::warning::{FramePosition, Warning, Warnings};
use crate::zip::DosDateTime;

/// Requested output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// One animated WebP with every image as a frame.
    Animation,
    /// A ZIP archive with one WebP per image.
    #[default]
    Archive,
}

/// Requested animation loop count, before range checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopCount {
    /// The animation loops forever.
    #[default]
    Forever,
    /// The animation plays this many times; valid values are `1..=65535`.
    Times(i64),
}

impl LoopCount {
    /// The value for the `ANIM` chunk, or `None` if out of range.
    pub fn to_anim_field(self) -> Option<u16> {
        match self {
            LoopCount::Forever => Some(0),
            LoopCount::Times(n) if n >= 1 => u16::try_from(n).ok(),
            LoopCount::Times(_) => None,
        }
    }
}

impl fmt::Display for LoopCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopCount::Forever => f.write_str("infinite"),
            LoopCount::Times(n) => write!(f, "{} time{}", n, if *n == 1 { "" } else { "s" }),
        }
    }
}

/// Error parsing a [`LoopCount`] from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("loop count must be an integer or \"infinite\", got {0:?}")]
pub struct ParseLoopCountError(alloc::string::String);

impl FromStr for LoopCount {
    type Err = ParseLoopCountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("infinite") {
            return Ok(LoopCount::Forever);
        }
        s.parse::<i64>()
            .map(LoopCount::Times)
            .map_err(|_| ParseLoopCountError(s.into()))
    }
}

/// Settings for one extraction run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct ExtractConfig {
    /// Requested output format. Default: archive.
    pub output_mode: OutputMode,
    /// Animation loop count. Default: forever.
    pub loop_count: LoopCount,
    /// Delay of the first animation frame in ms. Default: 100.
    pub first_frame_delay_ms: i64,
    /// Delay of middle animation frames in ms. Default: 100.
    pub middle_frame_delay_ms: i64,
    /// Delay of the last animation frame in ms. Default: 100.
    pub last_frame_delay_ms: i64,
    /// Timestamp for every ZIP entry. Default: `None`, meaning the local
    /// time at the start of the run (or the DOS epoch without `std`).
    pub archive_timestamp: Option<DosDateTime>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractConfig {
    /// Archive output with default animation settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            output_mode: OutputMode::Archive,
            loop_count: LoopCount::Forever,
            first_frame_delay_ms: 100,
            middle_frame_delay_ms: 100,
            last_frame_delay_ms: 100,
            archive_timestamp: None,
        }
    }

    /// Animated WebP output with default animation settings.
    #[must_use]
    pub fn animation() -> Self {
        Self::new().with_output_mode(OutputMode::Animation)
    }

    /// Set the output format.
    #[must_use]
    pub fn with_output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }

    /// Set the animation loop count.
    #[must_use]
    pub fn with_loop_count(mut self, loop_count: LoopCount) -> Self {
        self.loop_count = loop_count;
        self
    }

    /// Set the first, middle and last frame delays in milliseconds.
    #[must_use]
    pub fn with_frame_delays(mut self, first_ms: i64, middle_ms: i64, last_ms: i64) -> Self {
        self.first_frame_delay_ms = first_ms;
        self.middle_frame_delay_ms = middle_ms;
        self.last_frame_delay_ms = last_ms;
        self
    }

    /// Fix the timestamp written into ZIP headers.
    #[must_use]
    pub fn with_archive_timestamp(mut self, timestamp: DosDateTime) -> Self {
        self.archive_timestamp = Some(timestamp);
        self
    }

    /// Timestamp for ZIP entries, computed once per call.
    pub fn resolve_timestamp(&self) -> DosDateTime {
        match self.archive_timestamp {
            Some(t) => t,
            #[cfg(feature = "std")]
            None => DosDateTime::now(),
            #[cfg(not(feature = "std"))]
            None => DosDateTime::EPOCH,
        }
    }

    /// Decide the effective output for `images`.
    ///
    /// Animation output is demoted to an archive when any image is itself
    /// animated, the loop count is outside `1..=65535`, or a delay is outside
    /// `0..=16777215`. Every failed check records a warning.
    pub fn resolve(&self, images: &[DecomposedImage<'_>], warnings: &mut Warnings) -> ResolvedMode {
        if self.output_mode == OutputMode::Archive {
            return ResolvedMode::Archive;
        }

        let mut ok = true;
        if images.iter().any(|img| img.anim.is_some()) {
            warnings.push(Warning::NestedAnimation);
            ok = false;
        }

        let loop_count = self.loop_count.to_anim_field();
        if loop_count.is_none() {
            if let LoopCount::Times(value) = self.loop_count {
                warnings.push(Warning::InvalidLoopCount { value });
            }
            ok = false;
        }

        let mut delay = |position, value: i64| {
            let checked = u32::try_from(value)
                .ok()
                .filter(|&ms| ms <= MAX_FRAME_DURATION_MS);
            if checked.is_none() {
                warnings.push(Warning::InvalidFrameDelay { position, value });
            }
            checked
        };
        let first = delay(FramePosition::First, self.first_frame_delay_ms);
        let middle = delay(FramePosition::Middle, self.middle_frame_delay_ms);
        let last = delay(FramePosition::Last, self.last_frame_delay_ms);

        match (ok, loop_count, first, middle, last) {
            (true, Some(loop_count), Some(first_ms), Some(middle_ms), Some(last_ms)) => {
                ResolvedMode::Animation(AnimationParams {
                    loop_count,
                    timing: FrameTiming {
                        first_ms,
                        middle_ms,
                        last_ms,
                    },
                })
            }
            _ => ResolvedMode::Archive,
        }
    }
}

/// Output format after validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedMode {
    /// Build one animated WebP with these parameters.
    Animation(AnimationParams),
    /// Build a ZIP archive.
    Archive,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::riff::{wrap_chunk, Chunk, FourCC};
    use alloc::vec;

    #[test]
    fn test_archive_mode_skips_checks() {
        let config = ExtractConfig::new().with_frame_delays(-1, -1, -1);
        let mut warnings = Warnings::new();
        assert_eq!(config.resolve(&[], &mut warnings), ResolvedMode::Archive);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_valid_animation() {
        let config = ExtractConfig::animation()
            .with_loop_count(LoopCount::Times(0xFFFF))
            .with_frame_delays(0, 10, 0xFF_FFFF);
        let mut warnings = Warnings::new();
        let mode = config.resolve(&[], &mut warnings);
        assert!(warnings.is_empty());
        assert_eq!(
            mode,
            ResolvedMode::Animation(AnimationParams {
                loop_count: 0xFFFF,
                timing: FrameTiming {
                    first_ms: 0,
                    middle_ms: 10,
                    last_ms: 0xFF_FFFF,
                },
            })
        );
    }

    #[test]
    fn test_every_bad_setting_warns() {
        let config = ExtractConfig::animation()
            .with_loop_count(LoopCount::Times(0))
            .with_frame_delays(-5, 100, 0x100_0000);
        let mut warnings = Warnings::new();
        assert_eq!(config.resolve(&[], &mut warnings), ResolvedMode::Archive);
        assert_eq!(
            warnings.into_vec(),
            vec![
                Warning::InvalidLoopCount { value: 0 },
                Warning::InvalidFrameDelay {
                    position: FramePosition::First,
                    value: -5
                },
                Warning::InvalidFrameDelay {
                    position: FramePosition::Last,
                    value: 0x100_0000
                },
            ]
        );
    }

    #[test]
    fn test_nested_animation_demotes() {
        let anim = wrap_chunk(FourCC::ANIM, &[0; 6]);
        let images = [
            DecomposedImage::default(),
            DecomposedImage {
                anim: Chunk::new(&anim),
                ..Default::default()
            },
            DecomposedImage {
                anim: Chunk::new(&anim),
                ..Default::default()
            },
        ];
        let mut warnings = Warnings::new();
        let mode = ExtractConfig::animation().resolve(&images, &mut warnings);
        assert_eq!(mode, ResolvedMode::Archive);
        assert_eq!(warnings.into_vec(), vec![Warning::NestedAnimation]);
    }

    #[test]
    fn test_loop_count_parsing() {
        assert_eq!("infinite".parse::<LoopCount>(), Ok(LoopCount::Forever));
        assert_eq!(" 7 ".parse::<LoopCount>(), Ok(LoopCount::Times(7)));
        assert_eq!("-2".parse::<LoopCount>(), Ok(LoopCount::Times(-2)));
        assert!("often".parse::<LoopCount>().is_err());
        assert_eq!(LoopCount::Times(65_536).to_anim_field(), None);
        assert_eq!(LoopCount::Forever.to_anim_field(), Some(0));
    }
}
