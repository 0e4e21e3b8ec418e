//! Recovery of WebP images embedded in WebM containers
//!
//! Some tools store still WebP images inside a WebM (Matroska) stream as
//! block elements: a `0xA3` marker, a size class byte, a big-endian size, and
//! then the image's RIFF chunks without the `RIFF`/`WEBP`/`VP8X` preamble.
//! This crate finds those payloads, splits them into chunks, and re-emits
//! them either as one animated WebP or as a ZIP archive of standalone WebPs.
//!
//! No bitstream is ever decoded: chunk bytes are copied verbatim.
//!
//! # Features
//!
//! - `std` (default): file helpers and local-time ZIP timestamps.
//! - `cli` (default): the `webm-webp-extract` command-line tool.
//!
//! # no_std Support
//!
//! The extraction pipeline runs in `no_std` environments (requires `alloc`):
//! ```toml
//! [dependencies]
//! zenwebp-extract = { version = "...", default-features = false }
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use zenwebp_extract::{extract, ExtractConfig, LoopCount};
//!
//! let webm: &[u8] = &[]; // your WebM data
//! let config = ExtractConfig::animation()
//!     .with_loop_count(LoopCount::Forever)
//!     .with_frame_delays(1000, 100, 1000);
//! let extraction = extract(webm, &config)?;
//! for warning in &extraction.warnings {
//!     eprintln!("warning: {warning}");
//! }
//! let bytes = extraction.output.bytes();
//! # Ok::<(), zenwebp_extract::ExtractError>(())
//! ```
//!
//! Extraction is lenient. Only a container with no recognizable payload at
//! all is an error; truncated or disordered data yields [`Warning`]s and a
//! best-effort result.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

extern crate alloc;

pub mod config;
pub mod crc32;
pub mod decompose;
mod error;
mod extract;
pub mod locate;
pub mod mux;
pub mod riff;
pub mod warning;
pub mod zip;

// Byte-level helpers shared by the parsers and writers
mod slice_reader;
mod vec_writer;

pub use config::{ExtractConfig, LoopCount, OutputMode, ParseLoopCountError, ResolvedMode};
pub use decompose::{decompose_all, decompose_payload, DecomposedImage, Dimension, Phase};
pub use error::ExtractError;
#[cfg(feature = "std")]
pub use extract::extract_file;
pub use extract::{extract, output_file_name, Extraction, Output, OutputKind};
pub use locate::{locate_payloads, RawPayload};
pub use mux::{assemble_animation, assemble_webp, AnimationParams, FrameTiming};
pub use riff::{Chunk, FourCC};
pub use warning::{FramePosition, Warning, Warnings};
pub use zip::{build_zip, entry_name, DosDateTime, ZipEntry};
