//! WebP container muxing.
//!
//! - [`assemble_webp`] writes one decomposed image as an extended-format
//!   WebP file.
//! - [`assemble_animation`] merges many decomposed images into one animated
//!   WebP, one `ANMF` frame per image.
//!
//! Both work in `no_std + alloc` environments.

mod anim;
mod assemble;

pub use anim::{
    assemble_animation, build_frame, AnimationParams, FrameTiming, FRAME_HEADER_LEN,
    MAX_FRAME_DURATION_MS,
};
pub use assemble::{
    assemble_webp, has_alpha, vp8x_flags, FLAG_ALPHA, FLAG_ANIMATION, FLAG_EXIF, FLAG_ICC,
    FLAG_XMP,
};
