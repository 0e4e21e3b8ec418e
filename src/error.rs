//! Fatal errors that abort an extraction run.

use thiserror::Error;

/// Errors that stop an extraction before any output is built.
///
/// Everything else (truncated data, misplaced chunks, unusable settings) is
/// reported as a [`Warning`](crate::Warning) and does not fail the run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExtractError {
    /// The input contains none of the chunk tags that start an embedded image.
    #[error("No WebP chunk found")]
    NoWebPChunkFound,

    /// A WebP chunk was found, but the payload marker (`A3 20` / `A3 10`)
    /// that should precede it is missing.
    #[error("No A3 20/A3 10 marker before the first WebP chunk at 0x{chunk_offset:x}")]
    NoMarkerFound {
        /// Offset of the first recognized chunk tag.
        chunk_offset: usize,
    },

    /// The input file could not be read.
    #[cfg(feature = "std")]
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),
}
