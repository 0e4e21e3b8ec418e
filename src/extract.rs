//! End-to-end extraction: locate, decompose, then assemble the output.

use alloc::string::String;
use alloc::vec::Vec;

use crate::config::{ExtractConfig, ResolvedMode};
use crate::decompose::decompose_all;
use crate::error::ExtractError;
use crate::locate::locate_payloads;
use crate::mux::{assemble_animation, assemble_webp};
use crate::warning::{Warning, Warnings};
use crate::zip::{build_zip, entry_name, ZipEntry};

/// File format of an extraction's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// A single (animated) WebP file.
    WebP,
    /// A ZIP archive of WebP files.
    Zip,
}

impl OutputKind {
    /// MIME type of the output.
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputKind::WebP => "image/webp",
            OutputKind::Zip => "application/zip",
        }
    }

    /// File extension of the output, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputKind::WebP => "webp",
            OutputKind::Zip => "zip",
        }
    }
}

/// The bytes produced by an extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// Every image as a frame of one animated WebP.
    Animation {
        /// The animated WebP file.
        webp: Vec<u8>,
    },
    /// One WebP per image, packed in a ZIP archive.
    Archive {
        /// The ZIP file.
        zip: Vec<u8>,
        /// The archived WebP files, in archive order.
        images: Vec<Vec<u8>>,
    },
}

impl Output {
    /// Output file format.
    pub fn kind(&self) -> OutputKind {
        match self {
            Output::Animation { .. } => OutputKind::WebP,
            Output::Archive { .. } => OutputKind::Zip,
        }
    }

    /// The output file contents.
    pub fn bytes(&self) -> &[u8] {
        match self {
            Output::Animation { webp } => webp,
            Output::Archive { zip, .. } => zip,
        }
    }

    /// Individually viewable WebP files: the animation itself, or each
    /// archived image.
    pub fn previews(&self) -> Vec<&[u8]> {
        match self {
            Output::Animation { webp } => alloc::vec![webp.as_slice()],
            Output::Archive { images, .. } => images.iter().map(Vec::as_slice).collect(),
        }
    }
}

/// Result of a successful extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// The produced file.
    pub output: Output,
    /// Number of images recovered.
    pub image_count: usize,
    /// Recoverable problems, in the order they were found.
    pub warnings: Vec<Warning>,
}

/// Recover the WebP images embedded in `data`.
///
/// # Errors
///
/// [`ExtractError::NoWebPChunkFound`] or [`ExtractError::NoMarkerFound`] when
/// no embedded image can be located at all. Everything else is reported
/// through [`Extraction::warnings`].
pub fn extract(data: &[u8], config: &ExtractConfig) -> Result<Extraction, ExtractError> {
    let mut warnings = Warnings::new();

    let payloads = locate_payloads(data, &mut warnings)?;
    let images = decompose_all(&payloads, &mut warnings);
    log::info!(
        "recovered {} image(s) from {} payload(s)",
        images.len(),
        payloads.len()
    );

    let output = match config.resolve(&images, &mut warnings) {
        ResolvedMode::Animation(params) => {
            log::info!("writing animated WebP");
            Output::Animation {
                webp: assemble_animation(&images, &params),
            }
        }
        ResolvedMode::Archive => {
            if warnings.iter().any(Warning::demotes_animation) {
                log::info!("animation settings rejected; writing ZIP archive instead");
            } else {
                log::info!("writing ZIP archive");
            }
            let webps: Vec<Vec<u8>> = images.iter().map(assemble_webp).collect();
            let entries: Vec<ZipEntry<'_>> = webps
                .iter()
                .enumerate()
                .map(|(i, webp)| ZipEntry::new(entry_name(i), webp))
                .collect();
            let zip = build_zip(&entries, config.resolve_timestamp());
            Output::Archive { zip, images: webps }
        }
    };

    Ok(Extraction {
        output,
        image_count: images.len(),
        warnings: warnings.into_vec(),
    })
}

/// Read `path` and recover the WebP images embedded in it.
///
/// # Errors
///
/// [`ExtractError::Io`] if the file cannot be read, otherwise as [`extract`].
#[cfg(feature = "std")]
pub fn extract_file(
    path: impl AsRef<std::path::Path>,
    config: &ExtractConfig,
) -> Result<Extraction, ExtractError> {
    let data = std::fs::read(path)?;
    extract(&data, config)
}

/// Name for the output file derived from the input's name.
///
/// The last extension is replaced when at least one character precedes its
/// dot (`movie.webm` → `movie.zip`); otherwise the new extension is
/// appended (`.webm` → `.webm.zip`).
pub fn output_file_name(input_name: &str, kind: OutputKind) -> String {
    let stem = match input_name.rfind('.') {
        Some(dot) if dot > 0 => &input_name[..dot],
        _ => input_name,
    };
    alloc::format!("{stem}.{}", kind.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name("movie.webm", OutputKind::Zip), "movie.zip");
        assert_eq!(output_file_name("a.b.webm", OutputKind::WebP), "a.b.webp");
        assert_eq!(output_file_name("noext", OutputKind::Zip), "noext.zip");
        assert_eq!(output_file_name(".webm", OutputKind::Zip), ".webm.zip");
        assert_eq!(output_file_name("trailing.", OutputKind::WebP), "trailing.webp");
        assert_eq!(output_file_name("", OutputKind::Zip), ".zip");
    }

    #[test]
    fn test_output_kind_metadata() {
        assert_eq!(OutputKind::WebP.mime_type(), "image/webp");
        assert_eq!(OutputKind::Zip.mime_type(), "application/zip");
    }
}
