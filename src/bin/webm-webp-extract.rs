// src/bin/webm-webp-extract.rs

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

use zenwebp_extract::{
    entry_name, extract_file, output_file_name, ExtractConfig, LoopCount, OutputKind, OutputMode,
};

/// Extract the WebP images embedded in a WebM file.
///
/// Writes a ZIP archive of WebP files by default, or one animated WebP with
/// `--animation`. Settings the animation cannot use fall back to the archive.
#[derive(Parser, Debug)]
#[command(name = "webm-webp-extract", author, version, about, long_about = None)]
struct Cli {
    /// The WebM file to read
    input: PathBuf,

    /// Write one animated WebP instead of a ZIP archive
    #[arg(short, long)]
    animation: bool,

    /// Animation loop count: "infinite" or 1-65535
    #[arg(long = "loop", default_value = "infinite", allow_hyphen_values = true)]
    loop_count: LoopCount,

    /// Delay of the first frame in milliseconds
    #[arg(long, default_value_t = 100, allow_negative_numbers = true)]
    first_delay: i64,

    /// Delay of middle frames in milliseconds
    #[arg(long, default_value_t = 100, allow_negative_numbers = true)]
    middle_delay: i64,

    /// Delay of the last frame in milliseconds
    #[arg(long, default_value_t = 100, allow_negative_numbers = true)]
    last_delay: i64,

    /// Output file; defaults to the input name with a .webp or .zip extension
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write each individual WebP into this folder
    #[arg(long)]
    previews: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let mode = if cli.animation {
        OutputMode::Animation
    } else {
        OutputMode::Archive
    };
    let config = ExtractConfig::new()
        .with_output_mode(mode)
        .with_loop_count(cli.loop_count)
        .with_frame_delays(cli.first_delay, cli.middle_delay, cli.last_delay);

    let extraction = extract_file(&cli.input, &config)
        .with_context(|| format!("extracting {}", cli.input.display()))?;

    for warning in &extraction.warnings {
        log::warn!("{warning}");
    }

    let kind = extraction.output.kind();
    let output = match cli.output {
        Some(path) => path,
        None => default_output_path(&cli.input, kind),
    };
    fs::write(&output, extraction.output.bytes())
        .with_context(|| format!("writing {}", output.display()))?;

    if let Some(dir) = &cli.previews {
        write_previews(dir, &extraction.output.previews())?;
    }

    println!(
        "{} image(s), {} warning(s) -> {} ({})",
        extraction.image_count,
        extraction.warnings.len(),
        output.display(),
        kind.mime_type()
    );
    Ok(())
}

fn default_output_path(input: &Path, kind: OutputKind) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(output_file_name(&name, kind))
}

fn write_previews(dir: &Path, previews: &[&[u8]]) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    for (index, webp) in previews.iter().enumerate() {
        let path = dir.join(entry_name(index));
        fs::write(&path, webp).with_context(|| format!("writing {}", path.display()))?;
    }
    log::info!("wrote {} preview(s) to {}", previews.len(), dir.display());
    Ok(())
}
