//! mp4archive - store files as raw RGB frame streams for lossless video
//!
//! `encode` writes packed rgb24 frames that an external encoder can wrap, e.g.
//! `ffmpeg -f rawvideo -pix_fmt rgb24 -s 1080x1080 -i out.rgb -c:v ffv1 out.mkv`.
//! `decode` reads the same layout back.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};
use tempfile::NamedTempFile;
use tracing::{info, warn};

use mp4archive_core::constants::{
    DEFAULT_DIVISIONS, DEFAULT_FRAME_SIZE, INFLIGHT_MEM_FRACTION, MAX_INFLIGHT_FRAMES, RAW_FRAME_EXTENSION,
};
use mp4archive_core::headers::{decode_metadata, heuristic_detect, HeaderError};
use mp4archive_core::prelude::*;

const FALLBACK_STEM: &str = "decoded";
/// Stands in for name characters the metadata frame cannot store.
const NAME_PLACEHOLDER: char = '_';

#[derive(Parser)]
#[command(name = "mp4archive")]
#[command(about = "Store files as lossless RGB video frames and recover them")]
#[command(version)]
struct Cli {
    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Copy)]
struct Geometry {
    /// Frame width and height in pixels
    #[arg(long, default_value_t = DEFAULT_FRAME_SIZE)]
    frame_size: u32,

    /// Grid cells per frame side
    #[arg(long, default_value_t = DEFAULT_DIVISIONS)]
    divisions: u32,
}

impl Geometry {
    fn configuration(self) -> Result<Configuration> {
        Configuration::new(self.frame_size, self.divisions).context("invalid frame geometry")
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a file into a raw rgb24 frame stream
    Encode {
        /// File to encode
        input: PathBuf,

        /// Output frame file (default: <input stem>.rgb)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        geometry: Geometry,

        /// Skip the leading metadata frame
        #[arg(long)]
        no_metadata: bool,

        /// Render worker count (default: one per core, minus one)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Print session statistics as JSON
        #[arg(long)]
        stats: bool,
    },

    /// Decode a raw rgb24 frame stream back into a file
    Decode {
        /// Frame file to decode
        input: PathBuf,

        /// Output file, or a directory to name the file from its metadata
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        geometry: Geometry,

        /// Detect divisions from the first frame instead of reading metadata
        #[arg(long)]
        no_metadata: bool,

        /// Warn about frames whose blocks are not a single color
        #[arg(long)]
        verify_blocks: bool,

        /// Print session statistics as JSON
        #[arg(long)]
        stats: bool,
    },

    /// Describe the first frame of a raw rgb24 frame stream
    Inspect {
        /// Frame file to inspect
        input: PathBuf,

        /// Frame width and height in pixels
        #[arg(long, default_value_t = DEFAULT_FRAME_SIZE)]
        frame_size: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .init();

    match cli.command {
        Commands::Encode { input, output, geometry, no_metadata, workers, stats } => {
            let output = output.unwrap_or_else(|| input.with_extension(RAW_FRAME_EXTENSION));
            run_encode(&input, &output, geometry, !no_metadata, workers, stats)
        }
        Commands::Decode { input, output, geometry, no_metadata, verify_blocks, stats } => {
            run_decode(&input, &output, geometry, !no_metadata, verify_blocks, stats)
        }
        Commands::Inspect { input, frame_size } => {
            let summary = inspect_summary(&input, frame_size)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
    }
}


fn require_file(path: &Path) -> Result<()> {
    if !path.is_file() {
        bail!("input must be an existing file: {}", path.display());
    }
    Ok(())
}

/// Directory that holds the staged output next to its final path.
fn staging_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Replace characters the metadata frame cannot store.
fn storable_name(text: &str, field: &'static str) -> String {
    let stored: String = text
        .chars()
        .map(|ch| if matches!(u32::from(ch), 1..=255) { ch } else { NAME_PLACEHOLDER })
        .collect();
    if stored != text {
        warn!(field, original = text, stored = %stored, "name has characters metadata cannot store");
    }
    stored
}

/// Stem and extension of `input` as they will be recorded in the metadata frame.
fn archive_names(input: &Path) -> (String, String) {
    let stem = input.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    let ext = input.extension().map(|s| s.to_string_lossy()).unwrap_or_default();
    (storable_name(&stem, "filename"), storable_name(&ext, "extension"))
}

/// Final path component of `name`, or `None` if nothing usable is left.
fn safe_component(name: &str) -> Option<&str> {
    let base = Path::new(name).file_name()?.to_str()?;
    if base.contains(['/', '\\']) {
        return None;
    }
    Some(base)
}

/// File name for a decode into a directory. Names read from the archive never
/// leave that directory.
fn dir_output_name(file_name: Option<&str>, extension: Option<&str>) -> String {
    if let Some(name) = file_name {
        match safe_component(name) {
            Some(base) => {
                if base != name {
                    warn!(recorded = name, used = base, "stripped path from recorded file name");
                }
                return base.to_owned();
            }
            None => warn!(recorded = name, "recorded file name is not usable"),
        }
    }
    match extension.and_then(safe_component) {
        Some(ext) => format!("{FALLBACK_STEM}.{ext}"),
        None => FALLBACK_STEM.to_owned(),
    }
}

/// `output` with the sniffed extension appended when it has none of its own.
fn file_output_path(output: &Path, source: ExtensionSource, extension: Option<&str>) -> PathBuf {
    match (source, extension.and_then(safe_component)) {
        (ExtensionSource::Sniffed, Some(ext)) if output.extension().is_none() => output.with_extension(ext),
        _ => output.to_path_buf(),
    }
}

fn run_encode(
    input: &Path,
    output: &Path,
    geometry: Geometry,
    emit_metadata: bool,
    workers: Option<usize>,
    stats: bool,
) -> Result<()> {
    require_file(input)?;
    let config = geometry.configuration()?;

    let mut params = EncodeParams::new(config);
    if emit_metadata {
        let (stem, ext) = archive_names(input);
        params = params.with_metadata(&stem, &ext);
    }
    if let Some(workers) = workers {
        let base = ParallelismProfile::dynamic(config.frame_len(), INFLIGHT_MEM_FRACTION, MAX_INFLIGHT_FRAMES);
        params = params.with_profile(ParallelismProfile::new(workers, base.inflight_frames));
    }

    // Dropped, and so removed, on any error below.
    let mut staged = NamedTempFile::new_in(staging_dir(output))
        .with_context(|| format!("creating staging file for {}", output.display()))?;

    let (snapshot, frames) = {
        let mut sink = RawFrameWriter::new(BufWriter::new(staged.as_file_mut()));
        let snapshot = encode_stream(InputSource::File(input.to_path_buf()), &mut sink, &params)
            .with_context(|| format!("encoding {}", input.display()))?;
        (snapshot, sink.frames_written())
    };
    staged
        .persist(output)
        .with_context(|| format!("writing {}", output.display()))?;

    info!(frames, frame_size = config.frame_size(), output = %output.display(), "encoded");
    if stats {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }
    Ok(())
}

fn run_decode(
    input: &Path,
    output: &Path,
    geometry: Geometry,
    expect_metadata: bool,
    verify_blocks: bool,
    stats: bool,
) -> Result<()> {
    require_file(input)?;
    let config = geometry.configuration()?;

    let params = DecodeParams::new(config, expect_metadata)
        .with_block_verification(verify_blocks)
        .with_sniffer(Arc::new(SignatureSniffer));

    let into_dir = output.is_dir();
    let staging = if into_dir { output } else { staging_dir(output) };
    // Dropped, and so removed, on any error below.
    let staged = NamedTempFile::new_in(staging)
        .with_context(|| format!("creating staging file in {}", staging.display()))?;
    let writer = BufWriter::new(staged.as_file().try_clone()?);

    let file = File::open(input).with_context(|| format!("opening {}", input.display()))?;
    let source = RawFrameReader::new(BufReader::new(file), config.frame_size());

    let report = decode_stream(source, OutputSink::Writer(Box::new(writer)), &params).map_err(|e| {
        if e.is_format_mismatch() {
            warn!("first frame carries no metadata; retry with --no-metadata");
        }
        e
    });
    let report = report.with_context(|| format!("decoding {}", input.display()))?;

    let dest = if into_dir {
        output.join(dir_output_name(report.file_name().as_deref(), report.extension.as_deref()))
    } else {
        file_output_path(output, report.extension_source, report.extension.as_deref())
    };
    staged
        .persist(&dest)
        .with_context(|| format!("writing {}", dest.display()))?;

    info!(
        frames = report.telemetry.frames_total(),
        divisions = report.config.divisions(),
        output = %dest.display(),
        "decoded"
    );
    if stats {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

fn inspect_summary(input: &Path, frame_size: u32) -> Result<Value> {
    require_file(input)?;

    let file = File::open(input).with_context(|| format!("opening {}", input.display()))?;
    let mut source = RawFrameReader::new(BufReader::new(file), frame_size);
    let Some(frame) = source.read_frame()? else {
        bail!("{} holds no frames", input.display());
    };

    match decode_metadata(&frame) {
        Ok(metadata) => Ok(json!({ "frame_size": frame_size, "metadata": metadata })),
        // not a metadata frame, or a size a metadata frame cannot have
        Err(HeaderError::FormatMismatch { .. } | HeaderError::Config(_)) => {
            let detection = heuristic_detect(&frame).context("detecting divisions")?;
            Ok(json!({ "frame_size": frame_size, "detection": detection }))
        }
        Err(e) => Err(e).context("reading metadata frame"),
    }
}
