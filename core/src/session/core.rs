// Stable public API: one-shot encode/decode over memory and the streaming forms.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::{
    config::{ConfigError, Configuration},
    constants::{INFLIGHT_MEM_FRACTION, MAX_INFLIGHT_FRAMES, METADATA_DIVISIONS},
    framing::RenderedFrame,
    headers::Metadata,
    session::{
        io::{open_input, open_output, FrameSink, FrameSource, InputSource, MemoryFrames, OutputSink},
        parallelism::ParallelismProfile,
        pipeline::{run_decode_pipeline, run_encode_pipeline, DecodeOptions, DecodeReport},
    },
    sniff::{ContentSniffer, SignatureSniffer},
    telemetry::TelemetrySnapshot,
    types::ArchiveError,
};

#[derive(Clone, Debug)]
pub struct EncodeParams {
    pub config: Configuration,
    /// Written as frame 0 when set.
    pub metadata: Option<Metadata>,
    /// `None` sizes the pool from the host.
    pub profile: Option<ParallelismProfile>,
}

impl EncodeParams {
    pub fn new(config: Configuration) -> Self {
        Self { config, metadata: None, profile: None }
    }

    pub fn with_metadata(mut self, filename: &str, extension: &str) -> Self {
        self.metadata = Some(Metadata::new(self.config.divisions(), filename, extension));
        self
    }

    pub fn with_profile(mut self, profile: ParallelismProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn validate(&self) -> Result<(), ArchiveError> {
        if let Some(meta) = &self.metadata {
            if !self.config.supports_metadata() {
                return Err(ConfigError::NotDivisible {
                    frame_size: self.config.frame_size(),
                    divisions: METADATA_DIVISIONS,
                }
                .into());
            }
            if meta.divisions != self.config.divisions() {
                return Err(ArchiveError::Validation(format!(
                    "metadata records {} divisions but frames use {}",
                    meta.divisions,
                    self.config.divisions()
                )));
            }
            meta.validate()?;
        }
        if let Some(profile) = &self.profile {
            profile.validate()?;
        }
        Ok(())
    }

    fn resolve_profile(&self) -> ParallelismProfile {
        self.profile.unwrap_or_else(|| {
            ParallelismProfile::dynamic(self.config.frame_len(), INFLIGHT_MEM_FRACTION, MAX_INFLIGHT_FRAMES)
        })
    }
}

#[derive(Clone)]
pub struct DecodeParams {
    /// Frame size is authoritative; divisions are replaced by what frame 0 reports.
    pub config: Configuration,
    /// Parse frame 0 strictly as metadata instead of running the heuristic.
    pub expect_metadata: bool,
    /// Check every data frame for block homogeneity before sampling.
    pub verify_blocks: bool,
    pub sniffer: Arc<dyn ContentSniffer>,
}

impl fmt::Debug for DecodeParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeParams")
            .field("config", &self.config)
            .field("expect_metadata", &self.expect_metadata)
            .field("verify_blocks", &self.verify_blocks)
            .finish_non_exhaustive()
    }
}

impl DecodeParams {
    pub fn new(config: Configuration, expect_metadata: bool) -> Self {
        Self {
            config,
            expect_metadata,
            verify_blocks: false,
            sniffer: Arc::new(SignatureSniffer),
        }
    }

    pub fn with_sniffer(mut self, sniffer: Arc<dyn ContentSniffer>) -> Self {
        self.sniffer = sniffer;
        self
    }

    pub fn with_block_verification(mut self, verify: bool) -> Self {
        self.verify_blocks = verify;
        self
    }

    pub fn validate(&self) -> Result<(), ArchiveError> {
        if self.expect_metadata && !self.config.supports_metadata() {
            return Err(ConfigError::NotDivisible {
                frame_size: self.config.frame_size(),
                divisions: METADATA_DIVISIONS,
            }
            .into());
        }
        Ok(())
    }

    fn options(&self) -> DecodeOptions<'_> {
        DecodeOptions {
            expect_metadata: self.expect_metadata,
            verify_blocks: self.verify_blocks,
            sniffer: self.sniffer.as_ref(),
        }
    }
}

/// Payload and names recovered by `decode`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedArchive {
    /// Includes the zero padding of the last grid.
    pub bytes: Vec<u8>,
    pub filename: Option<String>,
    pub extension: Option<String>,
    /// Division count the data frames were decoded with.
    pub divisions: u32,
}

/// Stream `input` into frames handed to `sink` in order.
pub fn encode_stream<S: FrameSink + ?Sized>(
    input: InputSource,
    sink: &mut S,
    params: &EncodeParams,
) -> Result<TelemetrySnapshot, ArchiveError> {
    params.validate()?;
    let reader = open_input(input)?;
    let profile = params.resolve_profile();
    run_encode_pipeline(reader, sink, &params.config, params.metadata.as_ref(), &profile)
}

/// Decode every frame of `source` into `output`.
///
/// With `OutputSink::Memory` the payload is returned in `DecodeReport::output`.
pub fn decode_stream<F: FrameSource>(
    source: F,
    output: OutputSink,
    params: &DecodeParams,
) -> Result<DecodeReport, ArchiveError> {
    params.validate()?;
    let (writer, maybe_buf) = open_output(output)?;

    let mut report = run_decode_pipeline(source, writer, &params.config, &params.options())?;

    if let Some(buf) = maybe_buf {
        let captured = buf
            .lock()
            .map_err(|_| ArchiveError::Pipeline("output buffer poisoned"))?
            .clone();
        report.attach_output(captured);
    }
    Ok(report)
}

/// Encode `input` into an ordered frame sequence, metadata frame first when
/// `emit_metadata` is set.
pub fn encode(
    input: &[u8],
    filename: &str,
    extension: &str,
    config: &Configuration,
    emit_metadata: bool,
) -> Result<Vec<RenderedFrame>, ArchiveError> {
    let mut params = EncodeParams::new(*config);
    if emit_metadata {
        params = params.with_metadata(filename, extension);
    }
    params.validate()?;

    let mut frames = Vec::new();
    let profile = params.resolve_profile();
    let snapshot = run_encode_pipeline(input, &mut frames, config, params.metadata.as_ref(), &profile)?;
    debug!(frames = snapshot.frames_total(), "in-memory encode finished");
    Ok(frames)
}

/// Decode an ordered frame sequence. Without metadata the first frame is
/// treated as data and the division count is detected from it.
pub fn decode(
    frames: Vec<RenderedFrame>,
    config: &Configuration,
    expect_metadata: bool,
) -> Result<DecodedArchive, ArchiveError> {
    let params = DecodeParams::new(*config, expect_metadata);
    params.validate()?;

    let mut bytes = Vec::new();
    let report = run_decode_pipeline(MemoryFrames::from(frames), &mut bytes, config, &params.options())?;

    Ok(DecodedArchive {
        bytes,
        filename: report.filename,
        extension: report.extension,
        divisions: report.config.divisions(),
    })
}
