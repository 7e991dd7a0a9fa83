//! Pipeline wiring: the parallel encode pool and the sequential decoder.

use std::io::{Read, Write};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::bounded;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Configuration;
use crate::constants::SNIFF_HEAD_LEN;
use crate::framing::{sample, unpack_into, FrameError, RenderedFrame};
use crate::headers::{decode_metadata, encode_metadata, heuristic_detect, Detection, Metadata};
use crate::session::frame_worker::{RenderJob, RenderWorker, RenderedJob, WorkerError};
use crate::session::io::{read_exact_or_eof, FrameSink, FrameSource, HeadCapture, OrderedFrameWriter};
use crate::session::parallelism::ParallelismProfile;
use crate::sniff::ContentSniffer;
use crate::telemetry::{Stage, TelemetryCounters, TelemetrySnapshot, TelemetryTimer};
use crate::types::ArchiveError;

/// Where the reported extension came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtensionSource {
    Metadata,
    Sniffed,
    Unknown,
}

/// Everything a decode learned about the archive besides the payload itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodeReport {
    /// Geometry the data frames were actually decoded with.
    pub config: Configuration,
    pub metadata: Option<Metadata>,
    /// Present in heuristic mode only.
    pub detection: Option<Detection>,
    pub filename: Option<String>,
    pub extension: Option<String>,
    pub extension_source: ExtensionSource,
    pub telemetry: TelemetrySnapshot,
    /// Captured payload when decoding into `OutputSink::Memory`.
    #[serde(skip)]
    pub output: Option<Vec<u8>>,
}

impl DecodeReport {
    /// `filename.extension`, if both are known.
    pub fn file_name(&self) -> Option<String> {
        match (&self.filename, &self.extension) {
            (Some(name), Some(ext)) => Some(format!("{name}.{ext}")),
            (Some(name), None) => Some(name.clone()),
            _ => None,
        }
    }

    pub fn attach_output(&mut self, output: Vec<u8>) {
        self.output = Some(output);
    }
}

/// Knobs for `run_decode_pipeline` that do not change geometry.
pub struct DecodeOptions<'a> {
    pub expect_metadata: bool,
    pub verify_blocks: bool,
    pub sniffer: &'a dyn ContentSniffer,
}

// ============================================================
// Encode pipeline
// ============================================================

/// Chunk `reader` into grids, render them on a worker pool and hand frames
/// to `sink` in stream order. The metadata frame, if any, is written first.
pub fn run_encode_pipeline<R, S>(
    mut reader: R,
    sink: &mut S,
    config: &Configuration,
    metadata: Option<&Metadata>,
    profile: &ParallelismProfile,
) -> Result<TelemetrySnapshot, ArchiveError>
where
    R: Read + Send,
    S: FrameSink + ?Sized,
{
    profile.validate()?;

    let mut counters = TelemetryCounters::default();
    let mut timer = TelemetryTimer::new();
    info!(
        frame_size = config.frame_size(),
        divisions = config.divisions(),
        workers = profile.workers,
        inflight = profile.inflight_frames,
        metadata = metadata.is_some(),
        "start encode pipeline"
    );

    // ---- Metadata frame ----
    if let Some(meta) = metadata {
        let frame = timer
            .stage_times
            .measure(Stage::Render, || encode_metadata(meta, config.frame_size()))?;
        counters.add_metadata(frame.as_bytes().len());
        timer.stage_times.measure(Stage::Write, || sink.write_frame(frame))?;
        debug!(filename = %meta.filename, extension = %meta.extension, "metadata frame written");
    }

    let capacity = config.grid_capacity();

    let data_frames = thread::scope(|scope| -> Result<u64, ArchiveError> {
        // ---- Channels ----
        let (job_tx, job_rx) = bounded::<RenderJob>(profile.inflight_frames);
        let (out_tx, out_rx) = bounded::<Result<RenderedJob, WorkerError>>(profile.inflight_frames);

        // ---- Reader thread (chunker) ----
        let reader = &mut reader;
        let reader_handle = scope.spawn(move || -> Result<(u64, Duration), ArchiveError> {
            let mut index = 0u64;
            let mut read_time = Duration::ZERO;
            loop {
                let start = Instant::now();
                let chunk = read_exact_or_eof(reader, capacity)?;
                read_time += start.elapsed();
                if chunk.is_empty() {
                    break;
                }

                let last = chunk.len() < capacity;
                job_tx
                    .send(RenderJob::new(index, chunk))
                    .map_err(|_| ArchiveError::Pipeline("render job channel closed"))?;
                index += 1;
                if last {
                    break;
                }
            }
            debug!(jobs = index, "reader finished, closing job channel");
            Ok((index, read_time))
        });

        // ---- Workers ----
        for i in 0..profile.workers {
            let worker = RenderWorker::new(*config);
            let rx = job_rx.clone();
            let tx = out_tx.clone();
            scope.spawn(move || {
                debug!(worker = i, "render worker starting");
                worker.run(rx, tx);
                debug!(worker = i, "render worker finished");
            });
        }
        drop(job_rx);
        drop(out_tx);

        // ---- Ordered writer ----
        let mut ordered = OrderedFrameWriter::new(&mut *sink);
        for res in out_rx.iter() {
            let job = res?;
            counters.merge(&job.counters);
            timer.stage_times.merge(&job.stage_times);

            let start = Instant::now();
            ordered.push(job.index, job.frame)?;
            timer.add_stage_time(Stage::Write, start.elapsed());
        }

        let (dispatched, read_time) = reader_handle
            .join()
            .map_err(|_| ArchiveError::Pipeline("reader thread panicked"))??;
        timer.add_stage_time(Stage::Read, read_time);
        ordered.finish(dispatched)?;
        Ok(dispatched)
    })?;

    sink.finish()?;
    timer.finish();

    let snapshot = TelemetrySnapshot::from(&counters, &timer);
    info!(
        data_frames,
        frames = snapshot.frames_total(),
        payload = snapshot.bytes_payload,
        padding = snapshot.bytes_padding,
        "encode pipeline finished"
    );
    Ok(snapshot)
}

// ============================================================
// Decode pipeline
// ============================================================

/// Resolve geometry from the first frame, then sample and unpack every data
/// frame into `writer` in stream order.
///
/// `config.frame_size()` is authoritative for every frame. Its division count
/// is replaced by whatever the metadata frame or the heuristic reports.
pub fn run_decode_pipeline<F, W>(
    mut source: F,
    writer: W,
    config: &Configuration,
    options: &DecodeOptions<'_>,
) -> Result<DecodeReport, ArchiveError>
where
    F: FrameSource,
    W: Write,
{
    let mut counters = TelemetryCounters::default();
    let mut timer = TelemetryTimer::new();
    info!(
        frame_size = config.frame_size(),
        expect_metadata = options.expect_metadata,
        "start decode pipeline"
    );

    let first = timer
        .stage_times
        .measure(Stage::Read, || source.read_frame())?
        .ok_or_else(|| ArchiveError::Validation("frame stream is empty".into()))?;
    check_frame_size(&first, config)?;

    // ---- Resolve geometry ----
    let (metadata, detection) = if options.expect_metadata {
        let meta = timer.stage_times.measure(Stage::Detect, || decode_metadata(&first))?;
        (Some(meta), None)
    } else {
        let detection = timer.stage_times.measure(Stage::Detect, || heuristic_detect(&first))?;
        counters.add_ambiguous_runs(detection.ambiguous_runs.len());
        (detection.metadata.clone(), Some(detection))
    };

    let divisions = match (&metadata, &detection) {
        (Some(meta), _) => meta.divisions,
        (None, Some(detection)) => detection.divisions,
        (None, None) => config.divisions(),
    };
    let resolved = config.with_divisions(divisions)?;
    if resolved.divisions() != config.divisions() {
        info!(configured = config.divisions(), resolved = divisions, "division count overridden");
    }

    // ---- Data frames ----
    let mut out = HeadCapture::new(writer, SNIFF_HEAD_LEN);
    let mut buf = Vec::with_capacity(resolved.grid_capacity());
    let mut index = 0u64;

    if metadata.is_some() {
        counters.add_metadata(first.as_bytes().len());
    } else {
        decode_frame(&first, index, &resolved, options, &mut out, &mut buf, &mut counters, &mut timer)?;
        index += 1;
    }

    loop {
        let next = timer.stage_times.measure(Stage::Read, || source.read_frame())?;
        let Some(frame) = next else { break };
        decode_frame(&frame, index, &resolved, options, &mut out, &mut buf, &mut counters, &mut timer)?;
        index += 1;
    }
    out.flush()?;

    // ---- Name resolution ----
    let (_, head) = out.into_parts();
    let (filename, extension, extension_source) = match &metadata {
        Some(meta) => (
            non_empty(&meta.filename),
            non_empty(&meta.extension),
            ExtensionSource::Metadata,
        ),
        None => match options.sniffer.sniff(&head) {
            Some(ext) => {
                debug!(extension = %ext, "extension sniffed from content");
                (None, Some(ext), ExtensionSource::Sniffed)
            }
            None => {
                warn!(head_len = head.len(), "could not determine extension from content");
                (None, None, ExtensionSource::Unknown)
            }
        },
    };

    timer.finish();
    let telemetry = TelemetrySnapshot::from(&counters, &timer);
    info!(
        frames = telemetry.frames_total(),
        divisions = resolved.divisions(),
        bytes = telemetry.bytes_payload,
        "decode pipeline finished"
    );

    Ok(DecodeReport {
        config: resolved,
        metadata,
        detection,
        filename,
        extension,
        extension_source,
        telemetry,
        output: None,
    })
}

fn check_frame_size(frame: &RenderedFrame, config: &Configuration) -> Result<(), FrameError> {
    if frame.size() != config.frame_size() {
        return Err(FrameError::SizeMismatch {
            expected: config.frame_size(),
            actual: frame.size(),
        });
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn decode_frame<W: Write>(
    frame: &RenderedFrame,
    index: u64,
    config: &Configuration,
    options: &DecodeOptions<'_>,
    out: &mut W,
    buf: &mut Vec<u8>,
    counters: &mut TelemetryCounters,
    timer: &mut TelemetryTimer,
) -> Result<(), ArchiveError> {
    check_frame_size(frame, config)?;

    if options.verify_blocks && !frame.is_block_homogeneous(config.divisions()) {
        warn!(index, divisions = config.divisions(), "frame blocks are not homogeneous");
        counters.add_inhomogeneous();
    }

    let grid = timer.stage_times.measure(Stage::Sample, || sample(frame, config))?;
    buf.clear();
    timer.stage_times.measure(Stage::Unpack, || unpack_into(&grid, config, buf))?;
    timer.stage_times.measure(Stage::Write, || out.write_all(buf))?;

    counters.add_data(buf.len(), 0, frame.as_bytes().len());
    Ok(())
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_owned())
}
