use bytes::Bytes;
use thiserror::Error;

use crate::framing::{FrameError, RenderedFrame};
use crate::telemetry::{StageTimes, TelemetryCounters};

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("frame {index}: {source}")]
    Frame {
        index: u64,
        #[source]
        source: FrameError,
    },

    #[error("invalid job {index}: {reason}")]
    InvalidJob { index: u64, reason: String },
}

/// One grid's worth of payload, tagged with its position in the stream.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub index: u64,
    pub chunk: Bytes,
}

impl RenderJob {
    pub fn new(index: u64, chunk: Bytes) -> Self {
        Self { index, chunk }
    }

    /// Empty chunks never reach the pool; the reader stops at EOF instead.
    pub fn validate(&self, capacity: usize) -> Result<(), WorkerError> {
        if self.chunk.is_empty() {
            return Err(WorkerError::InvalidJob {
                index: self.index,
                reason: "empty chunk".into(),
            });
        }
        if self.chunk.len() > capacity {
            return Err(WorkerError::InvalidJob {
                index: self.index,
                reason: format!("chunk of {} bytes exceeds grid capacity {capacity}", self.chunk.len()),
            });
        }
        Ok(())
    }
}

/// Output of rendering, with the per-job telemetry merged by the writer.
#[derive(Debug)]
pub struct RenderedJob {
    pub index: u64,
    pub frame: RenderedFrame,
    pub counters: TelemetryCounters,
    pub stage_times: StageTimes,
}
