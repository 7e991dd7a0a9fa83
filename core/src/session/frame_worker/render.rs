use crossbeam::channel::{Receiver, Sender};
use tracing::{debug, trace};

use super::types::{RenderJob, RenderedJob, WorkerError};
use crate::config::Configuration;
use crate::framing::{pack_grid, render};
use crate::telemetry::{Stage, StageTimes, TelemetryCounters};

/// Packs one chunk into a grid and rasterizes it.
#[derive(Debug, Clone)]
pub struct RenderWorker {
    config: Configuration,
}

impl RenderWorker {
    pub fn new(config: Configuration) -> Self {
        Self { config }
    }

    pub fn render_job(&self, job: RenderJob) -> Result<RenderedJob, WorkerError> {
        let capacity = self.config.grid_capacity();
        job.validate(capacity)?;

        let index = job.index;
        let mut stage_times = StageTimes::default();

        let grid = stage_times
            .measure(Stage::Pack, || pack_grid(&job.chunk, &self.config))
            .map_err(|source| WorkerError::Frame { index, source })?;
        let frame = stage_times
            .measure(Stage::Render, || render(&grid, &self.config))
            .map_err(|source| WorkerError::Frame { index, source })?;

        let mut counters = TelemetryCounters::default();
        counters.add_data(job.chunk.len(), capacity - job.chunk.len(), frame.as_bytes().len());

        trace!(index, payload = job.chunk.len(), "rendered frame");
        Ok(RenderedJob { index, frame, counters, stage_times })
    }

    /// Blocking loop: render jobs until the job channel closes or the
    /// result channel is dropped. Errors are forwarded, not swallowed.
    pub fn run(self, rx: Receiver<RenderJob>, tx: Sender<Result<RenderedJob, WorkerError>>) {
        while let Ok(job) = rx.recv() {
            let result = self.render_job(job);
            let failed = result.is_err();
            if tx.send(result).is_err() {
                debug!("result channel closed, render worker exiting");
                return;
            }
            if failed {
                return;
            }
        }
    }
}
