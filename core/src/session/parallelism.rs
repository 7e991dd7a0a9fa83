use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::MAX_WORKERS;
use crate::types::ArchiveError;

/// Parallelism configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelismProfile {
    pub workers: usize,
    /// Capacity of the job queue and of the rendered-frame queue. Frames that
    /// finish ahead of a slow lower index wait in the ordered writer, which is
    /// not bounded by this.
    pub inflight_frames: usize,
}

impl ParallelismProfile {
    pub fn single_threaded() -> Self {
        Self {
            workers: 1,
            inflight_frames: 1,
        }
    }

    pub fn new(workers: usize, inflight_frames: usize) -> Self {
        Self { workers, inflight_frames }
    }

    /// Size the pool from the host: one worker per core minus one, and as many
    /// in-flight frames as `mem_fraction` of available memory holds, capped at `hard_cap`.
    pub fn dynamic(frame_len: usize, mem_fraction: f64, hard_cap: usize) -> Self {
        let cores = num_cpus::get();
        let workers = cores.saturating_sub(1).clamp(1, MAX_WORKERS);

        let mut sys = sysinfo::System::new();
        sys.refresh_memory();

        // bytes
        let avail_bytes = sys.available_memory();
        let budget = (avail_bytes as f64 * mem_fraction) as u64;
        // each in-flight frame holds a chunk plus its raster
        let per_frame = (frame_len as u64).max(1) * 2;
        let max_frames = budget / per_frame;

        let inflight_frames = (max_frames.min(hard_cap as u64) as usize).max(1);
        debug!(cores, workers, avail_bytes, inflight_frames, "dynamic parallelism profile");

        Self { workers, inflight_frames }
    }

    pub fn validate(&self) -> Result<(), ArchiveError> {
        if self.workers == 0 || self.workers > MAX_WORKERS {
            return Err(ArchiveError::Validation(format!(
                "worker count must be within 1..={MAX_WORKERS}, got {}",
                self.workers
            )));
        }
        if self.inflight_frames == 0 {
            return Err(ArchiveError::Validation("inflight frame limit must be positive".into()));
        }
        Ok(())
    }
}
