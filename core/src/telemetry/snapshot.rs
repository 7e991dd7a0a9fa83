use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::telemetry::counters::TelemetryCounters;
use crate::telemetry::timers::{Stage, StageTimes, TelemetryTimer};

/// Immutable summary of one encode or decode session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub frames_metadata: u64,
    pub frames_data: u64,
    pub bytes_payload: u64,
    pub bytes_padding: u64,
    pub bytes_raster: u64,
    pub ambiguous_runs: u64,
    pub frames_inhomogeneous: u64,
    /// Share of grid capacity spent on padding, 0.0..=1.0.
    pub padding_ratio: f64,
    pub throughput_payload_bytes_per_sec: f64,
    pub elapsed: Duration,
    pub stage_times: StageTimes,
}

impl TelemetrySnapshot {
    pub fn from(counters: &TelemetryCounters, timer: &TelemetryTimer) -> Self {
        let elapsed = timer.elapsed();

        let carried = counters.bytes_payload + counters.bytes_padding;
        let padding_ratio = if carried > 0 {
            counters.bytes_padding as f64 / carried as f64
        } else {
            0.0
        };

        let throughput = if elapsed.as_secs_f64() > 0.0 {
            counters.bytes_payload as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        Self {
            frames_metadata: counters.frames_metadata,
            frames_data: counters.frames_data,
            bytes_payload: counters.bytes_payload,
            bytes_padding: counters.bytes_padding,
            bytes_raster: counters.bytes_raster,
            ambiguous_runs: counters.ambiguous_runs,
            frames_inhomogeneous: counters.frames_inhomogeneous,
            padding_ratio,
            throughput_payload_bytes_per_sec: throughput,
            elapsed,
            stage_times: timer.stage_times.clone(),
        }
    }

    pub fn frames_total(&self) -> u64 {
        self.frames_metadata + self.frames_data
    }

    pub fn has_all_stages(&self, expected: &[Stage]) -> bool {
        self.stage_times.has_all(expected)
    }
}
