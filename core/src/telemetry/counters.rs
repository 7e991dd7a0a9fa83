//! telemetry/counters.rs
//! Mutable counters used during encode/decode sessions.
//!
//! Collected per worker, merged on the ordered writer thread, and frozen into
//! a `TelemetrySnapshot` when the session ends.

use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryCounters {
    pub frames_metadata: u64,
    pub frames_data: u64,
    /// Input bytes on encode, unpacked bytes (padding included) on decode.
    pub bytes_payload: u64,
    /// Zero bytes added to complete the last grid (encode only).
    pub bytes_padding: u64,
    /// RGB24 bytes handed to or read from the transport.
    pub bytes_raster: u64,
    pub ambiguous_runs: u64,
    /// Frames whose blocks were not uniform (decode with verification only).
    pub frames_inhomogeneous: u64,
}

impl TelemetryCounters {
    /// Record the metadata frame.
    pub fn add_metadata(&mut self, raster_len: usize) {
        self.frames_metadata += 1;
        self.bytes_raster += raster_len as u64;
    }

    /// Record one data frame.
    ///
    /// - `payload_len`: real payload bytes carried by the grid
    /// - `padding_len`: zero bytes appended to fill the grid
    /// - `raster_len`: rendered frame size in bytes
    pub fn add_data(&mut self, payload_len: usize, padding_len: usize, raster_len: usize) {
        self.frames_data += 1;
        self.bytes_payload += payload_len as u64;
        self.bytes_padding += padding_len as u64;
        self.bytes_raster += raster_len as u64;
    }

    pub fn add_ambiguous_runs(&mut self, n: usize) {
        self.ambiguous_runs += n as u64;
    }

    pub fn add_inhomogeneous(&mut self) {
        self.frames_inhomogeneous += 1;
    }

    pub fn frames_total(&self) -> u64 {
        self.frames_metadata + self.frames_data
    }

    // Per-worker counters merged without locks or atomics.
    pub fn merge(&mut self, other: &TelemetryCounters) {
        self.frames_metadata += other.frames_metadata;
        self.frames_data += other.frames_data;
        self.bytes_payload += other.bytes_payload;
        self.bytes_padding += other.bytes_padding;
        self.bytes_raster += other.bytes_raster;
        self.ambiguous_runs += other.ambiguous_runs;
        self.frames_inhomogeneous += other.frames_inhomogeneous;
    }
}

impl AddAssign for TelemetryCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}
