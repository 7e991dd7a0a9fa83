//! Heuristic division detection for archives written without a metadata frame.
//!
//! Walks column 0 of the first frame from the top. Every color change closes a
//! run; the first run whose length divides the frame size fixes the block
//! size. Runs that do not divide it are noise and scanning restarts at the
//! row where the new color begins.

use tracing::{debug, warn};

use crate::constants::METADATA_DIVISIONS;
use crate::framing::RenderedFrame;
use crate::headers::decode::decode_metadata;
use crate::headers::types::{AmbiguousRun, Detection, HeaderError};

/// Infer the division count of `frame`.
///
/// A result of 3 is ambiguous with a real metadata frame, so a strict
/// metadata decode is attempted: success replaces the heuristic result.
///
/// # Errors
/// `HeaderError::HeuristicExhausted` if no run in the column divides the
/// frame size, including a column of a single color.
pub fn heuristic_detect(frame: &RenderedFrame) -> Result<Detection, HeaderError> {
    let size = frame.size();
    let mut ambiguous_runs = Vec::new();

    let column = |y: u32| frame.pixel(0, y);
    let mut run_start = 0u32;
    let mut color = column(0);

    for y in 1..size {
        let current = column(y);
        if current == color {
            continue;
        }

        let run_length = y - run_start;
        if size % run_length != 0 {
            warn!(start_row = run_start, run_length, "discarding ambiguous run");
            ambiguous_runs.push(AmbiguousRun { start_row: run_start, run_length });
            run_start = y;
            color = current;
            continue;
        }

        let divisions = size / run_length;
        debug!(divisions, run_length, "heuristic run accepted");
        return Ok(disambiguate(frame, divisions, ambiguous_runs));
    }

    Err(HeaderError::HeuristicExhausted { frame_size: size, ambiguous: ambiguous_runs.len() })
}

fn disambiguate(frame: &RenderedFrame, divisions: u32, ambiguous_runs: Vec<AmbiguousRun>) -> Detection {
    if divisions == METADATA_DIVISIONS {
        match decode_metadata(frame) {
            Ok(metadata) => {
                debug!(divisions = metadata.divisions, "3x3 run is a metadata frame");
                return Detection {
                    divisions: metadata.divisions,
                    metadata: Some(metadata),
                    ambiguous_runs,
                };
            }
            Err(e) => debug!(error = %e, "3x3 run is not a metadata frame"),
        }
    }

    Detection { divisions, metadata: None, ambiguous_runs }
}
