//! Crossing detection
//!
//! Tests a probe segment against one reference line. Which lines are tested,
//! and in what order, is decided by the lap state machine.

use tracing::trace;

use crate::geometry::{great_circle_distance, segments_intersect, side_of_line};
use crate::tracker::ProbeSegment;
use crate::types::{CrossingMode, ReferenceLine};

/// Evaluates probe segments under a fixed [`CrossingMode`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CrossingDetector {
    mode: CrossingMode,
}

impl CrossingDetector {
    pub fn new(mode: CrossingMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> CrossingMode {
        self.mode
    }

    /// The probe segment crosses `line`.
    ///
    /// Degenerate lines and stationary probes never cross.
    pub fn crosses(&self, line: &ReferenceLine, probe: &ProbeSegment) -> bool {
        if line.is_degenerate() || probe.is_stationary() {
            return false;
        }

        let prev = probe.previous.position;
        let curr = probe.current.position;

        let crossed = match self.mode {
            CrossingMode::Directed => {
                side_of_line(line.a, line.b, prev) < 0.0 && side_of_line(line.a, line.b, curr) >= 0.0
            }
            CrossingMode::ProximityGated { radius_m } => {
                segments_intersect(line.a, line.b, prev, curr) && {
                    let mid = line.midpoint();
                    great_circle_distance(prev, mid) <= radius_m
                        || great_circle_distance(curr, mid) <= radius_m
                }
            }
        };

        if crossed {
            trace!(%line, from = %prev, to = %curr, "Probe crosses line");
        }
        crossed
    }
}
