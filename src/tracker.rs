//! Position tracker
//!
//! Keeps the last two valid fixes as the probe segment for crossing tests.
//! After a fix dropout longer than the staleness threshold the tracker
//! forgets both fixes, so a position from before the dropout can never be
//! paired with one from after it.

use std::time::Duration;
use tracing::{debug, info, trace};

use crate::types::{Fix, Timestamp};

/// Default time without a usable fix before the probe segment is discarded.
pub const DEFAULT_FIX_LOSS_THRESHOLD: Duration = Duration::from_secs(5);

/// Movement between the two most recent valid fixes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeSegment {
    pub previous: Fix,
    pub current: Fix,
}

impl ProbeSegment {
    /// No movement between the two fixes.
    pub fn is_stationary(&self) -> bool {
        self.previous.position == self.current.position
    }

    /// Time spanned by the segment.
    pub fn duration(&self) -> Duration {
        self.current.timestamp.saturating_duration_since(self.previous.timestamp)
    }
}

/// Tracks the most recent valid fixes.
#[derive(Debug, Clone)]
pub struct PositionTracker {
    previous: Option<Fix>,
    current: Option<Fix>,
    /// Timestamp of the first invalid fix of the current dropout
    fix_lost_at: Option<Timestamp>,
    has_fix: bool,
    fix_loss_threshold: Duration,
}

impl Default for PositionTracker {
    fn default() -> Self {
        Self::new(DEFAULT_FIX_LOSS_THRESHOLD)
    }
}

impl PositionTracker {
    /// Create an empty tracker.
    pub fn new(fix_loss_threshold: Duration) -> Self {
        Self { previous: None, current: None, fix_lost_at: None, has_fix: false, fix_loss_threshold }
    }

    /// Feed one fix.
    ///
    /// Returns the probe segment completed by this fix, if any. Invalid fixes,
    /// out-of-order fixes, the first fix after a reset and the first fix after
    /// a gap longer than the threshold never produce a segment.
    pub fn observe(&mut self, fix: Fix) -> Option<ProbeSegment> {
        if !fix.valid {
            self.observe_loss(fix.timestamp);
            return None;
        }

        self.has_fix = true;
        if self.fix_lost_at.take().is_some() {
            debug!(at = %fix.timestamp, "Fix regained");
        }

        if let Some(current) = self.current {
            if fix.timestamp < current.timestamp {
                debug!(
                    at = %fix.timestamp,
                    current = %current.timestamp,
                    "Dropping out-of-order fix"
                );
                return None;
            }

            let gap = fix.timestamp.saturating_duration_since(current.timestamp);
            if gap > self.fix_loss_threshold {
                info!(gap = ?gap, "Gap between fixes exceeds threshold, re-seeding tracker");
                self.previous = None;
                self.current = Some(fix);
                return None;
            }

            self.previous = Some(current);
        }

        trace!(position = %fix.position, at = %fix.timestamp, "Fix observed");
        self.current = Some(fix);
        self.probe()
    }

    /// Current probe segment, if two valid fixes are held.
    pub fn probe(&self) -> Option<ProbeSegment> {
        match (self.previous, self.current) {
            (Some(previous), Some(current)) => Some(ProbeSegment { previous, current }),
            _ => None,
        }
    }

    /// Most recent valid fix.
    pub fn current(&self) -> Option<Fix> {
        self.current
    }

    /// The latest fix received was valid.
    pub fn has_fix(&self) -> bool {
        self.has_fix
    }

    /// Forget both fixes and any dropout in progress.
    pub fn reset(&mut self) {
        self.previous = None;
        self.current = None;
        self.fix_lost_at = None;
        self.has_fix = false;
    }

    fn observe_loss(&mut self, at: Timestamp) {
        if self.has_fix {
            debug!(%at, "Fix lost");
        }
        self.has_fix = false;

        let lost_at = *self.fix_lost_at.get_or_insert(at);
        let lost_for = at.saturating_duration_since(lost_at);
        if lost_for > self.fix_loss_threshold && self.current.is_some() {
            info!(lost_for = ?lost_for, "Fix lost beyond threshold, clearing probe segment");
            self.previous = None;
            self.current = None;
        }
    }
}
