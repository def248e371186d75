//! Crossing debounce
//!
//! GPS jitter around a line produces bursts of crossings. The gate keeps the
//! first crossing of a burst and drops repeats of the same kind until the
//! window has elapsed.

use std::time::Duration;
use tracing::debug;

use crate::types::{LineKind, Timestamp};

/// Default minimum time between accepted crossings of the same kind.
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct DebounceGate {
    window: Duration,
    last: Option<(LineKind, Timestamp)>,
}

impl Default for DebounceGate {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_WINDOW)
    }
}

impl DebounceGate {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    /// Accept or suppress a crossing of `kind` at `now`.
    ///
    /// Accepted when `kind` differs from the last accepted kind, or when
    /// strictly more than the window has passed since it. Accepted crossings
    /// are recorded; suppressed ones leave the gate untouched.
    pub fn accept(&mut self, kind: LineKind, now: Timestamp) -> bool {
        if let Some((last_kind, last_time)) = self.last {
            let elapsed = now.saturating_duration_since(last_time);
            if last_kind == kind && elapsed <= self.window {
                debug!(%kind, elapsed = ?elapsed, "Crossing debounced");
                return false;
            }
        }

        self.last = Some((kind, now));
        true
    }

    /// Last accepted crossing.
    pub fn last(&self) -> Option<(LineKind, Timestamp)> {
        self.last
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(secs: f64) -> Timestamp {
        Timestamp::from_secs_f64(secs)
    }

    #[test]
    fn first_crossing_is_accepted() {
        let mut gate = DebounceGate::default();
        assert!(gate.accept(LineKind::Start, t(0.0)));
        assert_eq!(gate.last(), Some((LineKind::Start, t(0.0))));
    }

    #[test]
    fn same_kind_inside_window_is_suppressed() {
        let mut gate = DebounceGate::default();
        assert!(gate.accept(LineKind::Lap, t(10.0)));
        assert!(!gate.accept(LineKind::Lap, t(10.1)));
        assert!(!gate.accept(LineKind::Lap, t(12.0)));
        assert!(gate.accept(LineKind::Lap, t(12.5)));
    }

    #[test]
    fn suppressed_crossings_do_not_extend_the_window() {
        let mut gate = DebounceGate::default();
        gate.accept(LineKind::Lap, t(0.0));
        gate.accept(LineKind::Lap, t(1.9));
        assert!(gate.accept(LineKind::Lap, t(2.1)));
    }

    #[test]
    fn different_kind_is_always_accepted() {
        let mut gate = DebounceGate::default();
        assert!(gate.accept(LineKind::Start, t(0.0)));
        assert!(gate.accept(LineKind::Lap, t(0.1)));
        // The lap crossing replaced the start record
        assert!(gate.accept(LineKind::Start, t(0.2)));
    }

    #[test]
    fn reset_forgets_last_crossing() {
        let mut gate = DebounceGate::new(Duration::from_secs(60));
        gate.accept(LineKind::Finish, t(0.0));
        gate.reset();
        assert!(gate.accept(LineKind::Finish, t(1.0)));
    }
}
