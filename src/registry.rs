//! Reference line registry
//!
//! Holds the start, lap and finish lines. Configuration arrives as retained
//! messages, so the registry must accept the same line again at any time; an
//! unchanged replay is reported but otherwise a no-op.

use tracing::{debug, info, warn};

use crate::types::{GeoPoint, LineKind, ReferenceLine};
use crate::{Result, TimingError};

/// The three optional timing lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineRegistry {
    start: Option<ReferenceLine>,
    lap: Option<ReferenceLine>,
    finish: Option<ReferenceLine>,
}

impl LineRegistry {
    /// Create a registry with no lines configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current line of the given kind, `None` while unset.
    pub fn get(&self, kind: LineKind) -> Option<ReferenceLine> {
        *self.slot(kind)
    }

    /// Replace the line of the given kind.
    ///
    /// Returns `Ok(true)` when the stored line changed, `Ok(false)` for a
    /// replay of the current value. Non-finite coordinates are rejected and
    /// the previous line is retained. Degenerate lines are stored.
    pub fn set(&mut self, kind: LineKind, a: GeoPoint, b: GeoPoint) -> Result<bool> {
        self.set_line(kind, ReferenceLine::new(a, b))
    }

    /// Replace the line of the given kind; see [`LineRegistry::set`].
    pub fn set_line(&mut self, kind: LineKind, line: ReferenceLine) -> Result<bool> {
        if !line.is_finite() {
            warn!(%kind, "Rejected line with non-finite coordinates, keeping previous");
            return Err(TimingError::invalid_line(kind, format!("non-finite endpoint in {line}")));
        }

        let slot = self.slot_mut(kind);
        if *slot == Some(line) {
            debug!(%kind, "Line configuration unchanged");
            return Ok(false);
        }

        if line.is_degenerate() {
            warn!(%kind, %line, "Configured zero-length line, it will never be crossed");
        } else {
            info!(%kind, %line, "Line configured");
        }
        *slot = Some(line);
        Ok(true)
    }

    /// Remove the line of the given kind.
    pub fn clear(&mut self, kind: LineKind) {
        if self.slot_mut(kind).take().is_some() {
            info!(%kind, "Line cleared");
        }
    }

    /// A line of this kind is configured.
    pub fn is_active(&self, kind: LineKind) -> bool {
        self.slot(kind).is_some()
    }

    /// Both kinds are configured with identical endpoints.
    pub fn coincide(&self, first: LineKind, second: LineKind) -> bool {
        match (self.get(first), self.get(second)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    fn slot(&self, kind: LineKind) -> &Option<ReferenceLine> {
        match kind {
            LineKind::Start => &self.start,
            LineKind::Lap => &self.lap,
            LineKind::Finish => &self.finish,
        }
    }

    fn slot_mut(&mut self, kind: LineKind) -> &mut Option<ReferenceLine> {
        match kind {
            LineKind::Start => &mut self.start,
            LineKind::Lap => &mut self.lap,
            LineKind::Finish => &mut self.finish,
        }
    }
}
