//! Reference line types

use serde::{Deserialize, Serialize};
use std::fmt;

use super::GeoPoint;
use crate::{Result, TimingError};

/// Endpoints closer than this (in degrees, per axis) form a degenerate line.
const DEGENERATE_EPSILON: f64 = 1e-9;

/// Which timing gate a reference line represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    /// Crossing starts the race
    Start,
    /// Intermediate line, each crossing completes a lap
    Lap,
    /// Crossing on the final lap finishes the race
    Finish,
}

impl LineKind {
    /// All line kinds in evaluation priority order.
    pub const ALL: [LineKind; 3] = [LineKind::Start, LineKind::Lap, LineKind::Finish];

    /// Lowercase name used in topics and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            LineKind::Start => "start",
            LineKind::Lap => "lap",
            LineKind::Finish => "finish",
        }
    }
}

impl fmt::Display for LineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Directed segment A→B used as a timing gate.
///
/// Forward travel across the line goes from its right-hand side (negative
/// orientation) to its left-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLine {
    pub a: GeoPoint,
    pub b: GeoPoint,
}

impl ReferenceLine {
    /// Create a line from its two endpoints.
    pub const fn new(a: GeoPoint, b: GeoPoint) -> Self {
        Self { a, b }
    }

    /// Zero-length lines are accepted but can never be crossed.
    pub fn is_degenerate(&self) -> bool {
        (self.a.lon - self.b.lon).abs() < DEGENERATE_EPSILON
            && (self.a.lat - self.b.lat).abs() < DEGENERATE_EPSILON
    }

    /// Both endpoints have finite coordinates.
    pub fn is_finite(&self) -> bool {
        self.a.is_finite() && self.b.is_finite()
    }

    /// Arithmetic midpoint, adequate at track scale.
    pub fn midpoint(&self) -> GeoPoint {
        crate::geometry::midpoint(self.a, self.b)
    }
}

impl fmt::Display for ReferenceLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.a, self.b)
    }
}

/// Line configuration payload: `{"p1": [lon, lat], "p2": [lon, lat]}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct LinePayload {
    pub p1: [f64; 2],
    pub p2: [f64; 2],
}

impl LinePayload {
    /// Convert into a reference line, rejecting non-finite coordinates.
    pub fn into_line(self, kind: LineKind) -> Result<ReferenceLine> {
        let line = ReferenceLine::new(self.p1.into(), self.p2.into());
        if !line.is_finite() {
            return Err(TimingError::invalid_line(
                kind,
                format!("non-finite coordinates p1={:?} p2={:?}", self.p1, self.p2),
            ));
        }
        Ok(line)
    }
}

impl From<ReferenceLine> for LinePayload {
    fn from(line: ReferenceLine) -> Self {
        Self { p1: line.a.into(), p2: line.b.into() }
    }
}
