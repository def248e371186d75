//! Crossing semantics selection

use serde::{Deserialize, Serialize};

/// Default proximity radius around a line's midpoint, in meters.
pub const DEFAULT_PROXIMITY_RADIUS_M: f64 = 25.0;

/// How a probe segment is tested against a reference line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CrossingMode {
    /// Previous fix strictly right of A→B, current fix on or left of it.
    /// Unbounded: the test runs against the infinite extension of the line.
    Directed,

    /// Segments intersect in either direction and at least one fix lies
    /// within `radius_m` of the line's midpoint.
    ProximityGated { radius_m: f64 },
}

impl Default for CrossingMode {
    fn default() -> Self {
        CrossingMode::ProximityGated { radius_m: DEFAULT_PROXIMITY_RADIUS_M }
    }
}

impl CrossingMode {
    /// Proximity radius, if this mode uses one
    pub fn radius_m(&self) -> Option<f64> {
        match self {
            CrossingMode::Directed => None,
            CrossingMode::ProximityGated { radius_m } => Some(*radius_m),
        }
    }

    /// Check the radius is usable
    pub fn is_valid(&self) -> bool {
        self.radius_m().is_none_or(|r| r.is_finite() && r > 0.0)
    }
}
