//! Test utilities for fixture paths and synthetic drives
//!
//! This module provides helpers for locating test data and for building fix
//! sequences that cross timing gates at exact times. It is shared by unit
//! tests and benchmarks.

#![cfg(any(test, feature = "benchmark"))]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::message::EngineMessage;
use crate::sink::EventSink;
use crate::types::{Fix, GeoPoint, RaceEvent, ReferenceLine, Timestamp};

/// Guidance shown when fixtures are missing from the checkout.
pub const FIXTURE_INSTALL_GUIDANCE: &str =
    "Replay and configuration fixtures are stored under test-data/ next to Cargo.toml.";

/// Latitude offset of the fixes on either side of a gate, about 5.5 m.
pub const GATE_OFFSET: f64 = 0.00005;

/// Time between the fix before a gate and the fix after it.
pub const CROSSING_LEAD_SECS: f64 = 0.1;

/// Largest time step [`FixFeed`] emits while travelling, well under the
/// default fix-loss threshold.
pub const MAX_STEP_SECS: f64 = 1.0;

/// Error returned when a required fixture cannot be located.
#[derive(Debug, Clone)]
pub struct FixtureError {
    message: String,
}

impl FixtureError {
    fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl std::fmt::Display for FixtureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for FixtureError {}

/// Require that a specific fixture exists on disk.
pub fn require_fixture<P: AsRef<Path>>(path: P) -> Result<PathBuf, FixtureError> {
    let path_ref = path.as_ref();
    if path_ref.exists() {
        Ok(path_ref.to_path_buf())
    } else {
        Err(FixtureError::new(format!(
            "Missing fixture: {}. {}",
            path_ref.display(),
            FIXTURE_INSTALL_GUIDANCE
        )))
    }
}

/// The test-data directory of this crate.
pub fn test_data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test-data")
}

/// Path of a file inside `test-data/`, whether or not it exists.
pub fn test_data_path(relative: &str) -> PathBuf {
    test_data_dir().join(relative)
}

/// Require a replay script inside `test-data/replay`.
pub fn require_replay_script(file_name: &str) -> Result<PathBuf, FixtureError> {
    require_fixture(test_data_dir().join("replay").join(file_name))
}

/// All replay scripts, sorted by file name.
pub fn replay_scripts() -> Vec<PathBuf> {
    let mut scripts: Vec<PathBuf> = std::fs::read_dir(test_data_dir().join("replay"))
        .map(|entries| {
            entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("yaml"))
                .collect()
        })
        .unwrap_or_default();
    scripts.sort();
    scripts
}

/// East-west start gate at the equator, about 22 m wide.
pub fn start_gate() -> ReferenceLine {
    ReferenceLine::new(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0002, 0.0))
}

/// East-west lap gate 100 m east of the start gate.
pub fn lap_gate() -> ReferenceLine {
    ReferenceLine::new(GeoPoint::new(0.001, 0.0), GeoPoint::new(0.0012, 0.0))
}

/// One-degree line from (0, 0) to (1, 0).
pub fn unit_line() -> ReferenceLine {
    ReferenceLine::new(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0))
}

/// Builder for fix sequences around gates lying on the equator.
///
/// Gates are crossed south to north through their midpoint. Between gates
/// the feed loops north of the equator, returns south well east of every
/// gate, and approaches the next gate from the south, so no gate is touched
/// on the way.
#[derive(Debug, Clone, Default)]
pub struct FixFeed {
    fixes: Vec<Fix>,
}

impl FixFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Valid fix at `(lon, lat)`.
    pub fn at(mut self, secs: f64, lon: f64, lat: f64) -> Self {
        self.fixes.push(Fix::new(GeoPoint::new(lon, lat), Timestamp::from_secs_f64(secs)));
        self
    }

    /// Fix-loss report.
    pub fn lost(mut self, secs: f64) -> Self {
        self.fixes.push(Fix::lost(Timestamp::from_secs_f64(secs)));
        self
    }

    /// Cross `gate` south to north, arriving north of it at `secs`.
    pub fn cross(self, gate: ReferenceLine, secs: f64) -> Self {
        let mid = gate.midpoint();
        self.at(secs - CROSSING_LEAD_SECS, mid.lon, -GATE_OFFSET)
            .at(secs, mid.lon, GATE_OFFSET)
    }

    /// Cross `gate` north to south, arriving south of it at `secs`.
    pub fn cross_reverse(self, gate: ReferenceLine, secs: f64) -> Self {
        let mid = gate.midpoint();
        self.at(secs - CROSSING_LEAD_SECS, mid.lon, GATE_OFFSET)
            .at(secs, mid.lon, -GATE_OFFSET)
    }

    /// Drive around and cross `gate` at `secs`.
    pub fn lap_to(self, gate: ReferenceLine, secs: f64) -> Self {
        const LOOP_LAT: f64 = 0.0005;
        const TURN_LON: f64 = 0.002;

        let Some(last) = self.last_valid() else {
            return self.cross(gate, secs);
        };
        let start = last.timestamp.as_secs_f64();
        let approach = secs - CROSSING_LEAD_SECS;
        let mid = gate.midpoint();

        let waypoints = [
            GeoPoint::new(last.position.lon, LOOP_LAT),
            GeoPoint::new(TURN_LON, LOOP_LAT),
            GeoPoint::new(TURN_LON, -LOOP_LAT),
            GeoPoint::new(mid.lon, -LOOP_LAT),
        ];
        let leg = (approach - start) / (waypoints.len() + 1) as f64;

        let mut feed = self;
        for (i, point) in waypoints.into_iter().enumerate() {
            feed = feed.travel(point, start + leg * (i + 1) as f64);
        }
        feed.travel(GeoPoint::new(mid.lon, -GATE_OFFSET), approach).at(secs, mid.lon, GATE_OFFSET)
    }

    /// Straight-line travel from the last valid fix, in steps of at most
    /// [`MAX_STEP_SECS`].
    pub fn travel(mut self, to: GeoPoint, secs: f64) -> Self {
        let Some(last) = self.last_valid() else {
            return self.at(secs, to.lon, to.lat);
        };
        let from = last.position;
        let from_secs = last.timestamp.as_secs_f64();
        let steps = ((secs - from_secs) / MAX_STEP_SECS).ceil().max(1.0) as usize;

        for i in 1..=steps {
            let f = i as f64 / steps as f64;
            let lon = from.lon + (to.lon - from.lon) * f;
            let lat = from.lat + (to.lat - from.lat) * f;
            self = self.at(from_secs + (secs - from_secs) * f, lon, lat);
        }
        self
    }

    pub fn fixes(&self) -> &[Fix] {
        &self.fixes
    }

    pub fn build(self) -> Vec<Fix> {
        self.fixes
    }

    pub fn messages(self) -> Vec<EngineMessage> {
        self.fixes.into_iter().map(EngineMessage::Fix).collect()
    }

    fn last_valid(&self) -> Option<Fix> {
        self.fixes.iter().rev().find(|fix| fix.valid).copied()
    }
}

/// Sink that records every event it receives; clones share the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<RaceEvent>>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<RaceEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(RaceEvent::name).collect()
    }
}

impl EventSink for RecordingSink {
    fn publish(&mut self, event: &RaceEvent) -> crate::Result<()> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).push(event.clone());
        Ok(())
    }
}
