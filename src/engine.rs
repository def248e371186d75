//! Timing engine
//!
//! Single owner of all timing state. Messages are applied strictly in the
//! order they are handed in; no operation blocks or awaits, so the engine
//! can run inside the driver task or be driven synchronously from tests.

use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::detector::CrossingDetector;
use crate::message::EngineMessage;
use crate::race::{LapStateMachine, RaceSnapshot, RaceState};
use crate::registry::LineRegistry;
use crate::tracker::PositionTracker;
use crate::types::{CrossingMode, Fix, LineKind, RaceEvent, ReferenceLine};
use crate::Result;

/// Converts position fixes into race events.
#[derive(Debug, Clone)]
pub struct TimingEngine {
    registry: LineRegistry,
    tracker: PositionTracker,
    detector: CrossingDetector,
    race: LapStateMachine,
}

impl Default for TimingEngine {
    fn default() -> Self {
        Self {
            registry: LineRegistry::new(),
            tracker: PositionTracker::default(),
            detector: CrossingDetector::default(),
            race: LapStateMachine::default(),
        }
    }
}

impl TimingEngine {
    /// Build an engine from a validated configuration.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        config.validate()?;

        let mut registry = LineRegistry::new();
        for (kind, line) in config.initial_lines()? {
            registry.set_line(kind, line)?;
        }

        info!(
            crossing_mode = ?config.crossing_mode,
            total_laps = config.total_laps,
            debounce = ?config.debounce_window(),
            fix_loss_threshold = ?config.fix_loss_threshold(),
            "Timing engine created"
        );

        Ok(Self {
            registry,
            tracker: PositionTracker::new(config.fix_loss_threshold()),
            detector: CrossingDetector::new(config.crossing_mode),
            race: LapStateMachine::new(config.total_laps, config.debounce_window()),
        })
    }

    /// Apply one message and return the events it produced.
    ///
    /// Rejected configuration is logged and leaves the engine unchanged.
    pub fn handle(&mut self, message: EngineMessage) -> Vec<RaceEvent> {
        match message {
            EngineMessage::Fix(fix) => self.observe_fix(fix),
            EngineMessage::Line { kind, line } => {
                if let Err(e) = self.configure_line(kind, line) {
                    warn!(%kind, "Ignoring line configuration: {}", e);
                }
                Vec::new()
            }
            EngineMessage::ClearLine(kind) => {
                self.clear_line(kind);
                Vec::new()
            }
            EngineMessage::TotalLaps(total_laps) => {
                self.set_total_laps(total_laps);
                Vec::new()
            }
            EngineMessage::Reset => {
                self.reset();
                Vec::new()
            }
        }
    }

    /// Feed one position fix.
    pub fn observe_fix(&mut self, fix: Fix) -> Vec<RaceEvent> {
        let Some(probe) = self.tracker.observe(fix) else {
            return Vec::new();
        };

        let lap_is_finish = self.registry.coincide(LineKind::Lap, LineKind::Finish);
        let registry = &self.registry;
        let detector = &self.detector;

        let events = self.race.update(probe.current.timestamp, lap_is_finish, |kind| {
            registry.get(kind).is_some_and(|line| detector.crosses(&line, &probe))
        });

        if !events.is_empty() {
            debug!(count = events.len(), at = %probe.current.timestamp, "Fix produced race events");
        }
        events
    }

    /// Replace a reference line; see [`LineRegistry::set_line`].
    pub fn configure_line(&mut self, kind: LineKind, line: ReferenceLine) -> Result<bool> {
        self.registry.set_line(kind, line)
    }

    pub fn clear_line(&mut self, kind: LineKind) {
        self.registry.clear(kind);
    }

    /// Change the number of laps; zero disables timing.
    pub fn set_total_laps(&mut self, total_laps: u32) -> bool {
        self.race.set_total_laps(total_laps)
    }

    /// Return race progress and position memory to their zero state.
    /// Lines and the lap count are kept.
    pub fn reset(&mut self) {
        self.tracker.reset();
        self.race.reset();
    }

    pub fn snapshot(&self) -> RaceSnapshot {
        RaceSnapshot { has_fix: self.tracker.has_fix(), ..self.race.snapshot() }
    }

    pub fn race_state(&self) -> &RaceState {
        self.race.state()
    }

    pub fn lines(&self) -> &LineRegistry {
        &self.registry
    }

    pub fn crossing_mode(&self) -> CrossingMode {
        self.detector.mode()
    }
}
