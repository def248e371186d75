//! Lap state machine
//!
//! Owns race progress. Each update receives the crossings seen by the
//! detector for one probe segment and performs at most one transition:
//!
//! ```text
//! WaitingForStart --start--> InLap(1) --lap--> InLap(2) ... InLap(total) --lap|finish--> Finished
//! ```
//!
//! Nothing happens while `total_laps` is zero. Start crossings after the race
//! has started are ignored. When the lap and finish lines coincide, only the
//! finish check runs on the final lap so the same crossing cannot be counted
//! twice, and finish crossings are debounced as lap crossings of that line.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::debounce::{DEFAULT_DEBOUNCE_WINDOW, DebounceGate};
use crate::types::{LineKind, RaceEvent, Timestamp};

/// Race progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(tag = "phase", content = "lap", rename_all = "snake_case")]
pub enum RacePhase {
    /// Lap 0, armed for the start line.
    #[default]
    WaitingForStart,
    /// Driving the given lap, counted from 1.
    InLap(u32),
    /// Terminal until [`LapStateMachine::reset`].
    Finished,
}

/// Full race state owned by [`LapStateMachine`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RaceState {
    pub phase: RacePhase,
    /// Zero disables all line checks
    pub total_laps: u32,
    pub laps_completed: u32,
    pub race_start_time: Option<Timestamp>,
    pub lap_start_time: Option<Timestamp>,
    pub last_lap: Option<Duration>,
    pub best_lap: Option<Duration>,
}

impl RaceState {
    pub fn new(total_laps: u32) -> Self {
        Self { total_laps, ..Self::default() }
    }

    /// Lap being driven; 0 before the start, the final lap once finished.
    pub fn current_lap(&self) -> u32 {
        match self.phase {
            RacePhase::WaitingForStart => 0,
            RacePhase::InLap(lap) => lap,
            RacePhase::Finished => self.laps_completed,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.phase == RacePhase::Finished
    }
}

/// Status view published after every processed message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct RaceSnapshot {
    pub phase: RacePhase,
    pub current_lap: u32,
    pub total_laps: u32,
    pub laps_completed: u32,
    /// Seconds, on the fix timestamp scale
    pub race_start_time: Option<f64>,
    pub lap_start_time: Option<f64>,
    pub last_lap_time_sec: Option<f64>,
    pub best_lap_time_sec: Option<f64>,
    /// Latest fix from the positioning feed was valid
    pub has_fix: bool,
}

impl From<&RaceState> for RaceSnapshot {
    fn from(state: &RaceState) -> Self {
        Self {
            phase: state.phase,
            current_lap: state.current_lap(),
            total_laps: state.total_laps,
            laps_completed: state.laps_completed,
            race_start_time: state.race_start_time.map(|t| t.as_secs_f64()),
            lap_start_time: state.lap_start_time.map(|t| t.as_secs_f64()),
            last_lap_time_sec: state.last_lap.map(|d| d.as_secs_f64()),
            best_lap_time_sec: state.best_lap.map(|d| d.as_secs_f64()),
            has_fix: false,
        }
    }
}

/// Drives [`RaceState`] from debounced line crossings.
#[derive(Debug, Clone)]
pub struct LapStateMachine {
    state: RaceState,
    gate: DebounceGate,
}

impl Default for LapStateMachine {
    fn default() -> Self {
        Self::new(0, DEFAULT_DEBOUNCE_WINDOW)
    }
}

impl LapStateMachine {
    pub fn new(total_laps: u32, debounce_window: Duration) -> Self {
        Self { state: RaceState::new(total_laps), gate: DebounceGate::new(debounce_window) }
    }

    pub fn state(&self) -> &RaceState {
        &self.state
    }

    pub fn snapshot(&self) -> RaceSnapshot {
        RaceSnapshot::from(&self.state)
    }

    /// Last crossing that passed the debounce gate.
    pub fn last_crossing(&self) -> Option<(LineKind, Timestamp)> {
        self.gate.last()
    }

    /// Process the crossings of one probe segment ending at `now`.
    ///
    /// `crossed` reports whether the probe crosses the active line of a kind,
    /// and is only asked about lines the current phase cares about.
    /// `lap_is_finish` tells whether lap and finish lines coincide.
    pub fn update(
        &mut self,
        now: Timestamp,
        lap_is_finish: bool,
        mut crossed: impl FnMut(LineKind) -> bool,
    ) -> Vec<RaceEvent> {
        let mut events = Vec::new();
        let total = self.state.total_laps;
        if total == 0 {
            return events;
        }

        match self.state.phase {
            RacePhase::Finished => {}
            RacePhase::WaitingForStart => {
                if crossed(LineKind::Start) && self.gate.accept(LineKind::Start, now) {
                    self.start(now, &mut events);
                }
            }
            RacePhase::InLap(lap) => {
                let final_lap = lap == total;
                let check_lap = lap <= total && !(final_lap && lap_is_finish);
                // One physical line shares one debounce key
                let finish_key = if lap_is_finish { LineKind::Lap } else { LineKind::Finish };

                if check_lap && crossed(LineKind::Lap) && self.gate.accept(LineKind::Lap, now) {
                    self.complete_lap(lap, now, false, &mut events);
                } else if final_lap
                    && crossed(LineKind::Finish)
                    && self.gate.accept(finish_key, now)
                {
                    self.complete_lap(lap, now, true, &mut events);
                }
            }
        }

        events
    }

    /// Change the number of laps. Returns whether the value changed.
    ///
    /// Lowering the count below a lap already in progress leaves the race
    /// without a reachable finish until the count is raised again.
    pub fn set_total_laps(&mut self, total_laps: u32) -> bool {
        if self.state.total_laps == total_laps {
            debug!(total_laps, "Total laps unchanged");
            return false;
        }

        info!(from = self.state.total_laps, to = total_laps, "Total laps updated");
        if let RacePhase::InLap(lap) = self.state.phase
            && total_laps != 0
            && lap > total_laps
        {
            warn!(lap, total_laps, "Race is already past the new lap count");
        }
        self.state.total_laps = total_laps;
        true
    }

    /// Return to the zero state, keeping the lap count.
    pub fn reset(&mut self) {
        info!("Race state reset");
        self.state = RaceState::new(self.state.total_laps);
        self.gate.reset();
    }

    fn start(&mut self, now: Timestamp, events: &mut Vec<RaceEvent>) {
        info!(at = %now, total_laps = self.state.total_laps, "Race started, lap 1 begins");
        self.state.phase = RacePhase::InLap(1);
        self.state.race_start_time = Some(now);
        self.state.lap_start_time = Some(now);
        events.push(RaceEvent::RaceStarted { start_time: now, total_laps: self.state.total_laps });
    }

    fn complete_lap(&mut self, lap: u32, now: Timestamp, on_finish_line: bool, events: &mut Vec<RaceEvent>) {
        let total = self.state.total_laps;
        let lap_start = self.state.lap_start_time.unwrap_or(now);
        let lap_duration = now.saturating_duration_since(lap_start);

        info!(lap, lap_time = ?lap_duration, total_laps = total, "Lap completed");
        events.push(RaceEvent::LapCompleted {
            lap_number: lap,
            lap_duration,
            total_laps: total,
            start_time: lap_start,
            end_time: now,
            race_finished: on_finish_line,
        });

        self.state.laps_completed = lap;
        self.state.last_lap = Some(lap_duration);
        self.state.best_lap = Some(self.state.best_lap.map_or(lap_duration, |best| best.min(lap_duration)));

        if on_finish_line || lap + 1 > total {
            info!(at = %now, final_lap = lap, "Race finished");
            self.state.phase = RacePhase::Finished;
            events.push(RaceEvent::RaceFinished {
                finish_time: now,
                final_lap_number: lap,
                final_lap_duration: lap_duration,
            });
        } else {
            debug!(lap = lap + 1, "Next lap begins");
            self.state.phase = RacePhase::InLap(lap + 1);
            self.state.lap_start_time = Some(now);
        }
    }
}
