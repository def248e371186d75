//! Race timing events and their wire payloads

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Timestamp;

/// Timing event emitted by the lap state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum RaceEvent {
    /// Start line crossed; lap 1 begins.
    RaceStarted { start_time: Timestamp, total_laps: u32 },

    /// A lap was completed, either on the lap line or on the finish line.
    LapCompleted {
        lap_number: u32,
        lap_duration: Duration,
        total_laps: u32,
        start_time: Timestamp,
        end_time: Timestamp,
        /// Set when this lap was closed by the finish line
        race_finished: bool,
    },

    /// Final lap completed. Emitted at most once per run.
    RaceFinished { finish_time: Timestamp, final_lap_number: u32, final_lap_duration: Duration },
}

impl RaceEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            RaceEvent::RaceStarted { .. } => "race_started",
            RaceEvent::LapCompleted { .. } => "lap_completed",
            RaceEvent::RaceFinished { .. } => "race_finished",
        }
    }

    /// Instant the event refers to.
    pub fn time(&self) -> Timestamp {
        match self {
            RaceEvent::RaceStarted { start_time, .. } => *start_time,
            RaceEvent::LapCompleted { end_time, .. } => *end_time,
            RaceEvent::RaceFinished { finish_time, .. } => *finish_time,
        }
    }

    /// Convert into the serializable payload published to consumers.
    pub fn to_payload(&self) -> EventPayload {
        match *self {
            RaceEvent::RaceStarted { start_time, total_laps } => EventPayload::RaceStarted {
                start_time: start_time.as_secs_f64(),
                lap_number_starting: 1,
                total_laps,
            },
            RaceEvent::LapCompleted {
                lap_number,
                lap_duration,
                total_laps,
                start_time,
                end_time,
                race_finished,
            } => EventPayload::LapCompleted {
                lap_number,
                lap_time_seconds: lap_duration.as_secs_f64(),
                total_laps,
                start_time: start_time.as_secs_f64(),
                end_time: end_time.as_secs_f64(),
                race_finished_flag: race_finished,
            },
            RaceEvent::RaceFinished { finish_time, final_lap_number, final_lap_duration } => {
                EventPayload::RaceFinished {
                    finish_time: finish_time.as_secs_f64(),
                    final_lap_number,
                    final_lap_duration_seconds: final_lap_duration.as_secs_f64(),
                }
            }
        }
    }
}

/// Serializable event payload. Times are fractional seconds since the epoch
/// of the fix timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventPayload {
    RaceStarted {
        start_time: f64,
        lap_number_starting: u32,
        total_laps: u32,
    },
    LapCompleted {
        lap_number: u32,
        lap_time_seconds: f64,
        total_laps: u32,
        start_time: f64,
        end_time: f64,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        race_finished_flag: bool,
    },
    RaceFinished {
        finish_time: f64,
        final_lap_number: u32,
        final_lap_duration_seconds: f64,
    },
}
