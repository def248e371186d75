//! Engine input messages
//!
//! The positioning feed and the configuration feed are merged into a single
//! ordered stream of [`EngineMessage`]s. Configuration arrives on
//! publish/subscribe topics, which [`EngineMessage::from_config`] maps onto
//! typed messages.

use tracing::warn;

use crate::types::{Fix, FixRecord, LineKind, LinePayload, ReferenceLine};
use crate::{Result, TimingError};

/// Topic carrying the start line payload.
pub const START_LINE_TOPIC: &str = "config/start_line";
/// Topic carrying the lap line payload.
pub const LAP_LINE_TOPIC: &str = "config/lap_line";
/// Topic carrying the finish line payload.
pub const FINISH_LINE_TOPIC: &str = "config/finish_line";
/// Topic carrying the total lap count as a plain integer.
pub const TOTAL_LAPS_TOPIC: &str = "config/total_laps";

/// A single input to the timing engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineMessage {
    /// Position sample from the positioning feed.
    Fix(Fix),
    /// Replace a reference line.
    Line { kind: LineKind, line: ReferenceLine },
    /// Remove a reference line; an empty retained payload on its topic.
    ClearLine(LineKind),
    /// Set the number of laps, zero disables timing.
    TotalLaps(u32),
    /// Return race progress to its zero state.
    Reset,
}

/// Configuration topics understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigTopic {
    Line(LineKind),
    TotalLaps,
}

impl ConfigTopic {
    pub const ALL: [ConfigTopic; 4] = [
        ConfigTopic::Line(LineKind::Start),
        ConfigTopic::Line(LineKind::Lap),
        ConfigTopic::Line(LineKind::Finish),
        ConfigTopic::TotalLaps,
    ];

    /// Canonical topic name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigTopic::Line(LineKind::Start) => START_LINE_TOPIC,
            ConfigTopic::Line(LineKind::Lap) => LAP_LINE_TOPIC,
            ConfigTopic::Line(LineKind::Finish) => FINISH_LINE_TOPIC,
            ConfigTopic::TotalLaps => TOTAL_LAPS_TOPIC,
        }
    }

    /// Match a topic by its canonical name, allowing a namespace prefix such
    /// as `car7/config/start_line`.
    pub fn from_topic(topic: &str) -> Option<Self> {
        let topic = topic.trim_end_matches('/');
        Self::ALL.into_iter().find(|candidate| {
            let name = candidate.as_str();
            topic == name || topic.strip_suffix(name).is_some_and(|prefix| prefix.ends_with('/'))
        })
    }
}

impl EngineMessage {
    /// Parse a configuration payload received on `topic`.
    ///
    /// Line payloads are `{"p1": [lon, lat], "p2": [lon, lat]}`; an empty
    /// payload clears the line. Total laps is a non-negative integer.
    pub fn from_config(topic: &str, payload: &str) -> Result<Self> {
        let Some(config_topic) = ConfigTopic::from_topic(topic) else {
            return Err(TimingError::parse(topic, "unknown configuration topic"));
        };

        match config_topic {
            ConfigTopic::Line(kind) => parse_line(kind, payload),
            ConfigTopic::TotalLaps => parse_total_laps(payload),
        }
    }
}

fn parse_line(kind: LineKind, payload: &str) -> Result<EngineMessage> {
    if payload.trim().is_empty() {
        return Ok(EngineMessage::ClearLine(kind));
    }

    let parsed: LinePayload = serde_yaml_ng::from_str(payload).map_err(|err| {
        warn!(%kind, error = %err, "Malformed line payload");
        TimingError::invalid_line(kind, err.to_string())
    })?;
    let line = parsed.into_line(kind)?;
    Ok(EngineMessage::Line { kind, line })
}

fn parse_total_laps(payload: &str) -> Result<EngineMessage> {
    let text = payload.trim();
    let value: i64 = text.parse().map_err(|_| {
        warn!(payload = text, "Could not parse total laps");
        TimingError::parse(TOTAL_LAPS_TOPIC, format!("expected an integer, got {text:?}"))
    })?;

    let laps = u32::try_from(value).map_err(|_| {
        warn!(value, "Rejected total laps outside the valid range");
        TimingError::config(format!("total laps must be between 0 and {}, got {value}", u32::MAX))
    })?;
    Ok(EngineMessage::TotalLaps(laps))
}

impl From<Fix> for EngineMessage {
    fn from(fix: Fix) -> Self {
        EngineMessage::Fix(fix)
    }
}

impl From<FixRecord> for EngineMessage {
    fn from(record: FixRecord) -> Self {
        EngineMessage::Fix(record.into())
    }
}
