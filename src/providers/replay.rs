//! Replay provider for recorded sessions
//!
//! A replay script is a YAML document listing fixes and configuration
//! updates in the order they were received:
//!
//! ```yaml
//! name: warmup lap
//! steps:
//!   - { type: config, topic: config/total_laps, payload: "1" }
//!   - { type: fix, latitude: 49.61, longitude: 6.13, timestamp: 12.0, has_fix: true }
//!   - { type: reset }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use crate::message::EngineMessage;
use crate::provider::Provider;
use crate::tracker::DEFAULT_FIX_LOSS_THRESHOLD;
use crate::types::{Fix, FixRecord, Timestamp};
use crate::{Result, TimingError};

/// Slowest and fastest playback speeds accepted by [`ReplayProvider::set_speed`].
pub const SPEED_RANGE: (f64, f64) = (0.1, 100.0);

/// Longest recorded gap reproduced while pacing. Anything longer already
/// re-seeds the position tracker, so waiting it out adds nothing.
pub const MAX_PACING_GAP: Duration = DEFAULT_FIX_LOSS_THRESHOLD;

/// One recorded input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayStep {
    Fix(FixRecord),
    Config { topic: String, payload: String },
    Reset,
}

/// A recorded session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplayScript {
    #[serde(default)]
    pub name: Option<String>,
    pub steps: Vec<ReplayStep>,
}

impl ReplayScript {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml_ng::from_str(yaml).map_err(|e| TimingError::Parse {
            context: "Replay script".to_string(),
            details: e.to_string(),
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml =
            std::fs::read_to_string(path).map_err(|e| TimingError::file_error(path.to_path_buf(), e))?;
        Self::from_yaml(&yaml)
    }

    /// Span between the first and last fix timestamps.
    pub fn duration(&self) -> Duration {
        let mut times = self.steps.iter().filter_map(|step| match step {
            ReplayStep::Fix(record) => Some(Timestamp::from_secs_f64(record.timestamp)),
            _ => None,
        });
        let Some(first) = times.next() else {
            return Duration::ZERO;
        };
        let last = times.fold(first, Ord::max);
        last.saturating_duration_since(first)
    }
}

/// Replay provider that plays back a [`ReplayScript`]
pub struct ReplayProvider {
    steps: std::vec::IntoIter<ReplayStep>,

    /// Playback speed multiplier, `None` plays back as fast as possible
    speed: Option<f64>,

    /// Timestamp of the last fix handed out, used for pacing
    last_fix_time: Option<Timestamp>,

    position: usize,
    total: usize,
}

impl ReplayProvider {
    /// Open a replay script at normal speed.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let script = ReplayScript::from_file(path)?;
        info!(
            path = %path.display(),
            steps = script.steps.len(),
            duration = ?script.duration(),
            "Opened replay script"
        );
        Ok(Self::from_script(script))
    }

    pub fn from_script(script: ReplayScript) -> Self {
        let total = script.steps.len();
        Self { steps: script.steps.into_iter(), speed: Some(1.0), last_fix_time: None, position: 0, total }
    }

    /// Set playback speed
    pub fn set_speed(&mut self, speed: f64) {
        let speed = if speed.is_nan() { 1.0 } else { speed.clamp(SPEED_RANGE.0, SPEED_RANGE.1) };
        self.speed = Some(speed);
        debug!("Playback speed set to {}x", speed);
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.set_speed(speed);
        self
    }

    /// Disable pacing.
    pub fn unpaced(mut self) -> Self {
        self.speed = None;
        self
    }

    pub fn speed(&self) -> Option<f64> {
        self.speed
    }

    /// Steps handed out so far and total steps.
    pub fn progress(&self) -> (usize, usize) {
        (self.position, self.total)
    }

    async fn pace(&mut self, at: Timestamp) {
        if let (Some(speed), Some(last)) = (self.speed, self.last_fix_time) {
            let mut gap = at.saturating_duration_since(last);
            if gap > MAX_PACING_GAP {
                warn!(gap = ?gap, at = %at, "Replay gap too long, pacing only {:?}", MAX_PACING_GAP);
                gap = MAX_PACING_GAP;
            }
            if !gap.is_zero() {
                tokio::time::sleep(gap.div_f64(speed)).await;
            }
        }
        self.last_fix_time = Some(self.last_fix_time.map_or(at, |last| last.max(at)));
    }
}

#[async_trait::async_trait]
impl Provider for ReplayProvider {
    async fn next_message(&mut self) -> Result<Option<EngineMessage>> {
        let Some(step) = self.steps.next() else {
            debug!("Reached end of replay");
            return Ok(None);
        };
        self.position += 1;
        trace!("Step {}/{}: {:?}", self.position, self.total, step);

        match step {
            ReplayStep::Fix(record) => {
                let fix = Fix::from(record);
                self.pace(fix.timestamp).await;
                Ok(Some(EngineMessage::Fix(fix)))
            }
            ReplayStep::Config { topic, payload } => EngineMessage::from_config(&topic, &payload).map(Some),
            ReplayStep::Reset => Ok(Some(EngineMessage::Reset)),
        }
    }
}
