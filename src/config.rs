//! Engine configuration
//!
//! Loaded from YAML (or JSON, which is valid YAML). Every field has a
//! default, so an empty document yields a usable engine that waits for
//! lines and a lap count to arrive on the configuration topics.
//!
//! ```rust
//! use lapgate::{CrossingMode, EngineConfig};
//!
//! let config = EngineConfig::from_yaml(
//!     r#"
//! total_laps: 5
//! crossing_mode:
//!   kind: directed
//! lines:
//!   start: { p1: [6.1300, 49.6100], p2: [6.1302, 49.6100] }
//! "#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.total_laps, 5);
//! assert_eq!(config.crossing_mode, CrossingMode::Directed);
//! assert_eq!(config.debounce_window_secs, 2.0);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::debounce::DEFAULT_DEBOUNCE_WINDOW;
use crate::tracker::DEFAULT_FIX_LOSS_THRESHOLD;
use crate::types::{CrossingMode, LineKind, LinePayload, ReferenceLine};
use crate::{Result, TimingError};

/// Tunables and initial state for a [`TimingEngine`](crate::TimingEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Minimum seconds between accepted crossings of the same line kind
    pub debounce_window_secs: f64,
    /// Seconds without a valid fix before the probe segment is discarded
    pub fix_loss_threshold_secs: f64,
    pub crossing_mode: CrossingMode,
    /// Laps in the race, zero disables timing until configured
    pub total_laps: u32,
    /// Lines known at startup; later configuration messages replace them
    pub lines: LineConfig,
}

/// Optional initial reference lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(default, deny_unknown_fields)]
pub struct LineConfig {
    pub start: Option<LinePayload>,
    pub lap: Option<LinePayload>,
    pub finish: Option<LinePayload>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_window_secs: DEFAULT_DEBOUNCE_WINDOW.as_secs_f64(),
            fix_loss_threshold_secs: DEFAULT_FIX_LOSS_THRESHOLD.as_secs_f64(),
            crossing_mode: CrossingMode::default(),
            total_laps: 0,
            lines: LineConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a YAML or JSON document.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: EngineConfig = serde_yaml_ng::from_str(yaml).map_err(|e| TimingError::Parse {
            context: "Engine configuration".to_string(),
            details: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| TimingError::file_error(path.to_path_buf(), e))?;
        Self::from_yaml(&yaml)
    }

    /// Check thresholds, crossing mode and initial lines.
    pub fn validate(&self) -> Result<()> {
        if !self.debounce_window_secs.is_finite() || self.debounce_window_secs < 0.0 {
            return Err(TimingError::config(format!(
                "debounce_window_secs must be a non-negative number, got {}",
                self.debounce_window_secs
            )));
        }

        if !self.fix_loss_threshold_secs.is_finite() || self.fix_loss_threshold_secs <= 0.0 {
            return Err(TimingError::config(format!(
                "fix_loss_threshold_secs must be positive, got {}",
                self.fix_loss_threshold_secs
            )));
        }

        if !self.crossing_mode.is_valid() {
            return Err(TimingError::config(format!(
                "proximity radius must be a positive number of meters, got {:?}",
                self.crossing_mode.radius_m()
            )));
        }

        self.initial_lines().map(|_| ())
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::try_from_secs_f64(self.debounce_window_secs).unwrap_or(DEFAULT_DEBOUNCE_WINDOW)
    }

    pub fn fix_loss_threshold(&self) -> Duration {
        Duration::try_from_secs_f64(self.fix_loss_threshold_secs).unwrap_or(DEFAULT_FIX_LOSS_THRESHOLD)
    }

    /// Configured initial lines in start, lap, finish order.
    pub fn initial_lines(&self) -> Result<Vec<(LineKind, ReferenceLine)>> {
        let slots = [
            (LineKind::Start, self.lines.start),
            (LineKind::Lap, self.lines.lap),
            (LineKind::Finish, self.lines.finish),
        ];

        slots
            .into_iter()
            .filter_map(|(kind, payload)| payload.map(|p| p.into_line(kind).map(|line| (kind, line))))
            .collect()
    }

    pub fn with_total_laps(mut self, total_laps: u32) -> Self {
        self.total_laps = total_laps;
        self
    }

    pub fn with_crossing_mode(mut self, crossing_mode: CrossingMode) -> Self {
        self.crossing_mode = crossing_mode;
        self
    }

    pub fn with_line(mut self, kind: LineKind, line: ReferenceLine) -> Self {
        let payload = Some(LinePayload::from(line));
        match kind {
            LineKind::Start => self.lines.start = payload,
            LineKind::Lap => self.lines.lap = payload,
            LineKind::Finish => self.lines.finish = payload,
        }
        self
    }
}
