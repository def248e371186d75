//! Error types for lap timing.
//!
//! Nothing in the timing engine itself is fatal: a rejected configuration
//! leaves the previous line in place, a missing fix only skips crossing checks,
//! and an undeliverable event never rolls back a race transition. The errors
//! below surface at the edges of the engine, where payloads are parsed,
//! scripts are loaded and events are handed to sinks.
//!
//! ## Error Categories
//!
//! - **Configuration Errors**: Malformed engine configuration or line payloads
//! - **File Errors**: Problems reading configuration or replay scripts
//! - **Parse Errors**: Payloads that are not valid YAML/JSON
//! - **Delivery Errors**: Event sinks that failed to accept an event
//! - **Channel Errors**: The single ordered message queue has been closed
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use lapgate::TimingError;
//!
//! let error = TimingError::delivery_failed("broker unreachable");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::types::LineKind;

/// Result type alias for lap timing operations.
pub type Result<T, E = TimingError> = std::result::Result<T, E>;

/// Main error type for lap timing operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TimingError {
    #[error("Invalid engine configuration: {reason}")]
    Config { reason: String },

    #[error("Invalid {kind} line: {details}")]
    InvalidLine { kind: LineKind, details: String },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("File error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to deliver event: {reason}")]
    Delivery { reason: String },

    #[error("Message channel closed")]
    ChannelClosed,
}

impl TimingError {
    /// Returns whether this error is potentially recoverable through retry.
    ///
    /// The engine never retries on its own; this is guidance for hosts that
    /// own a transport.
    pub fn is_retryable(&self) -> bool {
        match self {
            TimingError::Config { .. } => false,
            TimingError::InvalidLine { .. } => false,
            TimingError::Parse { .. } => false,
            TimingError::File { .. } => false,
            TimingError::Delivery { .. } => true,
            TimingError::ChannelClosed => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            TimingError::Config { .. } => vec![
                "Check debounce and fix-loss thresholds are positive",
                "Check the proximity radius is a positive number of meters",
                "Compare the configuration against the documented defaults",
            ],
            TimingError::InvalidLine { .. } => vec![
                "Send both endpoints as [longitude, latitude] pairs",
                "Check coordinates are finite decimal degrees",
                "The previously configured line stays active until a valid one arrives",
            ],
            TimingError::Parse { .. } => vec![
                "Check the payload is valid JSON or YAML",
                "Verify the topic matches the payload shape",
            ],
            TimingError::File { .. } => vec![
                "Check file exists and is readable",
                "Check file permissions",
            ],
            TimingError::Delivery { .. } => vec![
                "Check the event consumer is still subscribed",
                "Check the downstream transport is connected",
                "Events are not re-sent; replay from the race snapshot if needed",
            ],
            TimingError::ChannelClosed => vec![
                "The timing driver has shut down",
                "Open a new connection to resume timing",
            ],
        }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        TimingError::File { path, source }
    }

    /// Helper constructor for configuration errors.
    pub fn config(reason: impl Into<String>) -> Self {
        TimingError::Config { reason: reason.into() }
    }

    /// Helper constructor for rejected line payloads.
    pub fn invalid_line(kind: LineKind, details: impl Into<String>) -> Self {
        TimingError::InvalidLine { kind, details: details.into() }
    }

    /// Helper constructor for parse errors.
    pub fn parse(context: impl Into<String>, details: impl Into<String>) -> Self {
        TimingError::Parse { context: context.into(), details: details.into() }
    }

    /// Helper constructor for event delivery failures.
    pub fn delivery_failed(reason: impl Into<String>) -> Self {
        TimingError::Delivery { reason: reason.into() }
    }
}

impl From<std::io::Error> for TimingError {
    fn from(err: std::io::Error) -> Self {
        TimingError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}

impl From<serde_yaml_ng::Error> for TimingError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        TimingError::Parse { context: "YAML".to_string(), details: err.to_string() }
    }
}
