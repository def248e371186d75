//! GPS line-crossing lap timing.
//!
//! Lapgate turns a stream of position fixes into race events. Every pair of
//! consecutive fixes is tested against configured start, lap and finish lines;
//! accepted crossings drive a race state machine that emits lap and race
//! timing events.
//!
//! # Features
//!
//! - **Live feeds**: push fixes and configuration updates through a channel
//! - **Replay**: play recorded sessions back in real time or as fast as possible
//! - **Typed configuration**: YAML engine configuration and topic payload parsing
//! - **Streams**: race events and race status as `futures` streams
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use lapgate::{EngineConfig, Lapgate};
//!
//! #[tokio::main]
//! async fn main() -> lapgate::Result<()> {
//!     let config = EngineConfig::from_yaml_file("track.yaml")?;
//!     let connection = Lapgate::open("session.yaml", &config).await?;
//!     let mut events = std::pin::pin!(connection.events());
//!
//!     while let Some(event) = events.next().await {
//!         println!("{}: {:?}", event.name(), event.to_payload());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! The engine itself is synchronous and can be used without a runtime:
//!
//! ```rust
//! use lapgate::{EngineConfig, EngineMessage, Fix, GeoPoint, LineKind, ReferenceLine, Timestamp, TimingEngine};
//!
//! let start = ReferenceLine::new(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0002, 0.0));
//! let config = EngineConfig::default().with_total_laps(3).with_line(LineKind::Start, start);
//! let mut engine = TimingEngine::new(&config).unwrap();
//!
//! engine.handle(EngineMessage::Fix(Fix::new(GeoPoint::new(0.0001, -0.00005), Timestamp::from_secs_f64(9.9))));
//! let events = engine.handle(EngineMessage::Fix(Fix::new(GeoPoint::new(0.0001, 0.00005), Timestamp::from_secs_f64(10.0))));
//!
//! assert_eq!(events[0].name(), "race_started");
//! assert_eq!(engine.snapshot().current_lap, 1);
//! ```

// Core types and error handling
mod error;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Timing pipeline
pub mod debounce;
pub mod detector;
pub mod engine;
pub mod geometry;
pub mod race;
pub mod registry;
pub mod tracker;

// Inputs and configuration
pub mod config;
pub mod message;

// Stream-based session architecture
pub mod connection;
pub mod driver;
pub mod provider;
pub mod providers;
pub mod sink;

// Core exports
pub use error::*;
pub use types::*;

// Main API exports
pub use config::{EngineConfig, LineConfig};
pub use connection::RaceConnection;
pub use engine::TimingEngine;
pub use message::EngineMessage;
pub use provider::Provider;
pub use providers::{MessageSender, ReplayProvider};
pub use race::{RacePhase, RaceSnapshot};
pub use sink::{BroadcastSink, EventSink, LogSink};

/// Unified entry point for timing sessions.
///
/// Both constructors return a [`RaceConnection`] with the same streams, so
/// consumers do not care whether fixes come from a live receiver or a
/// recording.
///
/// # Examples
///
/// ## Live feeds
/// ```rust,no_run
/// use lapgate::{EngineConfig, Lapgate};
///
/// #[tokio::main]
/// async fn main() -> lapgate::Result<()> {
///     let (connection, sender) = Lapgate::channel(&EngineConfig::default()).await?;
///     sender.send_config("config/total_laps", "5").await?;
///     // Forward decoded fixes with sender.send_fix_record(..)
///     Ok(())
/// }
/// ```
///
/// ## Replay
/// ```rust,no_run
/// use lapgate::{EngineConfig, Lapgate};
///
/// #[tokio::main]
/// async fn main() -> lapgate::Result<()> {
///     let connection = Lapgate::open("session.yaml", &EngineConfig::default()).await?;
///     let result = connection.finished().await;
///     println!("Best lap: {:?}", result.best_lap_time_sec);
///     Ok(())
/// }
/// ```
pub struct Lapgate;

impl Lapgate {
    /// Start a live timing session.
    ///
    /// Returns the connection and a [`MessageSender`] for the positioning and
    /// configuration feeds. The session ends when every sender is dropped or
    /// the connection is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub async fn channel(config: &EngineConfig) -> Result<(RaceConnection, MessageSender)> {
        RaceConnection::channel(config).await
    }

    /// Replay a recorded session in real time.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration is invalid
    /// - The file does not exist or is not readable
    /// - The file is not a valid replay script
    pub async fn open<P: AsRef<std::path::Path>>(path: P, config: &EngineConfig) -> Result<RaceConnection> {
        RaceConnection::open(path, config).await
    }
}
