//! Race connections
//!
//! A [`RaceConnection`] owns a running driver task and exposes its output as
//! streams: race events as they happen and race snapshots whenever the status
//! changes. Dropping the connection stops the task.

use futures::{Stream, StreamExt};
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use tokio::sync::{broadcast, watch};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::{BroadcastStream, WatchStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::driver::Driver;
use crate::engine::TimingEngine;
use crate::provider::Provider;
use crate::providers::channel::{DEFAULT_CHANNEL_CAPACITY, MessageSender, channel};
use crate::providers::replay::ReplayProvider;
use crate::race::RaceSnapshot;
use crate::sink::{BroadcastSink, EventSink, LogSink};
use crate::types::RaceEvent;
use crate::Result;


/// Events buffered per subscriber before it starts lagging.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Running timing session
pub struct RaceConnection {
    /// Snapshot watch receiver
    snapshots: watch::Receiver<RaceSnapshot>,

    /// Receiver created before the driver started, handed to the first
    /// `events()` caller so that no event is missed
    first_events: Mutex<Option<broadcast::Receiver<RaceEvent>>>,

    /// Kept for resubscribing; never read
    spare_events: broadcast::Receiver<RaceEvent>,

    /// Cancellation token for stopping the driver
    cancel: CancellationToken,
}

impl RaceConnection {
    /// Start timing from any provider; events are also written to the log.
    pub async fn from_provider<P: Provider>(provider: P, config: &EngineConfig) -> Result<Self> {
        Self::with_sink(provider, config, LogSink).await
    }

    /// Start timing from any provider with an additional event sink, such as
    /// a publisher for the host's transport.
    pub async fn with_sink<P, S>(provider: P, config: &EngineConfig, sink: S) -> Result<Self>
    where
        P: Provider,
        S: EventSink,
    {
        let engine = TimingEngine::new(config)?;
        let (broadcast_sink, first_events) = BroadcastSink::channel(EVENT_CHANNEL_CAPACITY);
        let spare_events = broadcast_sink.subscribe();

        let channels = Driver::spawn(provider, engine, (broadcast_sink, sink));

        Ok(Self {
            snapshots: channels.snapshots,
            first_events: Mutex::new(Some(first_events)),
            spare_events,
            cancel: channels.cancel,
        })
    }

    /// Open a replay script and play it back in real time.
    pub async fn open<P: AsRef<Path>>(path: P, config: &EngineConfig) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening replay script: {}", path.display());
        let provider = ReplayProvider::new(path)?;
        Self::from_provider(provider, config).await
    }

    /// Start timing from live feeds.
    ///
    /// Returns the connection and the sender that the positioning and
    /// configuration feeds use. Timing ends once every sender clone is
    /// dropped.
    pub async fn channel(config: &EngineConfig) -> Result<(Self, MessageSender)> {
        let (sender, provider) = channel(DEFAULT_CHANNEL_CAPACITY);
        let connection = Self::from_provider(provider, config).await?;
        info!("Live timing connection opened");
        Ok((connection, sender))
    }

    /// Race events as they are emitted.
    ///
    /// The first call sees every event since the connection was created;
    /// later calls see events from the time of the call. The stream ends
    /// when the driver stops.
    pub fn events(&self) -> impl Stream<Item = RaceEvent> + 'static {
        let first = self.first_events.lock().unwrap_or_else(PoisonError::into_inner).take();
        let rx = first.unwrap_or_else(|| self.spare_events.resubscribe());

        BroadcastStream::new(rx).filter_map(|result| async move {
            match result {
                Ok(event) => Some(event),
                Err(BroadcastStreamRecvError::Lagged(missed)) => {
                    warn!("Event subscriber lagged, {} events dropped", missed);
                    None
                }
            }
        })
    }

    /// Race snapshots, starting with the current one.
    pub fn race_updates(&self) -> impl Stream<Item = RaceSnapshot> + 'static {
        WatchStream::new(self.snapshots.clone())
    }

    /// Latest race snapshot
    pub fn current_race(&self) -> RaceSnapshot {
        self.snapshots.borrow().clone()
    }

    /// The driver task is still running.
    pub fn is_running(&self) -> bool {
        self.snapshots.has_changed().is_ok()
    }

    /// Wait for the driver task to end and return the final snapshot.
    pub async fn finished(&self) -> RaceSnapshot {
        let mut snapshots = self.snapshots.clone();
        while snapshots.changed().await.is_ok() {}
        snapshots.borrow().clone()
    }

    /// Stop the driver task.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for RaceConnection {
    fn drop(&mut self) {
        debug!("Dropping race connection");
        // Cancel tasks on drop for clean shutdown
        self.cancel.cancel();
    }
}
