//! Event sinks
//!
//! Event emission is fire-and-forget. A sink that fails to deliver reports an
//! error, the driver logs it and moves on; race state is never rolled back
//! and nothing is re-sent.

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

use crate::types::RaceEvent;
use crate::{Result, TimingError};

/// Destination for race events.
pub trait EventSink: Send + 'static {
    /// Deliver one event without blocking.
    fn publish(&mut self, event: &RaceEvent) -> Result<()>;
}

/// Fans events out to every subscriber of a broadcast channel.
///
/// Having no subscribers is not an error; the event is dropped.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<RaceEvent>,
}

impl BroadcastSink {
    pub fn new(tx: broadcast::Sender<RaceEvent>) -> Self {
        Self { tx }
    }

    /// Create a sink with its own channel, returning the first receiver.
    pub fn channel(capacity: usize) -> (Self, broadcast::Receiver<RaceEvent>) {
        let (tx, rx) = broadcast::channel(capacity);
        (Self { tx }, rx)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RaceEvent> {
        self.tx.subscribe()
    }
}

impl EventSink for BroadcastSink {
    fn publish(&mut self, event: &RaceEvent) -> Result<()> {
        if self.tx.send(event.clone()).is_err() {
            debug!(event = event.name(), "No event subscribers, dropping event");
        }
        Ok(())
    }
}

/// Writes each event as a structured log record.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn publish(&mut self, event: &RaceEvent) -> Result<()> {
        info!(event = event.name(), at = %event.time(), payload = ?event.to_payload(), "Race event");
        Ok(())
    }
}

impl EventSink for mpsc::UnboundedSender<RaceEvent> {
    fn publish(&mut self, event: &RaceEvent) -> Result<()> {
        self.send(event.clone()).map_err(|_| TimingError::ChannelClosed)
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn publish(&mut self, event: &RaceEvent) -> Result<()> {
        (**self).publish(event)
    }
}

/// Both sinks always receive the event; the first failure is reported.
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn publish(&mut self, event: &RaceEvent) -> Result<()> {
        let first = self.0.publish(event);
        let second = self.1.publish(event);
        first.and(second)
    }
}
