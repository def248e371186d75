//! Channel provider for live feeds
//!
//! The positioning feed and the configuration feed usually run on their own
//! tasks or threads. Each gets a clone of [`MessageSender`]; the bounded
//! channel behind it is the single ordered queue the driver consumes.

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::message::EngineMessage;
use crate::provider::Provider;
use crate::types::{Fix, FixRecord};
use crate::{Result, TimingError};

/// Default queue depth between feeds and the driver.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Create a connected sender/provider pair.
pub fn channel(capacity: usize) -> (MessageSender, ChannelProvider) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (MessageSender { tx }, ChannelProvider { rx })
}

/// Cloneable handle used by feeds to submit messages.
#[derive(Debug, Clone)]
pub struct MessageSender {
    tx: mpsc::Sender<EngineMessage>,
}

impl MessageSender {
    /// Queue a message, waiting for capacity.
    pub async fn send(&self, message: EngineMessage) -> Result<()> {
        self.tx.send(message).await.map_err(|_| TimingError::ChannelClosed)
    }

    /// Queue a message without waiting. A full queue is reported as a
    /// retryable delivery error.
    pub fn try_send(&self, message: EngineMessage) -> Result<()> {
        self.tx.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TimingError::delivery_failed("message queue is full"),
            mpsc::error::TrySendError::Closed(_) => TimingError::ChannelClosed,
        })
    }

    /// Queue a position fix.
    pub async fn send_fix(&self, fix: impl Into<Fix>) -> Result<()> {
        let fix = fix.into();
        trace!(position = %fix.position, at = %fix.timestamp, valid = fix.valid, "Queueing fix");
        self.send(EngineMessage::Fix(fix)).await
    }

    /// Queue a fix record as delivered by a decoder.
    pub async fn send_fix_record(&self, record: FixRecord) -> Result<()> {
        self.send_fix(record).await
    }

    /// Parse a configuration payload and queue it.
    ///
    /// Malformed payloads are returned as errors and never reach the engine,
    /// so the previously configured value stays active.
    pub async fn send_config(&self, topic: &str, payload: &str) -> Result<()> {
        let message = EngineMessage::from_config(topic, payload)?;
        debug!(topic, "Queueing configuration update");
        self.send(message).await
    }

    /// The driver has stopped consuming messages.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Provider side of [`channel`]; ends when every sender is dropped.
#[derive(Debug)]
pub struct ChannelProvider {
    rx: mpsc::Receiver<EngineMessage>,
}

#[async_trait::async_trait]
impl Provider for ChannelProvider {
    async fn next_message(&mut self) -> Result<Option<EngineMessage>> {
        Ok(self.rx.recv().await)
    }
}
