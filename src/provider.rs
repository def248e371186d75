//! Provider trait for engine input sources

use crate::Result;
use crate::message::EngineMessage;

/// Trait for engine input sources
///
/// Providers abstract over where messages come from (a live channel fed by
/// the positioning and configuration feeds, or a recorded replay script) and
/// handle their own pacing internally.
#[async_trait::async_trait]
pub trait Provider: Send + 'static {
    /// Get the next engine message
    ///
    /// Returns:
    /// - `Ok(Some(message))` - New message available
    /// - `Ok(None)` - Stream ended (normal termination)
    /// - `Err(e)` - Transient error; the driver backs off and asks again
    ///
    /// Each provider handles timing internally:
    /// - Channel: Waits for the next message from any sender
    /// - Replay: Sleeps according to fix timestamps and playback speed
    async fn next_message(&mut self) -> Result<Option<EngineMessage>>;
}
