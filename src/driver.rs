//! Driver spawns and manages the timing task

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::engine::TimingEngine;
use crate::provider::Provider;
use crate::race::RaceSnapshot;
use crate::sink::EventSink;

/// Result of spawning the driver task
pub struct DriverChannels {
    /// Receiver for race status after every processed message
    pub snapshots: watch::Receiver<RaceSnapshot>,
    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,
}

/// Driver spawns and manages the timing task
///
/// A single task owns the provider, the engine and the sink, so every message
/// is applied in provider order and the engine never needs a lock.
pub struct Driver;

impl Driver {
    /// Spawn the timing task for the given provider
    ///
    /// Returns a watch receiver for race snapshots plus a cancellation token
    /// for graceful shutdown. The snapshot channel closes when the task ends.
    pub fn spawn<P, S>(provider: P, engine: TimingEngine, sink: S) -> DriverChannels
    where
        P: Provider,
        S: EventSink,
    {
        let (snapshot_tx, snapshot_rx) = watch::channel(engine.snapshot());
        let cancel = CancellationToken::new();
        let cancel_task = cancel.clone();

        tokio::spawn(async move {
            Self::timing_task(provider, engine, sink, snapshot_tx, cancel_task).await;
        });

        DriverChannels { snapshots: snapshot_rx, cancel }
    }

    /// Timing task - reads messages, applies them and forwards events
    async fn timing_task<P, S>(
        mut provider: P,
        mut engine: TimingEngine,
        mut sink: S,
        snapshot_tx: watch::Sender<RaceSnapshot>,
        cancel: CancellationToken,
    ) where
        P: Provider,
        S: EventSink,
    {
        info!("Timing task started");
        let mut message_count = 0u64;
        let mut event_count = 0u64;
        let mut error_count = 0u32;
        const MAX_ERRORS: u32 = 10;

        loop {
            if cancel.is_cancelled() {
                info!("Timing task cancelled");
                break;
            }

            // Use select to allow cancellation while waiting on the provider
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Timing task cancelled during read");
                    break;
                }
                result = provider.next_message() => result,
            };

            match result {
                Ok(Some(message)) => {
                    message_count += 1;
                    error_count = 0;
                    trace!("Message {}: {:?}", message_count, message);

                    let events = engine.handle(message);
                    for event in &events {
                        event_count += 1;
                        // Delivery failures never roll back the engine
                        if let Err(e) = sink.publish(event) {
                            warn!(event = event.name(), "Failed to deliver event: {}", e);
                        }
                    }

                    let snapshot = engine.snapshot();
                    snapshot_tx.send_if_modified(|current| {
                        if *current == snapshot {
                            false
                        } else {
                            *current = snapshot;
                            true
                        }
                    });
                }
                Ok(None) => {
                    info!("Provider stream ended after {} messages", message_count);
                    break;
                }
                Err(e) => {
                    // Provider error - don't crash on transient failures
                    error_count += 1;
                    error!("Provider error ({}/{}): {}", error_count, MAX_ERRORS, e);

                    if error_count >= MAX_ERRORS {
                        error!("Too many provider errors, shutting down");
                        break;
                    }

                    // Exponential backoff: 100ms, 200ms, 400ms, ... capped at 1.6s
                    let backoff = std::time::Duration::from_millis(50 * (1 << error_count.min(5)));
                    debug!("Backing off for {:?}", backoff);
                    tokio::time::sleep(backoff).await;
                }
            }
        }

        info!(
            "Timing task ended (processed {} messages, emitted {} events)",
            message_count, event_count
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::EngineMessage;
    use crate::providers::channel;
    use crate::race::RacePhase;
    use crate::test_utils::{FixFeed, RecordingSink, start_gate};
    use crate::types::LineKind;
    use crate::{EngineConfig, Result, TimingError};
    use std::time::Duration;

    /// Yields a fixed sequence of results, then ends.
    struct ScriptedProvider {
        results: std::vec::IntoIter<Result<Option<EngineMessage>>>,
    }

    #[async_trait::async_trait]
    impl Provider for ScriptedProvider {
        async fn next_message(&mut self) -> Result<Option<EngineMessage>> {
            self.results.next().unwrap_or(Ok(None))
        }
    }

    async fn wait_closed(snapshots: &mut watch::Receiver<RaceSnapshot>) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while snapshots.changed().await.is_ok() {}
        })
        .await
        .expect("driver did not finish");
    }

    #[tokio::test]
    async fn applies_messages_and_forwards_events() {
        let _ = tracing_subscriber::fmt::try_init();
        let (sender, provider) = channel(64);
        let sink = RecordingSink::default();
        let config = EngineConfig::default().with_total_laps(2).with_line(LineKind::Start, start_gate());
        let mut channels = Driver::spawn(provider, TimingEngine::new(&config).unwrap(), sink.clone());

        for message in FixFeed::new().cross(start_gate(), 1.0).messages() {
            sender.send(message).await.unwrap();
        }
        drop(sender);
        wait_closed(&mut channels.snapshots).await;

        assert_eq!(sink.names(), vec!["race_started"]);
        assert_eq!(channels.snapshots.borrow().phase, RacePhase::InLap(1));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_are_survived() {
        let results = vec![
            Err(TimingError::delivery_failed("glitch")),
            Ok(Some(EngineMessage::TotalLaps(4))),
            Err(TimingError::parse("config/lap_line", "bad json")),
            Ok(Some(EngineMessage::TotalLaps(5))),
        ];
        let provider = ScriptedProvider { results: results.into_iter() };
        let mut channels = Driver::spawn(provider, TimingEngine::default(), RecordingSink::default());

        wait_closed(&mut channels.snapshots).await;
        assert_eq!(channels.snapshots.borrow().total_laps, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_repeated_errors() {
        let mut results: Vec<_> = (0..12).map(|_| Err(TimingError::delivery_failed("down"))).collect();
        results.push(Ok(Some(EngineMessage::TotalLaps(9))));
        let provider = ScriptedProvider { results: results.into_iter() };
        let mut channels = Driver::spawn(provider, TimingEngine::default(), RecordingSink::default());

        tokio::time::timeout(Duration::from_secs(30), async {
            while channels.snapshots.changed().await.is_ok() {}
        })
        .await
        .expect("driver did not stop");
        assert_eq!(channels.snapshots.borrow().total_laps, 0);
    }

    #[tokio::test]
    async fn cancellation_stops_the_task() {
        let (sender, provider) = channel(4);
        let mut channels = Driver::spawn(provider, TimingEngine::default(), RecordingSink::default());

        channels.cancel.cancel();
        wait_closed(&mut channels.snapshots).await;
        assert!(sender.is_closed());
    }
}
