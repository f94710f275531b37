//! Driver spawns and manages the sample-reading task.

use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::provider::Provider;
use crate::types::{LinkStatus, SamplePacket};

/// Result of spawning the driver task.
pub struct DriverChannels {
    /// Receiver for sample packets; `None` until the first sample, and again
    /// once the stream ends.
    pub samples: watch::Receiver<Option<Arc<SamplePacket>>>,
    /// Receiver for link status; `None` until the first observation.
    pub status: watch::Receiver<Option<LinkStatus>>,
    /// Cancellation token for graceful shutdown.
    pub cancel: CancellationToken,
}

/// Spawns the task that owns a [`Provider`] and publishes its samples.
///
/// The reader task is the single logical thread driving the session's
/// socket; subscribers get samples over the watch channel and never touch
/// the provider directly.
pub struct Driver;

impl Driver {
    /// Spawn the reader task for the given provider.
    pub fn spawn<P>(provider: P) -> DriverChannels
    where
        P: Provider,
    {
        let (sample_tx, sample_rx) = watch::channel(None);
        let (status_tx, status_rx) = watch::channel(None);
        let cancel = CancellationToken::new();
        let cancel_reader = cancel.clone();

        tokio::spawn(async move {
            Self::reader_task(provider, sample_tx, status_tx, cancel_reader).await;
        });

        DriverChannels { samples: sample_rx, status: status_rx, cancel }
    }

    /// Reader task: pulls samples and tracks the link condition.
    async fn reader_task<P>(
        mut provider: P,
        sample_tx: watch::Sender<Option<Arc<SamplePacket>>>,
        status_tx: watch::Sender<Option<LinkStatus>>,
        cancel: CancellationToken,
    ) where
        P: Provider,
    {
        info!(view = %provider.view(), "sample reader task started");
        let mut sample_count = 0u64;
        let mut missed = 0u32;
        let mut error_count = 0u32;
        const MAX_ERRORS: u32 = 10;

        loop {
            if cancel.is_cancelled() {
                info!("sample reader cancelled");
                break;
            }

            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("sample reader cancelled during read");
                    break;
                }
                result = provider.next_sample() => result,
            };

            match result {
                Ok(Some(packet)) => {
                    sample_count += 1;
                    error_count = 0;

                    // Surface the stale/live condition; the caller decides
                    // whether to keep waiting or abort.
                    let status = if packet.sample.synthetic {
                        missed += 1;
                        LinkStatus::Stale { missed }
                    } else {
                        missed = 0;
                        LinkStatus::Live
                    };
                    trace!(seq = packet.seq, ?status, "sample");
                    if *status_tx.borrow() != Some(status) {
                        let _ = status_tx.send(Some(status));
                    }

                    if sample_tx.send(Some(Arc::new(packet))).is_err() {
                        debug!("sample receiver dropped, shutting down");
                        break;
                    }
                }
                Ok(None) => {
                    info!("provider stream ended after {} samples", sample_count);
                    let _ = sample_tx.send(None);
                    break;
                }
                Err(e) if !e.is_retryable() => {
                    // Fatal for the session; retrying cannot help.
                    error!(error = %e, "fatal provider error, shutting down");
                    let _ = sample_tx.send(None);
                    break;
                }
                Err(e) => {
                    error_count += 1;
                    warn!(error = %e, "provider error ({}/{})", error_count, MAX_ERRORS);

                    if error_count >= MAX_ERRORS {
                        error!("too many provider errors, shutting down");
                        let _ = sample_tx.send(None);
                        break;
                    }

                    // Exponential backoff: 50ms, 100ms, 200ms, ...
                    let backoff =
                        std::time::Duration::from_millis(50 * (1 << error_count.min(5)));
                    tokio::time::sleep(backoff).await;
                }
            }
        }

        info!("sample reader task ended ({} samples)", sample_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::SimProvider;
    use crate::types::ChannelView;

    #[tokio::test]
    async fn driver_publishes_simulator_samples() {
        let provider = SimProvider::seeded(ChannelView::Accelerometer, 500.0, 3);
        let mut channels = Driver::spawn(provider);

        // Wait for the first sample to land.
        loop {
            channels.samples.changed().await.unwrap();
            if channels.samples.borrow().is_some() {
                break;
            }
        }

        let packet = channels.samples.borrow().clone().unwrap();
        assert_eq!(packet.view, ChannelView::Accelerometer);
        assert_eq!(packet.sample.values.len(), 3);
        assert_eq!(*channels.status.borrow(), Some(LinkStatus::Live));

        channels.cancel.cancel();
    }

    #[tokio::test]
    async fn cancellation_stops_the_reader() {
        let provider = SimProvider::seeded(ChannelView::Data, 500.0, 3);
        let channels = Driver::spawn(provider);
        channels.cancel.cancel();

        // After cancellation the sender side goes away; changed() eventually
        // errors once the task drops its sender.
        let mut samples = channels.samples.clone();
        loop {
            if samples.changed().await.is_err() {
                break;
            }
        }
    }
}
