//! Simulated connection, for benches and hardware-free hosts.

use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::driver::Driver;
use crate::provider::Provider;
use crate::providers::SimProvider;
use crate::stream::DownsampleExt;
use crate::types::{ChannelView, LinkStatus, Sample, SamplePacket, UpdateRate};
use crate::Result;

/// Streaming connection to the simulator.
///
/// Behaves like [`LiveConnection`](crate::connection::LiveConnection) —
/// same streams, same sample shapes — with synthetic motion instead of a
/// device, so host applications can be developed and demonstrated with no
/// sensor on the network.
pub struct SimConnection {
    samples: watch::Receiver<Option<Arc<SamplePacket>>>,
    status: watch::Receiver<Option<LinkStatus>>,
    view: ChannelView,
    source_hz: f64,
    cancel: CancellationToken,
}

impl SimConnection {
    /// Start a simulator streaming the given view at `source_hz`.
    ///
    /// Waits for the first sample so the connection is ready to subscribe
    /// against when it returns.
    pub async fn start(view: ChannelView, source_hz: f64) -> Result<Self> {
        Self::spawn(SimProvider::new(view, source_hz)).await
    }

    /// Start a simulator with a fixed noise seed, for reproducible runs.
    pub async fn seeded(view: ChannelView, source_hz: f64, seed: u64) -> Result<Self> {
        Self::spawn(SimProvider::seeded(view, source_hz, seed)).await
    }

    async fn spawn(provider: SimProvider) -> Result<Self> {
        let view = provider.view();
        let source_hz = provider.tick_rate();
        info!(view = %view, source_hz, "starting simulated sensor");

        let channels = Driver::spawn(provider);

        // The simulator produces immediately; wait for the first sample so
        // subscribers see data from their first poll.
        let mut sample_rx = channels.samples.clone();
        let wait = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if sample_rx.borrow().is_some() {
                    break;
                }
                if sample_rx.changed().await.is_err() {
                    break;
                }
            }
        })
        .await;
        if wait.is_err() {
            warn!("timeout waiting for first simulated sample");
        }

        Ok(Self {
            samples: channels.samples,
            status: channels.status,
            view,
            source_hz,
            cancel: channels.cancel,
        })
    }

    /// Subscribe to composed samples.
    pub fn subscribe(&self, rate: UpdateRate) -> impl Stream<Item = Sample> + 'static {
        let samples = WatchStream::new(self.samples.clone())
            .skip_while(|opt| {
                let waiting = opt.is_none();
                async move { waiting }
            })
            .take_while(|opt| {
                let live = opt.is_some();
                async move { live }
            })
            .filter_map(|opt| async move { opt });

        match rate.interval(self.source_hz) {
            None => samples.map(|packet| packet.sample.clone()).boxed(),
            Some(period) => {
                samples.downsample(period).map(|packet| packet.sample.clone()).boxed()
            }
        }
    }

    /// Link status changes as a stream.
    pub fn status_updates(&self) -> impl Stream<Item = LinkStatus> + 'static {
        WatchStream::new(self.status.clone()).filter_map(|opt| async move { opt })
    }

    /// Most recent link status.
    pub fn current_status(&self) -> Option<LinkStatus> {
        *self.status.borrow()
    }

    /// The view this connection composes.
    pub fn view(&self) -> ChannelView {
        self.view
    }

    /// Simulated source frequency.
    pub fn source_hz(&self) -> f64 {
        self.source_hz
    }
}

impl Drop for SimConnection {
    fn drop(&mut self) {
        debug!("dropping simulated connection");
        self.cancel.cancel();
    }
}
