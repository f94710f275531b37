//! Live connection to a discovered sensor.

use std::net::SocketAddr;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::driver::Driver;
use crate::provider::Provider;
use crate::providers::LiveProvider;
use crate::stream::DownsampleExt;
use crate::types::{ChannelView, LinkStatus, Sample, SamplePacket, UpdateRate};
use crate::Result;

/// Streaming connection to a live sensor.
///
/// Owns the background reader task; subscribers pull composed samples over
/// watch-backed streams and never touch the socket.
pub struct LiveConnection {
    /// Sample watch receiver.
    samples: watch::Receiver<Option<Arc<SamplePacket>>>,

    /// Link status watch receiver.
    status: watch::Receiver<Option<LinkStatus>>,

    /// Device endpoint from the discovery handshake.
    endpoint: SocketAddr,

    /// Composed view.
    view: ChannelView,

    /// Nominal source frequency.
    source_hz: f64,

    /// Cancellation token for stopping the reader task.
    cancel: CancellationToken,
}

impl LiveConnection {
    /// Discover a sensor and start streaming the given view.
    ///
    /// Runs the broadcast handshake, then spawns the reader task. Returns as
    /// soon as the device is bound; the first sample arrives on the streams
    /// once the device starts sending.
    pub async fn connect(config: SessionConfig, view: ChannelView) -> Result<Self> {
        info!(view = %view, "connecting to sensor");

        let provider = LiveProvider::open(config, view).await?;
        let endpoint = provider.endpoint();
        let source_hz = provider.tick_rate();

        let channels = Driver::spawn(provider);

        info!(device = %endpoint, source_hz, "live connection established");

        Ok(Self {
            samples: channels.samples,
            status: channels.status,
            endpoint,
            view,
            source_hz,
            cancel: channels.cancel,
        })
    }

    /// Subscribe to composed samples.
    ///
    /// The stream stays quiet until the first sample arrives, then ends when
    /// the session does. With `UpdateRate::Max`, faster samples are thinned
    /// latest-wins to the requested cadence.
    pub fn subscribe(&self, rate: UpdateRate) -> impl Stream<Item = Sample> + 'static {
        // WatchStream yields the current value immediately, which is None
        // until the reader publishes its first sample. Skip that leading
        // None so the stream waits instead of ending; after the first
        // sample, a None means the provider stopped.
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

    /// Link status changes as a stream (live ↔ stale transitions).
    pub fn status_updates(&self) -> impl Stream<Item = LinkStatus> + 'static {
        WatchStream::new(self.status.clone()).filter_map(|opt| async move { opt })
    }

    /// Most recent link status, if any sample has been observed.
    pub fn current_status(&self) -> Option<LinkStatus> {
        *self.status.borrow()
    }

    /// The device endpoint discovered during the handshake.
    pub fn endpoint(&self) -> SocketAddr {
        self.endpoint
    }

    /// The view this connection composes.
    pub fn view(&self) -> ChannelView {
        self.view
    }

    /// Nominal source frequency.
    pub fn source_hz(&self) -> f64 {
        self.source_hz
    }
}

impl Drop for LiveConnection {
    fn drop(&mut self) {
        debug!(device = %self.endpoint, "dropping live connection");
        self.cancel.cancel();
    }
}
