//! Live provider: the decode cycle against a discovered sensor.

use tracing::{debug, info, trace, warn};

use crate::assembler::SampleAssembler;
use crate::config::SessionConfig;
use crate::osc::flatten;
use crate::provider::Provider;
use crate::session::SensorSession;
use crate::types::{ChannelView, SamplePacket};
use crate::{ImuError, Result};

/// How many consecutive empty ticks to tolerate while still waiting for the
/// very first sample. After discovery the device starts sending within a few
/// packets; a whole minute of silence means the link is not going to come up.
const MAX_FIRST_SAMPLE_TICKS: u32 = 300;

/// Live provider that decodes datagrams from a bound session.
///
/// Runs the full cycle per tick: receive → flatten → compose. Receive
/// timeouts and per-datagram decode errors are absorbed into synthetic
/// samples once a first good sample exists, so downstream consumers see an
/// unbroken cadence through WiFi dropouts.
pub struct LiveProvider {
    session: SensorSession,
    assembler: SampleAssembler,
    seq: u64,
}

impl LiveProvider {
    /// Discover a sensor and build a provider for the given view.
    pub async fn open(config: SessionConfig, view: ChannelView) -> Result<Self> {
        let session = SensorSession::open(config).await?;
        info!(device = %session.endpoint(), view = %view, "live provider ready");
        Ok(Self::with_session(session, view))
    }

    /// Build a provider around an already-bound session.
    pub fn with_session(session: SensorSession, view: ChannelView) -> Self {
        let assembler = SampleAssembler::new(view);
        Self { session, assembler, seq: 0 }
    }

    /// The device endpoint discovered during the handshake.
    pub fn endpoint(&self) -> std::net::SocketAddr {
        self.session.endpoint()
    }

    /// Close the underlying session. Later calls end the stream.
    pub fn close(&mut self) {
        self.session.close();
    }

    fn packet(&mut self, sample: crate::types::Sample) -> SamplePacket {
        let packet = SamplePacket::new(sample, self.seq, self.assembler.view());
        self.seq += 1;
        packet
    }
}

#[async_trait::async_trait]
impl Provider for LiveProvider {
    async fn next_sample(&mut self) -> Result<Option<SamplePacket>> {
        let mut empty_ticks = 0u32;

        loop {
            match self.session.receive().await {
                Ok(datagram) => match flatten(&datagram.payload) {
                    Ok(records) => {
                        trace!(
                            source = %datagram.source,
                            records = records.len(),
                            "datagram decoded"
                        );
                        match self.assembler.compose(&records) {
                            Ok(sample) => return Ok(Some(self.packet(sample))),
                            Err(ImuError::NoDataYet) => {
                                // Discovery chatter or a foreign message before
                                // the first measurement; keep waiting.
                                empty_ticks += 1;
                                if empty_ticks >= MAX_FIRST_SAMPLE_TICKS {
                                    warn!("no measurement data after discovery");
                                    return Err(ImuError::NoDataYet);
                                }
                            }
                            Err(e) => return Err(e),
                        }
                    }
                    Err(e) if e.is_retryable() => {
                        warn!(error = %e, "dropping undecodable datagram");
                        match self.assembler.carry_forward() {
                            Ok(sample) => return Ok(Some(self.packet(sample))),
                            Err(ImuError::NoDataYet) => {
                                empty_ticks += 1;
                                if empty_ticks >= MAX_FIRST_SAMPLE_TICKS {
                                    return Err(ImuError::NoDataYet);
                                }
                            }
                            Err(e) => return Err(e),
                        }
                    }
                    Err(e) => return Err(e),
                },
                Err(ImuError::ReceiveTimeout { duration }) => {
                    debug!(?duration, "receive timeout");
                    match self.assembler.carry_forward() {
                        Ok(sample) => return Ok(Some(self.packet(sample))),
                        Err(ImuError::NoDataYet) => {
                            empty_ticks += 1;
                            if empty_ticks >= MAX_FIRST_SAMPLE_TICKS {
                                warn!("device never started sending");
                                return Err(ImuError::NoDataYet);
                            }
                        }
                        Err(e) => return Err(e),
                    }
                }
                Err(ImuError::SessionClosed) => {
                    debug!("session closed, ending stream");
                    return Ok(None);
                }
                Err(e) => {
                    return Err(e);
                }
            }
        }
    }

    fn view(&self) -> ChannelView {
        self.assembler.view()
    }

    fn tick_rate(&self) -> f64 {
        self.session.config().nominal_hz
    }
}
