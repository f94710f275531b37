//! UDP session against one sensor: discovery handshake and datagram receive.
//!
//! The sensor is found by broadcasting a fixed identification request to the
//! firmware's discovery port and waiting for any reply; the replying endpoint
//! becomes the session's device for its whole lifetime. Steady-state data
//! then arrives on the locally bound port as OSC datagrams.
//!
//! A session owns its socket exclusively and moves through
//! `Discovering → Bound → Closed`; nothing leaves `Closed`. One logical
//! caller at a time: hosts that need a responsive event loop run the receive
//! side on a dedicated task (see [`Driver`](crate::driver::Driver)) and get
//! samples back over a channel.

use std::net::{Ipv4Addr, SocketAddr};

use tokio::net::UdpSocket;
use tokio::time::{Instant, sleep_until, timeout};
use tracing::{debug, info, trace, warn};

use crate::config::SessionConfig;
use crate::{ImuError, Result};

/// Identification request the firmware answers, bit-exact.
pub const IDENTIFY_REQUEST: &[u8] = b"/wifi/send/ip\0\0,\0\0\x000.0.0.0\0";

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Handshake in progress.
    Discovering,
    /// Device endpoint recorded; receives are live.
    Bound,
    /// Socket released; terminal.
    Closed,
}

/// One datagram as received from the socket.
///
/// Ephemeral: created per receive, consumed by the bundle unpacker, never
/// retained.
#[derive(Debug, Clone)]
pub struct RawDatagram {
    /// The datagram bytes, truncated to the received length.
    pub payload: Vec<u8>,
    /// Sender endpoint.
    pub source: SocketAddr,
}

/// A discovered, bound sensor session.
#[derive(Debug)]
pub struct SensorSession {
    socket: Option<UdpSocket>,
    device: SocketAddr,
    config: SessionConfig,
    state: SessionState,
}

impl SensorSession {
    /// Discover a sensor and bind a session to it.
    ///
    /// Binds the wildcard address on the configured local port, enables
    /// broadcast, then sends the identification request once per retry
    /// interval, waiting the per-attempt timeout for a reply each time. The
    /// first reply wins. Gives up with `NoDeviceFound` once the overall
    /// discovery timeout has elapsed.
    pub async fn open(config: SessionConfig) -> Result<Self> {
        config.validate()?;

        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, config.local_port))
            .await
            .map_err(|e| ImuError::socket(format!("binding local port {}", config.local_port), e))?;
        socket
            .set_broadcast(true)
            .map_err(|e| ImuError::socket("enabling broadcast", e))?;

        info!(
            local_port = config.local_port,
            discovery = %config.discovery_addr,
            "searching for sensor"
        );

        let started = Instant::now();
        let deadline = started + config.discovery_timeout();
        let mut buf = vec![0u8; config.max_datagram];
        let mut attempts = 0u32;

        loop {
            let attempt_started = Instant::now();
            attempts += 1;
            socket
                .send_to(IDENTIFY_REQUEST, config.discovery_addr)
                .await
                .map_err(|e| ImuError::socket("sending identification request", e))?;
            trace!(attempt = attempts, "identification request sent");

            match timeout(config.attempt_timeout(), socket.recv_from(&mut buf)).await {
                Ok(Ok((len, source))) => {
                    info!(device = %source, reply_len = len, attempts, "sensor found");
                    // The reply itself is only used to learn the endpoint;
                    // measurement decoding starts with the next datagram.
                    return Ok(Self {
                        socket: Some(socket),
                        device: source,
                        config,
                        state: SessionState::Bound,
                    });
                }
                Ok(Err(e)) => {
                    return Err(ImuError::socket("discovery receive", e));
                }
                Err(_elapsed) => {
                    if Instant::now() >= deadline {
                        warn!(attempts, "no sensor answered the discovery broadcast");
                        return Err(ImuError::NoDeviceFound { waited: started.elapsed() });
                    }
                    sleep_until(attempt_started + config.retry_interval()).await;
                }
            }
        }
    }

    /// Receive the next datagram, bounded by the configured receive timeout.
    ///
    /// A timeout is reported as the retryable `ReceiveTimeout`; any other
    /// socket failure is fatal. With `strict_endpoint` enabled, datagrams
    /// from endpoints other than the discovered device are dropped and the
    /// wait continues within the same deadline.
    pub async fn receive(&self) -> Result<RawDatagram> {
        let socket = match self.state {
            SessionState::Closed => return Err(ImuError::SessionClosed),
            _ => self.socket.as_ref().ok_or(ImuError::SessionClosed)?,
        };

        let limit = self.config.receive_timeout();
        let deadline = Instant::now() + limit;
        let mut buf = vec![0u8; self.config.max_datagram];

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(ImuError::ReceiveTimeout { duration: limit });
            }

            match timeout(remaining, socket.recv_from(&mut buf)).await {
                Ok(Ok((len, source))) => {
                    if self.config.strict_endpoint && source != self.device {
                        debug!(%source, expected = %self.device, "dropping foreign datagram");
                        continue;
                    }
                    buf.truncate(len);
                    return Ok(RawDatagram { payload: buf, source });
                }
                Ok(Err(e)) => return Err(ImuError::socket("datagram receive", e)),
                Err(_elapsed) => {
                    return Err(ImuError::ReceiveTimeout { duration: limit });
                }
            }
        }
    }

    /// The endpoint discovered during the handshake.
    pub fn endpoint(&self) -> SocketAddr {
        self.device
    }

    /// The locally bound address (the port the device sends to).
    pub fn local_addr(&self) -> Result<SocketAddr> {
        let socket = self.socket.as_ref().ok_or(ImuError::SessionClosed)?;
        socket.local_addr().map_err(|e| ImuError::socket("querying local address", e))
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The settings this session was opened with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Release the socket. Idempotent; every later receive fails with
    /// `SessionClosed`.
    pub fn close(&mut self) {
        if self.state != SessionState::Closed {
            debug!(device = %self.device, "closing session");
        }
        self.socket = None;
        self.state = SessionState::Closed;
    }
}

impl Drop for SensorSession {
    fn drop(&mut self) {
        self.close();
    }
}
