//! Session configuration.
//!
//! The recording host keeps these settings in a YAML file alongside its
//! other preferences; the two device ports (one per sensor slot) are the
//! only values most installations ever touch. Defaults match the device
//! firmware's protocol: replies and data arrive on the locally bound port,
//! identification requests go to the broadcast address on port 9000, and a
//! datagram never exceeds 2048 bytes.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ImuError, Result};

/// Well-known port the device firmware listens on for identification
/// requests.
pub const DISCOVERY_PORT: u16 = 9000;

/// Default local port for the first sensor slot.
pub const DEFAULT_LOCAL_PORT: u16 = 8015;

/// Protocol-level upper bound on datagram size.
pub const MAX_DATAGRAM: usize = 2048;

/// Settings for one sensor session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Local UDP port to bind; discovery replies and data arrive here.
    pub local_port: u16,

    /// Where identification requests are sent. The broadcast default works
    /// on a flat lab WLAN; tests point this at a loopback mock device.
    pub discovery_addr: SocketAddr,

    /// Overall discovery window before giving up with `NoDeviceFound`.
    pub discovery_timeout_secs: f64,

    /// How long each discovery attempt waits for a reply.
    pub attempt_timeout_secs: f64,

    /// Cadence of identification-request retries.
    pub retry_interval_secs: f64,

    /// Bound on one steady-state receive before it reports `ReceiveTimeout`.
    pub receive_timeout_secs: f64,

    /// When true, datagrams from any endpoint other than the discovered
    /// device are dropped. The device firmware never changes its address
    /// mid-session, but the lenient default matches the original tooling
    /// and survives a device rejoining the WLAN with a new lease.
    pub strict_endpoint: bool,

    /// Receive buffer size per datagram.
    pub max_datagram: usize,

    /// Nominal device send rate, used for stream pacing and rate caps.
    pub nominal_hz: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            local_port: DEFAULT_LOCAL_PORT,
            discovery_addr: SocketAddr::V4(SocketAddrV4::new(
                Ipv4Addr::BROADCAST,
                DISCOVERY_PORT,
            )),
            discovery_timeout_secs: 5.0,
            attempt_timeout_secs: 0.2,
            retry_interval_secs: 1.0,
            receive_timeout_secs: 0.2,
            strict_endpoint: false,
            max_datagram: MAX_DATAGRAM,
            nominal_hz: 100.0,
        }
    }
}

impl SessionConfig {
    /// Overall discovery window.
    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.discovery_timeout_secs)
    }

    /// Per-attempt reply wait.
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.attempt_timeout_secs)
    }

    /// Identification-request retry cadence.
    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs_f64(self.retry_interval_secs)
    }

    /// Steady-state receive bound.
    pub fn receive_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.receive_timeout_secs)
    }

    /// Nominal interval between device samples.
    pub fn nominal_tick(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.nominal_hz)
    }

    /// Check the settings are usable before opening a socket with them.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("discovery_timeout_secs", self.discovery_timeout_secs),
            ("attempt_timeout_secs", self.attempt_timeout_secs),
            ("retry_interval_secs", self.retry_interval_secs),
            ("receive_timeout_secs", self.receive_timeout_secs),
            ("nominal_hz", self.nominal_hz),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ImuError::invalid_config(format!(
                    "{field} must be positive, got {value}"
                )));
            }
        }
        if self.max_datagram < 64 {
            return Err(ImuError::invalid_config(format!(
                "max_datagram {} is below any valid packet",
                self.max_datagram
            )));
        }
        Ok(())
    }

    /// Load settings from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ImuError::socket(format!("reading settings {}", path.display()), e))?;
        let config: SessionConfig = serde_yaml_ng::from_str(&text).map_err(|e| {
            ImuError::invalid_config(format!("parsing settings {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save settings to a YAML file.
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = serde_yaml_ng::to_string(self)
            .map_err(|e| ImuError::invalid_config(format!("serializing settings: {e}")))?;
        std::fs::write(path, text)
            .map_err(|e| ImuError::socket(format!("writing settings {}", path.display()), e))
    }
}
