//! Provider trait for sample sources.

use crate::Result;
use crate::types::{ChannelView, SamplePacket};

/// Trait for sample sources.
///
/// Providers abstract over where samples come from (a live sensor, the
/// simulator) and handle their own timing internally: the live provider
/// blocks on the socket with its receive timeout, the simulator paces
/// itself at the nominal rate. The driver task drives whichever provider it
/// is given.
#[async_trait::async_trait]
pub trait Provider: Send + 'static {
    /// Get the next sample.
    ///
    /// Returns:
    /// - `Ok(Some(packet))` - a sample, fresh or synthetic
    /// - `Ok(None)` - the source ended (normal termination)
    /// - `Err(e)` - fatal error; the session cannot continue
    ///
    /// Recoverable conditions (receive timeouts, per-datagram decode
    /// failures) never surface here once a first sample exists: providers
    /// bridge them with synthetic samples.
    async fn next_sample(&mut self) -> Result<Option<SamplePacket>>;

    /// The view this provider composes.
    fn view(&self) -> ChannelView;

    /// Nominal source rate in Hz.
    fn tick_rate(&self) -> f64;
}
