//! Core types for sensor telemetry representation.
//!
//! - [`ChannelView`] is the closed catalog of named channel projections
//! - [`Sample`] is one composed measurement row; [`SamplePacket`] wraps it
//!   with stream metadata for the driver/watch-channel architecture
//! - [`LinkStatus`] reports the live/stale link condition
//! - [`UpdateRate`] caps subscriber stream rates

mod channel;
mod sample;
mod update_rate;

pub use channel::ChannelView;
pub use sample::{LinkStatus, Sample, SamplePacket};
pub use update_rate::UpdateRate;
