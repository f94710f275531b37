//! Sample types for the stream-based architecture.

use std::time::Duration;

use super::ChannelView;

/// One composed measurement sample.
///
/// This is the fundamental data unit that flows out of the decoder: the
/// requested view's channel values with a leading timestamp, flattened to a
/// fixed-width numeric row by [`Sample::row`].
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Leading time value (seconds). For the base views this is the sensor's
    /// onboard time argument; for `data`/`dat_quat` it is the bundle
    /// timestamp (`-1.0` when the message arrived bare).
    pub timestamp: f64,
    /// Channel values in view order; length equals the view's
    /// `element_count()`.
    pub values: Vec<f64>,
    /// True when this sample repeats the last good one to bridge packet
    /// loss, rather than carrying a fresh measurement.
    pub synthetic: bool,
}

impl Sample {
    /// The flattened row `[timestamp, v1, ..., vn]` that callers write as
    /// one log-file line under [`ChannelView::header`].
    pub fn row(&self) -> Vec<f64> {
        let mut row = Vec::with_capacity(self.values.len() + 1);
        row.push(self.timestamp);
        row.extend_from_slice(&self.values);
        row
    }

    /// Width of [`Sample::row`] for consistency checks against the view.
    pub fn width(&self) -> usize {
        self.values.len() + 1
    }
}

/// A sample plus stream metadata, as published by the driver task.
#[derive(Debug, Clone)]
pub struct SamplePacket {
    /// The composed sample.
    pub sample: Sample,
    /// Monotonic sample counter within the session.
    pub seq: u64,
    /// The view this sample was composed for.
    pub view: ChannelView,
}

impl SamplePacket {
    /// Create a new sample packet.
    pub fn new(sample: Sample, seq: u64, view: ChannelView) -> Self {
        Self { sample, seq, view }
    }
}

/// Link condition as observed by the driver task.
///
/// `Stale` is the recoverable "no fresh data" condition: the session stays
/// open and samples keep flowing (synthetic), and the caller decides whether
/// to keep waiting or tear the session down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// Fresh measurements are arriving.
    Live,
    /// The device has gone quiet; synthetic samples are bridging the gap.
    Stale {
        /// Consecutive ticks without a fresh measurement.
        missed: u32,
    },
}

impl LinkStatus {
    /// Rough gap duration given the configured nominal tick interval.
    pub fn gap(&self, tick: Duration) -> Duration {
        match self {
            LinkStatus::Live => Duration::ZERO,
            LinkStatus::Stale { missed } => tick.saturating_mul(*missed),
        }
    }
}
