//! Update rate control for sample streams.

use serde::{Deserialize, Serialize};

/// Update rate for subscriber streams.
///
/// The sensor typically sends faster than a display loop wants to redraw;
/// `Max` caps the subscriber rate with latest-wins downsampling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum UpdateRate {
    /// Every sample the device produces.
    Native,

    /// At most this many samples per second.
    /// If the requested rate meets or exceeds the source rate, `Native` is
    /// used.
    Max(u32),
}

impl UpdateRate {
    /// Normalize against the source frequency, collapsing a no-op cap to
    /// `Native`.
    pub fn normalize(self, source_hz: f64) -> Self {
        match self {
            UpdateRate::Native => UpdateRate::Native,
            UpdateRate::Max(hz) if hz as f64 >= source_hz => UpdateRate::Native,
            UpdateRate::Max(hz) => UpdateRate::Max(hz),
        }
    }

    /// The downsampling interval, if any is needed.
    pub fn interval(self, source_hz: f64) -> Option<std::time::Duration> {
        match self.normalize(source_hz) {
            UpdateRate::Native => None,
            UpdateRate::Max(hz) => Some(std::time::Duration::from_secs_f64(1.0 / hz as f64)),
        }
    }
}
