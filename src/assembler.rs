//! Sample assembly: from decoded records to fixed-shape sample rows.
//!
//! One receive cycle normally yields two sibling records, `/sensors`
//! (onboard time, gyroscope, accelerometer, magnetometer, barometer — eleven
//! floats) and `/quaternion` (onboard time plus the orientation quaternion —
//! five floats). The assembler selects records by address, never by position:
//! the protocol does not promise an ordering across the two.
//!
//! Missing or short records do not fail a running acquisition. The assembler
//! carries the last good sample and repeats it flagged as synthetic, so a
//! display or log keeps a steady cadence through transient packet loss. Only
//! the very first request of a session has nothing to fall back on and fails
//! with `NoDataYet` instead of fabricating zeros.

use tracing::{debug, trace};

use crate::osc::Record;
use crate::types::{ChannelView, Sample};
use crate::{ImuError, Result};

/// Address of the raw-channel record.
pub const SENSORS_ADDRESS: &str = "/sensors";

/// Address of the orientation record.
pub const QUATERNION_ADDRESS: &str = "/quaternion";

/// Argument count of a well-formed `/sensors` record.
const SENSORS_ARGS: usize = 11;

/// Argument count of a well-formed `/quaternion` record.
const QUATERNION_ARGS: usize = 5;

/// Composes the requested view from each cycle's records, carrying the last
/// good sample for fallback.
///
/// The fallback state is owned here, per instance; there is no ambient
/// shared state between cycles.
#[derive(Debug, Clone)]
pub struct SampleAssembler {
    view: ChannelView,
    last: Option<Sample>,
}

impl SampleAssembler {
    /// Create an assembler for one view.
    pub fn new(view: ChannelView) -> Self {
        Self { view, last: None }
    }

    /// The view this assembler composes.
    pub fn view(&self) -> ChannelView {
        self.view
    }

    /// Whether a good sample has been composed yet.
    pub fn has_sample(&self) -> bool {
        self.last.is_some()
    }

    /// Compose a sample from one cycle's flattened records.
    ///
    /// Falls back to the last good sample (flagged synthetic) when the
    /// expected records are absent or malformed; fails with `NoDataYet` only
    /// if that happens before any good sample exists.
    pub fn compose(&mut self, records: &[Record]) -> Result<Sample> {
        match self.fresh(records) {
            Some(sample) => {
                trace!(view = %self.view, timestamp = sample.timestamp, "fresh sample");
                self.last = Some(sample.clone());
                Ok(sample)
            }
            None => {
                debug!(view = %self.view, "no usable records this cycle, carrying forward");
                self.carry_forward()
            }
        }
    }

    /// Repeat the last good sample, flagged synthetic.
    ///
    /// The receive path also calls this directly for timeout ticks, where
    /// there is no datagram to compose from at all.
    pub fn carry_forward(&mut self) -> Result<Sample> {
        match &self.last {
            Some(prev) => Ok(Sample { synthetic: true, ..prev.clone() }),
            None => Err(ImuError::NoDataYet),
        }
    }

    /// Try to compose a fresh sample; `None` means degraded input.
    fn fresh(&self, records: &[Record]) -> Option<Sample> {
        // Most recent well-formed record per address wins.
        let sensors = find_numeric(records, SENSORS_ADDRESS, SENSORS_ARGS);
        let orientation = find_numeric(records, QUATERNION_ADDRESS, QUATERNION_ARGS);

        let (timestamp, values) = match self.view {
            ChannelView::Gyroscope => {
                let (_, args) = sensors?;
                (args[0], args[1..4].to_vec())
            }
            ChannelView::Accelerometer => {
                let (_, args) = sensors?;
                (args[0], args[4..7].to_vec())
            }
            ChannelView::Magnetometer => {
                let (_, args) = sensors?;
                (args[0], args[7..10].to_vec())
            }
            ChannelView::Barometer => {
                let (_, args) = sensors?;
                (args[0], args[10..11].to_vec())
            }
            ChannelView::Quaternion => {
                let (_, args) = orientation?;
                (args[0], args[1..5].to_vec())
            }
            ChannelView::Data => {
                let (record_ts, args) = sensors?;
                (record_ts, args)
            }
            ChannelView::DataQuaternion => {
                let (record_ts, mut args) = sensors?;
                let (_, quat) = orientation?;
                args.extend_from_slice(&quat[1..5]);
                (record_ts, args)
            }
        };

        debug_assert_eq!(values.len(), self.view.element_count());
        Some(Sample { timestamp, values, synthetic: false })
    }
}

/// Latest record matching `address` whose arguments are `count` numerics.
fn find_numeric(records: &[Record], address: &str, count: usize) -> Option<(f64, Vec<f64>)> {
    records.iter().rev().find_map(|record| {
        if record.address != address {
            return None;
        }
        let args = record.numeric_args()?;
        if args.len() != count {
            debug!(
                address,
                expected = count,
                got = args.len(),
                "record argument count mismatch"
            );
            return None;
        }
        Some((record.timestamp, args))
    })
}
