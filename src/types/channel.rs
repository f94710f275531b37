//! The channel catalog: named, fixed-shape projections of the sensor's
//! measurement channels.
//!
//! The set of views is closed. Selecting one by name goes through
//! [`ChannelView::describe`]; an unknown name is a configuration error
//! (`UnknownChannel`), never a runtime data error.

use crate::{ImuError, Result};
use serde::{Deserialize, Serialize};

// Column-header fragments, one per physical channel group. The description
// text (units included) is a compatibility surface for log-file readers.
const TIME_COLUMNS: &str = "Time (s)";
const GYR_COLUMNS: &str = "Gyroscope X (deg/s),Gyroscope Y (deg/s),Gyroscope Z (deg/s)";
const ACC_COLUMNS: &str = "Accelerometer X (g),Accelerometer Y (g),Accelerometer Z (g)";
const MAG_COLUMNS: &str = "Magnetometer X (uT),Magnetometer Y (uT),Magnetometer Z (uT)";
const BAR_COLUMNS: &str = "Barometer (hPa)";
const QUAT_COLUMNS: &str = "Quat 0,Quat X,Quat Y,Quat Z";

/// A named projection of the measurement channels.
///
/// Every composed [`Sample`](crate::types::Sample) has
/// `element_count() + 1` values: a leading time column plus the channel
/// values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelView {
    /// Angular rate, deg/s.
    #[serde(rename = "gyr")]
    Gyroscope,
    /// Specific force, g.
    #[serde(rename = "acc")]
    Accelerometer,
    /// Magnetic field, uT.
    #[serde(rename = "mag")]
    Magnetometer,
    /// Air pressure, hPa.
    #[serde(rename = "bar")]
    Barometer,
    /// Orientation quaternion (w, x, y, z).
    #[serde(rename = "quat")]
    Quaternion,
    /// Onboard time plus all raw channels.
    #[serde(rename = "data")]
    Data,
    /// [`Data`](ChannelView::Data) plus the orientation quaternion.
    #[serde(rename = "dat_quat")]
    DataQuaternion,
}

impl ChannelView {
    /// Every view, in catalog order.
    pub const ALL: [ChannelView; 7] = [
        ChannelView::Gyroscope,
        ChannelView::Accelerometer,
        ChannelView::Magnetometer,
        ChannelView::Barometer,
        ChannelView::Quaternion,
        ChannelView::Data,
        ChannelView::DataQuaternion,
    ];

    /// Look a view up by its catalog name.
    ///
    /// Valid names: `gyr`, `acc`, `mag`, `bar`, `quat`, `data`, `dat_quat`.
    pub fn describe(name: &str) -> Option<ChannelView> {
        match name {
            "gyr" => Some(ChannelView::Gyroscope),
            "acc" => Some(ChannelView::Accelerometer),
            "mag" => Some(ChannelView::Magnetometer),
            "bar" => Some(ChannelView::Barometer),
            "quat" => Some(ChannelView::Quaternion),
            "data" => Some(ChannelView::Data),
            "dat_quat" => Some(ChannelView::DataQuaternion),
            _ => None,
        }
    }

    /// The catalog name.
    pub const fn name(self) -> &'static str {
        match self {
            ChannelView::Gyroscope => "gyr",
            ChannelView::Accelerometer => "acc",
            ChannelView::Magnetometer => "mag",
            ChannelView::Barometer => "bar",
            ChannelView::Quaternion => "quat",
            ChannelView::Data => "data",
            ChannelView::DataQuaternion => "dat_quat",
        }
    }

    /// Number of channel values in a composed sample, excluding the leading
    /// time column.
    pub const fn element_count(self) -> usize {
        match self {
            ChannelView::Gyroscope => 3,
            ChannelView::Accelerometer => 3,
            ChannelView::Magnetometer => 3,
            ChannelView::Barometer => 1,
            ChannelView::Quaternion => 4,
            // time + gyr + acc + mag + bar
            ChannelView::Data => 1 + 3 + 3 + 3 + 1,
            ChannelView::DataQuaternion => 1 + 3 + 3 + 3 + 1 + 4,
        }
    }

    /// Whether composing this view needs the `/quaternion` record in
    /// addition to `/sensors`.
    pub const fn requires_orientation(self) -> bool {
        matches!(self, ChannelView::Quaternion | ChannelView::DataQuaternion)
    }

    /// The log-file header line for this view: `element_count() + 1`
    /// comma-separated column descriptions, leading time column first.
    pub fn header(self) -> String {
        format!("{},{}", TIME_COLUMNS, self.channel_columns())
    }

    /// Column descriptions for the channel values alone.
    fn channel_columns(self) -> String {
        match self {
            ChannelView::Gyroscope => GYR_COLUMNS.to_string(),
            ChannelView::Accelerometer => ACC_COLUMNS.to_string(),
            ChannelView::Magnetometer => MAG_COLUMNS.to_string(),
            ChannelView::Barometer => BAR_COLUMNS.to_string(),
            ChannelView::Quaternion => QUAT_COLUMNS.to_string(),
            ChannelView::Data => {
                format!("{TIME_COLUMNS},{GYR_COLUMNS},{ACC_COLUMNS},{MAG_COLUMNS},{BAR_COLUMNS}")
            }
            ChannelView::DataQuaternion => format!(
                "{TIME_COLUMNS},{GYR_COLUMNS},{ACC_COLUMNS},{MAG_COLUMNS},{BAR_COLUMNS},{QUAT_COLUMNS}"
            ),
        }
    }
}

impl std::str::FromStr for ChannelView {
    type Err = ImuError;

    fn from_str(s: &str) -> Result<Self> {
        ChannelView::describe(s).ok_or_else(|| ImuError::UnknownChannel { name: s.to_string() })
    }
}

impl std::fmt::Display for ChannelView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_counts_match_constituent_sums() {
        assert_eq!(ChannelView::Gyroscope.element_count(), 3);
        assert_eq!(ChannelView::Accelerometer.element_count(), 3);
        assert_eq!(ChannelView::Magnetometer.element_count(), 3);
        assert_eq!(ChannelView::Barometer.element_count(), 1);
        assert_eq!(ChannelView::Quaternion.element_count(), 4);
        assert_eq!(ChannelView::Data.element_count(), 11);
        // 1 + 3 + 3 + 3 + 1 + 4
        assert_eq!(ChannelView::DataQuaternion.element_count(), 15);
    }

    #[test]
    fn describe_covers_exactly_the_fixed_names() {
        for view in ChannelView::ALL {
            assert_eq!(ChannelView::describe(view.name()), Some(view));
        }
        assert_eq!(ChannelView::describe("quaternions"), None);
        assert_eq!(ChannelView::describe(""), None);
        assert_eq!(ChannelView::describe("ACC"), None);
    }

    #[test]
    fn header_column_count_matches_sample_width() {
        for view in ChannelView::ALL {
            let columns = view.header().split(',').count();
            assert_eq!(
                columns,
                view.element_count() + 1,
                "header/sample width mismatch for {}",
                view
            );
        }
    }

    #[test]
    fn header_text_carries_units() {
        assert_eq!(
            ChannelView::Accelerometer.header(),
            "Time (s),Accelerometer X (g),Accelerometer Y (g),Accelerometer Z (g)"
        );
        assert_eq!(ChannelView::Barometer.header(), "Time (s),Barometer (hPa)");
        assert!(ChannelView::Data.header().starts_with("Time (s),Time (s),Gyroscope X (deg/s)"));
        assert!(ChannelView::DataQuaternion.header().ends_with("Quat 0,Quat X,Quat Y,Quat Z"));
    }

    #[test]
    fn orientation_requirement_is_limited_to_quaternion_views() {
        assert!(ChannelView::Quaternion.requires_orientation());
        assert!(ChannelView::DataQuaternion.requires_orientation());
        assert!(!ChannelView::Data.requires_orientation());
        assert!(!ChannelView::Accelerometer.requires_orientation());
    }

    #[test]
    fn from_str_reports_unknown_names_as_config_errors() {
        let err = "velocity".parse::<ChannelView>().unwrap_err();
        assert!(matches!(err, ImuError::UnknownChannel { ref name } if name == "velocity"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn serde_names_match_catalog_names() {
        for view in ChannelView::ALL {
            let yaml = serde_yaml_ng::to_string(&view).unwrap();
            assert_eq!(yaml.trim(), view.name());
            let back: ChannelView = serde_yaml_ng::from_str(&yaml).unwrap();
            assert_eq!(back, view);
        }
    }
}
