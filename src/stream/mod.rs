//! Stream utilities for subscribers.

mod downsample;

pub use downsample::{Downsample, DownsampleExt};
