//! Wire-format decoding for the sensor's OSC-style protocol.
//!
//! The sensor broadcasts UDP datagrams that are either a bare message or a
//! `#bundle` envelope around sibling messages sharing one 64-bit NTP time
//! tag. [`record`] parses one message, [`bundle`] walks the envelope and
//! resolves timestamps, and [`writer`] produces byte-compatible fixtures for
//! the simulator and tests.

pub mod bundle;
pub mod record;
pub mod writer;

pub use bundle::{MAX_BUNDLE_DEPTH, Packet, flatten, parse_packet};
pub use record::{Record, Value, parse_record};
pub use writer::{BundleWriter, MessageWriter};
