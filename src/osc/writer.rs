//! OSC message and bundle encoding.
//!
//! The inverse of [`record`](crate::osc::record) and
//! [`bundle`](crate::osc::bundle), byte-compatible with the sensor firmware's
//! output (including its reversed float byte order). Used by the simulator to
//! feed the real decode path and by tests to build fixtures; the library
//! never encodes data messages toward a real device, only the fixed
//! discovery request.

use crate::osc::record::pad4;

/// Builder for one message.
///
/// ```rust
/// use imulink::osc::MessageWriter;
///
/// let bytes = MessageWriter::new("/sensors").floats(&[1.0, 2.0, 3.0]).finish();
/// assert_eq!(&bytes[..8], b"/sensors");
/// ```
#[derive(Debug, Clone)]
pub struct MessageWriter {
    address: String,
    tags: Vec<u8>,
    args: Vec<u8>,
}

impl MessageWriter {
    /// Start a message with the given address string.
    pub fn new(address: impl Into<String>) -> Self {
        Self { address: address.into(), tags: vec![b','], args: Vec::new() }
    }

    /// Append one `f` argument in the firmware's reversed byte order.
    pub fn float(mut self, value: f32) -> Self {
        self.tags.push(b'f');
        let le = value.to_le_bytes();
        self.args.extend_from_slice(&[le[3], le[2], le[1], le[0]]);
        self
    }

    /// Append one `f` argument per slice element.
    pub fn floats(mut self, values: &[f32]) -> Self {
        for &v in values {
            self = self.float(v);
        }
        self
    }

    /// Append one `i` argument, big-endian.
    pub fn uint(mut self, value: u32) -> Self {
        self.tags.push(b'i');
        self.args.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Append one `s` argument, NUL-terminated and 4-byte padded.
    pub fn string(mut self, value: &str) -> Self {
        self.tags.push(b's');
        self.args.extend_from_slice(value.as_bytes());
        self.args.push(0);
        pad_to_boundary(&mut self.args);
        self
    }

    /// Append one `b` argument with its length prefix, 4-byte padded.
    pub fn blob(mut self, data: &[u8]) -> Self {
        self.tags.push(b'b');
        self.args.extend_from_slice(&(data.len() as u32).to_be_bytes());
        self.args.extend_from_slice(data);
        pad_to_boundary(&mut self.args);
        self
    }

    /// Append one `T` or `F` argument (no argument bytes).
    pub fn bool(mut self, value: bool) -> Self {
        self.tags.push(if value { b'T' } else { b'F' });
        self
    }

    /// Encode the message.
    pub fn finish(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            pad4(self.address.len() + 1) + pad4(self.tags.len() + 1) + self.args.len(),
        );
        out.extend_from_slice(self.address.as_bytes());
        out.push(0);
        pad_to_boundary(&mut out);
        out.extend_from_slice(&self.tags);
        out.push(0);
        pad_to_boundary(&mut out);
        out.extend_from_slice(&self.args);
        out
    }
}

/// Builder for one bundle.
#[derive(Debug, Clone)]
pub struct BundleWriter {
    time_tag: u64,
    body: Vec<u8>,
}

impl BundleWriter {
    /// Start a bundle with an NTP fixed-point time tag (2^32 units per second).
    pub fn new(time_tag: u64) -> Self {
        Self { time_tag, body: Vec::new() }
    }

    /// Start a bundle from a timestamp in seconds.
    pub fn from_seconds(seconds: f64) -> Self {
        Self::new((seconds.max(0.0) * (1u64 << 32) as f64) as u64)
    }

    /// Append one element (an encoded message or nested bundle).
    pub fn element(mut self, payload: &[u8]) -> Self {
        self.body.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        self.body.extend_from_slice(payload);
        self
    }

    /// Encode the bundle.
    pub fn finish(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(16 + self.body.len());
        out.extend_from_slice(b"#bundle\0");
        out.extend_from_slice(&self.time_tag.to_be_bytes());
        out.extend_from_slice(&self.body);
        out
    }
}

fn pad_to_boundary(buf: &mut Vec<u8>) {
    while buf.len() % 4 != 0 {
        buf.push(0);
    }
}
