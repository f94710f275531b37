//! OSC message parsing: one address plus typed arguments.
//!
//! A message is the protocol's atomic payload:
//!
//! ```text
//! ┌────────────────────┬──────────────────────┬──────────────────┐
//! │ Address            │ Type tags            │ Arguments        │
//! │ "/sensors\0..."    │ ",fffffffffff\0..."  │ packed per tag   │
//! └────────────────────┴──────────────────────┴──────────────────┘
//! ```
//!
//! Both the address and the type-tag block are NUL-terminated and padded to a
//! 4-byte boundary. The tag characters after the leading comma select how the
//! argument bytes are read:
//!
//! - `i` — unsigned 32-bit integer, big-endian
//! - `f` — IEEE-754 single; the sensor firmware emits the four bytes in
//!   reversed order relative to the host, so they are byte-reversed before
//!   reinterpreting
//! - `s`/`S` — NUL-terminated string, padded to a 4-byte boundary
//! - `b` — blob: big-endian 32-bit length prefix, data, padded to 4 bytes
//! - `T`/`F` — boolean literals, no argument bytes
//!
//! Any other tag is a protocol violation and fails the whole message rather
//! than guessing at the argument width.

use crate::{ImuError, Result};
use tracing::trace;

/// One decoded argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `i` tag
    UInt(u32),
    /// `f` tag
    Float(f32),
    /// `s`/`S` tag
    Str(String),
    /// `b` tag
    Blob(Vec<u8>),
    /// `T`/`F` tags
    Bool(bool),
}

impl Value {
    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::UInt(v) => Some(f64::from(*v)),
            Value::Float(v) => Some(f64::from(*v)),
            _ => None,
        }
    }
}

/// One decoded message: address, typed arguments, and the timestamp resolved
/// from the enclosing bundle (`-1.0` when the message arrived bare).
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Seconds since the NTP epoch, `-1.0` if no bundle supplied one.
    pub timestamp: f64,
    /// Address string, e.g. `/sensors` or `/quaternion`.
    pub address: String,
    /// Arguments in wire order; length equals the number of tag characters.
    pub args: Vec<Value>,
}

impl Record {
    /// All arguments as `f64`, or `None` if any argument is non-numeric.
    ///
    /// The device's data messages are all-float; a mixed argument list means
    /// the message is not a measurement and the assembler treats it as
    /// missing data.
    pub fn numeric_args(&self) -> Option<Vec<f64>> {
        self.args.iter().map(Value::as_f64).collect()
    }
}

/// Round `len` up to the next multiple of 4 (OSC padding rule).
#[inline]
pub(crate) fn pad4(len: usize) -> usize {
    len.div_ceil(4) * 4
}

/// Parse one message from `bytes`.
///
/// Pure function: no side effects, the input slice is never mutated, and a
/// failed parse of one bundle element leaves sibling elements untouched.
/// The returned record carries `timestamp = -1.0`; the bundle walker fills in
/// the enclosing time-tag.
pub fn parse_record(bytes: &[u8]) -> Result<Record> {
    // Address: NUL-terminated, starting at offset 0.
    let nul = bytes
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| ImuError::malformed_address("no NUL terminator in buffer"))?;
    let address = String::from_utf8_lossy(&bytes[..nul]).into_owned();

    // Type-tag block: first ',' after the address, up to its own NUL.
    let tags_start = nul
        + bytes[nul..]
            .iter()
            .position(|&b| b == b',')
            .ok_or(ImuError::truncated("type tag block", 1, 0))?;
    let tags_len = bytes[tags_start..]
        .iter()
        .position(|&b| b == 0)
        .ok_or(ImuError::truncated("type tag terminator", 1, 0))?;
    let tags = &bytes[tags_start..tags_start + tags_len];

    // Arguments start after the tag block, padded including its NUL.
    let mut cursor = tags_start + pad4(tags_len + 1);
    let mut args = Vec::with_capacity(tags_len.saturating_sub(1));

    for &tag in &tags[1..] {
        match tag {
            b'i' => {
                args.push(Value::UInt(read_u32_be(bytes, cursor, "integer argument")?));
                cursor += 4;
            }
            b'f' => {
                let raw = read_u32_be(bytes, cursor, "float argument")?.to_be_bytes();
                // The firmware's float byte order is the reverse of the wire
                // order used for integers; undo it before reinterpreting.
                let reversed = [raw[3], raw[2], raw[1], raw[0]];
                args.push(Value::Float(f32::from_le_bytes(reversed)));
                cursor += 4;
            }
            b's' | b'S' => {
                let rest = bytes.get(cursor..).unwrap_or(&[]);
                let end = rest
                    .iter()
                    .position(|&b| b == 0)
                    .ok_or(ImuError::truncated("string argument", 1, 0))?;
                args.push(Value::Str(String::from_utf8_lossy(&rest[..end]).into_owned()));
                cursor += pad4(end + 1);
            }
            b'b' => {
                let size = read_u32_be(bytes, cursor, "blob length")? as usize;
                cursor += 4;
                let data = bytes.get(cursor..cursor + size).ok_or_else(|| {
                    ImuError::truncated("blob data", size, bytes.len().saturating_sub(cursor))
                })?;
                args.push(Value::Blob(data.to_vec()));
                cursor += pad4(size);
            }
            b'T' => args.push(Value::Bool(true)),
            b'F' => args.push(Value::Bool(false)),
            other => {
                return Err(ImuError::UnsupportedTag { tag: char::from(other) });
            }
        }
    }

    trace!(address = %address, args = args.len(), "parsed record");

    Ok(Record { timestamp: -1.0, address, args })
}

/// Bounds-checked big-endian u32 read.
fn read_u32_be(data: &[u8], offset: usize, context: &'static str) -> Result<u32> {
    let bytes = data
        .get(offset..offset + 4)
        .ok_or_else(|| ImuError::truncated(context, 4, data.len().saturating_sub(offset)))?;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}
