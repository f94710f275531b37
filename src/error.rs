//! Error types for sensor telemetry processing.
//!
//! This module provides the error handling surface for the imulink library.
//! All errors implement the `std::error::Error` trait and carry structured
//! context for debugging and recovery guidance.
//!
//! ## Error Categories
//!
//! - **Discovery Errors**: no sensor answered the broadcast handshake
//! - **Socket Errors**: bind/send/receive failures on the UDP socket
//! - **Decode Errors**: malformed or truncated datagram content
//! - **Assembly Errors**: a sample was requested before any data arrived
//!
//! ## Recovery and Retry
//!
//! Errors classify themselves as recoverable or fatal for the running
//! session:
//!
//! ```rust
//! use imulink::ImuError;
//! use std::time::Duration;
//!
//! let error = ImuError::ReceiveTimeout { duration: Duration::from_millis(200) };
//! if error.is_retryable() {
//!     println!("Can keep the session alive");
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```
//!
//! Per-datagram decode errors are retryable by design: the polling caller
//! logs them, drops the datagram, and lets the assembler's synthetic-sample
//! fallback bridge the gap. Only discovery failure, socket-open failure and
//! the very first no-data case terminate a session outright.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for telemetry operations.
pub type Result<T, E = ImuError> = std::result::Result<T, E>;

/// Main error type for sensor telemetry operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ImuError {
    #[error("No sensor answered the discovery broadcast within {waited:?}")]
    NoDeviceFound { waited: Duration },

    #[error("Socket error during {context}")]
    Socket {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No datagram received within {duration:?}")]
    ReceiveTimeout { duration: Duration },

    #[error("Session is closed")]
    SessionClosed,

    #[error("Malformed address string: {details}")]
    MalformedAddress { details: String },

    #[error("Truncated record in {context}: need {needed} bytes, have {available}")]
    TruncatedRecord { context: &'static str, needed: usize, available: usize },

    #[error("Unsupported type tag '{tag}'")]
    UnsupportedTag { tag: char },

    #[error("Unknown packet kind: leading byte {leading:#04x}")]
    UnknownPacketKind { leading: u8 },

    #[error("Malformed bundle: {details}")]
    MalformedBundle { details: String },

    #[error("Bundle nesting exceeds depth limit ({depth})")]
    BundleTooDeep { depth: usize },

    #[error("No sample has been assembled yet")]
    NoDataYet,

    #[error("Unknown channel view '{name}'")]
    UnknownChannel { name: String },

    #[error("Invalid configuration: {details}")]
    InvalidConfig { details: String },
}

impl ImuError {
    /// Returns whether the session can survive this error.
    ///
    /// Retryable errors are handled by dropping the offending datagram (or
    /// tick) and carrying the last good sample forward; everything else must
    /// be surfaced to the user and ends the recording attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ImuError::ReceiveTimeout { .. } => true,
            ImuError::MalformedAddress { .. } => true,
            ImuError::TruncatedRecord { .. } => true,
            ImuError::UnsupportedTag { .. } => true,
            ImuError::UnknownPacketKind { .. } => true,
            ImuError::MalformedBundle { .. } => true,
            ImuError::BundleTooDeep { .. } => true,
            ImuError::NoDeviceFound { .. } => false,
            ImuError::Socket { .. } => false,
            ImuError::SessionClosed => false,
            ImuError::NoDataYet => false,
            ImuError::UnknownChannel { .. } => false,
            ImuError::InvalidConfig { .. } => false,
        }
    }

    /// Returns whether this error came from decoding datagram content, as
    /// opposed to the network or session layer.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            ImuError::MalformedAddress { .. }
                | ImuError::TruncatedRecord { .. }
                | ImuError::UnsupportedTag { .. }
                | ImuError::UnknownPacketKind { .. }
                | ImuError::MalformedBundle { .. }
                | ImuError::BundleTooDeep { .. }
        )
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            ImuError::NoDeviceFound { .. } => vec![
                "Check the sensor is powered on and charged",
                "Ensure sensor and host are on the same WLAN",
                "Allow inbound UDP through the firewall",
                "Verify the configured receive port matches the sensor's send port",
            ],
            ImuError::Socket { .. } => vec![
                "Check no other program is bound to the receive port",
                "Check local network permissions",
                "Try a different local port in the session settings",
            ],
            ImuError::ReceiveTimeout { .. } => vec![
                "Check the WLAN signal strength near the sensor",
                "Check the sensor battery level",
                "Increase the receive timeout",
            ],
            ImuError::SessionClosed => vec!["Open a new session before receiving"],
            ImuError::MalformedAddress { .. }
            | ImuError::TruncatedRecord { .. }
            | ImuError::UnsupportedTag { .. }
            | ImuError::UnknownPacketKind { .. }
            | ImuError::MalformedBundle { .. }
            | ImuError::BundleTooDeep { .. } => vec![
                "Drop the datagram and keep receiving",
                "Check the sensor firmware version",
                "Check that no other device is sending to this port",
            ],
            ImuError::NoDataYet => {
                vec!["Wait for the first datagram before requesting samples"]
            }
            ImuError::UnknownChannel { .. } => {
                vec!["Use one of: gyr, acc, mag, bar, quat, data, dat_quat"]
            }
            ImuError::InvalidConfig { .. } => vec![
                "Check the session settings file",
                "Restore the default settings and retry",
            ],
        }
    }

    /// Helper constructor for socket errors with operation context.
    pub fn socket(context: impl Into<String>, source: std::io::Error) -> Self {
        ImuError::Socket { context: context.into(), source }
    }

    /// Helper constructor for truncation errors.
    pub fn truncated(context: &'static str, needed: usize, available: usize) -> Self {
        ImuError::TruncatedRecord { context, needed, available }
    }

    /// Helper constructor for malformed-bundle errors.
    pub fn malformed_bundle(details: impl Into<String>) -> Self {
        ImuError::MalformedBundle { details: details.into() }
    }

    /// Helper constructor for malformed-address errors.
    pub fn malformed_address(details: impl Into<String>) -> Self {
        ImuError::MalformedAddress { details: details.into() }
    }

    /// Helper constructor for configuration errors.
    pub fn invalid_config(details: impl Into<String>) -> Self {
        ImuError::InvalidConfig { details: details.into() }
    }
}

impl From<std::io::Error> for ImuError {
    fn from(err: std::io::Error) -> Self {
        ImuError::Socket { context: "socket I/O".to_string(), source: err }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(test)]
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn error_messages_contain_their_context(
                context in "[a-z ]{1,40}",
                needed in 1usize..64,
                available in 0usize..64,
                name in "[a-z_]{1,16}",
            ) {
                // Property: structured context appears in the rendered message
                let socket_err = ImuError::socket(
                    context.clone(),
                    std::io::Error::new(std::io::ErrorKind::AddrInUse, "busy"),
                );
                prop_assert!(socket_err.to_string().contains(&context));

                let bundle_err = ImuError::malformed_bundle(context.clone());
                prop_assert!(bundle_err.to_string().contains(&context));

                let trunc = ImuError::TruncatedRecord {
                    context: "argument block",
                    needed,
                    available,
                };
                let msg = trunc.to_string();
                prop_assert!(msg.contains(&needed.to_string()));
                prop_assert!(msg.contains(&available.to_string()));

                let chan = ImuError::UnknownChannel { name: name.clone() };
                prop_assert!(chan.to_string().contains(&name));
            }

            #[test]
            fn decode_errors_are_always_retryable(tag in proptest::char::any()) {
                // Property: every decode-class error keeps the session alive
                let errors = vec![
                    ImuError::UnsupportedTag { tag },
                    ImuError::malformed_address("no terminator"),
                    ImuError::truncated("float argument", 4, 1),
                    ImuError::UnknownPacketKind { leading: 0xAB },
                    ImuError::malformed_bundle("short element"),
                    ImuError::BundleTooDeep { depth: 9 },
                ];
                for e in errors {
                    prop_assert!(e.is_decode_error());
                    prop_assert!(e.is_retryable());
                    prop_assert!(!e.recovery_suggestions().is_empty());
                }
            }
        }
    }

    #[test]
    fn error_traits_validation() {
        // Compile-time check: ImuError must be Send + Sync + 'static
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<ImuError>();

        let error = ImuError::NoDataYet;
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn retryability_classification() {
        assert!(ImuError::ReceiveTimeout { duration: Duration::from_millis(200) }.is_retryable());
        assert!(ImuError::UnsupportedTag { tag: 'x' }.is_retryable());

        assert!(!ImuError::NoDeviceFound { waited: Duration::from_secs(5) }.is_retryable());
        assert!(!ImuError::NoDataYet.is_retryable());
        assert!(!ImuError::SessionClosed.is_retryable());
        assert!(!ImuError::invalid_config("nominal_hz must be positive").is_retryable());
        assert!(
            !ImuError::socket("bind", std::io::Error::new(std::io::ErrorKind::AddrInUse, "busy"))
                .is_retryable()
        );
    }

    #[test]
    fn io_error_conversion_preserves_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "no broadcast");
        let err: ImuError = io_err.into();
        match err {
            ImuError::Socket { source, .. } => {
                assert_eq!(source.to_string(), "no broadcast");
            }
            other => panic!("Expected Socket error, got {:?}", other),
        }
    }

    #[test]
    fn timeout_is_not_a_decode_error() {
        let e = ImuError::ReceiveTimeout { duration: Duration::from_millis(200) };
        assert!(e.is_retryable());
        assert!(!e.is_decode_error());
    }
}
