//! Modern, type-safe Rust library for wireless IMU telemetry.
//!
//! imulink decodes the OSC-style UDP protocol of a WLAN motion sensor into
//! typed, timestamped samples, with first-class support for recording hosts
//! that poll at display rate while the device sends faster.
//!
//! # Features
//!
//! - **Discovery**: broadcast handshake with retry/timeout semantics
//! - **Decoding**: bundle/message wire format, recursive and bounds-checked
//! - **Continuity**: synthetic-sample fallback bridges WiFi dropouts
//! - **Simulation**: a built-in sensor simulator drives the real decode path
//!
//! # Quick Start
//!
//! ## Example (live sensor)
//!
//! ```rust,no_run
//! use imulink::{ChannelView, Imulink, SessionConfig, UpdateRate};
//! use futures::StreamExt;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     tracing_subscriber::fmt::init();
//!
//!     let connection =
//!         Imulink::connect(SessionConfig::default(), ChannelView::Accelerometer).await?;
//!     let mut stream = connection.subscribe(UpdateRate::Max(30));
//!
//!     println!("{}", ChannelView::Accelerometer.header());
//!     while let Some(sample) = stream.next().await {
//!         println!("{:?}", sample.row());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Example (no hardware)
//!
//! ```rust,no_run
//! use imulink::{ChannelView, Imulink, UpdateRate};
//! use futures::StreamExt;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let connection = Imulink::simulate(ChannelView::DataQuaternion, 100.0).await?;
//!     let sample = connection.subscribe(UpdateRate::Native).next().await;
//!     println!("{:?}", sample);
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
pub mod types;

// Wire format
pub mod osc;

// Decode pipeline
pub mod assembler;
pub mod config;
pub mod session;

// Stream-based architecture
pub mod connection;
pub mod driver;
pub mod provider;
pub mod providers;
pub mod stream;

// Core exports
pub use assembler::SampleAssembler;
pub use config::SessionConfig;
pub use error::{ImuError, Result};
pub use session::{RawDatagram, SensorSession, SessionState};
pub use types::{ChannelView, LinkStatus, Sample, SamplePacket, UpdateRate};

// Connection exports
pub use connection::live::LiveConnection;
pub use connection::sim::SimConnection;

/// Unified entry point for sensor connections.
///
/// This factory provides a consistent API for connecting to a live sensor
/// on the WLAN and for starting the hardware-free simulator.
///
/// # Examples
///
/// ## Live sensor
/// ```rust,no_run
/// use imulink::{ChannelView, Imulink, SessionConfig};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> imulink::Result<()> {
///     let connection = Imulink::connect(SessionConfig::default(), ChannelView::Data).await?;
///     println!("sensor at {}", connection.endpoint());
///     Ok(())
/// }
/// ```
///
/// ## Simulator
/// ```rust,no_run
/// use imulink::{ChannelView, Imulink};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> imulink::Result<()> {
///     let connection = Imulink::simulate(ChannelView::Quaternion, 100.0).await?;
///     // Use connection...
///     Ok(())
/// }
/// ```
pub struct Imulink;

impl Imulink {
    /// Discover a sensor on the WLAN and stream the given view.
    ///
    /// Runs the broadcast discovery handshake with the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No sensor answers within the discovery timeout
    /// - The local port cannot be bound or broadcast cannot be enabled
    /// - The configuration fails validation
    pub async fn connect(
        config: SessionConfig,
        view: ChannelView,
    ) -> Result<LiveConnection> {
        LiveConnection::connect(config, view).await
    }

    /// Start the built-in sensor simulator.
    ///
    /// Produces synthetic motion through the real decode path at
    /// `source_hz`. Useful for development, demos and CI, where no sensor is
    /// on the network.
    pub async fn simulate(view: ChannelView, source_hz: f64) -> Result<SimConnection> {
        SimConnection::start(view, source_hz).await
    }
}
