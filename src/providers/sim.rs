//! Simulated sensor provider.
//!
//! Synthesizes plausible measurement bundles at the nominal rate and runs
//! them through the real decode path (writer → flatten → compose), so hosts
//! and tests exercise the same code with no hardware on the bench. The
//! motion profile is a slow rotation about the vertical axis with gravity on
//! Z and a little measurement noise.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::{Duration, Interval, MissedTickBehavior, interval};
use tracing::debug;

use crate::assembler::{QUATERNION_ADDRESS, SENSORS_ADDRESS, SampleAssembler};
use crate::osc::{BundleWriter, MessageWriter, flatten};
use crate::provider::Provider;
use crate::types::{ChannelView, SamplePacket};
use crate::Result;

/// Rotation rate of the simulated motion, deg/s.
const SIM_ROTATION_DEG_S: f32 = 20.0;

/// Paced provider emitting synthetic measurements.
pub struct SimProvider {
    assembler: SampleAssembler,
    interval: Interval,
    rng: StdRng,
    tick_rate: f64,
    seq: u64,
}

impl SimProvider {
    /// Create a simulator at the given rate with OS-seeded noise.
    pub fn new(view: ChannelView, tick_rate: f64) -> Self {
        Self::seeded(view, tick_rate, rand::random())
    }

    /// Create a simulator with a fixed noise seed, for reproducible tests.
    pub fn seeded(view: ChannelView, tick_rate: f64, seed: u64) -> Self {
        let mut pace = interval(Duration::from_secs_f64(1.0 / tick_rate));
        pace.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!(view = %view, tick_rate, seed, "simulator started");
        Self {
            assembler: SampleAssembler::new(view),
            interval: pace,
            rng: StdRng::seed_from_u64(seed),
            tick_rate,
            seq: 0,
        }
    }

    fn noise(&mut self, scale: f32) -> f32 {
        self.rng.gen_range(-scale..scale)
    }

    /// One simulated datagram: `/sensors` and `/quaternion` sharing a bundle
    /// time tag, exactly as the device sends them.
    fn datagram(&mut self, t: f64) -> Vec<u8> {
        let time = t as f32;
        let angle = (SIM_ROTATION_DEG_S * time).to_radians();

        let sensors = MessageWriter::new(SENSORS_ADDRESS)
            .float(time)
            // gyroscope, deg/s
            .float(self.noise(0.5))
            .float(self.noise(0.5))
            .float(SIM_ROTATION_DEG_S + self.noise(0.5))
            // accelerometer, g
            .float(self.noise(0.02))
            .float(self.noise(0.02))
            .float(1.0 + self.noise(0.02))
            // magnetometer, uT
            .float(20.0 * angle.cos() + self.noise(0.3))
            .float(20.0 * angle.sin() + self.noise(0.3))
            .float(44.0 + self.noise(0.3))
            // barometer, hPa
            .float(1013.0 + self.noise(0.1))
            .finish();

        let half = angle / 2.0;
        let quaternion = MessageWriter::new(QUATERNION_ADDRESS)
            .float(time)
            .float(half.cos())
            .float(0.0)
            .float(0.0)
            .float(half.sin())
            .finish();

        BundleWriter::from_seconds(t).element(&sensors).element(&quaternion).finish()
    }
}

#[async_trait::async_trait]
impl Provider for SimProvider {
    async fn next_sample(&mut self) -> Result<Option<SamplePacket>> {
        self.interval.tick().await;

        let t = self.seq as f64 / self.tick_rate;
        let datagram = self.datagram(t);
        let records = flatten(&datagram)?;
        let sample = self.assembler.compose(&records)?;

        let packet = SamplePacket::new(sample, self.seq, self.assembler.view());
        self.seq += 1;
        Ok(Some(packet))
    }

    fn view(&self) -> ChannelView {
        self.assembler.view()
    }

    fn tick_rate(&self) -> f64 {
        self.tick_rate
    }
}
