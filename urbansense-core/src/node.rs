//! Sensor node control loop
//!
//! One cooperative loop per node: the blocking audio read paces each
//! iteration (roughly every 32 ms at the configured rate), the temperature
//! sampler self-gates on elapsed time, and the aggregator flushes on clock
//! boundaries. Completed buckets are handed to a [`BucketSink`]: the HTTPS
//! dispatcher on egress nodes, the radio on remote nodes.
//!
//! All pipeline state is owned by the node instance; a test process can run
//! several independent simulated nodes side by side.

use heapless::String;

use crate::bucket::{CompletedBucket, MinuteAggregator};
use crate::loudness::{AudioSource, LoudnessEstimator, LoudnessReading};
use crate::temperature::{AdcSource, TemperatureReading, TemperatureSampler};
use crate::time::{ClockSource, Timestamp};
use crate::constants::audio::AUDIO_BLOCK_LEN;

/// Maximum bytes of a location name kept on-device
pub const MAX_LOCATION_NAME: usize = 48;

/// Static placement metadata for one node
///
/// Joined onto completed buckets at dispatch time; never travels over the
/// radio (the relay holds the remote node's identity statically).
#[derive(Debug, Clone, PartialEq)]
pub struct NodeIdentity {
    /// Stable sensor identifier in the datastore
    pub sensor_id: u32,
    /// Installation latitude
    pub lat: f32,
    /// Installation longitude
    pub lon: f32,
    /// Human-readable placement name
    pub location_name: String<MAX_LOCATION_NAME>,
}

impl NodeIdentity {
    /// Create an identity; the location name is clipped to
    /// [`MAX_LOCATION_NAME`] bytes at a character boundary
    pub fn new(sensor_id: u32, lat: f32, lon: f32, location_name: &str) -> Self {
        let mut name = String::new();
        for ch in location_name.chars() {
            if name.push(ch).is_err() {
                break;
            }
        }
        Self {
            sensor_id,
            lat,
            lon,
            location_name: name,
        }
    }
}

/// Destination for completed buckets
///
/// Delivery is best-effort: the node logs a failed publish and moves on -
/// the record is lost, the loop is not.
pub trait BucketSink {
    /// Why a publish failed; logged, never acted on
    type Error: core::fmt::Debug;

    /// Deliver one completed bucket
    fn publish(
        &mut self,
        identity: &NodeIdentity,
        bucket: &CompletedBucket,
    ) -> Result<(), Self::Error>;
}

/// What one loop iteration did, for diagnostics and tests
#[derive(Debug, Clone, Copy, Default)]
pub struct IterationOutcome {
    /// Loudness reading produced this iteration, if the audio read succeeded
    pub loudness: Option<LoudnessReading>,
    /// Temperature reading, if the sampling period had elapsed and the
    /// conversion was valid
    pub temperature: Option<TemperatureReading>,
    /// Whether a completed bucket was flushed to the sink
    pub flushed: bool,
    /// Whether the iteration was skipped on a failed audio read
    pub audio_skipped: bool,
}

/// One sensor node's pipeline: audio, temperature, clock, aggregation
pub struct SensorNode<A, D, C> {
    identity: NodeIdentity,
    audio: A,
    adc: D,
    clock: C,
    estimator: LoudnessEstimator,
    sampler: TemperatureSampler,
    aggregator: MinuteAggregator,
    block: [i32; AUDIO_BLOCK_LEN],
}

impl<A, D, C> SensorNode<A, D, C>
where
    A: AudioSource,
    D: AdcSource,
    C: ClockSource,
{
    /// Assemble a node from its hardware seams and pipeline components
    pub fn new(
        identity: NodeIdentity,
        audio: A,
        adc: D,
        clock: C,
        estimator: LoudnessEstimator,
        sampler: TemperatureSampler,
    ) -> Self {
        Self {
            identity,
            audio,
            adc,
            clock,
            estimator,
            sampler,
            aggregator: MinuteAggregator::new(),
            block: [0; AUDIO_BLOCK_LEN],
        }
    }

    /// This node's placement metadata
    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    /// The aggregation state machine (read-only)
    pub fn aggregator(&self) -> &MinuteAggregator {
        &self.aggregator
    }

    /// Mutable access to the clock source (periodic resync, tests)
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Run one loop iteration
    ///
    /// Ordering mirrors the device loop: audio read (the pacing suspension
    /// point), temperature poll, clock query and possible flush, then
    /// accumulation into the (possibly just-reset) open bucket.
    pub fn run_iteration(
        &mut self,
        now_ms: Timestamp,
        sink: &mut impl BucketSink,
    ) -> IterationOutcome {
        let frames = match self.audio.read_block(&mut self.block) {
            Ok(0) => {
                return IterationOutcome {
                    audio_skipped: true,
                    ..IterationOutcome::default()
                }
            }
            Ok(n) => n.min(AUDIO_BLOCK_LEN),
            Err(e) => {
                log::debug!("audio read failed, skipping iteration: {}", e);
                return IterationOutcome {
                    audio_skipped: true,
                    ..IterationOutcome::default()
                };
            }
        };

        let loudness = self.estimator.process_block(&self.block[..frames]);
        let temperature = self.sampler.poll(now_ms, &mut self.adc);

        let now = self.clock.now();
        let mut flushed = false;
        if let Some(bucket) = self.aggregator.observe(now) {
            flushed = true;
            if let Err(e) = sink.publish(&self.identity, &bucket) {
                // Best-effort: the record is lost, the loop continues
                log::debug!(
                    "bucket publish failed for sensor {}: {:?}",
                    self.identity.sensor_id,
                    e
                );
            }
        }

        self.aggregator.add_loudness(&loudness);
        if let Some(t) = &temperature {
            self.aggregator.add_temperature(t);
        }

        IterationOutcome {
            loudness: Some(loudness),
            temperature,
            flushed,
            audio_skipped: false,
        }
    }
}
