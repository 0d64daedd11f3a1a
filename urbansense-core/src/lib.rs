//! Streaming aggregation core for the urbansense sensor network
//!
//! Battery/mains-powered nodes sample audio and temperature, aggregate
//! readings into wall-clock minute buckets, and hand completed buckets to
//! an uplink (HTTPS on egress nodes, point-to-point radio on remote nodes).
//! This crate is the hardware-independent core of that pipeline.
//!
//! Key constraints:
//! - Single cooperative control loop; the blocking audio read is the pacing
//!   suspension point
//! - No heap allocation in the pipeline; all state is owned component
//!   instances
//! - The only concurrent state is the capacity-1 relay mailbox, guarded by
//!   a critical section
//!
//! ```no_run
//! use urbansense_core::{
//!     LoudnessEstimator, MinuteAggregator, TemperatureSampler,
//!     temperature::ThermistorConfig,
//! };
//!
//! let mut estimator = LoudnessEstimator::new(2.0);
//! let mut sampler = TemperatureSampler::new(ThermistorConfig::default());
//! let mut aggregator = MinuteAggregator::new();
//! // Feed blocks/samples each loop pass; observe() the clock for flushes.
//! # let _ = (&mut estimator, &mut sampler, &mut aggregator);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod bucket;
pub mod constants;
pub mod errors;
pub mod loudness;
pub mod mailbox;
pub mod node;
pub mod temperature;
pub mod time;
pub mod wire;

// Public API
pub use bucket::{BucketKey, CompletedBucket, MinuteAggregator, SPL_MAX_SENTINEL};
pub use errors::{AudioError, ClockError, TemperatureError, WireError};
pub use loudness::{AudioSource, LoudnessEstimator, LoudnessReading};
pub use mailbox::{MailboxStats, RelayMailbox};
pub use node::{BucketSink, IterationOutcome, NodeIdentity, SensorNode};
pub use temperature::{AdcSource, TemperatureReading, TemperatureSampler};
pub use time::{CalendarTime, ClockSource, Timestamp, Uptime};
pub use wire::{RadioBucketSink, RadioTx, RemoteBucketMessage};

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
