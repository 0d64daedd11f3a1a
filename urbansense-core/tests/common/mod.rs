//! Shared test doubles for integration tests
//!
//! Hardware seams (audio, ADC, clock, radio, sink) replaced with
//! deterministic in-memory implementations so whole simulated nodes run
//! inside one test process.

pub mod generators;

use urbansense_core::{BucketSink, CompletedBucket, NodeIdentity};

/// Sink that records every published bucket with its identity
#[derive(Default)]
pub struct MemoryBucketSink {
    pub published: Vec<(u32, CompletedBucket)>,
}

impl MemoryBucketSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BucketSink for MemoryBucketSink {
    type Error = std::convert::Infallible;

    fn publish(
        &mut self,
        identity: &NodeIdentity,
        bucket: &CompletedBucket,
    ) -> Result<(), Self::Error> {
        self.published.push((identity.sensor_id, *bucket));
        Ok(())
    }
}
