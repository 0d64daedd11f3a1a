//! Minute-bucket aggregation state machine
//!
//! The central piece of the pipeline: aligns to wall-clock minute
//! boundaries, accumulates running statistics from the loudness and
//! temperature streams, and emits one completed-bucket snapshot per
//! observed boundary crossing.
//!
//! ## Alignment
//!
//! The aggregator starts `Unaligned` and discards readings until it
//! observes a clock reading with `second == 0`; it then opens a bucket on
//! that key and never returns to `Unaligned`. Worst-case startup skew is
//! bounded at one minute.
//!
//! ## Rollover
//!
//! Rollover is detected by *field inequality* between the current
//! [`BucketKey`] and the open one, not by elapsed duration. A node stalled
//! past a minute boundary (e.g. a slow network call) flushes only the bucket
//! that was open and re-seeds directly on the current key: skipped minutes
//! produce no records and no sentinel backfill. At most one snapshot is
//! emitted per observed key transition, and its statistics cover exactly
//! the samples observed since the previous transition.

use crate::loudness::LoudnessReading;
use crate::temperature::TemperatureReading;
use crate::time::CalendarTime;

/// Max-SPL value reported when a bucket closed with no loudness samples
pub const SPL_MAX_SENTINEL: f32 = -999.0;

/// Calendar fields identifying a one-minute wall-clock window
///
/// Equality is field-wise; any differing field is a new bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BucketKey {
    /// Calendar year
    pub year: u16,
    /// Month, 1-12
    pub month: u8,
    /// Day of month
    pub day: u8,
    /// Hour, 0-23
    pub hour: u8,
    /// Minute, 0-59
    pub minute: u8,
}

impl From<CalendarTime> for BucketKey {
    fn from(t: CalendarTime) -> Self {
        Self {
            year: t.year,
            month: t.month,
            day: t.day,
            hour: t.hour,
            minute: t.minute,
        }
    }
}

/// Running statistics for the currently open bucket
///
/// Owned exclusively by the aggregator; reset on every rollover.
#[derive(Debug, Clone, Copy)]
struct BucketAccumulator {
    key: BucketKey,
    loudness_count: u32,
    spl_sum: f32,
    spl_max: f32,
    dbfs_sum: f32,
    temp_count: u32,
    temp_sum: f32,
}

impl BucketAccumulator {
    fn new(key: BucketKey) -> Self {
        Self {
            key,
            loudness_count: 0,
            spl_sum: 0.0,
            spl_max: SPL_MAX_SENTINEL,
            dbfs_sum: 0.0,
            temp_count: 0,
            temp_sum: 0.0,
        }
    }

    fn add_loudness(&mut self, reading: &LoudnessReading) {
        self.loudness_count += 1;
        self.spl_sum += reading.estimated_spl_db;
        if reading.estimated_spl_db > self.spl_max {
            self.spl_max = reading.estimated_spl_db;
        }
        self.dbfs_sum += reading.smoothed_dbfs;
    }

    fn add_temperature(&mut self, reading: &TemperatureReading) {
        self.temp_count += 1;
        self.temp_sum += reading.celsius;
    }

    fn snapshot(&self) -> CompletedBucket {
        // Zero-count flush stays defined: 0.0 averages, sentinel max
        let (avg_spl_db, avg_dbfs) = if self.loudness_count > 0 {
            let n = self.loudness_count as f32;
            (self.spl_sum / n, self.dbfs_sum / n)
        } else {
            (0.0, 0.0)
        };
        let avg_celsius = if self.temp_count > 0 {
            Some(self.temp_sum / self.temp_count as f32)
        } else {
            None
        };

        CompletedBucket {
            key: self.key,
            avg_spl_db,
            max_spl_db: self.spl_max,
            avg_dbfs,
            loudness_samples: self.loudness_count,
            avg_celsius,
        }
    }
}

/// Immutable snapshot emitted at rollover
///
/// Identity (sensor id, coordinates, location name) is joined at dispatch
/// time so relayed buckets share this type.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompletedBucket {
    /// The minute this bucket covers
    pub key: BucketKey,
    /// Mean estimated SPL over the bucket, dB
    pub avg_spl_db: f32,
    /// Maximum estimated SPL, dB, or [`SPL_MAX_SENTINEL`] when empty
    pub max_spl_db: f32,
    /// Mean smoothed dBFS over the bucket
    pub avg_dbfs: f32,
    /// Number of loudness readings accumulated
    pub loudness_samples: u32,
    /// Mean temperature, or `None` when no valid sample was accumulated
    pub avg_celsius: Option<f32>,
}

enum AlignState {
    /// Waiting for a second-zero clock reading; readings are discarded
    Unaligned,
    /// Steady state: one open bucket, never leaves this state
    Aligned(BucketAccumulator),
}

/// Wall-clock minute aggregator
///
/// Construct one per logical node. All state is instance state, so several
/// simulated nodes can run in one process.
pub struct MinuteAggregator {
    state: AlignState,
}

impl MinuteAggregator {
    /// Create an unaligned aggregator
    pub fn new() -> Self {
        Self {
            state: AlignState::Unaligned,
        }
    }

    /// Whether the aggregator has minute-aligned yet
    pub fn is_aligned(&self) -> bool {
        matches!(self.state, AlignState::Aligned(_))
    }

    /// Key of the currently open bucket, if aligned
    pub fn open_key(&self) -> Option<BucketKey> {
        match &self.state {
            AlignState::Aligned(acc) => Some(acc.key),
            AlignState::Unaligned => None,
        }
    }

    /// Feed the current clock reading; returns the completed bucket on a
    /// boundary crossing
    ///
    /// Idempotent for an unchanged reading: observing the same instant twice
    /// emits at most one snapshot.
    pub fn observe(&mut self, now: CalendarTime) -> Option<CompletedBucket> {
        match &mut self.state {
            AlignState::Unaligned => {
                if now.second == 0 {
                    let key = BucketKey::from(now);
                    log::debug!(
                        "minute-aligned at {:04}-{:02}-{:02} {:02}:{:02}",
                        key.year,
                        key.month,
                        key.day,
                        key.hour,
                        key.minute
                    );
                    self.state = AlignState::Aligned(BucketAccumulator::new(key));
                }
                None
            }
            AlignState::Aligned(acc) => {
                let key = BucketKey::from(now);
                if key == acc.key {
                    return None;
                }
                let completed = acc.snapshot();
                *acc = BucketAccumulator::new(key);
                Some(completed)
            }
        }
    }

    /// Accumulate a loudness reading into the open bucket
    ///
    /// Discarded while unaligned.
    pub fn add_loudness(&mut self, reading: &LoudnessReading) {
        if let AlignState::Aligned(acc) = &mut self.state {
            acc.add_loudness(reading);
        }
    }

    /// Accumulate a temperature reading into the open bucket
    ///
    /// Discarded while unaligned.
    pub fn add_temperature(&mut self, reading: &TemperatureReading) {
        if let AlignState::Aligned(acc) = &mut self.state {
            acc.add_temperature(reading);
        }
    }
}

impl Default for MinuteAggregator {
    fn default() -> Self {
        Self::new()
    }
}
