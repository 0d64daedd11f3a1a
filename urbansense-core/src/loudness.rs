//! Loudness estimation from raw audio blocks
//!
//! Converts one fixed-length block of signed samples into a calibrated
//! sound-level reading: RMS over the block, dBFS relative to full scale
//! (floored on silence), exponential smoothing, and a fixed calibration
//! offset mapping dBFS to an approximate SPL in dB.
//!
//! The smoothing state lives in the estimator instance and persists for the
//! whole device runtime: it is *not* reset at bucket boundaries. Construct
//! one estimator per logical node; tests can run several side by side.

use crate::constants::audio::{
    AUDIO_BLOCK_LEN, DBFS_FLOOR, DBFS_TO_SPL_OFFSET_DB, FULL_SCALE_24_BIT, RMS_SILENCE_FLOOR,
    SMOOTHING_ALPHA, SMOOTHING_SEED_DBFS,
};
use crate::errors::AudioError;

/// One loudness estimate, derived from a single audio block
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoudnessReading {
    /// Instantaneous block dBFS, before smoothing
    pub raw_dbfs: f32,
    /// Exponentially smoothed dBFS series
    pub smoothed_dbfs: f32,
    /// Smoothed dBFS mapped through the device calibration to SPL dB
    pub estimated_spl_db: f32,
}

/// Blocking source of fixed-length audio blocks
///
/// `read_block` blocks until a DMA buffer is ready (this paces the main
/// loop) and returns the number of samples written. A driver error or a
/// zero-length read makes the caller skip the iteration and retry next pass.
pub trait AudioSource {
    /// Fill `block` with the next buffer of samples
    fn read_block(&mut self, block: &mut [i32; AUDIO_BLOCK_LEN]) -> Result<usize, AudioError>;
}

/// Streaming loudness estimator
///
/// Owns the smoothing state and the device calibration offset.
#[derive(Debug, Clone)]
pub struct LoudnessEstimator {
    smoothed_dbfs: f32,
    calibration_offset_db: f32,
    full_scale: f32,
}

impl LoudnessEstimator {
    /// Create with the device's calibration offset (from a reference SPL
    /// measurement) and the default 24-bit full scale
    pub fn new(calibration_offset_db: f32) -> Self {
        Self {
            smoothed_dbfs: SMOOTHING_SEED_DBFS,
            calibration_offset_db,
            full_scale: FULL_SCALE_24_BIT,
        }
    }

    /// Override the full-scale amplitude (e.g. 16-bit capture paths)
    pub fn with_full_scale(mut self, full_scale: f32) -> Self {
        self.full_scale = full_scale;
        self
    }

    /// Current smoothed dBFS state
    pub fn smoothed_dbfs(&self) -> f32 {
        self.smoothed_dbfs
    }

    /// Estimate loudness for one block and update the smoothing state
    ///
    /// Sum of squares accumulates in f64: a full block of full-scale 32-bit
    /// samples overflows u64.
    pub fn process_block(&mut self, samples: &[i32]) -> LoudnessReading {
        let mut sum_sq = 0.0f64;
        for &s in samples {
            let v = s as f64;
            sum_sq += v * v;
        }
        let n = samples.len().max(1);
        let rms = libm::sqrt(sum_sq / n as f64) as f32;

        let raw_dbfs = if rms <= RMS_SILENCE_FLOOR {
            DBFS_FLOOR
        } else {
            20.0 * libm::log10f(rms / self.full_scale)
        };

        self.smoothed_dbfs =
            (1.0 - SMOOTHING_ALPHA) * self.smoothed_dbfs + SMOOTHING_ALPHA * raw_dbfs;

        LoudnessReading {
            raw_dbfs,
            smoothed_dbfs: self.smoothed_dbfs,
            estimated_spl_db: self.smoothed_dbfs + DBFS_TO_SPL_OFFSET_DB + self.calibration_offset_db,
        }
    }
}
