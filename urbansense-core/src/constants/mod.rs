//! Constants for the urbansense core
//!
//! Centralized, documented constants used throughout the pipeline. Values
//! come from the deployed hardware (microphone word size, ADC resolution,
//! thermistor datasheet) or from the aggregation design (bucket cadence,
//! smoothing factor); each is documented at its definition.
//!
//! Constants are grouped by domain:
//! - **Audio**: capture geometry and loudness-estimation parameters
//! - **Thermistor**: ADC calibration and Beta-model defaults
//! - **Time**: sampling cadences and sync budgets

/// Audio capture geometry and loudness-estimation parameters.
pub mod audio;

/// Thermistor circuit defaults and ADC calibration.
pub mod thermistor;

/// Sampling cadences, sync budgets, and calendar constants.
pub mod time;

// Re-export commonly used constants for convenience
pub use audio::{
    AUDIO_BLOCK_LEN, SAMPLE_RATE_HZ, BLOCK_PERIOD_MS,
    SMOOTHING_ALPHA, SMOOTHING_SEED_DBFS, DBFS_FLOOR, DBFS_TO_SPL_OFFSET_DB,
};

pub use thermistor::{
    TEMP_SAMPLE_PERIOD_MS, TEMP_VALID_MIN_C, TEMP_VALID_MAX_C,
};

pub use time::{MS_PER_SECOND, SECONDS_PER_MINUTE, NTP_SYNC_BUDGET_MS};
