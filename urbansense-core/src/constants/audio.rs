//! Audio capture and loudness-estimation constants

/// Samples per hardware DMA buffer
///
/// The audio driver fills a double-buffer of this length; one block is the
/// unit of loudness estimation. At 16 kHz this paces the main loop at
/// roughly one iteration per 32 ms.
pub const AUDIO_BLOCK_LEN: usize = 512;

/// Capture rate in Hz (mono)
pub const SAMPLE_RATE_HZ: u32 = 16_000;

/// Nominal wall time covered by one block, in milliseconds
pub const BLOCK_PERIOD_MS: u32 = (AUDIO_BLOCK_LEN as u32 * 1000) / SAMPLE_RATE_HZ;

/// Full-scale amplitude for a 24-bit microphone word (2^23)
///
/// I2S MEMS microphones deliver 24 significant bits left-justified in a
/// 32-bit slot; dBFS is computed relative to this amplitude.
pub const FULL_SCALE_24_BIT: f32 = 8_388_608.0;

/// Exponential smoothing factor for the dBFS series
///
/// Single-pole low-pass: suppresses block-to-block jitter while tracking
/// loudness trends on the order of a second.
pub const SMOOTHING_ALPHA: f32 = 0.15;

/// Initial value of the smoothed dBFS state at boot
pub const SMOOTHING_SEED_DBFS: f32 = -90.0;

/// Floor applied to dBFS when block RMS is at or below [`RMS_SILENCE_FLOOR`]
///
/// Avoids -inf from `log10` on silent blocks.
pub const DBFS_FLOOR: f32 = -120.0;

/// RMS at or below this is treated as silence
pub const RMS_SILENCE_FLOOR: f32 = 1.0;

/// Fixed offset mapping smoothed dBFS to an approximate SPL in dB
///
/// The per-device calibration offset (from a reference SPL measurement) is
/// added on top of this.
pub const DBFS_TO_SPL_OFFSET_DB: f32 = 120.0;
