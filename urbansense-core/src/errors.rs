//! Error Types for the Sensor Pipeline
//!
//! ## Design Philosophy
//!
//! Errors follow the fault taxonomy of the deployed network:
//!
//! 1. **Transient I/O** (`AudioError`): the current loop iteration is skipped
//!    and the operation retried on the next pass. Never escalated.
//!
//! 2. **Data quality** (`TemperatureError`): the offending sample is excluded
//!    from aggregation: not substituted, not interpolated.
//!
//! 3. **Configuration/hardware** (`ClockError::DeviceAbsent`): fatal at
//!    construction. The library returns the error; the firmware halts rather
//!    than run with an unverified clock.
//!
//! 4. **Uplink** (`WireError`, plus the sink errors in the uplink crate):
//!    logged, and the affected record is permanently lost.
//!
//! All variants are small and `Copy`: errors are returned in hot paths and
//! must not allocate. Messages use `&'static str`-free inline payloads only.

use thiserror_no_std::Error;

/// Audio capture failures
///
/// Any of these makes the caller skip the current loop iteration entirely;
/// the audio driver is retried on the next pass.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioError {
    /// Driver-level read failure (DMA error, bus fault)
    #[error("audio driver error (code {code})")]
    Driver {
        /// Driver-specific status code
        code: i32,
    },

    /// Read returned before any samples were available
    #[error("audio read returned no samples")]
    Empty,
}

/// Temperature conversion failures
///
/// These are data-quality faults: the sample is dropped from aggregation.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum TemperatureError {
    /// ADC pinned at either rail: the divider reading carries no information
    #[error("adc saturated at {raw}")]
    Saturated {
        /// Averaged raw count that hit the rail
        raw: f32,
    },

    /// Conversion produced a temperature outside the plausible range
    #[error("temperature {celsius} outside range [{min}, {max}]")]
    OutOfRange {
        /// Converted value in Celsius
        celsius: f32,
        /// Lower plausibility bound
        min: f32,
        /// Upper plausibility bound
        max: f32,
    },

    /// NaN or infinite intermediate (division-by-zero-adjacent voltages)
    #[error("invalid intermediate value")]
    InvalidValue,
}

/// Clock source failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockError {
    /// RTC did not respond at construction: fatal, the caller halts boot
    #[error("rtc device absent")]
    DeviceAbsent,

    /// Network time sync did not complete within its budget
    #[error("time sync failed within budget")]
    SyncFailed,
}

/// Radio wire format failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireError {
    /// Frame length matches no known message version
    #[error("unrecognized frame length {len}")]
    UnrecognizedLength {
        /// Received frame length in bytes
        len: usize,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for AudioError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Driver { code } => defmt::write!(fmt, "audio driver error {}", code),
            Self::Empty => defmt::write!(fmt, "audio read empty"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TemperatureError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Saturated { raw } => defmt::write!(fmt, "adc saturated at {}", raw),
            Self::OutOfRange { celsius, min, max } => {
                defmt::write!(fmt, "temp {} outside [{}, {}]", celsius, min, max)
            }
            Self::InvalidValue => defmt::write!(fmt, "invalid value"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ClockError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::DeviceAbsent => defmt::write!(fmt, "rtc absent"),
            Self::SyncFailed => defmt::write!(fmt, "time sync failed"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for WireError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::UnrecognizedLength { len } => {
                defmt::write!(fmt, "unrecognized frame length {}", len)
            }
        }
    }
}
