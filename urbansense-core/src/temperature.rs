//! Thermistor temperature sampling
//!
//! Periodic sampling of an analog thermistor voltage divider: raw ADC count
//! (averaged over a few sub-samples) → voltage → divider resistance → Beta
//! parametric model → Celsius plus an additive calibration offset.
//!
//! Sampling is gated by elapsed milliseconds against the previous sample,
//! not a timer interrupt: the main loop polls and the sampler decides.
//! Invalid conversions (rail-saturated ADC, NaN intermediates, implausible
//! results) are discarded by exclusion: no substitution, no interpolation.

use crate::constants::thermistor::{
    ADC_MAX_COUNT, ADC_REF_VOLTS, DEFAULT_BETA, DEFAULT_R0_OHMS, DEFAULT_SERIES_OHMS,
    DEFAULT_SUPPLY_VOLTS, DEFAULT_T0_CELSIUS, KELVIN_OFFSET, TEMP_OVERSAMPLE,
    TEMP_SAMPLE_PERIOD_MS, TEMP_VALID_MAX_C, TEMP_VALID_MIN_C,
};
use crate::errors::TemperatureError;
use crate::time::Timestamp;

/// One validated temperature sample
///
/// Only ever constructed from a conversion that passed the validity policy.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TemperatureReading {
    /// Temperature in Celsius
    pub celsius: f32,
}

/// Raw ADC access for the thermistor channel
///
/// A register read; saturation and plausibility are judged downstream.
pub trait AdcSource {
    /// Read one raw conversion
    fn read_raw(&mut self) -> u16;
}

/// Which leg of the divider the thermistor occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DividerTopology {
    /// Thermistor between the ADC node and ground; series resistor to supply
    ThermistorToGround,
    /// Thermistor between supply and the ADC node; series resistor to ground
    ThermistorToSupply,
}

/// Thermistor circuit description and Beta-model parameters
#[derive(Debug, Clone, Copy)]
pub struct ThermistorConfig {
    /// Beta parameter from the datasheet
    pub beta: f32,
    /// Reference resistance at `t0_celsius`, ohms
    pub r0_ohms: f32,
    /// Reference temperature, Celsius
    pub t0_celsius: f32,
    /// Fixed series resistor, ohms
    pub series_ohms: f32,
    /// Divider supply voltage
    pub supply_volts: f32,
    /// Circuit orientation
    pub topology: DividerTopology,
    /// Additive calibration trim, Celsius
    pub offset_celsius: f32,
}

impl Default for ThermistorConfig {
    fn default() -> Self {
        Self {
            beta: DEFAULT_BETA,
            r0_ohms: DEFAULT_R0_OHMS,
            t0_celsius: DEFAULT_T0_CELSIUS,
            series_ohms: DEFAULT_SERIES_OHMS,
            supply_volts: DEFAULT_SUPPLY_VOLTS,
            topology: DividerTopology::ThermistorToGround,
            offset_celsius: 0.0,
        }
    }
}

/// ADC transfer characteristics
#[derive(Debug, Clone, Copy)]
pub struct AdcCalibration {
    /// Full-scale raw count
    pub max_count: u16,
    /// Reference voltage at full scale
    pub ref_volts: f32,
}

impl Default for AdcCalibration {
    fn default() -> Self {
        Self {
            max_count: ADC_MAX_COUNT,
            ref_volts: ADC_REF_VOLTS,
        }
    }
}

/// Period-gated thermistor sampler
pub struct TemperatureSampler {
    config: ThermistorConfig,
    adc: AdcCalibration,
    period_ms: u32,
    oversample: u8,
    last_sample_ms: Option<Timestamp>,
}

impl TemperatureSampler {
    /// Create with the default period and oversampling
    pub fn new(config: ThermistorConfig) -> Self {
        Self {
            config,
            adc: AdcCalibration::default(),
            period_ms: TEMP_SAMPLE_PERIOD_MS,
            oversample: TEMP_OVERSAMPLE,
            last_sample_ms: None,
        }
    }

    /// Override the ADC calibration
    pub fn with_adc_calibration(mut self, adc: AdcCalibration) -> Self {
        self.adc = adc;
        self
    }

    /// Override the sampling period in milliseconds
    pub fn with_period_ms(mut self, period_ms: u32) -> Self {
        self.period_ms = period_ms;
        self
    }

    /// Sample if the period has elapsed; `None` when gated or when the
    /// conversion fails the validity policy
    pub fn poll(&mut self, now_ms: Timestamp, adc: &mut impl AdcSource) -> Option<TemperatureReading> {
        if let Some(last) = self.last_sample_ms {
            if now_ms.saturating_sub(last) < self.period_ms as u64 {
                return None;
            }
        }
        self.last_sample_ms = Some(now_ms);

        let raw = self.read_averaged(adc);
        match self.convert(raw) {
            Ok(celsius) => Some(TemperatureReading { celsius }),
            Err(e) => {
                log::debug!("temperature sample discarded: {}", e);
                None
            }
        }
    }

    fn read_averaged(&self, adc: &mut impl AdcSource) -> f32 {
        let n = self.oversample.max(1) as u32;
        let mut sum = 0u32;
        for _ in 0..n {
            sum += adc.read_raw() as u32;
        }
        sum as f32 / n as f32
    }

    /// Convert an averaged raw count to Celsius
    ///
    /// Exposed for calibration tooling; `poll` is the normal entry point.
    pub fn convert(&self, raw: f32) -> Result<f32, TemperatureError> {
        let max = self.adc.max_count as f32;
        // Within half a count of either rail the divider reading carries no
        // information
        if raw <= 0.5 || raw >= max - 0.5 {
            return Err(TemperatureError::Saturated { raw });
        }

        let volts = raw / max * self.adc.ref_volts;
        if volts >= self.config.supply_volts {
            return Err(TemperatureError::InvalidValue);
        }

        let resistance = match self.config.topology {
            DividerTopology::ThermistorToGround => {
                self.config.series_ohms * volts / (self.config.supply_volts - volts)
            }
            DividerTopology::ThermistorToSupply => {
                self.config.series_ohms * (self.config.supply_volts - volts) / volts
            }
        };
        if !resistance.is_finite() || resistance <= 0.0 {
            return Err(TemperatureError::InvalidValue);
        }

        let t0_kelvin = self.config.t0_celsius + KELVIN_OFFSET;
        let inv_t =
            1.0 / t0_kelvin + libm::logf(resistance / self.config.r0_ohms) / self.config.beta;
        let celsius = 1.0 / inv_t - KELVIN_OFFSET + self.config.offset_celsius;

        if !celsius.is_finite() {
            return Err(TemperatureError::InvalidValue);
        }
        if !(TEMP_VALID_MIN_C..=TEMP_VALID_MAX_C).contains(&celsius) {
            return Err(TemperatureError::OutOfRange {
                celsius,
                min: TEMP_VALID_MIN_C,
                max: TEMP_VALID_MAX_C,
            });
        }
        Ok(celsius)
    }
}
