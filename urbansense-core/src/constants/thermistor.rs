//! Thermistor circuit defaults and ADC calibration
//!
//! Defaults describe the deployed 10k NTC in a 10k voltage divider on a
//! 3.3 V, 12-bit ADC. Boards with a different circuit override these via
//! [`ThermistorConfig`](crate::temperature::ThermistorConfig).

/// Minimum milliseconds between thermistor samples
pub const TEMP_SAMPLE_PERIOD_MS: u32 = 250;

/// ADC sub-samples averaged per thermistor reading
pub const TEMP_OVERSAMPLE: u8 = 4;

/// Lower plausibility bound for a converted temperature, Celsius
pub const TEMP_VALID_MIN_C: f32 = -40.0;

/// Upper plausibility bound for a converted temperature, Celsius
pub const TEMP_VALID_MAX_C: f32 = 125.0;

/// 0 °C in Kelvin
pub const KELVIN_OFFSET: f32 = 273.15;

/// Beta parameter of the deployed NTC (datasheet, 25/50 °C)
pub const DEFAULT_BETA: f32 = 3950.0;

/// Thermistor reference resistance at `DEFAULT_T0_CELSIUS`, ohms
pub const DEFAULT_R0_OHMS: f32 = 10_000.0;

/// Reference temperature for `DEFAULT_R0_OHMS`, Celsius
pub const DEFAULT_T0_CELSIUS: f32 = 25.0;

/// Fixed series resistor in the divider, ohms
pub const DEFAULT_SERIES_OHMS: f32 = 10_000.0;

/// Divider supply voltage
pub const DEFAULT_SUPPLY_VOLTS: f32 = 3.3;

/// Full-scale raw count of the 12-bit ADC
pub const ADC_MAX_COUNT: u16 = 4095;

/// ADC reference voltage
pub const ADC_REF_VOLTS: f32 = 3.3;
