use std::ops::RangeInclusive;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;
pub const WINDOW_SAMPLES_RANGE: RangeInclusive<u32> = 1..=8;
pub const SAMPLE_RATE_RANGE: RangeInclusive<u32> = 1..=100;
pub const X_AXIS_SIZE_RANGE: RangeInclusive<u32> = 5..=3660;
pub const Y_AXIS_MIN_RANGE: RangeInclusive<f64> = -60.0..=69.9;
pub const Y_AXIS_MAX_RANGE: RangeInclusive<f64> = 1.0..=70.0;
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("{field} = {value} is outside {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("settings i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings record is malformed: {0}")]
    Format(#[from] serde_json::Error),
}
/// The persisted plot configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlotSettings {
    /// Moving-average length; 1 disables filtering.
    pub window_samples: u32,
    /// Device polling rate in Hz.
    pub sample_rate: u32,
    /// Width of the rolling window in seconds.
    pub x_axis_size: u32,
    pub y_axis_min: f64,
    pub y_axis_max: f64,
}
impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            window_samples: 1,
            sample_rate: 10,
            x_axis_size: 30,
            y_axis_min: 0.0,
            y_axis_max: 60.0,
        }
    }
}
impl PlotSettings {
    pub fn sample_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.sample_rate.max(1) as f64)
    }
    pub fn validate(&self) -> Result<(), SettingsError> {
        check_u32("window_samples", self.window_samples, WINDOW_SAMPLES_RANGE)?;
        check_u32("sample_rate", self.sample_rate, SAMPLE_RATE_RANGE)?;
        check_u32("x_axis_size", self.x_axis_size, X_AXIS_SIZE_RANGE)?;
        check_f64("y_axis_min", self.y_axis_min, Y_AXIS_MIN_RANGE)?;
        check_f64("y_axis_max", self.y_axis_max, Y_AXIS_MAX_RANGE)?;
        Ok(())
    }
}
fn check_u32(
    field: &'static str,
    value: u32,
    range: RangeInclusive<u32>,
) -> Result<(), SettingsError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(SettingsError::OutOfRange {
            field,
            value: value as f64,
            min: *range.start() as f64,
            max: *range.end() as f64,
        })
    }
}
fn check_f64(
    field: &'static str,
    value: f64,
    range: RangeInclusive<f64>,
) -> Result<(), SettingsError> {
    // NaN fails `contains`, which is what we want
    if range.contains(&value) {
        Ok(())
    } else {
        Err(SettingsError::OutOfRange {
            field,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}
