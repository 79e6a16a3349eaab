//! Raw ADC code to volts.
//!
//! The endpoint board was characterised with two linear fits of
//! `V_measured = m * V_in + b`, one below ~10 V and one above. The fit is
//! inverted here: `V_in = (raw - b) / m`.
/// One linear segment of the fit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub slope: f64,
    pub intercept: f64,
}
impl Segment {
    pub fn volts(&self, raw: i64) -> f64 {
        (raw as f64 - self.intercept) / self.slope
    }
}
/// Two-segment piecewise-linear calibration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Calibration {
    /// Codes below this use `low`, everything else uses `high`.
    pub threshold: i64,
    pub low: Segment,
    pub high: Segment,
}
impl Calibration {
    /// Fit measured on the endpoint ADC board.
    pub const ENDPOINT: Calibration = Calibration {
        threshold: 150,
        low: Segment {
            slope: 14.3,
            intercept: -1.0,
        },
        high: Segment {
            slope: 14.976,
            intercept: -3.7,
        },
    };
    pub fn volts(&self, raw: i64) -> f64 {
        if raw < self.threshold {
            self.low.volts(raw)
        } else {
            self.high.volts(raw)
        }
    }
}
impl Default for Calibration {
    fn default() -> Self {
        Self::ENDPOINT
    }
}
/// Convert a raw code with the endpoint board fit.
pub fn raw_to_volts(raw: i64) -> f64 {
    Calibration::ENDPOINT.volts(raw)
}
