use std::collections::VecDeque;
use crate::config::PlotSettings;
use crate::drivers::axis::{sample_count, Tick, TimeAxis};
use crate::drivers::calibration::raw_to_volts;
use crate::drivers::filter::MovingAverage;
/// One ingested sample across the four traces.
///
/// Storing the traces side by side keeps the visible window and the history
/// index-aligned by construction.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TracePoint {
    pub signal: f64,
    pub derivative: f64,
    pub filtered_signal: f64,
    pub filtered_derivative: f64,
}
impl TracePoint {
    pub const ZERO: TracePoint = TracePoint {
        signal: 0.0,
        derivative: 0.0,
        filtered_signal: 0.0,
        filtered_derivative: 0.0,
    };
}
/// Read-only snapshot handed to the presentation side every redraw tick.
#[derive(Clone, Debug)]
pub struct PlotFrame {
    pub x: Vec<f64>,
    pub signal: Vec<f64>,
    pub derivative: Vec<f64>,
    /// True when `signal`/`derivative` hold the moving-average traces.
    pub filtered: bool,
    pub signal_bounds: (f64, f64),
    pub derivative_bounds: (f64, f64),
    pub x_max: f64,
    pub ticks: Vec<Tick>,
    pub history_len: usize,
}
impl PlotFrame {
    pub fn len(&self) -> usize {
        self.x.len()
    }
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}
/// Fixed-length rolling window backed by an append-only history.
pub struct RollingBuffers {
    visible: VecDeque<TracePoint>,
    history: Vec<TracePoint>,
    signal_filter: MovingAverage,
    derivative_filter: MovingAverage,
    x_axis_size: u32,
    sample_rate: u32,
    y_bounds: (f64, f64),
    axis: TimeAxis,
}
impl RollingBuffers {
    pub fn new(settings: &PlotSettings) -> Self {
        let len = sample_count(settings.x_axis_size, settings.sample_rate);
        let window = settings.window_samples as usize;
        Self {
            visible: VecDeque::from(vec![TracePoint::ZERO; len]),
            history: Vec::new(),
            signal_filter: MovingAverage::new(window),
            derivative_filter: MovingAverage::new(window),
            x_axis_size: settings.x_axis_size,
            sample_rate: settings.sample_rate,
            y_bounds: (settings.y_axis_min, settings.y_axis_max),
            axis: TimeAxis::new(settings.x_axis_size, len),
        }
    }
    /// Calibrated signal of every sample ingested so far.
    pub fn history_signal(&self) -> Vec<f64> {
        self.history.iter().map(|p| p.signal).collect()
    }
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
    /// Calibrates one raw device code and pushes it through all four traces.
    pub fn ingest(&mut self, raw: i64) -> TracePoint {
        let signal = raw_to_volts(raw);
        let previous = self.visible.back().map(|p| p.signal).unwrap_or(0.0);
        let derivative = signal - previous;
        let point = TracePoint {
            signal,
            derivative,
            filtered_signal: self.signal_filter.ingest(signal),
            filtered_derivative: self.derivative_filter.ingest(derivative),
        };
        self.history.push(point);
        if !self.visible.is_empty() {
            self.visible.pop_front();
            self.visible.push_back(point);
        }
        point
    }
    pub fn resize_window(&mut self, x_axis_size: u32) {
        if x_axis_size == self.x_axis_size {
            return;
        }
        self.x_axis_size = x_axis_size;
        self.reconcile_len(sample_count(x_axis_size, self.sample_rate));
    }
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        if sample_rate == self.sample_rate {
            return;
        }
        self.sample_rate = sample_rate;
        self.reconcile_len(sample_count(self.x_axis_size, sample_rate));
    }
    pub fn set_filter_len(&mut self, window_samples: usize) {
        if window_samples == self.signal_filter.len() {
            return;
        }
        self.signal_filter.set_len(window_samples);
        self.derivative_filter.set_len(window_samples);
    }
    pub fn set_y_bounds(&mut self, y_min: f64, y_max: f64) {
        self.y_bounds = (y_min, y_max);
    }
    /// Applies a full settings record. Each part is a no-op when unchanged.
    pub fn apply_settings(&mut self, settings: &PlotSettings) {
        self.set_filter_len(settings.window_samples as usize);
        self.set_sample_rate(settings.sample_rate);
        self.resize_window(settings.x_axis_size);
        self.set_y_bounds(settings.y_axis_min, settings.y_axis_max);
    }
    fn reconcile_len(&mut self, new_len: usize) {
        let old_len = self.visible.len();
        if new_len < old_len {
            self.visible.drain(..old_len - new_len);
        } else if new_len > old_len {
            let need = new_len - old_len;
            let avail = self.history.len().saturating_sub(old_len);
            // history entries that scrolled out of the window, oldest first
            let hidden = &self.history[..self.history.len() - old_len.min(self.history.len())];
            let take = avail.min(need);
            for point in hidden[hidden.len() - take..].iter().rev() {
                self.visible.push_front(*point);
            }
            for _ in take..need {
                self.visible.push_front(TracePoint::ZERO);
            }
        }
        self.axis = TimeAxis::new(self.x_axis_size, self.visible.len());
    }
    pub fn frame(&self) -> PlotFrame {
        let filtered = self.signal_filter.len() > 1;
        let (signal, derivative) = if filtered {
            self.visible
                .iter()
                .map(|p| (p.filtered_signal, p.filtered_derivative))
                .unzip()
        } else {
            self.visible.iter().map(|p| (p.signal, p.derivative)).unzip()
        };
        let (y_min, y_max) = self.y_bounds;
        PlotFrame {
            x: self.axis.positions().to_vec(),
            signal,
            derivative,
            filtered,
            signal_bounds: (y_min, y_max),
            derivative_bounds: (-y_max / 2.0, y_max / 2.0),
            x_max: self.axis.x_max(),
            ticks: self.axis.ticks().to_vec(),
            history_len: self.history.len(),
        }
    }
}
#[cfg(test)]
impl RollingBuffers {
    fn visible_len(&self) -> usize {
        self.visible.len()
    }
    fn visible(&self) -> impl Iterator<Item = &TracePoint> + '_ {
        self.visible.iter()
    }
    fn history(&self) -> &[TracePoint] {
        &self.history
    }
    fn filter_len(&self) -> usize {
        self.signal_filter.len()
    }
}
