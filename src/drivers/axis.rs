/// Candidate tick spacings in seconds, smallest first.
const TICK_STEPS: [f64; 12] = [
    1.0, 2.0, 5.0, 10.0, 20.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1200.0, 1800.0,
];
const MAX_TICKS: f64 = 8.0;
/// Number of samples in a window of `x_axis_size` seconds at `sample_rate` Hz.
pub fn sample_count(x_axis_size: u32, sample_rate: u32) -> usize {
    (x_axis_size as usize * sample_rate as usize).max(1)
}
#[derive(Clone, Debug, PartialEq)]
pub struct Tick {
    pub position: f64,
    pub label: String,
}
/// X coordinates of a rolling window plus its tick marks.
///
/// Positions run from 0 (oldest) to `x_axis_size - 1` (newest). Tick labels
/// are relative to the newest point, so the rightmost tick reads `0` and the
/// ticks to its left read negative seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeAxis {
    positions: Vec<f64>,
    x_max: f64,
    ticks: Vec<Tick>,
}
impl TimeAxis {
    pub fn new(x_axis_size: u32, len: usize) -> Self {
        let x_max = (x_axis_size as f64 - 1.0).max(0.0);
        Self {
            positions: linspace(0.0, x_max, len),
            x_max,
            ticks: ticks(x_max),
        }
    }
    pub fn positions(&self) -> &[f64] {
        &self.positions
    }
    pub fn x_max(&self) -> f64 {
        self.x_max
    }
    pub fn ticks(&self) -> &[Tick] {
        &self.ticks
    }
}
/// `len` evenly spaced points over `[start, stop]`, both ends included.
pub fn linspace(start: f64, stop: f64, len: usize) -> Vec<f64> {
    match len {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (len - 1) as f64;
            (0..len).map(|i| start + step * i as f64).collect()
        }
    }
}
/// Label for an absolute x position, as seconds before the newest point.
pub fn time_label(position: f64, x_max: f64) -> String {
    let offset = position - x_max;
    if offset.abs() < 1e-9 {
        return "0".to_owned();
    }
    if (offset - offset.round()).abs() < 1e-9 {
        format!("{:.0}", offset)
    } else {
        format!("{:.1}", offset)
    }
}
fn ticks(x_max: f64) -> Vec<Tick> {
    let step = TICK_STEPS
        .iter()
        .copied()
        .find(|s| x_max / s <= MAX_TICKS)
        .unwrap_or(3600.0);
    let mut out = Vec::new();
    let mut position = x_max;
    while position >= -1e-9 {
        out.push(Tick {
            position,
            label: time_label(position, x_max),
        });
        position -= step;
    }
    out.reverse();
    out
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn linspace_includes_both_ends() {
        let xs = linspace(0.0, 29.0, 300);
        assert_eq!(xs.len(), 300);
        assert_eq!(xs[0], 0.0);
        assert!((xs[299] - 29.0).abs() < 1e-9);
        assert!(xs.windows(2).all(|w| w[1] > w[0]));
    }
    #[test]
    fn linspace_degenerate_lengths() {
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(3.0, 9.0, 1), vec![3.0]);
    }
    #[test]
    fn rightmost_tick_is_zero_and_labels_count_down() {
        let axis = TimeAxis::new(30, 300);
        let ticks = axis.ticks();
        let last = ticks.last().unwrap();
        assert_eq!(last.position, 29.0);
        assert_eq!(last.label, "0");
        assert!(ticks.len() as f64 <= MAX_TICKS + 1.0);
        for pair in ticks.windows(2) {
            assert!(pair[0].position < pair[1].position);
        }
        assert_eq!(ticks[ticks.len() - 2].label, "-5");
    }
    #[test]
    fn long_windows_use_coarser_ticks() {
        let axis = TimeAxis::new(3660, 3660);
        assert!(axis.ticks().len() <= 9);
        assert_eq!(axis.ticks().last().unwrap().label, "0");
    }
    #[test]
    fn sample_count_never_zero() {
        assert_eq!(sample_count(30, 10), 300);
        assert_eq!(sample_count(0, 10), 1);
    }
}
