use std::collections::VecDeque;
/// Moving-average filter over the most recent `len` samples.
///
/// The window is (re)filled lazily: whenever its actual length differs from
/// the configured length, the next sample is copied into every slot so the
/// first output equals that sample instead of ramping up from zero.
#[derive(Clone, Debug)]
pub struct MovingAverage {
    window: VecDeque<f64>,
    len: usize,
}
impl MovingAverage {
    pub fn new(len: usize) -> Self {
        let len = len.max(1);
        Self {
            window: VecDeque::with_capacity(len),
            len,
        }
    }
    pub fn len(&self) -> usize {
        self.len
    }
    /// Changes the configured length. The window itself is reset on the next
    /// [`ingest`](Self::ingest).
    pub fn set_len(&mut self, len: usize) {
        self.len = len.max(1);
    }
    pub fn ingest(&mut self, value: f64) -> f64 {
        if self.window.len() != self.len {
            self.window.clear();
            self.window.resize(self.len, value);
        }
        self.window.pop_front();
        self.window.push_back(value);
        self.mean()
    }
    fn mean(&self) -> f64 {
        let sum: f64 = self.window.iter().sum();
        sum / self.len as f64
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn single_slot_is_identity() {
        let mut ma = MovingAverage::new(1);
        for x in [0.0, -3.5, 10.25, 1e6, 7.0] {
            assert_eq!(ma.ingest(x), x);
        }
    }
    #[test]
    fn cold_start_fills_with_first_sample() {
        let mut ma = MovingAverage::new(4);
        assert_eq!(ma.ingest(8.0), 8.0);
        assert_eq!(ma.ingest(12.0), 9.0);
        assert_eq!(ma.ingest(12.0), 10.0);
        assert_eq!(ma.ingest(12.0), 11.0);
        assert_eq!(ma.ingest(12.0), 12.0);
    }
    #[test]
    fn length_change_resets_window() {
        let mut ma = MovingAverage::new(2);
        ma.ingest(1.0);
        ma.ingest(3.0);
        ma.set_len(3);
        // history is discarded; the new window starts full of the new value
        assert_eq!(ma.ingest(6.0), 6.0);
        assert_eq!(ma.ingest(0.0), 4.0);
        assert_eq!(ma.len(), 3);
    }
    #[test]
    fn zero_length_is_clamped() {
        let mut ma = MovingAverage::new(0);
        assert_eq!(ma.len(), 1);
        assert_eq!(ma.ingest(2.5), 2.5);
    }
}
