/// Points kept clear between the head marker and the right edge.
pub const HEAD_MARGIN: usize = 2;
/// Length of the highlighted tail, head included.
pub const TAIL_LEN: usize = 10;
/// A trace split the way it is drawn: a body line, a highlighted tail
/// leading into the newest visible point, and a marker on that point.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TraceSegments {
    pub body: Vec<[f64; 2]>,
    pub tail: Vec<[f64; 2]>,
    pub head: Option<[f64; 2]>,
}
pub fn split_trace(x: &[f64], y: &[f64]) -> TraceSegments {
    let len = x.len().min(y.len());
    if len <= HEAD_MARGIN {
        return TraceSegments::default();
    }
    let head = len - 1 - HEAD_MARGIN;
    let tail_start = len.saturating_sub(TAIL_LEN);
    let point = |i: usize| [x[i], y[i]];
    TraceSegments {
        body: (0..=head).map(point).collect(),
        tail: (tail_start..=head).map(point).collect(),
        head: Some(point(head)),
    }
}
