use std::sync::{Arc, Mutex, MutexGuard};
use crate::config::PlotSettings;
use crate::drivers::buffer::{PlotFrame, RollingBuffers, TracePoint};
use crate::drivers::error::PipelineError;
use crate::types::IngestEvent;
/// Shared handle to the rolling buffers.
///
/// All four traces, the history and both filter windows sit behind one lock,
/// so every event is applied in a single critical section and a snapshot can
/// never observe a half-shifted window.
#[derive(Clone)]
pub struct PlotPipeline {
    shared: Arc<Mutex<RollingBuffers>>,
}
impl PlotPipeline {
    pub fn new(settings: &PlotSettings) -> Self {
        Self {
            shared: Arc::new(Mutex::new(RollingBuffers::new(settings))),
        }
    }
    fn lock(&self) -> Result<MutexGuard<'_, RollingBuffers>, PipelineError> {
        self.shared.lock().map_err(|_| PipelineError::Poisoned)
    }
    /// Applies one event. Returns the new trace point for samples.
    pub fn apply(&self, event: IngestEvent) -> Result<Option<TracePoint>, PipelineError> {
        let mut buffers = self.lock()?;
        match event {
            IngestEvent::Sample(raw) => Ok(Some(buffers.ingest(raw))),
            IngestEvent::Reconfigure(settings) => {
                buffers.apply_settings(&settings);
                Ok(None)
            }
        }
    }
    pub fn latest_frame(&self) -> Result<PlotFrame, PipelineError> {
        Ok(self.lock()?.frame())
    }
    /// History signal column with the sample rate it should be timed at.
    pub fn history_signal(&self) -> Result<(Vec<f64>, u32), PipelineError> {
        let buffers = self.lock()?;
        Ok((buffers.history_signal(), buffers.sample_rate()))
    }
}
