use thiserror::Error;
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("no serial port configured")]
    NoPortConfigured,
    #[error("failed to open serial port: {0}")]
    Open(#[from] serialport::Error),
    #[error("serial i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("device closed the connection")]
    Disconnected,
    #[error("device response {line:?} is not an integer")]
    Parse { line: String },
}
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("plot buffers are poisoned; a writer panicked mid-update")]
    Poisoned,
}
#[derive(Debug, Error)]
pub enum PlotError {
    #[error("frame has no samples")]
    EmptyFrame,
    #[error("failed to render plot: {0}")]
    Render(String),
    #[error("failed to write image: {0}")]
    Io(#[from] std::io::Error),
}
impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for PlotError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        PlotError::Render(format!("{value:?}"))
    }
}
impl From<image::ImageError> for PlotError {
    fn from(value: image::ImageError) -> Self {
        PlotError::Render(value.to_string())
    }
}
