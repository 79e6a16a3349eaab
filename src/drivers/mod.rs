// src/drivers/mod.rs
pub mod axis;
pub mod buffer;
pub mod calibration;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod plot;
pub mod source;
pub mod view;
pub use buffer::PlotFrame;
pub use error::DeviceError;
pub use pipeline::PlotPipeline;
pub use plot::{save_frame_png, PlotStyle};
pub use source::{SampleDevice, SerialDevice, SimulatedDevice};
#[cfg(test)]
pub use source::ScriptedDevice;
