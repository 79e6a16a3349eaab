// src/types.rs
use crate::config::PlotSettings;

// sample loop -> ingest worker, in arrival order
#[derive(Clone, Debug, PartialEq)]
pub enum IngestEvent {
    Sample(i64),
    Reconfigure(PlotSettings),
}

// sample loop -> GUI
#[derive(Clone, Debug)]
pub enum EngineMessage {
    Log(String),
    Fault(String),
    SettingsApplied(PlotSettings),
    State(LoopState),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum LoopState {
    Running = 0,
    Stopping = 1,
    Stopped = 2,
}

impl LoopState {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => LoopState::Running,
            1 => LoopState::Stopping,
            _ => LoopState::Stopped,
        }
    }
}
