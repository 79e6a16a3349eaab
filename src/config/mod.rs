//! Persisted plot settings, the selected serial port and change detection.
pub mod settings;
pub mod store;
pub mod watcher;
pub use settings::{PlotSettings, SettingsError};
pub use store::SettingsStore;
pub use watcher::ConfigWatcher;
