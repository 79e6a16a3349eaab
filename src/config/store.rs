use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::Hasher;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use log::{info, warn};
use crate::config::settings::{PlotSettings, SettingsError};
const SETTINGS_FILE: &str = "plot_configuration.json";
const PORT_FILE: &str = "port_configuration.txt";
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);
/// File-backed store for the plot settings record and the selected port.
#[derive(Clone, Debug)]
pub struct SettingsStore {
    root: PathBuf,
}
impl Default for SettingsStore {
    fn default() -> Self {
        Self::new("resources")
    }
}
impl SettingsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
    pub fn settings_path(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE)
    }
    fn port_path(&self) -> PathBuf {
        self.root.join(PORT_FILE)
    }
    /// Reads the settings record, regenerating defaults when it is missing or
    /// cannot be parsed.
    pub fn load(&self) -> Result<PlotSettings, SettingsError> {
        let path = self.settings_path();
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("no settings at {}, writing defaults", path.display());
                return self.restore_settings();
            }
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str::<PlotSettings>(&raw) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                warn!("settings at {} unreadable ({e}), writing defaults", path.display());
                self.restore_settings()
            }
        }
    }
    /// Validates and writes the whole record. Nothing is written on error.
    pub fn save(&self, settings: &PlotSettings) -> Result<(), SettingsError> {
        settings.validate()?;
        let json = serde_json::to_string_pretty(settings)?;
        write_atomic(&self.settings_path(), json.as_bytes())
    }
    fn restore_settings(&self) -> Result<PlotSettings, SettingsError> {
        let defaults = PlotSettings::default();
        self.save(&defaults)?;
        Ok(defaults)
    }
    /// Resets the plot settings and clears the selected port.
    pub fn restore_defaults(&self) -> Result<PlotSettings, SettingsError> {
        self.save_port("")?;
        self.restore_settings()
    }
    fn update(&self, edit: impl FnOnce(&mut PlotSettings)) -> Result<(), SettingsError> {
        let mut settings = self.load()?;
        edit(&mut settings);
        self.save(&settings)
    }
    pub fn set_window_samples(&self, value: u32) -> Result<(), SettingsError> {
        self.update(|s| s.window_samples = value)
    }
    pub fn set_sample_rate(&self, value: u32) -> Result<(), SettingsError> {
        self.update(|s| s.sample_rate = value)
    }
    pub fn set_x_axis_size(&self, value: u32) -> Result<(), SettingsError> {
        self.update(|s| s.x_axis_size = value)
    }
    pub fn set_y_axis_min(&self, value: f64) -> Result<(), SettingsError> {
        self.update(|s| s.y_axis_min = value)
    }
    pub fn set_y_axis_max(&self, value: f64) -> Result<(), SettingsError> {
        self.update(|s| s.y_axis_max = value)
    }
    /// Content hash of the settings file as stored on disk.
    pub fn fingerprint(&self) -> Result<u64, SettingsError> {
        let bytes = fs::read(self.settings_path())?;
        let mut hasher = DefaultHasher::new();
        hasher.write(&bytes);
        Ok(hasher.finish())
    }
    /// Selected serial port, or an empty string when none is stored.
    pub fn read_port(&self) -> String {
        fs::read_to_string(self.port_path())
            .map(|raw| raw.lines().next().unwrap_or("").trim().to_owned())
            .unwrap_or_default()
    }
    pub fn save_port(&self, port: &str) -> Result<(), SettingsError> {
        write_atomic(&self.port_path(), port.trim().as_bytes())
    }
}
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    // staging name is unique per write
    let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp = path.with_extension(format!("{}.{n}.tmp", process::id()));
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn missing_record_is_regenerated() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("resources"));
        assert!(!store.settings_path().exists());
        let settings = store.load().unwrap();
        assert_eq!(settings, PlotSettings::default());
        assert!(store.settings_path().exists());
    }
    #[test]
    fn setters_persist_valid_values() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        store.set_window_samples(4).unwrap();
        store.set_sample_rate(25).unwrap();
        store.set_x_axis_size(120).unwrap();
        store.set_y_axis_min(-10.0).unwrap();
        store.set_y_axis_max(12.5).unwrap();
        let settings = store.load().unwrap();
        assert_eq!(
            settings,
            PlotSettings {
                window_samples: 4,
                sample_rate: 25,
                x_axis_size: 120,
                y_axis_min: -10.0,
                y_axis_max: 12.5,
            }
        );
    }
    #[test]
    fn rejected_write_keeps_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        store.set_sample_rate(50).unwrap();
        assert!(matches!(
            store.set_sample_rate(101),
            Err(SettingsError::OutOfRange { field: "sample_rate", .. })
        ));
        assert!(store.set_window_samples(0).is_err());
        assert!(store.set_x_axis_size(4).is_err());
        assert!(store.set_y_axis_min(70.0).is_err());
        assert!(store.set_y_axis_max(0.5).is_err());
        let settings = store.load().unwrap();
        assert_eq!(settings.sample_rate, 50);
        assert_eq!(settings.window_samples, 1);
    }
    #[test]
    fn malformed_record_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        fs::write(store.settings_path(), "1,10,30,0,60\n").unwrap();
        assert_eq!(store.load().unwrap(), PlotSettings::default());
    }
    #[test]
    fn fingerprint_tracks_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        store.load().unwrap();
        let a = store.fingerprint().unwrap();
        assert_eq!(a, store.fingerprint().unwrap());
        store.set_y_axis_max(30.0).unwrap();
        let b = store.fingerprint().unwrap();
        assert_ne!(a, b);
    }
    #[test]
    fn port_store_round_trip_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        assert_eq!(store.read_port(), "");
        store.save_port("/dev/ttyACM0").unwrap();
        assert_eq!(store.read_port(), "/dev/ttyACM0");
        store.set_window_samples(3).unwrap();
        let restored = store.restore_defaults().unwrap();
        assert_eq!(restored, PlotSettings::default());
        assert_eq!(store.read_port(), "");
    }
    #[test]
    fn concurrent_writers_leave_a_whole_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        store.load().unwrap();
        let handles: Vec<_> = (0..4u32)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..25u32 {
                        store.save(&PlotSettings {
                            sample_rate: 1 + (t * 25 + i) % 100,
                            ..PlotSettings::default()
                        })
                        .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let settings = store.load().unwrap();
        assert!(settings.validate().is_ok());
        let leftovers = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }
}
