use log::{debug, warn};
use crate::config::settings::{PlotSettings, SettingsError};
use crate::config::store::SettingsStore;
/// Detects edits to the persisted settings by comparing content fingerprints.
pub struct ConfigWatcher {
    store: SettingsStore,
    last: Option<u64>,
}
impl ConfigWatcher {
    /// Records the current fingerprint so only later edits are reported.
    pub fn new(store: SettingsStore) -> Self {
        let last = store.fingerprint().ok();
        Self { store, last }
    }
    /// True once per observed change of the settings record.
    pub fn poll(&mut self) -> bool {
        let current = match self.store.fingerprint() {
            Ok(fp) => fp,
            Err(e) => {
                warn!("settings fingerprint unavailable: {e}");
                return false;
            }
        };
        if self.last == Some(current) {
            return false;
        }
        debug!("settings fingerprint changed to {current:016x}");
        self.last = Some(current);
        true
    }
    pub fn current(&self) -> Result<PlotSettings, SettingsError> {
        self.store.load()
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn reports_each_change_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        store.load().unwrap();
        let mut watcher = ConfigWatcher::new(store.clone());
        assert!(!watcher.poll());
        store.set_x_axis_size(60).unwrap();
        assert!(watcher.poll());
        assert!(!watcher.poll());
        assert_eq!(watcher.current().unwrap().x_axis_size, 60);
    }
    #[test]
    fn rewriting_identical_content_is_not_a_change() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        store.load().unwrap();
        let mut watcher = ConfigWatcher::new(store.clone());
        store.save(&PlotSettings::default()).unwrap();
        assert!(!watcher.poll());
    }
    #[test]
    fn missing_file_is_not_a_change() {
        let dir = tempfile::tempdir().unwrap();
        let mut watcher = ConfigWatcher::new(SettingsStore::new(dir.path()));
        assert!(!watcher.poll());
    }
}
