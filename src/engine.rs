// src/engine.rs
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use crate::config::{ConfigWatcher, PlotSettings, SettingsStore};
use crate::drivers::{DeviceError, PlotPipeline, SampleDevice};
use crate::types::{EngineMessage, IngestEvent, LoopState};

/// Failed cycles in a row after which the device is considered gone.
pub const MAX_CONSECUTIVE_FAULTS: u32 = 5;

/// Stop flag and loop state shared between a session and its sample loop.
#[derive(Clone, Debug)]
pub struct LoopControl {
    stop: Arc<AtomicBool>,
    state: Arc<AtomicU8>,
}

impl LoopControl {
    pub fn new() -> Self {
        Self {
            stop: Arc::new(AtomicBool::new(false)),
            state: Arc::new(AtomicU8::new(LoopState::Running as u8)),
        }
    }
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }
    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
    pub fn state(&self) -> LoopState {
        LoopState::from_u8(self.state.load(Ordering::SeqCst))
    }
    fn set_state(&self, state: LoopState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }
}

impl Default for LoopControl {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, PartialEq)]
pub enum Cycle {
    Sampled(i64),
    Stopped,
}

/// Polls the device at the configured rate and forwards samples (and
/// settings changes, ahead of the next sample) to the ingest worker.
pub struct SampleLoop<D: SampleDevice> {
    device: D,
    watcher: ConfigWatcher,
    interval: Duration,
    control: LoopControl,
    events: Sender<IngestEvent>,
    status: Sender<EngineMessage>,
    consecutive_faults: u32,
}

impl<D: SampleDevice> SampleLoop<D> {
    pub fn new(
        device: D,
        watcher: ConfigWatcher,
        settings: &PlotSettings,
        control: LoopControl,
        events: Sender<IngestEvent>,
        status: Sender<EngineMessage>,
    ) -> Self {
        Self {
            device,
            watcher,
            interval: settings.sample_interval(),
            control,
            events,
            status,
            consecutive_faults: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// One loop iteration. A device error aborts this cycle only; nothing is
    /// forwarded for it.
    pub fn cycle(&mut self) -> Result<Cycle, DeviceError> {
        if self.control.stop_requested() {
            self.control.set_state(LoopState::Stopping);
            return Ok(Cycle::Stopped);
        }
        if self.watcher.poll() {
            match self.watcher.current() {
                Ok(settings) => {
                    info!("settings changed: {settings:?}");
                    self.interval = settings.sample_interval();
                    if self
                        .events
                        .send(IngestEvent::Reconfigure(settings.clone()))
                        .is_err()
                    {
                        return Ok(self.worker_gone());
                    }
                    self.status.send(EngineMessage::SettingsApplied(settings)).ok();
                }
                Err(e) => warn!("settings changed but could not be read: {e}"),
            }
        }
        thread::sleep(self.interval);
        let raw = self.device.request_sample()?;
        if self.events.send(IngestEvent::Sample(raw)).is_err() {
            return Ok(self.worker_gone());
        }
        Ok(Cycle::Sampled(raw))
    }

    fn worker_gone(&self) -> Cycle {
        warn!("ingest worker hung up, stopping sample loop");
        self.control.set_state(LoopState::Stopping);
        Cycle::Stopped
    }

    /// Runs until stopped, then closes the device.
    pub fn run(mut self) {
        info!("sample loop running every {:?}", self.interval);
        self.status.send(EngineMessage::State(LoopState::Running)).ok();
        loop {
            match self.cycle() {
                Ok(Cycle::Sampled(raw)) => {
                    debug!("sampled {raw}");
                    self.consecutive_faults = 0;
                }
                Ok(Cycle::Stopped) => break,
                Err(e) => {
                    self.consecutive_faults += 1;
                    warn!(
                        "sample cycle failed ({}/{}): {e}",
                        self.consecutive_faults, MAX_CONSECUTIVE_FAULTS
                    );
                    self.status.send(EngineMessage::Fault(e.to_string())).ok();
                    if self.consecutive_faults >= MAX_CONSECUTIVE_FAULTS {
                        error!("device stopped responding, giving up");
                        self.status
                            .send(EngineMessage::Log("Device stopped responding".to_owned()))
                            .ok();
                        self.control.set_state(LoopState::Stopping);
                        break;
                    }
                }
            }
        }
        let SampleLoop {
            device,
            control,
            status,
            ..
        } = self;
        drop(device);
        control.set_state(LoopState::Stopped);
        status.send(EngineMessage::State(LoopState::Stopped)).ok();
        info!("sample loop stopped");
    }
}

/// Applies ingest events to the shared buffers until the loop hangs up.
fn run_ingest_worker(
    events: Receiver<IngestEvent>,
    pipeline: PlotPipeline,
    status: Sender<EngineMessage>,
) {
    for event in events {
        if let Err(e) = pipeline.apply(event) {
            error!("ingest failed: {e}");
            status.send(EngineMessage::Fault(e.to_string())).ok();
            break;
        }
    }
    debug!("ingest worker finished");
}

/// Everything one acquisition run owns: the loop and worker threads, their
/// shared stop flag, the status channel and the plot pipeline.
pub struct Session {
    control: LoopControl,
    pipeline: PlotPipeline,
    status: Receiver<EngineMessage>,
    sampler: Option<JoinHandle<()>>,
    ingest: Option<JoinHandle<()>>,
}

impl Session {
    pub fn start<D>(device: D, store: SettingsStore) -> Result<Self>
    where
        D: SampleDevice + Send + 'static,
    {
        let settings = store.load().context("failed to load plot settings")?;
        let pipeline = PlotPipeline::new(&settings);
        let (tx_events, rx_events) = channel();
        let (tx_status, rx_status) = channel();
        let control = LoopControl::new();

        let worker_pipeline = pipeline.clone();
        let worker_status = tx_status.clone();
        let ingest = thread::Builder::new()
            .name("ingest".to_owned())
            .spawn(move || run_ingest_worker(rx_events, worker_pipeline, worker_status))
            .context("failed to spawn ingest worker")?;

        let sample_loop = SampleLoop::new(
            device,
            ConfigWatcher::new(store),
            &settings,
            control.clone(),
            tx_events,
            tx_status,
        );
        let sampler = thread::Builder::new()
            .name("sampler".to_owned())
            .spawn(move || sample_loop.run())
            .context("failed to spawn sample loop")?;

        Ok(Self {
            control,
            pipeline,
            status: rx_status,
            sampler: Some(sampler),
            ingest: Some(ingest),
        })
    }

    pub fn pipeline(&self) -> &PlotPipeline {
        &self.pipeline
    }

    pub fn state(&self) -> LoopState {
        self.control.state()
    }

    pub fn drain_messages(&self) -> Vec<EngineMessage> {
        self.status.try_iter().collect()
    }

    /// Stops the loop, waits for it to close the device, then lets the
    /// worker drain whatever is still queued.
    pub fn shutdown(&mut self) {
        self.control.request_stop();
        if let Some(handle) = self.sampler.take() {
            if handle.join().is_err() {
                error!("sample loop panicked");
            }
        }
        if let Some(handle) = self.ingest.take() {
            if handle.join().is_err() {
                error!("ingest worker panicked");
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::ScriptedDevice;
    use std::time::Instant;

    fn fast_store(dir: &std::path::Path) -> SettingsStore {
        let store = SettingsStore::new(dir);
        store.set_sample_rate(100).unwrap();
        store
    }

    fn make_loop(
        device: ScriptedDevice,
        store: &SettingsStore,
    ) -> (
        SampleLoop<ScriptedDevice>,
        Receiver<IngestEvent>,
        Receiver<EngineMessage>,
        LoopControl,
    ) {
        let (tx_events, rx_events) = channel();
        let (tx_status, rx_status) = channel();
        let control = LoopControl::new();
        let settings = store.load().unwrap();
        let sample_loop = SampleLoop::new(
            device,
            ConfigWatcher::new(store.clone()),
            &settings,
            control.clone(),
            tx_events,
            tx_status,
        );
        (sample_loop, rx_events, rx_status, control)
    }

    #[test]
    fn forwards_samples_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = fast_store(dir.path());
        let (mut sample_loop, events, _status, _control) =
            make_loop(ScriptedDevice::new(["10\n", "20\n", "30\n"]), &store);
        assert_eq!(sample_loop.interval(), Duration::from_millis(10));
        for expected in [10, 20, 30] {
            assert_eq!(sample_loop.cycle().unwrap(), Cycle::Sampled(expected));
        }
        let got: Vec<IngestEvent> = events.try_iter().collect();
        assert_eq!(
            got,
            vec![
                IngestEvent::Sample(10),
                IngestEvent::Sample(20),
                IngestEvent::Sample(30)
            ]
        );
    }

    #[test]
    fn bad_response_forwards_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = fast_store(dir.path());
        let (mut sample_loop, events, _status, _control) =
            make_loop(ScriptedDevice::new(["garbage\n", "42\n"]), &store);
        assert!(matches!(sample_loop.cycle(), Err(DeviceError::Parse { .. })));
        assert!(events.try_recv().is_err());
        assert_eq!(sample_loop.cycle().unwrap(), Cycle::Sampled(42));
        assert_eq!(events.try_recv().unwrap(), IngestEvent::Sample(42));
    }

    #[test]
    fn settings_change_is_forwarded_before_next_sample() {
        let dir = tempfile::tempdir().unwrap();
        let store = fast_store(dir.path());
        let (mut sample_loop, events, status, _control) =
            make_loop(ScriptedDevice::new(["1\n", "2\n"]), &store);
        sample_loop.cycle().unwrap();
        store.set_x_axis_size(60).unwrap();
        store.set_sample_rate(50).unwrap();
        sample_loop.cycle().unwrap();
        let got: Vec<IngestEvent> = events.try_iter().collect();
        assert_eq!(got.len(), 3);
        assert_eq!(got[0], IngestEvent::Sample(1));
        match &got[1] {
            IngestEvent::Reconfigure(s) => {
                assert_eq!(s.x_axis_size, 60);
                assert_eq!(s.sample_rate, 50);
            }
            other => panic!("expected reconfigure, got {other:?}"),
        }
        assert_eq!(got[2], IngestEvent::Sample(2));
        assert_eq!(sample_loop.interval(), Duration::from_millis(20));
        assert!(status
            .try_iter()
            .any(|m| matches!(m, EngineMessage::SettingsApplied(_))));
    }

    #[test]
    fn stop_flag_ends_the_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = fast_store(dir.path());
        let (mut sample_loop, events, _status, control) =
            make_loop(ScriptedDevice::new(["5\n"]), &store);
        control.request_stop();
        assert_eq!(sample_loop.cycle().unwrap(), Cycle::Stopped);
        assert_eq!(control.state(), LoopState::Stopping);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn run_gives_up_after_repeated_faults() {
        let dir = tempfile::tempdir().unwrap();
        let store = fast_store(dir.path());
        let (sample_loop, events, status, control) =
            make_loop(ScriptedDevice::new(["7\n"]), &store);
        sample_loop.run();
        assert_eq!(control.state(), LoopState::Stopped);
        assert_eq!(events.try_iter().count(), 1);
        let messages: Vec<EngineMessage> = status.try_iter().collect();
        let faults = messages
            .iter()
            .filter(|m| matches!(m, EngineMessage::Fault(_)))
            .count();
        assert_eq!(faults, MAX_CONSECUTIVE_FAULTS as usize);
        assert!(matches!(
            messages.last(),
            Some(EngineMessage::State(LoopState::Stopped))
        ));
    }

    #[test]
    fn session_ingests_and_shuts_down() {
        let dir = tempfile::tempdir().unwrap();
        let store = fast_store(dir.path());
        let lines: Vec<&'static str> = vec!["100\n"; 400];
        let mut session = Session::start(ScriptedDevice::new(lines), store).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let (history, _) = session.pipeline().history_signal().unwrap();
            if history.len() >= 3 || Instant::now() > deadline {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        session.shutdown();
        assert_eq!(session.state(), LoopState::Stopped);
        let frame = session.pipeline().latest_frame().unwrap();
        assert!(frame.history_len >= 3);
        assert_eq!(frame.len(), 3000);
        assert!(session
            .drain_messages()
            .iter()
            .any(|m| matches!(m, EngineMessage::State(LoopState::Stopped))));
    }
}
