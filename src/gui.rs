// src/gui.rs
use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;
use eframe::egui;
use egui::Color32;
use egui_plot::{Line, Plot, PlotPoints, Points};
use log::{error, info, warn};
use crate::config::{PlotSettings, SettingsError, SettingsStore};
use crate::drivers::axis::time_label;
use crate::drivers::view::split_trace;
use crate::drivers::{save_frame_png, PlotFrame, PlotStyle};
use crate::engine::Session;
use crate::recorder::{export_history_csv, timestamped_path};
use crate::types::{EngineMessage, LoopState};

const REDRAW_INTERVAL: Duration = Duration::from_millis(100);
const EXPORT_DIR: &str = "exports";
const MAX_LOG_LINES: usize = 8;

const SIGNAL_COLOR: Color32 = Color32::from_rgb(70, 130, 230);
const SIGNAL_TAIL: Color32 = Color32::from_rgb(230, 60, 60);
const DERIVATIVE_COLOR: Color32 = Color32::from_rgb(150, 80, 200);
const DERIVATIVE_TAIL: Color32 = Color32::from_rgb(60, 200, 90);

pub struct PlotApp {
    session: Option<Session>,
    store: SettingsStore,
    device_label: String,
    frame: Option<PlotFrame>,
    animating: bool,
    redraw_errors: u32,
    loop_state: LoopState,
    // editor fields, written to the store on Apply
    draft: PlotSettings,
    // record the editor was last synced with
    synced: PlotSettings,
    log_messages: Vec<String>,
}

impl PlotApp {
    pub fn new(session: Session, store: SettingsStore, device_label: String) -> Self {
        let draft = store.load().unwrap_or_else(|e| {
            warn!("could not read settings for the editor: {e}");
            PlotSettings::default()
        });
        Self {
            session: Some(session),
            store,
            device_label,
            frame: None,
            animating: true,
            redraw_errors: 0,
            loop_state: LoopState::Running,
            synced: draft.clone(),
            draft,
            log_messages: vec!["Ready.".to_owned()],
        }
    }

    fn log(&mut self, msg: &str) {
        self.log_messages.push(format!("> {}", msg));
        if self.log_messages.len() > MAX_LOG_LINES {
            self.log_messages.remove(0);
        }
    }

    fn poll_engine(&mut self) {
        let Some(session) = &self.session else { return };
        let messages = session.drain_messages();
        self.loop_state = session.state();
        for msg in messages {
            match msg {
                EngineMessage::Log(s) => self.log(&s),
                EngineMessage::Fault(s) => self.log(&format!("Device fault: {s}")),
                EngineMessage::SettingsApplied(settings) => {
                    self.log("Settings applied");
                    self.draft = rebase_draft(&self.draft, &self.synced, &settings);
                    self.synced = settings;
                }
                EngineMessage::State(state) => self.loop_state = state,
            }
        }
    }

    /// Takes this tick's snapshot. A failed snapshot stops the animation;
    /// the last good frame stays on screen.
    fn refresh_frame(&mut self) {
        if !self.animating {
            return;
        }
        let Some(session) = &self.session else { return };
        match session.pipeline().latest_frame() {
            Ok(frame) => self.frame = Some(frame),
            Err(e) => {
                self.redraw_errors += 1;
                self.animating = false;
                error!("redraw failed ({} so far): {e}", self.redraw_errors);
                self.log(&format!("Redraw stopped: {e}"));
            }
        }
    }

    fn save_image(&mut self) {
        let Some(frame) = &self.frame else {
            self.log("Nothing to save yet");
            return;
        };
        let path = timestamped_path(Path::new(EXPORT_DIR), "plot", "png");
        match save_frame_png(frame, &PlotStyle::default(), &path) {
            Ok(()) => {
                info!("saved plot image to {}", path.display());
                self.log(&format!("Saved {}", path.display()));
            }
            Err(e) => {
                error!("image export failed: {e}");
                self.log(&format!("Image export failed: {e}"));
            }
        }
    }

    fn save_csv(&mut self) {
        let Some(session) = &self.session else { return };
        let (signal, sample_rate) = match session.pipeline().history_signal() {
            Ok(history) => history,
            Err(e) => {
                self.log(&format!("CSV export failed: {e}"));
                return;
            }
        };
        let path = timestamped_path(Path::new(EXPORT_DIR), "signal", "csv");
        match export_history_csv(&path, &signal, sample_rate) {
            Ok(rows) => {
                info!("wrote {rows} rows to {}", path.display());
                self.log(&format!("Saved {rows} rows to {}", path.display()));
            }
            Err(e) => {
                error!("csv export failed: {e}");
                self.log(&format!("CSV export failed: {e}"));
            }
        }
    }

    /// Writes each edited field through its setter; a rejected field keeps
    /// its stored value and the others still apply.
    fn apply_settings(&mut self) {
        let stored = match self.store.load() {
            Ok(stored) => stored,
            Err(e) => {
                self.log(&format!("Could not read settings: {e}"));
                return;
            }
        };
        let d = self.draft.clone();
        let mut results: Vec<Result<(), SettingsError>> = Vec::new();
        if d.window_samples != stored.window_samples {
            results.push(self.store.set_window_samples(d.window_samples));
        }
        if d.sample_rate != stored.sample_rate {
            results.push(self.store.set_sample_rate(d.sample_rate));
        }
        if d.x_axis_size != stored.x_axis_size {
            results.push(self.store.set_x_axis_size(d.x_axis_size));
        }
        if d.y_axis_min != stored.y_axis_min {
            results.push(self.store.set_y_axis_min(d.y_axis_min));
        }
        if d.y_axis_max != stored.y_axis_max {
            results.push(self.store.set_y_axis_max(d.y_axis_max));
        }
        if results.is_empty() {
            self.log("No changes");
        }
        for result in results {
            if let Err(e) = result {
                warn!("rejected setting: {e}");
                self.log(&format!("Rejected: {e}"));
            }
        }
    }

    fn restore_defaults(&mut self) {
        match self.store.restore_defaults() {
            Ok(defaults) => {
                self.synced = defaults.clone();
                self.draft = defaults;
                self.log("Defaults restored");
            }
            Err(e) => self.log(&format!("Could not restore defaults: {e}")),
        }
    }

    fn close(&mut self, ctx: &egui::Context) {
        self.animating = false;
        self.frame = None;
        if let Some(mut session) = self.session.take() {
            session.shutdown();
        }
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }

    fn settings_editor(&mut self, ui: &mut egui::Ui) {
        egui::Grid::new("settings").num_columns(2).show(ui, |ui| {
            ui.label("Filter window (samples)");
            ui.add(egui::DragValue::new(&mut self.draft.window_samples).speed(0.1));
            ui.end_row();
            ui.label("Sample rate (Hz)");
            ui.add(egui::DragValue::new(&mut self.draft.sample_rate).speed(0.5));
            ui.end_row();
            ui.label("X axis (s)");
            ui.add(egui::DragValue::new(&mut self.draft.x_axis_size).speed(1.0));
            ui.end_row();
            ui.label("Y min (V)");
            ui.add(egui::DragValue::new(&mut self.draft.y_axis_min).speed(0.5));
            ui.end_row();
            ui.label("Y max (V)");
            ui.add(egui::DragValue::new(&mut self.draft.y_axis_max).speed(0.5));
            ui.end_row();
        });
    }
}

/// Takes `incoming` for every field the user has not touched since the last
/// sync; edited fields keep the user's value.
fn rebase_draft(
    draft: &PlotSettings,
    synced: &PlotSettings,
    incoming: &PlotSettings,
) -> PlotSettings {
    fn pick<T: PartialEq + Copy>(draft: T, synced: T, incoming: T) -> T {
        if draft == synced {
            incoming
        } else {
            draft
        }
    }
    PlotSettings {
        window_samples: pick(draft.window_samples, synced.window_samples, incoming.window_samples),
        sample_rate: pick(draft.sample_rate, synced.sample_rate, incoming.sample_rate),
        x_axis_size: pick(draft.x_axis_size, synced.x_axis_size, incoming.x_axis_size),
        y_axis_min: pick(draft.y_axis_min, synced.y_axis_min, incoming.y_axis_min),
        y_axis_max: pick(draft.y_axis_max, synced.y_axis_max, incoming.y_axis_max),
    }
}

fn draw_trace(
    ui: &mut egui::Ui,
    id: &str,
    frame: &PlotFrame,
    y: &[f64],
    bounds: (f64, f64),
    colors: (Color32, Color32),
    height: f32,
) {
    let segments = split_trace(&frame.x, y);
    let x_max = frame.x_max;
    Plot::new(id)
        .height(height)
        .include_x(0.0)
        .include_x(x_max)
        .include_y(bounds.0)
        .include_y(bounds.1)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .x_axis_formatter(move |x: f64, _chars: usize, _range: &RangeInclusive<f64>| {
            time_label(x, x_max)
        })
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(PlotPoints::new(segments.body)).color(colors.0));
            plot_ui.line(
                Line::new(PlotPoints::new(segments.tail))
                    .color(colors.1)
                    .width(2.0),
            );
            if let Some(head) = segments.head {
                plot_ui.points(
                    Points::new(PlotPoints::new(vec![head]))
                        .radius(4.0)
                        .color(colors.1),
                );
            }
        });
}

impl eframe::App for PlotApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_engine();
        self.refresh_frame();

        egui::SidePanel::left("controls").min_width(260.0).show(ctx, |ui| {
            ui.add_space(10.0);
            ui.heading("Endpoint Plot");
            ui.label(&self.device_label);
            ui.label(format!("Loop: {:?}", self.loop_state));
            if self.redraw_errors > 0 {
                ui.colored_label(
                    Color32::YELLOW,
                    format!("Redraw errors: {}", self.redraw_errors),
                );
            }
            ui.separator();

            self.settings_editor(ui);
            ui.horizontal(|ui| {
                if ui.button("Apply").clicked() {
                    self.apply_settings();
                }
                if ui.button("Restore defaults").clicked() {
                    self.restore_defaults();
                }
            });
            ui.separator();

            ui.horizontal(|ui| {
                if ui.button("Save Image").clicked() {
                    self.save_image();
                }
                if ui.button("Save CSV").clicked() {
                    self.save_csv();
                }
            });
            let toggle = if self.animating { "Pause" } else { "Resume" };
            if ui.button(toggle).clicked() {
                self.animating = !self.animating;
            }
            if ui.button("Close").clicked() {
                self.close(ctx);
            }

            ui.add_space(10.0);
            egui::ScrollArea::vertical().max_height(140.0).show(ui, |ui| {
                for m in &self.log_messages {
                    ui.monospace(m);
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(frame) = &self.frame else {
                ui.label("Waiting for data...");
                return;
            };
            let title = if frame.filtered {
                "Endpoint Signal vs. Time (filtered)"
            } else {
                "Endpoint Signal vs. Time"
            };
            let height = (ui.available_height() / 2.0 - 30.0).max(120.0);
            ui.horizontal(|ui| {
                ui.label(title);
                ui.weak(format!(
                    "{} points shown, {} recorded",
                    frame.len(),
                    frame.history_len
                ));
            });
            draw_trace(
                ui,
                "signal",
                frame,
                &frame.signal,
                frame.signal_bounds,
                (SIGNAL_COLOR, SIGNAL_TAIL),
                height,
            );
            ui.label("Derivative");
            draw_trace(
                ui,
                "derivative",
                frame,
                &frame.derivative,
                frame.derivative_bounds,
                (DERIVATIVE_COLOR, DERIVATIVE_TAIL),
                height,
            );
        });

        if self.session.is_some() {
            ctx.request_repaint_after(REDRAW_INTERVAL);
        }
    }
}
