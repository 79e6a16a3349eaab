// src/main.rs
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
mod config;
mod drivers;
mod engine;
mod gui;
mod recorder;
mod types;
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use eframe::egui;
use log::info;
use crate::config::SettingsStore;
use crate::drivers::{SerialDevice, SimulatedDevice};
use crate::engine::Session;

/// Live plot of the endpoint ADC board.
#[derive(Debug, Parser)]
#[command(name = "endpoint-plot", version, about = "Live plot of the endpoint ADC board")]
struct CliOptions {
    /// Use the simulated device instead of the serial port
    #[arg(long)]
    simulate: bool,
    /// Store NAME as the selected serial port before connecting
    #[arg(long, value_name = "NAME")]
    port: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let options = CliOptions::parse();
    let store = SettingsStore::default();
    if let Some(port) = &options.port {
        store
            .save_port(port)
            .context("failed to store the selected port")?;
    }

    let (session, device_label) = if options.simulate {
        info!("using simulated device");
        let session = Session::start(SimulatedDevice::new(), store.clone())?;
        (session, "Simulated device".to_owned())
    } else {
        let port = store.read_port();
        let device = SerialDevice::open(&port)
            .with_context(|| format!("could not connect to serial port {port:?}"))?;
        let label = format!("Serial port {}", device.port_name());
        (Session::start(device, store.clone())?, label)
    };

    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([1200.0, 800.0])
        .with_min_inner_size([800.0, 600.0])
        .with_title("Endpoint Plot");
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native(
        "Endpoint Plot",
        options,
        Box::new(move |_cc| Box::new(gui::PlotApp::new(session, store, device_label))),
    )
    .map_err(|e| anyhow!("window closed with an error: {e}"))
}
