// src/main.rs
mod cli;
mod config;
mod drivers;
mod engine;
mod gui;
mod types;

use std::thread;

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use eframe::egui;

use crate::cli::Cli;
use crate::drivers::{LogView, NoisySine, PlotStyle, PngSnapshot};
use crate::engine::Supervisor;
use crate::gui::{EguiView, LiveSlot, SpectrumApp};
use crate::types::RunReport;

fn run_window(
    supervisor: Supervisor,
    source: NoisySine,
    writer: PngSnapshot,
    style: PlotStyle,
) -> anyhow::Result<RunReport> {
    let slot = LiveSlot::default();
    let trigger = supervisor.shutdown_trigger();
    let listener = supervisor.shutdown_listener();
    let running = supervisor.start(source, EguiView::new(slot.clone()), writer)?;
    let monitor = thread::Builder::new()
        .name("supervisor".to_owned())
        .spawn(move || running.monitor())
        .context("failed to start supervisor thread")?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 720.0])
            .with_title("Signal & spectrum"),
        ..Default::default()
    };
    let ui_result = eframe::run_native(
        "spectrum-pipeline",
        options,
        Box::new(move |cc| {
            slot.attach(cc.egui_ctx.clone());
            Box::new(SpectrumApp::new(
                slot,
                listener,
                style.waveform_title,
                style.spectrum_title,
            ))
        }),
    );

    // window is gone either way; bring the workers down with it
    trigger.trigger();
    let report = monitor
        .join()
        .map_err(|_| anyhow!("supervisor thread panicked"))?;
    ui_result.map_err(|e| anyhow!("live view failed: {e}"))?;
    Ok(report)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .init();
    let config = cli.to_config();

    let supervisor = Supervisor::new(config.clone()).context("invalid pipeline configuration")?;
    let ctrlc_trigger = supervisor.shutdown_trigger();
    ctrlc::set_handler(move || ctrlc_trigger.trigger())
        .context("failed to install Ctrl-C handler")?;

    let source = NoisySine::new(&config.signal);
    let style = PlotStyle::for_frequency(config.signal.base_frequency);
    let writer = PngSnapshot::new(config.snapshot_path.clone(), style.clone());
    log::info!(
        "signal f={:.3} over [{}, {}], {} points; snapshot -> {}",
        source.frequency(),
        config.signal.start,
        config.signal.end,
        config.signal.sample_count,
        writer.path().display()
    );

    let report = if cli.headless {
        supervisor.start(source, LogView, writer)?.monitor()
    } else {
        run_window(supervisor, source, writer, style)?
    };

    for stage in &report.stages {
        log::info!(
            "{}: {} items, {} snapshot(s)",
            stage.stage,
            stage.processed,
            stage.snapshots_written
        );
    }
    if !report.stragglers.is_empty() {
        log::warn!("workers left running at exit: {:?}", report.stragglers);
    }
    if let Some((stage, reason)) = report.failures.first() {
        bail!("{stage} failed: {reason}");
    }
    if report.is_clean() {
        log::info!("clean shutdown");
    }
    Ok(())
}
