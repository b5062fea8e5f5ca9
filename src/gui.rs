// src/gui.rs
use std::sync::{Arc, Mutex};
use std::time::Duration;

use eframe::egui;
use egui::Color32;
use egui_plot::{Line, Plot, PlotBounds, PlotPoints};
use once_cell::sync::OnceCell;

use crate::drivers::{LiveView, PanelRange, PipelineError, ShutdownListener, ViewState};
use crate::types::CombinedFrame;

/// Plot-ready copy of the latest frame.
#[derive(Clone, Debug)]
pub struct LiveFrame {
    pub sequence: u64,
    pub frames_drawn: u64,
    pub waveform: Vec<[f64; 2]>,
    pub spectrum: Vec<[f64; 2]>,
    pub waveform_range: PanelRange,
    pub spectrum_range: PanelRange,
}

impl LiveFrame {
    pub fn capture(frame: &CombinedFrame, view: &ViewState) -> Self {
        let zip = |xs: &ndarray::Array1<f64>, ys: &ndarray::Array1<f64>| -> Vec<[f64; 2]> {
            xs.iter().zip(ys.iter()).map(|(&x, &y)| [x, y]).collect()
        };
        Self {
            sequence: frame.sequence(),
            frames_drawn: view.frames_drawn,
            waveform: zip(frame.time(), frame.amplitude()),
            spectrum: zip(frame.frequency(), frame.magnitude()),
            waveform_range: view.waveform,
            spectrum_range: view.spectrum,
        }
    }
}

/// Hand-off point between the sink thread and the UI thread. Only the most
/// recent frame is kept; the window redraws whatever is there.
#[derive(Clone, Default)]
pub struct LiveSlot {
    latest: Arc<Mutex<Option<LiveFrame>>>,
    repaint: Arc<OnceCell<egui::Context>>,
}

impl LiveSlot {
    pub fn attach(&self, ctx: egui::Context) {
        if self.repaint.set(ctx).is_err() {
            log::warn!("live view already attached to a window");
        }
    }

    pub fn publish(&self, frame: LiveFrame) -> Result<(), PipelineError> {
        *self
            .latest
            .lock()
            .map_err(|_| PipelineError::ViewUnavailable)? = Some(frame);
        if let Some(ctx) = self.repaint.get() {
            ctx.request_repaint();
        }
        Ok(())
    }

    pub fn latest(&self) -> Option<LiveFrame> {
        self.latest.lock().ok().and_then(|guard| guard.clone())
    }
}

/// Sink-side half of the window.
pub struct EguiView {
    slot: LiveSlot,
}

impl EguiView {
    pub fn new(slot: LiveSlot) -> Self {
        Self { slot }
    }
}

impl LiveView for EguiView {
    fn present(&mut self, frame: &CombinedFrame, view: &ViewState) -> Result<(), PipelineError> {
        self.slot.publish(LiveFrame::capture(frame, view))
    }
}

pub struct SpectrumApp {
    slot: LiveSlot,
    listener: ShutdownListener,
    waveform_title: String,
    spectrum_title: String,
}

impl SpectrumApp {
    pub fn new(
        slot: LiveSlot,
        listener: ShutdownListener,
        waveform_title: String,
        spectrum_title: String,
    ) -> Self {
        Self {
            slot,
            listener,
            waveform_title,
            spectrum_title,
        }
    }
}

impl eframe::App for SpectrumApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.listener.is_triggered() {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
        let latest = self.slot.latest();
        egui::CentralPanel::default().show(ctx, |ui| {
            let height = (ui.available_height() / 2.0 - 40.0).max(120.0);
            ui.heading(self.waveform_title.as_str());
            draw_panel(
                ui,
                "waveform",
                height,
                latest.as_ref().map(|f| (f.waveform.as_slice(), f.waveform_range)),
                Color32::RED,
            );
            ui.heading(self.spectrum_title.as_str());
            draw_panel(
                ui,
                "spectrum",
                height,
                latest.as_ref().map(|f| (f.spectrum.as_slice(), f.spectrum_range)),
                Color32::GREEN,
            );
            match &latest {
                Some(f) => ui.label(format!("frame #{} · {} drawn", f.sequence, f.frames_drawn)),
                None => ui.label("waiting for data…"),
            };
        });
        // keeps the shutdown check alive when no frames arrive
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

fn draw_panel(
    ui: &mut egui::Ui,
    id: &str,
    height: f32,
    data: Option<(&[[f64; 2]], PanelRange)>,
    color: Color32,
) {
    Plot::new(id)
        .height(height)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            if let Some((points, range)) = data {
                plot_ui.set_plot_bounds(PlotBounds::from_min_max(
                    [range.x.0, range.y.0],
                    [range.x.1, range.y.1],
                ));
                plot_ui.line(Line::new(PlotPoints::from(points.to_vec())).color(color));
            }
        });
}
