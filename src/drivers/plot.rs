// src/drivers/plot.rs
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::coord::Shift;
use plotters::prelude::LineSeries;
use plotters::prelude::*;

use crate::drivers::error::PipelineError;
use crate::drivers::sink::SnapshotWriter;
use crate::drivers::view::{PanelRange, ViewState};
use crate::types::CombinedFrame;

#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    /// Axes, tick marks and tick labels.
    pub axis_color: RGBColor,
    pub waveform_color: RGBColor,
    pub spectrum_color: RGBColor,
    pub waveform_title: String,
    pub spectrum_title: String,
}

impl PlotStyle {
    pub fn for_frequency(base_frequency: f64) -> Self {
        Self {
            waveform_title: waveform_title(base_frequency),
            ..Self::default()
        }
    }
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 900,
            height: 600,
            background: RGBColor(10, 10, 10),
            axis_color: RGBColor(220, 220, 220),
            waveform_color: RED,
            spectrum_color: GREEN,
            waveform_title: "Original Signal + random noise".into(),
            spectrum_title: "Real FFT".into(),
        }
    }
}

pub fn waveform_title(base_frequency: f64) -> String {
    format!("Original Signal freq={base_frequency} + random noise")
}

/// Renders the waveform (top) and spectrum (bottom) panels as a PNG.
pub fn render_snapshot_png(
    frame: &CombinedFrame,
    view: &ViewState,
    style: &PlotStyle,
) -> Result<Vec<u8>, PipelineError> {
    if frame.signal().is_empty() {
        return Err(PipelineError::Plot("frame has no samples".into()));
    }
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let panels = root.split_evenly((2, 1));
        draw_panel(
            &panels[0],
            &style.waveform_title,
            view.waveform,
            frame.time().iter().copied().zip(frame.amplitude().iter().copied()),
            style.waveform_color,
            style.axis_color,
        )?;
        draw_panel(
            &panels[1],
            &style.spectrum_title,
            view.spectrum,
            frame.frequency().iter().copied().zip(frame.magnitude().iter().copied()),
            style.spectrum_color,
            style.axis_color,
        )?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}

fn draw_panel(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    title: &str,
    range: PanelRange,
    series: impl Iterator<Item = (f64, f64)>,
    color: RGBColor,
    axis_color: RGBColor,
) -> Result<(), PipelineError> {
    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .caption(title, ("sans-serif", 20).into_font().color(&WHITE))
        .set_label_area_size(LabelAreaPosition::Left, 45)
        .set_label_area_size(LabelAreaPosition::Bottom, 30)
        .build_cartesian_2d(range.x.0..range.x.1, range.y.0..range.y.1)?;
    chart
        .configure_mesh()
        .light_line_style(&WHITE.mix(0.1))
        .bold_line_style(&WHITE.mix(0.25))
        .axis_style(&axis_color)
        .label_style(("sans-serif", 12).into_font().color(&axis_color))
        .draw()?;
    chart.draw_series(LineSeries::new(series, &color))?;
    Ok(())
}

fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, PipelineError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| PipelineError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}

/// Writes the rendered view to a fixed path, replacing any previous file.
pub struct PngSnapshot {
    path: PathBuf,
    style: PlotStyle,
}

impl PngSnapshot {
    pub fn new(path: impl Into<PathBuf>, style: PlotStyle) -> Self {
        Self {
            path: path.into(),
            style,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotWriter for PngSnapshot {
    fn write_snapshot(
        &mut self,
        frame: &CombinedFrame,
        view: &ViewState,
    ) -> Result<(), PipelineError> {
        let png = render_snapshot_png(frame, view, &self.style)?;
        std::fs::write(&self.path, png)?;
        log::info!("snapshot written to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SignalConfig;
    use crate::drivers::fft::SpectrumBuilder;
    use crate::drivers::source::NoisySine;

    fn reference_frame() -> CombinedFrame {
        let mut source = NoisySine::new(&SignalConfig {
            seed: Some(7),
            ..SignalConfig::default()
        });
        CombinedFrame::from_signal(source.generate(), &SpectrumBuilder::new())
    }

    #[test]
    fn title_carries_base_frequency() {
        assert_eq!(
            PlotStyle::for_frequency(0.2).waveform_title,
            "Original Signal freq=0.2 + random noise"
        );
    }

    #[test]
    fn snapshot_file_is_png() {
        let frame = reference_frame();
        let mut view = ViewState::new();
        view.absorb(&frame);
        let dir = tempfile::tempdir().unwrap();
        let mut writer = PngSnapshot::new(dir.path().join("plot.png"), PlotStyle::for_frequency(0.2));
        writer.write_snapshot(&frame, &view).unwrap();
        let bytes = std::fs::read(writer.path()).unwrap();
        assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn tick_labels_stand_out_from_background() {
        let frame = reference_frame();
        let mut view = ViewState::new();
        view.absorb(&frame);
        let style = PlotStyle::for_frequency(0.2);
        let png = render_snapshot_png(&frame, &view, &style).unwrap();
        let image = image::load_from_memory(&png).unwrap().to_rgb8();
        // left label area of the top panel, below its caption
        let bright = (12..50)
            .flat_map(|x| (40..(style.height / 2 - 40)).map(move |y| (x, y)))
            .filter(|&(x, y)| image.get_pixel(x, y).0.iter().all(|&c| c > 120))
            .count();
        assert!(bright > 0, "no light pixels in the y tick label area");
    }
}
