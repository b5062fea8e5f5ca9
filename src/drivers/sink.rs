// src/drivers/sink.rs
use std::time::Duration;

use crate::drivers::queue::{QueueReceiver, Received};
use crate::drivers::shutdown::ShutdownListener;
use crate::drivers::view::ViewState;
use crate::drivers::PipelineError;
use crate::types::{CombinedFrame, Stage, StageReport};

/// Something that shows the latest frame to a person.
pub trait LiveView {
    /// Called once before the first frame.
    fn init(&mut self) -> Result<(), PipelineError> {
        Ok(())
    }

    fn present(&mut self, frame: &CombinedFrame, view: &ViewState) -> Result<(), PipelineError>;
}

/// Persists the current view, e.g. as an image file.
pub trait SnapshotWriter {
    fn write_snapshot(&mut self, frame: &CombinedFrame, view: &ViewState)
        -> Result<(), PipelineError>;
}

/// Headless stand-in for a window: every redraw becomes a log line.
#[derive(Debug, Default)]
pub struct LogView;

impl LiveView for LogView {
    fn init(&mut self) -> Result<(), PipelineError> {
        log::info!("running without a window, redraws are logged at debug level");
        Ok(())
    }

    fn present(&mut self, frame: &CombinedFrame, view: &ViewState) -> Result<(), PipelineError> {
        log::debug!(
            "redraw #{} (frame {}): waveform y {:.3}..{:.3}, spectrum y {:.3}..{:.3}",
            view.frames_drawn,
            frame.sequence(),
            view.waveform.y.0,
            view.waveform.y.1,
            view.spectrum.y.0,
            view.spectrum.y.1,
        );
        Ok(())
    }
}

/// Last stage: keeps the view current and takes the one-off snapshot.
pub struct DisplaySink<V: LiveView, W: SnapshotWriter> {
    input: QueueReceiver<CombinedFrame>,
    view: V,
    writer: W,
    state: ViewState,
    redraw_pause: Duration,
}

impl<V: LiveView, W: SnapshotWriter> DisplaySink<V, W> {
    pub fn new(input: QueueReceiver<CombinedFrame>, view: V, writer: W, redraw_pause: Duration) -> Self {
        Self {
            input,
            view,
            writer,
            state: ViewState::new(),
            redraw_pause,
        }
    }

    pub fn run(mut self, shutdown: ShutdownListener) -> Result<StageReport, PipelineError> {
        self.view.init()?;
        let mut report = StageReport::new(Stage::DisplaySink, 0);
        loop {
            let frame = match self.input.recv_or_shutdown(&shutdown) {
                Received::Item(frame) => frame,
                Received::Closed => {
                    log::info!("queue {} closed, sink finishing", self.input.name());
                    break;
                }
                Received::Shutdown => break,
            };
            if self.draw(&frame)? {
                report.snapshots_written += 1;
            }
            report.processed += 1;
            if shutdown.wait(self.redraw_pause) {
                break;
            }
        }
        Ok(report)
    }

    /// Returns `true` if this frame was also written as the snapshot.
    fn draw(&mut self, frame: &CombinedFrame) -> Result<bool, PipelineError> {
        self.state.absorb(frame);
        self.view.present(frame, &self.state)?;
        if self.state.claim_snapshot() {
            self.writer.write_snapshot(frame, &self.state)?;
            return Ok(true);
        }
        Ok(false)
    }
}
