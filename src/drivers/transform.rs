// src/drivers/transform.rs
use crate::drivers::fft::SpectrumBuilder;
use crate::drivers::queue::{Pushed, QueueReceiver, QueueSender, Received};
use crate::drivers::shutdown::ShutdownListener;
use crate::drivers::PipelineError;
use crate::types::{CombinedFrame, SignalSample, Stage, StageReport};

/// Pairs every signal sample from queue A with its spectrum and forwards the
/// pair to queue B, one in, one out, in arrival order.
pub struct SpectrumTransform {
    input: QueueReceiver<SignalSample>,
    output: QueueSender<CombinedFrame>,
    builder: SpectrumBuilder,
    processed: u64,
}

impl SpectrumTransform {
    pub fn new(input: QueueReceiver<SignalSample>, output: QueueSender<CombinedFrame>) -> Self {
        Self {
            input,
            output,
            builder: SpectrumBuilder::new(),
            processed: 0,
        }
    }

    /// Handles at most one queued sample without blocking.
    /// Returns `Ok(false)` when queue A was empty.
    pub fn poll_once(&mut self, shutdown: &ShutdownListener) -> Result<bool, PipelineError> {
        let Some(sample) = self.input.try_pop() else {
            return Ok(false);
        };
        self.forward(sample, shutdown)?;
        Ok(true)
    }

    /// Drains queue A without blocking, then waits for the next sample.
    /// A push cancelled by shutdown ends the loop on the next check.
    pub fn run(mut self, shutdown: ShutdownListener) -> Result<StageReport, PipelineError> {
        while !shutdown.is_triggered() {
            if self.poll_once(&shutdown)? {
                continue;
            }
            match self.input.recv_or_shutdown(&shutdown) {
                Received::Item(sample) => {
                    self.forward(sample, &shutdown)?;
                }
                Received::Closed => {
                    log::info!("queue {} closed, transform finishing", self.input.name());
                    break;
                }
                Received::Shutdown => break,
            }
        }
        Ok(StageReport::new(Stage::SpectrumTransform, self.processed))
    }

    fn forward(
        &mut self,
        sample: SignalSample,
        shutdown: &ShutdownListener,
    ) -> Result<Pushed, PipelineError> {
        log::debug!("computing fft (#{})", sample.sequence);
        let frame = CombinedFrame::from_signal(sample, &self.builder);
        let pushed = self.output.push(frame, shutdown)?;
        if pushed != Pushed::Cancelled {
            self.processed += 1;
        }
        Ok(pushed)
    }
}
