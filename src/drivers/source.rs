// src/drivers/source.rs
use std::f64::consts::PI;
use std::time::Duration;

use ndarray::Array1;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::config::SignalConfig;
use crate::drivers::queue::{Pushed, QueueSender};
use crate::drivers::shutdown::ShutdownListener;
use crate::drivers::PipelineError;
use crate::types::{SignalSample, Stage, StageReport};

/// Trait representing something that can yield signal samples on demand.
pub trait SampleSource {
    /// `Ok(None)` means the source is exhausted.
    fn next_sample(&mut self) -> Result<Option<SignalSample>, PipelineError>;
}

/// Sinusoid plus uniform noise centered at zero. Never runs dry.
pub struct NoisySine {
    time: Array1<f64>,
    frequency: f64,
    rng: StdRng,
    sequence: u64,
}

impl NoisySine {
    pub fn new(config: &SignalConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            time: Array1::linspace(config.start, config.end, config.sample_count),
            frequency: config.frequency(),
            rng,
            sequence: 0,
        }
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// The deterministic part of every sample.
    pub fn clean_wave(&self) -> Array1<f64> {
        let f = self.frequency;
        self.time.mapv(|x| (2.0 * PI * x * f).sin())
    }

    pub fn generate(&mut self) -> SignalSample {
        let rng = &mut self.rng;
        let noise = Array1::from_shape_fn(self.time.len(), |_| rng.gen::<f64>() - 0.5);
        let amplitude = self.clean_wave() + noise;
        let sample = SignalSample::new(self.sequence, self.time.clone(), amplitude);
        self.sequence += 1;
        sample
    }
}

impl SampleSource for NoisySine {
    fn next_sample(&mut self) -> Result<Option<SignalSample>, PipelineError> {
        Ok(Some(self.generate()))
    }
}

/// In-memory source that runs dry after the samples it was given.
#[cfg(test)]
pub struct ManualSource {
    queue: std::collections::VecDeque<SignalSample>,
}

#[cfg(test)]
impl ManualSource {
    pub fn new(samples: impl IntoIterator<Item = SignalSample>) -> Self {
        Self {
            queue: samples.into_iter().collect(),
        }
    }
}

#[cfg(test)]
impl SampleSource for ManualSource {
    fn next_sample(&mut self) -> Result<Option<SignalSample>, PipelineError> {
        Ok(self.queue.pop_front())
    }
}

/// Rate-paced producer feeding queue A.
pub struct SignalWorker<S: SampleSource> {
    source: S,
    output: QueueSender<SignalSample>,
    emission_period: Duration,
}

impl<S: SampleSource> SignalWorker<S> {
    pub fn new(source: S, output: QueueSender<SignalSample>, emission_period: Duration) -> Self {
        Self {
            source,
            output,
            emission_period,
        }
    }

    pub fn run(mut self, shutdown: ShutdownListener) -> Result<StageReport, PipelineError> {
        let mut report = StageReport::new(Stage::SignalSource, 0);
        while !shutdown.is_triggered() {
            let Some(sample) = self.source.next_sample()? else {
                log::info!("signal source exhausted after {} samples", report.processed);
                break;
            };
            log::debug!("generating data (#{})", sample.sequence);
            if self.output.push(sample, &shutdown)? == Pushed::Cancelled {
                break;
            }
            report.processed += 1;
            if shutdown.wait(self.emission_period) {
                break;
            }
        }
        Ok(report)
    }
}
