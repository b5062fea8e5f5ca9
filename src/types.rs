// src/types.rs
use std::fmt;

use ndarray::Array1;

use crate::drivers::fft::SpectrumBuilder;

/// One emission of the signal source: time axis and amplitude, same length.
#[derive(Clone, Debug, PartialEq)]
pub struct SignalSample {
    pub sequence: u64,
    pub time: Array1<f64>,
    pub amplitude: Array1<f64>,
}

impl SignalSample {
    pub fn new(sequence: u64, time: Array1<f64>, amplitude: Array1<f64>) -> Self {
        debug_assert_eq!(time.len(), amplitude.len());
        Self {
            sequence,
            time,
            amplitude,
        }
    }

    pub fn len(&self) -> usize {
        self.amplitude.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amplitude.is_empty()
    }
}

/// Centered frequency axis and real FFT component of one sample.
#[derive(Clone, Debug, PartialEq)]
pub struct SpectrumSample {
    pub frequency: Array1<f64>,
    pub magnitude: Array1<f64>,
}

/// A signal sample travelling together with its own spectrum.
///
/// The spectrum is always computed from the signal held in the same frame;
/// there is no way to assemble one from independent parts.
#[derive(Clone, Debug)]
pub struct CombinedFrame {
    signal: SignalSample,
    spectrum: SpectrumSample,
}

impl CombinedFrame {
    pub fn from_signal(signal: SignalSample, builder: &SpectrumBuilder) -> Self {
        let spectrum = builder.compute(&signal);
        Self { signal, spectrum }
    }

    pub fn sequence(&self) -> u64 {
        self.signal.sequence
    }

    pub fn time(&self) -> &Array1<f64> {
        &self.signal.time
    }

    pub fn amplitude(&self) -> &Array1<f64> {
        &self.signal.amplitude
    }

    pub fn frequency(&self) -> &Array1<f64> {
        &self.spectrum.frequency
    }

    pub fn magnitude(&self) -> &Array1<f64> {
        &self.spectrum.magnitude
    }

    pub fn signal(&self) -> &SignalSample {
        &self.signal
    }

    #[cfg(test)]
    pub fn spectrum(&self) -> &SpectrumSample {
        &self.spectrum
    }
}

/// One of the three pipeline workers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    SignalSource,
    SpectrumTransform,
    DisplaySink,
}

impl Stage {
    pub fn thread_name(self) -> &'static str {
        match self {
            Stage::SignalSource => "signal-source",
            Stage::SpectrumTransform => "spectrum-transform",
            Stage::DisplaySink => "display-sink",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.thread_name())
    }
}

/// What a worker did before it returned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageReport {
    pub stage: Stage,
    pub processed: u64,
    pub snapshots_written: u64,
}

impl StageReport {
    pub fn new(stage: Stage, processed: u64) -> Self {
        Self {
            stage,
            processed,
            snapshots_written: 0,
        }
    }
}

/// Final summary produced by the supervisor once the pipeline is down.
#[derive(Clone, Debug, Default)]
pub struct RunReport {
    pub stages: Vec<StageReport>,
    pub failures: Vec<(Stage, String)>,
    pub stragglers: Vec<Stage>,
}

impl RunReport {
    #[cfg(test)]
    pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|r| r.stage == stage)
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.stragglers.is_empty()
    }
}
