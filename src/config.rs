// src/config.rs
use std::path::PathBuf;
use std::time::Duration;

use crate::drivers::PipelineError;

/// How a hand-off queue behaves when its producer outruns its consumer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Backpressure {
    /// Never blocks and never drops; the queue grows as needed.
    #[default]
    Unbounded,
    /// Producer waits for room (or shutdown) once `capacity` items are queued.
    Block { capacity: usize },
    /// Oldest queued item is evicted to make room for the new one.
    DropOldest { capacity: usize },
}

impl Backpressure {
    pub fn capacity(&self) -> Option<usize> {
        match *self {
            Backpressure::Unbounded => None,
            Backpressure::Block { capacity } | Backpressure::DropOldest { capacity } => {
                Some(capacity)
            }
        }
    }
}

/// Parameters of the noisy sine wave.
#[derive(Clone, Debug, PartialEq)]
pub struct SignalConfig {
    pub start: f64,
    pub end: f64,
    pub base_frequency: f64,
    pub sample_count: usize,
    /// Fixed noise seed; `None` draws a fresh seed from the OS.
    pub seed: Option<u64>,
}

impl SignalConfig {
    /// `base_frequency` scaled by the sampling rate of the time axis.
    pub fn frequency(&self) -> f64 {
        self.base_frequency * self.sample_count as f64 / (self.end - self.start)
    }
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            start: -50.0,
            end: 50.0,
            base_frequency: 0.2,
            sample_count: 256,
            seed: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub signal: SignalConfig,
    pub emission_period: Duration,
    pub redraw_pause: Duration,
    pub monitor_interval: Duration,
    pub join_timeout: Duration,
    pub backpressure: Backpressure,
    pub snapshot_path: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            signal: SignalConfig::default(),
            emission_period: Duration::from_millis(100),
            redraw_pause: Duration::from_millis(50),
            monitor_interval: Duration::from_millis(250),
            join_timeout: Duration::from_secs(2),
            backpressure: Backpressure::Unbounded,
            snapshot_path: PathBuf::from("plot.png"),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        let signal = &self.signal;
        if signal.sample_count == 0 {
            return Err(PipelineError::InvalidConfig(
                "sample count must be greater than zero".into(),
            ));
        }
        if !signal.start.is_finite() || !signal.end.is_finite() {
            return Err(PipelineError::InvalidConfig(
                "start and end must be finite".into(),
            ));
        }
        if signal.end == signal.start {
            return Err(PipelineError::InvalidConfig(
                "start and end must differ".into(),
            ));
        }
        if !signal.base_frequency.is_finite() {
            return Err(PipelineError::InvalidConfig(
                "base frequency must be finite".into(),
            ));
        }
        if self.backpressure.capacity() == Some(0) {
            return Err(PipelineError::InvalidConfig(
                "bounded queues need a capacity of at least one".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_frequency_matches_reference_setup() {
        let signal = SignalConfig::default();
        assert!((signal.frequency() - 0.512).abs() < 1e-12);
    }

    #[test]
    fn defaults_are_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_degenerate_signal() {
        let mut config = PipelineConfig::default();
        config.signal.sample_count = 0;
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidConfig(_))
        ));

        let mut config = PipelineConfig::default();
        config.signal.end = config.signal.start;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.signal.start = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_capacity_queue() {
        let config = PipelineConfig {
            backpressure: Backpressure::DropOldest { capacity: 0 },
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
        let config = PipelineConfig {
            backpressure: Backpressure::Block { capacity: 4 },
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
