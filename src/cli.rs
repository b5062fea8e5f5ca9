// src/cli.rs
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::{Backpressure, PipelineConfig, SignalConfig};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum QueuePolicy {
    Unbounded,
    Block,
    DropOldest,
}

/// Live noisy-sine generator with FFT view.
#[derive(Debug, Parser)]
#[command(
    name = "spectrum-pipeline",
    version,
    about,
    after_help = "Log output follows RUST_LOG when it is set; otherwise --verbose selects debug, else info."
)]
pub struct Cli {
    /// Start of the time axis
    #[arg(long, default_value_t = -50.0, allow_hyphen_values = true)]
    pub start: f64,
    /// End of the time axis
    #[arg(long, default_value_t = 50.0, allow_hyphen_values = true)]
    pub end: f64,
    #[arg(long, default_value_t = 0.2)]
    pub base_frequency: f64,
    /// Points per emitted sample
    #[arg(long, default_value_t = 256)]
    pub sample_count: usize,
    #[arg(long, default_value_t = 100)]
    pub emission_period_ms: u64,
    #[arg(long, default_value_t = 50)]
    pub redraw_pause_ms: u64,
    #[arg(long, default_value_t = 250)]
    pub monitor_interval_ms: u64,
    /// How long shutdown waits for workers before giving up on them
    #[arg(long, default_value_t = 2000)]
    pub join_timeout_ms: u64,
    #[arg(long, value_enum, default_value_t = QueuePolicy::Unbounded)]
    pub backpressure: QueuePolicy,
    /// Capacity of both queues for the bounded policies
    #[arg(long, default_value_t = 64)]
    pub queue_capacity: usize,
    /// Fix the noise seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,
    #[arg(long, default_value = "plot.png")]
    pub snapshot: PathBuf,
    /// Run without a window; redraws go to the log
    #[arg(long)]
    pub headless: bool,
    /// Log every cycle (generating data, computing fft, nothing to plot)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }

    pub fn to_config(&self) -> PipelineConfig {
        let capacity = self.queue_capacity;
        PipelineConfig {
            signal: SignalConfig {
                start: self.start,
                end: self.end,
                base_frequency: self.base_frequency,
                sample_count: self.sample_count,
                seed: self.seed,
            },
            emission_period: Duration::from_millis(self.emission_period_ms),
            redraw_pause: Duration::from_millis(self.redraw_pause_ms),
            monitor_interval: Duration::from_millis(self.monitor_interval_ms),
            join_timeout: Duration::from_millis(self.join_timeout_ms),
            backpressure: match self.backpressure {
                QueuePolicy::Unbounded => Backpressure::Unbounded,
                QueuePolicy::Block => Backpressure::Block { capacity },
                QueuePolicy::DropOldest => Backpressure::DropOldest { capacity },
            },
            snapshot_path: self.snapshot.clone(),
        }
    }
}
