// src/drivers/mod.rs
pub mod error;
pub mod fft;
pub mod plot;
pub mod queue;
pub mod shutdown;
pub mod sink;
pub mod source;
pub mod transform;
pub mod view;

pub use error::PipelineError;
pub use plot::{PlotStyle, PngSnapshot};
pub use queue::{stage_queue, QueueProbe};
pub use shutdown::{shutdown_signal, ShutdownListener, ShutdownTrigger};
pub use sink::{DisplaySink, LiveView, LogView, SnapshotWriter};
pub use source::{NoisySine, SampleSource, SignalWorker};
pub use transform::SpectrumTransform;
pub use view::{PanelRange, ViewState};
