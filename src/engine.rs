// src/engine.rs
use std::any::Any;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::PipelineConfig;
use crate::drivers::{
    shutdown_signal, stage_queue, DisplaySink, LiveView, PipelineError, QueueProbe, SampleSource,
    ShutdownListener, ShutdownTrigger, SignalWorker, SnapshotWriter, SpectrumTransform,
};
use crate::types::{CombinedFrame, RunReport, SignalSample, Stage, StageReport};

type WorkerResult = Result<StageReport, PipelineError>;

/// Owns the pipeline's lifetime: wires the queues, starts the three workers,
/// and is the only party that decides when they stop.
pub struct Supervisor {
    config: PipelineConfig,
    trigger: ShutdownTrigger,
    listener: ShutdownListener,
}

impl Supervisor {
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let (trigger, listener) = shutdown_signal();
        Ok(Self {
            config,
            trigger,
            listener,
        })
    }

    pub fn shutdown_trigger(&self) -> ShutdownTrigger {
        self.trigger.clone()
    }

    pub fn shutdown_listener(&self) -> ShutdownListener {
        self.listener.clone()
    }

    pub fn start<S, V, W>(self, source: S, view: V, writer: W) -> Result<RunningPipeline, PipelineError>
    where
        S: SampleSource + Send + 'static,
        V: LiveView + Send + 'static,
        W: SnapshotWriter + Send + 'static,
    {
        let policy = self.config.backpressure;
        let (samples_tx, samples_rx) = stage_queue::<SignalSample>("A", policy);
        let (frames_tx, frames_rx) = stage_queue::<CombinedFrame>("B", policy);
        let samples = samples_rx.probe();
        let frames = frames_rx.probe();
        log::info!(
            "starting pipeline: {} samples per emission every {:?}, queues {:?}",
            self.config.signal.sample_count,
            self.config.emission_period,
            policy
        );

        let source = SignalWorker::new(source, samples_tx, self.config.emission_period);
        let transform = SpectrumTransform::new(samples_rx, frames_tx);
        let sink = DisplaySink::new(frames_rx, view, writer, self.config.redraw_pause);

        let workers = match launch(&self.listener, source, transform, sink) {
            Ok(workers) => workers,
            Err(err) => {
                // whatever did start must not outlive the failed launch
                self.trigger.trigger();
                return Err(err);
            }
        };

        Ok(RunningPipeline {
            workers,
            samples,
            frames,
            trigger: self.trigger,
            listener: self.listener,
            monitor_interval: self.config.monitor_interval,
            join_timeout: self.config.join_timeout,
            report: RunReport::default(),
        })
    }
}

fn launch<S, V, W>(
    listener: &ShutdownListener,
    source: SignalWorker<S>,
    transform: SpectrumTransform,
    sink: DisplaySink<V, W>,
) -> Result<Vec<WorkerHandle>, PipelineError>
where
    S: SampleSource + Send + 'static,
    V: LiveView + Send + 'static,
    W: SnapshotWriter + Send + 'static,
{
    let mut workers = Vec::with_capacity(3);
    workers.push(spawn_worker(Stage::SignalSource, listener, move |l| {
        source.run(l)
    })?);
    workers.push(spawn_worker(Stage::SpectrumTransform, listener, move |l| {
        transform.run(l)
    })?);
    workers.push(spawn_worker(Stage::DisplaySink, listener, move |l| sink.run(l))?);
    Ok(workers)
}

struct WorkerHandle {
    stage: Stage,
    handle: Option<JoinHandle<WorkerResult>>,
}

fn spawn_worker<F>(
    stage: Stage,
    listener: &ShutdownListener,
    body: F,
) -> Result<WorkerHandle, PipelineError>
where
    F: FnOnce(ShutdownListener) -> WorkerResult + Send + 'static,
{
    let listener = listener.clone();
    let handle = thread::Builder::new()
        .name(stage.thread_name().to_owned())
        .spawn(move || {
            log::info!("{stage} started");
            let result = body(listener);
            match &result {
                Ok(report) => log::info!("{stage} stopped after {} items", report.processed),
                Err(err) => log::error!("{stage} failed: {err}"),
            }
            result
        })
        .map_err(PipelineError::Spawn)?;
    Ok(WorkerHandle {
        stage,
        handle: Some(handle),
    })
}

/// Snapshot returned by [`RunningPipeline::check_status`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineStatus {
    pub pending_samples: usize,
    pub pending_frames: usize,
    pub active_workers: usize,
}

pub struct RunningPipeline {
    workers: Vec<WorkerHandle>,
    samples: QueueProbe<SignalSample>,
    frames: QueueProbe<CombinedFrame>,
    trigger: ShutdownTrigger,
    listener: ShutdownListener,
    monitor_interval: Duration,
    join_timeout: Duration,
    report: RunReport,
}

impl RunningPipeline {
    /// Collects any worker that has finished. A worker that ended with an
    /// error or a panic is reported as `WorkerFailed`.
    pub fn check_status(&mut self) -> Result<PipelineStatus, PipelineError> {
        if let Some(failure) = self.reap() {
            return Err(failure);
        }
        Ok(PipelineStatus {
            pending_samples: self.samples.len(),
            pending_frames: self.frames.len(),
            active_workers: self.active_workers(),
        })
    }

    /// Runs until shutdown is requested, every worker is done, or one of them
    /// fails, then shuts everything down.
    pub fn monitor(mut self) -> RunReport {
        loop {
            match self.check_status() {
                Ok(status) if status.active_workers == 0 => {
                    log::info!("all workers finished");
                    break;
                }
                Ok(status) if status.pending_frames == 0 => {
                    log::debug!("nothing to plot ({} samples queued)", status.pending_samples)
                }
                Ok(status) => log::debug!(
                    "queue {}: {} samples, queue {}: {} frames",
                    self.samples.name(),
                    status.pending_samples,
                    self.frames.name(),
                    status.pending_frames
                ),
                Err(err) => {
                    log::error!("{err}; shutting the pipeline down");
                    break;
                }
            }
            if self.listener.wait(self.monitor_interval) {
                break;
            }
        }
        self.shutdown()
    }

    /// Signals every worker and joins them, giving up on the ones still
    /// running once `join_timeout` has passed.
    pub fn shutdown(mut self) -> RunReport {
        self.trigger.trigger();
        let deadline = Instant::now() + self.join_timeout;
        loop {
            self.reap();
            if self.active_workers() == 0 {
                break;
            }
            if Instant::now() >= deadline {
                for worker in self.workers.iter_mut().filter(|w| w.handle.is_some()) {
                    log::warn!(
                        "{} did not stop within {:?}, detaching it",
                        worker.stage,
                        self.join_timeout
                    );
                    worker.handle = None;
                    self.report.stragglers.push(worker.stage);
                }
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        log::info!("pipeline stopped");
        self.report
    }

    fn active_workers(&self) -> usize {
        self.workers.iter().filter(|w| w.handle.is_some()).count()
    }

    fn reap(&mut self) -> Option<PipelineError> {
        let mut first_failure = None;
        for worker in &mut self.workers {
            let finished = worker
                .handle
                .as_ref()
                .map_or(false, |handle| handle.is_finished());
            if !finished {
                continue;
            }
            let Some(handle) = worker.handle.take() else {
                continue;
            };
            let reason = match handle.join() {
                Ok(Ok(report)) => {
                    self.report.stages.push(report);
                    continue;
                }
                Ok(Err(err)) => err.to_string(),
                Err(payload) => panic_reason(payload),
            };
            self.report.failures.push((worker.stage, reason.clone()));
            if first_failure.is_none() {
                first_failure = Some(PipelineError::WorkerFailed {
                    stage: worker.stage,
                    reason,
                });
            }
        }
        first_failure
    }
}

fn panic_reason(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panicked: {msg}")
    } else {
        "panicked".to_owned()
    }
}
