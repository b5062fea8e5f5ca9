// src/drivers/shutdown.rs
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

/// Creates a connected trigger/listener pair.
///
/// Nothing is ever sent on the underlying channel: triggering drops the only
/// sender, which wakes every listener blocked on it at once.
pub fn shutdown_signal() -> (ShutdownTrigger, ShutdownListener) {
    let (tx, rx) = crossbeam_channel::bounded::<()>(0);
    (
        ShutdownTrigger {
            tx: Arc::new(Mutex::new(Some(tx))),
        },
        ShutdownListener { rx },
    )
}

#[derive(Clone, Debug)]
pub struct ShutdownTrigger {
    tx: Arc<Mutex<Option<Sender<()>>>>,
}

impl ShutdownTrigger {
    /// Signals shutdown. Calling it again is a no-op.
    pub fn trigger(&self) {
        let taken = match self.tx.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if taken.is_some() {
            log::info!("shutdown requested");
        }
    }
}

#[derive(Clone, Debug)]
pub struct ShutdownListener {
    rx: Receiver<()>,
}

impl ShutdownListener {
    pub fn is_triggered(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Sleeps for `period` unless shutdown arrives first.
    /// Returns `true` when woken by shutdown.
    pub fn wait(&self, period: Duration) -> bool {
        matches!(
            self.rx.recv_timeout(period),
            Err(RecvTimeoutError::Disconnected)
        )
    }

    /// Channel to `select!` on alongside other blocking operations.
    pub fn receiver(&self) -> &Receiver<()> {
        &self.rx
    }
}
