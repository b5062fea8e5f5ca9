// src/drivers/queue.rs
use crossbeam_channel::{select, Receiver, RecvError, Sender, TryRecvError, TrySendError};

use crate::config::Backpressure;
use crate::drivers::shutdown::ShutdownListener;
use crate::drivers::PipelineError;

/// Creates the two ends of a FIFO hand-off queue between two stages.
pub fn stage_queue<T>(name: &'static str, policy: Backpressure) -> (QueueSender<T>, QueueReceiver<T>) {
    let (tx, rx) = match policy.capacity() {
        None => crossbeam_channel::unbounded(),
        Some(capacity) => crossbeam_channel::bounded(capacity),
    };
    let evict = match policy {
        Backpressure::DropOldest { .. } => Some(rx.clone()),
        _ => None,
    };
    (
        QueueSender {
            name,
            policy,
            tx,
            evict,
            evicted: 0,
        },
        QueueReceiver { name, rx },
    )
}

/// Outcome of a single push.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pushed {
    Queued,
    /// Queued after evicting the oldest item.
    Evicted,
    /// Shutdown arrived while waiting for room; the item was dropped.
    Cancelled,
}

pub struct QueueSender<T> {
    name: &'static str,
    policy: Backpressure,
    tx: Sender<T>,
    evict: Option<Receiver<T>>,
    evicted: u64,
}

impl<T> QueueSender<T> {
    #[cfg(test)]
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    pub fn push(&mut self, item: T, shutdown: &ShutdownListener) -> Result<Pushed, PipelineError> {
        match self.policy {
            Backpressure::Unbounded => self
                .tx
                .send(item)
                .map(|_| Pushed::Queued)
                .map_err(|_| self.disconnected()),
            Backpressure::Block { .. } => {
                if let Err(err) = self.tx.try_send(item) {
                    let item = match err {
                        TrySendError::Full(item) => item,
                        TrySendError::Disconnected(_) => return Err(self.disconnected()),
                    };
                    log::trace!("queue {} full, waiting for room", self.name);
                    select! {
                        send(self.tx, item) -> res => {
                            res.map_err(|_| self.disconnected())?;
                        }
                        recv(shutdown.receiver()) -> _ => return Ok(Pushed::Cancelled),
                    }
                }
                Ok(Pushed::Queued)
            }
            Backpressure::DropOldest { .. } => self.push_evicting(item),
        }
    }

    fn push_evicting(&mut self, mut item: T) -> Result<Pushed, PipelineError> {
        let mut evicted = false;
        loop {
            match self.tx.try_send(item) {
                Ok(()) => {
                    return Ok(if evicted {
                        Pushed::Evicted
                    } else {
                        Pushed::Queued
                    })
                }
                Err(TrySendError::Disconnected(_)) => return Err(self.disconnected()),
                Err(TrySendError::Full(back)) => {
                    item = back;
                    if let Some(evict) = &self.evict {
                        if evict.try_recv().is_ok() {
                            self.evicted += 1;
                            evicted = true;
                            log::warn!(
                                "queue {} full, dropped oldest item ({} so far)",
                                self.name,
                                self.evicted
                            );
                        }
                    }
                }
            }
        }
    }

    fn disconnected(&self) -> PipelineError {
        PipelineError::Disconnected { queue: self.name }
    }
}

/// Result of waiting on a queue.
#[derive(Debug)]
pub enum Received<T> {
    Item(T),
    /// Producer is gone and everything it sent has been consumed.
    Closed,
    Shutdown,
}

pub struct QueueReceiver<T> {
    name: &'static str,
    rx: Receiver<T>,
}

impl<T> QueueReceiver<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Non-blocking take; `None` when nothing is queued right now.
    pub fn try_pop(&self) -> Option<T> {
        match self.rx.try_recv() {
            Ok(item) => Some(item),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Blocks until an item arrives, the producer goes away, or shutdown.
    pub fn recv_or_shutdown(&self, shutdown: &ShutdownListener) -> Received<T> {
        select! {
            recv(self.rx) -> msg => match msg {
                Ok(item) => Received::Item(item),
                Err(RecvError) => Received::Closed,
            },
            recv(shutdown.receiver()) -> _ => Received::Shutdown,
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn probe(&self) -> QueueProbe<T> {
        QueueProbe {
            name: self.name,
            rx: self.rx.clone(),
        }
    }
}

/// Read-only view of a queue's depth for diagnostics.
pub struct QueueProbe<T> {
    name: &'static str,
    rx: Receiver<T>,
}

impl<T> QueueProbe<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::shutdown::shutdown_signal;
    use std::time::Duration;

    #[test]
    fn unbounded_queue_keeps_fifo_order() {
        let (_trigger, listener) = shutdown_signal();
        let (mut tx, rx) = stage_queue::<u32>("A", Backpressure::Unbounded);
        for i in 0..1000 {
            assert_eq!(tx.push(i, &listener).unwrap(), Pushed::Queued);
        }
        assert_eq!(rx.len(), 1000);
        let drained: Vec<u32> = std::iter::from_fn(|| rx.try_pop()).collect();
        assert_eq!(drained, (0..1000).collect::<Vec<_>>());
    }

    #[test]
    fn empty_queue_pop_is_none() {
        let (_tx, rx) = stage_queue::<u32>("A", Backpressure::Unbounded);
        assert!(rx.try_pop().is_none());
        assert!(rx.is_empty());
    }

    #[test]
    fn drop_oldest_keeps_newest_items() {
        let (_trigger, listener) = shutdown_signal();
        let (mut tx, rx) = stage_queue::<u32>("B", Backpressure::DropOldest { capacity: 3 });
        let outcomes: Vec<Pushed> = (0..5).map(|i| tx.push(i, &listener).unwrap()).collect();
        assert_eq!(
            outcomes,
            vec![
                Pushed::Queued,
                Pushed::Queued,
                Pushed::Queued,
                Pushed::Evicted,
                Pushed::Evicted
            ]
        );
        assert_eq!(tx.evicted(), 2);
        let drained: Vec<u32> = std::iter::from_fn(|| rx.try_pop()).collect();
        assert_eq!(drained, vec![2, 3, 4]);
    }

    #[test]
    fn blocking_queue_waits_for_consumer_without_losing_items() {
        let (_trigger, listener) = shutdown_signal();
        let (mut tx, rx) = stage_queue::<u32>("A", Backpressure::Block { capacity: 2 });
        let producer = std::thread::spawn(move || {
            for i in 0..50 {
                assert_eq!(tx.push(i, &listener).unwrap(), Pushed::Queued);
            }
        });
        let (_t2, idle) = shutdown_signal();
        let mut seen = Vec::new();
        loop {
            match rx.recv_or_shutdown(&idle) {
                Received::Item(v) => seen.push(v),
                Received::Closed => break,
                Received::Shutdown => unreachable!(),
            }
        }
        producer.join().unwrap();
        assert_eq!(seen, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn blocked_push_is_cancelled_by_shutdown() {
        let (trigger, listener) = shutdown_signal();
        let (mut tx, _rx) = stage_queue::<u32>("A", Backpressure::Block { capacity: 1 });
        tx.push(1, &listener).unwrap();
        let handle = std::thread::spawn(move || tx.push(2, &listener).unwrap());
        std::thread::sleep(Duration::from_millis(20));
        trigger.trigger();
        assert_eq!(handle.join().unwrap(), Pushed::Cancelled);
    }

    #[test]
    fn push_without_consumer_is_disconnected() {
        let (_trigger, listener) = shutdown_signal();
        let (mut tx, rx) = stage_queue::<u32>("B", Backpressure::Unbounded);
        drop(rx);
        assert!(matches!(
            tx.push(1, &listener),
            Err(PipelineError::Disconnected { queue: "B" })
        ));
    }

    #[test]
    fn receiver_reports_closed_after_drain_and_shutdown_when_signalled() {
        let (trigger, listener) = shutdown_signal();
        let (mut tx, rx) = stage_queue::<u32>("A", Backpressure::Unbounded);
        tx.push(7, &listener).unwrap();
        drop(tx);
        assert!(matches!(rx.recv_or_shutdown(&listener), Received::Item(7)));
        assert!(matches!(rx.recv_or_shutdown(&listener), Received::Closed));

        let (_tx, rx) = stage_queue::<u32>("A", Backpressure::Unbounded);
        trigger.trigger();
        assert!(matches!(rx.recv_or_shutdown(&listener), Received::Shutdown));
    }

    #[test]
    fn probe_tracks_depth() {
        let (_trigger, listener) = shutdown_signal();
        let (mut tx, rx) = stage_queue::<u32>("B", Backpressure::Unbounded);
        let probe = rx.probe();
        assert!(probe.is_empty());
        tx.push(1, &listener).unwrap();
        tx.push(2, &listener).unwrap();
        assert_eq!(probe.len(), 2);
        rx.try_pop();
        assert_eq!(probe.len(), 1);
        assert_eq!(probe.name(), "B");
    }
}
