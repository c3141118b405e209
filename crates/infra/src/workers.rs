//! Background consumer for event-driven cache invalidation.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use vergeerp_entitlements::CacheInvalidator;
use vergeerp_events::{EventBus, ModuleEvent, Subscription};

/// Handle to control and join a background worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the worker to stop.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

/// Consumes `ModuleEvent`s from the bus and feeds them to a
/// [`CacheInvalidator`].
///
/// The handler is idempotent, so at-least-once delivery is safe.
#[derive(Debug)]
pub struct InvalidationWorker;

impl InvalidationWorker {
    /// Spawn a worker thread that re-invalidates cache keys for each event.
    pub fn spawn<B>(name: &'static str, bus: &B, invalidator: CacheInvalidator) -> WorkerHandle
    where
        B: EventBus<ModuleEvent> + ?Sized,
    {
        Self::spawn_on(name, bus.subscribe(), invalidator)
    }

    /// Spawn against an existing subscription (e.g. a named consumer group).
    pub fn spawn_on(
        name: &'static str,
        sub: Subscription<ModuleEvent>,
        invalidator: CacheInvalidator,
    ) -> WorkerHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || worker_loop(sub, shutdown_rx, invalidator))
            .expect("failed to spawn invalidation worker thread");

        WorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        }
    }
}

fn worker_loop(
    sub: Subscription<ModuleEvent>,
    shutdown_rx: mpsc::Receiver<()>,
    invalidator: CacheInvalidator,
) {
    let tick = Duration::from_millis(250);

    loop {
        // Shutdown check (non-blocking)
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        match sub.recv_timeout(tick) {
            Ok(event) => invalidator.handle(&event),
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
}
