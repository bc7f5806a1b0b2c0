//! Cancellable periodic tasks.
//!
//! A [`TaskSlot`] owns at most one running task. Starting an occupied slot is
//! a no-op; stopping signals the task and waits for it, so a tick already in
//! progress finishes but no new tick begins.

use futures_util::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

struct RunningTask {
    stop_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

/// Holder for a single background task with start/stop semantics.
#[derive(Default)]
pub struct TaskSlot {
    running: Mutex<Option<RunningTask>>,
}

impl TaskSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn the task built by `make` unless one is already running.
    ///
    /// Returns false when the slot was occupied.
    pub fn start<F, Fut>(&self, make: F) -> bool
    where
        F: FnOnce(watch::Receiver<bool>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(task) = running.as_ref() {
            if !task.join.is_finished() {
                return false;
            }
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let join = tokio::spawn(make(stop_rx));
        *running = Some(RunningTask { stop_tx, join });
        true
    }

    /// Signal the task to stop and wait for it to exit.
    pub async fn stop(&self) {
        let task = self.running.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(task) = task {
            let _ = task.stop_tx.send(true);
            if let Err(e) = task.join.await {
                tracing::error!(error = %e, "Background task ended abnormally");
            }
        }
    }

    /// True while a task is spawned and has not exited.
    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|task| !task.join.is_finished())
    }
}

/// Run `tick` every `period` until `stop` flips to true.
///
/// Ticks run inline, so a slow tick delays the next one instead of
/// overlapping it.
pub async fn run_every<F, Fut>(period: Duration, mut stop: watch::Receiver<bool>, mut tick: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = stop.changed() => break,
        }
        if *stop.borrow() {
            break;
        }
        tick().await;
    }
}

/// Await `fut`, turning a panic into a logged error.
pub async fn guarded<Fut>(name: &'static str, fut: Fut)
where
    Fut: Future<Output = ()>,
{
    if AssertUnwindSafe(fut).catch_unwind().await.is_err() {
        tracing::error!(task = name, "Tick panicked; continuing on next interval");
    }
}

/// Sleep for `delay`, returning false if `stop` fires first.
pub async fn sleep_or_stop(delay: Duration, stop: &mut watch::Receiver<bool>) -> bool {
    if *stop.borrow() {
        return false;
    }
    tokio::select! {
        _ = time::sleep(delay) => true,
        _ = stop.changed() => false,
    }
}
