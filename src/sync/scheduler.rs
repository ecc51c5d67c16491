//! Poll scheduler for periodic background refreshes
//!
//! This module runs a refresh immediately and then on a fixed period in a
//! background task. The task holds only a weak reference to its target, so it
//! ends on its own once the target is dropped, and it stops as soon as its
//! [`PollHandle`] is cancelled or dropped.

use async_trait::async_trait;
use std::sync::Weak;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

/// Something that can be refreshed periodically
#[async_trait]
pub trait Pollable: Send + Sync {
    /// Name used in log output
    fn name(&self) -> &str;

    /// Perform one refresh; failures are the target's own concern
    async fn poll(&self);
}

/// Spawns periodic poll tasks
#[derive(Debug, Clone)]
pub struct PollScheduler {
    period: Duration,
}

impl PollScheduler {
    /// Create a scheduler polling every `period`
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    /// Poll period
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start polling `target` now and then every period
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(&self, target: Weak<dyn Pollable>) -> PollHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let period = self.period;
        let task = tokio::spawn(run_poll_loop(target, period, shutdown_rx));

        PollHandle {
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

async fn run_poll_loop(
    target: Weak<dyn Pollable>,
    period: Duration,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    // First tick completes immediately
    let mut timer = interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let name = match target.upgrade() {
        Some(t) => t.name().to_string(),
        None => return,
    };
    info!(target_name = %name, period_secs = period.as_secs_f64(), "Starting poll loop");

    loop {
        tokio::select! {
            // Fires on explicit cancel and when the handle is dropped
            _ = &mut shutdown_rx => {
                debug!(target_name = %name, "Poll loop cancelled");
                break;
            }
            _ = timer.tick() => {
                let Some(target) = target.upgrade() else {
                    debug!(target_name = %name, "Poll target dropped");
                    break;
                };
                target.poll().await;
            }
        }
    }

    info!(target_name = %name, "Poll loop stopped");
}

/// Handle to a running poll task
///
/// Cancelling is idempotent; dropping the handle cancels the task.
#[derive(Debug)]
pub struct PollHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Signal the poll task to stop
    ///
    /// A refresh already in flight runs to completion.
    pub fn cancel(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Whether cancel has been requested
    pub fn is_cancelled(&self) -> bool {
        self.shutdown_tx.is_none()
    }

    /// Whether the poll task has exited
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }

    /// Cancel and wait for the poll task to exit
    pub async fn shutdown(mut self) {
        self.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
