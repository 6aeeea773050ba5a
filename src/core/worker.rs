//! # Worker: drains the shared queue.
//!
//! A worker is spawned by [`TaskRunner`](crate::TaskRunner) when a task is submitted and
//! fewer than `max_concurrent_tasks` workers are active. It keeps claiming tasks until the
//! queue is empty, then retires.
//!
//! ## Architecture
//! ```text
//! submit_task ──► spawn_worker (if active < max) ──► Worker::run()
//!
//! yield once (never start inline with the submitter)
//! loop {
//!   ├─► claim_or_retire()            (one critical section)
//!   │     ├─ Some(task) → run_once(task) → task_completed / task_error
//!   │     └─ None       → active -= 1; if 0, capture all_tasks_completed listeners; break
//!   └─► repeat
//! }
//! run the captured all_tasks_completed listeners (lock released)
//! ```
//!
//! ## Rules
//! - Tasks are claimed in FIFO order from one queue shared by all workers
//! - A worker runs one task at a time
//! - Claim and retire happen under the same lock, so a task can never be left in the queue
//!   with no worker to claim it, and exactly one worker observes the count reaching zero
//! - The idle listeners are captured under that lock too: a waiter registered after the
//!   runner went busy again is not woken by the previous busy period's idle event

use std::sync::Arc;

use tracing::Instrument;

use crate::{
    core::{
        runner::{emit_logged, run_once},
        scheduler::Shared,
    },
    events::Emission,
};

/// One logical worker of a [`TaskRunner`](crate::TaskRunner).
pub(crate) struct Worker {
    /// Diagnostic id, unique and increasing per runner.
    id: u64,
    shared: Arc<Shared>,
}

impl Worker {
    pub(crate) fn new(id: u64, shared: Arc<Shared>) -> Self {
        Self { id, shared }
    }

    /// Spawns the worker loop on the ambient tokio runtime.
    pub(crate) fn spawn(self) {
        let span = tracing::debug_span!(parent: &self.shared.span, "worker", id = self.id);
        tokio::spawn(self.run().instrument(span));
    }

    /// Runs until the queue is empty, then retires.
    async fn run(self) {
        tokio::task::yield_now().await;
        tracing::debug!(worker = self.id, "worker starting");

        let mut processed: u64 = 0;
        let mut failed: u64 = 0;
        let on_idle = loop {
            match self.shared.claim_or_retire() {
                Claim::Task(task) => {
                    if tracing::enabled!(tracing::Level::TRACE) {
                        tracing::trace!(
                            worker = self.id,
                            task = task.name(),
                            pending = self.shared.pending_tasks(),
                            "claimed task"
                        );
                    }
                    if run_once(&task, &self.shared.events).await.is_err() {
                        failed += 1;
                    }
                    processed += 1;
                }
                Claim::Retired { on_idle } => break on_idle,
            }
        };

        tracing::debug!(worker = self.id, processed, failed, "worker stopping");

        if let Some(emission) = on_idle {
            tracing::debug!("last worker completed the job; the runner is now idle");
            emit_logged(emission, &(), "all_tasks_completed");
        }
    }
}

/// Result of one claim attempt.
pub(crate) enum Claim {
    /// The head of the queue, now owned by the worker.
    Task(crate::tasks::TaskRef),
    /// The queue was empty and the worker retired. If it was the last one, carries the
    /// `all_tasks_completed` listeners captured at that moment.
    Retired { on_idle: Option<Emission<()>> },
}
