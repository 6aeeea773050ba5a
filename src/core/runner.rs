//! # Run a single claimed task.
//!
//! Executes one [`Task`] and reports its terminal event to the runner's registries.
//!
//! ## Event flow
//!
//! ```text
//! Success:
//!   task.run() → Ok(())  → emit task_completed(task)
//!
//! Failure:
//!   task.run() → Err(e)  → emit task_error(TaskFailure { task, e })
//!
//! Panic:
//!   task.run() panics    → caught → emit task_error(TaskFailure { task, Panicked })
//! ```
//!
//! ## Rules
//! - Always emits **exactly one** terminal event per task
//! - A failing or panicking task never escapes into the worker loop
//! - Listener errors and panics are logged and swallowed: the worker is the emitter and has
//!   no caller to hand them to

use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::{
    core::scheduler::RunnerEvents,
    error::{TaskError, TaskFailure},
    events::Emission,
    tasks::TaskRef,
};

/// Executes `task` once and emits its terminal event.
///
/// Returns the task outcome so the caller can account for it.
pub(crate) async fn run_once(task: &TaskRef, events: &RunnerEvents) -> Result<(), TaskError> {
    let res = match AssertUnwindSafe(task.run()).catch_unwind().await {
        Ok(res) => res,
        Err(panic) => Err(TaskError::from_panic(panic)),
    };

    match &res {
        Ok(()) => {
            tracing::debug!(task = task.name(), "task completed successfully");
            emit_completed(events, task);
        }
        Err(e) => {
            tracing::error!(
                task = task.name(),
                error = %e,
                label = e.as_label(),
                "error while executing task"
            );
            emit_failed(events, task, e);
        }
    }
    res
}

/// Emits `task_completed`.
fn emit_completed(events: &RunnerEvents, task: &TaskRef) {
    emit_logged(events.task_completed.snapshot(), task, "task_completed");
}

/// Emits `task_error` with the failure details.
fn emit_failed(events: &RunnerEvents, task: &TaskRef, error: &TaskError) {
    let failure = TaskFailure {
        task: task.clone(),
        error: error.clone(),
    };
    emit_logged(events.task_error.snapshot(), &failure, "task_error");
}

/// Runs `emission` and logs listener errors or panics instead of propagating them.
pub(crate) fn emit_logged<T>(emission: Emission<T>, payload: &T, event: &'static str) {
    match std::panic::catch_unwind(AssertUnwindSafe(|| emission.run(payload))) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => tracing::warn!(event, error = %err, "listener failed"),
        Err(panic) => {
            let info = TaskError::from_panic(panic);
            tracing::warn!(event, error = %info, "listener panicked");
        }
    }
}
