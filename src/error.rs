//! Error types used by the task runner and tasks.
//!
//! - [`TaskError`]: errors raised by individual task executions.
//! - [`TaskFailure`]: the payload of the runner's `task_error` event (task + error).
//!
//! Listener errors are plain [`anyhow::Error`]s; debounced functions keep their own error type.

use std::any::Any;
use std::fmt;

use thiserror::Error;

use crate::tasks::TaskRef;

/// # Errors produced by task execution.
///
/// A failing task never aborts the runner or its sibling workers: the error is
/// reported through the `task_error` event and the worker moves on to the next task.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Task execution failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Task panicked while running. The panic was caught by the worker.
    #[error("task panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text (when it was a string).
        info: String,
    },
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`].
    pub fn fail(error: impl fmt::Display) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskrelay::TaskError;
    ///
    /// let err = TaskError::fail("connection refused");
    /// assert_eq!(err.as_label(), "task_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Panicked { .. } => "task_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Panicked { info } => format!("panic: {info}"),
        }
    }

    /// Builds a [`TaskError::Panicked`] from a caught panic payload.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        TaskError::Panicked {
            info: panic_message(payload.as_ref()),
        }
    }
}

/// Renders a caught panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl From<anyhow::Error> for TaskError {
    fn from(err: anyhow::Error) -> Self {
        TaskError::Fail {
            error: format!("{err:#}"),
        }
    }
}

/// Payload of the runner's `task_error` event.
#[derive(Clone)]
pub struct TaskFailure {
    /// The task that failed.
    pub task: TaskRef,
    /// What went wrong.
    pub error: TaskError,
}

impl fmt::Debug for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskFailure")
            .field("task", &self.task.name())
            .field("error", &self.error)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        assert_eq!(TaskError::fail("x").as_label(), "task_failed");
        assert_eq!(
            TaskError::Panicked { info: "x".into() }.as_label(),
            "task_panicked"
        );
    }

    #[test]
    fn anyhow_errors_become_failures() {
        let err: TaskError = anyhow::anyhow!("disk full").context("writing report").into();
        assert_eq!(
            err,
            TaskError::Fail {
                error: "writing report: disk full".into()
            }
        );
    }

    #[test]
    fn panic_payloads_are_rendered() {
        let err = TaskError::from_panic(Box::new("boom"));
        assert_eq!(err.as_message(), "panic: boom");

        let err = TaskError::from_panic(Box::new(String::from("kaboom")));
        assert_eq!(err, TaskError::Panicked { info: "kaboom".into() });

        let err = TaskError::from_panic(Box::new(42_u32));
        assert_eq!(err.as_label(), "task_panicked");
    }
}
