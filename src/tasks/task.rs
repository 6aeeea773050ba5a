//! # Task abstraction.
//!
//! A [`Task`] is a named unit of asynchronous work that has not started yet. The runner claims
//! it from its queue and awaits [`Task::run`] exactly once.
//!
//! The common handle type is [`TaskRef`], an `Arc<dyn Task>` that is shared between the
//! submitter, the queue, the worker and event listeners.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TaskError;

/// Shared handle to a task.
pub type TaskRef = Arc<dyn Task>;

/// # Asynchronous unit of work.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use taskrelay::{Task, TaskError};
///
/// struct Upload {
///     path: String,
/// }
///
/// #[async_trait]
/// impl Task for Upload {
///     fn name(&self) -> &str {
///         &self.path
///     }
///
///     async fn run(&self) -> Result<(), TaskError> {
///         if self.path.is_empty() {
///             return Err(TaskError::fail("empty path"));
///         }
///         // upload...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Returns a human-readable task name (diagnostics only).
    fn name(&self) -> &str;

    /// Executes the task once.
    async fn run(&self) -> Result<(), TaskError>;
}
