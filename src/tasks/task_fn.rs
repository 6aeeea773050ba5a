//! # Function-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: Fn() -> Fut`, producing a fresh future per run.
//! Tasks built with [`TaskFn::unnamed`] get a generated name (`task#<n>`) from a
//! process-wide counter, which is what [`TaskRunner::submit_fn`](crate::TaskRunner::submit_fn) uses.
//!
//! ## Example
//! ```rust
//! use taskrelay::{TaskFn, TaskRef, TaskError};
//!
//! let t: TaskRef = TaskFn::arc("fetch-people", || async {
//!     // do work...
//!     Ok::<_, TaskError>(())
//! });
//!
//! assert_eq!(t.name(), "fetch-people");
//! ```

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use crate::error::TaskError;
use crate::tasks::task::Task;

static UNNAMED_SEQ: AtomicU64 = AtomicU64::new(0);

/// Function-backed task implementation.
///
/// Wraps a closure that *creates* a new future per run.
pub struct TaskFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task.
    ///
    /// Prefer [`TaskFn::arc`] when you immediately need a [`TaskRef`](crate::TaskRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates a task named `task#<n>`.
    pub fn unnamed(f: F) -> Self {
        let id = UNNAMED_SEQ.fetch_add(1, Ordering::Relaxed);
        Self::new(format!("task#{id}"), f)
    }

    /// Creates the task and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F> fmt::Debug for TaskFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskFn").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F, Fut> Task for TaskFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> Result<(), TaskError> {
        (self.f)().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unnamed_tasks_get_distinct_names() {
        let a = TaskFn::unnamed(|| async { Ok::<_, TaskError>(()) });
        let b = TaskFn::unnamed(|| async { Ok::<_, TaskError>(()) });

        assert!(a.name().starts_with("task#"));
        assert_ne!(a.name(), b.name());
    }

    #[tokio::test]
    async fn runs_a_fresh_future_each_time() {
        let calls = Arc::new(AtomicU64::new(0));
        let c = Arc::clone(&calls);
        let t = TaskFn::new("count", move || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<_, TaskError>(())
            }
        });

        t.run().await.unwrap();
        t.run().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn propagates_errors() {
        let t = TaskFn::new("broken", || async { Err::<(), _>(TaskError::fail("nope")) });
        assert_eq!(t.run().await, Err(TaskError::fail("nope")));
    }
}
