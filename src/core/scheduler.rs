//! # TaskRunner: bounded-concurrency task queue with lifecycle events.
//!
//! The [`TaskRunner`] owns a FIFO queue of pending tasks and a pool of at most
//! `max_concurrent_tasks` workers. Workers are spawned lazily on submission and retire as soon
//! as the queue is empty; they are never pre-allocated and never one-per-task.
//!
//! ## High-level architecture
//! ```text
//! submit_task(t) / submit_fn(f)
//!     │
//!     ├─► queue.push_back(t)
//!     └─► active < max ? ──► active += 1 ──► Worker #id (tokio task)
//!                                               │
//!                        ┌──────────────────────┘
//!                        ▼
//!            claim head ─► run_once ─► task_completed(task) | task_error(TaskFailure)
//!                 │
//!                 └─ queue empty ─► active -= 1 ─► active == 0 ? ─► all_tasks_completed(())
//! ```
//!
//! ## Rules
//! - **Bounded**: active workers never exceed `max_concurrent_tasks`.
//! - **FIFO claims**: tasks are claimed in submission order; completion order is unordered
//!   once more than one worker runs.
//! - **Deferred start**: `submit_*` never runs a task inline; work starts on a later poll.
//! - **Idle**: `is_idle()` ⇔ no active worker and an empty queue.
//! - **One idle event per busy→idle transition**: `all_tasks_completed` fires when the last
//!   active worker retires.
//! - **Isolation**: task errors and panics are reported through `task_error` and never reach
//!   `wait_for_completion` or other workers.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use taskrelay::{RunnerConfig, TaskError, TaskRunner};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let runner = TaskRunner::new(RunnerConfig::with_max_concurrent_tasks(4));
//!     let fetched = Arc::new(AtomicUsize::new(0));
//!
//!     for _ in 0..30 {
//!         let fetched = Arc::clone(&fetched);
//!         runner.submit_fn(move || {
//!             let fetched = Arc::clone(&fetched);
//!             async move {
//!                 fetched.fetch_add(1, Ordering::SeqCst);
//!                 Ok::<_, TaskError>(())
//!             }
//!         });
//!     }
//!
//!     runner.wait_for_completion().await;
//!     assert_eq!(fetched.load(Ordering::SeqCst), 30);
//!     assert!(runner.is_idle());
//! }
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tracing::Span;

use crate::{
    core::{
        builder::RunnerBuilder,
        config::RunnerConfig,
        worker::{Claim, Worker},
    },
    error::{TaskError, TaskFailure},
    events::ListenerRegistry,
    tasks::{TaskFn, TaskRef},
};

/// Lifecycle events of a [`TaskRunner`], one registry per event.
pub struct RunnerEvents {
    /// Emitted after every task that completed successfully, with the task itself.
    pub task_completed: ListenerRegistry<TaskRef>,
    /// Emitted after every task that failed or panicked.
    pub task_error: ListenerRegistry<TaskFailure>,
    /// Emitted when the last active worker retires and the runner becomes idle.
    pub all_tasks_completed: ListenerRegistry<()>,
}

impl Default for RunnerEvents {
    fn default() -> Self {
        Self {
            task_completed: ListenerRegistry::new(),
            task_error: ListenerRegistry::new(),
            all_tasks_completed: ListenerRegistry::new(),
        }
    }
}

impl fmt::Debug for RunnerEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunnerEvents")
            .field("task_completed", &self.task_completed)
            .field("task_error", &self.task_error)
            .field("all_tasks_completed", &self.all_tasks_completed)
            .finish()
    }
}

/// Mutable scheduling state; only touched inside short critical sections.
#[derive(Default)]
struct State {
    queue: VecDeque<TaskRef>,
    active: usize,
    last_worker_id: u64,
}

/// State shared by the runner handle and its workers.
pub(crate) struct Shared {
    cfg: RunnerConfig,
    state: Mutex<State>,
    pub(crate) events: RunnerEvents,
    pub(crate) span: Span,
}

impl Shared {
    /// Claims the queue head, or retires the calling worker if the queue is empty.
    ///
    /// The worker that brings the count to zero gets the idle listeners as registered at
    /// that instant; they are captured before the lock is released.
    pub(crate) fn claim_or_retire(&self) -> Claim {
        let mut state = self.state.lock();
        match state.queue.pop_front() {
            Some(task) => Claim::Task(task),
            None => {
                state.active -= 1;
                let on_idle =
                    (state.active == 0).then(|| self.events.all_tasks_completed.snapshot());
                Claim::Retired { on_idle }
            }
        }
    }

    pub(crate) fn pending_tasks(&self) -> usize {
        self.state.lock().queue.len()
    }
}

/// Runs submitted tasks with bounded concurrency.
///
/// Cloning is cheap and yields another handle to the same runner.
/// Must be used from within a tokio runtime: workers are spawned with `tokio::spawn`.
#[derive(Clone)]
pub struct TaskRunner {
    shared: Arc<Shared>,
}

impl TaskRunner {
    /// Creates a runner with the given configuration and a default logging span.
    pub fn new(cfg: RunnerConfig) -> Self {
        RunnerBuilder::new(cfg).build()
    }

    /// Returns a builder, e.g. to inject a logging span.
    pub fn builder(cfg: RunnerConfig) -> RunnerBuilder {
        RunnerBuilder::new(cfg)
    }

    pub(crate) fn new_internal(cfg: RunnerConfig, span: Span) -> Self {
        Self {
            shared: Arc::new(Shared {
                cfg,
                state: Mutex::new(State::default()),
                events: RunnerEvents::default(),
                span,
            }),
        }
    }

    /// Queues `task` and spawns a worker if the cap allows it.
    ///
    /// Never blocks and never runs the task before returning.
    pub fn submit_task(&self, task: TaskRef) {
        let spawn_id = {
            let mut state = self.shared.state.lock();
            state.queue.push_back(task);
            if state.active < self.shared.cfg.max_concurrent_clamped() {
                state.active += 1;
                state.last_worker_id += 1;
                Some(state.last_worker_id)
            } else {
                None
            }
        };

        if let Some(id) = spawn_id {
            tracing::debug!(parent: &self.shared.span, worker = id, "spawning worker");
            Worker::new(id, Arc::clone(&self.shared)).spawn();
        }
    }

    /// Wraps a bare async closure into an auto-named task and submits it.
    pub fn submit_fn<F, Fut>(&self, f: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        self.submit_task(Arc::new(TaskFn::unnamed(f)));
    }

    /// Returns a future that completes at the next busy→idle transition.
    ///
    /// The listener is registered when this method is called. If the runner is already idle
    /// the future waits for the *next* transition; use [`wait_until_idle`](Self::wait_until_idle)
    /// for an idle fast path.
    pub fn wait_for_completion(&self) -> BoxFuture<'static, ()> {
        self.shared.events.all_tasks_completed.next_event()
    }

    /// Returns immediately if idle, otherwise waits for the next busy→idle transition.
    pub async fn wait_until_idle(&self) {
        let next = {
            // the last retiring worker captures idle listeners under this same lock, so a
            // listener registered here belongs to the current busy period
            let state = self.shared.state.lock();
            if state.active == 0 && state.queue.is_empty() {
                return;
            }
            self.shared.events.all_tasks_completed.next_event()
        };
        next.await;
    }

    /// True if no worker is active and nothing is queued.
    pub fn is_idle(&self) -> bool {
        let state = self.shared.state.lock();
        state.active == 0 && state.queue.is_empty()
    }

    /// Number of active workers.
    pub fn active_workers(&self) -> usize {
        self.shared.state.lock().active
    }

    /// Number of tasks waiting to be claimed.
    pub fn pending_tasks(&self) -> usize {
        self.shared.pending_tasks()
    }

    /// Lifecycle event registries.
    pub fn events(&self) -> &RunnerEvents {
        &self.shared.events
    }

    /// Configuration the runner was built with.
    pub fn config(&self) -> &RunnerConfig {
        &self.shared.cfg
    }
}

impl Default for TaskRunner {
    fn default() -> Self {
        Self::new(RunnerConfig::default())
    }
}

impl fmt::Debug for TaskRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("TaskRunner")
            .field("max_concurrent_tasks", &self.shared.cfg.max_concurrent_clamped())
            .field("active", &state.active)
            .field("pending", &state.queue.len())
            .finish()
    }
}
