//! # taskrelay
//!
//! **Taskrelay** is a small set of async coordination primitives for tokio applications.
//!
//! It provides an externally settled future, typed listener registries, a bounded task
//! runner that reports through those registries, and a debounce wrapper where newer calls
//! supersede older ones.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   TaskRef    │   │   TaskFn     │   │  submit_fn   │
//!     │ (user task)  │   │  (closure)   │   │ ("task#<n>") │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  TaskRunner                                                       │
//! │  - FIFO queue (shared by all workers)                             │
//! │  - active worker count (≤ RunnerConfig::max_concurrent_tasks)     │
//! │  - RunnerEvents (three ListenerRegistry instances)                │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   Worker 1   │   │   Worker 2   │   │   Worker N   │
//!     │ claim → run  │   │ claim → run  │   │ claim → run  │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘
//!      │ emits            │ emits            │ emits (last to retire)
//!      ▼                  ▼                  ▼
//!  task_completed      task_error      all_tasks_completed
//!                                              │
//!                                              ▼
//!                                   wait_for_completion()
//!                                   (next_event → Deferred)
//! ```
//!
//! ### Debounce
//! ```text
//! call(a) ─┐
//! call(b) ─┼─► one shared Deferred ◄── settled by the current attempt only
//! call(c) ─┘   (a, b cancelled; their outcomes are dropped)
//! ```
//!
//! ## Features
//! | Area              | Description                                                       | Key types / traits                          |
//! |-------------------|-------------------------------------------------------------------|---------------------------------------------|
//! | **Deferred**      | Single-assignment result cell, settled from outside.              | [`Deferred`], [`Resolver`], [`deferred`]    |
//! | **Events**        | Ordered synchronous listeners with once/prepend/unregister.       | [`ListenerRegistry`], [`ListenerHandle`]    |
//! | **Task runner**   | FIFO queue drained by at most N concurrent workers.               | [`TaskRunner`], [`RunnerEvents`]            |
//! | **Tasks**         | Define tasks as trait impls or closures.                          | [`Task`], [`TaskRef`], [`TaskFn`]           |
//! | **Debounce**      | Latest-call-wins wrapper for async functions.                     | [`AsyncDebounce`], [`DebounceOptions`]      |
//! | **Errors**        | Typed task errors and failure payloads.                           | [`TaskError`], [`TaskFailure`]              |
//! | **Configuration** | Plain config structs with clamped accessors.                      | [`RunnerConfig`], [`RunnerBuilder`]         |
//!
//! ## Logging
//! Everything is logged through `tracing`. Pass a span with `with_span` on the builders to
//! route a component's events under your own span; otherwise a `debug` span is created.
//!
//! ## Example
//! ```rust
//! use taskrelay::{RunnerConfig, TaskError, TaskFn, TaskRunner};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let runner = TaskRunner::new(RunnerConfig::with_max_concurrent_tasks(2));
//!
//!     runner.events().task_error.add_listener(|failure| {
//!         eprintln!("{} failed: {}", failure.task.name(), failure.error);
//!         Ok(())
//!     });
//!
//!     let done = runner.wait_for_completion();
//!     for i in 0..5 {
//!         runner.submit_task(TaskFn::arc(format!("job-{i}"), || async {
//!             Ok::<(), TaskError>(())
//!         }));
//!     }
//!     done.await;
//!     assert!(runner.is_idle());
//! }
//! ```
mod core;
mod debounce;
mod error;
mod events;
mod sync;
mod tasks;

// ---- Public re-exports ----

pub use core::{RunnerBuilder, RunnerConfig, RunnerEvents, TaskRunner};
pub use debounce::{AsyncDebounce, DebounceBuilder, DebounceOptions};
pub use error::{TaskError, TaskFailure};
pub use events::{ListenerHandle, ListenerId, ListenerRegistry};
pub use sync::{Deferred, Resolver, deferred};
pub use tasks::{Task, TaskFn, TaskRef};
