//! Typed synchronous listener registries.
//!
//! ## Contents
//! - [`ListenerRegistry`] ordered listener list with `emit` / `next_event`
//! - [`ListenerHandle`] detaches one listener without knowing the payload type
//! - [`ListenerId`] identity of a registration
//!
//! ## Quick reference
//! - **Publishers**: runner workers (`task_completed`, `task_error`, `all_tasks_completed`).
//! - **Consumers**: application code via [`RunnerEvents`](crate::RunnerEvents), and
//!   `TaskRunner::wait_for_completion` (a one-shot `next_event`).

mod registry;

pub(crate) use registry::Emission;
pub use registry::{ListenerHandle, ListenerId, ListenerRegistry};
