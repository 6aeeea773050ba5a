//! # Task abstractions.
//!
//! - [`Task`] - trait for implementing async tasks
//! - [`TaskFn`] - function-based task implementation
//! - [`TaskRef`] - shared reference to a task (`Arc<dyn Task>`)

mod task;
mod task_fn;

pub use task::{Task, TaskRef};
pub use task_fn::TaskFn;
