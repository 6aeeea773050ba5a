//! Runtime core: bounded task scheduling.
//!
//! The only public API from this module is [`TaskRunner`] with its configuration, builder
//! and event registries.
//!
//! Internal modules:
//! - [`scheduler`]: queue, worker accounting and the public runner handle;
//! - [`worker`]: claims tasks from the shared queue until it is empty;
//! - [`runner`]: executes one task and emits its terminal event;
//! - [`builder`]: injects the logging span;
//! - [`config`]: runner settings.

mod builder;
mod config;
mod runner;
mod scheduler;
mod worker;

pub use builder::RunnerBuilder;
pub use config::RunnerConfig;
pub use scheduler::{RunnerEvents, TaskRunner};
