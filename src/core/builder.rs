use tracing::Span;

use super::{config::RunnerConfig, scheduler::TaskRunner};

/// Builder for constructing a [`TaskRunner`] with an injected logging span.
pub struct RunnerBuilder {
    cfg: RunnerConfig,
    span: Option<Span>,
}

impl RunnerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: RunnerConfig) -> Self {
        Self { cfg, span: None }
    }

    /// Sets the parent span for everything the runner logs.
    ///
    /// Each worker opens a child `worker` span under it. Without this call the runner
    /// creates its own `task_runner` span at `DEBUG` level.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Builds the runner. No worker is spawned until the first task is submitted.
    pub fn build(self) -> TaskRunner {
        let span = self
            .span
            .unwrap_or_else(|| tracing::debug_span!("task_runner"));
        TaskRunner::new_internal(self.cfg, span)
    }
}
