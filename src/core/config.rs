//! # Task runner configuration.
//!
//! [`RunnerConfig`] centralizes the settings of a [`TaskRunner`](crate::TaskRunner).
//!
//! ## Sentinel values
//! - `max_concurrent_tasks = 0` → clamped to 1 (the bound must be positive)

/// Configuration for a [`TaskRunner`](crate::TaskRunner).
///
/// ## Notes
/// Fields are public for flexibility. Prefer the helper accessors to avoid
/// sprinkling sentinel checks across the codebase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Maximum number of workers running at the same time.
    ///
    /// Each worker runs one task at a time, so this is also the maximum number of tasks in
    /// flight. Extra tasks wait in the queue until a worker claims them.
    pub max_concurrent_tasks: usize,
}

impl RunnerConfig {
    /// Default worker cap.
    pub const DEFAULT_MAX_CONCURRENT_TASKS: usize = 10;

    /// Creates a configuration with the given worker cap.
    pub fn with_max_concurrent_tasks(max_concurrent_tasks: usize) -> Self {
        Self {
            max_concurrent_tasks,
        }
    }

    /// Returns the worker cap clamped to a minimum of 1.
    #[inline]
    pub fn max_concurrent_clamped(&self) -> usize {
        self.max_concurrent_tasks.max(1)
    }
}

impl Default for RunnerConfig {
    /// Default configuration:
    ///
    /// - `max_concurrent_tasks = 10`
    fn default() -> Self {
        Self {
            max_concurrent_tasks: Self::DEFAULT_MAX_CONCURRENT_TASKS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_ten_workers() {
        assert_eq!(RunnerConfig::default().max_concurrent_clamped(), 10);
    }

    #[test]
    fn zero_is_clamped_to_one() {
        let cfg = RunnerConfig::with_max_concurrent_tasks(0);
        assert_eq!(cfg.max_concurrent_clamped(), 1);
    }
}
