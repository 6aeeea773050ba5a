//! # Debounce options.
//!
//! ## Sentinel values
//! - `pre_call_delay = 0s` → call the wrapped function right away

use std::time::Duration;

/// Options for an [`AsyncDebounce`](crate::AsyncDebounce) wrapper.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DebounceOptions {
    /// How long to wait before invoking the wrapped function.
    ///
    /// The wait is cancellable: an attempt superseded during the wait never calls the
    /// wrapped function at all.
    pub pre_call_delay: Duration,
}

impl DebounceOptions {
    /// Options with the given pre-call delay.
    pub fn with_pre_call_delay(pre_call_delay: Duration) -> Self {
        Self { pre_call_delay }
    }

    /// Returns the pre-call delay as an `Option`.
    ///
    /// - `None` → no delay
    /// - `Some(d)` → wait `d` before calling
    #[inline]
    pub fn pre_call_delay(&self) -> Option<Duration> {
        if self.pre_call_delay == Duration::ZERO {
            None
        } else {
            Some(self.pre_call_delay)
        }
    }
}
