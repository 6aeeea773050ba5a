//! Superseding debounce for async functions.
//!
//! - [`AsyncDebounce`] collapses overlapping calls onto one shared [`Deferred`](crate::Deferred)
//! - [`DebounceOptions`] configures the optional cancellable pre-call delay

mod debounce;
mod options;

pub use debounce::{AsyncDebounce, DebounceBuilder};
pub use options::DebounceOptions;
