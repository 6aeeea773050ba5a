//! # AsyncDebounce: latest-call-wins wrapper for async functions.
//!
//! Wraps `f(token, args) -> Future<Output = Result<T, E>>` so that overlapping calls collapse
//! onto one shared [`Deferred`] and only a current attempt may settle it.
//!
//! ## Flow of one `call(args)`
//! ```text
//! lock state
//!   ├─► cancel previous attempt's token (if any)
//!   ├─► reuse the outstanding Deferred, or create a new one
//!   └─► record a fresh attempt { seq, token } as current
//! unlock, return the shared Deferred
//!
//! spawned attempt:
//!   ├─► [pre_call_delay] sleep, or bail out if cancelled meanwhile
//!   ├─► bail out if cancelled
//!   ├─► outcome = f(token, args).await   (panics caught)
//!   └─► lock state: still current and not cancelled?
//!          ├─ yes → reset state, settle Deferred with outcome (or poison it on panic)
//!          └─ no  → drop outcome silently
//! ```
//!
//! ## Rules
//! - Calls made while a result is outstanding all get the **same** `Deferred`.
//! - Each call cancels its predecessor; cancellation is cooperative and only marks the
//!   attempt as stale, the wrapped future keeps running unless it checks the token.
//! - Exactly one outcome reaches the shared `Deferred`; stale successes and stale errors
//!   are dropped without surfacing anywhere.
//! - Once settled, the state resets: the next call starts a new cycle with a new `Deferred`.
//! - A panic in the current attempt poisons the shared `Deferred` (observers re-raise it)
//!   and resets the state like any other outcome.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskrelay::AsyncDebounce;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let search = AsyncDebounce::new(|_token: CancellationToken, query: &'static str| async move {
//!         // shorter queries are slower to answer
//!         tokio::time::sleep(Duration::from_millis(50 - query.len() as u64)).await;
//!         Ok::<_, String>(format!("results for {query}"))
//!     });
//!
//!     let first = search.call("he");
//!     let latest = search.call("hello world");
//!
//!     assert!(taskrelay::Deferred::ptr_eq(&first, &latest));
//!     assert_eq!(latest.await, Ok("results for hello world".to_string()));
//! }
//! ```

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span};

use crate::debounce::options::DebounceOptions;
use crate::error::panic_message;
use crate::sync::{Deferred, Resolver, deferred};

/// The attempt allowed to settle the shared output.
struct Attempt {
    seq: u64,
    token: CancellationToken,
}

/// Per-wrapper state: at most one outstanding output and one current attempt.
struct State<T, E> {
    output: Option<(Deferred<T, E>, Resolver<T, E>)>,
    current: Option<Attempt>,
    next_seq: u64,
}

impl<T, E> Default for State<T, E> {
    fn default() -> Self {
        Self {
            output: None,
            current: None,
            next_seq: 0,
        }
    }
}

struct Inner<F, T, E> {
    f: F,
    opts: DebounceOptions,
    state: Mutex<State<T, E>>,
    span: Span,
}

/// What an attempt produced: the wrapped function's outcome, or the message of its panic.
type Attempted<T, E> = Result<Result<T, E>, String>;

impl<F, T, E> Inner<F, T, E> {
    /// Forwards `outcome` if attempt `seq` is still current, then resets the state.
    fn finish(&self, seq: u64, token: &CancellationToken, outcome: Attempted<T, E>) {
        let resolver = {
            let mut state = self.state.lock();
            let is_current = state.current.as_ref().is_some_and(|a| a.seq == seq);
            if !is_current || token.is_cancelled() {
                if let Err(info) = &outcome {
                    tracing::warn!(attempt = seq, panic = %info, "superseded attempt panicked");
                }
                tracing::debug!(attempt = seq, "discarding result of superseded attempt");
                return;
            }
            state.current = None;
            state.output.take().map(|(_, resolver)| resolver)
        };

        let Some(resolver) = resolver else {
            return;
        };
        match outcome {
            Ok(outcome) => {
                tracing::debug!(attempt = seq, ok = outcome.is_ok(), "settling debounced call");
                resolver.settle(outcome);
            }
            Err(info) => {
                tracing::error!(attempt = seq, panic = %info, "debounced call panicked");
                resolver.poison(info);
            }
        }
    }
}

/// Superseding debounce wrapper around an async function.
///
/// Cloning is cheap and yields another handle to the same wrapper state.
/// Must be used from within a tokio runtime: attempts are spawned with `tokio::spawn`.
pub struct AsyncDebounce<F, T, E> {
    inner: Arc<Inner<F, T, E>>,
}

impl<F, T, E> AsyncDebounce<F, T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    F: Send + Sync + 'static,
{
    /// Wraps `f` with default options (no pre-call delay).
    pub fn new<A, Fut>(f: F) -> Self
    where
        F: Fn(CancellationToken, A) -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self::builder::<A, Fut>(f).build()
    }

    /// Wraps `f` with the given options.
    pub fn with_options<A, Fut>(f: F, opts: DebounceOptions) -> Self
    where
        F: Fn(CancellationToken, A) -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self::builder::<A, Fut>(f).options(opts).build()
    }

    /// Returns a builder, e.g. to inject a logging span.
    pub fn builder<A, Fut>(f: F) -> DebounceBuilder<F, T, E>
    where
        F: Fn(CancellationToken, A) -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        DebounceBuilder {
            f,
            opts: DebounceOptions::default(),
            span: None,
            _out: PhantomData,
        }
    }

    /// Starts an attempt with `args` and returns the shared output.
    ///
    /// Supersedes the previous attempt, if any. Returns in the same poll; the wrapped
    /// function runs on a spawned task.
    pub fn call<A, Fut>(&self, args: A) -> Deferred<T, E>
    where
        F: Fn(CancellationToken, A) -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        A: Send + 'static,
    {
        let (output, seq, token) = {
            let mut state = self.inner.state.lock();
            if let Some(prev) = state.current.take() {
                tracing::debug!(parent: &self.inner.span, attempt = prev.seq, "superseding attempt");
                prev.token.cancel();
            }

            let (output, _) = state.output.get_or_insert_with(deferred);
            let output = output.clone();

            state.next_seq += 1;
            let seq = state.next_seq;
            let token = CancellationToken::new();
            state.current = Some(Attempt {
                seq,
                token: token.clone(),
            });
            (output, seq, token)
        };

        let inner = Arc::clone(&self.inner);
        let span = tracing::debug_span!(parent: &self.inner.span, "attempt", seq);
        tokio::spawn(
            async move {
                if let Some(delay) = inner.opts.pre_call_delay() {
                    if !sleep_unless_cancelled(delay, &token).await {
                        tracing::trace!("cancelled during pre-call delay");
                        return;
                    }
                }
                if token.is_cancelled() {
                    return;
                }

                let call_token = token.clone();
                let outcome = AssertUnwindSafe(async { (inner.f)(call_token, args).await })
                    .catch_unwind()
                    .await
                    .map_err(|panic| panic_message(panic.as_ref()));
                inner.finish(seq, &token, outcome);
            }
            .instrument(span),
        );

        output
    }

    /// True while a shared output is outstanding.
    pub fn is_pending(&self) -> bool {
        self.inner.state.lock().output.is_some()
    }

    /// Options the wrapper was built with.
    pub fn options(&self) -> &DebounceOptions {
        &self.inner.opts
    }
}

/// Sleeps for `delay`; returns `false` if `token` was cancelled first.
async fn sleep_unless_cancelled(delay: Duration, token: &CancellationToken) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(delay) => true,
        _ = token.cancelled() => false,
    }
}

impl<F, T, E> Clone for AsyncDebounce<F, T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F, T, E> fmt::Debug for AsyncDebounce<F, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("AsyncDebounce")
            .field("opts", &self.inner.opts)
            .field("pending", &state.output.is_some())
            .field("current_attempt", &state.current.as_ref().map(|a| a.seq))
            .finish()
    }
}

/// Builder for [`AsyncDebounce`].
pub struct DebounceBuilder<F, T, E> {
    f: F,
    opts: DebounceOptions,
    span: Option<Span>,
    _out: PhantomData<fn() -> (T, E)>,
}

impl<F, T, E> DebounceBuilder<F, T, E> {
    /// Replaces all options.
    pub fn options(mut self, opts: DebounceOptions) -> Self {
        self.opts = opts;
        self
    }

    /// Sets the cancellable delay before each call of the wrapped function.
    pub fn pre_call_delay(mut self, delay: Duration) -> Self {
        self.opts.pre_call_delay = delay;
        self
    }

    /// Sets the parent span for everything the wrapper logs.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Builds the wrapper.
    pub fn build(self) -> AsyncDebounce<F, T, E> {
        let span = self
            .span
            .unwrap_or_else(|| tracing::debug_span!("async_debounce"));
        AsyncDebounce {
            inner: Arc::new(Inner {
                f: self.f,
                opts: self.opts,
                state: Mutex::new(State::default()),
                span,
            }),
        }
    }
}
