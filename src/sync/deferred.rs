//! # Externally settled future (`Deferred` / `Resolver`).
//!
//! [`deferred`] returns a pair of handles over one shared, initially unsettled slot:
//! - [`Resolver`] settles the slot, either with a value or with an error;
//! - [`Deferred`] observes it. Every clone of a `Deferred` sees the same single outcome,
//!   no matter whether it started waiting before or after settlement.
//!
//! ## Rules
//! - **First settlement wins**: later `resolve`/`reject` calls are silent no-ops and return `false`.
//! - **No cancellation**: a slot that is never settled keeps its observers pending forever.
//! - **Poisoning**: a producer that panics instead of settling poisons the slot; every
//!   observer then re-raises the panic rather than waiting forever.
//! - Outcomes are handed out by clone, hence `T: Clone` and `E: Clone` for waiting.
//!
//! ```text
//!   Resolver ──resolve(v)/reject(e)──► [ watch slot: None → Some(outcome) ] ──► Deferred (clone 1)
//!                                                                         ├──► Deferred (clone 2)
//!                                                                         └──► ...
//! ```
//!
//! ## Example
//! ```rust
//! use taskrelay::deferred;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let (value, resolver) = deferred::<u32, String>();
//!
//!     tokio::spawn(async move {
//!         resolver.resolve(42);
//!     });
//!
//!     assert_eq!(value.await, Ok(42));
//! }
//! ```

use std::fmt;
use std::future::IntoFuture;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::watch;

/// Terminal state of a slot.
#[derive(Clone)]
enum Settled<T, E> {
    Outcome(Result<T, E>),
    /// The producer panicked; carries the rendered panic message.
    Poisoned(Arc<str>),
}

type Slot<T, E> = watch::Sender<Option<Settled<T, E>>>;

/// Creates an unsettled [`Deferred`] and the [`Resolver`] that settles it.
pub fn deferred<T, E>() -> (Deferred<T, E>, Resolver<T, E>) {
    let slot = Arc::new(watch::Sender::new(None));
    (
        Deferred {
            slot: Arc::clone(&slot),
        },
        Resolver { slot },
    )
}

/// Observer side of a settable future.
///
/// Cheap to clone; all clones share one outcome.
pub struct Deferred<T, E> {
    slot: Arc<Slot<T, E>>,
}

/// Capability to settle a [`Deferred`].
///
/// Cheap to clone; whichever clone settles first wins.
pub struct Resolver<T, E> {
    slot: Arc<Slot<T, E>>,
}

impl<T, E> Resolver<T, E> {
    /// Settles the future with `value`.
    ///
    /// Returns `true` if this call settled it, `false` if it was already settled.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Settles the future with `error`.
    ///
    /// Returns `true` if this call settled it, `false` if it was already settled.
    pub fn reject(&self, error: E) -> bool {
        self.settle(Err(error))
    }

    /// Settles the future with a ready-made outcome.
    pub fn settle(&self, outcome: Result<T, E>) -> bool {
        self.store(Settled::Outcome(outcome))
    }

    /// Marks the producer as panicked; observers re-raise the panic with `info`.
    ///
    /// Returns `false` if the future was already settled.
    pub(crate) fn poison(&self, info: impl Into<Arc<str>>) -> bool {
        self.store(Settled::Poisoned(info.into()))
    }

    fn store(&self, settled: Settled<T, E>) -> bool {
        let mut settled = Some(settled);
        self.slot.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = settled.take();
            true
        })
    }

    /// Returns `true` once the future has been settled by any resolver.
    pub fn is_settled(&self) -> bool {
        self.slot.borrow().is_some()
    }
}

impl<T, E> Deferred<T, E> {
    /// Returns `true` once the future has been settled or poisoned.
    pub fn is_settled(&self) -> bool {
        self.slot.borrow().is_some()
    }

    /// Returns `true` if the producer panicked instead of settling.
    pub fn is_poisoned(&self) -> bool {
        matches!(*self.slot.borrow(), Some(Settled::Poisoned(_)))
    }

    /// Returns `true` if both handles observe the same underlying future.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.slot, &b.slot)
    }
}

impl<T: Clone, E: Clone> Deferred<T, E> {
    /// Returns the outcome if already settled, without waiting.
    ///
    /// # Panics
    /// If the future is poisoned.
    pub fn try_outcome(&self) -> Option<Result<T, E>> {
        let current = self.slot.borrow().clone();
        current.map(unpoison)
    }

    /// Waits for the outcome.
    ///
    /// # Panics
    /// If the future is poisoned: the producer's panic is re-raised in every observer.
    pub async fn wait(&self) -> Result<T, E> {
        let mut rx = self.slot.subscribe();
        loop {
            let current = rx.borrow_and_update().clone();
            if let Some(settled) = current {
                return unpoison(settled);
            }
            // The sender lives in `self.slot`, so `changed` cannot report a closed channel
            // while we are waiting; treat it as "never settles" all the same.
            if rx.changed().await.is_err() {
                return std::future::pending().await;
            }
        }
    }
}

fn unpoison<T, E>(settled: Settled<T, E>) -> Result<T, E> {
    match settled {
        Settled::Outcome(outcome) => outcome,
        Settled::Poisoned(info) => panic!("deferred producer panicked: {info}"),
    }
}

impl<T, E> IntoFuture for Deferred<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    type Output = Result<T, E>;
    type IntoFuture = BoxFuture<'static, Result<T, E>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move { self.wait().await })
    }
}

impl<T, E> Clone for Deferred<T, E> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T, E> Clone for Resolver<T, E> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T, E> fmt::Debug for Deferred<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("settled", &self.is_settled())
            .finish()
    }
}

impl<T, E> fmt::Debug for Resolver<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("settled", &self.is_settled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn resolves_all_observers() {
        let (d, r) = deferred::<&'static str, ()>();
        let early = d.clone();
        let waiter = tokio::spawn(async move { early.await });

        tokio::task::yield_now().await;
        assert!(!d.is_settled());
        assert!(r.resolve("done"));

        assert_eq!(waiter.await.unwrap(), Ok("done"));
        // late observer
        assert_eq!(d.clone().await, Ok("done"));
        assert_eq!(d.try_outcome(), Some(Ok("done")));
    }

    #[tokio::test]
    async fn first_settlement_wins() {
        let (d, r) = deferred::<u32, String>();
        assert!(r.resolve(1));
        assert!(!r.resolve(2));
        assert!(!r.reject("late".into()));
        assert_eq!(d.wait().await, Ok(1));
    }

    #[tokio::test]
    async fn reject_is_observed_and_sticky() {
        let (d, r) = deferred::<u32, String>();
        let r2 = r.clone();
        assert!(r2.reject("boom".into()));
        assert!(!r.resolve(7));
        assert!(r.is_settled());
        assert_eq!(d.await, Err("boom".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn unsettled_stays_pending() {
        let (d, _r) = deferred::<(), ()>();
        let res = tokio::time::timeout(Duration::from_secs(1), d.wait()).await;
        assert!(res.is_err());
        assert_eq!(d.try_outcome(), None);
    }

    #[tokio::test]
    async fn settle_accepts_ready_outcome() {
        let (d, r) = deferred::<u8, &'static str>();
        assert!(r.settle(Err("nope")));
        assert!(!r.settle(Ok(1)));
        assert_eq!(d.await, Err("nope"));
    }

    #[tokio::test]
    async fn poisoned_slot_panics_in_every_observer() {
        let (d, r) = deferred::<u32, String>();
        let waiters: Vec<_> = (0..3).map(|_| tokio::spawn(d.clone().into_future())).collect();

        tokio::task::yield_now().await;
        assert!(r.poison("backend crashed"));
        assert!(!r.resolve(1));
        assert!(d.is_settled());
        assert!(d.is_poisoned());

        for waiter in waiters {
            let err = waiter.await.unwrap_err();
            assert!(err.is_panic());
        }
        // late observers are not left pending either
        assert!(tokio::spawn(d.into_future()).await.unwrap_err().is_panic());
    }

    #[test]
    fn poison_after_settlement_is_ignored() {
        let (d, r) = deferred::<u32, String>();
        assert!(r.resolve(5));
        assert!(!r.poison("too late"));
        assert!(!d.is_poisoned());
        assert_eq!(d.try_outcome(), Some(Ok(5)));
    }

    #[test]
    fn identity_follows_shared_state() {
        let (a, _) = deferred::<(), ()>();
        let (b, _) = deferred::<(), ()>();
        assert!(Deferred::ptr_eq(&a, &a.clone()));
        assert!(!Deferred::ptr_eq(&a, &b));
    }
}
