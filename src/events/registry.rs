//! # Typed listener registry.
//!
//! [`ListenerRegistry<T>`] is an ordered list of callbacks for **one** kind of event.
//! Components own one registry per event instead of sharing a stringly-typed emitter,
//! so every payload is statically typed.
//!
//! ## Rules
//! - Listeners run in list order: `add_listener` appends, `prepend_listener` inserts at the front
//!   (the most recently prepended listener runs first).
//! - `emit` runs synchronously and sequentially over the listeners registered when it starts.
//! - The first listener error stops the emission and is returned to the caller (fail-fast);
//!   later listeners are not invoked for that emission.
//! - `once` listeners are detached **before** they run, so they fire at most once even when
//!   emissions overlap.
//! - Unregistering is idempotent.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use taskrelay::ListenerRegistry;
//!
//! let clicks = ListenerRegistry::<u32>::new();
//! let seen = Arc::new(AtomicUsize::new(0));
//!
//! let counter = Arc::clone(&seen);
//! let handle = clicks.add_listener(move |n: &u32| {
//!     counter.fetch_add(*n as usize, Ordering::SeqCst);
//!     Ok(())
//! });
//!
//! clicks.emit(&2).unwrap();
//! handle.unregister();
//! clicks.emit(&5).unwrap();
//!
//! assert_eq!(seen.load(Ordering::SeqCst), 2);
//! ```

use std::convert::Infallible;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use futures::future::BoxFuture;
use parking_lot::Mutex;

use crate::sync::deferred;

/// Shared listener callback.
type Listener<T> = Arc<dyn Fn(&T) -> anyhow::Result<()> + Send + Sync>;

/// Identifies one registration inside a [`ListenerRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Entry<T> {
    id: ListenerId,
    listener: Listener<T>,
}

struct Shared<T> {
    listeners: Mutex<Vec<Entry<T>>>,
    next_id: AtomicU64,
}

impl<T> Shared<T> {
    fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        match listeners.iter().position(|e| e.id == id) {
            Some(idx) => {
                listeners.remove(idx);
                true
            }
            None => false,
        }
    }
}

/// Type-erased detach hook so [`ListenerHandle`] does not carry the payload type.
trait Detach: Send + Sync {
    fn detach(&self, id: ListenerId);
}

impl<T: 'static> Detach for Shared<T> {
    fn detach(&self, id: ListenerId) {
        self.remove(id);
    }
}

/// Token returned by every registration; [`unregister`](Self::unregister) removes it.
///
/// Dropping the handle does **not** unregister the listener.
pub struct ListenerHandle {
    id: ListenerId,
    source: Weak<dyn Detach>,
}

impl ListenerHandle {
    /// Identifier of the registration.
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Removes the listener. Calling it again, or after the listener is gone, is a no-op.
    pub fn unregister(&self) {
        if let Some(source) = self.source.upgrade() {
            source.detach(self.id);
        }
    }
}

impl fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHandle").field("id", &self.id).finish()
    }
}

/// Ordered multi-listener event source for payloads of type `T`.
pub struct ListenerRegistry<T> {
    shared: Arc<Shared<T>>,
}

impl<T: 'static> ListenerRegistry<T> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                listeners: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Appends a listener.
    pub fn add_listener<F>(&self, f: F) -> ListenerHandle
    where
        F: Fn(&T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.insert(id, Arc::new(f), false)
    }

    /// Inserts a listener in front of every other one.
    pub fn prepend_listener<F>(&self, f: F) -> ListenerHandle
    where
        F: Fn(&T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.insert(id, Arc::new(f), true)
    }

    /// Appends a listener that is invoked at most once.
    pub fn once<F>(&self, f: F) -> ListenerHandle
    where
        F: Fn(&T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = self.next_id();
        let listener = self.once_wrapper(id, f);
        self.insert(id, listener, false)
    }

    /// Like [`once`](Self::once) but inserts the listener at the front.
    pub fn prepend_once_listener<F>(&self, f: F) -> ListenerHandle
    where
        F: Fn(&T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = self.next_id();
        let listener = self.once_wrapper(id, f);
        self.insert(id, listener, true)
    }

    /// Alias of [`add_listener`](Self::add_listener).
    pub fn on<F>(&self, f: F) -> ListenerHandle
    where
        F: Fn(&T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.add_listener(f)
    }

    /// Removes the registration with `id`. Returns `false` if it was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.shared.remove(id)
    }

    /// Alias of [`remove_listener`](Self::remove_listener).
    pub fn off(&self, id: ListenerId) -> bool {
        self.remove_listener(id)
    }

    /// Removes every listener.
    pub fn remove_all_listeners(&self) {
        self.shared.listeners.lock().clear();
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.shared.listeners.lock().len()
    }

    /// True if no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.shared.listeners.lock().is_empty()
    }

    /// Invokes every registered listener with `payload`, front to back.
    ///
    /// The listener list is snapshotted before the first call, so listeners may register or
    /// unregister others while running; such changes take effect from the next emission.
    pub fn emit(&self, payload: &T) -> anyhow::Result<()> {
        self.snapshot().run(payload)
    }

    /// Captures the current listener list for a later [`Emission::run`].
    ///
    /// Lets a caller fix the set of recipients inside its own critical section and invoke
    /// them after leaving it.
    pub(crate) fn snapshot(&self) -> Emission<T> {
        let listeners = self
            .shared
            .listeners
            .lock()
            .iter()
            .map(|e| Arc::clone(&e.listener))
            .collect();
        Emission { listeners }
    }

    fn next_id(&self) -> ListenerId {
        ListenerId(self.shared.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn insert(&self, id: ListenerId, listener: Listener<T>, front: bool) -> ListenerHandle {
        {
            let mut listeners = self.shared.listeners.lock();
            let entry = Entry { id, listener };
            if front {
                listeners.insert(0, entry);
            } else {
                listeners.push(entry);
            }
        }

        let source: Arc<dyn Detach> = self.shared.clone();
        ListenerHandle {
            id,
            source: Arc::downgrade(&source),
        }
    }

    fn once_wrapper<F>(&self, id: ListenerId, f: F) -> Listener<T>
    where
        F: Fn(&T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let fired = AtomicBool::new(false);
        let registry = Arc::downgrade(&self.shared);
        Arc::new(move |payload: &T| {
            if fired.swap(true, Ordering::SeqCst) {
                return Ok(());
            }
            if let Some(shared) = registry.upgrade() {
                shared.remove(id);
            }
            f(payload)
        })
    }
}

impl<T: Clone + Send + Sync + 'static> ListenerRegistry<T> {
    /// Returns a future that completes with the payload of the next emission.
    ///
    /// The underlying `once` listener is registered right away, so emissions that happen
    /// after this call and before the first poll are not missed.
    pub fn next_event(&self) -> BoxFuture<'static, T> {
        let (next, resolver) = deferred::<T, Infallible>();
        self.once(move |payload: &T| {
            resolver.resolve(payload.clone());
            Ok(())
        });
        Box::pin(async move {
            match next.wait().await {
                Ok(payload) => payload,
                Err(never) => match never {},
            }
        })
    }
}

/// Listeners captured by [`ListenerRegistry::snapshot`], not yet invoked.
pub(crate) struct Emission<T> {
    listeners: Vec<Listener<T>>,
}

impl<T> Emission<T> {
    /// Invokes the captured listeners front to back; stops at the first error.
    pub(crate) fn run(self, payload: &T) -> anyhow::Result<()> {
        for listener in self.listeners {
            listener(payload)?;
        }
        Ok(())
    }
}

impl<T: 'static> Default for ListenerRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ListenerRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.shared.listeners.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    type TestListener = Box<dyn Fn(&bool) -> anyhow::Result<()> + Send + Sync>;

    fn counter() -> (Arc<AtomicUsize>, TestListener) {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let listener: TestListener = Box::new(move |_: &bool| {
            h.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        (hits, listener)
    }

    fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, tag: &'static str) -> TestListener {
        let log = Arc::clone(log);
        Box::new(move |_: &bool| {
            log.lock().push(tag);
            Ok(())
        })
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let es = ListenerRegistry::<bool>::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        es.add_listener(recorder(&log, "a"));
        es.add_listener(recorder(&log, "b"));
        es.prepend_listener(recorder(&log, "first"));
        es.prepend_listener(recorder(&log, "very-first"));

        es.emit(&true).unwrap();
        assert_eq!(*log.lock(), vec!["very-first", "first", "a", "b"]);
    }

    #[test]
    fn prepended_listener_sees_no_prior_invocations() {
        let es = ListenerRegistry::<bool>::new();
        let (hits, listener) = counter();
        es.add_listener(listener);

        let observed = Arc::clone(&hits);
        let checked = Arc::new(AtomicBool::new(false));
        let c = Arc::clone(&checked);
        es.prepend_listener(move |_: &bool| {
            assert_eq!(observed.load(Ordering::SeqCst), 0);
            c.store(true, Ordering::SeqCst);
            Ok(())
        });

        es.emit(&true).unwrap();
        assert!(checked.load(Ordering::SeqCst));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unregister_is_idempotent() {
        let es = ListenerRegistry::<bool>::new();
        let (hits1, l1) = counter();
        let (hits2, l2) = counter();
        es.add_listener(l1);
        let handle = es.add_listener(l2);

        es.emit(&true).unwrap();
        handle.unregister();
        handle.unregister();
        assert!(!es.remove_listener(handle.id()));
        es.emit(&true).unwrap();

        assert_eq!(hits1.load(Ordering::SeqCst), 2);
        assert_eq!(hits2.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn remove_listener_by_id() {
        let es = ListenerRegistry::<bool>::new();
        let (hits, l) = counter();
        let handle = es.add_listener(l);

        assert!(es.remove_listener(handle.id()));
        es.emit(&true).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(es.is_empty());
    }

    #[test]
    fn on_and_off_mirror_add_and_remove() {
        let es = ListenerRegistry::<bool>::new();
        let (hits, l) = counter();
        let handle = es.on(l);

        es.emit(&true).unwrap();
        assert!(es.off(handle.id()));
        assert!(!es.off(handle.id()));
        es.emit(&true).unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn snapshot_ignores_later_registrations() {
        let es = ListenerRegistry::<bool>::new();
        let (early, l1) = counter();
        es.add_listener(l1);

        let emission = es.snapshot();
        let (late, l2) = counter();
        es.add_listener(l2);
        emission.run(&true).unwrap();

        assert_eq!(early.load(Ordering::SeqCst), 1);
        assert_eq!(late.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn once_fires_a_single_time() {
        let es = ListenerRegistry::<bool>::new();
        let (hits, l) = counter();
        let (front_hits, front) = counter();
        es.once(l);
        es.prepend_once_listener(front);
        assert_eq!(es.listener_count(), 2);

        for _ in 0..3 {
            es.emit(&true).unwrap();
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(front_hits.load(Ordering::SeqCst), 1);
        assert!(es.is_empty());
    }

    #[test]
    fn failing_listener_stops_emission() {
        let es = ListenerRegistry::<bool>::new();
        let (before, l1) = counter();
        let (after, l2) = counter();
        es.add_listener(l1);
        es.add_listener(|_: &bool| Err(anyhow::anyhow!("listener exploded")));
        es.add_listener(l2);

        let err = es.emit(&true).unwrap_err();
        assert_eq!(err.to_string(), "listener exploded");
        assert_eq!(before.load(Ordering::SeqCst), 1);
        assert_eq!(after.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn remove_all_clears_registry() {
        let es = ListenerRegistry::<bool>::new();
        let (hits1, l1) = counter();
        let (hits2, l2) = counter();
        es.add_listener(l1);
        es.add_listener(l2);
        es.emit(&true).unwrap();

        es.remove_all_listeners();
        es.emit(&true).unwrap();

        assert_eq!(hits1.load(Ordering::SeqCst), 1);
        assert_eq!(hits2.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handle_outliving_registry_is_harmless() {
        let es = ListenerRegistry::<bool>::new();
        let handle = es.add_listener(|_: &bool| Ok(()));
        drop(es);
        handle.unregister();
    }

    #[tokio::test]
    async fn next_event_yields_following_payload() {
        let es = ListenerRegistry::<u32>::new();
        let next = es.next_event();

        es.emit(&7).unwrap();
        es.emit(&8).unwrap();

        assert_eq!(next.await, 7);
        assert!(es.is_empty());
    }
}
