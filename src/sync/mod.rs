//! Single-assignment result cell shared between a producer and many waiters.

mod deferred;

pub use deferred::{Deferred, Resolver, deferred};
