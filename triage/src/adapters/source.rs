use std::future::Future;
use std::pin::Pin;

use crate::error::AdapterError;
use crate::types::{QuerySpec, Thread, ThreadId};

/// Boxed future returned by [`ThreadSource`] calls.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, AdapterError>> + Send + 'a>>;

/// Mailbox capability the engine is given.
///
/// Implementations wrap a provider API. Calls may be slow or fail; the engine
/// applies its own timeout to each one. `remove_from_inbox` must be
/// idempotent.
pub trait ThreadSource: Send + Sync {
    /// Thread ids matching the query, newest activity first.
    fn list_threads<'a>(&'a self, query: &'a QuerySpec) -> SourceFuture<'a, Vec<ThreadId>>;

    /// All messages of a thread, in provider position order.
    fn get_thread<'a>(&'a self, id: &'a str) -> SourceFuture<'a, Thread>;

    /// Take the thread out of the active inbox view.
    fn remove_from_inbox<'a>(&'a self, id: &'a str) -> SourceFuture<'a, ()>;
}
