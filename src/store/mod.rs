//! Key-value store primitives the queue is built on.
//!
//! Lists follow Redis orientation: [`Store::push`] adds at the head and the
//! oldest entry sits at the tail. Everything the cleaner and workers do to
//! shared state is one of these operations, each atomic at the store.

pub mod memory;
pub mod redis;

use std::future::Future;
use std::time::Duration;

use crate::error::Result;

pub use memory::MemoryStore;
pub use self::redis::RedisStore;

pub trait Store: Clone + Send + Sync + 'static {
    /// All members of a set, in no particular order.
    fn set_members(&self, set: &str) -> impl Future<Output = Result<Vec<String>>> + Send;

    fn add_to_set(&self, set: &str, member: &str) -> impl Future<Output = Result<()>> + Send;

    /// Remove a member. Returns whether it was present.
    fn remove_from_set(&self, set: &str, member: &str)
    -> impl Future<Output = Result<bool>> + Send;

    fn key_exists(&self, key: &str) -> impl Future<Output = Result<bool>> + Send;

    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Set a string value that disappears after `ttl`.
    fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Delete a key of any kind. Returns whether it existed.
    fn delete(&self, key: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Push onto the head of a list. Returns the new length.
    fn push(&self, list: &str, value: &str) -> impl Future<Output = Result<usize>> + Send;

    /// Atomically pop the oldest entry (tail) of `source` and push it onto
    /// the head of `destination`. `None` when `source` is empty.
    fn move_oldest(
        &self,
        source: &str,
        destination: &str,
    ) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Remove the first occurrence of `value` from a list, scanning from the
    /// head. Returns the number removed (0 or 1).
    fn remove_from_list(
        &self,
        list: &str,
        value: &str,
    ) -> impl Future<Output = Result<usize>> + Send;

    fn list_len(&self, list: &str) -> impl Future<Output = Result<usize>> + Send;

    /// Entries of a list from head to tail.
    fn list_items(&self, list: &str) -> impl Future<Output = Result<Vec<String>>> + Send;
}
