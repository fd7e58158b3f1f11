//! # recache
//!
//! Fixed-capacity key-value cache with least-recently-used eviction.
//!
//! ## Architecture
//! - **Index**: AHash map from key to list handle (O(1) lookup)
//! - **Recency list**: `recency::RecencyList` holding `(key, value)` pairs,
//!   head = least recently used, tail = most recently used
//! - **Eviction**: pops the list head and removes its key from the index
//!
//! `LruCache` is single-threaded. `SharedLruCache` puts one lock around it
//! for callers that need to share a cache between threads.

#![warn(missing_docs)]

mod lru;
mod shared;
mod stats;

pub use lru::LruCache;
pub use recency::{Error, Result};
pub use shared::SharedLruCache;
pub use stats::CacheStats;
