//! # lrucache
//!
//! Fixed-capacity, single-threaded LRU cache.
//!
//! ## Architecture
//! - **HashMap**: AHash index from key to arena slot (O(1))
//! - **LRU List**: Doubly-linked list threaded through the arena by slot index (O(1))
//! - **Eviction**: Exactly one least-recently-used entry leaves per overflowing `set`,
//!   optionally reported to a caller-supplied callback
//!
//! Two key flavours are provided as aliases over the same generic cache:
//! [`StringCache`] and [`U64Cache`].
//!
//! ```
//! use lrucache::U64Cache;
//!
//! let mut cache: U64Cache<&str> = U64Cache::new(2).unwrap();
//! cache.set(1, "one");
//! cache.set(2, "two");
//! cache.set(3, "three");
//!
//! assert_eq!(cache.get(&1), None);
//! assert_eq!(cache.keys().copied().collect::<Vec<_>>(), vec![3, 2]);
//! ```

#![warn(missing_docs)]

mod error;
mod lru;
mod stats;

pub use error::{Error, Result};
pub use lru::{EvictFn, Iter, LruCache};
pub use stats::CacheStats;

/// LRU cache keyed by owned strings; lookups accept `&str`
pub type StringCache<V> = LruCache<String, V>;

/// LRU cache keyed by 64-bit unsigned integers
pub type U64Cache<V> = LruCache<u64, V>;
