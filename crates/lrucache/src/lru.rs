//! LRU (Least Recently Used) cache implementation
//!
//! Nodes live in an index arena and the recency list links them by slot
//! index, so promotion and eviction are O(1) without shared ownership.
//!
//! ```text
//!   map: K -> slot
//!
//!   head ──► [slot 3] ◄──► [slot 0] ◄──► [slot 1] ◄── tail
//!             (MRU)                        (LRU)
//! ```

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::iter::FusedIterator;

use ahash::RandomState;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::stats::CacheStats;

/// Upper bound on slots reserved up front; larger caches grow on demand.
const MAX_PREALLOC: usize = 1 << 16;

/// Callback receiving the owned key and value of an evicted entry
pub type EvictFn<K, V> = Box<dyn FnMut(K, V) + Send>;

/// Node in the LRU doubly-linked list
struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

/// LRU cache with fixed capacity.
///
/// Not internally synchronized. Wrap it in a lock when it has to be shared
/// between threads.
///
/// # Example
///
/// ```
/// use lrucache::LruCache;
///
/// let mut cache = LruCache::new(2).unwrap();
/// cache.set("a", 1);
/// cache.set("b", 2);
/// cache.get(&"a");
/// cache.set("c", 3); // evicts "b"
///
/// assert_eq!(cache.get(&"b"), None);
/// assert_eq!(cache.len(), 2);
/// ```
pub struct LruCache<K, V> {
    map: HashMap<K, usize, RandomState>,
    nodes: Vec<Option<Node<K, V>>>,
    head: Option<usize>,
    tail: Option<usize>,
    free_list: Vec<usize>,
    capacity: usize,
    on_evict: Option<EvictFn<K, V>>,
    stats: CacheStats,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a new LRU cache with the given capacity.
    ///
    /// Returns [`Error::InvalidCapacity`] if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::build(capacity, None)
    }

    /// Create a new LRU cache that calls `on_evict` for every entry pushed
    /// out by an overflowing [`set`](Self::set).
    ///
    /// The callback runs after the cache is consistent again and receives
    /// the evicted key and value by value. Explicit removals never call it.
    ///
    /// ```
    /// use std::sync::mpsc;
    /// use lrucache::LruCache;
    ///
    /// let (tx, rx) = mpsc::channel();
    /// let mut cache = LruCache::with_on_evict(1, move |k, _v| {
    ///     tx.send(k).unwrap();
    /// })
    /// .unwrap();
    ///
    /// cache.set(1u64, "one");
    /// cache.set(2u64, "two");
    /// assert_eq!(rx.try_recv(), Ok(1));
    /// ```
    pub fn with_on_evict<F>(capacity: usize, on_evict: F) -> Result<Self>
    where
        F: FnMut(K, V) + Send + 'static,
    {
        Self::build(capacity, Some(Box::new(on_evict)))
    }

    fn build(capacity: usize, on_evict: Option<EvictFn<K, V>>) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity(capacity));
        }

        debug!(capacity, on_evict = on_evict.is_some(), "creating lru cache");

        // `set` links a new entry before evicting, so one spare slot is used.
        let reserve = capacity.saturating_add(1).min(MAX_PREALLOC);

        Ok(Self {
            map: HashMap::with_capacity_and_hasher(reserve, RandomState::new()),
            nodes: Vec::with_capacity(reserve),
            head: None,
            tail: None,
            free_list: Vec::new(),
            capacity,
            on_evict,
            stats: CacheStats::new(),
        })
    }

    /// Get a value from the cache, marking it most recently used
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if let Some(&idx) = self.map.get(key) {
            self.stats.record_hit();
            self.move_to_front(idx);
            self.nodes[idx].as_ref().map(|node| &node.value)
        } else {
            self.stats.record_miss();
            None
        }
    }

    /// Get a value without touching recency or statistics
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let &idx = self.map.get(key)?;
        self.nodes[idx].as_ref().map(|node| &node.value)
    }

    /// Check whether a key is resident without promoting it
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }

    /// Insert or update a key-value pair, marking it most recently used.
    ///
    /// If the insert leaves the cache one entry over capacity, the least
    /// recently used entry is evicted and handed to the eviction callback.
    pub fn set(&mut self, key: K, value: V) {
        if let Some(&idx) = self.map.get(&key) {
            if let Some(node) = &mut self.nodes[idx] {
                node.value = value;
            }
            self.move_to_front(idx);
            self.stats.record_update();
        } else {
            let idx = self.alloc_node(Node {
                key: key.clone(),
                value,
                prev: None,
                next: None,
            });
            self.push_front(idx);
            self.map.insert(key, idx);
            self.stats.record_insert();
        }

        // A single insert overshoots by at most one entry.
        if self.map.len() > self.capacity {
            self.evict();
        }
    }

    /// Remove a key from the cache, returning its value.
    ///
    /// Does not call the eviction callback.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = self.map.remove(key)?;
        self.unlink(idx);
        let node = self.free_node(idx)?;
        self.stats.record_delete();
        trace!(slot = idx, len = self.map.len(), "removed entry");
        Some(node.value)
    }

    /// Remove a key from the cache. No-op if the key is absent.
    pub fn delete<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove(key);
    }

    /// Walk the recency list and index and report the first inconsistency.
    pub fn check_invariants(&self) -> Result<()> {
        let len = self.map.len();
        if len > self.capacity {
            return Err(Error::Invariant(format!(
                "len {} exceeds capacity {}",
                len, self.capacity
            )));
        }
        if self.head.is_none() != self.tail.is_none() || self.head.is_none() != (len == 0) {
            return Err(Error::Invariant(format!(
                "head {:?} / tail {:?} disagree with len {}",
                self.head, self.tail, len
            )));
        }

        let mut prev = None;
        let mut cursor = self.head;
        let mut steps = 0;
        while let Some(idx) = cursor {
            if steps == len {
                return Err(Error::Invariant(format!(
                    "list is longer than the {} indexed keys",
                    len
                )));
            }
            let node = self
                .nodes
                .get(idx)
                .and_then(Option::as_ref)
                .ok_or_else(|| Error::Invariant(format!("list reaches empty slot {}", idx)))?;
            if node.prev != prev {
                return Err(Error::Invariant(format!("slot {} has a stale prev link", idx)));
            }
            if self.map.get(&node.key) != Some(&idx) {
                return Err(Error::Invariant(format!("slot {} is not indexed by its key", idx)));
            }
            prev = Some(idx);
            cursor = node.next;
            steps += 1;
        }

        if steps != len {
            return Err(Error::Invariant(format!(
                "list has {} nodes but {} keys are indexed",
                steps, len
            )));
        }
        if prev != self.tail {
            return Err(Error::Invariant(format!(
                "list ends at {:?} but tail is {:?}",
                prev, self.tail
            )));
        }

        let live = self.nodes.iter().filter(|slot| slot.is_some()).count();
        if live != len || live + self.free_list.len() != self.nodes.len() {
            return Err(Error::Invariant(format!(
                "{} live and {} free slots in an arena of {}",
                live,
                self.free_list.len(),
                self.nodes.len()
            )));
        }

        Ok(())
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return; // Already at front
        }

        self.unlink(idx);
        self.push_front(idx);
    }

    fn push_front(&mut self, idx: usize) {
        let old_head = self.head;

        if let Some(node) = &mut self.nodes[idx] {
            node.prev = None;
            node.next = old_head;
        }

        match old_head {
            Some(head_idx) => {
                if let Some(head) = &mut self.nodes[head_idx] {
                    head.prev = Some(idx);
                }
            }
            None => {
                self.tail = Some(idx);
            }
        }

        self.head = Some(idx);
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = if let Some(node) = &self.nodes[idx] {
            (node.prev, node.next)
        } else {
            return;
        };

        match prev {
            Some(prev_idx) => {
                if let Some(prev_node) = &mut self.nodes[prev_idx] {
                    prev_node.next = next;
                }
            }
            None => {
                self.head = next;
            }
        }

        match next {
            Some(next_idx) => {
                if let Some(next_node) = &mut self.nodes[next_idx] {
                    next_node.prev = prev;
                }
            }
            None => {
                self.tail = prev;
            }
        }

        if let Some(node) = &mut self.nodes[idx] {
            node.prev = None;
            node.next = None;
        }
    }

    fn evict(&mut self) {
        let Some(tail_idx) = self.tail else {
            return;
        };

        self.unlink(tail_idx);
        let Some(node) = self.free_node(tail_idx) else {
            return;
        };
        self.map.remove(&node.key);
        self.stats.record_eviction();
        trace!(slot = tail_idx, len = self.map.len(), "evicted least recently used entry");

        if let Some(on_evict) = self.on_evict.as_mut() {
            on_evict(node.key, node.value);
        }
    }
}

impl<K, V> LruCache<K, V> {
    /// Get the current number of entries
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Get the fixed capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get operation counters
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Reset operation counters
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    /// Drop every entry. The eviction callback is not called.
    pub fn clear(&mut self) {
        self.map.clear();
        self.nodes.clear();
        self.free_list.clear();
        self.head = None;
        self.tail = None;
    }

    /// Iterate over entries from most to least recently used.
    /// Iteration does not change recency.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            nodes: &self.nodes,
            cursor: self.head,
            remaining: self.map.len(),
        }
    }

    /// Iterate over keys from most to least recently used
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(key, _)| key)
    }

    fn alloc_node(&mut self, node: Node<K, V>) -> usize {
        if let Some(idx) = self.free_list.pop() {
            self.nodes[idx] = Some(node);
            idx
        } else {
            self.nodes.push(Some(node));
            self.nodes.len() - 1
        }
    }

    fn free_node(&mut self, idx: usize) -> Option<Node<K, V>> {
        let node = self.nodes[idx].take()?;
        self.free_list.push(idx);
        Some(node)
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct Entries<'a, K, V>(&'a LruCache<K, V>);

        impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Entries<'_, K, V> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_map().entries(self.0.iter()).finish()
            }
        }

        f.debug_struct("LruCache")
            .field("capacity", &self.capacity)
            .field("len", &self.map.len())
            .field("entries", &Entries(self))
            .finish()
    }
}

impl<'a, K, V> IntoIterator for &'a LruCache<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over cache entries, most recently used first
pub struct Iter<'a, K, V> {
    nodes: &'a [Option<Node<K, V>>],
    cursor: Option<usize>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let nodes = self.nodes;
        let node = nodes.get(self.cursor?)?.as_ref()?;
        self.cursor = node.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}
