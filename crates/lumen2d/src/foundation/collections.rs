//! Collections and data structures
//!
//! The central structure here is [`FilterSortCollection`], the
//! order-maintained filtered view the scene uses for its camera,
//! renderable, updateable, and physics registries.

use slotmap::{Key, SecondaryMap};

/// Cached per-member state for a tracked key
#[derive(Debug, Clone, Copy)]
struct Tracked {
    passes: bool,
    sort_key: i32,
    sequence: u64,
}

/// A live, predicate-filtered, order-maintained view over a set of keys.
///
/// The collection tracks every added member but exposes only those whose
/// filter predicate currently holds, in ascending sort-key order with
/// ties broken by insertion order. It does not observe members itself;
/// the owner evaluates the predicate and sort key and delivers a single
/// coalesced [`update`](Self::update) whenever either changes. Each
/// change patches the materialized view incrementally - one removal and
/// one ordered reinsertion, never a full re-sort.
///
/// All operations are total: unknown keys are silently ignored.
#[derive(Debug)]
pub struct FilterSortCollection<K: Key> {
    tracked: SecondaryMap<K, Tracked>,
    visible: Vec<K>,
    next_sequence: u64,
}

impl<K: Key> Default for FilterSortCollection<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key> FilterSortCollection<K> {
    /// Create an empty collection
    pub fn new() -> Self {
        Self {
            tracked: SecondaryMap::new(),
            visible: Vec::new(),
            next_sequence: 0,
        }
    }

    /// Begin tracking a member with its current filter and sort state.
    ///
    /// A member that fails the filter at insertion time is still tracked,
    /// so a later [`update`](Self::update) can surface it. Re-adding a
    /// tracked key behaves like an update.
    pub fn add(&mut self, key: K, passes: bool, sort_key: i32) {
        if self.tracked.contains_key(key) {
            self.update(key, passes, sort_key);
            return;
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;

        self.tracked.insert(
            key,
            Tracked {
                passes,
                sort_key,
                sequence,
            },
        );

        if passes {
            self.insert_visible(key, sort_key, sequence);
        }
    }

    /// Stop tracking a member and drop it from the view
    pub fn remove(&mut self, key: K) {
        let Some(tracked) = self.tracked.get(key).copied() else {
            return;
        };

        if tracked.passes {
            self.remove_visible(key, tracked.sort_key, tracked.sequence);
        }
        self.tracked.remove(key);
    }

    /// Deliver a coalesced filter/sort-key change for a tracked member.
    ///
    /// Unknown keys are ignored. A member whose predicate flipped is
    /// inserted into or removed from the view; a member whose sort key
    /// changed is removed and reinserted at its new position.
    pub fn update(&mut self, key: K, passes: bool, sort_key: i32) {
        let Some(old) = self.tracked.get(key).copied() else {
            return;
        };

        if old.passes == passes && old.sort_key == sort_key {
            return;
        }

        if old.passes {
            self.remove_visible(key, old.sort_key, old.sequence);
        }

        if let Some(tracked) = self.tracked.get_mut(key) {
            tracked.passes = passes;
            tracked.sort_key = sort_key;
        }

        if passes {
            self.insert_visible(key, sort_key, old.sequence);
        }
    }

    /// Whether a member currently appears in the view
    pub fn contains(&self, key: K) -> bool {
        self.tracked.get(key).is_some_and(|t| t.passes)
    }

    /// Whether a member is tracked, visible or not
    pub fn is_tracked(&self, key: K) -> bool {
        self.tracked.contains_key(key)
    }

    /// Number of members currently passing the filter
    pub fn len(&self) -> usize {
        self.visible.len()
    }

    /// Whether no members currently pass the filter
    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    /// Iterate the visible members in sort order
    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        self.visible.iter().copied()
    }

    /// Drop all tracked members
    pub fn clear(&mut self) {
        self.tracked.clear();
        self.visible.clear();
    }

    /// Position in the visible list for a (sort key, sequence) pair
    fn position(&self, sort_key: i32, sequence: u64) -> Result<usize, usize> {
        self.visible.binary_search_by(|probe| {
            let t = self.tracked[*probe];
            (t.sort_key, t.sequence).cmp(&(sort_key, sequence))
        })
    }

    fn insert_visible(&mut self, key: K, sort_key: i32, sequence: u64) {
        // The (sort key, sequence) pair is unique per member, so only the
        // Err position is reachable once the member is out of the list.
        let index = match self.position(sort_key, sequence) {
            Ok(index) | Err(index) => index,
        };
        self.visible.insert(index, key);
    }

    fn remove_visible(&mut self, key: K, sort_key: i32, sequence: u64) {
        if let Ok(index) = self.position(sort_key, sequence) {
            if self.visible[index] == key {
                self.visible.remove(index);
                return;
            }
        }
        // Falls back to a scan if the cached ordering was disturbed.
        self.visible.retain(|k| *k != key);
    }
}
