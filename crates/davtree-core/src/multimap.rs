//! Key to list-of-values mapping.

use std::collections::BTreeMap;
use std::collections::btree_map;

/// Maps each key to the values inserted under it, in insertion order.
///
/// A key's list is created on its first insertion; keys with no values never
/// appear. Keys iterate in sorted order.
///
/// # Examples
///
/// ```
/// use davtree_core::multimap::Multimap;
///
/// let mut groups = Multimap::new();
/// groups.insert("ankka", "heppa");
/// groups.insert("ankka", "koira");
///
/// assert_eq!(groups.get(&"ankka"), &["heppa", "koira"]);
/// assert!(groups.get(&"kissa").is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Multimap<K, V> {
    inner: BTreeMap<K, Vec<V>>,
}

impl<K: Ord, V> Multimap<K, V> {
    /// Creates an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: BTreeMap::new(),
        }
    }

    /// Appends `value` to the list stored under `key`.
    pub fn insert(&mut self, key: K, value: V) {
        self.inner.entry(key).or_default().push(value);
    }

    /// Returns the values stored under `key`, or an empty slice.
    #[must_use]
    pub fn get(&self, key: &K) -> &[V] {
        self.inner.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns the number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if nothing was inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of values across all keys.
    #[must_use]
    pub fn total(&self) -> usize {
        self.inner.values().map(Vec::len).sum()
    }

    /// Iterates over keys and their value lists.
    pub fn iter(&self) -> btree_map::Iter<'_, K, Vec<V>> {
        self.inner.iter()
    }
}

impl<K: Ord, V> Default for Multimap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, K: Ord, V> IntoIterator for &'a Multimap<K, V> {
    type Item = (&'a K, &'a Vec<V>);
    type IntoIter = btree_map::Iter<'a, K, Vec<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Ord, V> Extend<(K, V)> for Multimap<K, V> {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}
