//! Uniform sorted-map interface implemented by every structure in the
//! crate, so callers (and the model tests) can swap them freely.

use crate::byte_map::ByteMap;
use crate::error::Result;
use crate::louds_trie::LoudsTrie;
use crate::x_fast_trie::XFastTrie;
use crate::y_fast_trie::YFastTrie;

/// Sorted map over byte-string keys with strict predecessor/successor
/// search.
///
/// `predecessor` and `successor` never return the probe key itself; a
/// query with no answer fails with [`Error::NotFound`]. Fixed-width
/// implementations reject mutations with keys of the wrong length via
/// [`Error::InvalidKeyLength`].
///
/// [`Error::NotFound`]: crate::error::Error::NotFound
/// [`Error::InvalidKeyLength`]: crate::error::Error::InvalidKeyLength
pub trait OrderedMap<V> {
    /// Insert, returning the previous value if the key was present.
    fn insert(&mut self, key: &[u8], value: V) -> Result<Option<V>>;

    /// Remove, returning the value if the key was present.
    fn remove(&mut self, key: &[u8]) -> Result<Option<V>>;

    /// Exact lookup.
    fn get(&self, key: &[u8]) -> Option<&V>;

    /// Largest stored key strictly below `key`.
    fn predecessor(&self, key: &[u8]) -> Result<(Vec<u8>, &V)>;

    /// Smallest stored key strictly above `key`.
    fn successor(&self, key: &[u8]) -> Result<(Vec<u8>, &V)>;

    fn min(&self) -> Option<(Vec<u8>, &V)>;

    fn max(&self) -> Option<(Vec<u8>, &V)>;

    /// Entries in ascending key order.
    fn iter(&self) -> Box<dyn Iterator<Item = (Vec<u8>, &V)> + '_>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V> OrderedMap<V> for XFastTrie<V> {
    fn insert(&mut self, key: &[u8], value: V) -> Result<Option<V>> {
        XFastTrie::insert(self, key, value)
    }

    fn remove(&mut self, key: &[u8]) -> Result<Option<V>> {
        XFastTrie::remove(self, key)
    }

    fn get(&self, key: &[u8]) -> Option<&V> {
        XFastTrie::get(self, key)
    }

    fn predecessor(&self, key: &[u8]) -> Result<(Vec<u8>, &V)> {
        XFastTrie::predecessor(self, key)
    }

    fn successor(&self, key: &[u8]) -> Result<(Vec<u8>, &V)> {
        XFastTrie::successor(self, key)
    }

    fn min(&self) -> Option<(Vec<u8>, &V)> {
        XFastTrie::min(self)
    }

    fn max(&self) -> Option<(Vec<u8>, &V)> {
        XFastTrie::max(self)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = (Vec<u8>, &V)> + '_> {
        Box::new(XFastTrie::iter(self))
    }

    fn len(&self) -> usize {
        XFastTrie::len(self)
    }
}

impl<V> OrderedMap<V> for YFastTrie<V> {
    fn insert(&mut self, key: &[u8], value: V) -> Result<Option<V>> {
        YFastTrie::insert(self, key, value)
    }

    fn remove(&mut self, key: &[u8]) -> Result<Option<V>> {
        YFastTrie::remove(self, key)
    }

    fn get(&self, key: &[u8]) -> Option<&V> {
        YFastTrie::get(self, key)
    }

    fn predecessor(&self, key: &[u8]) -> Result<(Vec<u8>, &V)> {
        YFastTrie::predecessor(self, key)
    }

    fn successor(&self, key: &[u8]) -> Result<(Vec<u8>, &V)> {
        YFastTrie::successor(self, key)
    }

    fn min(&self) -> Option<(Vec<u8>, &V)> {
        YFastTrie::min(self)
    }

    fn max(&self) -> Option<(Vec<u8>, &V)> {
        YFastTrie::max(self)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = (Vec<u8>, &V)> + '_> {
        Box::new(YFastTrie::iter(self))
    }

    fn len(&self) -> usize {
        YFastTrie::len(self)
    }
}

impl<V> OrderedMap<V> for ByteMap<V> {
    fn insert(&mut self, key: &[u8], value: V) -> Result<Option<V>> {
        Ok(ByteMap::insert(self, key, value))
    }

    fn remove(&mut self, key: &[u8]) -> Result<Option<V>> {
        Ok(ByteMap::remove(self, key))
    }

    fn get(&self, key: &[u8]) -> Option<&V> {
        ByteMap::get(self, key)
    }

    fn predecessor(&self, key: &[u8]) -> Result<(Vec<u8>, &V)> {
        ByteMap::predecessor(self, key)
    }

    fn successor(&self, key: &[u8]) -> Result<(Vec<u8>, &V)> {
        ByteMap::successor(self, key)
    }

    fn min(&self) -> Option<(Vec<u8>, &V)> {
        ByteMap::min(self)
    }

    fn max(&self) -> Option<(Vec<u8>, &V)> {
        ByteMap::max(self)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = (Vec<u8>, &V)> + '_> {
        Box::new(ByteMap::iter(self))
    }

    fn len(&self) -> usize {
        ByteMap::len(self)
    }
}

impl<V> OrderedMap<V> for LoudsTrie<V> {
    fn insert(&mut self, key: &[u8], value: V) -> Result<Option<V>> {
        Ok(LoudsTrie::insert(self, key, value))
    }

    fn remove(&mut self, key: &[u8]) -> Result<Option<V>> {
        Ok(LoudsTrie::remove(self, key))
    }

    fn get(&self, key: &[u8]) -> Option<&V> {
        LoudsTrie::get(self, key)
    }

    fn predecessor(&self, key: &[u8]) -> Result<(Vec<u8>, &V)> {
        LoudsTrie::predecessor(self, key)
    }

    fn successor(&self, key: &[u8]) -> Result<(Vec<u8>, &V)> {
        LoudsTrie::successor(self, key)
    }

    fn min(&self) -> Option<(Vec<u8>, &V)> {
        LoudsTrie::min(self)
    }

    fn max(&self) -> Option<(Vec<u8>, &V)> {
        LoudsTrie::max(self)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = (Vec<u8>, &V)> + '_> {
        Box::new(LoudsTrie::iter(self))
    }

    fn len(&self) -> usize {
        LoudsTrie::len(self)
    }
}
