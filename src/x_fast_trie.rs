//! X-fast trie: hash-indexed bitwise trie with O(log log U) predecessor
//! and successor queries over fixed-width byte-string keys.

use dashmap::DashMap;

use crate::error::{Error, Result};
use crate::utils::{decode_fixed, encode_fixed, longest_common_prefix_length};

type LeafId = u32;

/// Descendant pointer stored at an internal trie node.
///
/// A node with keys under only one child keeps a finger to the extreme leaf
/// of that populated subtree; a node with keys under both children needs no
/// finger at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Finger {
    /// Both subtrees are populated.
    Both,
    /// Only the 0-subtree is populated; points at its maximum leaf.
    ZeroMax(LeafId),
    /// Only the 1-subtree is populated; points at its minimum leaf.
    OneMin(LeafId),
}

#[derive(Debug)]
struct Leaf<V> {
    key: u64,
    value: V,
    prev: Option<LeafId>,
    next: Option<LeafId>,
}

/// X-fast trie over `width`-byte keys (1..=8 bytes).
///
/// One hash table per prefix length holds the internal nodes; a final table
/// maps full keys to leaves. Leaves live in an arena and form a doubly
/// linked list in key order, so a lookup lands either on the exact leaf or
/// on a finger one list-step away from the answer.
#[derive(Debug)]
pub struct XFastTrie<V> {
    // levels[d - 1] holds the nodes whose prefix is d bits long, for
    // d in 1..no_bits; depth 0 is `root`, depth no_bits is `keys`.
    levels: Vec<DashMap<u64, Finger>>,
    keys: DashMap<u64, LeafId>,
    root: Option<Finger>,
    leaves: Vec<Option<Leaf<V>>>,
    free: Vec<LeafId>,
    head: Option<LeafId>,
    tail: Option<LeafId>,
    width: usize,
    no_bits: usize,
    len: usize,
}

impl<V> XFastTrie<V> {
    /// New trie over keys of exactly `width` bytes.
    ///
    /// # Panics
    /// If `width` is 0 or greater than 8.
    pub fn new(width: usize) -> Self {
        assert!(
            (1..=8).contains(&width),
            "key width must be between 1 and 8 bytes"
        );
        let no_bits = width * 8;
        Self {
            levels: (1..no_bits).map(|_| DashMap::new()).collect(),
            keys: DashMap::new(),
            root: None,
            leaves: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            width,
            no_bits,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Key width in bytes.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Insert, returning the previous value if the key was present.
    pub fn insert(&mut self, key: &[u8], value: V) -> Result<Option<V>> {
        let key = decode_fixed(key, self.width)?;
        Ok(self.insert_u64(key, value))
    }

    /// Remove, returning the value if the key was present.
    pub fn remove(&mut self, key: &[u8]) -> Result<Option<V>> {
        let key = decode_fixed(key, self.width)?;
        Ok(self.remove_u64(key))
    }

    /// Exact lookup. Keys of the wrong width match nothing.
    pub fn get(&self, key: &[u8]) -> Option<&V> {
        let key = decode_fixed(key, self.width).ok()?;
        self.get_u64(key)
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Largest stored key strictly below `key`.
    pub fn predecessor(&self, key: &[u8]) -> Result<(Vec<u8>, &V)> {
        let key = decode_fixed(key, self.width)?;
        let id = self.predecessor_u64(key).ok_or(Error::NotFound)?;
        Ok(self.entry(id))
    }

    /// Smallest stored key strictly above `key`.
    pub fn successor(&self, key: &[u8]) -> Result<(Vec<u8>, &V)> {
        let key = decode_fixed(key, self.width)?;
        let id = self.successor_u64(key).ok_or(Error::NotFound)?;
        Ok(self.entry(id))
    }

    pub fn min(&self) -> Option<(Vec<u8>, &V)> {
        self.head.map(|id| self.entry(id))
    }

    pub fn max(&self) -> Option<(Vec<u8>, &V)> {
        self.tail.map(|id| self.entry(id))
    }

    /// Entries in ascending key order, walking the leaf list.
    pub fn iter(&self) -> impl Iterator<Item = (Vec<u8>, &V)> + '_ {
        self.iter_u64()
            .map(|(key, value)| (encode_fixed(key, self.width), value))
    }

    /// Dump level populations and the leaf list, for debugging.
    pub fn pretty_print(&self) {
        println!("XFastTrie: width={} len={}", self.width, self.len);
        println!("  root: {:?}", self.root);
        for (i, level) in self.levels.iter().enumerate() {
            if !level.is_empty() {
                println!("  level {}: {} nodes", i + 1, level.len());
            }
        }
        let keys: Vec<u64> = self.iter_u64().map(|(k, _)| k).collect();
        println!("  leaves: {keys:?}");
    }

    // integer-keyed entry points, shared with the y-fast layer

    pub(crate) fn insert_u64(&mut self, key: u64, value: V) -> Option<V> {
        // copy the id out so the table guard drops before the arena access
        let existing = self.keys.get(&key).map(|g| *g);
        if let Some(id) = existing {
            return Some(std::mem::replace(&mut self.leaf_mut(id).value, value));
        }
        let id = self.alloc(key, value);
        // walk the levels deepest-first; the deepest pre-existing node on
        // the path carries a finger on the opposite branch, and merging it
        // hands us the new leaf's list neighbor
        let mut spliced = false;
        for d in (1..self.no_bits).rev() {
            let prefix = self.prefix(key, d);
            let bit = self.branch_bit(key, d);
            let current = self.levels[d - 1].get(&prefix).map(|g| *g);
            let merged = match current {
                None => Self::fresh_finger(bit, id),
                Some(finger) => self.merge_finger(finger, bit, key, id, &mut spliced),
            };
            self.levels[d - 1].insert(prefix, merged);
        }
        let bit = self.branch_bit(key, 0);
        let root = self.root;
        self.root = Some(match root {
            None => Self::fresh_finger(bit, id),
            Some(finger) => self.merge_finger(finger, bit, key, id, &mut spliced),
        });
        self.keys.insert(key, id);
        if self.leaf(id).prev.is_none() {
            self.head = Some(id);
        }
        if self.leaf(id).next.is_none() {
            self.tail = Some(id);
        }
        self.len += 1;
        None
    }

    pub(crate) fn remove_u64(&mut self, key: u64) -> Option<V> {
        let (_, id) = self.keys.remove(&key)?;
        let prev = self.leaf(id).prev;
        let next = self.leaf(id).next;
        if prev.is_none() && next.is_none() {
            // last key out: drop the whole internal structure
            self.root = None;
            for level in &self.levels {
                level.clear();
            }
        } else {
            // the deepest node shared with a list neighbor survives; every
            // node below it existed only for this key
            let lcp = |other: Option<LeafId>| {
                other.map(|o| longest_common_prefix_length(self.leaf(o).key, key, self.no_bits))
            };
            let l = lcp(prev).max(lcp(next)).unwrap_or(0);
            let bit = self.branch_bit(key, l);
            // our branch of the surviving node empties out; the sibling
            // branch keeps the neighbor on the removed key's far side
            let survivor = if bit == 0 {
                Finger::OneMin(next.expect("populated sibling subtree holds the successor"))
            } else {
                Finger::ZeroMax(prev.expect("populated sibling subtree holds the predecessor"))
            };
            if l == 0 {
                self.root = Some(survivor);
            } else {
                self.levels[l - 1].insert(self.prefix(key, l), survivor);
            }
            // fingers above the surviving node that pointed at this leaf
            // slide to its neighbor on the same side
            for d in 0..l {
                let redirected = match self.finger_at(d, key) {
                    Some(Finger::ZeroMax(x)) if x == id => {
                        Some(Finger::ZeroMax(prev.expect("leaf was a subtree maximum")))
                    }
                    Some(Finger::OneMin(x)) if x == id => {
                        Some(Finger::OneMin(next.expect("leaf was a subtree minimum")))
                    }
                    _ => None,
                };
                if let Some(finger) = redirected {
                    if d == 0 {
                        self.root = Some(finger);
                    } else {
                        self.levels[d - 1].insert(self.prefix(key, d), finger);
                    }
                }
            }
            for d in l + 1..self.no_bits {
                self.levels[d - 1].remove(&self.prefix(key, d));
            }
        }
        // unlink
        match prev {
            Some(p) => self.leaf_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.leaf_mut(n).prev = prev,
            None => self.tail = prev,
        }
        let leaf = self.leaves[id as usize]
            .take()
            .expect("leaf arena slot occupied for a mapped key");
        self.free.push(id);
        self.len -= 1;
        Some(leaf.value)
    }

    pub(crate) fn get_u64(&self, key: u64) -> Option<&V> {
        let id = self.keys.get(&key).map(|g| *g)?;
        Some(&self.leaf(id).value)
    }

    pub(crate) fn predecessor_entry_u64(&self, key: u64) -> Option<(u64, &V)> {
        self.predecessor_u64(key).map(|id| {
            let leaf = self.leaf(id);
            (leaf.key, &leaf.value)
        })
    }

    pub(crate) fn successor_entry_u64(&self, key: u64) -> Option<(u64, &V)> {
        self.successor_u64(key).map(|id| {
            let leaf = self.leaf(id);
            (leaf.key, &leaf.value)
        })
    }

    /// Largest stored key at or below `key`.
    pub(crate) fn pred_or_equal_entry_u64(&self, key: u64) -> Option<(u64, &V)> {
        if let Some(id) = self.keys.get(&key).map(|g| *g) {
            let leaf = self.leaf(id);
            return Some((leaf.key, &leaf.value));
        }
        self.predecessor_entry_u64(key)
    }

    pub(crate) fn min_entry_u64(&self) -> Option<(u64, &V)> {
        self.head.map(|id| {
            let leaf = self.leaf(id);
            (leaf.key, &leaf.value)
        })
    }

    pub(crate) fn max_entry_u64(&self) -> Option<(u64, &V)> {
        self.tail.map(|id| {
            let leaf = self.leaf(id);
            (leaf.key, &leaf.value)
        })
    }

    pub(crate) fn iter_u64(&self) -> impl Iterator<Item = (u64, &V)> + '_ {
        std::iter::successors(self.head, move |&id| self.leaf(id).next).map(move |id| {
            let leaf = self.leaf(id);
            (leaf.key, &leaf.value)
        })
    }

    fn predecessor_u64(&self, key: u64) -> Option<LeafId> {
        if let Some(id) = self.keys.get(&key).map(|g| *g) {
            return self.leaf(id).prev;
        }
        let d = self.longest_level(key)?;
        match self.finger_at(d, key)? {
            // key descends into the empty 1-subtree: the 0-max precedes it
            Finger::ZeroMax(max) => Some(max),
            // key descends into the empty 0-subtree: the 1-min succeeds it
            Finger::OneMin(min) => self.leaf(min).prev,
            Finger::Both => unreachable!("deepest node on an absent key's path has one empty side"),
        }
    }

    fn successor_u64(&self, key: u64) -> Option<LeafId> {
        if let Some(id) = self.keys.get(&key).map(|g| *g) {
            return self.leaf(id).next;
        }
        let d = self.longest_level(key)?;
        match self.finger_at(d, key)? {
            Finger::ZeroMax(max) => self.leaf(max).next,
            Finger::OneMin(min) => Some(min),
            Finger::Both => unreachable!("deepest node on an absent key's path has one empty side"),
        }
    }

    /// Depth of the deepest internal node on `key`'s path, found by binary
    /// search over the prefix-length tables. `None` on an empty trie.
    fn longest_level(&self, key: u64) -> Option<usize> {
        self.root?;
        let mut low = 0;
        let mut high = self.no_bits - 1;
        while low < high {
            let mid = (low + high + 1) / 2;
            if self.levels[mid - 1].contains_key(&self.prefix(key, mid)) {
                low = mid;
            } else {
                high = mid - 1;
            }
        }
        Some(low)
    }

    fn finger_at(&self, d: usize, key: u64) -> Option<Finger> {
        if d == 0 {
            self.root
        } else {
            self.levels[d - 1].get(&self.prefix(key, d)).map(|g| *g)
        }
    }

    /// First `d` bits of `key`, as a `d`-bit integer.
    fn prefix(&self, key: u64, d: usize) -> u64 {
        key >> (self.no_bits - d)
    }

    /// Bit the node at depth `d` branches on.
    fn branch_bit(&self, key: u64, d: usize) -> u64 {
        (key >> (self.no_bits - d - 1)) & 1
    }

    fn fresh_finger(bit: u64, id: LeafId) -> Finger {
        if bit == 0 {
            Finger::ZeroMax(id)
        } else {
            Finger::OneMin(id)
        }
    }

    /// Fold the new leaf into an existing node's finger. The first merge
    /// that lands on the opposite branch splices the leaf list.
    fn merge_finger(
        &mut self,
        finger: Finger,
        bit: u64,
        key: u64,
        id: LeafId,
        spliced: &mut bool,
    ) -> Finger {
        match (finger, bit) {
            (Finger::Both, _) => Finger::Both,
            (Finger::ZeroMax(max), 1) => {
                if !*spliced {
                    self.splice_after(max, id);
                    *spliced = true;
                }
                Finger::Both
            }
            (Finger::OneMin(min), 0) => {
                if !*spliced {
                    self.splice_before(min, id);
                    *spliced = true;
                }
                Finger::Both
            }
            (Finger::ZeroMax(max), _) => {
                if self.leaf(max).key < key {
                    Finger::ZeroMax(id)
                } else {
                    Finger::ZeroMax(max)
                }
            }
            (Finger::OneMin(min), _) => {
                if self.leaf(min).key > key {
                    Finger::OneMin(id)
                } else {
                    Finger::OneMin(min)
                }
            }
        }
    }

    fn splice_after(&mut self, at: LeafId, id: LeafId) {
        let next = self.leaf(at).next;
        self.leaf_mut(at).next = Some(id);
        self.leaf_mut(id).prev = Some(at);
        self.leaf_mut(id).next = next;
        if let Some(n) = next {
            self.leaf_mut(n).prev = Some(id);
        }
    }

    fn splice_before(&mut self, at: LeafId, id: LeafId) {
        let prev = self.leaf(at).prev;
        self.leaf_mut(at).prev = Some(id);
        self.leaf_mut(id).next = Some(at);
        self.leaf_mut(id).prev = prev;
        if let Some(p) = prev {
            self.leaf_mut(p).next = Some(id);
        }
    }

    fn alloc(&mut self, key: u64, value: V) -> LeafId {
        let leaf = Leaf {
            key,
            value,
            prev: None,
            next: None,
        };
        match self.free.pop() {
            Some(id) => {
                self.leaves[id as usize] = Some(leaf);
                id
            }
            None => {
                self.leaves.push(Some(leaf));
                (self.leaves.len() - 1) as LeafId
            }
        }
    }

    fn leaf(&self, id: LeafId) -> &Leaf<V> {
        self.leaves[id as usize]
            .as_ref()
            .expect("leaf arena slot occupied for a live id")
    }

    fn leaf_mut(&mut self, id: LeafId) -> &mut Leaf<V> {
        self.leaves[id as usize]
            .as_mut()
            .expect("leaf arena slot occupied for a live id")
    }

    fn entry(&self, id: LeafId) -> (Vec<u8>, &V) {
        let leaf = self.leaf(id);
        (encode_fixed(leaf.key, self.width), &leaf.value)
    }
}
