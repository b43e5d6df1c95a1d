//! Succinct trie in LOUDS (level-order unary degree sequence) form.

use std::collections::VecDeque;

use crate::bit_vector::BitVector;
use crate::error::{Error, Result};

/// Sorted map over byte-string keys stored as four parallel arrays: the
/// topology bits (per node, in BFS order: one 1-bit per child then a 0),
/// the edge labels, a valued-node bitmap, and the values in BFS node
/// order. Navigation is pure rank/select over the topology.
///
/// Lookups and ordered queries run in O(key length * log fanout). The
/// structure stays mutable: `insert` and `remove` edit all four arrays in
/// place, at O(size) per key byte, so it suits read-mostly workloads.
///
/// Invariants: node ids follow BFS order with the root as 0; the labels
/// of a node's children are strictly ascending; every childless node
/// carries a value (dead branches are pruned on removal).
#[derive(Debug)]
pub struct LoudsTrie<V> {
    topo: BitVector,
    labels: Vec<u8>,
    has_value: BitVector,
    values: Vec<V>,
    len: usize,
}

impl<V> Default for LoudsTrie<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> LoudsTrie<V> {
    /// Empty trie: just a childless, valueless root.
    pub fn new() -> Self {
        let mut topo = BitVector::new();
        topo.push(false);
        let mut has_value = BitVector::new();
        has_value.push(false);
        Self {
            topo,
            labels: Vec::new(),
            has_value,
            values: Vec::new(),
            len: 0,
        }
    }

    /// Build from key/value pairs in strictly ascending key order.
    ///
    /// Fails with `InvalidInput` on out-of-order or duplicate keys.
    pub fn build<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Vec<u8>, V)>,
    {
        let pairs: Vec<(Vec<u8>, V)> = pairs.into_iter().collect();
        if pairs.windows(2).any(|w| w[0].0 >= w[1].0) {
            return Err(Error::InvalidInput);
        }
        if pairs.is_empty() {
            return Ok(Self::new());
        }
        let (keys, vals): (Vec<Vec<u8>>, Vec<V>) = pairs.into_iter().unzip();
        let mut vals: Vec<Option<V>> = vals.into_iter().map(Some).collect();

        let mut topo = BitVector::new();
        let mut labels = Vec::new();
        let mut has_value = BitVector::new();
        // input indexes of the valued nodes, in BFS order
        let mut order = Vec::with_capacity(keys.len());
        // BFS over ranges of keys sharing their first `depth` bytes
        let mut queue = VecDeque::new();
        queue.push_back((0usize, keys.len(), 0usize));
        while let Some((mut lo, hi, depth)) = queue.pop_front() {
            let terminal = keys[lo].len() == depth;
            has_value.push(terminal);
            if terminal {
                order.push(lo);
                lo += 1;
            }
            let mut i = lo;
            while i < hi {
                let byte = keys[i][depth];
                let mut j = i + 1;
                while j < hi && keys[j][depth] == byte {
                    j += 1;
                }
                topo.push(true);
                labels.push(byte);
                queue.push_back((i, j, depth + 1));
                i = j;
            }
            topo.push(false);
        }
        let len = order.len();
        let values = order
            .into_iter()
            .map(|i| {
                vals[i]
                    .take()
                    .expect("each input pair is consumed exactly once")
            })
            .collect();
        Ok(Self {
            topo,
            labels,
            has_value,
            values,
            len,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of trie nodes, including the root.
    pub fn node_count(&self) -> usize {
        self.topo.count_zeros()
    }

    pub fn get(&self, key: &[u8]) -> Option<&V> {
        let mut node = 0;
        for &byte in key {
            node = self.find_child(node, byte)?;
        }
        self.has_value
            .get(node)
            .then(|| &self.values[self.value_index(node)])
    }

    /// Insert, returning the previous value if the key was present.
    /// Rewrites the arrays in place: O(size) per new key byte.
    pub fn insert(&mut self, key: &[u8], value: V) -> Option<V> {
        let mut node = 0;
        let mut depth = 0;
        while depth < key.len() {
            match self.find_child(node, key[depth]) {
                Some(child) => {
                    node = child;
                    depth += 1;
                }
                None => break,
            }
        }
        if depth == key.len() && self.has_value.get(node) {
            let vi = self.value_index(node);
            return Some(std::mem::replace(&mut self.values[vi], value));
        }
        for &byte in &key[depth..] {
            node = self.add_child(node, byte);
        }
        self.has_value.set(node);
        self.values.insert(self.has_value.rank(node), value);
        self.len += 1;
        None
    }

    /// Remove, returning the value if the key was present. Prunes any
    /// branch left without values.
    pub fn remove(&mut self, key: &[u8]) -> Option<V> {
        let mut node = 0;
        for &byte in key {
            node = self.find_child(node, byte)?;
        }
        if !self.has_value.get(node) {
            return None;
        }
        let value = self.values.remove(self.value_index(node));
        self.has_value.clear(node);
        self.len -= 1;
        while node != 0 && self.degree(node) == 0 && !self.has_value.get(node) {
            let parent = self.parent(node);
            let block = self.block_start(node);
            let edge = self.one_pos(node);
            // the node's (empty) block sits after its edge bit; drop the
            // higher position first
            self.topo.remove(block);
            self.topo.remove(edge);
            self.labels.remove(node - 1);
            self.has_value.remove(node);
            node = parent;
        }
        Some(value)
    }

    /// Largest stored key strictly below `key`.
    pub fn predecessor(&self, key: &[u8]) -> Result<(Vec<u8>, &V)> {
        if self.len == 0 {
            return Err(Error::NotFound);
        }
        // descend along the key, remembering the deepest fallback seen:
        // either a valued node on the path (a proper prefix of the key) or
        // the subtree under the largest smaller sibling edge
        let mut node = 0;
        let mut path: Vec<u8> = Vec::new();
        let mut best: Option<(usize, Vec<u8>, bool)> = None;
        for &byte in key {
            if self.has_value.get(node) {
                best = Some((node, path.clone(), false));
            }
            let labels = self.child_labels(node);
            let pos = labels.partition_point(|&l| l < byte);
            if pos > 0 {
                let mut p = path.clone();
                p.push(labels[pos - 1]);
                best = Some((self.first_child(node) + pos - 1, p, true));
            }
            if labels.get(pos) == Some(&byte) {
                node = self.first_child(node) + pos;
                path.push(byte);
            } else {
                break;
            }
        }
        match best {
            Some((n, p, true)) => Ok(self.max_entry(n, p)),
            Some((n, p, false)) => Ok((p, &self.values[self.value_index(n)])),
            None => Err(Error::NotFound),
        }
    }

    /// Smallest stored key strictly above `key`.
    pub fn successor(&self, key: &[u8]) -> Result<(Vec<u8>, &V)> {
        if self.len == 0 {
            return Err(Error::NotFound);
        }
        let mut node = 0;
        let mut path: Vec<u8> = Vec::new();
        let mut best: Option<(usize, Vec<u8>)> = None;
        let mut matched = true;
        for &byte in key {
            let labels = self.child_labels(node);
            let pos = labels.partition_point(|&l| l <= byte);
            if pos < labels.len() {
                let mut p = path.clone();
                p.push(labels[pos]);
                best = Some((self.first_child(node) + pos, p));
            }
            if pos > 0 && labels[pos - 1] == byte {
                node = self.first_child(node) + pos - 1;
                path.push(byte);
            } else {
                matched = false;
                break;
            }
        }
        if matched && self.degree(node) > 0 {
            // every descendant extends the key and so exceeds it
            let fc = self.first_child(node);
            path.push(self.labels[fc - 1]);
            return Ok(self.min_entry(fc, path));
        }
        match best {
            Some((n, p)) => Ok(self.min_entry(n, p)),
            None => Err(Error::NotFound),
        }
    }

    pub fn min(&self) -> Option<(Vec<u8>, &V)> {
        (self.len > 0).then(|| self.min_entry(0, Vec::new()))
    }

    pub fn max(&self) -> Option<(Vec<u8>, &V)> {
        (self.len > 0).then(|| self.max_entry(0, Vec::new()))
    }

    /// Entries in ascending key order (preorder walk).
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            trie: self,
            stack: if self.len > 0 {
                vec![(0, Vec::new())]
            } else {
                Vec::new()
            },
        }
    }

    // navigation over the unary degree sequence

    /// Position of the first bit of node `i`'s block.
    fn block_start(&self, i: usize) -> usize {
        if i == 0 {
            0
        } else {
            self.select0(i - 1) + 1
        }
    }

    fn degree(&self, i: usize) -> usize {
        self.select0(i) - self.block_start(i)
    }

    fn first_child(&self, i: usize) -> usize {
        self.topo.rank(self.block_start(i)) + 1
    }

    /// Position of the 1-bit that introduced node `i` in its parent block.
    fn one_pos(&self, i: usize) -> usize {
        self.topo
            .select(i - 1)
            .expect("every non-root node has an edge bit")
    }

    fn parent(&self, i: usize) -> usize {
        self.topo.rank0(self.one_pos(i))
    }

    fn child_labels(&self, i: usize) -> &[u8] {
        let fc = self.first_child(i);
        &self.labels[fc - 1..fc - 1 + self.degree(i)]
    }

    fn find_child(&self, node: usize, byte: u8) -> Option<usize> {
        let pos = self.child_labels(node).binary_search(&byte).ok()?;
        Some(self.first_child(node) + pos)
    }

    fn value_index(&self, node: usize) -> usize {
        self.has_value.rank(node)
    }

    fn select0(&self, rank: usize) -> usize {
        self.topo
            .select0(rank)
            .expect("every node block ends with a 0 bit")
    }

    /// Smallest-key valued descendant of `node`, whose path spells `key`.
    fn min_entry(&self, mut node: usize, mut key: Vec<u8>) -> (Vec<u8>, &V) {
        loop {
            if self.has_value.get(node) {
                return (key, &self.values[self.value_index(node)]);
            }
            // a valueless node always has a child
            let fc = self.first_child(node);
            key.push(self.labels[fc - 1]);
            node = fc;
        }
    }

    /// Largest-key valued descendant of `node`, whose path spells `key`.
    fn max_entry(&self, mut node: usize, mut key: Vec<u8>) -> (Vec<u8>, &V) {
        loop {
            let deg = self.degree(node);
            if deg == 0 {
                // childless nodes are always valued
                return (key, &self.values[self.value_index(node)]);
            }
            let last = self.first_child(node) + deg - 1;
            key.push(self.labels[last - 1]);
            node = last;
        }
    }

    /// New child of `parent` labeled `byte`, inserted in label order.
    fn add_child(&mut self, parent: usize, byte: u8) -> usize {
        let start = self.block_start(parent);
        let pos = self.child_labels(parent).partition_point(|&l| l < byte);
        self.topo.insert(start + pos, true);
        let child = self.topo.rank(start + pos) + 1;
        self.labels.insert(child - 1, byte);
        // the new node's own, empty block
        let zero_pos = self.select0(child - 1) + 1;
        self.topo.insert(zero_pos, false);
        self.has_value.insert(child, false);
        child
    }
}

/// Depth-first preorder walk, which visits keys in ascending order.
pub struct Iter<'a, V> {
    trie: &'a LoudsTrie<V>,
    stack: Vec<(usize, Vec<u8>)>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (Vec<u8>, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (node, key) = self.stack.pop()?;
            let fc = self.trie.first_child(node);
            for k in (0..self.trie.degree(node)).rev() {
                let child = fc + k;
                let mut ck = key.clone();
                ck.push(self.trie.labels[child - 1]);
                self.stack.push((child, ck));
            }
            if self.trie.has_value.get(node) {
                let value = &self.trie.values[self.trie.value_index(node)];
                return Some((key, value));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(keys: &[&str]) -> Vec<(Vec<u8>, String)> {
        keys.iter()
            .map(|k| (k.as_bytes().to_vec(), k.to_uppercase()))
            .collect()
    }

    #[test]
    fn test_build_and_get() {
        let trie = LoudsTrie::build(pairs(&["a", "ab", "b"])).unwrap();
        assert_eq!(trie.len(), 3);
        assert_eq!(trie.get(b"ab"), Some(&"AB".to_string()));
        assert_eq!(trie.get(b"a"), Some(&"A".to_string()));
        assert_eq!(trie.get(b"ac"), None);
        assert_eq!(trie.get(b"abc"), None);
        assert_eq!(trie.get(b""), None);
    }

    #[test]
    fn test_build_rejects_unsorted() {
        assert_eq!(
            LoudsTrie::build(pairs(&["b", "a"])).err(),
            Some(Error::InvalidInput)
        );
        assert_eq!(
            LoudsTrie::build(pairs(&["a", "a"])).err(),
            Some(Error::InvalidInput)
        );
    }

    #[test]
    fn test_build_empty() {
        let trie: LoudsTrie<u32> = LoudsTrie::build(Vec::new()).unwrap();
        assert!(trie.is_empty());
        assert_eq!(trie.node_count(), 1);
        assert_eq!(trie.get(b"x"), None);
        assert_eq!(trie.min(), None);
        assert_eq!(trie.predecessor(b"x"), Err(Error::NotFound));
    }

    #[test]
    fn test_predecessor_successor() {
        let trie = LoudsTrie::build(pairs(&["a", "ab", "b"])).unwrap();
        let (k, _) = trie.predecessor(b"ac").unwrap();
        assert_eq!(k, b"ab");
        let (k, _) = trie.successor(b"ac").unwrap();
        assert_eq!(k, b"b");
        // strict at exact hits
        let (k, _) = trie.predecessor(b"ab").unwrap();
        assert_eq!(k, b"a");
        let (k, _) = trie.successor(b"a").unwrap();
        assert_eq!(k, b"ab");
        assert_eq!(trie.predecessor(b"a"), Err(Error::NotFound));
        assert_eq!(trie.successor(b"b"), Err(Error::NotFound));
        // probes longer than any stored key
        let (k, _) = trie.predecessor(b"bzzz").unwrap();
        assert_eq!(k, b"b");
    }

    #[test]
    fn test_min_max_iter() {
        let input = pairs(&["ant", "bee", "bees", "cat"]);
        let trie = LoudsTrie::build(input.clone()).unwrap();
        assert_eq!(trie.min().unwrap().0, b"ant");
        assert_eq!(trie.max().unwrap().0, b"cat");
        let walked: Vec<(Vec<u8>, String)> =
            trie.iter().map(|(k, v)| (k, v.clone())).collect();
        assert_eq!(walked, input);
    }

    #[test]
    fn test_insert_into_existing() {
        let mut trie = LoudsTrie::build(pairs(&["a", "b"])).unwrap();
        assert_eq!(trie.insert(b"ab", "AB".to_string()), None);
        assert_eq!(trie.len(), 3);
        assert_eq!(trie.get(b"ab"), Some(&"AB".to_string()));
        assert_eq!(trie.get(b"a"), Some(&"A".to_string()));
        let keys: Vec<Vec<u8>> = trie.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![b"a".to_vec(), b"ab".to_vec(), b"b".to_vec()]);
        // interior node gains a value without new topology
        let nodes = trie.node_count();
        assert_eq!(trie.insert(b"", "ROOT".to_string()), None);
        assert_eq!(trie.node_count(), nodes);
        assert_eq!(trie.min().unwrap().0, b"");
    }

    #[test]
    fn test_insert_replaces_value() {
        let mut trie = LoudsTrie::build(pairs(&["a"])).unwrap();
        assert_eq!(trie.insert(b"a", "A2".to_string()), Some("A".to_string()));
        assert_eq!(trie.len(), 1);
        assert_eq!(trie.get(b"a"), Some(&"A2".to_string()));
    }

    #[test]
    fn test_remove_prunes_branches() {
        let mut trie = LoudsTrie::build(pairs(&["a", "abc", "b"])).unwrap();
        // "abc" holds the only values on its branch below "a"
        assert_eq!(trie.remove(b"abc"), Some("ABC".to_string()));
        assert_eq!(trie.len(), 2);
        assert_eq!(trie.node_count(), 3);
        assert_eq!(trie.get(b"ab"), None);
        assert_eq!(trie.get(b"a"), Some(&"A".to_string()));
        assert_eq!(trie.remove(b"ab"), None);
        // removing a prefix key keeps the branch alive
        let mut trie = LoudsTrie::build(pairs(&["a", "abc"])).unwrap();
        assert_eq!(trie.remove(b"a"), Some("A".to_string()));
        assert_eq!(trie.get(b"abc"), Some(&"ABC".to_string()));
        let (k, _) = trie.successor(b"").unwrap();
        assert_eq!(k, b"abc");
    }

    #[test]
    fn test_build_matches_incremental() {
        let input = pairs(&["", "a", "ab", "abc", "b", "ba", "cc"]);
        let built = LoudsTrie::build(input.clone()).unwrap();
        let mut grown = LoudsTrie::new();
        for (k, v) in input {
            assert_eq!(grown.insert(&k, v), None);
        }
        let a: Vec<(Vec<u8>, String)> = built.iter().map(|(k, v)| (k, v.clone())).collect();
        let b: Vec<(Vec<u8>, String)> = grown.iter().map(|(k, v)| (k, v.clone())).collect();
        assert_eq!(a, b);
        assert_eq!(built.node_count(), grown.node_count());
    }

    #[test]
    fn test_against_model() {
        use rand::prelude::*;
        use std::collections::BTreeMap;
        let mut rng = StdRng::seed_from_u64(0x1007);
        let mut trie: LoudsTrie<u32> = LoudsTrie::new();
        let mut model: BTreeMap<Vec<u8>, u32> = BTreeMap::new();
        let random_key = |rng: &mut StdRng| -> Vec<u8> {
            let len = rng.gen_range(0..=3);
            (0..len).map(|_| rng.gen_range(b'a'..=b'd')).collect()
        };
        for step in 0..3000u32 {
            let key = random_key(&mut rng);
            if rng.gen_bool(0.6) {
                assert_eq!(trie.insert(&key, step), model.insert(key.clone(), step));
            } else {
                assert_eq!(trie.remove(&key), model.remove(&key));
            }
            assert_eq!(trie.len(), model.len());
            let probe = random_key(&mut rng);
            let expect_pred = model.range(..probe.clone()).next_back();
            match trie.predecessor(&probe) {
                Ok((k, v)) => {
                    let (mk, mv) = expect_pred.unwrap();
                    assert_eq!(&k, mk);
                    assert_eq!(v, mv);
                }
                Err(Error::NotFound) => assert!(expect_pred.is_none()),
                Err(e) => panic!("unexpected error: {e}"),
            }
            let expect_succ = model
                .range((
                    std::ops::Bound::Excluded(probe.clone()),
                    std::ops::Bound::Unbounded,
                ))
                .next();
            match trie.successor(&probe) {
                Ok((k, v)) => {
                    let (mk, mv) = expect_succ.unwrap();
                    assert_eq!(&k, mk);
                    assert_eq!(v, mv);
                }
                Err(Error::NotFound) => assert!(expect_succ.is_none()),
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        let trie_keys: Vec<Vec<u8>> = trie.iter().map(|(k, _)| k).collect();
        let model_keys: Vec<Vec<u8>> = model.keys().cloned().collect();
        assert_eq!(trie_keys, model_keys);
    }
}
