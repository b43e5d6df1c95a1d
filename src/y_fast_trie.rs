//! Y-fast trie: an x-fast trie over cluster representatives, with the bulk
//! of the keys held in small balanced clusters.

use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};

use crate::error::{Error, Result};
use crate::utils::{decode_fixed, encode_fixed};
use crate::x_fast_trie::XFastTrie;

// clusters hold between bound/2 and 2*bound keys (single-cluster tries may
// run smaller); the adaptive bound never drops below this floor
const MIN_CLUSTER_BOUND: usize = 8;

type ClusterId = u32;

#[derive(Debug)]
struct Cluster<V> {
    keys: BTreeMap<u64, V>,
}

impl<V> Cluster<V> {
    fn empty() -> Self {
        Cluster {
            keys: BTreeMap::new(),
        }
    }
}

/// Y-fast trie over `width`-byte keys (1..=8 bytes).
///
/// Each cluster is a `BTreeMap` of consecutive keys; its minimum is the
/// cluster's representative and the only key the internal x-fast index
/// sees. Splits and merges keep cluster sizes within a constant factor of
/// the bound, so the index stays a `1/bound` fraction of the key count.
#[derive(Debug)]
pub struct YFastTrie<V> {
    index: XFastTrie<ClusterId>,
    clusters: Vec<Option<Cluster<V>>>,
    free: Vec<ClusterId>,
    width: usize,
    bound: usize,
    adaptive: bool,
    // key count at the last bound recomputation
    anchor: usize,
    len: usize,
}

impl<V> YFastTrie<V> {
    /// New trie with an adaptive cluster bound of roughly `2 * log2(n)`.
    ///
    /// # Panics
    /// If `width` is 0 or greater than 8.
    pub fn new(width: usize) -> Self {
        Self::build(width, MIN_CLUSTER_BOUND, true)
    }

    /// New trie with a fixed cluster bound.
    ///
    /// # Panics
    /// If `width` is 0 or greater than 8, or if `bound` is below 2.
    pub fn with_cluster_bound(width: usize, bound: usize) -> Self {
        assert!(bound >= 2, "cluster bound must be at least 2");
        Self::build(width, bound, false)
    }

    fn build(width: usize, bound: usize, adaptive: bool) -> Self {
        Self {
            index: XFastTrie::new(width),
            clusters: Vec::new(),
            free: Vec::new(),
            width,
            bound,
            adaptive,
            anchor: 1,
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

    /// Current cluster size bound.
    pub fn cluster_bound(&self) -> usize {
        self.bound
    }

    /// Sizes of the clusters in representative order, for diagnostics.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        self.index
            .iter_u64()
            .map(|(_, &cid)| self.cluster(cid).keys.len())
            .collect()
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
        let (_, cid) = self.owning(key)?;
        self.cluster(cid).keys.get(&key)
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Largest stored key strictly below `key`.
    pub fn predecessor(&self, key: &[u8]) -> Result<(Vec<u8>, &V)> {
        let key = decode_fixed(key, self.width)?;
        let (k, v) = self.predecessor_u64(key).ok_or(Error::NotFound)?;
        Ok((encode_fixed(k, self.width), v))
    }

    /// Smallest stored key strictly above `key`.
    pub fn successor(&self, key: &[u8]) -> Result<(Vec<u8>, &V)> {
        let key = decode_fixed(key, self.width)?;
        let (k, v) = self.successor_u64(key).ok_or(Error::NotFound)?;
        Ok((encode_fixed(k, self.width), v))
    }

    pub fn min(&self) -> Option<(Vec<u8>, &V)> {
        let (_, &cid) = self.index.min_entry_u64()?;
        let (k, v) = self.cluster(cid).keys.iter().next()?;
        Some((encode_fixed(*k, self.width), v))
    }

    pub fn max(&self) -> Option<(Vec<u8>, &V)> {
        let (_, &cid) = self.index.max_entry_u64()?;
        let (k, v) = self.cluster(cid).keys.iter().next_back()?;
        Some((encode_fixed(*k, self.width), v))
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (Vec<u8>, &V)> + '_ {
        self.index.iter_u64().flat_map(move |(_, &cid)| {
            self.cluster(cid)
                .keys
                .iter()
                .map(|(k, v)| (encode_fixed(*k, self.width), v))
        })
    }

    /// Dump the representative index and cluster sizes, for debugging.
    pub fn pretty_print(&self) {
        println!(
            "YFastTrie: width={} len={} bound={}",
            self.width, self.len, self.bound
        );
        for (rep, &cid) in self.index.iter_u64() {
            println!("  rep {:#x}: {} keys", rep, self.cluster(cid).keys.len());
        }
    }

    fn insert_u64(&mut self, key: u64, value: V) -> Option<V> {
        let (rep, cid) = match self.owning(key) {
            Some(entry) => entry,
            None => match self.index.min_entry_u64() {
                // key sits below every representative: it belongs to the
                // first cluster and becomes its new minimum
                Some((rep, &cid)) => (rep, cid),
                None => {
                    let cid = self.alloc_cluster();
                    self.cluster_mut(cid).keys.insert(key, value);
                    self.index.insert_u64(key, cid);
                    self.len = 1;
                    self.maybe_adapt();
                    return None;
                }
            },
        };
        let old = self.cluster_mut(cid).keys.insert(key, value);
        if old.is_some() {
            // value replaced in place, no structural change
            return old;
        }
        self.len += 1;
        if key < rep {
            self.index.remove_u64(rep);
            self.index.insert_u64(key, cid);
        }
        if self.cluster(cid).keys.len() > 2 * self.bound {
            self.split(cid);
        }
        self.maybe_adapt();
        None
    }

    fn remove_u64(&mut self, key: u64) -> Option<V> {
        let (rep, cid) = self.owning(key)?;
        let old = self.cluster_mut(cid).keys.remove(&key)?;
        self.len -= 1;
        if self.cluster(cid).keys.is_empty() {
            self.index.remove_u64(rep);
            self.free_cluster(cid);
        } else {
            if key == rep {
                let new_rep = *self
                    .cluster(cid)
                    .keys
                    .keys()
                    .next()
                    .expect("non-empty cluster has a minimum");
                self.index.remove_u64(rep);
                self.index.insert_u64(new_rep, cid);
            }
            if self.cluster(cid).keys.len() < self.bound / 2 {
                self.rebalance(cid);
            }
        }
        self.maybe_adapt();
        Some(old)
    }

    fn predecessor_u64(&self, key: u64) -> Option<(u64, &V)> {
        // no representative at or below key means no stored key below it
        let (rep, cid) = self.owning(key)?;
        if let Some((k, v)) = self.cluster(cid).keys.range(..key).next_back() {
            return Some((*k, v));
        }
        // key equals the owning cluster's minimum; step to the previous one
        let (_, &prev_cid) = self.index.predecessor_entry_u64(rep)?;
        let (k, v) = self.cluster(prev_cid).keys.iter().next_back()?;
        Some((*k, v))
    }

    fn successor_u64(&self, key: u64) -> Option<(u64, &V)> {
        match self.owning(key) {
            Some((rep, cid)) => {
                if let Some((k, v)) = self
                    .cluster(cid)
                    .keys
                    .range((Excluded(key), Unbounded))
                    .next()
                {
                    return Some((*k, v));
                }
                let (_, &next_cid) = self.index.successor_entry_u64(rep)?;
                let (k, v) = self.cluster(next_cid).keys.iter().next()?;
                Some((*k, v))
            }
            // every stored key sits above `key`
            None => {
                let (_, &cid) = self.index.min_entry_u64()?;
                let (k, v) = self.cluster(cid).keys.iter().next()?;
                Some((*k, v))
            }
        }
    }

    /// Representative and cluster owning `key`: the deepest representative
    /// at or below it.
    fn owning(&self, key: u64) -> Option<(u64, ClusterId)> {
        self.index
            .pred_or_equal_entry_u64(key)
            .map(|(rep, &cid)| (rep, cid))
    }

    /// Split an oversized cluster at its median key.
    fn split(&mut self, cid: ClusterId) {
        let size = self.cluster(cid).keys.len();
        let mid = *self
            .cluster(cid)
            .keys
            .keys()
            .nth(size / 2)
            .expect("split target has at least two keys");
        let upper = self.cluster_mut(cid).keys.split_off(&mid);
        let new_cid = self.alloc_cluster();
        self.cluster_mut(new_cid).keys = upper;
        self.index.insert_u64(mid, new_cid);
    }

    /// Merge an undersized cluster with a neighbor, re-splitting if the
    /// result overflows.
    fn rebalance(&mut self, cid: ClusterId) {
        let rep = *self
            .cluster(cid)
            .keys
            .keys()
            .next()
            .expect("rebalance target is non-empty");
        if let Some((next_rep, &next_cid)) = self.index.successor_entry_u64(rep) {
            self.merge(cid, next_cid, next_rep);
        } else if let Some((_, &prev_cid)) = self.index.predecessor_entry_u64(rep) {
            self.merge(prev_cid, cid, rep);
        }
        // a lone cluster may run below bound/2
    }

    fn merge(&mut self, lo: ClusterId, hi: ClusterId, hi_rep: u64) {
        let mut moved = std::mem::take(&mut self.cluster_mut(hi).keys);
        self.cluster_mut(lo).keys.append(&mut moved);
        self.index.remove_u64(hi_rep);
        self.free_cluster(hi);
        if self.cluster(lo).keys.len() > 2 * self.bound {
            self.split(lo);
        }
    }

    /// Recompute the adaptive bound when the key count has doubled or
    /// halved since the last recomputation. Existing clusters conform
    /// lazily as later splits and merges touch them.
    fn maybe_adapt(&mut self) {
        if !self.adaptive {
            return;
        }
        if self.len >= 2 * self.anchor || 2 * self.len <= self.anchor {
            self.anchor = self.len.max(1);
            let log2 = (usize::BITS - self.len.leading_zeros()) as usize;
            self.bound = (2 * log2).max(MIN_CLUSTER_BOUND);
        }
    }

    fn alloc_cluster(&mut self) -> ClusterId {
        match self.free.pop() {
            Some(cid) => {
                self.clusters[cid as usize] = Some(Cluster::empty());
                cid
            }
            None => {
                self.clusters.push(Some(Cluster::empty()));
                (self.clusters.len() - 1) as ClusterId
            }
        }
    }

    fn free_cluster(&mut self, cid: ClusterId) {
        self.clusters[cid as usize] = None;
        self.free.push(cid);
    }

    fn cluster(&self, cid: ClusterId) -> &Cluster<V> {
        self.clusters[cid as usize]
            .as_ref()
            .expect("cluster arena slot occupied for a live id")
    }

    fn cluster_mut(&mut self, cid: ClusterId) -> &mut Cluster<V> {
        self.clusters[cid as usize]
            .as_mut()
            .expect("cluster arena slot occupied for a live id")
    }
}
