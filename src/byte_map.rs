//! Adaptive radix trie over variable-length byte-string keys.

use crate::error::{Error, Result};

// n48 index entry for an absent byte
const EMPTY: u8 = 0xff;

#[derive(Debug)]
struct LeafNode<V> {
    key: Vec<u8>,
    value: V,
}

#[derive(Debug)]
struct InnerNode<V> {
    // compressed path bytes between the parent's edge and this node's
    // branching point
    prefix: Vec<u8>,
    // entry whose key ends exactly at this node; sorts before every child
    terminal: Option<LeafNode<V>>,
    children: Children<V>,
}

#[derive(Debug)]
enum Node<V> {
    Leaf(Box<LeafNode<V>>),
    Inner(Box<InnerNode<V>>),
}

impl<V> Node<V> {
    fn leaf(key: &[u8], value: V) -> Self {
        Node::Leaf(Box::new(LeafNode {
            key: key.to_vec(),
            value,
        }))
    }
}

/// Child table of an inner node, resized between four representations as
/// the fanout changes.
///
/// `N4`/`N16` keep a sorted byte array parallel to the slots, `N48` routes
/// through a 256-entry index into a compact slot array, `N256` indexes
/// slots by the byte directly. `N48` removal swaps the last occupied slot
/// into the hole so the occupied slots stay a prefix of the array.
#[derive(Debug)]
enum Children<V> {
    N4 {
        len: u8,
        bytes: [u8; 4],
        slots: [Option<Node<V>>; 4],
    },
    N16 {
        len: u8,
        bytes: [u8; 16],
        slots: [Option<Node<V>>; 16],
    },
    N48 {
        len: u8,
        index: Box<[u8; 256]>,
        slots: Box<[Option<Node<V>>; 48]>,
    },
    N256 {
        len: u16,
        slots: Box<[Option<Node<V>>; 256]>,
    },
}

impl<V> Children<V> {
    fn new4() -> Self {
        Children::N4 {
            len: 0,
            bytes: [0; 4],
            slots: std::array::from_fn(|_| None),
        }
    }

    fn len(&self) -> usize {
        match self {
            Children::N4 { len, .. } | Children::N16 { len, .. } | Children::N48 { len, .. } => {
                *len as usize
            }
            Children::N256 { len, .. } => *len as usize,
        }
    }

    fn get(&self, byte: u8) -> Option<&Node<V>> {
        match self {
            Children::N4 { len, bytes, slots } => bytes[..*len as usize]
                .iter()
                .position(|&b| b == byte)
                .and_then(|i| slots[i].as_ref()),
            Children::N16 { len, bytes, slots } => bytes[..*len as usize]
                .iter()
                .position(|&b| b == byte)
                .and_then(|i| slots[i].as_ref()),
            Children::N48 { index, slots, .. } => {
                let s = index[byte as usize];
                if s == EMPTY {
                    None
                } else {
                    slots[s as usize].as_ref()
                }
            }
            Children::N256 { slots, .. } => slots[byte as usize].as_ref(),
        }
    }

    /// Add a child for an absent byte, growing the representation if full.
    fn add(&mut self, byte: u8, node: Node<V>) {
        if self.is_full() {
            self.grow();
        }
        match self {
            Children::N4 { len, bytes, slots } => {
                let n = *len as usize;
                let pos = bytes[..n].partition_point(|&b| b < byte);
                for i in (pos..n).rev() {
                    bytes[i + 1] = bytes[i];
                    slots.swap(i, i + 1);
                }
                bytes[pos] = byte;
                slots[pos] = Some(node);
                *len += 1;
            }
            Children::N16 { len, bytes, slots } => {
                let n = *len as usize;
                let pos = bytes[..n].partition_point(|&b| b < byte);
                for i in (pos..n).rev() {
                    bytes[i + 1] = bytes[i];
                    slots.swap(i, i + 1);
                }
                bytes[pos] = byte;
                slots[pos] = Some(node);
                *len += 1;
            }
            Children::N48 { len, index, slots } => {
                // occupied slots are compact, the first free one is at len
                let s = *len as usize;
                slots[s] = Some(node);
                index[byte as usize] = s as u8;
                *len += 1;
            }
            Children::N256 { len, slots } => {
                slots[byte as usize] = Some(node);
                *len += 1;
            }
        }
    }

    /// Remove the child for `byte`. Never shrinks; callers on the delete
    /// path follow up with `maybe_shrink`.
    fn remove(&mut self, byte: u8) -> Option<Node<V>> {
        match self {
            Children::N4 { len, bytes, slots } => {
                let n = *len as usize;
                let pos = bytes[..n].iter().position(|&b| b == byte)?;
                let node = slots[pos].take();
                for i in pos..n - 1 {
                    bytes[i] = bytes[i + 1];
                    slots.swap(i, i + 1);
                }
                *len -= 1;
                node
            }
            Children::N16 { len, bytes, slots } => {
                let n = *len as usize;
                let pos = bytes[..n].iter().position(|&b| b == byte)?;
                let node = slots[pos].take();
                for i in pos..n - 1 {
                    bytes[i] = bytes[i + 1];
                    slots.swap(i, i + 1);
                }
                *len -= 1;
                node
            }
            Children::N48 { len, index, slots } => {
                let s = index[byte as usize] as usize;
                if s as u8 == EMPTY {
                    return None;
                }
                let node = slots[s].take();
                index[byte as usize] = EMPTY;
                let last = *len as usize - 1;
                if s != last {
                    // keep occupied slots compact: move the last one down
                    slots[s] = slots[last].take();
                    for b in 0..256 {
                        if index[b] == last as u8 {
                            index[b] = s as u8;
                            break;
                        }
                    }
                }
                *len -= 1;
                node
            }
            Children::N256 { len, slots } => {
                let node = slots[byte as usize].take();
                if node.is_some() {
                    *len -= 1;
                }
                node
            }
        }
    }

    fn is_full(&self) -> bool {
        match self {
            Children::N4 { len, .. } => *len == 4,
            Children::N16 { len, .. } => *len == 16,
            Children::N48 { len, .. } => *len == 48,
            Children::N256 { .. } => false,
        }
    }

    fn grow(&mut self) {
        let old = std::mem::replace(self, Self::new4());
        *self = match old {
            Children::N4 {
                len,
                bytes,
                mut slots,
            } => {
                let mut nb = [0u8; 16];
                let mut ns: [Option<Node<V>>; 16] = std::array::from_fn(|_| None);
                for i in 0..len as usize {
                    nb[i] = bytes[i];
                    ns[i] = slots[i].take();
                }
                Children::N16 {
                    len,
                    bytes: nb,
                    slots: ns,
                }
            }
            Children::N16 {
                len,
                bytes,
                mut slots,
            } => {
                let mut index = Box::new([EMPTY; 256]);
                let mut ns: Box<[Option<Node<V>>; 48]> = Box::new(std::array::from_fn(|_| None));
                for i in 0..len as usize {
                    index[bytes[i] as usize] = i as u8;
                    ns[i] = slots[i].take();
                }
                Children::N48 {
                    len,
                    index,
                    slots: ns,
                }
            }
            Children::N48 {
                len,
                index,
                mut slots,
            } => {
                let mut ns: Box<[Option<Node<V>>; 256]> = Box::new(std::array::from_fn(|_| None));
                for b in 0..256 {
                    let s = index[b];
                    if s != EMPTY {
                        ns[b] = slots[s as usize].take();
                    }
                }
                Children::N256 {
                    len: len as u16,
                    slots: ns,
                }
            }
            Children::N256 { .. } => unreachable!("widest representation never grows"),
        };
    }

    /// Fall back to a smaller representation once the fanout leaves slack.
    fn maybe_shrink(&mut self) {
        let shrink = match self {
            Children::N4 { .. } => false,
            Children::N16 { len, .. } => *len <= 3,
            Children::N48 { len, .. } => *len <= 14,
            Children::N256 { len, .. } => *len <= 46,
        };
        if !shrink {
            return;
        }
        let old = std::mem::replace(self, Self::new4());
        *self = match old {
            Children::N16 {
                len,
                bytes,
                mut slots,
            } => {
                let mut nb = [0u8; 4];
                let mut ns: [Option<Node<V>>; 4] = std::array::from_fn(|_| None);
                for i in 0..len as usize {
                    nb[i] = bytes[i];
                    ns[i] = slots[i].take();
                }
                Children::N4 {
                    len,
                    bytes: nb,
                    slots: ns,
                }
            }
            Children::N48 {
                len,
                index,
                mut slots,
            } => {
                let mut nb = [0u8; 16];
                let mut ns: [Option<Node<V>>; 16] = std::array::from_fn(|_| None);
                let mut j = 0;
                for b in 0..256 {
                    let s = index[b];
                    if s != EMPTY {
                        nb[j] = b as u8;
                        ns[j] = slots[s as usize].take();
                        j += 1;
                    }
                }
                Children::N16 {
                    len,
                    bytes: nb,
                    slots: ns,
                }
            }
            Children::N256 { len, mut slots } => {
                let mut index = Box::new([EMPTY; 256]);
                let mut ns: Box<[Option<Node<V>>; 48]> = Box::new(std::array::from_fn(|_| None));
                let mut j = 0usize;
                for b in 0..256 {
                    if slots[b].is_some() {
                        index[b] = j as u8;
                        ns[j] = slots[b].take();
                        j += 1;
                    }
                }
                Children::N48 {
                    len: len as u8,
                    index,
                    slots: ns,
                }
            }
            Children::N4 { .. } => unreachable!("narrowest representation never shrinks"),
        };
    }

    fn min(&self) -> Option<(u8, &Node<V>)> {
        match self {
            Children::N4 { len, bytes, slots } => (*len > 0)
                .then(|| slots[0].as_ref().map(|node| (bytes[0], node)))
                .flatten(),
            Children::N16 { len, bytes, slots } => (*len > 0)
                .then(|| slots[0].as_ref().map(|node| (bytes[0], node)))
                .flatten(),
            Children::N48 { index, slots, .. } => (0..256).find_map(|b| {
                let s = index[b];
                if s == EMPTY {
                    None
                } else {
                    slots[s as usize].as_ref().map(|n| (b as u8, n))
                }
            }),
            Children::N256 { slots, .. } => {
                (0..256).find_map(|b| slots[b].as_ref().map(|n| (b as u8, n)))
            }
        }
    }

    fn max(&self) -> Option<(u8, &Node<V>)> {
        match self {
            Children::N4 { len, bytes, slots } => {
                let n = *len as usize;
                (n > 0)
                    .then(|| slots[n - 1].as_ref().map(|node| (bytes[n - 1], node)))
                    .flatten()
            }
            Children::N16 { len, bytes, slots } => {
                let n = *len as usize;
                (n > 0)
                    .then(|| slots[n - 1].as_ref().map(|node| (bytes[n - 1], node)))
                    .flatten()
            }
            Children::N48 { index, slots, .. } => (0..256).rev().find_map(|b| {
                let s = index[b];
                if s == EMPTY {
                    None
                } else {
                    slots[s as usize].as_ref().map(|n| (b as u8, n))
                }
            }),
            Children::N256 { slots, .. } => (0..256)
                .rev()
                .find_map(|b| slots[b].as_ref().map(|n| (b as u8, n))),
        }
    }

    /// Largest child byte strictly below `byte`.
    fn max_below(&self, byte: u8) -> Option<(u8, &Node<V>)> {
        match self {
            Children::N4 { len, bytes, slots } => {
                let pos = bytes[..*len as usize].partition_point(|&b| b < byte);
                (pos > 0).then(|| slots[pos - 1].as_ref().map(|n| (bytes[pos - 1], n)))?
            }
            Children::N16 { len, bytes, slots } => {
                let pos = bytes[..*len as usize].partition_point(|&b| b < byte);
                (pos > 0).then(|| slots[pos - 1].as_ref().map(|n| (bytes[pos - 1], n)))?
            }
            Children::N48 { index, slots, .. } => (0..byte as usize).rev().find_map(|b| {
                let s = index[b];
                if s == EMPTY {
                    None
                } else {
                    slots[s as usize].as_ref().map(|n| (b as u8, n))
                }
            }),
            Children::N256 { slots, .. } => (0..byte as usize)
                .rev()
                .find_map(|b| slots[b].as_ref().map(|n| (b as u8, n))),
        }
    }

    /// Smallest child byte strictly above `byte`.
    fn min_above(&self, byte: u8) -> Option<(u8, &Node<V>)> {
        match self {
            Children::N4 { len, bytes, slots } => {
                let n = *len as usize;
                let pos = bytes[..n].partition_point(|&b| b <= byte);
                (pos < n).then(|| slots[pos].as_ref().map(|node| (bytes[pos], node)))?
            }
            Children::N16 { len, bytes, slots } => {
                let n = *len as usize;
                let pos = bytes[..n].partition_point(|&b| b <= byte);
                (pos < n).then(|| slots[pos].as_ref().map(|node| (bytes[pos], node)))?
            }
            Children::N48 { index, slots, .. } => (byte as usize + 1..256).find_map(|b| {
                let s = index[b];
                if s == EMPTY {
                    None
                } else {
                    slots[s as usize].as_ref().map(|n| (b as u8, n))
                }
            }),
            Children::N256 { slots, .. } => (byte as usize + 1..256)
                .find_map(|b| slots[b].as_ref().map(|n| (b as u8, n))),
        }
    }

    /// Children in ascending byte order.
    fn sorted(&self) -> Vec<(u8, &Node<V>)> {
        match self {
            Children::N4 { len, bytes, slots } => bytes[..*len as usize]
                .iter()
                .zip(&slots[..*len as usize])
                .filter_map(|(&b, s)| s.as_ref().map(|n| (b, n)))
                .collect(),
            Children::N16 { len, bytes, slots } => bytes[..*len as usize]
                .iter()
                .zip(&slots[..*len as usize])
                .filter_map(|(&b, s)| s.as_ref().map(|n| (b, n)))
                .collect(),
            Children::N48 { index, slots, .. } => (0..256)
                .filter_map(|b| {
                    let s = index[b];
                    if s == EMPTY {
                        None
                    } else {
                        slots[s as usize].as_ref().map(|n| (b as u8, n))
                    }
                })
                .collect(),
            Children::N256 { slots, .. } => (0..256)
                .filter_map(|b| slots[b].as_ref().map(|n| (b as u8, n)))
                .collect(),
        }
    }

    /// Remove and return the only child.
    fn pop_only(&mut self) -> (u8, Node<V>) {
        debug_assert_eq!(self.len(), 1);
        let byte = match self.min() {
            Some((b, _)) => b,
            None => unreachable!("pop_only on an empty child table"),
        };
        let node = match self.remove(byte) {
            Some(node) => node,
            None => unreachable!("child vanished between min and remove"),
        };
        (byte, node)
    }
}

/// Sorted map over arbitrary byte strings, stored as an adaptive radix
/// trie with path compression.
///
/// Lookups descend one byte at a time; predecessor and successor queries
/// track the best lower/upper subtree seen during the descent and finish
/// with an extreme-leaf walk, so no parent pointers are needed.
#[derive(Debug, Default)]
pub struct ByteMap<V> {
    root: Option<Node<V>>,
    len: usize,
}

impl<V> ByteMap<V> {
    pub fn new() -> Self {
        Self { root: None, len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert, returning the previous value if the key was present.
    pub fn insert(&mut self, key: &[u8], value: V) -> Option<V> {
        let (node, old) = match self.root.take() {
            None => (Node::leaf(key, value), None),
            Some(node) => Self::insert_node(node, key, 0, value),
        };
        self.root = Some(node);
        if old.is_none() {
            self.len += 1;
        }
        old
    }

    /// Remove, returning the value if the key was present.
    pub fn remove(&mut self, key: &[u8]) -> Option<V> {
        let root = self.root.take()?;
        let (root, removed) = Self::remove_node(root, key, 0);
        self.root = root;
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    pub fn get(&self, key: &[u8]) -> Option<&V> {
        let mut node = self.root.as_ref()?;
        let mut depth = 0;
        loop {
            match node {
                Node::Leaf(leaf) => return (leaf.key == key).then_some(&leaf.value),
                Node::Inner(inner) => {
                    let rest = &key[depth..];
                    if rest.len() < inner.prefix.len()
                        || rest[..inner.prefix.len()] != inner.prefix[..]
                    {
                        return None;
                    }
                    depth += inner.prefix.len();
                    if depth == key.len() {
                        return inner.terminal.as_ref().map(|t| &t.value);
                    }
                    node = inner.children.get(key[depth])?;
                    depth += 1;
                }
            }
        }
    }

    /// Largest stored key strictly below `key`.
    pub fn predecessor(&self, key: &[u8]) -> Result<(Vec<u8>, &V)> {
        let root = self.root.as_ref().ok_or(Error::NotFound)?;
        let leaf = Self::pred_in(root, key, 0).ok_or(Error::NotFound)?;
        Ok((leaf.key.clone(), &leaf.value))
    }

    /// Smallest stored key strictly above `key`.
    pub fn successor(&self, key: &[u8]) -> Result<(Vec<u8>, &V)> {
        let root = self.root.as_ref().ok_or(Error::NotFound)?;
        let leaf = Self::succ_in(root, key, 0).ok_or(Error::NotFound)?;
        Ok((leaf.key.clone(), &leaf.value))
    }

    pub fn min(&self) -> Option<(Vec<u8>, &V)> {
        let leaf = Self::min_leaf(self.root.as_ref()?);
        Some((leaf.key.clone(), &leaf.value))
    }

    pub fn max(&self) -> Option<(Vec<u8>, &V)> {
        let leaf = Self::max_leaf(self.root.as_ref()?);
        Some((leaf.key.clone(), &leaf.value))
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            stack: self.root.as_ref().map(Frame::Node).into_iter().collect(),
        }
    }

    fn insert_node(node: Node<V>, key: &[u8], depth: usize, value: V) -> (Node<V>, Option<V>) {
        match node {
            Node::Leaf(mut leaf) => {
                if leaf.key == key {
                    let old = std::mem::replace(&mut leaf.value, value);
                    return (Node::Leaf(leaf), Some(old));
                }
                // split into an inner node over the two leaves' common path
                let common = common_prefix_len(&leaf.key[depth..], &key[depth..]);
                let mut inner = InnerNode {
                    prefix: key[depth..depth + common].to_vec(),
                    terminal: None,
                    children: Children::new4(),
                };
                let d = depth + common;
                if leaf.key.len() == d {
                    inner.terminal = Some(*leaf);
                } else {
                    let byte = leaf.key[d];
                    inner.children.add(byte, Node::Leaf(leaf));
                }
                if key.len() == d {
                    inner.terminal = Some(LeafNode {
                        key: key.to_vec(),
                        value,
                    });
                } else {
                    inner.children.add(key[d], Node::leaf(key, value));
                }
                (Node::Inner(Box::new(inner)), None)
            }
            Node::Inner(mut inner) => {
                let rest = &key[depth..];
                let m = common_prefix_len(&inner.prefix, rest);
                if m < inner.prefix.len() {
                    // key diverges inside the compressed path: split it
                    let old_byte = inner.prefix[m];
                    let head = inner.prefix[..m].to_vec();
                    inner.prefix.drain(..=m);
                    let mut parent = InnerNode {
                        prefix: head,
                        terminal: None,
                        children: Children::new4(),
                    };
                    parent.children.add(old_byte, Node::Inner(inner));
                    let d = depth + m;
                    if key.len() == d {
                        parent.terminal = Some(LeafNode {
                            key: key.to_vec(),
                            value,
                        });
                    } else {
                        parent.children.add(key[d], Node::leaf(key, value));
                    }
                    return (Node::Inner(Box::new(parent)), None);
                }
                let d = depth + m;
                if key.len() == d {
                    let old = match inner.terminal.as_mut() {
                        Some(t) => Some(std::mem::replace(&mut t.value, value)),
                        None => {
                            inner.terminal = Some(LeafNode {
                                key: key.to_vec(),
                                value,
                            });
                            None
                        }
                    };
                    return (Node::Inner(inner), old);
                }
                let byte = key[d];
                let old = match inner.children.remove(byte) {
                    Some(child) => {
                        let (child, old) = Self::insert_node(child, key, d + 1, value);
                        inner.children.add(byte, child);
                        old
                    }
                    None => {
                        inner.children.add(byte, Node::leaf(key, value));
                        None
                    }
                };
                (Node::Inner(inner), old)
            }
        }
    }

    fn remove_node(node: Node<V>, key: &[u8], depth: usize) -> (Option<Node<V>>, Option<V>) {
        let mut inner = match node {
            Node::Leaf(leaf) => {
                return if leaf.key == key {
                    (None, Some(leaf.value))
                } else {
                    (Some(Node::Leaf(leaf)), None)
                };
            }
            Node::Inner(inner) => inner,
        };
        let rest = &key[depth..];
        if rest.len() < inner.prefix.len() || rest[..inner.prefix.len()] != inner.prefix[..] {
            return (Some(Node::Inner(inner)), None);
        }
        let d = depth + inner.prefix.len();
        let removed = if key.len() == d {
            inner.terminal.take().map(|t| t.value)
        } else {
            let byte = key[d];
            match inner.children.remove(byte) {
                None => None,
                Some(child) => {
                    let (child, removed) = Self::remove_node(child, key, d + 1);
                    if let Some(child) = child {
                        inner.children.add(byte, child);
                    }
                    removed
                }
            }
        };
        if removed.is_none() {
            return (Some(Node::Inner(inner)), None);
        }
        inner.children.maybe_shrink();
        let node = match (inner.children.len(), inner.terminal.is_some()) {
            (0, true) => {
                let terminal = match inner.terminal.take() {
                    Some(t) => t,
                    None => unreachable!("terminal presence just checked"),
                };
                Node::Leaf(Box::new(terminal))
            }
            (0, false) => return (None, removed),
            (1, false) => {
                // fold the lone child back into this node's edge
                let (byte, child) = inner.children.pop_only();
                match child {
                    Node::Leaf(leaf) => Node::Leaf(leaf),
                    Node::Inner(mut child) => {
                        let mut prefix = std::mem::take(&mut inner.prefix);
                        prefix.push(byte);
                        prefix.extend_from_slice(&child.prefix);
                        child.prefix = prefix;
                        Node::Inner(child)
                    }
                }
            }
            _ => Node::Inner(inner),
        };
        (Some(node), removed)
    }

    fn min_leaf(node: &Node<V>) -> &LeafNode<V> {
        match node {
            Node::Leaf(leaf) => leaf,
            Node::Inner(inner) => match &inner.terminal {
                Some(t) => t,
                None => match inner.children.min() {
                    Some((_, child)) => Self::min_leaf(child),
                    None => unreachable!("inner node without terminal has children"),
                },
            },
        }
    }

    fn max_leaf(node: &Node<V>) -> &LeafNode<V> {
        match node {
            Node::Leaf(leaf) => leaf,
            Node::Inner(inner) => match inner.children.max() {
                Some((_, child)) => Self::max_leaf(child),
                None => match &inner.terminal {
                    Some(t) => t,
                    None => unreachable!("inner node has a terminal or a child"),
                },
            },
        }
    }

    fn pred_in<'a>(node: &'a Node<V>, key: &[u8], depth: usize) -> Option<&'a LeafNode<V>> {
        let inner = match node {
            Node::Leaf(leaf) => return (leaf.key[..] < *key).then_some(leaf),
            Node::Inner(inner) => inner,
        };
        let rest = &key[depth..];
        let m = common_prefix_len(&inner.prefix, rest);
        if m < inner.prefix.len() {
            if rest.len() == m || rest[m] < inner.prefix[m] {
                // every key below this node extends past or above the probe
                return None;
            }
            return Some(Self::max_leaf(node));
        }
        let d = depth + m;
        if key.len() == d {
            // probe ends here; the terminal equals it and children exceed it
            return None;
        }
        let byte = key[d];
        if let Some(child) = inner.children.get(byte) {
            if let Some(leaf) = Self::pred_in(child, key, d + 1) {
                return Some(leaf);
            }
        }
        if let Some((_, child)) = inner.children.max_below(byte) {
            return Some(Self::max_leaf(child));
        }
        inner.terminal.as_ref()
    }

    fn succ_in<'a>(node: &'a Node<V>, key: &[u8], depth: usize) -> Option<&'a LeafNode<V>> {
        let inner = match node {
            Node::Leaf(leaf) => return (leaf.key[..] > *key).then_some(leaf),
            Node::Inner(inner) => inner,
        };
        let rest = &key[depth..];
        let m = common_prefix_len(&inner.prefix, rest);
        if m < inner.prefix.len() {
            if rest.len() == m || rest[m] < inner.prefix[m] {
                return Some(Self::min_leaf(node));
            }
            return None;
        }
        let d = depth + m;
        if key.len() == d {
            // everything under a child extends the probe and so exceeds it
            let (_, child) = inner.children.min()?;
            return Some(Self::min_leaf(child));
        }
        let byte = key[d];
        if let Some(child) = inner.children.get(byte) {
            if let Some(leaf) = Self::succ_in(child, key, d + 1) {
                return Some(leaf);
            }
        }
        let (_, child) = inner.children.min_above(byte)?;
        Some(Self::min_leaf(child))
    }
}

fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

enum Frame<'a, V> {
    Node(&'a Node<V>),
    Entry(&'a LeafNode<V>),
}

/// Depth-first in-order traversal.
pub struct Iter<'a, V> {
    stack: Vec<Frame<'a, V>>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (Vec<u8>, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.stack.pop()? {
                Frame::Entry(leaf) => return Some((leaf.key.clone(), &leaf.value)),
                Frame::Node(Node::Leaf(leaf)) => return Some((leaf.key.clone(), &leaf.value)),
                Frame::Node(Node::Inner(inner)) => {
                    for (_, child) in inner.children.sorted().into_iter().rev() {
                        self.stack.push(Frame::Node(child));
                    }
                    if let Some(t) = &inner.terminal {
                        self.stack.push(Frame::Entry(t));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_of(keys: &[&str]) -> ByteMap<String> {
        let mut map = ByteMap::new();
        for &k in keys {
            assert_eq!(map.insert(k.as_bytes(), k.to_uppercase()), None);
        }
        map
    }

    #[test]
    fn test_insert_get() {
        let map = map_of(&["car", "cat", "dog"]);
        assert_eq!(map.len(), 3);
        assert_eq!(map.get(b"cat"), Some(&"CAT".to_string()));
        assert_eq!(map.get(b"ca"), None);
        assert_eq!(map.get(b"cats"), None);
        assert_eq!(map.get(b"d"), None);
    }

    #[test]
    fn test_predecessor_successor_between_keys() {
        let map = map_of(&["car", "cat", "dog"]);
        let (k, _) = map.predecessor(b"cas").unwrap();
        assert_eq!(k, b"car");
        let (k, _) = map.successor(b"cas").unwrap();
        assert_eq!(k, b"cat");
        let (k, _) = map.predecessor(b"zzz").unwrap();
        assert_eq!(k, b"dog");
        let (k, _) = map.successor(b"").unwrap();
        assert_eq!(k, b"car");
        assert_eq!(map.predecessor(b"car"), Err(Error::NotFound));
        assert_eq!(map.successor(b"dog"), Err(Error::NotFound));
    }

    #[test]
    fn test_key_prefix_of_key() {
        let mut map = ByteMap::new();
        map.insert(b"a", 1u32);
        map.insert(b"ab", 2);
        map.insert(b"abc", 3);
        assert_eq!(map.get(b"a"), Some(&1));
        assert_eq!(map.get(b"ab"), Some(&2));
        assert_eq!(map.get(b"abc"), Some(&3));
        // a proper prefix sorts before its extensions
        let (k, _) = map.predecessor(b"ab").unwrap();
        assert_eq!(k, b"a");
        let (k, _) = map.successor(b"ab").unwrap();
        assert_eq!(k, b"abc");
        let (k, _) = map.successor(b"a").unwrap();
        assert_eq!(k, b"ab");
        assert_eq!(map.remove(b"ab"), Some(2));
        let (k, _) = map.successor(b"a").unwrap();
        assert_eq!(k, b"abc");
    }

    #[test]
    fn test_empty_key() {
        let mut map = ByteMap::new();
        map.insert(b"", 0u32);
        map.insert(b"x", 1);
        assert_eq!(map.get(b""), Some(&0));
        assert_eq!(map.min().unwrap().0, b"");
        let (k, _) = map.predecessor(b"x").unwrap();
        assert_eq!(k, b"");
        assert_eq!(map.predecessor(b""), Err(Error::NotFound));
        assert_eq!(map.remove(b""), Some(0));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_reinsert_replaces_value() {
        let mut map = ByteMap::new();
        map.insert(b"key", 1u32);
        assert_eq!(map.insert(b"key", 2), Some(1));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(b"key"), Some(&2));
    }

    #[test]
    fn test_iter_sorted() {
        let map = map_of(&["dog", "cat", "car", "a", "ab", "b"]);
        let keys: Vec<Vec<u8>> = map.iter().map(|(k, _)| k).collect();
        let expected: Vec<Vec<u8>> = ["a", "ab", "b", "car", "cat", "dog"]
            .iter()
            .map(|s| s.as_bytes().to_vec())
            .collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn test_grow_through_all_representations() {
        let mut map = ByteMap::new();
        for b in 0..=255u8 {
            map.insert(&[b], u32::from(b));
        }
        assert_eq!(map.len(), 256);
        for b in 0..=255u8 {
            assert_eq!(map.get(&[b]), Some(&u32::from(b)));
        }
        let keys: Vec<Vec<u8>> = map.iter().map(|(k, _)| k).collect();
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
        // shrink back down
        for b in 4..=255u8 {
            assert_eq!(map.remove(&[b]), Some(u32::from(b)));
        }
        assert_eq!(map.len(), 4);
        assert_eq!(map.max().unwrap().0, vec![3]);
    }

    #[test]
    fn test_remove_collapses_paths() {
        let mut map = map_of(&["romane", "romanus", "romulus"]);
        assert_eq!(map.remove(b"romanus"), Some("ROMANUS".to_string()));
        assert_eq!(map.get(b"romane"), Some(&"ROMANE".to_string()));
        assert_eq!(map.get(b"romulus"), Some(&"ROMULUS".to_string()));
        assert_eq!(map.remove(b"romulus"), Some("ROMULUS".to_string()));
        assert_eq!(map.get(b"romane"), Some(&"ROMANE".to_string()));
        assert_eq!(map.remove(b"romane"), Some("ROMANE".to_string()));
        assert!(map.is_empty());
        assert_eq!(map.min(), None);
    }

    #[test]
    fn test_remove_absent() {
        let mut map = map_of(&["car", "cat"]);
        assert_eq!(map.remove(b"ca"), None);
        assert_eq!(map.remove(b"cab"), None);
        assert_eq!(map.remove(b"dog"), None);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_against_model() {
        use rand::prelude::*;
        use std::collections::BTreeMap;
        let mut rng = StdRng::seed_from_u64(0xb7e1);
        let mut map: ByteMap<u32> = ByteMap::new();
        let mut model: BTreeMap<Vec<u8>, u32> = BTreeMap::new();
        let random_key = |rng: &mut StdRng| -> Vec<u8> {
            let len = rng.gen_range(0..=4);
            (0..len).map(|_| rng.gen_range(b'a'..=b'e')).collect()
        };
        for step in 0..6000u32 {
            let key = random_key(&mut rng);
            if rng.gen_bool(0.6) {
                assert_eq!(map.insert(&key, step), model.insert(key.clone(), step));
            } else {
                assert_eq!(map.remove(&key), model.remove(&key));
            }
            assert_eq!(map.len(), model.len());
            let probe = random_key(&mut rng);
            let expect_pred = model.range(..probe.clone()).next_back();
            match map.predecessor(&probe) {
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
            match map.successor(&probe) {
                Ok((k, v)) => {
                    let (mk, mv) = expect_succ.unwrap();
                    assert_eq!(&k, mk);
                    assert_eq!(v, mv);
                }
                Err(Error::NotFound) => assert!(expect_succ.is_none()),
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        let map_keys: Vec<Vec<u8>> = map.iter().map(|(k, _)| k).collect();
        let model_keys: Vec<Vec<u8>> = model.keys().cloned().collect();
        assert_eq!(map_keys, model_keys);
    }
}
