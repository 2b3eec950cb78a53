//! Balanced tree index keyed by column values.
//!
//! A classic B-tree: every node, branch or leaf, stores `(key, payload)`
//! pairs, so a lookup may stop at a branch. Nodes hold at most `order`
//! values; every node except the root holds at least `order / 2`.

use super::arena::{Node, NodeArena, NodeId};
use super::constants::{DEFAULT_ORDER, MIN_ORDER};
use super::iter::Iter;
use std::ops::{Bound, RangeBounds};
use strata_common::{Result, StorageConfig, StrataError};
use tracing::trace;

/// Ancestors of a node, root first, each paired with the child slot taken.
pub(crate) type Path = Vec<(NodeId, usize)>;

/// Where a key lookup ended.
pub(crate) struct Location {
    pub(crate) path: Path,
    pub(crate) node: NodeId,
    /// `Ok(i)` if the key is `values[i]`; `Err(i)` is the leaf insertion slot.
    pub(crate) slot: std::result::Result<usize, usize>,
}

/// In-memory B-tree mapping keys to payloads.
#[derive(Debug, Clone)]
pub struct BTreeIndex<K, V> {
    pub(crate) order: usize,
    pub(crate) arena: NodeArena<K, V>,
    pub(crate) root: NodeId,
    pub(crate) len: usize,
    trace_rebalancing: bool,
}

impl<K: Ord, V> BTreeIndex<K, V> {
    /// Creates an empty tree. Fails with `InvalidParameter` if `order < 3`.
    pub fn new(order: usize) -> Result<Self> {
        if order < MIN_ORDER {
            return Err(StrataError::InvalidParameter {
                name: "order".to_string(),
                value: order.to_string(),
            });
        }
        let mut arena = NodeArena::new();
        let root = arena.allocate(Node::default());
        Ok(Self {
            order,
            arena,
            root,
            len: 0,
            trace_rebalancing: false,
        })
    }

    /// Creates an empty tree using the configured order and tracing flag.
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        let mut tree = Self::new(config.index_order)?;
        tree.trace_rebalancing = config.trace_rebalancing;
        Ok(tree)
    }

    /// Builds a tree from entries. A repeated key keeps the last payload.
    pub fn from_entries(order: usize, entries: impl IntoIterator<Item = (K, V)>) -> Result<Self> {
        let mut tree = Self::new(order)?;
        for (key, value) in entries {
            tree.insert(key, value);
        }
        Ok(tree)
    }

    /// Enables or disables trace events for splits, rotations and merges.
    pub fn set_trace_rebalancing(&mut self, enabled: bool) {
        self.trace_rebalancing = enabled;
    }

    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of allocated nodes.
    pub fn node_count(&self) -> usize {
        self.arena.live_nodes()
    }

    /// Fewest values a non-root node may hold.
    #[inline]
    pub(crate) fn min_values(&self) -> usize {
        self.order / 2
    }

    /// Returns the number of levels; an empty tree has height 1.
    pub fn height(&self) -> usize {
        let mut height = 1;
        let mut node = self.arena.get(self.root);
        while let Some(&child) = node.children.first() {
            height += 1;
            node = self.arena.get(child);
        }
        height
    }

    /// Returns the payload stored under `key`.
    pub fn search(&self, key: &K) -> Option<&V> {
        let mut id = self.root;
        loop {
            let node = self.arena.get(id);
            match node.values.binary_search_by(|(k, _)| k.cmp(key)) {
                Ok(i) => return Some(&node.values[i].1),
                Err(i) if !node.is_leaf() => id = node.children[i],
                Err(_) => return None,
            }
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.search(key).is_some()
    }

    /// Descends toward `key`, recording the ancestor path.
    pub(crate) fn locate(&self, key: &K) -> Location {
        let mut path = Path::new();
        let mut id = self.root;
        loop {
            let node = self.arena.get(id);
            match node.values.binary_search_by(|(k, _)| k.cmp(key)) {
                Err(i) if !node.is_leaf() => {
                    path.push((id, i));
                    id = node.children[i];
                }
                slot => {
                    return Location {
                        path,
                        node: id,
                        slot,
                    };
                }
            }
        }
    }

    /// Inserts an entry. An existing key keeps its place and has its payload
    /// replaced; the previous payload is returned.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let Location { path, node, slot } = self.locate(&key);
        match slot {
            Ok(i) => Some(std::mem::replace(
                &mut self.arena.get_mut(node).values[i].1,
                value,
            )),
            Err(i) => {
                let leaf = self.arena.get_mut(node);
                leaf.values.insert(i, (key, value));
                let overfull = leaf.values.len() > self.order;
                self.len += 1;
                if overfull {
                    self.contract(node, path);
                }
                None
            }
        }
    }

    /// Removes `key` and returns its payload.
    ///
    /// Fails with `NotFound`, leaving the tree untouched, if the key is absent.
    pub fn remove(&mut self, key: &K) -> Result<V> {
        let Location {
            mut path,
            node,
            slot,
        } = self.locate(key);
        let Ok(i) = slot else {
            return Err(StrataError::NotFound("key not present in index".to_string()));
        };

        let (leaf, removed) = if self.arena.get(node).is_leaf() {
            (node, self.arena.get_mut(node).values.remove(i))
        } else {
            self.replace_with_neighbor(node, i, &mut path)?
        };
        self.len -= 1;

        if self.arena.get(leaf).values.len() < self.min_values() && !path.is_empty() {
            self.expand(leaf, path);
        }
        Ok(removed.1)
    }

    /// Replaces branch value `i` with its in-order neighbor taken from a leaf.
    ///
    /// Prefers the right subtree's minimum when that leaf can spare a value,
    /// otherwise takes the left subtree's maximum. Extends `path` down to the
    /// donor leaf and returns it with the entry that left the branch.
    fn replace_with_neighbor(
        &mut self,
        branch: NodeId,
        i: usize,
        path: &mut Path,
    ) -> Result<(NodeId, (K, V))> {
        let right = self.arena.get(branch).children[i + 1];
        let (right_leaf, right_path) = self.descend(right, |_| 0);

        let (leaf, donor) = if self.arena.get(right_leaf).values.len() > self.min_values() {
            path.push((branch, i + 1));
            path.extend(right_path);
            (right_leaf, Some(self.arena.get_mut(right_leaf).values.remove(0)))
        } else {
            let left = self.arena.get(branch).children[i];
            let (left_leaf, left_path) = self.descend(left, |node| node.children.len() - 1);
            path.push((branch, i));
            path.extend(left_path);
            (left_leaf, self.arena.get_mut(left_leaf).values.pop())
        };

        let donor = donor.ok_or_else(|| {
            StrataError::BTreeCorrupted(format!("empty leaf {} below branch {}", leaf, branch))
        })?;
        let removed = std::mem::replace(&mut self.arena.get_mut(branch).values[i], donor);
        Ok((leaf, removed))
    }

    /// Walks from `start` to a leaf, choosing each child with `pick`.
    fn descend(&self, start: NodeId, pick: impl Fn(&Node<K, V>) -> usize) -> (NodeId, Path) {
        let mut path = Path::new();
        let mut id = start;
        loop {
            let node = self.arena.get(id);
            if node.is_leaf() {
                return (id, path);
            }
            let slot = pick(node);
            path.push((id, slot));
            id = node.children[slot];
        }
    }

    /// Iterates over all entries in key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self, Bound::Unbounded)
    }

    /// Iterates over all keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    /// Iterates in key order over the entries whose keys fall within `range`.
    pub fn range<'a, R>(&'a self, range: R) -> impl Iterator<Item = (&'a K, &'a V)> + 'a
    where
        R: RangeBounds<K> + 'a,
    {
        let iter = Iter::new(self, range.start_bound());
        iter.take_while(move |(key, _)| match range.end_bound() {
            Bound::Included(end) => *key <= end,
            Bound::Excluded(end) => *key < end,
            Bound::Unbounded => true,
        })
    }

    /// Emits a rebalancing trace event when enabled.
    pub(crate) fn trace_step(&self, step: &'static str, node: NodeId) {
        if self.trace_rebalancing {
            trace!(step, %node, root = %self.root, entries = self.len, "btree rebalance");
        }
    }

    /// Verifies ordering, occupancy, leaf depth and entry count.
    pub fn check_invariants(&self) -> Result<()> {
        let mut leaf_depth = None;
        let count = self.check_node(self.root, None, None, 0, &mut leaf_depth)?;
        if count != self.len {
            return Err(StrataError::BTreeCorrupted(format!(
                "tree holds {} entries but records {}",
                count, self.len
            )));
        }
        Ok(())
    }

    fn check_node(
        &self,
        id: NodeId,
        lower: Option<&K>,
        upper: Option<&K>,
        depth: usize,
        leaf_depth: &mut Option<usize>,
    ) -> Result<usize> {
        let corrupted = |reason: String| Err(StrataError::BTreeCorrupted(reason));
        let node = self.arena.get(id);
        let is_root = id == self.root;

        if node.values.len() > self.order {
            return corrupted(format!("{} holds {} values", id, node.values.len()));
        }
        if !is_root && node.values.len() < self.min_values() {
            return corrupted(format!("{} underflows with {} values", id, node.values.len()));
        }
        if node.values.windows(2).any(|w| w[0].0 >= w[1].0) {
            return corrupted(format!("{} values out of order", id));
        }
        if let (Some(low), Some((first, _))) = (lower, node.values.first()) {
            if first <= low {
                return corrupted(format!("{} violates its lower bound", id));
            }
        }
        if let (Some(high), Some((last, _))) = (upper, node.values.last()) {
            if last >= high {
                return corrupted(format!("{} violates its upper bound", id));
            }
        }

        if node.is_leaf() {
            match *leaf_depth {
                Some(expected) if expected != depth => {
                    return corrupted(format!("{} at depth {}, expected {}", id, depth, expected));
                }
                _ => *leaf_depth = Some(depth),
            }
            return Ok(node.values.len());
        }

        if node.children.len() != node.values.len() + 1 {
            return corrupted(format!(
                "{} has {} values and {} children",
                id,
                node.values.len(),
                node.children.len()
            ));
        }
        if node.values.is_empty() {
            return corrupted(format!("branch {} holds no values", id));
        }

        let mut count = node.values.len();
        for (i, &child) in node.children.iter().enumerate() {
            let low = if i == 0 { lower } else { Some(&node.values[i - 1].0) };
            let high = node.values.get(i).map(|(k, _)| k).or(upper);
            count += self.check_node(child, low, high, depth + 1, leaf_depth)?;
        }
        Ok(count)
    }
}

impl<K: Ord, V> Default for BTreeIndex<K, V> {
    fn default() -> Self {
        let mut arena = NodeArena::new();
        let root = arena.allocate(Node::default());
        Self {
            order: DEFAULT_ORDER,
            arena,
            root,
            len: 0,
            trace_rebalancing: false,
        }
    }
}

impl<'a, K: Ord, V> IntoIterator for &'a BTreeIndex<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Prints one node per line, indented by depth.
impl<K: Ord + std::fmt::Display, V> std::fmt::Display for BTreeIndex<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut stack = vec![(self.root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let node = self.arena.get(id);
            let kind = if node.is_leaf() { "Leaf" } else { "Branch" };
            write!(f, "{:indent$}<{} [", "", kind, indent = depth * 2)?;
            for (i, (key, _)) in node.values.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", key)?;
            }
            writeln!(f, "]>")?;
            stack.extend(node.children.iter().rev().map(|&child| (child, depth + 1)));
        }
        Ok(())
    }
}
