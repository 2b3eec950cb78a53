//! In-order traversal over a B-tree.

use super::arena::NodeId;
use super::index::BTreeIndex;
use std::ops::Bound;

/// Lazy in-order iterator over `(key, payload)` pairs.
///
/// Each stack frame `(node, i)` means `values[i]` of `node` is the next
/// value to yield from that node, after any frames above it are exhausted.
pub struct Iter<'a, K, V> {
    tree: &'a BTreeIndex<K, V>,
    stack: Vec<(NodeId, usize)>,
}

impl<'a, K: Ord, V> Iter<'a, K, V> {
    /// Positions the iterator at the first entry not below `start`.
    pub(crate) fn new(tree: &'a BTreeIndex<K, V>, start: Bound<&K>) -> Self {
        let mut stack = Vec::new();
        let mut id = tree.root;
        loop {
            let node = tree.arena.get(id);
            let i = match start {
                Bound::Unbounded => 0,
                Bound::Included(key) => node.values.partition_point(|(k, _)| k < key),
                Bound::Excluded(key) => node.values.partition_point(|(k, _)| k <= key),
            };
            stack.push((id, i));
            match node.children.get(i) {
                Some(&child) => id = child,
                None => break,
            }
        }
        Self { tree, stack }
    }

    fn push_leftmost(&mut self, mut id: NodeId) {
        loop {
            self.stack.push((id, 0));
            match self.tree.arena.get(id).children.first() {
                Some(&child) => id = child,
                None => return,
            }
        }
    }
}

impl<'a, K: Ord, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        loop {
            let (id, i) = *self.stack.last()?;
            let node = tree.arena.get(id);
            if i >= node.values.len() {
                self.stack.pop();
                continue;
            }

            if let Some(frame) = self.stack.last_mut() {
                frame.1 += 1;
            }
            if let Some(&child) = node.children.get(i + 1) {
                self.push_leftmost(child);
            }
            let (key, value) = &node.values[i];
            return Some((key, value));
        }
    }
}
