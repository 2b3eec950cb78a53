//! Rebalancing after inserts (contract) and removals (expand).
//!
//! Both walk back up the ancestor path recorded by the descent. A step
//! either resolves the imbalance locally through a rotation with a sibling
//! or restructures the parent (split or merge) and continues one level up.

use super::arena::{Node, NodeId};
use super::index::{BTreeIndex, Path};

impl<K: Ord, V> BTreeIndex<K, V> {
    /// Resolves an overfull node.
    ///
    /// Lends a boundary value to the left sibling if it has room, else to the
    /// right sibling. Otherwise splits and pushes the median into the parent,
    /// growing a new root when the node was the root.
    pub(crate) fn contract(&mut self, mut id: NodeId, mut path: Path) {
        while self.arena.get(id).values.len() > self.order {
            let Some((parent, idx)) = path.pop() else {
                let new_root = self.arena.allocate(Node::branch(Vec::new(), vec![id]));
                self.root = new_root;
                self.split(new_root, 0);
                self.trace_step("root split", new_root);
                return;
            };

            let siblings = self.arena.get(parent).children.len();
            if idx > 0 && self.child_len(parent, idx - 1) < self.order {
                self.lateral(parent, idx, idx - 1);
                self.trace_step("lend left", id);
                return;
            }
            if idx + 1 < siblings && self.child_len(parent, idx + 1) < self.order {
                self.lateral(parent, idx, idx + 1);
                self.trace_step("lend right", id);
                return;
            }

            self.split(parent, idx);
            self.trace_step("split", id);
            id = parent;
        }
    }

    /// Resolves an underfull non-root node.
    ///
    /// Borrows from the right sibling if it can spare a value, else from the
    /// left. Otherwise merges with a sibling around the separating parent
    /// value. An emptied root is replaced by its only child.
    pub(crate) fn expand(&mut self, mut id: NodeId, mut path: Path) {
        let min = self.min_values();
        while self.arena.get(id).values.len() < min {
            let Some((parent, idx)) = path.pop() else {
                return;
            };

            let siblings = self.arena.get(parent).children.len();
            if idx + 1 < siblings && self.child_len(parent, idx + 1) > min {
                self.lateral(parent, idx + 1, idx);
                self.trace_step("borrow right", id);
                return;
            }
            if idx > 0 && self.child_len(parent, idx - 1) > min {
                self.lateral(parent, idx - 1, idx);
                self.trace_step("borrow left", id);
                return;
            }

            let left = if idx > 0 { idx - 1 } else { idx };
            self.merge(parent, left);
            self.trace_step("merge", id);

            if path.is_empty() {
                let root = self.arena.get(parent);
                if root.values.is_empty() {
                    let survivor = root.children[0];
                    self.arena.free(parent);
                    self.root = survivor;
                    self.trace_step("root collapse", survivor);
                }
                return;
            }
            id = parent;
        }
    }

    fn child_len(&self, parent: NodeId, idx: usize) -> usize {
        let child = self.arena.get(parent).children[idx];
        self.arena.get(child).values.len()
    }

    /// Rotates one value from child `src` to adjacent child `dest` through
    /// the separating parent value, carrying the boundary grandchild along.
    fn lateral(&mut self, parent: NodeId, src: usize, dest: usize) {
        let sep = src.min(dest);
        let (src_id, dest_id) = {
            let node = self.arena.get(parent);
            (node.children[src], node.children[dest])
        };

        if dest < src {
            let source = self.arena.get_mut(src_id);
            let up = source.values.remove(0);
            let child = (!source.is_leaf()).then(|| source.children.remove(0));

            let down = std::mem::replace(&mut self.arena.get_mut(parent).values[sep], up);
            let target = self.arena.get_mut(dest_id);
            target.values.push(down);
            target.children.extend(child);
        } else {
            let source = self.arena.get_mut(src_id);
            let Some(up) = source.values.pop() else {
                return;
            };
            let child = source.children.pop();

            let down = std::mem::replace(&mut self.arena.get_mut(parent).values[sep], up);
            let target = self.arena.get_mut(dest_id);
            target.values.insert(0, down);
            if let Some(child) = child {
                target.children.insert(0, child);
            }
        }
    }

    /// Splits child `idx` of `parent` at its midpoint. The median moves into
    /// the parent and the upper half becomes a new right sibling.
    fn split(&mut self, parent: NodeId, idx: usize) {
        let child = self.arena.get(parent).children[idx];
        let node = self.arena.get_mut(child);
        let mid = node.values.len() / 2;

        let upper_values = node.values.split_off(mid + 1);
        let upper_children = if node.is_leaf() {
            Vec::new()
        } else {
            node.children.split_off(mid + 1)
        };
        let Some(median) = node.values.pop() else {
            return;
        };

        let sibling = self
            .arena
            .allocate(Node::branch(upper_values, upper_children));
        let parent_node = self.arena.get_mut(parent);
        parent_node.values.insert(idx, median);
        parent_node.children.insert(idx + 1, sibling);
    }

    /// Folds child `left + 1` and the separator `values[left]` into child `left`.
    fn merge(&mut self, parent: NodeId, left: usize) {
        let parent_node = self.arena.get_mut(parent);
        let right_id = parent_node.children.remove(left + 1);
        let separator = parent_node.values.remove(left);
        let left_id = parent_node.children[left];

        let right = self.arena.free(right_id);
        let target = self.arena.get_mut(left_id);
        target.values.push(separator);
        target.values.extend(right.values);
        target.children.extend(right.children);
    }
}
