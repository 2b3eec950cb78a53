//! Arena allocation for B-tree nodes.
//!
//! Nodes refer to each other by [`NodeId`] rather than by pointer, so the
//! tree can be restructured (splits, merges, root swaps) with plain index
//! updates. Freed slots are recycled by later allocations.

/// Handle of a node inside a [`NodeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node:{}", self.0)
    }
}

/// A tree node. Leaves have no children; a branch with k values has k + 1
/// children.
#[derive(Debug, Clone)]
pub(crate) struct Node<K, V> {
    pub(crate) values: Vec<(K, V)>,
    pub(crate) children: Vec<NodeId>,
}

impl<K, V> Node<K, V> {
    pub(crate) fn leaf(values: Vec<(K, V)>) -> Self {
        Self {
            values,
            children: Vec::new(),
        }
    }

    pub(crate) fn branch(values: Vec<(K, V)>, children: Vec<NodeId>) -> Self {
        Self { values, children }
    }

    #[inline]
    pub(crate) fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

impl<K, V> Default for Node<K, V> {
    fn default() -> Self {
        Self::leaf(Vec::new())
    }
}

/// Slot storage for nodes with a free list.
#[derive(Debug, Clone)]
pub(crate) struct NodeArena<K, V> {
    nodes: Vec<Node<K, V>>,
    free: Vec<NodeId>,
}

impl<K, V> NodeArena<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Stores a node and returns its handle, reusing a freed slot if any.
    pub(crate) fn allocate(&mut self, node: Node<K, V>) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id.index()] = node;
                id
            }
            None => {
                let id = NodeId(self.nodes.len() as u32);
                self.nodes.push(node);
                id
            }
        }
    }

    /// Releases a node, returning its contents.
    pub(crate) fn free(&mut self, id: NodeId) -> Node<K, V> {
        let node = std::mem::take(&mut self.nodes[id.index()]);
        self.free.push(id);
        node
    }

    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> &Node<K, V> {
        &self.nodes[id.index()]
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        &mut self.nodes[id.index()]
    }

    /// Returns the number of live nodes.
    pub(crate) fn live_nodes(&self) -> usize {
        self.nodes.len() - self.free.len()
    }
}
