//! B-tree index for column lookups.
//!
//! Entries map a column value to the id of the row holding it. Every node
//! stores entries, so lookups can finish at a branch:
//!
//! ```text
//!                 <Branch [11]>
//!                /             \
//!   <Leaf [2, 3, 5, 7]>    <Leaf [12, 13, 14]>
//! ```
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]. Inserts
//! that overfill a node rotate a value into a sibling with room or split
//! the node; removals that underfill a node borrow from a sibling or merge
//! with one. The whole tree serializes to a versioned byte layout (see
//! [`codec`]) that [`crate::IndexFileStore`] keeps one file per column.

pub mod arena;
pub mod codec;
pub mod constants;
mod index;
mod iter;
mod rebalance;

pub use arena::NodeId;
pub use codec::IndexCodec;
pub use constants::{DEFAULT_ORDER, INDEX_FILE_EXTENSION, INDEX_FORMAT_VERSION, INDEX_MAGIC, MIN_ORDER};
pub use index::BTreeIndex;
pub use iter::Iter;
