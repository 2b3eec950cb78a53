//! Storage engine for Strata.
//!
//! This crate provides:
//! - Record codec: typed rows with a self-describing byte layout
//! - Leaf cells pairing a row id with its record
//! - Heap pages holding row-id ordered cells, with filtered select, update
//!   and delete
//! - B-tree index mapping column values to row ids
//! - Index file store persisting one B-tree per (table, column)

pub mod btree;
mod cell;
pub mod heap;
mod record;
mod store;

pub use btree::{BTreeIndex, IndexCodec, Iter, NodeId};
pub use cell::{LeafCell, ROW_ID_SIZE};
pub use heap::{CompareOp, Condition, HeapPage, HeapPageHeader, Projection, SelectIter};
pub use record::{MAX_COLUMNS, Record};
pub use store::{ColumnIndex, IndexFileStore};
