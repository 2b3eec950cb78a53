//! Heap page storage.
//!
//! This module provides:
//! - HeapPage: row-id ordered cells serialized into a fixed-size slab
//! - Condition / Projection: single-column filters and column selection for
//!   page-level select, update and delete

pub mod constants;
mod page;
mod predicate;

pub use page::{HeapPage, HeapPageHeader, SelectIter};
pub use predicate::{CompareOp, Condition, Projection};
