//! Heap page layout constants.

use strata_common::PAGE_SIZE;

/// Size of the heap page header in bytes: page id, parent id, cell count.
pub const HEAP_HEADER_SIZE: usize = 10;

/// Offset of the parent id within the header.
pub const PARENT_ID_OFFSET: usize = 4;

/// Offset of the cell count within the header.
pub const CELL_COUNT_OFFSET: usize = 8;

/// Bytes available to a page once serialized into its slab.
pub const PAGE_CAPACITY: usize = PAGE_SIZE;
