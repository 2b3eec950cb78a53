//! B-tree index constants for node occupancy and the index file format.

use strata_common::{DEFAULT_INDEX_ORDER, MIN_INDEX_ORDER};

// Node occupancy

/// Default maximum values per node.
pub const DEFAULT_ORDER: usize = DEFAULT_INDEX_ORDER;

/// Smallest order that keeps split halves and merges within bounds.
pub const MIN_ORDER: usize = MIN_INDEX_ORDER;

// Index file format

/// Magic bytes opening every index file.
pub const INDEX_MAGIC: [u8; 4] = *b"SNDX";

/// Current index file format version.
pub const INDEX_FORMAT_VERSION: u8 = 1;

/// File extension of index files.
pub const INDEX_FILE_EXTENSION: &str = "ndx";

/// magic (4) + version (1) + order (2) + entry_count (4).
pub(crate) const INDEX_HEADER_SIZE: usize = 11;

/// Node kind byte of a leaf.
pub(crate) const NODE_KIND_LEAF: u8 = 0;

/// Node kind byte of a branch.
pub(crate) const NODE_KIND_BRANCH: u8 = 1;

/// Deepest node nesting accepted when decoding. A tree of order 3 holding
/// 2^32 entries is far shallower than this.
pub(crate) const MAX_DECODE_DEPTH: usize = 64;
