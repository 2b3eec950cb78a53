//! Configuration structures for Strata.

use crate::error::{Result, StrataError};
use crate::page::PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default B-tree order for index files.
pub const DEFAULT_INDEX_ORDER: usize = 5;

/// Smallest order that can satisfy the B-tree occupancy bounds.
pub const MIN_INDEX_ORDER: usize = 3;

/// Storage configuration for pages and index files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding table and index files.
    pub data_dir: PathBuf,
    /// Page slab size in bytes.
    pub page_size: usize,
    /// Maximum values per B-tree node for newly created indexes.
    pub index_order: usize,
    /// Enable fsync after every index file write.
    pub fsync_enabled: bool,
    /// Emit trace events for B-tree splits, rotations and merges.
    pub trace_rebalancing: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            page_size: PAGE_SIZE,
            index_order: DEFAULT_INDEX_ORDER,
            fsync_enabled: true,
            trace_rebalancing: false,
        }
    }
}

impl StorageConfig {
    /// Checks that the configuration values are usable.
    pub fn validate(&self) -> Result<()> {
        if self.index_order < MIN_INDEX_ORDER {
            return Err(StrataError::ConfigError(format!(
                "index_order must be at least {}, got {}",
                MIN_INDEX_ORDER, self.index_order
            )));
        }
        if self.page_size == 0 {
            return Err(StrataError::ConfigError(
                "page_size must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
