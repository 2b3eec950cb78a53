//! Index file store: one serialized B-tree per (table, column).
//!
//! Every operation is a whole-file cycle: load the tree, apply the change,
//! write it back. There is no caching and no locking, so callers must not
//! run operations on the same index concurrently.

use crate::btree::{BTreeIndex, INDEX_FILE_EXTENSION};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use strata_common::{Result, StorageConfig, StrataError, TypedValue};
use tracing::debug;

/// A column index: column value to row id.
pub type ColumnIndex = BTreeIndex<TypedValue, u32>;

/// Reads and writes index files inside the configured data directory.
#[derive(Debug, Clone)]
pub struct IndexFileStore {
    config: StorageConfig,
}

impl IndexFileStore {
    /// Creates a store, creating the data directory if needed.
    pub fn new(config: StorageConfig) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Returns the path of the index file for `table.column`.
    pub fn index_path(&self, table: &str, column: &str) -> PathBuf {
        self.config
            .data_dir
            .join(format!("{}_{}.{}", table, column, INDEX_FILE_EXTENSION))
    }

    /// Returns true if the index file exists.
    pub fn exists(&self, table: &str, column: &str) -> bool {
        self.index_path(table, column).is_file()
    }

    /// Loads an index. A missing file yields `None`.
    pub fn load(&self, table: &str, column: &str) -> Result<Option<ColumnIndex>> {
        let path = self.index_path(table, column);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "index file missing");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let mut tree = ColumnIndex::from_bytes(&bytes)?;
        tree.set_trace_rebalancing(self.config.trace_rebalancing);
        debug!(
            path = %path.display(),
            bytes = bytes.len(),
            entries = tree.len(),
            "loaded index"
        );
        Ok(Some(tree))
    }

    /// Writes an index, replacing any previous file.
    pub fn store(&self, table: &str, column: &str, tree: &ColumnIndex) -> Result<()> {
        let path = self.index_path(table, column);
        let bytes = tree.to_bytes()?;

        let mut file = File::create(&path)?;
        file.write_all(&bytes)?;
        if self.config.fsync_enabled {
            file.sync_all()?;
        }

        debug!(
            path = %path.display(),
            bytes = bytes.len(),
            entries = tree.len(),
            "stored index"
        );
        Ok(())
    }

    /// Creates (or overwrites) an index holding `entries`.
    pub fn initialize(
        &self,
        table: &str,
        column: &str,
        entries: impl IntoIterator<Item = (TypedValue, u32)>,
    ) -> Result<ColumnIndex> {
        let mut tree = ColumnIndex::from_entries(self.config.index_order, entries)?;
        tree.set_trace_rebalancing(self.config.trace_rebalancing);
        self.store(table, column, &tree)?;
        debug!(table, column, entries = tree.len(), "initialized index");
        Ok(tree)
    }

    fn load_or_create(&self, table: &str, column: &str) -> Result<ColumnIndex> {
        match self.load(table, column)? {
            Some(tree) => Ok(tree),
            None => ColumnIndex::from_config(&self.config),
        }
    }

    /// Adds `key -> row_id`, creating the index file if it is missing.
    ///
    /// Returns the row id previously stored under `key`, if any.
    pub fn index_insert(
        &self,
        table: &str,
        column: &str,
        key: TypedValue,
        row_id: u32,
    ) -> Result<Option<u32>> {
        let mut tree = self.load_or_create(table, column)?;
        let previous = tree.insert(key, row_id);
        self.store(table, column, &tree)?;
        debug!(table, column, row_id, replaced = previous.is_some(), "index insert");
        Ok(previous)
    }

    /// Removes `key` and returns its row id.
    ///
    /// Fails with `NotFound` if the index file or the key is missing.
    pub fn index_remove(&self, table: &str, column: &str, key: &TypedValue) -> Result<u32> {
        let path = self.index_path(table, column);
        let mut tree = self
            .load(table, column)?
            .ok_or_else(|| StrataError::NotFound(format!("index file {}", path.display())))?;

        let row_id = tree.remove(key).map_err(|e| match e {
            StrataError::NotFound(_) => {
                StrataError::NotFound(format!("key {} in {}", key, path.display()))
            }
            other => other,
        })?;
        self.store(table, column, &tree)?;
        debug!(table, column, row_id, "index remove");
        Ok(row_id)
    }

    /// Looks up `key`. A missing index file is treated as an empty index.
    pub fn index_search(&self, table: &str, column: &str, key: &TypedValue) -> Result<Option<u32>> {
        Ok(self
            .load(table, column)?
            .and_then(|tree| tree.search(key).copied()))
    }

    /// Returns every `(key, row_id)` whose key lies in `[low, high]`.
    pub fn index_range(
        &self,
        table: &str,
        column: &str,
        low: &TypedValue,
        high: &TypedValue,
    ) -> Result<Vec<(TypedValue, u32)>> {
        let Some(tree) = self.load(table, column)? else {
            return Ok(Vec::new());
        };
        Ok(tree
            .range(low.clone()..=high.clone())
            .map(|(k, v)| (k.clone(), *v))
            .collect())
    }

    /// Deletes the index file. Returns false if there was none.
    pub fn drop_index(&self, table: &str, column: &str) -> Result<bool> {
        let path = self.index_path(table, column);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "dropped index");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn create_test_store() -> (IndexFileStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let config = StorageConfig {
            data_dir: dir.path().to_path_buf(),
            fsync_enabled: false,
            ..Default::default()
        };
        (IndexFileStore::new(config).unwrap(), dir)
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let dir = tempdir().unwrap();
        let config = StorageConfig {
            data_dir: dir.path().to_path_buf(),
            index_order: 1,
            ..Default::default()
        };
        assert!(matches!(
            IndexFileStore::new(config),
            Err(StrataError::ConfigError(_))
        ));
    }

    #[test]
    fn test_index_path() {
        let (store, dir) = create_test_store();
        assert_eq!(
            store.index_path("people", "age"),
            dir.path().join("people_age.ndx")
        );
        assert_eq!(store.data_dir(), dir.path());
    }

    #[test]
    fn test_insert_creates_file() {
        let (store, _dir) = create_test_store();
        assert!(!store.exists("t", "c"));
        assert_eq!(store.index_insert("t", "c", TypedValue::Int(5), 1).unwrap(), None);
        assert!(store.exists("t", "c"));
        assert_eq!(store.index_search("t", "c", &TypedValue::Int(5)).unwrap(), Some(1));
    }

    #[test]
    fn test_insert_replaces_row_id() {
        let (store, _dir) = create_test_store();
        store.index_insert("t", "c", TypedValue::Int(5), 1).unwrap();
        assert_eq!(
            store.index_insert("t", "c", TypedValue::Int(5), 2).unwrap(),
            Some(1)
        );
        assert_eq!(store.index_search("t", "c", &TypedValue::Int(5)).unwrap(), Some(2));
    }

    #[test]
    fn test_search_missing_file_is_none() {
        let (store, _dir) = create_test_store();
        assert_eq!(store.index_search("t", "c", &TypedValue::Int(1)).unwrap(), None);
        assert!(store.load("t", "c").unwrap().is_none());
    }

    #[test]
    fn test_remove_missing_file_and_key() {
        let (store, _dir) = create_test_store();
        let err = store.index_remove("t", "c", &TypedValue::Int(1)).unwrap_err();
        assert!(err.is_not_found());

        store.index_insert("t", "c", TypedValue::Int(2), 20).unwrap();
        let err = store.index_remove("t", "c", &TypedValue::Int(1)).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("key 1"));

        assert_eq!(store.index_remove("t", "c", &TypedValue::Int(2)).unwrap(), 20);
        assert_eq!(store.index_search("t", "c", &TypedValue::Int(2)).unwrap(), None);
    }

    #[test]
    fn test_initialize_and_range() {
        let (store, _dir) = create_test_store();
        let entries = (0..40).map(|i| (TypedValue::Int(i), i as u32 + 100));
        let tree = store.initialize("t", "id", entries).unwrap();
        assert_eq!(tree.len(), 40);
        assert_eq!(tree.order(), store.config().index_order);

        let hits = store
            .index_range("t", "id", &TypedValue::Int(10), &TypedValue::Int(12))
            .unwrap();
        assert_eq!(
            hits,
            vec![
                (TypedValue::Int(10), 110),
                (TypedValue::Int(11), 111),
                (TypedValue::Int(12), 112),
            ]
        );
        assert!(store
            .index_range("t", "other", &TypedValue::Int(0), &TypedValue::Int(1))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_corrupt_file_is_malformed() {
        let (store, _dir) = create_test_store();
        fs::write(store.index_path("t", "c"), b"not an index").unwrap();
        assert!(matches!(
            store.load("t", "c"),
            Err(StrataError::MalformedFile(_))
        ));
    }

    #[test]
    fn test_drop_index() {
        let (store, _dir) = create_test_store();
        store.index_insert("t", "c", TypedValue::from("x"), 1).unwrap();
        assert!(store.drop_index("t", "c").unwrap());
        assert!(!store.exists("t", "c"));
        assert!(!store.drop_index("t", "c").unwrap());
    }

    #[test]
    fn test_fsync_enabled_store() {
        let dir = tempdir().unwrap();
        let store = IndexFileStore::new(StorageConfig {
            data_dir: dir.path().join("nested"),
            ..Default::default()
        })
        .unwrap();
        store.index_insert("t", "c", TypedValue::Long(9), 9).unwrap();
        assert_eq!(store.index_search("t", "c", &TypedValue::Long(9)).unwrap(), Some(9));
    }
}
