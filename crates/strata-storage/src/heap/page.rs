//! Heap page holding row-id ordered cells.
//!
//! Serialized layout:
//! ```text
//! +--------------------+ 0
//! | page_id: u32 BE    | 4
//! | parent_id: u32 BE  | 8
//! | cell_count: u16 BE | 10 (HEAP_HEADER_SIZE)
//! +--------------------+
//! | cell 0             |  <- ascending row id
//! | cell 1             |
//! | ...                |
//! +--------------------+
//! | zero padding       |  <- slab form only, up to the page capacity
//! +--------------------+
//! ```

use super::constants::{CELL_COUNT_OFFSET, HEAP_HEADER_SIZE, PAGE_CAPACITY, PARENT_ID_OFFSET};
use super::predicate::{Condition, Projection, cell_matches};
use crate::cell::LeafCell;
use bytes::{Buf, BufMut};
use std::collections::BTreeMap;
use std::collections::btree_map;
use strata_common::{PageId, Result, StorageConfig, StrataError, TypedValue};

/// Fixed header at the start of every serialized page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapPageHeader {
    pub page_id: PageId,
    /// Parent or sibling page, `PageId::NONE` when unlinked.
    pub parent_id: PageId,
    pub cell_count: u16,
}

impl HeapPageHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = HEAP_HEADER_SIZE;

    /// Serializes to bytes.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..PARENT_ID_OFFSET].copy_from_slice(&self.page_id.as_u32().to_be_bytes());
        buf[PARENT_ID_OFFSET..CELL_COUNT_OFFSET]
            .copy_from_slice(&self.parent_id.as_u32().to_be_bytes());
        buf[CELL_COUNT_OFFSET..Self::SIZE].copy_from_slice(&self.cell_count.to_be_bytes());
        buf
    }

    /// Deserializes from the front of `buf`.
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::SIZE {
            return Err(StrataError::malformed(format!(
                "page header needs {} bytes, got {}",
                Self::SIZE,
                buf.len()
            )));
        }
        let mut cursor = &buf[..Self::SIZE];
        Ok(Self {
            page_id: PageId::new(cursor.get_u32()),
            parent_id: PageId::new(cursor.get_u32()),
            cell_count: cursor.get_u16(),
        })
    }
}

/// A page of cells keyed by row id.
///
/// The page performs no I/O. Capacity is advisory: [`HeapPage::can_fit`]
/// lets the owner decide when to start a new page, and only
/// [`HeapPage::to_slab`] enforces the slab size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapPage {
    page_id: PageId,
    parent_id: PageId,
    capacity: usize,
    cells: BTreeMap<u32, LeafCell>,
}

impl HeapPage {
    /// Creates a new empty page with the default `PAGE_SIZE` capacity.
    pub fn new(page_id: PageId, parent_id: PageId) -> Self {
        Self {
            page_id,
            parent_id,
            capacity: PAGE_CAPACITY,
            cells: BTreeMap::new(),
        }
    }

    /// Creates a new empty page sized by `config.page_size`.
    pub fn from_config(page_id: PageId, parent_id: PageId, config: &StorageConfig) -> Result<Self> {
        Self::new(page_id, parent_id).with_capacity(config.page_size)
    }

    /// Sets the slab size used by [`HeapPage::can_fit`] and [`HeapPage::to_slab`].
    ///
    /// Fails with `InvalidParameter` if the header alone would not fit.
    pub fn with_capacity(mut self, capacity: usize) -> Result<Self> {
        if capacity < HeapPageHeader::SIZE {
            return Err(StrataError::InvalidParameter {
                name: "page capacity".to_string(),
                value: capacity.to_string(),
            });
        }
        self.capacity = capacity;
        Ok(self)
    }

    /// Creates a page from existing cells.
    ///
    /// Fails with `InvalidParameter` if a cell is stored under another row id.
    pub fn with_cells(
        page_id: PageId,
        parent_id: PageId,
        cells: BTreeMap<u32, LeafCell>,
    ) -> Result<Self> {
        if let Some((row_id, cell)) = cells.iter().find(|(id, cell)| **id != cell.row_id()) {
            return Err(row_id_mismatch(*row_id, cell));
        }
        Ok(Self {
            page_id,
            parent_id,
            capacity: PAGE_CAPACITY,
            cells,
        })
    }

    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    #[inline]
    pub fn parent_id(&self) -> PageId {
        self.parent_id
    }

    pub fn set_parent_id(&mut self, parent_id: PageId) {
        self.parent_id = parent_id;
    }

    /// Returns the slab size in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the header describing this page.
    pub fn header(&self) -> HeapPageHeader {
        HeapPageHeader {
            page_id: self.page_id,
            parent_id: self.parent_id,
            cell_count: self.cells.len().min(u16::MAX as usize) as u16,
        }
    }

    /// Returns the number of cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns the row ids in ascending order.
    pub fn row_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.cells.keys().copied()
    }

    /// Returns the cell stored under `row_id`.
    pub fn get(&self, row_id: u32) -> Option<&LeafCell> {
        self.cells.get(&row_id)
    }

    /// Inserts a cell.
    pub fn insert(&mut self, row_id: u32, cell: LeafCell) -> Result<()> {
        if cell.row_id() != row_id {
            return Err(row_id_mismatch(row_id, &cell));
        }
        match self.cells.entry(row_id) {
            btree_map::Entry::Occupied(_) => Err(StrataError::DuplicateKey(row_id)),
            btree_map::Entry::Vacant(slot) => {
                slot.insert(cell);
                Ok(())
            }
        }
    }

    /// Returns the serialized size in bytes, without padding.
    pub fn size_on_disk(&self) -> usize {
        HeapPageHeader::SIZE + self.cells.values().map(LeafCell::size_on_disk).sum::<usize>()
    }

    /// Returns true if `cell` can be added without exceeding the slab size.
    pub fn can_fit(&self, cell: &LeafCell) -> bool {
        self.size_on_disk() + cell.size_on_disk() <= self.capacity
    }

    /// Returns the row ids of cells matching `predicate`, evaluated before any mutation.
    fn matching_rows(&self, predicate: Option<&Condition>) -> Result<Vec<u32>> {
        let mut rows = Vec::new();
        for (row_id, cell) in &self.cells {
            if cell_matches(cell, predicate)? {
                rows.push(*row_id);
            }
        }
        Ok(rows)
    }

    /// Sets `column` to `value` on every matching cell. Returns the number of rows touched.
    ///
    /// Nothing is modified if the predicate or the target column fails for any row.
    pub fn update(
        &mut self,
        column: usize,
        value: TypedValue,
        predicate: Option<&Condition>,
    ) -> Result<usize> {
        let rows = self.matching_rows(predicate)?;
        for row_id in &rows {
            if let Some(cell) = self.cells.get(row_id) {
                cell.get(column)?;
            }
        }

        for row_id in &rows {
            if let Some(cell) = self.cells.get_mut(row_id) {
                cell.set(column, value.clone())?;
            }
        }
        Ok(rows.len())
    }

    /// Removes every matching cell. Returns the number of rows removed.
    pub fn delete(&mut self, predicate: Option<&Condition>) -> Result<usize> {
        let rows = self.matching_rows(predicate)?;
        for row_id in &rows {
            self.cells.remove(row_id);
        }
        Ok(rows.len())
    }

    /// Lazily yields the projected values of matching rows in row-id order.
    pub fn select<'a>(
        &'a self,
        projection: &'a Projection,
        predicate: Option<&'a Condition>,
    ) -> SelectIter<'a> {
        SelectIter {
            cells: self.cells.values(),
            projection,
            predicate,
        }
    }

    /// Iterates over all cells in row-id order.
    pub fn iter(&self) -> impl Iterator<Item = &LeafCell> + '_ {
        self.cells.values()
    }

    /// Serializes the header and cells, without padding.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if self.cells.len() > u16::MAX as usize {
            return Err(StrataError::Overflow {
                type_name: "cell count".to_string(),
                value: self.cells.len().to_string(),
            });
        }
        let mut buf = Vec::with_capacity(self.size_on_disk());
        buf.put_slice(&self.header().to_bytes());
        for cell in self.cells.values() {
            cell.encode(&mut buf)?;
        }
        Ok(buf)
    }

    /// Serializes into a zero-padded slab of exactly `capacity` bytes.
    pub fn to_slab(&self) -> Result<Vec<u8>> {
        let mut buf = self.to_bytes()?;
        if buf.len() > self.capacity {
            return Err(StrataError::PageFull {
                size: buf.len(),
                capacity: self.capacity,
            });
        }
        buf.resize(self.capacity, 0);
        Ok(buf)
    }

    /// Deserializes a page. Bytes after the last cell are ignored.
    ///
    /// The capacity is the length of `bytes`, and never below `PAGE_SIZE`,
    /// so a slab reloads with the size it was written with.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let header = HeapPageHeader::from_bytes(bytes)?;
        let mut cursor = &bytes[HeapPageHeader::SIZE..];

        let mut cells = BTreeMap::new();
        for _ in 0..header.cell_count {
            let cell = LeafCell::decode(&mut cursor)?;
            let row_id = cell.row_id();
            if cells.insert(row_id, cell).is_some() {
                return Err(StrataError::malformed(format!(
                    "duplicate row id {} in {}",
                    row_id, header.page_id
                )));
            }
        }

        Ok(Self {
            page_id: header.page_id,
            parent_id: header.parent_id,
            capacity: bytes.len().max(PAGE_CAPACITY),
            cells,
        })
    }
}

fn row_id_mismatch(row_id: u32, cell: &LeafCell) -> StrataError {
    StrataError::InvalidParameter {
        name: "row_id".to_string(),
        value: format!("{} (cell carries {})", row_id, cell.row_id()),
    }
}

/// Iterator over the projected rows of a page that match a condition.
pub struct SelectIter<'a> {
    cells: btree_map::Values<'a, u32, LeafCell>,
    projection: &'a Projection,
    predicate: Option<&'a Condition>,
}

impl<'a> Iterator for SelectIter<'a> {
    type Item = Result<Vec<TypedValue>>;

    fn next(&mut self) -> Option<Self::Item> {
        for cell in self.cells.by_ref() {
            match cell_matches(cell, self.predicate) {
                Ok(true) => return Some(self.projection.apply(cell.record())),
                Ok(false) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}
