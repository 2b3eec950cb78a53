//! Leaf cells: a row id paired with its record.

use crate::record::Record;
use bytes::{Buf, BufMut};
use strata_common::{Result, StrataError, TypedValue};

/// Size of the row id prefix in bytes.
pub const ROW_ID_SIZE: usize = 4;

/// One row stored in a page.
///
/// Layout: `[row_id: u32 BE][record bytes]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafCell {
    row_id: u32,
    record: Record,
}

impl LeafCell {
    /// Creates a new cell.
    pub fn new(row_id: u32, record: Record) -> Self {
        Self { row_id, record }
    }

    #[inline]
    pub fn row_id(&self) -> u32 {
        self.row_id
    }

    #[inline]
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Returns the value at column `index`.
    pub fn get(&self, index: usize) -> Result<&TypedValue> {
        self.record.get(index)
    }

    /// Overwrites the value at column `index`.
    pub fn set(&mut self, index: usize, value: TypedValue) -> Result<()> {
        self.record.set(index, value)
    }

    /// Returns the serialized size in bytes.
    pub fn size_on_disk(&self) -> usize {
        ROW_ID_SIZE + self.record.size_on_disk()
    }

    /// Writes the cell to `buf`.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        buf.put_u32(self.row_id);
        self.record.encode(buf)
    }

    /// Serializes the cell to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.size_on_disk());
        self.encode(&mut buf)?;
        Ok(buf)
    }

    /// Reads one cell from the front of `buf`, advancing past it.
    pub fn decode(buf: &mut impl Buf) -> Result<Self> {
        if buf.remaining() < ROW_ID_SIZE {
            return Err(StrataError::malformed("truncated cell row id"));
        }
        let row_id = buf.get_u32();
        let record = Record::decode(buf)?;
        Ok(Self { row_id, record })
    }
}
