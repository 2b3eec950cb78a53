//! Record representation and serialization.
//!
//! A record is an ordered row of typed values. Its byte form is
//! self-describing:
//!
//! ```text
//! +--------------+-----------------+---------------------------+
//! | count: u8    | tags: [u8; N]   | payloads (concatenated)   |
//! +--------------+-----------------+---------------------------+
//! ```

use bytes::{Buf, BufMut};
use strata_common::{Result, StrataError, TypeId, TypedValue};

/// Maximum number of columns a record can hold.
pub const MAX_COLUMNS: usize = u8::MAX as usize;

/// A row of typed column values.
///
/// The number of columns is fixed at construction. Individual values may be
/// overwritten, including with a value of a different type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    values: Vec<TypedValue>,
}

impl Record {
    /// Creates a record from column values.
    pub fn new(values: Vec<TypedValue>) -> Result<Self> {
        if values.len() > MAX_COLUMNS {
            return Err(StrataError::Overflow {
                type_name: "column count".to_string(),
                value: values.len().to_string(),
            });
        }
        Ok(Self { values })
    }

    /// Returns the number of columns.
    #[inline]
    pub fn column_count(&self) -> usize {
        self.values.len()
    }

    /// Returns all column values in order.
    #[inline]
    pub fn values(&self) -> &[TypedValue] {
        &self.values
    }

    /// Returns the value at column `index`.
    pub fn get(&self, index: usize) -> Result<&TypedValue> {
        self.values.get(index).ok_or(StrataError::IndexOutOfRange {
            index,
            len: self.values.len(),
        })
    }

    /// Overwrites the value at column `index`.
    pub fn set(&mut self, index: usize, value: TypedValue) -> Result<()> {
        let len = self.values.len();
        let slot = self
            .values
            .get_mut(index)
            .ok_or(StrataError::IndexOutOfRange { index, len })?;
        *slot = value;
        Ok(())
    }

    /// Returns the tag byte of every column.
    pub fn tags(&self) -> Result<Vec<u8>> {
        self.values.iter().map(TypedValue::tag).collect()
    }

    /// Returns the serialized size in bytes.
    pub fn size_on_disk(&self) -> usize {
        1 + self.values.len() + self.values.iter().map(TypedValue::payload_len).sum::<usize>()
    }

    /// Writes the record to `buf`.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        let tags = self.tags()?;
        buf.put_u8(self.values.len() as u8);
        buf.put_slice(&tags);
        for value in &self.values {
            value.encode(buf)?;
        }
        Ok(())
    }

    /// Serializes the record to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.size_on_disk());
        self.encode(&mut buf)?;
        Ok(buf)
    }

    /// Reads one record from the front of `buf`, advancing past it.
    pub fn decode(buf: &mut impl Buf) -> Result<Self> {
        if !buf.has_remaining() {
            return Err(StrataError::malformed("missing record column count"));
        }
        let count = buf.get_u8() as usize;
        if buf.remaining() < count {
            return Err(StrataError::malformed(format!(
                "record declares {} columns but only {} tag bytes remain",
                count,
                buf.remaining()
            )));
        }

        let mut tags = vec![0u8; count];
        buf.copy_to_slice(&mut tags);

        let values = tags
            .into_iter()
            .map(|tag| TypedValue::decode_from(tag, buf))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { values })
    }

    /// Deserializes a record that spans exactly `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut cursor = bytes;
        let record = Self::decode(&mut cursor)?;
        if !cursor.is_empty() {
            return Err(StrataError::malformed(format!(
                "{} trailing bytes after record",
                cursor.len()
            )));
        }
        Ok(record)
    }

    /// Returns the textual form of every column.
    pub fn to_string_list(&self) -> Vec<String> {
        self.values.iter().map(|v| v.to_string()).collect()
    }

    /// Returns the type of every column.
    pub fn type_ids(&self) -> Vec<TypeId> {
        self.values.iter().map(TypedValue::type_id).collect()
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "'{}'", value)?;
        }
        write!(f, "]")
    }
}
