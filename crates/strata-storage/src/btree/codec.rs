//! Binary layout of serialized index trees.
//!
//! ```text
//! +----------------------+ 0
//! | magic: "SNDX"        | 4
//! | version: u8          | 5
//! | order: u16 BE        | 7
//! | entry_count: u32 BE  | 11 (INDEX_HEADER_SIZE)
//! +----------------------+
//! | nodes, pre-order:    |
//! |   kind: u8           |  0 = leaf, 1 = branch
//! |   value_count: u16   |
//! |   (key, payload)*    |
//! |   children...        |  branches only, value_count + 1 of them
//! +----------------------+
//! ```

use super::arena::{Node, NodeArena, NodeId};
use super::constants::{
    INDEX_FORMAT_VERSION, INDEX_HEADER_SIZE, INDEX_MAGIC, MAX_DECODE_DEPTH, MIN_ORDER,
    NODE_KIND_BRANCH, NODE_KIND_LEAF,
};
use super::index::BTreeIndex;
use bytes::{Buf, BufMut};
use strata_common::{Result, StrataError, TypedValue};

/// Byte encoding of index keys and payloads.
pub trait IndexCodec: Sized {
    fn encode_entry(&self, buf: &mut impl BufMut) -> Result<()>;

    fn decode_entry(buf: &mut impl Buf) -> Result<Self>;
}

/// Keys are written as `[tag][payload]`.
impl IndexCodec for TypedValue {
    fn encode_entry(&self, buf: &mut impl BufMut) -> Result<()> {
        buf.put_u8(self.tag()?);
        self.encode(buf)
    }

    fn decode_entry(buf: &mut impl Buf) -> Result<Self> {
        if !buf.has_remaining() {
            return Err(StrataError::malformed("truncated index key"));
        }
        let tag = buf.get_u8();
        TypedValue::decode_from(tag, buf)
    }
}

/// Row ids are written as 4 bytes big-endian.
impl IndexCodec for u32 {
    fn encode_entry(&self, buf: &mut impl BufMut) -> Result<()> {
        buf.put_u32(*self);
        Ok(())
    }

    fn decode_entry(buf: &mut impl Buf) -> Result<Self> {
        if buf.remaining() < 4 {
            return Err(StrataError::malformed("truncated row id"));
        }
        Ok(buf.get_u32())
    }
}

impl<K: Ord + IndexCodec, V: IndexCodec> BTreeIndex<K, V> {
    /// Serializes the tree, preserving its node structure.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let order = u16::try_from(self.order).map_err(|_| StrataError::Overflow {
            type_name: "index order".to_string(),
            value: self.order.to_string(),
        })?;
        let entry_count = u32::try_from(self.len).map_err(|_| StrataError::Overflow {
            type_name: "index entry count".to_string(),
            value: self.len.to_string(),
        })?;

        let mut buf = Vec::with_capacity(INDEX_HEADER_SIZE + self.len * 8);
        buf.put_slice(&INDEX_MAGIC);
        buf.put_u8(INDEX_FORMAT_VERSION);
        buf.put_u16(order);
        buf.put_u32(entry_count);
        self.encode_node(self.root, &mut buf)?;
        Ok(buf)
    }

    fn encode_node(&self, id: NodeId, buf: &mut Vec<u8>) -> Result<()> {
        let node = self.arena.get(id);
        buf.put_u8(if node.is_leaf() {
            NODE_KIND_LEAF
        } else {
            NODE_KIND_BRANCH
        });
        // Node sizes are capped by the order, which fits in u16.
        buf.put_u16(node.values.len() as u16);
        for (key, value) in &node.values {
            key.encode_entry(buf)?;
            value.encode_entry(buf)?;
        }
        for &child in &node.children {
            self.encode_node(child, buf)?;
        }
        Ok(())
    }

    /// Deserializes a tree written by [`BTreeIndex::to_bytes`].
    ///
    /// Rejects bad magic, unknown versions, truncation, trailing bytes and
    /// structures that violate the tree invariants with `MalformedFile`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < INDEX_HEADER_SIZE {
            return Err(StrataError::malformed(format!(
                "index header needs {} bytes, got {}",
                INDEX_HEADER_SIZE,
                bytes.len()
            )));
        }
        let mut cursor = bytes;

        let mut magic = [0u8; 4];
        cursor.copy_to_slice(&mut magic);
        if magic != INDEX_MAGIC {
            return Err(StrataError::malformed(format!(
                "bad index magic {:02x?}",
                magic
            )));
        }
        let version = cursor.get_u8();
        if version != INDEX_FORMAT_VERSION {
            return Err(StrataError::malformed(format!(
                "unsupported index format version {}",
                version
            )));
        }
        let order = cursor.get_u16() as usize;
        if order < MIN_ORDER {
            return Err(StrataError::malformed(format!("invalid index order {}", order)));
        }
        let entry_count = cursor.get_u32() as usize;

        let mut tree = Self::new(order)?;
        let mut arena = NodeArena::new();
        tree.root = decode_node(&mut cursor, &mut arena, 0)?;
        tree.arena = arena;
        tree.len = entry_count;

        if !cursor.is_empty() {
            return Err(StrataError::malformed(format!(
                "{} trailing bytes after index tree",
                cursor.len()
            )));
        }
        tree.check_invariants().map_err(|e| match e {
            StrataError::BTreeCorrupted(reason) => StrataError::malformed(reason),
            other => other,
        })?;
        Ok(tree)
    }
}

fn decode_node<K: IndexCodec, V: IndexCodec>(
    buf: &mut &[u8],
    arena: &mut NodeArena<K, V>,
    depth: usize,
) -> Result<NodeId> {
    if depth > MAX_DECODE_DEPTH {
        return Err(StrataError::malformed("index tree nested too deeply"));
    }
    if buf.remaining() < 3 {
        return Err(StrataError::malformed("truncated index node header"));
    }
    let kind = buf.get_u8();
    let count = buf.get_u16() as usize;

    let mut values = Vec::with_capacity(count.min(buf.remaining()));
    for _ in 0..count {
        let key = K::decode_entry(buf)?;
        let value = V::decode_entry(buf)?;
        values.push((key, value));
    }

    let node = match kind {
        NODE_KIND_LEAF => Node::leaf(values),
        NODE_KIND_BRANCH => {
            if count == 0 {
                return Err(StrataError::malformed("branch node without values"));
            }
            let children = (0..=count)
                .map(|_| decode_node(buf, arena, depth + 1))
                .collect::<Result<Vec<_>>>()?;
            Node::branch(values, children)
        }
        other => {
            return Err(StrataError::malformed(format!(
                "unknown index node kind {}",
                other
            )));
        }
    };
    Ok(arena.allocate(node))
}
