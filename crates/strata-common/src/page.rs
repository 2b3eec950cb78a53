//! Page identifiers and slab sizing.

use serde::{Deserialize, Serialize};

/// Page slab size in bytes. Every persisted page occupies exactly this much.
pub const PAGE_SIZE: usize = 512;

/// Identifier of a page within a table file.
///
/// Page 0 doubles as the "no page" marker for parent and sibling links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct PageId(pub u32);

impl PageId {
    /// Marker for an unlinked parent or sibling.
    pub const NONE: PageId = PageId(0);

    /// Creates a new PageId.
    pub fn new(page_num: u32) -> Self {
        Self(page_num)
    }

    /// Returns the raw page number.
    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// Returns true if this id is the unlinked marker.
    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for PageId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "page:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_constant() {
        assert_eq!(PAGE_SIZE, 512);
    }

    #[test]
    fn test_page_id_new() {
        let page_id = PageId::new(100);
        assert_eq!(page_id.as_u32(), 100);
        assert!(!page_id.is_none());
        assert!(PageId::NONE.is_none());
    }

    #[test]
    fn test_page_id_display() {
        assert_eq!(PageId::new(42).to_string(), "page:42");
    }

    #[test]
    fn test_page_id_ordering() {
        assert!(PageId::new(1) < PageId::new(2));
        assert_eq!(PageId::from(3), PageId::new(3));
    }

    #[test]
    fn test_page_id_serde_roundtrip() {
        let original = PageId::new(7);
        let serialized = serde_json::to_string(&original).unwrap();
        let deserialized: PageId = serde_json::from_str(&serialized).unwrap();
        assert_eq!(original, deserialized);
    }
}
