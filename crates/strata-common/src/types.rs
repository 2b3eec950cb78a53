//! Type identifiers and the on-disk tag table.

use crate::error::{Result, StrataError};
use serde::{Deserialize, Serialize};

/// Tag byte of the empty string. Text tags carry the byte length: `TEXT_TAG_BASE + len`.
pub const TEXT_TAG_BASE: u8 = 11;

/// Highest tag byte assigned to Text. Bytes above it are not type tags.
pub const MAX_TEXT_TAG: u8 = 114;

/// Longest text payload expressible in a single tag byte.
pub const MAX_TEXT_LEN: usize = (MAX_TEXT_TAG - TEXT_TAG_BASE) as usize;

/// Identifier for every column type Strata stores.
///
/// The discriminant is the tag byte written in record headers. Text is the
/// exception: its tag also encodes the payload length, so every byte from
/// [`TEXT_TAG_BASE`] to [`MAX_TEXT_TAG`] identifies Text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TypeId {
    Null = 0,
    TinyInt = 1,
    SmallInt = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    Year = 7,
    Time = 8,
    DateTime = 9,
    Date = 10,
    Text = 11,
}

impl TypeId {
    /// Resolves a tag byte read from a record header.
    pub fn from_tag(tag: u8) -> Result<TypeId> {
        Ok(match tag {
            0 => TypeId::Null,
            1 => TypeId::TinyInt,
            2 => TypeId::SmallInt,
            3 => TypeId::Int,
            4 => TypeId::Long,
            5 => TypeId::Float,
            6 => TypeId::Double,
            7 => TypeId::Year,
            8 => TypeId::Time,
            9 => TypeId::DateTime,
            10 => TypeId::Date,
            TEXT_TAG_BASE..=MAX_TEXT_TAG => TypeId::Text,
            other => return Err(StrataError::UnknownType(format!("tag 0x{:02X}", other))),
        })
    }

    /// Resolves a column type name such as `INT` or `text` (case-insensitive).
    pub fn from_name(name: &str) -> Result<TypeId> {
        let upper = name.trim().to_ascii_uppercase();
        Ok(match upper.as_str() {
            "NULL" => TypeId::Null,
            "TINYINT" => TypeId::TinyInt,
            "SMALLINT" => TypeId::SmallInt,
            "INT" | "INTEGER" => TypeId::Int,
            "BIGINT" | "LONG" => TypeId::Long,
            "FLOAT" | "REAL" => TypeId::Float,
            "DOUBLE" => TypeId::Double,
            "YEAR" => TypeId::Year,
            "TIME" => TypeId::Time,
            "DATETIME" => TypeId::DateTime,
            "DATE" => TypeId::Date,
            "TEXT" => TypeId::Text,
            _ => return Err(StrataError::UnknownType(name.to_string())),
        })
    }

    /// Returns the base tag byte. For Text this is the tag of the empty string.
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Returns the tag byte for a text payload of `len` bytes.
    pub fn text_tag(len: usize) -> Result<u8> {
        if len > MAX_TEXT_LEN {
            return Err(StrataError::Overflow {
                type_name: TypeId::Text.to_string(),
                value: format!("{} bytes", len),
            });
        }
        Ok(TEXT_TAG_BASE + len as u8)
    }

    /// Returns the payload size implied by a tag byte.
    pub fn payload_len_for_tag(tag: u8) -> Result<usize> {
        Ok(match TypeId::from_tag(tag)?.fixed_size() {
            Some(size) => size,
            None => (tag - TEXT_TAG_BASE) as usize,
        })
    }

    /// Returns the fixed byte size for this type, or None for Text.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            TypeId::Null => Some(0),
            TypeId::TinyInt | TypeId::Year => Some(1),
            TypeId::SmallInt => Some(2),
            TypeId::Int | TypeId::Float | TypeId::Time => Some(4),
            TypeId::Long | TypeId::Double | TypeId::DateTime | TypeId::Date => Some(8),
            TypeId::Text => None,
        }
    }

    /// Returns true if values of this type compare numerically.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TypeId::TinyInt
                | TypeId::SmallInt
                | TypeId::Int
                | TypeId::Long
                | TypeId::Float
                | TypeId::Double
                | TypeId::Year
                | TypeId::Time
                | TypeId::DateTime
                | TypeId::Date
        )
    }

    /// Returns true if this type is a floating-point type.
    pub fn is_floating_point(&self) -> bool {
        matches!(self, TypeId::Float | TypeId::Double)
    }
}

impl std::fmt::Display for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TypeId::Null => "NULL",
            TypeId::TinyInt => "TINYINT",
            TypeId::SmallInt => "SMALLINT",
            TypeId::Int => "INT",
            TypeId::Long => "BIGINT",
            TypeId::Float => "FLOAT",
            TypeId::Double => "DOUBLE",
            TypeId::Year => "YEAR",
            TypeId::Time => "TIME",
            TypeId::DateTime => "DATETIME",
            TypeId::Date => "DATE",
            TypeId::Text => "TEXT",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_TYPES: [TypeId; 12] = [
        TypeId::Null,
        TypeId::TinyInt,
        TypeId::SmallInt,
        TypeId::Int,
        TypeId::Long,
        TypeId::Float,
        TypeId::Double,
        TypeId::Year,
        TypeId::Time,
        TypeId::DateTime,
        TypeId::Date,
        TypeId::Text,
    ];

    #[test]
    fn test_fixed_sizes() {
        let sizes: Vec<_> = ALL_TYPES.iter().map(|t| t.fixed_size()).collect();
        assert_eq!(
            sizes,
            vec![
                Some(0),
                Some(1),
                Some(2),
                Some(4),
                Some(8),
                Some(4),
                Some(8),
                Some(1),
                Some(4),
                Some(8),
                Some(8),
                None
            ]
        );
    }

    #[test]
    fn test_tag_codes_are_stable() {
        for (code, type_id) in ALL_TYPES.iter().enumerate() {
            assert_eq!(type_id.code(), code as u8);
            assert_eq!(TypeId::from_tag(code as u8).unwrap(), *type_id);
        }
    }

    #[test]
    fn test_text_tag_range() {
        for tag in TEXT_TAG_BASE..=MAX_TEXT_TAG {
            assert_eq!(TypeId::from_tag(tag).unwrap(), TypeId::Text);
            assert_eq!(
                TypeId::payload_len_for_tag(tag).unwrap(),
                (tag - TEXT_TAG_BASE) as usize
            );
        }
    }

    #[test]
    fn test_unknown_tags() {
        for tag in MAX_TEXT_TAG + 1..=u8::MAX {
            assert!(matches!(
                TypeId::from_tag(tag),
                Err(StrataError::UnknownType(_))
            ));
            assert!(TypeId::payload_len_for_tag(tag).is_err());
        }
        let err = TypeId::from_tag(0xC8).unwrap_err();
        assert_eq!(err.to_string(), "Unknown type: tag 0xC8");
    }

    #[test]
    fn test_text_tag() {
        assert_eq!(TypeId::text_tag(0).unwrap(), 0x0B);
        assert_eq!(TypeId::text_tag(1).unwrap(), 0x0C);
        assert_eq!(TypeId::text_tag(5).unwrap(), 0x10);
        assert_eq!(MAX_TEXT_LEN, 103);
        assert_eq!(TypeId::text_tag(MAX_TEXT_LEN).unwrap(), MAX_TEXT_TAG);
        assert!(matches!(
            TypeId::text_tag(MAX_TEXT_LEN + 1),
            Err(StrataError::Overflow { .. })
        ));
    }

    #[test]
    fn test_from_name() {
        assert_eq!(TypeId::from_name("INT").unwrap(), TypeId::Int);
        assert_eq!(TypeId::from_name("text").unwrap(), TypeId::Text);
        assert_eq!(TypeId::from_name("BigInt").unwrap(), TypeId::Long);
        assert_eq!(TypeId::from_name(" float ").unwrap(), TypeId::Float);
        assert!(matches!(
            TypeId::from_name("GEOMETRY"),
            Err(StrataError::UnknownType(_))
        ));
    }

    #[test]
    fn test_display_roundtrips_through_from_name() {
        for type_id in ALL_TYPES {
            assert_eq!(TypeId::from_name(&type_id.to_string()).unwrap(), type_id);
        }
    }

    #[test]
    fn test_classification() {
        assert!(TypeId::Double.is_floating_point());
        assert!(!TypeId::Int.is_floating_point());
        assert!(TypeId::Year.is_numeric());
        assert!(!TypeId::Text.is_numeric());
        assert!(!TypeId::Null.is_numeric());
    }
}
