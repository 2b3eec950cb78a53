//! Typed scalar values and their canonical byte encoding.
//!
//! Fixed-width values are written big-endian (two's complement for integers,
//! IEEE-754 for floats). Text is raw UTF-8 with no terminator; its length is
//! carried by the tag byte (see [`TypeId::text_tag`]).

use crate::error::{Result, StrataError};
use crate::types::{MAX_TEXT_LEN, TypeId};
use bytes::{Buf, BufMut};
use std::cmp::Ordering;

/// A single column value.
#[derive(Debug, Clone)]
pub enum TypedValue {
    Null,
    TinyInt(i8),
    SmallInt(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    /// Years since 2000.
    Year(i8),
    /// Milliseconds since midnight.
    Time(i32),
    /// Milliseconds since the Unix epoch.
    DateTime(i64),
    /// Milliseconds since the Unix epoch, at midnight.
    Date(i64),
    Text(String),
}

impl TypedValue {
    /// Returns the type of this value.
    pub fn type_id(&self) -> TypeId {
        match self {
            TypedValue::Null => TypeId::Null,
            TypedValue::TinyInt(_) => TypeId::TinyInt,
            TypedValue::SmallInt(_) => TypeId::SmallInt,
            TypedValue::Int(_) => TypeId::Int,
            TypedValue::Long(_) => TypeId::Long,
            TypedValue::Float(_) => TypeId::Float,
            TypedValue::Double(_) => TypeId::Double,
            TypedValue::Year(_) => TypeId::Year,
            TypedValue::Time(_) => TypeId::Time,
            TypedValue::DateTime(_) => TypeId::DateTime,
            TypedValue::Date(_) => TypeId::Date,
            TypedValue::Text(_) => TypeId::Text,
        }
    }

    /// Returns the tag byte written in record headers.
    ///
    /// Fails with `Overflow` for text longer than [`MAX_TEXT_LEN`] bytes.
    pub fn tag(&self) -> Result<u8> {
        match self {
            TypedValue::Text(s) => TypeId::text_tag(s.len()),
            other => Ok(other.type_id().code()),
        }
    }

    /// Returns the number of payload bytes this value encodes to.
    pub fn payload_len(&self) -> usize {
        match self {
            TypedValue::Text(s) => s.len(),
            other => other.type_id().fixed_size().unwrap_or(0),
        }
    }

    /// Returns true if this is the Null value.
    pub fn is_null(&self) -> bool {
        matches!(self, TypedValue::Null)
    }

    /// Writes the payload bytes (without tag).
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        match self {
            TypedValue::Null => {}
            TypedValue::TinyInt(v) | TypedValue::Year(v) => buf.put_i8(*v),
            TypedValue::SmallInt(v) => buf.put_i16(*v),
            TypedValue::Int(v) | TypedValue::Time(v) => buf.put_i32(*v),
            TypedValue::Long(v) | TypedValue::DateTime(v) | TypedValue::Date(v) => {
                buf.put_i64(*v)
            }
            TypedValue::Float(v) => buf.put_f32(*v),
            TypedValue::Double(v) => buf.put_f64(*v),
            TypedValue::Text(s) => {
                if s.len() > MAX_TEXT_LEN {
                    return Err(StrataError::Overflow {
                        type_name: TypeId::Text.to_string(),
                        value: format!("{} bytes", s.len()),
                    });
                }
                buf.put_slice(s.as_bytes());
            }
        }
        Ok(())
    }

    /// Returns the payload bytes (without tag).
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.payload_len());
        self.encode(&mut buf)?;
        Ok(buf)
    }

    /// Decodes a payload whose length must match the tag exactly.
    ///
    /// Fails with `UnknownType` for a byte outside the tag table.
    pub fn decode(tag: u8, bytes: &[u8]) -> Result<TypedValue> {
        let type_id = TypeId::from_tag(tag)?;
        let expected = TypeId::payload_len_for_tag(tag)?;
        if bytes.len() != expected {
            return Err(StrataError::malformed(format!(
                "{} payload needs {} bytes, got {}",
                type_id,
                expected,
                bytes.len()
            )));
        }
        let mut cursor = bytes;
        Self::decode_from(tag, &mut cursor)
    }

    /// Decodes one payload from the front of `buf`, advancing it.
    pub fn decode_from(tag: u8, buf: &mut impl Buf) -> Result<TypedValue> {
        let type_id = TypeId::from_tag(tag)?;
        let len = TypeId::payload_len_for_tag(tag)?;
        if buf.remaining() < len {
            return Err(StrataError::malformed(format!(
                "truncated {} payload: need {} bytes, have {}",
                type_id,
                len,
                buf.remaining()
            )));
        }

        Ok(match type_id {
            TypeId::Null => TypedValue::Null,
            TypeId::TinyInt => TypedValue::TinyInt(buf.get_i8()),
            TypeId::SmallInt => TypedValue::SmallInt(buf.get_i16()),
            TypeId::Int => TypedValue::Int(buf.get_i32()),
            TypeId::Long => TypedValue::Long(buf.get_i64()),
            TypeId::Float => TypedValue::Float(buf.get_f32()),
            TypeId::Double => TypedValue::Double(buf.get_f64()),
            TypeId::Year => TypedValue::Year(buf.get_i8()),
            TypeId::Time => TypedValue::Time(buf.get_i32()),
            TypeId::DateTime => TypedValue::DateTime(buf.get_i64()),
            TypeId::Date => TypedValue::Date(buf.get_i64()),
            TypeId::Text => {
                let raw = buf.copy_to_bytes(len);
                let text = String::from_utf8(raw.to_vec())
                    .map_err(|e| StrataError::malformed(format!("invalid UTF-8 text: {}", e)))?;
                TypedValue::Text(text)
            }
        })
    }

    /// Builds a value of `type_id` from an integer, checking that it fits.
    pub fn from_i64(type_id: TypeId, value: i64) -> Result<TypedValue> {
        let overflow = || StrataError::Overflow {
            type_name: type_id.to_string(),
            value: value.to_string(),
        };
        Ok(match type_id {
            TypeId::Null => TypedValue::Null,
            TypeId::TinyInt => TypedValue::TinyInt(i8::try_from(value).map_err(|_| overflow())?),
            TypeId::SmallInt => {
                TypedValue::SmallInt(i16::try_from(value).map_err(|_| overflow())?)
            }
            TypeId::Int => TypedValue::Int(i32::try_from(value).map_err(|_| overflow())?),
            TypeId::Long => TypedValue::Long(value),
            TypeId::Float => TypedValue::Float(value as f32),
            TypeId::Double => TypedValue::Double(value as f64),
            TypeId::Year => TypedValue::Year(i8::try_from(value).map_err(|_| overflow())?),
            TypeId::Time => TypedValue::Time(i32::try_from(value).map_err(|_| overflow())?),
            TypeId::DateTime => TypedValue::DateTime(value),
            TypeId::Date => TypedValue::Date(value),
            TypeId::Text => TypedValue::Text(value.to_string()),
        })
    }

    /// Parses a textual literal as a value of `type_id`.
    ///
    /// `NULL` (any case) parses to Null for every type. Text literals may be
    /// wrapped in matching single or double quotes.
    pub fn parse(type_id: TypeId, literal: &str) -> Result<TypedValue> {
        let trimmed = literal.trim();
        if trimmed.eq_ignore_ascii_case("null") {
            return Ok(TypedValue::Null);
        }

        let invalid = || StrataError::InvalidLiteral {
            type_name: type_id.to_string(),
            literal: literal.to_string(),
        };

        match type_id {
            TypeId::Null => Err(invalid()),
            TypeId::Float => trimmed
                .parse::<f32>()
                .map(TypedValue::Float)
                .map_err(|_| invalid()),
            TypeId::Double => trimmed
                .parse::<f64>()
                .map(TypedValue::Double)
                .map_err(|_| invalid()),
            TypeId::Text => {
                let text = strip_quotes(trimmed);
                if text.len() > MAX_TEXT_LEN {
                    return Err(StrataError::Overflow {
                        type_name: type_id.to_string(),
                        value: format!("{} bytes", text.len()),
                    });
                }
                Ok(TypedValue::Text(text.to_string()))
            }
            _ => {
                let value = trimmed.parse::<i64>().map_err(|_| invalid())?;
                Self::from_i64(type_id, value)
            }
        }
    }

    /// Returns the value as an integer for integer and temporal types.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            TypedValue::TinyInt(v) | TypedValue::Year(v) => Some(*v as i64),
            TypedValue::SmallInt(v) => Some(*v as i64),
            TypedValue::Int(v) | TypedValue::Time(v) => Some(*v as i64),
            TypedValue::Long(v) | TypedValue::DateTime(v) | TypedValue::Date(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a float for any numeric type.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TypedValue::Float(v) => Some(*v as f64),
            TypedValue::Double(v) => Some(*v),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    /// Compares two values the way a WHERE predicate does.
    ///
    /// Numeric kinds compare by value across widths, Text by bytes, Null only
    /// equals Null. Any other pairing is incomparable and yields `None`.
    pub fn compare(&self, other: &TypedValue) -> Option<Ordering> {
        match (self, other) {
            (TypedValue::Null, TypedValue::Null) => Some(Ordering::Equal),
            (TypedValue::Text(a), TypedValue::Text(b)) => Some(a.cmp(b)),
            (a, b) if a.type_id().is_numeric() && b.type_id().is_numeric() => {
                if a.type_id().is_floating_point() || b.type_id().is_floating_point() {
                    a.as_f64()?.partial_cmp(&b.as_f64()?)
                } else {
                    Some(a.as_i64()?.cmp(&b.as_i64()?))
                }
            }
            _ => None,
        }
    }
}

fn strip_quotes(text: &str) -> &str {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'\'' || first == b'"') {
            return &text[1..text.len() - 1];
        }
    }
    text
}

// Total order used for index keys: by type tag first, then by value.
impl Ord for TypedValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use TypedValue::*;
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (TinyInt(a), TinyInt(b)) | (Year(a), Year(b)) => a.cmp(b),
            (SmallInt(a), SmallInt(b)) => a.cmp(b),
            (Int(a), Int(b)) | (Time(a), Time(b)) => a.cmp(b),
            (Long(a), Long(b)) | (DateTime(a), DateTime(b)) | (Date(a), Date(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Double(a), Double(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            (a, b) => a.type_id().cmp(&b.type_id()),
        }
    }
}

impl PartialOrd for TypedValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for TypedValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TypedValue {}

impl std::fmt::Display for TypedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypedValue::Null => write!(f, "NULL"),
            TypedValue::TinyInt(v) | TypedValue::Year(v) => write!(f, "{}", v),
            TypedValue::SmallInt(v) => write!(f, "{}", v),
            TypedValue::Int(v) | TypedValue::Time(v) => write!(f, "{}", v),
            TypedValue::Long(v) | TypedValue::DateTime(v) | TypedValue::Date(v) => {
                write!(f, "{}", v)
            }
            TypedValue::Float(v) => write!(f, "{}", v),
            TypedValue::Double(v) => write!(f, "{}", v),
            TypedValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for TypedValue {
    fn from(value: &str) -> Self {
        TypedValue::Text(value.to_string())
    }
}

impl From<i32> for TypedValue {
    fn from(value: i32) -> Self {
        TypedValue::Int(value)
    }
}
