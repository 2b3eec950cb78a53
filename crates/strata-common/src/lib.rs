//! Strata common types, errors, and utilities.
//!
//! This crate provides the shared definitions used by the storage crate:
//! the column type table, the typed value codec, page sizing, configuration
//! and the error type.

pub mod config;
pub mod error;
pub mod page;
pub mod types;
pub mod value;

pub use config::{DEFAULT_INDEX_ORDER, MIN_INDEX_ORDER, StorageConfig};
pub use error::{Result, StrataError};
pub use page::{PAGE_SIZE, PageId};
pub use types::{MAX_TEXT_LEN, MAX_TEXT_TAG, TEXT_TAG_BASE, TypeId};
pub use value::TypedValue;
