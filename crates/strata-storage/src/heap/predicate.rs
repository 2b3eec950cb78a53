//! Row predicates and column projections for page operations.

use crate::cell::LeafCell;
use crate::record::Record;
use std::cmp::Ordering;
use std::str::FromStr;
use strata_common::{Result, StrataError, TypedValue};

/// Binary comparison operator of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    /// Returns true if `ordering` (row value relative to operand) satisfies the operator.
    pub fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

impl FromStr for CompareOp {
    type Err = StrataError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "=" => Ok(CompareOp::Eq),
            "!=" | "<>" => Ok(CompareOp::Ne),
            "<" => Ok(CompareOp::Lt),
            "<=" => Ok(CompareOp::Le),
            ">" => Ok(CompareOp::Gt),
            ">=" => Ok(CompareOp::Ge),
            other => Err(StrataError::InvalidParameter {
                name: "operator".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `column op value` filter.
///
/// Rows whose column value is incomparable with the operand (for example Text
/// against Int, or Null against anything but Null) never match.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: usize,
    pub op: CompareOp,
    pub value: TypedValue,
}

impl Condition {
    pub fn new(column: usize, op: CompareOp, value: TypedValue) -> Self {
        Self { column, op, value }
    }

    /// Evaluates the condition against a record.
    ///
    /// Fails with `IndexOutOfRange` if the record has no such column.
    pub fn matches(&self, record: &Record) -> Result<bool> {
        let actual = record.get(self.column)?;
        Ok(actual
            .compare(&self.value)
            .is_some_and(|ordering| self.op.accepts(ordering)))
    }
}

/// Evaluates an optional condition; no condition matches every row.
pub(crate) fn cell_matches(cell: &LeafCell, predicate: Option<&Condition>) -> Result<bool> {
    match predicate {
        Some(condition) => condition.matches(cell.record()),
        None => Ok(true),
    }
}

/// Which columns a select returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// Every column, in record order.
    All,
    /// The listed column indices, in the listed order.
    Columns(Vec<usize>),
}

impl Projection {
    /// Resolves projected column names against the table's column names.
    ///
    /// A single `*` selects every column.
    pub fn from_names(names: &[&str], columns: &[&str]) -> Result<Self> {
        if names == ["*"] {
            return Ok(Projection::All);
        }
        names
            .iter()
            .map(|name| {
                columns
                    .iter()
                    .position(|column| column.eq_ignore_ascii_case(name))
                    .ok_or_else(|| StrataError::InvalidParameter {
                        name: "column".to_string(),
                        value: name.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()
            .map(Projection::Columns)
    }

    /// Extracts the projected values from a record.
    pub fn apply(&self, record: &Record) -> Result<Vec<TypedValue>> {
        match self {
            Projection::All => Ok(record.values().to_vec()),
            Projection::Columns(indices) => indices
                .iter()
                .map(|&i| record.get(i).cloned())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> Record {
        Record::new(vec![
            TypedValue::Int(9),
            TypedValue::Text("AWESOME".into()),
            TypedValue::Null,
            TypedValue::Float(22.3),
        ])
        .unwrap()
    }

    #[test]
    fn test_compare_op_from_str() {
        assert_eq!("=".parse::<CompareOp>().unwrap(), CompareOp::Eq);
        assert_eq!("!=".parse::<CompareOp>().unwrap(), CompareOp::Ne);
        assert_eq!("<>".parse::<CompareOp>().unwrap(), CompareOp::Ne);
        assert_eq!(" >= ".parse::<CompareOp>().unwrap(), CompareOp::Ge);
        assert!(matches!(
            "LIKE".parse::<CompareOp>(),
            Err(StrataError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_compare_op_display_roundtrip() {
        for op in [
            CompareOp::Eq,
            CompareOp::Ne,
            CompareOp::Lt,
            CompareOp::Le,
            CompareOp::Gt,
            CompareOp::Ge,
        ] {
            assert_eq!(op.to_string().parse::<CompareOp>().unwrap(), op);
        }
    }

    #[test]
    fn test_condition_numeric() {
        let r = record();
        assert!(Condition::new(0, CompareOp::Eq, TypedValue::Long(9)).matches(&r).unwrap());
        assert!(Condition::new(0, CompareOp::Le, TypedValue::Int(9)).matches(&r).unwrap());
        assert!(!Condition::new(0, CompareOp::Gt, TypedValue::Int(9)).matches(&r).unwrap());
        assert!(Condition::new(3, CompareOp::Gt, TypedValue::Int(22)).matches(&r).unwrap());
    }

    #[test]
    fn test_condition_text_and_null() {
        let r = record();
        assert!(Condition::new(1, CompareOp::Eq, "AWESOME".into()).matches(&r).unwrap());
        assert!(Condition::new(1, CompareOp::Lt, "B".into()).matches(&r).unwrap());
        assert!(Condition::new(2, CompareOp::Eq, TypedValue::Null).matches(&r).unwrap());
        assert!(!Condition::new(2, CompareOp::Ne, TypedValue::Int(1)).matches(&r).unwrap());
    }

    #[test]
    fn test_condition_incomparable_never_matches() {
        let r = record();
        assert!(!Condition::new(1, CompareOp::Eq, TypedValue::Int(9)).matches(&r).unwrap());
        assert!(!Condition::new(1, CompareOp::Ne, TypedValue::Int(9)).matches(&r).unwrap());
    }

    #[test]
    fn test_condition_missing_column() {
        assert!(matches!(
            Condition::new(4, CompareOp::Eq, TypedValue::Null).matches(&record()),
            Err(StrataError::IndexOutOfRange { index: 4, len: 4 })
        ));
    }

    #[test]
    fn test_projection_from_names() {
        let columns = ["id", "name", "note", "score"];
        assert_eq!(Projection::from_names(&["*"], &columns).unwrap(), Projection::All);
        assert_eq!(
            Projection::from_names(&["score", "ID"], &columns).unwrap(),
            Projection::Columns(vec![3, 0])
        );
        assert!(Projection::from_names(&["missing"], &columns).is_err());
    }

    #[test]
    fn test_projection_apply() {
        let r = record();
        assert_eq!(Projection::All.apply(&r).unwrap().len(), 4);
        assert_eq!(
            Projection::Columns(vec![1, 0]).apply(&r).unwrap(),
            vec![TypedValue::Text("AWESOME".into()), TypedValue::Int(9)]
        );
        assert!(Projection::Columns(vec![7]).apply(&r).is_err());
    }
}
