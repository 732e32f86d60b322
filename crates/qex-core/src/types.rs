//! # Engine Type System
//!
//! Scalar type kinds and the row (struct) type used throughout the plan layer.
//!
//! Plan nodes carry a [`RowType`] describing their output: a list of column
//! names paired with a list of [`TypeKind`]s. The two vectors are always the
//! same length; columns are addressed by ordinal index, which is how field
//! references in incoming plans resolve.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scalar type kinds supported by the engine.
///
/// The scan layer can evaluate pushed-down filters only over `Int32`, `Int64`,
/// `Double`, and `Varchar` columns; the remaining kinds participate in
/// expressions and Values materialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    Bool,
    Int32,
    Int64,
    Float,
    Double,
    Varchar,
    Varbinary,
    Date,
}

impl TypeKind {
    /// True for the integer kinds that the bigint filter family covers.
    pub fn is_integer(&self) -> bool {
        matches!(self, TypeKind::Int32 | TypeKind::Int64)
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeKind::Bool => "BOOLEAN",
            TypeKind::Int32 => "INTEGER",
            TypeKind::Int64 => "BIGINT",
            TypeKind::Float => "REAL",
            TypeKind::Double => "DOUBLE",
            TypeKind::Varchar => "VARCHAR",
            TypeKind::Varbinary => "VARBINARY",
            TypeKind::Date => "DATE",
        };
        write!(f, "{}", name)
    }
}

/// A named struct type: the output schema of a plan node.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RowType {
    names: Vec<String>,
    types: Vec<TypeKind>,
}

impl RowType {
    /// Build a row type from parallel name and type vectors.
    pub fn new(names: Vec<String>, types: Vec<TypeKind>) -> Self {
        assert_eq!(
            names.len(),
            types.len(),
            "row type requires one name per type"
        );
        RowType { names, types }
    }

    pub fn size(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn types(&self) -> &[TypeKind] {
        &self.types
    }

    pub fn name_at(&self, idx: usize) -> &str {
        &self.names[idx]
    }

    pub fn type_at(&self, idx: usize) -> TypeKind {
        self.types[idx]
    }

    /// Ordinal of the column with the given name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Concatenate two row types, left columns first. Used for join outputs.
    pub fn concat(&self, other: &RowType) -> RowType {
        let mut names = self.names.clone();
        names.extend(other.names.iter().cloned());
        let mut types = self.types.clone();
        types.extend_from_slice(&other.types);
        RowType { names, types }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_type_lookup() {
        let row = RowType::new(
            vec!["a".into(), "b".into()],
            vec![TypeKind::Int64, TypeKind::Varchar],
        );
        assert_eq!(row.size(), 2);
        assert_eq!(row.index_of("b"), Some(1));
        assert_eq!(row.index_of("c"), None);
        assert_eq!(row.type_at(0), TypeKind::Int64);
    }

    #[test]
    fn test_row_type_concat_preserves_order() {
        let left = RowType::new(vec!["l0".into()], vec![TypeKind::Int64]);
        let right = RowType::new(
            vec!["r0".into(), "r1".into()],
            vec![TypeKind::Double, TypeKind::Varchar],
        );
        let joined = left.concat(&right);
        assert_eq!(joined.names(), &["l0", "r0", "r1"]);
        assert_eq!(joined.size(), 3);
        assert_eq!(joined.type_at(2), TypeKind::Varchar);
    }
}
