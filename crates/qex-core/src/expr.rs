//! # Typed Expressions
//!
//! Scalar values and the typed expression tree the converter produces for
//! residual filters, projections, join keys, and aggregate calls.
//!
//! The tree is deliberately small: a field access resolves a column of the
//! input row by name, a constant wraps a [`ScalarValue`], and a call applies a
//! named engine function to its arguments. Every node knows its result type,
//! so downstream consumers never re-infer types.

use crate::types::TypeKind;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Constant scalar value.
///
/// Doubles are wrapped in `OrderedFloat` so values are `Eq`/`Hash` and can be
/// deduplicated or used as map keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Double(OrderedFloat<f64>),
    Varchar(String),
    /// Days since the Unix epoch.
    Date(i32),
}

impl ScalarValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    /// The type kind this value naturally carries; `None` for NULL.
    pub fn type_kind(&self) -> Option<TypeKind> {
        match self {
            ScalarValue::Null => None,
            ScalarValue::Bool(_) => Some(TypeKind::Bool),
            ScalarValue::Int32(_) => Some(TypeKind::Int32),
            ScalarValue::Int64(_) => Some(TypeKind::Int64),
            ScalarValue::Double(_) => Some(TypeKind::Double),
            ScalarValue::Varchar(_) => Some(TypeKind::Varchar),
            ScalarValue::Date(_) => Some(TypeKind::Date),
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => write!(f, "null"),
            ScalarValue::Bool(v) => write!(f, "{}", v),
            ScalarValue::Int32(v) => write!(f, "{}", v),
            ScalarValue::Int64(v) => write!(f, "{}", v),
            ScalarValue::Double(v) => write!(f, "{}", v),
            ScalarValue::Varchar(v) => write!(f, "\"{}\"", v),
            ScalarValue::Date(v) => write!(f, "date({})", v),
        }
    }
}

/// Access to a column of the input row, by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldAccessExpr {
    pub name: String,
    pub field_type: TypeKind,
}

/// A constant expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstantExpr {
    pub value_type: TypeKind,
    pub value: ScalarValue,
}

/// Application of a named engine function.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallExpr {
    pub return_type: TypeKind,
    pub args: Vec<TypedExpr>,
    pub name: String,
}

/// Typed expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypedExpr {
    FieldAccess(FieldAccessExpr),
    Constant(ConstantExpr),
    Call(CallExpr),
}

impl TypedExpr {
    pub fn field(name: impl Into<String>, field_type: TypeKind) -> Self {
        TypedExpr::FieldAccess(FieldAccessExpr {
            name: name.into(),
            field_type,
        })
    }

    pub fn constant(value_type: TypeKind, value: ScalarValue) -> Self {
        TypedExpr::Constant(ConstantExpr { value_type, value })
    }

    pub fn call(name: impl Into<String>, args: Vec<TypedExpr>, return_type: TypeKind) -> Self {
        TypedExpr::Call(CallExpr {
            return_type,
            args,
            name: name.into(),
        })
    }

    /// The result type of this expression.
    pub fn data_type(&self) -> TypeKind {
        match self {
            TypedExpr::FieldAccess(f) => f.field_type,
            TypedExpr::Constant(c) => c.value_type,
            TypedExpr::Call(c) => c.return_type,
        }
    }

    pub fn as_call(&self) -> Option<&CallExpr> {
        match self {
            TypedExpr::Call(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_field(&self) -> Option<&FieldAccessExpr> {
        match self {
            TypedExpr::FieldAccess(f) => Some(f),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_follows_node() {
        let expr = TypedExpr::call(
            "gt",
            vec![
                TypedExpr::field("n0_0", TypeKind::Int64),
                TypedExpr::constant(TypeKind::Int64, ScalarValue::Int64(5)),
            ],
            TypeKind::Bool,
        );
        assert_eq!(expr.data_type(), TypeKind::Bool);
        let call = expr.as_call().unwrap();
        assert_eq!(call.args[0].data_type(), TypeKind::Int64);
    }

    #[test]
    fn test_scalar_value_kind() {
        assert_eq!(ScalarValue::Null.type_kind(), None);
        assert_eq!(
            ScalarValue::Double(OrderedFloat(1.5)).type_kind(),
            Some(TypeKind::Double)
        );
    }
}
