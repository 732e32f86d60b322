//! # Column Vectors
//!
//! Minimal columnar storage used to materialize Values nodes from constant
//! rows. One [`VectorData`] holds a single column with per-slot nulls; a
//! [`RowVector`] bundles the columns of one batch together with its row type.
//!
//! This is not the engine's full vector library -- only the flat scalar
//! shapes a virtual table can produce.

use crate::expr::ScalarValue;
use crate::memory::MemoryPool;
use crate::types::{RowType, TypeKind};
use thiserror::Error;

/// Errors raised while materializing constant vectors.
#[derive(Debug, Error)]
pub enum VectorError {
    /// The column type has no flat vector representation here.
    #[error("vector materialization is not supported for type {0}")]
    UnsupportedType(TypeKind),
    /// A constant did not match the column type it was written into.
    #[error("value {value} does not fit column of type {expected}")]
    TypeMismatch {
        expected: TypeKind,
        value: ScalarValue,
    },
}

/// A single column of values with null slots.
#[derive(Debug, Clone, PartialEq)]
pub enum VectorData {
    Bool(Vec<Option<bool>>),
    Int32(Vec<Option<i32>>),
    Int64(Vec<Option<i64>>),
    Double(Vec<Option<f64>>),
    Varchar(Vec<Option<String>>),
    Date(Vec<Option<i32>>),
}

impl VectorData {
    pub fn len(&self) -> usize {
        match self {
            VectorData::Bool(v) => v.len(),
            VectorData::Int32(v) => v.len(),
            VectorData::Int64(v) => v.len(),
            VectorData::Double(v) => v.len(),
            VectorData::Varchar(v) => v.len(),
            VectorData::Date(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build a flat vector of the given type from constant values.
    ///
    /// NULL constants become null slots; any non-null constant of the wrong
    /// type is a conversion error. Binary columns are rejected, as the engine
    /// does not return VARBINARY data through Values.
    pub fn from_scalars(
        kind: TypeKind,
        values: &[ScalarValue],
        pool: &MemoryPool,
    ) -> Result<VectorData, VectorError> {
        let data = match kind {
            TypeKind::Bool => {
                let mut out = Vec::with_capacity(values.len());
                for v in values {
                    out.push(match v {
                        ScalarValue::Null => None,
                        ScalarValue::Bool(b) => Some(*b),
                        other => return Err(mismatch(kind, other)),
                    });
                }
                pool.reserve(out.len());
                VectorData::Bool(out)
            }
            TypeKind::Int32 => {
                let mut out = Vec::with_capacity(values.len());
                for v in values {
                    out.push(match v {
                        ScalarValue::Null => None,
                        ScalarValue::Int32(i) => Some(*i),
                        other => return Err(mismatch(kind, other)),
                    });
                }
                pool.reserve(out.len() * 4);
                VectorData::Int32(out)
            }
            TypeKind::Int64 => {
                let mut out = Vec::with_capacity(values.len());
                for v in values {
                    out.push(match v {
                        ScalarValue::Null => None,
                        ScalarValue::Int64(i) => Some(*i),
                        other => return Err(mismatch(kind, other)),
                    });
                }
                pool.reserve(out.len() * 8);
                VectorData::Int64(out)
            }
            TypeKind::Double => {
                let mut out = Vec::with_capacity(values.len());
                for v in values {
                    out.push(match v {
                        ScalarValue::Null => None,
                        ScalarValue::Double(d) => Some(d.into_inner()),
                        other => return Err(mismatch(kind, other)),
                    });
                }
                pool.reserve(out.len() * 8);
                VectorData::Double(out)
            }
            TypeKind::Varchar => {
                let mut out = Vec::with_capacity(values.len());
                let mut bytes = 0;
                for v in values {
                    out.push(match v {
                        ScalarValue::Null => None,
                        ScalarValue::Varchar(s) => {
                            bytes += s.len();
                            Some(s.clone())
                        }
                        other => return Err(mismatch(kind, other)),
                    });
                }
                pool.reserve(bytes);
                VectorData::Varchar(out)
            }
            TypeKind::Date => {
                let mut out = Vec::with_capacity(values.len());
                for v in values {
                    out.push(match v {
                        ScalarValue::Null => None,
                        ScalarValue::Date(d) => Some(*d),
                        other => return Err(mismatch(kind, other)),
                    });
                }
                pool.reserve(out.len() * 4);
                VectorData::Date(out)
            }
            TypeKind::Varbinary | TypeKind::Float => {
                return Err(VectorError::UnsupportedType(kind));
            }
        };
        Ok(data)
    }
}

fn mismatch(expected: TypeKind, value: &ScalarValue) -> VectorError {
    VectorError::TypeMismatch {
        expected,
        value: value.clone(),
    }
}

/// One batch of rows: a row type plus one column vector per field.
#[derive(Debug, Clone, PartialEq)]
pub struct RowVector {
    pub row_type: RowType,
    pub size: usize,
    pub children: Vec<VectorData>,
}

impl RowVector {
    pub fn new(row_type: RowType, size: usize, children: Vec<VectorData>) -> Self {
        RowVector {
            row_type,
            size,
            children,
        }
    }
}
