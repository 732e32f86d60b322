//! # Scan Filters
//!
//! The closed hierarchy of typed filter objects the scan layer evaluates
//! against column data without materializing rows.
//!
//! ## Shape of the hierarchy
//!
//! Filters form a small tagged variant rather than a trait hierarchy: the
//! scan switches on [`FilterKind`], so an enum keeps the dispatch explicit
//! and the set closed.
//!
//! - **Ranges**: [`BigintRange`] (normalized integer bounds),
//!   [`DoubleRange`] and [`BytesRange`] (explicit unbounded/exclusive flags).
//! - **Value sets**: [`BigintValues`], [`BytesValues`]. Double IN-lists are
//!   expressed as a [`MultiRange`] of point ranges because the scan has no
//!   hash structure for floating-point keys.
//! - **Disjunctions**: [`BigintMultiRange`] (integer ranges only) and the
//!   generic [`MultiRange`].
//! - **Null tests**: [`Filter::IsNotNull`].
//!
//! Every filter carries `null_allowed`: whether a NULL value passes. A filter
//! synthesized from a conjunction that includes `is_not_null` has it false.
//!
//! ## Kind taxonomy
//!
//! [`FilterKind`] enumerates more kinds than this crate can construct
//! (`IsNull`, `BoolValue`, `FloatRange`, `AlwaysTrue`, `AlwaysFalse`): readers
//! declare their capabilities against the full engine taxonomy, and the
//! format gate in the converter matches on kinds, not on variants.

use crate::types::TypeKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Discriminant for every filter shape the engine's readers know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterKind {
    AlwaysFalse,
    AlwaysTrue,
    IsNull,
    IsNotNull,
    BoolValue,
    BigintRange,
    BigintValuesUsingHashTable,
    BigintValuesUsingBitmask,
    BigintMultiRange,
    DoubleRange,
    FloatRange,
    BytesRange,
    BytesValues,
    MultiRange,
}

/// Map from column name to the filter pushed into the scan for that column.
///
/// Ordered so that scans and tests observe a deterministic column order.
pub type SubfieldFilters = BTreeMap<String, Filter>;

/// A contiguous range of 64-bit integers, bounds inclusive.
///
/// Exclusive and unbounded inputs are normalized away at construction:
/// an exclusive bound moves inward by one, an unbounded side saturates to
/// `i64::MIN` / `i64::MAX`. Integer columns of both 32-bit and 64-bit width
/// use this filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BigintRange {
    lower: i64,
    upper: i64,
    null_allowed: bool,
}

impl BigintRange {
    pub fn new(
        lower: i64,
        lower_unbounded: bool,
        lower_exclusive: bool,
        upper: i64,
        upper_unbounded: bool,
        upper_exclusive: bool,
        null_allowed: bool,
    ) -> Self {
        let lower = if lower_unbounded {
            i64::MIN
        } else if lower_exclusive {
            lower.saturating_add(1)
        } else {
            lower
        };
        let upper = if upper_unbounded {
            i64::MAX
        } else if upper_exclusive {
            upper.saturating_sub(1)
        } else {
            upper
        };
        BigintRange {
            lower,
            upper,
            null_allowed,
        }
    }

    /// Range matching exactly one value.
    pub fn point(value: i64, null_allowed: bool) -> Self {
        BigintRange {
            lower: value,
            upper: value,
            null_allowed,
        }
    }

    pub fn lower(&self) -> i64 {
        self.lower
    }

    pub fn upper(&self) -> i64 {
        self.upper
    }

    pub fn is_single_value(&self) -> bool {
        self.lower == self.upper
    }

    pub fn null_allowed(&self) -> bool {
        self.null_allowed
    }
}

/// Disjunction of integer ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BigintMultiRange {
    pub ranges: Vec<BigintRange>,
    pub null_allowed: bool,
}

/// Set-membership filter over 64-bit integers.
///
/// The representation the reader should use is picked from the value span:
/// dense sets fit a bitmask, sparse sets fall back to a hash table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BigintValues {
    pub values: Vec<i64>,
    pub null_allowed: bool,
    use_bitmask: bool,
}

impl BigintValues {
    pub fn kind(&self) -> FilterKind {
        if self.use_bitmask {
            FilterKind::BigintValuesUsingBitmask
        } else {
            FilterKind::BigintValuesUsingHashTable
        }
    }
}

/// A range of doubles. Bounds keep their unbounded/exclusive flags since
/// floating-point bounds cannot be normalized the way integers can.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoubleRange {
    pub lower: f64,
    pub lower_unbounded: bool,
    pub lower_exclusive: bool,
    pub upper: f64,
    pub upper_unbounded: bool,
    pub upper_exclusive: bool,
    pub null_allowed: bool,
}

impl DoubleRange {
    pub fn point(value: f64, null_allowed: bool) -> Self {
        DoubleRange {
            lower: value,
            lower_unbounded: false,
            lower_exclusive: false,
            upper: value,
            upper_unbounded: false,
            upper_exclusive: false,
            null_allowed,
        }
    }
}

/// A lexicographic range of byte strings. Unbounded sides carry an empty
/// string placeholder; only the flags are meaningful there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BytesRange {
    pub lower: String,
    pub lower_unbounded: bool,
    pub lower_exclusive: bool,
    pub upper: String,
    pub upper_unbounded: bool,
    pub upper_exclusive: bool,
    pub null_allowed: bool,
}

/// Set-membership filter over byte strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BytesValues {
    pub values: Vec<String>,
    pub null_allowed: bool,
}

/// Ordered disjunction of arbitrary filters, evaluated as OR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiRange {
    pub filters: Vec<Filter>,
    pub null_allowed: bool,
}

/// A typed scan filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    IsNotNull,
    BigintRange(BigintRange),
    BigintMultiRange(BigintMultiRange),
    BigintValues(BigintValues),
    DoubleRange(DoubleRange),
    BytesRange(BytesRange),
    BytesValues(BytesValues),
    MultiRange(MultiRange),
}

impl Filter {
    pub fn kind(&self) -> FilterKind {
        match self {
            Filter::IsNotNull => FilterKind::IsNotNull,
            Filter::BigintRange(_) => FilterKind::BigintRange,
            Filter::BigintMultiRange(_) => FilterKind::BigintMultiRange,
            Filter::BigintValues(v) => v.kind(),
            Filter::DoubleRange(_) => FilterKind::DoubleRange,
            Filter::BytesRange(_) => FilterKind::BytesRange,
            Filter::BytesValues(_) => FilterKind::BytesValues,
            Filter::MultiRange(_) => FilterKind::MultiRange,
        }
    }

    pub fn null_allowed(&self) -> bool {
        match self {
            Filter::IsNotNull => false,
            Filter::BigintRange(f) => f.null_allowed,
            Filter::BigintMultiRange(f) => f.null_allowed,
            Filter::BigintValues(f) => f.null_allowed,
            Filter::DoubleRange(f) => f.null_allowed,
            Filter::BytesRange(f) => f.null_allowed,
            Filter::BytesValues(f) => f.null_allowed,
            Filter::MultiRange(f) => f.null_allowed,
        }
    }
}

/// Width of the bitmask, in values per set element, a reader is willing to
/// allocate before switching to a hash table.
const BITMASK_SPAN_PER_VALUE: i64 = 64;

/// Build the integer IN filter, choosing the reader representation.
///
/// A single value degenerates to a point range.
pub fn bigint_values(values: Vec<i64>, null_allowed: bool) -> Filter {
    if values.len() == 1 {
        return Filter::BigintRange(BigintRange::point(values[0], null_allowed));
    }
    let min = values.iter().copied().min().unwrap_or(0);
    let max = values.iter().copied().max().unwrap_or(0);
    let span = max.saturating_sub(min);
    let use_bitmask = span < BITMASK_SPAN_PER_VALUE.saturating_mul(values.len() as i64);
    Filter::BigintValues(BigintValues {
        values,
        null_allowed,
        use_bitmask,
    })
}

/// Build the double IN filter as a disjunction of point ranges.
pub fn double_values(values: Vec<f64>, null_allowed: bool) -> Filter {
    if values.len() == 1 {
        return Filter::DoubleRange(DoubleRange::point(values[0], null_allowed));
    }
    let filters = values
        .into_iter()
        .map(|v| Filter::DoubleRange(DoubleRange::point(v, null_allowed)))
        .collect();
    Filter::MultiRange(MultiRange {
        filters,
        null_allowed,
    })
}

/// The scan-filter value types, used to validate synthesis inputs.
pub fn supports_filter_type(kind: TypeKind) -> bool {
    matches!(
        kind,
        TypeKind::Int32 | TypeKind::Int64 | TypeKind::Double | TypeKind::Varchar
    )
}
