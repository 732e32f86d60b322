//! # Filter Decomposition and Pushdown Synthesis
//!
//! A Read's predicate arrives as one boolean expression. This module splits
//! it into per-column typed filters the scan layer evaluates directly, plus
//! a residual expression evaluated above the scan:
//!
//! ```text
//! filter condition
//!   -> flatten_conditions()        AND tree -> flat conjunct list
//!   -> separate_filters()          each conjunct: pushable or remaining
//!   -> to_subfield_filters()       pushable conjuncts -> column filters
//!   -> is_pushdown_supported_by_format()   reader capability gate
//!   -> connect_with_and()          remaining conjuncts -> one residual
//! ```
//!
//! ## Classification
//!
//! The pushable short names are fixed: `is_not_null`, `gte`, `gt`, `lte`,
//! `lt`, `equal`, `in` directly; `not` over one of the comparison five; `or`
//! over exactly two same-column children. Each conjunct must compare one
//! field reference against at most one literal. An `in` on a column excludes
//! every other pushable shape for that column except `is_not_null`, because
//! the value-set filter cannot intersect with ranges. At most one
//! `not(equal)` is pushed per column: a second one would OR into the
//! synthesized multi-range where the predicate means AND.
//!
//! ## Accumulation
//!
//! Pushable conjuncts fold into one [`FilterInfo`] per column. Bounds from
//! AND conjuncts land at the same disjunct index and intersect; each OR
//! child opens a fresh disjunct index, so the bound lists materialize as a
//! multi-range disjunction. Null allowance is a single flag shared by every
//! range of the column.

use crate::error::ConvertError;
use crate::expr::ExprConverter;
use crate::extensions::{spec_types, FunctionRegistry};
use crate::parse::parse_reference_segment;
use crate::proto;
use crate::proto::expression::literal::LiteralType;
use crate::proto::expression::ScalarFunction;
use qex_core::expr::{ScalarValue, TypedExpr};
use qex_core::filter::{
    self, BigintMultiRange, BigintRange, BytesRange, BytesValues, DoubleRange, Filter,
    FilterKind, MultiRange, SubfieldFilters,
};
use qex_core::plan::FileFormat;
use qex_core::types::{RowType, TypeKind};
use std::collections::{HashMap, HashSet};
use tracing::debug;

const S_IS_NOT_NULL: &str = "is_not_null";
const S_GTE: &str = "gte";
const S_GT: &str = "gt";
const S_LTE: &str = "lte";
const S_LT: &str = "lt";
const S_EQUAL: &str = "equal";
const S_IN: &str = "in";
const S_OR: &str = "or";
const S_NOT: &str = "not";
const S_AND: &str = "and";

const S_I32: &str = "i32";
const S_I64: &str = "i64";

const COMMON_PUSHABLE: &[&str] = &[S_IS_NOT_NULL, S_GTE, S_GT, S_LTE, S_LT, S_EQUAL, S_IN];
const NOT_PUSHABLE: &[&str] = &[S_GTE, S_GT, S_LTE, S_LT, S_EQUAL];

/// Flatten an AND tree of scalar functions into a flat conjunct list.
/// Any non-function predicate is rejected.
pub fn flatten_conditions(
    condition: &proto::Expression,
    registry: &FunctionRegistry,
    out: &mut Vec<ScalarFunction>,
) -> Result<(), ConvertError> {
    let Some(function) = condition.scalar_function() else {
        return Err(ConvertError::InvalidInput(
            "scalar function is expected in filter condition".into(),
        ));
    };
    if registry.short_name_of(function.function_reference)? == S_AND {
        for arg in &function.args {
            flatten_conditions(arg, registry, out)?;
        }
    } else {
        out.push(function.clone());
    }
    Ok(())
}

/// Split the flattened conjuncts into the pushable and remaining lists,
/// preserving order. The two lists partition the input.
pub fn separate_filters(
    scalar_functions: &[ScalarFunction],
    registry: &FunctionRegistry,
) -> Result<(Vec<ScalarFunction>, Vec<ScalarFunction>), ConvertError> {
    // Columns already claimed by an IN conjunct, and columns that carry a
    // not(equal) so far.
    let in_cols = in_col_indices(scalar_functions, registry)?;
    let mut not_equal_cols: HashSet<u32> = HashSet::new();

    let mut subfield_functions = Vec::new();
    let mut remaining_functions = Vec::new();
    for function in scalar_functions {
        let filter_name = registry.short_name_of(function.function_reference)?;
        let supported = match filter_name {
            S_NOT => can_pushdown_not(function, registry, &in_cols, &mut not_equal_cols)?,
            S_OR => can_pushdown_or(function, registry, &in_cols)?,
            _ => can_pushdown_common(function, &in_cols, filter_name)?,
        };
        if supported {
            subfield_functions.push(function.clone());
        } else {
            remaining_functions.push(function.clone());
        }
    }
    debug!(
        subfield = subfield_functions.len(),
        remaining = remaining_functions.len(),
        "separated scan filter conjuncts"
    );
    Ok((subfield_functions, remaining_functions))
}

/// Column index of a field reference argument.
fn reference_index(
    field_reference: &proto::expression::FieldReference,
) -> Result<u32, ConvertError> {
    let segment = field_reference.direct_reference().ok_or_else(|| {
        ConvertError::Unsupported("only direct field references are supported".into())
    })?;
    parse_reference_segment(segment)
}

/// The column compared by `function`, when its arguments are exactly one
/// field reference, or one field reference plus one literal in either order.
fn field_or_with_literal(function: &ScalarFunction) -> Result<Option<u32>, ConvertError> {
    if function.args.len() == 1 {
        return match function.args[0].selection() {
            Some(field_reference) => Ok(Some(reference_index(field_reference)?)),
            None => Ok(None),
        };
    }
    if function.args.len() != 2 {
        return Ok(None);
    }
    let mut field_index = None;
    let mut literal_exists = false;
    for param in &function.args {
        if let Some(field_reference) = param.selection() {
            field_index = Some(reference_index(field_reference)?);
        } else if param.literal().is_some() {
            literal_exists = true;
        }
    }
    Ok(match (field_index, literal_exists) {
        (Some(idx), true) => Some(idx),
        _ => None,
    })
}

/// True when every scalar-function child of `function` references one single
/// column. A child that is not a scalar function disqualifies the whole
/// predicate.
fn children_on_same_field(function: &ScalarFunction) -> Result<bool, ConvertError> {
    let mut col_indices: Vec<u32> = Vec::new();
    for arg in &function.args {
        let Some(child) = arg.scalar_function() else {
            return Ok(false);
        };
        for param in &child.args {
            if let Some(field_reference) = param.selection() {
                col_indices.push(reference_index(field_reference)?);
            }
        }
    }
    Ok(col_indices.windows(2).all(|pair| pair[0] == pair[1]))
}

/// Column index of an IN conjunct, validating its `(field, literal list)`
/// argument shape.
fn column_index_from_in(function: &ScalarFunction) -> Result<u32, ConvertError> {
    if function.args.len() != 2 {
        return Err(ConvertError::InvalidInput(
            "two args are expected in IN expression".into(),
        ));
    }
    let field_reference = function.args[0].selection().ok_or_else(|| {
        ConvertError::InvalidInput("field is expected as the first argument of IN".into())
    })?;
    let col_idx = reference_index(field_reference)?;
    let literal = function.args[1].literal().ok_or_else(|| {
        ConvertError::InvalidInput("literal is expected as the second argument of IN".into())
    })?;
    if !matches!(&literal.literal_type, Some(LiteralType::List(_))) {
        return Err(ConvertError::InvalidInput(
            "list is expected as the second argument of IN".into(),
        ));
    }
    Ok(col_idx)
}

/// Columns targeted by an IN conjunct whose first argument is a field
/// selection. An IN over anything else cannot be pushed down and does not
/// claim a column.
fn in_col_indices(
    scalar_functions: &[ScalarFunction],
    registry: &FunctionRegistry,
) -> Result<HashSet<u32>, ConvertError> {
    let mut in_cols = HashSet::new();
    for function in scalar_functions {
        if registry.short_name_of(function.function_reference)? != S_IN {
            continue;
        }
        if function.args.is_empty() {
            return Err(ConvertError::InvalidInput(
                "arg is expected for IN function".into(),
            ));
        }
        if function.args[0].selection().is_some() {
            in_cols.insert(column_index_from_in(function)?);
        }
    }
    Ok(in_cols)
}

fn can_pushdown_common(
    function: &ScalarFunction,
    in_cols: &HashSet<u32>,
    filter_name: &str,
) -> Result<bool, ConvertError> {
    if !COMMON_PUSHABLE.contains(&filter_name) {
        return Ok(false);
    }
    let Some(field_idx) = field_or_with_literal(function)? else {
        return Ok(false);
    };
    // IN coexists only with is_not_null on the same column.
    Ok(!in_cols.contains(&field_idx) || filter_name == S_IS_NOT_NULL || filter_name == S_IN)
}

fn can_pushdown_not(
    function: &ScalarFunction,
    registry: &FunctionRegistry,
    in_cols: &HashSet<u32>,
    not_equal_cols: &mut HashSet<u32>,
) -> Result<bool, ConvertError> {
    if function.args.len() != 1 {
        return Err(ConvertError::InvalidInput(
            "only one arg is expected for NOT".into(),
        ));
    }
    let Some(inner) = function.args[0].scalar_function() else {
        // NOT over a boolean literal would need an always-true/false range.
        return Ok(false);
    };
    let inner_name = registry.short_name_of(inner.function_reference)?;
    let field_idx = field_or_with_literal(inner)?;
    if !NOT_PUSHABLE.contains(&inner_name) {
        return Ok(false);
    }
    let Some(field_idx) = field_idx else {
        return Ok(false);
    };
    if in_cols.contains(&field_idx) {
        return Ok(false);
    }
    // The not-equal multi-range is a disjunction, so a second not(equal) on
    // the same column would change meaning; only the first is pushed.
    if inner_name == S_EQUAL {
        for arg in &inner.args {
            let Some(field_reference) = arg.selection() else {
                continue;
            };
            let col_idx = reference_index(field_reference)?;
            if !not_equal_cols.insert(col_idx) {
                return Ok(false);
            }
        }
    }
    Ok(true)
}

fn can_pushdown_or(
    function: &ScalarFunction,
    registry: &FunctionRegistry,
    in_cols: &HashSet<u32>,
) -> Result<bool, ConvertError> {
    if !children_on_same_field(function)? {
        return Ok(false);
    }
    let mut in_exists = false;
    for arg in &function.args {
        let Some(child) = arg.scalar_function() else {
            // OR between literals is not pushable.
            return Ok(false);
        };
        let spec = registry.function_spec(child.function_reference)?;
        let child_name = crate::extensions::short_name(spec);
        if !COMMON_PUSHABLE.contains(&child_name) {
            return Ok(false);
        }
        let Some(field_idx) = field_or_with_literal(child)? else {
            return Ok(false);
        };
        if in_cols.contains(&field_idx) {
            return Ok(false);
        }
        if child_name == S_IN || child_name == S_IS_NOT_NULL {
            // The integer multi-range accepts only integer ranges, so a
            // value-set or null-test member cannot join the disjunction.
            let types = spec_types(spec);
            if types.contains(&S_I32) || types.contains(&S_I64) {
                return Ok(false);
            }
            if child_name == S_IN {
                if in_exists {
                    return Ok(false);
                }
                in_exists = true;
            }
        }
    }
    Ok(true)
}

/// Per-column accumulator for the pushable conjuncts of one Read.
///
/// The bound lists are positional: index `i` of `lower_bounds` and
/// `upper_bounds` together describe the `i`-th range of the column. A `None`
/// entry (or a missing tail entry) leaves that side of the range unbounded.
#[derive(Debug)]
struct FilterInfo {
    lower_bounds: Vec<Option<ScalarValue>>,
    lower_exclusives: Vec<bool>,
    upper_bounds: Vec<Option<ScalarValue>>,
    upper_exclusives: Vec<bool>,
    values: Vec<ScalarValue>,
    not_value: Option<ScalarValue>,
    null_allowed: bool,
    initialized: bool,
}

impl FilterInfo {
    fn new() -> Self {
        FilterInfo {
            lower_bounds: Vec::new(),
            lower_exclusives: Vec::new(),
            upper_bounds: Vec::new(),
            upper_exclusives: Vec::new(),
            values: Vec::new(),
            not_value: None,
            null_allowed: true,
            initialized: false,
        }
    }

    fn forbids_null(&mut self) {
        self.null_allowed = false;
        self.initialized = true;
    }

    fn set_lower(&mut self, value: Option<ScalarValue>, exclusive: bool) {
        self.lower_bounds.push(value);
        self.lower_exclusives.push(exclusive);
        self.initialized = true;
    }

    fn set_upper(&mut self, value: Option<ScalarValue>, exclusive: bool) {
        self.upper_bounds.push(value);
        self.upper_exclusives.push(exclusive);
        self.initialized = true;
    }

    fn set_not_value(&mut self, value: Option<ScalarValue>) {
        self.not_value = value;
        self.initialized = true;
    }

    fn set_values(&mut self, values: Vec<ScalarValue>) {
        self.values.extend(values);
        self.initialized = true;
    }

    /// Open a fresh disjunct: pad both bound lists to the same length so the
    /// next bound lands at a new index instead of intersecting the previous
    /// range.
    fn begin_disjunct(&mut self) {
        let len = self.lower_bounds.len().max(self.upper_bounds.len());
        while self.lower_bounds.len() < len {
            self.lower_bounds.push(None);
            self.lower_exclusives.push(false);
        }
        while self.upper_bounds.len() < len {
            self.upper_bounds.push(None);
            self.upper_exclusives.push(false);
        }
    }

    fn range_count(&self) -> usize {
        self.lower_bounds.len().max(self.upper_bounds.len())
    }
}

/// Apply one comparison to the column's accumulator. `reverse` flips the
/// comparison instead of building a negated expression tree.
fn set_col_info(
    filter_name: &str,
    info: &mut FilterInfo,
    value: Option<ScalarValue>,
    reverse: bool,
) -> Result<(), ConvertError> {
    match filter_name {
        S_IS_NOT_NULL => {
            if reverse {
                return Err(ConvertError::Unsupported(
                    "reverse is not supported for is_not_null".into(),
                ));
            }
            info.forbids_null();
        }
        S_GTE => {
            if reverse {
                info.set_upper(value, false);
            } else {
                info.set_lower(value, false);
            }
        }
        S_GT => {
            if reverse {
                info.set_upper(value, true);
            } else {
                info.set_lower(value, true);
            }
        }
        S_LTE => {
            if reverse {
                info.set_lower(value, false);
            } else {
                info.set_upper(value, false);
            }
        }
        S_LT => {
            if reverse {
                info.set_lower(value, true);
            } else {
                info.set_upper(value, true);
            }
        }
        S_EQUAL => {
            if reverse {
                info.set_not_value(value);
            } else {
                info.set_lower(value.clone(), false);
                info.set_upper(value, false);
            }
        }
        other => {
            return Err(ConvertError::Unsupported(format!(
                "filter name '{}' is not supported in subfield synthesis",
                other
            )));
        }
    }
    Ok(())
}

fn set_in_values(
    function: &ScalarFunction,
    col_info: &mut HashMap<u32, FilterInfo>,
    exprs: &ExprConverter,
) -> Result<(), ConvertError> {
    let col_idx = column_index_from_in(function)?;
    let literal = function.args[1].literal().ok_or_else(|| {
        ConvertError::InvalidInput("literal is expected as the second argument of IN".into())
    })?;
    let Some(LiteralType::List(list)) = &literal.literal_type else {
        return Err(ConvertError::InvalidInput(
            "list is expected as the second argument of IN".into(),
        ));
    };
    let mut scalars = Vec::with_capacity(list.values.len());
    for value in &list.values {
        scalars.push(exprs.to_scalar_value(value)?.1);
    }
    let info = col_info.get_mut(&col_idx).ok_or_else(|| {
        ConvertError::InvalidInput(format!("column index {} out of range", col_idx))
    })?;
    info.set_values(scalars);
    Ok(())
}

/// Fold one pushable comparison into the per-column accumulators.
fn set_filter_map(
    function: &ScalarFunction,
    registry: &FunctionRegistry,
    col_types: &[TypeKind],
    col_info: &mut HashMap<u32, FilterInfo>,
    reverse: bool,
    new_disjunct: bool,
    exprs: &ExprConverter,
) -> Result<(), ConvertError> {
    let filter_name = registry.short_name_of(function.function_reference)?;
    if filter_name == S_IN {
        return set_in_values(function, col_info, exprs);
    }

    let mut col_idx: Option<u32> = None;
    let mut literal = None;
    for param in &function.args {
        if let Some(field_reference) = param.selection() {
            col_idx = Some(reference_index(field_reference)?);
        } else if let Some(lit) = param.literal() {
            literal = Some(lit);
        } else {
            return Err(ConvertError::Unsupported(
                "argument kind is not supported in subfield filter creation".into(),
            ));
        }
    }
    let col_idx = col_idx.ok_or_else(|| {
        ConvertError::InvalidInput("column index is expected in subfield filter creation".into())
    })?;
    let column_type = col_types.get(col_idx as usize).copied().ok_or_else(|| {
        ConvertError::InvalidInput(format!("column index {} out of range", col_idx))
    })?;
    if !filter::supports_filter_type(column_type) {
        return Err(ConvertError::Unsupported(format!(
            "subfield filter is not supported for column type {}",
            column_type
        )));
    }
    let value = match literal {
        Some(lit) => Some(exprs.to_scalar_value(lit)?.1),
        None => None,
    };
    let info = col_info.get_mut(&col_idx).ok_or_else(|| {
        ConvertError::InvalidInput(format!("column index {} out of range", col_idx))
    })?;
    if new_disjunct {
        info.begin_disjunct();
    }
    set_col_info(filter_name, info, value, reverse)
}

/// Build the column -> typed filter map from the pushable conjuncts.
pub fn to_subfield_filters(
    col_names: &[String],
    col_types: &[TypeKind],
    scalar_functions: &[ScalarFunction],
    registry: &FunctionRegistry,
    exprs: &ExprConverter,
) -> Result<SubfieldFilters, ConvertError> {
    let mut col_info: HashMap<u32, FilterInfo> = (0..col_types.len() as u32)
        .map(|idx| (idx, FilterInfo::new()))
        .collect();

    for function in scalar_functions {
        let filter_name = registry.short_name_of(function.function_reference)?;
        match filter_name {
            S_NOT => {
                if function.args.len() != 1 {
                    return Err(ConvertError::InvalidInput(
                        "only one arg is expected for NOT".into(),
                    ));
                }
                let inner = function.args[0].scalar_function().ok_or_else(|| {
                    ConvertError::InvalidInput("scalar function is expected under NOT".into())
                })?;
                set_filter_map(inner, registry, col_types, &mut col_info, true, false, exprs)?;
            }
            S_OR => {
                if function.args.len() != 2 {
                    return Err(ConvertError::InvalidInput(
                        "two args are expected for OR".into(),
                    ));
                }
                for arg in &function.args {
                    let child = arg.scalar_function().ok_or_else(|| {
                        ConvertError::InvalidInput("scalar function is expected under OR".into())
                    })?;
                    set_filter_map(child, registry, col_types, &mut col_info, false, true, exprs)?;
                }
            }
            _ => {
                set_filter_map(
                    function,
                    registry,
                    col_types,
                    &mut col_info,
                    false,
                    false,
                    exprs,
                )?;
            }
        }
    }

    map_to_filters(col_names, col_types, &col_info)
}

fn map_to_filters(
    col_names: &[String],
    col_types: &[TypeKind],
    col_info: &HashMap<u32, FilterInfo>,
) -> Result<SubfieldFilters, ConvertError> {
    let mut filters = SubfieldFilters::new();
    for (idx, name) in col_names.iter().enumerate() {
        let Some(info) = col_info.get(&(idx as u32)) else {
            continue;
        };
        if !info.initialized {
            continue;
        }
        let column_filter = match col_types[idx] {
            TypeKind::Int32 | TypeKind::Int64 => bigint_column_filter(info)?,
            TypeKind::Double => double_column_filter(info)?,
            TypeKind::Varchar => bytes_column_filter(info)?,
            other => {
                return Err(ConvertError::Unsupported(format!(
                    "subfield filter synthesis is not supported for column type {}",
                    other
                )));
            }
        };
        if let Some(column_filter) = column_filter {
            filters.insert(name.clone(), column_filter);
        }
    }
    Ok(filters)
}

/// Bound at position `idx`: the value and exclusivity when present, or an
/// unbounded side when the list is short or the slot is empty.
fn bound_at<'a>(
    bounds: &'a [Option<ScalarValue>],
    exclusives: &[bool],
    idx: usize,
) -> (Option<&'a ScalarValue>, bool) {
    if idx < bounds.len() {
        if let Some(value) = &bounds[idx] {
            return (Some(value), exclusives[idx]);
        }
    }
    (None, false)
}

fn scalar_to_i64(value: &ScalarValue) -> Result<i64, ConvertError> {
    match value {
        ScalarValue::Int64(v) => Ok(*v),
        ScalarValue::Int32(v) => Ok(i64::from(*v)),
        other => Err(ConvertError::Unsupported(format!(
            "integer filter value is expected, got {}",
            other
        ))),
    }
}

fn scalar_to_f64(value: &ScalarValue) -> Result<f64, ConvertError> {
    match value {
        ScalarValue::Double(v) => Ok(v.into_inner()),
        other => Err(ConvertError::Unsupported(format!(
            "double filter value is expected, got {}",
            other
        ))),
    }
}

fn scalar_to_string(value: &ScalarValue) -> Result<String, ConvertError> {
    match value {
        ScalarValue::Varchar(v) => Ok(v.clone()),
        other => Err(ConvertError::Unsupported(format!(
            "string filter value is expected, got {}",
            other
        ))),
    }
}

fn check_exclusive_constraints(info: &FilterInfo, what: &str) -> Result<(), ConvertError> {
    if info.range_count() != 0 {
        return Err(ConvertError::Unsupported(format!(
            "bound conditions cannot be combined with {} on the same column",
            what
        )));
    }
    Ok(())
}

fn bigint_column_filter(info: &FilterInfo) -> Result<Option<Filter>, ConvertError> {
    let null_allowed = info.null_allowed;

    if !info.values.is_empty() {
        check_exclusive_constraints(info, "an IN filter")?;
        if info.not_value.is_some() {
            return Err(ConvertError::Unsupported(
                "not-equal cannot be combined with an IN filter on the same column".into(),
            ));
        }
        let values = info
            .values
            .iter()
            .map(scalar_to_i64)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Some(filter::bigint_values(values, null_allowed)));
    }

    if let Some(not_value) = &info.not_value {
        check_exclusive_constraints(info, "a not-equal filter")?;
        let v = scalar_to_i64(not_value)?;
        let below = BigintRange::new(i64::MIN, true, false, v, false, true, null_allowed);
        let above = BigintRange::new(v, false, true, i64::MAX, true, false, null_allowed);
        return Ok(Some(Filter::BigintMultiRange(BigintMultiRange {
            ranges: vec![below, above],
            null_allowed,
        })));
    }

    let range_count = info.range_count();
    if range_count == 0 {
        return Ok(if null_allowed {
            None
        } else {
            Some(Filter::IsNotNull)
        });
    }

    let mut ranges = Vec::with_capacity(range_count);
    for idx in 0..range_count {
        let (lower, lower_exclusive) = bound_at(&info.lower_bounds, &info.lower_exclusives, idx);
        let (upper, upper_exclusive) = bound_at(&info.upper_bounds, &info.upper_exclusives, idx);
        let (lower_value, lower_unbounded) = match lower {
            Some(value) => (scalar_to_i64(value)?, false),
            None => (i64::MIN, true),
        };
        let (upper_value, upper_unbounded) = match upper {
            Some(value) => (scalar_to_i64(value)?, false),
            None => (i64::MAX, true),
        };
        ranges.push(BigintRange::new(
            lower_value,
            lower_unbounded,
            lower_exclusive,
            upper_value,
            upper_unbounded,
            upper_exclusive,
            null_allowed,
        ));
    }
    Ok(Some(if ranges.len() == 1 {
        Filter::BigintRange(ranges.remove(0))
    } else {
        Filter::BigintMultiRange(BigintMultiRange {
            ranges,
            null_allowed,
        })
    }))
}

fn double_column_filter(info: &FilterInfo) -> Result<Option<Filter>, ConvertError> {
    let null_allowed = info.null_allowed;

    if !info.values.is_empty() {
        check_exclusive_constraints(info, "an IN filter")?;
        if info.not_value.is_some() {
            return Err(ConvertError::Unsupported(
                "not-equal cannot be combined with an IN filter on the same column".into(),
            ));
        }
        let values = info
            .values
            .iter()
            .map(scalar_to_f64)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Some(filter::double_values(values, null_allowed)));
    }

    if let Some(not_value) = &info.not_value {
        check_exclusive_constraints(info, "a not-equal filter")?;
        let v = scalar_to_f64(not_value)?;
        let below = DoubleRange {
            lower: f64::MIN,
            lower_unbounded: true,
            lower_exclusive: false,
            upper: v,
            upper_unbounded: false,
            upper_exclusive: true,
            null_allowed,
        };
        let above = DoubleRange {
            lower: v,
            lower_unbounded: false,
            lower_exclusive: true,
            upper: f64::MAX,
            upper_unbounded: true,
            upper_exclusive: false,
            null_allowed,
        };
        return Ok(Some(Filter::MultiRange(MultiRange {
            filters: vec![Filter::DoubleRange(below), Filter::DoubleRange(above)],
            null_allowed,
        })));
    }

    let range_count = info.range_count();
    if range_count == 0 {
        return Ok(if null_allowed {
            None
        } else {
            Some(Filter::IsNotNull)
        });
    }

    let mut ranges = Vec::with_capacity(range_count);
    for idx in 0..range_count {
        let (lower, lower_exclusive) = bound_at(&info.lower_bounds, &info.lower_exclusives, idx);
        let (upper, upper_exclusive) = bound_at(&info.upper_bounds, &info.upper_exclusives, idx);
        let (lower_value, lower_unbounded) = match lower {
            Some(value) => (scalar_to_f64(value)?, false),
            None => (f64::MIN, true),
        };
        let (upper_value, upper_unbounded) = match upper {
            Some(value) => (scalar_to_f64(value)?, false),
            None => (f64::MAX, true),
        };
        ranges.push(DoubleRange {
            lower: lower_value,
            lower_unbounded,
            lower_exclusive,
            upper: upper_value,
            upper_unbounded,
            upper_exclusive,
            null_allowed,
        });
    }
    Ok(Some(if ranges.len() == 1 {
        Filter::DoubleRange(ranges.remove(0))
    } else {
        Filter::MultiRange(MultiRange {
            filters: ranges.into_iter().map(Filter::DoubleRange).collect(),
            null_allowed,
        })
    }))
}

fn bytes_column_filter(info: &FilterInfo) -> Result<Option<Filter>, ConvertError> {
    let null_allowed = info.null_allowed;

    if !info.values.is_empty() {
        check_exclusive_constraints(info, "an IN filter")?;
        if info.not_value.is_some() {
            return Err(ConvertError::Unsupported(
                "not-equal cannot be combined with an IN filter on the same column".into(),
            ));
        }
        let values = info
            .values
            .iter()
            .map(scalar_to_string)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Some(Filter::BytesValues(BytesValues {
            values,
            null_allowed,
        })));
    }

    if let Some(not_value) = &info.not_value {
        check_exclusive_constraints(info, "a not-equal filter")?;
        let v = scalar_to_string(not_value)?;
        // Empty strings stand in for the unbounded sides; only the flags
        // are meaningful there.
        let below = BytesRange {
            lower: String::new(),
            lower_unbounded: true,
            lower_exclusive: false,
            upper: v.clone(),
            upper_unbounded: false,
            upper_exclusive: true,
            null_allowed,
        };
        let above = BytesRange {
            lower: v,
            lower_unbounded: false,
            lower_exclusive: true,
            upper: String::new(),
            upper_unbounded: true,
            upper_exclusive: false,
            null_allowed,
        };
        return Ok(Some(Filter::MultiRange(MultiRange {
            filters: vec![Filter::BytesRange(below), Filter::BytesRange(above)],
            null_allowed,
        })));
    }

    let range_count = info.range_count();
    if range_count == 0 {
        return Ok(if null_allowed {
            None
        } else {
            Some(Filter::IsNotNull)
        });
    }

    let mut ranges = Vec::with_capacity(range_count);
    for idx in 0..range_count {
        let (lower, lower_exclusive) = bound_at(&info.lower_bounds, &info.lower_exclusives, idx);
        let (upper, upper_exclusive) = bound_at(&info.upper_bounds, &info.upper_exclusives, idx);
        let (lower_value, lower_unbounded) = match lower {
            Some(value) => (scalar_to_string(value)?, false),
            None => (String::new(), true),
        };
        let (upper_value, upper_unbounded) = match upper {
            Some(value) => (scalar_to_string(value)?, false),
            None => (String::new(), true),
        };
        ranges.push(BytesRange {
            lower: lower_value,
            lower_unbounded,
            lower_exclusive,
            upper: upper_value,
            upper_unbounded,
            upper_exclusive,
            null_allowed,
        });
    }
    Ok(Some(if ranges.len() == 1 {
        Filter::BytesRange(ranges.remove(0))
    } else {
        Filter::MultiRange(MultiRange {
            filters: ranges.into_iter().map(Filter::BytesRange).collect(),
            null_allowed,
        })
    }))
}

/// Whether the file format's reader can evaluate every synthesized filter.
///
/// The Parquet reader evaluates only the listed kinds; one unsupported kind
/// rejects the whole set, and the caller demotes every conjunct to the
/// residual. Other formats accept everything.
pub fn is_pushdown_supported_by_format(
    format: FileFormat,
    subfield_filters: &SubfieldFilters,
) -> bool {
    match format {
        FileFormat::Parquet => subfield_filters.values().all(|f| {
            matches!(
                f.kind(),
                FilterKind::BigintRange
                    | FilterKind::DoubleRange
                    | FilterKind::BytesValues
                    | FilterKind::BytesRange
                    | FilterKind::BigintValuesUsingBitmask
                    | FilterKind::BigintValuesUsingHashTable
            )
        }),
        FileFormat::Dwrf | FileFormat::Unknown => true,
    }
}

/// Combine the remaining conjuncts left-to-right into one residual
/// expression; an empty list yields no residual.
pub fn connect_with_and(
    col_names: &[String],
    col_types: &[TypeKind],
    remaining_functions: &[ScalarFunction],
    exprs: &ExprConverter,
) -> Result<Option<TypedExpr>, ConvertError> {
    let Some((first, rest)) = remaining_functions.split_first() else {
        return Ok(None);
    };
    let input_type = RowType::new(col_names.to_vec(), col_types.to_vec());
    let mut remaining_filter = TypedExpr::Call(exprs.to_call(first, &input_type)?);
    for function in rest {
        let next = TypedExpr::Call(exprs.to_call(function, &input_type)?);
        remaining_filter = TypedExpr::call("and", vec![remaining_filter, next], TypeKind::Bool);
    }
    Ok(Some(remaining_filter))
}
