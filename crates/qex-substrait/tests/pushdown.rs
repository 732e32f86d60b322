//! End-to-end scan filter pushdown tests.
//!
//! Each test converts a plan whose root is a filtered Read and inspects the
//! produced table handle: which conjuncts became typed per-column filters,
//! which stayed behind as the residual expression, and how the file-format
//! capability gate reshuffles the split.

mod common;

use common::*;
use qex_core::expr::{ScalarValue, TypedExpr};
use qex_core::filter::{Filter, FilterKind};
use qex_core::plan::TableScanNode;
use qex_core::types::TypeKind;
use qex_substrait::extensions::FunctionRegistry;
use qex_substrait::proto;
use qex_substrait::pushdown;

fn scan_with_filter(
    columns: &[(&str, proto::Type)],
    condition: proto::Expression,
    format: i32,
) -> TableScanNode {
    let rel = read_rel(
        schema(columns),
        local_files("/data/part-00000", format),
        Some(condition),
    );
    let plan = root_plan(base_extensions(), rel);
    let (root, _) = convert(&plan);
    scan_of(&root).clone()
}

fn int_columns() -> Vec<(&'static str, proto::Type)> {
    vec![("a", t_i64()), ("b", t_i64())]
}

fn expect_bigint_range(filter: &Filter) -> &qex_core::filter::BigintRange {
    match filter {
        Filter::BigintRange(range) => range,
        other => panic!("expected a bigint range, got {:?}", other),
    }
}

// ---------------------------------------------------------------------------
// Range split
// ---------------------------------------------------------------------------

#[test]
fn test_range_conjuncts_split_from_residual() {
    // a >= 10 AND b < 5 AND substr(a) = "x"
    let condition = call(
        F_AND,
        vec![
            call(
                F_AND,
                vec![
                    call(F_GTE, vec![field(0), lit_i64(10)]),
                    call(F_LT, vec![field(1), lit_i64(5)]),
                ],
            ),
            call(
                F_EQUAL,
                vec![call(F_SUBSTR, vec![field(0)]), lit_str("x")],
            ),
        ],
    );
    let scan = scan_with_filter(&int_columns(), condition, FORMAT_DWRF);
    let handle = &scan.table_handle;

    assert_eq!(handle.subfield_filters.len(), 2);
    let a = expect_bigint_range(&handle.subfield_filters["a"]);
    assert_eq!(a.lower(), 10);
    assert_eq!(a.upper(), i64::MAX);
    assert!(a.null_allowed());
    let b = expect_bigint_range(&handle.subfield_filters["b"]);
    assert_eq!(b.lower(), i64::MIN);
    assert_eq!(b.upper(), 4);

    // The residual references the scanned table's own column names.
    let residual = handle.remaining_filter.as_ref().expect("residual expected");
    let eq = residual.as_call().expect("residual should be a call");
    assert_eq!(eq.name, "eq");
    assert_eq!(eq.args[0].as_call().unwrap().name, "substr");
    assert_eq!(
        eq.args[1],
        TypedExpr::constant(TypeKind::Varchar, ScalarValue::Varchar("x".into()))
    );
}

// ---------------------------------------------------------------------------
// NOT(equal)
// ---------------------------------------------------------------------------

#[test]
fn test_not_equal_becomes_multi_range() {
    let condition = call(F_NOT, vec![call(F_EQUAL, vec![field(0), lit_i64(7)])]);
    let scan = scan_with_filter(&int_columns(), condition, FORMAT_DWRF);
    let handle = &scan.table_handle;

    assert!(handle.remaining_filter.is_none());
    match &handle.subfield_filters["a"] {
        Filter::BigintMultiRange(multi) => {
            assert_eq!(multi.ranges.len(), 2);
            assert_eq!(multi.ranges[0].lower(), i64::MIN);
            assert_eq!(multi.ranges[0].upper(), 6);
            assert_eq!(multi.ranges[1].lower(), 8);
            assert_eq!(multi.ranges[1].upper(), i64::MAX);
            assert!(multi.null_allowed);
        }
        other => panic!("expected a multi range, got {:?}", other),
    }
}

#[test]
fn test_second_not_equal_on_same_column_is_residual() {
    let condition = call(
        F_AND,
        vec![
            call(F_NOT, vec![call(F_EQUAL, vec![field(0), lit_i64(1)])]),
            call(F_NOT, vec![call(F_EQUAL, vec![field(0), lit_i64(2)])]),
        ],
    );
    let scan = scan_with_filter(&int_columns(), condition, FORMAT_DWRF);
    let handle = &scan.table_handle;

    // The first not(equal) is pushed; the second keeps its meaning above
    // the scan.
    match &handle.subfield_filters["a"] {
        Filter::BigintMultiRange(multi) => {
            assert_eq!(multi.ranges[0].upper(), 0);
            assert_eq!(multi.ranges[1].lower(), 2);
        }
        other => panic!("expected a multi range, got {:?}", other),
    }
    let residual = handle.remaining_filter.as_ref().unwrap().as_call().unwrap();
    assert_eq!(residual.name, "not");
    let inner = residual.args[0].as_call().unwrap();
    assert_eq!(inner.name, "eq");
    assert_eq!(
        inner.args[1],
        TypedExpr::constant(TypeKind::Int64, ScalarValue::Int64(2))
    );
}

// ---------------------------------------------------------------------------
// IN
// ---------------------------------------------------------------------------

#[test]
fn test_in_coexists_with_is_not_null() {
    let condition = call(
        F_AND,
        vec![
            call(F_IN, vec![field(0), i64_list(&[1, 2, 3])]),
            call(F_IS_NOT_NULL, vec![field(0)]),
        ],
    );
    let scan = scan_with_filter(&int_columns(), condition, FORMAT_DWRF);
    let handle = &scan.table_handle;

    assert!(handle.remaining_filter.is_none());
    match &handle.subfield_filters["a"] {
        Filter::BigintValues(values) => {
            assert_eq!(values.values, vec![1, 2, 3]);
            assert!(!values.null_allowed);
            assert_eq!(values.kind(), FilterKind::BigintValuesUsingBitmask);
        }
        other => panic!("expected an in-values filter, got {:?}", other),
    }
}

#[test]
fn test_in_excludes_range_on_same_column() {
    let condition = call(
        F_AND,
        vec![
            call(F_IN, vec![field(0), i64_list(&[1, 2])]),
            call(F_GT, vec![field(0), lit_i64(0)]),
        ],
    );
    let scan = scan_with_filter(&int_columns(), condition, FORMAT_DWRF);
    let handle = &scan.table_handle;

    match &handle.subfield_filters["a"] {
        Filter::BigintValues(values) => {
            assert_eq!(values.values, vec![1, 2]);
            assert!(values.null_allowed);
        }
        other => panic!("expected an in-values filter, got {:?}", other),
    }
    let residual = handle.remaining_filter.as_ref().unwrap().as_call().unwrap();
    assert_eq!(residual.name, "gt");
    assert_eq!(residual.args[0], TypedExpr::field("a", TypeKind::Int64));
}

#[test]
fn test_int32_in_values_coerce_to_bigint() {
    let columns = vec![("a", t_i32()), ("b", t_i64())];
    let condition = call(
        F_IN,
        vec![
            field(0),
            literal(proto::expression::literal::LiteralType::List(
                proto::expression::literal::List {
                    values: vec![
                        proto::expression::Literal {
                            literal_type: Some(proto::expression::literal::LiteralType::I32(4)),
                        },
                        proto::expression::Literal {
                            literal_type: Some(proto::expression::literal::LiteralType::I32(9)),
                        },
                    ],
                },
            )),
        ],
    );
    let scan = scan_with_filter(&columns, condition, FORMAT_DWRF);
    match &scan.table_handle.subfield_filters["a"] {
        Filter::BigintValues(values) => assert_eq!(values.values, vec![4, 9]),
        other => panic!("expected an in-values filter, got {:?}", other),
    }
}

// ---------------------------------------------------------------------------
// OR
// ---------------------------------------------------------------------------

#[test]
fn test_or_on_one_column_becomes_multi_range() {
    // (a < 0) OR (a > 10)
    let condition = call(
        F_OR,
        vec![
            call(F_LT, vec![field(0), lit_i64(0)]),
            call(F_GT, vec![field(0), lit_i64(10)]),
        ],
    );
    let scan = scan_with_filter(&int_columns(), condition, FORMAT_DWRF);
    let handle = &scan.table_handle;

    assert!(handle.remaining_filter.is_none());
    match &handle.subfield_filters["a"] {
        Filter::BigintMultiRange(multi) => {
            assert_eq!(multi.ranges.len(), 2);
            assert_eq!(multi.ranges[0].lower(), i64::MIN);
            assert_eq!(multi.ranges[0].upper(), -1);
            assert_eq!(multi.ranges[1].lower(), 11);
            assert_eq!(multi.ranges[1].upper(), i64::MAX);
        }
        other => panic!("expected a multi range, got {:?}", other),
    }
}

#[test]
fn test_or_across_columns_is_residual() {
    let condition = call(
        F_OR,
        vec![
            call(F_LT, vec![field(0), lit_i64(0)]),
            call(F_GT, vec![field(1), lit_i64(10)]),
        ],
    );
    let scan = scan_with_filter(&int_columns(), condition, FORMAT_DWRF);
    let handle = &scan.table_handle;

    assert!(handle.subfield_filters.is_empty());
    let residual = handle.remaining_filter.as_ref().unwrap().as_call().unwrap();
    assert_eq!(residual.name, "or");
}

#[test]
fn test_or_with_integer_in_member_is_residual() {
    // The integer multi-range cannot hold a value-set member.
    let condition = call(
        F_OR,
        vec![
            call(F_IN, vec![field(0), i64_list(&[1, 2])]),
            call(F_IS_NOT_NULL, vec![field(0)]),
        ],
    );
    let scan = scan_with_filter(&int_columns(), condition, FORMAT_DWRF);
    let handle = &scan.table_handle;

    assert!(handle.subfield_filters.is_empty());
    assert_eq!(
        handle.remaining_filter.as_ref().unwrap().as_call().unwrap().name,
        "or"
    );
}

#[test]
fn test_or_mixing_in_and_range_on_double_fails() {
    // Pushable by the classifier, but the value set cannot intersect with a
    // range during synthesis.
    let columns = vec![("c", t_fp64())];
    let condition = call(
        F_OR,
        vec![
            call(F_IN_FP64, vec![field(0), f64_list(&[1.5])]),
            call(F_LT_FP64, vec![field(0), lit_f64(1.0)]),
        ],
    );
    let rel = read_rel(
        schema(&columns),
        local_files("/data/part-00000", FORMAT_DWRF),
        Some(condition),
    );
    let err = convert_err(&root_plan(base_extensions(), rel));
    assert!(matches!(err, qex_substrait::ConvertError::Unsupported(_)));
}

// ---------------------------------------------------------------------------
// Format capability gate
// ---------------------------------------------------------------------------

#[test]
fn test_parquet_gate_demotes_whole_set() {
    // is_not_null(a) alone synthesizes a null-test filter, which the
    // Parquet reader cannot evaluate: every conjunct funnels back into the
    // residual, including the otherwise pushable range on b.
    let condition = call(
        F_AND,
        vec![
            call(F_IS_NOT_NULL, vec![field(0)]),
            call(F_GT, vec![field(1), lit_i64(0)]),
        ],
    );
    let scan = scan_with_filter(&int_columns(), condition, FORMAT_PARQUET);
    let handle = &scan.table_handle;

    assert!(handle.subfield_filters.is_empty());
    let residual = handle.remaining_filter.as_ref().unwrap().as_call().unwrap();
    assert_eq!(residual.name, "and");
    assert_eq!(residual.args[0].as_call().unwrap().name, "is_not_null");
    assert_eq!(residual.args[1].as_call().unwrap().name, "gt");
}

#[test]
fn test_parquet_keeps_null_test_merged_into_range() {
    // On the same column the null test folds into the range's null
    // allowance, so nothing unsupported reaches the gate.
    let condition = call(
        F_AND,
        vec![
            call(F_IS_NOT_NULL, vec![field(0)]),
            call(F_GT, vec![field(0), lit_i64(0)]),
        ],
    );
    let scan = scan_with_filter(&int_columns(), condition, FORMAT_PARQUET);
    let handle = &scan.table_handle;

    assert!(handle.remaining_filter.is_none());
    let a = expect_bigint_range(&handle.subfield_filters["a"]);
    assert_eq!(a.lower(), 1);
    assert!(!a.null_allowed());
}

#[test]
fn test_dwrf_accepts_null_test_kind() {
    let condition = call(F_IS_NOT_NULL, vec![field(0)]);
    let scan = scan_with_filter(&int_columns(), condition, FORMAT_DWRF);
    let handle = &scan.table_handle;
    assert_eq!(handle.subfield_filters["a"].kind(), FilterKind::IsNotNull);
    assert!(handle.remaining_filter.is_none());
}

// ---------------------------------------------------------------------------
// Bytes and double columns
// ---------------------------------------------------------------------------

#[test]
fn test_bytes_range_bounds() {
    let columns = vec![("s", t_string())];
    let condition = call(
        F_AND,
        vec![
            call(F_GTE, vec![field(0), lit_str("a")]),
            call(F_LT, vec![field(0), lit_str("m")]),
        ],
    );
    let scan = scan_with_filter(&columns, condition, FORMAT_DWRF);
    match &scan.table_handle.subfield_filters["s"] {
        Filter::BytesRange(range) => {
            assert_eq!(range.lower, "a");
            assert!(!range.lower_unbounded);
            assert!(!range.lower_exclusive);
            assert_eq!(range.upper, "m");
            assert!(!range.upper_unbounded);
            assert!(range.upper_exclusive);
        }
        other => panic!("expected a bytes range, got {:?}", other),
    }
}

#[test]
fn test_bytes_in_values() {
    let columns = vec![("s", t_string())];
    let condition = call(
        F_AND,
        vec![
            call(F_IN_STR, vec![field(0), str_list(&["x", "y"])]),
            call(F_IS_NOT_NULL, vec![field(0)]),
        ],
    );
    let scan = scan_with_filter(&columns, condition, FORMAT_DWRF);
    match &scan.table_handle.subfield_filters["s"] {
        Filter::BytesValues(values) => {
            assert_eq!(values.values, vec!["x", "y"]);
            assert!(!values.null_allowed);
        }
        other => panic!("expected a bytes-values filter, got {:?}", other),
    }
}

#[test]
fn test_double_range_keeps_exclusivity_flags() {
    let columns = vec![("c", t_fp64())];
    let condition = call(
        F_AND,
        vec![
            call(F_GTE_FP64, vec![field(0), lit_f64(1.5)]),
            call(F_LT_FP64, vec![field(0), lit_f64(9.5)]),
        ],
    );
    let scan = scan_with_filter(&columns, condition, FORMAT_DWRF);
    match &scan.table_handle.subfield_filters["c"] {
        Filter::DoubleRange(range) => {
            assert_eq!(range.lower, 1.5);
            assert!(!range.lower_exclusive);
            assert_eq!(range.upper, 9.5);
            assert!(range.upper_exclusive);
            assert!(range.null_allowed);
        }
        other => panic!("expected a double range, got {:?}", other),
    }
}

// ---------------------------------------------------------------------------
// Partition property
// ---------------------------------------------------------------------------

#[test]
fn test_classification_partitions_the_conjunct_list() {
    let plan = proto::Plan {
        extensions: base_extensions(),
        relations: vec![],
    };
    let registry = FunctionRegistry::from_plan(&plan);

    let condition = call(
        F_AND,
        vec![
            call(
                F_AND,
                vec![
                    call(F_GTE, vec![field(0), lit_i64(1)]),
                    call(
                        F_EQUAL,
                        vec![call(F_SUBSTR, vec![field(0)]), lit_str("x")],
                    ),
                ],
            ),
            call(
                F_AND,
                vec![
                    call(F_NOT, vec![call(F_EQUAL, vec![field(0), lit_i64(5)])]),
                    call(
                        F_OR,
                        vec![
                            call(F_LT, vec![field(0), lit_i64(0)]),
                            call(F_GT, vec![field(0), lit_i64(10)]),
                        ],
                    ),
                ],
            ),
        ],
    );

    let mut flat = Vec::new();
    pushdown::flatten_conditions(&condition, &registry, &mut flat).unwrap();
    assert_eq!(flat.len(), 4);

    let (subfield, remaining) = pushdown::separate_filters(&flat, &registry).unwrap();
    assert_eq!(subfield.len() + remaining.len(), flat.len());
    // Order is preserved within each partition.
    assert_eq!(subfield[0], flat[0]);
    assert_eq!(subfield[1], flat[2]);
    assert_eq!(subfield[2], flat[3]);
    assert_eq!(remaining[0], flat[1]);
}
