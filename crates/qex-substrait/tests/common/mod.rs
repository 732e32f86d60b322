//! Shared builders for constructing Substrait plans in tests.
#![allow(dead_code)]

use qex_core::memory::MemoryPool;
use qex_core::plan::{PlanNode, SplitInfoMap, TableScanNode};
use qex_substrait::proto;
use qex_substrait::proto::expression::field_reference::ReferenceType as FieldRefType;
use qex_substrait::proto::expression::literal::LiteralType;
use qex_substrait::proto::expression::reference_segment::{
    ReferenceType as SegmentRefType, StructField,
};
use qex_substrait::proto::expression::{
    FieldReference, Literal, ReferenceSegment, RexType, ScalarFunction,
};
use qex_substrait::proto::simple_extension_declaration::{ExtensionFunction, MappingType};
use qex_substrait::{ConvertError, PlanConverter};
use std::sync::Arc;

// Anchors of the function registry most tests share.
pub const F_AND: u32 = 0;
pub const F_GTE: u32 = 1;
pub const F_GT: u32 = 2;
pub const F_LTE: u32 = 3;
pub const F_LT: u32 = 4;
pub const F_EQUAL: u32 = 5;
pub const F_IN: u32 = 6;
pub const F_IS_NOT_NULL: u32 = 7;
pub const F_NOT: u32 = 8;
pub const F_OR: u32 = 9;
pub const F_SUBSTR: u32 = 10;
pub const F_EQ: u32 = 11;
pub const F_SUM: u32 = 12;
pub const F_IN_FP64: u32 = 13;
pub const F_IS_NOT_NULL_FP64: u32 = 14;
pub const F_GTE_FP64: u32 = 15;
pub const F_LT_FP64: u32 = 16;
pub const F_IN_STR: u32 = 17;

pub const FORMAT_PARQUET: i32 = 1;
pub const FORMAT_DWRF: i32 = 2;

pub fn base_extensions() -> Vec<proto::SimpleExtensionDeclaration> {
    [
        (F_AND, "and:bool,bool"),
        (F_GTE, "gte:i64,i64"),
        (F_GT, "gt:i64,i64"),
        (F_LTE, "lte:i64,i64"),
        (F_LT, "lt:i64,i64"),
        (F_EQUAL, "equal:i64,i64"),
        (F_IN, "in:i64,list<i64>"),
        (F_IS_NOT_NULL, "is_not_null:i64"),
        (F_NOT, "not:bool"),
        (F_OR, "or:bool,bool"),
        (F_SUBSTR, "substr:vchar,i32,i32"),
        (F_EQ, "eq:i64,i64"),
        (F_SUM, "sum:fp64"),
        (F_IN_FP64, "in:fp64,list<fp64>"),
        (F_IS_NOT_NULL_FP64, "is_not_null:fp64"),
        (F_GTE_FP64, "gte:fp64,fp64"),
        (F_LT_FP64, "lt:fp64,fp64"),
        (F_IN_STR, "in:str,list<str>"),
    ]
    .iter()
    .map(|(anchor, name)| function_extension(*anchor, name))
    .collect()
}

pub fn function_extension(anchor: u32, name: &str) -> proto::SimpleExtensionDeclaration {
    proto::SimpleExtensionDeclaration {
        mapping_type: Some(MappingType::ExtensionFunction(ExtensionFunction {
            extension_uri_reference: 0,
            function_anchor: anchor,
            name: name.to_string(),
        })),
    }
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

pub fn field(idx: i32) -> proto::Expression {
    proto::Expression {
        rex_type: Some(RexType::Selection(Box::new(FieldReference {
            reference_type: Some(FieldRefType::DirectReference(ReferenceSegment {
                reference_type: Some(SegmentRefType::StructField(StructField {
                    field: idx,
                    child: None,
                })),
            })),
        }))),
    }
}

pub fn literal(literal_type: LiteralType) -> proto::Expression {
    proto::Expression {
        rex_type: Some(RexType::Literal(Literal {
            literal_type: Some(literal_type),
        })),
    }
}

pub fn lit_i32(v: i32) -> proto::Expression {
    literal(LiteralType::I32(v))
}

pub fn lit_i64(v: i64) -> proto::Expression {
    literal(LiteralType::I64(v))
}

pub fn lit_f64(v: f64) -> proto::Expression {
    literal(LiteralType::Fp64(v))
}

pub fn lit_str(v: &str) -> proto::Expression {
    literal(LiteralType::String(v.to_string()))
}

fn list_of(values: Vec<Literal>) -> proto::Expression {
    literal(LiteralType::List(proto::expression::literal::List {
        values,
    }))
}

pub fn i64_list(values: &[i64]) -> proto::Expression {
    list_of(
        values
            .iter()
            .map(|v| Literal {
                literal_type: Some(LiteralType::I64(*v)),
            })
            .collect(),
    )
}

pub fn f64_list(values: &[f64]) -> proto::Expression {
    list_of(
        values
            .iter()
            .map(|v| Literal {
                literal_type: Some(LiteralType::Fp64(*v)),
            })
            .collect(),
    )
}

pub fn str_list(values: &[&str]) -> proto::Expression {
    list_of(
        values
            .iter()
            .map(|v| Literal {
                literal_type: Some(LiteralType::String(v.to_string())),
            })
            .collect(),
    )
}

pub fn call(anchor: u32, args: Vec<proto::Expression>) -> proto::Expression {
    proto::Expression {
        rex_type: Some(RexType::ScalarFunction(ScalarFunction {
            function_reference: anchor,
            args,
            output_type: None,
        })),
    }
}

// ---------------------------------------------------------------------------
// Types and schemas
// ---------------------------------------------------------------------------

pub fn t_bool() -> proto::Type {
    proto::Type {
        kind: Some(proto::r#type::Kind::Bool(proto::r#type::Boolean {})),
    }
}

pub fn t_i32() -> proto::Type {
    proto::Type {
        kind: Some(proto::r#type::Kind::I32(proto::r#type::I32 {})),
    }
}

pub fn t_i64() -> proto::Type {
    proto::Type {
        kind: Some(proto::r#type::Kind::I64(proto::r#type::I64 {})),
    }
}

pub fn t_fp64() -> proto::Type {
    proto::Type {
        kind: Some(proto::r#type::Kind::Fp64(proto::r#type::Fp64 {})),
    }
}

pub fn t_string() -> proto::Type {
    proto::Type {
        kind: Some(proto::r#type::Kind::String(proto::r#type::String {})),
    }
}

pub fn schema(columns: &[(&str, proto::Type)]) -> proto::NamedStruct {
    proto::NamedStruct {
        names: columns.iter().map(|(name, _)| name.to_string()).collect(),
        r#struct: Some(proto::r#type::Struct {
            types: columns.iter().map(|(_, t)| t.clone()).collect(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Relations
// ---------------------------------------------------------------------------

pub fn file_item(
    uri: &str,
    format: i32,
    partition_index: u64,
) -> proto::read_rel::local_files::FileOrFiles {
    proto::read_rel::local_files::FileOrFiles {
        uri_file: uri.to_string(),
        format,
        partition_index,
        start: 0,
        length: 1024,
    }
}

pub fn local_files(uri: &str, format: i32) -> proto::read_rel::LocalFiles {
    proto::read_rel::LocalFiles {
        items: vec![file_item(uri, format, 0)],
    }
}

pub fn read_rel(
    base_schema: proto::NamedStruct,
    files: proto::read_rel::LocalFiles,
    filter: Option<proto::Expression>,
) -> proto::Rel {
    proto::Rel {
        rel_type: Some(proto::rel::RelType::Read(Box::new(proto::ReadRel {
            base_schema: Some(base_schema),
            filter,
            read_type: Some(proto::read_rel::ReadType::LocalFiles(files)),
        }))),
    }
}

pub fn read_rel_virtual(
    base_schema: proto::NamedStruct,
    values: Vec<proto::expression::literal::Struct>,
) -> proto::Rel {
    proto::Rel {
        rel_type: Some(proto::rel::RelType::Read(Box::new(proto::ReadRel {
            base_schema: Some(base_schema),
            filter: None,
            read_type: Some(proto::read_rel::ReadType::VirtualTable(
                proto::read_rel::VirtualTable { values },
            )),
        }))),
    }
}

pub fn literal_struct(fields: Vec<LiteralType>) -> proto::expression::literal::Struct {
    proto::expression::literal::Struct {
        fields: fields
            .into_iter()
            .map(|literal_type| Literal {
                literal_type: Some(literal_type),
            })
            .collect(),
    }
}

pub fn filter_rel(input: proto::Rel, condition: proto::Expression) -> proto::Rel {
    proto::Rel {
        rel_type: Some(proto::rel::RelType::Filter(Box::new(proto::FilterRel {
            input: Some(Box::new(input)),
            condition: Some(condition),
        }))),
    }
}

pub fn project_rel(input: proto::Rel, expressions: Vec<proto::Expression>) -> proto::Rel {
    proto::Rel {
        rel_type: Some(proto::rel::RelType::Project(Box::new(proto::ProjectRel {
            input: Some(Box::new(input)),
            expressions,
        }))),
    }
}

pub fn measure(
    anchor: u32,
    args: Vec<proto::Expression>,
    phase: i32,
    output_type: proto::Type,
) -> proto::aggregate_rel::Measure {
    proto::aggregate_rel::Measure {
        measure: Some(proto::AggregateFunction {
            function_reference: anchor,
            args,
            phase,
            output_type: Some(output_type),
        }),
    }
}

pub fn aggregate_rel(
    input: proto::Rel,
    grouping_expressions: Vec<proto::Expression>,
    measures: Vec<proto::aggregate_rel::Measure>,
) -> proto::Rel {
    proto::Rel {
        rel_type: Some(proto::rel::RelType::Aggregate(Box::new(
            proto::AggregateRel {
                input: Some(Box::new(input)),
                groupings: vec![proto::aggregate_rel::Grouping {
                    grouping_expressions,
                }],
                measures,
            },
        ))),
    }
}

pub fn join_rel(
    left: proto::Rel,
    right: proto::Rel,
    expression: proto::Expression,
    join_type: i32,
    post_join_filter: Option<proto::Expression>,
) -> proto::Rel {
    proto::Rel {
        rel_type: Some(proto::rel::RelType::Join(Box::new(proto::JoinRel {
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
            expression: Some(expression),
            post_join_filter,
            r#type: join_type,
        }))),
    }
}

pub fn root_plan(
    extensions: Vec<proto::SimpleExtensionDeclaration>,
    rel: proto::Rel,
) -> proto::Plan {
    proto::Plan {
        extensions,
        relations: vec![proto::PlanRel {
            rel_type: Some(proto::plan_rel::RelType::Root(proto::RelRoot {
                input: Some(rel),
                names: vec![],
            })),
        }],
    }
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

pub fn convert(plan: &proto::Plan) -> (Arc<PlanNode>, SplitInfoMap) {
    let mut converter = PlanConverter::new(MemoryPool::new());
    let root = converter.to_plan(plan).expect("conversion should succeed");
    let split_info_map = converter.take_split_info_map();
    (root, split_info_map)
}

pub fn convert_err(plan: &proto::Plan) -> ConvertError {
    let mut converter = PlanConverter::new(MemoryPool::new());
    converter
        .to_plan(plan)
        .err()
        .expect("conversion should fail")
}

pub fn scan_of(node: &PlanNode) -> &TableScanNode {
    match node {
        PlanNode::TableScan(scan) => scan,
        other => panic!("expected a table scan, got {:?}", other),
    }
}
