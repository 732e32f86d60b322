//! # Consumed Substrait Message Subset
//!
//! Hand-maintained prost messages for the slice of the Substrait protobuf
//! schema the converter consumes. We use `prost` derive macros directly on
//! Rust structs instead of a `.proto` file + build step. This keeps the
//! build simple and avoids needing `protoc` installed; fields the converter
//! never reads are omitted and skipped on decode.
//!
//! Field tags follow the Substrait revision this wire contract was built
//! against: aggregate and scalar functions carry plain expression argument
//! lists, and `FileOrFiles.format` is an integer tag (1 = Parquet, 2/3 =
//! DWRF). Tags must remain stable; do not renumber.

/// A Substrait plan: function extensions plus one relation tree.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Plan {
    #[prost(message, repeated, tag = "2")]
    pub extensions: Vec<SimpleExtensionDeclaration>,
    #[prost(message, repeated, tag = "3")]
    pub relations: Vec<PlanRel>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SimpleExtensionDeclaration {
    #[prost(oneof = "simple_extension_declaration::MappingType", tags = "3")]
    pub mapping_type: Option<simple_extension_declaration::MappingType>,
}

pub mod simple_extension_declaration {
    /// Registers a function spec string under an integer anchor.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ExtensionFunction {
        #[prost(uint32, tag = "1")]
        pub extension_uri_reference: u32,
        #[prost(uint32, tag = "2")]
        pub function_anchor: u32,
        #[prost(string, tag = "3")]
        pub name: String,
    }

    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum MappingType {
        #[prost(message, tag = "3")]
        ExtensionFunction(ExtensionFunction),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PlanRel {
    #[prost(oneof = "plan_rel::RelType", tags = "1, 2")]
    pub rel_type: Option<plan_rel::RelType>,
}

pub mod plan_rel {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum RelType {
        #[prost(message, tag = "1")]
        Rel(super::Rel),
        #[prost(message, tag = "2")]
        Root(super::RelRoot),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RelRoot {
    #[prost(message, optional, tag = "1")]
    pub input: Option<Rel>,
    /// Output column names for the whole computation. Accepted but unused.
    #[prost(string, repeated, tag = "2")]
    pub names: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Rel {
    #[prost(oneof = "rel::RelType", tags = "1, 2, 4, 6, 7")]
    pub rel_type: Option<rel::RelType>,
}

pub mod rel {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum RelType {
        #[prost(message, tag = "1")]
        Read(Box<super::ReadRel>),
        #[prost(message, tag = "2")]
        Filter(Box<super::FilterRel>),
        #[prost(message, tag = "4")]
        Aggregate(Box<super::AggregateRel>),
        #[prost(message, tag = "6")]
        Join(Box<super::JoinRel>),
        #[prost(message, tag = "7")]
        Project(Box<super::ProjectRel>),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReadRel {
    #[prost(message, optional, tag = "2")]
    pub base_schema: Option<NamedStruct>,
    #[prost(message, optional, tag = "3")]
    pub filter: Option<Expression>,
    #[prost(oneof = "read_rel::ReadType", tags = "5, 6")]
    pub read_type: Option<read_rel::ReadType>,
}

pub mod read_rel {
    /// In-line constant rows, one literal struct per batch.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct VirtualTable {
        #[prost(message, repeated, tag = "1")]
        pub values: Vec<super::expression::literal::Struct>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct LocalFiles {
        #[prost(message, repeated, tag = "1")]
        pub items: Vec<local_files::FileOrFiles>,
    }

    pub mod local_files {
        /// One file split: a byte range of one file plus its format tag.
        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct FileOrFiles {
            #[prost(string, tag = "3")]
            pub uri_file: String,
            /// Integer format tag: 1 = Parquet, 2/3 = DWRF, else unknown.
            #[prost(int32, tag = "5")]
            pub format: i32,
            #[prost(uint64, tag = "6")]
            pub partition_index: u64,
            #[prost(uint64, tag = "7")]
            pub start: u64,
            #[prost(uint64, tag = "8")]
            pub length: u64,
        }
    }

    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum ReadType {
        #[prost(message, tag = "5")]
        VirtualTable(VirtualTable),
        #[prost(message, tag = "6")]
        LocalFiles(LocalFiles),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FilterRel {
    #[prost(message, optional, boxed, tag = "2")]
    pub input: Option<Box<Rel>>,
    #[prost(message, optional, tag = "3")]
    pub condition: Option<Expression>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProjectRel {
    #[prost(message, optional, boxed, tag = "2")]
    pub input: Option<Box<Rel>>,
    #[prost(message, repeated, tag = "3")]
    pub expressions: Vec<Expression>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AggregateRel {
    #[prost(message, optional, boxed, tag = "2")]
    pub input: Option<Box<Rel>>,
    #[prost(message, repeated, tag = "3")]
    pub groupings: Vec<aggregate_rel::Grouping>,
    #[prost(message, repeated, tag = "4")]
    pub measures: Vec<aggregate_rel::Measure>,
}

pub mod aggregate_rel {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Grouping {
        #[prost(message, repeated, tag = "1")]
        pub grouping_expressions: Vec<super::Expression>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Measure {
        #[prost(message, optional, tag = "1")]
        pub measure: Option<super::AggregateFunction>,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AggregateFunction {
    #[prost(uint32, tag = "1")]
    pub function_reference: u32,
    #[prost(message, repeated, tag = "2")]
    pub args: Vec<Expression>,
    #[prost(enumeration = "AggregationPhase", tag = "4")]
    pub phase: i32,
    #[prost(message, optional, tag = "5")]
    pub output_type: Option<Type>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum AggregationPhase {
    Unspecified = 0,
    InitialToIntermediate = 1,
    IntermediateToIntermediate = 2,
    InitialToResult = 3,
    IntermediateToResult = 4,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct JoinRel {
    #[prost(message, optional, boxed, tag = "2")]
    pub left: Option<Box<Rel>>,
    #[prost(message, optional, boxed, tag = "3")]
    pub right: Option<Box<Rel>>,
    #[prost(message, optional, tag = "4")]
    pub expression: Option<Expression>,
    #[prost(message, optional, tag = "5")]
    pub post_join_filter: Option<Expression>,
    #[prost(enumeration = "join_rel::JoinType", tag = "6")]
    pub r#type: i32,
}

pub mod join_rel {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum JoinType {
        Unspecified = 0,
        Inner = 1,
        Outer = 2,
        Left = 3,
        Right = 4,
        Semi = 5,
        Anti = 6,
        Single = 7,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Expression {
    #[prost(oneof = "expression::RexType", tags = "1, 2, 3")]
    pub rex_type: Option<expression::RexType>,
}

pub mod expression {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum RexType {
        #[prost(message, tag = "1")]
        Literal(Literal),
        #[prost(message, tag = "2")]
        Selection(Box<FieldReference>),
        #[prost(message, tag = "3")]
        ScalarFunction(ScalarFunction),
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Literal {
        #[prost(oneof = "literal::LiteralType", tags = "1, 5, 7, 11, 12, 16, 25, 29, 30")]
        pub literal_type: Option<literal::LiteralType>,
    }

    pub mod literal {
        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct List {
            #[prost(message, repeated, tag = "1")]
            pub values: Vec<super::Literal>,
        }

        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct Struct {
            /// A possibly multi-row batch of column-major literal values.
            #[prost(message, repeated, tag = "1")]
            pub fields: Vec<super::Literal>,
        }

        #[derive(Clone, PartialEq, ::prost::Oneof)]
        pub enum LiteralType {
            #[prost(bool, tag = "1")]
            Boolean(bool),
            #[prost(int32, tag = "5")]
            I32(i32),
            #[prost(int64, tag = "7")]
            I64(i64),
            #[prost(double, tag = "11")]
            Fp64(f64),
            #[prost(string, tag = "12")]
            String(String),
            #[prost(int32, tag = "16")]
            Date(i32),
            #[prost(message, tag = "25")]
            Struct(Struct),
            #[prost(message, tag = "29")]
            Null(super::super::Type),
            #[prost(message, tag = "30")]
            List(List),
        }
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ScalarFunction {
        #[prost(uint32, tag = "1")]
        pub function_reference: u32,
        #[prost(message, repeated, tag = "2")]
        pub args: Vec<super::Expression>,
        #[prost(message, optional, tag = "3")]
        pub output_type: Option<super::Type>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct FieldReference {
        #[prost(oneof = "field_reference::ReferenceType", tags = "1")]
        pub reference_type: Option<field_reference::ReferenceType>,
    }

    pub mod field_reference {
        #[derive(Clone, PartialEq, ::prost::Oneof)]
        pub enum ReferenceType {
            #[prost(message, tag = "1")]
            DirectReference(super::ReferenceSegment),
        }
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ReferenceSegment {
        #[prost(oneof = "reference_segment::ReferenceType", tags = "2")]
        pub reference_type: Option<reference_segment::ReferenceType>,
    }

    pub mod reference_segment {
        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct StructField {
            #[prost(int32, tag = "1")]
            pub field: i32,
            #[prost(message, optional, boxed, tag = "2")]
            pub child: Option<Box<super::ReferenceSegment>>,
        }

        #[derive(Clone, PartialEq, ::prost::Oneof)]
        pub enum ReferenceType {
            #[prost(message, tag = "2")]
            StructField(StructField),
        }
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Type {
    #[prost(oneof = "r#type::Kind", tags = "1, 5, 7, 10, 11, 12, 13, 16")]
    pub kind: Option<r#type::Kind>,
}

pub mod r#type {
    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct Boolean {}

    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct I32 {}

    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct I64 {}

    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct Fp32 {}

    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct Fp64 {}

    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct String {}

    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct Binary {}

    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct Date {}

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Struct {
        #[prost(message, repeated, tag = "1")]
        pub types: Vec<super::Type>,
    }

    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Kind {
        #[prost(message, tag = "1")]
        Bool(Boolean),
        #[prost(message, tag = "5")]
        I32(I32),
        #[prost(message, tag = "7")]
        I64(I64),
        #[prost(message, tag = "10")]
        Fp32(Fp32),
        #[prost(message, tag = "11")]
        Fp64(Fp64),
        #[prost(message, tag = "12")]
        String(String),
        #[prost(message, tag = "13")]
        Binary(Binary),
        #[prost(message, tag = "16")]
        Date(Date),
    }
}

/// Schema: column names paired with a struct of column types.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NamedStruct {
    #[prost(string, repeated, tag = "1")]
    pub names: Vec<String>,
    #[prost(message, optional, tag = "2")]
    pub r#struct: Option<r#type::Struct>,
}

impl Expression {
    /// The field reference, when this expression is a column selection.
    pub fn selection(&self) -> Option<&expression::FieldReference> {
        match &self.rex_type {
            Some(expression::RexType::Selection(f)) => Some(f.as_ref()),
            _ => None,
        }
    }

    pub fn literal(&self) -> Option<&expression::Literal> {
        match &self.rex_type {
            Some(expression::RexType::Literal(l)) => Some(l),
            _ => None,
        }
    }

    pub fn scalar_function(&self) -> Option<&expression::ScalarFunction> {
        match &self.rex_type {
            Some(expression::RexType::ScalarFunction(f)) => Some(f),
            _ => None,
        }
    }
}

impl expression::FieldReference {
    /// The direct reference segment, when present.
    pub fn direct_reference(&self) -> Option<&expression::ReferenceSegment> {
        match &self.reference_type {
            Some(expression::field_reference::ReferenceType::DirectReference(seg)) => Some(seg),
            None => None,
        }
    }
}
