//! # Plan Nodes
//!
//! The executable plan graph produced by conversion. Nodes are immutable once
//! built; children are shared through `Arc` because a pre-built stream input
//! can be handed to the converter and spliced into the tree it produces.
//!
//! Node identifiers are opaque strings, dense integers starting at zero in
//! the order nodes are created (children before parents). Generated column
//! names embed the id (`n<id>_<col>`), which keeps names unique across the
//! whole plan.

use crate::expr::{CallExpr, FieldAccessExpr, TypedExpr};
use crate::filter::SubfieldFilters;
use crate::types::{RowType, TypeKind};
use crate::vector::RowVector;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Stable string identifier of a plan node, unique within one conversion.
pub type PlanNodeId = String;

/// Join semantics supported by the hash join operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
    LeftSemi,
    Anti,
}

/// Which phase of a multi-step aggregation this node computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregationStep {
    Partial,
    Intermediate,
    Final,
    Single,
}

/// On-disk format of the files behind a scan split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FileFormat {
    Parquet,
    Dwrf,
    #[default]
    Unknown,
}

impl FileFormat {
    /// Decode the integer format tag carried in file descriptors.
    pub fn from_format_tag(tag: i32) -> Self {
        match tag {
            1 => FileFormat::Parquet,
            2 | 3 => FileFormat::Dwrf,
            _ => FileFormat::Unknown,
        }
    }
}

/// Data-source description for one scan leaf: the file splits to read, or a
/// marker that the leaf forwards an upstream stream.
///
/// The three file vectors are parallel: `paths[i]` is read from byte offset
/// `starts[i]` for `lengths[i]` bytes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitInfo {
    /// The leaf forwards a pre-built input node instead of reading files.
    pub is_stream: bool,
    /// Partition index shared by the files of this split. When the source
    /// lists files with differing indices, the last one wins; callers are
    /// expected to group files by partition. Known limitation.
    pub partition_index: u64,
    pub paths: Vec<String>,
    pub starts: Vec<u64>,
    pub lengths: Vec<u64>,
    pub format: FileFormat,
}

/// Split descriptors for every data-source leaf, keyed by plan node id.
pub type SplitInfoMap = HashMap<PlanNodeId, SplitInfo>;

/// Which role a column plays in the scanned table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Regular,
    PartitionKey,
}

/// Connector column handle: the original schema name and type of a column a
/// scan output refers to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnHandle {
    pub name: String,
    pub column_type: ColumnType,
    pub data_type: TypeKind,
}

/// Connector table handle carrying the pushed-down filters.
#[derive(Debug, Clone, PartialEq)]
pub struct TableHandle {
    pub connector_id: String,
    pub table_name: String,
    pub filter_pushdown_enabled: bool,
    pub subfield_filters: SubfieldFilters,
    pub remaining_filter: Option<TypedExpr>,
}

/// Leaf node reading from a connector.
#[derive(Debug, Clone, PartialEq)]
pub struct TableScanNode {
    pub id: PlanNodeId,
    pub output_type: RowType,
    pub table_handle: TableHandle,
    /// Output name -> backing column, ordered for deterministic traversal.
    pub assignments: BTreeMap<String, ColumnHandle>,
}

/// Leaf node producing in-line constant batches.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuesNode {
    pub id: PlanNodeId,
    pub output_type: RowType,
    pub values: Vec<RowVector>,
}

/// Row filter evaluated above its source.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterNode {
    pub id: PlanNodeId,
    pub predicate: TypedExpr,
    pub source: Arc<PlanNode>,
}

/// Per-row projection with generated output names.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectNode {
    pub id: PlanNodeId,
    pub output_type: RowType,
    pub names: Vec<String>,
    pub expressions: Vec<TypedExpr>,
    pub source: Arc<PlanNode>,
}

impl ProjectNode {
    pub fn new(
        id: PlanNodeId,
        names: Vec<String>,
        expressions: Vec<TypedExpr>,
        source: Arc<PlanNode>,
    ) -> Self {
        let types = expressions.iter().map(|e| e.data_type()).collect();
        let output_type = RowType::new(names.clone(), types);
        ProjectNode {
            id,
            output_type,
            names,
            expressions,
            source,
        }
    }
}

/// Grouped aggregation. Output columns are the grouping keys followed by one
/// column per aggregate call, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationNode {
    pub id: PlanNodeId,
    pub step: AggregationStep,
    pub grouping_keys: Vec<FieldAccessExpr>,
    pub aggregate_names: Vec<String>,
    pub aggregates: Vec<CallExpr>,
    pub source: Arc<PlanNode>,
    pub output_type: RowType,
}

impl AggregationNode {
    pub fn new(
        id: PlanNodeId,
        step: AggregationStep,
        grouping_keys: Vec<FieldAccessExpr>,
        aggregate_names: Vec<String>,
        aggregates: Vec<CallExpr>,
        source: Arc<PlanNode>,
    ) -> Self {
        let mut names: Vec<String> = grouping_keys.iter().map(|k| k.name.clone()).collect();
        let mut types: Vec<TypeKind> = grouping_keys.iter().map(|k| k.field_type).collect();
        names.extend(aggregate_names.iter().cloned());
        types.extend(aggregates.iter().map(|a| a.return_type));
        let output_type = RowType::new(names, types);
        AggregationNode {
            id,
            step,
            grouping_keys,
            aggregate_names,
            aggregates,
            source,
            output_type,
        }
    }
}

/// Hash join over equality keys with an optional post-join filter.
/// Output schema is the left columns followed by the right columns.
#[derive(Debug, Clone, PartialEq)]
pub struct HashJoinNode {
    pub id: PlanNodeId,
    pub join_type: JoinType,
    pub left_keys: Vec<FieldAccessExpr>,
    pub right_keys: Vec<FieldAccessExpr>,
    pub filter: Option<TypedExpr>,
    pub left: Arc<PlanNode>,
    pub right: Arc<PlanNode>,
    pub output_type: RowType,
}

/// A node of the executable plan tree.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanNode {
    TableScan(TableScanNode),
    Values(ValuesNode),
    Filter(FilterNode),
    Project(ProjectNode),
    Aggregation(AggregationNode),
    HashJoin(HashJoinNode),
}

impl PlanNode {
    pub fn id(&self) -> &str {
        match self {
            PlanNode::TableScan(n) => &n.id,
            PlanNode::Values(n) => &n.id,
            PlanNode::Filter(n) => &n.id,
            PlanNode::Project(n) => &n.id,
            PlanNode::Aggregation(n) => &n.id,
            PlanNode::HashJoin(n) => &n.id,
        }
    }

    /// The output schema. Filters pass their source schema through.
    pub fn output_type(&self) -> &RowType {
        match self {
            PlanNode::TableScan(n) => &n.output_type,
            PlanNode::Values(n) => &n.output_type,
            PlanNode::Filter(n) => n.source.output_type(),
            PlanNode::Project(n) => &n.output_type,
            PlanNode::Aggregation(n) => &n.output_type,
            PlanNode::HashJoin(n) => &n.output_type,
        }
    }

    /// Child nodes, in input order.
    pub fn sources(&self) -> Vec<&PlanNode> {
        match self {
            PlanNode::TableScan(_) | PlanNode::Values(_) => vec![],
            PlanNode::Filter(n) => vec![&n.source],
            PlanNode::Project(n) => vec![&n.source],
            PlanNode::Aggregation(n) => vec![&n.source],
            PlanNode::HashJoin(n) => vec![&n.left, &n.right],
        }
    }
}
