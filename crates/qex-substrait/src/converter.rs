//! # Plan Conversion
//!
//! Converts a Substrait `Plan` protobuf into the engine's executable plan
//! tree:
//!
//! ```text
//! Substrait Plan (protobuf)
//!   -> PlanConverter::to_plan()
//!   -> PlanNode tree + SplitInfoMap
//!   -> executor
//! ```
//!
//! ## Conversion Strategy
//!
//! The converter recursively walks the Substrait `Rel` tree and produces the
//! corresponding plan node, threading each child's output row type into its
//! parent's expression conversion:
//!
//! - **ReadRel** -> `TableScan` with pushed-down filters, or `Values` for a
//!   virtual table, or the pre-built input node for a stream sentinel.
//! - **FilterRel** -> `Filter` over the child's output type.
//! - **ProjectRel** -> `Project` with generated `n<id>_<col>` names.
//! - **AggregateRel** -> `Aggregation`; the phase comes from the first
//!   measure, field-reference grouping keys only.
//! - **JoinRel** -> `HashJoin`; output schema is left then right, equality
//!   keys extracted from an `and`/`eq` condition tree.
//!
//! Node ids are dense integers starting at zero, assigned children-first,
//! so leaf ids precede their parents'. Generated column names embed the id
//! of the node that introduces them.
//!
//! ## Data sources
//!
//! Every scan leaf registers a [`SplitInfo`] describing its file splits in
//! the converter's split map, which is handed to the executor alongside the
//! plan. A read whose first file URI carries the `iterator:<idx>` sentinel
//! does not scan at all: it forwards the pre-built plan node registered
//! under `idx`, marking its split entry as a stream.

use crate::error::ConvertError;
use crate::expr::ExprConverter;
use crate::extensions::FunctionRegistry;
use crate::parse::{make_node_name, parse_named_struct, to_type_kind};
use crate::proto;
use crate::pushdown;
use prost::Message;
use qex_core::expr::CallExpr;
use qex_core::memory::MemoryPool;
use qex_core::plan::*;
use qex_core::types::{RowType, TypeKind};
use qex_core::vector::{RowVector, VectorData};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

/// Connector id every produced scan is bound to.
const HIVE_CONNECTOR_ID: &str = "test-hive";
const HIVE_TABLE_NAME: &str = "hive_table";

/// URI sentinel marking a read as a stream input; the suffix is the index
/// into the input-nodes map.
const STREAM_INPUT_PREFIX: &str = "iterator:";

/// Converts one Substrait plan into an executable plan tree.
///
/// A converter owns its node-id counter and function map; reuse across
/// plans is possible because `to_plan` resets both.
pub struct PlanConverter {
    next_node_id: u64,
    registry: Arc<FunctionRegistry>,
    expr_converter: ExprConverter,
    split_info_map: SplitInfoMap,
    input_nodes: HashMap<usize, Arc<PlanNode>>,
    pool: Arc<MemoryPool>,
}

impl PlanConverter {
    pub fn new(pool: Arc<MemoryPool>) -> Self {
        PlanConverter::with_input_nodes(pool, HashMap::new())
    }

    /// Create a converter that resolves `iterator:<idx>` reads against
    /// pre-built upstream nodes.
    pub fn with_input_nodes(
        pool: Arc<MemoryPool>,
        input_nodes: HashMap<usize, Arc<PlanNode>>,
    ) -> Self {
        PlanConverter {
            next_node_id: 0,
            registry: Arc::new(FunctionRegistry::default()),
            expr_converter: ExprConverter::default(),
            split_info_map: SplitInfoMap::new(),
            input_nodes,
            pool,
        }
    }

    /// Split descriptors collected for the most recently converted plan.
    pub fn split_info_map(&self) -> &SplitInfoMap {
        &self.split_info_map
    }

    /// Hand the split descriptors over to the executor.
    pub fn take_split_info_map(&mut self) -> SplitInfoMap {
        std::mem::take(&mut self.split_info_map)
    }

    /// Convert a plan, producing the root node of the plan tree.
    pub fn to_plan(&mut self, plan: &proto::Plan) -> Result<Arc<PlanNode>, ConvertError> {
        self.construct_function_map(plan);
        self.next_node_id = 0;
        self.split_info_map.clear();

        // Only one RelRoot or Rel is expected.
        for plan_rel in &plan.relations {
            match &plan_rel.rel_type {
                Some(proto::plan_rel::RelType::Root(root)) => {
                    let input = root
                        .input
                        .as_ref()
                        .ok_or(ConvertError::MissingInput("RelRoot"))?;
                    return self.convert_rel(input);
                }
                Some(proto::plan_rel::RelType::Rel(rel)) => return self.convert_rel(rel),
                None => continue,
            }
        }
        Err(ConvertError::EmptyPlan)
    }

    /// Decode a serialized plan and convert it.
    pub fn to_plan_from_bytes(&mut self, bytes: &[u8]) -> Result<Arc<PlanNode>, ConvertError> {
        let plan = proto::Plan::decode(bytes)?;
        self.to_plan(&plan)
    }

    fn construct_function_map(&mut self, plan: &proto::Plan) {
        let registry = Arc::new(FunctionRegistry::from_plan(plan));
        debug!(functions = registry.len(), "constructed function map");
        self.expr_converter = ExprConverter::new(registry.clone());
        self.registry = registry;
    }

    fn next_plan_node_id(&mut self) -> PlanNodeId {
        let id = self.next_node_id.to_string();
        self.next_node_id += 1;
        id
    }

    fn convert_rel(&mut self, rel: &proto::Rel) -> Result<Arc<PlanNode>, ConvertError> {
        use proto::rel::RelType;
        match &rel.rel_type {
            Some(RelType::Read(read)) => self.convert_read(read),
            Some(RelType::Filter(filter)) => self.convert_filter(filter),
            Some(RelType::Project(project)) => self.convert_project(project),
            Some(RelType::Aggregate(aggregate)) => self.convert_aggregate(aggregate),
            Some(RelType::Join(join)) => self.convert_join(join),
            None => Err(ConvertError::Unsupported(
                "conversion is not supported for this Rel".into(),
            )),
        }
    }

    /// Index of the pre-built input node a stream read refers to, or `None`
    /// for an ordinary read.
    fn stream_index(&self, read: &proto::ReadRel) -> Result<Option<usize>, ConvertError> {
        let Some(proto::read_rel::ReadType::LocalFiles(files)) = &read.read_type else {
            return Ok(None);
        };
        if files.items.is_empty() {
            return Err(ConvertError::InvalidInput(
                "at least one file path is expected in LocalFiles".into(),
            ));
        }
        let file_path = &files.items[0].uri_file;
        let Some(pos) = file_path.find(STREAM_INPUT_PREFIX) else {
            return Ok(None);
        };
        let idx = &file_path[pos + STREAM_INPUT_PREFIX.len()..];
        idx.parse::<usize>().map(Some).map_err(|err| {
            ConvertError::Parse(format!("invalid stream input index '{}': {}", idx, err))
        })
    }

    fn convert_read(&mut self, read: &proto::ReadRel) -> Result<Arc<PlanNode>, ConvertError> {
        let mut split_info = SplitInfo::default();

        // A stream read forwards the pre-built node instead of scanning.
        if let Some(stream_idx) = self.stream_index(read)? {
            let node = self.input_nodes.get(&stream_idx).cloned().ok_or_else(|| {
                ConvertError::InvalidInput(format!(
                    "could not find source index {} in input nodes map",
                    stream_idx
                ))
            })?;
            split_info.is_stream = true;
            self.split_info_map.insert(node.id().to_string(), split_info);
            return Ok(node);
        }

        let base_schema = read.base_schema.as_ref().ok_or_else(|| {
            ConvertError::InvalidInput("base schema is expected in ReadRel".into())
        })?;
        let (col_names, col_types) = parse_named_struct(base_schema)?;

        if matches!(
            &read.read_type,
            Some(proto::read_rel::ReadType::VirtualTable(_))
        ) {
            let output_type = self.scan_output_type(&col_names, &col_types);
            return self.convert_virtual_table(read, &output_type);
        }

        let Some(proto::read_rel::ReadType::LocalFiles(files)) = &read.read_type else {
            return Err(ConvertError::InvalidInput(
                "local files or virtual table is expected in ReadRel".into(),
            ));
        };
        split_info.paths.reserve(files.items.len());
        split_info.starts.reserve(files.items.len());
        split_info.lengths.reserve(files.items.len());
        for file in &files.items {
            // All files of one split are expected to share a partition index.
            split_info.partition_index = file.partition_index;
            split_info.paths.push(file.uri_file.clone());
            split_info.starts.push(file.start);
            split_info.lengths.push(file.length);
            split_info.format = FileFormat::from_format_tag(file.format);
        }

        let table_handle = match &read.filter {
            None => TableHandle {
                connector_id: HIVE_CONNECTOR_ID.into(),
                table_name: HIVE_TABLE_NAME.into(),
                filter_pushdown_enabled: true,
                subfield_filters: Default::default(),
                remaining_filter: None,
            },
            Some(condition) => {
                let mut scalar_functions = Vec::new();
                pushdown::flatten_conditions(condition, &self.registry, &mut scalar_functions)?;

                let (subfield_functions, remaining_functions) =
                    pushdown::separate_filters(&scalar_functions, &self.registry)?;
                let mut subfield_filters = pushdown::to_subfield_filters(
                    &col_names,
                    &col_types,
                    &subfield_functions,
                    &self.registry,
                    &self.expr_converter,
                )?;

                let remaining_filter = if !pushdown::is_pushdown_supported_by_format(
                    split_info.format,
                    &subfield_filters,
                ) {
                    // One unsupported filter kind rejects the whole set: the
                    // residual is rebuilt from every original conjunct.
                    debug!(
                        format = ?split_info.format,
                        "file format cannot evaluate pushed filters; demoting all conjuncts"
                    );
                    subfield_filters.clear();
                    pushdown::connect_with_and(
                        &col_names,
                        &col_types,
                        &scalar_functions,
                        &self.expr_converter,
                    )?
                } else {
                    pushdown::connect_with_and(
                        &col_names,
                        &col_types,
                        &remaining_functions,
                        &self.expr_converter,
                    )?
                };

                TableHandle {
                    connector_id: HIVE_CONNECTOR_ID.into(),
                    table_name: HIVE_TABLE_NAME.into(),
                    filter_pushdown_enabled: true,
                    subfield_filters,
                    remaining_filter,
                }
            }
        };

        // Output names embed the id this scan node is about to take.
        let node_id = self.next_node_id;
        let mut out_names = Vec::with_capacity(col_names.len());
        let mut assignments = BTreeMap::new();
        for (idx, col_name) in col_names.iter().enumerate() {
            let out_name = make_node_name(node_id, idx);
            assignments.insert(
                out_name.clone(),
                ColumnHandle {
                    name: col_name.clone(),
                    column_type: ColumnType::Regular,
                    data_type: col_types[idx],
                },
            );
            out_names.push(out_name);
        }
        let output_type = RowType::new(out_names, col_types);

        let id = self.next_plan_node_id();
        self.split_info_map.insert(id.clone(), split_info);
        Ok(Arc::new(PlanNode::TableScan(TableScanNode {
            id,
            output_type,
            table_handle,
            assignments,
        })))
    }

    fn scan_output_type(&self, col_names: &[String], col_types: &[TypeKind]) -> RowType {
        let node_id = self.next_node_id;
        let names = (0..col_names.len())
            .map(|idx| make_node_name(node_id, idx))
            .collect();
        RowType::new(names, col_types.to_vec())
    }

    /// Materialize a virtual table's literal batches into a Values node.
    ///
    /// Each value struct holds one batch laid out column-major; the batch
    /// width is inferred from the final struct's field count.
    fn convert_virtual_table(
        &mut self,
        read: &proto::ReadRel,
        output_type: &RowType,
    ) -> Result<Arc<PlanNode>, ConvertError> {
        let Some(proto::read_rel::ReadType::VirtualTable(virtual_table)) = &read.read_type else {
            return Err(ConvertError::InvalidInput(
                "virtual table is expected in ReadRel".into(),
            ));
        };
        let num_columns = output_type.size();
        if num_columns == 0 {
            return Err(ConvertError::InvalidInput(
                "virtual table requires a non-empty schema".into(),
            ));
        }
        let Some(last_row) = virtual_table.values.last() else {
            return Err(ConvertError::InvalidInput(
                "values are expected in virtual table".into(),
            ));
        };
        let batch_size = last_row.fields.len() / num_columns;

        let mut vectors = Vec::with_capacity(virtual_table.values.len());
        for row_value in &virtual_table.values {
            if row_value.fields.len() != batch_size * num_columns {
                return Err(ConvertError::InvalidInput(format!(
                    "virtual table row has {} fields, expected {}",
                    row_value.fields.len(),
                    batch_size * num_columns
                )));
            }
            let mut children = Vec::with_capacity(num_columns);
            for col in 0..num_columns {
                let mut batch = Vec::with_capacity(batch_size);
                for batch_idx in 0..batch_size {
                    let literal = &row_value.fields[col * batch_size + batch_idx];
                    batch.push(self.expr_converter.to_scalar_value(literal)?.1);
                }
                children.push(VectorData::from_scalars(
                    output_type.type_at(col),
                    &batch,
                    &self.pool,
                )?);
            }
            vectors.push(RowVector::new(output_type.clone(), batch_size, children));
        }

        let id = self.next_plan_node_id();
        Ok(Arc::new(PlanNode::Values(ValuesNode {
            id,
            output_type: output_type.clone(),
            values: vectors,
        })))
    }

    fn convert_filter(&mut self, filter: &proto::FilterRel) -> Result<Arc<PlanNode>, ConvertError> {
        let input = filter
            .input
            .as_deref()
            .ok_or(ConvertError::MissingInput("FilterRel"))?;
        let child = self.convert_rel(input)?;

        let condition = filter.condition.as_ref().ok_or_else(|| {
            ConvertError::InvalidInput("condition is expected in FilterRel".into())
        })?;
        let predicate = self
            .expr_converter
            .to_typed_expr(condition, child.output_type())?;

        let id = self.next_plan_node_id();
        Ok(Arc::new(PlanNode::Filter(FilterNode {
            id,
            predicate,
            source: child,
        })))
    }

    fn convert_project(
        &mut self,
        project: &proto::ProjectRel,
    ) -> Result<Arc<PlanNode>, ConvertError> {
        let input = project
            .input
            .as_deref()
            .ok_or(ConvertError::MissingInput("ProjectRel"))?;
        let child = self.convert_rel(input)?;
        let input_type = child.output_type().clone();

        let node_id = self.next_node_id;
        let mut names = Vec::with_capacity(project.expressions.len());
        let mut expressions = Vec::with_capacity(project.expressions.len());
        for (col_idx, expression) in project.expressions.iter().enumerate() {
            expressions.push(self.expr_converter.to_typed_expr(expression, &input_type)?);
            names.push(make_node_name(node_id, col_idx));
        }

        let id = self.next_plan_node_id();
        Ok(Arc::new(PlanNode::Project(ProjectNode::new(
            id,
            names,
            expressions,
            child,
        ))))
    }

    fn convert_aggregate(
        &mut self,
        aggregate: &proto::AggregateRel,
    ) -> Result<Arc<PlanNode>, ConvertError> {
        let input = aggregate
            .input
            .as_deref()
            .ok_or(ConvertError::MissingInput("AggregateRel"))?;
        let child = self.convert_rel(input)?;
        let step = aggregation_step(aggregate)?;
        let input_type = child.output_type().clone();

        // Grouping keys are limited to plain field references.
        let mut grouping_keys = Vec::new();
        for grouping in &aggregate.groupings {
            for grouping_expr in &grouping.grouping_expressions {
                let field_reference = grouping_expr.selection().ok_or_else(|| {
                    ConvertError::Unsupported(
                        "grouping expressions are limited to field references".into(),
                    )
                })?;
                grouping_keys.push(
                    self.expr_converter
                        .to_field_access(field_reference, &input_type)?,
                );
            }
        }
        let grouping_out_count = grouping_keys.len();

        // Each measure becomes one aggregate call.
        let mut aggregates = Vec::with_capacity(aggregate.measures.len());
        for measure in &aggregate.measures {
            let function = measure.measure.as_ref().ok_or_else(|| {
                ConvertError::InvalidInput("aggregate function is expected in Measure".into())
            })?;
            let name = self
                .registry
                .engine_name(function.function_reference)?
                .to_string();
            let args = function
                .args
                .iter()
                .map(|arg| self.expr_converter.to_typed_expr(arg, &input_type))
                .collect::<Result<Vec<_>, _>>()?;
            let output_type = function.output_type.as_ref().ok_or_else(|| {
                ConvertError::InvalidInput("output type is expected for aggregate function".into())
            })?;
            aggregates.push(CallExpr {
                return_type: to_type_kind(output_type)?,
                args,
                name,
            });
        }

        let node_id = self.next_node_id;
        let aggregate_names = (grouping_out_count..grouping_out_count + aggregates.len())
            .map(|col_idx| make_node_name(node_id, col_idx))
            .collect();

        let id = self.next_plan_node_id();
        Ok(Arc::new(PlanNode::Aggregation(AggregationNode::new(
            id,
            step,
            grouping_keys,
            aggregate_names,
            aggregates,
            child,
        ))))
    }

    fn convert_join(&mut self, join: &proto::JoinRel) -> Result<Arc<PlanNode>, ConvertError> {
        let left_rel = join
            .left
            .as_deref()
            .ok_or(ConvertError::MissingInput("JoinRel"))?;
        let right_rel = join
            .right
            .as_deref()
            .ok_or(ConvertError::MissingInput("JoinRel"))?;
        let left = self.convert_rel(left_rel)?;
        let right = self.convert_rel(right_rel)?;

        let output_type = left.output_type().concat(right.output_type());

        let join_expression = join.expression.as_ref().ok_or_else(|| {
            ConvertError::InvalidInput("join expression is expected in JoinRel".into())
        })?;
        let (left_refs, right_refs) = self.extract_join_keys(join_expression)?;
        let left_keys = left_refs
            .iter()
            .map(|field| self.expr_converter.to_field_access(field, &output_type))
            .collect::<Result<Vec<_>, _>>()?;
        let right_keys = right_refs
            .iter()
            .map(|field| self.expr_converter.to_field_access(field, &output_type))
            .collect::<Result<Vec<_>, _>>()?;

        let filter = join
            .post_join_filter
            .as_ref()
            .map(|f| self.expr_converter.to_typed_expr(f, &output_type))
            .transpose()?;

        use proto::join_rel::JoinType as SubstraitJoinType;
        let join_type = match SubstraitJoinType::try_from(join.r#type) {
            Ok(SubstraitJoinType::Inner) => JoinType::Inner,
            Ok(SubstraitJoinType::Outer) => JoinType::Full,
            Ok(SubstraitJoinType::Left) => JoinType::Left,
            Ok(SubstraitJoinType::Right) => JoinType::Right,
            // Left-semi only; right-semi and null-aware variants are absent.
            Ok(SubstraitJoinType::Semi) => JoinType::LeftSemi,
            Ok(SubstraitJoinType::Anti) => JoinType::Anti,
            _ => {
                return Err(ConvertError::Unsupported(format!(
                    "join type {} is not supported",
                    join.r#type
                )));
            }
        };

        let id = self.next_plan_node_id();
        Ok(Arc::new(PlanNode::HashJoin(HashJoinNode {
            id,
            join_type,
            left_keys,
            right_keys,
            filter,
            left,
            right,
            output_type,
        })))
    }

    /// Walk the join condition with an explicit stack, collecting the two
    /// sides of every equality. Only `and` and `eq` are legal.
    fn extract_join_keys<'a>(
        &self,
        join_expression: &'a proto::Expression,
    ) -> Result<
        (
            Vec<&'a proto::expression::FieldReference>,
            Vec<&'a proto::expression::FieldReference>,
        ),
        ConvertError,
    > {
        let mut left_refs = Vec::new();
        let mut right_refs = Vec::new();
        let mut expressions = vec![join_expression];
        while let Some(visited) = expressions.pop() {
            let Some(function) = visited.scalar_function() else {
                return Err(ConvertError::InvalidInput(
                    "unable to parse join expression: scalar function is expected".into(),
                ));
            };
            let function_name = self.registry.engine_name(function.function_reference)?;
            match function_name {
                "and" => {
                    if function.args.len() != 2 {
                        return Err(ConvertError::InvalidInput(
                            "two args are expected for AND in join expression".into(),
                        ));
                    }
                    expressions.push(&function.args[0]);
                    expressions.push(&function.args[1]);
                }
                "eq" => {
                    if function.args.len() != 2 {
                        return Err(ConvertError::InvalidInput(
                            "two args are expected for join equality".into(),
                        ));
                    }
                    let (Some(left_field), Some(right_field)) =
                        (function.args[0].selection(), function.args[1].selection())
                    else {
                        return Err(ConvertError::InvalidInput(
                            "field references are expected in join equality".into(),
                        ));
                    };
                    left_refs.push(left_field);
                    right_refs.push(right_field);
                }
                other => {
                    return Err(ConvertError::Unsupported(format!(
                        "join condition {} is not supported",
                        other
                    )));
                }
            }
        }
        Ok((left_refs, right_refs))
    }
}

/// Aggregation phase of the node, derived from the first measure. With no
/// measures the node runs as a single-step aggregation.
fn aggregation_step(aggregate: &proto::AggregateRel) -> Result<AggregationStep, ConvertError> {
    let Some(first) = aggregate.measures.first() else {
        return Ok(AggregationStep::Single);
    };
    let function = first.measure.as_ref().ok_or_else(|| {
        ConvertError::InvalidInput("aggregate function is expected in Measure".into())
    })?;
    match proto::AggregationPhase::try_from(function.phase) {
        Ok(proto::AggregationPhase::InitialToIntermediate) => Ok(AggregationStep::Partial),
        Ok(proto::AggregationPhase::IntermediateToIntermediate) => {
            Ok(AggregationStep::Intermediate)
        }
        Ok(proto::AggregationPhase::IntermediateToResult) => Ok(AggregationStep::Final),
        Ok(proto::AggregationPhase::InitialToResult) => Ok(AggregationStep::Single),
        _ => Err(ConvertError::Unsupported(
            "aggregate phase is not supported".into(),
        )),
    }
}
