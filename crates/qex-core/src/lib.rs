//! # qex-core: Engine-Facing Plan Model
//!
//! This crate defines the data model the qex columnar execution engine
//! consumes: plan nodes, typed expressions, scan filters, and the small
//! amount of vector and memory plumbing needed to materialize constant data.
//! It has no knowledge of any serialized plan format; the `qex-substrait`
//! crate produces these types from Substrait plans.
//!
//! ## Module Overview
//!
//! - **`types`**: Scalar type kinds and the `RowType` schema type.
//! - **`expr`**: `ScalarValue` constants and the typed expression tree
//!   (field access, constant, call) used in predicates and projections.
//! - **`filter`**: The typed scan-filter hierarchy (ranges, value sets,
//!   multi-ranges, null tests) evaluated inside the scan.
//! - **`plan`**: Plan nodes (TableScan, Values, Filter, Project,
//!   Aggregation, HashJoin), connector handles, and split descriptors.
//! - **`vector`**: Flat column vectors for Values-node batches.
//! - **`memory`**: The memory-pool accounting handle.

pub mod expr;
pub mod filter;
pub mod memory;
pub mod plan;
pub mod types;
pub mod vector;
