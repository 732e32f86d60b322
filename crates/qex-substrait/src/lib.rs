//! # Substrait Consumer for the qex Engine
//!
//! This crate converts [Substrait](https://substrait.io/) serialized query
//! plans into the executable plan trees defined by `qex-core`. Substrait is
//! the engine-neutral interchange format: a coordinator in another language
//! serializes its relational plan as a Substrait protobuf, and this crate
//! turns it into scan, filter, project, aggregation, and join nodes the
//! engine's executor can run.
//!
//! The hard part of consumption is the scan predicate: a Read's filter is
//! decomposed into per-column typed filters evaluated inside the scan and a
//! residual boolean expression evaluated above it, subject to what the
//! file format's reader can actually push down. See the `pushdown` module.
//!
//! ## Module Overview
//!
//! - **`proto`**: Prost-derived messages for the consumed Substrait subset.
//! - **`extensions`**: The anchor -> function-spec registry built from the
//!   plan's extension declarations.
//! - **`parse`**: Schema, type, and field-reference parsing helpers.
//! - **`expr`**: Substrait expression -> typed engine expression conversion.
//! - **`pushdown`**: Filter flattening, pushdown classification, typed
//!   filter synthesis, and the format capability gate.
//! - **`converter`**: The recursive Rel converter producing the plan tree
//!   and the split-info map.
//! - **`error`**: The conversion error type.

pub mod converter;
pub mod error;
pub mod expr;
pub mod extensions;
pub mod parse;
pub mod proto;
pub mod pushdown;

pub use converter::PlanConverter;
pub use error::ConvertError;
