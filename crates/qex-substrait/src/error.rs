//! Conversion errors.
//!
//! All failures abort the current conversion; there is no partial-result
//! recovery. Conversion is deterministic, so retrying an identical input
//! yields the identical failure.

use thiserror::Error;

/// Errors that can occur while converting a Substrait plan.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The plan contains no relation tree.
    #[error("RelRoot or Rel is expected in Plan")]
    EmptyPlan,
    /// A relation node is missing a required input relation.
    #[error("child Rel is expected in {0}")]
    MissingInput(&'static str),
    /// Malformed input: a required field is absent or has the wrong shape.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The input is well-formed but uses a construct the converter does not
    /// translate.
    #[error("unsupported: {0}")]
    Unsupported(String),
    /// A sentinel value failed to parse.
    #[error("parse error: {0}")]
    Parse(String),
    /// A function anchor is not registered in the plan's extensions.
    #[error("could not find function anchor {0} in function map")]
    UnknownFunction(u32),
    /// The plan bytes could not be decoded as a protobuf message.
    #[error("failed to decode plan: {0}")]
    Decode(#[from] prost::DecodeError),
    /// Constant vector materialization failed.
    #[error(transparent)]
    Vector(#[from] qex_core::vector::VectorError),
}
