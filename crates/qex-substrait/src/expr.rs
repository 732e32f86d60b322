//! # Expression Conversion
//!
//! Converts Substrait expression nodes into the engine's typed expression
//! tree, resolving field references against the input row type and function
//! anchors through the plan's function registry.
//!
//! The supported rex kinds are field selections, literals, and scalar
//! functions -- the shapes that appear in filter conditions, projections,
//! and join predicates. Anything else is rejected.

use crate::error::ConvertError;
use crate::extensions::FunctionRegistry;
use crate::parse;
use crate::proto;
use ordered_float::OrderedFloat;
use qex_core::expr::{CallExpr, FieldAccessExpr, ScalarValue, TypedExpr};
use qex_core::types::{RowType, TypeKind};
use std::sync::Arc;

/// Converts Substrait expressions to typed engine expressions.
#[derive(Debug, Default)]
pub struct ExprConverter {
    registry: Arc<FunctionRegistry>,
}

impl ExprConverter {
    pub fn new(registry: Arc<FunctionRegistry>) -> Self {
        ExprConverter { registry }
    }

    /// Convert an expression against the given input row type.
    pub fn to_typed_expr(
        &self,
        expr: &proto::Expression,
        input_type: &RowType,
    ) -> Result<TypedExpr, ConvertError> {
        use proto::expression::RexType;
        match &expr.rex_type {
            Some(RexType::Selection(field_reference)) => Ok(TypedExpr::FieldAccess(
                self.to_field_access(field_reference, input_type)?,
            )),
            Some(RexType::Literal(literal)) => {
                let (value_type, value) = self.to_scalar_value(literal)?;
                Ok(TypedExpr::Constant(qex_core::expr::ConstantExpr {
                    value_type,
                    value,
                }))
            }
            Some(RexType::ScalarFunction(function)) => {
                Ok(TypedExpr::Call(self.to_call(function, input_type)?))
            }
            None => Err(ConvertError::Unsupported(
                "expression without a rex type is not supported".into(),
            )),
        }
    }

    /// Resolve a field reference to a named column of the input row.
    pub fn to_field_access(
        &self,
        field_reference: &proto::expression::FieldReference,
        input_type: &RowType,
    ) -> Result<FieldAccessExpr, ConvertError> {
        let segment = field_reference.direct_reference().ok_or_else(|| {
            ConvertError::Unsupported("only direct field references are supported".into())
        })?;
        let idx = parse::parse_reference_segment(segment)? as usize;
        if idx >= input_type.size() {
            return Err(ConvertError::InvalidInput(format!(
                "field index {} out of range for row of {} columns",
                idx,
                input_type.size()
            )));
        }
        Ok(FieldAccessExpr {
            name: input_type.name_at(idx).to_string(),
            field_type: input_type.type_at(idx),
        })
    }

    /// Convert a scalar function application to a typed call.
    pub fn to_call(
        &self,
        function: &proto::expression::ScalarFunction,
        input_type: &RowType,
    ) -> Result<CallExpr, ConvertError> {
        let name = self
            .registry
            .engine_name(function.function_reference)?
            .to_string();
        let args = function
            .args
            .iter()
            .map(|arg| self.to_typed_expr(arg, input_type))
            .collect::<Result<Vec<_>, _>>()?;
        // Predicates routinely omit the output type; they are boolean.
        let return_type = match &function.output_type {
            Some(substrait_type) => parse::to_type_kind(substrait_type)?,
            None => TypeKind::Bool,
        };
        Ok(CallExpr {
            return_type,
            args,
            name,
        })
    }

    /// Convert a literal to its engine type and constant value.
    ///
    /// List and struct literals have no scalar value; they are only legal in
    /// the dedicated IN-list and virtual-table positions, which unpack them
    /// before calling here.
    pub fn to_scalar_value(
        &self,
        literal: &proto::expression::Literal,
    ) -> Result<(TypeKind, ScalarValue), ConvertError> {
        use proto::expression::literal::LiteralType;
        match &literal.literal_type {
            Some(LiteralType::Boolean(v)) => Ok((TypeKind::Bool, ScalarValue::Bool(*v))),
            Some(LiteralType::I32(v)) => Ok((TypeKind::Int32, ScalarValue::Int32(*v))),
            Some(LiteralType::I64(v)) => Ok((TypeKind::Int64, ScalarValue::Int64(*v))),
            Some(LiteralType::Fp64(v)) => {
                Ok((TypeKind::Double, ScalarValue::Double(OrderedFloat(*v))))
            }
            Some(LiteralType::String(v)) => Ok((TypeKind::Varchar, ScalarValue::Varchar(v.clone()))),
            Some(LiteralType::Date(v)) => Ok((TypeKind::Date, ScalarValue::Date(*v))),
            Some(LiteralType::Null(substrait_type)) => {
                Ok((parse::to_type_kind(substrait_type)?, ScalarValue::Null))
            }
            Some(LiteralType::List(_)) | Some(LiteralType::Struct(_)) => Err(
                ConvertError::Unsupported("complex literal has no scalar value".into()),
            ),
            None => Err(ConvertError::InvalidInput(
                "literal type is expected in Literal".into(),
            )),
        }
    }
}
