//! # Function Extension Registry
//!
//! Substrait plans reference functions by integer anchor; the plan's
//! extension list maps each anchor to a function spec string of the form
//! `name:type,type,…`. The registry is built once per plan and read-only
//! afterwards.
//!
//! Two name views exist for every anchor:
//!
//! - the *short name*, the spec prefix before `:`, used to classify filter
//!   predicates (`gte`, `equal`, `in`, `not`, `or`, …);
//! - the *engine name*, the short name mapped through the renaming table
//!   below, used when emitting typed calls (`equal` becomes `eq`, `add`
//!   becomes `plus`, …).

use crate::error::ConvertError;
use crate::proto;
use crate::proto::simple_extension_declaration::MappingType;
use std::collections::HashMap;

/// Renames applied when a Substrait function surfaces as an engine call.
/// Functions not listed keep their short name.
const ENGINE_NAMES: &[(&str, &str)] = &[
    ("add", "plus"),
    ("subtract", "minus"),
    ("modulus", "mod"),
    ("equal", "eq"),
    ("not_equal", "neq"),
];

/// Immutable anchor -> function-spec map for one plan.
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    map: HashMap<u32, String>,
}

impl FunctionRegistry {
    /// Collect every `extension_function` record of the plan.
    pub fn from_plan(plan: &proto::Plan) -> Self {
        let mut map = HashMap::new();
        for extension in &plan.extensions {
            let Some(MappingType::ExtensionFunction(function)) = &extension.mapping_type else {
                continue;
            };
            map.insert(function.function_anchor, function.name.clone());
        }
        FunctionRegistry { map }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The full `name:type,…` spec string registered for an anchor.
    pub fn function_spec(&self, anchor: u32) -> Result<&str, ConvertError> {
        self.map
            .get(&anchor)
            .map(String::as_str)
            .ok_or(ConvertError::UnknownFunction(anchor))
    }

    /// The short name registered for an anchor.
    pub fn short_name_of(&self, anchor: u32) -> Result<&str, ConvertError> {
        Ok(short_name(self.function_spec(anchor)?))
    }

    /// The engine-facing function name for an anchor.
    pub fn engine_name(&self, anchor: u32) -> Result<&str, ConvertError> {
        let short = self.short_name_of(anchor)?;
        Ok(ENGINE_NAMES
            .iter()
            .find(|(from, _)| *from == short)
            .map(|(_, to)| *to)
            .unwrap_or(short))
    }
}

/// The spec prefix before `:`; the whole spec when it carries no signature.
pub fn short_name(spec: &str) -> &str {
    spec.split(':').next().unwrap_or(spec)
}

/// The comma-separated signature types after `:`; empty when absent.
pub fn spec_types(spec: &str) -> Vec<&str> {
    match spec.split_once(':') {
        Some((_, types)) if !types.is_empty() => types.split(',').collect(),
        _ => Vec::new(),
    }
}
