//! Schema and reference parsing helpers.

use crate::error::ConvertError;
use crate::proto;
use qex_core::types::TypeKind;

/// Map a Substrait type to the engine type kind.
pub fn to_type_kind(substrait_type: &proto::Type) -> Result<TypeKind, ConvertError> {
    use proto::r#type::Kind;
    match &substrait_type.kind {
        Some(Kind::Bool(_)) => Ok(TypeKind::Bool),
        Some(Kind::I32(_)) => Ok(TypeKind::Int32),
        Some(Kind::I64(_)) => Ok(TypeKind::Int64),
        Some(Kind::Fp32(_)) => Ok(TypeKind::Float),
        Some(Kind::Fp64(_)) => Ok(TypeKind::Double),
        Some(Kind::String(_)) => Ok(TypeKind::Varchar),
        Some(Kind::Binary(_)) => Ok(TypeKind::Varbinary),
        Some(Kind::Date(_)) => Ok(TypeKind::Date),
        None => Err(ConvertError::InvalidInput(
            "type kind is expected in Type".into(),
        )),
    }
}

/// Parse a named struct schema into parallel name and type vectors.
pub fn parse_named_struct(
    named_struct: &proto::NamedStruct,
) -> Result<(Vec<String>, Vec<TypeKind>), ConvertError> {
    let names = named_struct.names.clone();
    let types = match &named_struct.r#struct {
        Some(type_struct) => type_struct
            .types
            .iter()
            .map(to_type_kind)
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };
    if names.len() != types.len() {
        return Err(ConvertError::InvalidInput(format!(
            "named struct has {} names but {} types",
            names.len(),
            types.len()
        )));
    }
    Ok((names, types))
}

/// Resolve a direct reference segment to a column index.
///
/// Only single struct-field segments are supported; nested subfield paths
/// are not addressable here.
pub fn parse_reference_segment(
    segment: &proto::expression::ReferenceSegment,
) -> Result<u32, ConvertError> {
    use proto::expression::reference_segment::ReferenceType;
    match &segment.reference_type {
        Some(ReferenceType::StructField(struct_field)) => {
            if struct_field.child.is_some() {
                return Err(ConvertError::Unsupported(
                    "nested reference segments are not supported".into(),
                ));
            }
            u32::try_from(struct_field.field).map_err(|_| {
                ConvertError::InvalidInput(format!(
                    "negative field index {} in reference segment",
                    struct_field.field
                ))
            })
        }
        None => Err(ConvertError::Unsupported(
            "reference segment without a struct field is not supported".into(),
        )),
    }
}

/// Generated output column name for column `col_idx` of node `node_id`.
pub fn make_node_name(node_id: u64, col_idx: usize) -> String {
    format!("n{}_{}", node_id, col_idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::expression::reference_segment::{ReferenceType, StructField};
    use crate::proto::expression::ReferenceSegment;

    #[test]
    fn test_make_node_name() {
        assert_eq!(make_node_name(0, 0), "n0_0");
        assert_eq!(make_node_name(12, 3), "n12_3");
    }

    #[test]
    fn test_parse_reference_segment() {
        let segment = ReferenceSegment {
            reference_type: Some(ReferenceType::StructField(StructField {
                field: 4,
                child: None,
            })),
        };
        assert_eq!(parse_reference_segment(&segment).unwrap(), 4);
    }

    #[test]
    fn test_nested_segment_is_rejected() {
        let segment = ReferenceSegment {
            reference_type: Some(ReferenceType::StructField(StructField {
                field: 0,
                child: Some(Box::new(ReferenceSegment {
                    reference_type: Some(ReferenceType::StructField(StructField {
                        field: 1,
                        child: None,
                    })),
                })),
            })),
        };
        assert!(matches!(
            parse_reference_segment(&segment),
            Err(ConvertError::Unsupported(_))
        ));
    }

    #[test]
    fn test_named_struct_length_mismatch() {
        let named_struct = proto::NamedStruct {
            names: vec!["a".into(), "b".into()],
            r#struct: Some(proto::r#type::Struct {
                types: vec![proto::Type {
                    kind: Some(proto::r#type::Kind::I64(proto::r#type::I64 {})),
                }],
            }),
        };
        assert!(parse_named_struct(&named_struct).is_err());
    }
}
