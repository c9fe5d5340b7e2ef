//! Result record synthesis for `auto` methods

use std::collections::HashSet;

use sqlweave_ast::{QueryField, QueryTable, ResultField, ResultShape, Span};
use sqlweave_schema::SchemaCache;
use tracing::debug;

use crate::BuildError;

/// Database type reported for `COUNT(...)` fields
pub const AGGREGATE_DB_TYPE: &str = "BIGINT";

/// Build the result record for resolved `fields`, in declaration order.
///
/// Every field's table is looked up through `schema`; wildcards expand to
/// all columns of their table in metadata order. Fields and tables given by
/// placeholders or literals have no metadata and are rejected.
pub fn derive_result_shape(
    name: &str,
    fields: &[QueryField],
    tables: &[QueryTable],
    schema: &SchemaCache,
) -> Result<ResultShape, BuildError> {
    let mut result = Vec::with_capacity(fields.len());
    let mut seen: HashSet<String> = HashSet::new();

    let mut push = |field: ResultField, span: Span| -> Result<(), BuildError> {
        if !seen.insert(field.name.clone()) {
            return Err(BuildError::DuplicateResultField {
                name: field.name,
                span,
            });
        }
        result.push(field);
        Ok(())
    };

    for field in fields {
        if field.is_aggregate {
            push(
                ResultField {
                    name: field.output_name().to_string(),
                    db_type: AGGREGATE_DB_TYPE.to_string(),
                    comment: String::new(),
                    source: field.name.clone(),
                },
                field.span,
            )?;
            continue;
        }

        if field.is_opaque {
            return Err(BuildError::OpaqueField {
                name: field.name.clone(),
                span: field.span,
            });
        }

        let table = field.table.as_deref().unwrap_or_default();
        if tables.iter().any(|t| t.is_opaque && t.name == table) {
            return Err(BuildError::OpaqueTable {
                table: table.to_string(),
                span: field.span,
            });
        }
        let meta = schema
            .describe_table(table)
            .map_err(|source| BuildError::Schema {
                table: table.to_string(),
                source,
                span: field.span,
            })?;

        if field.is_wildcard() {
            for column in &meta.columns {
                push(
                    ResultField {
                        name: column.name.clone(),
                        db_type: column.db_type.clone(),
                        comment: column.comment.clone(),
                        source: format!("{}.{}", meta.name, column.name),
                    },
                    field.span,
                )?;
            }
            continue;
        }

        let column = meta.column(&field.name).ok_or_else(|| BuildError::MissingColumn {
            table: table.to_string(),
            column: field.name.clone(),
            span: field.span,
        })?;
        push(
            ResultField {
                name: field.output_name().to_string(),
                db_type: column.db_type.clone(),
                comment: column.comment.clone(),
                source: format!("{}.{}", meta.name, column.name),
            },
            field.span,
        )?;
    }

    debug!(shape = name, fields = result.len(), "derived result shape");
    Ok(ResultShape {
        name: name.to_string(),
        fields: result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlweave_schema::{ColumnMeta, MemorySchema, SchemaError, TableMeta};

    fn schema() -> SchemaCache {
        SchemaCache::new(
            MemorySchema::new().with_table(
                TableMeta::new("user")
                    .with_column(ColumnMeta::new("id", "BIGINT").primary_key())
                    .with_column(ColumnMeta::new("name", "VARCHAR").with_comment("display name")),
            ),
        )
    }

    fn field(table: &str, name: &str) -> QueryField {
        let mut field = QueryField::new(name, Span::dummy());
        field.table = Some(table.to_string());
        field
    }

    #[test]
    fn test_fields_follow_declaration_order() {
        let mut name = field("user", "name");
        name.alias = Some("uname".to_string());
        let shape = derive_result_shape("User", &[name, field("user", "id")], &[], &schema()).unwrap();

        assert_eq!(shape.name, "User");
        let names: Vec<_> = shape.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["uname", "id"]);
        assert_eq!(shape.fields[0].db_type, "VARCHAR");
        assert_eq!(shape.fields[0].comment, "display name");
        assert_eq!(shape.fields[0].source, "user.name");
    }

    #[test]
    fn test_wildcard_and_aggregate() {
        let mut count = QueryField::new("count", Span::dummy());
        count.is_aggregate = true;
        count.alias = Some("total".to_string());
        let shape = derive_result_shape("Row", &[field("user", "*"), count], &[], &schema()).unwrap();

        let names: Vec<_> = shape.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "total"]);
        assert_eq!(shape.fields[2].db_type, AGGREGATE_DB_TYPE);
    }

    #[test]
    fn test_missing_column_names_table_and_column() {
        let err = derive_result_shape("User", &[field("user", "email")], &[], &schema()).unwrap_err();
        match err {
            BuildError::MissingColumn { table, column, .. } => {
                assert_eq!(table, "user");
                assert_eq!(column, "email");
            }
            other => panic!("expected missing column, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_table_is_propagated() {
        let err = derive_result_shape("X", &[field("orders", "id")], &[], &schema()).unwrap_err();
        assert!(matches!(
            err,
            BuildError::Schema { source: SchemaError::TableNotFound(_), .. }
        ));
    }

    #[test]
    fn test_opaque_field_has_no_type() {
        let err = derive_result_shape("User", &[QueryField::opaque("#{cols}", Span::dummy())], &[], &schema())
            .unwrap_err();
        assert!(matches!(err, BuildError::OpaqueField { ref name, .. } if name == "#{cols}"));
    }

    #[test]
    fn test_opaque_table_has_no_metadata() {
        let table = QueryTable {
            name: "#{table}".to_string(),
            alias: None,
            is_opaque: true,
            span: Span::dummy(),
        };
        let err = derive_result_shape("User", &[field("#{table}", "id")], &[table], &schema()).unwrap_err();
        assert!(matches!(err, BuildError::OpaqueTable { ref table, .. } if table == "#{table}"));
    }

    #[test]
    fn test_duplicate_output_name() {
        let err = derive_result_shape("User", &[field("user", "id"), field("user", "*")], &[], &schema())
            .unwrap_err();
        assert!(matches!(err, BuildError::DuplicateResultField { ref name, .. } if name == "id"));
    }
}
