//! Per-compilation state and the method builder

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sqlweave_ast::{Method, MethodBody, QueryShape, Span};
use sqlweave_lexer::Lexicon;
use sqlweave_parser::{
    analyze_query, find_directive, parse_segments, resolve_placeholders, Markers, ParseError,
};
use sqlweave_schema::SchemaCache;
use tracing::{debug, info};

use crate::{
    classify, decode_options, derive_result_shape, leading_keyword, split_methods, BuildError,
    CompileError, MethodSource,
};

/// Compiler settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    /// Written in place of `${name}`
    pub bind_marker: String,
    /// Written in place of `#{name}`
    pub substitute_marker: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        let markers = Markers::default();
        Self {
            bind_marker: markers.bind,
            substitute_marker: markers.substitute,
        }
    }
}

impl CompilerConfig {
    pub fn with_bind_marker(mut self, marker: impl Into<String>) -> Self {
        self.bind_marker = marker.into();
        self
    }

    pub fn with_substitute_marker(mut self, marker: impl Into<String>) -> Self {
        self.substitute_marker = marker.into();
        self
    }

    pub fn markers(&self) -> Markers {
        Markers {
            bind: self.bind_marker.clone(),
            substitute: self.substitute_marker.clone(),
        }
    }
}

/// All methods of one template file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledFile {
    pub path: PathBuf,
    pub methods: Vec<Method>,
}

/// State owned by one compilation.
///
/// Holds the keyword table and the registry of method names seen in the
/// current file. A context is not shared between threads; workers each
/// build their own and share only the [`SchemaCache`].
pub struct CompilerContext {
    config: CompilerConfig,
    markers: Markers,
    lexicon: Lexicon,
    registry: HashMap<String, Span>,
    schema: Option<SchemaCache>,
}

impl CompilerContext {
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            markers: config.markers(),
            config,
            lexicon: Lexicon::sql(),
            registry: HashMap::new(),
            schema: None,
        }
    }

    /// Use `schema` to derive result shapes of `auto` methods
    pub fn with_schema(mut self, schema: SchemaCache) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Compile every method of a template file.
    ///
    /// The first error aborts the file; no methods are returned with it.
    pub fn compile_file(
        &mut self,
        path: impl AsRef<Path>,
        source: &str,
    ) -> Result<CompiledFile, CompileError> {
        let path = path.as_ref();
        self.registry.clear();

        let methods = self
            .compile_source(source)
            .map_err(|err| CompileError::new(path, source, err))?;

        info!(path = %path.display(), methods = methods.len(), "compiled template file");
        Ok(CompiledFile {
            path: path.to_path_buf(),
            methods,
        })
    }

    fn compile_source(&mut self, source: &str) -> Result<Vec<Method>, BuildError> {
        split_methods(source)?
            .iter()
            .map(|method| self.compile_method(method))
            .collect()
    }

    /// Compile one method block. Spans in the result and in errors are
    /// relative to the file the block was split from.
    pub fn compile_method(&mut self, source: &MethodSource) -> Result<Method, BuildError> {
        let base = source.body_offset;
        let shift = |err: ParseError| BuildError::Parse(err.shifted(base));

        let options = decode_options(&source.options)?;

        let qualified = match &source.owner {
            Some(owner) => format!("{}.{}", owner, source.name),
            None => source.name.clone(),
        };
        if let Some(first) = self.registry.get(&qualified) {
            return Err(BuildError::DuplicateMethod {
                name: qualified,
                first: *first,
                span: source.name_span,
            });
        }
        self.registry.insert(qualified.clone(), source.name_span);

        let text = source.body.as_str();
        if text.trim().is_empty() {
            return Err(BuildError::EmptyBody {
                name: qualified,
                span: source.header_span,
            });
        }

        let (keyword, keyword_span) = leading_keyword(text, &self.lexicon).map_err(shift)?;
        let (kind, returns) = classify(keyword, &options, keyword_span.shift(base))?;

        let body = if options.dynamic {
            MethodBody::Dynamic(parse_segments(text, &self.markers).map_err(shift)?)
        } else {
            if let Some(at) = find_directive(text) {
                return Err(shift(ParseError::DirectiveNotAllowed {
                    span: Span::new(at, at + 2),
                }));
            }
            let statement = resolve_placeholders(text, &self.markers)
                .map_err(|err| shift(ParseError::from(err)))?;
            MethodBody::Static(statement)
        };

        let mut shape = QueryShape::default();
        if !kind.is_mutation() {
            shape = analyze_query(text, &self.lexicon).map_err(shift)?;
            for field in &mut shape.fields {
                field.span = field.span.shift(base);
            }
            for table in &mut shape.tables {
                table.span = table.span.shift(base);
            }
        }

        let result_shape = if options.auto {
            let Some(schema) = &self.schema else {
                return Err(BuildError::NoSchema {
                    span: options.span_of("auto").unwrap_or(source.header_span),
                });
            };
            Some(derive_result_shape(
                &returns.kind.to_string(),
                &shape.fields,
                &shape.tables,
                schema,
            )?)
        } else {
            None
        };

        debug!(
            method = %qualified,
            kind = ?kind,
            fields = shape.fields.len(),
            "compiled method"
        );

        Ok(Method {
            name: source.name.clone(),
            owner_interface: source.owner.clone(),
            is_mutation: kind.is_mutation(),
            kind,
            body,
            fields: shape.fields,
            tables: shape.tables,
            declared_kind_tag: options.exec_tag,
            returns: Some(returns),
            result_shape,
            span: source.span(),
        })
    }
}

impl Default for CompilerContext {
    fn default() -> Self {
        Self::new(CompilerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlweave_ast::{ExecKind, StatementKind, TemplateSegment};

    fn compile(source: &str) -> Result<CompiledFile, CompileError> {
        CompilerContext::default().compile_file("test.sqlt", source)
    }

    #[test]
    fn test_static_query() {
        let file = compile("-- name: UserDao.Find returns=User\nSELECT id, name FROM user WHERE id = ${id}\n").unwrap();
        let method = &file.methods[0];
        assert_eq!(method.qualified_name(), "UserDao.Find");
        assert_eq!(method.kind, StatementKind::SingleRow);
        assert!(!method.is_mutation);
        match &method.body {
            MethodBody::Static(stmt) => {
                assert_eq!(stmt.text, "SELECT id, name FROM user WHERE id = ?");
                assert_eq!(stmt.bind_params, vec!["id".to_string()]);
            }
            other => panic!("expected static body, got {:?}", other),
        }
        assert_eq!(method.fields.len(), 2);
        assert_eq!(method.tables[0].name, "user");
    }

    #[test]
    fn test_spans_are_file_relative() {
        let source = "-- name: Find returns=User\nSELECT id FROM user\n";
        let file = compile(source).unwrap();
        let field = &file.methods[0].fields[0];
        assert_eq!(&source[field.span.start..field.span.end], "id");
    }

    #[test]
    fn test_dynamic_mutation() {
        let file = compile(
            "-- name: Prune dynamic exec=affect\nDELETE FROM log WHERE 1=1 %{if before != nil} AND at < ${before} %{endif}\n",
        )
        .unwrap();
        let method = &file.methods[0];
        assert_eq!(method.kind, StatementKind::Mutation(ExecKind::Affect));
        assert_eq!(method.declared_kind_tag.as_deref(), Some("affect"));
        assert!(method.fields.is_empty());
        match &method.body {
            MethodBody::Dynamic(segments) => {
                assert_eq!(segments.len(), 2);
                assert!(matches!(&segments[1], TemplateSegment::If { condition, .. } if condition == "before != nil"));
            }
            other => panic!("expected dynamic body, got {:?}", other),
        }
    }

    #[test]
    fn test_directive_requires_dynamic() {
        let source = "-- name: Find returns=[User]\nSELECT id FROM user %{if x} WHERE a = 1 %{endif}\n";
        let err = compile(source).unwrap_err();
        assert!(matches!(err.error, BuildError::Parse(ParseError::DirectiveNotAllowed { .. })));
        assert_eq!(&source[err.offset..err.offset + 2], "%{");
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_duplicate_method() {
        let err = compile("-- name: A exec=affect\nDELETE FROM t\n-- name: A exec=affect\nDELETE FROM u\n")
            .unwrap_err();
        assert!(matches!(err.error, BuildError::DuplicateMethod { ref name, .. } if name == "A"));
        assert_eq!(err.line, 3);
    }

    #[test]
    fn test_same_name_on_other_owner_is_allowed() {
        let file = compile("-- name: A.Get returns=X\nSELECT a FROM t\n-- name: B.Get returns=X\nSELECT b FROM t\n").unwrap();
        assert_eq!(file.methods.len(), 2);
    }

    #[test]
    fn test_registry_is_per_file() {
        let mut ctx = CompilerContext::default();
        let source = "-- name: A exec=affect\nDELETE FROM t\n";
        assert!(ctx.compile_file("a.sqlt", source).is_ok());
        assert!(ctx.compile_file("b.sqlt", source).is_ok());
    }

    #[test]
    fn test_empty_body() {
        let err = compile("-- name: A returns=X\n\n-- just a comment\n").unwrap_err();
        assert!(matches!(err.error, BuildError::EmptyBody { .. }));
    }

    #[test]
    fn test_auto_without_schema() {
        let err = compile("-- name: A returns=User auto\nSELECT id FROM user\n").unwrap_err();
        assert!(matches!(err.error, BuildError::NoSchema { .. }));
    }

    #[test]
    fn test_custom_substitute_marker() {
        let mut ctx = CompilerContext::new(CompilerConfig::default().with_substitute_marker("{}"));
        let file = ctx
            .compile_file("t.sqlt", "-- name: List returns=[i64]\nSELECT id FROM user ORDER BY #{column}\n")
            .unwrap();
        let stmt = file.methods[0].body.statements().next().cloned().unwrap();
        assert_eq!(stmt.text, "SELECT id FROM user ORDER BY {}");
        assert_eq!(stmt.substitute_params, vec!["column".to_string()]);
    }
}
