//! Method header options: `exec=`, `returns=`, `dynamic`, `auto`

use sqlweave_ast::{ExecKind, ReturnShape, ShapeKind, Span};

use crate::BuildError;

/// Decoded options of one method header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodOptions {
    pub exec: Option<ExecKind>,
    /// The `exec=` value as written
    pub exec_tag: Option<String>,
    pub returns: Option<ReturnShape>,
    pub dynamic: bool,
    pub auto: bool,
    spans: Vec<(&'static str, Span)>,
}

impl MethodOptions {
    /// Where option `key` was written, if it was
    pub fn span_of(&self, key: &str) -> Option<Span> {
        self.spans.iter().find(|(k, _)| *k == key).map(|(_, s)| *s)
    }
}

/// A raw `key[=value]` word from a method header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawOption {
    pub key: String,
    pub value: Option<String>,
    pub span: Span,
}

impl RawOption {
    pub fn parse(word: &str, span: Span) -> Self {
        match word.split_once('=') {
            Some((key, value)) => Self {
                key: key.to_string(),
                value: Some(value.to_string()),
                span,
            },
            None => Self {
                key: word.to_string(),
                value: None,
                span,
            },
        }
    }
}

type Setter = fn(&mut MethodOptions, Option<&str>) -> Result<(), String>;

/// Option keys and the closures that apply them
const OPTIONS: &[(&str, Setter)] = &[
    ("exec", |opts: &mut MethodOptions, value: Option<&str>| {
        let tag = value.ok_or("expected `exec=lastid|affect|result`")?;
        let kind = ExecKind::from_tag(tag)
            .ok_or_else(|| format!("unknown exec kind `{}`; expected lastid, affect or result", tag))?;
        opts.exec = Some(kind);
        opts.exec_tag = Some(tag.to_string());
        Ok(())
    }),
    ("returns", |opts: &mut MethodOptions, value: Option<&str>| {
        let text = value.ok_or("expected `returns=<type>`")?;
        let shape = parse_return_shape(text).ok_or_else(|| format!("malformed return type `{}`", text))?;
        opts.returns = Some(shape);
        Ok(())
    }),
    ("dynamic", |opts: &mut MethodOptions, value: Option<&str>| {
        flag(value)?;
        opts.dynamic = true;
        Ok(())
    }),
    ("auto", |opts: &mut MethodOptions, value: Option<&str>| {
        flag(value)?;
        opts.auto = true;
        Ok(())
    }),
];

fn flag(value: Option<&str>) -> Result<(), String> {
    match value {
        None => Ok(()),
        Some(_) => Err("flag takes no value".to_string()),
    }
}

/// Decode header options through the dispatch table
pub fn decode_options(raw: &[RawOption]) -> Result<MethodOptions, BuildError> {
    let mut options = MethodOptions::default();

    for option in raw {
        let Some((key, setter)) = OPTIONS.iter().find(|(key, _)| *key == option.key) else {
            return Err(BuildError::UnknownOption {
                key: option.key.clone(),
                span: option.span,
            });
        };
        if options.span_of(key).is_some() {
            return Err(BuildError::InvalidOption {
                key: option.key.clone(),
                reason: "given more than once".to_string(),
                span: option.span,
            });
        }

        setter(&mut options, option.value.as_deref()).map_err(|reason| BuildError::InvalidOption {
            key: option.key.clone(),
            reason,
            span: option.span,
        })?;
        options.spans.push((*key, option.span));
    }

    Ok(options)
}

/// Parse `T`, `[T]`, `i64`, `exec_result`
pub fn parse_return_shape(text: &str) -> Option<ReturnShape> {
    let (inner, collection) = match text.strip_prefix('[') {
        Some(rest) => (rest.strip_suffix(']')?, true),
        None => (text, false),
    };
    if inner.is_empty() || !inner.chars().all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | ':' | '*')) {
        return None;
    }

    let kind = match inner {
        "i64" | "int64" => ShapeKind::Int64,
        "exec_result" => ShapeKind::ExecResult,
        name => ShapeKind::Named(name.to_string()),
    };
    Some(ReturnShape { kind, collection })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(words: &[&str]) -> Vec<RawOption> {
        words
            .iter()
            .enumerate()
            .map(|(i, w)| RawOption::parse(w, Span::new(i * 10, i * 10 + w.len())))
            .collect()
    }

    #[test]
    fn test_decode_all_options() {
        let options = decode_options(&raw(&["exec=affect", "returns=i64", "dynamic"])).unwrap();
        assert_eq!(options.exec, Some(ExecKind::Affect));
        assert_eq!(options.exec_tag.as_deref(), Some("affect"));
        assert_eq!(options.returns, Some(ReturnShape::single(ShapeKind::Int64)));
        assert!(options.dynamic);
        assert!(!options.auto);
        assert_eq!(options.span_of("returns"), Some(Span::new(10, 21)));
    }

    #[test]
    fn test_unknown_option() {
        let err = decode_options(&raw(&["cache"])).unwrap_err();
        assert!(matches!(err, BuildError::UnknownOption { ref key, .. } if key == "cache"));
    }

    #[test]
    fn test_bad_exec_value() {
        let err = decode_options(&raw(&["exec=rows"])).unwrap_err();
        assert!(matches!(err, BuildError::InvalidOption { ref key, .. } if key == "exec"));
        let err = decode_options(&raw(&["exec"])).unwrap_err();
        assert!(matches!(err, BuildError::InvalidOption { .. }));
    }

    #[test]
    fn test_flag_with_value() {
        let err = decode_options(&raw(&["auto=yes"])).unwrap_err();
        assert!(matches!(err, BuildError::InvalidOption { ref key, .. } if key == "auto"));
    }

    #[test]
    fn test_repeated_option() {
        let err = decode_options(&raw(&["dynamic", "dynamic"])).unwrap_err();
        assert!(matches!(err, BuildError::InvalidOption { ref reason, .. } if reason == "given more than once"));
    }

    #[test]
    fn test_return_shapes() {
        assert_eq!(
            parse_return_shape("[User]"),
            Some(ReturnShape::collection(ShapeKind::Named("User".into())))
        );
        assert_eq!(parse_return_shape("int64"), Some(ReturnShape::single(ShapeKind::Int64)));
        assert_eq!(
            parse_return_shape("exec_result"),
            Some(ReturnShape::single(ShapeKind::ExecResult))
        );
        assert_eq!(
            parse_return_shape("model.User"),
            Some(ReturnShape::single(ShapeKind::Named("model.User".into())))
        );
        assert_eq!(parse_return_shape("[User"), None);
        assert_eq!(parse_return_shape("[]"), None);
        assert_eq!(parse_return_shape("Us er"), None);
    }
}
