//! Resolved statements and dynamic template segments

use serde::{Deserialize, Serialize};

/// Template text with placeholders replaced by positional markers.
///
/// The number of markers in `text` always equals
/// `bind_params.len() + substitute_params.len()`, and marker order follows
/// the order in which the placeholders occurred in the source. Names are
/// recorded once per occurrence and are never deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub text: String,
    /// Names of `${...}` placeholders, in occurrence order
    pub bind_params: Vec<String>,
    /// Names of `#{...}` placeholders, in occurrence order
    pub substitute_params: Vec<String>,
}

impl Statement {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bind_params: Vec::new(),
            substitute_params: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Total number of parameters, bound and substituted
    pub fn param_count(&self) -> usize {
        self.bind_params.len() + self.substitute_params.len()
    }
}

/// One ordered piece of a dynamic template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TemplateSegment {
    /// Text that is always part of the statement
    Constant(Statement),
    /// `%{if <condition>} ... %{endif}`
    If {
        /// Opaque boolean expression, passed through to code emission
        condition: String,
        body: Statement,
    },
    /// `%{for <element> in <collection> [join '<sep>']} ... %{endfor}`
    For {
        element: String,
        collection: String,
        join_separator: Option<String>,
        body: Statement,
    },
}

impl TemplateSegment {
    /// The resolved statement carried by this segment
    pub fn statement(&self) -> &Statement {
        match self {
            TemplateSegment::Constant(stmt) => stmt,
            TemplateSegment::If { body, .. } => body,
            TemplateSegment::For { body, .. } => body,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        !matches!(self, TemplateSegment::Constant(_))
    }
}

/// The compiled body of a method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MethodBody {
    Static(Statement),
    Dynamic(Vec<TemplateSegment>),
}

impl MethodBody {
    /// Iterate all resolved statements in order
    pub fn statements(&self) -> Box<dyn Iterator<Item = &Statement> + '_> {
        match self {
            MethodBody::Static(stmt) => Box::new(std::iter::once(stmt)),
            MethodBody::Dynamic(segments) => Box::new(segments.iter().map(|s| s.statement())),
        }
    }
}
