use crate::error::{ParseError, RenderError};
use crate::tpl::render_context::RenderContext;
use crate::tpl::{parser, render};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AstNode {
    Literal(String),
    Variable(String),
    Conditional {
        flag: String,
        negated: bool,
        body: Vec<AstNode>,
    },
}

/// A parsed template. Immutable once built, so one instance can be shared
/// across threads and rendered against any number of contexts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Template {
    nodes: Vec<AstNode>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        parser::parse_template(source)
    }

    pub(crate) fn from_nodes(nodes: Vec<AstNode>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[AstNode] {
        &self.nodes
    }

    pub fn render(&self, ctx: &RenderContext) -> Result<String, RenderError> {
        let mut out = String::new();
        render::render(&self.nodes, ctx, &mut out)?;
        Ok(out)
    }
}
