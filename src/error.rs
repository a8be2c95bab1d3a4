use thiserror::Error;

/// Errors raised while parsing template source. No partial template is
/// returned when one of these occurs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Malformed directive at offset {offset}: {reason}")]
    MalformedDirective { offset: usize, reason: String },
    #[error(
        "Mismatched section at offset {offset}: expected {{{{ /{} }}}}, found {{{{ /{actual} }}}}",
        expected.as_deref().unwrap_or("<none>")
    )]
    MismatchedSection {
        /// Innermost open section, `None` when nothing was open.
        expected: Option<String>,
        actual: String,
        offset: usize,
    },
    #[error("Unterminated section(s): {}", open.join(", "))]
    UnterminatedSection {
        /// Outermost first.
        open: Vec<String>,
    },
}

/// Errors raised while rendering a parsed template against a context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Unbound variable: {0}")]
    UnboundVariable(String),
    #[error("Unbound flag: {0}")]
    UnboundFlag(String),
}

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
    #[error("Template not found: {0}")]
    NotFound(String),
    #[error("Load error: {0}")]
    Load(String),
    #[error("Context error: {0}")]
    Context(String),
    #[error("Unsupported Minecraft version: {0}")]
    UnsupportedVersion(String),
}

impl serde::ser::Error for TemplateError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        TemplateError::Context(msg.to_string())
    }
}

impl From<anyhow::Error> for TemplateError {
    fn from(e: anyhow::Error) -> Self {
        TemplateError::Load(format!("{:#}", e))
    }
}
