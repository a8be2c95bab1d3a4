pub mod error;
pub mod generator;
pub mod models;
pub mod template_loader;
pub mod template_manager;
pub mod tpl;

pub use error::{ParseError, RenderError, TemplateError};
pub use tpl::{AstNode, RenderContext, Template, parse_template};

#[doc(hidden)]
pub use ctor;
pub use modtpl_macros::template_assets;
