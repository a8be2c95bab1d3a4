mod ast;
mod cache;
pub mod engine;
mod parser;
mod render;
mod render_context;
mod serializer;

pub use ast::{AstNode, Template};
pub use parser::parse_template;
pub use render_context::RenderContext;
