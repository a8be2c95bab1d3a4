use crate::error::TemplateError;
use crate::tpl::cache;
use crate::tpl::render_context::RenderContext;
use std::time::Instant;
use tracing::debug;

/// Parses `template_content` (through the cache) and renders it against
/// `ctx`. Either the complete output or an error is returned, never a
/// partial rendering.
pub fn render_template(
    template_name: &str,
    template_content: &str,
    ctx: &RenderContext,
) -> Result<String, TemplateError> {
    let start = Instant::now();
    let result = cache::TEMPLATE_CACHE
        .get_or_parse(template_name, template_content)
        .map_err(TemplateError::from)
        .and_then(|template| template.render(ctx).map_err(TemplateError::from));

    let elapsed_us = start.elapsed().as_micros() as u64;
    match &result {
        Ok(out) => debug!(
            template = template_name,
            elapsed_us,
            len = out.len(),
            "rendered template"
        ),
        Err(e) => debug!(template = template_name, elapsed_us, error = %e, "render failed"),
    }
    result
}

/// Evicts a parsed template from the cache.
pub fn remove_template(template_name: &str) {
    cache::TEMPLATE_CACHE.remove(template_name);
}
