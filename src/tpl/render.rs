use crate::error::RenderError;
use crate::tpl::ast::AstNode;
use crate::tpl::render_context::RenderContext;

/// Appends the rendering of `nodes` to `out`. On error the caller must
/// discard `out`; it may hold a partial rendering.
pub(crate) fn render(
    nodes: &[AstNode],
    ctx: &RenderContext,
    out: &mut String,
) -> Result<(), RenderError> {
    for node in nodes {
        match node {
            AstNode::Literal(t) => out.push_str(t),
            AstNode::Variable(name) => {
                let value = ctx
                    .get_var(name)
                    .ok_or_else(|| RenderError::UnboundVariable(name.clone()))?;
                out.push_str(value);
            }
            AstNode::Conditional {
                flag,
                negated,
                body,
            } => {
                let value = ctx
                    .get_flag(flag)
                    .ok_or_else(|| RenderError::UnboundFlag(flag.clone()))?;
                // Skipped bodies are never visited, so their lookups need no binding.
                if value != *negated {
                    render(body, ctx, out)?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::error::RenderError;
    use crate::tpl::ast::Template;
    use crate::tpl::render_context::RenderContext;

    fn render(src: &str, ctx: &RenderContext) -> Result<String, RenderError> {
        Template::parse(src).unwrap().render(ctx)
    }

    #[test]
    fn test_render_variable() {
        let ctx = RenderContext::new().var("name", "World");
        assert_eq!(render("Hello {{ name }}!", &ctx).unwrap(), "Hello World!");
    }

    #[test]
    fn test_render_section() {
        let src = "A{{ #x }}B{{ /x }}C";
        let on = RenderContext::new().flag("x", true);
        let off = RenderContext::new().flag("x", false);
        assert_eq!(render(src, &on).unwrap(), "ABC");
        assert_eq!(render(src, &off).unwrap(), "AC");
    }

    #[test]
    fn test_render_inverted_section() {
        let src = "A{{ ^x }}B{{ /x }}C";
        let on = RenderContext::new().flag("x", true);
        let off = RenderContext::new().flag("x", false);
        assert_eq!(render(src, &on).unwrap(), "AC");
        assert_eq!(render(src, &off).unwrap(), "ABC");
    }

    #[test]
    fn test_plain_text_renders_verbatim() {
        let src = "package a.b;\n\n  class X { }\r\n}} {";
        let ctx = RenderContext::new().var("unused", "v").flag("f", true);
        assert_eq!(render(src, &RenderContext::new()).unwrap(), src);
        assert_eq!(render(src, &ctx).unwrap(), src);
    }

    #[test]
    fn test_values_are_not_escaped() {
        let ctx = RenderContext::new().var("v", "<a href=\"x\">&{{ y }}</a>");
        assert_eq!(render("{{ v }}", &ctx).unwrap(), "<a href=\"x\">&{{ y }}</a>");
    }

    #[test]
    fn test_unbound_variable() {
        let err = render("Hello {{ name }}!", &RenderContext::new()).unwrap_err();
        assert_eq!(err, RenderError::UnboundVariable("name".into()));
    }

    #[test]
    fn test_unbound_flag() {
        let err = render("{{ #x }}B{{ /x }}", &RenderContext::new()).unwrap_err();
        assert_eq!(err, RenderError::UnboundFlag("x".into()));
    }

    #[test]
    fn test_skipped_section_is_not_evaluated() {
        let src = "{{ #outer }}{{ #inner }}{{ missing }}{{ /inner }}{{ /outer }}done";
        let ctx = RenderContext::new().flag("outer", false);
        assert_eq!(render(src, &ctx).unwrap(), "done");

        let ctx = RenderContext::new().flag("outer", true);
        assert_eq!(
            render(src, &ctx).unwrap_err(),
            RenderError::UnboundFlag("inner".into())
        );

        let ctx = ctx.flag("inner", true);
        assert_eq!(
            render(src, &ctx).unwrap_err(),
            RenderError::UnboundVariable("missing".into())
        );
    }

    #[test]
    fn test_render_is_deterministic() {
        let tpl = Template::parse("{{ a }}{{ #f }}-{{ b }}{{ /f }}").unwrap();
        let ctx = RenderContext::new().var("a", "1").var("b", "2").flag("f", true);
        assert_eq!(tpl.render(&ctx).unwrap(), "1-2");
        assert_eq!(tpl.render(&ctx).unwrap(), tpl.render(&ctx).unwrap());
    }

    #[test]
    fn test_shared_template_across_threads() {
        let tpl = std::sync::Arc::new(Template::parse("{{ n }}{{ #odd }}!{{ /odd }}").unwrap());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let tpl = tpl.clone();
                std::thread::spawn(move || {
                    let ctx = RenderContext::new()
                        .var("n", i.to_string())
                        .flag("odd", i % 2 == 1);
                    tpl.render(&ctx).unwrap()
                })
            })
            .collect();
        let out: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(out, vec!["0", "1!", "2", "3!"]);
    }
}
