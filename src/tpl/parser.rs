use crate::error::ParseError;
use crate::tpl::ast::{AstNode, Template};
use std::mem;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

enum Directive<'a> {
    Variable(&'a str),
    Open { name: &'a str, negated: bool },
    Close(&'a str),
}

/// A section whose closing tag has not been seen yet. `parent` holds the
/// nodes of the enclosing scope while the section body is being collected.
struct OpenSection {
    name: String,
    negated: bool,
    parent: Vec<AstNode>,
}

pub fn parse_template(template: &str) -> Result<Template, ParseError> {
    let mut nodes: Vec<AstNode> = Vec::new();
    let mut open_sections: Vec<OpenSection> = Vec::new();
    let mut pos = 0;

    while pos < template.len() {
        let remaining = &template[pos..];

        let Some(start) = remaining.find(OPEN) else {
            append_text(&mut nodes, remaining);
            break;
        };
        if start > 0 {
            append_text(&mut nodes, &remaining[..start]);
        }

        let offset = pos + start;
        let token_start = offset + OPEN.len();
        let Some(token_len) = template[token_start..].find(CLOSE) else {
            return Err(ParseError::MalformedDirective {
                offset,
                reason: "missing closing `}}`".to_string(),
            });
        };
        let token = &template[token_start..token_start + token_len];
        pos = token_start + token_len + CLOSE.len();

        match classify(token, offset)? {
            Directive::Variable(name) => nodes.push(AstNode::Variable(name.to_string())),
            Directive::Open { name, negated } => {
                open_sections.push(OpenSection {
                    name: name.to_string(),
                    negated,
                    parent: mem::take(&mut nodes),
                });
            }
            Directive::Close(name) => match open_sections.pop() {
                Some(section) if section.name == name => {
                    let body = mem::replace(&mut nodes, section.parent);
                    nodes.push(AstNode::Conditional {
                        flag: section.name,
                        negated: section.negated,
                        body,
                    });
                }
                Some(section) => {
                    return Err(ParseError::MismatchedSection {
                        expected: Some(section.name),
                        actual: name.to_string(),
                        offset,
                    });
                }
                None => {
                    return Err(ParseError::MismatchedSection {
                        expected: None,
                        actual: name.to_string(),
                        offset,
                    });
                }
            },
        }
    }

    if !open_sections.is_empty() {
        return Err(ParseError::UnterminatedSection {
            open: open_sections.into_iter().map(|s| s.name).collect(),
        });
    }

    Ok(Template::from_nodes(nodes))
}

fn classify(token: &str, offset: usize) -> Result<Directive<'_>, ParseError> {
    let token = token.trim();
    let (sigil, rest) = match token.chars().next() {
        Some(c @ ('#' | '^' | '/')) => (Some(c), token[1..].trim_start()),
        _ => (None, token),
    };

    if rest.is_empty() {
        return Err(ParseError::MalformedDirective {
            offset,
            reason: "empty directive".to_string(),
        });
    }
    if let Some(bad) = rest.chars().find(|c| !is_ident_char(*c)) {
        return Err(ParseError::MalformedDirective {
            offset,
            reason: format!("illegal character {:?} in `{}`", bad, token),
        });
    }

    Ok(match sigil {
        Some('#') => Directive::Open {
            name: rest,
            negated: false,
        },
        Some('^') => Directive::Open {
            name: rest,
            negated: true,
        },
        Some(_) => Directive::Close(rest),
        None => Directive::Variable(rest),
    })
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn append_text(nodes: &mut Vec<AstNode>, text: &str) {
    if let Some(AstNode::Literal(last_text)) = nodes.last_mut() {
        last_text.push_str(text);
    } else {
        nodes.push(AstNode::Literal(text.to_string()));
    }
}
