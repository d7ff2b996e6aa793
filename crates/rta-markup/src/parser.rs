//! Fragment parser: tokens → [`MarkupNode`] forest.
//!
//! The parser is forgiving in the same places browsers are: unclosed
//! elements are closed at the end of the input, a closing tag closes any
//! elements still open inside it, and void elements never take children.
//! The one thing it refuses is a closing tag with no matching open element.

use std::sync::OnceLock;

use regex::Regex;

use crate::lexer::{TokenKind, lex_with_spans};
use crate::serialize::is_void_element;

/// A parsed markup node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupNode {
    Element {
        /// Lowercased tag name
        tag: String,
        /// Attributes in source order, names lowercased, values entity-decoded
        attrs: Vec<(String, String)>,
        children: Vec<MarkupNode>,
    },
    Text(String),
    Comment(String),
}

impl MarkupNode {
    /// Concatenated text of this node and its descendants (comments excluded).
    pub fn text_content(&self) -> String {
        match self {
            MarkupNode::Text(text) => text.clone(),
            MarkupNode::Comment(_) => String::new(),
            MarkupNode::Element { children, .. } => {
                children.iter().map(MarkupNode::text_content).collect()
            }
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MarkupError {
    #[error("Closing tag </{tag}> at byte {offset} has no matching open element")]
    UnmatchedClose { tag: String, offset: usize },
}

struct OpenElement {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<MarkupNode>,
}

impl OpenElement {
    fn into_node(self) -> MarkupNode {
        MarkupNode::Element {
            tag: self.tag,
            attrs: self.attrs,
            children: self.children,
        }
    }
}

/// Parse a markup fragment into a forest of nodes.
pub fn parse_fragment(input: &str) -> Result<Vec<MarkupNode>, MarkupError> {
    let mut roots = Vec::new();
    let mut stack: Vec<OpenElement> = Vec::new();

    for (token, span) in lex_with_spans(input) {
        match token.kind {
            TokenKind::Text => {
                let decoded = html_escape::decode_html_entities(token.text);
                push_text(children_of(&mut stack, &mut roots), &decoded);
            }
            TokenKind::Lt => push_text(children_of(&mut stack, &mut roots), token.text),
            TokenKind::Comment => {
                let body = &token.text[4..token.text.len() - 3];
                children_of(&mut stack, &mut roots).push(MarkupNode::Comment(body.to_string()));
            }
            TokenKind::OpenTag => {
                let Some(tag) = parse_open_tag(token.text) else {
                    push_text(children_of(&mut stack, &mut roots), token.text);
                    continue;
                };
                if tag.self_closing || is_void_element(&tag.name) {
                    children_of(&mut stack, &mut roots).push(MarkupNode::Element {
                        tag: tag.name,
                        attrs: tag.attrs,
                        children: Vec::new(),
                    });
                } else {
                    stack.push(OpenElement {
                        tag: tag.name,
                        attrs: tag.attrs,
                        children: Vec::new(),
                    });
                }
            }
            TokenKind::CloseTag => {
                let name = token.text[2..token.text.len() - 1]
                    .trim()
                    .to_ascii_lowercase();
                if is_void_element(&name) {
                    // `</br>` and friends carry no structure
                    continue;
                }
                let Some(depth) = stack.iter().rposition(|open| open.tag == name) else {
                    return Err(MarkupError::UnmatchedClose {
                        tag: name,
                        offset: span.start,
                    });
                };
                while stack.len() > depth {
                    close_top(&mut stack, &mut roots);
                }
            }
        }
    }

    while !stack.is_empty() {
        close_top(&mut stack, &mut roots);
    }

    Ok(roots)
}

fn children_of<'a>(
    stack: &'a mut [OpenElement],
    roots: &'a mut Vec<MarkupNode>,
) -> &'a mut Vec<MarkupNode> {
    match stack.last_mut() {
        Some(open) => &mut open.children,
        None => roots,
    }
}

fn close_top(stack: &mut Vec<OpenElement>, roots: &mut Vec<MarkupNode>) {
    if let Some(open) = stack.pop() {
        children_of(stack, roots).push(open.into_node());
    }
}

/// Append text, merging with a preceding text node.
fn push_text(children: &mut Vec<MarkupNode>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(MarkupNode::Text(last)) = children.last_mut() {
        last.push_str(text);
    } else {
        children.push(MarkupNode::Text(text.to_string()));
    }
}

struct OpenTag {
    name: String,
    attrs: Vec<(String, String)>,
    self_closing: bool,
}

fn parse_open_tag(text: &str) -> Option<OpenTag> {
    static TAG_REGEX: OnceLock<Regex> = OnceLock::new();
    static ATTR_REGEX: OnceLock<Regex> = OnceLock::new();

    let tag_regex = TAG_REGEX.get_or_init(|| {
        Regex::new(r"(?s)^<([a-zA-Z][a-zA-Z0-9-]*)(.*?)(/?)\s*>$").expect("Invalid tag regex")
    });
    let attr_regex = ATTR_REGEX.get_or_init(|| {
        Regex::new(r#"([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
            .expect("Invalid attribute regex")
    });

    let captures = tag_regex.captures(text)?;
    let name = captures.get(1)?.as_str().to_ascii_lowercase();
    let attr_source = captures.get(2).map_or("", |m| m.as_str());
    let self_closing = captures.get(3).is_some_and(|m| !m.as_str().is_empty());

    let attrs = attr_regex
        .captures_iter(attr_source)
        .filter_map(|attr| {
            let attr_name = attr.get(1)?.as_str().to_ascii_lowercase();
            let value = attr
                .get(2)
                .or_else(|| attr.get(3))
                .or_else(|| attr.get(4))
                .map_or(String::new(), |m| {
                    html_escape::decode_html_entities(m.as_str()).into_owned()
                });
            Some((attr_name, value))
        })
        .collect();

    Some(OpenTag {
        name,
        attrs,
        self_closing,
    })
}
