//! Inline and block-level markdown rendering.
//!
//! Block-level elements produce standard markdown (ATX headings handled in
//! `dom::collect_blocks`; paragraphs, lists, blockquotes, fenced code here).
//! Inline elements produce `**…**`, `*…*`, `` `…` ``, `[text](href)`.
//! Whitespace is collapsed throughout.

use super::dom::{collapse_whitespace, plain_text};
use scraper::{ElementRef, Node};

/// Render one leaf block-level element (p, ul, ol, blockquote, pre) to markdown.
#[must_use]
pub fn render_block(el: ElementRef) -> String {
    match el.value().name() {
        "p" => collapse_whitespace(&render_inline_children(el)),
        "ul" => render_list(el, false),
        "ol" => render_list(el, true),
        "blockquote" => render_blockquote(el),
        "pre" => render_pre(el),
        "li" => collapse_whitespace(&render_inline_children(el)),
        _ => collapse_whitespace(&render_inline_children(el)),
    }
}

fn render_list(el: ElementRef, ordered: bool) -> String {
    let mut lines = Vec::new();
    for (i, child) in el.children().filter_map(ElementRef::wrap).enumerate() {
        if child.value().name() != "li" {
            continue;
        }
        let text = collapse_whitespace(&render_inline_children(child));
        if ordered {
            lines.push(format!("{}. {}", i + 1, text));
        } else {
            lines.push(format!("- {text}"));
        }
    }
    lines.join("\n")
}

fn render_blockquote(el: ElementRef) -> String {
    let text = collapse_whitespace(&render_inline_children(el));
    text.lines().map(|line| format!("> {line}")).collect::<Vec<_>>().join("\n")
}

fn render_pre(el: ElementRef) -> String {
    let code_el = el
        .children()
        .filter_map(ElementRef::wrap)
        .find(|c| c.value().name() == "code");
    let raw = match code_el {
        Some(code) => plain_text(code),
        None => plain_text(el),
    };
    format!("```\n{raw}\n```")
}

/// Render inline markup within a block-level element's children.
fn render_inline_children(el: ElementRef) -> String {
    let mut out = String::new();
    for child in el.children() {
        render_inline_node(child, &mut out);
    }
    out
}

fn render_inline_node(node: ego_tree::NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Text(text) => out.push_str(text),
        Node::Element(_) => {
            let Some(el) = ElementRef::wrap(node) else { return };
            match el.value().name() {
                "script" | "style" | "noscript" => {}
                "br" => out.push('\n'),
                "strong" | "b" => {
                    out.push_str("**");
                    out.push_str(&render_inline_children(el));
                    out.push_str("**");
                }
                "em" | "i" => {
                    out.push('*');
                    out.push_str(&render_inline_children(el));
                    out.push('*');
                }
                "code" => {
                    out.push('`');
                    out.push_str(&plain_text(el));
                    out.push('`');
                }
                "a" => {
                    let href = el.value().attr("href").unwrap_or("");
                    let text = render_inline_children(el);
                    out.push('[');
                    out.push_str(&text);
                    out.push_str("](");
                    out.push_str(href);
                    out.push(')');
                }
                _ => out.push_str(&render_inline_children(el)),
            }
        }
        _ => {}
    }
}

/// Join a document's blocks into full markdown, blank-line separated.
#[must_use]
pub fn join_blocks(blocks: &[super::dom::Block]) -> String {
    blocks
        .iter()
        .map(|b| match b {
            super::dom::Block::Heading { markdown, .. } => markdown.clone(),
            super::dom::Block::Paragraph(md) => md.clone(),
        })
        .filter(|s| !s.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
