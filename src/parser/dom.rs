//! A single recursive walk over the body producing a flat sequence of
//! block-level units. Both markdown conversion (`parser::markdown`) and
//! section splitting (`parser::sections`) consume this sequence rather than
//! re-walking the tree, per §9's "implementer may fold them into one walk"
//! note — block identification is the one walk; markdown/body_text
//! rendering of each block's content is a second, purely local pass over
//! that block's subtree.

use scraper::{ElementRef, Node};

/// One flow-level unit of the body, in document order.
#[derive(Debug, Clone)]
pub enum Block {
    Heading { level: u8, text: String, markdown: String },
    Paragraph(String),
}

const SKIP_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg"];

/// Walk `root` and collect block-level units in document order.
#[must_use]
pub fn collect_blocks(root: ElementRef) -> Vec<Block> {
    let mut blocks = Vec::new();
    walk_blocks(root, &mut blocks);
    blocks
}

fn walk_blocks(el: ElementRef, out: &mut Vec<Block>) {
    let tag = el.value().name();
    if SKIP_TAGS.contains(&tag) {
        return;
    }
    if let Some(level) = heading_level(tag) {
        let text = collapse_whitespace(&plain_text(el));
        let markdown = format!("{} {}", "#".repeat(level as usize), text);
        out.push(Block::Heading { level, text, markdown });
        return;
    }
    if is_block_container(tag) {
        // Flatten: recurse into element children, splitting on nested headings.
        for child in el.children() {
            if let Some(child_el) = ElementRef::wrap(child) {
                walk_blocks(child_el, out);
            }
        }
        return;
    }
    // A leaf block-level element (p, li as a standalone block, blockquote, pre, etc).
    let markdown = super::markdown::render_block(el);
    if !markdown.trim().is_empty() {
        out.push(Block::Paragraph(markdown));
    }
}

fn heading_level(tag: &str) -> Option<u8> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

/// Elements whose own markdown rendering is delegated to `markdown::render_block`
/// rather than flattened further. Anything not in this list and not a
/// container is rendered wholesale by the caller.
fn is_block_container(tag: &str) -> bool {
    matches!(
        tag,
        "div" | "section" | "article" | "main" | "header" | "footer" | "nav" | "aside"
            | "body" | "figure" | "figcaption" | "details" | "summary"
    )
}

/// Visible plain text of an element's subtree, collapsing away script/style
/// content, without markdown syntax.
#[must_use]
pub fn plain_text(el: ElementRef) -> String {
    let mut out = String::new();
    collect_plain_text(el, &mut out);
    out
}

fn collect_plain_text(el: ElementRef, out: &mut String) {
    let tag = el.value().name();
    if SKIP_TAGS.contains(&tag) {
        return;
    }
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_plain_text(child_el, out);
                    if matches!(
                        child_el.value().name(),
                        "p" | "div" | "br" | "li" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
                    ) {
                        out.push(' ');
                    }
                }
            }
            _ => {}
        }
    }
}

/// Collapse runs of ASCII/Unicode whitespace into single spaces and trim ends.
#[must_use]
pub fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_space = true;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }
    if out.ends_with(' ') {
        out.pop();
    }
    out
}
