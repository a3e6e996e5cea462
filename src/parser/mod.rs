//! Extracts metadata, headings, links, images, sections, markdown,
//! structured data, body text, hreflang, canonical, and robots directives
//! from an HTML document given a base URL. Parsing never fails — malformed
//! HTML yields best-effort fields.
//!
//! Built on `scraper`-based CSS-selector extraction; safe to call
//! concurrently on independent inputs since it only reads its `html`
//! argument and allocates local state.

mod dom;
mod images;
mod links;
mod markdown;
mod metadata;
mod resolve;
mod sections;
mod structured_data;
pub mod types;

pub use types::{HreflangEntry, HreflangSource, Image, Link, ParseResult, Section};

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// `parse(html, baseURL, [xRobotsTagHeader], [linkHeader]) -> ParseResult`.
#[must_use]
pub fn parse(
    html: &str,
    base_url: &Url,
    x_robots_tag_header: Option<&str>,
    link_header: Option<&str>,
) -> ParseResult {
    let doc = Html::parse_document(html);
    let body_selector = Selector::parse("body").expect("static selector is valid");
    let Some(body) = doc.select(&body_selector).next() else {
        return empty_result(x_robots_tag_header);
    };

    let blocks = dom::collect_blocks(body);
    let body_text = dom::collapse_whitespace(&dom::plain_text(body));
    let body_markdown = markdown::join_blocks(&blocks);
    let sections = sections::extract_sections(&blocks);

    let meta_robots = metadata::extract_meta_content(&doc, "robots");
    let x_robots_tag = x_robots_tag_header.unwrap_or_default().to_string();
    let (meta_indexable, meta_follow) = metadata::robots_directives(&meta_robots, &x_robots_tag);

    let word_count = body_text.split_whitespace().count();
    let text_html_ratio = if html.is_empty() {
        0.0
    } else {
        body_text.len() as f64 / html.len() as f64
    };

    ParseResult {
        title: metadata::extract_title(&doc),
        meta_description: metadata::extract_meta_content(&doc, "description"),
        meta_robots,
        meta_indexable,
        meta_follow,
        x_robots_tag,
        canonical_url: metadata::extract_canonical(&doc, base_url, link_header),
        h1: metadata::extract_headings(&doc, "h1"),
        h2: metadata::extract_headings(&doc, "h2"),
        h3: metadata::extract_headings(&doc, "h3"),
        open_graph: metadata::extract_open_graph(&doc),
        structured_data: structured_data::extract_structured_data(&doc),
        hreflang: metadata::extract_hreflang(&doc, base_url, link_header),
        links: links::extract_links(body, base_url),
        images: images::extract_images(body, base_url),
        body_text,
        body_markdown,
        sections,
        text_html_ratio,
        word_count,
    }
}

fn empty_result(x_robots_tag_header: Option<&str>) -> ParseResult {
    let x_robots_tag = x_robots_tag_header.unwrap_or_default().to_string();
    let (meta_indexable, meta_follow) = metadata::robots_directives("", &x_robots_tag);
    ParseResult {
        x_robots_tag,
        meta_indexable,
        meta_follow,
        ..ParseResult::default()
    }
}

/// Patch image sizes from a JS-mode network capture, matched by absolute
/// URL. Images without a matching network entry keep size 0.
pub fn patch_image_sizes(images: &mut [Image], network: &[crate::events::collector::NetworkEntry]) {
    for image in images {
        if let Some(entry) = network.iter().find(|n| n.url == image.src) {
            image.size = entry.bytes;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    #[test]
    fn minimal_document_extracts_title_and_word_count() {
        let html = "<html><head><title>Example Domain</title></head><body><h1>Example Domain</h1><p>This domain is for use in illustrative examples in documents.</p></body></html>";
        let result = parse(html, &base(), None, None);
        assert_eq!(result.title, "Example Domain");
        assert_eq!(result.h1, vec!["Example Domain"]);
        assert!(result.h2.is_empty());
        assert!(result.word_count > 0);
    }

    #[test]
    fn malformed_html_does_not_panic() {
        let html = "<html><body><h1>Unclosed<p>paragraph</h1></body>";
        let result = parse(html, &base(), None, None);
        assert!(!result.h1.is_empty());
    }

    #[test]
    fn sections_are_stable_across_reruns() {
        let html = "<html><body><h1>A</h1><p>one</p><h2>B</h2><p>two</p></body></html>";
        let first = parse(html, &base(), None, None);
        let second = parse(html, &base(), None, None);
        let ids_first: Vec<_> = first.sections.iter().map(|s| s.id.clone()).collect();
        let ids_second: Vec<_> = second.sections.iter().map(|s| s.id.clone()).collect();
        assert_eq!(ids_first, ids_second);
        assert_eq!(ids_first, vec!["s1", "s2"]);
    }

    #[test]
    fn empty_html_yields_zero_ratio() {
        let result = parse("", &base(), None, None);
        assert_eq!(result.text_html_ratio, 0.0);
    }
}
