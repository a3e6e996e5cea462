//! Title, meta tags, canonical URL, hreflang, and Open Graph extraction.

use super::dom::collapse_whitespace;
use super::resolve::resolve;
use super::types::{HreflangEntry, HreflangSource};
use scraper::{Html, Selector};
use url::Url;

#[must_use]
pub fn extract_title(doc: &Html) -> String {
    let selector = Selector::parse("title").expect("static selector is valid");
    doc.select(&selector)
        .next()
        .map(|el| collapse_whitespace(&super::dom::plain_text(el)))
        .unwrap_or_default()
}

#[must_use]
pub fn extract_meta_content(doc: &Html, name: &str) -> String {
    let selector = Selector::parse(&format!(r#"meta[name="{name}" i]"#)).ok();
    selector
        .and_then(|sel| doc.select(&sel).next().map(|el| el.value().attr("content").unwrap_or("").to_string()))
        .unwrap_or_default()
}

#[must_use]
pub fn extract_headings(doc: &Html, tag: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(tag) else { return Vec::new() };
    doc.select(&selector)
        .map(|el| collapse_whitespace(&super::dom::plain_text(el)))
        .collect()
}

/// `meta_indexable` = true iff neither meta-robots nor X-Robots-Tag contains
/// `noindex`; `meta_follow` is the `nofollow` analogue.
#[must_use]
pub fn robots_directives(meta_robots: &str, x_robots_tag: &str) -> (bool, bool) {
    let combined = format!("{meta_robots},{x_robots_tag}").to_ascii_lowercase();
    let tokens: Vec<&str> = combined.split(|c| c == ',' || c == ' ').filter(|t| !t.is_empty()).collect();
    let indexable = !tokens.contains(&"noindex");
    let follow = !tokens.contains(&"nofollow");
    (indexable, follow)
}

#[must_use]
pub fn extract_canonical(doc: &Html, base: &Url, link_header: Option<&str>) -> String {
    let selector = Selector::parse(r#"link[rel="canonical"]"#).expect("static selector is valid");
    if let Some(href) = doc.select(&selector).next().and_then(|el| el.value().attr("href")) {
        if let Some(resolved) = resolve(base, href) {
            return resolved.to_string();
        }
    }
    if let Some(header) = link_header {
        for entry in parse_link_header(header) {
            if entry.rel.as_deref() == Some("canonical") {
                if let Some(resolved) = resolve(base, &entry.url) {
                    return resolved.to_string();
                }
            }
        }
    }
    String::new()
}

#[must_use]
pub fn extract_hreflang(doc: &Html, base: &Url, link_header: Option<&str>) -> Vec<HreflangEntry> {
    let mut entries = Vec::new();
    let mut seen = std::collections::HashSet::new();

    let selector = Selector::parse(r#"link[rel="alternate"][hreflang]"#).expect("static selector is valid");
    for el in doc.select(&selector) {
        let (Some(lang), Some(href)) = (el.value().attr("hreflang"), el.value().attr("href")) else { continue };
        let Some(resolved) = resolve(base, href) else { continue };
        let key = (lang.to_string(), resolved.to_string());
        if seen.insert(key) {
            entries.push(HreflangEntry { lang: lang.to_string(), url: resolved.to_string(), source: HreflangSource::Html });
        }
    }

    if let Some(header) = link_header {
        for entry in parse_link_header(header) {
            if entry.rel.as_deref() != Some("alternate") {
                continue;
            }
            let Some(lang) = entry.hreflang else { continue };
            let Some(resolved) = resolve(base, &entry.url) else { continue };
            let key = (lang.clone(), resolved.to_string());
            if seen.insert(key) {
                entries.push(HreflangEntry { lang, url: resolved.to_string(), source: HreflangSource::Header });
            }
        }
    }

    entries
}

#[must_use]
pub fn extract_open_graph(doc: &Html) -> std::collections::BTreeMap<String, String> {
    let selector = Selector::parse(r#"meta[property^="og:"]"#).expect("static selector is valid");
    let mut map = std::collections::BTreeMap::new();
    for el in doc.select(&selector) {
        let (Some(prop), Some(content)) = (el.value().attr("property"), el.value().attr("content")) else { continue };
        map.entry(prop.to_string()).or_insert_with(|| content.to_string());
    }
    map
}

struct LinkHeaderEntry {
    url: String,
    rel: Option<String>,
    hreflang: Option<String>,
}

/// Minimal RFC 8288 `Link` header parser: splits on top-level commas (not
/// inside quotes) and pulls `<url>` plus `rel=`/`hreflang=` parameters.
fn parse_link_header(header: &str) -> Vec<LinkHeaderEntry> {
    let mut entries = Vec::new();
    for segment in split_top_level_commas(header) {
        let segment = segment.trim();
        let Some(url_end) = segment.find('>') else { continue };
        if !segment.starts_with('<') {
            continue;
        }
        let url = segment[1..url_end].to_string();
        let rest = &segment[url_end + 1..];

        let mut rel = None;
        let mut hreflang = None;
        for param in rest.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            if let Some(value) = param.strip_prefix("rel=") {
                rel = Some(strip_quotes(value).to_ascii_lowercase());
            } else if let Some(value) = param.strip_prefix("hreflang=") {
                hreflang = Some(strip_quotes(value).to_string());
            }
        }
        entries.push(LinkHeaderEntry { url, rel, hreflang });
    }
    entries
}

fn strip_quotes(s: &str) -> &str {
    s.trim().trim_matches('"')
}

fn split_top_level_commas(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, ch) in s.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexable_and_follow_default_true() {
        let (indexable, follow) = robots_directives("", "");
        assert!(indexable);
        assert!(follow);
    }

    #[test]
    fn noindex_in_meta_robots() {
        let (indexable, _) = robots_directives("noindex, follow", "");
        assert!(!indexable);
    }

    #[test]
    fn nofollow_in_x_robots_tag() {
        let (_, follow) = robots_directives("", "nofollow");
        assert!(!follow);
    }

    #[test]
    fn canonical_prefers_html_over_header() {
        let doc = Html::parse_document(r#"<html><head><link rel="canonical" href="/page"/></head></html>"#);
        let base = Url::parse("https://example.com/x").unwrap();
        let canonical = extract_canonical(&doc, &base, Some(r#"<https://example.com/other>; rel="canonical""#));
        assert_eq!(canonical, "https://example.com/page");
    }

    #[test]
    fn canonical_falls_back_to_header() {
        let doc = Html::parse_document("<html><head></head></html>");
        let base = Url::parse("https://example.com/x").unwrap();
        let canonical = extract_canonical(&doc, &base, Some(r#"<https://example.com/other>; rel="canonical""#));
        assert_eq!(canonical, "https://example.com/other");
    }

    #[test]
    fn hreflang_dedupes_html_and_header() {
        let doc = Html::parse_document(
            r#"<html><head><link rel="alternate" hreflang="en" href="/en"/></head></html>"#,
        );
        let base = Url::parse("https://example.com/").unwrap();
        let entries = extract_hreflang(&doc, &base, Some(r#"<https://example.com/en>; rel="alternate"; hreflang="en""#));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].source, HreflangSource::Html);
    }
}
