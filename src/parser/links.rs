//! Link extraction and classification.

use super::dom::collapse_whitespace;
use super::resolve::{is_absolute_href, is_external, resolve};
use super::types::Link;
use scraper::{ElementRef, Selector};
use url::Url;

const SOCIAL_DOMAINS: &[&str] = &[
    "facebook.com", "twitter.com", "x.com", "instagram.com", "linkedin.com", "youtube.com",
    "tiktok.com", "pinterest.com", "reddit.com", "threads.net",
];

#[must_use]
pub fn extract_links(body: ElementRef, base: &Url) -> Vec<Link> {
    let selector = Selector::parse("a[href]").expect("static selector is valid");
    let mut links = Vec::new();

    for anchor in body.select(&selector) {
        let Some(href) = anchor.value().attr("href") else { continue };
        let trimmed = href.trim();
        if trimmed.is_empty()
            || trimmed.starts_with('#')
            || trimmed.starts_with("javascript:")
            || trimmed.starts_with("mailto:")
            || trimmed.starts_with("tel:")
        {
            continue;
        }

        let Some(resolved) = resolve(base, trimmed) else { continue };
        let anchor_text = collapse_whitespace(&super::dom::plain_text(anchor));
        let rel = anchor.value().attr("rel").unwrap_or("");
        let rel_tokens: Vec<&str> = rel.split_whitespace().collect();

        let is_external = is_external(base, &resolved);
        let is_social = resolved
            .host_str()
            .is_some_and(|h| SOCIAL_DOMAINS.iter().any(|d| h == *d || h.ends_with(&format!(".{d}"))));

        let has_image_descendant = {
            let img_selector = Selector::parse("img").expect("static selector is valid");
            anchor.select(&img_selector).next().is_some()
        };

        links.push(Link {
            href: resolved.to_string(),
            anchor_text,
            is_external,
            is_dofollow: !rel_tokens.contains(&"nofollow"),
            is_image_link: has_image_descendant,
            is_absolute: is_absolute_href(trimmed),
            is_social,
            is_ugc: rel_tokens.contains(&"ugc"),
            is_sponsored: rel_tokens.contains(&"sponsored"),
        });
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn body_of(html: &str) -> Html {
        Html::parse_document(html)
    }

    #[test]
    fn skips_fragment_and_javascript_links() {
        let doc = body_of(
            r##"<html><body>
                <a href="#section">skip</a>
                <a href="javascript:void(0)">skip</a>
                <a href="mailto:a@example.com">skip</a>
                <a href="/about">About</a>
            </body></html>"##,
        );
        let body_sel = Selector::parse("body").unwrap();
        let body = doc.select(&body_sel).next().unwrap();
        let base = Url::parse("https://example.com/").unwrap();
        let links = extract_links(body, &base);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].href, "https://example.com/about");
    }

    #[test]
    fn classifies_nofollow_and_image_link() {
        let doc = body_of(
            r#"<html><body>
                <a href="https://other.com" rel="nofollow"><img src="x.png"/></a>
            </body></html>"#,
        );
        let body_sel = Selector::parse("body").unwrap();
        let body = doc.select(&body_sel).next().unwrap();
        let base = Url::parse("https://example.com/").unwrap();
        let links = extract_links(body, &base);
        assert_eq!(links.len(), 1);
        assert!(!links[0].is_dofollow);
        assert!(links[0].is_image_link);
        assert!(links[0].is_external);
    }
}
