//! Image extraction and classification.
//!
//! `size` is left at 0 here; the orchestrator fills it in from the network
//! capture (JS mode only) by matching absolute URL, per the §3 invariant.

use super::resolve::{is_absolute_href, is_external, resolve};
use super::types::Image;
use scraper::{ElementRef, Selector};
use url::Url;

#[must_use]
pub fn extract_images(body: ElementRef, base: &Url) -> Vec<Image> {
    let selector = Selector::parse("img[src]").expect("static selector is valid");
    let a_selector = Selector::parse("a").expect("static selector is valid");
    let mut images = Vec::new();

    for img in body.select(&selector) {
        let Some(src) = img.value().attr("src") else { continue };
        if src.trim().is_empty() {
            continue;
        }
        let Some(resolved) = resolve(base, src.trim()) else { continue };

        let enclosing_anchor = img
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| a_selector.matches(el));
        let link_href = enclosing_anchor
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| resolve(base, href))
            .map(|u| u.to_string());

        images.push(Image {
            src: resolved.to_string(),
            alt: img.value().attr("alt").unwrap_or("").to_string(),
            is_external: is_external(base, &resolved),
            is_absolute: is_absolute_href(src.trim()),
            is_in_link: link_href.is_some(),
            link_href,
            size: 0,
        });
    }

    images
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn detects_image_inside_link() {
        let doc = Html::parse_document(
            r#"<html><body><a href="/gallery"><img src="/x.png" alt="x"/></a></body></html>"#,
        );
        let body = doc.select(&Selector::parse("body").unwrap()).next().unwrap();
        let base = Url::parse("https://example.com/").unwrap();
        let images = extract_images(body, &base);
        assert_eq!(images.len(), 1);
        assert!(images[0].is_in_link);
        assert_eq!(images[0].link_href.as_deref(), Some("https://example.com/gallery"));
    }

    #[test]
    fn skips_empty_src() {
        let doc = Html::parse_document(r#"<html><body><img src=""/></body></html>"#);
        let body = doc.select(&Selector::parse("body").unwrap()).next().unwrap();
        let base = Url::parse("https://example.com/").unwrap();
        assert!(extract_images(body, &base).is_empty());
    }
}
