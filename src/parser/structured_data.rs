//! JSON-LD structured data extraction. Invalid blocks are dropped; the
//! parser never fails on malformed input.

use scraper::{Html, Selector};

#[must_use]
pub fn extract_structured_data(doc: &Html) -> Vec<serde_json::Value> {
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#).expect("static selector is valid");
    doc.select(&selector)
        .filter_map(|el| {
            let raw = el.text().collect::<String>();
            serde_json::from_str::<serde_json::Value>(raw.trim()).ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_json_ld() {
        let doc = Html::parse_document(
            r#"<html><head><script type="application/ld+json">{"@type":"Article","headline":"Hi"}</script></head></html>"#,
        );
        let data = extract_structured_data(&doc);
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["@type"], "Article");
    }

    #[test]
    fn drops_invalid_json_ld() {
        let doc = Html::parse_document(
            r#"<html><head><script type="application/ld+json">{not valid json</script></head></html>"#,
        );
        assert!(extract_structured_data(&doc).is_empty());
    }
}
