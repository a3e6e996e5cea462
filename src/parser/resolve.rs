//! URL resolution and external/absolute classification helpers shared by
//! links, images, and hreflang extraction.

use url::Url;

/// Resolve `href` against `base`, returning `None` for unparseable hrefs.
#[must_use]
pub fn resolve(base: &Url, href: &str) -> Option<Url> {
    base.join(href).ok()
}

/// An href is "absolute" per spec if its *original* text (not the resolved
/// form) already names a scheme — i.e. it did not need the base to resolve.
#[must_use]
pub fn is_absolute_href(href: &str) -> bool {
    Url::parse(href).is_ok()
}

/// A small list of common multi-label public suffixes so the naive
/// registrable-domain heuristic below doesn't misclassify `example.co.uk`
/// as external from `other.co.uk`. Not a full public-suffix-list
/// implementation — documented as a known simplification in DESIGN.md.
const MULTI_LABEL_SUFFIXES: &[&str] = &[
    "co.uk", "org.uk", "ac.uk", "gov.uk", "co.jp", "co.kr", "com.au", "com.br", "com.cn",
    "co.nz", "co.za", "com.mx",
];

/// Best-effort registrable domain ("example.com" out of "www.example.com").
#[must_use]
pub fn registrable_domain(host: &str) -> String {
    let host = host.trim_end_matches('.');
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= 2 {
        return host.to_string();
    }
    let last_two = labels[labels.len() - 2..].join(".");
    if MULTI_LABEL_SUFFIXES.contains(&last_two.as_str()) && labels.len() >= 3 {
        return labels[labels.len() - 3..].join(".");
    }
    last_two
}

/// Compare registrable domains of `resolved` against `base`.
#[must_use]
pub fn is_external(base: &Url, resolved: &Url) -> bool {
    match (base.host_str(), resolved.host_str()) {
        (Some(a), Some(b)) => registrable_domain(a) != registrable_domain(b),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_site_subdomain_is_not_external() {
        let base = Url::parse("https://www.example.com/").unwrap();
        let resolved = Url::parse("https://blog.example.com/post").unwrap();
        assert!(!is_external(&base, &resolved));
    }

    #[test]
    fn different_domain_is_external() {
        let base = Url::parse("https://example.com/").unwrap();
        let resolved = Url::parse("https://other.com/").unwrap();
        assert!(is_external(&base, &resolved));
    }

    #[test]
    fn multi_label_suffix_handled() {
        assert_eq!(registrable_domain("www.example.co.uk"), "example.co.uk");
    }
}
