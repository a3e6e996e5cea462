//! Per-request decision on whether to abort an in-flight browser request,
//! based on category flags (analytics/ads/social) and an exact
//! resource-type set. Decisions are taken before the request goes out, so
//! this is a pure function over (url, resource_type) with no I/O.

use std::collections::HashSet;

/// Resource type as declared by the browser's network stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Image,
    Font,
    Stylesheet,
    Script,
    Xhr,
    Fetch,
    Other,
}

impl ResourceType {
    /// Map a CDP `Network.ResourceType` string to our closed set.
    #[must_use]
    pub fn from_cdp(raw: &str) -> Self {
        match raw {
            "Image" => Self::Image,
            "Font" => Self::Font,
            "Stylesheet" => Self::Stylesheet,
            "Script" => Self::Script,
            "XHR" => Self::Xhr,
            "Fetch" => Self::Fetch,
            _ => Self::Other,
        }
    }
}

const ANALYTICS_HOSTS: &[&str] = &[
    "google-analytics.com",
    "googletagmanager.com",
    "analytics.google.com",
    "segment.io",
    "segment.com",
    "mixpanel.com",
    "amplitude.com",
    "hotjar.com",
    "fullstory.com",
    "heap.io",
    "matomo.cloud",
    "plausible.io",
];

const ADS_HOSTS: &[&str] = &[
    "doubleclick.net",
    "googlesyndication.com",
    "googleadservices.com",
    "adsystem.com",
    "adnxs.com",
    "taboola.com",
    "outbrain.com",
    "criteo.com",
    "pubmatic.com",
    "rubiconproject.com",
];

const SOCIAL_HOSTS: &[&str] = &[
    "facebook.net",
    "connect.facebook.net",
    "platform.twitter.com",
    "twitter.com/widgets",
    "platform.linkedin.com",
    "platform.instagram.com",
    "tiktok.com/embed",
    "assets.pinterest.com",
];

#[derive(Debug, Clone)]
pub struct Blocklist {
    block_analytics: bool,
    block_ads: bool,
    block_social: bool,
    blocked_resource_types: HashSet<ResourceType>,
}

impl Blocklist {
    #[must_use]
    pub fn new(
        block_analytics: bool,
        block_ads: bool,
        block_social: bool,
        blocked_resource_types: HashSet<ResourceType>,
    ) -> Self {
        Self {
            block_analytics,
            block_ads,
            block_social,
            blocked_resource_types,
        }
    }

    /// Decide whether a request should be aborted before it goes out.
    #[must_use]
    pub fn should_block(&self, url: &str, resource_type: ResourceType) -> bool {
        if self.blocked_resource_types.contains(&resource_type) {
            return true;
        }
        let host = extract_host(url);
        let Some(host) = host else { return false };

        (self.block_analytics && host_matches(&host, ANALYTICS_HOSTS))
            || (self.block_ads && host_matches(&host, ADS_HOSTS))
            || (self.block_social && host_matches(&host, SOCIAL_HOSTS))
    }
}

fn extract_host(url: &str) -> Option<String> {
    url::Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_lowercase))
}

fn host_matches(host: &str, list: &[&str]) -> bool {
    list.iter().any(|needle| host.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocklist(analytics: bool, ads: bool, social: bool) -> Blocklist {
        Blocklist::new(analytics, ads, social, HashSet::new())
    }

    #[test]
    fn blocks_known_analytics_host() {
        let bl = blocklist(true, false, false);
        assert!(bl.should_block("https://www.google-analytics.com/collect", ResourceType::Xhr));
    }

    #[test]
    fn does_not_block_when_flag_unset() {
        let bl = blocklist(false, false, false);
        assert!(!bl.should_block("https://www.google-analytics.com/collect", ResourceType::Xhr));
    }

    #[test]
    fn blocks_exact_resource_type() {
        let mut types = HashSet::new();
        types.insert(ResourceType::Image);
        let bl = Blocklist::new(false, false, false, types);
        assert!(bl.should_block("https://example.com/logo.png", ResourceType::Image));
        assert!(!bl.should_block("https://example.com/app.js", ResourceType::Script));
    }

    #[test]
    fn allows_unrelated_host() {
        let bl = blocklist(true, true, true);
        assert!(!bl.should_block("https://example.com/app.js", ResourceType::Script));
    }
}
