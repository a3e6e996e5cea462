//! URL shape, timeout range, and wait-event token validation, shared
//! verbatim between the render and compare paths — compare runs this once
//! against its shared parameters rather than once per leg. Method, API key,
//! body size, and JSON decoding happen in the HTTP layer; SSRF and DNS
//! checks live in [`super::ssrf`], since all of those need header or
//! transport access this module doesn't have.

use crate::blocklist::{Blocklist, ResourceType};
use crate::errors::RenderError;
use crate::renderer::WaitEvent;
use crate::utils::resolve_user_agent;
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, Default)]
pub struct IncludeFlags {
    pub html: bool,
    pub text: bool,
    pub markdown: bool,
    pub sections: bool,
    pub links: bool,
    pub images: bool,
    pub structured_data: bool,
    pub screenshot: bool,
}

pub struct CommonParams {
    pub url: Url,
    pub user_agent: String,
    pub timeout: Duration,
    pub wait_event: WaitEvent,
    pub follow_redirects: bool,
    pub blocklist: Blocklist,
    pub max_content_length: usize,
    pub include: IncludeFlags,
    pub request_id: Option<String>,
}

/// Validate and normalize the fields shared by a render request and a
/// compare request's common parameters.
#[allow(clippy::too_many_arguments)]
pub fn normalize_common(
    url: &str,
    follow_redirects: bool,
    user_agent: Option<&str>,
    timeout: u64,
    wait_event: Option<&str>,
    block_analytics: bool,
    block_ads: bool,
    block_social: bool,
    blocked_resource_types: &[String],
    max_content_length: usize,
    include: IncludeFlags,
    request_id: Option<String>,
) -> Result<CommonParams, RenderError> {
    let parsed = parse_url(url)?;

    let timeout_secs = if timeout == 0 { DEFAULT_TIMEOUT_SECS } else { timeout };
    if !(1..=60).contains(&timeout_secs) {
        return Err(RenderError::InvalidTimeout);
    }

    let wait_event = match wait_event {
        None => WaitEvent::Load,
        Some(raw) => WaitEvent::parse(raw).ok_or(RenderError::InvalidWaitEvent)?,
    };

    let mut types = HashSet::new();
    for raw in blocked_resource_types {
        let resource_type = match raw.as_str() {
            "image" => ResourceType::Image,
            "font" => ResourceType::Font,
            "stylesheet" => ResourceType::Stylesheet,
            "script" => ResourceType::Script,
            "xhr" => ResourceType::Xhr,
            "fetch" => ResourceType::Fetch,
            other => return Err(RenderError::InvalidRequestBody(format!("unknown resource type: {other}"))),
        };
        types.insert(resource_type);
    }

    let user_agent = resolve_user_agent(user_agent.unwrap_or("chrome")).to_string();

    Ok(CommonParams {
        url: parsed,
        user_agent,
        timeout: Duration::from_secs(timeout_secs),
        wait_event,
        follow_redirects,
        blocklist: Blocklist::new(block_analytics, block_ads, block_social, types),
        max_content_length,
        include,
        request_id,
    })
}

fn parse_url(raw: &str) -> Result<Url, RenderError> {
    let url = Url::parse(raw).map_err(|_| RenderError::InvalidUrl(raw.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(RenderError::InvalidUrl(raw.to_string()));
    }
    if url.host_str().is_none() {
        return Err(RenderError::InvalidUrl(raw.to_string()));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(url: &str, timeout: u64, wait_event: Option<&str>) -> Result<CommonParams, RenderError> {
        normalize_common(url, true, None, timeout, wait_event, false, false, false, &[], 0, IncludeFlags::default(), None)
    }

    #[test]
    fn rejects_non_http_scheme() {
        assert!(matches!(params("ftp://example.com", 0, None), Err(RenderError::InvalidUrl(_))));
    }

    #[test]
    fn zero_timeout_uses_default() {
        let p = params("https://example.com", 0, None).unwrap();
        assert_eq!(p.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn timeout_boundaries() {
        assert!(params("https://example.com", 1, None).is_ok());
        assert!(matches!(params("https://example.com", 61, None), Err(RenderError::InvalidTimeout)));
    }

    #[test]
    fn unknown_wait_event_rejected() {
        assert!(matches!(params("https://example.com", 0, Some("bogus")), Err(RenderError::InvalidWaitEvent)));
    }
}
