//! Wire shapes for `/api/ext/render` and `/api/ext/compare`. Requests
//! reject unknown fields; success responses omit opt-in fields entirely
//! rather than serializing them as null.

use crate::parser::{HreflangEntry, Image, Link, Section};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderRequestDto {
    pub url: String,
    #[serde(default)]
    pub js_enabled: bool,
    #[serde(default = "default_true")]
    pub follow_redirects: bool,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub timeout: u64,
    #[serde(default)]
    pub wait_event: Option<String>,
    #[serde(default)]
    pub block_analytics: bool,
    #[serde(default)]
    pub block_ads: bool,
    #[serde(default)]
    pub block_social: bool,
    #[serde(default)]
    pub blocked_resource_types: Vec<String>,
    #[serde(default)]
    pub max_content_length: usize,
    #[serde(default)]
    pub include_html: bool,
    #[serde(default)]
    pub include_text: bool,
    #[serde(default)]
    pub include_markdown: bool,
    #[serde(default)]
    pub include_sections: bool,
    #[serde(default)]
    pub include_links: bool,
    #[serde(default)]
    pub include_images: bool,
    #[serde(default)]
    pub include_structured_data: bool,
    #[serde(default)]
    pub include_screenshot: bool,
    #[serde(default)]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompareRequestDto {
    pub url: String,
    #[serde(default = "default_true")]
    pub follow_redirects: bool,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub timeout: u64,
    #[serde(default)]
    pub wait_event: Option<String>,
    #[serde(default)]
    pub block_analytics: bool,
    #[serde(default)]
    pub block_ads: bool,
    #[serde(default)]
    pub block_social: bool,
    #[serde(default)]
    pub blocked_resource_types: Vec<String>,
    #[serde(default)]
    pub max_content_length: usize,
    #[serde(default)]
    pub max_diff_length: usize,
    #[serde(default)]
    pub include_html: bool,
    #[serde(default)]
    pub include_text: bool,
    #[serde(default)]
    pub include_markdown: bool,
    #[serde(default)]
    pub include_sections: bool,
    #[serde(default)]
    pub include_links: bool,
    #[serde(default)]
    pub include_images: bool,
    #[serde(default)]
    pub include_structured_data: bool,
    #[serde(default)]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderResponseData {
    pub status_code: Option<u16>,
    pub final_url: String,
    pub redirect_url: Option<String>,
    pub canonical_url: String,
    pub page_size_bytes: u64,
    pub render_time: f64,
    pub meta_robots: String,
    pub x_robots_tag: String,
    pub meta_indexable: bool,
    pub meta_follow: bool,
    pub title: String,
    pub meta_description: String,
    pub h1: Vec<String>,
    pub h2: Vec<String>,
    pub h3: Vec<String>,
    pub word_count: usize,
    pub text_html_ratio: f64,
    pub open_graph: BTreeMap<String, String>,
    pub hreflang: Vec<HreflangEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_text_tokens_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_markdown: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<Section>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<Link>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<Image>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_data: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchStatus {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompareResponseData {
    pub js_status: FetchStatus,
    pub http_status: FetchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub js: Option<RenderResponseData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<crate::compare::diff::Diff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rendering_impact: Option<crate::compare::diff::RenderingImpact>,
}

#[derive(Debug, Serialize)]
pub struct SuccessBody<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> SuccessBody<T> {
    #[must_use]
    pub fn new(data: T) -> Self {
        Self { success: true, data }
    }
}
