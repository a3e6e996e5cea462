//! The `ParseResult` data model of §3, produced by [`crate::parser::parse`].

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct HreflangEntry {
    pub lang: String,
    pub url: String,
    pub source: HreflangSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HreflangSource {
    Html,
    Header,
}

#[derive(Debug, Clone, Serialize)]
pub struct Link {
    pub href: String,
    pub anchor_text: String,
    pub is_external: bool,
    pub is_dofollow: bool,
    pub is_image_link: bool,
    pub is_absolute: bool,
    pub is_social: bool,
    pub is_ugc: bool,
    pub is_sponsored: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Image {
    pub src: String,
    pub alt: String,
    pub is_external: bool,
    pub is_absolute: bool,
    pub is_in_link: bool,
    pub link_href: Option<String>,
    pub size: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub id: String,
    pub heading_level: u8,
    pub heading_text: String,
    pub body_markdown: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ParseResult {
    pub title: String,
    pub meta_description: String,
    pub meta_robots: String,
    pub meta_indexable: bool,
    pub meta_follow: bool,
    pub x_robots_tag: String,
    pub canonical_url: String,
    pub h1: Vec<String>,
    pub h2: Vec<String>,
    pub h3: Vec<String>,
    pub open_graph: std::collections::BTreeMap<String, String>,
    pub structured_data: Vec<serde_json::Value>,
    pub hreflang: Vec<HreflangEntry>,
    pub links: Vec<Link>,
    pub images: Vec<Image>,
    pub body_text: String,
    pub body_markdown: String,
    pub sections: Vec<Section>,
    pub text_html_ratio: f64,
    pub word_count: usize,
}
