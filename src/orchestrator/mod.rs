//! Validates, dispatches to the browser pool+renderer or the HTTP fetcher,
//! assembles the response, and publishes progress. [`Engine`] holds the
//! dispatch logic shared with the compare engine, which fans the same two
//! paths out in parallel instead of choosing one.

pub mod dto;
pub mod ssrf;
pub mod truncate;
pub mod validate;

use crate::browser::{AcquireError, InstancePool};
use crate::errors::RenderError;
use crate::events::{ProgressBus, ProgressEvent};
use crate::fetcher::HttpFetcher;
use crate::parser::{self, ParseResult};
use crate::renderer::{self, RenderOptions};
use crate::screenshot_store::ScreenshotStore;
use base64::Engine as _;
use dto::{RenderRequestDto, RenderResponseData};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;
use url::Url;
use validate::{CommonParams, IncludeFlags};

pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Transport-layer facts about a completed render, independent of which
/// path (JS or HTTP) produced them.
pub struct TransportMeta {
    pub status_code: Option<u16>,
    pub final_url: String,
    pub redirect_url: Option<String>,
    pub page_size_bytes: u64,
    pub render_time: f64,
    pub screenshot: Option<Vec<u8>>,
    /// Id under which `screenshot`, if present, was persisted to the
    /// screenshot blob store. Not part of the public response; exists so
    /// non-core callers can fetch the same bytes by id later.
    pub screenshot_id: Option<String>,
    pub network_request_count: usize,
    /// Raw document served to the parser: the post-JS DOM in JS mode, or
    /// the raw HTTP response body otherwise. Only surfaced when `include.html`.
    pub html: String,
}

/// Given validated parameters, run either the JS or the HTTP path and feed
/// the result through the parser.
pub struct Engine {
    pool: Arc<InstancePool>,
    fetcher: HttpFetcher,
    screenshots: Arc<ScreenshotStore>,
}

impl Engine {
    #[must_use]
    pub fn new(pool: Arc<InstancePool>, fetcher: HttpFetcher, screenshots: Arc<ScreenshotStore>) -> Self {
        Self { pool, fetcher, screenshots }
    }

    pub async fn execute(&self, params: &CommonParams, js_enabled: bool) -> Result<(ParseResult, TransportMeta), RenderError> {
        if js_enabled {
            self.execute_js(params).await
        } else {
            self.execute_http(params).await
        }
    }

    async fn execute_js(&self, params: &CommonParams) -> Result<(ParseResult, TransportMeta), RenderError> {
        let pooled = self.pool.acquire().await.map_err(|e| match e {
            AcquireError::NoInstanceAvailable => RenderError::PoolExhausted,
            AcquireError::PoolShuttingDown => RenderError::PoolShuttingDown,
        })?;

        let opts = RenderOptions {
            user_agent: params.user_agent.clone(),
            timeout: params.timeout,
            wait_event: params.wait_event,
            blocklist: params.blocklist.clone(),
            include_screenshot: params.include.screenshot,
        };
        let render_result = renderer::render(pooled.page(), params.url.as_str(), &opts).await;
        // Counted as a completed render on every terminal outcome, including
        // a timeout, so the pool's use-count accounting stays accurate.
        pooled.release_completed();
        let render_result = render_result?;

        let final_url = Url::parse(&render_result.final_url).unwrap_or_else(|_| params.url.clone());
        let mut parsed = parser::parse(&render_result.html, &final_url, None, None);
        parser::patch_image_sizes(&mut parsed.images, &render_result.telemetry.network);

        let network_request_count = render_result.telemetry.network.len();
        let screenshot_id = render_result.screenshot.as_ref().map(|bytes| {
            let id = self.screenshots.put(bytes.clone());
            debug!(screenshot_id = %id, "stored captured screenshot");
            id
        });
        Ok((
            parsed,
            TransportMeta {
                status_code: render_result.status_code,
                final_url: render_result.final_url,
                redirect_url: render_result.redirect_url,
                page_size_bytes: render_result.page_size_bytes,
                render_time: render_result.render_time,
                screenshot: render_result.screenshot,
                screenshot_id,
                network_request_count,
                html: render_result.html,
            },
        ))
    }

    async fn execute_http(&self, params: &CommonParams) -> Result<(ParseResult, TransportMeta), RenderError> {
        let start = Instant::now();
        let fetch_result = self
            .fetcher
            .fetch(params.url.as_str(), &params.user_agent, params.timeout, params.follow_redirects)
            .await?;
        let render_time = start.elapsed().as_secs_f64();

        let body = String::from_utf8_lossy(&fetch_result.body).into_owned();
        let final_url = Url::parse(&fetch_result.final_url).unwrap_or_else(|_| params.url.clone());
        let x_robots_tag = fetch_result.headers.get("x-robots-tag").and_then(|v| v.to_str().ok());
        let link_header = fetch_result.headers.get("link").and_then(|v| v.to_str().ok());
        let parsed = parser::parse(&body, &final_url, x_robots_tag, link_header);

        Ok((
            parsed,
            TransportMeta {
                status_code: Some(fetch_result.status_code),
                final_url: fetch_result.final_url,
                redirect_url: fetch_result.redirect_url,
                page_size_bytes: body.len() as u64,
                render_time,
                screenshot: None,
                screenshot_id: None,
                network_request_count: 0,
                html: body,
            },
        ))
    }
}

/// Assemble the always-present + opt-in response fields, applying
/// `max_content_length` truncation.
#[must_use]
pub fn assemble_response(include: IncludeFlags, max_content_length: usize, parsed: ParseResult, meta: TransportMeta) -> RenderResponseData {
    // word_count always reflects the truncated body text, even when
    // include.text is false and body_text itself never appears in the
    // response.
    let truncated_body_text = truncate::truncate_text(&parsed.body_text, max_content_length);
    let word_count = truncated_body_text.split_whitespace().count();
    let body_text = include.text.then_some(truncated_body_text);
    let body_text_tokens_count = body_text.as_deref().map(|t| t.split_whitespace().count());
    let body_markdown = include.markdown.then(|| truncate::truncate_text(&parsed.body_markdown, max_content_length));
    let html = include.html.then(|| truncate::truncate_text(&meta.html, max_content_length));
    let screenshot = include
        .screenshot
        .then(|| meta.screenshot.as_deref().map(|bytes| base64::engine::general_purpose::STANDARD.encode(bytes)))
        .flatten();

    RenderResponseData {
        status_code: meta.status_code,
        final_url: meta.final_url,
        redirect_url: meta.redirect_url,
        canonical_url: parsed.canonical_url,
        page_size_bytes: meta.page_size_bytes,
        render_time: meta.render_time,
        meta_robots: parsed.meta_robots,
        x_robots_tag: parsed.x_robots_tag,
        meta_indexable: parsed.meta_indexable,
        meta_follow: parsed.meta_follow,
        title: parsed.title,
        meta_description: parsed.meta_description,
        h1: parsed.h1,
        h2: parsed.h2,
        h3: parsed.h3,
        word_count,
        text_html_ratio: parsed.text_html_ratio,
        open_graph: parsed.open_graph,
        hreflang: parsed.hreflang,
        html,
        body_text,
        body_text_tokens_count,
        body_markdown,
        sections: include.sections.then(|| truncate::truncate_sections(&parsed.sections, max_content_length)),
        links: include.links.then_some(parsed.links),
        images: include.images.then_some(parsed.images),
        structured_data: include.structured_data.then_some(parsed.structured_data),
        screenshot,
    }
}

pub struct Orchestrator {
    engine: Engine,
    progress: Arc<ProgressBus>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(pool: Arc<InstancePool>, fetcher: HttpFetcher, progress: Arc<ProgressBus>, screenshots: Arc<ScreenshotStore>) -> Self {
        Self { engine: Engine::new(pool, fetcher, screenshots), progress }
    }

    #[must_use]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Validation steps 3-9 plus dispatch and response assembly. Steps 1-2
    /// (method, API key) are handled by the HTTP layer before this is
    /// called, since they need header/verb access this function doesn't have.
    pub async fn handle_render(&self, body: &[u8]) -> Result<RenderResponseData, RenderError> {
        if body.len() > MAX_BODY_BYTES {
            return Err(RenderError::InvalidRequestBody(format!("body exceeds {MAX_BODY_BYTES} bytes")));
        }
        let req: RenderRequestDto =
            serde_json::from_slice(body).map_err(|e| RenderError::InvalidRequestBody(e.to_string()))?;

        let include = IncludeFlags {
            html: req.include_html,
            text: req.include_text,
            markdown: req.include_markdown,
            sections: req.include_sections,
            links: req.include_links,
            images: req.include_images,
            structured_data: req.include_structured_data,
            screenshot: req.include_screenshot,
        };
        let params = validate::normalize_common(
            &req.url,
            req.follow_redirects,
            req.user_agent.as_deref(),
            req.timeout,
            req.wait_event.as_deref(),
            req.block_analytics,
            req.block_ads,
            req.block_social,
            &req.blocked_resource_types,
            req.max_content_length,
            include,
            req.request_id.clone(),
        )?;
        ssrf::check_host(&params.url).await?;

        if let Some(id) = &params.request_id {
            self.progress.publish(id, ProgressEvent::Started { url: params.url.to_string() });
        }

        let outcome = self.run(&params, req.js_enabled, include).await;

        if let Some(id) = &params.request_id {
            match &outcome {
                Ok(data) => self.progress.publish(id, ProgressEvent::Complete { render_time: data.render_time }),
                Err(e) => self.progress.publish(id, ProgressEvent::Error { code: e.code().to_string(), message: e.public_message() }),
            }
        }

        outcome
    }

    async fn run(&self, params: &CommonParams, js_enabled: bool, include: IncludeFlags) -> Result<RenderResponseData, RenderError> {
        if let Some(id) = &params.request_id {
            self.progress.publish(id, ProgressEvent::Navigating { url: params.url.to_string() });
        }
        let (parsed, meta) = self.engine.execute(params, js_enabled).await?;

        if let Some(id) = &params.request_id {
            self.progress.publish(id, ProgressEvent::Capturing { request_count: meta.network_request_count });
            self.progress.publish(id, ProgressEvent::Parsing {});
        }

        // include_screenshot is silently ignored in HTTP mode: the HTTP path
        // never produces `meta.screenshot`, so gating on `include.screenshot`
        // alone already yields that behavior.
        Ok(assemble_response(include, params.max_content_length, parsed, meta))
    }
}