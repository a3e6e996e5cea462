//! Fan a JS render and an HTTP render out in parallel over the same
//! validated parameters, then join, diff, and classify. Validation runs
//! once against the shared parameters rather than once per leg, so this
//! module borrows [`crate::orchestrator`]'s dispatch
//! [`Engine`](crate::orchestrator::Engine) rather than duplicating it.

pub mod diff;

use crate::errors::RenderError;
use crate::events::{ProgressBus, ProgressEvent};
use crate::orchestrator::dto::{CompareRequestDto, CompareResponseData, FetchStatus};
use crate::orchestrator::validate::{self, IncludeFlags};
use crate::orchestrator::{self, Engine};

pub async fn handle_compare(engine: &Engine, progress: &ProgressBus, body: &[u8]) -> Result<CompareResponseData, RenderError> {
    if body.len() > orchestrator::MAX_BODY_BYTES {
        return Err(RenderError::InvalidRequestBody(format!("body exceeds {} bytes", orchestrator::MAX_BODY_BYTES)));
    }
    let req: CompareRequestDto =
        serde_json::from_slice(body).map_err(|e| RenderError::InvalidRequestBody(e.to_string()))?;

    let include = IncludeFlags {
        html: req.include_html,
        text: req.include_text,
        markdown: req.include_markdown,
        sections: req.include_sections,
        links: req.include_links,
        images: req.include_images,
        structured_data: req.include_structured_data,
        screenshot: false,
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
    orchestrator::ssrf::check_host(&params.url).await?;

    if let Some(id) = &params.request_id {
        progress.publish(id, ProgressEvent::Started { url: params.url.to_string() });
    }

    // Independent cancellation per leg: each future owns its own acquire/
    // fetch/timeout chain, so one leg failing never aborts the other.
    let (js_outcome, http_outcome) = tokio::join!(engine.execute(&params, true), engine.execute(&params, false));

    let js_status = fetch_status(&js_outcome);
    let http_status = fetch_status(&http_outcome);

    let (js, diff, rendering_impact) = match (js_outcome, http_outcome) {
        (Ok((js_parsed, js_meta)), Ok((http_parsed, _http_meta))) => {
            let wc_js = js_parsed.word_count;
            let wc_non_js = http_parsed.word_count;
            let computed_diff = diff::compute(&js_parsed, &http_parsed, req.max_diff_length);
            let impact = diff::classify(&computed_diff, wc_js, wc_non_js);
            let js_data = orchestrator::assemble_response(include, params.max_content_length, js_parsed, js_meta);
            (Some(js_data), Some(computed_diff), Some(impact))
        }
        (Ok((js_parsed, js_meta)), Err(_)) => {
            let js_data = orchestrator::assemble_response(include, params.max_content_length, js_parsed, js_meta);
            (Some(js_data), None, None)
        }
        (Err(_), _) => (None, None, None),
    };

    let response = CompareResponseData { js_status, http_status, js, diff, rendering_impact };

    if let Some(id) = &params.request_id {
        let render_time = response.js.as_ref().map_or(0.0, |j| j.render_time);
        progress.publish(id, ProgressEvent::Complete { render_time });
    }

    Ok(response)
}

fn fetch_status<T>(result: &Result<T, RenderError>) -> FetchStatus {
    match result {
        Ok(_) => FetchStatus { success: true, error_code: None, error_message: None },
        Err(e) => FetchStatus { success: false, error_code: Some(e.code()), error_message: Some(e.public_message()) },
    }
}
