//! Router assembly and the two POST handlers. Method checking comes for
//! free: axum's `MethodRouter` answers non-POST verbs on a POST-only route
//! with 405 before the handler ever runs. The API key check happens here,
//! ahead of `Orchestrator`/`compare`, since it needs header access those
//! layers don't take.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::sse::Sse;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use std::convert::Infallible;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::compare;
use crate::config::ApiConfig;
use crate::errors::RenderError;
use crate::events::ProgressBus;
use crate::orchestrator::dto::SuccessBody;
use crate::orchestrator::Orchestrator;

use super::sse::progress_stream;

pub struct AppState {
    pub orchestrator: Orchestrator,
    pub progress: Arc<ProgressBus>,
    pub api: ApiConfig,
}

#[must_use]
pub fn router(state: Arc<AppState>, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/api/ext/render", post(render_handler))
        .route("/api/ext/compare", post(compare_handler))
        .route("/api/ext/progress/{request_id}", get(progress_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods([axum::http::Method::GET, axum::http::Method::POST]).allow_headers([
        axum::http::header::CONTENT_TYPE,
        axum::http::HeaderName::from_static("x-api-key"),
    ]);
    if origins.iter().any(|o| o == "*") {
        layer.allow_origin(AllowOrigin::any())
    } else {
        let parsed: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        layer.allow_origin(parsed)
    }
}

/// Validation step 2: header presence and set membership are distinguished
/// (`ApiKeyRequired` vs `ApiKeyInvalid`); disabled auth skips the check.
fn check_api_key(api: &ApiConfig, headers: &HeaderMap) -> Result<(), RenderError> {
    if !api.enabled {
        return Ok(());
    }
    let Some(value) = headers.get("x-api-key").and_then(|v| v.to_str().ok()) else {
        return Err(RenderError::ApiKeyRequired);
    };
    if crate::auth::is_valid_api_key(api, value) {
        Ok(())
    } else {
        Err(RenderError::ApiKeyInvalid)
    }
}

async fn render_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, RenderError> {
    check_api_key(&state.api, &headers)?;
    let data = state.orchestrator.handle_render(&body).await?;
    Ok(Json(SuccessBody::new(data)))
}

async fn compare_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, RenderError> {
    check_api_key(&state.api, &headers)?;
    let data = compare::handle_compare(state.orchestrator.engine(), &state.progress, &body).await?;
    Ok(Json(SuccessBody::new(data)))
}

/// Supplemental endpoint, not in the spec's HTTP surface table but implied
/// by §4.10/§9's mention of an SSE handler for [`ProgressBus`] subscription
/// — without it `request_id` has no observable effect from outside the process.
async fn progress_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(request_id): Path<String>,
) -> Result<Sse<impl futures_util::Stream<Item = Result<axum::response::sse::Event, Infallible>>>, RenderError> {
    check_api_key(&state.api, &headers)?;
    Ok(progress_stream(&state.progress, request_id))
}
