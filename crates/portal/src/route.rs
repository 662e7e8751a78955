//! HTTP surface: one analysis endpoint plus health.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use engine::{Catalog, LogDocument};

use crate::config::PortalConfig;
use crate::fetch::{Fetcher, PasteHost};
use crate::render;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<PortalConfig>,
    pub fetcher: Arc<Fetcher>,
    pub catalog: Arc<Catalog>,
}

impl AppState {
    pub fn new(config: PortalConfig, fetcher: Fetcher) -> Self {
        Self {
            config: Arc::new(config),
            fetcher: Arc::new(fetcher),
            catalog: Arc::new(Catalog::default()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeQuery {
    url: Option<String>,
    detailed: Option<String>,
}

pub fn build_router(state: AppState) -> Router {
    let request_timeout = Duration::from_secs(state.config.server.request_timeout_secs);
    let max_body = state.config.server.max_body_bytes;

    Router::new()
        .route("/", get(analyze_handler))
        .route("/health", get(health_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    request_timeout,
                ))
                .layer(DefaultBodyLimit::max(max_body)),
        )
        .with_state(state)
}

/// GET / — analyze the log behind `url`.
///
/// A missing or unrecognized URL yields an empty object rather than an
/// error, so callers can probe URLs cheaply. `detailed=true` switches the
/// per-finding entries from bare titles to title + details.
async fn analyze_handler(
    State(state): State<AppState>,
    Query(params): Query<AnalyzeQuery>,
) -> impl IntoResponse {
    let detailed = params.detailed.as_deref() == Some("true");
    let Some(url) = params.url else {
        return Json(json!({})).into_response();
    };
    let Some(host) = PasteHost::classify(&url) else {
        info!(%url, "unsupported url");
        return Json(json!({})).into_response();
    };

    let text = match state.fetcher.fetch(&host).await {
        Ok(text) => text,
        Err(err) => {
            warn!(%url, error = %err, "fetch failed");
            return (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response();
        }
    };

    // Rule evaluation is pure CPU; keep it off the async workers.
    let catalog = state.catalog.clone();
    let result = tokio::task::spawn_blocking(move || {
        let doc = LogDocument::from_text(&text);
        let report = engine::run(&doc, &catalog);
        render::to_json(&report, detailed)
    })
    .await;

    match result {
        Ok(value) => Json(value).into_response(),
        Err(err) => {
            warn!(error = %err, "analysis task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "analysis failed" })),
            )
                .into_response()
        }
    }
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
