//! HTTP query service
//!
//! One GET endpoint serves both search and section listing. Each request
//! opens its own read-only store handle, so there is no shared mutable
//! state and a failing request never touches another. User-input oddities
//! (short queries, unknown sort values, non-numeric paging) degrade to
//! defaults instead of erroring; only setup and backend failures produce
//! an error envelope, with detail going to the log rather than the caller.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use axum::routing::get;
use serde::Deserialize;
use serde_json::json;

use crate::config::ServiceConfig;
use crate::search::{self, SearchRequest, SortOrder};
use crate::store::SearchStore;

/// Last-resort body for when even the error envelope fails to encode
const FALLBACK_ERROR_BODY: &str = r#"{"error":"Internal server error"}"#;

/// Raw query parameters, parsed leniently so no input is ever rejected
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub page: Option<String>,
    pub section: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<String>,
    pub action: Option<String>,
}

/// Build the service router
pub fn router(cfg: Arc<ServiceConfig>) -> Router {
    Router::new()
        .route("/api/search", get(handle_search))
        .with_state(cfg)
}

/// Bind and serve until the process is stopped
pub async fn serve(cfg: ServiceConfig, bind: SocketAddr) -> anyhow::Result<()> {
    let app = router(Arc::new(cfg));
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    tracing::info!(%bind, "search service listening");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

async fn handle_search(
    State(cfg): State<Arc<ServiceConfig>>,
    Query(params): Query<SearchParams>,
) -> Response {
    match params.action.as_deref() {
        Some("sections") => sections_response(&cfg).await,
        _ => search_response(&cfg, params).await,
    }
}

async fn search_response(cfg: &ServiceConfig, params: SearchParams) -> Response {
    let store = match SearchStore::open_readonly(&cfg.db_path).await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(error = %e, "failed to open search store");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Search error");
        }
    };

    let request = SearchRequest {
        query: params.q.clone(),
        page: params
            .page
            .as_deref()
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(1),
        section: params.section.clone(),
        sort: SortOrder::from_param(params.sort.as_deref()),
        limit: params.limit.as_deref().and_then(|l| l.trim().parse().ok()),
    };

    match search::execute_search(cfg, &store, &request).await {
        Ok(envelope) => json_response(StatusCode::OK, &envelope),
        Err(e) => {
            tracing::error!(error = %e, query = %params.q, "search request failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Search error")
        }
    }
}

async fn sections_response(cfg: &ServiceConfig) -> Response {
    let sections = match SearchStore::open_readonly(&cfg.db_path).await {
        Ok(store) => store.sections().await,
        Err(e) => Err(e),
    };

    match sections {
        Ok(sections) => json_response(StatusCode::OK, &json!({ "sections": sections })),
        Err(e) => {
            tracing::error!(error = %e, "failed to list sections");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Error getting sections")
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    json_response(status, &json!({ "error": message }))
}

/// Encode a JSON body into a response, falling back to a fixed literal
/// error body if encoding itself fails.
fn json_response<T: serde::Serialize>(status: StatusCode, body: &T) -> Response {
    let (status, bytes) = match serde_json::to_vec(body) {
        Ok(bytes) => (status, bytes),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode response body");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                FALLBACK_ERROR_BODY.as_bytes().to_vec(),
            )
        }
    };

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    response
}
