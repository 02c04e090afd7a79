//! HTTP surface of the smart-search backend.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Embedded search page |
//! | `GET`  | `/search?q=` | Type-ahead search across the configured alias |
//! | `GET`  | `/details?id=&type=&index=` | Record fetch plus generated summary |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! Failures answer with a flat JSON body:
//!
//! ```json
//! { "error": "Record not found in plan_1" }
//! ```
//!
//! `/search` failures additionally carry `"results": []` so type-ahead
//! clients can render an empty list without special-casing the error shape.
//! Validation problems map to 400, a missing document to 404, backend
//! failures to 500. A failed summarization never fails the request — the
//! record comes back with a placeholder summary.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use crate::backend::{self, BackendError, SearchBackend};
use crate::config::Config;
use crate::models::{result_from_hit, RecordType, SearchResult};
use crate::summarize::{Summarizer, SUMMARY_UNAVAILABLE};

/// Queries shorter than this never reach the backend, so partial keystrokes
/// don't fan out into high-cardinality searches.
const MIN_QUERY_CHARS: usize = 3;
/// Hit cap for type-ahead results.
const MAX_SEARCH_HITS: usize = 10;
/// Most recent communication events considered per member.
const MAX_EVENTS: usize = 5;

/// Shared application state passed to all route handlers via Axum's `State`
/// extractor. Constructed once at startup; every field is read-only from
/// then on.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub backend: Arc<dyn SearchBackend>,
    pub summarizer: Arc<dyn Summarizer>,
}

/// Build the application router. Split out from [`run_server`] so tests can
/// drive the real routes against mock state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_index))
        .route("/search", get(handle_search))
        .route("/details", get(handle_details))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

/// Bind the configured address and serve requests until the process is
/// terminated.
pub async fn run_server(bind: &str, state: AppState) -> anyhow::Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(addr = %bind, "smart-search listening");
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// Error that converts into an Axum HTTP response with a flat
/// `{"error": message}` body.
struct AppError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

/// Constructs a 400 Bad Request error.
fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        message: message.into(),
    }
}

/// Constructs a 404 Not Found error.
fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        message: message.into(),
    }
}

/// Constructs a 500 Internal Server Error.
fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: message.into(),
    }
}

// ============ GET / ============

/// Handler for `GET /`. Serves the embedded search page.
async fn handle_index() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /search ============

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

/// JSON response body for `GET /search`.
#[derive(Serialize)]
struct SearchResponse {
    results: Vec<SearchResult>,
}

#[derive(Serialize)]
struct SearchErrorResponse {
    error: String,
    results: Vec<SearchResult>,
}

/// Handler for `GET /search`.
///
/// Type-ahead search against the configured multi-index alias. Queries under
/// [`MIN_QUERY_CHARS`] characters short-circuit to an empty result list.
/// Malformed hits are skipped individually; only a backend-wide failure
/// produces a 500.
async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Response {
    let query = params.q;
    info!(query = %query, "received search request");

    if query.chars().count() < MIN_QUERY_CHARS {
        info!("query too short, returning empty results");
        return Json(SearchResponse { results: vec![] }).into_response();
    }

    let body = backend::multi_match_body(&query, &state.config.search.fields, MAX_SEARCH_HITS);
    match state.backend.search(&state.config.search.alias, body).await {
        Ok(hits) => {
            let mut results = Vec::with_capacity(hits.len());
            for hit in &hits {
                match result_from_hit(hit, &state.config.search.classifier) {
                    Ok(result) => results.push(result),
                    Err(e) => warn!(error = %e, "skipping malformed hit"),
                }
            }
            info!(count = results.len(), "search completed");
            Json(SearchResponse { results }).into_response()
        }
        Err(e) => {
            error!(error = %e, "search request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SearchErrorResponse {
                    error: e.to_string(),
                    results: vec![],
                }),
            )
                .into_response()
        }
    }
}

// ============ GET /details ============

#[derive(Deserialize)]
struct DetailsParams {
    id: Option<String>,
    #[serde(rename = "type")]
    record_type: Option<String>,
    index: Option<String>,
}

/// JSON response body for `GET /details`.
#[derive(Serialize)]
struct DetailsResponse {
    summary: String,
    details: Value,
}

/// Handler for `GET /details`.
///
/// Fetches one document by id and returns it together with a generated
/// summary. Member records are summarized alongside their most recent
/// communication events when any exist. Input is validated before any
/// backend call; summarization failures degrade to a placeholder summary.
async fn handle_details(
    State(state): State<AppState>,
    Query(params): Query<DetailsParams>,
) -> Result<Json<DetailsResponse>, AppError> {
    info!(
        id = params.id.as_deref().unwrap_or(""),
        record_type = params.record_type.as_deref().unwrap_or(""),
        index = params.index.as_deref().unwrap_or(""),
        "received details request"
    );

    let record_type = params
        .record_type
        .as_deref()
        .and_then(RecordType::parse)
        .ok_or_else(|| bad_request("Invalid type"))?;

    let id = match params.id {
        Some(id) if !id.is_empty() => id,
        _ => return Err(bad_request("No ID provided")),
    };

    let index = match params.index {
        Some(index) if !index.is_empty() => index,
        _ => state
            .config
            .search
            .classifier
            .default_index(record_type)
            .ok_or_else(|| internal(format!("no index configured for type '{}'", record_type)))?
            .to_string(),
    };

    info!(index = %index, id = %id, "fetching details");
    let document = state.backend.get(&index, &id).await.map_err(|e| match e {
        BackendError::NotFound { .. } => not_found(format!("Record not found in {}", index)),
        other => {
            error!(error = %other, index = %index, id = %id, "details fetch failed");
            internal(other.to_string())
        }
    })?;

    let payload = if state.config.search.classifier.classify(&index) == RecordType::Member {
        member_payload(&state, &document).await
    } else {
        document.clone()
    };

    let summary = match state.summarizer.summarize(&payload).await {
        Ok(summary) => summary,
        Err(e) => {
            warn!(error = %e, "summarization failed, returning placeholder");
            SUMMARY_UNAVAILABLE.to_string()
        }
    };

    Ok(Json(DetailsResponse {
        summary,
        details: document,
    }))
}

/// Build the summarization payload for a member document.
///
/// Looks up the member's most recent communication events; with at least one
/// event the payload merges `communication_events` and `member_data`,
/// otherwise the document stands alone. Event lookup failures (including a
/// document without a `member_id`) degrade to zero events.
async fn member_payload(state: &AppState, document: &Value) -> Value {
    let member_id = match document.get("member_id") {
        Some(id) if !id.is_null() => id,
        _ => {
            warn!("member document has no member_id, skipping event lookup");
            return document.clone();
        }
    };

    let body = backend::events_body(member_id, MAX_EVENTS);
    let events: Vec<Value> = match state
        .backend
        .search(&state.config.search.events_index, body)
        .await
    {
        Ok(hits) => hits
            .iter()
            .filter_map(|hit| hit.get("_source").cloned())
            .collect(),
        Err(e) => {
            warn!(error = %e, member_id = %member_id, "failed to fetch communication events");
            Vec::new()
        }
    };

    if events.is_empty() {
        document.clone()
    } else {
        serde_json::json!({
            "communication_events": events,
            "member_data": document,
        })
    }
}
