//! HTTP request handlers for the URL shortener API
//!
//! Handlers only translate between HTTP and the [`LinkStore`]; every rule
//! about codes and destinations lives in the store. Failures come back as
//! [`LinkError`] and are mapped to status codes here:
//!
//! - **400** validation failure
//! - **404** unknown code
//! - **409** custom code already taken
//! - **500** code allocation exhausted or storage failure

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;

use crate::error::LinkError;
use crate::model::{
    CreateRequest, HealthResponse, Link, LinkResponse, ListParams, PageResponse, Pagination,
    RankingParams, UpdateRequest,
};
use crate::store::LinkStore;

const DEFAULT_PAGE_LIMIT: i64 = 10;

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    pub links: Arc<LinkStore>,

    /// Public base URL short links are built from (e.g., "https://sho.rt")
    pub base_url: String,
}

impl AppState {
    fn respond(&self, link: Link) -> LinkResponse {
        LinkResponse::new(link, &self.base_url)
    }
}

impl IntoResponse for LinkError {
    fn into_response(self) -> Response {
        let status = match &self {
            LinkError::Validation { .. } => StatusCode::BAD_REQUEST,
            LinkError::NotFound { .. } => StatusCode::NOT_FOUND,
            LinkError::Conflict { .. } => StatusCode::CONFLICT,
            LinkError::Exhausted { .. } | LinkError::Storage { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        // Storage messages are written by the store; the backend detail stays
        // in `source` and the logs.
        let message = match &self {
            LinkError::Exhausted { .. } => {
                "Failed to generate unique code. Please try again.".to_string()
            }
            other => other.to_string(),
        };

        (
            status,
            Json(json!({
                "error": message,
                "code": self.kind()
            })),
        )
            .into_response()
    }
}

/// Unreadable or mistyped JSON bodies get the same `{error, code}` shape as
/// every other validation failure.
impl From<JsonRejection> for LinkError {
    fn from(rejection: JsonRejection) -> Self {
        LinkError::validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

/// Creates a new short link
///
/// # Request Body
///
/// ```json
/// {
///   "url": "https://example.com/very/long/url",
///   "code": "mylink"  // Optional
/// }
/// ```
///
/// # Response
///
/// - **201 Created** - `{ "success": true, "data": { ... } }`
/// - **400 Bad Request** - Invalid URL or code
/// - **409 Conflict** - Code already in use
pub async fn create_link(
    State(state): State<AppState>,
    payload: Result<Json<CreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, LinkError> {
    let Json(payload) = payload?;
    let link = state.links.create(&payload.url, payload.code.as_deref())?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": state.respond(link)
        })),
    ))
}

/// Lists links newest first
///
/// # Query Parameters
///
/// - `limit` (optional) - Items per page, 1..=100 (default: 10)
/// - `offset` (optional) - Items to skip (default: 0)
///
/// # Response
///
/// ```json
/// {
///   "data": [...],
///   "total": 42, "limit": 10, "offset": 20,
///   "total_pages": 5, "current_page": 3,
///   "has_next": true, "has_prev": true
/// }
/// ```
pub async fn list_links(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<PageResponse>, LinkError> {
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    let offset = params.offset.unwrap_or(0);

    let page = state.links.list_page(limit, offset)?;
    let total = state.links.count()?;

    Ok(Json(PageResponse {
        data: page.into_iter().map(|link| state.respond(link)).collect(),
        pagination: Pagination::new(limit.unsigned_abs(), offset.unsigned_abs(), total),
    }))
}

/// Redirects a short code to its destination
///
/// The click is recorded before answering. Uses 302 Found rather than a
/// permanent redirect so browsers keep coming back and every visit counts.
///
/// # Response
///
/// - **302 Found** - `Location` set to the destination URL
/// - **404 Not Found** - Short code does not exist
pub async fn redirect_link(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, LinkError> {
    let link = state
        .links
        .get_by_code(&code)?
        .ok_or_else(|| LinkError::not_found("Short URL not found"))?;

    state.links.record_click(&code)?;

    Ok((
        StatusCode::FOUND,
        [(header::LOCATION, link.destination_url)],
    )
        .into_response())
}

/// Returns a link with its click statistics
pub async fn link_stats(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<LinkResponse>, LinkError> {
    let link = state
        .links
        .get_by_code(&code)?
        .ok_or_else(|| LinkError::not_found("Short URL not found"))?;

    Ok(Json(state.respond(link)))
}

/// Partially updates a link; only `redirectUrl` can change
///
/// An unknown code is reported before anything about the body.
pub async fn patch_link(
    Path(code): Path<String>,
    State(state): State<AppState>,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, LinkError> {
    if state.links.get_by_code(&code)?.is_none() {
        return Err(LinkError::not_found("Short URL not found"));
    }

    let Json(payload) = payload?;
    let redirect_url = payload
        .redirect_url
        .filter(|url| !url.is_empty())
        .ok_or_else(|| LinkError::validation("No valid fields to update. Provide 'redirectUrl'"))?;

    update_destination(&state, &code, &redirect_url)
}

/// Replaces the link resource; `redirectUrl` is required
pub async fn put_link(
    Path(code): Path<String>,
    State(state): State<AppState>,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, LinkError> {
    let Json(payload) = payload?;
    let redirect_url = payload
        .redirect_url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| LinkError::validation("redirectUrl is required"))?;

    update_destination(&state, &code, &redirect_url)
}

fn update_destination(
    state: &AppState,
    code: &str,
    redirect_url: &str,
) -> Result<Json<serde_json::Value>, LinkError> {
    let link = state.links.update_destination(code, redirect_url)?;

    Ok(Json(json!({
        "success": true,
        "data": state.respond(link)
    })))
}

/// Deletes a short link
///
/// # Response
///
/// - **200 OK** - Link deleted
/// - **404 Not Found** - Link does not exist
pub async fn delete_link(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, LinkError> {
    state.links.delete(&code)?;

    Ok(Json(json!({
        "success": true,
        "message": format!("Short URL '{}' deleted successfully", code)
    })))
}

/// Links with the most clicks
pub async fn top_links(
    State(state): State<AppState>,
    Query(params): Query<RankingParams>,
) -> Result<impl IntoResponse, LinkError> {
    let links = state
        .links
        .most_clicked(params.limit.unwrap_or(DEFAULT_PAGE_LIMIT))?;
    Ok(ranking(&state, links))
}

/// Links clicked most recently
pub async fn recent_links(
    State(state): State<AppState>,
    Query(params): Query<RankingParams>,
) -> Result<impl IntoResponse, LinkError> {
    let links = state
        .links
        .recently_clicked(params.limit.unwrap_or(DEFAULT_PAGE_LIMIT))?;
    Ok(ranking(&state, links))
}

fn ranking(state: &AppState, links: Vec<Link>) -> Json<serde_json::Value> {
    let data: Vec<LinkResponse> = links.into_iter().map(|link| state.respond(link)).collect();
    Json(json!({ "data": data }))
}

/// Reports whether the database answers
///
/// Always 200; `ok` carries the storage ping result.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: state.links.ping(),
        version: env!("CARGO_PKG_VERSION"),
        datetime: Utc::now(),
    })
}
