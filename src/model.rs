//! Data models for the URL shortener application
//!
//! This module defines the persisted link record and the request/response
//! structures used by the HTTP layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A short link as stored in the database
///
/// `short_code` is unique among live records and never changes after
/// creation; only `destination_url` and the click fields are mutable.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Surrogate key assigned by storage on insert
    pub id: u64,

    /// The path segment that resolves to this link (e.g., "abc123")
    pub short_code: String,

    /// Where the short code redirects to
    pub destination_url: String,

    /// Number of recorded clicks, only ever incremented
    #[serde(default)]
    pub total_clicks: u64,

    /// Time of the most recent click, `None` until the first one
    pub last_clicked_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

/// Insert payload handed to the storage backend, which assigns the id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLink {
    pub short_code: String,
    pub destination_url: String,
    pub created_at: DateTime<Utc>,
}

impl NewLink {
    pub fn into_link(self, id: u64) -> Link {
        Link {
            id,
            short_code: self.short_code,
            destination_url: self.destination_url,
            total_clicks: 0,
            last_clicked_at: None,
            created_at: self.created_at,
        }
    }
}

/// Request payload for creating a new short link
///
/// # Example
/// ```json
/// {
///   "url": "https://example.com/very/long/url",
///   "code": "mylink"  // Optional
/// }
/// ```
#[derive(Deserialize, Debug, Clone)]
pub struct CreateRequest {
    /// Missing is treated like empty and rejected by validation
    #[serde(default)]
    pub url: String,

    /// Optional custom code; a random one is generated when absent or empty
    pub code: Option<String>,
}

/// Request payload for PATCH/PUT on an existing link
#[derive(Deserialize, Debug, Clone)]
pub struct UpdateRequest {
    #[serde(rename = "redirectUrl", alias = "redirect_url")]
    pub redirect_url: Option<String>,
}

/// A link as returned by the API, with its public short URL
#[derive(Serialize, Debug, Clone)]
pub struct LinkResponse {
    #[serde(flatten)]
    pub link: Link,

    /// The complete shortened URL (e.g., "http://localhost:8080/abc123")
    pub short_url: String,
}

impl LinkResponse {
    pub fn new(link: Link, base_url: &str) -> Self {
        let short_url = format!("{}/{}", base_url.trim_end_matches('/'), link.short_code);
        Self { link, short_url }
    }
}

/// Query parameters for listing links
///
/// # Example
/// Query string: `?limit=20&offset=40`
#[derive(Deserialize, Debug, Default)]
pub struct ListParams {
    /// Defaults to 10, must be within 1..=100
    pub limit: Option<i64>,

    /// Defaults to 0, must not be negative
    pub offset: Option<i64>,
}

/// Query parameters for the click ranking endpoints
#[derive(Deserialize, Debug, Default)]
pub struct RankingParams {
    pub limit: Option<i64>,
}

/// Pagination metadata derived from `limit`, `offset` and the total count
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
    pub total_pages: u64,
    pub current_page: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    /// `limit` must be non-zero; the link store rejects zero limits before
    /// a page is ever built.
    pub fn new(limit: u64, offset: u64, total: u64) -> Self {
        let limit = limit.max(1);
        Self {
            total,
            limit,
            offset,
            total_pages: total.div_ceil(limit),
            current_page: offset / limit + 1,
            has_next: offset + limit < total,
            has_prev: offset > 0,
        }
    }
}

/// One page of links plus its pagination metadata
#[derive(Serialize, Debug)]
pub struct PageResponse {
    pub data: Vec<LinkResponse>,

    #[serde(flatten)]
    pub pagination: Pagination,
}

/// Health report returned by `GET /api/healthz`
#[derive(Serialize, Debug)]
pub struct HealthResponse {
    pub ok: bool,
    pub version: &'static str,
    pub datetime: DateTime<Utc>,
}
