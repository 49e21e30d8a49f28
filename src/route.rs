//! Route definitions for the URL shortener API
//!
//! This module configures all HTTP routes and maps them to their respective handlers.

use axum::routing::get;
use axum::Router;

use crate::handler::{
    create_link, delete_link, health, link_stats, list_links, patch_link, put_link,
    recent_links, redirect_link, top_links, AppState,
};

/// Creates and configures the Axum application router with all routes
///
/// # Route Definitions
///
/// - `GET /{code}` - Redirects to the destination URL and records the click
/// - `GET /api/links` - Lists links with pagination
/// - `POST /api/links` - Creates a new short link
/// - `GET /api/links/{code}` - Same redirect as `GET /{code}`
/// - `PATCH|PUT /api/links/{code}` - Changes the destination URL
/// - `DELETE /api/links/{code}` - Deletes a short link
/// - `GET /api/links/{code}/stats` - Link record with click statistics
/// - `GET /api/stats/top` - Most clicked links
/// - `GET /api/stats/recent` - Most recently clicked links
/// - `GET /api/healthz` - Storage health, version and server time
///
/// # Example Usage
///
/// ```no_run
/// # use std::sync::Arc;
/// # use tinylink::database::RedbRecords;
/// # use tinylink::generator::CodeGenerator;
/// # use tinylink::handler::AppState;
/// # use tinylink::route::create_app;
/// # use tinylink::store::LinkStore;
/// let records = RedbRecords::open("data.db").unwrap();
/// let links = LinkStore::new(Arc::new(records), CodeGenerator::default()).unwrap();
/// let state = AppState { links: Arc::new(links), base_url: "http://localhost:8080".into() };
/// let app = create_app(state);
/// // axum::serve(listener, app).await.unwrap();
/// ```
pub fn create_app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/links", get(list_links).post(create_link))
        .route(
            "/links/{code}",
            get(redirect_link)
                .patch(patch_link)
                .put(put_link)
                .delete(delete_link),
        )
        .route("/links/{code}/stats", get(link_stats))
        .route("/stats/top", get(top_links))
        .route("/stats/recent", get(recent_links))
        .route("/healthz", get(health));

    Router::new()
        // Public redirect endpoint
        .route("/{code}", get(redirect_link))
        .nest("/api", api_routes)
        .with_state(state)
}
