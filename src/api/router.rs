//! Router assembly.
//!
//! All routes live under `/api`. The body limit is 55 MB to leave room for
//! multipart overhead on large scans. CORS is locked to the configured
//! frontend origin when one is set, otherwise open.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::api::endpoints;
use crate::api::types::AppState;

const MAX_BODY_BYTES: usize = 55 * 1024 * 1024;

pub fn api_router(state: AppState) -> Router {
    let cors = cors_layer(state.frontend_url.as_deref());

    let routes = Router::new()
        .route("/health", get(endpoints::documents::health))
        .route("/upload-image", post(endpoints::upload::upload_image))
        .route("/upload-scanned-pdf", post(endpoints::upload::upload_pdf))
        .route("/upload-images", post(endpoints::upload::upload_images))
        .route("/upload-scanned-pdfs", post(endpoints::upload::upload_pdfs))
        .route("/all-documents", get(endpoints::documents::all_documents))
        .route("/save-verified", post(endpoints::documents::save_verified))
        .with_state(state);

    Router::new()
        .nest("/api", routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
}

fn cors_layer(frontend_url: Option<&str>) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    match frontend_url.and_then(|url| url.parse::<HeaderValue>().ok()) {
        Some(origin) => cors.allow_origin(origin),
        None => cors.allow_origin(Any),
    }
}
