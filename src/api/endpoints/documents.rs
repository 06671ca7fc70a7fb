//! Review and verification endpoints.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::api::{ApiError, AppState};
use crate::pipeline::structuring::flatten_for_storage;

/// GET /api/health
pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok", "message": "Server is running"}))
}

/// GET /api/all-documents — every working-store row, for the review table.
pub async fn all_documents(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let rows = tokio::task::spawn_blocking(move || -> Result<_, ApiError> {
        let store = state.lock_working()?;
        Ok(store.fetch_all()?)
    })
    .await
    .map_err(|e| ApiError::internal("Worker task failed", e.to_string()))??;

    Ok(Json(json!({"data": rows})))
}

#[derive(Deserialize)]
pub struct SaveVerifiedRequest {
    pub data: Vec<Map<String, Value>>,
}

/// POST /api/save-verified — append reviewed rows to the verified store.
pub async fn save_verified(
    State(state): State<AppState>,
    Json(request): Json<SaveVerifiedRequest>,
) -> Result<Json<Value>, ApiError> {
    let records: Vec<_> = request.data.iter().map(flatten_for_storage).collect();

    let saved = tokio::task::spawn_blocking(move || -> Result<usize, ApiError> {
        let mut store = state.lock_verified()?;
        Ok(store.insert_records(&records)?)
    })
    .await
    .map_err(|e| ApiError::internal("Worker task failed", e.to_string()))??;

    tracing::info!(saved, "Verified rows saved");
    Ok(Json(json!({"saved": saved})))
}
