//! Upload endpoints: single and batch, image and scanned PDF.
//!
//! Files are staged under the configured uploads directory with sanitized
//! names, run through the pipeline, and the staged copy removed afterwards.
//! Batch uploads are best effort: a file that fails is logged and skipped,
//! the rest still land in one insert.

use std::path::PathBuf;

use axum::extract::{Multipart, State};
use axum::Json;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::api::{ApiError, AppState};
use crate::db::FlatRecord;
use crate::pipeline::structuring::{flatten_for_storage, is_flat_object, StructuredOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Image,
    Pdf,
}

impl DocumentKind {
    fn accepts(self, mime: &str) -> bool {
        match self {
            DocumentKind::Image => mime.starts_with("image/"),
            DocumentKind::Pdf => mime == "application/pdf",
        }
    }

    fn rejection_message(self) -> &'static str {
        match self {
            DocumentKind::Image => "Only image files are allowed for this endpoint.",
            DocumentKind::Pdf => "Invalid file type. Only PDF files are allowed.",
        }
    }
}

/// POST /api/upload-image — single multipart `file`.
pub async fn upload_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    upload_single(state, multipart, DocumentKind::Image, "file").await
}

/// POST /api/upload-scanned-pdf — single multipart `file`.
pub async fn upload_pdf(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    upload_single(state, multipart, DocumentKind::Pdf, "file").await
}

/// POST /api/upload-images — multipart `files`, best effort per file.
pub async fn upload_images(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    upload_batch(state, multipart, DocumentKind::Image, "files").await
}

/// POST /api/upload-scanned-pdfs — multipart `files`, best effort per file.
pub async fn upload_pdfs(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    upload_batch(state, multipart, DocumentKind::Pdf, "files").await
}

async fn upload_single(
    state: AppState,
    multipart: Multipart,
    kind: DocumentKind,
    field_name: &str,
) -> Result<Json<Value>, ApiError> {
    let mut files = read_files(multipart, field_name).await?;
    let (filename, bytes) = files.remove(0);

    let mime = detect_mime_from_bytes(&bytes);
    if !kind.accepts(&mime) {
        return Err(ApiError::BadRequest(kind.rejection_message().into()));
    }

    let worker_state = state.clone();
    let record = tokio::task::spawn_blocking(move || {
        process_and_store(&worker_state, kind, &filename, &bytes)
    })
    .await
    .map_err(|e| ApiError::internal("Worker task failed", e.to_string()))??;

    let rows = insert_and_fetch(state, vec![record]).await?;
    Ok(Json(json!({"data": rows})))
}

async fn upload_batch(
    state: AppState,
    multipart: Multipart,
    kind: DocumentKind,
    field_name: &str,
) -> Result<Json<Value>, ApiError> {
    let files = read_files(multipart, field_name).await?;

    let mut records = Vec::new();
    for (filename, bytes) in files {
        let mime = detect_mime_from_bytes(&bytes);
        if !kind.accepts(&mime) {
            tracing::warn!(%filename, %mime, "Skipping file with unsupported type");
            continue;
        }

        let worker_state = state.clone();
        let name_for_log = filename.clone();
        let result = tokio::task::spawn_blocking(move || {
            process_and_store(&worker_state, kind, &filename, &bytes)
        })
        .await
        .map_err(|e| ApiError::internal("Worker task failed", e.to_string()))?;

        match result {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(filename = %name_for_log, error = %e, "Skipping failed file");
            }
        }
    }

    let rows = insert_and_fetch(state, records).await?;
    Ok(Json(json!({"data": rows})))
}

/// Collect every multipart field named `field_name` as (filename, bytes).
async fn read_files(
    mut multipart: Multipart,
    field_name: &str,
) -> Result<Vec<(String, Vec<u8>)>, ApiError> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some(field_name) {
            continue;
        }
        let filename = field.file_name().unwrap_or("document").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read file data: {e}")))?;
        files.push((filename, bytes.to_vec()));
    }

    if files.is_empty() {
        return Err(ApiError::BadRequest("No file uploaded".into()));
    }
    Ok(files)
}

/// Blocking: stage the file, run the pipeline, clean up, validate flatness.
fn process_and_store(
    state: &AppState,
    kind: DocumentKind,
    filename: &str,
    bytes: &[u8],
) -> Result<FlatRecord, ApiError> {
    let staged = stage_file(state, filename, bytes)?;

    let outcome = match kind {
        DocumentKind::Image => state.processor.process_image(bytes),
        DocumentKind::Pdf => state.processor.process_pdf(&staged),
    };
    let _ = std::fs::remove_file(&staged);

    match outcome? {
        StructuredOutcome::Fallback(payload) => {
            Err(ApiError::internal(payload.error, payload.structured_data))
        }
        StructuredOutcome::Structured(object) => validate_and_flatten(object),
    }
}

fn validate_and_flatten(object: Map<String, Value>) -> Result<FlatRecord, ApiError> {
    let value = Value::Object(object);
    if !is_flat_object(&value) {
        return Err(ApiError::internal(
            "Extracted data is not in the expected flat format",
            value.to_string(),
        ));
    }
    let Value::Object(object) = value else {
        unreachable!()
    };
    Ok(flatten_for_storage(&object))
}

fn stage_file(state: &AppState, filename: &str, bytes: &[u8]) -> Result<PathBuf, ApiError> {
    std::fs::create_dir_all(&state.uploads_dir)
        .map_err(|e| ApiError::internal("Failed to stage file", e.to_string()))?;

    let path = state
        .uploads_dir
        .join(format!("{}_{}", Uuid::new_v4(), sanitize_filename(filename)));
    std::fs::write(&path, bytes)
        .map_err(|e| ApiError::internal("Failed to stage file", e.to_string()))?;
    Ok(path)
}

/// Detect MIME type from magic bytes, never from the client-supplied header.
pub fn detect_mime_from_bytes(bytes: &[u8]) -> String {
    if bytes.len() < 4 {
        return "application/octet-stream".into();
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return "image/jpeg".into();
    }
    if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        return "image/png".into();
    }
    if bytes.starts_with(b"%PDF") {
        return "application/pdf".into();
    }
    if bytes.len() >= 12 && bytes[..4] == *b"RIFF" && bytes[8..12] == *b"WEBP" {
        return "image/webp".into();
    }
    // TIFF: II*\0 (little endian) or MM\0* (big endian)
    if bytes.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || bytes.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
    {
        return "image/tiff".into();
    }
    if bytes.starts_with(b"BM") {
        return "image/bmp".into();
    }
    "application/octet-stream".into()
}

/// Strip path separators and special characters from an upload filename.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .filter(|&c| c != '/' && c != '\\' && c != '\0')
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let sanitized = sanitized.replace("..", "");

    let sanitized: String = sanitized.chars().take(100).collect();

    if sanitized.is_empty() {
        "document".into()
    } else {
        sanitized
    }
}

async fn insert_and_fetch(
    state: AppState,
    records: Vec<FlatRecord>,
) -> Result<Vec<Map<String, Value>>, ApiError> {
    tokio::task::spawn_blocking(move || -> Result<_, ApiError> {
        let mut store = state.lock_working()?;
        let inserted = store.insert_records(&records)?;
        tracing::info!(inserted, "Documents stored");
        Ok(store.fetch_all()?)
    })
    .await
    .map_err(|e| ApiError::internal("Worker task failed", e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_jpeg() {
        assert_eq!(
            detect_mime_from_bytes(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]),
            "image/jpeg"
        );
    }

    #[test]
    fn detects_png() {
        assert_eq!(
            detect_mime_from_bytes(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A]),
            "image/png"
        );
    }

    #[test]
    fn detects_pdf() {
        assert_eq!(detect_mime_from_bytes(b"%PDF-1.4 content"), "application/pdf");
    }

    #[test]
    fn detects_webp() {
        let mut bytes = b"RIFF".to_vec();
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        bytes.extend_from_slice(b"WEBP");
        assert_eq!(detect_mime_from_bytes(&bytes), "image/webp");
    }

    #[test]
    fn detects_tiff_both_endians() {
        assert_eq!(
            detect_mime_from_bytes(&[0x49, 0x49, 0x2A, 0x00, 0x01]),
            "image/tiff"
        );
        assert_eq!(
            detect_mime_from_bytes(&[0x4D, 0x4D, 0x00, 0x2A, 0x01]),
            "image/tiff"
        );
    }

    #[test]
    fn unknown_bytes_are_octet_stream() {
        assert_eq!(
            detect_mime_from_bytes(&[0x00, 0x01, 0x02, 0x03]),
            "application/octet-stream"
        );
        assert_eq!(detect_mime_from_bytes(&[]), "application/octet-stream");
    }

    #[test]
    fn image_kind_rejects_pdf() {
        assert!(DocumentKind::Image.accepts("image/jpeg"));
        assert!(DocumentKind::Image.accepts("image/png"));
        assert!(!DocumentKind::Image.accepts("application/pdf"));
        assert!(!DocumentKind::Image.accepts("application/octet-stream"));
    }

    #[test]
    fn pdf_kind_rejects_images() {
        assert!(DocumentKind::Pdf.accepts("application/pdf"));
        assert!(!DocumentKind::Pdf.accepts("image/jpeg"));
    }

    #[test]
    fn sanitize_strips_traversal() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_filename("dir/file.pdf"), "dirfile.pdf");
    }

    #[test]
    fn sanitize_replaces_special_chars() {
        assert_eq!(sanitize_filename("my scan (1).jpg"), "my_scan__1_.jpg");
    }

    #[test]
    fn sanitize_empty_falls_back() {
        assert_eq!(sanitize_filename(""), "document");
        assert_eq!(sanitize_filename("///"), "document");
    }

    #[test]
    fn sanitize_truncates_long_names() {
        let long = "a".repeat(200);
        assert_eq!(sanitize_filename(&long).len(), 100);
    }

    #[test]
    fn nested_object_is_rejected_as_not_flat() {
        let Value::Object(object) = serde_json::json!({"a": {"b": "c"}}) else {
            unreachable!()
        };
        let result = validate_and_flatten(object);
        assert!(matches!(result, Err(ApiError::Internal { .. })));
    }

    #[test]
    fn flat_object_flattens() {
        let Value::Object(object) = serde_json::json!({"Name": "Ana"}) else {
            unreachable!()
        };
        let record = validate_and_flatten(object).unwrap();
        assert_eq!(record["Name"], "Ana");
    }
}
