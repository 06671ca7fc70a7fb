//! Server bootstrap: wire config, stores, and pipeline into an axum server.

use std::sync::Arc;

use thiserror::Error;

use crate::api::{api_router, AppState};
use crate::config::{ConfigError, ServerConfig};
use crate::db::{open_database, DatabaseError, DocumentStore};
use crate::pipeline::extraction::{ExtractionError, PdftoppmConverter, ReadApiClient};
use crate::pipeline::structuring::{OpenAiChatClient, StructuringError};
use crate::pipeline::DocumentProcessor;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("OCR client error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Chat client error: {0}")]
    Structuring(#[from] StructuringError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the shared handler state from configuration: production OCR and
/// chat clients, pdftoppm converter, and the two on-disk stores.
pub fn build_state(config: &ServerConfig) -> Result<AppState, ServerError> {
    let ocr = ReadApiClient::new(&config.ocr_endpoint, &config.ocr_api_key)?;
    let chat = OpenAiChatClient::new(&config.chat_endpoint, &config.chat_api_key)?;
    let processor = Arc::new(DocumentProcessor::new(
        Arc::new(PdftoppmConverter::new()),
        Arc::new(ocr),
        Arc::new(chat),
    ));

    let working = DocumentStore::working(open_database(&config.working_db_path())?);
    let verified = DocumentStore::verified(open_database(&config.verified_db_path())?);

    Ok(AppState::new(
        processor,
        working,
        verified,
        config.uploads_dir(),
        config.frontend_url.clone(),
    ))
}

/// Serve the API until ctrl-c.
pub async fn serve(config: ServerConfig) -> Result<(), ServerError> {
    let state = build_state(&config)?;
    let app = api_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(addr = %listener.local_addr()?, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::error!("Failed to listen for shutdown signal: {e}"),
    }
}
