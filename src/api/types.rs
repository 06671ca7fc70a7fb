//! Shared handler state.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::api::ApiError;
use crate::db::DocumentStore;
use crate::pipeline::DocumentProcessor;

/// State shared by every handler. The SQLite stores are mutex-guarded; all
/// blocking work (pipeline + storage) happens inside `spawn_blocking`.
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<DocumentProcessor>,
    pub working: Arc<Mutex<DocumentStore>>,
    pub verified: Arc<Mutex<DocumentStore>>,
    pub uploads_dir: PathBuf,
    pub frontend_url: Option<String>,
}

impl AppState {
    pub fn new(
        processor: Arc<DocumentProcessor>,
        working: DocumentStore,
        verified: DocumentStore,
        uploads_dir: PathBuf,
        frontend_url: Option<String>,
    ) -> Self {
        Self {
            processor,
            working: Arc::new(Mutex::new(working)),
            verified: Arc::new(Mutex::new(verified)),
            uploads_dir,
            frontend_url,
        }
    }

    pub fn lock_working(&self) -> Result<std::sync::MutexGuard<'_, DocumentStore>, ApiError> {
        self.working
            .lock()
            .map_err(|_| ApiError::internal("Internal state error", "store lock poisoned"))
    }

    pub fn lock_verified(&self) -> Result<std::sync::MutexGuard<'_, DocumentStore>, ApiError> {
        self.verified
            .lock()
            .map_err(|_| ApiError::internal("Internal state error", "store lock poisoned"))
    }
}
