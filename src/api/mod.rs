//! HTTP surface: upload, review, and verification endpoints under `/api`.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod types;

pub use error::ApiError;
pub use router::api_router;
pub use types::AppState;
