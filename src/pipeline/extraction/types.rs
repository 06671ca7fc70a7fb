//! Trait seams for the extraction layer.
//!
//! Both traits are object-safe so the orchestrator and the HTTP handlers can
//! hold `Arc<dyn ...>` and tests can substitute mocks.

use std::path::{Path, PathBuf};

use super::ExtractionError;

/// Extracts text from a single page image.
pub trait OcrEngine: Send + Sync {
    fn extract_text(&self, image_bytes: &[u8]) -> Result<String, ExtractionError>;
}

/// Converts a PDF into one image file per page.
pub trait PdfConverter: Send + Sync {
    /// Render every page of `pdf_path` into `out_dir` and return the image
    /// paths in page order.
    fn convert_to_images(
        &self,
        pdf_path: &Path,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, ExtractionError>;
}

/// Result of extracting a whole document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    /// Page texts in page order; for PDFs every page text is
    /// newline-terminated.
    pub text: String,
    pub page_count: usize,
}
