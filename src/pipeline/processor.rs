//! End-to-end document processing: extraction then structuring.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use super::extraction::{ExtractionError, OcrEngine, PdfConverter, TextExtractor};
use super::structuring::{ChatClient, StructuredOutcome, Structurer, StructuringError};

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Structuring(#[from] StructuringError),
}

/// Runs a document through OCR and structuring. All collaborators sit behind
/// traits so tests can run the full flow without network or poppler.
pub struct DocumentProcessor {
    extractor: TextExtractor,
    structurer: Structurer,
}

impl DocumentProcessor {
    pub fn new(
        converter: Arc<dyn PdfConverter>,
        ocr: Arc<dyn OcrEngine>,
        chat: Arc<dyn ChatClient>,
    ) -> Self {
        Self {
            extractor: TextExtractor::new(converter, ocr),
            structurer: Structurer::new(chat),
        }
    }

    pub fn process_image(&self, image_bytes: &[u8]) -> Result<StructuredOutcome, ProcessError> {
        let document = self.extractor.extract_from_image(image_bytes)?;
        tracing::info!(text_len = document.text.len(), "Image OCR complete");
        Ok(self.structurer.structure_text(&document.text)?)
    }

    pub fn process_pdf(&self, pdf_path: &Path) -> Result<StructuredOutcome, ProcessError> {
        let document = self.extractor.extract_from_pdf(pdf_path)?;
        tracing::info!(
            pages = document.page_count,
            text_len = document.text.len(),
            "PDF OCR complete"
        );
        Ok(self.structurer.structure_text(&document.text)?)
    }
}
