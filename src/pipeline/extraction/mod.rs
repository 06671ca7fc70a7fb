pub mod ocr;
pub mod orchestrator;
pub mod pdf;
pub mod types;

pub use ocr::*;
pub use orchestrator::*;
pub use pdf::*;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF conversion failed: {0}")]
    PdfConversion(String),

    #[error("PDF produced no page images")]
    NoPages,

    #[error("OCR request failed: {0}")]
    OcrRequest(String),

    #[error("OCR submission returned no Operation-Location header")]
    MissingOperationLocation,

    #[error("OCR analysis failed: {0}")]
    OcrFailed(String),

    #[error("OCR timed out after {0} polling attempts")]
    OcrTimeout(u32),
}
