//! Whole-document text extraction.
//!
//! Images go straight to OCR. PDFs are rendered to one JPEG per page in a
//! temporary directory, then each page is OCRed strictly in order and every
//! page text newline-terminated. A failed page fails the document.
//! The temp directory (and its page images) is removed on return.

use std::path::Path;
use std::sync::Arc;

use super::types::{ExtractedDocument, OcrEngine, PdfConverter};
use super::ExtractionError;

pub struct TextExtractor {
    converter: Arc<dyn PdfConverter>,
    ocr: Arc<dyn OcrEngine>,
}

impl TextExtractor {
    pub fn new(converter: Arc<dyn PdfConverter>, ocr: Arc<dyn OcrEngine>) -> Self {
        Self { converter, ocr }
    }

    pub fn extract_from_image(&self, image_bytes: &[u8]) -> Result<ExtractedDocument, ExtractionError> {
        let text = self.ocr.extract_text(image_bytes)?;
        Ok(ExtractedDocument {
            text,
            page_count: 1,
        })
    }

    pub fn extract_from_pdf(&self, pdf_path: &Path) -> Result<ExtractedDocument, ExtractionError> {
        let _span = tracing::info_span!("extract_pdf", pdf = %pdf_path.display()).entered();

        let temp_dir = tempfile::tempdir()?;
        let pages = self.converter.convert_to_images(pdf_path, temp_dir.path())?;

        let mut page_texts = Vec::with_capacity(pages.len());
        for (index, page) in pages.iter().enumerate() {
            let image_bytes = std::fs::read(page)?;
            let text = self.ocr.extract_text(&image_bytes).map_err(|e| {
                tracing::warn!(page = index + 1, error = %e, "Page OCR failed");
                e
            })?;
            tracing::debug!(page = index + 1, text_len = text.len(), "Page OCR complete");
            page_texts.push(text);
        }

        // Each page text is terminated with a newline, the last one included.
        let mut text = page_texts.join("\n");
        text.push('\n');

        Ok(ExtractedDocument {
            text,
            page_count: pages.len(),
        })
        // temp_dir drops here, deleting the page images
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extraction::ocr::MockOcrEngine;
    use crate::pipeline::extraction::pdf::MockPdfConverter;

    fn fake_pdf() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, b"%PDF-1.4 fake").unwrap();
        (dir, path)
    }

    #[test]
    fn image_extraction_is_a_single_ocr_call() {
        let ocr = Arc::new(MockOcrEngine::constant("Invoice #42"));
        let extractor = TextExtractor::new(Arc::new(MockPdfConverter::empty()), ocr.clone());

        let doc = extractor.extract_from_image(b"jpeg-bytes").unwrap();
        assert_eq!(doc.text, "Invoice #42");
        assert_eq!(doc.page_count, 1);
        assert_eq!(ocr.calls(), 1);
    }

    #[test]
    fn pdf_pages_ocr_in_order_and_concatenate() {
        let converter = Arc::new(MockPdfConverter::new(vec![
            b"page1".to_vec(),
            b"page2".to_vec(),
            b"page3".to_vec(),
        ]));
        let ocr = Arc::new(MockOcrEngine::new(vec![
            Ok("first page".into()),
            Ok("second page".into()),
            Ok("third page".into()),
        ]));
        let extractor = TextExtractor::new(converter, ocr.clone());

        let (_dir, pdf) = fake_pdf();
        let doc = extractor.extract_from_pdf(&pdf).unwrap();
        assert_eq!(doc.text, "first page\nsecond page\nthird page\n");
        assert_eq!(doc.page_count, 3);
        assert_eq!(ocr.calls(), 3);
    }

    #[test]
    fn empty_pdf_is_an_error() {
        let extractor = TextExtractor::new(
            Arc::new(MockPdfConverter::empty()),
            Arc::new(MockOcrEngine::constant("unused")),
        );

        let (_dir, pdf) = fake_pdf();
        let result = extractor.extract_from_pdf(&pdf);
        assert!(matches!(result, Err(ExtractionError::NoPages)));
    }

    #[test]
    fn failed_page_fails_the_document() {
        let converter = Arc::new(MockPdfConverter::new(vec![
            b"page1".to_vec(),
            b"page2".to_vec(),
            b"page3".to_vec(),
        ]));
        let ocr = Arc::new(MockOcrEngine::new(vec![
            Ok("fine".into()),
            Err("unreadable".into()),
            Ok("never reached".into()),
        ]));
        let extractor = TextExtractor::new(converter, ocr.clone());

        let (_dir, pdf) = fake_pdf();
        let result = extractor.extract_from_pdf(&pdf);
        assert!(matches!(result, Err(ExtractionError::OcrFailed(_))));
        // Third page is never attempted.
        assert_eq!(ocr.calls(), 2);
    }
}
