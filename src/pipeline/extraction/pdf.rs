//! PDF page rendering via the `pdftoppm` CLI (poppler-utils).
//!
//! Each page becomes a 300 DPI JPEG in the output directory. `pdftoppm`
//! numbers pages with zero-padded suffixes, so a lexical sort of the
//! filenames recovers page order.

use std::path::{Path, PathBuf};
use std::process::Command;

use super::types::PdfConverter;
use super::ExtractionError;

const RENDER_DPI: &str = "300";
const PAGE_PREFIX: &str = "page";

/// Production converter shelling out to `pdftoppm`.
pub struct PdftoppmConverter {
    tool: String,
}

impl PdftoppmConverter {
    pub fn new() -> Self {
        Self {
            tool: "pdftoppm".to_string(),
        }
    }

    /// Override the executable path (packaged installs, tests).
    pub fn with_tool(tool: impl Into<String>) -> Self {
        Self { tool: tool.into() }
    }
}

impl Default for PdftoppmConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfConverter for PdftoppmConverter {
    fn convert_to_images(
        &self,
        pdf_path: &Path,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, ExtractionError> {
        let prefix = out_dir.join(PAGE_PREFIX);
        let start = std::time::Instant::now();

        let output = Command::new(&self.tool)
            .arg("-jpeg")
            .arg("-r")
            .arg(RENDER_DPI)
            .arg(pdf_path)
            .arg(&prefix)
            .output()
            .map_err(|e| {
                ExtractionError::PdfConversion(format!("Failed to run {}: {e}", self.tool))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractionError::PdfConversion(format!(
                "{} exited with {}: {}",
                self.tool,
                output.status,
                stderr.trim()
            )));
        }

        let pages = list_page_images(out_dir)?;
        if pages.is_empty() {
            return Err(ExtractionError::NoPages);
        }

        tracing::debug!(
            pdf = %pdf_path.display(),
            pages = pages.len(),
            elapsed_ms = %start.elapsed().as_millis(),
            "Rendered PDF pages"
        );
        Ok(pages)
    }
}

/// Collect `*.jpg` / `*.jpeg` files in `dir`, sorted by filename.
fn list_page_images(dir: &Path) -> Result<Vec<PathBuf>, ExtractionError> {
    let mut pages: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"))
                .unwrap_or(false)
        })
        .collect();
    pages.sort();
    Ok(pages)
}

// ──────────────────────────────────────────────
// MockPdfConverter (testing)
// ──────────────────────────────────────────────

/// Mock converter that writes configured page contents into the output
/// directory instead of invoking `pdftoppm`.
pub struct MockPdfConverter {
    pages: Vec<Vec<u8>>,
}

impl MockPdfConverter {
    pub fn new(pages: Vec<Vec<u8>>) -> Self {
        Self { pages }
    }

    /// Converter that yields no pages, for the empty-PDF path.
    pub fn empty() -> Self {
        Self { pages: vec![] }
    }
}

impl PdfConverter for MockPdfConverter {
    fn convert_to_images(
        &self,
        _pdf_path: &Path,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, ExtractionError> {
        if self.pages.is_empty() {
            return Err(ExtractionError::NoPages);
        }
        let mut paths = Vec::new();
        for (i, bytes) in self.pages.iter().enumerate() {
            let path = out_dir.join(format!("{PAGE_PREFIX}-{:02}.jpg", i + 1));
            std::fs::write(&path, bytes)?;
            paths.push(path);
        }
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converter_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PdftoppmConverter>();
        assert_send_sync::<MockPdfConverter>();
    }

    #[test]
    fn page_images_sorted_by_filename() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["page-03.jpg", "page-01.jpg", "page-02.JPEG", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let pages = list_page_images(dir.path()).unwrap();
        let names: Vec<_> = pages
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["page-01.jpg", "page-02.JPEG", "page-03.jpg"]);
    }

    #[test]
    fn empty_directory_yields_no_pages() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_page_images(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn missing_tool_is_a_conversion_error() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("doc.pdf");
        std::fs::write(&pdf, b"%PDF-1.4").unwrap();

        let converter = PdftoppmConverter::with_tool("pdftoppm-does-not-exist");
        let result = converter.convert_to_images(&pdf, dir.path());
        assert!(matches!(result, Err(ExtractionError::PdfConversion(_))));
    }

    #[test]
    fn mock_writes_pages_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let converter = MockPdfConverter::new(vec![b"one".to_vec(), b"two".to_vec()]);
        let pages = converter
            .convert_to_images(Path::new("unused.pdf"), dir.path())
            .unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(std::fs::read(&pages[0]).unwrap(), b"one");
        assert_eq!(std::fs::read(&pages[1]).unwrap(), b"two");
    }
}
