//! Document-to-text extraction.
//!
//! Each submodule implements exactly one concern:
//!
//! ```text
//! input ──▶ (pdf | ocr) ──▶ cache
//! (path)    (pdfium / tesseract)  (LRU by content hash)
//! ```
//!
//! 1. [`input`] — read a local file and decide its [`DocumentKind`]
//! 2. [`pdf`]   — concatenate the text of every page via pdfium; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`ocr`]   — decode the image, normalise it to PNG and run tesseract
//! 4. [`cache`] — memoise any [`TextExtractor`] by SHA-256 of kind + bytes
//!
//! An empty string from any backend means "no readable text", not failure.

pub mod cache;
pub mod input;
pub mod ocr;
pub mod pdf;

use crate::config::AssistantConfig;
use crate::error::ExtractionError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub use cache::CachedExtractor;
pub use input::{load_document, LoadedDocument};

/// Accepted upload types. The kind selects the extraction backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Pdf,
    Png,
    Jpeg,
}

impl DocumentKind {
    /// Kind for a file extension (`pdf`, `png`, `jpg`, `jpeg`; any case).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "png" => Some(DocumentKind::Png),
            "jpg" | "jpeg" => Some(DocumentKind::Jpeg),
            _ => None,
        }
    }

    /// Kind for a MIME type as sent by an upload form.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "application/pdf" => Some(DocumentKind::Pdf),
            "image/png" => Some(DocumentKind::Png),
            "image/jpeg" | "image/jpg" => Some(DocumentKind::Jpeg),
            _ => None,
        }
    }

    /// Kind for a path, from its extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Images are read by OCR; everything else by pdfium.
    pub fn is_image(self) -> bool {
        matches!(self, DocumentKind::Png | DocumentKind::Jpeg)
    }

    /// Single-byte discriminant mixed into cache keys.
    pub(crate) fn tag(self) -> u8 {
        match self {
            DocumentKind::Pdf => b'P',
            DocumentKind::Png => b'N',
            DocumentKind::Jpeg => b'J',
        }
    }
}

/// Turns document bytes into plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract all text from `bytes`; an empty string means nothing readable.
    async fn extract(&self, bytes: &[u8], kind: DocumentKind) -> Result<String, ExtractionError>;
}

/// The production extractor: pdfium for PDFs, tesseract for images.
#[derive(Debug, Clone)]
pub struct DocumentExtractor {
    pdfium_library: Option<PathBuf>,
    tesseract_cmd: String,
    ocr_language: Option<String>,
}

impl DocumentExtractor {
    pub fn new(config: &AssistantConfig) -> Self {
        Self {
            pdfium_library: config.pdfium_library.clone(),
            tesseract_cmd: config.tesseract_cmd.clone(),
            ocr_language: config.ocr_language.clone(),
        }
    }

    /// This extractor wrapped in an LRU cache sized from `config`.
    pub fn cached(config: &AssistantConfig) -> CachedExtractor<Self> {
        CachedExtractor::new(Self::new(config), config.cache_capacity)
    }
}

#[async_trait]
impl TextExtractor for DocumentExtractor {
    async fn extract(&self, bytes: &[u8], kind: DocumentKind) -> Result<String, ExtractionError> {
        if kind.is_image() {
            ocr::ocr_image(
                bytes.to_vec(),
                &self.tesseract_cmd,
                self.ocr_language.as_deref(),
            )
            .await
        } else {
            pdf::extract_pdf_text(bytes.to_vec(), self.pdfium_library.clone()).await
        }
    }
}
