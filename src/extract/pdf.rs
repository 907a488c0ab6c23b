//! PDF text extraction via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto the blocking pool so the
//! runtime's worker threads keep serving the session.
//!
//! Page texts are concatenated in document order with nothing in between.

use crate::error::ExtractionError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Extract the text of every page of an in-memory PDF.
pub async fn extract_pdf_text(
    bytes: Vec<u8>,
    pdfium_library: Option<PathBuf>,
) -> Result<String, ExtractionError> {
    tokio::task::spawn_blocking(move || {
        extract_pdf_text_blocking(&bytes, pdfium_library.as_deref())
    })
    .await
    .map_err(|e| ExtractionError::Internal(format!("PDF task panicked: {}", e)))?
}

/// Bind pdfium from an explicit library path, or the system library.
fn bind_pdfium(library: Option<&Path>) -> Result<Pdfium, ExtractionError> {
    let bindings = match library {
        Some(path) => Pdfium::bind_to_library(path.to_string_lossy().to_string()),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| ExtractionError::PdfiumUnavailable(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Blocking implementation of text extraction.
fn extract_pdf_text_blocking(
    bytes: &[u8],
    library: Option<&Path>,
) -> Result<String, ExtractionError> {
    let pdfium = bind_pdfium(library)?;

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| ExtractionError::Pdf(format!("{:?}", e)))?;

    let pages = document.pages();
    info!("PDF loaded: {} pages", pages.len());

    let mut text = String::new();
    for (idx, page) in pages.iter().enumerate() {
        let page_text = page
            .text()
            .map_err(|e| ExtractionError::Pdf(format!("page {}: {:?}", idx + 1, e)))?;
        let chunk = page_text.all();
        debug!("Page {} → {} chars", idx + 1, chunk.len());
        text.push_str(&chunk);
    }

    Ok(text)
}
