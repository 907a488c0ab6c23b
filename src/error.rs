//! Error types for the carebuddy library.
//!
//! Three error types reflect three distinct failure modes:
//!
//! * [`AssistantError`] — returned by configuration, file loading, export and
//!   the controller's own preconditions. `MissingCredential` is the only one
//!   that is fatal: the binary refuses to start without an API key.
//!
//! * [`ExtractionError`] — a document could not be turned into text. Never
//!   fatal to the session: the controller degrades the document context to
//!   the sentinel and reports a warning.
//!
//! * [`CompletionError`] — the chat-completion call failed. Never fatal: the
//!   controller turns it into an assistant-authored error turn.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by the carebuddy library outside of extraction and
/// completion.
#[derive(Debug, Error)]
pub enum AssistantError {
    // ── Startup errors ────────────────────────────────────────────────────
    /// The API credential is not set.
    #[error("API key not found: set {var} in the environment or a .env file.")]
    MissingCredential { var: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    // ── Session errors ────────────────────────────────────────────────────
    /// An operation was attempted while a completion request is in flight.
    #[error("The session is waiting for a reply; try again once it arrives.")]
    SessionBusy,

    /// `resubmit_recent` was given an index past the end of the list.
    #[error("No recent question #{index} (there are {len})")]
    NoSuchRecentQuery { index: usize, len: usize },

    // ── Upload errors ─────────────────────────────────────────────────────
    /// Document file was not found at the given path.
    #[error("File not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// The file is not one of the accepted document types.
    #[error("Unsupported document '{name}': upload a PDF, PNG, JPG or JPEG file")]
    UnsupportedDocument { name: String },

    /// The file has a `.pdf` extension but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the exported transcript.
    #[error("Failed to write chat export '{path}': {source}")]
    ExportFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A document could not be converted to text.
///
/// Carries the backend's own message; the controller does not try to recover
/// beyond falling back to the "no report" context.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The pdfium library could not be loaded.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumUnavailable(String),

    /// pdfium rejected the document or one of its pages.
    #[error("PDF text extraction failed: {0}")]
    Pdf(String),

    /// The image bytes could not be decoded.
    #[error("Image could not be decoded: {0}")]
    Image(#[from] image::ImageError),

    /// The OCR engine could not be run or reported failure.
    #[error("OCR failed: {0}")]
    Ocr(String),

    /// Temporary file handling failed.
    #[error("I/O error during extraction: {0}")]
    Io(#[from] std::io::Error),

    /// A blocking extraction task panicked or was cancelled.
    #[error("Internal extraction error: {0}")]
    Internal(String),
}

/// The chat-completion request failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    /// The endpoint answered with a non-2xx status.
    #[error("API Error: {status} - {detail}")]
    Http { status: u16, detail: String },

    /// Anything else: transport failure, malformed JSON, missing fields.
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}
