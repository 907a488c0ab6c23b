//! # carebuddy
//!
//! A single-session medical Q&A assistant. Upload a lab report (PDF or a
//! scanned PNG/JPEG), then ask questions about it; answers come from a hosted
//! chat-completion model restricted to health topics.
//!
//! ## Flow
//!
//! ```text
//! upload ──▶ extract (pdfium | tesseract, LRU-cached) ──▶ Session.context
//!
//! question ──▶ Conversation::submit ──▶ CompletionClient (question + context)
//!                       │                          │
//!                       └──── Session.transcript ◀─┘ ──▶ SessionObserver
//! ```
//!
//! The crate does no extraction or inference of its own. What it owns is the
//! session state (transcript, recent questions, report context), the
//! controller that keeps it consistent, and the plumbing to the two external
//! services.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use carebuddy::{AssistantConfig, Conversation, DocumentKind, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Fails with MissingCredential unless OPENROUTER_API_KEY is set
//!     let config = AssistantConfig::from_env()?;
//!     let conversation = Conversation::from_config(&config)?;
//!     let mut session = Session::new();
//!
//!     let bytes = std::fs::read("labs.pdf")?;
//!     conversation.upload_document(&mut session, &bytes, DocumentKind::Pdf).await?;
//!
//!     let reply = conversation.submit(&mut session, "What does this mean?").await?;
//!     println!("{}", reply.content());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `carebuddy` binary (clap + anyhow + tracing-subscriber + indicatif + dotenvy) |
//!
//! ## External tools
//!
//! * **pdfium** shared library for PDF text. Bound from `PDFIUM_LIB_PATH`
//!   when set, otherwise from the system library path.
//! * **tesseract** executable for image OCR, looked up on `PATH`.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod completion;
pub mod config;
pub mod conversation;
pub mod error;
pub mod export;
pub mod extract;
pub mod observer;
pub mod prompts;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use completion::{CompletionClient, OpenRouterClient};
pub use config::{AssistantConfig, AssistantConfigBuilder};
pub use conversation::{Conversation, UploadOutcome};
pub use error::{AssistantError, CompletionError, ExtractionError};
pub use export::{export_file_name, export_transcript, render_transcript};
pub use extract::{
    load_document, CachedExtractor, DocumentExtractor, DocumentKind, LoadedDocument, TextExtractor,
};
pub use observer::{NoopObserver, ObserverHandle, SessionObserver};
pub use session::{
    DocumentContext, Phase, RecentQueries, Role, Session, Transcript, Turn,
    RECENT_QUERIES_CAPACITY,
};
