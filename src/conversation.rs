//! The conversation controller.
//!
//! [`Conversation`] owns the two collaborators (completion client and text
//! extractor) and a list of observers. It does not own a session: every
//! operation takes the caller's [`Session`] by `&mut`, so each session stays
//! independently testable and two operations on one session can never
//! overlap.
//!
//! ## Phases
//!
//! ```text
//!          submit()                     reply or error
//!  Idle ─────────────▶ AwaitingCompletion ─────────────▶ Idle
//! ```
//!
//! `submit`, `upload_document` and `clear` are only valid from `Idle`.
//! Every completion failure becomes an assistant turn, so a submit always
//! grows the transcript by exactly two turns.

use crate::completion::{CompletionClient, OpenRouterClient};
use crate::config::AssistantConfig;
use crate::error::AssistantError;
use crate::extract::{load_document, DocumentExtractor, DocumentKind, TextExtractor};
use crate::observer::{ObserverHandle, SessionObserver};
use crate::prompts::CLEARED_GREETING;
use crate::session::{DocumentContext, Phase, Session, Turn};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What happened to an uploaded document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The report text is now the session context.
    Loaded { chars: usize },
    /// Extraction succeeded but found nothing; context is "no report".
    NoReadableText,
    /// Extraction failed; context is "no report".
    Failed { reason: String },
}

/// Drives a [`Session`] through questions, uploads and clears.
pub struct Conversation {
    completion: Arc<dyn CompletionClient>,
    extractor: Arc<dyn TextExtractor>,
    observers: Vec<ObserverHandle>,
}

impl Conversation {
    pub fn new(completion: Arc<dyn CompletionClient>, extractor: Arc<dyn TextExtractor>) -> Self {
        Self {
            completion,
            extractor,
            observers: Vec::new(),
        }
    }

    /// The production wiring: OpenRouter client plus cached pdfium/tesseract
    /// extraction.
    pub fn from_config(config: &AssistantConfig) -> Result<Self, AssistantError> {
        let completion = OpenRouterClient::new(config)?;
        let extractor = DocumentExtractor::cached(config);
        Ok(Self::new(Arc::new(completion), Arc::new(extractor)))
    }

    /// Register an observer; it sees every later mutation.
    pub fn subscribe(&mut self, observer: ObserverHandle) {
        self.observers.push(observer);
    }

    /// Ask a question.
    ///
    /// Appends the user turn, records the question in the recent list, waits
    /// for the completion client and appends its answer, or
    /// `"Error: <details>"` when it fails. Returns the appended assistant turn.
    ///
    /// # Errors
    /// [`AssistantError::SessionBusy`] if the session is not idle. Completion
    /// failures are never returned here; they land in the transcript.
    pub async fn submit(&self, session: &mut Session, question: &str) -> Result<Turn, AssistantError> {
        ensure_idle(session)?;

        let user_turn = Turn::user(question);
        session.transcript.push(user_turn.clone());
        session.recent.record(question);
        session.phase = Phase::AwaitingCompletion;
        self.notify(|o| o.on_turn_appended(&user_turn));
        self.notify(|o| o.on_completion_started(question));
        self.notify(|o| o.on_state_changed(session));

        debug!(
            "Submitting question ({} chars, report loaded: {})",
            question.len(),
            session.context.has_report()
        );
        let result = self
            .completion
            .complete(question, session.context.as_str())
            .await;

        let succeeded = result.is_ok();
        let reply = match result {
            Ok(answer) => Turn::assistant(answer),
            Err(e) => {
                warn!("Completion failed: {}", e);
                Turn::assistant(format!("Error: {}", e))
            }
        };

        session.transcript.push(reply.clone());
        session.phase = Phase::Idle;
        self.notify(|o| o.on_completion_finished(succeeded));
        self.notify(|o| o.on_turn_appended(&reply));
        self.notify(|o| o.on_state_changed(session));

        Ok(reply)
    }

    /// Re-ask the `index`-th recent question (0 = most recent).
    pub async fn resubmit_recent(
        &self,
        session: &mut Session,
        index: usize,
    ) -> Result<Turn, AssistantError> {
        let question = session
            .recent
            .get(index)
            .map(str::to_string)
            .ok_or(AssistantError::NoSuchRecentQuery {
                index,
                len: session.recent.len(),
            })?;
        self.submit(session, &question).await
    }

    /// Replace the session's report context with the text of a new document.
    ///
    /// Blank text and extraction failures both leave the "no report"
    /// sentinel. The transcript and recent questions are not touched.
    pub async fn upload_document(
        &self,
        session: &mut Session,
        bytes: &[u8],
        kind: DocumentKind,
    ) -> Result<UploadOutcome, AssistantError> {
        ensure_idle(session)?;
        self.notify(|o| o.on_extraction_started(bytes.len()));

        let outcome = match self.extractor.extract(bytes, kind).await {
            Ok(text) => {
                let chars = text.chars().count();
                session.context = DocumentContext::from_extracted(text);
                if session.context.has_report() {
                    info!("Report loaded: {} chars from {:?}", chars, kind);
                    UploadOutcome::Loaded { chars }
                } else {
                    info!("No readable text in uploaded {:?}", kind);
                    UploadOutcome::NoReadableText
                }
            }
            Err(e) => {
                warn!("Extraction failed: {}", e);
                session.context = DocumentContext::NoReport;
                UploadOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        match &outcome {
            UploadOutcome::Loaded { chars } => self.notify(|o| o.on_document_loaded(*chars)),
            UploadOutcome::NoReadableText => self.notify(|o| o.on_no_readable_text()),
            UploadOutcome::Failed { reason } => self.notify(|o| o.on_extraction_failed(reason)),
        }
        self.notify(|o| o.on_state_changed(session));

        Ok(outcome)
    }

    /// Read a local file and upload it.
    ///
    /// A file of an unsupported type is refused with
    /// [`AssistantError::UnsupportedDocument`] and changes nothing. Any other
    /// problem reading a supported file is an upload failure: the context
    /// falls back to the sentinel, as for a failed extraction.
    pub async fn upload_path(
        &self,
        session: &mut Session,
        path: &Path,
    ) -> Result<UploadOutcome, AssistantError> {
        ensure_idle(session)?;
        match load_document(path).await {
            Ok(doc) => {
                debug!("Uploading {} ({:?})", doc.name, doc.kind);
                self.upload_document(session, &doc.bytes, doc.kind).await
            }
            Err(e @ AssistantError::UnsupportedDocument { .. }) => Err(e),
            Err(e) => self.reject_upload(session, &e.to_string()),
        }
    }

    /// Record an upload that never reached extraction (unreadable file, bad
    /// PDF header). The previous report is dropped and the context falls
    /// back to the "no report" sentinel.
    pub fn reject_upload(
        &self,
        session: &mut Session,
        reason: &str,
    ) -> Result<UploadOutcome, AssistantError> {
        ensure_idle(session)?;

        warn!("Upload rejected: {}", reason);
        session.context = DocumentContext::NoReport;

        self.notify(|o| o.on_extraction_failed(reason));
        self.notify(|o| o.on_state_changed(session));
        Ok(UploadOutcome::Failed {
            reason: reason.to_string(),
        })
    }

    /// Reset the session: one greeting turn, no report, no recent questions.
    pub fn clear(&self, session: &mut Session) -> Result<(), AssistantError> {
        ensure_idle(session)?;

        session.transcript.reset(CLEARED_GREETING);
        session.context = DocumentContext::NoReport;
        session.recent.clear();
        info!("Session cleared");

        self.notify(|o| o.on_session_cleared());
        self.notify(|o| o.on_state_changed(session));
        Ok(())
    }

    fn notify(&self, event: impl Fn(&dyn SessionObserver)) {
        for observer in &self.observers {
            event(observer.as_ref());
        }
    }
}

fn ensure_idle(session: &Session) -> Result<(), AssistantError> {
    match session.phase {
        Phase::Idle => Ok(()),
        Phase::AwaitingCompletion => Err(AssistantError::SessionBusy),
    }
}
