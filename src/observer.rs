//! Observer trait for session state changes.
//!
//! Subscribe an [`Arc<dyn SessionObserver>`] via
//! [`crate::conversation::Conversation::subscribe`] to be told whenever the
//! controller mutates a [`Session`]. A presentation layer redraws from these
//! notifications instead of polling the session.
//!
//! # Example
//!
//! ```rust
//! use carebuddy::{SessionObserver, Turn};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct TurnCounter(AtomicUsize);
//!
//! impl SessionObserver for TurnCounter {
//!     fn on_turn_appended(&self, _turn: &Turn) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//! ```

use crate::session::{Session, Turn};
use std::sync::Arc;

/// Notified by the controller as it mutates a session.
///
/// All methods have default no-op implementations so observers only
/// override what they care about. Calls arrive on the task driving the
/// controller, in mutation order.
pub trait SessionObserver: Send + Sync {
    /// A turn was appended to the transcript.
    fn on_turn_appended(&self, turn: &Turn) {
        let _ = turn;
    }

    /// A question was sent; the session is waiting for the reply.
    fn on_completion_started(&self, question: &str) {
        let _ = question;
    }

    /// The reply (or error turn) arrived; `succeeded` is false for an error turn.
    fn on_completion_finished(&self, succeeded: bool) {
        let _ = succeeded;
    }

    /// Extraction started for an uploaded document of `size` bytes.
    fn on_extraction_started(&self, size: usize) {
        let _ = size;
    }

    /// A report was loaded with `chars` characters of text.
    fn on_document_loaded(&self, chars: usize) {
        let _ = chars;
    }

    /// The uploaded document yielded no readable text.
    fn on_no_readable_text(&self) {}

    /// Extraction failed; the context fell back to "no report".
    fn on_extraction_failed(&self, reason: &str) {
        let _ = reason;
    }

    /// The session was cleared.
    fn on_session_cleared(&self) {}

    /// Fired after every mutation with the session's new state.
    fn on_state_changed(&self, session: &Session) {
        let _ = session;
    }
}

/// An observer that ignores every notification.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// Shared observer handle.
pub type ObserverHandle = Arc<dyn SessionObserver>;
