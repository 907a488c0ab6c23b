//! Session state: transcript, recent questions and document context.
//!
//! A [`Session`] is a plain owned value. It is created with a welcome turn,
//! mutated only through [`crate::conversation::Conversation`], and reset in
//! place by a clear. Nothing here is global; two sessions never share state.

use crate::prompts::{NO_REPORT_CONTEXT, WELCOME_GREETING};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Maximum number of questions kept in [`RecentQueries`].
pub const RECENT_QUERIES_CAPACITY: usize = 5;

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Title-cased label used in exports.
    pub fn title(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// One transcript entry. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Ordered record of turns. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    /// A transcript holding only the given assistant greeting.
    pub fn seeded(greeting: &str) -> Self {
        Self {
            turns: vec![Turn::assistant(greeting)],
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// True only for a transcript with no turns.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The most recent turn. A transcript always has at least one.
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub(crate) fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub(crate) fn reset(&mut self, greeting: &str) {
        self.turns.clear();
        self.turns.push(Turn::assistant(greeting));
    }
}

/// Most-recent-first list of submitted questions, at most
/// [`RECENT_QUERIES_CAPACITY`] long.
///
/// A question equal to the current head is not recorded twice in a row.
/// Repeats further down the list are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecentQueries {
    items: VecDeque<String>,
}

impl RecentQueries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a question at the head, evicting the oldest past capacity.
    pub fn record(&mut self, question: &str) {
        if self.items.front().map(String::as_str) == Some(question) {
            return;
        }
        self.items.push_front(question.to_string());
        self.items.truncate(RECENT_QUERIES_CAPACITY);
    }

    /// Questions, most recent first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.items.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
    }
}

/// Text derived from the uploaded report, or the "no report" sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DocumentContext {
    /// No usable report; the model receives [`NO_REPORT_CONTEXT`].
    #[default]
    NoReport,
    /// Extracted text of the most recent report.
    Report(String),
}

impl DocumentContext {
    /// Build a context from extracted text; blank text becomes the sentinel.
    pub fn from_extracted(text: String) -> Self {
        if text.trim().is_empty() {
            DocumentContext::NoReport
        } else {
            DocumentContext::Report(text)
        }
    }

    /// The string sent to the model.
    pub fn as_str(&self) -> &str {
        match self {
            DocumentContext::NoReport => NO_REPORT_CONTEXT,
            DocumentContext::Report(text) => text,
        }
    }

    pub fn has_report(&self) -> bool {
        matches!(self, DocumentContext::Report(_))
    }
}

/// Controller phase for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    AwaitingCompletion,
}

/// Everything one interactive session owns.
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) transcript: Transcript,
    pub(crate) recent: RecentQueries,
    pub(crate) context: DocumentContext,
    pub(crate) phase: Phase,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// A fresh session: welcome turn, no recent questions, no report.
    pub fn new() -> Self {
        Self {
            transcript: Transcript::seeded(WELCOME_GREETING),
            recent: RecentQueries::new(),
            context: DocumentContext::NoReport,
            phase: Phase::Idle,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn recent_queries(&self) -> &RecentQueries {
        &self.recent
    }

    pub fn context(&self) -> &DocumentContext {
        &self.context
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }
}
