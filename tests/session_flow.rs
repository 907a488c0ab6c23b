//! Session behaviour through the public controller API.
//!
//! The completion client and text extractor are replaced by scripted fakes,
//! so these tests need neither network access nor pdfium/tesseract.

use async_trait::async_trait;
use carebuddy::prompts::{CLEARED_GREETING, NO_REPORT_CONTEXT, WELCOME_GREETING};
use carebuddy::{
    AssistantError, CompletionClient, CompletionError, Conversation, DocumentKind,
    ExtractionError, Role, Session, SessionObserver, TextExtractor, Turn, UploadOutcome,
    RECENT_QUERIES_CAPACITY,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

// ── Fakes ────────────────────────────────────────────────────────────────────

/// Replays scripted replies in order and records every (question, context).
#[derive(Default)]
struct ScriptedClient {
    replies: Mutex<VecDeque<Result<String, CompletionError>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedClient {
    fn replying(replies: Vec<Result<String, CompletionError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::default(),
        })
    }

    fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, question: &str, context: &str) -> Result<String, CompletionError> {
        self.calls
            .lock()
            .unwrap()
            .push((question.to_string(), context.to_string()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("answer to {question}")))
    }
}

/// Returns a fixed extraction result.
struct FakeExtractor(Result<&'static str, &'static str>);

#[async_trait]
impl TextExtractor for FakeExtractor {
    async fn extract(&self, _bytes: &[u8], _kind: DocumentKind) -> Result<String, ExtractionError> {
        match self.0 {
            Ok(text) => Ok(text.to_string()),
            Err(reason) => Err(ExtractionError::Pdf(reason.to_string())),
        }
    }
}

/// Logs every notification as a short string.
#[derive(Default)]
struct EventLog(Mutex<Vec<String>>);

impl EventLog {
    fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.0.lock().unwrap().push(event);
    }
}

impl SessionObserver for EventLog {
    fn on_turn_appended(&self, turn: &Turn) {
        self.push(format!("turn:{}", turn.role()));
    }
    fn on_completion_started(&self, question: &str) {
        self.push(format!("started:{question}"));
    }
    fn on_completion_finished(&self, succeeded: bool) {
        self.push(format!("finished:{succeeded}"));
    }
    fn on_document_loaded(&self, chars: usize) {
        self.push(format!("loaded:{chars}"));
    }
    fn on_no_readable_text(&self) {
        self.push("no-text".into());
    }
    fn on_extraction_failed(&self, _reason: &str) {
        self.push("extraction-failed".into());
    }
    fn on_session_cleared(&self) {
        self.push("cleared".into());
    }
    fn on_state_changed(&self, session: &Session) {
        self.push(format!("state:{}", session.transcript().len()));
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn conversation(
    client: Arc<ScriptedClient>,
    extracted: Result<&'static str, &'static str>,
) -> Conversation {
    init_tracing();
    Conversation::new(client, Arc::new(FakeExtractor(extracted)))
}

fn contents(session: &Session) -> Vec<(Role, String)> {
    session
        .transcript()
        .turns()
        .iter()
        .map(|t| (t.role(), t.content().to_string()))
        .collect()
}

// ── Submit ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn question_without_report_sends_sentinel_context() {
    let client = ScriptedClient::replying(vec![Ok("Normal range is 120/80.".into())]);
    let conv = conversation(client.clone(), Ok(""));
    let mut session = Session::new();

    conv.submit(&mut session, "What is a normal blood pressure?")
        .await
        .unwrap();

    assert_eq!(
        client.calls(),
        vec![(
            "What is a normal blood pressure?".to_string(),
            NO_REPORT_CONTEXT.to_string()
        )]
    );
    assert_eq!(
        contents(&session),
        vec![
            (Role::Assistant, WELCOME_GREETING.to_string()),
            (Role::User, "What is a normal blood pressure?".to_string()),
            (Role::Assistant, "Normal range is 120/80.".to_string()),
        ]
    );
    assert_eq!(
        session.recent_queries().iter().collect::<Vec<_>>(),
        vec!["What is a normal blood pressure?"]
    );
}

#[tokio::test]
async fn every_submit_adds_exactly_two_turns() {
    let client = ScriptedClient::replying(vec![
        Ok("fine".into()),
        Err(CompletionError::Unexpected("connection reset".into())),
        Ok("also fine".into()),
    ]);
    let conv = conversation(client, Ok(""));
    let mut session = Session::new();

    for (i, q) in ["one", "two", "three"].iter().enumerate() {
        let before = session.transcript().len();
        conv.submit(&mut session, q).await.unwrap();
        assert_eq!(session.transcript().len(), before + 2, "submit #{i}");
        assert!(session.is_idle());
    }
}

#[tokio::test]
async fn rate_limit_becomes_error_turn() {
    let client = ScriptedClient::replying(vec![Err(CompletionError::Http {
        status: 429,
        detail: "rate limited".into(),
    })]);
    let conv = conversation(client, Ok(""));
    let mut session = Session::new();

    let reply = conv.submit(&mut session, "Is 11.2 low?").await.unwrap();

    assert_eq!(reply.role(), Role::Assistant);
    assert_eq!(reply.content(), "Error: API Error: 429 - rate limited");
    assert_eq!(session.transcript().len(), 3);
    assert_eq!(session.recent_queries().get(0), Some("Is 11.2 low?"));
}

#[tokio::test]
async fn recent_queries_keep_five_newest_first() {
    let conv = conversation(ScriptedClient::replying(vec![]), Ok(""));
    let mut session = Session::new();

    for q in ["q1", "q2", "q3", "q4", "q5", "q6", "q7"] {
        conv.submit(&mut session, q).await.unwrap();
    }

    assert_eq!(session.recent_queries().len(), RECENT_QUERIES_CAPACITY);
    assert_eq!(
        session.recent_queries().iter().collect::<Vec<_>>(),
        vec!["q7", "q6", "q5", "q4", "q3"]
    );
}

#[tokio::test]
async fn repeating_latest_question_is_not_recorded_twice() {
    let conv = conversation(ScriptedClient::replying(vec![]), Ok(""));
    let mut session = Session::new();

    conv.submit(&mut session, "same").await.unwrap();
    conv.submit(&mut session, "same").await.unwrap();

    assert_eq!(session.recent_queries().len(), 1);
    assert_eq!(session.transcript().len(), 5);
}

#[tokio::test]
async fn resubmit_recent_asks_again() {
    let client = ScriptedClient::replying(vec![]);
    let conv = conversation(client.clone(), Ok(""));
    let mut session = Session::new();

    conv.submit(&mut session, "older").await.unwrap();
    conv.submit(&mut session, "newer").await.unwrap();
    let reply = conv.resubmit_recent(&mut session, 1).await.unwrap();

    assert_eq!(reply.content(), "answer to older");
    assert_eq!(client.calls().last().map(|c| c.0.as_str()), Some("older"));
    // Only the head entry is deduplicated.
    assert_eq!(
        session.recent_queries().iter().collect::<Vec<_>>(),
        vec!["older", "newer", "older"]
    );
}

// ── Upload ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn uploaded_report_is_sent_with_next_question() {
    let client = ScriptedClient::replying(vec![Ok("It is slightly below range.".into())]);
    let conv = conversation(client.clone(), Ok("Hemoglobin: 11.2 g/dL"));
    let mut session = Session::new();

    let outcome = conv
        .upload_document(&mut session, b"%PDF-1.4", DocumentKind::Pdf)
        .await
        .unwrap();
    assert_eq!(outcome, UploadOutcome::Loaded { chars: 21 });

    conv.submit(&mut session, "What does this mean?").await.unwrap();

    assert_eq!(
        client.calls(),
        vec![(
            "What does this mean?".to_string(),
            "Hemoglobin: 11.2 g/dL".to_string()
        )]
    );
}

#[tokio::test]
async fn mislabelled_pdf_drops_previous_report() {
    let client = ScriptedClient::replying(vec![]);
    let conv = conversation(client.clone(), Ok("LDL: 130 mg/dL"));
    let mut session = Session::new();
    let dir = tempfile::tempdir().unwrap();

    let good = dir.path().join("labs.pdf");
    std::fs::write(&good, b"%PDF-1.4\n...").unwrap();
    conv.upload_path(&mut session, &good).await.unwrap();
    assert_eq!(session.context().as_str(), "LDL: 130 mg/dL");

    let bad = dir.path().join("new_report.pdf");
    std::fs::write(&bad, b"GIF89a\x01\x00").unwrap();
    let outcome = conv.upload_path(&mut session, &bad).await.unwrap();

    assert!(matches!(outcome, UploadOutcome::Failed { .. }));
    assert_eq!(session.context().as_str(), NO_REPORT_CONTEXT);

    conv.submit(&mut session, "What does this mean?").await.unwrap();
    assert_eq!(client.calls()[0].1, NO_REPORT_CONTEXT);
}

#[tokio::test]
async fn missing_or_empty_file_drops_previous_report() {
    let conv = conversation(ScriptedClient::replying(vec![]), Ok("TSH: 2.1 mIU/L"));
    let mut session = Session::new();
    let dir = tempfile::tempdir().unwrap();

    let good = dir.path().join("scan.png");
    std::fs::write(&good, b"png bytes").unwrap();
    conv.upload_path(&mut session, &good).await.unwrap();
    assert!(session.context().has_report());

    let missing = dir.path().join("gone.png");
    assert!(matches!(
        conv.upload_path(&mut session, &missing).await.unwrap(),
        UploadOutcome::Failed { .. }
    ));
    assert!(!session.context().has_report());

    conv.upload_path(&mut session, &good).await.unwrap();
    let empty = dir.path().join("empty.pdf");
    std::fs::write(&empty, b"").unwrap();
    assert!(matches!(
        conv.upload_path(&mut session, &empty).await.unwrap(),
        UploadOutcome::Failed { .. }
    ));
    assert!(!session.context().has_report());
}

#[tokio::test]
async fn unsupported_file_type_changes_nothing() {
    let conv = conversation(ScriptedClient::replying(vec![]), Ok("Iron: 40"));
    let mut session = Session::new();
    let dir = tempfile::tempdir().unwrap();

    let good = dir.path().join("labs.pdf");
    std::fs::write(&good, b"%PDF").unwrap();
    conv.upload_path(&mut session, &good).await.unwrap();

    let notes = dir.path().join("notes.txt");
    std::fs::write(&notes, b"hello").unwrap();
    let err = conv.upload_path(&mut session, &notes).await.unwrap_err();

    assert!(matches!(err, AssistantError::UnsupportedDocument { .. }));
    assert_eq!(session.context().as_str(), "Iron: 40");
}

#[tokio::test]
async fn blank_extraction_leaves_sentinel() {
    let conv = conversation(ScriptedClient::replying(vec![]), Ok("  \n\t "));
    let mut session = Session::new();

    let outcome = conv
        .upload_document(&mut session, b"png bytes", DocumentKind::Png)
        .await
        .unwrap();

    assert_eq!(outcome, UploadOutcome::NoReadableText);
    assert!(!session.context().has_report());
    assert_eq!(session.context().as_str(), NO_REPORT_CONTEXT);
    assert_eq!(session.transcript().len(), 1);
}

#[tokio::test]
async fn failed_extraction_replaces_previous_report() {
    let client = ScriptedClient::replying(vec![]);
    let mut session = Session::new();

    let good = conversation(client.clone(), Ok("LDL: 130 mg/dL"));
    good.upload_document(&mut session, b"%PDF", DocumentKind::Pdf)
        .await
        .unwrap();
    assert!(session.context().has_report());

    let bad = conversation(client, Err("corrupt xref table"));
    let outcome = bad
        .upload_document(&mut session, b"%PDF", DocumentKind::Pdf)
        .await
        .unwrap();

    assert!(matches!(outcome, UploadOutcome::Failed { ref reason } if reason.contains("corrupt xref")));
    assert_eq!(session.context().as_str(), NO_REPORT_CONTEXT);
}

// ── Clear ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn clear_resets_everything() {
    let conv = conversation(ScriptedClient::replying(vec![]), Ok("TSH: 2.1 mIU/L"));
    let mut session = Session::new();
    conv.upload_document(&mut session, b"%PDF", DocumentKind::Pdf)
        .await
        .unwrap();
    conv.submit(&mut session, "Is my thyroid ok?").await.unwrap();
    conv.submit(&mut session, "What is TSH?").await.unwrap();

    conv.clear(&mut session).unwrap();

    assert_eq!(
        contents(&session),
        vec![(Role::Assistant, CLEARED_GREETING.to_string())]
    );
    assert!(session.recent_queries().is_empty());
    assert_eq!(session.context().as_str(), NO_REPORT_CONTEXT);
    assert!(session.is_idle());
}

// ── Observers ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn observers_see_mutations_in_order() {
    let log = Arc::new(EventLog::default());
    let mut conv = conversation(
        ScriptedClient::replying(vec![Ok("ok".into())]),
        Ok("Glucose: 92"),
    );
    conv.subscribe(log.clone());
    let mut session = Session::new();

    conv.upload_document(&mut session, b"%PDF", DocumentKind::Pdf)
        .await
        .unwrap();
    conv.submit(&mut session, "q").await.unwrap();
    conv.clear(&mut session).unwrap();

    assert_eq!(
        log.events(),
        vec![
            "loaded:11",
            "state:1",
            "turn:User",
            "started:q",
            "state:2",
            "finished:true",
            "turn:Assistant",
            "state:3",
            "cleared",
            "state:1",
        ]
    );
}

#[tokio::test]
async fn observers_hear_about_failures() {
    let log = Arc::new(EventLog::default());
    let mut conv = conversation(
        ScriptedClient::replying(vec![Err(CompletionError::Unexpected("boom".into()))]),
        Err("unreadable"),
    );
    conv.subscribe(log.clone());
    let mut session = Session::new();

    conv.upload_document(&mut session, b"%PDF", DocumentKind::Pdf)
        .await
        .unwrap();
    conv.submit(&mut session, "q").await.unwrap();

    let events = log.events();
    assert!(events.contains(&"extraction-failed".to_string()));
    assert!(events.contains(&"finished:false".to_string()));
}

#[tokio::test]
async fn sessions_are_independent() {
    let conv = conversation(ScriptedClient::replying(vec![]), Ok("Iron: 40"));
    let mut a = Session::new();
    let mut b = Session::new();

    conv.upload_document(&mut a, b"%PDF", DocumentKind::Pdf)
        .await
        .unwrap();
    conv.submit(&mut a, "only in a").await.unwrap();

    assert_eq!(b.transcript().len(), 1);
    assert!(b.recent_queries().is_empty());
    assert!(!b.context().has_report());

    conv.clear(&mut b).unwrap();
    assert_eq!(a.transcript().len(), 3);
}
