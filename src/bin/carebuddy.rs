//! CLI binary for carebuddy.
//!
//! An interactive terminal front-end over the library: it owns one
//! [`Session`], forwards commands to the [`Conversation`] controller and
//! redraws from [`SessionObserver`] notifications.

use anyhow::{Context, Result};
use carebuddy::prompts::{CLEARED_GREETING, NO_REPORT_CONTEXT};
use carebuddy::{
    export_transcript, AssistantConfig, AssistantError, CompletionClient, Conversation,
    OpenRouterClient, Role, Session, SessionObserver, Turn, UploadOutcome,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── Terminal observer using indicatif ────────────────────────────────────────

/// Prints assistant turns and upload results, and shows a spinner while the
/// session waits on extraction or on the model.
struct TerminalObserver {
    spinner: Mutex<Option<ProgressBar>>,
}

impl TerminalObserver {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            spinner: Mutex::new(None),
        })
    }

    fn start_spinner(&self, message: &'static str) {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_message(message);
        bar.enable_steady_tick(Duration::from_millis(80));

        if let Some(old) = self.lock().replace(bar) {
            old.finish_and_clear();
        }
    }

    fn stop_spinner(&self) {
        if let Some(bar) = self.lock().take() {
            bar.finish_and_clear();
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<ProgressBar>> {
        self.spinner.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl SessionObserver for TerminalObserver {
    fn on_turn_appended(&self, turn: &Turn) {
        if turn.role() == Role::Assistant {
            print_assistant(turn.content());
        }
    }

    fn on_completion_started(&self, _question: &str) {
        self.start_spinner("Thinking…");
    }

    fn on_completion_finished(&self, _succeeded: bool) {
        self.stop_spinner();
    }

    fn on_extraction_started(&self, _size: usize) {
        self.start_spinner("Extracting text…");
    }

    fn on_document_loaded(&self, chars: usize) {
        self.stop_spinner();
        println!(
            "{} {}  {}",
            green("✔"),
            bold("Report loaded!"),
            dim(&format!("{chars} chars — /context to view"))
        );
    }

    fn on_no_readable_text(&self) {
        self.stop_spinner();
        println!("{} No readable text found.", yellow("⚠"));
    }

    fn on_extraction_failed(&self, reason: &str) {
        self.stop_spinner();
        println!("{} Could not read the report: {}", yellow("⚠"), reason);
    }

    fn on_session_cleared(&self) {
        println!("{} Chat cleared.", cyan("◆"));
        print_assistant(CLEARED_GREETING);
    }
}

fn print_assistant(content: &str) {
    let body = if content.starts_with("Error:") {
        red(content)
    } else {
        content.to_string()
    };
    println!("\n{}\n{}\n", bold(&cyan("CareBuddy:")), body);
}

const AFTER_HELP: &str = r#"COMMANDS (inside the chat):
  <question>          Ask a health question
  /upload <path>      Load a PDF, PNG, JPG or JPEG report as context
  /context            Show the text extracted from the current report
  /recent             List recent questions
  /recent <n>         Ask recent question <n> again
  /clear              Clear the chat, the report and recent questions
  /download [dir]     Save the chat as CareBuddy_Chat_<timestamp>.txt
  /help               Show the command list
  /quit               Leave

ENVIRONMENT VARIABLES:
  OPENROUTER_API_KEY     API key (required; may live in a .env file)
  CAREBUDDY_MODEL        Model ID (default: openai/gpt-3.5-turbo)
  CAREBUDDY_ENDPOINT     Chat-completion URL
  CAREBUDDY_MAX_TOKENS   Completion budget per answer (default: 500)
  CAREBUDDY_OCR_LANG     Tesseract language code, e.g. eng
  PDFIUM_LIB_PATH        Path to libpdfium; default is the system library

EXAMPLES:
  carebuddy
  carebuddy --report labs.pdf
  carebuddy --check
"#;

/// Ask health questions about your medical reports.
#[derive(Parser, Debug)]
#[command(
    name = "carebuddy",
    version,
    about = "Ask health questions about your medical reports",
    long_about = "An interactive medical Q&A assistant. Upload a lab report (PDF or scanned \
image) and ask questions about it; answers come from a hosted chat model restricted to \
health topics. Not a substitute for professional medical advice.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Load this report before the chat starts.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Chat model ID (overrides CAREBUDDY_MODEL).
    #[arg(long)]
    model: Option<String>,

    /// Chat-completion URL (overrides CAREBUDDY_ENDPOINT).
    #[arg(long)]
    endpoint: Option<String>,

    /// Max tokens per answer (overrides CAREBUDDY_MAX_TOKENS).
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "CAREBUDDY_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// OCR executable.
    #[arg(long, env = "CAREBUDDY_TESSERACT", default_value = "tesseract")]
    tesseract: String,

    /// Tesseract language code (overrides CAREBUDDY_OCR_LANG).
    #[arg(long)]
    ocr_lang: Option<String>,

    /// Extracted documents kept in memory.
    #[arg(long, env = "CAREBUDDY_CACHE_CAPACITY", default_value_t = 32)]
    cache_capacity: usize,

    /// Directory for /download when none is given.
    #[arg(long, env = "CAREBUDDY_EXPORT_DIR", default_value = ".")]
    export_dir: PathBuf,

    /// Send one probe question, print the result and exit.
    #[arg(long)]
    check: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CAREBUDDY_VERBOSE")]
    verbose: bool,

    /// Suppress all logs except errors.
    #[arg(short, long, env = "CAREBUDDY_QUIET")]
    quiet: bool,
}

/// One line of chat input.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Ask(String),
    Upload(PathBuf),
    Context,
    Recent(Option<usize>),
    Clear,
    Download(Option<PathBuf>),
    Help,
    Quit,
    Empty,
    Invalid(String),
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    if !line.starts_with('/') {
        return Command::Ask(line.to_string());
    }

    let (name, arg) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    match name {
        "/upload" if arg.is_empty() => Command::Invalid("usage: /upload <path>".into()),
        "/upload" => Command::Upload(PathBuf::from(arg)),
        "/context" => Command::Context,
        "/recent" if arg.is_empty() => Command::Recent(None),
        "/recent" => match arg.parse::<usize>() {
            Ok(n) if n >= 1 => Command::Recent(Some(n)),
            _ => Command::Invalid(format!("recent questions are numbered from 1, got '{arg}'")),
        },
        "/clear" => Command::Clear,
        "/download" if arg.is_empty() => Command::Download(None),
        "/download" => Command::Download(Some(PathBuf::from(arg))),
        "/help" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        other => Command::Invalid(format!("unknown command '{other}' — try /help")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The chat itself is the feedback; library logs stay at WARN unless asked.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli).await?;

    if cli.check {
        return run_check(&config).await;
    }

    let mut conversation =
        Conversation::from_config(&config).context("Failed to initialise the assistant")?;
    conversation.subscribe(TerminalObserver::new());

    let mut session = Session::new();
    println!("{}", bold(&cyan("🩺 CareBuddy")));
    println!("{}", dim("Your friendly guide to understanding your health. /help for commands."));
    if let Some(first) = session.transcript().last() {
        print_assistant(first.content());
    }

    if let Some(ref path) = cli.report {
        upload(&conversation, &mut session, path).await?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", bold(&green("you ›")));
        io::stdout().flush().ok();

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };

        match parse_command(&line) {
            Command::Empty => {}
            Command::Ask(question) => {
                conversation.submit(&mut session, &question).await?;
            }
            Command::Upload(path) => upload(&conversation, &mut session, &path).await?,
            Command::Context => {
                let ctx = session.context();
                if ctx.has_report() {
                    println!("{}\n{}\n", bold("Extracted text:"), ctx.as_str());
                } else {
                    println!("{}", dim(NO_REPORT_CONTEXT));
                }
            }
            Command::Recent(None) => print_recent(&session),
            Command::Recent(Some(n)) => {
                if let Some(question) = session.recent_queries().get(n - 1) {
                    println!("{} {}", bold(&green("you ›")), question);
                }
                match conversation.resubmit_recent(&mut session, n - 1).await {
                    Ok(_) => {}
                    Err(e) => println!("{} {}", red("✘"), e),
                }
            }
            Command::Clear => conversation.clear(&mut session)?,
            Command::Download(dir) => {
                let dir = dir.unwrap_or_else(|| cli.export_dir.clone());
                let now = chrono::Local::now().naive_local();
                match export_transcript(session.transcript(), &dir, now).await {
                    Ok(path) => {
                        println!("{} Chat saved to {}", green("✔"), bold(&path.display().to_string()))
                    }
                    Err(e) => println!("{} {}", red("✘"), e),
                }
            }
            Command::Help => println!("{AFTER_HELP}"),
            Command::Quit => break,
            Command::Invalid(msg) => println!("{} {}", red("✘"), msg),
        }
    }

    Ok(())
}

/// Read a report from disk and hand it to the controller.
///
/// Only an unsupported file type leaves the session untouched; every other
/// failure drops the previous report and is printed by the observer.
async fn upload(conversation: &Conversation, session: &mut Session, path: &Path) -> Result<()> {
    println!("{} {}", cyan("◆"), dim(&format!("Reading {}…", path.display())));

    match conversation.upload_path(session, path).await {
        Ok(UploadOutcome::Failed { .. }) => {
            println!("{}", dim("Questions will be answered without a report."));
        }
        Ok(outcome) => tracing::debug!("Upload of {} → {:?}", path.display(), outcome),
        Err(e @ AssistantError::UnsupportedDocument { .. }) => println!("{} {}", red("✘"), e),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn print_recent(session: &Session) {
    let recent = session.recent_queries();
    if recent.is_empty() {
        println!("{}", dim("Your recent questions will appear here."));
        return;
    }
    println!("{}", bold("Recent searches:"));
    for (i, question) in recent.iter().enumerate() {
        println!("  {} {}", dim(&format!("{}.", i + 1)), question);
    }
}

/// Send one probe question and report the outcome.
async fn run_check(config: &AssistantConfig) -> Result<()> {
    let client = OpenRouterClient::new(config).context("Failed to build HTTP client")?;
    eprintln!("{} Probing {} with model {}…", cyan("◆"), config.endpoint, config.model);

    match client
        .complete("What does a hemoglobin of 11.2 mean?", NO_REPORT_CONTEXT)
        .await
    {
        Ok(answer) => {
            eprintln!("{} Status: OK", green("✔"));
            println!("{answer}");
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", red("✘"), e);
            anyhow::bail!("completion endpoint check failed")
        }
    }
}

/// Map environment and CLI flags to `AssistantConfig`.
async fn build_config(cli: &Cli) -> Result<AssistantConfig> {
    let mut config = AssistantConfig::from_env().context("Cannot start CareBuddy")?;

    if let Some(ref model) = cli.model {
        config.model = model.clone();
    }
    if let Some(ref endpoint) = cli.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(n) = cli.max_tokens {
        config.max_tokens = n;
    }
    if let Some(ref lang) = cli.ocr_lang {
        config.ocr_language = Some(lang.clone());
    }
    if let Some(ref path) = cli.system_prompt {
        config.system_prompt = Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt from {:?}", path))?,
        );
    }

    // Re-run validation over the overridden fields.
    let mut builder = AssistantConfig::builder(config.api_key.clone())
        .endpoint(config.endpoint.clone())
        .model(config.model.clone())
        .max_tokens(config.max_tokens)
        .tesseract_cmd(cli.tesseract.clone())
        .cache_capacity(cli.cache_capacity);
    if let Some(prompt) = config.system_prompt.take() {
        builder = builder.system_prompt(prompt);
    }
    if let Some(lang) = config.ocr_language.take() {
        builder = builder.ocr_language(lang);
    }
    if let Some(path) = config.pdfium_library.take() {
        builder = builder.pdfium_library(path);
    }

    builder.build().context("Invalid configuration")
}
