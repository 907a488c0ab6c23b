//! Configuration for the assistant.
//!
//! Every knob lives in [`AssistantConfig`], built via its
//! [`AssistantConfigBuilder`] or loaded with [`AssistantConfig::from_env`].
//! The API key is the only required setting; everything else has a default
//! that matches the hosted OpenRouter endpoint.

use crate::error::AssistantError;
use std::fmt;
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Environment variable holding the API credential.
pub const API_KEY_VAR: &str = "OPENROUTER_API_KEY";

/// Default chat-completion endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "openai/gpt-3.5-turbo";

/// Default completion budget per answer.
pub const DEFAULT_MAX_TOKENS: u32 = 500;

/// Default number of extracted documents kept in the extraction cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 32;

/// Configuration for a carebuddy session.
///
/// # Example
/// ```rust
/// use carebuddy::AssistantConfig;
///
/// let config = AssistantConfig::builder("sk-or-test")
///     .model("openai/gpt-4o-mini")
///     .max_tokens(800)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_tokens, 800);
/// ```
#[derive(Clone)]
pub struct AssistantConfig {
    /// Bearer credential for the completion endpoint.
    pub api_key: String,

    /// Chat-completion URL. Default: [`DEFAULT_ENDPOINT`].
    pub endpoint: String,

    /// Model identifier sent in every request. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// `max_tokens` sent in every request. Default: 500.
    pub max_tokens: u32,

    /// Custom system instruction. If None, uses
    /// [`crate::prompts::DEFAULT_SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,

    /// OCR executable. Default: `tesseract` (looked up on `PATH`).
    pub tesseract_cmd: String,

    /// Tesseract language code, e.g. `eng`. None uses the engine default.
    pub ocr_language: Option<String>,

    /// Path to a pdfium shared library. None binds the system library.
    pub pdfium_library: Option<PathBuf>,

    /// Documents kept in the extraction cache before LRU eviction. Default: 32.
    pub cache_capacity: NonZeroUsize,
}

impl fmt::Debug for AssistantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssistantConfig")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("system_prompt", &self.system_prompt.as_ref().map(|p| p.len()))
            .field("tesseract_cmd", &self.tesseract_cmd)
            .field("ocr_language", &self.ocr_language)
            .field("pdfium_library", &self.pdfium_library)
            .field("cache_capacity", &self.cache_capacity)
            .finish()
    }
}

impl AssistantConfig {
    /// Create a new builder with the given API key and defaults elsewhere.
    pub fn builder(api_key: impl Into<String>) -> AssistantConfigBuilder {
        AssistantConfigBuilder {
            config: Self {
                api_key: api_key.into(),
                endpoint: DEFAULT_ENDPOINT.to_string(),
                model: DEFAULT_MODEL.to_string(),
                max_tokens: DEFAULT_MAX_TOKENS,
                system_prompt: None,
                tesseract_cmd: "tesseract".to_string(),
                ocr_language: None,
                pdfium_library: None,
                cache_capacity: NonZeroUsize::new(DEFAULT_CACHE_CAPACITY)
                    .unwrap_or(NonZeroUsize::MIN),
            },
        }
    }

    /// Load configuration from the process environment.
    ///
    /// Reads `OPENROUTER_API_KEY` (required), and optionally
    /// `CAREBUDDY_ENDPOINT`, `CAREBUDDY_MODEL`, `CAREBUDDY_MAX_TOKENS`,
    /// `CAREBUDDY_OCR_LANG` and `PDFIUM_LIB_PATH`. Does not load `.env`
    /// files; the binary does that before calling this.
    ///
    /// # Errors
    /// [`AssistantError::MissingCredential`] when the key is unset or empty.
    pub fn from_env() -> Result<Self, AssistantError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reading from an arbitrary
    /// lookup, so tests never touch the real environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AssistantError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get(API_KEY_VAR).ok_or_else(|| AssistantError::MissingCredential {
            var: API_KEY_VAR.to_string(),
        })?;

        let mut builder = Self::builder(api_key);
        if let Some(endpoint) = get("CAREBUDDY_ENDPOINT") {
            builder = builder.endpoint(endpoint);
        }
        if let Some(model) = get("CAREBUDDY_MODEL") {
            builder = builder.model(model);
        }
        if let Some(raw) = get("CAREBUDDY_MAX_TOKENS") {
            let n = raw.trim().parse::<u32>().map_err(|_| {
                AssistantError::InvalidConfig(format!(
                    "CAREBUDDY_MAX_TOKENS must be a positive integer, got '{raw}'"
                ))
            })?;
            builder = builder.max_tokens(n);
        }
        if let Some(lang) = get("CAREBUDDY_OCR_LANG") {
            builder = builder.ocr_language(lang);
        }
        if let Some(path) = get("PDFIUM_LIB_PATH") {
            builder = builder.pdfium_library(path);
        }
        builder.build()
    }
}

/// Builder for [`AssistantConfig`].
#[derive(Debug)]
pub struct AssistantConfigBuilder {
    config: AssistantConfig,
}

impl AssistantConfigBuilder {
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn max_tokens(mut self, n: u32) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn tesseract_cmd(mut self, cmd: impl Into<String>) -> Self {
        self.config.tesseract_cmd = cmd.into();
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = Some(lang.into());
        self
    }

    pub fn pdfium_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library = Some(path.into());
        self
    }

    pub fn cache_capacity(mut self, n: usize) -> Self {
        self.config.cache_capacity = NonZeroUsize::new(n).unwrap_or(NonZeroUsize::MIN);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AssistantConfig, AssistantError> {
        let c = &self.config;
        if c.api_key.trim().is_empty() {
            return Err(AssistantError::MissingCredential {
                var: API_KEY_VAR.to_string(),
            });
        }
        if !(c.endpoint.starts_with("http://") || c.endpoint.starts_with("https://")) {
            return Err(AssistantError::InvalidConfig(format!(
                "endpoint must be an HTTP/HTTPS URL, got '{}'",
                c.endpoint
            )));
        }
        if c.model.trim().is_empty() {
            return Err(AssistantError::InvalidConfig("model must not be empty".into()));
        }
        if c.max_tokens == 0 {
            return Err(AssistantError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        if c.tesseract_cmd.trim().is_empty() {
            return Err(AssistantError::InvalidConfig(
                "tesseract command must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
