//! AI text generation behind one interface.
//!
//! The active provider is resolved per request from the stored AI
//! configuration and turned into a [`Provider`] by a [`ProviderFactory`].
//! Callers only see [`TextGenerator`], so switching providers never changes
//! the calling code. There are no retries here; a failed generation is
//! reported and the user re-runs it.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::RegexSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod anthropic;
pub mod cli;
#[cfg(test)]
pub mod mock;
pub mod openai;
pub mod prompts;

use anthropic::AnthropicClient;
use cli::ClaudeCli;
use openai::OpenAiClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    #[serde(rename = "claude")]
    Claude,
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "claude_cli")]
    ClaudeCli,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::Claude,
        ProviderKind::OpenAi,
        ProviderKind::ClaudeCli,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Claude => "claude",
            ProviderKind::OpenAi => "openai",
            ProviderKind::ClaudeCli => "claude_cli",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Claude | ProviderKind::ClaudeCli => "claude-sonnet-4-20250514",
            ProviderKind::OpenAi => "gpt-4",
        }
    }

    /// Environment variable consulted when no credential is stored.
    /// `None` for providers that run without one.
    pub fn credential_env(&self) -> Option<&'static str> {
        match self {
            ProviderKind::Claude => Some("ANTHROPIC_API_KEY"),
            ProviderKind::OpenAi => Some("OPENAI_API_KEY"),
            ProviderKind::ClaudeCli => None,
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ProviderError::UnknownProvider(s.to_string()))
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    TailoredResume,
    CoverLetter,
    /// Minimal round trip used to check a provider's settings.
    ConnectionTest,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub kind: PromptKind,
    /// Master resume for tailoring; the tailored resume for cover letters.
    pub resume: String,
    pub job_description: String,
    pub company: String,
    pub job_title: String,
    pub hiring_manager: Option<String>,
}

impl GenerationRequest {
    pub fn tailored_resume(master_resume: &str, job_description: &str) -> Self {
        GenerationRequest {
            kind: PromptKind::TailoredResume,
            resume: master_resume.to_string(),
            job_description: job_description.to_string(),
            company: String::new(),
            job_title: String::new(),
            hiring_manager: None,
        }
    }

    pub fn cover_letter(
        tailored_resume: &str,
        job_description: &str,
        company: &str,
        job_title: &str,
        hiring_manager: Option<&str>,
    ) -> Self {
        GenerationRequest {
            kind: PromptKind::CoverLetter,
            resume: tailored_resume.to_string(),
            job_description: job_description.to_string(),
            company: company.to_string(),
            job_title: job_title.to_string(),
            hiring_manager: hiring_manager.map(str::to_string),
        }
    }

    pub fn connection_test() -> Self {
        GenerationRequest {
            kind: PromptKind::ConnectionTest,
            resume: String::new(),
            job_description: String::new(),
            company: String::new(),
            job_title: String::new(),
            hiring_manager: None,
        }
    }

    /// Output budget for hosted APIs.
    pub fn max_output_tokens(&self) -> u32 {
        match self.kind {
            PromptKind::TailoredResume => 8192,
            PromptKind::CoverLetter => 2048,
            PromptKind::ConnectionTest => 16,
        }
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no credential for {provider}: save one in AI settings or set {env_var}")]
    MissingCredential {
        provider: ProviderKind,
        env_var: &'static str,
    },

    #[error("credential does not look like a {provider} key: {reason}")]
    InvalidCredential {
        provider: ProviderKind,
        reason: &'static str,
    },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("rate limit or quota exceeded: {0}")]
    Quota(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("no response within {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("provider returned an unusable response: {0}")]
    MalformedResponse(String),

    #[error("provider API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("prompt is too large for {model} (~{estimated_tokens} tokens)")]
    PromptTooLarge { model: String, estimated_tokens: usize },

    #[error("local CLI is not available: {0}")]
    Unavailable(String),

    #[error("local CLI failed: {0}")]
    Process(String),

    #[error("unknown AI provider '{0}'")]
    UnknownProvider(String),
}

impl ProviderError {
    /// Maps a non-success HTTP status from a hosted API.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => ProviderError::Auth(message),
            429 | 529 => ProviderError::Quota(message),
            400 if message.to_lowercase().contains("credit balance") => {
                ProviderError::Quota(message)
            }
            _ => ProviderError::Api { status, message },
        }
    }

    pub fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout(timeout)
        } else if err.is_decode() {
            ProviderError::MalformedResponse(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

/// Anything that turns a prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError>;

    fn kind(&self) -> ProviderKind;

    fn model(&self) -> &str;
}

/// The fixed set of live backends.
pub enum Provider {
    Claude(AnthropicClient),
    OpenAi(OpenAiClient),
    ClaudeCli(ClaudeCli),
}

#[async_trait]
impl TextGenerator for Provider {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        match self {
            Provider::Claude(client) => client.generate(request).await,
            Provider::OpenAi(client) => client.generate(request).await,
            Provider::ClaudeCli(cli) => cli.generate(request).await,
        }
    }

    fn kind(&self) -> ProviderKind {
        match self {
            Provider::Claude(_) => ProviderKind::Claude,
            Provider::OpenAi(_) => ProviderKind::OpenAi,
            Provider::ClaudeCli(_) => ProviderKind::ClaudeCli,
        }
    }

    fn model(&self) -> &str {
        match self {
            Provider::Claude(client) => client.model(),
            Provider::OpenAi(client) => client.model(),
            Provider::ClaudeCli(cli) => cli.model(),
        }
    }
}

/// The provider selection for one request, with its credential already
/// decrypted (or taken from the environment).
#[derive(Clone)]
pub struct ActiveProvider {
    pub kind: ProviderKind,
    pub model: String,
    pub credential: Option<String>,
}

impl fmt::Debug for ActiveProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveProvider")
            .field("kind", &self.kind)
            .field("model", &self.model)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ActiveProvider {
    fn require_credential(&self) -> Result<String, ProviderError> {
        match (&self.credential, self.kind.credential_env()) {
            (Some(key), _) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            (_, Some(env_var)) => Err(ProviderError::MissingCredential {
                provider: self.kind,
                env_var,
            }),
            (_, None) => Ok(String::new()),
        }
    }
}

/// Builds a generator for the active provider. Swapped for a mock in tests.
pub trait ProviderFactory: Send + Sync {
    fn build(&self, active: &ActiveProvider) -> Result<Box<dyn TextGenerator>, ProviderError>;
}

/// Factory for the real backends. One HTTP client is shared by both hosted APIs.
pub struct LiveProviders {
    http: reqwest::Client,
    claude_cli: String,
    timeout: Duration,
}

impl LiveProviders {
    pub fn new(claude_cli: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(LiveProviders {
            http: reqwest::Client::builder().timeout(timeout).build()?,
            claude_cli,
            timeout,
        })
    }
}

impl ProviderFactory for LiveProviders {
    fn build(&self, active: &ActiveProvider) -> Result<Box<dyn TextGenerator>, ProviderError> {
        let provider = match active.kind {
            ProviderKind::Claude => Provider::Claude(AnthropicClient::new(
                self.http.clone(),
                active.require_credential()?,
                active.model.clone(),
                self.timeout,
            )),
            ProviderKind::OpenAi => Provider::OpenAi(OpenAiClient::new(
                self.http.clone(),
                active.require_credential()?,
                active.model.clone(),
                self.timeout,
            )),
            ProviderKind::ClaudeCli => Provider::ClaudeCli(ClaudeCli::new(
                &self.claude_cli,
                active.model.clone(),
                self.timeout,
            )?),
        };
        Ok(Box::new(provider))
    }
}

/// Runs one generation and cleans the output into a plain markdown document.
pub async fn generate_document(
    generator: &dyn TextGenerator,
    request: &GenerationRequest,
) -> Result<String, ProviderError> {
    let raw = generator.generate(request).await?;
    let text = strip_code_fences(&raw);
    let text = match request.kind {
        PromptKind::CoverLetter => clean_cover_letter(text),
        PromptKind::TailoredResume | PromptKind::ConnectionTest => text.to_string(),
    };

    if text.trim().is_empty() {
        return Err(ProviderError::MalformedResponse(
            "provider returned an empty document".to_string(),
        ));
    }
    Ok(text)
}

/// Strips a ```markdown ... ``` (or any-language) fence wrapping the whole output.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the language tag on the opening fence line.
    let body = match rest.find('\n') {
        Some(newline) if !rest[..newline].contains(' ') => &rest[newline + 1..],
        _ => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .map(str::trim)
        .unwrap_or(body.trim())
}

static PLACEHOLDER_LINES: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)^\[(?:current date|your name|your address|company address|company name|hiring manager|phone|email|date)\].*$",
        r"(?i)^\[city,?\s*state,?\s*zip\].*$",
        r"^\d{1,2}/\d{1,2}/\d{2,4}$",
        r"^[A-Z][a-z]+ \d{1,2},? \d{4}$",
    ])
    .unwrap_or_else(|e| panic!("invalid placeholder pattern: {e}"))
});

/// Removes template placeholders and a dated letter header from a cover letter,
/// along with blank lines they leave behind.
pub fn clean_cover_letter(text: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    let mut after_removal = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if PLACEHOLDER_LINES.is_match(trimmed) {
            after_removal = true;
            continue;
        }
        if after_removal && trimmed.is_empty() {
            continue;
        }
        after_removal = false;
        kept.push(line);
    }

    let first = kept.iter().position(|l| !l.trim().is_empty()).unwrap_or(kept.len());
    kept[first..].join("\n")
}
