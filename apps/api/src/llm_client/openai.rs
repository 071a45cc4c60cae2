//! OpenAI chat completions backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::prompts;
use super::{GenerationRequest, ProviderError, ProviderKind, TextGenerator};

const OPENAI_API_URL: &str = "https://api.openai.com";

/// Ceiling on completion tokens, whatever the model allows.
const MAX_COMPLETION_TOKENS: usize = 4096;
/// Slack left for message framing.
const TOKEN_BUFFER: usize = 100;
/// Smallest completion worth asking for.
const MIN_COMPLETION_TOKENS: usize = 256;
/// Context window assumed for models missing from the table.
const DEFAULT_CONTEXT: usize = 8192;

const MODEL_CONTEXT: &[(&str, usize)] = &[
    ("gpt-4", 8192),
    ("gpt-4-turbo", 128_000),
    ("gpt-4-turbo-preview", 128_000),
    ("gpt-4o", 128_000),
    ("gpt-3.5-turbo", 16_385),
];

fn context_window(model: &str) -> usize {
    MODEL_CONTEXT
        .iter()
        .find(|(name, _)| *name == model)
        .map(|(_, limit)| *limit)
        .unwrap_or(DEFAULT_CONTEXT)
}

/// Rough token count at four characters per token.
fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

/// Completion budget for a prompt, or `PromptTooLarge` when the model's
/// context leaves too little room.
pub fn completion_budget(model: &str, prompt: &str, requested: u32) -> Result<u32, ProviderError> {
    let estimated = estimate_tokens(prompt);
    let available = context_window(model)
        .saturating_sub(estimated)
        .saturating_sub(TOKEN_BUFFER);
    if available < MIN_COMPLETION_TOKENS {
        return Err(ProviderError::PromptTooLarge {
            model: model.to_string(),
            estimated_tokens: estimated,
        });
    }
    let budget = available.min(MAX_COMPLETION_TOKENS).min(requested as usize);
    Ok(budget as u32)
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    message: String,
}

pub struct OpenAiClient {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl OpenAiClient {
    pub fn new(http: Client, api_key: String, model: String, timeout: Duration) -> Self {
        Self {
            http,
            api_key,
            model,
            base_url: OPENAI_API_URL.to_string(),
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        let prompt = prompts::render(request);
        let max_tokens = completion_budget(
            &self.model,
            &format!("{}{}", prompt.system, prompt.user),
            request.max_output_tokens(),
        )?;
        info!(model = %self.model, kind = ?request.kind, max_tokens, "Generating with OpenAI API");

        let body = ChatRequest {
            model: &self.model,
            max_tokens,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
        };

        let response = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OpenAiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(ProviderError::from_status(status.as_u16(), message));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;
        debug!(choices = parsed.choices.len(), "OpenAI call succeeded");

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| ProviderError::MalformedResponse("response had no message content".to_string()))
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use crate::test_support::serve;

    async fn fake_completions(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        let auth = headers.get("authorization").and_then(|v| v.to_str().ok());
        if auth != Some("Bearer sk-good") {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": {"message": "Incorrect API key provided"}})),
            );
        }
        let reply = format!(
            "Dear Hiring Manager, max_tokens={} system={}",
            body["max_tokens"], body["messages"][0]["role"].as_str().unwrap_or_default()
        );
        (
            StatusCode::OK,
            Json(json!({"choices": [{"message": {"role": "assistant", "content": reply}}]})),
        )
    }

    fn client(base_url: &str, key: &str) -> OpenAiClient {
        OpenAiClient::new(Client::new(), key.to_string(), "gpt-4o".to_string(), Duration::from_secs(5))
            .with_base_url(base_url)
    }

    #[test]
    fn test_budget_caps_at_request_and_ceiling() {
        assert_eq!(completion_budget("gpt-4o", "short", 2048).unwrap(), 2048);
        assert_eq!(completion_budget("gpt-4o", "short", 8192).unwrap(), 4096);
    }

    #[test]
    fn test_budget_shrinks_for_long_prompts() {
        // 30_000 chars is ~7_500 tokens, leaving 592 of gpt-4's 8_192.
        let prompt = "x".repeat(30_000);
        assert_eq!(completion_budget("gpt-4", &prompt, 8192).unwrap(), 592);
    }

    #[test]
    fn test_prompt_too_large() {
        let prompt = "x".repeat(40_000);
        let err = completion_budget("gpt-4", &prompt, 8192).unwrap_err();
        assert!(matches!(err, ProviderError::PromptTooLarge { estimated_tokens: 10_000, .. }));
    }

    #[test]
    fn test_unknown_model_uses_default_context() {
        assert_eq!(context_window("gpt-9"), DEFAULT_CONTEXT);
    }

    #[tokio::test]
    async fn test_generate_reads_first_choice() {
        let base = serve(Router::new().route("/v1/chat/completions", post(fake_completions))).await;
        let request = GenerationRequest::cover_letter("# R", "JD", "Acme", "SRE", None);
        let text = client(&base, "sk-good").generate(&request).await.unwrap();
        assert_eq!(text, "Dear Hiring Manager, max_tokens=2048 system=system");
    }

    #[tokio::test]
    async fn test_bad_key_is_auth_error() {
        let base = serve(Router::new().route("/v1/chat/completions", post(fake_completions))).await;
        let request = GenerationRequest::tailored_resume("# R", "JD");
        let err = client(&base, "sk-bad").generate(&request).await.unwrap_err();
        assert!(matches!(err, ProviderError::Auth(ref m) if m.contains("Incorrect API key")));
    }
}
