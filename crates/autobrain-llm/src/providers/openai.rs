use futures::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use autobrain_core::config::ModelConfig;
use autobrain_core::error::{AutobrainError, Result};
use autobrain_core::traits::{Completion, CompletionOptions};

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI-compatible client. Works with OpenAI, Ollama, vLLM, Groq,
/// OpenRouter, etc.
pub struct OpenAiClient {
    http: Client,
    config: ModelConfig,
}

impl OpenAiClient {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }
}

// Request types
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<OaiMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct OaiMessage {
    role: &'static str,
    content: String,
}

// Response types
#[derive(Deserialize, Debug)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize, Debug)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl Completion for OpenAiClient {
    fn complete<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
        opts: &'a CompletionOptions,
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let api_key = self
                .config
                .api_key
                .as_deref()
                .ok_or_else(|| AutobrainError::Config("OpenAI API key not set".into()))?;

            let base_url = self.config.base_url.as_deref().unwrap_or(OPENAI_API_URL);

            let request = opts.resolve(&self.config);
            let body = ChatRequest {
                model: request.model,
                messages: vec![
                    OaiMessage {
                        role: "system",
                        content: system.to_string(),
                    },
                    OaiMessage {
                        role: "user",
                        content: user.to_string(),
                    },
                ],
                max_tokens: request.max_tokens,
                temperature: Some(request.temperature),
            };

            debug!(model = %body.model, max_tokens = body.max_tokens, "OpenAI completion request");

            let response = self
                .http
                .post(base_url)
                .bearer_auth(api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| AutobrainError::Provider(e.to_string()))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "unknown error".to_string());
                return Err(AutobrainError::Provider(format!("HTTP {}: {}", status, body)));
            }

            let parsed: ChatResponse = response
                .json()
                .await
                .map_err(|e| AutobrainError::ProviderParse(e.to_string()))?;

            parsed
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .ok_or_else(|| {
                    AutobrainError::ProviderParse("response contained no choices".into())
                })
        })
    }
}
