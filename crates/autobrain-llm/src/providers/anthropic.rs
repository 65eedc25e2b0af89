use futures::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use autobrain_core::config::ModelConfig;
use autobrain_core::error::{AutobrainError, Result};
use autobrain_core::traits::{Completion, CompletionOptions};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicClient {
    http: Client,
    config: ModelConfig,
}

impl AnthropicClient {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }
}

// Anthropic API request types
#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<ApiMessage>,
}

#[derive(Serialize)]
struct ApiMessage {
    role: &'static str,
    content: String,
}

// Anthropic API response types
#[derive(Deserialize, Debug)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize, Debug)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

impl Completion for AnthropicClient {
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
                .ok_or_else(|| AutobrainError::Config("Anthropic API key not set".into()))?;

            let base_url = self.config.base_url.as_deref().unwrap_or(ANTHROPIC_API_URL);

            let request = opts.resolve(&self.config);
            let body = AnthropicRequest {
                model: request.model,
                max_tokens: request.max_tokens,
                temperature: Some(request.temperature),
                system: (!system.is_empty()).then(|| system.to_string()),
                messages: vec![ApiMessage {
                    role: "user",
                    content: user.to_string(),
                }],
            };

            debug!(model = %body.model, max_tokens = body.max_tokens, "Anthropic completion request");

            let response = self
                .http
                .post(base_url)
                .header("x-api-key", api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
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

            let parsed: AnthropicResponse = response
                .json()
                .await
                .map_err(|e| AutobrainError::ProviderParse(e.to_string()))?;

            let text: String = parsed
                .content
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    ContentBlock::Other => None,
                })
                .collect();

            if text.is_empty() {
                return Err(AutobrainError::ProviderParse(
                    "response contained no text blocks".into(),
                ));
            }

            Ok(text)
        })
    }
}
