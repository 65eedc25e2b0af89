use serde::{Deserialize, Serialize};

/// LLM provider configuration.
///
/// The engine is provider-agnostic; this struct is only consumed when a
/// concrete `Completion` client is constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model_id: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

fn default_provider() -> String { "openai".to_string() }
fn default_max_tokens() -> u32 { 1000 }
fn default_temperature() -> f32 { 0.7 }

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model_id: None,
            api_key: None,
            base_url: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            retry: None,
        }
    }
}

impl ModelConfig {
    /// Build a config from process environment.
    ///
    /// `LLM_PROVIDER` selects the vendor (`openai` default, `anthropic`
    /// alternative); the matching `*_API_KEY` variable supplies credentials.
    pub fn from_env() -> Self {
        let provider = std::env::var("LLM_PROVIDER").unwrap_or_else(|_| default_provider());
        let api_key = match provider.as_str() {
            "anthropic" | "claude" => std::env::var("ANTHROPIC_API_KEY").ok(),
            _ => std::env::var("OPENAI_API_KEY").ok(),
        };
        Self {
            provider,
            model_id: std::env::var("LLM_MODEL").ok(),
            api_key,
            base_url: std::env::var("LLM_BASE_URL").ok(),
            ..Self::default()
        }
    }

    /// The model to use when neither the config nor a per-call option names one.
    pub fn default_model(&self) -> &'static str {
        default_model_for(&self.provider)
    }
}

/// Per-provider default model ids.
pub fn default_model_for(provider: &str) -> &'static str {
    match provider {
        "anthropic" | "claude" => "claude-3-5-sonnet-20241022",
        _ => "gpt-4o-mini",
    }
}

/// Retry configuration for LLM requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
        }
    }
}

fn default_max_retries() -> u32 { 3 }
fn default_initial_backoff() -> u64 { 1000 }
fn default_max_backoff() -> u64 { 30000 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ModelConfig::default();
        assert_eq!(config.provider, "openai");
        assert_eq!(config.max_tokens, 1000);
        assert_eq!(config.temperature, 0.7);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_default_model_per_provider() {
        assert_eq!(default_model_for("openai"), "gpt-4o-mini");
        assert_eq!(default_model_for("anthropic"), "claude-3-5-sonnet-20241022");
        assert_eq!(default_model_for("claude"), "claude-3-5-sonnet-20241022");
        // Unknown providers fall through to the OpenAI-compatible default
        assert_eq!(default_model_for("ollama"), "gpt-4o-mini");
    }

    #[test]
    fn test_retry_defaults() {
        let retry = RetryConfig::default();
        assert_eq!(retry.max_retries, 3);
        assert_eq!(retry.initial_backoff_ms, 1000);
        assert_eq!(retry.max_backoff_ms, 30000);
    }
}
