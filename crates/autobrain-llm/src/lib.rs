pub mod providers;
pub mod retry;

use autobrain_core::config::ModelConfig;
use autobrain_core::traits::Completion;

pub use providers::anthropic::AnthropicClient;
pub use providers::openai::OpenAiClient;
pub use retry::RetryingClient;

/// Create a Completion client based on the provider name.
///
/// Vendor selection happens exactly once, here; node logic only ever sees
/// the `Completion` trait.
pub fn create_client(config: &ModelConfig) -> Box<dyn Completion> {
    let inner: Box<dyn Completion> = match config.provider.as_str() {
        "anthropic" | "claude" => Box::new(AnthropicClient::new(config.clone())),
        // Everything else uses the OpenAI-compatible client
        _ => Box::new(OpenAiClient::new(config.clone())),
    };

    match &config.retry {
        Some(retry) => Box::new(RetryingClient::new(inner, retry.clone())),
        None => inner,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client_accepts_known_providers() {
        // Construction must never touch the network or credentials.
        for provider in ["openai", "anthropic", "claude", "ollama"] {
            let config = ModelConfig {
                provider: provider.to_string(),
                ..ModelConfig::default()
            };
            let _client = create_client(&config);
        }
    }

    #[test]
    fn test_create_client_wraps_retry_when_configured() {
        let config = ModelConfig {
            retry: Some(autobrain_core::config::RetryConfig::default()),
            ..ModelConfig::default()
        };
        let _client = create_client(&config);
    }
}
