use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::config::{default_model_for, ModelConfig};
use crate::error::Result;
use crate::state::ScoredDocument;

/// Per-call overrides for a completion request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionOptions {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl CompletionOptions {
    pub fn max_tokens(max_tokens: u32) -> Self {
        Self {
            max_tokens: Some(max_tokens),
            ..Self::default()
        }
    }

    /// Resolve options against a config: per-call values win, then config,
    /// then the provider's default model.
    pub fn resolve(&self, config: &ModelConfig) -> ResolvedRequest {
        ResolvedRequest {
            model: self
                .model
                .clone()
                .or_else(|| config.model_id.clone())
                .unwrap_or_else(|| default_model_for(&config.provider).to_string()),
            temperature: self.temperature.unwrap_or(config.temperature),
            max_tokens: self.max_tokens.unwrap_or(config.max_tokens),
        }
    }
}

/// Fully-resolved request parameters handed to a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRequest {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// LLM text generation capability consumed by nodes.
pub trait Completion: Send + Sync + 'static {
    /// Send one system/user prompt pair and receive the full response text.
    fn complete<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
        opts: &'a CompletionOptions,
    ) -> BoxFuture<'a, Result<String>>;
}

/// Knowledge-base lookup capability consumed by the retrieve node.
pub trait Retriever: Send + Sync + 'static {
    /// Fetch documents relevant to `query`, scoped to `org_id`, ranked by
    /// descending relevance. Empty on no matches.
    fn retrieve<'a>(
        &'a self,
        query: &'a str,
        org_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<ScoredDocument>>>;
}
