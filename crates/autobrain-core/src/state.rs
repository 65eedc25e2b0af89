use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Classification label assigned by the router, driving node dispatch.
///
/// `Unset` exists only between state construction and the router's single
/// write; every node after the router treats the route as read-only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    #[default]
    Unset,
    Qa,
    Summarize,
    Action,
}

impl Route {
    /// Parse a normalized classification label. Anything else is `None`;
    /// the router maps that to its `Qa` default rather than failing.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "qa" => Some(Self::Qa),
            "summarize" => Some(Self::Summarize),
            "action" => Some(Self::Action),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Qa => "qa",
            Self::Summarize => "summarize",
            Self::Action => "action",
        }
    }

    /// Whether this route passes through the retrieval step.
    pub fn uses_retrieval(&self) -> bool {
        matches!(self, Self::Qa | Self::Summarize)
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document returned by the retriever, ranked by relevance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub id: String,
    pub content: String,
    pub source: String,
    /// Relevance score in [0, 1].
    pub score: f32,
}

/// Citation projection of a [`ScoredDocument`] — same id/source/score,
/// content dropped for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub id: String,
    pub source: String,
    pub score: f32,
}

impl From<&ScoredDocument> for SourceRef {
    fn from(doc: &ScoredDocument) -> Self {
        Self {
            id: doc.id.clone(),
            source: doc.source.clone(),
            score: doc.score,
        }
    }
}

/// Caller-supplied scope for a single run.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Tenant scope, threaded into retrieval.
    pub org_id: String,
    /// Opaque correlation id.
    pub conversation_id: String,
    /// Capability hints from the caller. Informational for now.
    pub tools: Vec<String>,
}

impl RunContext {
    /// Create a context with a fresh conversation id.
    pub fn new(org_id: impl Into<String>) -> Self {
        Self {
            org_id: org_id.into(),
            conversation_id: Uuid::new_v4().to_string(),
            tools: Vec::new(),
        }
    }

    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = conversation_id.into();
        self
    }

    pub fn with_tools(mut self, tools: Vec<String>) -> Self {
        self.tools = tools;
        self
    }
}

/// The mutable record threaded through every node of one run.
///
/// Exclusively owned by its run; constructed at run start, discarded once
/// the answer/sources/metadata are extracted into a [`RunOutput`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphState {
    pub org_id: String,
    pub conversation_id: String,
    pub query: String,
    pub route: Route,
    pub retrieved_docs: Vec<ScoredDocument>,
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub metadata: Map<String, Value>,
    pub tools: Vec<String>,
}

impl GraphState {
    pub fn new(ctx: &RunContext, query: impl Into<String>) -> Self {
        Self {
            org_id: ctx.org_id.clone(),
            conversation_id: ctx.conversation_id.clone(),
            query: query.into(),
            route: Route::Unset,
            retrieved_docs: Vec::new(),
            answer: String::new(),
            sources: Vec::new(),
            metadata: Map::new(),
            tools: ctx.tools.clone(),
        }
    }

    /// Record a diagnostic metadata field. Additive only.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Consume the state into the caller-facing result.
    pub fn into_output(self) -> RunOutput {
        RunOutput {
            answer: self.answer,
            sources: self.sources,
            metadata: self.metadata,
        }
    }
}

/// Final result of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutput {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub metadata: Map<String, Value>,
}
