//! Deterministic stand-ins for the LLM and retrieval collaborators.
//!
//! Used by graph tests to script node behavior without touching the network.

use std::sync::Mutex;

use futures::future::BoxFuture;

use autobrain_core::error::{AutobrainError, Result};
use autobrain_core::state::ScoredDocument;
use autobrain_core::traits::{Completion, CompletionOptions, Retriever};

/// One recorded call into a [`StubCompletion`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system: String,
    pub user: String,
    pub max_tokens: Option<u32>,
}

enum Script {
    /// Replies served in order, cycling once exhausted, so repeated runs
    /// against the same stub observe identical reply sequences.
    Sequence(Vec<String>),
    /// Route label for router calls, answer for everything else. Keyed off
    /// the system prompt, so concurrent runs cannot race on reply order.
    Routed { label: String, answer: String },
    /// Every call fails with a provider error.
    Fail,
}

/// Scripted Completion stub.
pub struct StubCompletion {
    script: Script,
    calls: Mutex<Vec<RecordedCall>>,
}

impl StubCompletion {
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Script::Sequence(replies.into_iter().map(Into::into).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Reply with `label` to router calls and `answer` to all other calls,
    /// independent of call order.
    pub fn routed(label: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            script: Script::Routed {
                label: label.into(),
                answer: answer.into(),
            },
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A stub whose every call fails with a provider error.
    pub fn failing() -> Self {
        Self {
            script: Script::Fail,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Completion for StubCompletion {
    fn complete<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
        opts: &'a CompletionOptions,
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let index = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(RecordedCall {
                    system: system.to_string(),
                    user: user.to_string(),
                    max_tokens: opts.max_tokens,
                });
                calls.len() - 1
            };

            match &self.script {
                Script::Fail => Err(AutobrainError::Provider(
                    "stub provider failure".to_string(),
                )),
                Script::Sequence(replies) => {
                    if replies.is_empty() {
                        return Ok(String::new());
                    }
                    Ok(replies[index % replies.len()].clone())
                }
                Script::Routed { label, answer } => {
                    if system.contains("routing agent") {
                        Ok(label.clone())
                    } else {
                        Ok(answer.clone())
                    }
                }
            }
        })
    }
}

/// Fixed-corpus Retriever stub.
pub struct StubRetriever {
    docs: Vec<ScoredDocument>,
    queries: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl StubRetriever {
    pub fn with_docs(docs: Vec<ScoredDocument>) -> Self {
        Self {
            docs,
            queries: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn empty() -> Self {
        Self::with_docs(Vec::new())
    }

    /// A stub whose every call fails.
    pub fn failing() -> Self {
        Self {
            docs: Vec::new(),
            queries: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// The canonical two-document fixture (`doc1`, `doc2`).
    pub fn knowledge_base() -> Self {
        Self::with_docs(vec![
            ScoredDocument {
                id: "doc1".into(),
                content: "AutoBrain is a knowledge assistant that helps teams stay \
                          organized and informed."
                    .into(),
                source: "docs".into(),
                score: 0.95,
            },
            ScoredDocument {
                id: "doc2".into(),
                content: "The system uses RAG (Retrieval Augmented Generation) to \
                          provide accurate answers."
                    .into(),
                source: "docs".into(),
                score: 0.87,
            },
        ])
    }

    /// All `(query, org_id)` pairs seen so far.
    pub fn queries(&self) -> Vec<(String, String)> {
        self.queries.lock().unwrap().clone()
    }
}

impl Retriever for StubRetriever {
    fn retrieve<'a>(
        &'a self,
        query: &'a str,
        org_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<ScoredDocument>>> {
        Box::pin(async move {
            self.queries
                .lock()
                .unwrap()
                .push((query.to_string(), org_id.to_string()));

            if self.fail {
                return Err(AutobrainError::Retrieval("stub retriever failure".into()));
            }
            Ok(self.docs.clone())
        })
    }
}
