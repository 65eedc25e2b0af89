use std::cmp::Ordering;
use std::sync::Arc;

use tracing::{debug, info, warn};

use autobrain_core::state::{GraphState, Route, SourceRef};
use autobrain_core::traits::{Completion, CompletionOptions, Retriever};

const ROUTER_SYSTEM_PROMPT: &str = "\
You are a routing agent. Classify the user's query into one of:
- 'qa': Question answering from knowledge base
- 'summarize': Summarization task
- 'action': Action/task execution (send email, create task, etc.)

Respond with just the category name.";

const SYNTHESIZE_SYSTEM_PROMPT: &str = "\
You are a helpful AI assistant. Use the provided context to answer the user's question.
If the context doesn't contain relevant information, say so clearly.
Provide concise, accurate answers with citations to source documents.";

const ACTION_SYSTEM_PROMPT: &str = "\
You are an action execution agent. Based on the user's request, \
determine what action to take and provide a response.";

// Only a label is expected from the router; the answer-producing nodes get
// larger budgets.
const ROUTER_MAX_TOKENS: u32 = 50;
const SYNTHESIZE_MAX_TOKENS: u32 = 500;
const ACTION_MAX_TOKENS: u32 = 300;

/// The four processing nodes of the workflow.
///
/// Each node is a `GraphState` transformation; none holds per-run state, so
/// one `GraphNodes` can serve any number of concurrent runs.
#[derive(Clone)]
pub struct GraphNodes {
    llm: Arc<dyn Completion>,
    retriever: Arc<dyn Retriever>,
}

impl GraphNodes {
    pub fn new(llm: Arc<dyn Completion>, retriever: Arc<dyn Retriever>) -> Self {
        Self { llm, retriever }
    }

    /// Issue one completion call, degrading a provider failure to
    /// human-readable error text instead of aborting the run.
    async fn complete_or_degrade(
        &self,
        system: &str,
        user: &str,
        opts: &CompletionOptions,
    ) -> String {
        match self.llm.complete(system, user, opts).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Completion failed, degrading to error text");
                format!("Error calling LLM provider: {}", e)
            }
        }
    }

    /// Router node: classify the query and assign the route.
    ///
    /// Any unparseable or empty classification defaults to `qa`; the router
    /// never fails the run.
    pub async fn route(&self, state: &mut GraphState) {
        let label = self
            .complete_or_degrade(
                ROUTER_SYSTEM_PROMPT,
                &state.query,
                &CompletionOptions::max_tokens(ROUTER_MAX_TOKENS),
            )
            .await;

        let route = Route::parse(&label).unwrap_or(Route::Qa);
        state.route = route;
        state.set_metadata("route", route.as_str());
        info!(conversation_id = %state.conversation_id, route = %route, "Query routed");
    }

    /// Retrieve node: populate documents and their citation projections.
    ///
    /// A failed or empty retrieval leaves both lists empty; synthesis
    /// handles the missing context.
    pub async fn retrieve(&self, state: &mut GraphState) {
        let mut docs = match self.retriever.retrieve(&state.query, &state.org_id).await {
            Ok(docs) => docs,
            Err(e) => {
                warn!(error = %e, "Retrieval failed, continuing with empty context");
                Vec::new()
            }
        };

        docs.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        state.sources = docs.iter().map(SourceRef::from).collect();
        state.retrieved_docs = docs;
        debug!(
            count = state.retrieved_docs.len(),
            org_id = %state.org_id,
            "Documents retrieved"
        );
    }

    /// Synthesize node: produce the answer from the retrieved context.
    pub async fn synthesize(&self, state: &mut GraphState) {
        let context = state
            .retrieved_docs
            .iter()
            .enumerate()
            .map(|(i, doc)| format!("Document {}: {}", i + 1, doc.content))
            .collect::<Vec<_>>()
            .join("\n\n");

        let user_prompt = format!(
            "Context:\n{}\n\nQuestion: {}\n\nProvide a helpful answer based on the context above.",
            context, state.query
        );

        state.answer = self
            .complete_or_degrade(
                SYNTHESIZE_SYSTEM_PROMPT,
                &user_prompt,
                &CompletionOptions::max_tokens(SYNTHESIZE_MAX_TOKENS),
            )
            .await;
    }

    /// Action node: describe the action implied by the query.
    ///
    /// Real side-effecting integrations hook in here; the current contract
    /// is a natural-language description of the simulated action.
    pub async fn act(&self, state: &mut GraphState) {
        let user_prompt = format!(
            "User wants to: {}\n\nSimulate the action and respond.",
            state.query
        );

        state.answer = self
            .complete_or_degrade(
                ACTION_SYSTEM_PROMPT,
                &user_prompt,
                &CompletionOptions::max_tokens(ACTION_MAX_TOKENS),
            )
            .await;
        state.set_metadata("action_taken", "simulated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use autobrain_core::state::{RunContext, ScoredDocument};
    use autobrain_test_utils::{StubCompletion, StubRetriever};

    fn state_for(query: &str) -> GraphState {
        let ctx = RunContext::new("org-1").with_conversation("conv-1");
        GraphState::new(&ctx, query)
    }

    fn nodes(llm: StubCompletion, retriever: StubRetriever) -> GraphNodes {
        GraphNodes::new(Arc::new(llm), Arc::new(retriever))
    }

    #[tokio::test]
    async fn router_assigns_route_and_metadata() {
        let nodes = nodes(
            StubCompletion::with_replies(["summarize"]),
            StubRetriever::empty(),
        );
        let mut state = state_for("summarize the meeting notes");

        nodes.route(&mut state).await;

        assert_eq!(state.route, Route::Summarize);
        assert_eq!(state.metadata["route"], "summarize");
    }

    #[tokio::test]
    async fn router_normalizes_label() {
        let nodes = nodes(
            StubCompletion::with_replies(["  Action \n"]),
            StubRetriever::empty(),
        );
        let mut state = state_for("send an email");

        nodes.route(&mut state).await;
        assert_eq!(state.route, Route::Action);
    }

    #[tokio::test]
    async fn router_defaults_to_qa_on_garbage() {
        let nodes = nodes(
            StubCompletion::with_replies(["unknown-category-xyz"]),
            StubRetriever::empty(),
        );
        let mut state = state_for("anything");

        nodes.route(&mut state).await;
        assert_eq!(state.route, Route::Qa);
        assert_eq!(state.metadata["route"], "qa");
    }

    #[tokio::test]
    async fn router_defaults_to_qa_on_provider_failure() {
        let nodes = nodes(StubCompletion::failing(), StubRetriever::empty());
        let mut state = state_for("anything");

        nodes.route(&mut state).await;
        assert_eq!(state.route, Route::Qa);
    }

    #[tokio::test]
    async fn router_uses_small_token_budget() {
        let llm = Arc::new(StubCompletion::with_replies(["qa"]));
        let nodes = GraphNodes::new(llm.clone(), Arc::new(StubRetriever::empty()));
        let mut state = state_for("what is this?");

        nodes.route(&mut state).await;

        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].max_tokens, Some(50));
        assert_eq!(calls[0].user, "what is this?");
    }

    #[tokio::test]
    async fn retrieve_projects_sources_index_aligned() {
        let nodes = nodes(
            StubCompletion::with_replies(["qa"]),
            StubRetriever::knowledge_base(),
        );
        let mut state = state_for("What is AutoBrain?");
        state.route = Route::Qa;

        nodes.retrieve(&mut state).await;

        assert_eq!(state.retrieved_docs.len(), state.sources.len());
        for (doc, src) in state.retrieved_docs.iter().zip(&state.sources) {
            assert_eq!(doc.id, src.id);
            assert_eq!(doc.source, src.source);
            assert_eq!(doc.score, src.score);
        }
    }

    #[tokio::test]
    async fn retrieve_orders_by_descending_score() {
        let retriever = StubRetriever::with_docs(vec![
            ScoredDocument {
                id: "low".into(),
                content: "low".into(),
                source: "docs".into(),
                score: 0.2,
            },
            ScoredDocument {
                id: "high".into(),
                content: "high".into(),
                source: "docs".into(),
                score: 0.9,
            },
        ]);
        let nodes = nodes(StubCompletion::with_replies(["qa"]), retriever);
        let mut state = state_for("q");
        state.route = Route::Qa;

        nodes.retrieve(&mut state).await;

        assert_eq!(state.retrieved_docs[0].id, "high");
        assert_eq!(state.sources[0].id, "high");
        assert_eq!(state.retrieved_docs[1].id, "low");
    }

    #[tokio::test]
    async fn retrieve_absorbs_retriever_failure() {
        let nodes = nodes(StubCompletion::with_replies(["qa"]), StubRetriever::failing());
        let mut state = state_for("q");
        state.route = Route::Qa;

        nodes.retrieve(&mut state).await;

        assert!(state.retrieved_docs.is_empty());
        assert!(state.sources.is_empty());
    }

    #[tokio::test]
    async fn retrieve_scopes_by_org() {
        let retriever = Arc::new(StubRetriever::knowledge_base());
        let nodes = GraphNodes::new(
            Arc::new(StubCompletion::with_replies(["qa"])),
            retriever.clone(),
        );
        let mut state = state_for("What is AutoBrain?");
        state.route = Route::Qa;

        nodes.retrieve(&mut state).await;

        assert_eq!(
            retriever.queries(),
            vec![("What is AutoBrain?".to_string(), "org-1".to_string())]
        );
    }

    #[tokio::test]
    async fn synthesize_labels_documents_in_order() {
        let llm = Arc::new(StubCompletion::with_replies(["an answer"]));
        let nodes = GraphNodes::new(llm.clone(), Arc::new(StubRetriever::empty()));
        let mut state = state_for("What is AutoBrain?");
        state.route = Route::Qa;
        state.retrieved_docs = vec![
            ScoredDocument {
                id: "doc1".into(),
                content: "first body".into(),
                source: "docs".into(),
                score: 0.9,
            },
            ScoredDocument {
                id: "doc2".into(),
                content: "second body".into(),
                source: "docs".into(),
                score: 0.8,
            },
        ];

        nodes.synthesize(&mut state).await;

        assert_eq!(state.answer, "an answer");
        let calls = llm.calls();
        assert_eq!(calls[0].max_tokens, Some(500));
        let prompt = &calls[0].user;
        assert!(prompt.contains("Document 1: first body"));
        assert!(prompt.contains("Document 2: second body"));
        assert!(prompt.contains("Question: What is AutoBrain?"));
        let d1 = prompt.find("Document 1").unwrap();
        let d2 = prompt.find("Document 2").unwrap();
        assert!(d1 < d2);
    }

    #[tokio::test]
    async fn synthesize_degrades_provider_failure_to_text() {
        let nodes = nodes(StubCompletion::failing(), StubRetriever::empty());
        let mut state = state_for("q");
        state.route = Route::Qa;

        nodes.synthesize(&mut state).await;

        assert!(state.answer.contains("Error calling LLM provider"));
    }

    #[tokio::test]
    async fn act_sets_answer_and_metadata() {
        let llm = Arc::new(StubCompletion::with_replies(["I drafted the email."]));
        let nodes = GraphNodes::new(llm.clone(), Arc::new(StubRetriever::empty()));
        let mut state = state_for("send an email to the team");
        state.route = Route::Action;

        nodes.act(&mut state).await;

        assert_eq!(state.answer, "I drafted the email.");
        assert_eq!(state.metadata["action_taken"], "simulated");
        let calls = llm.calls();
        assert_eq!(calls[0].max_tokens, Some(300));
        assert!(calls[0].user.contains("User wants to: send an email to the team"));
    }
}
