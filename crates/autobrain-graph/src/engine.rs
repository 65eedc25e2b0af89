use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use autobrain_core::config::ModelConfig;
use autobrain_core::error::{AutobrainError, Result};
use autobrain_core::event::{chunk_answer, GraphEvent, ANSWER_CHUNK_WORDS};
use autobrain_core::state::{GraphState, Route, RunContext, RunOutput};
use autobrain_core::traits::{Completion, Retriever};

use crate::nodes::GraphNodes;

/// The graph engine: sequences nodes according to the route chosen by the
/// router.
///
/// Transition table, keyed only on the route:
///
/// - `qa` / `summarize`: router, retrieve, synthesize
/// - `action`: router, act
///
/// One engine serves any number of concurrent runs; each run owns its own
/// `GraphState` and nothing is shared between runs.
pub struct Orchestrator {
    nodes: GraphNodes,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(llm: Arc<dyn Completion>, retriever: Arc<dyn Retriever>) -> Self {
        Self {
            nodes: GraphNodes::new(llm, retriever),
            cancel: CancellationToken::new(),
        }
    }

    /// Construct with the provider selected from process environment.
    pub fn from_env(retriever: Arc<dyn Retriever>) -> Self {
        let config = ModelConfig::from_env();
        info!(provider = %config.provider, "Creating orchestrator from environment");
        Self::new(Arc::from(autobrain_llm::create_client(&config)), retriever)
    }

    /// Token for cooperative cancellation of in-flight runs.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Batch mode: execute the full node sequence and return one result.
    ///
    /// Provider and retrieval failures are absorbed by the nodes, so this
    /// only fails on cancellation or a graph wiring bug.
    pub async fn run(&self, ctx: &RunContext, query: &str) -> Result<RunOutput> {
        let mut state = GraphState::new(ctx, query);

        self.checkpoint()?;
        self.nodes.route(&mut state).await;
        self.checkpoint()?;

        match state.route {
            Route::Qa | Route::Summarize => {
                self.nodes.retrieve(&mut state).await;
                self.checkpoint()?;
                self.nodes.synthesize(&mut state).await;
            }
            Route::Action => {
                self.nodes.act(&mut state).await;
            }
            Route::Unset => {
                return Err(AutobrainError::Invariant(
                    "router left the route unset".into(),
                ));
            }
        }

        debug!(
            conversation_id = %state.conversation_id,
            route = %state.route,
            sources = state.sources.len(),
            "Run complete"
        );
        Ok(state.into_output())
    }

    /// Streaming mode: execute the same node sequence, emitting progress
    /// events and a word-chunked answer as the run advances.
    ///
    /// Each event is handed to the consumer before the next node (or chunk)
    /// is computed. The stream is finite and single-pass; it ends with one
    /// `Complete` event, or early when the run is cancelled or the consumer
    /// goes away.
    pub fn run_stream(&self, ctx: &RunContext, query: &str) -> ReceiverStream<GraphEvent> {
        let (tx, rx) = mpsc::channel(1);
        let nodes = self.nodes.clone();
        let cancel = self.cancel.clone();
        let mut state = GraphState::new(ctx, query);

        tokio::spawn(async move {
            if !emit(&tx, &cancel, GraphEvent::Routing).await {
                return;
            }
            nodes.route(&mut state).await;
            if !emit(&tx, &cancel, GraphEvent::Route { content: state.route }).await {
                return;
            }

            match state.route {
                Route::Qa | Route::Summarize => {
                    if !emit(&tx, &cancel, GraphEvent::Retrieving).await {
                        return;
                    }
                    nodes.retrieve(&mut state).await;
                    let sources = state.sources.clone();
                    if !emit(&tx, &cancel, GraphEvent::Sources { content: sources }).await {
                        return;
                    }
                    if !emit(&tx, &cancel, GraphEvent::Thinking).await {
                        return;
                    }
                    nodes.synthesize(&mut state).await;
                }
                Route::Action => {
                    if !emit(&tx, &cancel, GraphEvent::Thinking).await {
                        return;
                    }
                    nodes.act(&mut state).await;
                }
                Route::Unset => {
                    // Structurally unreachable: the router always assigns a
                    // route. Ending without a Complete event marks the run
                    // as failed to the consumer.
                    error!("router left the route unset, aborting stream");
                    return;
                }
            }

            for chunk in chunk_answer(&state.answer, ANSWER_CHUNK_WORDS) {
                if !emit(&tx, &cancel, GraphEvent::Answer { content: chunk }).await {
                    return;
                }
            }

            emit(
                &tx,
                &cancel,
                GraphEvent::Complete {
                    content: state.answer.clone(),
                    metadata: state.metadata.clone(),
                },
            )
            .await;
        });

        ReceiverStream::new(rx)
    }

    fn checkpoint(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(AutobrainError::Cancelled);
        }
        Ok(())
    }
}

/// Hand one event to the consumer. Returns false when the run is cancelled
/// or the consumer dropped the stream; the caller stops emitting.
async fn emit(
    tx: &mpsc::Sender<GraphEvent>,
    cancel: &CancellationToken,
    event: GraphEvent,
) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    tx.send(event).await.is_ok()
}
