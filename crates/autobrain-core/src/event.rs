use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::state::{Route, SourceRef};

/// Number of words per `Answer` chunk in streaming mode.
pub const ANSWER_CHUNK_WORDS: usize = 5;

/// A progress or result event emitted by the streaming execution mode.
///
/// Events form a strict total order per run: `Routing`, `Route`, then for
/// retrieval routes `Retrieving` and `Sources`, then `Thinking`, zero or
/// more `Answer` chunks, and exactly one terminal `Complete`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GraphEvent {
    /// The router is about to classify the query.
    Routing,

    /// The router chose a route.
    Route { content: Route },

    /// The knowledge base is being searched.
    Retrieving,

    /// Citations gathered by the retrieve node.
    Sources { content: Vec<SourceRef> },

    /// The terminal node is generating the answer.
    Thinking,

    /// A word-group chunk of the final answer.
    Answer { content: String },

    /// Terminal event carrying the full answer and run metadata.
    Complete {
        content: String,
        metadata: Map<String, Value>,
    },
}

/// Split an answer into fixed-size word groups for pseudo-streamed delivery.
///
/// The last chunk may be shorter; joining the chunks with single spaces
/// reproduces the whitespace-normalized answer.
pub fn chunk_answer(answer: &str, words_per_chunk: usize) -> Vec<String> {
    let words: Vec<&str> = answer.split_whitespace().collect();
    words
        .chunks(words_per_chunk.max(1))
        .map(|chunk| chunk.join(" "))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_twelve_words() {
        let answer = "one two three four five six seven eight nine ten eleven twelve";
        let chunks = chunk_answer(answer, ANSWER_CHUNK_WORDS);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], "one two three four five");
        assert_eq!(chunks[1], "six seven eight nine ten");
        assert_eq!(chunks[2], "eleven twelve");
    }

    #[test]
    fn test_chunk_roundtrip() {
        let answer = "grounded answers cite their sources and acknowledge missing context";
        let chunks = chunk_answer(answer, ANSWER_CHUNK_WORDS);
        assert_eq!(chunks.join(" "), answer);
    }

    #[test]
    fn test_chunk_short_answer() {
        let chunks = chunk_answer("ok", ANSWER_CHUNK_WORDS);
        assert_eq!(chunks, vec!["ok".to_string()]);
    }

    #[test]
    fn test_chunk_empty_answer() {
        assert!(chunk_answer("", ANSWER_CHUNK_WORDS).is_empty());
        assert!(chunk_answer("   ", ANSWER_CHUNK_WORDS).is_empty());
    }

    #[test]
    fn test_event_serialization_tags() {
        let event = GraphEvent::Route {
            content: Route::Qa,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "route");
        assert_eq!(json["content"], "qa");

        let json = serde_json::to_value(&GraphEvent::Routing).unwrap();
        assert_eq!(json["type"], "routing");
    }

    #[test]
    fn test_complete_event_carries_metadata() {
        let mut metadata = Map::new();
        metadata.insert("route".into(), "action".into());
        let event = GraphEvent::Complete {
            content: "done".into(),
            metadata,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "complete");
        assert_eq!(json["content"], "done");
        assert_eq!(json["metadata"]["route"], "action");
    }
}
