use serde::{Deserialize, Serialize};

/// One completed user/assistant exchange. Kept in memory for the session only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub user: String,
    pub assistant: String,
    /// Number of stocks surfaced by the query path for this turn.
    pub stocks_context: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationStats {
    pub total_messages: usize,
    pub stocks_analyzed: usize,
    pub last_query_time: String,
}

/// Lifecycle of one conversational cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    AwaitingInput,
    Querying,
    Composing,
    Streaming,
}

/// Chunk emitted by the paced output producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamChunk {
    Content(String),
    /// Apology text rendered in place of a reply when generation failed.
    Error(String),
}

impl StreamChunk {
    pub fn text(&self) -> &str {
        match self {
            StreamChunk::Content(s) | StreamChunk::Error(s) => s,
        }
    }
}
