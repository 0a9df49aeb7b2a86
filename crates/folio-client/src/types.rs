//! Wire types for the backend's JSON API.
//!
//! Field names and shapes follow the backend contract verbatim; optional
//! request fields are omitted from the serialized body when unset.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Chat
// =============================================================================

/// Request body for `/api/v1/chat/chat` and `/api/v1/chat/stream`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// The user's message.
    pub message: String,
    /// Prior turns, oldest first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_history: Option<Vec<HistoryTurn>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>,
    /// Whether the backend should retrieve document context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_context: Option<bool>,
    /// Number of context chunks to retrieve.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub k: Option<usize>,
}

impl ChatRequest {
    /// A bare request carrying only the message text.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            conversation_history: None,
            temperature: None,
            max_tokens: None,
            use_context: None,
            k: None,
        }
    }
}

/// One prior turn in the conversation history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryTurn {
    /// "user" or "assistant".
    pub role: String,
    pub content: String,
}

/// A parsed chat answer: the display text plus retrieval provenance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatReply {
    /// The answer text shown to the user. May be empty if the backend
    /// returned no recognizable text field (documented leniency).
    pub text: String,
    /// Context chunks the backend used to ground the answer.
    pub sources: Vec<ContextChunk>,
}

/// A retrieved document chunk returned alongside a chat answer.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ContextChunk {
    /// Snippet text.
    #[serde(default)]
    pub text: String,
    /// Source document filename.
    #[serde(default)]
    pub source: String,
    /// Page number in the source document.
    #[serde(default)]
    pub page: u32,
    /// Vector distance; lower is a closer match.
    #[serde(default)]
    pub score: f64,
}

// =============================================================================
// Search
// =============================================================================

/// Request body for `/api/v1/search`.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub query: String,
    pub k: usize,
}

/// Response body for `/api/v1/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchHit>,
    pub total_results: usize,
}

/// One semantic search result.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    /// Chunk identifier, when the index provides one.
    #[serde(default)]
    pub id: Option<String>,
    pub text: String,
    pub page: u32,
    pub source: String,
    /// Vector distance; lower is a closer match.
    pub score: f64,
}

// =============================================================================
// Files
// =============================================================================

/// Response body for `GET /api/v1/files`.
#[derive(Debug, Clone, Deserialize)]
pub struct FileListing {
    pub files: Vec<StoredFile>,
    pub total_files: usize,
}

/// One uploaded reference document.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredFile {
    pub filename: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub content_type: Option<String>,
}

/// Response body for `POST /api/v1/files/upload`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadReceipt {
    pub message: String,
    pub filename: String,
    #[serde(default)]
    pub filepath: String,
    #[serde(default)]
    pub size: u64,
}

/// Response body for `DELETE /api/v1/files/{filename}`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteReceipt {
    pub message: String,
    pub filename: String,
}

// =============================================================================
// Index
// =============================================================================

/// Response body for `POST /api/v1/index/build[/sync]`.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildReceipt {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub total_chunks: Option<usize>,
}

/// Response body for `GET /api/v1/collection/stats`.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionStats {
    #[serde(default)]
    pub total_chunks: usize,
    #[serde(default)]
    pub collection_name: String,
    #[serde(default)]
    pub embedding_model: String,
    /// Source documents represented in the collection.
    #[serde(default)]
    pub sources: Vec<String>,
}

/// Response body for `GET /api/v1/index/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexStatus {
    pub is_running: bool,
    #[serde(default)]
    pub last_result: Option<Value>,
    #[serde(default)]
    pub progress: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_omits_unset_fields() {
        let req = ChatRequest::new("hello");
        let json = serde_json::to_value(&req).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert_eq!(obj["message"], "hello");
    }

    #[test]
    fn test_chat_request_serializes_set_fields() {
        let req = ChatRequest {
            message: "q".to_string(),
            conversation_history: Some(vec![HistoryTurn {
                role: "user".to_string(),
                content: "hi".to_string(),
            }]),
            temperature: Some(0.2),
            max_tokens: Some(256),
            use_context: Some(true),
            k: Some(5),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["use_context"], true);
        assert_eq!(json["k"], 5);
        assert_eq!(json["conversation_history"][0]["role"], "user");
    }

    #[test]
    fn test_search_response_deserializes() {
        let body = r#"{
            "query": "wakeup timings",
            "results": [
                {"id": "chunk_123", "text": "The wakeup time...", "page": 45,
                 "source": "manual.pdf", "score": 0.234}
            ],
            "total_results": 1
        }"#;
        let resp: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.total_results, 1);
        assert_eq!(resp.results[0].id.as_deref(), Some("chunk_123"));
        assert_eq!(resp.results[0].page, 45);
    }

    #[test]
    fn test_search_hit_without_id() {
        let body = r#"{"text": "t", "page": 1, "source": "s.pdf", "score": 0.5}"#;
        let hit: SearchHit = serde_json::from_str(body).unwrap();
        assert!(hit.id.is_none());
    }

    #[test]
    fn test_context_chunk_defaults_missing_fields() {
        let chunk: ContextChunk = serde_json::from_str(r#"{"text": "snippet"}"#).unwrap();
        assert_eq!(chunk.text, "snippet");
        assert_eq!(chunk.page, 0);
        assert_eq!(chunk.source, "");
    }

    #[test]
    fn test_index_status_deserializes() {
        let body = r#"{"is_running": true, "progress": 0.4}"#;
        let status: IndexStatus = serde_json::from_str(body).unwrap();
        assert!(status.is_running);
        assert_eq!(status.progress, Some(0.4));
        assert!(status.last_result.is_none());
    }

    #[test]
    fn test_build_receipt_without_chunks() {
        let body = r#"{"success": true, "message": "Index build started"}"#;
        let receipt: BuildReceipt = serde_json::from_str(body).unwrap();
        assert!(receipt.success);
        assert!(receipt.total_chunks.is_none());
    }

    #[test]
    fn test_collection_stats_deserializes() {
        let body = r#"{
            "total_chunks": 1250,
            "collection_name": "manual_embedding",
            "embedding_model": "sentence-transformers/all-MiniLM-L6-v2",
            "sources": ["manual.pdf"]
        }"#;
        let stats: CollectionStats = serde_json::from_str(body).unwrap();
        assert_eq!(stats.total_chunks, 1250);
        assert_eq!(stats.sources, vec!["manual.pdf"]);
    }

    #[test]
    fn test_collection_stats_all_fields_defaulted() {
        let stats: CollectionStats = serde_json::from_str("{}").unwrap();
        assert_eq!(stats.total_chunks, 0);
        assert!(stats.sources.is_empty());
    }

    #[test]
    fn test_file_listing_deserializes() {
        let body = r#"{
            "files": [{"filename": "manual.pdf", "size": 1024}],
            "total_files": 1
        }"#;
        let listing: FileListing = serde_json::from_str(body).unwrap();
        assert_eq!(listing.total_files, 1);
        assert_eq!(listing.files[0].filename, "manual.pdf");
        assert!(listing.files[0].content_type.is_none());
    }
}
