//! The backend HTTP client.
//!
//! One method per backend endpoint. Every non-2xx response is turned into
//! `ClientError::RequestFailed` with the error body's `detail` field when
//! present, else the canonical status reason.

use std::time::Duration;

use futures_util::StreamExt;
use reqwest::{Response, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::error::ClientError;
use crate::extract::extract_answer_text;
use crate::stream::Utf8ChunkDecoder;
use crate::types::{
    BuildReceipt, ChatReply, ChatRequest, CollectionStats, ContextChunk, DeleteReceipt,
    FileListing, IndexStatus, SearchRequest, SearchResponse, UploadReceipt,
};

/// The backend caps `k` at this value; clamp before sending.
const MAX_SEARCH_K: usize = 20;

/// Stateless adapter over the document-chat backend.
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl BackendClient {
    /// Create a client for the backend at `base_url`.
    ///
    /// `timeout_secs` bounds non-streaming requests only; a streaming chat
    /// runs until the body is exhausted or the transport fails.
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    // =========================================================================
    // Chat
    // =========================================================================

    /// Whole-response chat: send the request, parse `{ text, sources }`.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, ClientError> {
        let response = self
            .http
            .post(self.url("/chat/chat"))
            .timeout(self.timeout)
            .json(request)
            .send()
            .await?;
        let body: Value = check(response).await?.json().await?;

        let text = extract_answer_text(&body);
        let sources = parse_sources(&body);
        debug!(chars = text.len(), sources = sources.len(), "Chat reply parsed");
        Ok(ChatReply { text, sources })
    }

    /// Streaming chat: decode the chunked body incrementally.
    ///
    /// `on_token` fires once per received chunk with its decoded text; the
    /// accumulated full string is returned when the body is exhausted.
    /// Streaming replies carry no sources.
    pub async fn stream_chat(
        &self,
        request: &ChatRequest,
        on_token: &mut (dyn FnMut(&str) + Send),
    ) -> Result<ChatReply, ClientError> {
        let response = self
            .http
            .post(self.url("/chat/stream"))
            .json(request)
            .send()
            .await?;
        let response = check(response).await?;

        let mut decoder = Utf8ChunkDecoder::new();
        let mut accumulated = String::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let bytes = chunk.map_err(|e| ClientError::Transport(e.to_string()))?;
            let text = decoder.decode(&bytes);
            if !text.is_empty() {
                on_token(&text);
                accumulated.push_str(&text);
            }
        }
        let tail = decoder.finish();
        if !tail.is_empty() {
            on_token(&tail);
            accumulated.push_str(&tail);
        }

        debug!(chars = accumulated.len(), "Stream completed");
        Ok(ChatReply {
            text: accumulated,
            sources: Vec::new(),
        })
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Semantic search over the indexed documents. `k` is clamped to 1..=20.
    pub async fn search(&self, query: &str, k: usize) -> Result<SearchResponse, ClientError> {
        let request = SearchRequest {
            query: query.to_string(),
            k: k.clamp(1, MAX_SEARCH_K),
        };
        let response = self
            .http
            .post(self.url("/search"))
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    // =========================================================================
    // Files
    // =========================================================================

    /// List uploaded reference documents.
    pub async fn list_files(&self) -> Result<FileListing, ClientError> {
        let response = self
            .http
            .get(self.url("/files"))
            .timeout(self.timeout)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    /// Upload a reference document as multipart form field `file`.
    pub async fn upload_file(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<UploadReceipt, ClientError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(self.url("/files/upload"))
            .timeout(self.timeout)
            .multipart(form)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    /// Delete an uploaded document by filename.
    pub async fn delete_file(&self, filename: &str) -> Result<DeleteReceipt, ClientError> {
        let response = self
            .http
            .delete(self.url(&format!("/files/{}", filename)))
            .timeout(self.timeout)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    // =========================================================================
    // Index
    // =========================================================================

    /// Trigger an index build. `sync` waits for completion server-side.
    pub async fn build_index(&self, sync: bool) -> Result<BuildReceipt, ClientError> {
        let path = if sync { "/index/build/sync" } else { "/index/build" };
        let response = self
            .http
            .post(self.url(path))
            .timeout(self.timeout)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    /// Poll the index build status.
    pub async fn index_status(&self) -> Result<IndexStatus, ClientError> {
        let response = self
            .http
            .get(self.url("/index/status"))
            .timeout(self.timeout)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    /// Statistics about the indexed collection: chunk count, name,
    /// embedding model, and the source documents it covers.
    pub async fn collection_stats(&self) -> Result<CollectionStats, ClientError> {
        let response = self
            .http
            .get(self.url("/collection/stats"))
            .timeout(self.timeout)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }
}

/// Pass a 2xx response through, otherwise build `RequestFailed`.
async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::RequestFailed {
        status: status.as_u16(),
        detail: error_detail(status, &body),
    })
}

/// Pull the `detail` field from a JSON error body, else the status reason.
fn error_detail(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(detail) = value.get("detail").and_then(Value::as_str) {
            return detail.to_string();
        }
    }
    status
        .canonical_reason()
        .unwrap_or("unknown error")
        .to_string()
}

/// Deserialize the `context_used` list; a missing or malformed list is
/// treated as no sources rather than an error.
fn parse_sources(body: &Value) -> Vec<ContextChunk> {
    body.get("context_used")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_url_joins_base_and_path() {
        let client = BackendClient::new("http://127.0.0.1:8000", 30);
        assert_eq!(
            client.url("/chat/chat"),
            "http://127.0.0.1:8000/api/v1/chat/chat"
        );
    }

    #[test]
    fn test_url_strips_trailing_slash() {
        let client = BackendClient::new("http://host:8000/", 30);
        assert_eq!(client.url("/files"), "http://host:8000/api/v1/files");
    }

    #[test]
    fn test_error_detail_from_json_body() {
        let detail = error_detail(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"detail": "Search error: index missing"}"#,
        );
        assert_eq!(detail, "Search error: index missing");
    }

    #[test]
    fn test_error_detail_falls_back_to_status_reason() {
        let detail = error_detail(StatusCode::NOT_FOUND, "plain text body");
        assert_eq!(detail, "Not Found");
    }

    #[test]
    fn test_error_detail_json_without_detail_field() {
        let detail = error_detail(StatusCode::BAD_GATEWAY, r#"{"error": "other"}"#);
        assert_eq!(detail, "Bad Gateway");
    }

    #[test]
    fn test_error_detail_empty_body() {
        let detail = error_detail(StatusCode::SERVICE_UNAVAILABLE, "");
        assert_eq!(detail, "Service Unavailable");
    }

    #[test]
    fn test_parse_sources_present() {
        let body = json!({
            "response": "answer",
            "context_used": [
                {"text": "chunk", "source": "manual.pdf", "page": 3, "score": 0.4}
            ]
        });
        let sources = parse_sources(&body);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].source, "manual.pdf");
        assert_eq!(sources[0].page, 3);
    }

    #[test]
    fn test_parse_sources_missing() {
        let body = json!({"response": "answer"});
        assert!(parse_sources(&body).is_empty());
    }

    #[test]
    fn test_parse_sources_malformed_is_empty() {
        let body = json!({"response": "answer", "context_used": "not a list"});
        assert!(parse_sources(&body).is_empty());
    }

    #[test]
    fn test_search_k_is_clamped() {
        // The clamp happens before serialization; verify the constant holds.
        assert_eq!(0usize.clamp(1, MAX_SEARCH_K), 1);
        assert_eq!(50usize.clamp(1, MAX_SEARCH_K), 20);
        assert_eq!(5usize.clamp(1, MAX_SEARCH_K), 5);
    }
}
