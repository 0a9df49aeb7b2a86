//! The response client seam.
//!
//! The orchestrator talks to the backend through this trait so tests can
//! substitute deterministic clients. `BackendClient` is the production
//! implementation.

use async_trait::async_trait;

use folio_client::{BackendClient, ChatReply, ChatRequest, ClientError};

/// A stateless chat endpoint: one request in, one reply (or error) out.
///
/// The token callback is higher-ranked over the token lifetime; an elided
/// lifetime here would be captured by the async_trait expansion and no
/// longer match the concrete client signatures.
#[async_trait]
pub trait ResponseClient: Send + Sync {
    /// Whole-response chat.
    async fn complete(&self, request: ChatRequest) -> Result<ChatReply, ClientError>;

    /// Streaming chat. `on_token` fires per decoded chunk; the returned
    /// reply carries the accumulated full text.
    async fn stream(
        &self,
        request: ChatRequest,
        on_token: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<ChatReply, ClientError>;
}

#[async_trait]
impl ResponseClient for BackendClient {
    async fn complete(&self, request: ChatRequest) -> Result<ChatReply, ClientError> {
        self.chat(&request).await
    }

    async fn stream(
        &self,
        request: ChatRequest,
        on_token: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<ChatReply, ClientError> {
        self.stream_chat(&request, on_token).await
    }
}
