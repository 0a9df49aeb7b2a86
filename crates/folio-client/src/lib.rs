//! HTTP adapter over the document-chat backend.
//!
//! Stateless client for the backend's JSON API: whole-response and streaming
//! chat, semantic search, file management, and index management. Holds no
//! conversation state of its own; the chat crate owns that.

pub mod backend;
pub mod error;
pub mod extract;
pub mod stream;
pub mod types;

pub use backend::BackendClient;
pub use error::ClientError;
pub use types::{
    BuildReceipt, ChatReply, ChatRequest, CollectionStats, ContextChunk, DeleteReceipt,
    FileListing, HistoryTurn, IndexStatus, SearchHit, SearchResponse, StoredFile, UploadReceipt,
};
