//! Conversation state and response orchestration for Folio.
//!
//! The store is a pure state-transition function over the conversation
//! collection; the orchestrator mediates between user input, the store,
//! and the backend client with an at-most-one-in-flight guarantee per
//! conversation.

pub mod client;
pub mod error;
pub mod orchestrator;
pub mod store;
pub mod types;

pub use client::ResponseClient;
pub use error::ChatError;
pub use orchestrator::{ChatOrchestrator, SendOutcome};
pub use store::{apply, Action, ConversationUpdate, PREVIEW_LEN, TITLE_LEN};
pub use types::{ChatState, Conversation, FileAttachment, Message, Role, SourceRef};
