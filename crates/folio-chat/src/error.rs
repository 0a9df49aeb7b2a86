//! Error types for the chat engine.

use folio_core::error::FolioError;
use uuid::Uuid;

/// Errors from the orchestrator's synchronous validation.
///
/// Backend failures are never surfaced here: they are folded into the
/// conversation as an error message and the call still resolves.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("conversation not found: {0}")]
    ConversationNotFound(Uuid),
    #[error("state lock poisoned: {0}")]
    LockPoisoned(String),
}

impl From<ChatError> for FolioError {
    fn from(err: ChatError) -> Self {
        FolioError::Chat(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(
            ChatError::EmptyMessage.to_string(),
            "message cannot be empty"
        );

        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(
            ChatError::ConversationNotFound(id).to_string(),
            "conversation not found: 550e8400-e29b-41d4-a716-446655440000"
        );

        let err = ChatError::LockPoisoned("orchestrator state".to_string());
        assert_eq!(err.to_string(), "state lock poisoned: orchestrator state");
    }

    #[test]
    fn test_into_folio_error() {
        let err: FolioError = ChatError::EmptyMessage.into();
        assert!(matches!(err, FolioError::Chat(_)));
        assert!(err.to_string().contains("empty"));
    }
}
