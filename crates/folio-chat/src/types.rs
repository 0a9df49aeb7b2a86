//! Domain types for conversations and messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Greeting shown in every freshly created conversation.
pub const GREETING: &str = "Hello! Ask me anything about your indexed documents.";

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

/// A file attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
}

/// Retrieval provenance attached to a bot answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Snippet text.
    pub text: String,
    /// Source document filename.
    pub source: String,
    /// Page number in the source document.
    pub page: u32,
    /// Vector distance; lower is a closer match.
    pub score: f64,
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique within the conversation.
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// True only for an optimistic placeholder awaiting a result.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub loading: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FileAttachment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceRef>,
    /// Reference to an audio rendition of the content, when one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            created_at: Utc::now(),
            loading: false,
            file: None,
            sources: Vec::new(),
            audio: None,
        }
    }

    /// A user-authored message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// A bot-authored message.
    pub fn bot(content: impl Into<String>) -> Self {
        Self::new(Role::Bot, content)
    }

    /// An optimistic placeholder awaiting the backend's answer.
    pub fn placeholder() -> Self {
        let mut msg = Self::new(Role::Bot, "");
        msg.loading = true;
        msg
    }

    pub fn with_file(mut self, file: Option<FileAttachment>) -> Self {
        self.file = file;
        self
    }

    pub fn with_sources(mut self, sources: Vec<SourceRef>) -> Self {
        self.sources = sources;
        self
    }
}

/// A named, ordered thread of messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    /// Display title; rewritten from the first user message.
    pub title: String,
    /// Insertion order is chronological order.
    pub messages: Vec<Message>,
    /// Fixed-length preview of the newest message content.
    pub last_message: String,
    pub last_activity: DateTime<Utc>,
}

impl Conversation {
    /// A fresh conversation seeded with the greeting message.
    pub fn new(title: impl Into<String>) -> Self {
        let greeting = Message::bot(GREETING);
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            last_message: greeting.content.clone(),
            last_activity: greeting.created_at,
            messages: vec![greeting],
        }
    }
}

/// The full conversation collection plus the current selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatState {
    pub conversations: Vec<Conversation>,
    /// Id of the selected conversation. Selection is not validated against
    /// the collection; a stale id degrades to "no current conversation".
    pub current_id: Uuid,
}

impl ChatState {
    /// Initial state: one seeded conversation, selected.
    pub fn seeded() -> Self {
        let conversation = Conversation::new("Chat 1");
        let current_id = conversation.id;
        Self {
            conversations: vec![conversation],
            current_id,
        }
    }

    pub fn conversation(&self, id: Uuid) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    pub(crate) fn conversation_mut(&mut self, id: Uuid) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| c.id == id)
    }

    /// The selected conversation, if the selection id is valid.
    pub fn current(&self) -> Option<&Conversation> {
        self.conversation(self.current_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_state_has_one_conversation() {
        let state = ChatState::seeded();
        assert_eq!(state.conversations.len(), 1);
        assert_eq!(state.conversations[0].title, "Chat 1");
        assert_eq!(state.current_id, state.conversations[0].id);
    }

    #[test]
    fn test_seeded_conversation_has_greeting() {
        let state = ChatState::seeded();
        let conv = state.current().unwrap();
        assert_eq!(conv.messages.len(), 1);
        assert_eq!(conv.messages[0].role, Role::Bot);
        assert_eq!(conv.messages[0].content, GREETING);
        assert!(!conv.messages[0].loading);
        assert_eq!(conv.last_message, GREETING);
    }

    #[test]
    fn test_placeholder_is_loading_bot_message() {
        let msg = Message::placeholder();
        assert_eq!(msg.role, Role::Bot);
        assert!(msg.loading);
        assert!(msg.content.is_empty());
    }

    #[test]
    fn test_message_ids_are_unique() {
        let a = Message::user("same");
        let b = Message::user("same");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_current_with_stale_selection() {
        let mut state = ChatState::seeded();
        state.current_id = Uuid::new_v4();
        assert!(state.current().is_none());
    }

    #[test]
    fn test_message_serialization_skips_empty_flags() {
        let msg = Message::user("hi");
        let json = serde_json::to_value(&msg).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("loading"));
        assert!(!obj.contains_key("file"));
        assert!(!obj.contains_key("sources"));
        assert!(!obj.contains_key("audio"));
        assert_eq!(obj["role"], "user");
    }

    #[test]
    fn test_placeholder_serializes_loading_flag() {
        let json = serde_json::to_value(Message::placeholder()).unwrap();
        assert_eq!(json["loading"], true);
        assert_eq!(json["role"], "bot");
    }

    #[test]
    fn test_message_round_trip_with_attachment() {
        let msg = Message::user("see attached").with_file(Some(FileAttachment {
            name: "manual.pdf".to_string(),
            size: 2048,
            mime_type: "application/pdf".to_string(),
        }));
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}
