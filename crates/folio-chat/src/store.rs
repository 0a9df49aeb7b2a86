//! The conversation store: a pure state-transition function.
//!
//! `apply` executes one action against the state, to completion, with no
//! I/O. Every transition is total: an action naming an unknown conversation
//! is a logged no-op, never an error.

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::types::{ChatState, Conversation, Message, Role};

/// Character length of the `last_message` preview.
pub const PREVIEW_LEN: usize = 50;
/// Character length of a title derived from the first user message.
pub const TITLE_LEN: usize = 30;

/// State transitions recognized by the store.
#[derive(Debug, Clone)]
pub enum Action {
    /// Append a new conversation ("Chat N", greeting seeded) and select it.
    CreateConversation,
    /// Remove a conversation. The store never ends up empty: deleting the
    /// last one synthesizes a fresh conversation in its place.
    DeleteConversation { id: Uuid },
    /// Set the current selection. The id is not validated; callers own the
    /// consequences of selecting a stale id.
    SelectConversation { id: Uuid },
    /// Append a message, refresh the preview and activity timestamp, and
    /// retitle the conversation on its first user-authored message.
    AppendMessage {
        conversation_id: Uuid,
        message: Message,
    },
    /// Resolve an optimistic placeholder into its final form. The
    /// placeholder is located by id, wherever it sits in the list; messages
    /// may have been appended behind it while the request was in flight.
    /// A missing or already-resolved placeholder leaves history untouched.
    ReplaceLastMessage {
        conversation_id: Uuid,
        placeholder_id: Uuid,
        message: Message,
    },
    /// Shallow-merge the given fields into a conversation.
    UpdateConversation {
        conversation_id: Uuid,
        update: ConversationUpdate,
    },
    /// Set the title verbatim.
    EditTitle { conversation_id: Uuid, title: String },
}

/// Partial conversation fields for `Action::UpdateConversation`.
#[derive(Debug, Clone, Default)]
pub struct ConversationUpdate {
    pub title: Option<String>,
    pub messages: Option<Vec<Message>>,
    pub last_message: Option<String>,
}

/// Apply one action to the state.
pub fn apply(state: &mut ChatState, action: Action) {
    match action {
        Action::CreateConversation => {
            let conversation = Conversation::new(format!("Chat {}", state.conversations.len() + 1));
            state.current_id = conversation.id;
            state.conversations.push(conversation);
        }

        Action::DeleteConversation { id } => {
            state.conversations.retain(|c| c.id != id);
            if state.current_id == id {
                match state.conversations.first() {
                    Some(first) => state.current_id = first.id,
                    None => apply(state, Action::CreateConversation),
                }
            } else if state.conversations.is_empty() {
                apply(state, Action::CreateConversation);
            }
        }

        Action::SelectConversation { id } => {
            state.current_id = id;
        }

        Action::AppendMessage {
            conversation_id,
            message,
        } => {
            let Some(conversation) = state.conversation_mut(conversation_id) else {
                debug!(%conversation_id, "AppendMessage to unknown conversation ignored");
                return;
            };
            if message.role == Role::User
                && !conversation.messages.iter().any(|m| m.role == Role::User)
            {
                conversation.title = char_prefix(&message.content, TITLE_LEN);
            }
            conversation.last_message = char_prefix(&message.content, PREVIEW_LEN);
            conversation.last_activity = Utc::now();
            conversation.messages.push(message);
        }

        Action::ReplaceLastMessage {
            conversation_id,
            placeholder_id,
            message,
        } => {
            let Some(conversation) = state.conversation_mut(conversation_id) else {
                debug!(%conversation_id, "ReplaceLastMessage to unknown conversation ignored");
                return;
            };
            let Some(slot) = conversation
                .messages
                .iter_mut()
                .find(|m| m.loading && m.id == placeholder_id)
            else {
                warn!(
                    %conversation_id,
                    %placeholder_id,
                    "ReplaceLastMessage without a matching placeholder ignored"
                );
                return;
            };
            *slot = message;
            if let Some(last) = conversation.messages.last() {
                conversation.last_message = char_prefix(&last.content, PREVIEW_LEN);
            }
            conversation.last_activity = Utc::now();
        }

        Action::UpdateConversation {
            conversation_id,
            update,
        } => {
            let Some(conversation) = state.conversation_mut(conversation_id) else {
                debug!(%conversation_id, "UpdateConversation to unknown conversation ignored");
                return;
            };
            if let Some(title) = update.title {
                conversation.title = title;
            }
            if let Some(messages) = update.messages {
                conversation.messages = messages;
            }
            if let Some(last_message) = update.last_message {
                conversation.last_message = last_message;
            }
            conversation.last_activity = Utc::now();
        }

        Action::EditTitle {
            conversation_id,
            title,
        } => {
            if let Some(conversation) = state.conversation_mut(conversation_id) {
                conversation.title = title;
            }
        }
    }
}

/// First `n` characters of `s`, never splitting a scalar.
pub(crate) fn char_prefix(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}
