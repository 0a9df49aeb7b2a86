//! The response orchestrator.
//!
//! Mediates between user input, the conversation store, and the backend
//! client. Owns the in-flight registry that enforces at most one
//! outstanding request per conversation: a second send for the same
//! conversation while one is pending is dropped, never queued. Requests
//! for different conversations proceed independently.
//!
//! The pending marker is set before the client call is issued and cleared
//! on every resolution path, so a conversation can never stay wedged after
//! its request settles. Streaming token callbacks never touch the store;
//! only the accumulated final text does.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};
use uuid::Uuid;

use folio_client::{ChatReply, ChatRequest, ClientError, HistoryTurn};
use folio_core::config::ChatSettings;

use crate::client::ResponseClient;
use crate::error::ChatError;
use crate::store::{apply, char_prefix, Action, ConversationUpdate, PREVIEW_LEN};
use crate::types::{ChatState, Conversation, FileAttachment, Message, Role, SourceRef};

/// What happened to a `send_message` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The message was sent and its outcome folded into the store.
    Sent,
    /// Dropped: a request for this conversation was already in flight.
    DroppedPending,
    /// Dropped: same text and file name as the user-authored last message.
    DroppedDuplicate,
}

/// Orchestrates conversations against the backend client.
pub struct ChatOrchestrator {
    state: Mutex<ChatState>,
    /// Conversation ids with a request in flight. Absence means idle.
    in_flight: Mutex<HashSet<Uuid>>,
    client: Arc<dyn ResponseClient>,
    settings: ChatSettings,
}

impl ChatOrchestrator {
    /// Create an orchestrator over a seeded store.
    pub fn new(client: Arc<dyn ResponseClient>, settings: ChatSettings) -> Self {
        Self {
            state: Mutex::new(ChatState::seeded()),
            in_flight: Mutex::new(HashSet::new()),
            client,
            settings,
        }
    }

    /// Send a user message and resolve the conversation's placeholder from
    /// the backend's answer (or failure). See `send_message_with` for the
    /// streaming token sink variant.
    pub async fn send_message(
        &self,
        conversation_id: Uuid,
        text: &str,
        file: Option<FileAttachment>,
    ) -> Result<SendOutcome, ChatError> {
        self.send_message_with(conversation_id, text, file, &mut |_| {})
            .await
    }

    /// Send a user message, surfacing streamed tokens through `on_token`
    /// when the streaming endpoint is configured.
    ///
    /// Synchronously (before any await): the duplicate and single-flight
    /// guards run, the user message and loading placeholder are appended,
    /// and the conversation is marked pending. The await happens only at
    /// the client call; reconciliation then swaps the placeholder for the
    /// final answer or an error surrogate and clears the pending marker.
    pub async fn send_message_with(
        &self,
        conversation_id: Uuid,
        text: &str,
        file: Option<FileAttachment>,
        on_token: &mut (dyn FnMut(&str) + Send),
    ) -> Result<SendOutcome, ChatError> {
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let (request, placeholder_id) = {
            let mut state = self
                .state
                .lock()
                .map_err(|e| ChatError::LockPoisoned(e.to_string()))?;
            let conversation = state
                .conversation(conversation_id)
                .ok_or(ChatError::ConversationNotFound(conversation_id))?;

            if is_duplicate(conversation, text, file.as_ref()) {
                debug!(%conversation_id, "Duplicate submission dropped");
                return Ok(SendOutcome::DroppedDuplicate);
            }

            // Check-and-set under one lock: no race window between the
            // pending test and the marker.
            {
                let mut in_flight = self
                    .in_flight
                    .lock()
                    .map_err(|e| ChatError::LockPoisoned(e.to_string()))?;
                if !in_flight.insert(conversation_id) {
                    debug!(%conversation_id, "Send dropped: request already in flight");
                    return Ok(SendOutcome::DroppedPending);
                }
            }

            let history = history_turns(conversation, self.settings.history_turns);

            apply(
                &mut state,
                Action::AppendMessage {
                    conversation_id,
                    message: Message::user(text).with_file(file),
                },
            );
            let placeholder = Message::placeholder();
            let placeholder_id = placeholder.id;
            apply(
                &mut state,
                Action::AppendMessage {
                    conversation_id,
                    message: placeholder,
                },
            );

            (self.build_request(text, history), placeholder_id)
        };

        let result = if self.settings.streaming {
            self.client.stream(request, on_token).await
        } else {
            self.client.complete(request).await
        };

        self.reconcile(conversation_id, placeholder_id, result);
        self.clear_pending(conversation_id);
        Ok(SendOutcome::Sent)
    }

    /// Append an out-of-band bot notice directly, bypassing the
    /// placeholder flow and the pending guard.
    pub fn add_notice(&self, conversation_id: Uuid, text: &str) -> Result<(), ChatError> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| ChatError::LockPoisoned(e.to_string()))?;
        apply(
            &mut state,
            Action::AppendMessage {
                conversation_id,
                message: Message::bot(text),
            },
        );
        Ok(())
    }

    /// Apply a synchronous store action (select, delete, create, retitle).
    pub fn dispatch(&self, action: Action) -> Result<(), ChatError> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| ChatError::LockPoisoned(e.to_string()))?;
        apply(&mut state, action);
        Ok(())
    }

    /// Snapshot of the full store state.
    pub fn state(&self) -> Result<ChatState, ChatError> {
        self.state
            .lock()
            .map(|s| s.clone())
            .map_err(|e| ChatError::LockPoisoned(e.to_string()))
    }

    /// Snapshot of one conversation, if it exists.
    pub fn conversation(&self, id: Uuid) -> Option<Conversation> {
        self.state
            .lock()
            .ok()
            .and_then(|s| s.conversation(id).cloned())
    }

    /// Whether a request is in flight for this conversation.
    pub fn is_pending(&self, id: Uuid) -> bool {
        self.in_flight
            .lock()
            .map(|set| set.contains(&id))
            .unwrap_or(false)
    }

    // -- Private helpers --

    fn build_request(&self, text: &str, history: Vec<HistoryTurn>) -> ChatRequest {
        ChatRequest {
            message: text.to_string(),
            conversation_history: if history.is_empty() {
                None
            } else {
                Some(history)
            },
            temperature: Some(self.settings.temperature),
            max_tokens: Some(self.settings.max_tokens),
            use_context: Some(self.settings.use_context),
            k: Some(self.settings.k),
        }
    }

    /// Fold the client's result back into the store.
    ///
    /// Success swaps the placeholder for the final answer; failure swaps it
    /// for an error surrogate. Either way the placeholder is resolved in
    /// place, even when later messages were appended behind it.
    fn reconcile(
        &self,
        conversation_id: Uuid,
        placeholder_id: Uuid,
        result: Result<ChatReply, ClientError>,
    ) {
        let Ok(mut state) = self.state.lock() else {
            warn!(%conversation_id, "State lock poisoned during reconciliation");
            return;
        };

        match result {
            Ok(reply) => {
                let message = Message::bot(reply.text).with_sources(
                    reply
                        .sources
                        .into_iter()
                        .map(|c| SourceRef {
                            text: c.text,
                            source: c.source,
                            page: c.page,
                            score: c.score,
                        })
                        .collect(),
                );
                apply(
                    &mut state,
                    Action::ReplaceLastMessage {
                        conversation_id,
                        placeholder_id,
                        message,
                    },
                );
            }
            Err(err) => {
                warn!(%conversation_id, error = %err, "Chat request failed");
                let Some(conversation) = state.conversation(conversation_id) else {
                    return;
                };
                let mut messages = conversation.messages.clone();
                let surrogate = Message::bot(error_surrogate(&err));
                // The placeholder may no longer be the tail if a notice
                // landed while the request was in flight; resolve it in
                // place wherever it sits.
                match messages
                    .iter_mut()
                    .find(|m| m.loading && m.id == placeholder_id)
                {
                    Some(slot) => *slot = surrogate,
                    None => messages.push(surrogate),
                }
                let preview = messages
                    .last()
                    .map(|m| char_prefix(&m.content, PREVIEW_LEN))
                    .unwrap_or_default();
                apply(
                    &mut state,
                    Action::UpdateConversation {
                        conversation_id,
                        update: ConversationUpdate {
                            messages: Some(messages),
                            last_message: Some(preview),
                            ..Default::default()
                        },
                    },
                );
            }
        }
    }

    /// Clear the pending marker. Runs on every resolution path.
    fn clear_pending(&self, conversation_id: Uuid) {
        if let Ok(mut in_flight) = self.in_flight.lock() {
            in_flight.remove(&conversation_id);
        }
    }
}

/// True when `(text, file name)` matches a user-authored last message.
/// Guards against double-fire UI events.
fn is_duplicate(conversation: &Conversation, text: &str, file: Option<&FileAttachment>) -> bool {
    conversation.messages.last().is_some_and(|last| {
        last.role == Role::User
            && last.content == text
            && last.file.as_ref().map(|f| f.name.as_str()) == file.map(|f| f.name.as_str())
    })
}

/// Prior turns sent as context, oldest first. Placeholders are skipped.
fn history_turns(conversation: &Conversation, limit: usize) -> Vec<HistoryTurn> {
    if limit == 0 {
        return Vec::new();
    }
    let turns: Vec<HistoryTurn> = conversation
        .messages
        .iter()
        .filter(|m| !m.loading)
        .map(|m| HistoryTurn {
            role: match m.role {
                Role::User => "user".to_string(),
                Role::Bot => "assistant".to_string(),
            },
            content: m.content.clone(),
        })
        .collect();
    let skip = turns.len().saturating_sub(limit);
    turns.into_iter().skip(skip).collect()
}

/// The in-conversation failure text, embedding the underlying detail.
fn error_surrogate(err: &ClientError) -> String {
    format!("Sorry, I couldn't answer that: {}", err)
}

// =============================================================================
// Tests
// =============================================================================
