// nexus-core/src/session.rs

//! Conversation state: the ordered, role-tagged message log replayed to the model.

use crate::errors::NexusError;
use crate::models::chat::{ChatMessage, Role};
use crate::models::tools::ToolCall;
use std::collections::HashSet;
use tracing::{debug, trace};
use uuid::Uuid;

/// One tool result ready to be appended as a tool turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResultMessage {
    pub tool_call_id: String,
    pub content: String,
}

/// Read-only counters shown by the `session` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub session_id: String,
    /// User and assistant turns.
    pub message_count: usize,
    /// Tool turns.
    pub tool_call_count: usize,
}

/// A deep copy of a session's history. Only [`Session::restore`] consumes it.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySnapshot(Vec<ChatMessage>);

impl HistorySnapshot {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    session_id: String,
    messages: Vec<ChatMessage>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

impl Session {
    pub fn new() -> Self {
        Self::with_id(new_session_id())
    }

    /// A conversation tagged with an existing id. Used for throwaway goal conversations.
    pub fn with_id(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            messages: Vec::new(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn history(&self) -> Vec<ChatMessage> {
        self.messages.clone()
    }

    pub fn add_user(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage::user(text));
    }

    pub fn add_system(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage::system(text));
    }

    pub fn add_assistant(&mut self, text: Option<String>, tool_calls: Option<Vec<ToolCall>>) {
        self.messages.push(ChatMessage::assistant(text, tool_calls));
    }

    /// Checks that results with these ids could be appended now, without appending anything.
    ///
    /// Every id must belong to the most recent assistant turn, appear once, and not have been
    /// answered already.
    pub fn check_tool_result_ids<'a, I>(&self, ids: I) -> Result<(), NexusError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut ids = ids.into_iter().peekable();
        if ids.peek().is_none() {
            return Ok(());
        }

        let assistant_index = self
            .messages
            .iter()
            .rposition(|m| m.role == Role::Assistant)
            .ok_or_else(|| {
                NexusError::protocol("tool results without a preceding assistant turn")
            })?;

        let trailing = &self.messages[assistant_index + 1..];
        if trailing.iter().any(|m| m.role != Role::Tool) {
            return Err(NexusError::protocol(
                "tool results must directly follow the assistant turn that requested them",
            ));
        }

        let requested: HashSet<&str> = self.messages[assistant_index]
            .tool_calls
            .iter()
            .flatten()
            .map(|call| call.id.as_str())
            .collect();
        let mut answered: HashSet<&str> = trailing
            .iter()
            .filter_map(|m| m.tool_call_id.as_deref())
            .collect();

        for id in ids {
            if !requested.contains(id) {
                return Err(NexusError::protocol(format!(
                    "tool result '{}' does not match any pending tool call",
                    id
                )));
            }
            if !answered.insert(id) {
                return Err(NexusError::protocol(format!(
                    "tool call '{}' already has a result",
                    id
                )));
            }
        }
        Ok(())
    }

    /// Appends one tool turn per result, in the given order.
    ///
    /// Nothing is appended when [`Session::check_tool_result_ids`] rejects the batch.
    pub fn add_tool_results(&mut self, results: Vec<ToolResultMessage>) -> Result<(), NexusError> {
        self.check_tool_result_ids(results.iter().map(|r| r.tool_call_id.as_str()))?;
        if results.is_empty() {
            return Ok(());
        }

        trace!(count = results.len(), session_id = %self.session_id, "Appending tool results");
        self.messages.extend(
            results
                .into_iter()
                .map(|r| ChatMessage::tool(r.tool_call_id, r.content)),
        );
        Ok(())
    }

    /// Empties the history and keeps the id.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Empties the history and switches to a fresh id, returning it.
    pub fn reset(&mut self) -> String {
        let new_id = new_session_id();
        debug!(old = %self.session_id, new = %new_id, "Resetting session");
        *self = Self::with_id(new_id.clone());
        new_id
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot(self.messages.clone())
    }

    /// Replaces the history with the snapshot's contents.
    pub fn restore(&mut self, snapshot: HistorySnapshot) {
        self.messages = snapshot.0;
    }

    pub fn info(&self) -> SessionInfo {
        let tool_call_count = self
            .messages
            .iter()
            .filter(|m| m.role == Role::Tool)
            .count();
        let message_count = self
            .messages
            .iter()
            .filter(|m| matches!(m.role, Role::User | Role::Assistant))
            .count();
        SessionInfo {
            session_id: self.session_id.clone(),
            message_count,
            tool_call_count,
        }
    }
}
