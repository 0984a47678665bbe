// nexus-core/src/api/mod.rs

//! Completion gateway: the only place the model API is reached.

use crate::errors::NexusError;
use crate::models::chat::ChatMessage;
use crate::models::tools::ToolDefinition;
use async_trait::async_trait;

pub mod openai;

pub const REQUEST_FAILED: &str = "API request failed";
pub const FOLLOW_UP_FAILED: &str = "Follow-up API request failed";

#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// Sends the history and returns exactly one assistant turn.
    ///
    /// With `tools`, the request advertises them and lets the model choose
    /// (`tool_choice = "auto"`).
    /// `temperature` overrides the configured default for this call only.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        session_id: &str,
        tools: Option<&[ToolDefinition]>,
        temperature: Option<f64>,
    ) -> Result<ChatMessage, NexusError>;

    /// Second round after tool results. Never advertises tools.
    async fn follow_up(
        &self,
        messages: &[ChatMessage],
        session_id: &str,
    ) -> Result<ChatMessage, NexusError>;

    fn model_name(&self) -> &str;
}

#[cfg(test)]
mod tests;
