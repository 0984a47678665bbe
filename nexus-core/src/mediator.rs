// nexus-core/src/mediator.rs

//! Runs the tool calls of one assistant turn and asks the model for the final answer.

use crate::api::CompletionGateway;
use crate::errors::NexusError;
use crate::events::{AgentEvent, EventSink};
use crate::models::tools::{ToolCall, ToolInput};
use crate::session::{Session, ToolResultMessage};
use crate::tools::{ToolError, ToolOutcome, ToolProvider};
use std::collections::HashSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Replaces blank or repeated ids in one batch so every call can be answered exactly once.
///
/// Call before the assistant turn carrying `calls` is recorded.
pub fn assign_unique_ids(calls: &mut [ToolCall]) {
    let mut seen = HashSet::new();
    for (index, call) in calls.iter_mut().enumerate() {
        if call.id.trim().is_empty() || !seen.insert(call.id.clone()) {
            let fresh = format!("call_{}_{}", index, Uuid::new_v4().simple());
            warn!(
                original = %call.id,
                replacement = %fresh,
                "Replacing blank or repeated tool call id"
            );
            call.id = fresh;
            seen.insert(call.id.clone());
        }
    }
}

pub struct ToolCallMediator<'a> {
    gateway: &'a dyn CompletionGateway,
    tools: &'a dyn ToolProvider,
    events: &'a dyn EventSink,
}

impl<'a> ToolCallMediator<'a> {
    pub fn new(
        gateway: &'a dyn CompletionGateway,
        tools: &'a dyn ToolProvider,
        events: &'a dyn EventSink,
    ) -> Self {
        Self {
            gateway,
            tools,
            events,
        }
    }

    /// Executes `tool_calls` in order, appends one tool turn per call, then makes exactly one
    /// follow-up request and appends its reply.
    ///
    /// The assistant turn carrying `tool_calls` must already be the last assistant turn in
    /// `session`; the ids are checked against it before any tool runs. A failing tool does not
    /// stop the batch. Returns the follow-up reply's text.
    pub async fn run(
        &self,
        session: &mut Session,
        tool_calls: &[ToolCall],
    ) -> Result<Option<String>, NexusError> {
        info!(count = tool_calls.len(), "Executing requested tools");
        session.check_tool_result_ids(tool_calls.iter().map(|call| call.id.as_str()))?;

        let mut results = Vec::with_capacity(tool_calls.len());
        for call in tool_calls {
            let tool_name = call.function.name.as_str();
            debug!(
                tool_call_id = %call.id,
                tool_name = %tool_name,
                arguments = %call.function.arguments,
                "Running tool call"
            );

            let outcome = match ToolInput::from_json_str(&call.function.arguments) {
                Ok(input) => self.tools.execute_tool(tool_name, input).await,
                Err(e) => {
                    warn!(
                        tool_call_id = %call.id,
                        error = %e,
                        "Tool arguments are not a JSON object"
                    );
                    let error = ToolError::InvalidArguments {
                        tool: tool_name.to_string(),
                        reason: e.to_string(),
                    };
                    ToolOutcome::Failure(error.to_string())
                }
            };

            self.events.emit(AgentEvent::ToolExecuted {
                tool_name: tool_name.to_string(),
                summary: outcome.summary(),
                success: outcome.is_success(),
            });
            results.push(ToolResultMessage {
                tool_call_id: call.id.clone(),
                content: outcome.to_content(),
            });
        }
        session.add_tool_results(results)?;

        let reply = self
            .gateway
            .follow_up(session.messages(), session.session_id())
            .await?;
        if reply.has_tool_calls() {
            warn!(
                "Follow-up reply requested more tools; only one round per turn is supported, ignoring them"
            );
        }
        session.add_assistant(reply.content.clone(), None);
        Ok(reply.content)
    }
}
