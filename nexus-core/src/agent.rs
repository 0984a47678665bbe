// nexus-core/src/agent.rs

//! The chat facade: interactive turns plus goal mode over one conversation.

use crate::api::CompletionGateway;
use crate::api::openai::OpenAiGateway;
use crate::config::RuntimeConfig;
use crate::errors::NexusError;
use crate::events::EventSink;
use crate::goal::{GoalExecutor, GoalReport};
use crate::mediator::{ToolCallMediator, assign_unique_ids};
use crate::models::chat::ChatMessage;
use crate::models::tools::ToolDefinition;
use crate::session::{HistorySnapshot, Session, SessionInfo};
use crate::tools::{FileTools, ToolProvider};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct Agent {
    session: Session,
    gateway: Arc<dyn CompletionGateway>,
    tools: Arc<dyn ToolProvider>,
    events: Arc<dyn EventSink>,
    goal_executor: GoalExecutor,
}

/// Restores the captured history when dropped, whatever way the goal run ends.
struct HistoryGuard<'a> {
    session: &'a mut Session,
    snapshot: Option<HistorySnapshot>,
}

impl<'a> HistoryGuard<'a> {
    fn new(session: &'a mut Session) -> Self {
        let snapshot = Some(session.snapshot());
        Self { session, snapshot }
    }
}

impl Drop for HistoryGuard<'_> {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            debug!(messages = snapshot.len(), "Restoring interactive history");
            self.session.restore(snapshot);
        }
    }
}

impl Agent {
    pub fn new(
        gateway: Arc<dyn CompletionGateway>,
        tools: Arc<dyn ToolProvider>,
        events: Arc<dyn EventSink>,
        max_goal_actions: usize,
    ) -> Self {
        let goal_executor = GoalExecutor::new(
            Arc::clone(&gateway),
            Arc::clone(&tools),
            Arc::clone(&events),
            max_goal_actions,
        );
        let session = Session::new();
        info!(session_id = %session.session_id(), model = %gateway.model_name(), "Agent created");
        Self {
            session,
            gateway,
            tools,
            events,
            goal_executor,
        }
    }

    /// Wires the OpenAI-compatible gateway and file tools rooted at `root`.
    pub fn from_config(
        config: &RuntimeConfig,
        root: &Path,
        events: Arc<dyn EventSink>,
    ) -> Result<Self> {
        let gateway = OpenAiGateway::new(config).context("Failed to create completion gateway")?;
        let tools = FileTools::new(root)
            .with_context(|| format!("Failed to open tool root {}", root.display()))?;
        Ok(Self::new(
            Arc::new(gateway),
            Arc::new(tools),
            events,
            config.max_goal_actions,
        ))
    }

    /// One interactive turn. Errors come back as `Error: <cause>` text.
    pub async fn send(&mut self, text: &str) -> String {
        match self.try_send(text).await {
            Ok(reply) => reply.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, session_id = %self.session.session_id(), "Chat turn failed");
                format!("Error: {}", e)
            }
        }
    }

    async fn try_send(&mut self, text: &str) -> Result<Option<String>, NexusError> {
        self.session.add_user(text);

        let tools = self.tools.get_tool_definitions();
        let reply = self
            .gateway
            .complete(
                self.session.messages(),
                self.session.session_id(),
                Some(&tools),
                None,
            )
            .await?;

        let ChatMessage {
            content,
            tool_calls,
            ..
        } = reply;
        let mut tool_calls = tool_calls.unwrap_or_default();
        assign_unique_ids(&mut tool_calls);
        self.session
            .add_assistant(content.clone(), Some(tool_calls.clone()));

        if tool_calls.is_empty() {
            return Ok(content);
        }

        let mediator = ToolCallMediator::new(
            self.gateway.as_ref(),
            self.tools.as_ref(),
            self.events.as_ref(),
        );
        mediator.run(&mut self.session, &tool_calls).await
    }

    /// Runs a goal. The interactive history is identical afterwards on every exit path.
    pub async fn run_goal(&mut self, goal: &str) -> GoalReport {
        let session_id = self.session.session_id().to_string();
        let _guard = HistoryGuard::new(&mut self.session);
        self.goal_executor.execute_goal(goal, &session_id).await
    }

    pub fn clear_history(&mut self) {
        self.session.clear();
    }

    /// Starts a fresh conversation and returns its id.
    pub fn reset_session(&mut self) -> String {
        self.session.reset()
    }

    pub fn session_id(&self) -> &str {
        self.session.session_id()
    }

    pub fn session_info(&self) -> SessionInfo {
        self.session.info()
    }

    pub fn history(&self) -> Vec<ChatMessage> {
        self.session.history()
    }

    pub fn model_name(&self) -> &str {
        self.gateway.model_name()
    }

    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.get_tool_definitions()
    }

    pub fn available_tools(&self) -> Vec<String> {
        self.tool_definitions().into_iter().map(|d| d.name).collect()
    }

    pub fn max_goal_actions(&self) -> usize {
        self.goal_executor.max_actions()
    }
}
