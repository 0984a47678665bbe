// nexus-core/src/test_support.rs

//! Scripted collaborators shared by the agent and goal tests.

use crate::api::{CompletionGateway, FOLLOW_UP_FAILED, REQUEST_FAILED};
use crate::errors::NexusError;
use crate::events::{AgentEvent, EventSink};
use crate::models::chat::ChatMessage;
use crate::models::tools::{
    ToolCall, ToolDefinition, ToolInput, ToolParameter, ToolParameterType,
    ToolParametersDefinition,
};
use crate::tools::{ToolOutcome, ToolProvider};
use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;

/// What the gateway was asked.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedRequest {
    pub messages: Vec<ChatMessage>,
    pub session_id: String,
    pub with_tools: bool,
    pub temperature: Option<f64>,
    pub follow_up: bool,
}

type Responder = Box<dyn Fn(&RecordedRequest) -> Result<ChatMessage, NexusError> + Send + Sync>;

pub(crate) struct ScriptedGateway {
    requests: Mutex<Vec<RecordedRequest>>,
    responder: Responder,
}

impl ScriptedGateway {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&RecordedRequest) -> Result<ChatMessage, NexusError> + Send + Sync + 'static,
    {
        Self {
            requests: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        }
    }

    /// Answers requests with `replies` in order, then fails.
    pub fn queued(replies: Vec<Result<ChatMessage, NexusError>>) -> Self {
        let queue = Mutex::new(VecDeque::from(replies));
        Self::new(move |_| {
            queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| {
                    Err(NexusError::gateway(
                        REQUEST_FAILED,
                        anyhow!("script exhausted"),
                    ))
                })
        })
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn answer(&self, request: RecordedRequest) -> Result<ChatMessage, NexusError> {
        let reply = (self.responder)(&request);
        self.requests.lock().unwrap().push(request);
        reply
    }
}

#[async_trait]
impl CompletionGateway for ScriptedGateway {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        session_id: &str,
        tools: Option<&[ToolDefinition]>,
        temperature: Option<f64>,
    ) -> Result<ChatMessage, NexusError> {
        self.answer(RecordedRequest {
            messages: messages.to_vec(),
            session_id: session_id.to_string(),
            with_tools: tools.is_some_and(|t| !t.is_empty()),
            temperature,
            follow_up: false,
        })
    }

    async fn follow_up(
        &self,
        messages: &[ChatMessage],
        session_id: &str,
    ) -> Result<ChatMessage, NexusError> {
        self.answer(RecordedRequest {
            messages: messages.to_vec(),
            session_id: session_id.to_string(),
            with_tools: false,
            temperature: None,
            follow_up: true,
        })
    }

    fn model_name(&self) -> &str {
        "scripted-model"
    }
}

pub(crate) fn text_reply(text: &str) -> Result<ChatMessage, NexusError> {
    Ok(ChatMessage::assistant(Some(text.to_string()), None))
}

pub(crate) fn tool_reply(calls: Vec<ToolCall>) -> Result<ChatMessage, NexusError> {
    Ok(ChatMessage::assistant(None, Some(calls)))
}

pub(crate) fn request_error(cause: &str) -> Result<ChatMessage, NexusError> {
    Err(NexusError::gateway(REQUEST_FAILED, anyhow!("{}", cause)))
}

pub(crate) fn follow_up_error(cause: &str) -> Result<ChatMessage, NexusError> {
    Err(NexusError::gateway(FOLLOW_UP_FAILED, anyhow!("{}", cause)))
}

/// Tool provider that logs every call and answers from a fixed table.
pub(crate) struct RecordingToolProvider {
    call_log: Mutex<Vec<(String, Value)>>,
    outcomes: HashMap<String, ToolOutcome>,
    definitions: Vec<ToolDefinition>,
}

impl RecordingToolProvider {
    pub fn new(outcomes: Vec<(&str, ToolOutcome)>) -> Self {
        let definitions = outcomes.iter().map(|(name, _)| simple_def(name)).collect();
        Self {
            call_log: Mutex::new(Vec::new()),
            outcomes: outcomes
                .into_iter()
                .map(|(name, outcome)| (name.to_string(), outcome))
                .collect(),
            definitions,
        }
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.call_log.lock().unwrap().clone()
    }
}

fn simple_def(name: &str) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: format!("Mock tool {}", name),
        parameters: ToolParametersDefinition {
            param_type: "object".to_string(),
            properties: BTreeMap::from([(
                "arg".to_string(),
                ToolParameter {
                    param_type: ToolParameterType::String,
                    description: "An argument".to_string(),
                },
            )]),
            required: vec![],
        },
    }
}

#[async_trait]
impl ToolProvider for RecordingToolProvider {
    fn get_tool_definitions(&self) -> Vec<ToolDefinition> {
        self.definitions.clone()
    }

    async fn execute_tool(&self, tool_name: &str, input: ToolInput) -> ToolOutcome {
        let args = serde_json::to_value(&input.arguments).unwrap_or_default();
        self.call_log
            .lock()
            .unwrap()
            .push((tool_name.to_string(), args));
        self.outcomes
            .get(tool_name)
            .cloned()
            .unwrap_or_else(|| ToolOutcome::Failure(format!("Unknown function: {}", tool_name)))
    }
}

#[derive(Default)]
pub(crate) struct RecordingEventSink {
    events: Mutex<Vec<AgentEvent>>,
}

impl RecordingEventSink {
    pub fn events(&self) -> Vec<AgentEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: AgentEvent) {
        self.events.lock().unwrap().push(event);
    }
}
