// nexus-core/src/lib.rs

#![doc = include_str!("../../README.md")]

pub mod agent;
pub mod api;
pub mod config;
pub mod errors;
pub mod events;
pub mod goal;
pub mod mediator;
pub mod session;
pub mod tools;
pub mod utils;

pub mod models {
    pub mod chat;
    pub mod tools;
}

#[cfg(test)]
mod test_support;

pub use agent::Agent;
pub use api::CompletionGateway;
pub use api::openai::OpenAiGateway;
pub use config::RuntimeConfig;
pub use errors::NexusError;
pub use events::{AgentEvent, EventSink, TracingEventSink};
pub use goal::{CompletedAction, GoalExecutor, GoalOutcome, GoalReport};
pub use mediator::{ToolCallMediator, assign_unique_ids};
pub use models::chat::{ApiResponse, ChatMessage, Choice, Role};
pub use models::tools::{
    ToolCall, ToolDefinition, ToolFunction, ToolInput, ToolParameter, ToolParameterType,
    ToolParametersDefinition,
};
pub use session::{HistorySnapshot, Session, SessionInfo, ToolResultMessage};
pub use tools::{FileTools, ToolError, ToolOutcome, ToolPayload, ToolProvider};

pub use async_trait::async_trait;
