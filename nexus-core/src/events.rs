// nexus-core/src/events.rs

//! Presentation events emitted while tools and goals run.
//!
//! The core never prints. Front-ends implement [`EventSink`] to show progress;
//! [`TracingEventSink`] only logs.

use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    ToolExecuted {
        tool_name: String,
        summary: String,
        success: bool,
    },
    GoalStarted {
        goal: String,
    },
    GoalPlanned {
        plan: String,
    },
    GoalExecuting,
    GoalAction {
        action: String,
    },
    GoalCompleted {
        result: String,
    },
    GoalStopped {
        message: String,
    },
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: AgentEvent);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: AgentEvent) {
        match event {
            AgentEvent::ToolExecuted {
                tool_name,
                summary,
                success,
            } => info!(tool_name = %tool_name, success, "Tool executed: {}", summary),
            AgentEvent::GoalStarted { goal } => info!(goal = %goal, "Goal started"),
            AgentEvent::GoalPlanned { plan } => info!(plan_len = plan.len(), "Goal planned"),
            AgentEvent::GoalExecuting => info!("Executing goal"),
            AgentEvent::GoalAction { action } => info!(action = %action, "Goal action"),
            AgentEvent::GoalCompleted { result } => info!(result = %result, "Goal completed"),
            AgentEvent::GoalStopped { message } => info!(message = %message, "Goal stopped"),
        }
    }
}
