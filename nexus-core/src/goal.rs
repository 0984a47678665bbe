// nexus-core/src/goal.rs

//! Autonomous goal mode: plan once, then alternate between deciding the next action and
//! executing it until the model reports completion or the action budget runs out.

use crate::api::CompletionGateway;
use crate::errors::NexusError;
use crate::events::{AgentEvent, EventSink};
use crate::mediator::{ToolCallMediator, assign_unique_ids};
use crate::session::Session;
use crate::tools::ToolProvider;
use crate::utils::preview;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

pub const PLANNING_TEMPERATURE: f64 = 0.3;
pub const DECIDING_TEMPERATURE: f64 = 0.1;

pub(crate) const PLANNING_SYSTEM_PROMPT: &str =
    "You are an autonomous AI agent. Create comprehensive plans to achieve goals.";
pub(crate) const DECIDING_SYSTEM_PROMPT: &str = "You are a goal execution agent. Analyze completed work and decide if goal is complete or what specific action comes next. Be decisive and avoid repeating completed actions.";
pub(crate) const ACTING_SYSTEM_PROMPT: &str = "Execute the requested action using available tools.";

/// Characters of an action result shown back to the model when deciding.
const RESULT_PREVIEW_CHARS: usize = 100;

pub(crate) const ACTION_FALLBACK: &str = "Action completed";
pub(crate) const ACTION_WITH_TOOLS_FALLBACK: &str = "Action completed with tools";

/// Whether a deciding reply declares the goal done.
///
/// Case-insensitive substring match on `GOAL_COMPLETE` or `FINISHED`. A reply that merely
/// mentions either word anywhere also counts.
pub fn is_completion_signal(reply: &str) -> bool {
    let upper = reply.to_uppercase();
    upper.contains("GOAL_COMPLETE") || upper.contains("FINISHED")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GoalPhase {
    Planning,
    Deciding,
    Acting,
    Complete,
    BudgetExhausted,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletedAction {
    pub action: String,
    pub result: String,
}

/// How a goal run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum GoalOutcome {
    /// The deciding reply that carried the completion signal, verbatim.
    Complete(String),
    BudgetExhausted { max_actions: usize },
    Failed(String),
}

impl GoalOutcome {
    pub fn message(&self) -> String {
        match self {
            GoalOutcome::Complete(reply) => reply.clone(),
            GoalOutcome::BudgetExhausted { max_actions } => {
                format!("Goal execution reached maximum actions ({})", max_actions)
            }
            GoalOutcome::Failed(cause) => format!("Goal execution failed: {}", cause),
        }
    }
}

/// Everything a finished goal run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalReport {
    pub goal: String,
    pub plan: Option<String>,
    pub completed_actions: Vec<CompletedAction>,
    pub outcome: GoalOutcome,
}

impl GoalReport {
    pub fn message(&self) -> String {
        self.outcome.message()
    }

    pub fn action_count(&self) -> usize {
        self.completed_actions.len()
    }
}

/// State of one `execute_goal` call.
struct GoalRun {
    goal: String,
    plan: Option<String>,
    completed: Vec<CompletedAction>,
    phase: GoalPhase,
}

impl GoalRun {
    fn new(goal: &str) -> Self {
        Self {
            goal: goal.to_string(),
            plan: None,
            completed: Vec::new(),
            phase: GoalPhase::Planning,
        }
    }

    fn enter(&mut self, next: GoalPhase) {
        debug!(
            from = ?self.phase,
            to = ?next,
            actions = self.completed.len(),
            "Goal phase transition"
        );
        self.phase = next;
    }

    fn into_report(self, outcome: GoalOutcome) -> GoalReport {
        GoalReport {
            goal: self.goal,
            plan: self.plan,
            completed_actions: self.completed,
            outcome,
        }
    }
}

fn render_plan_prompt(goal: &str, tool_names: &[String]) -> String {
    format!(
        "Create a comprehensive plan to achieve this goal: {}\n\n\
         Available tools: {}\n\n\
         Create a detailed, step-by-step plan that will accomplish the goal completely.\n\
         List all the specific actions needed in order.\n\
         Be thorough and consider all necessary steps.",
        goal,
        tool_names.join(", ")
    )
}

fn render_completed_summary(completed: &[CompletedAction]) -> String {
    if completed.is_empty() {
        return String::new();
    }
    let mut summary = String::from("\n\nCOMPLETED ACTIONS AND RESULTS:\n");
    for (i, done) in completed.iter().enumerate() {
        let _ = writeln!(
            summary,
            "{}. ✅ {}\n   Result: {}",
            i + 1,
            done.action,
            preview(&done.result, RESULT_PREVIEW_CHARS)
        );
    }
    summary
}

fn render_decision_prompt(goal: &str, plan: &str, completed: &[CompletedAction]) -> String {
    format!(
        "GOAL: {}\n\n\
         ORIGINAL PLAN:\n{}\n{}\n\n\
         CRITICAL INSTRUCTIONS:\n\
         1. Look at what has ALREADY been completed above\n\
         2. Determine if the goal is fully achieved based on completed actions\n\
         3. If goal is achieved, respond with \"GOAL_COMPLETE: [brief summary of what was accomplished]\"\n\
         4. If goal is NOT achieved, identify the NEXT logical step from the original plan that hasn't been done yet\n\
         5. DO NOT repeat any action that has already been completed successfully\n\n\
         What should happen next?",
        goal,
        plan,
        render_completed_summary(completed)
    )
}

fn render_action_prompt(action: &str) -> String {
    format!(
        "Execute this action: {}\n\nUse the available tools to complete this action.\nBe direct and efficient.",
        action
    )
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}

pub struct GoalExecutor {
    gateway: Arc<dyn CompletionGateway>,
    tools: Arc<dyn ToolProvider>,
    events: Arc<dyn EventSink>,
    max_actions: usize,
}

impl GoalExecutor {
    pub fn new(
        gateway: Arc<dyn CompletionGateway>,
        tools: Arc<dyn ToolProvider>,
        events: Arc<dyn EventSink>,
        max_actions: usize,
    ) -> Self {
        Self {
            gateway,
            tools,
            events,
            max_actions,
        }
    }

    pub fn max_actions(&self) -> usize {
        self.max_actions
    }

    /// Runs one goal to a terminal state. Never fails: errors end the run as
    /// [`GoalOutcome::Failed`].
    ///
    /// `session_id` only tags requests. No interactive history is read or written here.
    pub async fn execute_goal(&self, goal: &str, session_id: &str) -> GoalReport {
        info!(
            goal = %goal,
            max_actions = self.max_actions,
            session_id = %session_id,
            "Starting goal"
        );
        self.events.emit(AgentEvent::GoalStarted {
            goal: goal.to_string(),
        });

        let mut run = GoalRun::new(goal);
        let outcome = match self.drive(&mut run, session_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                run.enter(GoalPhase::Failed);
                GoalOutcome::Failed(e.to_string())
            }
        };

        match &outcome {
            GoalOutcome::Complete(reply) => {
                info!(actions = run.completed.len(), "Goal complete");
                self.events.emit(AgentEvent::GoalCompleted {
                    result: reply.clone(),
                });
            }
            GoalOutcome::BudgetExhausted { .. } | GoalOutcome::Failed(_) => {
                error!(actions = run.completed.len(), "{}", outcome.message());
                self.events.emit(AgentEvent::GoalStopped {
                    message: outcome.message(),
                });
            }
        }

        run.into_report(outcome)
    }

    async fn drive(&self, run: &mut GoalRun, session_id: &str) -> Result<GoalOutcome, NexusError> {
        let plan = self.create_plan(&run.goal, session_id).await?;
        self.events.emit(AgentEvent::GoalPlanned { plan: plan.clone() });
        run.plan = Some(plan.clone());
        self.events.emit(AgentEvent::GoalExecuting);

        while run.completed.len() < self.max_actions {
            run.enter(GoalPhase::Deciding);
            let decision = self
                .decide_next_action(&run.goal, &plan, &run.completed, session_id)
                .await?;

            if is_completion_signal(&decision) {
                run.enter(GoalPhase::Complete);
                return Ok(GoalOutcome::Complete(decision));
            }

            run.enter(GoalPhase::Acting);
            self.events.emit(AgentEvent::GoalAction {
                action: decision.clone(),
            });
            let result = self.execute_action(&decision, session_id).await?;
            run.completed.push(CompletedAction {
                action: decision,
                result,
            });
        }

        run.enter(GoalPhase::BudgetExhausted);
        Ok(GoalOutcome::BudgetExhausted {
            max_actions: self.max_actions,
        })
    }

    #[instrument(skip(self, session_id), name = "Goal::plan")]
    async fn create_plan(&self, goal: &str, session_id: &str) -> Result<String, NexusError> {
        let tool_names: Vec<String> = self
            .tools
            .get_tool_definitions()
            .into_iter()
            .map(|d| d.name)
            .collect();

        let mut conversation = Session::with_id(session_id);
        conversation.add_system(PLANNING_SYSTEM_PROMPT);
        conversation.add_user(render_plan_prompt(goal, &tool_names));

        let reply = self
            .gateway
            .complete(
                conversation.messages(),
                session_id,
                None,
                Some(PLANNING_TEMPERATURE),
            )
            .await?;
        let plan = reply
            .content
            .ok_or_else(|| NexusError::protocol("planning response had no content"))?;
        debug!(plan = %plan, "Plan created");
        Ok(plan)
    }

    #[instrument(
        skip(self, plan, completed, session_id),
        fields(iteration = completed.len() + 1),
        name = "Goal::decide"
    )]
    async fn decide_next_action(
        &self,
        goal: &str,
        plan: &str,
        completed: &[CompletedAction],
        session_id: &str,
    ) -> Result<String, NexusError> {
        let mut conversation = Session::with_id(session_id);
        conversation.add_system(DECIDING_SYSTEM_PROMPT);
        conversation.add_user(render_decision_prompt(goal, plan, completed));

        let reply = self
            .gateway
            .complete(
                conversation.messages(),
                session_id,
                None,
                Some(DECIDING_TEMPERATURE),
            )
            .await?;
        let decision = reply
            .content
            .ok_or_else(|| NexusError::protocol("decision response had no content"))?;
        debug!(decision = %decision, "Next step decided");
        Ok(decision)
    }

    /// Runs one action in a throwaway conversation holding only the instruction and the request.
    #[instrument(skip(self, session_id), name = "Goal::act")]
    async fn execute_action(&self, action: &str, session_id: &str) -> Result<String, NexusError> {
        let mut conversation = Session::with_id(session_id);
        conversation.add_system(ACTING_SYSTEM_PROMPT);
        conversation.add_user(render_action_prompt(action));

        let tools = self.tools.get_tool_definitions();
        let reply = self
            .gateway
            .complete(conversation.messages(), session_id, Some(&tools), None)
            .await?;

        match reply.tool_calls.filter(|calls| !calls.is_empty()) {
            Some(mut calls) => {
                assign_unique_ids(&mut calls);
                conversation.add_assistant(None, Some(calls.clone()));
                let mediator = ToolCallMediator::new(
                    self.gateway.as_ref(),
                    self.tools.as_ref(),
                    self.events.as_ref(),
                );
                let text = mediator.run(&mut conversation, &calls).await?;
                Ok(non_empty(text).unwrap_or_else(|| ACTION_WITH_TOOLS_FALLBACK.to_string()))
            }
            None => Ok(non_empty(reply.content).unwrap_or_else(|| ACTION_FALLBACK.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_signal_is_case_insensitive_substring() {
        assert!(is_completion_signal("GOAL_COMPLETE: wrote the file"));
        assert!(is_completion_signal("goal_complete"));
        assert!(is_completion_signal("All steps finished."));
        assert!(is_completion_signal("Not yet GOAL_COMPLETE, keep going"));
        assert!(!is_completion_signal("Write hello.txt next"));
        assert!(!is_completion_signal("GOAL COMPLETE"));
    }

    #[test]
    fn completed_summary_numbers_actions_and_truncates_results() {
        let completed = vec![
            CompletedAction {
                action: "Create folder".into(),
                result: "ok".into(),
            },
            CompletedAction {
                action: "Write file".into(),
                result: "y".repeat(150),
            },
        ];
        let summary = render_completed_summary(&completed);
        assert!(summary.starts_with("\n\nCOMPLETED ACTIONS AND RESULTS:\n"));
        assert!(summary.contains("1. ✅ Create folder\n   Result: ok\n"));
        assert!(summary.contains(&format!(
            "2. ✅ Write file\n   Result: {}...\n",
            "y".repeat(100)
        )));
        assert_eq!(render_completed_summary(&[]), "");
    }

    #[test]
    fn decision_prompt_embeds_goal_plan_and_instructions() {
        let prompt = render_decision_prompt("ship it", "1. build\n2. test", &[]);
        assert!(prompt.starts_with(
            "GOAL: ship it\n\nORIGINAL PLAN:\n1. build\n2. test\n\n\nCRITICAL INSTRUCTIONS:\n"
        ));
        assert!(prompt.contains("DO NOT repeat any action"));
        assert!(prompt.ends_with("What should happen next?"));
    }

    #[test]
    fn plan_prompt_lists_tools() {
        let prompt = render_plan_prompt("tidy", &["read_file".into(), "write_file".into()]);
        assert!(prompt.contains("Available tools: read_file, write_file\n"));
    }

    #[test]
    fn outcome_messages() {
        assert_eq!(
            GoalOutcome::BudgetExhausted { max_actions: 3 }.message(),
            "Goal execution reached maximum actions (3)"
        );
        assert_eq!(
            GoalOutcome::Failed("API request failed: boom".into()).message(),
            "Goal execution failed: API request failed: boom"
        );
        assert_eq!(GoalOutcome::Complete("GOAL_COMPLETE: x".into()).message(), "GOAL_COMPLETE: x");
    }
}
