// nexus-cli/src/console.rs

//! Colored terminal output: banners, session info and progress events.

use crate::commands::HELP_ENTRIES;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use nexus_core::{AgentEvent, EventSink, SessionInfo};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

const BOT_NAME: &str = "Nexus";
const RULE_WIDTH: usize = 50;

fn rule() -> String {
    "─".repeat(RULE_WIDTH)
}

/// Prints agent events, pausing the spinner (if any) so lines don't interleave with it.
#[derive(Default)]
pub struct ConsoleEventSink {
    spinner: Mutex<Option<ProgressBar>>,
}

impl ConsoleEventSink {
    pub fn start_spinner(&self, message: &'static str) {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_strings(&[
                "⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "-",
            ]));
        }
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(100));
        if let Some(previous) = self.lock().replace(pb) {
            previous.finish_and_clear();
        }
    }

    pub fn stop_spinner(&self) {
        if let Some(pb) = self.lock().take() {
            pb.finish_and_clear();
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<ProgressBar>> {
        self.spinner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn print(&self, line: String) {
        match self.lock().as_ref() {
            Some(pb) => pb.suspend(|| println!("{}", line)),
            None => println!("{}", line),
        }
    }
}

impl EventSink for ConsoleEventSink {
    fn emit(&self, event: AgentEvent) {
        debug!(?event, "Console event");
        let line = match event {
            AgentEvent::ToolExecuted {
                tool_name,
                summary,
                success,
            } => {
                let summary = if success {
                    summary.green()
                } else {
                    summary.red()
                };
                format!("{} {} {}", format!("🔧 {}", tool_name).cyan(), "→".white(), summary)
            }
            AgentEvent::GoalStarted { goal } => {
                format!("\n{}", format!("🎯 Goal: {}", goal).magenta().bold())
            }
            AgentEvent::GoalPlanned { plan } => format!("{}\n{}", "📋 Plan:".cyan(), plan),
            AgentEvent::GoalExecuting => "⚡ Executing...".yellow().to_string(),
            AgentEvent::GoalAction { action } => format!("🔄 {}", action).blue().to_string(),
            AgentEvent::GoalCompleted { .. } => "✅ Goal completed!".green().bold().to_string(),
            AgentEvent::GoalStopped { message } => format!("❌ {}", message).red().to_string(),
        };
        self.print(line);
    }
}

pub fn print_welcome(model_name: &str, session_id: &str, tools: &[String]) {
    println!(
        "{}",
        format!("🤖 Welcome to {} AI Assistant!", BOT_NAME).cyan().bold()
    );
    println!("{}", "Type 'quit' to exit, 'help' for commands".yellow());
    println!("{}", rule().blue());
    println!("{}", format!("Using model: {}", model_name).green());
    println!("{}", format!("Session ID: {}", session_id).magenta());
    println!("{}", format!("Available tools: {}", tools.join(", ")).cyan());
    println!("{}", rule().blue());
}

pub fn print_goodbye() {
    println!("\n{}", format!("👋 Goodbye from {}!", BOT_NAME).cyan().bold());
}

pub fn print_help(tools: &[String]) {
    println!("\n{}", "🆘 Available commands:".cyan().bold());
    for entry in HELP_ENTRIES {
        println!("  {}", entry.yellow());
    }
    println!("\n{} {}", "Available tools:".cyan(), tools.join(", "));
    println!(
        "\n{}",
        format!(
            "You can ask {} to read or write files within the tool root directory.",
            BOT_NAME
        )
        .green()
    );
    println!(
        "{}",
        "Use 'goal' command for autonomous task execution with automatic tool usage.".green()
    );
    println!(
        "{}",
        "All requests are grouped by session ID for tracking in LiteLLM.".blue()
    );
}

pub fn print_session_info(info: &SessionInfo) {
    println!("\n{}", "📊 Session Information:".magenta());
    println!("  {} {}", "Session ID:".cyan(), info.session_id);
    println!("  {} {}", "Messages:".cyan(), info.message_count);
    println!("  {} {}", "Tool calls:".cyan(), info.tool_call_count);
}

pub fn print_bot_label() {
    println!("\n{}", format!("{}:", BOT_NAME).green());
}

pub fn print_info(message: &str) {
    println!("{}", format!("ℹ️  {}", message).blue());
}

pub fn print_success(message: &str) {
    println!("{}", format!("✅ {}", message).green());
}

pub fn print_error(message: &str) {
    eprintln!("{}", format!("❌ {}", message).red());
}
