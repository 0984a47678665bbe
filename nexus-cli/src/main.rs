// nexus-cli/src/main.rs
mod commands;
mod console;
mod models;
mod rendering;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use colored::*;
use rustyline::error::ReadlineError;
use rustyline::{Config, DefaultEditor};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    filter::LevelFilter,
    fmt::{self, time::LocalTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use nexus_core::{Agent, EventSink, GoalOutcome, RuntimeConfig};

use crate::commands::ReplCommand;
use crate::console::ConsoleEventSink;
use crate::rendering::print_reply;

const APP_NAME: &str = "nexus";
const LOG_DIR: &str = "logs";
const HISTORY_FILE_NAME: &str = "cli_history.txt";

/// `logs/nexus_<YYYYmmdd_HHMMSS>.log` relative to the working directory.
fn log_file_name() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let stamp = now
        .format(format_description!(
            "[year][month][day]_[hour][minute][second]"
        ))
        .unwrap_or_else(|_| now.unix_timestamp().to_string());
    format!("{}_{}.log", APP_NAME, stamp)
}

fn print_agent_reply(reply: &str) {
    console::print_bot_label();
    if let Err(e) = print_reply(reply) {
        warn!("Failed to render reply markdown: {}. Printing raw.", e);
        println!("{}", reply);
    }
    println!();
}

async fn run_chat_turn(agent: &mut Agent, sink: &ConsoleEventSink, text: &str) {
    sink.start_spinner("Thinking...");
    let reply = agent.send(text).await;
    sink.stop_spinner();
    print_agent_reply(&reply);
}

/// Runs a goal and prints its final message. Returns whether it completed.
async fn run_goal(agent: &mut Agent, goal: &str) -> bool {
    let report = agent.run_goal(goal).await;
    info!(
        actions = report.action_count(),
        outcome = ?report.outcome,
        "Goal run finished"
    );
    print_agent_reply(&report.message());
    matches!(report.outcome, GoalOutcome::Complete(_))
}

fn history_file_path() -> Result<PathBuf> {
    let dir = dirs::cache_dir()
        .map(|d| d.join(APP_NAME))
        .ok_or_else(|| anyhow!("Could not determine cache directory for history file"))?;
    fs::create_dir_all(&dir).context("Failed to create history directory")?;
    Ok(dir.join(HISTORY_FILE_NAME))
}

async fn run_interactive(mut agent: Agent, sink: Arc<ConsoleEventSink>) -> Result<()> {
    console::print_welcome(
        agent.model_name(),
        agent.session_id(),
        &agent.available_tools(),
    );

    let rl_config = Config::builder()
        .history_ignore_space(true)
        .completion_type(rustyline::CompletionType::List)
        .edit_mode(rustyline::EditMode::Emacs)
        .auto_add_history(true)
        .build();
    let mut rl = DefaultEditor::with_config(rl_config)?;

    let history_path = match history_file_path() {
        Ok(path) => {
            if rl.load_history(&path).is_err() {
                debug!(path = %path.display(), "No previous prompt history found.");
            }
            Some(path)
        }
        Err(e) => {
            warn!("Prompt history disabled: {:#}", e);
            None
        }
    };

    let prompt = format!("{} ", "You:".blue().bold());

    loop {
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                info!("Input closed, leaving interactive mode.");
                break;
            }
            Err(e) => {
                error!("Error reading input: {}", e);
                console::print_error(&format!("Error reading input: {}", e));
                break;
            }
        };

        match ReplCommand::parse(&line) {
            ReplCommand::Quit => break,
            ReplCommand::Empty => {
                console::print_info("Please enter a message or type 'quit' to exit.");
            }
            ReplCommand::Clear => {
                agent.clear_history();
                console::print_success("Conversation history cleared!");
            }
            ReplCommand::Help => console::print_help(&agent.available_tools()),
            ReplCommand::Session => console::print_session_info(&agent.session_info()),
            ReplCommand::Reset => {
                let session_id = agent.reset_session();
                console::print_success(&format!("New session started: {}", session_id));
            }
            ReplCommand::GoalMissing => {
                console::print_info("Usage: goal <objective>");
            }
            ReplCommand::Goal(goal) => {
                run_goal(&mut agent, &goal).await;
            }
            ReplCommand::Chat(text) => run_chat_turn(&mut agent, &sink, &text).await,
        }
    }

    console::print_goodbye();

    if let Some(path) = history_path {
        if let Err(e) = rl.save_history(&path) {
            warn!(path = %path.display(), "Failed to save prompt history: {}", e);
        }
    }
    Ok(())
}

fn tool_root(cli_root: Option<PathBuf>) -> Result<PathBuf> {
    match cli_root {
        Some(root) => Ok(root),
        None => env::current_dir().context("Failed to determine current directory"),
    }
}

fn build_agent(config: &RuntimeConfig, root: &Path, sink: Arc<ConsoleEventSink>) -> Result<Agent> {
    let events: Arc<dyn EventSink> = sink;
    Agent::from_config(config, root, events)
}

#[tokio::main]
async fn main() -> ExitCode {
    colored::control::set_override(true);

    dotenvy::dotenv().ok();
    let cli = models::cli::Cli::parse();

    let default_level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(default_level.into()));

    let log_dir = PathBuf::from(LOG_DIR);
    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!(
            "{} Failed to create log directory {}: {}",
            "Error:".red(),
            log_dir.display(),
            e
        );
        return ExitCode::FAILURE;
    }
    let log_name = log_file_name();
    let log_path = log_dir.join(&log_name);
    let file_appender = tracing_appender::rolling::never(&log_dir, &log_name);
    let (non_blocking_writer, _guard) = tracing_appender::non_blocking(file_appender);

    let timer = match time::format_description::parse(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]",
    ) {
        Ok(desc) => LocalTime::new(desc),
        Err(e) => {
            eprintln!("{} Failed to parse log time format: {}", "Error:".red(), e);
            return ExitCode::FAILURE;
        }
    };

    // The file always gets DEBUG and up; the terminal follows -v / RUST_LOG.
    let file_layer = fmt::layer()
        .with_writer(non_blocking_writer)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .with_timer(timer.clone())
        .with_filter(LevelFilter::DEBUG);
    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_timer(timer)
        .with_target(false)
        .with_level(true)
        .with_filter(env_filter);

    if let Err(e) = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
    {
        eprintln!("{} Failed to initialize logging: {}", "Error:".red(), e);
        return ExitCode::FAILURE;
    }
    colored::control::unset_override();

    info!(
        "Logging initialized (terminal level: {}). Writing debug log to {}",
        default_level,
        log_path.display()
    );

    let config = match RuntimeConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            console::print_error(&format!("{}", e));
            return ExitCode::FAILURE;
        }
    };
    info!(
        api_key = %config.masked_api_key(),
        api_url = %config.api_url,
        model = %config.model_name,
        "Configuration loaded"
    );

    let root = match tool_root(cli.root) {
        Ok(root) => root,
        Err(e) => {
            error!("{:#}", e);
            console::print_error(&format!("{:#}", e));
            return ExitCode::FAILURE;
        }
    };

    let sink = Arc::new(ConsoleEventSink::default());
    let mut agent = match build_agent(&config, &root, Arc::clone(&sink)) {
        Ok(agent) => agent,
        Err(e) => {
            error!("Failed to initialize assistant: {:#}", e);
            console::print_error(&format!("Failed to initialize assistant: {:#}", e));
            return ExitCode::FAILURE;
        }
    };

    if let Some(text) = cli.turn {
        run_chat_turn(&mut agent, &sink, &text).await;
        return ExitCode::SUCCESS;
    }
    if let Some(goal) = cli.goal {
        return if run_goal(&mut agent, &goal).await {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    match run_interactive(agent, sink).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Interactive session failed: {:#}", e);
            console::print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
