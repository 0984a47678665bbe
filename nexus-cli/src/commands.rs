// nexus-cli/src/commands.rs

/// One line typed at the interactive prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Quit,
    Clear,
    Help,
    Session,
    Reset,
    Goal(String),
    /// `goal` typed without an objective.
    GoalMissing,
    Chat(String),
    Empty,
}

impl ReplCommand {
    /// Keywords are matched case-insensitively; chat text is passed through trimmed.
    pub fn parse(line: &str) -> Self {
        let input = line.trim();
        if input.is_empty() {
            return ReplCommand::Empty;
        }

        match input.to_lowercase().as_str() {
            "quit" | "exit" => return ReplCommand::Quit,
            "clear" => return ReplCommand::Clear,
            "help" => return ReplCommand::Help,
            "session" => return ReplCommand::Session,
            "reset" => return ReplCommand::Reset,
            "goal" => return ReplCommand::GoalMissing,
            _ => {}
        }

        let mut parts = input.splitn(2, char::is_whitespace);
        let head = parts.next().unwrap_or_default();
        if head.eq_ignore_ascii_case("goal") {
            let goal = parts.next().unwrap_or_default().trim();
            return if goal.is_empty() {
                ReplCommand::GoalMissing
            } else {
                ReplCommand::Goal(goal.to_string())
            };
        }

        ReplCommand::Chat(input.to_string())
    }
}

pub const HELP_ENTRIES: &[&str] = &[
    "quit    - Exit Nexus (also: exit, Ctrl-D)",
    "clear   - Clear conversation history",
    "help    - Show this help message",
    "session - Show session information",
    "reset   - Start a new session with a fresh ID",
    "goal <objective> - Work towards an objective autonomously",
];
