use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Nexus: a conversational file-system assistant.
/// Starts an interactive session by default, or runs a single message or goal non-interactively.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase message verbosity.
    ///
    /// Specify multiple times for more verbose output:
    ///  -v:  INFO level
    ///  -vv: DEBUG level
    ///  -vvv: TRACE level (most verbose)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Send a single message, print the reply and exit.
    #[arg(short, long, conflicts_with = "goal")]
    pub turn: Option<String>,

    /// Run a single goal autonomously, print the result and exit.
    #[arg(short, long)]
    pub goal: Option<String>,

    /// Directory the file tools are confined to. Defaults to the current directory.
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,
}
