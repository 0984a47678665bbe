// nexus-core/src/tools/mod.rs

//! The capability registry: schema-described file-system operations the model may call.
//!
//! Every call produces a [`ToolOutcome`]. Failures are values, never `Err`, so the mediator can
//! feed them back to the model and keep going.

mod fs;
mod registry;
mod schema;

pub use registry::FileTools;

use crate::models::tools::{ToolDefinition, ToolInput};
use crate::utils::preview;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};
use std::path::PathBuf;
use thiserror::Error;

/// Characters of file content shown in a tool summary.
const SUMMARY_CONTENT_CHARS: usize = 50;

/// Interface for anything that can advertise and execute tools.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    fn get_tool_definitions(&self) -> Vec<ToolDefinition>;

    async fn execute_tool(&self, tool_name: &str, input: ToolInput) -> ToolOutcome;
}

/// One entry of a directory listing.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DirectoryEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub entry_type: String,
    pub size: Option<u64>,
}

/// Operation-specific success data.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ToolPayload {
    FileContent {
        content: String,
        file_path: String,
    },
    FileWritten {
        message: String,
        file_path: String,
    },
    DirectoryListing {
        directory: String,
        files: Vec<DirectoryEntry>,
    },
    CurrentDirectory {
        current_directory: String,
    },
    DirectoryChanged {
        message: String,
        current_directory: String,
    },
    DirectoryCreated {
        message: String,
        directory_path: String,
    },
    FileInfo {
        file_path: String,
        file_type: String,
        size: u64,
        /// Seconds since the Unix epoch.
        modified: Option<u64>,
        readonly: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Success(ToolPayload),
    Failure(String),
}

impl ToolOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutcome::Success(_))
    }

    /// The canonical JSON text stored as a tool turn's content.
    pub fn to_content(&self) -> String {
        self.to_json().to_string()
    }

    pub fn to_json(&self) -> Value {
        match self {
            ToolOutcome::Success(payload) => {
                let mut value = serde_json::to_value(payload).unwrap_or_else(|_| json!({}));
                if let Some(map) = value.as_object_mut() {
                    map.insert("success".to_string(), Value::Bool(true));
                }
                value
            }
            ToolOutcome::Failure(message) => json!({ "success": false, "error": message }),
        }
    }

    /// One-line description for progress display.
    pub fn summary(&self) -> String {
        match self {
            ToolOutcome::Failure(message) => format!("Error: {}", message),
            ToolOutcome::Success(payload) => match payload {
                ToolPayload::CurrentDirectory { current_directory }
                | ToolPayload::DirectoryChanged {
                    current_directory, ..
                } => current_directory.clone(),
                ToolPayload::DirectoryListing { files, .. } => format!("{} items", files.len()),
                ToolPayload::FileContent { content, .. } => {
                    preview(content, SUMMARY_CONTENT_CHARS)
                }
                ToolPayload::FileWritten { message, .. }
                | ToolPayload::DirectoryCreated { message, .. } => message.clone(),
                ToolPayload::FileInfo { .. } => "Success".to_string(),
            },
        }
    }
}

impl From<Result<ToolPayload, ToolError>> for ToolOutcome {
    fn from(result: Result<ToolPayload, ToolError>) -> Self {
        match result {
            Ok(payload) => ToolOutcome::Success(payload),
            Err(e) => ToolOutcome::Failure(e.to_string()),
        }
    }
}

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Access denied: '{0}' is outside the allowed root directory")]
    AccessDenied(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("Missing required argument '{0}'")]
    MissingArgument(&'static str),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Directory not found: {0}")]
    DirectoryNotFound(String),

    #[error("Path is not a file: {0}")]
    NotAFile(String),

    #[error("Path is not a directory: {0}")]
    NotADirectory(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
