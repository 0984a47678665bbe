// nexus-core/src/tools/registry.rs
use super::schema::{
    self, CHANGE_DIRECTORY, CREATE_DIRECTORY, GET_CURRENT_DIRECTORY, GET_FILE_INFO,
    LIST_DIRECTORY, READ_FILE, WRITE_FILE,
};
use super::{ToolError, ToolOutcome, ToolPayload, ToolProvider, fs};
use crate::models::tools::{ToolDefinition, ToolInput};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// File-system tools confined to one root directory.
///
/// Relative paths resolve against a working directory that starts at the root and moves with
/// `change_directory`. Any path that normalizes outside the root is refused before touching the
/// disk, including paths that would escape through a symlink.
#[derive(Debug)]
pub struct FileTools {
    root: PathBuf,
    current_dir: Mutex<PathBuf>,
}

/// Symlinks followed while confining one path before giving up.
const MAX_LINK_HOPS: usize = 16;

/// Lexically removes `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

fn required_str(input: &ToolInput, key: &'static str, tool: &str) -> Result<String, ToolError> {
    match input.get(key) {
        None => Err(ToolError::MissingArgument(key)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(ToolError::InvalidArguments {
            tool: tool.to_string(),
            reason: format!("'{}' must be a string, got {}", key, other),
        }),
    }
}

fn optional_str(
    input: &ToolInput,
    key: &'static str,
    tool: &str,
) -> Result<Option<String>, ToolError> {
    match input.get(key) {
        None => Ok(None),
        Some(_) => required_str(input, key, tool).map(Some),
    }
}

/// Missing or null content writes an empty file; non-string values are written as JSON text.
fn content_arg(input: &ToolInput) -> String {
    match input.get("content") {
        None => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

impl FileTools {
    /// Creates a registry rooted at `root`, which must be an existing directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, ToolError> {
        let root = root.as_ref();
        let canonical = std::fs::canonicalize(root).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                ToolError::DirectoryNotFound(root.display().to_string())
            }
            _ => ToolError::Io {
                path: root.to_path_buf(),
                source: e,
            },
        })?;
        if !canonical.is_dir() {
            return Err(ToolError::NotADirectory(canonical.display().to_string()));
        }
        info!(root = %canonical.display(), "File tools rooted");
        Ok(Self {
            current_dir: Mutex::new(canonical.clone()),
            root: canonical,
        })
    }

    /// Schemas of every operation. Needs no instance.
    pub fn tool_definitions() -> Vec<ToolDefinition> {
        schema::definitions()
    }

    pub fn tool_names() -> Vec<String> {
        Self::tool_definitions().into_iter().map(|d| d.name).collect()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn current_dir(&self) -> PathBuf {
        self.current_dir
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set_current_dir(&self, path: PathBuf) {
        *self
            .current_dir
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = path;
    }

    /// Resolves `raw` against the working directory and checks it stays under the root.
    async fn resolve(&self, raw: &str) -> Result<PathBuf, ToolError> {
        let requested = Path::new(raw);
        let joined = if requested.is_absolute() {
            requested.to_path_buf()
        } else {
            self.current_dir().join(requested)
        };
        let normalized = normalize(&joined);
        if !normalized.starts_with(&self.root) {
            warn!(path = %raw, "Path escapes the tool root");
            return Err(ToolError::AccessDenied(raw.to_string()));
        }

        self.confine_links(raw, &normalized).await?;
        Ok(normalized)
    }

    /// Follows symlinks along `path`, dangling ones included, and refuses any that lead out of
    /// the root.
    async fn confine_links(&self, raw: &str, path: &Path) -> Result<(), ToolError> {
        let deny = |real: &Path| {
            warn!(
                path = %raw,
                real = %real.display(),
                "Path escapes the tool root through a link"
            );
            ToolError::AccessDenied(raw.to_string())
        };

        let mut target = path.to_path_buf();
        for _ in 0..MAX_LINK_HOPS {
            let mut probe = target.as_path();
            let next = loop {
                if let Ok(real) = tokio::fs::canonicalize(probe).await {
                    return if real.starts_with(&self.root) {
                        Ok(())
                    } else {
                        Err(deny(&real))
                    };
                }
                let dangling = tokio::fs::symlink_metadata(probe)
                    .await
                    .is_ok_and(|meta| meta.file_type().is_symlink());
                if dangling {
                    let link = tokio::fs::read_link(probe)
                        .await
                        .map_err(|e| ToolError::Io {
                            path: probe.to_path_buf(),
                            source: e,
                        })?;
                    let base = probe.parent().unwrap_or(self.root.as_path());
                    let rest = target.strip_prefix(probe).unwrap_or(Path::new(""));
                    break normalize(&base.join(link).join(rest));
                }
                match probe.parent() {
                    Some(parent) => probe = parent,
                    None => return Ok(()),
                }
            };
            if !next.starts_with(&self.root) {
                return Err(deny(&next));
            }
            target = next;
        }

        warn!(path = %raw, "Too many symlink hops");
        Err(ToolError::AccessDenied(raw.to_string()))
    }

    /// Runs one operation. Never fails: errors come back as [`ToolOutcome::Failure`].
    pub async fn execute(&self, function_name: &str, input: &ToolInput) -> ToolOutcome {
        debug!(tool_name = %function_name, args = ?input.arguments, "Executing tool");
        let outcome: ToolOutcome = self.dispatch(function_name, input).await.into();
        match &outcome {
            ToolOutcome::Success(_) => info!(tool_name = %function_name, "Tool succeeded"),
            ToolOutcome::Failure(msg) => {
                warn!(tool_name = %function_name, error = %msg, "Tool failed")
            }
        }
        outcome
    }

    async fn dispatch(&self, name: &str, input: &ToolInput) -> Result<ToolPayload, ToolError> {
        match name {
            READ_FILE => {
                let path = self.resolve(&required_str(input, "file_path", name)?).await?;
                fs::read_file(&path).await
            }
            WRITE_FILE => {
                let path = self.resolve(&required_str(input, "file_path", name)?).await?;
                fs::write_file(&path, &content_arg(input)).await
            }
            LIST_DIRECTORY => {
                let path = match optional_str(input, "directory_path", name)? {
                    Some(raw) => self.resolve(&raw).await?,
                    None => self.current_dir(),
                };
                fs::list_directory(&path).await
            }
            GET_CURRENT_DIRECTORY => Ok(ToolPayload::CurrentDirectory {
                current_directory: self.current_dir().display().to_string(),
            }),
            CHANGE_DIRECTORY => {
                let raw = required_str(input, "directory_path", name)?;
                let path = self.resolve(&raw).await?;
                match tokio::fs::metadata(&path).await {
                    Ok(meta) if meta.is_dir() => {}
                    Ok(_) => return Err(ToolError::NotADirectory(path.display().to_string())),
                    Err(_) => {
                        return Err(ToolError::DirectoryNotFound(path.display().to_string()));
                    }
                }
                self.set_current_dir(path.clone());
                Ok(ToolPayload::DirectoryChanged {
                    message: format!("Changed directory to {}", path.display()),
                    current_directory: path.display().to_string(),
                })
            }
            CREATE_DIRECTORY => {
                let path = self
                    .resolve(&required_str(input, "directory_path", name)?)
                    .await?;
                fs::create_directory(&path).await
            }
            GET_FILE_INFO => {
                let path = self.resolve(&required_str(input, "file_path", name)?).await?;
                fs::file_info(&path).await
            }
            unknown => Err(ToolError::UnknownFunction(unknown.to_string())),
        }
    }
}

#[async_trait]
impl ToolProvider for FileTools {
    fn get_tool_definitions(&self) -> Vec<ToolDefinition> {
        Self::tool_definitions()
    }

    async fn execute_tool(&self, tool_name: &str, input: ToolInput) -> ToolOutcome {
        self.execute(tool_name, &input).await
    }
}
