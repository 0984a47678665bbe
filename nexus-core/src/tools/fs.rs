// nexus-core/src/tools/fs.rs

//! File-system operations on already-sandboxed absolute paths.
//!
//! Callers must resolve and check paths first; see [`super::FileTools`].

use super::{DirectoryEntry, ToolError, ToolPayload};
use std::io::ErrorKind;
use std::path::Path;
use std::time::UNIX_EPOCH;
use tokio::fs;
use tracing::debug;

fn display(path: &Path) -> String {
    path.display().to_string()
}

fn io_error(path: &Path, source: std::io::Error) -> ToolError {
    match source.kind() {
        ErrorKind::PermissionDenied => ToolError::PermissionDenied(display(path)),
        _ => ToolError::Io {
            path: path.to_path_buf(),
            source,
        },
    }
}

async fn metadata_or(
    path: &Path,
    not_found: fn(String) -> ToolError,
) -> Result<std::fs::Metadata, ToolError> {
    match fs::metadata(path).await {
        Ok(meta) => Ok(meta),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(not_found(display(path))),
        Err(e) => Err(io_error(path, e)),
    }
}

pub(crate) async fn read_file(path: &Path) -> Result<ToolPayload, ToolError> {
    debug!(path = %path.display(), "Reading file");
    let meta = metadata_or(path, ToolError::FileNotFound).await?;
    if !meta.is_file() {
        return Err(ToolError::NotAFile(display(path)));
    }
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| io_error(path, e))?;
    Ok(ToolPayload::FileContent {
        content,
        file_path: display(path),
    })
}

/// Writes `content`, creating missing parent directories.
pub(crate) async fn write_file(path: &Path, content: &str) -> Result<ToolPayload, ToolError> {
    debug!(path = %path.display(), bytes = content.len(), "Writing file");
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| io_error(parent, e))?;
    }
    if fs::metadata(path).await.is_ok_and(|meta| meta.is_dir()) {
        return Err(ToolError::NotAFile(display(path)));
    }
    fs::write(path, content)
        .await
        .map_err(|e| io_error(path, e))?;
    Ok(ToolPayload::FileWritten {
        message: format!("File written successfully: {}", path.display()),
        file_path: display(path),
    })
}

/// Single-level listing, sorted by name.
pub(crate) async fn list_directory(path: &Path) -> Result<ToolPayload, ToolError> {
    debug!(path = %path.display(), "Listing directory");
    let meta = metadata_or(path, ToolError::DirectoryNotFound).await?;
    if !meta.is_dir() {
        return Err(ToolError::NotADirectory(display(path)));
    }

    let mut reader = fs::read_dir(path).await.map_err(|e| io_error(path, e))?;
    let mut files = Vec::new();
    while let Some(entry) = reader.next_entry().await.map_err(|e| io_error(path, e))? {
        let entry_meta = match entry.metadata().await {
            Ok(meta) => meta,
            Err(e) => {
                debug!(entry = %entry.path().display(), error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        let (entry_type, size) = if entry_meta.is_dir() {
            ("directory", None)
        } else {
            ("file", Some(entry_meta.len()))
        };
        files.push(DirectoryEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            entry_type: entry_type.to_string(),
            size,
        });
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(ToolPayload::DirectoryListing {
        directory: display(path),
        files,
    })
}

/// `mkdir -p`. An existing directory is not an error.
pub(crate) async fn create_directory(path: &Path) -> Result<ToolPayload, ToolError> {
    debug!(path = %path.display(), "Creating directory");
    if let Ok(meta) = fs::metadata(path).await {
        if !meta.is_dir() {
            return Err(ToolError::NotADirectory(display(path)));
        }
    }
    fs::create_dir_all(path)
        .await
        .map_err(|e| io_error(path, e))?;
    Ok(ToolPayload::DirectoryCreated {
        message: format!("Directory created successfully: {}", path.display()),
        directory_path: display(path),
    })
}

pub(crate) async fn file_info(path: &Path) -> Result<ToolPayload, ToolError> {
    let meta = metadata_or(path, ToolError::FileNotFound).await?;
    let file_type = if meta.is_dir() {
        "directory"
    } else if meta.is_file() {
        "file"
    } else {
        "other"
    };
    let modified = meta
        .modified()
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map(|duration| duration.as_secs());
    Ok(ToolPayload::FileInfo {
        file_path: display(path),
        file_type: file_type.to_string(),
        size: meta.len(),
        modified,
        readonly: meta.permissions().readonly(),
    })
}
